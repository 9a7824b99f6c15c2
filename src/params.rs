//!
//! Immutable snapshot of every user facing setting. Core operations take a `&Params`
//! instead of reading widgets, so the same code drives the live preview and exports.
//!

use tracing::warn;

use crate::color::{Color, Hsv};
use crate::error::TrifadeError;
use crate::geometry::Polygon;

pub const DEFAULT_WIDTH: u32 = 1080;
pub const DEFAULT_HEIGHT: u32 = 1920;
pub const DEFAULT_FPS: f64 = 30.0;

/// Size used when a canvas dimension is invalid.
const FALLBACK_SIDE: u32 = 1080;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Toggles {
    pub fixed_corners: bool,
    pub side_oscillators: bool,
    pub show_points: bool,
    pub show_lines: bool,
    pub fill_triangles: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Params {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Length of an exported animation, in seconds.
    pub duration: f64,
    /// Number of free points.
    pub num_points: usize,
    pub point_size: f64,
    pub line_width: f64,

    pub toggles: Toggles,

    /// Free point speed in pixels per frame.
    pub speed: f64,
    /// Triangle brightness jitter, in percent.
    pub brightness_range: f64,
    /// Full fades per second.
    pub transition_speed: f64,
    pub main_color: Hsv,
    pub background: Hsv,

    pub polygons: Vec<Polygon>,
    pub seed: u64,
}

/// What a parameter update requires from the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamChange {
    Unchanged,
    /// The point field must be rebuilt from scratch.
    Geometry,
    /// Only velocity magnitudes must be updated.
    Speed,
    /// Only the next render is affected.
    Cosmetic,
}

impl Default for Toggles {
    fn default() -> Self {
        Toggles {
            fixed_corners: true,
            side_oscillators: true,
            show_points: true,
            show_lines: true,
            fill_triangles: false,
        }
    }
}

impl Default for Params {
    fn default() -> Self {
        Params {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            fps: DEFAULT_FPS,
            duration: 5.0,
            num_points: 50,
            point_size: 20.0,
            line_width: 4.0,
            toggles: Toggles::default(),
            speed: 16.0,
            brightness_range: 50.0,
            transition_speed: 2.0,
            main_color: Hsv::new(0.0, 100.0, 50.0),
            background: Hsv::new(0.0, 100.0, 0.0),
            polygons: vec![],
            seed: 0,
        }
    }
}

impl Params {
    pub fn base_color(&self) -> Color {
        self.main_color.to_color()
    }

    pub fn background_color(&self) -> Color {
        self.background.to_color()
    }

    /// Alpha step applied to every fade each frame, so that a full fade lasts
    /// `1 / transition_speed` seconds whatever the frame rate.
    pub fn delta_alpha_per_frame(&self) -> f64 {
        delta_alpha_per_frame(self.transition_speed, self.fps)
    }

    /// Global multiplier for edges.
    pub fn lines_alpha(&self) -> f64 {
        if self.toggles.show_lines {
            1.0
        } else {
            0.0
        }
    }

    /// Global multiplier for triangle fills.
    pub fn triangles_alpha(&self) -> f64 {
        if self.toggles.fill_triangles {
            1.0
        } else {
            0.0
        }
    }

    /// Number of frames an export of `duration` seconds at `fps` produces.
    pub fn frame_count(&self) -> usize {
        let n = (self.fps * self.duration).round();
        if n.is_finite() && n > 0.0 {
            n as usize
        } else {
            0
        }
    }

    /// Copy of these params with every invalid value replaced by a safe fallback, along
    /// with one `InvalidParameter` per substitution.
    pub fn sanitized(&self) -> (Params, Vec<TrifadeError>) {
        let defaults = Params::default();
        let mut p = self.clone();
        let mut issues = vec![];

        let mut report = |msg: String| {
            warn!("{}", msg);
            issues.push(TrifadeError::invalid_parameter(msg));
        };

        if p.width == 0 || p.height == 0 {
            report(format!(
                "canvas size {}x{} is not positive, using {}x{}",
                p.width, p.height, FALLBACK_SIDE, FALLBACK_SIDE
            ));
            p.width = FALLBACK_SIDE;
            p.height = FALLBACK_SIDE;
        }

        if !(p.fps.is_finite() && p.fps > 0.0) {
            report(format!("fps {} is not positive, using {}", p.fps, DEFAULT_FPS));
            p.fps = DEFAULT_FPS;
        }

        if !(p.duration.is_finite() && p.duration >= 0.0) {
            report(format!("duration {} is negative, using 0", p.duration));
            p.duration = 0.0;
        }

        if !(p.speed.is_finite() && p.speed >= 0.0) {
            report(format!("speed {} is negative, using 0", p.speed));
            p.speed = 0.0;
        }

        if !(p.transition_speed.is_finite() && p.transition_speed > 0.0) {
            report(format!(
                "transition speed {} is not positive, using {}",
                p.transition_speed, defaults.transition_speed
            ));
            p.transition_speed = defaults.transition_speed;
        }

        if !(p.brightness_range.is_finite() && (0.0..=100.0).contains(&p.brightness_range)) {
            let clamped = if p.brightness_range.is_finite() {
                p.brightness_range.max(0.0).min(100.0)
            } else {
                defaults.brightness_range
            };
            report(format!(
                "brightness range {} is outside 0..=100, using {}",
                p.brightness_range, clamped
            ));
            p.brightness_range = clamped;
        }

        if !(p.point_size.is_finite() && p.point_size >= 0.0) {
            report(format!("point size {} is invalid", p.point_size));
            p.point_size = defaults.point_size;
        }

        if !(p.line_width.is_finite() && p.line_width >= 0.0) {
            report(format!("line width {} is invalid", p.line_width));
            p.line_width = defaults.line_width;
        }

        if !hsv_is_finite(p.main_color) {
            report(format!("main color {:?} is not finite", p.main_color));
            p.main_color = defaults.main_color;
        }

        if !hsv_is_finite(p.background) {
            report(format!("background {:?} is not finite", p.background));
            p.background = defaults.background;
        }

        (p, issues)
    }

    /// Classify the update from `previous` to `self`.
    pub fn change_from(&self, previous: &Params) -> ParamChange {
        if self == previous {
            return ParamChange::Unchanged;
        }

        let geometry_changed = self.width != previous.width
            || self.height != previous.height
            || self.num_points != previous.num_points
            || self.toggles.fixed_corners != previous.toggles.fixed_corners
            || self.toggles.side_oscillators != previous.toggles.side_oscillators
            || self.polygons != previous.polygons
            || self.seed != previous.seed;

        if geometry_changed {
            ParamChange::Geometry
        } else if self.speed != previous.speed {
            ParamChange::Speed
        } else {
            ParamChange::Cosmetic
        }
    }
}

fn hsv_is_finite(hsv: Hsv) -> bool {
    hsv.hue.is_finite() && hsv.saturation.is_finite() && hsv.value.is_finite()
}

pub fn delta_alpha_per_frame(transition_speed: f64, fps: f64) -> f64 {
    if fps > 0.0 {
        transition_speed / fps
    } else {
        0.0
    }
}
