//!
//! Frame orchestration: one `advance` runs integration, collisions, triangulation and the
//! fade step to completion, `frame` turns the result into draw primitives without touching
//! any state.
//!

use std::time::Duration;

use rand::SeedableRng;
use rand_pcg::Pcg64;
use tracing::{debug, info};

use crate::field::PointField;
use crate::frame::{assemble, Frame};
use crate::params::{ParamChange, Params};
use crate::transition::{StepParams, TransitionState};
use crate::triangulation::{triangulate, Triangle};

/// The whole mutable simulation state. Cloning it gives an independent snapshot.
#[derive(Debug, Clone)]
pub struct Animator {
    field: PointField,
    transitions: TransitionState,
    triangles: Vec<Triangle>,
    rng: Pcg64,
    frame_index: u64,
    initialized: bool,
}

impl Animator {
    /// An animator with no points yet; the first `advance` initializes it.
    pub fn new(seed: u64) -> Self {
        Animator {
            field: PointField::default(),
            transitions: TransitionState::new(),
            triangles: vec![],
            rng: Pcg64::seed_from_u64(seed),
            frame_index: 0,
            initialized: false,
        }
    }

    pub fn with_params(params: &Params) -> Self {
        let mut animator = Animator::new(params.seed);
        animator.reset(params);
        animator
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn field(&self) -> &PointField {
        &self.field
    }

    pub fn transitions(&self) -> &TransitionState {
        &self.transitions
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Frames advanced since the last reset.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Rebuild points, triangulation and fades from `params`. The random generator is
    /// reseeded so equal params always give the same simulation.
    pub fn reset(&mut self, params: &Params) {
        self.rng = Pcg64::seed_from_u64(params.seed);
        self.field = PointField::initialize(params, &mut self.rng);
        self.triangles = triangulate(self.field.points());
        self.transitions
            .settle(&self.triangles, &step_params(params), &mut self.rng);
        self.frame_index = 0;
        self.initialized = true;

        info!(
            points = self.field.len(),
            triangles = self.triangles.len(),
            "geometry reset"
        );
    }

    /// Move the simulation forward by one frame.
    pub fn advance(&mut self, params: &Params) {
        if !self.initialized {
            self.reset(params);
        }

        self.field.integrate();
        self.field
            .resolve_boundary_collisions(f64::from(params.width), f64::from(params.height));
        self.field.resolve_polygon_collisions(&params.polygons);

        self.triangles = triangulate(self.field.points());
        self.transitions
            .step(&self.triangles, &step_params(params), &mut self.rng);

        self.frame_index += 1;
    }

    /// The drawable frame for the current state.
    pub fn frame(&self, params: &Params) -> Frame {
        assemble(
            self.field.points(),
            &self.triangles,
            &self.transitions,
            params,
        )
    }

    /// React to the params going from `previous` to `params`.
    pub fn apply(&mut self, previous: &Params, params: &Params) -> ParamChange {
        let change = params.change_from(previous);

        match change {
            ParamChange::Geometry => self.reset(params),
            ParamChange::Speed => {
                debug!(speed = params.speed, "rescaling velocities");
                self.field.rescale_velocities(params.speed, &mut self.rng);
            }
            ParamChange::Cosmetic | ParamChange::Unchanged => {}
        }

        change
    }

    pub fn snapshot(&self) -> Animator {
        self.clone()
    }

    pub fn restore(&mut self, snapshot: Animator) {
        *self = snapshot;
    }
}

pub fn step_params(params: &Params) -> StepParams {
    StepParams {
        delta_alpha: params.delta_alpha_per_frame(),
        triangles_enabled: params.toggles.fill_triangles,
        lines_enabled: params.toggles.show_lines,
        base_color: params.base_color(),
        brightness_range: params.brightness_range,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Frames advance on every tick.
    Animating,
    /// Only explicit re-renders happen.
    Static,
}

/// Timer driven playback. The host calls `tick` every `interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Playback {
    mode: Mode,
}

impl Default for Playback {
    fn default() -> Self {
        Playback { mode: Mode::Static }
    }
}

impl Playback {
    pub fn is_animating(&self) -> bool {
        self.mode == Mode::Animating
    }

    pub fn start(&mut self) {
        self.mode = Mode::Animating;
    }

    /// Freeze the animation; the animator keeps its last state.
    pub fn stop(&mut self) {
        self.mode = Mode::Static;
    }

    pub fn interval(fps: f64) -> Duration {
        if fps.is_finite() && fps > 0.0 {
            Duration::from_secs_f64(1.0 / fps)
        } else {
            Duration::from_secs(1)
        }
    }

    /// Advance `animator` when animating, then render it.
    pub fn tick(&self, animator: &mut Animator, params: &Params) -> Frame {
        if self.is_animating() {
            animator.advance(params);
        }
        animator.frame(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use delaunay_mesh::geo::Vec2;

    use crate::field::PointClass;

    fn params() -> Params {
        Params {
            width: 200,
            height: 100,
            num_points: 20,
            speed: 5.0,
            seed: 11,
            ..Params::default()
        }
    }

    #[test]
    fn first_advance_initializes() {
        let p = params();
        let mut animator = Animator::new(p.seed);
        assert!(!animator.is_initialized());

        animator.advance(&p);
        assert!(animator.is_initialized());
        assert_eq!(animator.field().len(), 20 + 4 + 8);
        assert_eq!(animator.frame_index(), 1);
        assert!(!animator.triangles().is_empty());
    }

    #[test]
    fn equal_params_give_equal_runs() {
        let p = params();
        let mut a = Animator::with_params(&p);
        let mut b = Animator::with_params(&p);

        for _ in 0..30 {
            a.advance(&p);
            b.advance(&p);
            assert_eq!(a.frame(&p), b.frame(&p));
        }
    }

    #[test]
    fn invariants_hold_every_frame() {
        let p = params();
        let mut animator = Animator::with_params(&p);

        for _ in 0..100 {
            animator.advance(&p);
            let field = animator.field();
            assert!(field.is_consistent());
            assert_eq!(field.points().len(), field.velocities().len());
            for (class, v) in field.classes().iter().zip(field.velocities()) {
                if class.is_static() {
                    assert_eq!(*v, Vec2::zero());
                }
            }
        }
    }

    #[test]
    fn speed_change_keeps_positions() {
        let p = params();
        let mut animator = Animator::with_params(&p);
        animator.advance(&p);
        let before = animator.field().points().to_vec();

        let faster = Params {
            speed: 9.0,
            ..p.clone()
        };
        assert_eq!(animator.apply(&p, &faster), ParamChange::Speed);
        assert_eq!(animator.field().points(), &before[..]);

        for (class, v) in animator
            .field()
            .classes()
            .iter()
            .zip(animator.field().velocities())
        {
            if *class == PointClass::Free {
                assert!((v.norm() - 9.0).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn geometry_change_resets() {
        let p = params();
        let mut animator = Animator::with_params(&p);
        animator.advance(&p);

        let more = Params {
            num_points: 5,
            ..p.clone()
        };
        assert_eq!(animator.apply(&p, &more), ParamChange::Geometry);
        assert_eq!(animator.field().len(), 5 + 12);
        assert_eq!(animator.frame_index(), 0);

        let mut recolored = more.clone();
        recolored.main_color.hue = 90.0;
        let snapshot = animator.snapshot();
        assert_eq!(animator.apply(&more, &recolored), ParamChange::Cosmetic);
        assert_eq!(animator.field(), snapshot.field());
    }

    #[test]
    fn stopped_playback_freezes_state() {
        let p = params();
        let mut animator = Animator::with_params(&p);
        let mut playback = Playback::default();

        playback.start();
        playback.tick(&mut animator, &p);
        playback.tick(&mut animator, &p);
        assert_eq!(animator.frame_index(), 2);

        playback.stop();
        let frozen = animator.frame(&p);
        assert_eq!(playback.tick(&mut animator, &p), frozen);
        assert_eq!(animator.frame_index(), 2);
    }

    #[test]
    fn interval_follows_fps() {
        assert_eq!(Playback::interval(50.0), Duration::from_millis(20));
        assert_eq!(Playback::interval(0.0), Duration::from_secs(1));
    }
}
