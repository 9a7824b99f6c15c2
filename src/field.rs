//!
//! The moving point set. Points are stored as `[free..][corners(4)][sides(8)][polygon
//! vertices..]` and every point carries its class, so no code has to derive it from index
//! arithmetic.
//!

use std::f64::consts::PI;

use delaunay_mesh::geo::Vec2;
use rand::Rng;
use tracing::debug;

use crate::error::{TrifadeError, TrifadeResult};
use crate::geometry::{reflect, Polygon};
use crate::params::Params;

/// Speeds under this are treated as zero when rescaling.
const MIN_SPEED: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointClass {
    /// Bounces around the canvas and off polygons.
    Free,
    /// One of the 4 canvas corners; never moves.
    FixedCorner,
    /// Slides back and forth along a canvas side.
    SideOscillator(Axis),
    /// Vertex of an obstacle polygon; never moves.
    PolygonVertex,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointField {
    points: Vec<Vec2>,
    velocities: Vec<Vec2>,
    classes: Vec<PointClass>,
}

impl PointClass {
    pub fn is_static(self) -> bool {
        matches!(self, PointClass::FixedCorner | PointClass::PolygonVertex)
    }
}

impl PointField {
    /// Build a fresh field for the canvas, toggles, polygons and speed in `params`.
    pub fn initialize(params: &Params, rng: &mut impl Rng) -> Self {
        let width = f64::from(params.width);
        let height = f64::from(params.height);
        let speed = params.speed;

        let mut field = PointField::default();

        for _ in 0..params.num_points {
            let p = Vec2::new(rng.gen::<f64>() * width, rng.gen::<f64>() * height);
            let v = Vec2::new(
                (rng.gen::<f64>() - 0.5) * speed,
                (rng.gen::<f64>() - 0.5) * speed,
            );
            field.push(p, v, PointClass::Free);
        }

        if params.toggles.fixed_corners {
            for &(x, y) in &[(0.0, 0.0), (width, 0.0), (0.0, height), (width, height)] {
                field.push(Vec2::new(x, y), Vec2::zero(), PointClass::FixedCorner);
            }
        }

        if params.toggles.side_oscillators {
            // bottom and top slide horizontally, left and right vertically
            let sides = [
                ((0.0, 0.0), Axis::Horizontal),
                ((width, 0.0), Axis::Horizontal),
                ((0.0, height), Axis::Horizontal),
                ((width, height), Axis::Horizontal),
                ((0.0, 0.0), Axis::Vertical),
                ((0.0, height), Axis::Vertical),
                ((width, 0.0), Axis::Vertical),
                ((width, height), Axis::Vertical),
            ];

            for &((x, y), axis) in &sides {
                let s = side_speed(speed, rng);
                let v = match axis {
                    Axis::Horizontal => Vec2::new(s, 0.0),
                    Axis::Vertical => Vec2::new(0.0, s),
                };
                field.push(Vec2::new(x, y), v, PointClass::SideOscillator(axis));
            }
        }

        for polygon in &params.polygons {
            for &p in polygon.vertices() {
                field.push(p, Vec2::zero(), PointClass::PolygonVertex);
            }
        }

        field.resolve_polygon_penetration(&params.polygons);

        debug!(
            points = field.len(),
            free = field.count(PointClass::Free),
            polygons = params.polygons.len(),
            "initialized point field"
        );

        field
    }

    /// Assemble a field from raw parts, checking the per-class invariants.
    pub fn from_parts(
        points: Vec<Vec2>,
        velocities: Vec<Vec2>,
        classes: Vec<PointClass>,
    ) -> TrifadeResult<Self> {
        let field = PointField {
            points,
            velocities,
            classes,
        };

        if !field.is_consistent() {
            return Err(TrifadeError::invalid_parameter(
                "point field parts violate the per-class invariants",
            ));
        }

        Ok(field)
    }

    fn push(&mut self, p: Vec2, v: Vec2, class: PointClass) {
        self.points.push(p);
        self.velocities.push(v);
        self.classes.push(class);
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn velocities(&self) -> &[Vec2] {
        &self.velocities
    }

    pub fn classes(&self) -> &[PointClass] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn count(&self, class: PointClass) -> usize {
        self.classes.iter().filter(|&&c| c == class).count()
    }

    /// Same number of positions, velocities and classes; static points don't move; side
    /// oscillators only move along their axis.
    pub fn is_consistent(&self) -> bool {
        if self.points.len() != self.velocities.len() || self.points.len() != self.classes.len()
        {
            return false;
        }

        self.classes
            .iter()
            .zip(&self.velocities)
            .all(|(class, v)| match class {
                PointClass::FixedCorner | PointClass::PolygonVertex => *v == Vec2::zero(),
                PointClass::SideOscillator(Axis::Horizontal) => v.y == 0.0,
                PointClass::SideOscillator(Axis::Vertical) => v.x == 0.0,
                PointClass::Free => true,
            })
    }

    /// Move every point by its velocity.
    pub fn integrate(&mut self) {
        for (p, v) in self.points.iter_mut().zip(&self.velocities) {
            *p = *p + *v;
        }
    }

    /// Flip the velocity component of every moving point that is outside the canvas along
    /// that axis. Positions are left alone, the next `integrate` brings them back.
    pub fn resolve_boundary_collisions(&mut self, width: f64, height: f64) {
        let outside = |c: f64, max: f64| c < 0.0 || c > max;

        for ((p, v), class) in self
            .points
            .iter()
            .zip(self.velocities.iter_mut())
            .zip(&self.classes)
        {
            match class {
                PointClass::Free => {
                    if outside(p.x, width) {
                        v.x = -v.x;
                    }
                    if outside(p.y, height) {
                        v.y = -v.y;
                    }
                }
                PointClass::SideOscillator(Axis::Horizontal) => {
                    if outside(p.x, width) {
                        v.x = -v.x;
                    }
                }
                PointClass::SideOscillator(Axis::Vertical) => {
                    if outside(p.y, height) {
                        v.y = -v.y;
                    }
                }
                PointClass::FixedCorner | PointClass::PolygonVertex => {}
            }
        }
    }

    /// Free points that ended up inside a polygon are pushed back to its boundary with
    /// reversed velocity, the ones about to cross an edge bounce off it. Polygons are
    /// checked in order and effects accumulate.
    pub fn resolve_polygon_collisions(&mut self, polygons: &[Polygon]) {
        if polygons.is_empty() {
            return;
        }

        for i in self.free_indices() {
            for polygon in polygons {
                let p = self.points[i];
                let v = self.velocities[i];

                if polygon.contains(p) {
                    self.points[i] = polygon.closest_boundary_point(p);
                    self.velocities[i] = -v;
                } else if let Some(edge) = polygon.crossed_edge(p, p + v) {
                    if let Some(normal) = polygon.edge_normal(edge) {
                        self.velocities[i] = reflect(v, normal);
                    }
                }
            }
        }
    }

    /// Push out every free point that lies inside a polygon.
    pub fn resolve_polygon_penetration(&mut self, polygons: &[Polygon]) {
        for i in self.free_indices() {
            for polygon in polygons {
                let p = self.points[i];
                if polygon.contains(p) {
                    self.points[i] = polygon.closest_boundary_point(p);
                    self.velocities[i] = -self.velocities[i];
                }
            }
        }
    }

    /// Change the speed of every moving point without touching positions. Free points
    /// get `speed`, side oscillators `speed / 2`; points standing still get a random
    /// direction.
    pub fn rescale_velocities(&mut self, speed: f64, rng: &mut impl Rng) {
        for (v, class) in self.velocities.iter_mut().zip(&self.classes) {
            match class {
                PointClass::Free => {
                    let norm = v.norm();
                    *v = if norm > MIN_SPEED {
                        *v * (speed / norm)
                    } else {
                        let angle = rng.gen::<f64>() * 2.0 * PI;
                        Vec2::new(angle.cos(), angle.sin()) * speed
                    };
                }
                PointClass::SideOscillator(axis) => {
                    let c = match axis {
                        Axis::Horizontal => &mut v.x,
                        Axis::Vertical => &mut v.y,
                    };
                    *c = if c.abs() > MIN_SPEED {
                        c.signum() * speed / 2.0
                    } else {
                        side_speed(speed, rng)
                    };
                }
                PointClass::FixedCorner | PointClass::PolygonVertex => {}
            }
        }
    }

    fn free_indices(&self) -> Vec<usize> {
        self.classes
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == PointClass::Free)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Random speed in `speed/4 .. speed/2` with random sign.
fn side_speed(speed: f64, rng: &mut impl Rng) -> f64 {
    let s = speed / 4.0 + rng.gen::<f64>() * speed / 4.0;
    if rng.gen_bool(0.5) {
        s
    } else {
        -s
    }
}
