//!
//! Polygon obstacles: containment, crossing and projection queries plus the text format
//! polygons are described with.
//!

use delaunay_mesh::geo::Vec2;
use tracing::warn;

use crate::error::{TrifadeError, TrifadeResult};

/// Guard used wherever a length is about to be divided by.
pub const EPSILON: f64 = 1e-10;

/// A closed polygon with at least 3 vertices; the last vertex connects back to the first.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vec2>,
}

impl Polygon {
    pub fn new(vertices: Vec<Vec2>) -> TrifadeResult<Self> {
        if vertices.len() < 3 {
            return Err(TrifadeError::invalid_parameter(format!(
                "a polygon needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }

        if !vertices.iter().all(Vec2::is_finite) {
            return Err(TrifadeError::invalid_parameter(
                "polygon vertices must be finite",
            ));
        }

        Ok(Polygon { vertices })
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    pub fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    pub fn centroid(&self) -> Vec2 {
        let sum = self
            .vertices
            .iter()
            .fold(Vec2::zero(), |acc, &v| acc + v);
        sum / self.vertices.len() as f64
    }

    /// Ray casting containment test. Points exactly on the boundary may land on either
    /// side.
    pub fn contains(&self, p: Vec2) -> bool {
        let mut inside = false;

        for (a, b) in self.edges() {
            if (a.y > p.y) != (b.y > p.y) {
                let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y + EPSILON) + a.x;
                if p.x < x_cross {
                    inside = !inside;
                }
            }
        }

        inside
    }

    /// Index of the first edge, in polygon order, properly crossed by the segment
    /// `p1`-`p2`.
    pub fn crossed_edge(&self, p1: Vec2, p2: Vec2) -> Option<usize> {
        self.edges()
            .position(|(a, b)| segments_intersect(p1, p2, a, b))
    }

    pub fn intersects_segment(&self, p1: Vec2, p2: Vec2) -> bool {
        self.crossed_edge(p1, p2).is_some()
    }

    /// Unit normal of the i-th edge, `None` for zero-length edges.
    pub fn edge_normal(&self, i: usize) -> Option<Vec2> {
        let a = self.vertices[i];
        let b = self.vertices[(i + 1) % self.vertices.len()];

        let normal = (b - a).perp();
        let len = normal.norm();
        if len < EPSILON {
            return None;
        }

        Some(normal / len)
    }

    /// The point of the polygon boundary closest to `p`.
    pub fn closest_boundary_point(&self, p: Vec2) -> Vec2 {
        let mut closest = p;
        let mut min_dist = f64::INFINITY;

        for (a, b) in self.edges() {
            let candidate = closest_point_on_segment(p, a, b);
            let dist = p.dist2(candidate);
            if dist < min_dist {
                min_dist = dist;
                closest = candidate;
            }
        }

        closest
    }

    /// Distance between `p` and the polygon boundary.
    pub fn boundary_distance(&self, p: Vec2) -> f64 {
        p.dist(self.closest_boundary_point(p))
    }
}

/// Reflect `v` about the line with unit normal `n`.
pub fn reflect(v: Vec2, n: Vec2) -> Vec2 {
    v - n * (2.0 * v.dot(n))
}

pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let v = b - a;
    let c1 = (p - a).dot(v);
    if c1 <= 0.0 {
        return a;
    }

    let c2 = v.dot(v);
    if c2 <= c1 {
        return b;
    }

    a + v * (c1 / c2)
}

fn ccw(a: Vec2, b: Vec2, c: Vec2) -> bool {
    (c.y - a.y) * (b.x - a.x) > (b.y - a.y) * (c.x - a.x)
}

fn segments_intersect(a: Vec2, b: Vec2, c: Vec2, d: Vec2) -> bool {
    ccw(a, c, d) != ccw(b, c, d) && ccw(a, b, c) != ccw(a, b, d)
}

/// Parse a single `(x,y),(x,y),(x,y)...` polygon description.
pub fn parse_polygon(line: usize, text: &str) -> TrifadeResult<Polygon> {
    let text: String = text.chars().filter(|c| !c.is_whitespace()).collect();

    let inner = text
        .strip_prefix('(')
        .and_then(|t| t.strip_suffix(')'))
        .ok_or_else(|| TrifadeError::polygon_parse(line, "expected (x,y),(x,y),... pairs"))?;

    let vertices = inner
        .split("),(")
        .map(|pair| {
            let (x, y) = pair.split_once(',').ok_or_else(|| {
                TrifadeError::polygon_parse(line, format!("'{}' is not an x,y pair", pair))
            })?;

            let parse = |s: &str| {
                s.parse::<f64>().map_err(|e| {
                    TrifadeError::polygon_parse(line, format!("bad coordinate '{}': {}", s, e))
                })
            };

            Ok(Vec2::new(parse(x)?, parse(y)?))
        })
        .collect::<TrifadeResult<Vec<_>>>()?;

    Polygon::new(vertices).map_err(|e| TrifadeError::polygon_parse(line, e.to_string()))
}

/// Parse one polygon per non-empty line. Malformed lines are skipped and returned as
/// errors next to the polygons that did parse.
pub fn parse_polygons(text: &str) -> (Vec<Polygon>, Vec<TrifadeError>) {
    let mut polygons = vec![];
    let mut errors = vec![];

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match parse_polygon(i + 1, line) {
            Ok(polygon) => polygons.push(polygon),
            Err(e) => {
                warn!("skipping polygon: {}", e);
                errors.push(e);
            }
        }
    }

    (polygons, errors)
}
