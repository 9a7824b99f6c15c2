use std::ops::{Add, Div, Mul, Neg, Sub};

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Bbox {
    min: Vec2,
    max: Vec2,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Circle {
    pub center: Vec2,
    pub radius: f64,
}

/// Barycentric coordinates of a point with respect to a triangle.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BarycentricCoords {
    pub u: f64,
    pub v: f64,
    pub w: f64,
}

impl Vec2 {
    pub fn zero() -> Self {
        Vec2::new(0.0, 0.0)
    }

    pub fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    pub fn dist(&self, p: Vec2) -> f64 {
        self.dist2(p).sqrt()
    }

    pub fn dist2(&self, p: Vec2) -> f64 {
        (*self - p).norm2()
    }

    pub fn norm(&self) -> f64 {
        self.norm2().sqrt()
    }

    pub fn norm2(&self) -> f64 {
        self.x.powi(2) + self.y.powi(2)
    }

    pub fn dot(&self, p: Vec2) -> f64 {
        self.x * p.x + self.y * p.y
    }

    /// z component of the 3D cross product, positive when `p` is counter-clockwise of
    /// `self`.
    pub fn cross(&self, p: Vec2) -> f64 {
        self.x * p.y - self.y * p.x
    }

    /// The vector rotated by 90 degrees counter-clockwise.
    pub fn perp(&self) -> Vec2 {
        Vec2::new(-self.y, self.x)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Bbox {
    pub fn new(p: Vec2) -> Self {
        Bbox { min: p, max: p }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Option<Self> {
        let mut points = points.into_iter();
        let mut bbox = Bbox::new(points.next()?);
        for p in points {
            bbox.expand(p);
        }
        Some(bbox)
    }

    pub fn min(&self) -> Vec2 {
        self.min
    }

    pub fn max(&self) -> Vec2 {
        self.max
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn expand(&mut self, p: Vec2) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);

        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn contains(&self, p: Vec2) -> bool {
        self.min.x <= p.x && self.min.y <= p.y && self.max.x >= p.x && self.max.y >= p.y
    }
}

impl Circle {
    pub fn new(center: Vec2, radius: f64) -> Self {
        Circle { center, radius }
    }

    /// Circle passing through the three given points.
    ///
    /// Collinear points have no finite circumcircle; they get an infinite one centered on
    /// their centroid so that any containment query succeeds and the owning triangle is
    /// always replaced by the next insertion.
    pub fn circumcircle(a: Vec2, b: Vec2, c: Vec2) -> Self {
        let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
        if d.abs() < 1e-12 {
            return Circle::new((a + b + c) / 3.0, f64::INFINITY);
        }

        let (a2, b2, c2) = (a.norm2(), b.norm2(), c.norm2());
        let center = Vec2::new(
            (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d,
            (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d,
        );

        Circle::new(center, center.dist(a))
    }

    pub fn contains(&self, p: Vec2) -> bool {
        if self.radius.is_infinite() {
            return true;
        }

        self.center.dist(p) <= self.radius
    }
}

impl BarycentricCoords {
    /// Coordinates of `p` in `triangle`, `None` when `p` lies outside of it or the triangle
    /// has no area.
    pub fn triangle(triangle: [Vec2; 3], p: Vec2) -> Option<Self> {
        let [a, b, c] = triangle;

        let area = (b - a).cross(c - a);
        if area.abs() < 1e-12 {
            return None;
        }

        let u = (b - p).cross(c - p) / area;
        let v = (c - p).cross(a - p) / area;
        let w = 1.0 - u - v;

        let eps = -1e-9;
        if u < eps || v < eps || w < eps {
            return None;
        }

        Some(BarycentricCoords { u, v, w })
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(mut self, rhs: Vec2) -> Self::Output {
        self.x += rhs.x;
        self.y += rhs.y;
        self
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(mut self, rhs: Vec2) -> Self::Output {
        self.x -= rhs.x;
        self.y -= rhs.y;
        self
    }
}

impl Neg for Vec2 {
    type Output = Vec2;

    fn neg(self) -> Self::Output {
        Vec2::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(mut self, rhs: f64) -> Self::Output {
        self.x *= rhs;
        self.y *= rhs;
        self
    }
}

impl Div<f64> for Vec2 {
    type Output = Vec2;

    fn div(mut self, rhs: f64) -> Self::Output {
        self.x /= rhs;
        self.y /= rhs;
        self
    }
}
