use std::collections::HashMap;
use std::io;
use std::io::Write;

use crate::arena::{Arena, ArenaId};
use crate::geo::{Bbox, Circle, Vec2};

/// Number of vertices of the enclosing super triangle. They're always the first vertices
/// of the mesh, so the i-th inserted point has vertex id `i + SUPER_VERTICES`.
pub const SUPER_VERTICES: usize = 3;

/// Squared distance under which an inserted point is considered a duplicate of an existing
/// vertex.
const DUPLICATE_DIST2: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct DelaunayMesh {
    pub triangles: Arena<Triangle>,
    pub vertices: Arena<Vertex>,
}

#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [ArenaId<Vertex>; 3],
    pub circumcircle: Circle,
}

#[derive(Debug, Clone)]
pub struct Vertex {
    pub position: Vec2,
}

/// The part of the mesh rewritten by a single insertion.
#[derive(Debug)]
pub struct InsertionRegion {
    pub vertex: ArenaId<Vertex>,
    pub old_triangles: Vec<ArenaId<Triangle>>,
    pub new_triangles: Vec<ArenaId<Triangle>>,
}

impl DelaunayMesh {
    /// Create an empty mesh able to hold points inside `bbox`. Points outside of it can
    /// still be inserted as long as they fall inside the (much larger) super triangle.
    pub fn new(bbox: Bbox) -> Self {
        let center = bbox.center();
        let m = bbox.width().max(bbox.height()).max(1.0) * 10.0;

        let mut vertices = Arena::new();
        let a = vertices.push(Vertex {
            position: Vec2::new(center.x - 20.0 * m, center.y - m),
        });
        let b = vertices.push(Vertex {
            position: Vec2::new(center.x + 20.0 * m, center.y - m),
        });
        let c = vertices.push(Vertex {
            position: Vec2::new(center.x, center.y + 20.0 * m),
        });

        let mut mesh = DelaunayMesh {
            triangles: Arena::new(),
            vertices,
        };
        mesh.push_triangle([a, b, c]);

        mesh
    }

    /// Triangulate `points` from scratch, inserting them in order.
    pub fn triangulate(points: &[Vec2]) -> Self {
        let bbox = Bbox::from_points(points.iter().copied().filter(Vec2::is_finite))
            .unwrap_or_else(|| Bbox::new(Vec2::zero()));

        let mut mesh = DelaunayMesh::new(bbox);
        for &p in points {
            mesh.insert(p);
        }
        mesh
    }

    /// Insert a point using Bowyer-Watson: every triangle whose circumcircle contains `p`
    /// is removed and the resulting cavity is re-triangulated around `p`.
    ///
    /// Non finite points and duplicates of existing vertices still get a vertex, so that
    /// vertex ids keep matching insertion order, but they're left out of the
    /// triangulation.
    pub fn insert(&mut self, p: Vec2) -> InsertionRegion {
        let skip = !p.is_finite()
            || self
                .vertices
                .iter()
                .any(|(_, v)| v.position.dist2(p) <= DUPLICATE_DIST2);

        let vertex = self.vertices.push(Vertex { position: p });

        if skip {
            return InsertionRegion {
                vertex,
                old_triangles: vec![],
                new_triangles: vec![],
            };
        }

        let old_triangles: Vec<_> = self
            .triangles
            .iter()
            .filter(|(_, t)| t.circumcircle.contains(p))
            .map(|(id, _)| id)
            .collect();

        // the cavity boundary is made of the edges that belong to exactly one bad triangle
        let mut edges = vec![];
        let mut edge_count = HashMap::new();
        for &tid in &old_triangles {
            let [a, b, c] = self.triangles[tid].vertices;
            for &(v0, v1) in &[(a, b), (b, c), (c, a)] {
                let key = (v0.index().min(v1.index()), v0.index().max(v1.index()));
                *edge_count.entry(key).or_insert(0) += 1;
                edges.push((key, v0, v1));
            }
        }

        for &tid in &old_triangles {
            self.triangles.remove(tid);
        }

        let new_triangles = edges
            .into_iter()
            .filter(|(key, _, _)| edge_count[key] == 1)
            .map(|(_, v0, v1)| self.push_triangle([v0, v1, vertex]))
            .collect();

        InsertionRegion {
            vertex,
            old_triangles,
            new_triangles,
        }
    }

    pub fn triangles(&self) -> impl Iterator<Item = (ArenaId<Triangle>, &Triangle)> + '_ {
        self.triangles.iter()
    }

    pub fn triangle_vertices(&self, tri: ArenaId<Triangle>) -> [Vec2; 3] {
        let [a, b, c] = self.triangles[tri].vertices;
        [
            self.vertices[a].position,
            self.vertices[b].position,
            self.vertices[c].position,
        ]
    }

    pub fn is_super_vertex(&self, v: ArenaId<Vertex>) -> bool {
        v.index() < SUPER_VERTICES
    }

    /// Triangles that don't touch the super triangle, as indices into the sequence of
    /// inserted points.
    pub fn point_triangles(&self) -> Vec<[usize; 3]> {
        self.triangles()
            .filter(|(_, t)| !t.vertices.iter().any(|&v| self.is_super_vertex(v)))
            .map(|(_, t)| {
                let [a, b, c] = t.vertices;
                [
                    a.index() - SUPER_VERTICES,
                    b.index() - SUPER_VERTICES,
                    c.index() - SUPER_VERTICES,
                ]
            })
            .collect()
    }

    fn push_triangle(&mut self, vertices: [ArenaId<Vertex>; 3]) -> ArenaId<Triangle> {
        let [a, b, c] = vertices;
        let circumcircle = Circle::circumcircle(
            self.vertices[a].position,
            self.vertices[b].position,
            self.vertices[c].position,
        );

        self.triangles.push(Triangle {
            vertices,
            circumcircle,
        })
    }
}

/// Dump the triangles that don't touch the super triangle as an svg.
pub fn dump_svg(w: &mut impl Write, mesh: &DelaunayMesh) -> io::Result<()> {
    let bbox = Bbox::from_points(
        mesh.vertices
            .iter()
            .filter(|(id, _)| !mesh.is_super_vertex(*id))
            .map(|(_, v)| v.position)
            .filter(Vec2::is_finite),
    )
    .unwrap_or_else(|| Bbox::new(Vec2::zero()));

    writeln!(
        w,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}">"#,
        bbox.min().x,
        bbox.min().y,
        bbox.width().max(1.0),
        bbox.height().max(1.0)
    )?;

    for (tri, t) in mesh.triangles() {
        if t.vertices.iter().any(|&v| mesh.is_super_vertex(v)) {
            continue;
        }

        let [a, b, c] = mesh.triangle_vertices(tri);
        writeln!(
            w,
            r#"<polygon points="{},{} {},{} {},{}" fill="none" stroke="black" stroke-width="0.5"/>"#,
            a.x, a.y, b.x, b.y, c.x, c.y
        )?;
    }

    writeln!(w, "</svg>")
}
