use delaunay_mesh::geo::Vec2;
use delaunay_mesh::DelaunayMesh;
use tracing::{debug, trace};

use crate::error::{TrifadeError, TrifadeResult};

/// A triangle as indices into the point sequence it was computed from.
pub type Triangle = [usize; 3];

/// Delaunay triangulation of `points`, failing on inputs that can't have any triangle.
pub fn try_triangulate(points: &[Vec2]) -> TrifadeResult<Vec<Triangle>> {
    if points.len() < 3 {
        return Err(TrifadeError::degenerate(format!(
            "{} points can't form a triangle",
            points.len()
        )));
    }

    let triangles = DelaunayMesh::triangulate(points).point_triangles();
    if triangles.is_empty() {
        return Err(TrifadeError::degenerate(format!(
            "{} points are all collinear or coincident",
            points.len()
        )));
    }

    trace!(
        points = points.len(),
        triangles = triangles.len(),
        "triangulated"
    );
    Ok(triangles)
}

/// Like `try_triangulate` but degenerate inputs just give no triangles.
pub fn triangulate(points: &[Vec2]) -> Vec<Triangle> {
    try_triangulate(points).unwrap_or_else(|e| {
        debug!("{}", e);
        vec![]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_few_points_is_degenerate() {
        let err = try_triangulate(&[Vec2::zero(), Vec2::new(1.0, 0.0)]).unwrap_err();
        assert!(matches!(err, TrifadeError::DegenerateTriangulation(_)));
        assert!(triangulate(&[]).is_empty());
    }

    #[test]
    fn collinear_points_give_no_triangles() {
        let points: Vec<_> = (0..5).map(|i| Vec2::new(f64::from(i), 2.0 * f64::from(i))).collect();
        assert!(triangulate(&points).is_empty());
    }

    #[test]
    fn indices_refer_to_input_points() {
        let points = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(5.0, 8.0),
            Vec2::new(5.0, 3.0),
        ];

        let triangles = triangulate(&points);
        assert_eq!(triangles.len(), 3);
        for t in &triangles {
            assert!(t.contains(&3));
            assert!(t.iter().all(|&i| i < points.len()));
        }
    }
}
