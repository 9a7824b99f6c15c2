//!
//! Turns the simulation state into an ordered list of draw primitives. The same assembly
//! feeds the live preview and exports, so both show exactly the same picture.
//!

use std::collections::HashSet;

use delaunay_mesh::geo::Vec2;

use crate::color::{Color, Rgba};
use crate::params::Params;
use crate::transition::{EdgeKey, SimplexKey, TransitionState};
use crate::triangulation::Triangle;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawPrimitive {
    Fill {
        vertices: [Vec2; 3],
        color: Rgba,
    },
    Line {
        from: Vec2,
        to: Vec2,
        width: f64,
        color: Rgba,
    },
    Marker {
        center: Vec2,
        size: f64,
        color: Rgba,
    },
}

/// Everything a renderer needs to draw one frame, in canvas coordinates (origin at the
/// bottom left corner).
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub background: Color,
    pub primitives: Vec<DrawPrimitive>,
}

/// Build the frame for `points` and their current `triangles`: fills first, then lines,
/// then points on top.
///
/// Triangles and edges still fading out after leaving the triangulation are drawn after
/// the current ones, at the current position of their vertices.
pub fn assemble(
    points: &[Vec2],
    triangles: &[Triangle],
    transitions: &TransitionState,
    params: &Params,
) -> Frame {
    let base = params.base_color();
    let mut primitives = vec![];

    let current: Vec<SimplexKey> = triangles.iter().map(|&t| SimplexKey::new(t)).collect();

    let triangles_alpha = params.triangles_alpha();
    if triangles_alpha > 0.0 {
        let mut seen = HashSet::new();
        let fading = transitions.triangles().into_iter().map(|(k, _)| k);

        for key in current.iter().copied().chain(fading) {
            if !seen.insert(key) {
                continue;
            }

            let (alpha, color) = match (
                transitions.triangle_alpha(key),
                transitions.triangle_color(key),
            ) {
                (Some(alpha), Some(color)) => (alpha, color),
                _ => continue,
            };

            let [a, b, c] = key.vertices();
            let vertices = match (points.get(a), points.get(b), points.get(c)) {
                (Some(&a), Some(&b), Some(&c)) => [a, b, c],
                _ => continue,
            };

            primitives.push(DrawPrimitive::Fill {
                vertices,
                color: color.with_alpha(alpha * triangles_alpha),
            });
        }
    }

    let lines_alpha = params.lines_alpha();
    if lines_alpha > 0.0 {
        let mut seen = HashSet::new();
        let current_edges = current.iter().flat_map(|k| k.edges().to_vec());
        let fading = transitions.edges().into_iter().map(|(k, _)| k);

        for key in current_edges.chain(fading) {
            if !seen.insert(key) {
                continue;
            }

            if let Some(line) = edge_line(points, key, transitions, base, lines_alpha, params) {
                primitives.push(line);
            }
        }
    }

    if params.toggles.show_points {
        for &center in points {
            primitives.push(DrawPrimitive::Marker {
                center,
                size: params.point_size,
                color: base.with_alpha(1.0),
            });
        }
    }

    Frame {
        width: params.width,
        height: params.height,
        background: params.background_color(),
        primitives,
    }
}

fn edge_line(
    points: &[Vec2],
    key: EdgeKey,
    transitions: &TransitionState,
    base: Color,
    lines_alpha: f64,
    params: &Params,
) -> Option<DrawPrimitive> {
    let alpha = transitions.edge_alpha(key)?;
    let [a, b] = key.vertices();

    Some(DrawPrimitive::Line {
        from: *points.get(a)?,
        to: *points.get(b)?,
        width: params.line_width,
        color: base.with_alpha(alpha * lines_alpha),
    })
}

impl Frame {
    pub fn fills(&self) -> impl Iterator<Item = &DrawPrimitive> + '_ {
        self.primitives
            .iter()
            .filter(|p| matches!(p, DrawPrimitive::Fill { .. }))
    }

    pub fn lines(&self) -> impl Iterator<Item = &DrawPrimitive> + '_ {
        self.primitives
            .iter()
            .filter(|p| matches!(p, DrawPrimitive::Line { .. }))
    }

    pub fn markers(&self) -> impl Iterator<Item = &DrawPrimitive> + '_ {
        self.primitives
            .iter()
            .filter(|p| matches!(p, DrawPrimitive::Marker { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    use crate::transition::StepParams;

    fn square() -> Vec<Vec2> {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(10.0, 0.0),
            Vec2::new(0.0, 10.0),
            Vec2::new(10.0, 10.0),
        ]
    }

    fn step_params(params: &Params) -> StepParams {
        StepParams {
            delta_alpha: 0.5,
            triangles_enabled: params.toggles.fill_triangles,
            lines_enabled: params.toggles.show_lines,
            base_color: params.base_color(),
            brightness_range: params.brightness_range,
        }
    }

    fn params() -> Params {
        let mut p = Params {
            width: 10,
            height: 10,
            ..Params::default()
        };
        p.toggles.fill_triangles = true;
        p
    }

    #[test]
    fn primitives_are_ordered_fills_lines_points() {
        let mut rng = Pcg64::seed_from_u64(0);
        let p = params();
        let tris = [[0, 1, 3], [0, 3, 2]];
        let mut transitions = TransitionState::new();
        transitions.step(&tris, &step_params(&p), &mut rng);

        let frame = assemble(&square(), &tris, &transitions, &p);

        assert_eq!(frame.fills().count(), 2);
        assert_eq!(frame.lines().count(), 5);
        assert_eq!(frame.markers().count(), 4);

        let kinds: Vec<u8> = frame
            .primitives
            .iter()
            .map(|p| match p {
                DrawPrimitive::Fill { .. } => 0,
                DrawPrimitive::Line { .. } => 1,
                DrawPrimitive::Marker { .. } => 2,
            })
            .collect();
        let mut sorted = kinds.clone();
        sorted.sort();
        assert_eq!(kinds, sorted);
    }

    #[test]
    fn alphas_are_multiplied_by_toggles() {
        let mut rng = Pcg64::seed_from_u64(0);
        let p = params();
        let tris = [[0, 1, 3]];
        let mut transitions = TransitionState::new();
        transitions.step(&tris, &step_params(&p), &mut rng);

        let frame = assemble(&square(), &tris, &transitions, &p);
        for prim in &frame.primitives {
            match prim {
                DrawPrimitive::Fill { color, .. } | DrawPrimitive::Line { color, .. } => {
                    assert_eq!(color.a, 0.5)
                }
                DrawPrimitive::Marker { color, .. } => assert_eq!(color.a, 1.0),
            }
        }

        let mut hidden = p.clone();
        hidden.toggles.fill_triangles = false;
        hidden.toggles.show_lines = false;
        hidden.toggles.show_points = false;
        let frame = assemble(&square(), &tris, &transitions, &hidden);
        assert!(frame.primitives.is_empty());
    }

    #[test]
    fn fading_out_triangles_are_still_drawn() {
        let mut rng = Pcg64::seed_from_u64(0);
        let p = params();
        let mut transitions = TransitionState::new();
        transitions.settle(&[[0, 1, 3]], &step_params(&p), &mut rng);
        transitions.step(&[[0, 3, 2]], &step_params(&p), &mut rng);

        let frame = assemble(&square(), &[[0, 3, 2]], &transitions, &p);
        let fills: Vec<_> = frame.fills().collect();
        assert_eq!(fills.len(), 2);

        match fills[1] {
            DrawPrimitive::Fill { vertices, color } => {
                assert_eq!(color.a, 0.5);
                assert_eq!(vertices[2], Vec2::new(10.0, 10.0));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn zero_delta_drops_absent_triangles_from_the_frame() {
        let mut rng = Pcg64::seed_from_u64(0);
        let p = params();
        let still = StepParams {
            delta_alpha: 0.0,
            ..step_params(&p)
        };

        let mut transitions = TransitionState::new();
        transitions.settle(&[[0, 1, 3]], &still, &mut rng);
        transitions.step(&[[0, 3, 2]], &still, &mut rng);

        let frame = assemble(&square(), &[[0, 3, 2]], &transitions, &p);
        let fills: Vec<_> = frame.fills().collect();
        assert_eq!(fills.len(), 1);

        match fills[0] {
            DrawPrimitive::Fill { vertices, color } => {
                assert_eq!(color.a, 1.0);
                assert_eq!(vertices, &[square()[0], square()[2], square()[3]]);
            }
            _ => unreachable!(),
        }
        assert_eq!(frame.lines().count(), 3);
    }

    #[test]
    fn frame_carries_canvas_and_background() {
        let p = params();
        let frame = assemble(&square(), &[], &TransitionState::new(), &p);
        assert_eq!((frame.width, frame.height), (10, 10));
        assert_eq!(frame.background, p.background_color());
        assert_eq!(frame.markers().count(), 4);
    }
}
