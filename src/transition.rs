//!
//! Identity tracking of triangles and edges across frames.
//!
//! Vertex indices are stable for the lifetime of a point field, so a triangle (or edge) is
//! identified by its sorted vertex indices. Every identity carries a fade alpha that grows
//! while the identity is part of the current triangulation and decays once it isn't,
//! until it's forgotten.
//!

use std::collections::{HashMap, HashSet};

use rand::Rng;

use crate::color::{jittered_color, Color};
use crate::triangulation::Triangle;

/// Decaying identities at or below this alpha are dropped.
pub const PRUNE_ALPHA: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SimplexKey([usize; 3]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey([usize; 2]);

impl SimplexKey {
    pub fn new(mut vertices: Triangle) -> Self {
        vertices.sort_unstable();
        SimplexKey(vertices)
    }

    pub fn vertices(self) -> [usize; 3] {
        self.0
    }

    pub fn edges(self) -> [EdgeKey; 3] {
        let [a, b, c] = self.0;
        [EdgeKey::new(a, b), EdgeKey::new(b, c), EdgeKey::new(a, c)]
    }
}

impl EdgeKey {
    pub fn new(a: usize, b: usize) -> Self {
        EdgeKey([a.min(b), a.max(b)])
    }

    pub fn vertices(self) -> [usize; 2] {
        self.0
    }
}

/// Settings of a single fade step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepParams {
    pub delta_alpha: f64,
    pub triangles_enabled: bool,
    pub lines_enabled: bool,
    pub base_color: Color,
    /// Triangle brightness jitter, in percent.
    pub brightness_range: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionState {
    triangle_alpha: HashMap<SimplexKey, f64>,
    triangle_color: HashMap<SimplexKey, Color>,
    edge_alpha: HashMap<EdgeKey, f64>,
}

impl TransitionState {
    pub fn new() -> Self {
        TransitionState::default()
    }

    pub fn clear(&mut self) {
        self.triangle_alpha.clear();
        self.triangle_color.clear();
        self.edge_alpha.clear();
    }

    pub fn triangle_alpha(&self, key: SimplexKey) -> Option<f64> {
        self.triangle_alpha.get(&key).copied()
    }

    pub fn triangle_color(&self, key: SimplexKey) -> Option<Color> {
        self.triangle_color.get(&key).copied()
    }

    pub fn edge_alpha(&self, key: EdgeKey) -> Option<f64> {
        self.edge_alpha.get(&key).copied()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangle_alpha.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_alpha.len()
    }

    /// Tracked triangles, sorted by key.
    pub fn triangles(&self) -> Vec<(SimplexKey, f64)> {
        let mut triangles: Vec<_> = self.triangle_alpha.iter().map(|(&k, &a)| (k, a)).collect();
        triangles.sort_by_key(|&(k, _)| k);
        triangles
    }

    /// Tracked edges, sorted by key.
    pub fn edges(&self) -> Vec<(EdgeKey, f64)> {
        let mut edges: Vec<_> = self.edge_alpha.iter().map(|(&k, &a)| (k, a)).collect();
        edges.sort_by_key(|&(k, _)| k);
        edges
    }

    /// Install `triangles` as fully faded in, forgetting anything tracked before.
    pub fn settle(&mut self, triangles: &[Triangle], params: &StepParams, rng: &mut impl Rng) {
        self.clear();

        for &t in triangles {
            let key = SimplexKey::new(t);
            if !self.triangle_color.contains_key(&key) {
                let color = jittered_color(params.base_color, params.brightness_range, rng);
                self.triangle_color.insert(key, color);
            }
            self.triangle_alpha.insert(key, 1.0);

            for edge in key.edges().iter() {
                self.edge_alpha.insert(*edge, 1.0);
            }
        }
    }

    /// Advance every fade by one frame against the current triangulation.
    pub fn step(&mut self, triangles: &[Triangle], params: &StepParams, rng: &mut impl Rng) {
        // keep the triangulation order so that colors are drawn deterministically
        let mut triangle_keys = Vec::with_capacity(triangles.len());
        let mut current_triangles = HashSet::with_capacity(triangles.len());
        let mut current_edges = HashSet::with_capacity(triangles.len() * 2);
        for &t in triangles {
            let key = SimplexKey::new(t);
            if current_triangles.insert(key) {
                triangle_keys.push(key);
            }
            current_edges.extend(key.edges().iter().copied());
        }

        // a zero delta switches keys instantly
        let delta = if params.delta_alpha > 0.0 {
            params.delta_alpha
        } else {
            1.0
        };

        if params.triangles_enabled {
            for key in &triangle_keys {
                if !self.triangle_color.contains_key(key) {
                    let color = jittered_color(params.base_color, params.brightness_range, rng);
                    self.triangle_color.insert(*key, color);
                }
                self.triangle_alpha.entry(*key).or_insert(0.0);
            }

            let dropped = fade(&mut self.triangle_alpha, &current_triangles, delta);
            for key in dropped {
                self.triangle_color.remove(&key);
            }
        }

        if params.lines_enabled {
            for key in &current_edges {
                self.edge_alpha.entry(*key).or_insert(0.0);
            }

            fade(&mut self.edge_alpha, &current_edges, delta);
        }
    }
}

/// Grow present keys toward 1 and decay the others toward 0, returning the decayed keys
/// that have been dropped.
fn fade<K>(alphas: &mut HashMap<K, f64>, present: &HashSet<K>, delta: f64) -> Vec<K>
where
    K: Copy + Eq + std::hash::Hash,
{
    let mut dropped = vec![];

    for (key, alpha) in alphas.iter_mut() {
        if present.contains(key) {
            *alpha = (*alpha + delta).min(1.0);
        } else {
            *alpha = (*alpha - delta).max(0.0);
            if *alpha <= PRUNE_ALPHA {
                dropped.push(*key);
            }
        }
    }

    for key in &dropped {
        alphas.remove(key);
    }

    dropped
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn params(delta_alpha: f64) -> StepParams {
        StepParams {
            delta_alpha,
            triangles_enabled: true,
            lines_enabled: true,
            base_color: Color::new(0.5, 0.2, 0.1),
            brightness_range: 50.0,
        }
    }

    #[test]
    fn keys_are_order_independent() {
        assert_eq!(SimplexKey::new([3, 1, 2]), SimplexKey::new([2, 3, 1]));
        assert_eq!(SimplexKey::new([3, 1, 2]).vertices(), [1, 2, 3]);
        assert_eq!(EdgeKey::new(7, 2), EdgeKey::new(2, 7));
        assert_eq!(
            SimplexKey::new([0, 2, 1]).edges(),
            [EdgeKey::new(0, 1), EdgeKey::new(1, 2), EdgeKey::new(0, 2)]
        );
    }

    #[test]
    fn new_triangles_fade_in_from_zero() {
        let mut rng = Pcg64::seed_from_u64(0);
        let mut state = TransitionState::new();
        let tris = [[0, 1, 2]];

        state.step(&tris, &params(0.25), &mut rng);
        let key = SimplexKey::new([0, 1, 2]);
        assert_eq!(state.triangle_alpha(key), Some(0.25));
        assert_eq!(state.edge_alpha(EdgeKey::new(0, 1)), Some(0.25));
        assert_eq!(state.edge_count(), 3);

        for _ in 0..10 {
            state.step(&tris, &params(0.25), &mut rng);
        }
        assert_eq!(state.triangle_alpha(key), Some(1.0));
    }

    #[test]
    fn present_keys_survive_tiny_steps() {
        let mut rng = Pcg64::seed_from_u64(0);
        let mut state = TransitionState::new();

        state.step(&[[0, 1, 2]], &params(0.001), &mut rng);
        assert_eq!(state.triangle_alpha(SimplexKey::new([0, 1, 2])), Some(0.001));
    }

    #[test]
    fn absent_keys_fade_out_and_are_pruned_once() {
        let mut rng = Pcg64::seed_from_u64(0);
        let mut state = TransitionState::new();
        let key = SimplexKey::new([0, 1, 2]);

        state.settle(&[[0, 1, 2]], &params(0.3), &mut rng);
        assert_eq!(state.triangle_alpha(key), Some(1.0));

        state.step(&[], &params(0.3), &mut rng);
        assert!((state.triangle_alpha(key).unwrap() - 0.7).abs() < 1e-12);
        state.step(&[], &params(0.3), &mut rng);
        state.step(&[], &params(0.3), &mut rng);
        assert!((state.triangle_alpha(key).unwrap() - 0.1).abs() < 1e-12);
        assert!(state.triangle_color(key).is_some());

        state.step(&[], &params(0.3), &mut rng);
        assert_eq!(state.triangle_alpha(key), None);
        assert_eq!(state.triangle_color(key), None);
        assert_eq!(state.edge_count(), 0);
    }

    #[test]
    fn reappearing_keys_turn_around_without_reset() {
        let mut rng = Pcg64::seed_from_u64(0);
        let mut state = TransitionState::new();
        let key = SimplexKey::new([4, 5, 6]);

        state.settle(&[[4, 5, 6]], &params(0.2), &mut rng);
        let color = state.triangle_color(key);

        state.step(&[], &params(0.2), &mut rng);
        state.step(&[], &params(0.2), &mut rng);
        state.step(&[[6, 4, 5]], &params(0.2), &mut rng);

        assert!((state.triangle_alpha(key).unwrap() - 0.8).abs() < 1e-12);
        assert_eq!(state.triangle_color(key), color);
    }

    #[test]
    fn surviving_triangles_keep_their_color() {
        let mut rng = Pcg64::seed_from_u64(42);
        let mut state = TransitionState::new();
        let tris = [[0, 1, 2], [1, 2, 3]];

        state.step(&tris, &params(0.1), &mut rng);
        let before: Vec<_> = tris
            .iter()
            .map(|&t| state.triangle_color(SimplexKey::new(t)))
            .collect();

        for _ in 0..5 {
            state.step(&tris, &params(0.1), &mut rng);
        }
        let after: Vec<_> = tris
            .iter()
            .map(|&t| state.triangle_color(SimplexKey::new(t)))
            .collect();

        assert_eq!(before, after);
        assert!(before.iter().all(Option::is_some));
    }

    #[test]
    fn zero_delta_switches_at_once() {
        let mut rng = Pcg64::seed_from_u64(0);
        let mut state = TransitionState::new();
        let old = SimplexKey::new([0, 1, 2]);
        let new = SimplexKey::new([1, 2, 3]);

        state.settle(&[[0, 1, 2]], &params(0.0), &mut rng);
        state.step(&[[1, 2, 3]], &params(0.0), &mut rng);

        assert_eq!(state.triangle_alpha(old), None);
        assert_eq!(state.triangle_alpha(new), Some(1.0));
        assert_eq!(state.edge_alpha(EdgeKey::new(0, 1)), None);
        assert_eq!(state.edge_alpha(EdgeKey::new(1, 2)), Some(1.0));
    }

    #[test]
    fn shared_edges_are_tracked_once() {
        let mut rng = Pcg64::seed_from_u64(0);
        let mut state = TransitionState::new();

        state.step(&[[0, 1, 2], [1, 2, 3]], &params(0.1), &mut rng);
        assert_eq!(state.edge_count(), 5);
        assert_eq!(state.triangle_count(), 2);
    }

    #[test]
    fn disabled_kinds_are_left_alone() {
        let mut rng = Pcg64::seed_from_u64(0);
        let mut state = TransitionState::new();
        let p = StepParams {
            triangles_enabled: false,
            ..params(0.1)
        };

        state.step(&[[0, 1, 2]], &p, &mut rng);
        assert_eq!(state.triangle_count(), 0);
        assert_eq!(state.edge_count(), 3);

        let p = StepParams {
            lines_enabled: false,
            ..params(0.1)
        };
        state.step(&[], &p, &mut rng);
        assert_eq!(state.edges().len(), 3);
        assert!(state.edges().iter().all(|&(_, a)| (a - 0.1).abs() < 1e-12));
    }
}
