//!
//! Incremental Delaunay triangulation of points in the plane.
//!

pub mod arena;
pub mod geo;
pub mod mesh;

pub use mesh::{DelaunayMesh, InsertionRegion};
