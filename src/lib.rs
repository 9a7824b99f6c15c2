pub mod animator;
pub mod color;
pub mod encode;
pub mod error;
pub mod export;
pub mod field;
pub mod frame;
pub mod geometry;
pub mod params;
pub mod raster;
pub mod transition;
pub mod triangulation;

pub use animator::{Animator, Playback};
pub use error::{TrifadeError, TrifadeResult};
pub use frame::{DrawPrimitive, Frame};
pub use params::{ParamChange, Params};
