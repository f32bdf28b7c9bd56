pub mod camera;
pub mod components;
pub mod graph;
pub mod host;
pub mod markers;
pub mod orbit;
pub mod picking;
pub mod pointer;
pub mod prefabs;

pub use camera::*;
pub use graph::*;
pub use host::*;
pub use markers::*;
pub use picking::*;
pub use pointer::*;
