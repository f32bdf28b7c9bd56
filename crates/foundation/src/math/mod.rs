pub mod geo;
pub mod mat;
pub mod precision;
pub mod vec;

pub use geo::*;
pub use mat::*;
pub use precision::*;
pub use vec::*;
