pub mod globe;
pub mod stars;

pub use globe::*;
pub use stars::*;
