pub mod cache;
pub mod region;
pub mod registry;

pub use cache::*;
pub use region::*;
pub use registry::*;
