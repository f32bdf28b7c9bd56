pub mod events;
pub mod frame;
pub mod rotation;

pub use events::*;
pub use frame::*;
pub use rotation::*;
