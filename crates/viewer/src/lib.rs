pub mod app;
pub mod config;
pub mod effects;
pub mod error;

pub use app::*;
pub use config::*;
pub use effects::*;
pub use error::*;
