pub mod info_panel;
pub mod labels;

pub use info_panel::*;
pub use labels::*;
