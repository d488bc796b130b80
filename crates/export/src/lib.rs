pub mod error;
pub mod render;

pub use error::{ExportError, Result};
pub use render::{render_printable, suggested_filename};
