pub mod console;
pub mod export;
pub mod sanitize;

pub use console::{console, ConsoleArgs};
pub use export::{export, ExportArgs};
pub use sanitize::{sanitize, SanitizeArgs};
