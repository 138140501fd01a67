/// Diagnostic records and per-file/per-package storage
mod data;
/// Logger values passed into passes, and the logging macros
mod logging;

pub use data::*;
pub use logging::*;
