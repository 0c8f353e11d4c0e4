/// Amount formatting
pub mod format;
/// Logger
pub mod logger;
