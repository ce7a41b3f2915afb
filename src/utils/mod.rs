// Utility functions

pub mod format;
pub mod logger;

pub use logger::init_logger;
