pub mod config;
pub mod core;
pub mod errors;

// Re-export commonly used items for convenience
pub use config::SdkConfig;
pub use core::*;
pub use errors::iam_error::{IamError, IamResult};
