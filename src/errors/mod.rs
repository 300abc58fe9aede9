pub mod iam_error;

pub use iam_error::{IamError, IamResult};
