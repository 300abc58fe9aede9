//! Provider infrastructure for external cloud services.
//!
//! # Available Providers
//!
//! - **iam**: IBM Cloud IAM token exchange and caching

pub mod iam;

// Re-export IAM types for convenience
pub use iam::{
    CredentialToken, DEFAULT_IAM_URL, IamTokenManager, SharedIamTokenManager,
    StaticTokenProvider, TokenProvider,
};
