//! IAM credential token and its expiry bookkeeping.

use serde::{Deserialize, Serialize};

/// Fraction of the access token lifetime after which a refresh is due.
///
/// The remaining 20% is kept as a margin so that an in-flight request does
/// not race the server-side expiry.
pub const TOKEN_REFRESH_FRACTION: f64 = 0.8;

/// How long past the last access token's expiration the refresh token is
/// still assumed to be usable.
///
/// IAM does not report the refresh token's own lifetime. Refresh tokens
/// currently live for 30 days, but the only anchor available is the access
/// token's `expiration`, so this is a conservative approximation rather than
/// a guarantee.
pub const REFRESH_TOKEN_GRACE_SECS: i64 = 7 * 24 * 60 * 60;

/// Token response returned by the IAM token endpoint.
///
/// The manager stores this verbatim and replaces it wholesale on every
/// request or refresh; it is never patched field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialToken {
    /// Opaque bearer credential
    pub access_token: String,
    /// Token type, `Bearer` in practice
    #[serde(default)]
    pub token_type: String,
    /// Lifetime of the access token in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Absolute expiry of the access token in epoch seconds, as issued by the server
    #[serde(default)]
    pub expiration: Option<i64>,
    /// Opaque refresh credential
    #[serde(default)]
    pub refresh_token: String,
}

impl CredentialToken {
    /// Whether the access token is inside its refresh window at `now`.
    ///
    /// A token without `expires_in` or `expiration` is always treated as expired.
    pub fn is_expired_at(&self, now: i64) -> bool {
        let (Some(expires_in), Some(expiration)) = (self.expires_in, self.expiration) else {
            return true;
        };

        let refresh_time = expiration as f64 - expires_in as f64 * (1.0 - TOKEN_REFRESH_FRACTION);
        refresh_time < now as f64
    }

    /// Whether the refresh token should no longer be used at `now`.
    pub fn is_refresh_token_expired_at(&self, now: i64) -> bool {
        match self.expiration {
            None => true,
            Some(expiration) => now > expiration + REFRESH_TOKEN_GRACE_SECS,
        }
    }
}

/// Current wall-clock time in epoch seconds.
pub(crate) fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
