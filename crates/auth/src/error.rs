use thiserror::Error;

/// Terminal rejections of a unit of work. None are retryable; each is
/// converted immediately into a transport-appropriate response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No credential presented at all.
    #[error("Unauthorized..")]
    Unauthenticated,
    /// Credential presented but signature or expiry failed verification.
    #[error("Invalid or expired token..")]
    InvalidToken,
    /// Credential valid but insufficient privilege.
    #[error("Forbidden..")]
    Forbidden,
}
