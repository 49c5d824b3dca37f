use serde::{Deserialize, Serialize};

/// Wire payload of the session token: subject id, optional role, expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Expiration as unix seconds (validated by the verifier).
    pub exp: usize,
}

/// Decoded identity attached to one request or one connection.
///
/// A unit of work carries either no identity (anonymous) or exactly one,
/// derived from exactly one successfully verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub role: Option<String>,
}

impl From<SessionClaims> for Identity {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.id,
            role: claims.role,
        }
    }
}
