use {
    chrono::{Duration, Utc},
    jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode},
    tracing::debug,
};

use crate::{claims::{Identity, SessionClaims}, error::AuthError};

/// Default session lifetime when the config does not override it.
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// The shared verify-and-decode primitive.
///
/// Constructed once from an explicitly provided secret and handed to both
/// transport adapters; verification is deterministic and side-effect free,
/// so concurrent use needs no synchronization.
#[derive(Clone)]
pub struct TokenVerifier {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self::with_ttl(secret, Duration::hours(DEFAULT_TOKEN_TTL_HOURS))
    }

    pub fn with_ttl(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        }
    }

    /// Issue a signed session token for `id` with an embedded expiry.
    pub fn issue(&self, id: &str, role: Option<&str>) -> Result<String, AuthError> {
        let claims = SessionClaims {
            id: id.to_owned(),
            role: role.map(str::to_owned),
            exp: (Utc::now() + self.ttl).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(|e| {
            debug!(error = %e, "token signing failed");
            AuthError::InvalidToken
        })
    }

    /// Verify signature and expiry, returning the embedded identity.
    ///
    /// Signature mismatch, malformed tokens and clock-based expiry all map
    /// to [`AuthError::InvalidToken`]; the caller distinguishes a missing
    /// credential before reaching this point.
    pub fn verify(&self, raw: &str) -> Result<Identity, AuthError> {
        decode::<SessionClaims>(raw, &self.decoding, &self.validation)
            .map(|data| data.claims.into())
            .map_err(|e| {
                debug!(error = %e, "token verification failed");
                AuthError::InvalidToken
            })
    }
}
