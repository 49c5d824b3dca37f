use {
    axum::{
        Json,
        http::StatusCode,
        response::{IntoResponse, Response},
    },
    thiserror::Error,
    tracing::{error, warn},
};

use {storefront_auth::AuthError, storefront_store::StoreError};

/// Gateway-level failure, rendered as `{"message": ...}` JSON with the
/// matching status. Every variant is terminal for the current request.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Invalid email or password..")]
    BadCredentials,
    #[error("{0}")]
    BadRequest(String),
    #[error("Not found..")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("Something went wrong..")]
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Auth(AuthError::Unauthenticated | AuthError::InvalidToken) => {
                StatusCode::UNAUTHORIZED
            },
            Self::Auth(AuthError::Forbidden) => StatusCode::FORBIDDEN,
            Self::BadCredentials => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(status = %status, "request failed");
        } else {
            warn!(status = %status, message = %self, "request rejected");
        }
        (status, Json(serde_json::json!({ "message": self.to_string() }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::DuplicateEmail => Self::Conflict("Email already registered..".into()),
            StoreError::Db(e) => {
                error!(error = %e, "store query failed");
                Self::Internal
            },
            StoreError::Decode(e) => {
                error!(error = %e, "document decode failed");
                Self::Internal
            },
        }
    }
}
