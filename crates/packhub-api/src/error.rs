use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use packhub_types::ErrorBody;
use thiserror::Error;
use tracing::error;

/// Error taxonomy for the HTTP surface. Every variant renders as a flat
/// `{"error": "<message>"}` body with the matching status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    /// Missing header, malformed header, and unknown token all collapse into
    /// this one outcome; the caller cannot tell them apart.
    #[error("invalid token")]
    InvalidToken,
    #[error("not your pack")]
    Forbidden,
    #[error("pack not found")]
    NotFound,
    #[error("username already taken")]
    Conflict,
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidToken => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(err) = &self {
            error!("internal error: {err:#}");
        }
        (
            self.status(),
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::Validation("name is required".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn messages_stay_flat_and_generic() {
        assert_eq!(ApiError::InvalidToken.to_string(), "invalid token");
        assert_eq!(ApiError::Forbidden.to_string(), "not your pack");
        assert_eq!(ApiError::Conflict.to_string(), "username already taken");
        // Internal detail never leaks into the body.
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("db exploded")).to_string(),
            "internal server error"
        );
    }
}
