use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, State};
use axum::http::{StatusCode, header, request::Parts};

use packhub_db::CreateUserError;
use packhub_types::{RegisterRequest, User};

use crate::{ApiError, AppState, with_db};

/// Authenticated caller, resolved from the `Authorization: Bearer <token>`
/// header against the user table.
pub struct AuthUser(pub User);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::InvalidToken)?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or(ApiError::InvalidToken)?
            .to_string();

        let user = with_db(state, move |db| db.get_user_by_token(&token))
            .await?
            .ok_or(ApiError::InvalidToken)?;

        Ok(AuthUser(user))
    }
}

/// POST /api/register — create a user and mint its bearer token.
pub async fn register(
    State(state): State<AppState>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(req) = body.map_err(|_| ApiError::Validation("invalid JSON".into()))?;

    if req.username.is_empty() {
        return Err(ApiError::Validation("username is required".into()));
    }
    let display_name = if req.display_name.is_empty() {
        req.username.clone()
    } else {
        req.display_name
    };
    let username = req.username;

    let state2 = state.clone();
    let user = tokio::task::spawn_blocking(move || state2.db.create_user(&username, &display_name))
        .await
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("blocking task failed: {e}")))?
        .map_err(|e| match e {
            CreateUserError::UsernameTaken => ApiError::Conflict,
            CreateUserError::Store(e) => ApiError::Internal(e),
        })?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/me — the caller's own record.
pub async fn me(AuthUser(user): AuthUser) -> Json<User> {
    Json(user)
}
