use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{errors::ApiError, state::ServerState};

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginOutput {
    pub token: String,
}

#[utoipa::path(
    post, path = "/login", tag = "auth",
    request_body = crate::openapi::LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = crate::openapi::LoginResponseDoc),
        (status = 400, description = "Missing email or password", body = crate::openapi::ErrorBody)
    )
)]
pub async fn login(
    State(state): State<ServerState>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<Json<LoginOutput>, ApiError> {
    let Json(input) = payload.map_err(|_| ApiError::Validation("invalid request payload".into()))?;
    let token = state.auth.login(&input.email, &input.password)?;
    Ok(Json(LoginOutput { token }))
}

/// Rejects the request unless it carries `Authorization: Bearer <token>` with
/// the configured token. The scheme is matched case-insensitively.
pub async fn require_bearer_token(
    State(state): State<ServerState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_default();
    if header.trim().is_empty() {
        return Err(ApiError::Unauthorized("missing authorization header".into()));
    }

    let token = match header.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => token,
        _ => {
            warn!(path = %req.uri().path(), "auth_scheme_rejected");
            return Err(ApiError::Unauthorized("invalid token".into()));
        }
    };
    if !state.auth.validate(token) {
        warn!(path = %req.uri().path(), "auth_token_rejected");
        return Err(ApiError::Unauthorized("invalid token".into()));
    }

    Ok(next.run(req).await)
}
