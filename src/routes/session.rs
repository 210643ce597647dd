use axum::{
    Json, Router,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::Response,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::error::ErrorResponse;
use crate::{
    AppState,
    auth::{AuthError, SessionState},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session", get(current_session))
        .route("/session/sign-in", post(sign_in))
        .route("/session/sign-out", post(sign_out))
}

/// Identity attached to admin requests once the guard has admitted the
/// session.
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    /// Opaque identity assertion obtained from the provider's client flow.
    pub assertion: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionResponse {
    SignedOut,
    Unauthorized { email: String },
    Authorized { email: String },
}

impl From<SessionState> for SessionResponse {
    fn from(state: SessionState) -> Self {
        match state {
            SessionState::SignedOut => Self::SignedOut,
            SessionState::Unauthorized(email) => Self::Unauthorized { email },
            SessionState::Authorized(email) => Self::Authorized { email },
        }
    }
}

#[instrument(name = "session.sign_in", skip_all)]
async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> Result<Json<SessionResponse>, ErrorResponse> {
    match state.guard().sign_in(&payload.assertion).await {
        Ok(email) => Ok(Json(SessionResponse::Authorized { email })),
        Err(AuthError::Denied { .. }) => Err(ErrorResponse::new(
            StatusCode::FORBIDDEN,
            "account is not authorized for the content manager",
        )),
        Err(AuthError::Provider(reason)) => {
            tracing::warn!(%reason, "provider sign-in failed");
            Err(ErrorResponse::new(
                StatusCode::UNAUTHORIZED,
                "sign-in failed, try again",
            ))
        }
    }
}

#[instrument(name = "session.current", skip_all)]
async fn current_session(State(state): State<AppState>) -> Json<SessionResponse> {
    Json(state.guard().current().into())
}

#[instrument(name = "session.sign_out", skip_all)]
async fn sign_out(State(state): State<AppState>) -> StatusCode {
    state.guard().sign_out().await;
    StatusCode::NO_CONTENT
}

/// Gate for admin routes. Every request must present its own bearer
/// assertion; the guard verifies it with the provider and applies the
/// allow-list. A missing or failed assertion is 401, a verified but unlisted
/// account 403. Nothing carries over from other callers' sessions.
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ErrorResponse> {
    let assertion = bearer_assertion(&request)
        .ok_or_else(|| ErrorResponse::new(StatusCode::UNAUTHORIZED, "sign in required"))?;

    match state.guard().sign_in(&assertion).await {
        Ok(email) => {
            request.extensions_mut().insert(AdminContext { email });
            Ok(next.run(request).await)
        }
        Err(AuthError::Denied { .. }) => Err(ErrorResponse::new(
            StatusCode::FORBIDDEN,
            "access denied",
        )),
        Err(AuthError::Provider(reason)) => {
            tracing::warn!(%reason, "admin assertion rejected");
            Err(ErrorResponse::new(
                StatusCode::UNAUTHORIZED,
                "sign in required",
            ))
        }
    }
}

fn bearer_assertion(request: &Request) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}
