//! Login gating middleware

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use tracing::{error, warn};

use crate::app::AppState;

/// Page a refused request should navigate to
pub const LOGIN_PAGE: &str = "login";

/// Gating errors
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    #[error("Login required")]
    NotLoggedIn,

    #[error("Session storage unavailable: {0}")]
    Storage(String),
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            GateError::NotLoggedIn => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({ "error": self.to_string(), "redirect": LOGIN_PAGE }),
            ),
            GateError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": self.to_string() }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Middleware refusing requests while the session flag is unset
pub async fn require_login(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, GateError> {
    let logged_in = state.session.is_logged_in().map_err(|e| {
        error!("Failed to read session flag: {}", e);
        GateError::Storage(e.to_string())
    })?;

    if !logged_in {
        warn!(path = %request.uri().path(), "Refused request without login");
        return Err(GateError::NotLoggedIn);
    }

    Ok(next.run(request).await)
}
