//! HTTP route definitions

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::error;

use crate::app::{AppState, FormMode, SessionError, Submitted};
use crate::http::middleware::require_login;
use crate::store::{Product, ProductId, StorageError, StoreError, Summary};
use crate::util::time::uptime_secs;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    let allowed_origins: Vec<header::HeaderValue> = state
        .config
        .client_origin
        .split(',')
        .filter_map(|s| {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                s.parse::<header::HeaderValue>().ok()
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    // Public routes (no login required)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler));

    // Gated routes (login required)
    let protected_routes = Router::new()
        .route("/dashboard", get(dashboard_handler))
        .route("/products", get(list_handler).post(submit_handler))
        .route("/products/reset", post(reset_handler))
        .route("/products/:id/edit", post(edit_handler))
        .route("/products/:id", delete(delete_handler))
        .route("/preferences/dark-mode", post(dark_mode_handler))
        .layer(middleware::from_fn_with_state(state.clone(), require_login));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    products: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let products = state.inventory.lock().store.len();

    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        products,
    })
}

// ============================================================================
// Session endpoints
// ============================================================================

#[derive(Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
struct NavigateResponse {
    status: &'static str,
    redirect: &'static str,
}

async fn login_handler(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<NavigateResponse>, AppError> {
    let Json(req) = payload?;
    state.session.login(&req.email, &req.password)?;

    Ok(Json(NavigateResponse {
        status: "ok",
        redirect: "dashboard",
    }))
}

async fn logout_handler(State(state): State<AppState>) -> Result<Json<NavigateResponse>, AppError> {
    state.session.logout()?;

    Ok(Json(NavigateResponse {
        status: "ok",
        redirect: "index",
    }))
}

// ============================================================================
// Dashboard endpoint
// ============================================================================

#[derive(Serialize)]
struct DashboardResponse {
    #[serde(flatten)]
    summary: Summary,
    dark_mode: bool,
}

async fn dashboard_handler(State(state): State<AppState>) -> Result<Json<DashboardResponse>, AppError> {
    // Read straight from storage, as a freshly loaded dashboard page would
    let products = state.inventory.lock().store.load()?;
    let dark_mode = state.preferences.dark_mode()?;

    Ok(Json(DashboardResponse {
        summary: Summary::of(&products),
        dark_mode,
    }))
}

// ============================================================================
// Product list endpoints
// ============================================================================

/// A form field that may arrive as text or as a bare JSON number
#[derive(Deserialize)]
#[serde(untagged)]
enum FormField {
    Text(String),
    Number(serde_json::Number),
}

impl Default for FormField {
    fn default() -> Self {
        FormField::Text(String::new())
    }
}

impl FormField {
    fn text(&self) -> String {
        match self {
            FormField::Text(s) => s.clone(),
            FormField::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ProductForm {
    #[serde(default)]
    name: FormField,
    #[serde(default)]
    price: FormField,
}

#[derive(Serialize)]
struct ListResponse {
    products: Vec<Product>,
    empty: bool,
    form: FormMode,
}

#[derive(Serialize)]
struct SubmitResponse {
    #[serde(flatten)]
    submitted: Submitted,
    products: Vec<Product>,
}

#[derive(Serialize)]
struct EditResponse {
    product: Product,
    form: FormMode,
}

#[derive(Deserialize)]
struct DeleteQuery {
    #[serde(default)]
    confirm: bool,
}

#[derive(Serialize)]
struct DeleteResponse {
    removed: usize,
    products: Vec<Product>,
}

async fn list_handler(State(state): State<AppState>) -> Result<Json<ListResponse>, AppError> {
    let mut guard = state.inventory.lock();
    let inventory = &mut *guard;
    inventory.view.enter(&mut inventory.store)?;

    let products = inventory.store.list().to_vec();
    Ok(Json(ListResponse {
        empty: products.is_empty(),
        products,
        form: inventory.view.mode(),
    }))
}

async fn submit_handler(
    State(state): State<AppState>,
    payload: Result<Json<ProductForm>, JsonRejection>,
) -> Result<Json<SubmitResponse>, AppError> {
    let Json(form) = payload?;
    let mut guard = state.inventory.lock();
    let inventory = &mut *guard;
    let submitted = inventory
        .view
        .submit(&mut inventory.store, &form.name.text(), &form.price.text())?;

    Ok(Json(SubmitResponse {
        submitted,
        products: inventory.store.list().to_vec(),
    }))
}

async fn reset_handler(State(state): State<AppState>) -> Json<EditState> {
    let mut inventory = state.inventory.lock();
    inventory.view.reset();

    Json(EditState {
        form: inventory.view.mode(),
    })
}

#[derive(Serialize)]
struct EditState {
    form: FormMode,
}

async fn edit_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EditResponse>, AppError> {
    let id: ProductId = id.parse()?;

    let mut guard = state.inventory.lock();
    let inventory = &mut *guard;
    let product = inventory.view.begin_edit(&inventory.store, id)?;

    Ok(Json(EditResponse {
        product,
        form: inventory.view.mode(),
    }))
}

async fn delete_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<DeleteResponse>, AppError> {
    let id: ProductId = id.parse()?;

    let mut guard = state.inventory.lock();
    let inventory = &mut *guard;
    let removed = inventory.view.delete(&mut inventory.store, id, query.confirm)?;

    Ok(Json(DeleteResponse {
        removed,
        products: inventory.store.list().to_vec(),
    }))
}

// ============================================================================
// Preference endpoints
// ============================================================================

#[derive(Serialize)]
struct DarkModeResponse {
    dark_mode: bool,
}

async fn dark_mode_handler(State(state): State<AppState>) -> Result<Json<DarkModeResponse>, AppError> {
    let dark_mode = state.preferences.toggle_dark_mode()?;
    Ok(Json(DarkModeResponse { dark_mode }))
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(msg) => AppError::BadRequest(msg),
            StoreError::NotFound(_) => AppError::NotFound(e.to_string()),
            StoreError::IdsExhausted => AppError::Internal(e.to_string()),
            StoreError::Storage(e) => e.into(),
        }
    }
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::MissingCredentials => AppError::BadRequest(e.to_string()),
            SessionError::Storage(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        error!("Storage failure: {}", e);
        AppError::Internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
