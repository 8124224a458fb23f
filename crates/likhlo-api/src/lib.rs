pub mod auth;
pub mod error;
pub mod middleware;
pub mod notes;
pub mod token;

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tracing::error;

use likhlo_db::Database;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
}

/// Build the full HTTP surface. The user routes are public; every notes
/// route sits behind `require_auth`.
pub fn router(state: AppState) -> Router {
    let users = Router::new()
        .route("/", get(auth::count_users))
        .route("/SignUp", post(auth::sign_up))
        .route("/SignIn", post(auth::sign_in));

    let notes = Router::new()
        .route("/", get(notes::search_notes))
        .route("/all", get(notes::list_notes))
        .route("/create", post(notes::create_note))
        .route(
            "/{id}",
            get(notes::get_note)
                .put(notes::update_note)
                .delete(notes::delete_note),
        )
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    let api = Router::new().nest("/users", users).nest("/notes", notes);

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", api)
        .with_state(state)
}

async fn root() -> &'static str {
    "Likhlo notes API"
}

/// Run a blocking store call off the async runtime.
pub(crate) async fn run_db<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state.db))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            ApiError::Internal(e.into())
        })?
        .map_err(ApiError::Internal)
}
