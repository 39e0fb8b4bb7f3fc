mod archive;
mod edits;
mod history;
mod projects;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn project_router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(projects::list).post(projects::create))
        .route("/projects/import", post(archive::import))
        .route("/projects/{id}", get(projects::get).delete(projects::delete))
        .route("/projects/{id}/save", post(projects::save))
        .route("/projects/{id}/open", post(projects::open))
        .route("/projects/{id}/rename", post(projects::rename))
        .route("/projects/{id}/tree", get(edits::tree))
        .route("/projects/{id}/file", get(edits::file))
        .route("/projects/{id}/commands", post(edits::command))
        .route("/projects/{id}/plan", post(edits::plan))
        .route("/projects/{id}/history", get(history::show))
        .route("/projects/{id}/history/jump", post(history::jump))
        .route("/projects/{id}/undo", post(history::undo))
        .route("/projects/{id}/redo", post(history::redo))
        .route("/projects/{id}/export", get(archive::export))
}

/// The full application with its HTTP layers.
pub fn app(state: AppState) -> Router {
    // CORS: same-origin only by default (no cross-origin requests allowed)
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);
    let body_limit = state.config.max_body_bytes();

    Router::new()
        .nest("/api", project_router())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
