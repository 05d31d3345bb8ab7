use axum::Router;

use crate::AppState;

mod auth;
mod error;
mod handlers;
mod routes;

pub use error::AppError;
pub use auth::AuthViewer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health())
        .nest("/v1", routes::notifications())
        .with_state(state)
}
