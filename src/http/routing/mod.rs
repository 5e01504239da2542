pub mod todos;

use axum::{routing::get, Json, Router};

use super::types::HealthBody;

pub fn app(router: Router) -> Router {
    Router::new()
        .route("/health", get(|| async { Json(HealthBody::current()) }))
        .nest("/api", router)
}
