use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use conversation_cell::{conversation_routes, SessionStore};

pub fn create_router(store: Arc<SessionStore>) -> Router {
    Router::new()
        .route("/", get(|| async { "Booking assistant API is running!" }))
        .nest("/chat", conversation_routes(store))
}
