use std::sync::Arc;

use axum::{routing::{get, post}, Router};

use crate::handlers::*;
use crate::services::SessionStore;

pub fn conversation_routes(store: Arc<SessionStore>) -> Router {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/events", post(post_event))
        .route("/sessions/{id}/text", post(post_text))
        .with_state(store)
}
