use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::events::DialogueEvent;
use crate::services::SessionStore;

#[derive(Debug, Deserialize)]
pub struct TextInput {
    pub text: String,
}

#[axum::debug_handler]
pub async fn create_session(
    State(store): State<Arc<SessionStore>>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let snapshot = store.create().await;
    Ok((StatusCode::CREATED, Json(json!(snapshot))))
}

#[axum::debug_handler]
pub async fn get_session(
    State(store): State<Arc<SessionStore>>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let snapshot = store.snapshot(session_id).await?;
    Ok(Json(json!(snapshot)))
}

#[axum::debug_handler]
pub async fn post_event(
    State(store): State<Arc<SessionStore>>,
    Path(session_id): Path<Uuid>,
    Json(event): Json<DialogueEvent>,
) -> Result<Json<Value>, AppError> {
    let snapshot = store.dispatch(session_id, event).await?;
    Ok(Json(json!(snapshot)))
}

#[axum::debug_handler]
pub async fn post_text(
    State(store): State<Arc<SessionStore>>,
    Path(session_id): Path<Uuid>,
    Json(input): Json<TextInput>,
) -> Result<Json<Value>, AppError> {
    let snapshot = store.dispatch_text(session_id, input.text).await?;
    Ok(Json(json!(snapshot)))
}

#[axum::debug_handler]
pub async fn delete_session(
    State(store): State<Arc<SessionStore>>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    store.remove(session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
