use thiserror::Error;
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::ConversationStage;

#[derive(Error, Debug)]
pub enum ConversationError {
    #[error("Session {0} is still processing a previous request")]
    Busy(Uuid),

    #[error("Session {0} not found")]
    SessionNotFound(Uuid),

    #[error("Free text is not accepted while the session is in stage {0:?}")]
    TextNotAccepted(ConversationStage),

    #[error("Turn for session {0} did not complete")]
    TurnFailed(Uuid),
}

impl From<ConversationError> for AppError {
    fn from(error: ConversationError) -> Self {
        let message = error.to_string();
        match error {
            ConversationError::Busy(_) => AppError::Conflict(message),
            ConversationError::SessionNotFound(_) => AppError::NotFound(message),
            ConversationError::TextNotAccepted(_) => AppError::BadRequest(message),
            ConversationError::TurnFailed(_) => AppError::Internal(message),
        }
    }
}
