pub mod controller;
pub mod pacing;
pub mod store;

pub use controller::{DialogueController, DialogueSettings};
pub use pacing::TypingPacer;
pub use store::{SessionSnapshot, SessionStore};
