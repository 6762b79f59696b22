pub mod models;
pub mod events;
pub mod i18n;
pub mod error;
pub mod services;
pub mod handlers;
pub mod router;

pub use models::*;
pub use events::*;
pub use error::*;
pub use services::*;
pub use router::conversation_routes;
