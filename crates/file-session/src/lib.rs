pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod session;

#[cfg(feature = "ws-api")]
pub mod ws_api;

pub use config::ServerConfig;
pub use dispatcher::{Dispatcher, INTERNAL_ERROR, INVALID_MESSAGE};
pub use error::{Result, SessionError};
pub use events::{EventBroadcaster, EventStream, SessionEvent};
pub use session::{FileSession, SessionId, SessionManager, SessionStatus, SessionSummary};
