//! desklink — remote-control client session for a single managed host.
//!
//! Maintains one JSON-over-WebSocket connection to a control endpoint,
//! derives an online/offline status from heartbeat timing, gates outgoing
//! commands behind a cooldown, and keeps bounded logs and metric windows
//! for display. All state lives in a single session task; consumers read
//! immutable snapshots and send user intents through [`Session::dispatch`].

pub mod config;
pub mod cooldown;
pub mod error;
pub mod history;
pub mod liveness;
pub mod models;
pub mod protocol;
pub mod session;
pub mod transport;

pub use config::{load_config, Config};
pub use error::{DecodeError, DispatchError, TransportError};
pub use models::{
    CommandRequest, ConnectionStatus, CooldownState, Feedback, FeedbackStatus, Level, LogEntry,
    PcInfo,
};
pub use session::{MetricsSnapshot, Session, Snapshot};
