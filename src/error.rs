use thiserror::Error;

/// Connection-level failures. Non-fatal: the session survives them and
/// reports `offline` until the caller reconnects.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid endpoint url: {0}")]
    BadUrl(#[from] url::ParseError),

    #[error("failed to connect: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("not-connected")]
    NotConnected,
}

/// A single inbound frame that could not be interpreted. Logged and
/// dropped; never reaches the presentation layer.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame is not a JSON object")]
    NotObject,

    #[error("frame has no 'type' discriminator")]
    MissingType,

    #[error("unrecognized frame type '{0}'")]
    UnknownType(String),

    #[error("'{frame}' frame missing required fields: {source}")]
    BadPayload {
        frame: &'static str,
        source: serde_json::Error,
    },
}

/// Synchronous rejection of an outgoing command. The caller is responsible
/// for surfacing the reason to the user; nothing reaches the transport.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("cooldown:{remaining_secs}")]
    Cooldown { remaining_secs: u32 },

    #[error("not-connected")]
    NotConnected,

    #[error("session closed")]
    Closed,
}
