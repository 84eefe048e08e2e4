// ─────────────────────────────────────────────────────────────────
//  protocol.rs — wire frames for the control endpoint
//
//  Inbound:  status | pc_info | feedback | log   (JSON text frames)
//  Outbound: hello handshake, command frames
// ─────────────────────────────────────────────────────────────────

use serde_json::{json, Value};

use crate::error::DecodeError;
use crate::models::{CommandRequest, Feedback, LogEntry, PcInfo};

/// Everything the control endpoint can push at us, already classified.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The remote host is alive. Sent as `{"type":"status"}`, and also the
    /// reading of any `pc_info` frame that lacks the full metrics payload.
    Heartbeat,
    Feedback(Feedback),
    Log(LogEntry),
    PcInfo(PcInfo),
}

/// Classify one inbound text frame. A failure here means the frame is
/// dropped; it must never alter session state.
pub fn decode(raw: &str) -> Result<Event, DecodeError> {
    let value: Value = serde_json::from_str(raw)?;
    let obj = value.as_object().ok_or(DecodeError::NotObject)?;

    let frame_type = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingType)?;

    match frame_type {
        "status" => Ok(Event::Heartbeat),

        // Full report feeds the samplers; a partial one still proves the
        // host is alive, so it degrades to a bare heartbeat.
        "pc_info" => match serde_json::from_value::<PcInfo>(value.clone()) {
            Ok(info) => Ok(Event::PcInfo(info)),
            Err(_) => Ok(Event::Heartbeat),
        },

        "feedback" => serde_json::from_value::<Feedback>(value.clone())
            .map(Event::Feedback)
            .map_err(|e| DecodeError::BadPayload {
                frame: "feedback",
                source: e,
            }),

        "log" => serde_json::from_value::<LogEntry>(value.clone())
            .map(Event::Log)
            .map_err(|e| DecodeError::BadPayload {
                frame: "log",
                source: e,
            }),

        other => Err(DecodeError::UnknownType(other.to_string())),
    }
}

/// Handshake identifying this connection as the controlling app. Must be
/// the first frame after connect.
pub fn hello_frame() -> String {
    json!({ "type": "hello", "role": "app" }).to_string()
}

/// Outbound command frame: `action` plus any extra fields flattened in.
pub fn command_frame(cmd: &CommandRequest) -> String {
    let mut frame = json!({
        "type": "command",
        "role": "app",
        "action": cmd.action,
    });
    if let Some(obj) = frame.as_object_mut() {
        for (k, v) in &cmd.extra {
            obj.insert(k.clone(), v.clone());
        }
    }
    frame.to_string()
}
