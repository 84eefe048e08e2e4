use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ── Connection status ────────────────────────────────────
/// Derived liveness verdict. `Unknown` is the state before any heartbeat
/// or poll has been observed; the presentation layer treats it as offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Unknown,
    Online,
    Offline,
}

impl ConnectionStatus {
    pub fn is_online(self) -> bool {
        self == ConnectionStatus::Online
    }
}

// ── Cooldown ─────────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CooldownState {
    pub active: bool,
    pub remaining_secs: u32,
}

// ── Log entries ──────────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    // The agent reports command successes with level "success"
    #[serde(alias = "success")]
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
    /// Epoch seconds, as stamped by the remote agent.
    pub timestamp: f64,
}

// ── Feedback toast ───────────────────────────────────────
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    Success,
    Error,
    Info,
}

/// Transient command acknowledgment pushed by the remote host.
/// Auto-expires; a newer one replaces it and restarts the clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub message: String,
    pub status: FeedbackStatus,
}

// ── Host metrics report ──────────────────────────────────
/// One `pc_info` report from the managed host. Byte counts are raw;
/// percentages are derived where the presentation needs them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcInfo {
    pub cpu_percent: f64,
    pub memory: u64,
    pub memory_total: u64,
    pub disk_usage: u64,
    pub disk_total: u64,
    pub system: String,
    pub node_name: String,
    pub user: String,
    pub ip_local: String,
    /// Seconds since the host booted.
    pub uptime: f64,
}

impl PcInfo {
    /// RAM usage as a percentage of total, the value charted per sample.
    pub fn ram_percent(&self) -> f64 {
        if self.memory_total == 0 {
            return 0.0;
        }
        self.memory as f64 / self.memory_total as f64 * 100.0
    }
}

// ── Outgoing command ─────────────────────────────────────
/// A user intent headed for the remote agent. `extra` fields are flattened
/// into the outbound frame next to `action` (e.g. `minutes` for
/// `shutdown_with_time`); the session treats them as opaque.
#[derive(Debug, Clone)]
pub struct CommandRequest {
    pub action: String,
    pub extra: Map<String, Value>,
    /// Cooldown window armed after a successful send. 0 = ungated.
    pub window_secs: u32,
}

impl CommandRequest {
    pub const DEFAULT_WINDOW_SECS: u32 = 3;

    pub fn new(action: impl Into<String>) -> Self {
        CommandRequest {
            action: action.into(),
            extra: Map::new(),
            window_secs: Self::DEFAULT_WINDOW_SECS,
        }
    }

    /// Attach an extra field to the outbound frame.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn window(mut self, secs: u32) -> Self {
        self.window_secs = secs;
        self
    }

    /// No cooldown after this command (the timed-shutdown path).
    pub fn ungated(self) -> Self {
        self.window(0)
    }
}

#[cfg(test)]
pub(crate) fn sample_pc_info() -> PcInfo {
    PcInfo {
        cpu_percent: 12.5,
        memory: 2_000_000_000,
        memory_total: 8_000_000_000,
        disk_usage: 100_000_000_000,
        disk_total: 500_000_000_000,
        system: "Linux".to_string(),
        node_name: "desk-01".to_string(),
        user: "alice".to_string(),
        ip_local: "192.168.0.20".to_string(),
        uptime: 3600.0,
    }
}
