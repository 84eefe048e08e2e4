//! Heartbeat-derived liveness.
//!
//! The monitor never schedules anything itself: the session stamps it on
//! every accepted heartbeat and polls `check()` on a fixed 1 s cadence, so
//! offline detection lags real silence by at most one poll interval.
//!
//! ```text
//!            mark_alive                elapsed > threshold (at a poll)
//!  Unknown ─────────────► Online ──────────────────────────► Offline
//!                           ▲                                   │
//!                           └──────────── mark_alive ───────────┘
//! ```

use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;

use crate::models::ConnectionStatus;

#[derive(Debug)]
pub struct LivenessMonitor {
    threshold: Duration,
    last_seen: Option<Instant>,
    /// Wall-clock mirror of `last_seen`, for display only.
    last_seen_at: Option<DateTime<Utc>>,
    status: ConnectionStatus,
}

impl LivenessMonitor {
    pub fn new(threshold: Duration) -> Self {
        LivenessMonitor {
            threshold,
            last_seen: None,
            last_seen_at: None,
            status: ConnectionStatus::Unknown,
        }
    }

    /// Accepted heartbeat: stamp and go online immediately.
    pub fn mark_alive(&mut self, now: Instant) {
        self.last_seen = Some(now);
        self.last_seen_at = Some(Utc::now());
        self.status = ConnectionStatus::Online;
    }

    /// Poll-driven verdict. Within the threshold nothing changes; strictly
    /// past it the status drops to offline. Returns the current status.
    pub fn check(&mut self, now: Instant) -> ConnectionStatus {
        if let Some(seen) = self.last_seen {
            if now.duration_since(seen) > self.threshold {
                self.status = ConnectionStatus::Offline;
            }
        }
        self.status
    }

    /// The socket is gone; no poll needed to know the host is unreachable.
    pub fn force_offline(&mut self) {
        self.status = ConnectionStatus::Offline;
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn last_seen_at(&self) -> Option<DateTime<Utc>> {
        self.last_seen_at
    }
}
