//! Client-side dispatch throttling.
//!
//! One global window. `try_acquire` either passes and arms a fresh window
//! or reports how long the caller has to wait. The session drives `tick()`
//! once per second while a window is active; the gate itself keeps no
//! timers. Advisory only — the remote endpoint enforces nothing here.

use crate::models::CooldownState;

#[derive(Debug, Default)]
pub struct CooldownGate {
    remaining_secs: u32,
}

impl CooldownGate {
    pub fn new() -> Self {
        CooldownGate { remaining_secs: 0 }
    }

    /// Pass or block. On pass, arms a window of `window_secs` (0 leaves
    /// the gate idle — ungated commands).
    pub fn try_acquire(&mut self, window_secs: u32) -> Result<(), u32> {
        if self.remaining_secs > 0 {
            return Err(self.remaining_secs);
        }
        self.arm(window_secs);
        Ok(())
    }

    /// Start a window unconditionally. Only one window exists globally;
    /// arming cancels and replaces any running countdown.
    pub fn arm(&mut self, window_secs: u32) {
        self.remaining_secs = window_secs;
    }

    /// One-second countdown step. Returns true when this tick released
    /// the gate, so the caller can stop its countdown timer.
    pub fn tick(&mut self) -> bool {
        if self.remaining_secs == 0 {
            return false;
        }
        self.remaining_secs -= 1;
        self.remaining_secs == 0
    }

    /// Cancel the running window, releasing the gate immediately.
    pub fn reset(&mut self) {
        self.remaining_secs = 0;
    }

    pub fn is_active(&self) -> bool {
        self.remaining_secs > 0
    }

    pub fn remaining(&self) -> u32 {
        self.remaining_secs
    }

    pub fn state(&self) -> CooldownState {
        CooldownState {
            active: self.is_active(),
            remaining_secs: self.remaining_secs,
        }
    }
}
