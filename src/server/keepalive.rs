//! Per-connection liveness state machine.
//!
//! Pure state, driven by the session actor's timers: after
//! `INITIAL_TIMEOUT` of silence a probe goes out; unanswered probes repeat
//! every `RETRY_TIMEOUT` up to `RETRY_COUNT` times before the connection is
//! declared dead. Any inbound application byte resets to `Idle`. All timers
//! are per-connection; nothing here is shared.

use std::time::Duration;

use crate::config::keepalive::{INITIAL_TIMEOUT, RETRY_COUNT, RETRY_TIMEOUT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepAliveState {
    /// Nothing pending.
    Idle,
    /// First probe sent, nothing received since.
    Probing,
    /// `n` retry probes sent.
    Retrying(u32),
}

/// What the session should do when the armed timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    /// Send a probe and re-arm the timer.
    Probe { rearm: Duration },
    /// Send one last probe, then drop the connection.
    Expire,
}

#[derive(Debug)]
pub struct KeepAlive {
    state: KeepAliveState,
}

impl Default for KeepAlive {
    fn default() -> Self {
        Self::new()
    }
}

impl KeepAlive {
    pub fn new() -> Self {
        Self {
            state: KeepAliveState::Idle,
        }
    }

    pub fn state(&self) -> KeepAliveState {
        self.state
    }

    /// An inbound byte arrived: back to `Idle`. Returns the delay the
    /// caller should re-arm with (the caller cancels any pending timer).
    pub fn on_activity(&mut self) -> Duration {
        self.state = KeepAliveState::Idle;
        INITIAL_TIMEOUT
    }

    /// The armed timer fired with no intervening activity.
    pub fn on_timeout(&mut self) -> Timeout {
        let retries = match self.state {
            KeepAliveState::Idle => {
                self.state = KeepAliveState::Probing;
                return Timeout::Probe {
                    rearm: RETRY_TIMEOUT,
                };
            }
            KeepAliveState::Probing => 1,
            KeepAliveState::Retrying(n) => n + 1,
        };
        self.state = KeepAliveState::Retrying(retries);
        if retries >= RETRY_COUNT {
            Timeout::Expire
        } else {
            Timeout::Probe {
                rearm: RETRY_TIMEOUT,
            }
        }
    }
}
