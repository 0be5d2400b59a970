/// Keepalive configuration constants.
///
/// Per-connection liveness probing: after `INITIAL_TIMEOUT` of silence the
/// session sends a probe, then retries every `RETRY_TIMEOUT` up to
/// `RETRY_COUNT` times before the connection is declared dead.
use std::time::Duration;

/// Silence tolerated before the first keepalive probe is sent.
pub const INITIAL_TIMEOUT: Duration = Duration::from_millis(5000);

/// Interval between retry probes once the first probe went unanswered.
pub const RETRY_TIMEOUT: Duration = Duration::from_millis(2500);

/// Number of unanswered retry probes before the connection is closed.
pub const RETRY_COUNT: u32 = 3;
