// Worker constants (no magic values)
use std::time::Duration;

/// Lease requested on every receive (5 minutes)
/// Must cover the slowest expected fetch + analysis
pub const DEFAULT_LEASE_DURATION: Duration = Duration::from_secs(5 * 60);

/// Sleep between polls when the input queue is empty (500ms)
pub const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Sleep duration after a queue transport error before the next iteration (1s)
pub const ERROR_RECOVERY_SLEEP_DURATION: Duration = Duration::from_secs(1);

/// Upper bound for a single content fetch (30s)
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// How long shutdown waits for in-flight jobs before giving up (5s)
/// An abandoned job is not lost: its lease expires and it is redelivered
pub const SHUTDOWN_GRACE_PERIOD: Duration = Duration::from_secs(5);
