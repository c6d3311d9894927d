// Poll loop constants (no magic values)
use std::time::Duration;

/// Fixed interval between ticks (2s)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Minimum interval between stale-cache sweeps (1h)
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);
