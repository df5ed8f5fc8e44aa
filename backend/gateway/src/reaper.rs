//! Background cleanup of idle sessions and stale rate-limit windows.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::server::GatewayState;

/// Sweep often enough that a session outlives its TTL by at most half.
pub fn sweep_interval(ttl: Duration) -> Duration {
    (ttl / 2).clamp(Duration::from_secs(1), Duration::from_secs(60))
}

pub fn spawn_reaper(state: GatewayState) -> JoinHandle<()> {
    let ttl = state.options.session_ttl;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_interval(ttl));
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let reaped = state.sessions.reap_expired(ttl).await;
            let pruned = state.limiter.prune().await;
            debug!(reaped, pruned, "Reaper sweep");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_is_bounded() {
        assert_eq!(sweep_interval(Duration::from_secs(3600)), Duration::from_secs(60));
        assert_eq!(sweep_interval(Duration::from_secs(30)), Duration::from_secs(15));
        assert_eq!(sweep_interval(Duration::from_millis(10)), Duration::from_secs(1));
    }
}
