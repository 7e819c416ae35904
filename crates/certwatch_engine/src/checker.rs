use std::time::Duration;

use certwatch_core::CheckOutcome;

/// Upper bound for one check, connect through certificate read.
pub const DEFAULT_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct CheckSettings {
    pub timeout: Duration,
    /// Port probed when the URL does not name one.
    pub default_port: u16,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_CHECK_TIMEOUT,
            default_port: 443,
        }
    }
}

/// Looks up the certificate behind a canonical URL.
///
/// Never fails: unreachable hosts, handshake errors, timeouts and unreadable
/// certificates all come back as an `error` outcome.
#[async_trait::async_trait]
pub trait Checker: Send + Sync {
    async fn check(&self, url: &str) -> CheckOutcome;
}
