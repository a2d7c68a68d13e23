//! Named-process presence probe used by the rescue watcher.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

/// Reports whether the target application is currently running.
pub trait AppPresence: Send + Sync {
    /// Resolve to `true` while the application is running.
    ///
    /// Implementations that cannot tell must answer `true` so that the
    /// watcher keeps waiting instead of rescuing too early.
    fn is_present(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// Presence probe backed by `pgrep -f <pattern>`.
#[derive(Debug, Clone)]
pub struct PgrepProbe {
    pattern: String,
    timeout: Duration,
}

impl PgrepProbe {
    /// Probe for processes whose command line matches `pattern`.
    #[must_use]
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            timeout: Duration::from_secs(2),
        }
    }
}

impl AppPresence for PgrepProbe {
    fn is_present(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            let status = Command::new("pgrep")
                .arg("-f")
                .arg(&self.pattern)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true)
                .status();

            match tokio::time::timeout(self.timeout, status).await {
                Ok(Ok(status)) => status.success(),
                Ok(Err(err)) => {
                    debug!(pattern = self.pattern, %err, "pgrep failed; assuming still running");
                    true
                }
                Err(_elapsed) => {
                    debug!(pattern = self.pattern, "pgrep timed out; assuming still running");
                    true
                }
            }
        })
    }
}
