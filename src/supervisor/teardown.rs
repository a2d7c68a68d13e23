//! Session teardown.

use tracing::{debug, info};

use super::session::SlotName;
use super::SessionSupervisor;
use crate::probe::AppPresence;

/// What teardown did with each slot.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TeardownReport {
    /// Slots whose handle was terminated (or had already exited).
    pub stopped: Vec<SlotName>,
    /// Slots left alone because another owner serves them.
    pub skipped: Vec<SlotName>,
}

impl<P: AppPresence + 'static> SessionSupervisor<P> {
    /// Stop every process this session owns and delete leftover logs.
    ///
    /// Runs at most once; later calls return an empty report. Slots marked
    /// already-running are never terminated. Each termination is bounded
    /// by the configured grace before the process is killed.
    pub async fn teardown(&mut self) -> TeardownReport {
        let mut report = TeardownReport::default();
        if self.torn_down {
            debug!("teardown already performed");
            return report;
        }
        self.torn_down = true;

        let grace = self.config.terminate_grace();
        for name in SlotName::TEARDOWN_ORDER {
            let slot = self.session.slot_mut(name);
            let already_running = slot.is_already_running();
            let Some(handle) = slot.handle_mut() else {
                if already_running {
                    report.skipped.push(name);
                }
                continue;
            };

            if already_running {
                debug!(service = %name, "slot owned elsewhere; leaving process running");
                handle.discard_log();
                report.skipped.push(name);
                continue;
            }

            handle.terminate(grace).await;
            handle.discard_log();
            report.stopped.push(name);
        }

        info!(
            stopped = report.stopped.len(),
            skipped = report.skipped.len(),
            "session torn down"
        );
        report
    }

    /// Whether teardown has already run.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}
