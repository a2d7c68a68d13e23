//! Steady-state monitoring loop.
//!
//! Warnings are reported and nothing else: restarting a dead proxy is the
//! user's call ("restart the session").

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::session::SlotName;
use super::SessionSupervisor;
use crate::probe::{is_listening, AppPresence};

/// Problems noticed while the session is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SteadyStateWarning {
    /// The proxy process this session started has exited.
    ProxyStopped,
    /// The proxy process is alive but its port no longer listens.
    ProxyPortDown {
        /// Proxy port.
        port: u16,
    },
    /// The dev server was not listening at the first status check.
    DevServerDown {
        /// Dev-server port.
        port: u16,
    },
}

impl SteadyStateWarning {
    /// Log the warning with remediation hints.
    pub fn report(&self) {
        match self {
            Self::ProxyStopped => {
                warn!("proxy server process has stopped");
                warn!("the add-in will not be able to reach its API; restart the session to start the proxy again");
            }
            Self::ProxyPortDown { port } => {
                warn!(port, "proxy server process is running but its port is not listening");
                warn!("the proxy may have crashed or failed to bind; check for errors and restart the session");
            }
            Self::DevServerDown { port } => {
                warn!(port, "dev server is not running; the add-in cannot load without it");
                warn!("check the output above for bundler errors, or run it manually: npm run dev-server");
            }
        }
    }
}

impl<P: AppPresence + 'static> SessionSupervisor<P> {
    /// Run one round of health checks and report what was found.
    ///
    /// The proxy is only checked when this session owns it, and once it has
    /// been reported stopped it is not checked again. The dev server is
    /// checked on the first round only.
    pub async fn monitor_tick(&mut self, first: bool) -> Vec<SteadyStateWarning> {
        let probe_timeout = self.config.probe_timeout();
        let proxy = &self.config.proxy;
        let mut warnings = Vec::new();

        let slot = self.session.slot_mut(SlotName::Proxy);
        if !slot.is_already_running() && !slot.stop_reported() {
            let stopped = slot.handle_mut().is_some_and(|handle| !handle.is_running());
            if stopped {
                slot.mark_stop_reported();
                warnings.push(SteadyStateWarning::ProxyStopped);
            } else if !is_listening(&proxy.host, proxy.port, probe_timeout).await {
                warnings.push(SteadyStateWarning::ProxyPortDown { port: proxy.port });
            }
        }

        if first {
            let dev = &self.config.dev_server;
            if is_listening(&dev.host, dev.port, probe_timeout).await {
                info!(
                    dev_server_port = dev.port,
                    proxy_port = proxy.port,
                    "status check: dev server and proxy server are running"
                );
            } else {
                warnings.push(SteadyStateWarning::DevServerDown { port: dev.port });
            }
        }

        for warning in &warnings {
            warning.report();
        }
        warnings
    }

    /// Check health every monitor interval until `cancel` fires.
    pub async fn monitor(&mut self, cancel: &CancellationToken) {
        let interval = self.config.monitor.interval();
        let mut first = true;
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("monitoring loop shutting down");
                    break;
                }
                () = tokio::time::sleep(interval) => {}
            }

            self.monitor_tick(first).await;
            first = false;
        }
    }
}
