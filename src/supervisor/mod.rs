//! Session supervisor.
//!
//! Owns every piece of mutable session state: the three process slots,
//! the rescue watcher handle and the teardown guard. Startup runs in a
//! fixed order (proxy, launcher, dev server, rescue watcher) and hands
//! over to the monitoring loop. Shutdown arrives as a cancelled token;
//! whichever way the run ends, [`SessionSupervisor::teardown`] is called
//! exactly once on the way out.

pub mod diagnostics;
pub mod monitor;
pub mod session;
pub mod startup;
pub mod teardown;

pub use monitor::SteadyStateWarning;
pub use session::{Session, Slot, SlotName};
pub use startup::DevServerStatus;
pub use teardown::TeardownReport;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};

use crate::config::SessionConfig;
use crate::probe::{AppPresence, PgrepProbe};
use crate::rescue::{RescueOutcome, RescueWatcher};
use crate::{AppError, Result};

/// How a supervised session ended.
#[derive(Debug)]
pub enum SessionExit {
    /// Stopped by a shutdown request after a successful startup (or during it).
    Interrupted,
    /// Aborted by a fatal startup error.
    Failed(AppError),
}

impl SessionExit {
    /// Process exit code for this outcome.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Interrupted => 0,
            Self::Failed(_) => 1,
        }
    }
}

/// Orchestrates one development session.
pub struct SessionSupervisor<P = PgrepProbe> {
    config: SessionConfig,
    session: Session,
    presence: Option<P>,
    watcher: Option<JoinHandle<RescueOutcome>>,
    torn_down: bool,
}

impl SessionSupervisor<PgrepProbe> {
    /// Supervisor that detects the word processor with `pgrep`.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let presence = PgrepProbe::new(config.rescue.process_pattern.clone());
        Self::with_presence(config, presence)
    }
}

impl<P: AppPresence + 'static> SessionSupervisor<P> {
    /// Supervisor using a custom application presence probe.
    #[must_use]
    pub fn with_presence(config: SessionConfig, presence: P) -> Self {
        let session = Session::new(config.work_dir.clone());
        Self {
            config,
            session,
            presence: Some(presence),
            watcher: None,
            torn_down: false,
        }
    }

    /// Configuration this session runs with.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current session state.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable session state.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Take the rescue watcher's handle, if one was started.
    ///
    /// The supervisor itself never joins the watcher.
    pub fn take_watcher(&mut self) -> Option<JoinHandle<RescueOutcome>> {
        self.watcher.take()
    }

    /// Run every startup step in order, stopping at the first fatal one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Startup` if the proxy or the launcher cannot be
    /// brought up. Teardown is left to the caller.
    pub async fn startup(&mut self) -> Result<DevServerStatus> {
        info!(work_dir = %self.session.work_dir().display(), "starting WordTrack session");

        self.start_proxy()
            .instrument(info_span!("proxy_up"))
            .await?;
        self.start_launcher()?;
        let status = self
            .wait_for_dev_server()
            .instrument(info_span!("dev_server_up"))
            .await;
        self.start_watcher();
        self.settle_launcher().await;

        Ok(status)
    }

    /// Start the rescue watcher as a detached task. Only the first call
    /// has any effect.
    pub fn start_watcher(&mut self) {
        if !self.config.rescue.enabled {
            info!("document rescue disabled");
            return;
        }
        let Some(presence) = self.presence.take() else {
            return;
        };
        let destination = match self.config.rescue.destination() {
            Ok(destination) => destination,
            Err(err) => {
                warn!(%err, "document rescue unavailable");
                return;
            }
        };
        self.watcher = Some(RescueWatcher::new(&self.config.rescue, destination, presence).spawn());
    }

    /// Run the whole session until `shutdown` is cancelled or startup fails.
    ///
    /// Teardown always runs before this returns.
    pub async fn run(&mut self, shutdown: CancellationToken) -> SessionExit {
        let started = tokio::select! {
            result = self.startup() => result.map(Some),
            () = shutdown.cancelled() => Ok(None),
        };

        let exit = match started {
            Ok(Some(_)) => {
                info!(
                    proxy_port = self.config.proxy.port,
                    "proxy server is running; press Ctrl+C to stop it and exit"
                );
                self.monitor(&shutdown).await;
                SessionExit::Interrupted
            }
            Ok(None) => SessionExit::Interrupted,
            Err(err) => {
                error!(%err, "session aborted");
                SessionExit::Failed(err)
            }
        };

        info!("shutting down");
        self.teardown().await;
        exit
    }
}
