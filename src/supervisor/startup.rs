//! Ordered startup: proxy, launcher, dev server.
//!
//! Port reachability is the readiness signal throughout. A child can be
//! alive and still bootstrapping, or crash-looping without exiting, so
//! liveness alone never counts as "up".

use tracing::{error, info, warn};

use super::diagnostics::{dump_log, report_common_issues, show_log};
use super::session::SlotName;
use super::SessionSupervisor;
use crate::errors::FatalStartup;
use crate::probe::{is_listening, AppPresence};
use crate::process::{OutputTarget, ProcessHandle};
use crate::Result;

/// How the dev-server step ended. Only `Unreachable` is a degradation;
/// none of these abort the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DevServerStatus {
    /// The launcher brought the dev server up within the wait bound.
    Ready,
    /// The manual fallback start brought it up.
    ReadyAfterFallback,
    /// Not reachable even after the fallback.
    Unreachable,
}

impl<P: AppPresence + 'static> SessionSupervisor<P> {
    /// Bring the proxy up, or adopt one that is already listening.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Startup` if the proxy cannot be spawned, exits
    /// before its port comes up, or never listens within the bound.
    pub async fn start_proxy(&mut self) -> Result<()> {
        let proxy = self.config.proxy.clone();
        let probe_timeout = self.config.probe_timeout();

        info!("checking if proxy server is already running");
        if is_listening(&proxy.host, proxy.port, probe_timeout).await {
            info!(port = proxy.port, "proxy server already running; skipping");
            self.session
                .slot_mut(SlotName::Proxy)
                .mark_already_running();
            return Ok(());
        }

        info!("starting proxy server in background");
        let spawned = ProcessHandle::spawn(
            SlotName::Proxy.label(),
            &proxy.command,
            self.session.work_dir(),
            OutputTarget::TempLog {
                prefix: proxy.log_prefix.clone(),
            },
        )
        .map_err(|err| {
            error!(%err, "failed to start proxy server");
            FatalStartup::ProxySpawn(err)
        })?;

        let handle = self.session.slot_mut(SlotName::Proxy).set_handle(spawned);
        if let Some(path) = handle.log_path() {
            info!(log = %path.display(), "proxy server output will be logged here");
        }

        info!("waiting for proxy server to start");
        for _ in 0..proxy.max_wait_attempts {
            tokio::time::sleep(proxy.poll_interval()).await;

            if !handle.is_running() {
                error!("proxy server process exited unexpectedly");
                dump_log(handle);
                report_common_issues(proxy.port, false);
                handle.discard_log();
                return Err(FatalStartup::ProxyExited.into());
            }

            if is_listening(&proxy.host, proxy.port, probe_timeout).await {
                info!(port = proxy.port, "proxy server started successfully");
                show_log(handle);
                handle.discard_log();
                return Ok(());
            }
        }

        error!(
            attempts = proxy.max_wait_attempts,
            "proxy server failed to start within the wait bound"
        );
        dump_log(handle);
        report_common_issues(proxy.port, true);
        handle.kill().await;
        handle.discard_log();
        Err(FatalStartup::ProxyTimeout {
            attempts: proxy.max_wait_attempts,
        }
        .into())
    }

    /// Spawn the add-in launcher with the terminal inherited.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Startup` if the launcher cannot be spawned.
    pub fn start_launcher(&mut self) -> Result<()> {
        let command = self.config.launcher.full_command();
        info!("starting add-in debugging (will create temp document)");

        let spawned = ProcessHandle::spawn(
            SlotName::Launcher.label(),
            &command,
            self.session.work_dir(),
            OutputTarget::Inherit,
        )
        .map_err(|err| {
            error!(%err, "failed to start add-in debugging");
            FatalStartup::LauncherSpawn(err)
        })?;

        self.session
            .slot_mut(SlotName::Launcher)
            .set_handle(spawned);
        Ok(())
    }

    /// Wait for the dev server, falling back to starting it ourselves.
    ///
    /// Never fails the session; an unreachable dev server is reported and
    /// left to the user.
    pub async fn wait_for_dev_server(&mut self) -> DevServerStatus {
        let dev = self.config.dev_server.clone();
        let probe_timeout = self.config.probe_timeout();

        info!(port = dev.port, "waiting for dev server to start");
        for _ in 0..dev.max_wait_attempts {
            tokio::time::sleep(dev.poll_interval()).await;
            if is_listening(&dev.host, dev.port, probe_timeout).await {
                info!(port = dev.port, "dev server started successfully");
                return DevServerStatus::Ready;
            }
        }

        warn!(
            port = dev.port,
            attempts = dev.max_wait_attempts,
            "dev server did not start automatically"
        );
        info!("attempting to start dev server manually");

        let spawned = match ProcessHandle::spawn(
            SlotName::DevServer.label(),
            &dev.command,
            self.session.work_dir(),
            OutputTarget::File(dev.log_path.clone()),
        ) {
            Ok(handle) => handle,
            Err(err) => {
                error!(%err, "failed to start dev server manually");
                return DevServerStatus::Unreachable;
            }
        };
        let handle = self
            .session
            .slot_mut(SlotName::DevServer)
            .set_handle(spawned);

        tokio::time::sleep(dev.fallback_grace()).await;

        if is_listening(&dev.host, dev.port, probe_timeout).await {
            info!(port = dev.port, "dev server started successfully (manual start)");
            return DevServerStatus::ReadyAfterFallback;
        }

        error!(port = dev.port, "dev server failed to start even manually");
        dump_log(handle);
        report_common_issues(dev.port, true);
        warn!(
            command = %dev.command.display_line(),
            "try starting it manually in a separate terminal"
        );
        DevServerStatus::Unreachable
    }

    /// Give the launcher a moment, then note whether it already exited.
    ///
    /// The launcher usually exits once it has triggered the dev server and
    /// the word processor, so an exit here is not a failure.
    pub async fn settle_launcher(&mut self) {
        tokio::time::sleep(self.config.launcher.settle()).await;
        if let Some(handle) = self.session.slot_mut(SlotName::Launcher).handle_mut() {
            if handle.is_running() {
                info!("add-in debugging still running");
            } else {
                info!("add-in debugging command completed; dev server may still be running");
            }
        }
    }
}
