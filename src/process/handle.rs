//! Spawned external process with an optional captured log.
//!
//! A handle owns its child for the lifetime of the session. Children are
//! spawned with `kill_on_drop(true)`, so a handle that is dropped without
//! an explicit [`ProcessHandle::terminate`] still takes its process down.
//! Temporary logs are deleted when the handle drops; fixed-path logs are
//! deleted by [`ProcessHandle::discard_log`].

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::config::CommandSpec;
use crate::errors::SpawnError;

/// Where a child's stdout and stderr go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Share the supervisor's terminal.
    Inherit,
    /// A fresh temp file named `<prefix>XXXX.log` in the system temp dir.
    TempLog {
        /// File-name prefix.
        prefix: String,
    },
    /// A fixed path, truncated on spawn.
    File(PathBuf),
}

#[derive(Debug)]
enum LogSink {
    Temp(NamedTempFile),
    Fixed(PathBuf),
}

impl LogSink {
    fn path(&self) -> &Path {
        match self {
            Self::Temp(file) => file.path(),
            Self::Fixed(path) => path,
        }
    }
}

/// A running (or exited) external process owned by the supervisor.
#[derive(Debug)]
pub struct ProcessHandle {
    name: String,
    pid: Option<u32>,
    child: Child,
    log: Option<LogSink>,
}

impl ProcessHandle {
    /// Spawn `command` in `work_dir` with output routed to `output`.
    ///
    /// # Errors
    ///
    /// Returns a [`SpawnError`] if the working directory is invalid, the log
    /// file cannot be created, or the OS refuses to start the program.
    pub fn spawn(
        name: &str,
        command: &CommandSpec,
        work_dir: &Path,
        output: OutputTarget,
    ) -> Result<Self, SpawnError> {
        if command.program.trim().is_empty() {
            return Err(SpawnError::EmptyCommand);
        }
        if !work_dir.is_dir() {
            return Err(SpawnError::InvalidWorkDir {
                path: work_dir.to_path_buf(),
            });
        }

        let log_err = |err: std::io::Error| SpawnError::Other {
            program: command.program.clone(),
            message: format!("cannot create log file: {err}"),
        };

        let (log, stdout, stderr) = match output {
            OutputTarget::Inherit => (None, Stdio::inherit(), Stdio::inherit()),
            OutputTarget::TempLog { prefix } => {
                let temp = tempfile::Builder::new()
                    .prefix(&prefix)
                    .suffix(".log")
                    .tempfile()
                    .map_err(log_err)?;
                let out = temp.reopen().map_err(log_err)?;
                let err = out.try_clone().map_err(log_err)?;
                (Some(LogSink::Temp(temp)), Stdio::from(out), Stdio::from(err))
            }
            OutputTarget::File(path) => {
                let out = File::create(&path).map_err(log_err)?;
                let err = out.try_clone().map_err(log_err)?;
                (Some(LogSink::Fixed(path)), Stdio::from(out), Stdio::from(err))
            }
        };

        let spawned = Command::new(&command.program)
            .args(&command.args)
            .current_dir(work_dir)
            .stdin(Stdio::inherit())
            .stdout(stdout)
            .stderr(stderr)
            .kill_on_drop(true)
            .spawn();

        let child = match spawned {
            Ok(child) => child,
            Err(err) => {
                // No handle will own a fixed log, so nothing else would delete it.
                if let Some(LogSink::Fixed(path)) = &log {
                    if let Err(remove_err) = fs::remove_file(path) {
                        debug!(service = name, path = %path.display(), %remove_err, "failed to remove unused log");
                    }
                }
                return Err(SpawnError::from_io(&command.program, &err));
            }
        };

        let pid = child.id();
        let log_display = log
            .as_ref()
            .map_or_else(|| "-".to_owned(), |sink| sink.path().display().to_string());
        info!(
            service = name,
            pid = pid.unwrap_or(0),
            command = %command.display_line(),
            log = %log_display,
            "process spawned"
        );

        Ok(Self {
            name: name.to_owned(),
            pid,
            child,
            log,
        })
    }

    /// Display name given at spawn time.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// OS process id captured at spawn time.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Non-blocking liveness check.
    ///
    /// The exit status is cached by the child once observed, so repeated
    /// calls keep answering `false` after the process has exited.
    pub fn is_running(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                debug!(service = self.name, %status, "process has exited");
                false
            }
            Err(err) => {
                warn!(service = self.name, %err, "failed to poll process status");
                false
            }
        }
    }

    /// Ask the process to stop, then force it after `grace`.
    ///
    /// A process that has already exited is left alone, which makes this
    /// safe to call any number of times.
    pub async fn terminate(&mut self, grace: Duration) {
        if !self.is_running() {
            return;
        }

        info!(service = self.name, pid = self.pid.unwrap_or(0), "stopping process");
        self.request_stop();

        if tokio::time::timeout(grace, self.child.wait()).await.is_ok() {
            return;
        }

        warn!(service = self.name, ?grace, "process ignored termination request; killing");
        self.kill().await;
    }

    /// Force the process down immediately.
    pub async fn kill(&mut self) {
        if !self.is_running() {
            return;
        }
        if let Err(err) = self.child.kill().await {
            warn!(service = self.name, %err, "failed to kill process");
        }
    }

    #[cfg(unix)]
    fn request_stop(&mut self) {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let Some(raw) = self.pid.and_then(|pid| i32::try_from(pid).ok()) else {
            let _ = self.child.start_kill();
            return;
        };
        if let Err(err) = kill(Pid::from_raw(raw), Signal::SIGTERM) {
            warn!(service = self.name, %err, "SIGTERM failed; killing instead");
            let _ = self.child.start_kill();
        }
    }

    #[cfg(not(unix))]
    fn request_stop(&mut self) {
        let _ = self.child.start_kill();
    }

    /// Path of the captured log, if output is being captured.
    #[must_use]
    pub fn log_path(&self) -> Option<&Path> {
        self.log.as_ref().map(LogSink::path)
    }

    /// Current contents of the captured log.
    ///
    /// Returns `None` when output is not captured or the file is gone.
    #[must_use]
    pub fn read_log(&self) -> Option<String> {
        let path = self.log_path()?;
        fs::read(path)
            .ok()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Delete the captured log. Subsequent calls are no-ops.
    pub fn discard_log(&mut self) {
        match self.log.take() {
            Some(LogSink::Temp(file)) => {
                if let Err(err) = file.close() {
                    warn!(service = self.name, %err, "failed to delete temp log");
                }
            }
            Some(LogSink::Fixed(path)) => match fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    warn!(service = self.name, path = %path.display(), %err, "failed to delete log");
                }
            },
            None => {}
        }
    }
}
