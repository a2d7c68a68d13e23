//! Session configuration parsing and validation.
//!
//! Every field carries a default, so running without a config file uses
//! the built-in WordTrack constants. A TOML file only needs to name the
//! values it overrides.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

/// An external command: program plus fixed arguments.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CommandSpec {
    /// Executable name or path.
    pub program: String,
    /// Arguments passed verbatim.
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    /// Build a command spec from a program and its arguments.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Shell-like rendering used in log lines and hints.
    #[must_use]
    pub fn display_line(&self) -> String {
        let mut line = self.program.clone();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Background proxy server settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "snake_case")]
pub struct ProxyConfig {
    /// Host the proxy listens on.
    pub host: String,
    /// TCP port whose reachability marks the proxy as ready.
    pub port: u16,
    /// Command that starts the proxy.
    pub command: CommandSpec,
    /// Number of one-interval polls before startup is declared failed.
    pub max_wait_attempts: u32,
    /// Delay between readiness polls.
    pub poll_interval_ms: u64,
    /// File-name prefix of the temporary proxy log.
    pub log_prefix: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 3001,
            command: CommandSpec::new("npm", ["run", "proxy"]),
            max_wait_attempts: 10,
            poll_interval_ms: 1000,
            log_prefix: "wordtrack-proxy-".into(),
        }
    }
}

impl ProxyConfig {
    /// Delay between readiness polls.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Add-in debugging launcher settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "snake_case")]
pub struct LauncherConfig {
    /// Command that starts the launcher; the manifest is appended.
    pub command: CommandSpec,
    /// Add-in manifest handed to the launcher.
    pub manifest: PathBuf,
    /// Pause after spawning before checking whether the launcher exited.
    pub settle_ms: u64,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            command: CommandSpec::new("npx", ["office-addin-debugging", "start"]),
            manifest: PathBuf::from("manifest.xml"),
            settle_ms: 1000,
        }
    }
}

impl LauncherConfig {
    /// Pause after spawning before the exit check.
    #[must_use]
    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Full launcher command with the manifest argument appended.
    #[must_use]
    pub fn full_command(&self) -> CommandSpec {
        let mut command = self.command.clone();
        command
            .args
            .push(self.manifest.to_string_lossy().into_owned());
        command
    }
}

/// Development server settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "snake_case")]
pub struct DevServerConfig {
    /// Host the dev server listens on.
    pub host: String,
    /// TCP port whose reachability marks the dev server as ready.
    pub port: u16,
    /// Command used for the manual fallback start.
    pub command: CommandSpec,
    /// Number of one-interval polls before falling back to a manual start.
    pub max_wait_attempts: u32,
    /// Delay between readiness polls.
    pub poll_interval_ms: u64,
    /// Wait after the fallback spawn before the final port check.
    pub fallback_grace_ms: u64,
    /// Log file for the fallback dev server's output.
    pub log_path: PathBuf,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 3000,
            command: CommandSpec::new("npm", ["run", "dev-server"]),
            max_wait_attempts: 30,
            poll_interval_ms: 1000,
            fallback_grace_ms: 5000,
            log_path: std::env::temp_dir().join("wordtrack-dev-server.log"),
        }
    }
}

impl DevServerConfig {
    /// Delay between readiness polls.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Wait after the fallback spawn.
    #[must_use]
    pub fn fallback_grace(&self) -> Duration {
        Duration::from_millis(self.fallback_grace_ms)
    }
}

/// Document rescue settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "snake_case")]
pub struct RescueConfig {
    /// Whether the rescue watcher runs at all.
    pub enabled: bool,
    /// Pattern matched against full command lines of running processes.
    pub process_pattern: String,
    /// Grace period before the first presence check.
    pub initial_delay_ms: u64,
    /// Interval between presence checks.
    pub poll_interval_ms: u64,
    /// Pause after the application disappears, before searching.
    pub flush_delay_ms: u64,
    /// Glob matched against candidate file names.
    pub file_pattern: String,
    /// Required file extension, without the dot.
    pub extension: String,
    /// Maximum candidate age.
    pub staleness_seconds: u64,
    /// Directories searched recursively, in order.
    pub search_roots: Vec<PathBuf>,
    /// Where the rescued document is copied. Defaults to
    /// `~/Downloads/Default.docx`.
    pub destination: Option<PathBuf>,
}

impl Default for RescueConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            process_pattern: "Microsoft Word".into(),
            initial_delay_ms: 3000,
            poll_interval_ms: 2000,
            flush_delay_ms: 1000,
            file_pattern: "Word add-in*.docx".into(),
            extension: "docx".into(),
            staleness_seconds: 3600,
            search_roots: vec![
                PathBuf::from("/var/folders"),
                PathBuf::from("/private/var/folders"),
                std::env::temp_dir(),
            ],
            destination: None,
        }
    }
}

impl RescueConfig {
    /// Maximum candidate age.
    #[must_use]
    pub fn staleness(&self) -> Duration {
        Duration::from_secs(self.staleness_seconds)
    }

    /// Resolve the destination, falling back to the user's downloads folder.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if no destination is configured and the
    /// home directory cannot be determined.
    pub fn destination(&self) -> Result<PathBuf> {
        if let Some(path) = &self.destination {
            return Ok(path.clone());
        }
        dirs::home_dir()
            .map(|home| home.join("Downloads").join("Default.docx"))
            .ok_or_else(|| {
                AppError::Config("cannot determine home directory for rescue destination".into())
            })
    }
}

/// Steady-state monitoring settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "snake_case")]
pub struct MonitorConfig {
    /// Interval between health checks.
    pub interval_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self { interval_ms: 5000 }
    }
}

impl MonitorConfig {
    /// Interval between health checks.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Top-level session configuration parsed from an optional TOML file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "snake_case")]
pub struct SessionConfig {
    /// Directory every child process starts in.
    pub work_dir: PathBuf,
    /// Connect timeout for port probes.
    pub probe_timeout_ms: u64,
    /// Grace between the polite and the forced termination of a child.
    pub terminate_grace_ms: u64,
    /// Proxy server settings.
    pub proxy: ProxyConfig,
    /// Launcher settings.
    pub launcher: LauncherConfig,
    /// Dev server settings.
    pub dev_server: DevServerConfig,
    /// Rescue watcher settings.
    pub rescue: RescueConfig,
    /// Monitoring loop settings.
    pub monitor: MonitorConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            probe_timeout_ms: 500,
            terminate_grace_ms: 1000,
            proxy: ProxyConfig::default(),
            launcher: LauncherConfig::default(),
            dev_server: DevServerConfig::default(),
            rescue: RescueConfig::default(),
            monitor: MonitorConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and normalize paths.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Connect timeout for port probes.
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Grace between the polite and the forced termination of a child.
    #[must_use]
    pub fn terminate_grace(&self) -> Duration {
        Duration::from_millis(self.terminate_grace_ms)
    }

    /// Check invariants and canonicalize the working directory.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` describing the first invalid value.
    pub fn validate(&mut self) -> Result<()> {
        if self.proxy.port == 0 || self.dev_server.port == 0 {
            return Err(AppError::Config("ports must be greater than zero".into()));
        }

        if self.proxy.max_wait_attempts == 0 || self.dev_server.max_wait_attempts == 0 {
            return Err(AppError::Config(
                "max_wait_attempts must be greater than zero".into(),
            ));
        }

        for (name, command) in [
            ("proxy", &self.proxy.command),
            ("launcher", &self.launcher.command),
            ("dev_server", &self.dev_server.command),
        ] {
            if command.program.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "{name}.command.program must not be empty"
                )));
            }
        }

        glob::Pattern::new(&self.rescue.file_pattern).map_err(|err| {
            AppError::Config(format!("rescue.file_pattern is not a valid glob: {err}"))
        })?;

        if self.rescue.enabled {
            self.rescue.destination()?;
        }

        let canonical = self
            .work_dir
            .canonicalize()
            .map_err(|err| AppError::Config(format!("work_dir invalid: {err}")))?;
        self.work_dir = canonical;

        Ok(())
    }
}
