//! Error types shared across the session supervisor.

use std::fmt::{Display, Formatter};
use std::io;
use std::path::PathBuf;

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// An external command could not be started.
    Spawn(SpawnError),
    /// Startup failed in a way that aborts the whole session.
    Startup(FatalStartup),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Spawn(err) => write!(f, "spawn: {err}"),
            Self::Startup(err) => write!(f, "startup: {err}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<SpawnError> for AppError {
    fn from(err: SpawnError) -> Self {
        Self::Spawn(err)
    }
}

impl From<FatalStartup> for AppError {
    fn from(err: FatalStartup) -> Self {
        Self::Startup(err)
    }
}

/// Reasons an external command failed to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpawnError {
    /// The executable was not found on `PATH` or at the given location.
    NotFound {
        /// Program that was requested.
        program: String,
    },
    /// The executable exists but may not be executed.
    PermissionDenied {
        /// Program that was requested.
        program: String,
    },
    /// The working directory does not exist or is not a directory.
    InvalidWorkDir {
        /// Directory the child was asked to start in.
        path: PathBuf,
    },
    /// The command definition has no program.
    EmptyCommand,
    /// Any other OS-level spawn failure.
    Other {
        /// Program that was requested.
        program: String,
        /// OS error text.
        message: String,
    },
}

impl SpawnError {
    /// Classify an I/O error returned by `Command::spawn`.
    #[must_use]
    pub fn from_io(program: &str, err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound {
                program: program.to_owned(),
            },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                program: program.to_owned(),
            },
            _ => Self::Other {
                program: program.to_owned(),
                message: err.to_string(),
            },
        }
    }
}

impl Display for SpawnError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { program } => write!(f, "executable not found: {program}"),
            Self::PermissionDenied { program } => write!(f, "permission denied: {program}"),
            Self::InvalidWorkDir { path } => {
                write!(f, "invalid working directory: {}", path.display())
            }
            Self::EmptyCommand => write!(f, "command has no program"),
            Self::Other { program, message } => write!(f, "{program}: {message}"),
        }
    }
}

impl std::error::Error for SpawnError {}

/// Startup failures that abort the session with exit code 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalStartup {
    /// The proxy could not be spawned at all.
    ProxySpawn(SpawnError),
    /// The proxy process exited before its port came up.
    ProxyExited,
    /// The proxy stayed alive but never listened within the bound.
    ProxyTimeout {
        /// Number of polls performed.
        attempts: u32,
    },
    /// The launcher could not be spawned.
    LauncherSpawn(SpawnError),
}

impl Display for FatalStartup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProxySpawn(err) => write!(f, "failed to start proxy server: {err}"),
            Self::ProxyExited => write!(f, "proxy server process exited unexpectedly"),
            Self::ProxyTimeout { attempts } => {
                write!(f, "proxy server failed to start after {attempts} attempts")
            }
            Self::LauncherSpawn(err) => write!(f, "failed to start add-in debugging: {err}"),
        }
    }
}

impl std::error::Error for FatalStartup {}
