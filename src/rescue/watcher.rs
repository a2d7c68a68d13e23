//! Background watcher that rescues the working document once the target
//! application has closed.
//!
//! The watcher runs once per session. It is spawned detached and never
//! joined; if the supervisor exits first the task is simply abandoned.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

use super::locator::ArtifactLocator;
use crate::config::RescueConfig;
use crate::probe::AppPresence;

/// Result of a single rescue attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RescueOutcome {
    /// The document was copied to the destination.
    Saved {
        /// Where the document was found.
        source: PathBuf,
        /// Where it was copied.
        destination: PathBuf,
    },
    /// A document was found but copying it failed.
    CopyFailed {
        /// Where the document still is.
        source: PathBuf,
        /// Copy error text.
        error: String,
    },
    /// No recent matching document exists.
    NotFound,
    /// The search itself crashed before reaching a verdict.
    SearchFailed {
        /// Failure text from the search task.
        error: String,
    },
}

impl RescueOutcome {
    /// Turn the result of the blocking search task into an outcome.
    #[must_use]
    pub fn from_task(result: Result<Self, JoinError>) -> Self {
        result.unwrap_or_else(|err| Self::SearchFailed {
            error: err.to_string(),
        })
    }

    /// Log the outcome with guidance for the user.
    pub fn report(&self) {
        match self {
            Self::Saved {
                source,
                destination,
            } => {
                info!(source = %source.display(), "SUCCESS: your work has been saved");
                info!(location = %destination.display(), "saved document location");
            }
            Self::CopyFailed { source, error } => {
                error!(%error, "error copying rescued document");
                warn!(source = %source.display(), "your original file is still here");
            }
            Self::NotFound => {
                warn!("could not find the temp document file");
                warn!("your work may have been saved elsewhere; check the word processor's recent documents or temp folders");
            }
            Self::SearchFailed { error } => {
                error!(%error, "document search failed");
                warn!("check the word processor's temp folders for a recent 'Word add-in' document");
            }
        }
    }
}

/// Locate a candidate and copy it to `destination`.
///
/// This performs blocking file-system I/O.
#[must_use]
pub fn rescue(locator: &ArtifactLocator, destination: &Path) -> RescueOutcome {
    let Some(candidate) = locator.find() else {
        return RescueOutcome::NotFound;
    };

    let modified: DateTime<Local> = candidate.modified.into();
    info!(
        source = %candidate.path.display(),
        modified = %modified.format("%Y-%m-%d %H:%M:%S"),
        destination = %destination.display(),
        "copying document"
    );

    match copy_preserving(&candidate.path, destination) {
        Ok(_) => RescueOutcome::Saved {
            source: candidate.path,
            destination: destination.to_path_buf(),
        },
        Err(err) => RescueOutcome::CopyFailed {
            source: candidate.path,
            error: err.to_string(),
        },
    }
}

/// Copy `source` to `destination`, keeping permissions and modification time.
///
/// The destination's parent directory is created when missing.
///
/// # Errors
///
/// Returns any I/O error from creating the directory, copying, or
/// restoring the timestamp.
pub fn copy_preserving(source: &Path, destination: &Path) -> io::Result<u64> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let bytes = fs::copy(source, destination)?;
    let modified = fs::metadata(source)?.modified()?;
    fs::OpenOptions::new()
        .write(true)
        .open(destination)?
        .set_modified(modified)?;
    Ok(bytes)
}

/// Waits for the target application to close, then rescues its document.
pub struct RescueWatcher<P> {
    probe: P,
    locator: ArtifactLocator,
    destination: PathBuf,
    initial_delay: Duration,
    poll_interval: Duration,
    flush_delay: Duration,
}

impl<P: AppPresence + 'static> RescueWatcher<P> {
    /// Build a watcher from the rescue config.
    #[must_use]
    pub fn new(config: &RescueConfig, destination: PathBuf, probe: P) -> Self {
        Self {
            probe,
            locator: ArtifactLocator::from_config(config),
            destination,
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            flush_delay: Duration::from_millis(config.flush_delay_ms),
        }
    }

    /// Start the watcher as a detached background task.
    ///
    /// Dropping the returned handle does not cancel the task.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<RescueOutcome> {
        tokio::spawn(self.run())
    }

    /// Wait for the application to disappear, rescue once, and report.
    pub async fn run(self) -> RescueOutcome {
        info!(
            destination = %self.destination.display(),
            "monitoring word processor; your work will be saved when it closes"
        );

        tokio::time::sleep(self.initial_delay).await;
        loop {
            tokio::time::sleep(self.poll_interval).await;
            if !self.probe.is_present().await {
                break;
            }
        }

        info!("word processor has closed; saving your work");
        tokio::time::sleep(self.flush_delay).await;

        let locator = self.locator;
        let destination = self.destination;
        let outcome = RescueOutcome::from_task(
            tokio::task::spawn_blocking(move || rescue(&locator, &destination)).await,
        );

        outcome.report();
        outcome
    }
}
