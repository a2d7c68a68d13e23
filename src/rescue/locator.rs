//! Search of temp-file roots for a recently modified working document.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use glob::Pattern;
use tracing::{debug, info};

use crate::config::RescueConfig;

/// A file that matched the name pattern and is young enough to rescue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactCandidate {
    /// Location of the file.
    pub path: PathBuf,
    /// Last modification time.
    pub modified: SystemTime,
    /// Age relative to the search time. Future timestamps count as zero.
    pub age: Duration,
}

/// Recursive search for rescue candidates under a fixed set of roots.
#[derive(Debug, Clone)]
pub struct ArtifactLocator {
    roots: Vec<PathBuf>,
    file_pattern: String,
    extension: String,
    staleness: Duration,
}

impl ArtifactLocator {
    /// Build a locator over `roots`.
    ///
    /// `file_pattern` is a glob matched against file names, `extension` is
    /// compared without the leading dot.
    #[must_use]
    pub fn new(
        roots: Vec<PathBuf>,
        file_pattern: impl Into<String>,
        extension: impl Into<String>,
        staleness: Duration,
    ) -> Self {
        Self {
            roots,
            file_pattern: file_pattern.into(),
            extension: extension.into(),
            staleness,
        }
    }

    /// Build a locator from the rescue section of the session config.
    #[must_use]
    pub fn from_config(config: &RescueConfig) -> Self {
        Self::new(
            config.search_roots.clone(),
            config.file_pattern.clone(),
            config.extension.clone(),
            config.staleness(),
        )
    }

    /// First eligible candidate, judged against the current time.
    #[must_use]
    pub fn find(&self) -> Option<ArtifactCandidate> {
        self.find_at(SystemTime::now())
    }

    /// First eligible candidate in traversal order, judged against `now`.
    ///
    /// Roots that do not exist are skipped, as are entries that cannot be
    /// read. No attempt is made to pick the newest of several matches.
    #[must_use]
    pub fn find_at(&self, now: SystemTime) -> Option<ArtifactCandidate> {
        info!(pattern = self.file_pattern, "searching for temp document");

        for root in &self.roots {
            if !root.is_dir() {
                debug!(root = %root.display(), "search root missing; skipping");
                continue;
            }

            let pattern = format!(
                "{}/**/{}",
                Pattern::escape(&root.to_string_lossy()),
                self.file_pattern
            );
            let entries = match glob::glob(&pattern) {
                Ok(entries) => entries,
                Err(err) => {
                    debug!(root = %root.display(), %err, "invalid search pattern");
                    continue;
                }
            };

            for entry in entries {
                match entry {
                    Ok(path) => {
                        if let Some(candidate) = self.evaluate(&path, now) {
                            info!(path = %candidate.path.display(), "found temp document");
                            return Some(candidate);
                        }
                    }
                    Err(err) => debug!(%err, "skipping unreadable entry"),
                }
            }
        }

        None
    }

    fn evaluate(&self, path: &Path, now: SystemTime) -> Option<ArtifactCandidate> {
        let metadata = path.metadata().ok()?;
        if !metadata.is_file() {
            return None;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some(self.extension.as_str()) {
            return None;
        }

        let modified = metadata.modified().ok()?;
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age >= self.staleness {
            debug!(path = %path.display(), ?age, "candidate too old");
            return None;
        }

        Some(ArtifactCandidate {
            path: path.to_path_buf(),
            modified,
            age,
        })
    }
}
