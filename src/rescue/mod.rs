//! Document rescue: find the add-in's transient working document after
//! the word processor closes and copy it somewhere stable.

pub mod locator;
pub mod watcher;

pub use locator::{ArtifactCandidate, ArtifactLocator};
pub use watcher::{copy_preserving, rescue, RescueOutcome, RescueWatcher};
