//! Liveness probes.
//!
//! Port reachability is the readiness signal for every dependent
//! service; the application probe tells the rescue watcher whether the
//! word processor is still open.

pub mod app;
pub mod port;

pub use app::{AppPresence, PgrepProbe};
pub use port::is_listening;
