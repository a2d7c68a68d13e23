#![forbid(unsafe_code)]

//! `wordtrack-session`: supervisor for a local WordTrack development
//! session: proxy, add-in launcher, dev server, and document rescue.

pub mod config;
pub mod errors;
pub mod probe;
pub mod process;
pub mod rescue;
pub mod supervisor;

pub use config::SessionConfig;
pub use errors::{AppError, Result};
pub use supervisor::{SessionExit, SessionSupervisor};
