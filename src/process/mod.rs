//! External process handles.

pub mod handle;

pub use handle::{OutputTarget, ProcessHandle};
