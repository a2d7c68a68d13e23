//! Per-run session state: the three named process slots.

use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use crate::process::ProcessHandle;

/// The fixed set of processes a session supervises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotName {
    /// Background proxy server.
    Proxy,
    /// Add-in debugging launcher.
    Launcher,
    /// Development server, when started by the fallback path.
    DevServer,
}

impl SlotName {
    /// Order in which teardown visits the slots.
    pub const TEARDOWN_ORDER: [Self; 3] = [Self::Proxy, Self::DevServer, Self::Launcher];

    /// Short label used in log fields.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Proxy => "proxy",
            Self::Launcher => "launcher",
            Self::DevServer => "dev-server",
        }
    }
}

impl Display for SlotName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One process slot.
///
/// `already_running` means the service was found listening before this
/// session tried to start it. Such a slot belongs to someone else and is
/// never terminated by this session.
#[derive(Debug, Default)]
pub struct Slot {
    handle: Option<ProcessHandle>,
    already_running: bool,
    stop_reported: bool,
}

impl Slot {
    /// Process handle, if this session spawned one.
    #[must_use]
    pub fn handle(&self) -> Option<&ProcessHandle> {
        self.handle.as_ref()
    }

    /// Mutable process handle, if this session spawned one.
    pub fn handle_mut(&mut self) -> Option<&mut ProcessHandle> {
        self.handle.as_mut()
    }

    /// Store a freshly spawned handle, replacing any previous one.
    pub fn set_handle(&mut self, handle: ProcessHandle) -> &mut ProcessHandle {
        self.handle.insert(handle)
    }

    /// Remove the handle from the slot.
    pub fn take_handle(&mut self) -> Option<ProcessHandle> {
        self.handle.take()
    }

    /// Whether another owner was already serving this slot's port.
    #[must_use]
    pub fn is_already_running(&self) -> bool {
        self.already_running
    }

    /// Record that another owner is serving this slot's port.
    pub fn mark_already_running(&mut self) {
        self.already_running = true;
    }

    pub(crate) fn stop_reported(&self) -> bool {
        self.stop_reported
    }

    pub(crate) fn mark_stop_reported(&mut self) {
        self.stop_reported = true;
    }
}

/// Mutable state of one supervised session.
#[derive(Debug)]
pub struct Session {
    work_dir: PathBuf,
    proxy: Slot,
    launcher: Slot,
    dev_server: Slot,
}

impl Session {
    /// Empty session rooted at `work_dir`.
    #[must_use]
    pub fn new(work_dir: PathBuf) -> Self {
        Self {
            work_dir,
            proxy: Slot::default(),
            launcher: Slot::default(),
            dev_server: Slot::default(),
        }
    }

    /// Directory every child process starts in.
    #[must_use]
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Slot by name.
    #[must_use]
    pub fn slot(&self, name: SlotName) -> &Slot {
        match name {
            SlotName::Proxy => &self.proxy,
            SlotName::Launcher => &self.launcher,
            SlotName::DevServer => &self.dev_server,
        }
    }

    /// Mutable slot by name.
    pub fn slot_mut(&mut self, name: SlotName) -> &mut Slot {
        match name {
            SlotName::Proxy => &mut self.proxy,
            SlotName::Launcher => &mut self.launcher,
            SlotName::DevServer => &mut self.dev_server,
        }
    }
}
