//! Operator-facing diagnostics for failed startup steps.

use tracing::{info, warn};

use crate::process::ProcessHandle;

/// Common causes shown when a Node-based service will not come up.
#[must_use]
pub fn common_issues(port: u16, include_certificates: bool) -> Vec<String> {
    let mut issues = vec![
        format!("port {port} may be in use: lsof -i :{port}"),
        "Node.js version too old (needs v16+): node -v".to_owned(),
        "missing dependencies: npm install".to_owned(),
    ];
    if include_certificates {
        issues.push("certificate issues: npx office-addin-dev-certs install".to_owned());
    }
    issues
}

/// Log each common issue as a warning.
pub fn report_common_issues(port: u16, include_certificates: bool) {
    warn!("common issues:");
    for issue in common_issues(port, include_certificates) {
        warn!("  - {issue}");
    }
}

/// Replay a handle's captured output as warnings, for failure diagnosis.
pub fn dump_log(handle: &ProcessHandle) {
    let service = handle.name();
    if let Some(path) = handle.log_path() {
        warn!(service, log = %path.display(), "check the log for errors");
    }
    match handle.read_log() {
        Some(contents) if !contents.trim().is_empty() => {
            warn!(service, "captured output:");
            for line in contents.lines() {
                warn!(service, "{line}");
            }
        }
        Some(_) => warn!(service, "(no output captured)"),
        None => warn!(service, "(log file not found)"),
    }
}

/// Replay a handle's captured output at info level, once, on success.
pub fn show_log(handle: &ProcessHandle) {
    let Some(contents) = handle.read_log() else {
        return;
    };
    if contents.trim().is_empty() {
        return;
    }
    let service = handle.name();
    info!(service, "captured output:");
    for line in contents.lines() {
        info!(service, "{line}");
    }
}
