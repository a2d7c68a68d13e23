//! TCP reachability probe.

use std::time::Duration;

use tokio::net::{lookup_host, TcpStream};
use tracing::debug;

/// Report whether something accepts TCP connections on `host:port`.
///
/// Resolution and the connect attempts to every resolved address share a
/// single `timeout` budget. Refused connections, timeouts and resolution
/// failures all yield `false`; this function never errors.
pub async fn is_listening(host: &str, port: u16, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, connect_any(host, port)).await {
        Ok(listening) => listening,
        Err(_elapsed) => {
            debug!(host, port, ?timeout, "port probe: timed out");
            false
        }
    }
}

async fn connect_any(host: &str, port: u16) -> bool {
    let addrs = match lookup_host((host, port)).await {
        Ok(addrs) => addrs,
        Err(err) => {
            debug!(host, port, %err, "port probe: resolution failed");
            return false;
        }
    };

    for addr in addrs {
        match TcpStream::connect(addr).await {
            Ok(_stream) => return true,
            Err(err) => debug!(%addr, %err, "port probe: connect failed"),
        }
    }

    false
}
