//! Transport to the hosting environment.

use tokio::sync::mpsc;

/// One-way text channel to the host (a native shell's message handler, a
/// stdio pipe, a test harness).
pub trait HostChannel: Send + Sync {
    /// Deliver one encoded envelope. Returns `false` if the host is gone or
    /// the channel is full.
    fn post(&self, raw: &str) -> bool;
}

impl HostChannel for mpsc::UnboundedSender<String> {
    fn post(&self, raw: &str) -> bool {
        self.send(raw.to_owned()).is_ok()
    }
}

impl HostChannel for mpsc::Sender<String> {
    fn post(&self, raw: &str) -> bool {
        self.try_send(raw.to_owned()).is_ok()
    }
}
