//! Fire-and-forget sink for diagnostic lines
//!
//! Dropped frames, fallback attempts, and terminal errors are reported here.
//! Implementations must never block and never fail the request.

use tokio::sync::mpsc;

/// Receiver of diagnostic lines
pub trait DiagnosticsSink: Send + Sync {
    /// Record one line; must return promptly
    fn append_line(&self, line: &str);
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDiagnostics;

impl DiagnosticsSink for NoopDiagnostics {
    fn append_line(&self, _line: &str) {}
}

/// Forwards lines to `tracing` at debug level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl DiagnosticsSink for TracingDiagnostics {
    fn append_line(&self, line: &str) {
        tracing::debug!(target: "axon::diagnostics", "{line}");
    }
}

/// Pushes lines into a bounded channel, dropping them when it is full or closed
#[derive(Debug, Clone)]
pub struct ChannelDiagnostics {
    sender: mpsc::Sender<String>,
}

impl ChannelDiagnostics {
    /// Create a sink and the receiver that drains it
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl DiagnosticsSink for ChannelDiagnostics {
    fn append_line(&self, line: &str) {
        // full or closed: the line is lost
        let _ = self.sender.try_send(line.to_owned());
    }
}
