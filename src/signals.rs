use anyhow::Result;
use tokio::signal::unix::{Signal, SignalKind, signal};
use tracing::info;

/// Handlers for the signals that should stop a running command between items
pub struct Shutdown {
    int: Signal,
    term: Signal,
    hup: Signal,
    quit: Signal,
}

impl Shutdown {
    pub fn listen() -> Result<Self> {
        Ok(Self {
            int: signal(SignalKind::interrupt())?,
            term: signal(SignalKind::terminate())?,
            hup: signal(SignalKind::hangup())?,
            quit: signal(SignalKind::quit())?,
        })
    }

    /// Wait until any of the shutdown signals is received
    pub async fn recv(&mut self) {
        let name = tokio::select! {
            _ = self.int.recv() => "SIGINT",
            _ = self.term.recv() => "SIGTERM",
            _ = self.hup.recv() => "SIGHUP",
            _ = self.quit.recv() => "SIGQUIT",
        };
        info!(signal = name, "Shutdown signal received");
    }
}
