//! Helpline connection step.
//!
//! Simulated: mounting starts a fixed delay, after which the status flips
//! from `Connecting` to `Connected`. No real call is placed. Unmounting
//! before the delay fires cancels the timer.

#[cfg(test)]
#[path = "helpline_test.rs"]
mod helpline_test;

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

pub const CONNECTED_MESSAGE: &str =
    "Emergency responders have been notified and are on their way. Stay on the line for further instructions.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
}

/// Proof that the simulated connection completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HelplineConnected {
    pub after: Duration,
}

pub struct HelplineStep {
    status: watch::Receiver<ConnectionStatus>,
    timer: JoinHandle<()>,
    delay: Duration,
}

impl HelplineStep {
    /// Start connecting. Must be called inside a tokio runtime.
    #[must_use]
    pub fn mount(delay: Duration) -> Self {
        let (tx, status) = watch::channel(ConnectionStatus::Connecting);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tx.send_replace(ConnectionStatus::Connected);
            info!(delay_ms = delay.as_millis(), "helpline connected");
        });
        Self { status, timer, delay }
    }

    #[must_use]
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Wait for the connection. `None` if the step was unmounted first.
    pub async fn connected(&mut self) -> Option<HelplineConnected> {
        let after = self.delay;
        self.status
            .wait_for(|s| *s == ConnectionStatus::Connected)
            .await
            .ok()
            .map(|_| HelplineConnected { after })
    }

    /// Cancel a pending connection.
    pub fn unmount(&mut self) {
        self.timer.abort();
    }
}

impl Drop for HelplineStep {
    fn drop(&mut self) {
        self.timer.abort();
    }
}
