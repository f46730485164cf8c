//! Restart requests.
//!
//! The store never restarts anything itself; it hands a request to a
//! supervisor and carries on. `RestartSender` is the channel-backed
//! trigger the binary's supervisor loop listens on.

use thiserror::Error;
use tokio::sync::mpsc;

/// Errors raised when a restart cannot be requested.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RestartError {
    #[error("restart supervisor is no longer listening")]
    SupervisorGone,
}

/// Fire-and-forget restart trigger.
pub trait RestartTrigger: Send + Sync {
    fn request_restart(&self, reason: Option<&str>) -> Result<(), RestartError>;
}

/// A restart request as seen by the supervisor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartRequest {
    pub reason: Option<String>,
}

/// Channel-backed restart trigger.
#[derive(Debug, Clone)]
pub struct RestartSender {
    tx: mpsc::UnboundedSender<RestartRequest>,
}

impl RestartSender {
    /// Create a trigger and the receiver a supervisor reads requests from.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<RestartRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl RestartTrigger for RestartSender {
    fn request_restart(&self, reason: Option<&str>) -> Result<(), RestartError> {
        self.tx
            .send(RestartRequest {
                reason: reason.map(str::to_string),
            })
            .map_err(|_| RestartError::SupervisorGone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_delivers_requests() {
        let (trigger, mut rx) = RestartSender::channel();
        trigger.request_restart(Some("settings changed")).unwrap();

        let request = rx.try_recv().unwrap();
        assert_eq!(request.reason.as_deref(), Some("settings changed"));
    }

    #[test]
    fn test_sender_reports_missing_supervisor() {
        let (trigger, rx) = RestartSender::channel();
        drop(rx);

        assert_eq!(trigger.request_restart(None), Err(RestartError::SupervisorGone));
    }
}
