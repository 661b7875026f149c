//! Cancellation signal for traversal requests

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

/// Trips every [`CancelSignal`] created with it
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Observed by a traversal; fires on explicit cancel or when the deadline
/// passes. The default signal never fires.
#[derive(Debug, Clone, Default)]
pub struct CancelSignal {
    rx: Option<watch::Receiver<bool>>,
    deadline: Option<Instant>,
}

impl CancelSignal {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn pair() -> (CancelHandle, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (
            CancelHandle { tx },
            CancelSignal {
                rx: Some(rx),
                deadline: None,
            },
        )
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn is_cancelled(&self) -> bool {
        let flagged = self.rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false);
        let expired = self.deadline.map(|d| Instant::now() >= d).unwrap_or(false);
        flagged || expired
    }

    /// Resolves once the signal fires; pending forever otherwise
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let flagged = async {
            match rx.as_mut() {
                Some(rx) => {
                    if rx.wait_for(|cancelled| *cancelled).await.is_err() {
                        // Handle dropped without cancelling
                        std::future::pending::<()>().await;
                    }
                }
                None => std::future::pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = flagged => {}
            _ = expired => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_explicit_cancel() {
        let (handle, signal) = CancelSignal::pair();
        assert!(!signal.is_cancelled());
        handle.cancel();
        assert!(signal.is_cancelled());
        tokio::time::timeout(Duration::from_secs(1), signal.cancelled())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_deadline_fires() {
        let signal = CancelSignal::none().with_timeout(Duration::from_millis(10));
        tokio::time::timeout(Duration::from_secs(1), signal.cancelled())
            .await
            .unwrap();
        assert!(signal.is_cancelled());
    }

    #[tokio::test]
    async fn test_none_never_fires() {
        let signal = CancelSignal::none();
        let waited = tokio::time::timeout(Duration::from_millis(20), signal.cancelled()).await;
        assert!(waited.is_err());
        assert!(!signal.is_cancelled());
    }
}
