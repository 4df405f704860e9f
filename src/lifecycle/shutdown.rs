//! Shutdown coordination for the proxy.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Coordinator for graceful shutdown.
///
/// Cloneable handle; any clone may trigger, every subscriber observes the
/// deadline that in-flight work is allowed.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<Option<Duration>>>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Stop accepting new connections and give in-flight requests up to
    /// `deadline` to finish.
    ///
    /// Only the first trigger counts.
    pub fn trigger(&self, deadline: Duration) {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(deadline);
            true
        });
    }

    pub fn is_triggered(&self) -> bool {
        self.tx.borrow().is_some()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of [`Shutdown`].
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<Option<Duration>>,
}

impl ShutdownSignal {
    /// Wait until shutdown is triggered and return the grace deadline.
    ///
    /// Returns immediately if shutdown was triggered before the call. Cancel safe.
    pub async fn recv(&mut self) -> Duration {
        let deadline = match self.rx.wait_for(Option::is_some).await {
            Ok(deadline) => *deadline,
            Err(_) => None,
        };
        match deadline {
            Some(deadline) => deadline,
            // Every coordinator is gone, so nobody can trigger anymore.
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_observe_the_first_deadline() {
        let shutdown = Shutdown::new();
        let mut early = shutdown.subscribe();
        assert!(!shutdown.is_triggered());

        shutdown.trigger(Duration::from_secs(5));
        shutdown.clone().trigger(Duration::from_secs(1));
        assert!(shutdown.is_triggered());

        let mut late = shutdown.subscribe();
        assert_eq!(early.recv().await, Duration::from_secs(5));
        assert_eq!(late.recv().await, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn recv_waits_for_trigger() {
        let shutdown = Shutdown::new();
        let mut signal = shutdown.subscribe();

        let waiting = tokio::time::timeout(Duration::from_millis(50), signal.recv()).await;
        assert!(waiting.is_err());

        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.trigger(Duration::ZERO);
        });
        assert_eq!(signal.recv().await, Duration::ZERO);
    }
}
