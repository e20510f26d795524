//! Shutdown coordination for the server.
//!
//! One [`Shutdown`] handle is shared between the signal handler and every
//! serve loop; each loop holds its own receiver and stops when it fires.

use tokio::sync::broadcast;

/// Broadcast trigger for graceful shutdown. Cloning shares the same channel.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// A receiver for a serve loop; pass it to [`wait`].
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the trigger and return how many serve loops were listening.
    pub fn trigger(&self) -> usize {
        let listening = self.tx.receiver_count();
        let _ = self.tx.send(());
        tracing::info!(listening, "Shutdown triggered");
        listening
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve when `rx` observes a shutdown trigger or the coordinator is gone.
pub async fn wait(mut rx: broadcast::Receiver<()>) {
    let _ = rx.recv().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trigger_reaches_every_subscriber() {
        let shutdown = Shutdown::new();
        let first = tokio::spawn(wait(shutdown.subscribe()));
        let second = tokio::spawn(wait(shutdown.clone().subscribe()));

        assert_eq!(shutdown.trigger(), 2);
        first.await.unwrap();
        second.await.unwrap();
    }

    #[test]
    fn trigger_without_listeners_reports_zero() {
        assert_eq!(Shutdown::new().trigger(), 0);
    }

    #[tokio::test]
    async fn dropped_coordinator_releases_waiters() {
        let shutdown = Shutdown::new();
        let rx = shutdown.subscribe();
        drop(shutdown);
        wait(rx).await;
    }
}
