// Worker Shutdown Token

use std::time::Duration;
use tokio::sync::watch;

/// Shutdown signal for graceful termination
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for shutdown signal
    ///
    /// Also resolves if every sender has been dropped.
    pub async fn wait(&mut self) {
        if self.is_shutdown() {
            return;
        }
        let _ = self.rx.changed().await;
    }

    /// Sleep for `duration` unless shutdown arrives first
    ///
    /// Returns true if the sleep was interrupted.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => false,
            _ = self.wait() => true,
        }
    }
}

/// Shutdown sender
pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    /// Signal shutdown to all workers
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// Create a shutdown channel
pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_returns_immediately_after_shutdown() {
        let (sender, mut token) = shutdown_channel();
        sender.shutdown();
        token.wait().await;
        assert!(token.is_shutdown());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_is_interrupted_by_shutdown() {
        let (sender, token) = shutdown_channel();
        let mut sleeper = token.clone();

        let handle = tokio::spawn(async move { sleeper.sleep(Duration::from_secs(60)).await });
        tokio::task::yield_now().await;
        sender.shutdown();

        assert!(handle.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_completes_without_shutdown() {
        let (_sender, mut token) = shutdown_channel();
        assert!(!token.sleep(Duration::from_millis(500)).await);
        assert!(!token.is_shutdown());
    }
}
