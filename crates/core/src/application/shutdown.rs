// Shutdown signal for background loops

use tokio::sync::watch;

/// Receiving half, cloned into every background task
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown is signalled or the sender is dropped
    pub async fn wait(&mut self) {
        loop {
            let signalled = *self.rx.borrow();
            if signalled || self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Sending half, kept by the composition root
pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx })
}
