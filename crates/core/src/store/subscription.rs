//! Live listener registrations.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::StoreError;

/// Buffer between a store-side listener and its consumer.
pub const SUBSCRIPTION_BUFFER: usize = 16;

/// A live query: yields a fresh snapshot on every relevant remote change.
///
/// The first item is the current state. Errors are delivered in-band and do
/// not end the stream. Dropping the subscription stops the store-side
/// listener task.
pub struct Subscription<T> {
    rx: mpsc::Receiver<Result<T, StoreError>>,
    producer: Option<JoinHandle<()>>,
}

impl<T> Subscription<T> {
    pub fn new(rx: mpsc::Receiver<Result<T, StoreError>>, producer: JoinHandle<()>) -> Self {
        Self {
            rx,
            producer: Some(producer),
        }
    }

    /// Next snapshot, or `None` once the store side has shut down.
    pub async fn next(&mut self) -> Option<Result<T, StoreError>> {
        self.rx.recv().await
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(producer) = self.producer.take() {
            producer.abort();
        }
    }
}

impl<T> std::fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field(
                "producer_running",
                &self.producer.as_ref().is_some_and(|p| !p.is_finished()),
            )
            .finish()
    }
}
