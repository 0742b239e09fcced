//! Local mirrors of remote live queries.
//!
//! A [`LiveMirror`] owns at most one listener task. Attaching a new
//! subscription aborts the previous task and bumps a generation counter;
//! snapshots from an older generation are discarded even if they race the
//! abort. Dropping the mirror aborts its task.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::metrics::{LISTENER_ERRORS, LISTENER_SNAPSHOTS};
use crate::store::{StoreError, Subscription};

/// Sync state of a mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorStatus {
    /// Nothing attached.
    Idle,
    /// Attached, first snapshot not received yet.
    Pending,
    /// Holding the latest remote snapshot.
    Synced,
    /// The listener reported an error; the previous value is kept.
    Failed(StoreError),
}

pub struct LiveMirror<T> {
    stream: &'static str,
    state: Arc<watch::Sender<T>>,
    status: Arc<watch::Sender<MirrorStatus>>,
    key: Mutex<Option<String>>,
    generation: Arc<AtomicU64>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<T> LiveMirror<T>
where
    T: Clone + Default + Send + Sync + 'static,
{
    /// `stream` labels logs and metrics.
    pub fn new(stream: &'static str) -> Self {
        Self {
            stream,
            state: Arc::new(watch::Sender::new(T::default())),
            status: Arc::new(watch::Sender::new(MirrorStatus::Idle)),
            key: Mutex::new(None),
            generation: Arc::new(AtomicU64::new(0)),
            task: Mutex::new(None),
        }
    }

    /// Mirror `subscription`, replacing whatever was attached before.
    ///
    /// Switching to a different key clears the value first so a stale list
    /// is never shown under the new key.
    pub fn attach<S, F>(&self, key: &str, mut subscription: Subscription<S>, project: F)
    where
        S: Send + 'static,
        F: Fn(S) -> T + Send + 'static,
    {
        let mut task = self.task.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = task.take() {
            previous.abort();
        }
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut current_key = self.key.lock().unwrap_or_else(|p| p.into_inner());
            if current_key.as_deref() != Some(key) {
                self.state.send_replace(T::default());
                *current_key = Some(key.to_string());
            }
        }
        self.status.send_replace(MirrorStatus::Pending);

        let stream = self.stream;
        let state = Arc::clone(&self.state);
        let status = Arc::clone(&self.status);
        let live_generation = Arc::clone(&self.generation);
        let key = key.to_string();

        *task = Some(tokio::spawn(async move {
            while let Some(next) = subscription.next().await {
                let current = || live_generation.load(Ordering::SeqCst) == generation;
                match next {
                    Ok(snapshot) => {
                        let value = project(snapshot);
                        let applied = state.send_if_modified(|slot| {
                            if current() {
                                *slot = value;
                                true
                            } else {
                                false
                            }
                        });
                        if !applied {
                            break;
                        }
                        status.send_replace(MirrorStatus::Synced);
                        LISTENER_SNAPSHOTS.with_label_values(&[stream]).inc();
                    }
                    Err(e) => {
                        if !current() {
                            break;
                        }
                        tracing::warn!(stream, key = %key, error = %e, "Live listener error, keeping previous value");
                        LISTENER_ERRORS.with_label_values(&[stream]).inc();
                        status.send_replace(MirrorStatus::Failed(e));
                    }
                }
            }
            tracing::trace!(stream, key = %key, "Live listener ended");
        }));
    }

    /// Stop listening. The last value stays readable.
    pub fn detach(&self) {
        let mut task = self.task.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = task.take() {
            previous.abort();
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.status.send_replace(MirrorStatus::Idle);
    }

    pub fn current(&self) -> T {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.state.subscribe()
    }

    /// Borrow the current value without cloning it.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.state.borrow())
    }

    /// Key of the attached (or last attached) subscription.
    pub fn key(&self) -> Option<String> {
        self.key.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn status(&self) -> MirrorStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<MirrorStatus> {
        self.status.subscribe()
    }

    /// Wait until the attached listener delivers a snapshot or an error.
    pub async fn wait_synced(&self) -> MirrorStatus {
        let mut rx = self.status.subscribe();
        let result = rx
            .wait_for(|status| !matches!(status, MirrorStatus::Pending))
            .await
            .map(|status| status.clone());
        // The sender lives in `self`, so the channel cannot close here.
        result.unwrap_or(MirrorStatus::Idle)
    }

    /// Patch the local value, but only while `key` is the mirrored key.
    ///
    /// `f` returns whether it changed anything. The next remote snapshot
    /// overwrites the patch.
    pub fn patch(&self, key: &str, f: impl FnOnce(&mut T) -> bool) -> bool {
        let current_key = self.key.lock().unwrap_or_else(|p| p.into_inner());
        if current_key.as_deref() != Some(key) {
            return false;
        }
        self.state.send_if_modified(f)
    }
}

impl<T> Drop for LiveMirror<T> {
    fn drop(&mut self) {
        let task = match self.task.get_mut() {
            Ok(task) => task,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(task) = task.take() {
            task.abort();
        }
    }
}

impl<T> std::fmt::Debug for LiveMirror<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveMirror")
            .field("stream", &self.stream)
            .field("status", &*self.status.borrow())
            .finish()
    }
}
