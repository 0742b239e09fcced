use tokio::sync::mpsc;

use super::Notice;

/// Handle for emitting notices.
///
/// Cheaply cloneable. Emitting never blocks and never fails the caller: a
/// full or closed channel only logs.
#[derive(Debug, Clone)]
pub struct NoticeHandle {
    tx: Option<mpsc::Sender<Notice>>,
}

impl NoticeHandle {
    pub fn new(tx: mpsc::Sender<Notice>) -> Self {
        Self { tx: Some(tx) }
    }

    /// A handle that drops every notice.
    pub fn detached() -> Self {
        Self { tx: None }
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(Notice::info(message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(Notice::error(message));
    }

    fn emit(&self, notice: Notice) {
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(notice) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(notice)) => {
                tracing::warn!(message = %notice.message, "Notice channel full, dropping notice");
            }
            Err(mpsc::error::TrySendError::Closed(notice)) => {
                tracing::debug!(message = %notice.message, "No notice consumer");
            }
        }
    }
}

/// Create a notice channel with the given buffer.
pub fn notice_channel(buffer: usize) -> (NoticeHandle, mpsc::Receiver<Notice>) {
    let (tx, rx) = mpsc::channel(buffer);
    (NoticeHandle::new(tx), rx)
}
