use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

/// An owned, cancellable one-shot timer that delivers `event` on a channel.
///
/// Arming while a previous fire is outstanding cancels and replaces it, so at
/// most one fire is ever pending per timer. Dropping the timer cancels it.
#[derive(Debug, Default)]
pub struct Timer {
    handle: Option<JoinHandle<()>>,
}

impl Timer {
    pub fn new() -> Self {
        Self { handle: None }
    }

    pub fn arm<E: Send + 'static>(&mut self, after: Duration, tx: UnboundedSender<E>, event: E) {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            // Receiver gone means the owner was torn down.
            let _ = tx.send(event);
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}
