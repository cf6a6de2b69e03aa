use tokio::sync::watch;

/// Owner side of a cancellation signal for an in-progress run.
///
/// Cancellation is cooperative: in-flight tasks finish or time out, no new
/// stage starts, and already-committed results are reported with overall
/// status `Cancelled`.
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Observer side handed to the engine.
#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelHandle {
    pub fn new() -> (Self, CancelToken) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, CancelToken { rx })
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }
}

impl CancelToken {
    /// A token that can never fire; used by [`super::ExecutionEngine::execute`].
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}
