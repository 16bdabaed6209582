//! Cooperative cancellation for in-flight evaluations.

use tokio::sync::watch;

/// Sender half: flips the shared flag.
#[derive(Debug)]
pub struct CancellationHandle {
    tx: watch::Sender<bool>,
}

impl CancellationHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Receiver half, checked by the sequencer before each stage starts.
/// A stage already running completes or times out.
#[derive(Debug, Clone)]
pub struct CancellationSignal {
    rx: watch::Receiver<bool>,
}

impl CancellationSignal {
    pub fn new() -> (CancellationHandle, CancellationSignal) {
        let (tx, rx) = watch::channel(false);
        (CancellationHandle { tx }, CancellationSignal { rx })
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        Self::new().1
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}
