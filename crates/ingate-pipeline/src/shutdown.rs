use tokio::sync::watch;

/// Create a one-shot stop signal pair.
///
/// The handle side fires the signal; the signal side is handed to the batch
/// worker, which drains and exits once it observes the firing.
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopSignal { rx })
}

/// Firing side of the stop signal.
#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    /// Signal the worker to drain and exit. Idempotent.
    pub fn fire(&self) {
        let _ = self.tx.send(true);
    }
}

/// Observing side of the stop signal.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    pub fn fired(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until the signal fires. Returns immediately if it already has.
    /// A dropped handle counts as fired so the worker can never hang.
    pub async fn wait(&mut self) {
        let _ = self.rx.wait_for(|fired| *fired).await;
    }
}
