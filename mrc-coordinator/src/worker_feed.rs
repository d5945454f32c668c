use async_channel::{Receiver, Sender};

use crate::client::WorkerAddr;

/// Queue of available worker addresses.
///
/// Multi-producer multi-consumer and unbounded: the registration side
/// offers addresses as workers join, the scheduler offers them back
/// after successful use, and dispatchers take them as tasks need
/// owners. The feed is never closed during a phase.
#[derive(Debug, Clone)]
pub struct WorkerFeed {
    tx: Sender<WorkerAddr>,
    rx: Receiver<WorkerAddr>,
}

impl WorkerFeed {
    pub fn new() -> Self {
        let (tx, rx) = async_channel::unbounded();
        Self { tx, rx }
    }

    /// Make a worker available. Never blocks.
    pub fn offer(&self, worker: WorkerAddr) {
        self.tx
            .try_send(worker)
            .expect("worker feed closed while a handle is live");
    }

    /// Take exclusive use of a worker, waiting until one is available.
    pub async fn take(&self) -> WorkerAddr {
        self.rx
            .recv()
            .await
            .expect("worker feed closed while a handle is live")
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl Default for WorkerFeed {
    fn default() -> Self {
        Self::new()
    }
}
