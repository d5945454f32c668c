use async_trait::async_trait;

use common::Task;

/// Opaque handle for a worker's RPC endpoint. The scheduler only holds
/// an address between pulling it from the feed and either recycling or
/// discarding it.
pub type WorkerAddr = String;

/// Transport collaborator for the `Worker.DoTask` procedure.
///
/// Implementations own connection management, timeouts and failure
/// detection. RPC errors, timeouts and worker crashes all collapse to
/// `false`; the scheduler never distinguishes them further.
#[async_trait]
pub trait WorkerClient: Send + Sync + 'static {
    /// Run `task` on `worker`, blocking until the remote procedure
    /// returns or the transport reports failure.
    async fn do_task(&self, worker: &WorkerAddr, task: &Task) -> bool;
}
