use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, info};

use common::{Phase, Task};

use crate::client::{WorkerAddr, WorkerClient};
use crate::worker_feed::WorkerFeed;

/// Controls the pause between attempts of one task's retry chain.
///
/// The default keeps the historical semantics: retry forever with no
/// delay. There is never an attempt cap; giving up on a task would
/// break the phase completion guarantee.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryPolicy {
    pub backoff: Option<Duration>,
}

impl RetryPolicy {
    pub fn with_backoff(backoff: Duration) -> Self {
        Self {
            backoff: Some(backoff),
        }
    }
}

/// Starts and waits for all tasks in the given phase.
///
/// `map_files` holds the names of the map inputs, one per map task, and
/// `n_reduce` is the number of reduce tasks. The feed yields the RPC
/// addresses of all registered workers, existing and new; any worker
/// may end up finishing several tasks. Returns only once every task in
/// the phase has completed exactly once.
pub async fn schedule(
    job_name: &str,
    map_files: &[String],
    n_reduce: usize,
    phase: Phase,
    feed: &WorkerFeed,
    client: Arc<dyn WorkerClient>,
    policy: RetryPolicy,
) -> anyhow::Result<()> {
    // Number of tasks, and of inputs (reduce) or outputs (map) on the
    // other side of the shuffle.
    let (ntasks, n_other) = match phase {
        Phase::Map => (map_files.len(), n_reduce),
        Phase::Reduce => (n_reduce, map_files.len()),
    };

    info!("schedule: {ntasks} {phase} tasks ({n_other} I/Os)");

    let mut attempts = JoinSet::new();
    for task_number in 0..ntasks {
        let task = Task {
            job_name: job_name.to_owned(),
            file: match phase {
                Phase::Map => map_files[task_number].clone(),
                Phase::Reduce => String::new(),
            },
            phase,
            task_number,
            num_other_phase: n_other,
        };

        let worker = feed.take().await;
        attempts.spawn(dispatch(
            worker,
            task,
            feed.clone(),
            Arc::clone(&client),
            policy,
        ));
    }

    while let Some(joined) = attempts.join_next().await {
        joined?;
    }

    info!("schedule: {phase} phase done");
    Ok(())
}

/// One task's attempt chain; sequential retries, one live attempt at a
/// time. On success the worker goes back into the feed and the chain
/// ends, which is the task's single completion signal. On failure the
/// worker is assumed dead and dropped for good; only the registration
/// side can bring an address back.
async fn dispatch(
    mut worker: WorkerAddr,
    task: Task,
    feed: WorkerFeed,
    client: Arc<dyn WorkerClient>,
    policy: RetryPolicy,
) {
    loop {
        if client.do_task(&worker, &task).await {
            debug!("{} task {} done on {worker}", task.phase, task.task_number);
            feed.offer(worker);
            return;
        }

        debug!(
            "{} task {} failed on {worker}, discarding worker",
            task.phase, task.task_number
        );

        if let Some(delay) = policy.backoff {
            tokio::time::sleep(delay).await;
        }
        worker = feed.take().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Scripted transport: records every attempt and fails each
    /// worker's first `failures[worker]` calls.
    struct ScriptedClient {
        failures: HashMap<WorkerAddr, usize>,
        attempts: Mutex<HashMap<WorkerAddr, usize>>,
        calls: Mutex<Vec<(WorkerAddr, Task, bool)>>,
    }

    impl ScriptedClient {
        fn reliable() -> Self {
            Self::with_failures([])
        }

        fn with_failures(failures: impl IntoIterator<Item = (&'static str, usize)>) -> Self {
            Self {
                failures: failures
                    .into_iter()
                    .map(|(worker, n)| (worker.to_owned(), n))
                    .collect(),
                attempts: Mutex::new(HashMap::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(WorkerAddr, Task, bool)> {
            self.calls.lock().unwrap().clone()
        }

        fn completed_tasks(&self) -> Vec<usize> {
            let mut tasks: Vec<usize> = self
                .calls()
                .into_iter()
                .filter(|(_, _, ok)| *ok)
                .map(|(_, task, _)| task.task_number)
                .collect();
            tasks.sort_unstable();
            tasks
        }
    }

    #[async_trait]
    impl WorkerClient for ScriptedClient {
        async fn do_task(&self, worker: &WorkerAddr, task: &Task) -> bool {
            let attempt = {
                let mut attempts = self.attempts.lock().unwrap();
                let count = attempts.entry(worker.clone()).or_insert(0);
                *count += 1;
                *count
            };
            let ok = attempt > self.failures.get(worker).copied().unwrap_or(0);
            self.calls
                .lock()
                .unwrap()
                .push((worker.clone(), task.clone(), ok));
            ok
        }
    }

    fn feed_with(workers: &[&str]) -> WorkerFeed {
        let feed = WorkerFeed::new();
        for worker in workers {
            feed.offer((*worker).to_owned());
        }
        feed
    }

    fn map_files(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("input-{i}.txt")).collect()
    }

    #[tokio::test]
    async fn empty_phase_returns_immediately() {
        let feed = WorkerFeed::new();
        let client = Arc::new(ScriptedClient::reliable());

        schedule(
            "job",
            &[],
            0,
            Phase::Map,
            &feed,
            client.clone(),
            RetryPolicy::default(),
        )
        .await
        .unwrap();

        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn completes_every_map_task_exactly_once() {
        // More tasks than workers, so workers must be recycled.
        let feed = feed_with(&["w1", "w2", "w3"]);
        let client = Arc::new(ScriptedClient::reliable());
        let files = map_files(5);

        schedule(
            "job",
            &files,
            3,
            Phase::Map,
            &feed,
            client.clone(),
            RetryPolicy::default(),
        )
        .await
        .unwrap();

        assert_eq!(client.completed_tasks(), vec![0, 1, 2, 3, 4]);
        for (_, task, _) in client.calls() {
            assert_eq!(task.phase, Phase::Map);
            assert_eq!(task.num_other_phase, 3);
            assert_eq!(task.file, format!("input-{}.txt", task.task_number));
        }
        // Every worker made it back into the feed.
        assert_eq!(feed.len(), 3);
    }

    #[tokio::test]
    async fn reduce_tasks_cover_the_partition_range() {
        let feed = feed_with(&["w1", "w2"]);
        let client = Arc::new(ScriptedClient::reliable());
        let files = map_files(2);

        schedule(
            "job",
            &files,
            4,
            Phase::Reduce,
            &feed,
            client.clone(),
            RetryPolicy::default(),
        )
        .await
        .unwrap();

        assert_eq!(client.completed_tasks(), vec![0, 1, 2, 3]);
        for (_, task, _) in client.calls() {
            assert_eq!(task.phase, Phase::Reduce);
            assert_eq!(task.num_other_phase, 2);
            assert!(task.file.is_empty());
        }
    }

    #[tokio::test]
    async fn failed_worker_is_discarded_for_good() {
        let feed = feed_with(&["bad", "good"]);
        let client = Arc::new(ScriptedClient::with_failures([("bad", usize::MAX)]));
        let files = map_files(3);

        schedule(
            "job",
            &files,
            1,
            Phase::Map,
            &feed,
            client.clone(),
            RetryPolicy::default(),
        )
        .await
        .unwrap();

        let bad_calls: Vec<_> = client
            .calls()
            .into_iter()
            .filter(|(worker, _, _)| worker == "bad")
            .collect();
        assert_eq!(bad_calls.len(), 1, "a failed worker must never be reused");

        assert_eq!(client.completed_tasks(), vec![0, 1, 2]);
        assert_eq!(feed.len(), 1);
        assert_eq!(feed.take().await, "good");
    }

    #[tokio::test]
    async fn flaky_worker_finishes_after_external_resupply() {
        // The worker fails once and is discarded; the registration side
        // has offered the same address again, and its second call
        // succeeds.
        let feed = feed_with(&["flaky", "flaky"]);
        let client = Arc::new(ScriptedClient::with_failures([("flaky", 1)]));
        let files = map_files(1);

        schedule(
            "job",
            &files,
            1,
            Phase::Map,
            &feed,
            client.clone(),
            RetryPolicy::default(),
        )
        .await
        .unwrap();

        let calls = client.calls();
        assert_eq!(calls.len(), 2);
        assert!(!calls[0].2);
        assert!(calls[1].2);
        assert_eq!(client.completed_tasks(), vec![0]);
    }

    #[tokio::test]
    async fn backoff_does_not_change_completion() {
        let feed = feed_with(&["a", "b", "c"]);
        let client = Arc::new(ScriptedClient::with_failures([("a", 1), ("b", 1)]));
        let files = map_files(2);

        schedule(
            "job",
            &files,
            1,
            Phase::Map,
            &feed,
            client.clone(),
            RetryPolicy::with_backoff(Duration::from_millis(1)),
        )
        .await
        .unwrap();

        assert_eq!(client.completed_tasks(), vec![0, 1]);
    }
}
