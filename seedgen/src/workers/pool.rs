//! Owns the batch assembler worker tasks for one pipeline run.

use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::error::{ErrorKind, SeedError, SeedResult};

/// Pool of batch assembler worker tasks.
///
/// Tracks every spawned worker so the pipeline can wait for all of them to
/// drain, or abort them wholesale when the shutdown grace period runs out.
#[derive(Debug, Default)]
pub struct AssemblerPool {
    join_set: JoinSet<(usize, SeedResult<()>)>,
}

impl AssemblerPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&mut self, worker_id: usize, future: F)
    where
        F: Future<Output = SeedResult<()>> + Send + 'static,
    {
        self.join_set.spawn(async move {
            let result = future.await;
            (worker_id, result)
        });

        debug!(worker_id, "spawned batch assembler worker in pool");
    }

    pub fn len(&self) -> usize {
        self.join_set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.join_set.is_empty()
    }

    /// Waits for every worker to finish, collecting their failures.
    ///
    /// A panicked worker is surfaced as [`ErrorKind::WorkerPanic`] rather
    /// than poisoning the caller. Multiple failures are aggregated into one
    /// error.
    pub async fn wait_all(&mut self) -> SeedResult<()> {
        let mut errors = Vec::new();

        while let Some(joined) = self.join_set.join_next().await {
            match joined {
                Ok((worker_id, Ok(()))) => {
                    debug!(worker_id, "batch assembler worker finished");
                }
                Ok((worker_id, Err(err))) => {
                    error!(worker_id, %err, "batch assembler worker failed");
                    errors.push(err);
                }
                Err(join_err) => {
                    error!(%join_err, "batch assembler worker task was aborted or panicked");
                    if join_err.is_panic() {
                        errors.push(
                            SeedError::from((
                                ErrorKind::WorkerPanic,
                                "A batch assembler worker panicked",
                            ))
                            .with_source(join_err),
                        );
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.into())
        }
    }

    /// Aborts every remaining worker task and waits until all have settled.
    ///
    /// A worker executing synchronous code keeps running until its next await
    /// point, so callers must not read shared state the workers mutate until
    /// this returns.
    pub async fn abort_and_wait(&mut self) {
        self.join_set.abort_all();
        while self.join_set.join_next().await.is_some() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed_error;

    #[tokio::test]
    async fn wait_all_succeeds_when_all_workers_succeed() {
        let mut pool = AssemblerPool::new();
        pool.spawn(0, async { Ok(()) });
        pool.spawn(1, async { Ok(()) });

        assert!(pool.wait_all().await.is_ok());
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn abort_and_wait_settles_every_worker() {
        let mut pool = AssemblerPool::new();
        pool.spawn(0, async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            Ok(())
        });

        pool.abort_and_wait().await;
        assert!(pool.is_empty());
    }

    #[tokio::test]
    async fn wait_all_aggregates_worker_failures() {
        let mut pool = AssemblerPool::new();
        pool.spawn(0, async { Ok(()) });
        pool.spawn(1, async {
            Err(seed_error!(ErrorKind::CircuitBreakerOpen, "tripped"))
        });

        let err = pool.wait_all().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CircuitBreakerOpen);
    }
}
