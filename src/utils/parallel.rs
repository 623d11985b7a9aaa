//! Fixed-size worker pool for per-file stage work.
//!
//! Coordination between workers happens only through the state channel and
//! the filesystem; within a stage each file is owned by exactly one worker,
//! and no cross-file ordering is guaranteed.

use log::debug;
use rayon::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("thread pool error: {0}")]
    Build(String),
}

pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// Builds a pool with the given number of threads; 0 means one per
    /// logical core.
    pub fn new(threads: usize) -> Result<Self, PoolError> {
        let threads = if threads == 0 {
            num_cpus::get()
        } else {
            threads
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| PoolError::Build(e.to_string()))?;
        debug!("worker pool ready with {} threads", threads);
        Ok(WorkerPool { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Runs `work` over every item, consuming the items so each worker owns
    /// its input outright. Results come back in input order.
    pub fn run<T, U, F>(&self, items: Vec<T>, work: F) -> Vec<U>
    where
        T: Send,
        U: Send,
        F: Fn(T) -> U + Send + Sync,
    {
        self.pool
            .install(|| items.into_par_iter().map(work).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_keep_input_order() {
        let pool = WorkerPool::new(4).unwrap();
        let out = pool.run((0..100).collect(), |i: usize| i * 2);
        assert_eq!(out, (0..100).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_zero_threads_uses_all_cores() {
        let pool = WorkerPool::new(0).unwrap();
        assert!(pool.threads() >= 1);
    }

    #[test]
    fn test_errors_are_per_item() {
        let pool = WorkerPool::new(2).unwrap();
        let out = pool.run(vec![1usize, 0, 3], |i| {
            if i == 0 {
                Err("zero".to_string())
            } else {
                Ok(i)
            }
        });
        assert_eq!(out[0], Ok(1));
        assert_eq!(out[1], Err("zero".to_string()));
        assert_eq!(out[2], Ok(3));
    }
}
