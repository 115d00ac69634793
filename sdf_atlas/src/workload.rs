// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fan-out of independent tasks over a fixed number of threads.

use core::num::NonZeroUsize;

/// A bounded pool that runs independent tasks and joins on them.
///
/// Every task runs exactly once. A failing task does not stop the others; the
/// overall result is `true` only if every task succeeded. With one thread, or
/// without the `multithreading` feature, tasks run in index order on the
/// calling thread and produce the same results.
#[derive(Debug)]
pub struct Workload {
    threads: usize,
    #[cfg(feature = "multithreading")]
    pool: Option<rayon::ThreadPool>,
}

impl Workload {
    /// Creates a workload running on `threads` threads.
    ///
    /// `0` uses the available hardware parallelism, at least one thread.
    pub fn new(threads: usize) -> Self {
        let threads = if threads == 0 {
            std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
        } else {
            threads
        };
        Self {
            threads,
            #[cfg(feature = "multithreading")]
            pool: Self::build_pool(threads),
        }
    }

    #[cfg(feature = "multithreading")]
    fn build_pool(threads: usize) -> Option<rayon::ThreadPool> {
        if threads <= 1 {
            return None;
        }
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => Some(pool),
            Err(error) => {
                log::warn!(
                    "Failed to start {threads} worker threads, running sequentially: {error}"
                );
                None
            }
        }
    }

    /// The resolved number of threads.
    pub fn thread_count(&self) -> usize {
        self.threads
    }

    /// Runs `task` for every index in `0..count`.
    pub fn run<F>(&self, count: usize, task: F) -> bool
    where
        F: Fn(usize) -> bool + Send + Sync,
    {
        #[cfg(feature = "multithreading")]
        if let Some(pool) = &self.pool {
            use rayon::iter::{IntoParallelIterator, ParallelIterator};

            return pool.install(|| {
                (0..count)
                    .into_par_iter()
                    .map(&task)
                    .reduce(|| true, |a, b| a & b)
            });
        }
        (0..count).fold(true, |ok, index| task(index) & ok)
    }

    /// Runs `task` once for every item, passing its index.
    ///
    /// Each task gets exclusive access to its own item only.
    pub fn run_each<T, F>(&self, items: &mut [T], task: F) -> bool
    where
        T: Send,
        F: Fn(usize, &mut T) -> bool + Send + Sync,
    {
        #[cfg(feature = "multithreading")]
        if let Some(pool) = &self.pool {
            use rayon::iter::{
                IndexedParallelIterator, IntoParallelRefMutIterator, ParallelIterator,
            };

            return pool.install(|| {
                items
                    .par_iter_mut()
                    .enumerate()
                    .map(|(index, item)| task(index, item))
                    .reduce(|| true, |a, b| a & b)
            });
        }
        items
            .iter_mut()
            .enumerate()
            .fold(true, |ok, (index, item)| task(index, item) & ok)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn zero_threads_resolves_to_hardware() {
        assert!(Workload::new(0).thread_count() >= 1);
        assert_eq!(Workload::new(3).thread_count(), 3);
    }

    #[test]
    fn every_task_runs_despite_failures() {
        for threads in [1, 4] {
            let workload = Workload::new(threads);
            let ran = AtomicUsize::new(0);
            let ok = workload.run(100, |index| {
                ran.fetch_add(1, Ordering::Relaxed);
                index % 7 != 3
            });
            assert!(!ok);
            assert_eq!(ran.load(Ordering::Relaxed), 100);
        }
    }

    #[test]
    fn all_successes_yield_success() {
        assert!(Workload::new(2).run(10, |_| true));
        assert!(Workload::new(2).run(0, |_| false));
    }

    #[test]
    fn run_each_is_thread_count_independent() {
        let results: Vec<Vec<u64>> = [1, 2, 8]
            .into_iter()
            .map(|threads| {
                let mut items: Vec<u64> = (0..257).collect();
                assert!(Workload::new(threads).run_each(&mut items, |index, item| {
                    *item = *item * 31 + index as u64;
                    true
                }));
                items
            })
            .collect();
        assert_eq!(results[0], results[1]);
        assert_eq!(results[0], results[2]);
    }
}
