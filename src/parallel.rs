//! Runs per-element loop bodies either on the calling thread or across a rayon
//! worker pool, behind one interface.
//!
//! Every call blocks until all of its work has finished. Nothing is cancelled
//! and nothing outlives the call, so a pass built on these primitives is fully
//! joined when it returns.

use std::sync::Mutex;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutionStrategy {
    Sequential,
    /// `threads == 0` uses one worker per available core.
    ThreadPool { threads: usize },
}

impl Default for ExecutionStrategy {
    fn default() -> Self {
        Self::ThreadPool { threads: 0 }
    }
}

pub struct Executor {
    pool: Option<rayon::ThreadPool>,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("workers", &self.num_workers())
            .finish()
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::new(ExecutionStrategy::default())
    }
}

impl Executor {
    pub fn new(strategy: ExecutionStrategy) -> Self {
        match strategy {
            ExecutionStrategy::Sequential => Self::sequential(),
            ExecutionStrategy::ThreadPool { threads } => {
                match rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("vortonsim-worker-{}", i))
                    .build()
                {
                    Ok(pool) => {
                        log::debug!("Built worker pool with {} threads", pool.current_num_threads());
                        Self { pool: Some(pool) }
                    }
                    Err(e) => {
                        log::warn!("Worker pool unavailable ({}), running sequentially", e);
                        Self::sequential()
                    }
                }
            }
        }
    }

    pub fn sequential() -> Self {
        Self { pool: None }
    }

    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    pub fn num_workers(&self) -> usize {
        self.pool
            .as_ref()
            .map(|pool| pool.current_num_threads())
            .unwrap_or(1)
    }

    /// Visits every index in `[0, n)` exactly once. Ascending order when
    /// sequential, unspecified order when parallel.
    pub fn for_each_index<F>(&self, n: usize, body: F)
    where
        F: Fn(usize) + Sync + Send,
    {
        match &self.pool {
            None => (0..n).for_each(body),
            Some(pool) => pool.install(|| (0..n).into_par_iter().for_each(body)),
        }
    }

    pub fn for_each_mut<T, F>(&self, items: &mut [T], body: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Sync + Send,
    {
        match &self.pool {
            None => items
                .iter_mut()
                .enumerate()
                .for_each(|(i, item)| body(i, item)),
            Some(pool) => pool.install(|| {
                items
                    .par_iter_mut()
                    .enumerate()
                    .for_each(|(i, item)| body(i, item))
            }),
        }
    }

    /// Splits `items` into contiguous, disjoint chunks and hands each one to
    /// `body` along with the index of its first element. Sequential execution
    /// uses a single chunk.
    pub fn for_each_chunk_mut<T, F>(&self, items: &mut [T], body: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Sync + Send,
    {
        if items.is_empty() {
            return;
        }
        match &self.pool {
            None => body(0, items),
            Some(pool) => {
                let chunk_len = self.chunk_len(items.len());
                pool.install(|| {
                    items
                        .par_chunks_mut(chunk_len)
                        .enumerate()
                        .for_each(|(c, chunk)| body(c * chunk_len, chunk))
                })
            }
        }
    }

    /// Evaluates `f` at every index and returns the results in index order.
    pub fn map_collect<R, F>(&self, n: usize, f: F) -> Vec<R>
    where
        R: Send,
        F: Fn(usize) -> R + Sync + Send,
    {
        match &self.pool {
            None => (0..n).map(f).collect(),
            Some(pool) => pool.install(|| (0..n).into_par_iter().map(f).collect()),
        }
    }

    /// Folds `map(i)` for every `i` in `[0, n)` with `combine`.
    ///
    /// `combine` must be associative and commutative with `identity` as its
    /// identity element: partitioning depends on the worker count, and the
    /// result is only independent of it under those laws.
    pub fn reduce<R, M, C>(&self, n: usize, identity: R, map: M, combine: C) -> R
    where
        R: Clone + Send + Sync,
        M: Fn(usize) -> R + Sync + Send,
        C: Fn(R, R) -> R + Sync + Send,
    {
        // Rayon seeds each split with the identity; an empty range must not
        // combine it with itself.
        if n == 0 {
            return identity;
        }
        match &self.pool {
            None => (0..n).fold(identity, |acc, i| combine(acc, map(i))),
            Some(pool) => pool.install(|| {
                (0..n)
                    .into_par_iter()
                    .fold(|| identity.clone(), |acc, i| combine(acc, map(i)))
                    .reduce(|| identity.clone(), &combine)
            }),
        }
    }

    /// Like [`Executor::reduce`] but with an explicit partition of `[0, n)`
    /// into contiguous chunks of `chunk_len` (the last may be shorter). Each
    /// chunk is folded left to right, then the chunk results are combined.
    pub fn reduce_chunks<R, M, C>(
        &self,
        n: usize,
        chunk_len: usize,
        identity: R,
        map: M,
        combine: C,
    ) -> R
    where
        R: Clone + Send + Sync,
        M: Fn(usize) -> R + Sync + Send,
        C: Fn(R, R) -> R + Sync + Send,
    {
        if n == 0 {
            return identity;
        }
        let chunk_len = chunk_len.max(1);
        let num_chunks = n.div_ceil(chunk_len);
        let fold_chunk = |c: usize| {
            let start = c * chunk_len;
            let end = (start + chunk_len).min(n);
            (start..end).fold(identity.clone(), |acc, i| combine(acc, map(i)))
        };
        match &self.pool {
            None => (0..num_chunks).fold(identity.clone(), |acc, c| combine(acc, fold_chunk(c))),
            Some(pool) => pool.install(|| {
                (0..num_chunks)
                    .into_par_iter()
                    .map(fold_chunk)
                    .reduce(|| identity.clone(), &combine)
            }),
        }
    }

    fn chunk_len(&self, len: usize) -> usize {
        // Four chunks per worker.
        let target_chunks = self.num_workers() * 4;
        len.div_ceil(target_chunks).max(1)
    }
}

/// Shared value that workers merge their partial results into.
///
/// The lock is held only while `combine` runs, so `combine` must stay short
/// and never block.
#[derive(Debug, Default)]
pub struct SharedAccumulator<T> {
    inner: Mutex<T>,
}

impl<T> SharedAccumulator<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    pub fn merge<P>(&self, partial: P, combine: impl FnOnce(&mut T, P)) {
        let mut guard = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        combine(&mut *guard, partial);
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}
