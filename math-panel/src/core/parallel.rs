//! Parallel stages over disjoint row blocks
//!
//! Every parallel stage of an analysis partitions its items (panels, nodes,
//! strips) into contiguous blocks and hands each block a disjoint slice of the
//! shared output:
//! - `parallel` feature: blocks run on the analysis' rayon pool
//! - otherwise: blocks run one after the other on the calling thread
//!
//! Workers poll a shared [`StageFlags`] so a cancellation request or an error
//! raised by one block stops the others early.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::core::parallel::*;
//!
//! let pool = WorkerPool::new(4)?;
//! pool.install(|| {
//!     parallel_row_blocks(matrix.view_mut(), 3, pool.threads(), |first, mut rows| {
//!         // fill rows of items first, first + 1, ...
//!         Ok(())
//!     })
//! })?;
//! ```

use ndarray::{ArrayViewMut2, Axis};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{PanelError, Result};

/// Check if parallel processing is available
#[inline]
pub fn is_parallel_available() -> bool {
    cfg!(feature = "parallel")
}

/// Shared cancellation request
///
/// Clones observe the same flag. An external thread may call
/// [`CancelToken::cancel`] at any time; running stages stop at their next poll.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// New token, not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Clear a previous request
    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    /// True once cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Cancellation and error flags of one parallel stage
#[derive(Debug, Clone)]
pub struct StageFlags {
    cancel: CancelToken,
    error: Arc<AtomicBool>,
}

impl StageFlags {
    /// Fresh error flag sharing the analysis cancellation token
    pub fn new(cancel: &CancelToken) -> Self {
        Self {
            cancel: cancel.clone(),
            error: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Poll between work items
    ///
    /// Returns `Err(Cancelled)` on cancellation and `Ok(true)` when another
    /// worker has raised the error flag, in which case the caller returns
    /// without doing more work.
    #[inline]
    pub fn poll(&self) -> Result<bool> {
        if self.cancel.is_cancelled() {
            return Err(PanelError::Cancelled);
        }
        Ok(self.error.load(Ordering::Relaxed))
    }

    /// Signal a stage-level failure to the other workers
    pub fn raise_error(&self) {
        self.error.store(true, Ordering::Relaxed);
    }

    /// True once a worker has raised the error flag
    pub fn has_error(&self) -> bool {
        self.error.load(Ordering::Relaxed)
    }
}

/// Thread pool owned by an analysis
///
/// Every parallel stage, including the LU elimination, runs inside
/// [`WorkerPool::install`] so the thread count follows the configuration.
pub struct WorkerPool {
    threads: usize,
    #[cfg(feature = "parallel")]
    pool: rayon::ThreadPool,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads)
            .finish()
    }
}

impl WorkerPool {
    /// Build a pool of `threads` workers (at least one)
    pub fn new(threads: usize) -> Result<Self> {
        let threads = threads.max(1);
        #[cfg(feature = "parallel")]
        {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|i| format!("panel-worker-{}", i))
                .build()
                .map_err(|e| PanelError::ThreadPool(e.to_string()))?;
            Ok(Self { threads, pool })
        }
        #[cfg(not(feature = "parallel"))]
        {
            Ok(Self { threads })
        }
    }

    /// Number of workers
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run `f` with this pool as the current rayon pool
    #[cfg(feature = "parallel")]
    pub fn install<R, F>(&self, f: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        self.pool.install(f)
    }

    /// Run `f` on the calling thread
    #[cfg(not(feature = "parallel"))]
    pub fn install<R, F>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        f()
    }
}

/// Items per block when `n_items` are split into `n_blocks`
#[inline]
pub fn block_size(n_items: usize, n_blocks: usize) -> usize {
    n_items / n_blocks.max(1) + 1
}

/// Run `f` over contiguous blocks of items owning disjoint rows
///
/// Item `i` owns rows `i * rows_per_item .. (i + 1) * rows_per_item` of
/// `rows`. `f` receives the index of the first item of its block and the rows
/// of that block. The first error returned by a block is returned.
#[cfg(feature = "parallel")]
pub fn parallel_row_blocks<T, F>(
    mut rows: ArrayViewMut2<'_, T>,
    rows_per_item: usize,
    n_blocks: usize,
    f: F,
) -> Result<()>
where
    T: Send,
    F: Fn(usize, ArrayViewMut2<'_, T>) -> Result<()> + Sync + Send,
{
    use rayon::prelude::*;

    let n_items = rows.nrows() / rows_per_item.max(1);
    if n_items == 0 {
        return Ok(());
    }
    let block = block_size(n_items, n_blocks);
    let chunks: Vec<_> = rows
        .axis_chunks_iter_mut(Axis(0), block * rows_per_item)
        .collect();
    chunks
        .into_par_iter()
        .enumerate()
        .try_for_each(|(b, chunk)| f(b * block, chunk))
}

#[cfg(not(feature = "parallel"))]
pub fn parallel_row_blocks<T, F>(
    mut rows: ArrayViewMut2<'_, T>,
    rows_per_item: usize,
    n_blocks: usize,
    f: F,
) -> Result<()>
where
    F: Fn(usize, ArrayViewMut2<'_, T>) -> Result<()>,
{
    let n_items = rows.nrows() / rows_per_item.max(1);
    if n_items == 0 {
        return Ok(());
    }
    let block = block_size(n_items, n_blocks);
    for (b, chunk) in rows
        .axis_chunks_iter_mut(Axis(0), block * rows_per_item)
        .enumerate()
    {
        f(b * block, chunk)?;
    }
    Ok(())
}

/// Parallel map over a range of indices
#[cfg(feature = "parallel")]
pub fn parallel_map_indexed<U, F>(count: usize, f: F) -> Vec<U>
where
    U: Send,
    F: Fn(usize) -> U + Sync + Send,
{
    use rayon::prelude::*;
    (0..count).into_par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
pub fn parallel_map_indexed<U, F>(count: usize, f: F) -> Vec<U>
where
    F: Fn(usize) -> U,
{
    (0..count).map(f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_block_size_covers_items() {
        assert_eq!(block_size(10, 4), 3);
        assert_eq!(block_size(3, 8), 1);
        assert_eq!(block_size(5, 0), 6);
    }

    #[test]
    fn test_row_blocks_write_disjoint_rows() {
        let mut data = Array2::<f64>::zeros((3 * 7, 2));
        parallel_row_blocks(data.view_mut(), 3, 3, |first, mut rows| {
            for (r, mut row) in rows.rows_mut().into_iter().enumerate() {
                let item = first + r / 3;
                row.fill(item as f64);
            }
            Ok(())
        })
        .unwrap();
        for i in 0..7 {
            for r in 0..3 {
                assert_eq!(data[[3 * i + r, 1]], i as f64);
            }
        }
    }

    #[test]
    fn test_row_blocks_propagate_error() {
        let mut data = Array2::<f32>::zeros((8, 1));
        let token = CancelToken::new();
        let flags = StageFlags::new(&token);
        let result = parallel_row_blocks(data.view_mut(), 1, 4, |first, _rows| {
            if flags.poll()? {
                return Ok(());
            }
            if first == 0 {
                flags.raise_error();
                return Err(PanelError::NumericalBlowUp {
                    target_panel: 0,
                    source_panel: 1,
                });
            }
            Ok(())
        });
        assert!(matches!(result, Err(PanelError::NumericalBlowUp { .. })));
        assert!(flags.has_error());
    }

    #[test]
    fn test_cancelled_stage() {
        let token = CancelToken::new();
        let flags = StageFlags::new(&token);
        assert!(!flags.poll().unwrap());
        token.clone().cancel();
        assert!(matches!(flags.poll(), Err(PanelError::Cancelled)));
        token.reset();
        assert!(flags.poll().is_ok());
    }

    #[test]
    fn test_pool_install() {
        let pool = WorkerPool::new(2).unwrap();
        assert_eq!(pool.threads(), 2);
        let values = pool.install(|| parallel_map_indexed(5, |i| i * i));
        assert_eq!(values, vec![0, 1, 4, 9, 16]);
    }
}
