// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The row scheduler.  Rows near the boundary of the Mandelbrot set can
//! cost thousands of times more than rows far outside it, so handing
//! each worker an equal slab of rows up front leaves most of them idle
//! while one grinds through the hard part.  Instead every worker pulls
//! the next unclaimed row off a shared cursor until there are none left.
//! One atomic add per row is the only synchronization; the pixels of a
//! row belong to whoever claimed it.

extern crate crossbeam;

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use errors::RenderError;

/// A shared cursor over the rows of an image.  Each row index is handed
/// out at most once, in increasing order.
#[derive(Debug)]
pub struct RowCursor {
    next: AtomicUsize,
    rows: usize,
}

impl RowCursor {
    /// A cursor positioned at row 0 of an image `rows` high.
    pub fn new(rows: usize) -> Self {
        RowCursor {
            next: AtomicUsize::new(0),
            rows,
        }
    }

    /// Claim the next row, or `None` if every row has been claimed.
    /// The read and the advance are one atomic operation, so no two
    /// claims ever see the same row.
    #[inline]
    pub fn claim(&self) -> Option<usize> {
        let row = self.next.fetch_add(1, Ordering::Relaxed);
        if row < self.rows {
            Some(row)
        } else {
            None
        }
    }

    /// How far the cursor has advanced.  Once drained this is at least
    /// `rows()`; every worker's final, failed claim also bumps it.
    pub fn position(&self) -> usize {
        self.next.load(Ordering::Relaxed)
    }

    /// The number of rows this cursor covers.
    pub fn rows(&self) -> usize {
        self.rows
    }
}

/// A flag asking the workers of a render to stop.  Workers look at it
/// before every claim, so a row already claimed is always finished.
#[derive(Clone, Debug, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    /// A flag that has not been raised.
    pub fn new() -> Self {
        Cancellation(Arc::new(AtomicBool::new(false)))
    }

    /// Ask every worker watching this flag to stop at its next claim.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Has `cancel` been called?
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What happened during a call to `drain_rows`.
#[derive(Clone, Debug, PartialEq)]
pub struct Schedule {
    /// How many rows each worker completed, indexed by worker.  Its
    /// length is the number of workers that actually ran.
    pub rows_per_worker: Vec<usize>,
    /// Where the cursor ended up.
    pub cursor: usize,
    /// Whether the run stopped because it was cancelled.
    pub cancelled: bool,
}

impl Schedule {
    /// The number of workers that ran.
    pub fn workers(&self) -> usize {
        self.rows_per_worker.len()
    }

    /// Total rows completed across every worker.
    pub fn rows(&self) -> usize {
        self.rows_per_worker.iter().sum()
    }
}

/// Resolve a requested worker count.  `None` means one worker per
/// logical CPU.  The result is never zero.
pub fn worker_count(requested: Option<usize>) -> usize {
    requested.unwrap_or_else(num_cpus::get).max(1)
}

/// Claim rows until the cursor runs dry or the render is cancelled.
/// Returns the number of rows this worker completed.
fn claim_rows<F>(worker: usize, cursor: &RowCursor, cancel: Option<&Cancellation>, job: &F) -> usize
where
    F: Fn(usize),
{
    let mut completed = 0;
    loop {
        if cancel.map_or(false, |c| c.is_cancelled()) {
            break;
        }
        match cursor.claim() {
            Some(row) => {
                job(row);
                completed += 1;
            }
            None => break,
        }
    }
    trace!("row worker {} done after {} rows", worker, completed);
    completed
}

/// Run `job` once for every row `cursor` hands out, spread over
/// `workers` scoped threads, and block until all of them have finished.
///
/// If the operating system refuses to start a thread we carry on with
/// the ones that did start; if none started, the calling thread drains
/// the cursor itself.
pub fn drain_rows<F>(
    cursor: &RowCursor,
    workers: usize,
    cancel: Option<&Cancellation>,
    job: F,
) -> Result<Schedule, RenderError>
where
    F: Fn(usize) + Sync,
{
    drain_rows_with(cursor, workers, cancel, job, ::std::usize::MAX)
}

/// `drain_rows`, but refusing to start more than `spawn_limit` threads,
/// exactly as if the operating system had run out of them.
fn drain_rows_with<F>(
    cursor: &RowCursor,
    workers: usize,
    cancel: Option<&Cancellation>,
    job: F,
    spawn_limit: usize,
) -> Result<Schedule, RenderError>
where
    F: Fn(usize) + Sync,
{
    let workers = workers.max(1);
    let job = &job;
    debug!("draining {} rows with {} workers", cursor.rows(), workers);

    let rows_per_worker = crossbeam::scope(|spawner| {
        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let spawned = if worker < spawn_limit {
                spawner
                    .builder()
                    .name(format!("row-worker-{}", worker))
                    .spawn(move |_| claim_rows(worker, cursor, cancel, job))
            } else {
                Err(io::Error::new(io::ErrorKind::Other, "thread limit reached"))
            };
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    warn!("could only start {} of {} row workers: {}", worker, workers, e);
                    break;
                }
            }
        }

        if handles.is_empty() {
            return Ok(vec![claim_rows(0, cursor, cancel, job)]);
        }

        handles
            .into_iter()
            .map(|handle| handle.join().map_err(|_| RenderError::WorkerPanicked))
            .collect::<Result<Vec<usize>, RenderError>>()
    })
    .map_err(|_| RenderError::WorkerPanicked)??;

    let cancelled = cancel.map_or(false, |c| c.is_cancelled());
    if cancelled {
        info!("render cancelled with the cursor at {} of {}", cursor.position(), cursor.rows());
    }

    Ok(Schedule {
        rows_per_worker,
        cursor: cursor.position(),
        cancelled,
    })
}
