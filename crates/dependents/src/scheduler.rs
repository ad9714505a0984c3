//! Work distribution for large builds.
//!
//! Small file sets are indexed on the calling thread. From the parallel
//! threshold up, the file list is cut into chunks and handed to a pool of
//! worker threads one chunk at a time:
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Coordinator (calling thread)  │  Worker threads (N)             │
//! │  ────────────────────────────  │  ──────────────────             │
//! │  WorkQueue::next_chunk() ──────┼→ recv WorkUnit                  │
//! │                                │  index chunk into own index     │
//! │  recv WorkerResponse ←─────────┼─ send partial index             │
//! │  merge into ReverseIndex       │                                 │
//! │  next chunk, or drop sender ───┼→ channel closed: worker exits   │
//! │  WorkQueue::finish(expected)   │                                 │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Workers never see the authoritative index; they build a private one per
//! chunk and hand it back. Every chunk a worker finishes earns it the next
//! unclaimed chunk, so fast workers take more of the load. The coordinator
//! keeps one chunk in flight per worker.
//!
//! Dispatch counters live in the per-build [`WorkQueue`], and a build only
//! succeeds if it dispatched exactly as many files as it was given.

use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::{debug, error, trace};

use crate::builder::{ChunkReport, IndexBuilder};
use crate::config::ModuleAliasConfig;
use crate::error::{Error, Result};
use crate::index::ReverseIndex;
use crate::types::{CanonicalPath, Strategy};

/// File count from which builds go parallel.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 500;

/// Chunks each worker is expected to request over a build.
pub const DEFAULT_CHUNKS_PER_WORKER: usize = 5;

/// Pick sequential or parallel indexing for `file_count` files.
///
/// An empty file set is always sequential.
#[must_use]
pub fn choose_strategy(file_count: usize, threshold: usize, workers: NonZeroUsize) -> Strategy {
    if file_count > 0 && file_count >= threshold {
        Strategy::Parallel {
            workers: workers.get(),
        }
    } else {
        Strategy::Sequential
    }
}

/// Files per chunk: `ceil(total / workers / chunks_per_worker)`, at least 1.
#[must_use]
pub fn chunk_size(total: usize, workers: usize, chunks_per_worker: usize) -> usize {
    let slots = workers.max(1) * chunks_per_worker.max(1);
    total.div_ceil(slots).max(1)
}

/// Number of workers to use when the caller does not say.
#[must_use]
pub fn default_workers() -> NonZeroUsize {
    thread::available_parallelism().unwrap_or(NonZeroUsize::MIN)
}

/// One chunk of work for a worker.
#[derive(Debug, Clone)]
pub struct WorkUnit {
    /// File whose dependents the build is for, if any
    pub target: Option<CanonicalPath>,
    /// Files to index
    pub files: Vec<PathBuf>,
    /// Alias config to resolve with
    pub alias_config: Option<Arc<ModuleAliasConfig>>,
}

/// What a worker sends back for one chunk.
#[derive(Debug, Default)]
pub struct WorkerReport {
    /// Edges discovered in the chunk
    pub index: ReverseIndex,
    /// Counts and per-file errors for the chunk
    pub summary: ChunkReport,
}

/// Response envelope carrying the worker's identity.
#[derive(Debug)]
struct WorkerResponse {
    worker: usize,
    outcome: std::result::Result<WorkerReport, String>,
}

/// Pending chunks plus dispatch counters for one build.
#[derive(Debug, Default)]
pub struct WorkQueue {
    chunks: VecDeque<Vec<PathBuf>>,
    chunks_dispatched: usize,
    files_dispatched: usize,
}

impl WorkQueue {
    /// Partition `files` into chunks of `chunk_size`, preserving order.
    #[must_use]
    pub fn new(files: Vec<PathBuf>, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        let mut chunks = VecDeque::with_capacity(files.len().div_ceil(chunk_size));
        let mut files = files.into_iter().peekable();
        while files.peek().is_some() {
            chunks.push_back(files.by_ref().take(chunk_size).collect());
        }
        Self::from_chunks(chunks)
    }

    /// Queue pre-partitioned chunks as they are.
    #[must_use]
    pub fn from_chunks(chunks: impl IntoIterator<Item = Vec<PathBuf>>) -> Self {
        Self {
            chunks: chunks.into_iter().collect(),
            chunks_dispatched: 0,
            files_dispatched: 0,
        }
    }

    /// Claim the next chunk, counting it as dispatched.
    pub fn next_chunk(&mut self) -> Option<Vec<PathBuf>> {
        let chunk = self.chunks.pop_front()?;
        self.chunks_dispatched += 1;
        self.files_dispatched += chunk.len();
        Some(chunk)
    }

    /// Chunks not yet claimed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.chunks.len()
    }

    /// Chunks claimed so far.
    #[must_use]
    pub fn chunks_dispatched(&self) -> usize {
        self.chunks_dispatched
    }

    /// Files in the chunks claimed so far.
    #[must_use]
    pub fn files_dispatched(&self) -> usize {
        self.files_dispatched
    }

    /// Check that every one of the `expected` files was dispatched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Accounting`] on any mismatch.
    pub fn finish(&self, expected: usize) -> Result<()> {
        if self.files_dispatched == expected && self.chunks.is_empty() {
            Ok(())
        } else {
            Err(Error::Accounting {
                dispatched: self.files_dispatched,
                expected,
            })
        }
    }
}

/// Result of a parallel build.
#[derive(Debug)]
pub struct ParallelBuild {
    /// Merged index from every worker
    pub index: ReverseIndex,
    /// Summed counts and errors from every chunk
    pub summary: ChunkReport,
    /// Workers spawned
    pub workers: usize,
    /// Chunks handed out
    pub chunks_dispatched: usize,
    /// Files handed out
    pub files_dispatched: usize,
}

/// Runs a pool of workers over a file list.
#[derive(Debug, Clone, Copy)]
pub struct Scheduler {
    workers: usize,
    chunks_per_worker: usize,
}

impl Scheduler {
    /// Create a scheduler with `workers` workers.
    #[must_use]
    pub fn new(workers: NonZeroUsize) -> Self {
        Self {
            workers: workers.get(),
            chunks_per_worker: DEFAULT_CHUNKS_PER_WORKER,
        }
    }

    /// Override the chunks-per-worker divisor used for chunk sizing.
    #[must_use]
    pub fn with_chunks_per_worker(mut self, chunks_per_worker: usize) -> Self {
        self.chunks_per_worker = chunks_per_worker.max(1);
        self
    }

    /// Chunk size this scheduler uses for `total` files.
    #[must_use]
    pub fn chunk_size(&self, total: usize) -> usize {
        chunk_size(total, self.workers, self.chunks_per_worker)
    }

    /// Index `files` with `builder` across the worker pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Worker`] if any worker fails and
    /// [`Error::Accounting`] if the dispatch count does not match.
    pub fn run(
        &self,
        builder: &IndexBuilder,
        target: Option<&CanonicalPath>,
        files: Vec<PathBuf>,
    ) -> Result<ParallelBuild> {
        let expected = files.len();
        let queue = WorkQueue::new(files, self.chunk_size(expected));
        self.run_queue(queue, expected, target, builder.alias_config().cloned(), |unit| {
            Ok(index_unit(builder, &unit))
        })
    }

    /// Drain `queue` through the worker pool using `work` for each chunk.
    ///
    /// `expected` is the candidate file count the dispatch total is checked
    /// against once every worker has finished.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Worker`] for the first failing chunk (panics
    /// included), [`Error::Accounting`] on a dispatch mismatch, and
    /// [`Error::Internal`] if a worker disappears without answering.
    pub fn run_queue<F>(
        &self,
        mut queue: WorkQueue,
        expected: usize,
        target: Option<&CanonicalPath>,
        alias_config: Option<Arc<ModuleAliasConfig>>,
        work: F,
    ) -> Result<ParallelBuild>
    where
        F: Fn(WorkUnit) -> std::result::Result<WorkerReport, String> + Sync,
    {
        debug!(
            workers = self.workers,
            chunks = queue.remaining(),
            files = expected,
            "Starting parallel build"
        );

        let work = &work;
        thread::scope(|scope| {
            let (response_tx, response_rx) = mpsc::channel::<WorkerResponse>();

            let mut requests: Vec<Option<Sender<WorkUnit>>> = Vec::with_capacity(self.workers);
            for worker in 0..self.workers {
                let (request_tx, request_rx) = mpsc::channel::<WorkUnit>();
                let response_tx = response_tx.clone();
                scope.spawn(move || worker_loop(worker, &request_rx, &response_tx, work));
                requests.push(Some(request_tx));
            }
            // Only workers hold response senders now
            drop(response_tx);

            let make_unit = |files: Vec<PathBuf>| WorkUnit {
                target: target.cloned(),
                files,
                alias_config: alias_config.clone(),
            };

            let mut in_flight = 0usize;
            for (worker, slot) in requests.iter_mut().enumerate() {
                match queue.next_chunk() {
                    Some(chunk) => {
                        dispatch(worker, slot, make_unit(chunk))?;
                        in_flight += 1;
                    }
                    None => {
                        trace!(worker, "No work for worker, tearing down");
                        *slot = None;
                    }
                }
            }

            let mut index = ReverseIndex::new();
            let mut summary = ChunkReport::default();

            while in_flight > 0 {
                let response = response_rx.recv().map_err(|_| {
                    Error::Internal("workers hung up with chunks still in flight".to_string())
                })?;
                in_flight -= 1;

                let report = match response.outcome {
                    Ok(report) => report,
                    Err(message) => {
                        error!(worker = response.worker, error = %message, "Worker failed");
                        // Returning drops every request sender, so idle workers exit
                        return Err(Error::Worker {
                            worker: response.worker,
                            message,
                        });
                    }
                };

                trace!(
                    worker = response.worker,
                    files = report.summary.files_processed,
                    keys = report.index.len(),
                    "Merging worker result"
                );
                index.merge(report.index);
                summary.absorb(report.summary);

                let slot = &mut requests[response.worker];
                if let Some(chunk) = queue.next_chunk() {
                    dispatch(response.worker, slot, make_unit(chunk))?;
                    in_flight += 1;
                } else {
                    trace!(worker = response.worker, "Queue drained, tearing down worker");
                    *slot = None;
                }
            }

            queue.finish(expected)?;

            debug!(
                chunks = queue.chunks_dispatched(),
                files = queue.files_dispatched(),
                keys = index.len(),
                "Parallel build complete"
            );

            Ok(ParallelBuild {
                index,
                summary,
                workers: self.workers,
                chunks_dispatched: queue.chunks_dispatched(),
                files_dispatched: queue.files_dispatched(),
            })
        })
    }
}

/// Run the index builder over one unit, producing the worker's report.
fn index_unit(builder: &IndexBuilder, unit: &WorkUnit) -> WorkerReport {
    let mut index = ReverseIndex::new();
    let summary = builder.process_files(&mut index, &unit.files);
    WorkerReport { index, summary }
}

fn dispatch(worker: usize, slot: &mut Option<Sender<WorkUnit>>, unit: WorkUnit) -> Result<()> {
    let sender = slot
        .as_ref()
        .ok_or_else(|| Error::Internal(format!("worker {worker} was already torn down")))?;
    trace!(worker, files = unit.files.len(), "Dispatching chunk");
    sender
        .send(unit)
        .map_err(|_| Error::Internal(format!("worker {worker} stopped accepting work")))
}

/// Worker body: index chunks until the coordinator closes the request channel.
fn worker_loop<F>(
    worker: usize,
    requests: &Receiver<WorkUnit>,
    responses: &Sender<WorkerResponse>,
    work: &F,
) where
    F: Fn(WorkUnit) -> std::result::Result<WorkerReport, String> + Sync,
{
    while let Ok(unit) = requests.recv() {
        if let Some(target) = &unit.target {
            trace!(worker, files = unit.files.len(), %target, "Worker received chunk");
        }
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(unit)))
            .unwrap_or_else(|payload| Err(panic_message(payload.as_ref())));
        if responses.send(WorkerResponse { worker, outcome }).is_err() {
            break;
        }
    }
    trace!(worker, "Worker exiting");
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("worker panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("worker panicked: {s}")
    } else {
        "worker panicked with unknown payload".to_string()
    }
}
