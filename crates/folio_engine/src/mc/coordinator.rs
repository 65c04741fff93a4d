//! Parallel simulation coordinator.
//!
//! Splits the path count into `⌈n_paths / workers⌉`-sized chunks. Each
//! chunk runs its own [`ScenarioGenerator`] on a run-scoped rayon pool;
//! the outputs are concatenated in chunk order. Workers share only the
//! read-only [`ScenarioModel`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, warn};

use super::config::SimulationConfig;
use super::error::SimulationError;
use super::generator::{ScenarioGenerator, ScenarioModel};
use super::scenario::ScenarioSet;
use crate::rng::{worker_seed, DigitScramble, SamplingMethod, SamplingSource};

/// Paths between two polls of the cancellation flag.
pub const CANCELLATION_POLL_INTERVAL: usize = 1024;

/// Anomaly rate above which a run logs a warning.
pub const ANOMALY_WARN_RATE: f64 = 0.001;

/// Shared flag that stops a run in progress.
///
/// Cloning shares the underlying flag.
///
/// ```rust
/// use folio_engine::mc::CancellationFlag;
///
/// let flag = CancellationFlag::new();
/// let handle = flag.clone();
/// handle.cancel();
/// assert!(flag.is_cancelled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    /// Creates a flag in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// One worker's share of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkPlan {
    /// Worker index.
    pub index: usize,
    /// Global index of the first path.
    pub start: usize,
    /// Number of paths.
    pub len: usize,
}

/// Partitions `n_paths` into at most `workers` contiguous chunks of
/// `⌈n_paths / workers⌉` paths; the last chunk may be shorter.
///
/// ```rust
/// use folio_engine::mc::plan_chunks;
///
/// let plan = plan_chunks(10, 4);
/// let lens: Vec<usize> = plan.iter().map(|c| c.len).collect();
/// assert_eq!(lens, vec![3, 3, 3, 1]);
/// ```
pub fn plan_chunks(n_paths: usize, workers: usize) -> Vec<ChunkPlan> {
    if n_paths == 0 {
        return Vec::new();
    }
    let chunk_size = n_paths.div_ceil(workers.max(1));
    (0..n_paths)
        .step_by(chunk_size)
        .enumerate()
        .map(|(index, start)| ChunkPlan {
            index,
            start,
            len: chunk_size.min(n_paths - start),
        })
        .collect()
}

/// Runs a simulation across a worker pool.
pub struct SimulationCoordinator<'a> {
    model: &'a ScenarioModel,
    config: &'a SimulationConfig,
    cancel: Option<CancellationFlag>,
}

impl<'a> SimulationCoordinator<'a> {
    /// Creates a coordinator for one run.
    pub fn new(model: &'a ScenarioModel, config: &'a SimulationConfig) -> Self {
        Self {
            model,
            config,
            cancel: None,
        }
    }

    /// Attaches a cancellation flag.
    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Runs every chunk and concatenates the results in order.
    ///
    /// In quasi-random mode every chunk shares one [`DigitScramble`] and
    /// chunk `k` starts at Halton index `qmc_offset + start_k + 1`, so the
    /// run consumes exactly the indices `qmc_offset + 1 ..= qmc_offset +
    /// n_paths` whatever the worker count.
    /// In pseudo-random mode each worker seeds from the run seed and its
    /// index; with no seed configured a random run seed is drawn.
    ///
    /// # Errors
    ///
    /// - [`SimulationError::Cancelled`] if the flag is raised mid-run
    /// - [`SimulationError::WorkerPool`] if the thread pool cannot start
    pub fn run(&self) -> Result<ScenarioSet, SimulationError> {
        let workers = self.config.resolved_workers();
        let chunks = plan_chunks(self.config.n_paths(), workers);
        let method = self.config.sampling();
        let offset = self.config.qmc_offset();
        let run_seed = self.config.seed().unwrap_or_else(rand::random);
        let dimension = self.model.draw_dimension();

        debug!(
            n_paths = self.config.n_paths(),
            workers,
            chunks = chunks.len(),
            sampling = %method,
            qmc_offset = offset,
            "partitioned simulation run"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| SimulationError::WorkerPool(e.to_string()))?;

        let scramble = match method {
            SamplingMethod::Quasi => Some(Arc::new(DigitScramble::new(dimension))),
            SamplingMethod::Pseudo => None,
        };

        let model = self.model;
        let cancel = self.cancel.as_ref();
        let results: Result<Vec<ScenarioSet>, SimulationError> = pool.install(|| {
            chunks
                .into_par_iter()
                .map(|chunk| {
                    let source = match &scramble {
                        Some(scramble) => SamplingSource::quasi(
                            Arc::clone(scramble),
                            offset + chunk.start as u64,
                        ),
                        None => SamplingSource::pseudo(worker_seed(run_seed, chunk.index)),
                    };
                    ScenarioGenerator::new(model, source).simulate(chunk.len, cancel)
                })
                .collect()
        });

        let set = ScenarioSet::merge(results?);
        if set.anomaly_rate() > ANOMALY_WARN_RATE {
            warn!(
                anomalies = set.anomalies(),
                rate = set.anomaly_rate(),
                "non-finite paths exceeded warning rate"
            );
        }
        Ok(set)
    }
}
