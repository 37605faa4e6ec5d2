use std::any::Any;
use std::fmt;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use super::collective::{Communicator, ThreadGroup};
use super::gather::gather_chunks;
use super::neighbors::{COORDINATOR, broadcast_grid, check_group, chunk_len, chunk_rows, reduce_counts};
use super::offsets::{OffsetTable, WORKER_COUNT};
use super::rules::apply_rule;
use crate::error::{LifeError, LifeResult};
use crate::grid::{PaddedGrid, buffer_len};
use crate::snapshot::SnapshotSink;

pub const DEFAULT_WIDTH: usize = 1 << 10;
pub const DEFAULT_HEIGHT: usize = 1 << 10;
pub const DEFAULT_GENERATIONS: u64 = 100;
pub const DEFAULT_SEED: u64 = 1_646_868;

/// Where the coordinator is within a generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    AwaitBroadcastReady,
    Broadcasting,
    AwaitReduction,
    ReductionComplete,
    AwaitGather,
    GatherComplete,
    Persist,
    Terminal,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::AwaitBroadcastReady => "awaiting broadcast",
            Phase::Broadcasting => "broadcasting",
            Phase::AwaitReduction => "reducing neighbor counts",
            Phase::ReductionComplete => "applying rule",
            Phase::AwaitGather => "gathering chunks",
            Phase::GatherComplete => "gather complete",
            Phase::Persist => "persisting snapshot",
            Phase::Terminal => "terminal",
        };
        f.write_str(name)
    }
}

/// Check a grid shape against the row partitioning.
pub fn validate_dimensions(width: usize, height: usize) -> LifeResult<()> {
    let reason = if width == 0 || height == 0 {
        Some("interior must be non-empty")
    } else if height % WORKER_COUNT != 0 {
        Some("height must be divisible by the worker count")
    } else if width % WORKER_COUNT != 0 {
        Some("width must be divisible by the worker count")
    } else if buffer_len(width, height).is_none() {
        Some("padded buffer size overflows usize")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(LifeError::Dimensions {
            width,
            height,
            reason,
        }),
        None => Ok(()),
    }
}

/// Configuration for a ScatterLife run.
///
/// Defaults reproduce the reference setup: a 1024x1024 interior seeded with
/// `DEFAULT_SEED` and a group of `WORKER_COUNT` workers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScatterLifeConfig {
    pub width: usize,
    pub height: usize,
    /// Seed for the initial Bernoulli(0.5) fill.
    pub seed: u64,
    /// Size of the worker group. Anything other than `WORKER_COUNT` is
    /// rejected by `validate`; the field exists so the mismatch is reported
    /// instead of silently corrected.
    pub worker_count: usize,
}

impl Default for ScatterLifeConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            seed: DEFAULT_SEED,
            worker_count: WORKER_COUNT,
        }
    }
}

impl ScatterLifeConfig {
    pub fn dimensions(mut self, width: usize, height: usize) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn worker_count(mut self, n: usize) -> Self {
        self.worker_count = n;
        self
    }

    pub fn validate(&self) -> LifeResult<()> {
        if self.worker_count != WORKER_COUNT {
            return Err(LifeError::WorkerCount {
                expected: WORKER_COUNT,
                actual: self.worker_count,
            });
        }
        validate_dimensions(self.width, self.height)
    }
}

/// Summary of a completed `run`.
#[derive(Clone, Copy, Debug)]
pub struct RunReport {
    pub generations: u64,
    pub elapsed: Duration,
    pub population: u64,
}

/// Per-worker buffers, reused across generations.
#[derive(Debug)]
struct WorkerState {
    replica: PaddedGrid,
    counts: Vec<u8>,
}

pub(super) type SharedSink<'a> = Mutex<Option<&'a mut (dyn SnapshotSink + Send)>>;

pub struct ScatterLife {
    config: ScatterLifeConfig,
    grid: PaddedGrid,
    offsets: OffsetTable,
    pool: rayon::ThreadPool,
    /// Indexed by rank. Rank 0's replica is swapped with `grid` for the
    /// duration of a run, so the coordinator works on the real grid.
    workers: Vec<Mutex<WorkerState>>,
    generation: u64,
}

impl ScatterLife {
    /// Validate `config`, spin up the worker pool and seed the grid.
    pub fn with_config(config: ScatterLifeConfig) -> LifeResult<Self> {
        config.validate()?;
        let grid = PaddedGrid::initialize(config.width, config.height, config.seed);
        Self::build(config, grid)
    }

    /// Run the engine on a caller-supplied grid.
    pub fn from_grid(grid: PaddedGrid) -> LifeResult<Self> {
        let config = ScatterLifeConfig::default().dimensions(grid.width(), grid.height());
        config.validate()?;
        Self::build(config, grid)
    }

    fn build(config: ScatterLifeConfig, grid: PaddedGrid) -> LifeResult<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_count)
            .thread_name(|i| format!("scatterlife-worker-{i}"))
            .build()?;
        if pool.current_num_threads() != WORKER_COUNT {
            return Err(LifeError::WorkerCount {
                expected: WORKER_COUNT,
                actual: pool.current_num_threads(),
            });
        }
        let workers = (0..WORKER_COUNT)
            .map(|_| {
                Mutex::new(WorkerState {
                    replica: PaddedGrid::new(grid.width(), grid.height()),
                    counts: Vec::with_capacity(chunk_len(&grid)),
                })
            })
            .collect();
        tracing::debug!(
            width = grid.width(),
            height = grid.height(),
            workers = WORKER_COUNT,
            "scatterlife engine ready"
        );

        Ok(Self {
            offsets: OffsetTable::build(grid.width()),
            config,
            grid,
            pool,
            workers,
            generation: 0,
        })
    }

    pub fn step(&mut self) -> LifeResult<()> {
        self.advance(1, None)
    }

    pub fn step_n(&mut self, n: u64) -> LifeResult<()> {
        self.advance(n, None)
    }

    /// Advance `n` generations, handing the grid to `sink` after each one.
    ///
    /// On failure the grid and `generation()` both reflect the last
    /// generation the coordinator gathered, so a later run continues the
    /// numbering from there.
    pub fn run<S>(&mut self, n: u64, sink: &mut S) -> LifeResult<RunReport>
    where
        S: SnapshotSink + Send,
    {
        let start = Instant::now();
        self.advance(n, Some(sink))?;
        Ok(RunReport {
            generations: n,
            elapsed: start.elapsed(),
            population: self.population(),
        })
    }

    fn advance(&mut self, n: u64, sink: Option<&mut (dyn SnapshotSink + Send)>) -> LifeResult<()> {
        if n == 0 {
            return Ok(());
        }
        let first = self.generation;
        let sink: SharedSink<'_> = Mutex::new(sink);
        let completed = AtomicU64::new(0);
        let group = ThreadGroup::new(WORKER_COUNT);

        let coordinator = self.workers[COORDINATOR]
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::swap(&mut self.grid, &mut coordinator.replica);

        let workers = &self.workers;
        let offsets = &self.offsets;
        let outcomes = self.pool.broadcast(|ctx| {
            let comm = group.communicator(ctx.index());
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                let mut state = workers[comm.rank()]
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                let WorkerState { replica, counts } = &mut *state;
                run_worker(&comm, offsets, replica, counts, first..first + n, &sink, &completed)
            }))
            .unwrap_or_else(|payload| {
                Err(LifeError::WorkerPanicked {
                    rank: comm.rank(),
                    message: panic_message(payload.as_ref()),
                })
            });
            if outcome.is_err() {
                comm.abort();
            }
            outcome
        });

        let coordinator = self.workers[COORDINATOR]
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::swap(&mut self.grid, &mut coordinator.replica);

        self.generation += completed.into_inner();
        root_cause(outcomes)?;
        tracing::debug!(generation = self.generation, phase = %Phase::Terminal, "run complete");
        Ok(())
    }

    pub fn grid(&self) -> &PaddedGrid {
        &self.grid
    }

    pub fn into_grid(self) -> PaddedGrid {
        self.grid
    }

    pub fn get_cell(&self, x: usize, y: usize) -> bool {
        self.grid.get(x, y)
    }

    pub fn population(&self) -> u64 {
        self.grid.population()
    }

    /// Number of generations advanced so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &ScatterLifeConfig {
        &self.config
    }

    pub fn offsets(&self) -> &OffsetTable {
        &self.offsets
    }
}

/// The generation loop for one member of the group.
///
/// The coordinator bumps `completed` once per gathered generation, before
/// persisting it.
pub(super) fn run_worker<C: Communicator>(
    comm: &C,
    offsets: &OffsetTable,
    replica: &mut PaddedGrid,
    counts: &mut Vec<u8>,
    generations: Range<u64>,
    sink: &SharedSink<'_>,
    completed: &AtomicU64,
) -> LifeResult<()> {
    check_group(comm, offsets)?;
    for generation in generations {
        generation_step(comm, offsets, replica, counts, generation)?;
        if comm.rank() != COORDINATOR {
            continue;
        }
        completed.fetch_add(1, Ordering::Relaxed);
        let mut sink = sink.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(sink) = sink.as_deref_mut() {
            tracing::debug!(generation, phase = %Phase::Persist);
            sink.persist(generation, replica)
                .map_err(|source| LifeError::Snapshot { generation, source })?;
        }
    }
    Ok(())
}

/// One generation for one worker: broadcast, reduce-scatter, rule, gather.
///
/// Every worker runs this with its own `comm`; on the coordinator `replica`
/// is the authoritative grid and receives the next generation.
pub fn generation_step<C: Communicator>(
    comm: &C,
    offsets: &OffsetTable,
    replica: &mut PaddedGrid,
    counts: &mut Vec<u8>,
    generation: u64,
) -> LifeResult<()> {
    let enter = |phase: Phase| {
        if comm.rank() == COORDINATOR {
            tracing::trace!(generation, %phase);
        }
    };

    enter(Phase::AwaitBroadcastReady);
    enter(Phase::Broadcasting);
    broadcast_grid(comm, replica).map_err(|e| e.during(generation, Phase::Broadcasting))?;

    enter(Phase::AwaitReduction);
    counts.clear();
    counts.resize(chunk_len(replica), 0);
    reduce_counts(comm, replica, offsets, counts)
        .map_err(|e| e.during(generation, Phase::AwaitReduction))?;

    enter(Phase::ReductionComplete);
    apply_rule(counts, replica.rows(chunk_rows(replica, comm.rank())));

    enter(Phase::AwaitGather);
    gather_chunks(comm, counts, replica).map_err(|e| e.during(generation, Phase::AwaitGather))?;

    enter(Phase::GatherComplete);
    Ok(())
}

/// Prefer the failure that started an abort over the `Aborted` it caused.
fn root_cause(outcomes: Vec<LifeResult<()>>) -> LifeResult<()> {
    let mut secondary = None;
    for outcome in outcomes {
        match outcome {
            Ok(()) => {}
            Err(err) if err.is_secondary() => {
                secondary.get_or_insert(err);
            }
            Err(err) => return Err(err),
        }
    }
    secondary.map_or(Ok(()), Err)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
