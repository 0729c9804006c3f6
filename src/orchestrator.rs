//! Harness driving one interactive board plus batch and comparison runs.
//!
//! The orchestrator owns the engine factory, the active [`BoardHandle`] and a
//! bounded status log. Batches never touch the active board: each game gets
//! its own handle and its own seed.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::{BenchmarkPlan, BoardConfig, HarnessConfig};
use crate::engine::Engine;
use crate::error::SimError;
use crate::projection::{BoardView, ViewState};
use crate::rng::SeedSource;
use crate::session::BoardHandle;
use crate::stats::{summarize_by_algorithm, GameStats};
use crate::topology::ClassifiedBoard;
use crate::types::{AlgorithmId, GameRecord};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    BoardReady,
    Running,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusEntry {
    pub level: StatusLevel,
    pub message: String,
}

/// Most recent status lines, oldest dropped first.
#[derive(Clone, Debug)]
pub struct StatusLog {
    entries: VecDeque<StatusEntry>,
    capacity: usize,
}

impl StatusLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(256)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, level: StatusLevel, message: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(StatusEntry {
            level,
            message: message.into(),
        });
    }

    pub fn latest(&self) -> Option<&StatusEntry> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Shared stop flag, checked between games.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub records: Vec<GameRecord>,
    /// One message per game that ended in an engine fault.
    pub faults: Vec<String>,
    pub cancelled: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ComparisonOutcome {
    pub records: Vec<GameRecord>,
    /// One entry per requested algorithm that played at least one game.
    pub stats: Vec<GameStats>,
    pub cancelled: bool,
}

impl From<BatchOutcome> for ComparisonOutcome {
    fn from(batch: BatchOutcome) -> Self {
        Self {
            stats: summarize_by_algorithm(&batch.records),
            records: batch.records,
            cancelled: batch.cancelled,
        }
    }
}

/// Play one complete game on a fresh handle. The record carries `seed`.
pub fn play_game<E: Engine>(
    engine: &E,
    config: &BoardConfig,
    seed: u64,
    max_steps: Option<usize>,
) -> Result<GameRecord, SimError> {
    let mut handle = BoardHandle::open(engine, config, Some(seed))?;
    handle.run_to_completion(max_steps)?;
    handle
        .record()
        .map(|record| record.with_seed(seed))
        .ok_or_else(|| SimError::MalformedState("game ended without a board".into()))
}

/// Play one game, turning a fault into a zeroed loss.
fn play_or_fault<E: Engine>(
    engine: &E,
    config: &BoardConfig,
    seed: u64,
    max_steps: Option<usize>,
) -> Result<GameRecord, (GameRecord, SimError)> {
    play_game(engine, config, seed, max_steps).map_err(|e| {
        warn!(algorithm = %config.algorithm, seed, error = %e, "game faulted, recorded as a loss");
        let record = GameRecord::fault(config.algorithm, config.objective, &config.dimensions).with_seed(seed);
        (record, e)
    })
}

/// One configuration and the seeds still to play on it.
#[derive(Clone, Debug)]
struct Leg {
    config: BoardConfig,
    seeds: std::vec::IntoIter<u64>,
}

/// Pull iterator over the games of a batch, comparison or benchmark.
///
/// Legs are played in order. Yields one record per game; faulted games come
/// back as losses. Stops early once the cancel token fires. `E` is either a
/// borrowed engine or, after [`BatchRun::detach`], an owned one.
pub struct BatchRun<E> {
    engine: E,
    legs: VecDeque<Leg>,
    max_steps: Option<usize>,
    cancel: CancelToken,
    faults: Vec<String>,
    cancelled: bool,
}

impl<E: Engine> BatchRun<E> {
    fn new(engine: E, legs: Vec<Leg>, max_steps: Option<usize>, cancel: CancelToken) -> Self {
        Self {
            engine,
            legs: legs.into(),
            max_steps,
            cancel,
            faults: Vec::new(),
            cancelled: false,
        }
    }

    pub fn remaining(&self) -> usize {
        self.legs.iter().map(|leg| leg.seeds.len()).sum()
    }

    pub fn faults(&self) -> &[String] {
        &self.faults
    }

    pub fn was_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Token that stops this run; cancelling it stops the next pull.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Up to `k` more games.
    pub fn next_chunk(&mut self, k: usize) -> Vec<GameRecord> {
        self.by_ref().take(k).collect()
    }

    /// Drain the rest of the run.
    pub fn finish(mut self) -> BatchOutcome {
        let records: Vec<GameRecord> = self.by_ref().collect();
        BatchOutcome {
            records,
            faults: self.faults,
            cancelled: self.cancelled,
        }
    }
}

impl<E: Engine + Clone> BatchRun<&E> {
    /// Same run over its own copy of the engine, free of the orchestrator
    /// borrow.
    pub fn detach(self) -> BatchRun<E> {
        BatchRun {
            engine: self.engine.clone(),
            legs: self.legs,
            max_steps: self.max_steps,
            cancel: self.cancel,
            faults: self.faults,
            cancelled: self.cancelled,
        }
    }
}

impl<E: Engine> Iterator for BatchRun<E> {
    type Item = GameRecord;

    fn next(&mut self) -> Option<GameRecord> {
        while self.legs.front().is_some_and(|leg| leg.seeds.len() == 0) {
            self.legs.pop_front();
        }
        let leg = self.legs.front_mut()?;
        if self.cancel.is_cancelled() {
            self.cancelled = true;
            return None;
        }
        let seed = leg.seeds.next()?;
        match play_or_fault(&self.engine, &leg.config, seed, self.max_steps) {
            Ok(record) => Some(record),
            Err((record, e)) => {
                self.faults.push(e.to_string());
                Some(record)
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining()))
    }
}

/// Lifecycle owner: `Idle -> BoardReady -> Running -> BoardReady | Idle`.
pub struct Orchestrator<E: Engine> {
    engine: Option<E>,
    harness: HarnessConfig,
    active: Option<BoardHandle<E::Simulator>>,
    phase: Phase,
    status: StatusLog,
    seeds: SeedSource,
    last_problem: Option<String>,
}

impl<E: Engine> Orchestrator<E> {
    /// Orchestrator with no engine loaded yet.
    pub fn new(harness: HarnessConfig) -> Self {
        Self {
            engine: None,
            status: StatusLog::new(harness.status_capacity),
            seeds: SeedSource::from_config(harness.seed),
            harness,
            active: None,
            phase: Phase::Idle,
            last_problem: None,
        }
    }

    pub fn with_engine(engine: E, harness: HarnessConfig) -> Self {
        let mut orchestrator = Self::new(harness);
        orchestrator.load_engine(engine);
        orchestrator
    }

    /// Install (or replace) the engine. Any active board belonged to the old
    /// engine and is dropped.
    pub fn load_engine(&mut self, engine: E) {
        self.engine = Some(engine);
        self.active = None;
        self.phase = Phase::Idle;
        info!("engine loaded");
        self.status.push(StatusLevel::Info, "engine loaded");
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> &StatusLog {
        &self.status
    }

    pub fn engine(&self) -> Option<&E> {
        self.engine.as_ref()
    }

    pub fn harness(&self) -> &HarnessConfig {
        &self.harness
    }

    pub fn board(&self) -> Option<&ClassifiedBoard> {
        self.active.as_ref().and_then(BoardHandle::board)
    }

    /// Validate and clamp `config`, logging any clamp.
    fn prepare(&mut self, config: &BoardConfig) -> Result<BoardConfig, SimError> {
        let (fixed, topology, warning) = match config.normalized(self.harness.max_axis_size) {
            Ok(normalized) => normalized,
            Err(e) => {
                warn!(dims = ?config.dimensions, error = %e, "rejected board configuration");
                self.status.push(StatusLevel::Warn, e.to_string());
                return Err(e.into());
            }
        };
        if let Some(w) = warning {
            warn!(requested = config.mines, used = fixed.mines, "mine count clamped");
            self.status
                .push(StatusLevel::Warn, format!("{w}; using {} mines", fixed.mines));
        }
        debug!(topology = topology.name(), "configuration accepted");
        Ok(fixed.specialized())
    }

    fn fail(&mut self, e: SimError) -> SimError {
        match &e {
            SimError::EngineFault(_) => error!(error = %e, "engine fault"),
            _ => warn!(error = %e, "operation failed"),
        }
        if matches!(e, SimError::MalformedState(_)) {
            self.last_problem = Some(e.to_string());
        }
        self.status.push(StatusLevel::Error, e.to_string());
        e
    }

    fn settle(&mut self) {
        self.phase = if self.active.is_some() {
            Phase::BoardReady
        } else {
            Phase::Idle
        };
    }

    /// Build a standalone handle; the active board is untouched.
    pub fn create_handle(&mut self, config: &BoardConfig) -> Result<BoardHandle<E::Simulator>, SimError> {
        if self.engine.is_none() {
            return Err(self.fail(SimError::EngineUnavailable("no engine loaded")));
        }
        // shape is checked before the engine sees anything
        let config = self.prepare(config)?;
        let seed = self.seeds.next_seed();
        let opened = match self.engine.as_ref() {
            Some(engine) => BoardHandle::open(engine, &config, Some(seed)),
            None => Err(SimError::EngineUnavailable("no engine loaded")),
        };
        opened.map_err(|e| self.fail(e))
    }

    /// Replace the active board with a fresh one.
    ///
    /// A rejected configuration leaves the current board in place.
    pub fn create_board(&mut self, config: &BoardConfig) -> Result<&ClassifiedBoard, SimError> {
        let handle = match self.create_handle(config) {
            Ok(handle) => handle,
            Err(e) => {
                if matches!(e, SimError::MalformedState(_)) {
                    self.active = None;
                    self.settle();
                }
                return Err(e);
            }
        };
        info!(
            dims = ?handle.config().dimensions,
            mines = handle.config().mines,
            algorithm = %handle.config().algorithm,
            "board created"
        );
        self.status.push(
            StatusLevel::Info,
            format!("new {:?} board, {} mines", handle.config().dimensions, handle.config().mines),
        );
        self.last_problem = None;
        self.phase = Phase::BoardReady;
        self.active
            .insert(handle)
            .board()
            .ok_or(SimError::EngineUnavailable("no active board"))
    }

    fn active_mut(&mut self) -> Result<&mut BoardHandle<E::Simulator>, SimError> {
        if self.engine.is_none() {
            return Err(self.fail(SimError::EngineUnavailable("no engine loaded")));
        }
        if self.active.is_none() {
            return Err(self.fail(SimError::EngineUnavailable("no active board")));
        }
        self.active.as_mut().ok_or(SimError::EngineUnavailable("no active board"))
    }

    /// Run `op` on the active handle, recording failures in the status log.
    fn on_active<T>(
        &mut self,
        op: impl FnOnce(&mut BoardHandle<E::Simulator>) -> Result<T, SimError>,
    ) -> Result<T, SimError> {
        let result = op(self.active_mut()?);
        result.map_err(|e| self.fail(e))
    }

    /// One solver move on the active board.
    pub fn step(&mut self) -> Result<&ClassifiedBoard, SimError> {
        self.on_active(|h| h.step().map(|_| ()))?;
        self.current()
    }

    /// Play the active board out, bounded by the harness step limit.
    pub fn run_to_completion(&mut self) -> Result<&ClassifiedBoard, SimError> {
        let limit = self.harness.max_steps;
        self.phase = Phase::Running;
        let result = self.on_active(|h| h.run_to_completion(limit).map(|_| ()));
        self.settle();
        result?;
        if let Some(record) = self.active.as_ref().and_then(BoardHandle::record) {
            let outcome = if record.win { "won" } else { "lost" };
            info!(clicks = record.clicks, time_ms = record.time_ms, "game {outcome}");
            self.status.push(
                StatusLevel::Info,
                format!("game {outcome} after {} clicks", record.clicks),
            );
        }
        self.current()
    }

    pub fn reset(&mut self) -> Result<&ClassifiedBoard, SimError> {
        self.last_problem = None;
        self.on_active(|h| h.reset().map(|_| ()))?;
        self.current()
    }

    /// Rebind the active board's solver; SAT on 4 axes becomes the 4-D variant.
    pub fn set_algorithm(&mut self, algorithm: AlgorithmId) -> Result<&ClassifiedBoard, SimError> {
        self.on_active(|h| h.set_algorithm(algorithm).map(|_| ()))?;
        self.current()
    }

    fn current(&self) -> Result<&ClassifiedBoard, SimError> {
        self.board().ok_or(SimError::EngineUnavailable("no active board"))
    }

    /// Projection of the active board, or the reason there is nothing to draw.
    pub fn view(&self, view: &ViewState) -> Result<BoardView, SimError> {
        match &self.active {
            Some(handle) => handle.view(view),
            None => Ok(BoardView::NoBoard {
                reason: self
                    .last_problem
                    .clone()
                    .unwrap_or_else(|| "no board loaded".to_string()),
            }),
        }
    }

    fn engine_ready(&mut self) -> Result<(), SimError> {
        if self.engine.is_none() {
            return Err(self.fail(SimError::EngineUnavailable("no engine loaded")));
        }
        Ok(())
    }

    /// `games` fresh seeds on a validated `config`.
    fn leg(&mut self, config: &BoardConfig, games: usize) -> Result<Leg, SimError> {
        let config = self.prepare(config)?;
        let seeds = self.seeds.take(games);
        Ok(Leg {
            config,
            seeds: seeds.into_iter(),
        })
    }

    fn start(&self, legs: Vec<Leg>, cancel: &CancelToken) -> Result<BatchRun<&E>, SimError> {
        let engine = self
            .engine
            .as_ref()
            .ok_or(SimError::EngineUnavailable("no engine loaded"))?;
        Ok(BatchRun::new(engine, legs, self.harness.max_steps, cancel.clone()))
    }

    /// Lazily play `n` games of `config`.
    pub fn batch(&mut self, n: usize, config: &BoardConfig, cancel: &CancelToken) -> Result<BatchRun<&E>, SimError> {
        self.engine_ready()?;
        let leg = self.leg(config, n)?;
        self.start(vec![leg], cancel)
    }

    /// Lazily play `games` per algorithm on the same board shape, in the
    /// order given. SAT on 4 axes becomes the 4-D variant.
    pub fn comparison(
        &mut self,
        algorithms: &[AlgorithmId],
        games: usize,
        config: &BoardConfig,
        cancel: &CancelToken,
    ) -> Result<BatchRun<&E>, SimError> {
        self.engine_ready()?;
        let mut legs = Vec::with_capacity(algorithms.len());
        for &algorithm in algorithms {
            let cfg = BoardConfig {
                algorithm,
                ..config.clone()
            };
            legs.push(self.leg(&cfg, games)?);
        }
        self.start(legs, cancel)
    }

    /// Lazily play the benchmark matrix. Iteration `i` uses seed `i` for
    /// every algorithm and objective.
    pub fn benchmark(&mut self, plan: &BenchmarkPlan, cancel: &CancelToken) -> Result<BatchRun<&E>, SimError> {
        self.engine_ready()?;
        let schedule = match plan.schedule() {
            Ok(schedule) => schedule,
            Err(e) => return Err(self.fail(e.into())),
        };
        let mut legs = Vec::with_capacity(schedule.len());
        for (board, seed) in &schedule {
            let config = self.prepare(board)?;
            legs.push(Leg {
                config,
                seeds: vec![*seed].into_iter(),
            });
        }
        info!(games = legs.len(), sizes = plan.sizes.len(), "benchmark planned");
        self.start(legs, cancel)
    }

    /// Play `n` independent games; faults count as losses.
    pub fn run_batch(&mut self, n: usize, config: &BoardConfig, cancel: &CancelToken) -> Result<BatchOutcome, SimError> {
        self.phase = Phase::Running;
        let outcome = self.batch(n, config, cancel).map(BatchRun::finish);
        self.settle();
        let outcome = outcome?;
        self.log_batch(&outcome, n);
        Ok(outcome)
    }

    /// [`Orchestrator::run_batch`] with the harness `batch_size`.
    pub fn run_default_batch(&mut self, config: &BoardConfig, cancel: &CancelToken) -> Result<BatchOutcome, SimError> {
        let n = self.harness.batch_size;
        self.run_batch(n, config, cancel)
    }

    fn log_batch(&mut self, outcome: &BatchOutcome, requested: usize) {
        let wins = outcome.records.iter().filter(|r| r.win).count();
        info!(
            played = outcome.records.len(),
            requested,
            wins,
            faults = outcome.faults.len(),
            cancelled = outcome.cancelled,
            "batch finished"
        );
        for fault in &outcome.faults {
            self.status.push(StatusLevel::Error, fault.clone());
        }
        let mut line = format!("batch: {wins}/{} won", outcome.records.len());
        if outcome.cancelled {
            line.push_str(&format!(" (cancelled, {requested} requested)"));
        }
        self.status.push(StatusLevel::Info, line);
    }

    /// `games` per algorithm on the same board shape, records concatenated in
    /// the order given.
    pub fn compare_algorithms(
        &mut self,
        algorithms: &[AlgorithmId],
        games: usize,
        config: &BoardConfig,
        cancel: &CancelToken,
    ) -> Result<ComparisonOutcome, SimError> {
        self.phase = Phase::Running;
        let outcome = self.comparison(algorithms, games, config, cancel).map(BatchRun::finish);
        self.settle();
        let outcome = outcome?;
        self.log_batch(&outcome, games * algorithms.len());
        Ok(ComparisonOutcome::from(outcome))
    }

    /// [`Orchestrator::compare_algorithms`] with the harness
    /// `games_per_algorithm`.
    pub fn compare_default(
        &mut self,
        algorithms: &[AlgorithmId],
        config: &BoardConfig,
        cancel: &CancelToken,
    ) -> Result<ComparisonOutcome, SimError> {
        let games = self.harness.games_per_algorithm;
        self.compare_algorithms(algorithms, games, config, cancel)
    }

    /// Play the whole benchmark matrix.
    pub fn benchmark_matrix(&mut self, plan: &BenchmarkPlan, cancel: &CancelToken) -> Result<BatchOutcome, SimError> {
        self.phase = Phase::Running;
        let outcome = self.benchmark(plan, cancel).map(BatchRun::finish);
        self.settle();
        let outcome = outcome?;
        self.log_batch(&outcome, plan.games());
        Ok(outcome)
    }
}

#[cfg(feature = "parallel")]
impl<E: Engine + Sync> Orchestrator<E> {
    /// [`Orchestrator::run_batch`] on a pool of `workers` threads. Records
    /// keep game order.
    pub fn run_batch_parallel(
        &mut self,
        n: usize,
        config: &BoardConfig,
        cancel: &CancelToken,
    ) -> Result<BatchOutcome, SimError> {
        use rayon::prelude::*;

        self.engine_ready()?;
        let Leg { config, seeds } = self.leg(config, n)?;
        let seeds: Vec<u64> = seeds.collect();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.harness.workers)
            .build()
            .map_err(|e| crate::error::ConfigError::Invalid(format!("worker pool: {e}")))?;

        self.phase = Phase::Running;
        let max_steps = self.harness.max_steps;
        let results: Vec<Option<Result<GameRecord, (GameRecord, SimError)>>> = match self.engine.as_ref() {
            Some(engine) => pool.install(|| {
                seeds
                    .par_iter()
                    .map(|&seed| {
                        if cancel.is_cancelled() {
                            None
                        } else {
                            Some(play_or_fault(engine, &config, seed, max_steps))
                        }
                    })
                    .collect()
            }),
            None => Vec::new(),
        };
        self.settle();

        let mut outcome = BatchOutcome::default();
        for result in results {
            match result {
                Some(Ok(record)) => outcome.records.push(record),
                Some(Err((record, e))) => {
                    outcome.faults.push(e.to_string());
                    outcome.records.push(record);
                }
                None => outcome.cancelled = true,
            }
        }
        self.log_batch(&outcome, n);
        Ok(outcome)
    }

    pub fn compare_algorithms_parallel(
        &mut self,
        algorithms: &[AlgorithmId],
        games: usize,
        config: &BoardConfig,
        cancel: &CancelToken,
    ) -> Result<ComparisonOutcome, SimError> {
        let mut out = ComparisonOutcome::default();
        for &algorithm in algorithms {
            let algorithm = algorithm.specialize_for(&config.dimensions);
            let cfg = BoardConfig {
                algorithm,
                ..config.clone()
            };
            let batch = self.run_batch_parallel(games, &cfg, cancel)?;
            out.stats.extend(summarize_by_algorithm(&batch.records));
            out.records.extend(batch.records);
            if batch.cancelled {
                out.cancelled = true;
                break;
            }
        }
        Ok(out)
    }
}
