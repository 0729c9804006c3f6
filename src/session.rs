//! One live game: an engine simulator plus the last validated snapshot.
//!
//! Every snapshot the engine returns is validated and classified exactly once
//! here; callers only ever see [`ClassifiedBoard`]s. Engine calls run behind
//! [`guarded`], so a panicking solver surfaces as an `EngineFault` instead of
//! unwinding through the harness.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::config::BoardConfig;
use crate::engine::{Engine, Simulator};
use crate::error::{EngineError, SimError};
use crate::projection::{project, BoardView, ViewState};
use crate::time::{elapsed_ms, Instant};
use crate::topology::ClassifiedBoard;
use crate::types::{AlgorithmId, Board, BoardSnapshot, GameRecord};

/// Run an engine call, turning panics into [`EngineError`]s.
pub(crate) fn guarded<T>(call: impl FnOnce() -> Result<T, EngineError>) -> Result<T, EngineError> {
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => {
            let msg = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "engine panicked".to_string());
            Err(EngineError::new(format!("panic: {msg}")))
        }
    }
}

/// Handle to one engine-owned board.
pub struct BoardHandle<S> {
    sim: S,
    config: BoardConfig,
    current: Option<ClassifiedBoard>,
    started: Instant,
}

impl<S: Simulator> BoardHandle<S> {
    /// Ask `engine` for a fresh board.
    ///
    /// `config` must already be normalized (see [`BoardConfig::normalized`]);
    /// the algorithm is specialized for the board shape here.
    pub fn open<E>(engine: &E, config: &BoardConfig, seed: Option<u64>) -> Result<Self, SimError>
    where
        E: Engine<Simulator = S>,
    {
        let config = config.specialized();
        let mut sim = guarded(|| engine.create(&config.dimensions, config.mines, config.algorithm))?;
        if let Some(seed) = seed {
            sim.set_seed(seed);
        }
        if let Some(objective) = config.objective {
            sim.set_objective(objective);
        }

        let mut handle = Self {
            sim,
            config,
            current: None,
            started: Instant::now(),
        };
        handle.refresh()?;
        Ok(handle)
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Last validated board, `None` if the engine's latest snapshot was unusable.
    pub fn board(&self) -> Option<&ClassifiedBoard> {
        self.current.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.current.as_ref().is_some_and(|b| b.board.game_over)
    }

    /// Re-read the engine state without advancing it.
    pub fn refresh(&mut self) -> Result<&ClassifiedBoard, SimError> {
        let snapshot = guarded(|| self.sim.state())?;
        self.accept(snapshot, false)
    }

    /// Advance one solver move. A finished game is returned unchanged.
    pub fn step(&mut self) -> Result<&ClassifiedBoard, SimError> {
        if self.is_over() {
            return self.current.as_ref().ok_or(SimError::EngineUnavailable("no board"));
        }
        let snapshot = guarded(|| self.sim.step())?;
        self.accept(snapshot, false)
    }

    /// Step until the game ends or `max_steps` moves have been made.
    ///
    /// With `max_steps = None` the engine's own full-game runner is used.
    pub fn run_to_completion(&mut self, max_steps: Option<usize>) -> Result<&ClassifiedBoard, SimError> {
        let Some(limit) = max_steps else {
            if !self.is_over() {
                let snapshot = guarded(|| self.sim.run_full_game())?;
                self.accept(snapshot, false)?;
            }
            return self.current.as_ref().ok_or(SimError::EngineUnavailable("no board"));
        };

        let mut steps = 0;
        while !self.is_over() && steps < limit {
            self.step()?;
            steps += 1;
        }
        if !self.is_over() {
            warn!(limit, dims = ?self.config.dimensions, "game hit the step limit before finishing");
        }
        self.current.as_ref().ok_or(SimError::EngineUnavailable("no board"))
    }

    /// New random board with the same configuration.
    pub fn reset(&mut self) -> Result<&ClassifiedBoard, SimError> {
        guarded(|| self.sim.reset())?;
        self.started = Instant::now();
        let snapshot = guarded(|| self.sim.state())?;
        self.accept(snapshot, true)
    }

    /// Rebind the solver on the current board.
    pub fn set_algorithm(&mut self, algorithm: AlgorithmId) -> Result<&ClassifiedBoard, SimError> {
        let algorithm = algorithm.specialize_for(&self.config.dimensions);
        guarded(|| self.sim.set_algorithm(algorithm))?;
        self.config.algorithm = algorithm;
        self.refresh()
    }

    /// Project the current board, or report why there is none.
    pub fn view(&self, view: &ViewState) -> Result<BoardView, SimError> {
        match &self.current {
            Some(board) => Ok(BoardView::Ready(project(board, view)?)),
            None => Ok(BoardView::NoBoard {
                reason: "engine returned an unusable board".into(),
            }),
        }
    }

    /// Outcome of the game so far.
    pub fn record(&self) -> Option<GameRecord> {
        self.current
            .as_ref()
            .map(|b| GameRecord::from_board(&b.board, self.config.objective, elapsed_ms(self.started)))
    }

    fn accept(&mut self, snapshot: BoardSnapshot, after_reset: bool) -> Result<&ClassifiedBoard, SimError> {
        let validated = Board::try_from(snapshot).and_then(|board| {
            if !after_reset {
                if let Some(prev) = &self.current {
                    if board.total_revealed < prev.board.total_revealed {
                        return Err(SimError::MalformedState(format!(
                            "revealed count went backwards ({} -> {})",
                            prev.board.total_revealed, board.total_revealed
                        )));
                    }
                }
            }
            ClassifiedBoard::new(board)
        });

        match validated {
            Ok(board) => {
                debug!(
                    topology = board.topology.name(),
                    revealed = board.board.total_revealed,
                    over = board.board.game_over,
                    "board snapshot accepted"
                );
                Ok(&*self.current.insert(board))
            }
            Err(e) => {
                self.current = None;
                Err(e)
            }
        }
    }
}
