//! Scripted engine double for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::engine::{Engine, Simulator};
use crate::error::EngineError;
use crate::types::{cell_count, unravel, AlgorithmId, Board, BoardSnapshot, Cell, TspObjective};

/// Row-major board of shape `dims` with the last `mines` cells mined.
pub(crate) fn board_for(dims: &[usize], mines: usize) -> Board {
    let total = cell_count(dims).expect("test board fits in memory");
    let cells = (0..total)
        .map(|i| Cell {
            coordinates: unravel(dims, i),
            is_mine: i >= total - mines,
            is_revealed: false,
            is_flagged: false,
            adjacent_mines: 0,
        })
        .collect();
    Board {
        dimensions: dims.to_vec(),
        mines,
        cells,
        total_revealed: 0,
        total_clicks: 0,
        game_over: false,
        game_won: false,
        algorithm: AlgorithmId::Greedy,
        guesses: 0,
    }
}

/// How a scripted game plays out. Step numbers start at 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Behavior {
    /// Reveal safe cells in order until won.
    Win,
    /// Click a mine on the given step.
    LoseAt(usize),
    ErrorAt(usize),
    PanicAt(usize),
    /// Never progresses.
    Stall,
    /// Snapshots come back without cells.
    Malformed,
    RefuseCreate,
}

type Script = dyn Fn(usize, AlgorithmId) -> Behavior + Send + Sync;

/// Clones share their counters and logs.
#[derive(Clone)]
pub(crate) struct FakeEngine {
    script: Arc<Script>,
    created: Arc<AtomicUsize>,
    seeds: Arc<Mutex<Vec<u64>>>,
    algorithms: Arc<Mutex<Vec<AlgorithmId>>>,
}

impl FakeEngine {
    /// `script(game_number, algorithm)` picks the behavior of each created game.
    pub(crate) fn new(script: impl Fn(usize, AlgorithmId) -> Behavior + Send + Sync + 'static) -> Self {
        Self {
            script: Arc::new(script),
            created: Arc::default(),
            seeds: Arc::default(),
            algorithms: Arc::default(),
        }
    }

    pub(crate) fn always(behavior: Behavior) -> Self {
        Self::new(move |_, _| behavior)
    }

    pub(crate) fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub(crate) fn seeds(&self) -> Vec<u64> {
        self.seeds.lock().unwrap().clone()
    }

    /// Algorithm ids passed to `create` and `set_algorithm`, in call order.
    pub(crate) fn algorithms(&self) -> Vec<AlgorithmId> {
        self.algorithms.lock().unwrap().clone()
    }
}

impl Engine for FakeEngine {
    type Simulator = FakeSim;

    fn create(&self, dimensions: &[usize], mines: usize, algorithm: AlgorithmId) -> Result<FakeSim, EngineError> {
        let game = self.created.fetch_add(1, Ordering::SeqCst);
        self.algorithms.lock().unwrap().push(algorithm);
        let behavior = (self.script)(game, algorithm);
        if behavior == Behavior::RefuseCreate {
            return Err(EngineError::new("cannot allocate board"));
        }
        let mut board = board_for(dimensions, mines);
        board.algorithm = algorithm;
        Ok(FakeSim {
            board,
            behavior,
            steps: 0,
            seeds: Arc::clone(&self.seeds),
            algorithms: Arc::clone(&self.algorithms),
        })
    }
}

pub(crate) struct FakeSim {
    board: Board,
    behavior: Behavior,
    steps: usize,
    seeds: Arc<Mutex<Vec<u64>>>,
    algorithms: Arc<Mutex<Vec<AlgorithmId>>>,
}

impl FakeSim {
    fn snapshot(&self) -> BoardSnapshot {
        let mut snap = BoardSnapshot::from(self.board.clone());
        if self.behavior == Behavior::Malformed {
            snap.cells = None;
        }
        snap
    }

    fn click(&mut self, want_mine: bool) {
        let Some(cell) = self
            .board
            .cells
            .iter_mut()
            .find(|c| !c.is_revealed && c.is_mine == want_mine)
        else {
            return;
        };
        cell.is_revealed = true;
        self.board.total_clicks += 1;
        if want_mine {
            self.board.game_over = true;
            self.board.guesses += 1;
            return;
        }
        self.board.total_revealed += 1;
        if self.board.total_revealed == self.board.cells.len() - self.board.mines {
            self.board.game_over = true;
            self.board.game_won = true;
        }
    }
}

impl Simulator for FakeSim {
    fn state(&self) -> Result<BoardSnapshot, EngineError> {
        Ok(self.snapshot())
    }

    fn step(&mut self) -> Result<BoardSnapshot, EngineError> {
        if self.board.game_over {
            return Ok(self.snapshot());
        }
        self.steps += 1;
        match self.behavior {
            Behavior::ErrorAt(n) if n == self.steps => return Err(EngineError::new("solver crashed")),
            Behavior::PanicAt(n) if n == self.steps => panic!("solver panicked at step {n}"),
            Behavior::Stall => {}
            Behavior::LoseAt(n) if n == self.steps => self.click(true),
            _ => self.click(false),
        }
        Ok(self.snapshot())
    }

    fn run_full_game(&mut self) -> Result<BoardSnapshot, EngineError> {
        while !self.board.game_over {
            self.step()?;
            if self.behavior == Behavior::Stall {
                break;
            }
        }
        Ok(self.snapshot())
    }

    fn set_algorithm(&mut self, algorithm: AlgorithmId) -> Result<(), EngineError> {
        self.algorithms.lock().unwrap().push(algorithm);
        self.board.algorithm = algorithm;
        Ok(())
    }

    fn reset(&mut self) -> Result<(), EngineError> {
        let algorithm = self.board.algorithm;
        self.board = board_for(&self.board.dimensions, self.board.mines);
        self.board.algorithm = algorithm;
        self.steps = 0;
        Ok(())
    }

    fn set_seed(&mut self, seed: u64) {
        self.seeds.lock().unwrap().push(seed);
    }

    fn set_objective(&mut self, _objective: TspObjective) {}
}
