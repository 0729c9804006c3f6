//! Port to the external solving engine.
//!
//! The harness never places mines, counts neighbours or picks moves itself;
//! all of that happens behind these two traits. An [`Engine`] is a factory,
//! a [`Simulator`] is one live game.

use crate::error::EngineError;
use crate::types::{AlgorithmId, BoardSnapshot, TspObjective};

/// A single game owned by the engine.
pub trait Simulator {
    /// Current board. Must not advance the game.
    fn state(&self) -> Result<BoardSnapshot, EngineError>;

    /// Advance exactly one solver move.
    fn step(&mut self) -> Result<BoardSnapshot, EngineError>;

    /// Play until the game ends and return the terminal board.
    fn run_full_game(&mut self) -> Result<BoardSnapshot, EngineError>;

    /// Rebind the solver, keeping the board geometry.
    fn set_algorithm(&mut self, algorithm: AlgorithmId) -> Result<(), EngineError>;

    /// Fresh random board with the same configuration.
    fn reset(&mut self) -> Result<(), EngineError>;

    /// Seed the engine's randomness. Engines without seeding ignore it.
    fn set_seed(&mut self, _seed: u64) {}

    fn set_objective(&mut self, _objective: TspObjective) {}
}

/// Factory for simulators.
pub trait Engine {
    type Simulator: Simulator;

    fn create(
        &self,
        dimensions: &[usize],
        mines: usize,
        algorithm: AlgorithmId,
    ) -> Result<Self::Simulator, EngineError>;
}

impl<E: Engine + ?Sized> Engine for &E {
    type Simulator = E::Simulator;

    fn create(&self, dimensions: &[usize], mines: usize, algorithm: AlgorithmId) -> Result<E::Simulator, EngineError> {
        (**self).create(dimensions, mines, algorithm)
    }
}

impl<S: Simulator + ?Sized> Simulator for Box<S> {
    fn state(&self) -> Result<BoardSnapshot, EngineError> {
        (**self).state()
    }

    fn step(&mut self) -> Result<BoardSnapshot, EngineError> {
        (**self).step()
    }

    fn run_full_game(&mut self) -> Result<BoardSnapshot, EngineError> {
        (**self).run_full_game()
    }

    fn set_algorithm(&mut self, algorithm: AlgorithmId) -> Result<(), EngineError> {
        (**self).set_algorithm(algorithm)
    }

    fn reset(&mut self) -> Result<(), EngineError> {
        (**self).reset()
    }

    fn set_seed(&mut self, seed: u64) {
        (**self).set_seed(seed)
    }

    fn set_objective(&mut self, objective: TspObjective) {
        (**self).set_objective(objective)
    }
}
