//! Core data types shared by the projection engine and the simulation harness.
//!
//! Boards are flat `Vec<Cell>` collections in whatever order the engine
//! produced them. Every cell carries its full coordinate vector; the
//! row-major helpers below (`linear_index` / `unravel`) give each coordinate a
//! stable slot so lookups do not depend on engine ordering.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Row-major slot of `coords` inside a board of shape `dims` (last axis fastest).
/// Returns `None` when the vector has the wrong rank or leaves the board.
#[inline]
pub fn linear_index(dims: &[usize], coords: &[usize]) -> Option<usize> {
    if dims.len() != coords.len() {
        return None;
    }
    let mut idx = 0usize;
    for (&size, &c) in dims.iter().zip(coords) {
        if c >= size {
            return None;
        }
        idx = idx * size + c;
    }
    Some(idx)
}

/// Inverse of [`linear_index`].
#[inline]
pub fn unravel(dims: &[usize], mut idx: usize) -> Vec<usize> {
    let mut coords = vec![0; dims.len()];
    for (axis, &size) in dims.iter().enumerate().rev() {
        coords[axis] = idx % size;
        idx /= size;
    }
    coords
}

/// Total number of cells for a shape, `None` if it does not fit in `usize`.
#[inline]
pub fn cell_count(dims: &[usize]) -> Option<usize> {
    dims.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

// ─── Solver identifiers ─────────────────────────────────────────────────────

/// Solving algorithm exposed by the engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmId {
    Greedy,
    ExactSolver,
    SatSolver,
    #[serde(rename = "sat_solver_4d")]
    SatSolver4D,
    GlobalSat,
    PartitionedSat,
    ScipSolver,
}

impl AlgorithmId {
    pub const ALL: [AlgorithmId; 7] = [
        AlgorithmId::Greedy,
        AlgorithmId::ExactSolver,
        AlgorithmId::SatSolver,
        AlgorithmId::SatSolver4D,
        AlgorithmId::GlobalSat,
        AlgorithmId::PartitionedSat,
        AlgorithmId::ScipSolver,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AlgorithmId::Greedy => "greedy",
            AlgorithmId::ExactSolver => "exact_solver",
            AlgorithmId::SatSolver => "sat_solver",
            AlgorithmId::SatSolver4D => "sat_solver_4d",
            AlgorithmId::GlobalSat => "global_sat",
            AlgorithmId::PartitionedSat => "partitioned_sat",
            AlgorithmId::ScipSolver => "scip_solver",
        }
    }

    /// Solver actually handed to the engine for a board of shape `dims`.
    ///
    /// The generic SAT solver is undefined on 4-axis boards, so it is swapped
    /// for the 4-D variant there. No other algorithm or rank is rewritten.
    pub fn specialize_for(self, dims: &[usize]) -> AlgorithmId {
        match self {
            AlgorithmId::SatSolver if dims.len() == 4 => AlgorithmId::SatSolver4D,
            other => other,
        }
    }
}

impl AlgorithmId {
    /// Discriminant of the engine's exported algorithm enum.
    ///
    /// | id | code |
    /// |---|---|
    /// | greedy | 0 |
    /// | exact_solver | 1 |
    /// | global_sat, sat_solver | 2 |
    /// | partitioned_sat | 3 |
    /// | scip_solver | 4 |
    ///
    /// `sat_solver` is the UI name of the engine's global SAT slot. The 4-D
    /// SAT variant has no code and must be constructed by name.
    pub fn engine_code(self) -> Option<u32> {
        match self {
            AlgorithmId::Greedy => Some(0),
            AlgorithmId::ExactSolver => Some(1),
            AlgorithmId::SatSolver | AlgorithmId::GlobalSat => Some(2),
            AlgorithmId::PartitionedSat => Some(3),
            AlgorithmId::ScipSolver => Some(4),
            AlgorithmId::SatSolver4D => None,
        }
    }
}

impl fmt::Display for AlgorithmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlgorithmId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlgorithmId::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("unknown algorithm '{s}'"))
    }
}

/// Order in which the engine visits its candidate safe cells.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TspObjective {
    MinDistance,
    MinRotation,
    MaxInformation,
}

impl TspObjective {
    pub const ALL: [TspObjective; 3] = [
        TspObjective::MinDistance,
        TspObjective::MinRotation,
        TspObjective::MaxInformation,
    ];

    /// Discriminant of the engine's exported objective enum.
    pub fn engine_code(self) -> u32 {
        match self {
            TspObjective::MinDistance => 0,
            TspObjective::MinRotation => 1,
            TspObjective::MaxInformation => 2,
        }
    }
}

impl fmt::Display for TspObjective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ─── Board state ────────────────────────────────────────────────────────────

/// One cell of an N-dimensional board.
///
/// Dice-cube cells use `[face, row, col]` coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub coordinates: Vec<usize>,
    pub is_mine: bool,
    pub is_revealed: bool,
    pub is_flagged: bool,
    pub adjacent_mines: u8,
}

/// Raw board state as delivered by an engine.
///
/// Every field is optional so a partial payload deserializes; turning it into
/// a [`Board`] is where missing data is rejected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardSnapshot {
    pub dimensions: Option<Vec<usize>>,
    pub mines: Option<usize>,
    pub cells: Option<Vec<Cell>>,
    pub total_revealed: Option<usize>,
    pub total_clicks: Option<usize>,
    pub game_over: Option<bool>,
    pub game_won: Option<bool>,
    pub algorithm: Option<AlgorithmId>,
    /// Moves the solver made without a logical guarantee.
    #[serde(alias = "total_guesses")]
    pub guesses: Option<usize>,
}

/// A complete board snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub dimensions: Vec<usize>,
    pub mines: usize,
    pub cells: Vec<Cell>,
    pub total_revealed: usize,
    pub total_clicks: usize,
    pub game_over: bool,
    pub game_won: bool,
    pub algorithm: AlgorithmId,
    pub guesses: usize,
}

impl Board {
    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    /// Percentage of non-mine cells revealed so far.
    pub fn completion(&self) -> f64 {
        let safe = self.total_cells().saturating_sub(self.mines);
        if safe == 0 {
            return 0.0;
        }
        self.total_revealed as f64 / safe as f64 * 100.0
    }
}

impl From<Board> for BoardSnapshot {
    fn from(b: Board) -> Self {
        Self {
            dimensions: Some(b.dimensions),
            mines: Some(b.mines),
            cells: Some(b.cells),
            total_revealed: Some(b.total_revealed),
            total_clicks: Some(b.total_clicks),
            game_over: Some(b.game_over),
            game_won: Some(b.game_won),
            algorithm: Some(b.algorithm),
            guesses: Some(b.guesses),
        }
    }
}

impl TryFrom<BoardSnapshot> for Board {
    type Error = SimError;

    fn try_from(s: BoardSnapshot) -> Result<Self, Self::Error> {
        fn required<T>(v: Option<T>, field: &str) -> Result<T, SimError> {
            v.ok_or_else(|| SimError::MalformedState(format!("snapshot has no `{field}`")))
        }

        Ok(Board {
            dimensions: required(s.dimensions, "dimensions")?,
            mines: required(s.mines, "mines")?,
            cells: required(s.cells, "cells")?,
            total_revealed: s.total_revealed.unwrap_or(0),
            total_clicks: s.total_clicks.unwrap_or(0),
            game_over: s.game_over.unwrap_or(false),
            game_won: s.game_won.unwrap_or(false),
            algorithm: required(s.algorithm, "algorithm")?,
            guesses: s.guesses.unwrap_or(0),
        })
    }
}

// ─── Results ────────────────────────────────────────────────────────────────

/// Outcome of one finished game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub algorithm: AlgorithmId,
    pub objective: Option<TspObjective>,
    pub dims: Vec<usize>,
    pub win: bool,
    pub clicks: usize,
    pub time_ms: u64,
    pub guesses: usize,
    pub completion: f64,
    /// Seed handed to the engine, when the game was seeded.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl GameRecord {
    pub fn from_board(board: &Board, objective: Option<TspObjective>, time_ms: u64) -> Self {
        Self {
            algorithm: board.algorithm,
            objective,
            dims: board.dimensions.clone(),
            win: board.game_won,
            clicks: board.total_clicks,
            time_ms,
            guesses: board.guesses,
            completion: board.completion(),
            seed: None,
        }
    }

    /// A game the engine failed on. Counts as a loss with zeroed metrics.
    pub fn fault(algorithm: AlgorithmId, objective: Option<TspObjective>, dims: &[usize]) -> Self {
        Self {
            algorithm,
            objective,
            dims: dims.to_vec(),
            win: false,
            clicks: 0,
            time_ms: 0,
            guesses: 0,
            completion: 0.0,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_index_roundtrip() {
        let dims = [3, 4, 2, 5];
        for idx in 0..cell_count(&dims).unwrap() {
            let coords = unravel(&dims, idx);
            assert_eq!(linear_index(&dims, &coords), Some(idx));
        }
    }

    #[test]
    fn test_engine_codes_follow_engine_enum() {
        let codes: Vec<(AlgorithmId, Option<u32>)> =
            AlgorithmId::ALL.into_iter().map(|a| (a, a.engine_code())).collect();
        assert_eq!(
            codes,
            vec![
                (AlgorithmId::Greedy, Some(0)),
                (AlgorithmId::ExactSolver, Some(1)),
                (AlgorithmId::SatSolver, Some(2)),
                (AlgorithmId::SatSolver4D, None),
                (AlgorithmId::GlobalSat, Some(2)),
                (AlgorithmId::PartitionedSat, Some(3)),
                (AlgorithmId::ScipSolver, Some(4)),
            ]
        );
        assert_eq!(TspObjective::MaxInformation.engine_code(), 2);
    }

    #[test]
    fn test_snapshot_reads_total_guesses() {
        let snap: BoardSnapshot = serde_json::from_str(r#"{"total_guesses": 4}"#).unwrap();
        assert_eq!(snap.guesses, Some(4));
        let snap: BoardSnapshot = serde_json::from_str(r#"{"guesses": 2}"#).unwrap();
        assert_eq!(snap.guesses, Some(2));
    }

    #[test]
    fn test_linear_index_rejects_out_of_bounds() {
        assert_eq!(linear_index(&[3, 3], &[3, 0]), None);
        assert_eq!(linear_index(&[3, 3], &[1]), None);
        assert_eq!(linear_index(&[3, 3], &[2, 2]), Some(8));
    }

    #[test]
    fn test_sat_specialized_only_on_four_axes() {
        assert_eq!(AlgorithmId::SatSolver.specialize_for(&[4, 4, 4, 4]), AlgorithmId::SatSolver4D);
        assert_eq!(AlgorithmId::SatSolver.specialize_for(&[4, 4, 4]), AlgorithmId::SatSolver);
        assert_eq!(AlgorithmId::SatSolver.specialize_for(&[3, 3, 3, 3, 3]), AlgorithmId::SatSolver);
        assert_eq!(AlgorithmId::Greedy.specialize_for(&[4, 4, 4, 4]), AlgorithmId::Greedy);
    }

    #[test]
    fn test_algorithm_id_parse() {
        for a in AlgorithmId::ALL {
            assert_eq!(a.as_str().parse::<AlgorithmId>(), Ok(a));
        }
        assert!("simplex".parse::<AlgorithmId>().is_err());
    }

    #[test]
    fn test_snapshot_without_cells_is_malformed() {
        let snap = BoardSnapshot {
            dimensions: Some(vec![3, 3]),
            mines: Some(1),
            algorithm: Some(AlgorithmId::Greedy),
            ..Default::default()
        };
        match Board::try_from(snap) {
            Err(SimError::MalformedState(msg)) => assert!(msg.contains("cells")),
            other => panic!("expected MalformedState, got {other:?}"),
        }
    }

    #[test]
    fn test_snapshot_json_uses_engine_field_names() {
        let json = r#"{
            "dimensions": [2, 2], "mines": 1, "algorithm": "sat_solver_4d",
            "cells": [{"coordinates": [0, 1], "is_mine": false, "is_revealed": true,
                       "is_flagged": false, "adjacent_mines": 1}]
        }"#;
        let snap: BoardSnapshot = serde_json::from_str(json).unwrap();
        let board = Board::try_from(snap).unwrap();
        assert_eq!(board.algorithm, AlgorithmId::SatSolver4D);
        assert_eq!(board.cells[0].coordinates, vec![0, 1]);
        assert!(!board.game_over);
    }

    #[test]
    fn test_completion_ignores_mines() {
        let board = Board {
            dimensions: vec![2, 2],
            mines: 1,
            cells: (0..4)
                .map(|i| Cell {
                    coordinates: unravel(&[2, 2], i),
                    is_mine: i == 0,
                    is_revealed: false,
                    is_flagged: false,
                    adjacent_mines: 0,
                })
                .collect(),
            total_revealed: 3,
            total_clicks: 1,
            game_over: true,
            game_won: true,
            algorithm: AlgorithmId::Greedy,
            guesses: 0,
        };
        assert_eq!(board.completion(), 100.0);
    }
}
