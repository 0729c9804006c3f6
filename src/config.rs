//! User-facing configuration.
//!
//! Both structs deserialize from JSON with every field optional; missing
//! fields take the defaults below.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::topology::{check_shape, Topology};
use crate::types::{cell_count, AlgorithmId, TspObjective};

/// Fraction of cells mined in benchmark boards.
pub const BENCHMARK_MINE_DENSITY: f64 = 0.15;

/// Largest size accepted on any axis of a new board.
pub const MAX_AXIS_SIZE: usize = 30;

/// Shape, mine count and solver for one board.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub dimensions: Vec<usize>,
    pub mines: usize,
    pub algorithm: AlgorithmId,
    pub objective: Option<TspObjective>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            dimensions: vec![9, 9],
            mines: 10,
            algorithm: AlgorithmId::Greedy,
            objective: None,
        }
    }
}

impl BoardConfig {
    pub fn new(dimensions: Vec<usize>, mines: usize, algorithm: AlgorithmId) -> Self {
        Self {
            dimensions,
            mines,
            algorithm,
            objective: None,
        }
    }

    /// `None` when the shape has more cells than `usize` can count.
    pub fn total_cells(&self) -> Option<usize> {
        cell_count(&self.dimensions)
    }

    /// Check the shape and bring the mine count into `1..=cells - 1`.
    ///
    /// Returns the usable config plus the problem that forced a clamp, if any.
    /// Shape errors have no safe default and are returned as `Err`.
    pub fn normalized(&self, max_axis: usize) -> Result<(Self, Topology, Option<ConfigError>), ConfigError> {
        let topology = check_shape(&self.dimensions, max_axis)?;
        let cells = self
            .total_cells()
            .ok_or_else(|| ConfigError::BoardTooLarge(self.dimensions.clone()))?;
        let max_mines = cells - 1;

        let mut fixed = self.clone();
        let warning = if self.mines > max_mines {
            fixed.mines = max_mines;
            Some(ConfigError::TooManyMines {
                mines: self.mines,
                cells,
            })
        } else if self.mines == 0 {
            fixed.mines = 1;
            Some(ConfigError::Invalid("a board needs at least one mine".into()))
        } else {
            None
        };

        Ok((fixed, topology, warning))
    }

    /// Same config with `algorithm` swapped for its variant on this shape.
    pub fn specialized(&self) -> Self {
        Self {
            algorithm: self.algorithm.specialize_for(&self.dimensions),
            ..self.clone()
        }
    }
}

/// Named starting boards offered by the UI.
pub fn presets() -> Vec<(&'static str, BoardConfig)> {
    vec![
        ("9x9", BoardConfig::new(vec![9, 9], 10, AlgorithmId::Greedy)),
        ("16x16", BoardConfig::new(vec![16, 16], 40, AlgorithmId::Greedy)),
        ("16x30", BoardConfig::new(vec![16, 30], 99, AlgorithmId::Greedy)),
    ]
}

/// Settings for batch runs and comparison sweeps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Games played by a batch when no count is given.
    pub batch_size: usize,
    /// Games per algorithm in a comparison sweep when no count is given.
    pub games_per_algorithm: usize,
    /// Step bound for a single game. `None` trusts the engine's own full run.
    pub max_steps: Option<usize>,
    /// Worker threads for parallel batches.
    pub workers: usize,
    pub max_axis_size: usize,
    /// Base seed; batches are reproducible when set.
    pub seed: Option<u64>,
    /// Status lines kept for display.
    pub status_capacity: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            games_per_algorithm: 50,
            max_steps: Some(100_000),
            workers: 4,
            max_axis_size: MAX_AXIS_SIZE,
            seed: None,
            status_capacity: 50,
        }
    }
}

impl HarnessConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Invalid(format!("bad harness config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.max_steps == Some(0) {
            return Err(ConfigError::Invalid("max_steps must be at least 1".into()));
        }
        if self.max_axis_size < 2 {
            return Err(ConfigError::Invalid("max_axis_size must be at least 2".into()));
        }
        Ok(())
    }
}

/// Sweep of board sizes × algorithms × objectives with fixed seeds.
///
/// Iteration `i` uses seed `i` for every algorithm/objective pair, so all of
/// them face the same boards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkPlan {
    pub sizes: Vec<Vec<usize>>,
    pub algorithms: Vec<AlgorithmId>,
    pub objectives: Vec<TspObjective>,
    pub iterations: usize,
    pub mine_density: f64,
}

impl Default for BenchmarkPlan {
    fn default() -> Self {
        Self {
            sizes: [3, 5, 8, 10].map(|n| vec![6, n, n]).to_vec(),
            algorithms: vec![
                AlgorithmId::Greedy,
                AlgorithmId::ExactSolver,
                AlgorithmId::GlobalSat,
                AlgorithmId::PartitionedSat,
                AlgorithmId::ScipSolver,
            ],
            objectives: TspObjective::ALL.to_vec(),
            iterations: 10,
            mine_density: BENCHMARK_MINE_DENSITY,
        }
    }
}

impl BenchmarkPlan {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.mine_density > 0.0 && self.mine_density < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "mine density must be in (0, 1), got {}",
                self.mine_density
            )));
        }
        Ok(())
    }

    /// Number of games the plan plays.
    pub fn games(&self) -> usize {
        self.sizes.len() * self.algorithms.len() * self.objectives.len() * self.iterations
    }

    /// Every game of the matrix with its seed, in play order: size, then
    /// iteration, then algorithm, then objective. Mine counts follow the
    /// density, at least one.
    pub fn schedule(&self) -> Result<Vec<(BoardConfig, u64)>, ConfigError> {
        self.validate()?;
        let mut out = Vec::with_capacity(self.games());
        for dims in &self.sizes {
            let cells = cell_count(dims).ok_or_else(|| ConfigError::BoardTooLarge(dims.clone()))?;
            let mines = ((cells as f64 * self.mine_density) as usize).max(1);
            for seed in 0..self.iterations as u64 {
                for &algorithm in &self.algorithms {
                    for &objective in &self.objectives {
                        let config = BoardConfig {
                            dimensions: dims.clone(),
                            mines,
                            algorithm: algorithm.specialize_for(dims),
                            objective: Some(objective),
                        };
                        out.push((config, seed));
                    }
                }
            }
        }
        Ok(out)
    }
}
