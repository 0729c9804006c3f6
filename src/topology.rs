//! Dimension classification.
//!
//! Maps a dimension vector to the board family it describes. Classification
//! happens once per received snapshot ([`ClassifiedBoard::new`]) and the
//! resulting [`Topology`] is carried alongside the board from then on.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SimError};
use crate::types::{cell_count, linear_index, Board, Cell};

/// Number of faces on a dice cube.
pub const DICE_FACES: usize = 6;

/// Board shape family.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Topology {
    Planar2D { width: usize, height: usize },
    DiceCube3D { face_size: usize },
    GenericCube3D { size: usize },
    HypercubeN { dims: Vec<usize> },
}

impl Topology {
    /// Number of axes drawn without slicing (2 for planar, 3 otherwise).
    pub fn rendered_axes(&self) -> usize {
        match self {
            Topology::Planar2D { .. } => 2,
            _ => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Topology::Planar2D { .. } => "planar-2d",
            Topology::DiceCube3D { .. } => "dice-cube-3d",
            Topology::GenericCube3D { .. } => "generic-cube-3d",
            Topology::HypercubeN { .. } => "hypercube-n",
        }
    }
}

/// Classify a dimension vector.
///
/// Rules, in order:
/// - 2 axes: planar, `width = dims[1]`, `height = dims[0]`
/// - 3 axes with a leading 1: planar over the last two axes
/// - 3 axes with a leading 6: dice cube, faces must be square
/// - 3 axes otherwise: generic cube, all sides equal
/// - 4+ axes: hypercube
pub fn classify(dims: &[usize]) -> Result<Topology, ConfigError> {
    if dims.len() < 2 {
        return Err(ConfigError::TooFewAxes(dims.len()));
    }

    let dims = normalize_leading_axis(dims);
    for (axis, &size) in dims.iter().enumerate() {
        if size < 2 {
            return Err(ConfigError::AxisTooSmall { axis, size });
        }
    }

    match dims.len() {
        2 => Ok(Topology::Planar2D {
            width: dims[1],
            height: dims[0],
        }),
        3 if dims[0] == DICE_FACES => {
            if dims[1] != dims[2] {
                return Err(ConfigError::DiceFaceNotSquare {
                    rows: dims[1],
                    cols: dims[2],
                });
            }
            Ok(Topology::DiceCube3D { face_size: dims[1] })
        }
        3 => {
            if dims[1] != dims[0] || dims[2] != dims[0] {
                return Err(ConfigError::NonCubic(dims.to_vec()));
            }
            Ok(Topology::GenericCube3D { size: dims[0] })
        }
        _ => Ok(Topology::HypercubeN { dims: dims.to_vec() }),
    }
}

/// Strip a degenerate leading axis from a 3-axis vector (`[1, h, w]` → `[h, w]`).
/// Every other vector is returned unchanged.
pub fn normalize_leading_axis(dims: &[usize]) -> &[usize] {
    if dims.len() == 3 && dims[0] == 1 {
        &dims[1..]
    } else {
        dims
    }
}

/// Classify `dims` and enforce the per-axis size limit used for new boards.
pub fn check_shape(dims: &[usize], max_axis: usize) -> Result<Topology, ConfigError> {
    let topology = classify(dims)?;
    for (axis, &size) in dims.iter().enumerate() {
        if size > max_axis {
            return Err(ConfigError::AxisTooLarge {
                axis,
                size,
                max: max_axis,
            });
        }
    }
    if cell_count(dims).is_none() {
        return Err(ConfigError::BoardTooLarge(dims.to_vec()));
    }
    Ok(topology)
}

// ─── Classified boards ──────────────────────────────────────────────────────

/// Row-major slot → position in `board.cells`.
///
/// Built once per snapshot so coordinate lookups are O(1) regardless of the
/// order in which the engine emitted its cells.
#[derive(Clone, Debug)]
pub struct CoordinateIndex {
    dims: Vec<usize>,
    slots: Vec<u32>,
}

const EMPTY_SLOT: u32 = u32::MAX;

impl CoordinateIndex {
    fn build(board: &Board) -> Result<Self, SimError> {
        let dims = board.dimensions.clone();
        let mut slots = vec![EMPTY_SLOT; board.cells.len()];

        for (pos, cell) in board.cells.iter().enumerate() {
            let slot = linear_index(&dims, &cell.coordinates).ok_or_else(|| {
                SimError::MalformedState(format!(
                    "cell {:?} lies outside board {:?}",
                    cell.coordinates, dims
                ))
            })?;
            if slots[slot] != EMPTY_SLOT {
                return Err(SimError::MalformedState(format!(
                    "duplicate cell at {:?}",
                    cell.coordinates
                )));
            }
            slots[slot] = pos as u32;
        }

        Ok(Self { dims, slots })
    }

    /// Position in `board.cells` of the cell at `coords`.
    #[inline]
    pub fn get(&self, coords: &[usize]) -> Option<usize> {
        let slot = linear_index(&self.dims, coords)?;
        match self.slots[slot] {
            EMPTY_SLOT => None,
            pos => Some(pos as usize),
        }
    }
}

/// A validated board together with its topology.
#[derive(Clone, Debug)]
pub struct ClassifiedBoard {
    pub board: Board,
    pub topology: Topology,
    index: CoordinateIndex,
}

impl ClassifiedBoard {
    /// Classify and validate a snapshot.
    ///
    /// Rejects boards whose cell list does not exactly tile the declared shape.
    pub fn new(board: Board) -> Result<Self, SimError> {
        let topology = classify(&board.dimensions)?;
        let expected = cell_count(&board.dimensions).ok_or_else(|| {
            SimError::MalformedState(format!("board {:?} has more cells than can be addressed", board.dimensions))
        })?;
        if board.cells.len() != expected {
            return Err(SimError::MalformedState(format!(
                "board {:?} should have {} cells, snapshot has {}",
                board.dimensions,
                expected,
                board.cells.len()
            )));
        }
        let index = CoordinateIndex::build(&board)?;
        Ok(Self {
            board,
            topology,
            index,
        })
    }

    pub fn index(&self) -> &CoordinateIndex {
        &self.index
    }

    pub fn cell_at(&self, coords: &[usize]) -> Option<&Cell> {
        self.index.get(coords).map(|pos| &self.board.cells[pos])
    }
}
