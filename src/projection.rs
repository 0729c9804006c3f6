//! Projection of classified boards onto renderable 2-D / 3-D layouts.
//!
//! A [`ViewState`] pins some axes to fixed values; the remaining "free" axes
//! (at most three) become screen axes. Projection is a pure pass over
//! `board.cells` and never touches the board itself.
//!
//! Axis roles per topology:
//! - planar: the last two axes are drawn, a leading size-1 axis is pinned to 0
//! - dice cube: `[face, row, col]`, drawn as six faces folded into a cube
//! - generic cube and hypercube: the last three axes are drawn (x is the last
//!   axis, z the third from last); the leading axes ("high" axes, W and
//!   beyond) are pinned to one value each, 0 unless set

use std::collections::BTreeMap;
use std::f32::consts::{FRAC_PI_2, PI};
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::topology::{ClassifiedBoard, Topology, DICE_FACES};
use crate::types::{linear_index, Cell};

/// Distance a dice-face cell floats above its face plane.
pub const FACE_LIFT: f32 = 0.02;

/// Gap between consecutive layers of a layer stack, in cells.
pub const LAYER_GAP: f32 = 1.0;

// ─── View state ─────────────────────────────────────────────────────────────

/// One drawn axis held at a single index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice {
    pub axis: usize,
    pub index: usize,
}

/// User-selected view parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewState {
    pub slice: Option<Slice>,
    /// Current value of each high axis (axis index → value). Missing axes sit at 0.
    pub fixed_high_axes: BTreeMap<usize, usize>,
}

impl ViewState {
    pub fn sliced(axis: usize, index: usize) -> Self {
        Self {
            slice: Some(Slice { axis, index }),
            ..Self::default()
        }
    }

    pub fn with_high_axis(mut self, axis: usize, value: usize) -> Self {
        self.fixed_high_axes.insert(axis, value);
        self
    }

    /// Pull every index back inside `dims`.
    ///
    /// Projection itself rejects out-of-range indices; this is for UI
    /// controls that want to keep a view valid after the board changes.
    pub fn clamp_to(&mut self, dims: &[usize]) {
        if let Some(slice) = &mut self.slice {
            if let Some(&size) = dims.get(slice.axis) {
                slice.index = slice.index.min(size - 1);
            }
        }
        for (&axis, value) in self.fixed_high_axes.iter_mut() {
            if let Some(&size) = dims.get(axis) {
                *value = (*value).min(size - 1);
            }
        }
    }
}

// ─── Projected output ───────────────────────────────────────────────────────

/// Arrangement of the displayed cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Layout {
    Grid { rows: usize, cols: usize },
    Volume { x: usize, y: usize, z: usize },
    /// Six `face_size × face_size` faces folded into a closed cube.
    Cube { face_size: usize },
}

/// Integer display position of a cell within its [`Layout`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DisplayPos {
    Grid { row: usize, col: usize },
    Volume { x: usize, y: usize, z: usize },
    Face { face: usize, row: usize, col: usize },
}

/// What the player sees on a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Appearance {
    Hidden,
    Flagged,
    Revealed { adjacent: u8 },
    Mine,
}

impl Appearance {
    pub fn of(cell: &Cell) -> Self {
        match (cell.is_revealed, cell.is_mine, cell.is_flagged) {
            (true, true, _) => Appearance::Mine,
            (true, false, _) => Appearance::Revealed {
                adjacent: cell.adjacent_mines,
            },
            (false, _, true) => Appearance::Flagged,
            (false, _, false) => Appearance::Hidden,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectedCell {
    /// Position in `board.cells`.
    pub cell: usize,
    /// Full coordinate vector; this is what click/flag callbacks receive.
    pub coordinates: Vec<usize>,
    pub pos: DisplayPos,
    /// Centre of the cell in renderer space (y up, one unit per cell).
    pub world: [f32; 3],
    pub appearance: Appearance,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectedView {
    /// Shape of the projected board.
    pub dimensions: Vec<usize>,
    pub layout: Layout,
    pub view: ViewState,
    /// Axes that vary across `cells`, in screen order.
    pub free_axes: Vec<usize>,
    /// Value of every axis, `None` for free axes.
    pub pinned: Vec<Option<usize>>,
    pub cells: Vec<ProjectedCell>,
}

impl ProjectedView {
    /// Full coordinate vector shown at `pos`, computed from the view alone.
    pub fn coordinates_at(&self, pos: DisplayPos) -> Option<Vec<usize>> {
        let mut coords: Vec<usize> = self.pinned.iter().map(|p| p.unwrap_or(0)).collect();
        let free = &self.free_axes;

        match (self.layout, pos) {
            (Layout::Cube { .. }, DisplayPos::Face { face, row, col }) => {
                coords[0] = face;
                coords[1] = row;
                coords[2] = col;
            }
            (Layout::Volume { .. }, DisplayPos::Volume { x, y, z }) => {
                coords[free[0]] = x;
                coords[free[1]] = y;
                coords[free[2]] = z;
            }
            (Layout::Grid { .. }, DisplayPos::Grid { row, col }) => match free.len() {
                2 => {
                    coords[free[0]] = row;
                    coords[free[1]] = col;
                }
                1 if row == 0 => coords[free[0]] = col,
                0 if row == 0 && col == 0 => {}
                _ => return None,
            },
            _ => return None,
        }

        linear_index(&self.dimensions, &coords).map(|_| coords)
    }

    /// Position in `board.cells` of the cell shown at `pos`.
    pub fn resolve(&self, board: &ClassifiedBoard, pos: DisplayPos) -> Option<usize> {
        let coords = self.coordinates_at(pos)?;
        board.index().get(&coords)
    }
}

/// Board view handed to the renderer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state")]
pub enum BoardView {
    /// The engine has not produced a usable board.
    NoBoard { reason: String },
    Ready(ProjectedView),
}

// ─── Dice cube faces ────────────────────────────────────────────────────────

/// Placement of one dice face in renderer space.
///
/// `right`, `up` and `normal` are the face's local x, y and z axes expressed
/// in world space; `rotation` is the equivalent XYZ Euler rotation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FacePlacement {
    pub name: &'static str,
    pub right: [i8; 3],
    pub up: [i8; 3],
    pub normal: [i8; 3],
    pub rotation: [f32; 3],
}

pub const FACE_PLACEMENTS: [FacePlacement; DICE_FACES] = [
    FacePlacement { name: "front", right: [1, 0, 0], up: [0, 1, 0], normal: [0, 0, 1], rotation: [0.0, 0.0, 0.0] },
    FacePlacement { name: "back", right: [-1, 0, 0], up: [0, 1, 0], normal: [0, 0, -1], rotation: [0.0, PI, 0.0] },
    FacePlacement { name: "top", right: [1, 0, 0], up: [0, 0, -1], normal: [0, 1, 0], rotation: [-FRAC_PI_2, 0.0, 0.0] },
    FacePlacement { name: "bottom", right: [1, 0, 0], up: [0, 0, 1], normal: [0, -1, 0], rotation: [FRAC_PI_2, 0.0, 0.0] },
    FacePlacement { name: "left", right: [0, 0, 1], up: [0, 1, 0], normal: [-1, 0, 0], rotation: [0.0, -FRAC_PI_2, 0.0] },
    FacePlacement { name: "right", right: [0, 0, -1], up: [0, 1, 0], normal: [1, 0, 0], rotation: [0.0, FRAC_PI_2, 0.0] },
];

impl FacePlacement {
    /// Centre of the face in world space for a cube of side `size`.
    pub fn position(&self, size: usize) -> [f32; 3] {
        let d = size as f32 / 2.0;
        self.normal.map(|n| n as f32 * d)
    }

    fn world(&self, size: usize, row: usize, col: usize) -> [f32; 3] {
        let off = (size as f32 - 1.0) / 2.0;
        let lx = col as f32 - off;
        let ly = off - row as f32;
        let lz = size as f32 / 2.0 + FACE_LIFT;
        let mut out = [0.0f32; 3];
        for (i, o) in out.iter_mut().enumerate() {
            *o = self.right[i] as f32 * lx + self.up[i] as f32 * ly + self.normal[i] as f32 * lz;
        }
        out
    }
}

// ─── Projection ─────────────────────────────────────────────────────────────

/// Axis roles for one (topology, view) pair.
struct Frame {
    layout: Layout,
    pinned: Vec<Option<usize>>,
    free: Vec<usize>,
}

fn drawn_axes(topology: &Topology, rank: usize) -> Range<usize> {
    rank - topology.rendered_axes()..rank
}

fn frame(dims: &[usize], topology: &Topology, view: &ViewState) -> Result<Frame, ConfigError> {
    let rank = dims.len();
    let drawn = drawn_axes(topology, rank);
    let mut pinned: Vec<Option<usize>> = vec![None; rank];

    let in_range = |axis: usize, index: usize| -> Result<(), ConfigError> {
        let size = *dims.get(axis).ok_or(ConfigError::NoSuchAxis { axis, rank })?;
        if index >= size {
            return Err(ConfigError::SliceOutOfRange { axis, index, size });
        }
        Ok(())
    };

    // Axes outside the drawn range: high axes on hypercubes, the degenerate
    // leading axis on planar boards.
    for axis in (0..rank).filter(|a| !drawn.contains(a)) {
        pinned[axis] = Some(0);
    }
    for (&axis, &value) in &view.fixed_high_axes {
        in_range(axis, value)?;
        let is_high = matches!(topology, Topology::HypercubeN { .. }) && axis < drawn.start;
        if !is_high {
            return Err(ConfigError::NotAHighAxis {
                axis,
                topology: topology.name(),
            });
        }
        pinned[axis] = Some(value);
    }

    if let Some(Slice { axis, index }) = view.slice {
        in_range(axis, index)?;
        let allowed = match topology {
            Topology::DiceCube3D { .. } => axis == 0,
            _ => drawn.contains(&axis),
        };
        if !allowed {
            return Err(ConfigError::UnsupportedSlice {
                axis,
                topology: topology.name(),
            });
        }
        pinned[axis] = Some(index);
    }

    let mut free: Vec<usize> = drawn.filter(|&a| pinned[a].is_none()).collect();
    // volumes list x first, and x is the last axis
    if free.len() == 3 {
        free.reverse();
    }
    let layout = match (topology, view.slice) {
        (Topology::DiceCube3D { face_size }, None) => Layout::Cube {
            face_size: *face_size,
        },
        _ => match free.as_slice() {
            [x, y, z] => Layout::Volume {
                x: dims[*x],
                y: dims[*y],
                z: dims[*z],
            },
            [r, c] => Layout::Grid {
                rows: dims[*r],
                cols: dims[*c],
            },
            [c] => Layout::Grid { rows: 1, cols: dims[*c] },
            _ => Layout::Grid { rows: 1, cols: 1 },
        },
    };

    Ok(Frame { layout, pinned, free })
}

impl Frame {
    #[inline]
    fn matches(&self, coords: &[usize]) -> bool {
        self.pinned
            .iter()
            .zip(coords)
            .all(|(pin, &c)| pin.map_or(true, |v| v == c))
    }

    fn place(&self, coords: &[usize]) -> (DisplayPos, [f32; 3]) {
        let centred = |v: usize, extent: usize| v as f32 - (extent as f32 - 1.0) / 2.0;

        match self.layout {
            Layout::Cube { face_size } => {
                let (face, row, col) = (coords[0], coords[1], coords[2]);
                let world = FACE_PLACEMENTS[face].world(face_size, row, col);
                (DisplayPos::Face { face, row, col }, world)
            }
            Layout::Volume { x: nx, y: ny, z: nz } => {
                let (x, y, z) = (coords[self.free[0]], coords[self.free[1]], coords[self.free[2]]);
                (
                    DisplayPos::Volume { x, y, z },
                    [centred(x, nx), -centred(y, ny), centred(z, nz)],
                )
            }
            Layout::Grid { rows, cols } => {
                let (row, col) = match self.free.as_slice() {
                    [r, c] => (coords[*r], coords[*c]),
                    [c] => (0, coords[*c]),
                    _ => (0, 0),
                };
                (
                    DisplayPos::Grid { row, col },
                    [centred(col, cols), -centred(row, rows), 0.0],
                )
            }
        }
    }
}

/// Project `board` under `view`.
///
/// Every cell whose coordinates agree with all pinned axes is emitted exactly
/// once, in board order.
pub fn project(board: &ClassifiedBoard, view: &ViewState) -> Result<ProjectedView, ConfigError> {
    let frame = frame(&board.board.dimensions, &board.topology, view)?;

    let cells = board
        .board
        .cells
        .iter()
        .enumerate()
        .filter(|(_, cell)| frame.matches(&cell.coordinates))
        .map(|(i, cell)| {
            let (pos, world) = frame.place(&cell.coordinates);
            ProjectedCell {
                cell: i,
                coordinates: cell.coordinates.clone(),
                pos,
                world,
                appearance: Appearance::of(cell),
            }
        })
        .collect();

    Ok(ProjectedView {
        dimensions: board.board.dimensions.clone(),
        layout: frame.layout,
        view: view.clone(),
        free_axes: frame.free,
        pinned: frame.pinned,
        cells,
    })
}

/// Every layer along `axis`, each as a flat grid, spaced out along world z.
///
/// `base` supplies the high-axis values; its own slice is replaced per layer.
pub fn layer_stack(
    board: &ClassifiedBoard,
    axis: usize,
    base: &ViewState,
) -> Result<Vec<ProjectedView>, ConfigError> {
    let size = *board.board.dimensions.get(axis).ok_or(ConfigError::NoSuchAxis {
        axis,
        rank: board.board.dimensions.len(),
    })?;

    let mut layers = Vec::with_capacity(size);
    for index in 0..size {
        let view = ViewState {
            slice: Some(Slice { axis, index }),
            ..base.clone()
        };
        let mut layer = project(board, &view)?;
        let z = (index as f32 - (size as f32 - 1.0) / 2.0) * (1.0 + LAYER_GAP);
        for cell in &mut layer.cells {
            cell.world[2] = z;
        }
        layers.push(layer);
    }
    Ok(layers)
}

/// Counts for one value of an axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceSummary {
    pub index: usize,
    pub cells: usize,
    pub mines: usize,
    pub revealed: usize,
    pub flagged: usize,
}

/// Per-slice counts along `axis`, used for slice navigation previews.
pub fn slice_summaries(board: &ClassifiedBoard, axis: usize) -> Result<Vec<SliceSummary>, ConfigError> {
    let dims = &board.board.dimensions;
    let size = *dims.get(axis).ok_or(ConfigError::NoSuchAxis {
        axis,
        rank: dims.len(),
    })?;

    let mut out: Vec<SliceSummary> = (0..size)
        .map(|index| SliceSummary {
            index,
            ..SliceSummary::default()
        })
        .collect();
    for cell in &board.board.cells {
        let s = &mut out[cell.coordinates[axis]];
        s.cells += 1;
        s.mines += cell.is_mine as usize;
        s.revealed += cell.is_revealed as usize;
        s.flagged += cell.is_flagged as usize;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::board_for;
    use crate::types::cell_count;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn classified(dims: &[usize]) -> ClassifiedBoard {
        ClassifiedBoard::new(board_for(dims, 1)).unwrap()
    }

    fn free_product(board: &ClassifiedBoard, view: &ProjectedView) -> usize {
        view.free_axes.iter().map(|&a| board.board.dimensions[a]).product()
    }

    #[test]
    fn test_planar_is_identity() {
        let board = classified(&[9, 9]);
        let view = project(&board, &ViewState::default()).unwrap();
        assert_eq!(view.cells.len(), 81);
        assert_eq!(view.layout, Layout::Grid { rows: 9, cols: 9 });
        let c = view.cells.iter().find(|c| c.coordinates == vec![2, 7]).unwrap();
        assert_eq!(c.pos, DisplayPos::Grid { row: 2, col: 7 });
    }

    #[test]
    fn test_planar_with_leading_unit_axis() {
        let board = classified(&[1, 4, 6]);
        let view = project(&board, &ViewState::default()).unwrap();
        assert_eq!(view.cells.len(), 24);
        assert_eq!(view.layout, Layout::Grid { rows: 4, cols: 6 });
        assert_eq!(
            view.coordinates_at(DisplayPos::Grid { row: 3, col: 5 }),
            Some(vec![0, 3, 5])
        );
    }

    #[test]
    fn test_dice_faces_partition_cube() {
        let board = classified(&[6, 4, 4]);
        let view = project(&board, &ViewState::default()).unwrap();
        assert_eq!(view.layout, Layout::Cube { face_size: 4 });
        assert_eq!(view.cells.len(), 96);

        for face in 0..DICE_FACES {
            let n = view
                .cells
                .iter()
                .filter(|c| matches!(c.pos, DisplayPos::Face { face: f, .. } if f == face))
                .count();
            assert_eq!(n, 16);
        }
    }

    #[test]
    fn test_dice_faces_form_closed_cube() {
        let board = classified(&[6, 3, 3]);
        let view = project(&board, &ViewState::default()).unwrap();
        let surface = 1.5 + FACE_LIFT;

        let mut seen = HashSet::new();
        for c in &view.cells {
            let max = c.world.iter().fold(0.0f32, |m, v| m.max(v.abs()));
            assert!((max - surface).abs() < 1e-5, "{:?} is off the surface", c.world);
            let key = c.world.map(|v| (v * 1000.0).round() as i64);
            assert!(seen.insert(key), "overlap at {:?}", c.world);
        }
    }

    #[test]
    fn test_face_basis_matches_rotation() {
        for f in FACE_PLACEMENTS {
            let [rx, ry, _] = f.rotation;
            let (sx, cx) = rx.sin_cos();
            let (sy, cy) = ry.sin_cos();
            // local +z under Rx·Ry
            let z = [sy, -sx * cy, cx * cy];
            for i in 0..3 {
                assert!((z[i] - f.normal[i] as f32).abs() < 1e-6, "{} normal", f.name);
            }
        }
    }

    #[test]
    fn test_dice_single_face_slice() {
        let board = classified(&[6, 4, 4]);
        let view = project(&board, &ViewState::sliced(0, 2)).unwrap();
        assert_eq!(view.layout, Layout::Grid { rows: 4, cols: 4 });
        assert!(view.cells.iter().all(|c| c.coordinates[0] == 2));
        assert_eq!(view.cells.len(), 16);

        assert_eq!(
            project(&board, &ViewState::sliced(1, 0)).unwrap_err(),
            ConfigError::UnsupportedSlice { axis: 1, topology: "dice-cube-3d" }
        );
    }

    #[test]
    fn test_generic_cube_full_and_layer() {
        let board = classified(&[5, 5, 5]);
        let full = project(&board, &ViewState::default()).unwrap();
        assert_eq!(full.layout, Layout::Volume { x: 5, y: 5, z: 5 });
        assert_eq!(full.cells.len(), 125);

        let layer = project(&board, &ViewState::sliced(2, 3)).unwrap();
        assert_eq!(layer.layout, Layout::Grid { rows: 5, cols: 5 });
        assert_eq!(layer.free_axes, vec![0, 1]);
        assert!(layer.cells.iter().all(|c| c.coordinates[2] == 3));
    }

    #[test]
    fn test_layer_stack_covers_every_cell_once() {
        let board = classified(&[4, 4, 4]);
        let layers = layer_stack(&board, 1, &ViewState::default()).unwrap();
        assert_eq!(layers.len(), 4);

        let all: HashSet<usize> = layers.iter().flat_map(|l| l.cells.iter().map(|c| c.cell)).collect();
        assert_eq!(all.len(), 64);
        assert!(layers[0].cells[0].world[2] < layers[3].cells[0].world[2]);
    }

    #[test]
    fn test_hypercube_pins_high_axes() {
        // [w, z, y, x]
        let board = classified(&[4, 2, 3, 5]);
        let view = project(&board, &ViewState::default().with_high_axis(0, 2)).unwrap();
        assert_eq!(view.layout, Layout::Volume { x: 5, y: 3, z: 2 });
        assert_eq!(view.free_axes, vec![3, 2, 1]);
        assert_eq!(view.cells.len(), 30);
        assert!(view.cells.iter().all(|c| c.coordinates[0] == 2));

        let c = view.cells.iter().find(|c| c.coordinates == vec![2, 1, 0, 4]).unwrap();
        assert_eq!(c.pos, DisplayPos::Volume { x: 4, y: 0, z: 1 });

        // unset high axes sit at 0
        let view = project(&board, &ViewState::default()).unwrap();
        assert!(view.cells.iter().all(|c| c.coordinates[0] == 0));
    }

    #[test]
    fn test_hypercube_five_axes_with_slice() {
        let board = classified(&[2, 3, 3, 4, 2]);
        let view = ViewState::sliced(2, 1).with_high_axis(0, 1).with_high_axis(1, 2);
        let out = project(&board, &view).unwrap();
        assert_eq!(out.layout, Layout::Grid { rows: 4, cols: 2 });
        assert_eq!(out.free_axes, vec![3, 4]);
        assert_eq!(out.cells.len(), 8);
        for c in &out.cells {
            assert_eq!((c.coordinates[0], c.coordinates[1], c.coordinates[2]), (1, 2, 1));
        }
    }

    #[test]
    fn test_out_of_range_is_rejected_not_clamped() {
        let board = classified(&[4, 4, 4, 4]);
        assert_eq!(
            project(&board, &ViewState::default().with_high_axis(0, 4)).unwrap_err(),
            ConfigError::SliceOutOfRange { axis: 0, index: 4, size: 4 }
        );
        assert_eq!(
            project(&board, &ViewState::sliced(1, 9)).unwrap_err(),
            ConfigError::SliceOutOfRange { axis: 1, index: 9, size: 4 }
        );
        assert_eq!(
            project(&board, &ViewState::default().with_high_axis(1, 0)).unwrap_err(),
            ConfigError::NotAHighAxis { axis: 1, topology: "hypercube-n" }
        );
        assert_eq!(
            project(&board, &ViewState::sliced(0, 0)).unwrap_err(),
            ConfigError::UnsupportedSlice { axis: 0, topology: "hypercube-n" }
        );
        assert_eq!(
            project(&board, &ViewState::sliced(7, 0)).unwrap_err(),
            ConfigError::NoSuchAxis { axis: 7, rank: 4 }
        );
    }

    #[test]
    fn test_clamp_to_keeps_view_valid() {
        let board = classified(&[3, 3, 3, 3]);
        let mut view = ViewState::sliced(3, 8).with_high_axis(0, 5);
        view.clamp_to(&board.board.dimensions);
        assert_eq!(view.slice, Some(Slice { axis: 3, index: 2 }));
        assert_eq!(view.fixed_high_axes[&0], 2);
        assert!(project(&board, &view).is_ok());
    }

    #[test]
    fn test_projection_does_not_mutate_board() {
        let board = classified(&[3, 3, 3, 3]);
        let before = board.board.clone();
        for w in 0..3 {
            project(&board, &ViewState::sliced(2, 1).with_high_axis(0, w)).unwrap();
        }
        assert_eq!(board.board, before);
    }

    #[test]
    fn test_resolve_uses_index() {
        let mut raw = board_for(&[2, 4, 4, 4], 3);
        raw.cells.reverse();
        let board = ClassifiedBoard::new(raw).unwrap();
        let view = project(&board, &ViewState::default().with_high_axis(0, 1)).unwrap();
        for c in &view.cells {
            assert_eq!(view.resolve(&board, c.pos), Some(c.cell));
        }
        assert_eq!(view.resolve(&board, DisplayPos::Volume { x: 4, y: 0, z: 0 }), None);
        assert_eq!(view.resolve(&board, DisplayPos::Grid { row: 0, col: 0 }), None);
    }

    #[test]
    fn test_slice_summaries_along_w() {
        let board = classified(&[3, 2, 2, 2]);
        let summaries = slice_summaries(&board, 0).unwrap();
        assert_eq!(summaries.len(), 3);
        assert!(summaries.iter().all(|s| s.cells == 8));
        assert_eq!(summaries.iter().map(|s| s.mines).sum::<usize>(), 1);
        assert_eq!(summaries[2].mines, 1);
    }

    #[test]
    fn test_appearance() {
        let mut cell = board_for(&[2, 2], 1).cells[3].clone();
        assert_eq!(Appearance::of(&cell), Appearance::Hidden);
        cell.is_flagged = true;
        assert_eq!(Appearance::of(&cell), Appearance::Flagged);
        cell.is_revealed = true;
        assert_eq!(Appearance::of(&cell), Appearance::Mine);
    }

    fn dims_strategy() -> impl Strategy<Value = Vec<usize>> {
        prop_oneof![
            prop::collection::vec(2usize..7, 2),
            (2usize..5).prop_map(|n| vec![6, n, n]),
            (2usize..5).prop_map(|n| vec![n, n, n]),
            prop::collection::vec(2usize..4, 4..6),
        ]
    }

    proptest! {
        #[test]
        fn prop_unfiltered_projection_covers_board(dims in dims_strategy()) {
            let board = classified(&dims);
            // pin nothing beyond the defaults; high axes sit at 0
            let view = project(&board, &ViewState::default()).unwrap();
            prop_assert_eq!(view.cells.len(), free_product(&board, &view));
            if dims.len() <= 3 {
                prop_assert_eq!(Some(view.cells.len()), cell_count(&dims));
            }
            for c in &view.cells {
                prop_assert!(c.coordinates.iter().zip(&dims).all(|(&x, &d)| x < d));
            }
        }

        #[test]
        fn prop_round_trip(dims in dims_strategy(), seed in 0usize..1000) {
            let board = classified(&dims);
            let mut view = ViewState::default();
            if dims.len() > 3 {
                for axis in 0..dims.len() - 3 {
                    view.fixed_high_axes.insert(axis, seed % dims[axis]);
                }
            }
            let out = project(&board, &view).unwrap();
            let unique: HashSet<usize> = out.cells.iter().map(|c| c.cell).collect();
            prop_assert_eq!(unique.len(), out.cells.len());
            for c in &out.cells {
                prop_assert_eq!(out.coordinates_at(c.pos), Some(c.coordinates.clone()));
                prop_assert_eq!(&board.board.cells[c.cell].coordinates, &c.coordinates);
            }
        }

        #[test]
        fn prop_slices_partition_board(n in 2usize..5, axis in 0usize..3) {
            let board = classified(&[n, n, n]);
            let total: usize = (0..n)
                .map(|i| project(&board, &ViewState::sliced(axis, i)).unwrap().cells.len())
                .sum();
            prop_assert_eq!(total, n * n * n);
        }
    }
}
