//! Neighbor offset tables.

use crate::{GlobalVoxelCoordinate, GlobalVoxelOffset};

/// Horizontal face neighbors in the order -X, +X, -Z, +Z.
pub const MANHATTAN_2D: [GlobalVoxelOffset; 4] = [
    GlobalVoxelOffset::new(-1, 0, 0),
    GlobalVoxelOffset::new(1, 0, 0),
    GlobalVoxelOffset::new(0, 0, -1),
    GlobalVoxelOffset::new(0, 0, 1),
];

pub const DIAGONAL_2D: [GlobalVoxelOffset; 4] = [
    GlobalVoxelOffset::new(-1, 0, -1),
    GlobalVoxelOffset::new(1, 0, -1),
    GlobalVoxelOffset::new(-1, 0, 1),
    GlobalVoxelOffset::new(1, 0, 1),
];

/// All eight horizontal neighbors.
pub const ALL_2D: [GlobalVoxelOffset; 8] = [
    MANHATTAN_2D[0],
    MANHATTAN_2D[1],
    MANHATTAN_2D[2],
    MANHATTAN_2D[3],
    DIAGONAL_2D[0],
    DIAGONAL_2D[1],
    DIAGONAL_2D[2],
    DIAGONAL_2D[3],
];

pub fn manhattan_2d(v: GlobalVoxelCoordinate) -> impl Iterator<Item = GlobalVoxelCoordinate> {
    MANHATTAN_2D.into_iter().map(move |d| v + d)
}

pub fn all_2d(v: GlobalVoxelCoordinate) -> impl Iterator<Item = GlobalVoxelCoordinate> {
    ALL_2D.into_iter().map(move |d| v + d)
}
