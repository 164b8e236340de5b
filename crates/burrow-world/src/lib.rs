//! Voxel and chunk coordinate spaces, selection IDs and fixed world constants.
#![forbid(unsafe_code)]

pub mod constants;
mod coords;
pub mod neighbors;
mod selection;

pub use coords::{GlobalChunkCoordinate, GlobalVoxelCoordinate, GlobalVoxelOffset, LocalVoxelCoordinate};
pub use selection::{selection_id, try_voxel_from_selection_id};
