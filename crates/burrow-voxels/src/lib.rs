//! Voxel, grass and decal type library.
#![forbid(unsafe_code)]

pub mod atlas;
pub mod config;
mod library;
pub mod types;

pub use atlas::{Atlas, AtlasTile, UvRect};
pub use library::{LibraryError, VoxelLibrary};
pub use types::{
    BoxTemplate, DecalType, FringeTiles, GrassType, MoteDetail, TransitionKind, VoxelType,
    EMPTY_VOXEL,
};
