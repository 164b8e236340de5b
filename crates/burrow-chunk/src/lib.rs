//! Chunk voxel storage, packed voxel fields and the chunk object that owns cached meshes.
#![forbid(unsafe_code)]

mod chunk;
mod data;
mod handle;
pub mod packed;
mod ramp;
mod sample;

pub use chunk::{
    ChunkNotifier, ChunkPrimitive, DynamicLight, GpuMesh, GraphicsDevice, MoteInstance,
    SliceMesher, VoxelChangeEvent, VoxelChangeKind, VoxelChunk,
};
pub use data::{VoxelData, liquid_index};
pub use handle::VoxelHandle;
pub use ramp::{CORNERS, RampType};
pub use sample::{NeighborLookup, VoxelAccess, VoxelSample};
