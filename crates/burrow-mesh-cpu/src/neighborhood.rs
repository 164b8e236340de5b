use std::sync::Arc;

use burrow_chunk::{NeighborLookup, VoxelAccess, VoxelChunk, VoxelHandle, VoxelSample};
use burrow_world::{GlobalChunkCoordinate, GlobalVoxelCoordinate};

/// A chunk together with the 26 chunks around it, resolved once per build so voxel reads
/// near the borders do not go back to the chunk map.
pub struct ChunkNeighborhood {
    center: Arc<VoxelChunk>,
    slots: [Option<Arc<VoxelChunk>>; 27],
}

#[inline]
fn slot(dx: i32, dy: i32, dz: i32) -> usize {
    ((dy + 1) * 9 + (dz + 1) * 3 + (dx + 1)) as usize
}

impl ChunkNeighborhood {
    /// `fetch` returns the loaded chunk at a coordinate, if any. The center is always present.
    pub fn gather(
        center: Arc<VoxelChunk>,
        fetch: impl Fn(GlobalChunkCoordinate) -> Option<Arc<VoxelChunk>>,
    ) -> Self {
        let id = center.id();
        let mut slots: [Option<Arc<VoxelChunk>>; 27] = core::array::from_fn(|_| None);
        for dy in -1..=1 {
            for dz in -1..=1 {
                for dx in -1..=1 {
                    slots[slot(dx, dy, dz)] = if (dx, dy, dz) == (0, 0, 0) {
                        Some(Arc::clone(&center))
                    } else {
                        fetch(id.offset(dx, dy, dz))
                    };
                }
            }
        }
        Self { center, slots }
    }

    #[inline]
    pub fn center(&self) -> &Arc<VoxelChunk> {
        &self.center
    }

    pub fn chunk_at(&self, chunk: GlobalChunkCoordinate) -> Option<&Arc<VoxelChunk>> {
        let id = self.center.id();
        let (dx, dy, dz) = (chunk.x - id.x, chunk.y - id.y, chunk.z - id.z);
        if dx.abs() > 1 || dy.abs() > 1 || dz.abs() > 1 {
            return None;
        }
        self.slots[slot(dx, dy, dz)].as_ref()
    }

    /// Horizontally adjacent chunks that are loaded.
    pub fn horizontal_neighbors(&self) -> impl Iterator<Item = &Arc<VoxelChunk>> {
        (-1..=1)
            .flat_map(|dz| (-1..=1).map(move |dx| (dx, dz)))
            .filter(|&d| d != (0, 0))
            .filter_map(|(dx, dz)| self.slots[slot(dx, 0, dz)].as_ref())
    }
}

impl NeighborLookup for ChunkNeighborhood {
    #[inline]
    fn sample(&self, coord: GlobalVoxelCoordinate) -> Option<VoxelSample> {
        self.chunk_at(coord.chunk())
            .map(|c| c.data.sample(coord.local()))
    }
}

impl VoxelAccess for ChunkNeighborhood {
    fn handle(&self, coord: GlobalVoxelCoordinate) -> Option<VoxelHandle> {
        self.chunk_at(coord.chunk())
            .map(|c| VoxelHandle::new(Arc::clone(c), coord.local()))
    }
}
