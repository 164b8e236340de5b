use burrow_chunk::VoxelChunk;
use burrow_world::constants::{CHUNK_VOXEL_COUNT, LIQUID_CHUNK_CELL_COUNT, LIQUID_CHUNK_SIZE_X, LIQUID_CHUNK_SIZE_Z};
use burrow_world::{GlobalChunkCoordinate, LocalVoxelCoordinate};

use crate::manager::ChunkManagerError;

/// One chunk as stored by a save file.
pub trait ChunkFile {
    fn id(&self) -> GlobalChunkCoordinate;
    fn to_chunk(&self) -> Result<VoxelChunk, ChunkManagerError>;
}

/// In-memory copy of every packed byte of a chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkRecord {
    pub id: GlobalChunkCoordinate,
    pub types: Box<[u8]>,
    pub grass: Box<[u8]>,
    pub decals: Box<[u8]>,
    pub flags: Box<[u8]>,
    pub liquid: Box<[u8]>,
}

fn liquid_cell(i: usize) -> (usize, usize, usize) {
    let plane = LIQUID_CHUNK_SIZE_X * LIQUID_CHUNK_SIZE_Z;
    (i % LIQUID_CHUNK_SIZE_X, i / plane, (i % plane) / LIQUID_CHUNK_SIZE_X)
}

impl ChunkRecord {
    fn check_lengths(&self) -> Result<(), ChunkManagerError> {
        let fields: [(&'static str, &[u8], usize); 5] = [
            ("type", &self.types, CHUNK_VOXEL_COUNT),
            ("grass", &self.grass, CHUNK_VOXEL_COUNT),
            ("decal", &self.decals, CHUNK_VOXEL_COUNT),
            ("flag", &self.flags, CHUNK_VOXEL_COUNT),
            ("liquid", &self.liquid, LIQUID_CHUNK_CELL_COUNT),
        ];
        for (field, bytes, expected) in fields {
            if bytes.len() != expected {
                return Err(ChunkManagerError::CorruptRecord {
                    coord: self.id,
                    field,
                    len: bytes.len(),
                    expected,
                });
            }
        }
        Ok(())
    }

    pub fn capture(chunk: &VoxelChunk) -> Self {
        let voxels = || (0..CHUNK_VOXEL_COUNT).map(LocalVoxelCoordinate::from_index);
        let d = &chunk.data;
        Self {
            id: chunk.id(),
            types: voxels().map(|l| d.type_at(l)).collect(),
            grass: voxels().map(|l| d.grass(l)).collect(),
            decals: voxels().map(|l| d.decal(l)).collect(),
            flags: voxels().map(|l| d.flags(l)).collect(),
            liquid: (0..LIQUID_CHUNK_CELL_COUNT)
                .map(|i| {
                    let (x, y, z) = liquid_cell(i);
                    d.liquid(x, y, z)
                })
                .collect(),
        }
    }
}

impl ChunkFile for ChunkRecord {
    fn id(&self) -> GlobalChunkCoordinate {
        self.id
    }

    fn to_chunk(&self) -> Result<VoxelChunk, ChunkManagerError> {
        self.check_lengths()?;
        let chunk = VoxelChunk::new(self.id);
        let d = &chunk.data;
        for i in 0..CHUNK_VOXEL_COUNT {
            let l = LocalVoxelCoordinate::from_index(i);
            d.set_type(l, self.types[i]);
            d.update_grass(l, |_| self.grass[i]);
            d.update_decal(l, |_| self.decals[i]);
            d.update_flags(l, |_| self.flags[i]);
        }
        for (i, &b) in self.liquid.iter().enumerate() {
            if b != 0 {
                let (x, y, z) = liquid_cell(i);
                d.set_liquid(x, y, z, b);
            }
        }
        Ok(chunk)
    }
}
