use std::collections::BTreeMap;

use burrow_chunk::{VoxelChunk, packed};
use burrow_geom::{MeshBuild, Quad, Vec3};
use burrow_world::constants::{CHUNK_SIZE_Y, LIQUID_CHUNK_SIZE_X, LIQUID_CHUNK_SIZE_Y, LIQUID_CHUNK_SIZE_Z, LIQUID_SCALE};

use crate::face::BoxFace;

const CELL: f32 = 1.0 / LIQUID_SCALE as f32;
const LIQUID_COLOR: [u8; 4] = [255, 255, 255, 255];

/// Surface geometry of a chunk's liquid grid, one mesh per liquid type.
///
/// Every face of a liquid cell that borders a dry cell, or the chunk boundary, becomes a
/// half-unit quad. Cells are scanned only inside voxel slices that hold liquid.
pub fn build_liquid_meshes(chunk: &VoxelChunk) -> Vec<(u8, MeshBuild)> {
    let mut meshes: BTreeMap<u8, MeshBuild> = BTreeMap::new();
    let origin = chunk.id().origin().to_vec3();
    let wet = |x: i32, y: i32, z: i32| -> bool {
        if x < 0
            || y < 0
            || z < 0
            || x >= LIQUID_CHUNK_SIZE_X as i32
            || y >= LIQUID_CHUNK_SIZE_Y as i32
            || z >= LIQUID_CHUNK_SIZE_Z as i32
        {
            return false;
        }
        packed::liquid_type(chunk.data.liquid(x as usize, y as usize, z as usize)) != 0
    };

    for vy in 0..CHUNK_SIZE_Y {
        if chunk.data.liquid_present(vy) == 0 {
            continue;
        }
        for y in vy * LIQUID_SCALE..(vy + 1) * LIQUID_SCALE {
            for z in 0..LIQUID_CHUNK_SIZE_Z {
                for x in 0..LIQUID_CHUNK_SIZE_X {
                    let liquid = packed::liquid_type(chunk.data.liquid(x, y, z));
                    if liquid == 0 {
                        continue;
                    }
                    let base = origin + Vec3::new(x as f32, y as f32, z as f32) * CELL;
                    for face in BoxFace::ALL {
                        let d = face.delta();
                        if wet(x as i32 + d.x, y as i32 + d.y, z as i32 + d.z) {
                            continue;
                        }
                        let corners = face.corners().map(|(cx, cy, cz)| {
                            base + Vec3::new(f32::from(cx), f32::from(cy), f32::from(cz)) * CELL
                        });
                        let uvs = face.corners().map(|c| face.corner_uv(c));
                        meshes.entry(liquid).or_default().push_quad(&Quad {
                            corners,
                            normal: face.normal(),
                            uvs,
                            colors: [LIQUID_COLOR; 4],
                            tint: LIQUID_COLOR,
                            flip: false,
                        });
                    }
                }
            }
        }
    }
    meshes.into_iter().collect()
}
