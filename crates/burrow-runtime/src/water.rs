use burrow_chunk::{VoxelChunk, packed};
use burrow_world::LocalVoxelCoordinate;
use burrow_world::constants::{LIQUID_CHUNK_CELL_COUNT, LIQUID_CHUNK_SIZE_X, LIQUID_CHUNK_SIZE_Y, LIQUID_CHUNK_SIZE_Z, LIQUID_SCALE};

/// Outcome of one liquid step over a chunk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WaterStats {
    /// Cells that moved inside the chunk.
    pub moved: usize,
    /// Cells that fell into the chunk below.
    pub fell_out: usize,
}

impl WaterStats {
    pub fn changed(&self) -> bool {
        self.moved > 0 || self.fell_out > 0
    }
}

const SIDEWAYS: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

// Liquid never enters a cell whose voxel is solid.
fn open(chunk: &VoxelChunk, x: usize, y: usize, z: usize) -> bool {
    let voxel = LocalVoxelCoordinate::new(x / LIQUID_SCALE, y / LIQUID_SCALE, z / LIQUID_SCALE);
    chunk.data.type_at(voxel) == 0 && packed::liquid_type(chunk.data.liquid(x, y, z)) == 0
}

/// Advances the liquid cells of `chunk` by one step.
///
/// Each cell falls into an open cell below, crossing into `below` from the bottom row, or
/// otherwise moves to a random open horizontal neighbor with probability `spread_chance`.
/// Ocean cells never move. Cells are visited bottom-up and move at most once per step, so
/// the amount of liquid is conserved.
pub fn step_liquids(
    chunk: &VoxelChunk,
    below: Option<&VoxelChunk>,
    spread_chance: f32,
    rng: &mut fastrand::Rng,
) -> WaterStats {
    let mut stats = WaterStats::default();
    if !chunk.data.has_liquid() {
        return stats;
    }
    let mut settled = vec![false; LIQUID_CHUNK_CELL_COUNT];
    let index = |x: usize, y: usize, z: usize| burrow_chunk::liquid_index(x, y, z);

    for y in 0..LIQUID_CHUNK_SIZE_Y {
        if chunk.data.liquid_present(y / LIQUID_SCALE) == 0 {
            continue;
        }
        for z in 0..LIQUID_CHUNK_SIZE_Z {
            for x in 0..LIQUID_CHUNK_SIZE_X {
                let cell = chunk.data.liquid(x, y, z);
                if packed::liquid_type(cell) == 0 || packed::ocean(cell) || settled[index(x, y, z)] {
                    continue;
                }

                if y > 0 {
                    if open(chunk, x, y - 1, z) {
                        chunk.data.set_liquid(x, y, z, 0);
                        chunk.data.set_liquid(x, y - 1, z, cell);
                        settled[index(x, y - 1, z)] = true;
                        stats.moved += 1;
                        continue;
                    }
                } else if let Some(below) = below {
                    let top = LIQUID_CHUNK_SIZE_Y - 1;
                    if open(below, x, top, z) {
                        chunk.data.set_liquid(x, y, z, 0);
                        below.data.set_liquid(x, top, z, cell);
                        stats.fell_out += 1;
                        continue;
                    }
                }

                if rng.f32() >= spread_chance {
                    continue;
                }
                let mut targets = [(0usize, 0usize); 4];
                let mut n = 0;
                for (dx, dz) in SIDEWAYS {
                    let (tx, tz) = (x as i32 + dx, z as i32 + dz);
                    if tx < 0 || tz < 0 || tx >= LIQUID_CHUNK_SIZE_X as i32 || tz >= LIQUID_CHUNK_SIZE_Z as i32 {
                        continue;
                    }
                    let (tx, tz) = (tx as usize, tz as usize);
                    if open(chunk, tx, y, tz) {
                        targets[n] = (tx, tz);
                        n += 1;
                    }
                }
                if n == 0 {
                    continue;
                }
                let (tx, tz) = targets[rng.usize(..n)];
                chunk.data.set_liquid(x, y, z, 0);
                chunk.data.set_liquid(tx, y, tz, cell);
                settled[index(tx, y, tz)] = true;
                stats.moved += 1;
            }
        }
    }
    stats
}
