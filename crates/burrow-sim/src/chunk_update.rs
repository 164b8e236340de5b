use std::sync::Arc;
use std::time::Instant;

use burrow_chunk::{VoxelAccess, VoxelChunk, VoxelHandle, VoxelSample};
use burrow_voxels::VoxelLibrary;
use burrow_world::constants::CHUNK_SIZE_Y;
use burrow_world::neighbors::manhattan_2d;
use burrow_world::{GlobalVoxelCoordinate, GlobalVoxelOffset, LocalVoxelCoordinate};

use crate::hooks::VoxelUpdateHooks;
use crate::world::WorldContext;

/// Counters for one chunk tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateStats {
    pub visited: usize,
    pub hooks_run: usize,
    pub grass_removed: usize,
    pub grass_decayed: usize,
    pub grass_spread: usize,
}

/// Everything one simulation tick reads besides the chunk itself.
pub struct ChunkUpdate<'a> {
    pub library: &'a VoxelLibrary,
    pub hooks: &'a VoxelUpdateHooks,
    pub world: &'a dyn WorldContext,
    /// Neighbor voxels, including those across chunk borders.
    pub access: &'a dyn VoxelAccess,
    pub grass_spread_chance: f32,
}

struct Spread {
    local: LocalVoxelCoordinate,
    grass: u8,
}

impl ChunkUpdate<'_> {
    /// Advances half of `chunk`'s voxels by one tick.
    ///
    /// The half alternates with the chunk's pass counter. Grass spreads found during the
    /// scan are applied afterwards, so freshly grown grass never spreads in the same tick.
    pub fn update_chunk(&self, chunk: &Arc<VoxelChunk>, rng: &mut fastrand::Rng) -> UpdateStats {
        let started = Instant::now();
        let pass = chunk.next_update_pass() as usize;
        let mut stats = UpdateStats::default();
        let mut spreads = Vec::new();

        for y in 0..CHUNK_SIZE_Y {
            if chunk.data.voxels_present_in_slice(y) == 0 {
                continue;
            }
            for local in LocalVoxelCoordinate::slice(y) {
                if (usize::from(local.x) + usize::from(local.z) + pass) % 2 != 0 {
                    continue;
                }
                if chunk.data.type_at(local) == 0 {
                    continue;
                }
                stats.visited += 1;
                let handle = VoxelHandle::new(Arc::clone(chunk), local);
                self.run_hook(&handle, &mut stats);
                let here = handle.sample();
                if here.is_empty() {
                    continue;
                }
                if here.grass_type() != 0 {
                    self.age_grass(&handle, here, &mut stats);
                } else if let Some(grass) = self.pick_spread(handle.coordinate(), here, rng) {
                    spreads.push(Spread { local, grass });
                }
            }
        }

        for spread in spreads {
            if self.apply_spread(chunk, &spread) {
                stats.grass_spread += 1;
            }
        }

        log::trace!(
            target: "perf",
            "us chunk_update={} chunk={:?} visited={} spread={}",
            started.elapsed().as_micros(),
            chunk.id(),
            stats.visited,
            stats.grass_spread
        );
        stats
    }

    fn run_hook(&self, handle: &VoxelHandle, stats: &mut UpdateStats) {
        let Some(name) = self
            .library
            .voxel_type(handle.type_id())
            .and_then(|t| t.update_hook.as_deref())
        else {
            return;
        };
        if self.hooks.try_invoke(name, handle, self.world) {
            stats.hooks_run += 1;
        }
    }

    fn age_grass(&self, handle: &VoxelHandle, here: VoxelSample, stats: &mut UpdateStats) {
        let Some(grass) = self.library.grass_type(here.grass_type()) else {
            return;
        };
        if grass.needs_sunlight && !here.sunlight() {
            handle.set_grass_type(0);
            handle.set_grass_decay(0);
            stats.grass_removed += 1;
            return;
        }
        if !grass.decays {
            return;
        }
        let remaining = here.grass_decay().saturating_sub(1);
        if remaining > 0 {
            handle.set_grass_decay(remaining);
            return;
        }
        match grass.becomes_when_decays.and_then(|id| self.library.grass_type(id)) {
            Some(next) => {
                handle.set_grass_type(next.id);
                handle.set_grass_decay(next.initial_decay);
                stats.grass_decayed += 1;
            }
            None => {
                handle.set_grass_type(0);
                handle.set_grass_decay(0);
                stats.grass_removed += 1;
            }
        }
    }

    fn pick_spread(&self, coord: GlobalVoxelCoordinate, here: VoxelSample, rng: &mut fastrand::Rng) -> Option<u8> {
        let accepts = self
            .library
            .voxel_type(here.type_id)
            .is_some_and(|t| t.grass_spreads_here);
        if !accepts {
            return None;
        }
        let covered = self
            .access
            .sample(coord + GlobalVoxelOffset::UP)
            .is_some_and(|above| !above.is_empty());
        if covered {
            return None;
        }
        let biome = self.world.biome_at(coord.x, coord.z);
        let mut candidates = [0u8; 4];
        let mut n = 0;
        for neighbor in manhattan_2d(coord) {
            let Some(s) = self.access.sample(neighbor) else {
                continue;
            };
            let spreads = self.library.grass_type(s.grass_type()).is_some_and(|g| g.spreads);
            if spreads && self.world.biome_at(neighbor.x, neighbor.z) == biome {
                candidates[n] = s.grass_type();
                n += 1;
            }
        }
        if n == 0 || rng.f32() >= self.grass_spread_chance {
            return None;
        }
        Some(candidates[rng.usize(..n)])
    }

    fn apply_spread(&self, chunk: &Arc<VoxelChunk>, spread: &Spread) -> bool {
        let Some(grass) = self.library.grass_type(spread.grass) else {
            return false;
        };
        let handle = VoxelHandle::new(Arc::clone(chunk), spread.local);
        if handle.is_empty() || handle.grass_type() != 0 {
            return false;
        }
        if grass.needs_sunlight && !handle.sunlight() {
            return false;
        }
        handle.set_grass_type(grass.id);
        handle.set_grass_decay(grass.initial_decay);
        true
    }
}
