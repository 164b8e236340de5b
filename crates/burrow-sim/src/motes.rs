use std::sync::{Arc, PoisonError, RwLock};

use burrow_chunk::{MoteInstance, NeighborLookup, VoxelChunk};
use burrow_geom::Vec3;
use burrow_voxels::VoxelLibrary;
use burrow_world::constants::CHUNK_SIZE_Y;
use burrow_world::{GlobalVoxelCoordinate, GlobalVoxelOffset, LocalVoxelCoordinate};
use fastnoise_lite::{FastNoiseLite, NoiseType};

// Maximum horizontal offset of a mote from its voxel's center.
const JITTER: f32 = 0.35;
const JITTER_FREQUENCY: f32 = 3.7;
// Keeps the noise fields of different details of one grass apart.
const DETAIL_SALT: f32 = 311.7;

/// Noise source for decorative grass sprites.
///
/// Lives for the life of the engine: `init` seeds it, `shutdown` drops it. While shut
/// down every slice generates no motes.
#[derive(Default)]
pub struct MoteGenerator {
    noise: RwLock<Option<FastNoiseLite>>,
}

impl MoteGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&self, seed: i32) {
        let mut noise = FastNoiseLite::with_seed(seed);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(1.0));
        *self.noise.write().unwrap_or_else(PoisonError::into_inner) = Some(noise);
        log::info!("mote generator initialised (seed {})", seed);
    }

    pub fn shutdown(&self) {
        self.noise.write().unwrap_or_else(PoisonError::into_inner).take();
    }

    pub fn is_active(&self) -> bool {
        self.noise.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Motes standing on slice `y` of `chunk`.
    ///
    /// Only explored, grassy voxels with nothing on top qualify. Each mote detail of the
    /// grass spawns where its noise field exceeds the detail's threshold, and grows
    /// towards the maximum scale the further above the threshold the sample lies.
    pub fn generate_slice(
        &self,
        chunk: &VoxelChunk,
        y: usize,
        lookup: &dyn NeighborLookup,
        library: &VoxelLibrary,
    ) -> Vec<MoteInstance> {
        let guard = self.noise.read().unwrap_or_else(PoisonError::into_inner);
        let Some(noise) = guard.as_ref() else {
            return Vec::new();
        };
        let mut motes = Vec::new();
        if chunk.data.voxels_present_in_slice(y) == 0 {
            return motes;
        }
        for local in LocalVoxelCoordinate::slice(y) {
            let here = chunk.data.sample(local);
            if here.is_empty() || !here.explored() {
                continue;
            }
            let Some(grass) = library.grass_type(here.grass_type()) else {
                continue;
            };
            let coord = GlobalVoxelCoordinate::from_chunk_local(chunk.id(), local);
            let covered = lookup
                .sample(coord + GlobalVoxelOffset::UP)
                .is_some_and(|above| !above.is_empty());
            if covered {
                continue;
            }
            let (x, vy, z) = (coord.x as f32, coord.y as f32, coord.z as f32);
            for (i, detail) in grass.motes.iter().enumerate() {
                let salt = i as f32 * DETAIL_SALT;
                let f = detail.frequency;
                let value = (noise.get_noise_3d(x * f + salt, vy * f, z * f) + 1.0) * 0.5;
                if value <= detail.spawn_threshold {
                    continue;
                }
                let headroom = (1.0 - detail.spawn_threshold).max(f32::EPSILON);
                let t = ((value - detail.spawn_threshold) / headroom).clamp(0.0, 1.0);
                let jx = noise.get_noise_2d(x * JITTER_FREQUENCY + salt, z * JITTER_FREQUENCY) * JITTER;
                let jz = noise.get_noise_2d(z * JITTER_FREQUENCY - salt, x * JITTER_FREQUENCY) * JITTER;
                motes.push(MoteInstance {
                    name: Arc::from(detail.name.as_str()),
                    position: coord.to_vec3() + Vec3::new(0.5 + jx, 1.0, 0.5 + jz),
                    scale: detail.min_scale + (detail.max_scale - detail.min_scale) * t,
                    tint: grass.tint,
                });
            }
        }
        motes
    }

    /// Regenerates every slice of the chunk's mote cache. Returns the number of motes.
    pub fn rebuild_mote_layer(&self, chunk: &VoxelChunk, lookup: &dyn NeighborLookup, library: &VoxelLibrary) -> usize {
        let mut total = 0;
        for y in 0..CHUNK_SIZE_Y {
            let motes = self.generate_slice(chunk, y, lookup, library);
            total += motes.len();
            chunk.set_slice_motes(y, motes);
        }
        log::debug!("chunk {:?}: {} motes", chunk.id(), total);
        total
    }
}

impl core::fmt::Debug for MoteGenerator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MoteGenerator")
            .field("active", &self.is_active())
            .finish()
    }
}
