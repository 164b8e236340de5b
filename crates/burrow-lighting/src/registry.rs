use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use burrow_chunk::{DynamicLight, VoxelChunk};
use burrow_voxels::VoxelLibrary;
use burrow_world::constants::{CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z, CHUNK_VOXEL_COUNT};
use burrow_world::{GlobalChunkCoordinate, GlobalVoxelCoordinate, LocalVoxelCoordinate};
use hashbrown::HashMap;

/// Where a registered light came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightSource {
    /// Found by scanning a chunk for light-emitting voxel types.
    Voxel,
    /// Placed by gameplay code (torches, spells).
    Placed,
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    at: GlobalVoxelCoordinate,
    source: LightSource,
    light: DynamicLight,
}

/// Dynamic lights bucketed by the chunk that contains them.
///
/// Created with [`LightRegistry::init`] and torn down with [`LightRegistry::shutdown`];
/// after shutdown every add is ignored.
pub struct LightRegistry {
    active: AtomicBool,
    emitter_range: f32,
    lights: Mutex<HashMap<GlobalChunkCoordinate, Vec<Entry>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl LightRegistry {
    /// Ranges are clamped to one chunk so a chunk only ever needs its direct neighbors' lights.
    pub const MAX_RANGE: f32 = CHUNK_SIZE_X as f32;

    pub fn init(emitter_range: f32) -> Self {
        log::debug!("light registry up (emitter range {emitter_range})");
        Self {
            active: AtomicBool::new(true),
            emitter_range: emitter_range.clamp(0.0, Self::MAX_RANGE),
            lights: Mutex::new(HashMap::new()),
        }
    }

    pub fn shutdown(&self) {
        self.active.store(false, Ordering::Release);
        let n: usize = lock(&self.lights).drain().map(|(_, v)| v.len()).sum();
        log::debug!("light registry down, dropped {n} lights");
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Adds or replaces the light at `at`. Returns false when the registry is shut down.
    pub fn add_light(&self, at: GlobalVoxelCoordinate, range: f32, intensity: u8) -> bool {
        if !self.is_active() {
            return false;
        }
        let light = DynamicLight {
            position: at.center(),
            range: range.clamp(0.0, Self::MAX_RANGE),
            intensity,
        };
        let mut map = lock(&self.lights);
        let bucket = map.entry(at.chunk()).or_default();
        bucket.retain(|e| e.at != at);
        bucket.push(Entry { at, source: LightSource::Placed, light });
        true
    }

    pub fn remove_light(&self, at: GlobalVoxelCoordinate) -> bool {
        let mut map = lock(&self.lights);
        let Some(bucket) = map.get_mut(&at.chunk()) else {
            return false;
        };
        let before = bucket.len();
        bucket.retain(|e| e.at != at);
        before != bucket.len()
    }

    pub fn clear_chunk(&self, chunk: GlobalChunkCoordinate) {
        lock(&self.lights).remove(&chunk);
    }

    /// Replaces the voxel-sourced lights of `chunk` with one per emitting voxel that has
    /// at least one empty neighbor inside the chunk or on its boundary.
    pub fn sync_emitters(&self, chunk: &VoxelChunk, library: &VoxelLibrary) -> usize {
        if !self.is_active() {
            return 0;
        }
        let id = chunk.id();
        let mut found = Vec::new();
        for index in 0..CHUNK_VOXEL_COUNT {
            let local = LocalVoxelCoordinate::from_index(index);
            let t = chunk.data.type_at(local);
            if t == 0 || !library.voxel_type(t).is_some_and(|v| v.emits_light) {
                continue;
            }
            if !exposed(chunk, local) {
                continue;
            }
            let at = GlobalVoxelCoordinate::from_chunk_local(id, local);
            found.push(Entry {
                at,
                source: LightSource::Voxel,
                light: DynamicLight { position: at.center(), range: self.emitter_range, intensity: 255 },
            });
        }
        let n = found.len();
        let mut map = lock(&self.lights);
        let bucket = map.entry(id).or_default();
        bucket.retain(|e| e.source != LightSource::Voxel);
        bucket.extend(found);
        n
    }

    /// Lights of `chunk` and of the 26 chunks around it.
    pub fn lights_near(&self, chunk: GlobalChunkCoordinate) -> Vec<DynamicLight> {
        let map = lock(&self.lights);
        let mut out = Vec::new();
        for dy in -1..=1 {
            for dz in -1..=1 {
                for dx in -1..=1 {
                    if let Some(bucket) = map.get(&chunk.offset(dx, dy, dz)) {
                        out.extend(bucket.iter().map(|e| e.light));
                    }
                }
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        lock(&self.lights).values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// Chunk borders count as exposed; the neighbor may be open.
fn exposed(chunk: &VoxelChunk, l: LocalVoxelCoordinate) -> bool {
    const STEPS: [(i32, i32, i32); 6] = [(1, 0, 0), (-1, 0, 0), (0, 1, 0), (0, -1, 0), (0, 0, 1), (0, 0, -1)];
    STEPS.iter().any(|&(dx, dy, dz)| {
        let (x, y, z) = (i32::from(l.x) + dx, i32::from(l.y) + dy, i32::from(l.z) + dz);
        if !(0..CHUNK_SIZE_X as i32).contains(&x)
            || !(0..CHUNK_SIZE_Y as i32).contains(&y)
            || !(0..CHUNK_SIZE_Z as i32).contains(&z)
        {
            return true;
        }
        chunk.data.type_at(LocalVoxelCoordinate::new(x as usize, y as usize, z as usize)) == 0
    })
}
