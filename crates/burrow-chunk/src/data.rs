use std::sync::atomic::{AtomicU8, AtomicU16, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use burrow_geom::MeshBuild;
use burrow_world::LocalVoxelCoordinate;
use burrow_world::constants::{
    CHUNK_SIZE_Y, CHUNK_VOXEL_COUNT, LIQUID_CHUNK_CELL_COUNT, LIQUID_CHUNK_SIZE_X,
    LIQUID_CHUNK_SIZE_Z, LIQUID_SCALE,
};

use crate::packed;
use crate::sample::VoxelSample;

// Packed bytes use relaxed atomics: single bytes never tear, and cross-thread
// visibility is eventual.
const ORD: Ordering = Ordering::Relaxed;

pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn zeroed(n: usize) -> Box<[AtomicU8]> {
    (0..n).map(|_| AtomicU8::new(0)).collect()
}

#[inline]
fn update(cell: &AtomicU8, f: impl Fn(u8) -> u8) -> u8 {
    match cell.fetch_update(ORD, ORD, |b| Some(f(b))) {
        Ok(prev) | Err(prev) => prev,
    }
}

/// Index into the double-resolution liquid grid.
#[inline]
pub const fn liquid_index(x: usize, y: usize, z: usize) -> usize {
    (y * LIQUID_CHUNK_SIZE_X * LIQUID_CHUNK_SIZE_Z) + (z * LIQUID_CHUNK_SIZE_X) + x
}

#[derive(Default)]
struct SliceEntry {
    mesh: Option<Arc<MeshBuild>>,
    generation: u32,
}

/// Structure-of-arrays storage for one chunk.
pub struct VoxelData {
    types: Box<[AtomicU8]>,
    grass: Box<[AtomicU8]>,
    decals: Box<[AtomicU8]>,
    ramps_sunlight_explored_player_built: Box<[AtomicU8]>,
    liquid: Box<[AtomicU8]>,
    voxels_present_in_slice: [AtomicU16; CHUNK_SIZE_Y],
    liquid_present: [AtomicU16; CHUNK_SIZE_Y],
    slice_cache: Mutex<[SliceEntry; CHUNK_SIZE_Y]>,
}

impl Default for VoxelData {
    fn default() -> Self {
        Self::new()
    }
}

impl VoxelData {
    pub fn new() -> Self {
        Self {
            types: zeroed(CHUNK_VOXEL_COUNT),
            grass: zeroed(CHUNK_VOXEL_COUNT),
            decals: zeroed(CHUNK_VOXEL_COUNT),
            ramps_sunlight_explored_player_built: zeroed(CHUNK_VOXEL_COUNT),
            liquid: zeroed(LIQUID_CHUNK_CELL_COUNT),
            voxels_present_in_slice: core::array::from_fn(|_| AtomicU16::new(0)),
            liquid_present: core::array::from_fn(|_| AtomicU16::new(0)),
            slice_cache: Mutex::new(core::array::from_fn(|_| SliceEntry::default())),
        }
    }

    #[inline]
    pub fn type_at(&self, l: LocalVoxelCoordinate) -> u8 {
        self.types[l.index()].load(ORD)
    }

    /// Writes the type and keeps the slice presence count exact. Returns the old type.
    pub fn set_type(&self, l: LocalVoxelCoordinate, t: u8) -> u8 {
        let old = self.types[l.index()].swap(t, ORD);
        let slice = &self.voxels_present_in_slice[usize::from(l.y)];
        match (old == 0, t == 0) {
            (true, false) => {
                slice.fetch_add(1, ORD);
            }
            (false, true) => {
                slice.fetch_sub(1, ORD);
            }
            _ => {}
        }
        old
    }

    #[inline]
    pub fn grass(&self, l: LocalVoxelCoordinate) -> u8 {
        self.grass[l.index()].load(ORD)
    }

    /// Read-modify-write of the grass byte; returns the previous byte.
    #[inline]
    pub fn update_grass(&self, l: LocalVoxelCoordinate, f: impl Fn(u8) -> u8) -> u8 {
        update(&self.grass[l.index()], f)
    }

    #[inline]
    pub fn decal(&self, l: LocalVoxelCoordinate) -> u8 {
        self.decals[l.index()].load(ORD)
    }

    #[inline]
    pub fn update_decal(&self, l: LocalVoxelCoordinate, f: impl Fn(u8) -> u8) -> u8 {
        update(&self.decals[l.index()], f)
    }

    #[inline]
    pub fn flags(&self, l: LocalVoxelCoordinate) -> u8 {
        self.ramps_sunlight_explored_player_built[l.index()].load(ORD)
    }

    #[inline]
    pub fn update_flags(&self, l: LocalVoxelCoordinate, f: impl Fn(u8) -> u8) -> u8 {
        update(&self.ramps_sunlight_explored_player_built[l.index()], f)
    }

    #[inline]
    pub fn sample(&self, l: LocalVoxelCoordinate) -> VoxelSample {
        let i = l.index();
        VoxelSample {
            type_id: self.types[i].load(ORD),
            grass: self.grass[i].load(ORD),
            decal: self.decals[i].load(ORD),
            flags: self.ramps_sunlight_explored_player_built[i].load(ORD),
        }
    }

    #[inline]
    pub fn voxels_present_in_slice(&self, y: usize) -> u16 {
        self.voxels_present_in_slice[y].load(ORD)
    }

    pub fn voxel_count(&self) -> usize {
        self.voxels_present_in_slice
            .iter()
            .map(|c| usize::from(c.load(ORD)))
            .sum()
    }

    /// Liquid byte of cell `(x, y, z)` in the 32³ grid.
    #[inline]
    pub fn liquid(&self, x: usize, y: usize, z: usize) -> u8 {
        self.liquid[liquid_index(x, y, z)].load(ORD)
    }

    /// Writes a liquid byte and keeps the per-slice liquid count exact. Returns the old byte.
    pub fn set_liquid(&self, x: usize, y: usize, z: usize, value: u8) -> u8 {
        let old = self.liquid[liquid_index(x, y, z)].swap(value, ORD);
        let count = &self.liquid_present[y / LIQUID_SCALE];
        match (packed::liquid_type(old) == 0, packed::liquid_type(value) == 0) {
            (true, false) => {
                count.fetch_add(1, ORD);
            }
            (false, true) => {
                count.fetch_sub(1, ORD);
            }
            _ => {}
        }
        old
    }

    /// Number of liquid cells inside voxel slice `y`.
    #[inline]
    pub fn liquid_present(&self, y: usize) -> u16 {
        self.liquid_present[y].load(ORD)
    }

    pub fn has_liquid(&self) -> bool {
        self.liquid_present.iter().any(|c| c.load(ORD) > 0)
    }

    /// Cached fragment for slice `y` and the generation it must match when stored back.
    pub fn cached_slice(&self, y: usize) -> (Option<Arc<MeshBuild>>, u32) {
        let cache = lock(&self.slice_cache);
        (cache[y].mesh.clone(), cache[y].generation)
    }

    /// Stores a fragment built at `generation`. Fragments whose slice was invalidated while
    /// they were being built are dropped.
    pub fn store_slice(&self, y: usize, generation: u32, mesh: Arc<MeshBuild>) -> bool {
        let mut cache = lock(&self.slice_cache);
        if cache[y].generation != generation {
            return false;
        }
        cache[y].mesh = Some(mesh);
        true
    }

    pub fn clear_slice(&self, y: usize) {
        let mut cache = lock(&self.slice_cache);
        cache[y].mesh = None;
        cache[y].generation = cache[y].generation.wrapping_add(1);
    }

    pub fn clear_all_slices(&self) {
        let mut cache = lock(&self.slice_cache);
        for entry in cache.iter_mut() {
            entry.mesh = None;
            entry.generation = entry.generation.wrapping_add(1);
        }
    }

    pub fn cached_slice_count(&self) -> usize {
        lock(&self.slice_cache)
            .iter()
            .filter(|e| e.mesh.is_some())
            .count()
    }
}
