use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::time::Instant;

use burrow_geom::{Aabb, MeshBuild, Vec3};
use burrow_world::constants::CHUNK_SIZE_Y;
use burrow_world::{GlobalChunkCoordinate, GlobalVoxelCoordinate};

use crate::data::{VoxelData, lock};

/// GPU-side copy of a mesh. Dropping it releases the GPU resource.
pub trait GpuMesh: Send + Sync {
    fn draw(&self);
}

/// The renderer's device, as seen by chunks.
pub trait GraphicsDevice: Send + Sync {
    fn is_disposed(&self) -> bool;
    /// Returns `None` when the upload cannot complete, e.g. during device teardown.
    fn upload(&self, mesh: &MeshBuild) -> Option<Box<dyn GpuMesh>>;
}

/// Builds the geometry of one Y slice of a chunk.
pub trait SliceMesher {
    /// Slices `0..n` of `chunk` lie under the current max viewing level.
    fn visible_slices(&self, chunk: GlobalChunkCoordinate) -> usize;
    fn build_slice(&self, chunk: &VoxelChunk, y: usize) -> MeshBuild;
}

/// Receives chunk invalidations and voxel changes; implemented by the chunk manager.
pub trait ChunkNotifier: Send + Sync {
    fn chunk_invalidated(&self, chunk: GlobalChunkCoordinate);
    fn voxel_changed(&self, change: VoxelChangeEvent);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoxelChangeKind {
    TypeChanged { old: u8, new: u8 },
    Explored,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoxelChangeEvent {
    pub coordinate: GlobalVoxelCoordinate,
    pub kind: VoxelChangeKind,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DynamicLight {
    pub position: Vec3,
    pub range: f32,
    pub intensity: u8,
}

/// One decorative sprite instance.
#[derive(Clone, Debug, PartialEq)]
pub struct MoteInstance {
    pub name: Arc<str>,
    pub position: Vec3,
    pub scale: f32,
    pub tint: [u8; 4],
}

pub struct ChunkPrimitive {
    pub mesh: Arc<MeshBuild>,
    pub bbox: Aabb,
    gpu: Box<dyn GpuMesh>,
}

impl ChunkPrimitive {
    pub fn new(mesh: Arc<MeshBuild>, bbox: Aabb, gpu: Box<dyn GpuMesh>) -> Self {
        Self { mesh, bbox, gpu }
    }

    #[inline]
    pub fn draw(&self) {
        self.gpu.draw();
    }
}

pub struct VoxelChunk {
    id: GlobalChunkCoordinate,
    pub data: VoxelData,
    primitive: Mutex<Option<Arc<ChunkPrimitive>>>,
    liquid_primitives: Mutex<HashMap<u8, Arc<ChunkPrimitive>>>,
    dynamic_lights: Mutex<Vec<DynamicLight>>,
    motes: Mutex<[Option<Arc<[MoteInstance]>>; CHUNK_SIZE_Y]>,
    // Written by the renderer, read by the rebuild worker; best-effort.
    visible: AtomicBool,
    render_cycle_when_last_visible: AtomicU64,
    rebuild_deferred: AtomicBool,
    update_pass: AtomicU32,
    notifier: OnceLock<Weak<dyn ChunkNotifier>>,
}

impl VoxelChunk {
    pub fn new(id: GlobalChunkCoordinate) -> Self {
        Self {
            id,
            data: VoxelData::new(),
            primitive: Mutex::new(None),
            liquid_primitives: Mutex::new(HashMap::new()),
            dynamic_lights: Mutex::new(Vec::new()),
            motes: Mutex::new(core::array::from_fn(|_| None)),
            visible: AtomicBool::new(false),
            render_cycle_when_last_visible: AtomicU64::new(0),
            rebuild_deferred: AtomicBool::new(false),
            update_pass: AtomicU32::new(0),
            notifier: OnceLock::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> GlobalChunkCoordinate {
        self.id
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::new(self.id.min_corner(), self.id.max_corner())
    }

    /// Connects the chunk to its manager. Only the first attachment takes effect.
    pub fn attach_notifier(&self, notifier: Weak<dyn ChunkNotifier>) {
        let _ = self.notifier.set(notifier);
    }

    fn notifier(&self) -> Option<Arc<dyn ChunkNotifier>> {
        self.notifier.get().and_then(Weak::upgrade)
    }

    pub(crate) fn notify_voxel_changed(&self, change: VoxelChangeEvent) {
        if let Some(n) = self.notifier() {
            n.voxel_changed(change);
        }
    }

    pub fn invalidate_slice(&self, y: usize) {
        self.data.clear_slice(y);
        lock(&self.motes)[y] = None;
        if let Some(n) = self.notifier() {
            n.chunk_invalidated(self.id);
        }
    }

    pub fn invalidate_all_slices(&self) {
        self.data.clear_all_slices();
        self.clear_motes();
        if let Some(n) = self.notifier() {
            n.chunk_invalidated(self.id);
        }
    }

    /// Drops a cached slice without requesting a rebuild; for passes that run right
    /// before the rebuild itself.
    pub fn drop_cached_slice(&self, y: usize) {
        self.data.clear_slice(y);
    }

    /// Regenerates the whole mesh from cached and freshly built slices and swaps it in.
    /// Returns false without side effects on the primitive when no usable device exists.
    pub fn rebuild(&self, device: Option<&dyn GraphicsDevice>, mesher: &dyn SliceMesher) -> bool {
        let Some(device) = device.filter(|d| !d.is_disposed()) else {
            return false;
        };
        let started = Instant::now();
        let limit = mesher.visible_slices(self.id).min(CHUNK_SIZE_Y);
        let mut combined = MeshBuild::default();
        let mut built = 0usize;
        for y in 0..limit {
            let (cached, generation) = self.data.cached_slice(y);
            let slice = match cached {
                Some(slice) => slice,
                None => {
                    let mesh = if self.data.voxels_present_in_slice(y) == 0 {
                        MeshBuild::default()
                    } else {
                        built += 1;
                        mesher.build_slice(self, y)
                    };
                    let mesh = Arc::new(mesh);
                    self.data.store_slice(y, generation, Arc::clone(&mesh));
                    mesh
                }
            };
            combined.append(&slice);
        }
        let Some(gpu) = device.upload(&combined) else {
            return false;
        };
        let primitive = Arc::new(ChunkPrimitive::new(
            Arc::new(combined),
            self.bounding_box(),
            gpu,
        ));
        let old = lock(&self.primitive).replace(primitive);
        drop(old);
        log::debug!(
            "rebuilt chunk {:?}: {} slices meshed in {}ms",
            self.id,
            built,
            started.elapsed().as_millis().min(u128::from(u32::MAX)) as u32
        );
        true
    }

    /// Releases the GPU mesh and cached fragments; voxel data is kept.
    pub fn discard_primitive(&self) {
        let old = lock(&self.primitive).take();
        drop(old);
        lock(&self.liquid_primitives).clear();
        self.data.clear_all_slices();
        self.clear_motes();
    }

    #[inline]
    pub fn has_primitive(&self) -> bool {
        lock(&self.primitive).is_some()
    }

    pub fn primitive(&self) -> Option<Arc<ChunkPrimitive>> {
        lock(&self.primitive).clone()
    }

    /// Draws the current mesh, if any.
    pub fn render(&self, device: &dyn GraphicsDevice) -> bool {
        if device.is_disposed() {
            return false;
        }
        match lock(&self.primitive).as_ref() {
            Some(p) => {
                p.draw();
                true
            }
            None => false,
        }
    }

    /// Replaces the liquid sub-meshes, one per liquid type.
    pub fn rebuild_liquids(&self, device: Option<&dyn GraphicsDevice>, meshes: Vec<(u8, MeshBuild)>) -> bool {
        let Some(device) = device.filter(|d| !d.is_disposed()) else {
            return false;
        };
        let bbox = self.bounding_box();
        let mut fresh = HashMap::with_capacity(meshes.len());
        for (liquid, mesh) in meshes {
            if mesh.is_empty() {
                continue;
            }
            let Some(gpu) = device.upload(&mesh) else {
                return false;
            };
            fresh.insert(liquid, Arc::new(ChunkPrimitive::new(Arc::new(mesh), bbox, gpu)));
        }
        let old = std::mem::replace(&mut *lock(&self.liquid_primitives), fresh);
        drop(old);
        true
    }

    pub fn liquid_primitive(&self, liquid: u8) -> Option<Arc<ChunkPrimitive>> {
        lock(&self.liquid_primitives).get(&liquid).cloned()
    }

    pub fn render_liquids(&self, device: &dyn GraphicsDevice) -> usize {
        if device.is_disposed() {
            return 0;
        }
        let liquids = lock(&self.liquid_primitives);
        for p in liquids.values() {
            p.draw();
        }
        liquids.len()
    }

    pub fn set_dynamic_lights(&self, lights: Vec<DynamicLight>) {
        *lock(&self.dynamic_lights) = lights;
    }

    pub fn dynamic_lights(&self) -> Vec<DynamicLight> {
        lock(&self.dynamic_lights).clone()
    }

    pub fn slice_motes(&self, y: usize) -> Option<Arc<[MoteInstance]>> {
        lock(&self.motes)[y].clone()
    }

    pub fn set_slice_motes(&self, y: usize, motes: Vec<MoteInstance>) {
        lock(&self.motes)[y] = Some(motes.into());
    }

    pub fn clear_motes(&self) {
        for slot in lock(&self.motes).iter_mut() {
            *slot = None;
        }
    }

    #[inline]
    pub fn visible(&self) -> bool {
        self.visible.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Relaxed);
    }

    #[inline]
    pub fn render_cycle_when_last_visible(&self) -> u64 {
        self.render_cycle_when_last_visible.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn set_render_cycle_when_last_visible(&self, cycle: u64) {
        self.render_cycle_when_last_visible
            .store(cycle, Ordering::Relaxed);
    }

    /// Records that a queued rebuild was dropped while the chunk was off screen.
    #[inline]
    pub fn defer_rebuild(&self) {
        self.rebuild_deferred.store(true, Ordering::Relaxed);
    }

    /// Clears the deferred-rebuild mark, returning whether it was set.
    #[inline]
    pub fn take_deferred_rebuild(&self) -> bool {
        self.rebuild_deferred.swap(false, Ordering::Relaxed)
    }

    /// Counter used to alternate which half of the voxels a simulation pass samples.
    #[inline]
    pub fn next_update_pass(&self) -> u32 {
        self.update_pass.fetch_add(1, Ordering::Relaxed)
    }
}

impl core::fmt::Debug for VoxelChunk {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VoxelChunk")
            .field("id", &self.id)
            .field("voxels", &self.data.voxel_count())
            .field("visible", &self.visible())
            .finish()
    }
}
