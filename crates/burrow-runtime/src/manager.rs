use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::thread::JoinHandle;
use std::time::Instant;

use burrow_chunk::{
    ChunkNotifier, GraphicsDevice, NeighborLookup, VoxelAccess, VoxelChangeEvent, VoxelChunk, VoxelHandle,
    VoxelSample, packed,
};
use burrow_geom::Aabb;
use burrow_lighting::LightRegistry;
use burrow_mesh_cpu::{ChunkNeighborhood, VoxelListPrimitive, build_liquid_meshes, compute_ramp, recalculate_ramps};
use burrow_sim::{ChunkUpdate, MoteGenerator, UpdateStats, VoxelUpdateHooks, WorldContext};
use burrow_voxels::VoxelLibrary;
use burrow_world::constants::{CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z, CHUNK_VOXEL_COUNT};
use burrow_world::{GlobalChunkCoordinate, GlobalVoxelCoordinate, LocalVoxelCoordinate};
use crossbeam_channel::{Receiver, Sender, bounded};
use rayon::prelude::*;
use thiserror::Error;

use crate::config::RuntimeConfig;
use crate::live_chunks::LiveChunks;
use crate::queue::UniqueQueue;
use crate::save::ChunkFile;
use crate::water::{WaterStats, step_liquids};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkManagerError {
    #[error("chunk {coord:?} is outside the chunk map (origin {origin:?}, dimensions {dimensions:?})")]
    OutOfBounds {
        coord: GlobalChunkCoordinate,
        origin: GlobalChunkCoordinate,
        dimensions: [i32; 3],
    },
    #[error("save file contains no chunks")]
    EmptySave,
    #[error("chunk record {coord:?} holds {len} {field} bytes, expected {expected}")]
    CorruptRecord {
        coord: GlobalChunkCoordinate,
        field: &'static str,
        len: usize,
        expected: usize,
    },
}

pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Dense chunk array covering `[origin, origin + dimensions)`.
struct ChunkMap {
    origin: GlobalChunkCoordinate,
    dimensions: [i32; 3],
    chunks: Vec<Option<Arc<VoxelChunk>>>,
}

impl ChunkMap {
    fn new(origin: GlobalChunkCoordinate, dimensions: [i32; 3]) -> Self {
        let dimensions = dimensions.map(|d| d.max(0));
        let len = dimensions.iter().map(|&d| d as usize).product();
        Self {
            origin,
            dimensions,
            chunks: vec![None; len],
        }
    }

    fn index(&self, c: GlobalChunkCoordinate) -> Option<usize> {
        let [dx, dy, dz] = self.dimensions;
        let (x, y, z) = (c.x - self.origin.x, c.y - self.origin.y, c.z - self.origin.z);
        if x < 0 || y < 0 || z < 0 || x >= dx || y >= dy || z >= dz {
            return None;
        }
        Some((y * dx * dz + z * dx + x) as usize)
    }

    fn get(&self, c: GlobalChunkCoordinate) -> Option<&Arc<VoxelChunk>> {
        self.index(c).and_then(|i| self.chunks[i].as_ref())
    }

    fn out_of_bounds(&self, coord: GlobalChunkCoordinate) -> ChunkManagerError {
        ChunkManagerError::OutOfBounds {
            coord,
            origin: self.origin,
            dimensions: self.dimensions,
        }
    }

    fn loaded(&self) -> impl Iterator<Item = &Arc<VoxelChunk>> {
        self.chunks.iter().flatten()
    }
}

#[derive(Default)]
pub(crate) struct Counters {
    pub rebuilds: AtomicU64,
    pub skipped_invisible: AtomicU64,
    pub evictions: AtomicU64,
    pub update_ticks: AtomicU64,
    pub water_steps: AtomicU64,
    pub liquid_rebuilds: AtomicU64,
}

/// Snapshot of the manager's counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ManagerStats {
    pub chunks: usize,
    pub live_chunks: usize,
    pub queued: usize,
    pub rebuilds: u64,
    pub skipped_invisible: u64,
    pub evictions: u64,
    pub update_ticks: u64,
    pub water_steps: u64,
    pub liquid_rebuilds: u64,
}

/// Owns every loaded chunk and keeps their meshes in step with their voxels.
///
/// Chunks live in a dense array addressed by chunk coordinate. Mutations reach the
/// manager through [`ChunkNotifier`]: the touched chunk and its 2D column are queued once
/// each, and the rebuild worker drains the chunk queue. The update and water workers walk
/// the array on their own cadence. Workers hold the manager alive until [`Self::shutdown`].
pub struct ChunkManager {
    this: Weak<ChunkManager>,
    map: RwLock<ChunkMap>,
    rebuild_queue: Mutex<UniqueQueue<GlobalChunkCoordinate>>,
    column_queue: Mutex<UniqueQueue<(i32, i32)>>,
    changed_voxels: Mutex<Vec<VoxelChangeEvent>>,
    pub(crate) signal_tx: Sender<()>,
    pub(crate) signal_rx: Receiver<()>,
    pub(crate) exit: AtomicBool,
    max_viewing_level: AtomicI32,
    library: Arc<VoxelLibrary>,
    world: Arc<dyn WorldContext + Send>,
    hooks: VoxelUpdateHooks,
    lights: LightRegistry,
    motes: MoteGenerator,
    device: RwLock<Option<Arc<dyn GraphicsDevice>>>,
    pub(crate) config: RuntimeConfig,
    live: Mutex<LiveChunks>,
    update_cursor: AtomicUsize,
    pub(crate) update_rng: Mutex<fastrand::Rng>,
    pub(crate) water_rng: Mutex<fastrand::Rng>,
    pub(crate) counters: Counters,
    pub(crate) workers: Mutex<Vec<JoinHandle<()>>>,
    // Dropped on shutdown; disconnecting it wakes every worker.
    pub(crate) stop: Mutex<Option<Sender<()>>>,
}

impl ChunkManager {
    pub fn new(library: Arc<VoxelLibrary>, config: RuntimeConfig, world: Arc<dyn WorldContext + Send>) -> Arc<Self> {
        let (signal_tx, signal_rx) = bounded(1);
        let lights = LightRegistry::init(config.emitter_light_range);
        let motes = MoteGenerator::new();
        motes.init(config.seed as i32);
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            map: RwLock::new(ChunkMap::new(GlobalChunkCoordinate::new(0, 0, 0), [0, 0, 0])),
            rebuild_queue: Mutex::new(UniqueQueue::default()),
            column_queue: Mutex::new(UniqueQueue::default()),
            changed_voxels: Mutex::new(Vec::new()),
            signal_tx,
            signal_rx,
            exit: AtomicBool::new(false),
            max_viewing_level: AtomicI32::new(config.max_viewing_level),
            library,
            world,
            hooks: VoxelUpdateHooks::new(),
            lights,
            motes,
            device: RwLock::new(None),
            live: Mutex::new(LiveChunks::new()),
            update_cursor: AtomicUsize::new(0),
            update_rng: Mutex::new(fastrand::Rng::with_seed(config.seed)),
            water_rng: Mutex::new(fastrand::Rng::with_seed(config.seed ^ 0x5eed_0f_5a17)),
            counters: Counters::default(),
            workers: Mutex::new(Vec::new()),
            stop: Mutex::new(None),
            config,
        })
    }

    fn read_map(&self) -> std::sync::RwLockReadGuard<'_, ChunkMap> {
        self.map.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn library(&self) -> &Arc<VoxelLibrary> {
        &self.library
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn hooks(&self) -> &VoxelUpdateHooks {
        &self.hooks
    }

    pub fn light_registry(&self) -> &LightRegistry {
        &self.lights
    }

    pub fn motes(&self) -> &MoteGenerator {
        &self.motes
    }

    pub fn set_graphics_device(&self, device: Option<Arc<dyn GraphicsDevice>>) {
        *self.device.write().unwrap_or_else(PoisonError::into_inner) = device;
    }

    fn device(&self) -> Option<Arc<dyn GraphicsDevice>> {
        self.device.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Allocates an empty chunk array. Chunks already loaded are dropped.
    pub fn initialize_chunk_map(&self, origin: GlobalChunkCoordinate, dimensions: [i32; 3]) {
        let map = ChunkMap::new(origin, dimensions);
        log::info!(
            "chunk map {:?} + {:?} ({} slots)",
            origin,
            map.dimensions,
            map.chunks.len()
        );
        *self.map.write().unwrap_or_else(PoisonError::into_inner) = map;
        lock(&self.rebuild_queue).clear();
        lock(&self.column_queue).clear();
        *lock(&self.live) = LiveChunks::new();
        self.update_cursor.store(0, Ordering::Relaxed);
    }

    pub fn origin(&self) -> GlobalChunkCoordinate {
        self.read_map().origin
    }

    pub fn dimensions(&self) -> [i32; 3] {
        self.read_map().dimensions
    }

    pub fn check_bounds(&self, coord: GlobalChunkCoordinate) -> bool {
        self.read_map().index(coord).is_some()
    }

    /// Slot of `coord` in the dense array, `None` outside the map.
    pub fn get_chunk_index(&self, coord: GlobalChunkCoordinate) -> Option<usize> {
        self.read_map().index(coord)
    }

    pub fn try_get_chunk(&self, coord: GlobalChunkCoordinate) -> Result<Option<Arc<VoxelChunk>>, ChunkManagerError> {
        let map = self.read_map();
        match map.index(coord) {
            Some(i) => Ok(map.chunks[i].clone()),
            None => Err(map.out_of_bounds(coord)),
        }
    }

    /// The chunk at `coord`, if loaded.
    ///
    /// # Panics
    /// When `coord` is outside the map; use [`Self::check_bounds`] or
    /// [`Self::try_get_chunk`] when that is not a bug.
    pub fn get_chunk(&self, coord: GlobalChunkCoordinate) -> Option<Arc<VoxelChunk>> {
        match self.try_get_chunk(coord) {
            Ok(chunk) => chunk,
            Err(e) => panic!("{e}"),
        }
    }

    /// The chunk at `coord`, or `None` when it is missing or outside the map.
    pub fn chunk(&self, coord: GlobalChunkCoordinate) -> Option<Arc<VoxelChunk>> {
        self.read_map().get(coord).cloned()
    }

    pub fn chunks(&self) -> Vec<Arc<VoxelChunk>> {
        self.read_map().loaded().cloned().collect()
    }

    pub fn chunk_count(&self) -> usize {
        self.read_map().loaded().count()
    }

    /// Inserts `chunk`, replacing any chunk already in its slot, and queues it for a build.
    pub fn add_chunk(&self, chunk: Arc<VoxelChunk>) -> Result<(), ChunkManagerError> {
        let id = chunk.id();
        {
            let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
            let Some(i) = map.index(id) else {
                return Err(map.out_of_bounds(id));
            };
            let notifier: Weak<dyn ChunkNotifier> = self.this.clone();
            chunk.attach_notifier(notifier);
            if let Some(old) = map.chunks[i].replace(Arc::clone(&chunk)) {
                lock(&self.live).remove(&old);
            }
        }
        self.invalidate_chunk(&chunk);
        Ok(())
    }

    /// Replaces the map with one that tightly covers `files` and loads every chunk.
    /// Every record is decoded before the current map is dropped.
    pub fn load_chunks<F: ChunkFile>(&self, files: &[F]) -> Result<usize, ChunkManagerError> {
        let Some(first) = files.first() else {
            return Err(ChunkManagerError::EmptySave);
        };
        let chunks = files.iter().map(ChunkFile::to_chunk).collect::<Result<Vec<_>, _>>()?;
        let (mut lo, mut hi) = (first.id(), first.id());
        for f in files {
            let id = f.id();
            lo = GlobalChunkCoordinate::new(lo.x.min(id.x), lo.y.min(id.y), lo.z.min(id.z));
            hi = GlobalChunkCoordinate::new(hi.x.max(id.x), hi.y.max(id.y), hi.z.max(id.z));
        }
        self.initialize_chunk_map(lo, [hi.x - lo.x + 1, hi.y - lo.y + 1, hi.z - lo.z + 1]);
        for chunk in chunks {
            self.add_chunk(Arc::new(chunk))?;
        }
        let bounds = self.bounding_box();
        log::info!(
            "loaded {} chunks, bounds {:?}..{:?}",
            files.len(),
            bounds.min,
            bounds.max
        );
        Ok(files.len())
    }

    /// World-space box around the whole chunk map.
    pub fn bounding_box(&self) -> Aabb {
        let map = self.read_map();
        let [dx, dy, dz] = map.dimensions;
        let far = map.origin.offset(dx, dy, dz);
        Aabb::new(map.origin.min_corner(), far.min_corner())
    }

    fn enqueue(&self, coord: GlobalChunkCoordinate) {
        lock(&self.rebuild_queue).push(coord);
        lock(&self.column_queue).push(coord.column());
        self.signal();
    }

    pub(crate) fn signal(&self) {
        // A full channel already holds a wake-up for the rebuild worker.
        let _ = self.signal_tx.try_send(());
    }

    /// Queues `chunk` and its column. A chunk already queued is not queued twice.
    pub fn invalidate_chunk(&self, chunk: &VoxelChunk) {
        self.enqueue(chunk.id());
    }

    pub fn pop_invalid_chunk(&self) -> Option<Arc<VoxelChunk>> {
        loop {
            let coord = lock(&self.rebuild_queue).pop()?;
            if let Some(chunk) = self.chunk(coord) {
                return Some(chunk);
            }
        }
    }

    pub fn pop_invalid_column(&self) -> Option<(i32, i32)> {
        lock(&self.column_queue).pop()
    }

    pub fn queued_chunks(&self) -> usize {
        lock(&self.rebuild_queue).len()
    }

    /// Takes every voxel change recorded since the last drain.
    pub fn drain_changed_voxels(&self) -> Vec<VoxelChangeEvent> {
        std::mem::take(&mut *lock(&self.changed_voxels))
    }

    pub fn voxel_handle(&self, coord: GlobalVoxelCoordinate) -> Option<VoxelHandle> {
        self.chunk(coord.chunk())
            .map(|c| VoxelHandle::new(c, coord.local()))
    }

    pub fn max_viewing_level(&self) -> i32 {
        self.max_viewing_level.load(Ordering::Relaxed)
    }

    /// Moves the viewing cut. Slices whose geometry depends on the cut are invalidated:
    /// those between the old and new level, and the one just below the lower of the two.
    pub fn set_max_viewing_level(&self, level: i32) {
        let old = self.max_viewing_level.swap(level, Ordering::Relaxed);
        if old == level {
            return;
        }
        let (lo, hi) = (old.min(level).saturating_sub(1), old.max(level));
        let affected: Vec<_> = self
            .read_map()
            .loaded()
            .filter(|c| {
                let y0 = c.id().origin().y;
                y0 < hi && y0 + CHUNK_SIZE_Y as i32 > lo
            })
            .cloned()
            .collect();
        for chunk in &affected {
            let y0 = chunk.id().origin().y;
            let from = (lo - y0).max(0) as usize;
            let to = (hi.saturating_sub(y0)).min(CHUNK_SIZE_Y as i32) as usize;
            for y in from..to {
                chunk.invalidate_slice(y);
            }
        }
        log::debug!("max viewing level {} -> {}, {} chunks invalidated", old, level, affected.len());
    }

    /// The renderer's per-frame hook for a chunk inside the view. A chunk without a mesh,
    /// or one whose rebuild was skipped while it was hidden, is queued.
    pub fn mark_visible(&self, chunk: &VoxelChunk, render_cycle: u64) {
        chunk.set_visible(true);
        chunk.set_render_cycle_when_last_visible(render_cycle);
        let unbuilt = !chunk.has_primitive() && chunk.data.voxel_count() > 0;
        if chunk.take_deferred_rebuild() || unbuilt {
            self.invalidate_chunk(chunk);
        }
    }

    fn neighborhood(&self, chunk: &Arc<VoxelChunk>) -> ChunkNeighborhood {
        let map = self.read_map();
        ChunkNeighborhood::gather(Arc::clone(chunk), |c| map.get(c).cloned())
    }

    /// Recomputes ramps around `chunk`, then rebuilds its solid and liquid meshes and its
    /// motes. Returns whether a new mesh was installed.
    pub fn rebuild_chunk(&self, chunk: &Arc<VoxelChunk>) -> bool {
        let started = Instant::now();
        let neighborhood = self.neighborhood(chunk);
        let max_view = self.max_viewing_level();
        recalculate_ramps(&neighborhood, chunk, &self.library, max_view);
        let built = self.build_meshes(&neighborhood, chunk, max_view);
        log::debug!(
            target: "perf",
            "ms rebuild_chunk={} chunk={:?} built={}",
            started.elapsed().as_millis().min(u128::from(u32::MAX)) as u32,
            chunk.id(),
            built
        );
        built
    }

    fn build_meshes(&self, neighborhood: &ChunkNeighborhood, chunk: &Arc<VoxelChunk>, max_view: i32) -> bool {
        self.lights.sync_emitters(chunk, &self.library);
        let lights = self.lights.lights_near(chunk.id());
        chunk.set_dynamic_lights(lights.clone());
        let mesher = VoxelListPrimitive::new(neighborhood, &self.library, max_view).with_lights(lights);
        let device = self.device();
        let built = chunk.rebuild(device.as_deref(), &mesher);
        if built {
            self.counters.rebuilds.fetch_add(1, Ordering::Relaxed);
            if chunk.data.has_liquid() {
                chunk.rebuild_liquids(device.as_deref(), build_liquid_meshes(chunk));
            }
            self.motes.rebuild_mote_layer(chunk, neighborhood, &self.library);
        }
        built
    }

    /// Builds every loaded chunk at once on a thread pool.
    ///
    /// Ramps are first seeded chunk by chunk without the border pass, since every chunk
    /// is about to be built anyway; the rebuild queue is then cleared and meshes built.
    /// Returns the number of chunks that received a mesh.
    pub fn rebuild_all(&self) -> usize {
        let started = Instant::now();
        let chunks = self.chunks();
        let max_view = self.max_viewing_level();
        let threads = match self.config.rebuild_threads {
            0 => std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4),
            n => n,
        };
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("burrow-build-{i}"))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                log::warn!("build pool unavailable ({e}); building on the calling thread");
                return chunks.iter().filter(|c| self.rebuild_chunk(c)).count();
            }
        };
        let built = pool.install(|| {
            let neighborhoods: Vec<_> = chunks.iter().map(|c| self.neighborhood(c)).collect();
            neighborhoods.par_iter().for_each(|n| seed_ramps(n, &self.library, max_view));
            lock(&self.rebuild_queue).clear();
            neighborhoods
                .par_iter()
                .filter(|n| self.build_meshes(n, n.center(), max_view))
                .count()
        });
        {
            let mut live = lock(&self.live);
            for c in chunks.iter().filter(|c| c.has_primitive()) {
                live.touch(c);
            }
        }
        log::info!(
            "initial build: {}/{} chunks in {}ms on {} threads",
            built,
            chunks.len(),
            started.elapsed().as_millis().min(u128::from(u32::MAX)) as u32,
            threads
        );
        built
    }

    /// Rebuilds queued chunks until the queue is empty. Invisible chunks are skipped and
    /// marked; they are queued again when the renderer next marks them visible.
    /// Returns the number of chunks rebuilt.
    pub fn process_rebuild_queue(&self) -> usize {
        let mut rebuilt = 0;
        while let Some(chunk) = self.pop_invalid_chunk() {
            if self.exit.load(Ordering::Relaxed) {
                break;
            }
            if !chunk.visible() {
                chunk.defer_rebuild();
                self.counters.skipped_invisible.fetch_add(1, Ordering::Relaxed);
                continue;
            }
            if self.rebuild_chunk(&chunk) {
                rebuilt += 1;
                let evicted = {
                    let mut live = lock(&self.live);
                    live.touch(&chunk);
                    live.evict(self.config.max_live_chunks)
                };
                self.counters
                    .evictions
                    .fetch_add(evicted.len() as u64, Ordering::Relaxed);
            }
        }
        rebuilt
    }

    /// Runs the simulation tick of the next chunk in round-robin order.
    pub fn update_next_chunk(&self) -> Option<UpdateStats> {
        let chunk = {
            let map = self.read_map();
            let len = map.chunks.len();
            if len == 0 {
                return None;
            }
            let mut found = None;
            for _ in 0..len {
                let i = self.update_cursor.fetch_add(1, Ordering::Relaxed) % len;
                if let Some(c) = &map.chunks[i] {
                    found = Some(Arc::clone(c));
                    break;
                }
            }
            found?
        };
        let neighborhood = self.neighborhood(&chunk);
        let update = ChunkUpdate {
            library: &self.library,
            hooks: &self.hooks,
            world: self.world.as_ref(),
            access: &neighborhood,
            grass_spread_chance: self.config.grass_spread_chance,
        };
        let stats = update.update_chunk(&chunk, &mut lock(&self.update_rng));
        self.counters.update_ticks.fetch_add(1, Ordering::Relaxed);
        Some(stats)
    }

    /// One liquid step over every chunk holding liquid. Chunks whose liquid moved get
    /// their liquid geometry rebuilt. Returns the number of changed chunks.
    ///
    /// Chunks step bottom-up: a cell that falls into the chunk below lands in a chunk
    /// that has already stepped, so it moves once per step.
    pub fn step_water(&self) -> usize {
        let mut chunks: Vec<_> = self
            .read_map()
            .loaded()
            .filter(|c| c.data.has_liquid())
            .cloned()
            .collect();
        chunks.sort_by_key(|c| c.id().y);
        let device = self.device();
        let mut changed = 0;
        let mut rng = lock(&self.water_rng);
        for chunk in &chunks {
            let below = self.chunk(chunk.id().offset(0, -1, 0));
            let stats: WaterStats = step_liquids(chunk, below.as_deref(), self.config.water_spread_chance, &mut rng);
            if !stats.changed() {
                continue;
            }
            changed += 1;
            self.rebuild_liquids(chunk, device.as_deref());
            if stats.fell_out > 0 {
                if let Some(below) = &below {
                    self.rebuild_liquids(below, device.as_deref());
                }
            }
        }
        self.counters.water_steps.fetch_add(1, Ordering::Relaxed);
        changed
    }

    fn rebuild_liquids(&self, chunk: &VoxelChunk, device: Option<&dyn GraphicsDevice>) {
        if chunk.rebuild_liquids(device, build_liquid_meshes(chunk)) {
            self.counters.liquid_rebuilds.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn stats(&self) -> ManagerStats {
        ManagerStats {
            chunks: self.chunk_count(),
            live_chunks: lock(&self.live).len(),
            queued: self.queued_chunks(),
            rebuilds: self.counters.rebuilds.load(Ordering::Relaxed),
            skipped_invisible: self.counters.skipped_invisible.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            update_ticks: self.counters.update_ticks.load(Ordering::Relaxed),
            water_steps: self.counters.water_steps.load(Ordering::Relaxed),
            liquid_rebuilds: self.counters.liquid_rebuilds.load(Ordering::Relaxed),
        }
    }

    /// Number of voxels of `type_id` in the whole map; diagnostic.
    pub fn count_voxels(&self, type_id: u8) -> usize {
        self.read_map()
            .loaded()
            .map(|c| {
                (0..CHUNK_VOXEL_COUNT)
                    .filter(|&i| c.data.type_at(LocalVoxelCoordinate::from_index(i)) == type_id)
                    .count()
            })
            .sum()
    }

    /// Sets the sunlight bit of every voxel that sees the sky straight up through loaded,
    /// empty voxels, and clears it elsewhere.
    pub fn recompute_sunlight(&self) {
        let map = self.read_map();
        let [dx, dy, dz] = map.dimensions;
        for cz in 0..dz {
            for cx in 0..dx {
                for lz in 0..CHUNK_SIZE_Z {
                    for lx in 0..CHUNK_SIZE_X {
                        let mut lit = true;
                        for cy in (0..dy).rev() {
                            let id = map.origin.offset(cx, cy, cz);
                            let Some(chunk) = map.get(id) else {
                                continue;
                            };
                            for ly in (0..CHUNK_SIZE_Y).rev() {
                                let l = LocalVoxelCoordinate::new(lx, ly, lz);
                                let solid = chunk.data.type_at(l) != 0;
                                chunk.data.update_flags(l, move |b| packed::with_sunlight(b, lit));
                                if solid {
                                    lit = false;
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    fn neighbor_chunks_touching(&self, coord: GlobalVoxelCoordinate) -> Vec<(Arc<VoxelChunk>, usize)> {
        let own = coord.chunk();
        let map = self.read_map();
        let mut out: Vec<(Arc<VoxelChunk>, usize)> = Vec::new();
        for dy in -1..=1 {
            for dz in -1..=1 {
                for dx in -1..=1 {
                    let n = coord.offset(dx, dy, dz);
                    if n.chunk() == own {
                        continue;
                    }
                    let Some(chunk) = map.get(n.chunk()) else {
                        continue;
                    };
                    let y = usize::from(n.local().y);
                    if !out.iter().any(|(c, s)| c.id() == chunk.id() && *s == y) {
                        out.push((Arc::clone(chunk), y));
                    }
                }
            }
        }
        out
    }
}

impl ChunkNotifier for ChunkManager {
    fn chunk_invalidated(&self, chunk: GlobalChunkCoordinate) {
        self.enqueue(chunk);
    }

    fn voxel_changed(&self, change: VoxelChangeEvent) {
        lock(&self.changed_voxels).push(change);
        // Voxels on a chunk border shape the faces, ramps and light of the chunks next door.
        for (chunk, y) in self.neighbor_chunks_touching(change.coordinate) {
            chunk.invalidate_slice(y);
        }
    }
}

impl NeighborLookup for ChunkManager {
    fn sample(&self, coord: GlobalVoxelCoordinate) -> Option<VoxelSample> {
        self.read_map()
            .get(coord.chunk())
            .map(|c| c.data.sample(coord.local()))
    }
}

impl VoxelAccess for ChunkManager {
    fn handle(&self, coord: GlobalVoxelCoordinate) -> Option<VoxelHandle> {
        self.voxel_handle(coord)
    }
}

// Ramp bits of one chunk's own voxels, with no invalidation.
fn seed_ramps(n: &ChunkNeighborhood, library: &VoxelLibrary, max_view: i32) {
    let chunk = n.center();
    for i in 0..CHUNK_VOXEL_COUNT {
        let local = LocalVoxelCoordinate::from_index(i);
        if chunk.data.type_at(local) == 0 {
            continue;
        }
        let coord = GlobalVoxelCoordinate::from_chunk_local(chunk.id(), local);
        let ramp = compute_ramp(n, library, coord, max_view);
        chunk.data.update_flags(local, |b| packed::with_ramp(b, ramp.bits()));
    }
}

impl core::fmt::Debug for ChunkManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let map = self.read_map();
        f.debug_struct("ChunkManager")
            .field("origin", &map.origin)
            .field("dimensions", &map.dimensions)
            .field("max_viewing_level", &self.max_viewing_level())
            .finish()
    }
}
