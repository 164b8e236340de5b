use std::sync::Arc;
use std::time::{Duration, Instant};

use burrow_chunk::{GraphicsDevice, VoxelChangeKind, VoxelChunk, VoxelHandle, packed};
use burrow_runtime::{ChunkFile, ChunkManager, ChunkManagerError, ChunkRecord, HeadlessDevice, RuntimeConfig};
use burrow_sim::FlatWorld;
use burrow_voxels::VoxelLibrary;
use burrow_world::{GlobalChunkCoordinate, GlobalVoxelCoordinate, LocalVoxelCoordinate};
use proptest::prelude::*;

fn load_library() -> Arc<VoxelLibrary> {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    Arc::new(VoxelLibrary::from_path(root.join("../../assets/voxels/library.toml")).unwrap())
}

fn manager(config: RuntimeConfig) -> Arc<ChunkManager> {
    ChunkManager::new(load_library(), config, Arc::new(FlatWorld::default()))
}

fn with_device(m: &ChunkManager) -> Arc<HeadlessDevice> {
    let device = Arc::new(HeadlessDevice::new());
    m.set_graphics_device(Some(Arc::clone(&device) as Arc<dyn GraphicsDevice>));
    device
}

/// A chunk with an explored, sunlit dirt floor on slice 0.
fn floor_chunk(lib: &VoxelLibrary, id: GlobalChunkCoordinate) -> Arc<VoxelChunk> {
    let dirt = lib.voxel_id("dirt").unwrap();
    let chunk = Arc::new(VoxelChunk::new(id));
    for l in LocalVoxelCoordinate::slice(0) {
        chunk.data.set_type(l, dirt);
        chunk
            .data
            .update_flags(l, |b| packed::with_explored(packed::with_sunlight(b, true), true));
    }
    chunk
}

fn drain_queue(m: &ChunkManager) -> Vec<GlobalChunkCoordinate> {
    std::iter::from_fn(|| m.pop_invalid_chunk()).map(|c| c.id()).collect()
}

proptest! {
    #[test]
    fn chunk_index_is_a_bijection_over_the_map(
        ox in -4i32..4, oy in -2i32..2, oz in -4i32..4,
        dx in 1i32..5, dy in 1i32..4, dz in 1i32..5,
    ) {
        let m = manager(RuntimeConfig::default());
        let origin = GlobalChunkCoordinate::new(ox, oy, oz);
        m.initialize_chunk_map(origin, [dx, dy, dz]);
        let mut seen = vec![false; (dx * dy * dz) as usize];
        for y in 0..dy {
            for z in 0..dz {
                for x in 0..dx {
                    let i = m.get_chunk_index(origin.offset(x, y, z)).unwrap();
                    prop_assert!(!seen[i]);
                    seen[i] = true;
                }
            }
        }
        prop_assert!(seen.iter().all(|s| *s));
        prop_assert_eq!(m.get_chunk_index(origin.offset(dx, 0, 0)), None);
        prop_assert_eq!(m.get_chunk_index(origin.offset(0, -1, 0)), None);
        prop_assert!(!m.check_bounds(origin.offset(0, 0, dz)));
    }
}

#[test]
fn repeated_invalidations_queue_a_chunk_once() {
    let m = manager(RuntimeConfig::default());
    m.initialize_chunk_map(GlobalChunkCoordinate::new(0, 0, 0), [2, 2, 1]);
    let a = Arc::new(VoxelChunk::new(GlobalChunkCoordinate::new(0, 0, 0)));
    let b = Arc::new(VoxelChunk::new(GlobalChunkCoordinate::new(0, 1, 0)));
    m.add_chunk(Arc::clone(&a)).unwrap();
    m.add_chunk(Arc::clone(&b)).unwrap();
    drain_queue(&m);
    while m.pop_invalid_column().is_some() {}

    for _ in 0..5 {
        m.invalidate_chunk(&a);
        a.invalidate_slice(3);
    }
    b.invalidate_all_slices();
    assert_eq!(drain_queue(&m), vec![a.id(), b.id()]);
    // both chunks share one column
    assert_eq!(m.pop_invalid_column(), Some((0, 0)));
    assert_eq!(m.pop_invalid_column(), None);
}

#[test]
fn out_of_bounds_chunks_are_rejected() {
    let m = manager(RuntimeConfig::default());
    m.initialize_chunk_map(GlobalChunkCoordinate::new(0, 0, 0), [1, 1, 1]);
    let far = GlobalChunkCoordinate::new(3, 0, 0);
    let err = m.add_chunk(Arc::new(VoxelChunk::new(far))).unwrap_err();
    assert!(matches!(err, ChunkManagerError::OutOfBounds { coord, .. } if coord == far));
    assert!(m.try_get_chunk(far).is_err());
    assert!(matches!(m.try_get_chunk(GlobalChunkCoordinate::new(0, 0, 0)), Ok(None)));
    assert!(m.chunk(far).is_none());
}

#[test]
#[should_panic]
fn get_chunk_panics_outside_the_map() {
    let m = manager(RuntimeConfig::default());
    m.initialize_chunk_map(GlobalChunkCoordinate::new(0, 0, 0), [1, 1, 1]);
    let _ = m.get_chunk(GlobalChunkCoordinate::new(0, -1, 0));
}

#[test]
fn loading_a_save_fits_the_map_to_its_chunks() {
    let lib = load_library();
    let m = manager(RuntimeConfig::default());
    let none: [ChunkRecord; 0] = [];
    assert_eq!(m.load_chunks(&none), Err(ChunkManagerError::EmptySave));

    let a = floor_chunk(&lib, GlobalChunkCoordinate::new(-1, 0, 2));
    a.data.set_liquid(4, 9, 4, packed::with_liquid_type(0, 1));
    let b = VoxelChunk::new(GlobalChunkCoordinate::new(1, 1, 2));
    let records = [ChunkRecord::capture(&a), ChunkRecord::capture(&b)];
    assert_eq!(m.load_chunks(&records).unwrap(), 2);

    assert_eq!(m.origin(), GlobalChunkCoordinate::new(-1, 0, 2));
    assert_eq!(m.dimensions(), [3, 2, 1]);
    assert_eq!(m.chunk_count(), 2);
    let loaded = m.get_chunk(records[0].id()).unwrap();
    assert_eq!(ChunkRecord::capture(&loaded), records[0]);
    assert!(m.get_chunk(GlobalChunkCoordinate::new(0, 0, 2)).is_none());

    let bounds = m.bounding_box();
    assert_eq!(bounds.min, GlobalChunkCoordinate::new(-1, 0, 2).min_corner());
    assert_eq!(bounds.max, GlobalChunkCoordinate::new(1, 1, 2).max_corner());
}

#[test]
fn truncated_records_are_rejected_before_the_map_changes() {
    let lib = load_library();
    let m = manager(RuntimeConfig::default());
    m.initialize_chunk_map(GlobalChunkCoordinate::new(0, 0, 0), [1, 1, 1]);
    m.add_chunk(floor_chunk(&lib, GlobalChunkCoordinate::new(0, 0, 0))).unwrap();

    let mut bad = ChunkRecord::capture(&VoxelChunk::new(GlobalChunkCoordinate::new(3, 0, 0)));
    bad.flags = vec![0; 10].into_boxed_slice();
    assert!(bad.to_chunk().is_err());
    let good = ChunkRecord::capture(&VoxelChunk::new(GlobalChunkCoordinate::new(2, 0, 0)));
    assert_eq!(
        m.load_chunks(&[good, bad]),
        Err(ChunkManagerError::CorruptRecord {
            coord: GlobalChunkCoordinate::new(3, 0, 0),
            field: "flag",
            len: 10,
            expected: 16 * 16 * 16,
        })
    );
    assert_eq!(m.dimensions(), [1, 1, 1]);
    assert_eq!(m.chunk_count(), 1);
}

#[test]
fn voxel_changes_are_recorded_and_drained() {
    let lib = load_library();
    let stone = lib.voxel_id("stone").unwrap();
    let m = manager(RuntimeConfig::default());
    m.initialize_chunk_map(GlobalChunkCoordinate::new(0, 0, 0), [1, 1, 1]);
    m.add_chunk(Arc::new(VoxelChunk::new(GlobalChunkCoordinate::new(0, 0, 0)))).unwrap();

    let at = GlobalVoxelCoordinate::new(2, 3, 4);
    m.voxel_handle(at).unwrap().set_type(stone);
    let changes = m.drain_changed_voxels();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].coordinate, at);
    assert_eq!(changes[0].kind, VoxelChangeKind::TypeChanged { old: 0, new: stone });
    assert!(m.drain_changed_voxels().is_empty());
    assert!(m.voxel_handle(GlobalVoxelCoordinate::new(40, 0, 0)).is_none());
}

#[test]
fn visible_chunks_rebuild_and_invisible_ones_wait() {
    let lib = load_library();
    let m = manager(RuntimeConfig::default());
    let device = with_device(&m);
    m.initialize_chunk_map(GlobalChunkCoordinate::new(0, 0, 0), [2, 1, 1]);
    let seen = floor_chunk(&lib, GlobalChunkCoordinate::new(0, 0, 0));
    let hidden = floor_chunk(&lib, GlobalChunkCoordinate::new(1, 0, 0));
    seen.set_visible(true);
    m.add_chunk(Arc::clone(&seen)).unwrap();
    m.add_chunk(Arc::clone(&hidden)).unwrap();

    assert!(m.process_rebuild_queue() >= 1);
    assert!(seen.has_primitive());
    assert!(!hidden.has_primitive());
    assert!(device.uploads() >= 1);
    assert!(m.stats().skipped_invisible >= 1);

    // once the renderer sees the chunk without a mesh it is queued again
    m.mark_visible(&hidden, 7);
    assert!(m.queued_chunks() >= 1);
    m.process_rebuild_queue();
    assert!(hidden.has_primitive());
    assert_eq!(m.stats().live_chunks, 2);
}

#[test]
fn edits_made_off_screen_are_built_once_visible_again() {
    let lib = load_library();
    let stone = lib.voxel_id("stone").unwrap();
    let m = manager(RuntimeConfig::default());
    with_device(&m);
    m.initialize_chunk_map(GlobalChunkCoordinate::new(0, 0, 0), [1, 1, 1]);
    let chunk = floor_chunk(&lib, GlobalChunkCoordinate::new(0, 0, 0));
    m.add_chunk(Arc::clone(&chunk)).unwrap();
    m.mark_visible(&chunk, 1);
    m.process_rebuild_queue();
    let quads = || chunk.primitive().unwrap().mesh.quad_count();
    let before = quads();

    chunk.set_visible(false);
    VoxelHandle::new(Arc::clone(&chunk), LocalVoxelCoordinate::new(3, 1, 3)).set_type(stone);
    assert_eq!(m.process_rebuild_queue(), 0);
    assert_eq!(quads(), before);

    m.mark_visible(&chunk, 2);
    assert_eq!(m.queued_chunks(), 1);
    assert_eq!(m.process_rebuild_queue(), 1);
    assert_ne!(quads(), before);

    // the mark is consumed by the rebuild
    m.mark_visible(&chunk, 3);
    assert_eq!(m.queued_chunks(), 0);
}

#[test]
fn nothing_is_built_without_a_live_device() {
    let lib = load_library();
    let m = manager(RuntimeConfig::default());
    m.initialize_chunk_map(GlobalChunkCoordinate::new(0, 0, 0), [1, 1, 1]);
    let chunk = floor_chunk(&lib, GlobalChunkCoordinate::new(0, 0, 0));
    chunk.set_visible(true);
    m.add_chunk(Arc::clone(&chunk)).unwrap();
    assert_eq!(m.process_rebuild_queue(), 0);
    assert!(!chunk.has_primitive());

    let device = with_device(&m);
    device.dispose();
    m.invalidate_chunk(&chunk);
    assert_eq!(m.process_rebuild_queue(), 0);
    assert_eq!(device.uploads(), 0);
}

#[test]
fn eviction_drops_the_stalest_invisible_mesh() {
    let lib = load_library();
    let config = RuntimeConfig {
        max_live_chunks: 1,
        ..RuntimeConfig::default()
    };
    let m = manager(config);
    with_device(&m);
    m.initialize_chunk_map(GlobalChunkCoordinate::new(0, 0, 0), [2, 1, 1]);
    let old = floor_chunk(&lib, GlobalChunkCoordinate::new(0, 0, 0));
    let new = floor_chunk(&lib, GlobalChunkCoordinate::new(1, 0, 0));
    m.add_chunk(Arc::clone(&old)).unwrap();
    m.add_chunk(Arc::clone(&new)).unwrap();

    m.mark_visible(&old, 1);
    m.process_rebuild_queue();
    assert!(old.has_primitive());

    old.set_visible(false);
    m.mark_visible(&new, 2);
    m.invalidate_chunk(&new);
    m.process_rebuild_queue();
    assert!(new.has_primitive());
    assert!(!old.has_primitive());
    assert_eq!(m.stats().live_chunks, 1);
    assert!(m.stats().evictions >= 1);
}

#[test]
fn border_edits_invalidate_the_neighbor_chunk() {
    let lib = load_library();
    let stone = lib.voxel_id("stone").unwrap();
    let m = manager(RuntimeConfig::default());
    with_device(&m);
    m.initialize_chunk_map(GlobalChunkCoordinate::new(0, 0, 0), [2, 1, 1]);
    let west = floor_chunk(&lib, GlobalChunkCoordinate::new(0, 0, 0));
    let east = floor_chunk(&lib, GlobalChunkCoordinate::new(1, 0, 0));
    for c in [&west, &east] {
        c.set_visible(true);
        m.add_chunk(Arc::clone(c)).unwrap();
    }
    m.process_rebuild_queue();
    assert_eq!(m.queued_chunks(), 0);
    assert!(east.data.cached_slice(1).0.is_some());

    // last column of the west chunk, one above the floor
    let handle = VoxelHandle::new(Arc::clone(&west), LocalVoxelCoordinate::new(15, 1, 8));
    handle.set_type(stone);
    assert!(east.data.cached_slice(1).0.is_none());
    let queued = drain_queue(&m);
    assert!(queued.contains(&west.id()));
    assert!(queued.contains(&east.id()));
}

#[test]
fn interior_edits_leave_neighbors_alone() {
    let lib = load_library();
    let stone = lib.voxel_id("stone").unwrap();
    let m = manager(RuntimeConfig::default());
    with_device(&m);
    m.initialize_chunk_map(GlobalChunkCoordinate::new(0, 0, 0), [2, 1, 1]);
    let west = floor_chunk(&lib, GlobalChunkCoordinate::new(0, 0, 0));
    let east = floor_chunk(&lib, GlobalChunkCoordinate::new(1, 0, 0));
    for c in [&west, &east] {
        c.set_visible(true);
        m.add_chunk(Arc::clone(c)).unwrap();
    }
    m.process_rebuild_queue();

    VoxelHandle::new(Arc::clone(&west), LocalVoxelCoordinate::new(7, 1, 8)).set_type(stone);
    assert_eq!(drain_queue(&m), vec![west.id()]);
}

#[test]
fn moving_the_viewing_level_requeues_affected_chunks() {
    let lib = load_library();
    let m = manager(RuntimeConfig::default());
    with_device(&m);
    m.initialize_chunk_map(GlobalChunkCoordinate::new(0, 0, 0), [1, 2, 1]);
    let low = floor_chunk(&lib, GlobalChunkCoordinate::new(0, 0, 0));
    let high = floor_chunk(&lib, GlobalChunkCoordinate::new(0, 1, 0));
    for c in [&low, &high] {
        c.set_visible(true);
        m.add_chunk(Arc::clone(c)).unwrap();
    }
    m.process_rebuild_queue();

    m.set_max_viewing_level(5);
    assert_eq!(m.max_viewing_level(), 5);
    let queued = drain_queue(&m);
    assert!(queued.contains(&low.id()));
    assert!(queued.contains(&high.id()));

    // a move inside the low chunk leaves the high one cached
    m.process_rebuild_queue();
    m.set_max_viewing_level(8);
    assert_eq!(drain_queue(&m), vec![low.id()]);
}

#[test]
fn water_falls_between_chunks_and_rebuilds_their_liquid() {
    let m = manager(RuntimeConfig::default());
    with_device(&m);
    m.initialize_chunk_map(GlobalChunkCoordinate::new(0, 0, 0), [1, 2, 1]);
    let low = Arc::new(VoxelChunk::new(GlobalChunkCoordinate::new(0, 0, 0)));
    let high = Arc::new(VoxelChunk::new(GlobalChunkCoordinate::new(0, 1, 0)));
    high.data.set_liquid(3, 0, 3, packed::with_liquid_type(0, 1));
    m.add_chunk(Arc::clone(&low)).unwrap();
    m.add_chunk(Arc::clone(&high)).unwrap();

    assert_eq!(m.step_water(), 1);
    assert!(!high.data.has_liquid());
    assert!(low.data.has_liquid());
    let stats = m.stats();
    assert_eq!(stats.water_steps, 1);
    assert!(stats.liquid_rebuilds >= 2);
    assert!(low.liquid_primitive(1).is_some());
}

#[test]
fn falling_water_moves_once_per_step() {
    let m = manager(RuntimeConfig::default());
    with_device(&m);
    m.initialize_chunk_map(GlobalChunkCoordinate::new(0, 0, 0), [1, 3, 1]);
    let water = packed::with_liquid_type(0, 1);
    let chunks: Vec<_> = (0..3)
        .map(|y| Arc::new(VoxelChunk::new(GlobalChunkCoordinate::new(0, y, 0))))
        .collect();
    // a still ocean cell keeps the lower chunks stepping
    for c in &chunks[..2] {
        c.data.set_liquid(20, 0, 20, packed::with_ocean(water, true));
    }
    chunks[2].data.set_liquid(3, 0, 3, water);
    chunks[1].data.set_liquid(5, 0, 5, water);
    for c in &chunks {
        m.add_chunk(Arc::clone(c)).unwrap();
    }

    m.step_water();
    assert_eq!(chunks[1].data.liquid(3, 31, 3), water);
    assert_eq!(chunks[1].data.liquid(3, 30, 3), 0);
    assert_eq!(chunks[0].data.liquid(5, 31, 5), water);
    assert_eq!(chunks[0].data.liquid(5, 30, 5), 0);
}

#[test]
fn workers_build_tick_and_shut_down() {
    let lib = load_library();
    let config = RuntimeConfig {
        update_interval_ms: 10,
        water_min_interval_ms: 10,
        water_max_interval_ms: 40,
        ..RuntimeConfig::default()
    };
    let m = manager(config);
    with_device(&m);
    m.initialize_chunk_map(GlobalChunkCoordinate::new(0, 0, 0), [1, 1, 1]);
    let chunk = floor_chunk(&lib, GlobalChunkCoordinate::new(0, 0, 0));
    chunk.set_visible(true);
    m.add_chunk(Arc::clone(&chunk)).unwrap();

    m.start_threads().unwrap();
    assert!(m.threads_running());
    m.start_threads().unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while !(chunk.has_primitive() && m.stats().update_ticks > 0) && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(10));
    }
    m.shutdown();

    assert!(!m.threads_running());
    assert!(chunk.has_primitive());
    assert!(m.stats().update_ticks > 0);
    assert!(!m.light_registry().is_active());
    assert!(!m.motes().is_active());
}
