use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use burrow_chunk::{
    ChunkNotifier, GpuMesh, GraphicsDevice, SliceMesher, VoxelChangeEvent, VoxelChangeKind,
    VoxelChunk, VoxelHandle,
};
use burrow_geom::{MeshBuild, Quad, Vec3};
use burrow_world::{GlobalChunkCoordinate, GlobalVoxelCoordinate, LocalVoxelCoordinate};
use proptest::prelude::*;

struct CountingMesh(Arc<AtomicUsize>);

impl GpuMesh for CountingMesh {
    fn draw(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Default)]
struct TestDevice {
    disposed: AtomicBool,
    uploads: AtomicUsize,
    draws: Arc<AtomicUsize>,
}

impl GraphicsDevice for TestDevice {
    fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Relaxed)
    }

    fn upload(&self, _mesh: &MeshBuild) -> Option<Box<dyn GpuMesh>> {
        self.uploads.fetch_add(1, Ordering::Relaxed);
        Some(Box::new(CountingMesh(Arc::clone(&self.draws))))
    }
}

/// One quad per non-empty voxel; counts how many slices it was asked for.
#[derive(Default)]
struct QuadPerVoxel {
    slices_built: AtomicUsize,
}

impl SliceMesher for QuadPerVoxel {
    fn visible_slices(&self, _chunk: GlobalChunkCoordinate) -> usize {
        16
    }

    fn build_slice(&self, chunk: &VoxelChunk, y: usize) -> MeshBuild {
        self.slices_built.fetch_add(1, Ordering::Relaxed);
        let mut m = MeshBuild::default();
        for l in LocalVoxelCoordinate::slice(y) {
            if chunk.data.type_at(l) != 0 {
                let p = GlobalVoxelCoordinate::from_chunk_local(chunk.id(), l).to_vec3();
                m.push_quad(&Quad {
                    corners: [
                        p,
                        p + Vec3::new(1.0, 0.0, 0.0),
                        p + Vec3::new(1.0, 0.0, 1.0),
                        p + Vec3::new(0.0, 0.0, 1.0),
                    ],
                    normal: Vec3::UP,
                    uvs: [(0.0, 0.0); 4],
                    colors: [[255; 4]; 4],
                    tint: [255; 4],
                    flip: false,
                });
            }
        }
        m
    }
}

#[derive(Default)]
struct RecordingNotifier {
    invalidated: Mutex<Vec<GlobalChunkCoordinate>>,
    changes: Mutex<Vec<VoxelChangeEvent>>,
}

impl ChunkNotifier for RecordingNotifier {
    fn chunk_invalidated(&self, chunk: GlobalChunkCoordinate) {
        self.invalidated.lock().unwrap().push(chunk);
    }

    fn voxel_changed(&self, change: VoxelChangeEvent) {
        self.changes.lock().unwrap().push(change);
    }
}

fn attached_chunk() -> (Arc<VoxelChunk>, Arc<RecordingNotifier>) {
    let chunk = Arc::new(VoxelChunk::new(GlobalChunkCoordinate::new(1, 0, -1)));
    let notifier = Arc::new(RecordingNotifier::default());
    let weak: std::sync::Weak<dyn ChunkNotifier> = Arc::downgrade(&notifier) as std::sync::Weak<RecordingNotifier>;
    chunk.attach_notifier(weak);
    (chunk, notifier)
}

#[test]
fn rebuild_reuses_cached_slices() {
    let (chunk, _) = attached_chunk();
    let h = VoxelHandle::new(Arc::clone(&chunk), LocalVoxelCoordinate::new(1, 2, 3));
    h.set_type(1);
    let device = TestDevice::default();
    let mesher = QuadPerVoxel::default();

    assert!(chunk.rebuild(Some(&device), &mesher));
    assert_eq!(mesher.slices_built.load(Ordering::Relaxed), 1);
    let first = chunk.primitive().expect("primitive");
    assert_eq!(first.mesh.quad_count(), 1);

    assert!(chunk.rebuild(Some(&device), &mesher));
    assert_eq!(mesher.slices_built.load(Ordering::Relaxed), 1);
    assert_eq!(chunk.primitive().expect("primitive").mesh.vertex_count(), first.mesh.vertex_count());
    assert_eq!(device.uploads.load(Ordering::Relaxed), 2);

    assert!(chunk.render(&device));
    assert_eq!(device.draws.load(Ordering::Relaxed), 1);
}

#[test]
fn disposed_device_leaves_chunk_untouched() {
    let (chunk, _) = attached_chunk();
    let device = TestDevice::default();
    device.disposed.store(true, Ordering::Relaxed);
    assert!(!chunk.rebuild(Some(&device), &QuadPerVoxel::default()));
    assert!(!chunk.rebuild(None, &QuadPerVoxel::default()));
    assert!(!chunk.has_primitive());
    assert!(!chunk.render(&device));
}

#[test]
fn discard_keeps_voxels_and_drops_caches() {
    let (chunk, _) = attached_chunk();
    let l = LocalVoxelCoordinate::new(0, 0, 0);
    VoxelHandle::new(Arc::clone(&chunk), l).set_type(3);
    let device = TestDevice::default();
    chunk.rebuild(Some(&device), &QuadPerVoxel::default());
    chunk.set_slice_motes(0, Vec::new());
    chunk.discard_primitive();
    assert!(!chunk.has_primitive());
    assert_eq!(chunk.data.cached_slice_count(), 0);
    assert!(chunk.slice_motes(0).is_none());
    assert_eq!(chunk.data.type_at(l), 3);
}

#[test]
fn type_change_notifies_and_invalidates_adjacent_slices() {
    let (chunk, notifier) = attached_chunk();
    let device = TestDevice::default();
    let mesher = QuadPerVoxel::default();
    chunk.rebuild(Some(&device), &mesher);
    assert_eq!(chunk.data.cached_slice_count(), 16);

    let h = VoxelHandle::new(Arc::clone(&chunk), LocalVoxelCoordinate::new(4, 7, 4));
    h.set_type(2);
    assert_eq!(chunk.data.cached_slice_count(), 13);
    let changes = notifier.changes.lock().unwrap().clone();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].coordinate, GlobalVoxelCoordinate::new(20, 7, -12));
    assert_eq!(changes[0].kind, VoxelChangeKind::TypeChanged { old: 0, new: 2 });
    assert!(!notifier.invalidated.lock().unwrap().is_empty());

    // writing the same type again is not a change
    h.set_type(2);
    assert_eq!(notifier.changes.lock().unwrap().len(), 1);
}

#[test]
fn clearing_a_voxel_clears_its_overlays() {
    let (chunk, _) = attached_chunk();
    let h = VoxelHandle::new(Arc::clone(&chunk), LocalVoxelCoordinate::new(2, 2, 2));
    h.set_type(1);
    h.set_grass_type(3);
    h.set_grass_decay(9);
    h.set_decal_type(4);
    h.set_pathing_hint(true);
    assert_eq!(h.grass_type(), 3);
    assert_eq!(h.grass_decay(), 9);
    h.set_type(0);
    assert_eq!(h.grass_type(), 0);
    assert_eq!(h.decal_type(), 0);
    assert!(!h.pathing_hint());
}

proptest! {
    #[test]
    fn slice_counts_match_contents(writes in prop::collection::vec((0usize..16, 0usize..16, 0usize..16, 0u8..4), 0..200)) {
        let chunk = Arc::new(VoxelChunk::new(GlobalChunkCoordinate::new(0, 0, 0)));
        for (x, y, z, t) in writes {
            VoxelHandle::new(Arc::clone(&chunk), LocalVoxelCoordinate::new(x, y, z)).set_type(t);
        }
        for y in 0..16 {
            let expected = LocalVoxelCoordinate::slice(y).filter(|l| chunk.data.type_at(*l) != 0).count();
            prop_assert_eq!(usize::from(chunk.data.voxels_present_in_slice(y)), expected);
        }
    }
}
