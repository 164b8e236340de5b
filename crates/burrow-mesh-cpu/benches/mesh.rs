use std::collections::HashMap;
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

use criterion::{Criterion, criterion_group, criterion_main};

use burrow_chunk::{SliceMesher, VoxelChunk, VoxelHandle};
use burrow_mesh_cpu::{ChunkNeighborhood, VoxelListPrimitive, recalculate_ramps};
use burrow_voxels::VoxelLibrary;
use burrow_world::{GlobalChunkCoordinate, GlobalVoxelCoordinate};

fn load_library() -> VoxelLibrary {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    VoxelLibrary::from_path(root.join("../../assets/voxels/library.toml")).unwrap()
}

/// A 3x1x3 block of chunks filled with rolling dirt hills capped with grass.
fn hills(lib: &VoxelLibrary) -> HashMap<GlobalChunkCoordinate, Arc<VoxelChunk>> {
    let dirt = lib.voxel_id("dirt").unwrap();
    let grass = lib.grass_id("grass").unwrap();
    let mut chunks = HashMap::new();
    for cz in -1..=1 {
        for cx in -1..=1 {
            let id = GlobalChunkCoordinate::new(cx, 0, cz);
            chunks.insert(id, Arc::new(VoxelChunk::new(id)));
        }
    }
    for z in -16..32 {
        for x in -16..32 {
            let h = 6 + ((x as f32 * 0.3).sin() * 3.0 + (z as f32 * 0.2).cos() * 3.0) as i32;
            for y in 0..=h {
                let c = GlobalVoxelCoordinate::new(x, y, z);
                let v = VoxelHandle::new(Arc::clone(&chunks[&c.chunk()]), c.local());
                v.set_type(dirt);
                v.set_explored(true);
                v.set_sunlight(y == h);
                if y == h {
                    v.set_grass_type(grass);
                }
            }
        }
    }
    chunks
}

fn bench_build_chunk(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_chunk");
    group.measurement_time(Duration::from_secs(8));
    let lib = load_library();
    let chunks = hills(&lib);
    let center = Arc::clone(&chunks[&GlobalChunkCoordinate::new(0, 0, 0)]);
    let n = ChunkNeighborhood::gather(center, |id| chunks.get(&id).cloned());
    recalculate_ramps(&n, n.center(), &lib, 16);

    group.bench_function("hills_16x16x16", |b| {
        b.iter(|| {
            let mesher = VoxelListPrimitive::new(&n, &lib, 16);
            let mut quads = 0;
            for y in 0..mesher.visible_slices(n.center().id()) {
                quads += mesher.build_slice(n.center(), y).quad_count();
            }
            black_box(quads);
        })
    });
    group.bench_function("recalculate_ramps", |b| {
        b.iter(|| black_box(recalculate_ramps(&n, n.center(), &lib, 16)))
    });
    group.finish();
}

criterion_group!(benches, bench_build_chunk);
criterion_main!(benches);
