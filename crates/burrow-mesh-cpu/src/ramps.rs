use burrow_chunk::{CORNERS, NeighborLookup, RampType, VoxelAccess, VoxelChunk, packed};
use burrow_voxels::VoxelLibrary;
use burrow_world::constants::{CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z};
use burrow_world::{GlobalVoxelCoordinate, GlobalVoxelOffset, LocalVoxelCoordinate};

/// Ramp corners of the voxel at `coord`.
///
/// A corner sinks when any of the three horizontal voxels sharing its vertical edge exists
/// and is empty. Only visible, ramp-capable voxels with nothing solid above them ramp.
pub fn compute_ramp<L: NeighborLookup + ?Sized>(
    lookup: &L,
    library: &VoxelLibrary,
    coord: GlobalVoxelCoordinate,
    max_viewing_level: i32,
) -> RampType {
    let Some(here) = lookup.sample(coord) else {
        return RampType::NONE;
    };
    if here.is_empty()
        || coord.y >= max_viewing_level
        || !library.voxel_type(here.type_id).is_some_and(|t| t.can_ramp)
    {
        return RampType::NONE;
    }
    if lookup
        .sample(coord + GlobalVoxelOffset::UP)
        .is_some_and(|above| !above.is_empty())
    {
        return RampType::NONE;
    }
    let open = |dx: i32, dz: i32| {
        lookup
            .sample(coord.offset(dx, 0, dz))
            .is_some_and(|s| s.is_empty())
    };
    let mut ramp = RampType::NONE;
    for (corner, dx, dz) in CORNERS {
        if open(dx, 0) || open(0, dz) || open(dx, dz) {
            ramp |= corner;
        }
    }
    ramp
}

/// Recomputes the ramp bits of every visible voxel in the center chunk of `access`, then
/// of the one-voxel ring around it in the horizontally adjacent chunks, whose ramps
/// depend on this chunk's voxels.
///
/// Changed slices of the center chunk, and slices facing a changed ring voxel, are dropped
/// from its cache without a rebuild request; the caller is about to rebuild it. Neighbor
/// chunks get their slice invalidated.
/// Returns the number of voxels whose ramp changed.
pub fn recalculate_ramps(
    access: &dyn VoxelAccess,
    chunk: &VoxelChunk,
    library: &VoxelLibrary,
    max_viewing_level: i32,
) -> usize {
    let origin = chunk.id().origin();
    let mut changed = 0usize;

    for y in 0..CHUNK_SIZE_Y {
        let mut slice_changed = false;
        for local in LocalVoxelCoordinate::slice(y) {
            let coord = GlobalVoxelCoordinate::from_chunk_local(chunk.id(), local);
            let ramp = compute_ramp(access, library, coord, max_viewing_level);
            let old = chunk
                .data
                .update_flags(local, |b| packed::with_ramp(b, ramp.bits()));
            if packed::ramp(old) == ramp.bits() {
                continue;
            }
            changed += 1;
            slice_changed = true;
            if local.on_horizontal_edge() {
                invalidate_adjacent_chunks(access, chunk, coord);
            }
        }
        if slice_changed {
            chunk.drop_cached_slice(y);
        }
    }

    let (x0, z0) = (origin.x - 1, origin.z - 1);
    let (x1, z1) = (origin.x + CHUNK_SIZE_X as i32, origin.z + CHUNK_SIZE_Z as i32);
    for y in origin.y..origin.y + CHUNK_SIZE_Y as i32 {
        for z in z0..=z1 {
            for x in x0..=x1 {
                if x != x0 && x != x1 && z != z0 && z != z1 {
                    continue;
                }
                let coord = GlobalVoxelCoordinate::new(x, y, z);
                let Some(handle) = access.handle(coord) else {
                    continue;
                };
                let ramp = compute_ramp(access, library, coord, max_viewing_level);
                if handle.set_ramp(ramp) {
                    changed += 1;
                    handle.chunk().invalidate_slice(usize::from(handle.local().y));
                    chunk.drop_cached_slice((y - origin.y) as usize);
                }
            }
        }
    }
    changed
}

// A ramp change on the border alters the neighbor's side faces against it.
fn invalidate_adjacent_chunks(access: &dyn VoxelAccess, chunk: &VoxelChunk, coord: GlobalVoxelCoordinate) {
    for n in burrow_world::neighbors::manhattan_2d(coord) {
        if n.chunk() == chunk.id() {
            continue;
        }
        if let Some(h) = access.handle(n) {
            h.chunk().invalidate_slice(usize::from(h.local().y));
        }
    }
}
