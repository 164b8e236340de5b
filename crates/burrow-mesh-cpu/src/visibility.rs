use burrow_chunk::{NeighborLookup, RampType, VoxelSample};
use burrow_voxels::VoxelLibrary;
use burrow_world::GlobalVoxelCoordinate;

use crate::face::BoxFace;

/// Lattice `(x, z)` of the two top corners on the edge a side face shares with its
/// neighbor, as seen from this voxel and from the neighbor.
fn shared_edge(face: BoxFace) -> [((i32, i32), (i32, i32)); 2] {
    match face {
        BoxFace::Right => [((1, 0), (0, 0)), ((1, 1), (0, 1))],
        BoxFace::Left => [((0, 0), (1, 0)), ((0, 1), (1, 1))],
        BoxFace::Front => [((0, 1), (0, 0)), ((1, 1), (1, 0))],
        BoxFace::Back => [((0, 0), (0, 1)), ((1, 0), (1, 1))],
        BoxFace::Top | BoxFace::Bottom => [((0, 0), (0, 0)); 2],
    }
}

/// Whether a side face must be drawn because the neighbor's ramp opens a gap above it.
///
/// True when, for either pair of coincident top corners on the shared edge, this voxel's
/// corner is full height and the neighbor's is sunk.
pub fn check_ramps(mine: RampType, neighbor: RampType, face: BoxFace) -> bool {
    if !face.is_side() || neighbor.is_none() {
        return false;
    }
    shared_edge(face).iter().any(|&((mx, mz), (nx, nz))| {
        !mine.intersects(RampType::corner_at(mx, mz))
            && neighbor.intersects(RampType::corner_at(nx, nz))
    })
}

/// Culling for one face of a non-empty voxel.
pub fn is_face_visible(
    lookup: &dyn NeighborLookup,
    library: &VoxelLibrary,
    coord: GlobalVoxelCoordinate,
    here: VoxelSample,
    face: BoxFace,
    max_viewing_level: i32,
) -> bool {
    let n = coord + face.delta();
    if n.y >= max_viewing_level {
        return true;
    }
    let Some(there) = lookup.sample(n) else {
        return true;
    };
    if there.is_empty() || library.voxel_primitive(there.type_id).is_none() {
        return true;
    }
    let here_type = library.voxel_type(here.type_id);
    let there_type = library.voxel_type(there.type_id);
    let here_transparent = here_type.is_some_and(|t| t.is_transparent);
    if !here_transparent && there_type.is_some_and(|t| t.is_transparent) {
        return true;
    }
    face.is_side()
        && there.explored()
        && there_type.is_some_and(|t| t.can_ramp)
        && check_ramps(here.ramp(), there.ramp(), face)
}

/// A face is drawn when the voxel is below the viewing level, has geometry and the face
/// is not culled.
pub fn should_draw_face(
    lookup: &dyn NeighborLookup,
    library: &VoxelLibrary,
    coord: GlobalVoxelCoordinate,
    here: VoxelSample,
    face: BoxFace,
    max_viewing_level: i32,
) -> bool {
    coord.y < max_viewing_level
        && !here.is_empty()
        && library.voxel_primitive(here.type_id).is_some()
        && is_face_visible(lookup, library, coord, here, face, max_viewing_level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sunk_neighbor_corner_exposes_side() {
        // the +X neighbor sinks its back-left corner, which touches our back-right corner
        assert!(check_ramps(RampType::NONE, RampType::TOP_BACK_LEFT, BoxFace::Right));
        assert!(!check_ramps(RampType::TOP_BACK_RIGHT, RampType::TOP_BACK_LEFT, BoxFace::Right));
        // corners on the far side of the neighbor do not matter
        assert!(!check_ramps(RampType::NONE, RampType::RIGHT, BoxFace::Right));
        assert!(!check_ramps(RampType::NONE, RampType::ALL, BoxFace::Top));
    }
}
