use burrow_chunk::NeighborLookup;
use burrow_voxels::{BoxTemplate, TransitionKind, UvRect, VoxelType};
use burrow_world::neighbors::MANHATTAN_2D;
use burrow_world::{GlobalVoxelCoordinate, GlobalVoxelOffset};

use crate::face::BoxFace;

/// Weight of each plane neighbor, in the order negative-U, positive-U, negative-V, positive-V.
const MULTIPLIERS: [u8; 4] = [2, 8, 4, 1];

const XY_PLANE: [GlobalVoxelOffset; 4] = [
    GlobalVoxelOffset::new(-1, 0, 0),
    GlobalVoxelOffset::new(1, 0, 0),
    GlobalVoxelOffset::new(0, -1, 0),
    GlobalVoxelOffset::new(0, 1, 0),
];

const ZY_PLANE: [GlobalVoxelOffset; 4] = [
    GlobalVoxelOffset::new(0, 0, -1),
    GlobalVoxelOffset::new(0, 0, 1),
    GlobalVoxelOffset::new(0, -1, 0),
    GlobalVoxelOffset::new(0, 1, 0),
];

/// 4-bit mask of which plane neighbors share `type_id`, weighted 2, 8, 4, 1.
pub fn compute_transition_value_on_plane(
    lookup: &dyn NeighborLookup,
    coord: GlobalVoxelCoordinate,
    type_id: u8,
    plane: &[GlobalVoxelOffset; 4],
) -> u8 {
    plane
        .iter()
        .zip(MULTIPLIERS)
        .filter(|(d, _)| {
            lookup
                .sample(coord + **d)
                .is_some_and(|s| s.type_id == type_id)
        })
        .map(|(_, m)| m)
        .sum()
}

/// Texture rectangle for `face`, honoring the type's transition tiles.
pub fn face_uv(
    lookup: &dyn NeighborLookup,
    coord: GlobalVoxelCoordinate,
    vtype: &VoxelType,
    template: &BoxTemplate,
    face: BoxFace,
) -> UvRect {
    match (vtype.transitions, face) {
        (TransitionKind::Horizontal, BoxFace::Top) => {
            let v = compute_transition_value_on_plane(lookup, coord, vtype.id, &MANHATTAN_2D);
            template.transition(v, template.top)
        }
        (_, BoxFace::Top) => template.top,
        (_, BoxFace::Bottom) => template.bottom,
        (TransitionKind::Vertical, BoxFace::Front | BoxFace::Back) => {
            let v = compute_transition_value_on_plane(lookup, coord, vtype.id, &XY_PLANE);
            template.transition(v, template.side)
        }
        (TransitionKind::Vertical, BoxFace::Left | BoxFace::Right) => {
            let v = compute_transition_value_on_plane(lookup, coord, vtype.id, &ZY_PLANE);
            template.transition(v, template.side)
        }
        _ => template.side,
    }
}
