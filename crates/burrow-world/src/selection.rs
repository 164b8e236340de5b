//! Packed 32-bit voxel IDs for GPU picking.
//!
//! Layout, high to low: 1 marker bit, 7 bits Y, 12 bits X, 12 bits Z. Coordinates outside
//! those ranges are truncated to their low bits.

use crate::GlobalVoxelCoordinate;

const MARKER: u32 = 0x8000_0000;
const Y_SHIFT: u32 = 24;
const X_SHIFT: u32 = 12;
const Y_MASK: u32 = 0x7F;
const XZ_MASK: u32 = 0xFFF;

pub fn selection_id(v: GlobalVoxelCoordinate) -> u32 {
    MARKER
        | ((v.y as u32 & Y_MASK) << Y_SHIFT)
        | ((v.x as u32 & XZ_MASK) << X_SHIFT)
        | (v.z as u32 & XZ_MASK)
}

/// Decodes an ID produced by [`selection_id`]; IDs without the marker bit belong to
/// other pickable objects.
pub fn try_voxel_from_selection_id(id: u32) -> Option<GlobalVoxelCoordinate> {
    if id & MARKER == 0 {
        return None;
    }
    Some(GlobalVoxelCoordinate::new(
        ((id >> X_SHIFT) & XZ_MASK) as i32,
        ((id >> Y_SHIFT) & Y_MASK) as i32,
        (id & XZ_MASK) as i32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_of_encodable_range() {
        for (x, y, z) in [(0, 0, 0), (4095, 127, 4095), (17, 64, 3000)] {
            let v = GlobalVoxelCoordinate::new(x, y, z);
            assert_eq!(try_voxel_from_selection_id(selection_id(v)), Some(v));
        }
    }

    #[test]
    fn out_of_range_truncates() {
        let v = GlobalVoxelCoordinate::new(4096 + 5, 128 + 2, 4096);
        let back = try_voxel_from_selection_id(selection_id(v));
        assert_eq!(back, Some(GlobalVoxelCoordinate::new(5, 2, 0)));
    }

    #[test]
    fn ids_without_marker_are_rejected() {
        assert_eq!(try_voxel_from_selection_id(0x1234), None);
    }
}
