use burrow_world::constants::{CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z};
use burrow_world::{
    GlobalChunkCoordinate, GlobalVoxelCoordinate, LocalVoxelCoordinate, selection_id,
    try_voxel_from_selection_id,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn chunk_times_size_plus_local_is_identity(x in any::<i32>(), y in any::<i32>(), z in any::<i32>()) {
        let v = GlobalVoxelCoordinate::new(x, y, z);
        let c = v.chunk();
        let l = v.local();
        let rebuilt = (
            c.x.wrapping_mul(CHUNK_SIZE_X as i32).wrapping_add(i32::from(l.x)),
            c.y.wrapping_mul(CHUNK_SIZE_Y as i32).wrapping_add(i32::from(l.y)),
            c.z.wrapping_mul(CHUNK_SIZE_Z as i32).wrapping_add(i32::from(l.z)),
        );
        prop_assert_eq!(rebuilt, (x, y, z));
        prop_assert_eq!(GlobalVoxelCoordinate::from_chunk_local(c, l), v);
    }

    #[test]
    fn local_axes_stay_in_chunk(x in any::<i32>(), y in any::<i32>(), z in any::<i32>()) {
        let l = GlobalVoxelCoordinate::new(x, y, z).local();
        prop_assert!((l.x as usize) < CHUNK_SIZE_X);
        prop_assert!((l.y as usize) < CHUNK_SIZE_Y);
        prop_assert!((l.z as usize) < CHUNK_SIZE_Z);
        prop_assert_eq!(LocalVoxelCoordinate::from_index(l.index()), l);
    }

    #[test]
    fn selection_id_round_trips_in_range(x in 0i32..4096, y in 0i32..128, z in 0i32..4096) {
        let v = GlobalVoxelCoordinate::new(x, y, z);
        prop_assert_eq!(try_voxel_from_selection_id(selection_id(v)), Some(v));
    }

    #[test]
    fn chunk_origin_maps_back_to_chunk(cx in -100_000i32..100_000, cy in -1000i32..1000, cz in -100_000i32..100_000) {
        let c = GlobalChunkCoordinate::new(cx, cy, cz);
        prop_assert_eq!(c.origin().chunk(), c);
        prop_assert_eq!(c.origin().local(), LocalVoxelCoordinate::default());
    }
}
