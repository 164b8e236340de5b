//! Compile-time chunk dimensions.

pub const CHUNK_SIZE_X: usize = 16;
pub const CHUNK_SIZE_Y: usize = 16;
pub const CHUNK_SIZE_Z: usize = 16;

pub const X_DIV_SHIFT: i32 = 4;
pub const Y_DIV_SHIFT: i32 = 4;
pub const Z_DIV_SHIFT: i32 = 4;

pub const X_MOD_MASK: i32 = CHUNK_SIZE_X as i32 - 1;
pub const Y_MOD_MASK: i32 = CHUNK_SIZE_Y as i32 - 1;
pub const Z_MOD_MASK: i32 = CHUNK_SIZE_Z as i32 - 1;

pub const CHUNK_VOXEL_COUNT: usize = CHUNK_SIZE_X * CHUNK_SIZE_Y * CHUNK_SIZE_Z;
pub const SLICE_VOXEL_COUNT: usize = CHUNK_SIZE_X * CHUNK_SIZE_Z;

/// Liquid cells per voxel along each axis.
pub const LIQUID_SCALE: usize = 2;
pub const LIQUID_CHUNK_SIZE_X: usize = CHUNK_SIZE_X * LIQUID_SCALE;
pub const LIQUID_CHUNK_SIZE_Y: usize = CHUNK_SIZE_Y * LIQUID_SCALE;
pub const LIQUID_CHUNK_SIZE_Z: usize = CHUNK_SIZE_Z * LIQUID_SCALE;
pub const LIQUID_CHUNK_CELL_COUNT: usize =
    LIQUID_CHUNK_SIZE_X * LIQUID_CHUNK_SIZE_Y * LIQUID_CHUNK_SIZE_Z;

const _: () = assert!(1 << X_DIV_SHIFT == CHUNK_SIZE_X);
const _: () = assert!(1 << Y_DIV_SHIFT == CHUNK_SIZE_Y);
const _: () = assert!(1 << Z_DIV_SHIFT == CHUNK_SIZE_Z);
