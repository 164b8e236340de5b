use core::hash::{Hash, Hasher};
use core::ops::{Add, Sub};

use burrow_geom::Vec3;
use serde::{Deserialize, Serialize};

use crate::constants::{
    CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z, X_DIV_SHIFT, X_MOD_MASK, Y_DIV_SHIFT, Y_MOD_MASK,
    Z_DIV_SHIFT, Z_MOD_MASK,
};

#[inline]
fn cheap_hash(x: i32, y: i32, z: i32) -> u32 {
    let (x, y, z) = (x as u32, y as u32, z as u32);
    x ^ y.rotate_left(10) ^ z.rotate_left(20)
}

/// Absolute voxel position in the world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GlobalVoxelCoordinate {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GlobalVoxelCoordinate {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Floor division by the chunk size; correct for negative coordinates.
    #[inline]
    pub const fn chunk(self) -> GlobalChunkCoordinate {
        GlobalChunkCoordinate::new(
            self.x >> X_DIV_SHIFT,
            self.y >> Y_DIV_SHIFT,
            self.z >> Z_DIV_SHIFT,
        )
    }

    #[inline]
    pub const fn local(self) -> LocalVoxelCoordinate {
        LocalVoxelCoordinate {
            x: (self.x & X_MOD_MASK) as u8,
            y: (self.y & Y_MOD_MASK) as u8,
            z: (self.z & Z_MOD_MASK) as u8,
        }
    }

    #[inline]
    pub const fn from_chunk_local(chunk: GlobalChunkCoordinate, local: LocalVoxelCoordinate) -> Self {
        let origin = chunk.origin();
        Self::new(
            origin.x + local.x as i32,
            origin.y + local.y as i32,
            origin.z + local.z as i32,
        )
    }

    /// Voxel containing the point.
    #[inline]
    pub fn from_vec3(p: Vec3) -> Self {
        Self::new(p.x.floor() as i32, p.y.floor() as i32, p.z.floor() as i32)
    }

    #[inline]
    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(self.x as f32, self.y as f32, self.z as f32)
    }

    #[inline]
    pub fn center(self) -> Vec3 {
        self.to_vec3() + Vec3::new(0.5, 0.5, 0.5)
    }

    #[inline]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl Hash for GlobalVoxelCoordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(cheap_hash(self.x, self.y, self.z));
    }
}

impl Add<GlobalVoxelOffset> for GlobalVoxelCoordinate {
    type Output = GlobalVoxelCoordinate;
    #[inline]
    fn add(self, rhs: GlobalVoxelOffset) -> GlobalVoxelCoordinate {
        self.offset(rhs.x, rhs.y, rhs.z)
    }
}

impl Sub for GlobalVoxelCoordinate {
    type Output = GlobalVoxelOffset;
    #[inline]
    fn sub(self, rhs: GlobalVoxelCoordinate) -> GlobalVoxelOffset {
        GlobalVoxelOffset::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl From<(i32, i32, i32)> for GlobalVoxelCoordinate {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

/// A displacement between two voxel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GlobalVoxelOffset {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GlobalVoxelOffset {
    pub const UP: GlobalVoxelOffset = GlobalVoxelOffset::new(0, 1, 0);
    pub const DOWN: GlobalVoxelOffset = GlobalVoxelOffset::new(0, -1, 0);

    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl Add for GlobalVoxelOffset {
    type Output = GlobalVoxelOffset;
    #[inline]
    fn add(self, rhs: GlobalVoxelOffset) -> GlobalVoxelOffset {
        GlobalVoxelOffset::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GlobalChunkCoordinate {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl GlobalChunkCoordinate {
    #[inline]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// First voxel of the chunk.
    #[inline]
    pub const fn origin(self) -> GlobalVoxelCoordinate {
        GlobalVoxelCoordinate::new(
            self.x << X_DIV_SHIFT,
            self.y << Y_DIV_SHIFT,
            self.z << Z_DIV_SHIFT,
        )
    }

    #[inline]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// The 2D column this chunk belongs to.
    #[inline]
    pub const fn column(self) -> (i32, i32) {
        (self.x, self.z)
    }

    pub fn min_corner(self) -> Vec3 {
        self.origin().to_vec3()
    }

    pub fn max_corner(self) -> Vec3 {
        self.min_corner()
            + Vec3::new(CHUNK_SIZE_X as f32, CHUNK_SIZE_Y as f32, CHUNK_SIZE_Z as f32)
    }
}

impl Hash for GlobalChunkCoordinate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(cheap_hash(self.x, self.y, self.z));
    }
}

impl From<(i32, i32, i32)> for GlobalChunkCoordinate {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

/// Position inside a chunk; each axis is in `0..16`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalVoxelCoordinate {
    pub x: u8,
    pub y: u8,
    pub z: u8,
}

impl LocalVoxelCoordinate {
    #[inline]
    pub fn new(x: usize, y: usize, z: usize) -> Self {
        debug_assert!(x < CHUNK_SIZE_X && y < CHUNK_SIZE_Y && z < CHUNK_SIZE_Z);
        Self {
            x: x as u8,
            y: y as u8,
            z: z as u8,
        }
    }

    /// Structure-of-arrays index: `(y * sx * sz) + (z * sx) + x`.
    #[inline]
    pub const fn index(self) -> usize {
        (self.y as usize * CHUNK_SIZE_X * CHUNK_SIZE_Z)
            + (self.z as usize * CHUNK_SIZE_X)
            + self.x as usize
    }

    #[inline]
    pub const fn from_index(index: usize) -> Self {
        Self {
            x: (index % CHUNK_SIZE_X) as u8,
            y: (index / (CHUNK_SIZE_X * CHUNK_SIZE_Z)) as u8,
            z: ((index / CHUNK_SIZE_X) % CHUNK_SIZE_Z) as u8,
        }
    }

    /// Iterates every local coordinate of one Y slice, X fastest.
    pub fn slice(y: usize) -> impl Iterator<Item = LocalVoxelCoordinate> {
        (0..CHUNK_SIZE_Z)
            .flat_map(move |z| (0..CHUNK_SIZE_X).map(move |x| LocalVoxelCoordinate::new(x, y, z)))
    }

    /// True when the voxel touches the chunk's X or Z boundary.
    #[inline]
    pub const fn on_horizontal_edge(self) -> bool {
        self.x == 0
            || self.z == 0
            || self.x as usize == CHUNK_SIZE_X - 1
            || self.z as usize == CHUNK_SIZE_Z - 1
    }
}
