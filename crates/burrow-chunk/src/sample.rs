use burrow_world::GlobalVoxelCoordinate;

use crate::handle::VoxelHandle;
use crate::packed;
use crate::ramp::RampType;

/// Copy of one voxel's packed bytes at the moment it was read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoxelSample {
    pub type_id: u8,
    pub grass: u8,
    pub decal: u8,
    pub flags: u8,
}

impl VoxelSample {
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.type_id == 0
    }

    #[inline]
    pub const fn grass_type(&self) -> u8 {
        packed::grass_type(self.grass)
    }

    #[inline]
    pub const fn grass_decay(&self) -> u8 {
        packed::grass_decay(self.grass)
    }

    #[inline]
    pub const fn decal_type(&self) -> u8 {
        packed::decal_type(self.decal)
    }

    #[inline]
    pub const fn ramp(&self) -> RampType {
        RampType::from_bits(packed::ramp(self.flags))
    }

    #[inline]
    pub const fn sunlight(&self) -> bool {
        packed::sunlight(self.flags)
    }

    #[inline]
    pub const fn explored(&self) -> bool {
        packed::explored(self.flags)
    }

    #[inline]
    pub const fn player_built(&self) -> bool {
        packed::player_built(self.flags)
    }
}

/// Read access to voxels by global coordinate. `None` means the voxel is outside any
/// loaded chunk; callers treat that as an absent neighbor.
pub trait NeighborLookup: Sync {
    fn sample(&self, coord: GlobalVoxelCoordinate) -> Option<VoxelSample>;
}

/// Write access to voxels by global coordinate.
pub trait VoxelAccess: NeighborLookup {
    fn handle(&self, coord: GlobalVoxelCoordinate) -> Option<VoxelHandle>;
}
