use core::ops::{BitAnd, BitOr, BitOrAssign};

/// Which top corners of a voxel are sunk by half a unit.
///
/// Front is +Z, right is +X.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RampType(u8);

impl RampType {
    pub const NONE: RampType = RampType(0);
    pub const TOP_FRONT_LEFT: RampType = RampType(0x1);
    pub const TOP_FRONT_RIGHT: RampType = RampType(0x2);
    pub const TOP_BACK_LEFT: RampType = RampType(0x4);
    pub const TOP_BACK_RIGHT: RampType = RampType(0x8);
    pub const FRONT: RampType = RampType(0x1 | 0x2);
    pub const BACK: RampType = RampType(0x4 | 0x8);
    pub const LEFT: RampType = RampType(0x1 | 0x4);
    pub const RIGHT: RampType = RampType(0x2 | 0x8);
    pub const ALL: RampType = RampType(0xF);

    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        RampType(bits & crate::packed::RAMP_MASK)
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 & Self::ALL.0 == 0
    }

    /// True when any corner of `other` is set here.
    #[inline]
    pub const fn intersects(self, other: RampType) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub const fn corner_count(self) -> u32 {
        (self.0 & Self::ALL.0).count_ones()
    }

    /// Corner at lattice offset `(dx, dz)`, each 0 or 1.
    #[inline]
    pub const fn corner_at(dx: i32, dz: i32) -> RampType {
        match (dx, dz) {
            (0, 1) => Self::TOP_FRONT_LEFT,
            (1, 1) => Self::TOP_FRONT_RIGHT,
            (0, 0) => Self::TOP_BACK_LEFT,
            _ => Self::TOP_BACK_RIGHT,
        }
    }
}

impl BitOr for RampType {
    type Output = RampType;
    #[inline]
    fn bitor(self, rhs: RampType) -> RampType {
        RampType(self.0 | rhs.0)
    }
}

impl BitOrAssign for RampType {
    #[inline]
    fn bitor_assign(&mut self, rhs: RampType) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for RampType {
    type Output = RampType;
    #[inline]
    fn bitand(self, rhs: RampType) -> RampType {
        RampType(self.0 & rhs.0)
    }
}

/// The four top corners with the horizontal direction (`-1`/`+1` on X and Z) each one faces.
pub const CORNERS: [(RampType, i32, i32); 4] = [
    (RampType::TOP_FRONT_LEFT, -1, 1),
    (RampType::TOP_FRONT_RIGHT, 1, 1),
    (RampType::TOP_BACK_LEFT, -1, -1),
    (RampType::TOP_BACK_RIGHT, 1, -1),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corner_table_agrees_with_lattice_lookup() {
        for (corner, dx, dz) in CORNERS {
            let lx = if dx > 0 { 1 } else { 0 };
            let lz = if dz > 0 { 1 } else { 0 };
            assert_eq!(RampType::corner_at(lx, lz), corner);
        }
        assert_eq!(RampType::ALL.corner_count(), 4);
        assert!((RampType::LEFT | RampType::RIGHT) == RampType::ALL);
    }
}
