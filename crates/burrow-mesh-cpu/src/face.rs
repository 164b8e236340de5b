use burrow_geom::Vec3;
use burrow_world::GlobalVoxelOffset;

/// One face of a voxel box. Front is +Z, right is +X.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum BoxFace {
    Top = 0,
    Bottom = 1,
    Front = 2,
    Back = 3,
    Left = 4,
    Right = 5,
}

// Unit-cube corners of each face, listed around the perimeter. Top-face corners and the
// upper corners of side faces are the ones a ramp lowers.
const CORNERS: [[(u8, u8, u8); 4]; 6] = [
    [(0, 1, 0), (1, 1, 0), (1, 1, 1), (0, 1, 1)],
    [(0, 0, 0), (0, 0, 1), (1, 0, 1), (1, 0, 0)],
    [(0, 0, 1), (1, 0, 1), (1, 1, 1), (0, 1, 1)],
    [(1, 0, 0), (0, 0, 0), (0, 1, 0), (1, 1, 0)],
    [(0, 0, 0), (0, 0, 1), (0, 1, 1), (0, 1, 0)],
    [(1, 0, 1), (1, 0, 0), (1, 1, 0), (1, 1, 1)],
];

impl BoxFace {
    pub const ALL: [BoxFace; 6] = [
        BoxFace::Top,
        BoxFace::Bottom,
        BoxFace::Front,
        BoxFace::Back,
        BoxFace::Left,
        BoxFace::Right,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn is_side(self) -> bool {
        !matches!(self, BoxFace::Top | BoxFace::Bottom)
    }

    /// Grid step out of this face.
    #[inline]
    pub const fn delta(self) -> GlobalVoxelOffset {
        match self {
            BoxFace::Top => GlobalVoxelOffset::new(0, 1, 0),
            BoxFace::Bottom => GlobalVoxelOffset::new(0, -1, 0),
            BoxFace::Front => GlobalVoxelOffset::new(0, 0, 1),
            BoxFace::Back => GlobalVoxelOffset::new(0, 0, -1),
            BoxFace::Left => GlobalVoxelOffset::new(-1, 0, 0),
            BoxFace::Right => GlobalVoxelOffset::new(1, 0, 0),
        }
    }

    #[inline]
    pub fn normal(self) -> Vec3 {
        let d = self.delta();
        Vec3::new(d.x as f32, d.y as f32, d.z as f32)
    }

    /// Corner offsets inside the unit cube, each component 0 or 1.
    #[inline]
    pub fn corners(self) -> [(u8, u8, u8); 4] {
        CORNERS[self.index()]
    }

    /// Texture coordinates of a corner, `(0, 0)` at the tile's top-left.
    #[inline]
    pub fn corner_uv(self, (x, y, z): (u8, u8, u8)) -> (f32, f32) {
        let (x, y, z) = (f32::from(x), f32::from(y), f32::from(z));
        match self {
            BoxFace::Top | BoxFace::Bottom => (x, z),
            BoxFace::Front => (x, 1.0 - y),
            BoxFace::Back => (1.0 - x, 1.0 - y),
            BoxFace::Left => (z, 1.0 - y),
            BoxFace::Right => (1.0 - z, 1.0 - y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_lie_on_their_face() {
        for face in BoxFace::ALL {
            let d = face.delta();
            for (x, y, z) in face.corners() {
                let along = match (d.x, d.y, d.z) {
                    (1, _, _) | (-1, _, _) => (x, d.x),
                    (_, 1, _) | (_, -1, _) => (y, d.y),
                    _ => (z, d.z),
                };
                assert_eq!(along.0 == 1, along.1 == 1, "{face:?}");
            }
        }
    }
}
