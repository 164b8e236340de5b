use burrow_geom::{MeshBuild, Quad, Vec3};
use burrow_voxels::{GrassType, UvRect};
use burrow_world::neighbors::{DIAGONAL_2D, MANHATTAN_2D};
use burrow_world::{GlobalVoxelCoordinate, GlobalVoxelOffset};

use crate::primitive::{FaceGeometry, VoxelListPrimitive};

// How far a fringe strip reaches into the neighbor, in voxels.
const FRINGE_REACH: f32 = 0.5;

// Indices into the top face's corner list (see `BoxFace::corners`) of the edge facing each
// manhattan direction, ordered so the strip runs the same way as the tile.
const EDGE_CORNERS: [(usize, usize); 4] = [(0, 3), (2, 1), (1, 0), (3, 2)];

/// Top-face corner index at lattice `(x, z)`.
#[inline]
fn top_corner_index(x: bool, z: bool) -> usize {
    match (x, z) {
        (false, false) => 0,
        (true, false) => 1,
        (true, true) => 2,
        (false, true) => 3,
    }
}

const UNIT_UVS: [(f32, f32); 4] = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];

fn uvs(rect: UvRect) -> [(f32, f32); 4] {
    UNIT_UVS.map(|(u, v)| rect.lerp(u, v))
}

impl VoxelListPrimitive<'_> {
    /// Whether grass of `precedence` may fringe into the voxel at `n`.
    ///
    /// The neighbor must be a visible solid with an open top and no grass of equal or
    /// higher precedence, so two grassy neighbors never fringe into each other.
    pub(crate) fn accepts_fringe(&self, n: GlobalVoxelCoordinate, precedence: i32) -> bool {
        if n.y >= self.max_viewing_level {
            return false;
        }
        let Some(s) = self.sample(n) else {
            return false;
        };
        if s.is_empty() {
            return false;
        }
        let above = n + GlobalVoxelOffset::UP;
        let top_open = above.y >= self.max_viewing_level
            || self.sample(above).is_none_or(|a| a.is_empty());
        if !top_open {
            return false;
        }
        match self.library.grass_type(s.grass_type()) {
            Some(theirs) => theirs.fringe_precedence < precedence,
            None => true,
        }
    }

    pub(crate) fn emit_fringe(
        &self,
        mesh: &mut MeshBuild,
        coord: GlobalVoxelCoordinate,
        grass: &GrassType,
        top: &FaceGeometry,
    ) {
        let Some(tiles) = grass.fringe else {
            return;
        };
        let precedence = grass.fringe_precedence;
        let eligible = MANHATTAN_2D.map(|d| self.accepts_fringe(coord + d, precedence));

        for ((d, (i, j)), ok) in MANHATTAN_2D.iter().zip(EDGE_CORNERS).zip(eligible) {
            if !ok {
                continue;
            }
            let out = Vec3::new(d.x as f32, 0.0, d.z as f32) * FRINGE_REACH;
            let (a, b) = (top.corners[i], top.corners[j]);
            mesh.push_quad(&Quad {
                corners: [a, b, b + out, a + out],
                normal: Vec3::UP,
                uvs: uvs(tiles.edge),
                colors: [top.colors[i], top.colors[j], top.colors[j], top.colors[i]],
                tint: grass.tint,
                flip: false,
            });
        }

        for d in DIAGONAL_2D {
            // both manhattan neighbors around the diagonal must take a strip too
            let ix = if d.x < 0 { 0 } else { 1 };
            let iz = if d.z < 0 { 2 } else { 3 };
            if !(eligible[ix] && eligible[iz] && self.accepts_fringe(coord + d, precedence)) {
                continue;
            }
            let k = top_corner_index(d.x > 0, d.z > 0);
            let c = top.corners[k];
            let dx = Vec3::new(d.x as f32 * FRINGE_REACH, 0.0, 0.0);
            let dz = Vec3::new(0.0, 0.0, d.z as f32 * FRINGE_REACH);
            mesh.push_quad(&Quad {
                corners: [c, c + dx, c + dx + dz, c + dz],
                normal: Vec3::UP,
                uvs: uvs(tiles.corner),
                colors: [top.colors[k]; 4],
                tint: grass.tint,
                flip: false,
            });
        }
    }
}
