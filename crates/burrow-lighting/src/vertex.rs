use burrow_chunk::{DynamicLight, NeighborLookup};
use burrow_geom::Vec3;
use burrow_voxels::VoxelLibrary;
use burrow_world::GlobalVoxelCoordinate;
use hashbrown::HashMap;

// The four voxels sharing a vertical lattice edge, relative to the lattice point.
const EDGE_SAMPLES: [(i32, i32); 4] = [(-1, -1), (0, -1), (-1, 0), (0, 0)];

/// Light channels of one mesh vertex, each 0..=255.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VertexColorInfo {
    pub sun: u8,
    pub ambient: u8,
    pub dynamic: u8,
}

impl VertexColorInfo {
    pub const FULL: VertexColorInfo = VertexColorInfo { sun: 255, ambient: 255, dynamic: 0 };

    /// Packs the channels into a vertex color: red carries sun, green ambient, blue dynamic.
    #[inline]
    pub const fn to_rgba(self) -> [u8; 4] {
        [self.sun, self.ambient, self.dynamic, 255]
    }
}

/// Lights the lattice point `lattice` (the min corner of voxel `lattice`) from the four
/// voxels at the same height that touch it.
///
/// Missing voxels are skipped; a point with no loaded samples is fully lit. Non-empty and
/// unexplored voxels occlude. An occluding voxel whose type emits light saturates the
/// dynamic channel; otherwise it comes from `lights`.
pub fn compute_vertex_light(
    lookup: &dyn NeighborLookup,
    library: &VoxelLibrary,
    lights: &[DynamicLight],
    lattice: GlobalVoxelCoordinate,
) -> VertexColorInfo {
    let mut checked = 0u32;
    let mut occluded = 0u32;
    let mut sun = 0u32;
    let mut emitter = false;
    for (dx, dz) in EDGE_SAMPLES {
        let Some(s) = lookup.sample(lattice.offset(dx, 0, dz)) else {
            continue;
        };
        checked += 1;
        if s.sunlight() {
            sun += 255;
        }
        if !s.is_empty() || !s.explored() {
            occluded += 1;
            if library.voxel_type(s.type_id).is_some_and(|t| t.emits_light) {
                emitter = true;
            }
        }
    }
    if checked == 0 {
        return VertexColorInfo {
            sun: 255,
            ambient: 255,
            dynamic: dynamic_intensity(lights, lattice.to_vec3()),
        };
    }
    VertexColorInfo {
        sun: (sun / checked) as u8,
        ambient: ((checked - occluded) * 255 / checked) as u8,
        dynamic: if emitter { 255 } else { dynamic_intensity(lights, lattice.to_vec3()) },
    }
}

/// Brightest contribution of `lights` at `p`; each light falls off linearly to zero at its range.
pub fn dynamic_intensity(lights: &[DynamicLight], p: Vec3) -> u8 {
    lights
        .iter()
        .filter(|l| l.range > 0.0)
        .map(|l| {
            let falloff = 1.0 - (l.position.distance(p) / l.range);
            (f32::from(l.intensity) * falloff.clamp(0.0, 1.0)) as u8
        })
        .max()
        .unwrap_or(0)
}

/// Whether a quad whose corners carry `ambient` should be split along its 1-3 diagonal.
///
/// Splitting across the darker pair keeps occlusion gradients from creasing.
#[inline]
pub fn prefers_flipped_diagonal(ambient: [u8; 4]) -> bool {
    let [a0, a1, a2, a3] = ambient.map(u16::from);
    a0 + a2 > a1 + a3
}

/// Memo of lattice-point lighting for one mesh build. Neighboring faces share most of
/// their corners, so each point is computed once.
#[derive(Default)]
pub struct VertexLightCache {
    entries: HashMap<GlobalVoxelCoordinate, VertexColorInfo>,
    hits: u64,
    misses: u64,
}

impl VertexLightCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compute(
        &mut self,
        lattice: GlobalVoxelCoordinate,
        compute: impl FnOnce() -> VertexColorInfo,
    ) -> VertexColorInfo {
        if let Some(v) = self.entries.get(&lattice) {
            self.hits += 1;
            return *v;
        }
        self.misses += 1;
        let v = compute();
        self.entries.insert(lattice, v);
        v
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(hits, misses)` since creation.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
