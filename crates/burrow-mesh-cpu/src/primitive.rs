use std::cell::{Cell, RefCell};
use std::time::Instant;

use burrow_chunk::{DynamicLight, NeighborLookup, RampType, SliceMesher, VoxelChunk, VoxelSample};
use burrow_geom::{MeshBuild, Quad, Vec3};
use burrow_lighting::{VertexColorInfo, VertexLightCache, compute_vertex_light, prefers_flipped_diagonal};
use burrow_voxels::{UvRect, VoxelLibrary};
use burrow_world::constants::CHUNK_SIZE_Y;
use burrow_world::neighbors::manhattan_2d;
use burrow_world::{GlobalChunkCoordinate, GlobalVoxelCoordinate, GlobalVoxelOffset, LocalVoxelCoordinate};

use crate::face::BoxFace;
use crate::transitions::face_uv;
use crate::visibility::should_draw_face;

thread_local! {
    static LAST_SLICE_QUADS: Cell<usize> = const { Cell::new(MIN_SLICE_RESERVE) };
}

const MIN_SLICE_RESERVE: usize = 64;
const RAMP_DROP: f32 = 0.5;
const DESIGNATION_INFLATE: f32 = 0.02;
const FOG_COLOR: [u8; 4] = [0, 0, 0, 255];

/// A designation overlay drawn over a voxel (dig, build or stockpile markers).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Designation {
    pub uv: UvRect,
    pub tint: [u8; 4],
}

/// Source of designation overlays, owned by gameplay code.
pub trait DesignationLookup: Sync {
    fn designation(&self, coord: GlobalVoxelCoordinate) -> Option<Designation>;
}

/// Positions, lighting and triangulation of one voxel face.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FaceGeometry {
    pub face: BoxFace,
    pub corners: [Vec3; 4],
    pub colors: [[u8; 4]; 4],
    pub flip: bool,
}

impl FaceGeometry {
    pub(crate) fn quad(&self, uv: UvRect, tint: [u8; 4]) -> Quad {
        let uvs = self.face.corners().map(|c| {
            let (fu, fv) = self.face.corner_uv(c);
            uv.lerp(fu, fv)
        });
        Quad {
            corners: self.corners,
            normal: self.face.normal(),
            uvs,
            colors: self.colors,
            tint,
            flip: self.flip,
        }
    }
}

/// Builds the geometry of voxel chunks one slice at a time.
///
/// Neighbor voxels are read through `lookup`, which normally covers the chunk and the
/// chunks around it. Lattice-point lighting is memoised for the lifetime of the value, so
/// one instance serves one rebuild.
pub struct VoxelListPrimitive<'a> {
    lookup: &'a dyn NeighborLookup,
    pub(crate) library: &'a VoxelLibrary,
    designations: Option<&'a dyn DesignationLookup>,
    lights: Vec<DynamicLight>,
    pub(crate) max_viewing_level: i32,
    vertex_lights: RefCell<VertexLightCache>,
}

impl<'a> VoxelListPrimitive<'a> {
    pub fn new(lookup: &'a dyn NeighborLookup, library: &'a VoxelLibrary, max_viewing_level: i32) -> Self {
        Self {
            lookup,
            library,
            designations: None,
            lights: Vec::new(),
            max_viewing_level,
            vertex_lights: RefCell::new(VertexLightCache::new()),
        }
    }

    pub fn with_lights(mut self, lights: Vec<DynamicLight>) -> Self {
        self.lights = lights;
        self
    }

    pub fn with_designations(mut self, designations: &'a dyn DesignationLookup) -> Self {
        self.designations = Some(designations);
        self
    }

    /// `(hits, misses)` of the vertex light cache.
    pub fn vertex_cache_stats(&self) -> (u64, u64) {
        self.vertex_lights.borrow().stats()
    }

    #[inline]
    pub(crate) fn sample(&self, coord: GlobalVoxelCoordinate) -> Option<VoxelSample> {
        self.lookup.sample(coord)
    }

    fn vertex_light(&self, lattice: GlobalVoxelCoordinate) -> VertexColorInfo {
        self.vertex_lights.borrow_mut().get_or_compute(lattice, || {
            compute_vertex_light(self.lookup, self.library, &self.lights, lattice)
        })
    }

    pub(crate) fn face_geometry(&self, coord: GlobalVoxelCoordinate, ramp: RampType, face: BoxFace) -> FaceGeometry {
        let base = coord.to_vec3();
        let mut corners = [Vec3::ZERO; 4];
        let mut colors = [[0u8; 4]; 4];
        let mut ambient = [0u8; 4];
        for (i, (x, y, z)) in face.corners().into_iter().enumerate() {
            let mut p = base + Vec3::new(f32::from(x), f32::from(y), f32::from(z));
            if y == 1 && ramp.intersects(RampType::corner_at(i32::from(x), i32::from(z))) {
                p.y -= RAMP_DROP;
            }
            let light = self.vertex_light(coord.offset(i32::from(x), i32::from(y), i32::from(z)));
            corners[i] = p;
            colors[i] = light.to_rgba();
            ambient[i] = light.ambient;
        }
        FaceGeometry {
            face,
            corners,
            colors,
            flip: prefers_flipped_diagonal(ambient),
        }
    }

    /// Unexplored voxels deep in unexplored space are drawn as black boxes.
    fn is_fogged(&self, coord: GlobalVoxelCoordinate, here: VoxelSample) -> bool {
        if here.explored() {
            return false;
        }
        let explored = |c: GlobalVoxelCoordinate| self.sample(c).is_some_and(|s| s.explored());
        !manhattan_2d(coord).any(explored) && !explored(coord + GlobalVoxelOffset::UP)
    }

    fn emit_fog(&self, mesh: &mut MeshBuild, coord: GlobalVoxelCoordinate, face: BoxFace) {
        let base = coord.to_vec3();
        let fog = self.library.fog_uv();
        let corners = face
            .corners()
            .map(|(x, y, z)| base + Vec3::new(f32::from(x), f32::from(y), f32::from(z)));
        let uvs = face.corners().map(|c| {
            let (fu, fv) = face.corner_uv(c);
            fog.lerp(fu, fv)
        });
        mesh.push_quad(&Quad {
            corners,
            normal: face.normal(),
            uvs,
            colors: [FOG_COLOR; 4],
            tint: FOG_COLOR,
            flip: false,
        });
    }

    /// Appends every quad of one voxel.
    pub(crate) fn emit_voxel(&self, mesh: &mut MeshBuild, coord: GlobalVoxelCoordinate, here: VoxelSample) {
        let lib = self.library;
        let (Some(vtype), Some(template)) = (lib.voxel_type(here.type_id), lib.voxel_primitive(here.type_id)) else {
            return;
        };
        let visible = |face| should_draw_face(self.lookup, lib, coord, here, face, self.max_viewing_level);

        // Culled the same as real terrain, drawn black.
        if self.is_fogged(coord, here) {
            for face in BoxFace::ALL.into_iter().filter(|&f| visible(f)) {
                self.emit_fog(mesh, coord, face);
            }
            return;
        }

        let ramp = here.ramp();
        let designation = self.designations.and_then(|d| d.designation(coord));
        for face in BoxFace::ALL {
            if !visible(face) {
                continue;
            }
            let geom = self.face_geometry(coord, ramp, face);
            let uv = face_uv(self.lookup, coord, vtype, template, face);
            mesh.push_quad(&geom.quad(uv, vtype.tint));

            if face == BoxFace::Top {
                self.emit_top_overlays(mesh, coord, here, &geom);
            }
            if let Some(d) = designation {
                let offset = face.normal() * DESIGNATION_INFLATE;
                let mut inflated = geom;
                for c in &mut inflated.corners {
                    *c += offset;
                }
                mesh.push_quad(&inflated.quad(d.uv, d.tint));
            }
        }
    }

    fn emit_top_overlays(&self, mesh: &mut MeshBuild, coord: GlobalVoxelCoordinate, here: VoxelSample, top: &FaceGeometry) {
        if let Some(grass) = self.library.grass_type(here.grass_type()) {
            mesh.push_quad(&top.quad(grass.uv, grass.tint));
            self.emit_fringe(mesh, coord, grass, top);
        }
        if let Some(decal) = self.library.decal_type(here.decal_type()) {
            mesh.push_quad(&top.quad(decal.uv, decal.tint));
        }
    }
}

impl SliceMesher for VoxelListPrimitive<'_> {
    fn visible_slices(&self, chunk: GlobalChunkCoordinate) -> usize {
        self.max_viewing_level
            .saturating_sub(chunk.origin().y)
            .clamp(0, CHUNK_SIZE_Y as i32) as usize
    }

    fn build_slice(&self, chunk: &VoxelChunk, y: usize) -> MeshBuild {
        let started = Instant::now();
        let mut mesh = MeshBuild::default();
        mesh.reserve_quads(LAST_SLICE_QUADS.with(Cell::get));
        for local in LocalVoxelCoordinate::slice(y) {
            let here = chunk.data.sample(local);
            if here.is_empty() {
                continue;
            }
            let coord = GlobalVoxelCoordinate::from_chunk_local(chunk.id(), local);
            self.emit_voxel(&mut mesh, coord, here);
        }
        let quads = mesh.quad_count();
        LAST_SLICE_QUADS.with(|c| c.set((quads + quads / 4).max(MIN_SLICE_RESERVE)));
        log::trace!(
            target: "perf",
            "us slice={} quads={} chunk={:?} y={}",
            started.elapsed().as_micros(),
            quads,
            chunk.id(),
            y
        );
        mesh
    }
}
