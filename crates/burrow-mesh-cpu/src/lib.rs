//! CPU mesh builder for voxel chunks: face culling, ramps, vertex lighting, transition
//! textures, grass fringe, decals, designation overlays, fog and liquid surfaces.
#![forbid(unsafe_code)]

mod face;
mod fringe;
mod liquid;
mod neighborhood;
mod primitive;
mod ramps;
mod transitions;
mod visibility;

pub use face::BoxFace;
pub use liquid::build_liquid_meshes;
pub use neighborhood::ChunkNeighborhood;
pub use primitive::{Designation, DesignationLookup, VoxelListPrimitive};
pub use ramps::{compute_ramp, recalculate_ramps};
pub use transitions::{compute_transition_value_on_plane, face_uv};
pub use visibility::{check_ramps, is_face_visible, should_draw_face};
