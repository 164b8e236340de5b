//! Per-vertex voxel lighting: sun, ambient occlusion and dynamic light channels.
#![forbid(unsafe_code)]

mod registry;
mod vertex;

pub use registry::{LightRegistry, LightSource};
pub use vertex::{
    VertexColorInfo, VertexLightCache, compute_vertex_light, dynamic_intensity, prefers_flipped_diagonal,
};
