use crate::atlas::{AtlasTile, UvRect};

/// Type ID 0 is always the empty voxel.
pub const EMPTY_VOXEL: u8 = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TransitionKind {
    #[default]
    None,
    /// 16 top-face variants chosen from horizontal same-type neighbors.
    Horizontal,
    /// Side-face variants chosen from the vertical planes through the voxel.
    Vertical,
}

#[derive(Clone, Debug)]
pub struct VoxelType {
    pub id: u8,
    pub name: String,
    pub can_ramp: bool,
    pub is_transparent: bool,
    pub emits_light: bool,
    pub grass_spreads_here: bool,
    pub transitions: TransitionKind,
    pub tint: [u8; 4],
    pub update_hook: Option<String>,
}

impl VoxelType {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.id == EMPTY_VOXEL
    }
}

/// Per-face texture coordinates for a solid box.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxTemplate {
    pub top: UvRect,
    pub bottom: UvRect,
    pub side: UvRect,
    pub transitions: Option<[UvRect; 16]>,
}

impl BoxTemplate {
    /// Transition variant `value` (0..16) or the plain rectangle when the type has none.
    pub fn transition(&self, value: u8, fallback: UvRect) -> UvRect {
        match &self.transitions {
            Some(t) => t[usize::from(value & 0xF)],
            None => fallback,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FringeTiles {
    pub edge: UvRect,
    pub corner: UvRect,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MoteDetail {
    pub name: String,
    pub spawn_threshold: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub frequency: f32,
}

#[derive(Clone, Debug)]
pub struct GrassType {
    pub id: u8,
    pub name: String,
    pub uv: UvRect,
    pub fringe_precedence: i32,
    pub fringe: Option<FringeTiles>,
    pub spreads: bool,
    pub needs_sunlight: bool,
    pub decays: bool,
    pub initial_decay: u8,
    pub becomes_when_decays: Option<u8>,
    pub tint: [u8; 4],
    pub motes: Vec<MoteDetail>,
}

#[derive(Clone, Debug)]
pub struct DecalType {
    pub id: u8,
    pub name: String,
    pub tile: AtlasTile,
    pub uv: UvRect,
    pub tint: [u8; 4],
}
