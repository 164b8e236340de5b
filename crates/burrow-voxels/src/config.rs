//! On-disk TOML schema for the voxel library.

use serde::Deserialize;

use crate::atlas::AtlasTile;

#[derive(Deserialize, Debug)]
pub struct LibraryConfig {
    pub atlas: AtlasConfig,
    #[serde(default, rename = "voxel")]
    pub voxels: Vec<VoxelDef>,
    #[serde(default, rename = "grass")]
    pub grass: Vec<GrassDef>,
    #[serde(default, rename = "decal")]
    pub decals: Vec<DecalDef>,
}

#[derive(Deserialize, Debug)]
pub struct AtlasConfig {
    pub columns: u16,
    pub rows: u16,
    /// Tile sampled by fog quads.
    #[serde(default)]
    pub fog: AtlasTile,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransitionDef {
    #[default]
    None,
    Horizontal,
    Vertical,
}

fn default_tint() -> [u8; 4] {
    [255, 255, 255, 255]
}

#[derive(Deserialize, Debug)]
pub struct VoxelDef {
    pub name: String,
    /// Used for every face not given explicitly.
    pub tile: Option<AtlasTile>,
    pub top: Option<AtlasTile>,
    pub bottom: Option<AtlasTile>,
    pub side: Option<AtlasTile>,
    #[serde(default)]
    pub can_ramp: bool,
    #[serde(default)]
    pub transparent: bool,
    #[serde(default)]
    pub emits_light: bool,
    #[serde(default)]
    pub grass_spreads_here: bool,
    /// No geometry is emitted for invisible types.
    #[serde(default)]
    pub invisible: bool,
    #[serde(default)]
    pub transitions: TransitionDef,
    /// First of 16 consecutive atlas tiles holding the transition variants.
    pub transition_start: Option<AtlasTile>,
    #[serde(default = "default_tint")]
    pub tint: [u8; 4],
    pub update_hook: Option<String>,
}

fn default_decay() -> u8 {
    15
}

#[derive(Deserialize, Debug)]
pub struct GrassDef {
    pub name: String,
    pub tile: AtlasTile,
    #[serde(default)]
    pub fringe_precedence: i32,
    pub fringe_edge: Option<AtlasTile>,
    pub fringe_corner: Option<AtlasTile>,
    #[serde(default)]
    pub spreads: bool,
    #[serde(default)]
    pub needs_sunlight: bool,
    #[serde(default)]
    pub decays: bool,
    #[serde(default = "default_decay")]
    pub initial_decay: u8,
    pub becomes_when_decays: Option<String>,
    #[serde(default = "default_tint")]
    pub tint: [u8; 4],
    #[serde(default)]
    pub motes: Vec<MoteDef>,
}

fn default_frequency() -> f32 {
    0.3
}

#[derive(Deserialize, Debug)]
pub struct MoteDef {
    pub name: String,
    pub spawn_threshold: f32,
    #[serde(default = "default_min_scale")]
    pub min_scale: f32,
    #[serde(default = "default_max_scale")]
    pub max_scale: f32,
    #[serde(default = "default_frequency")]
    pub frequency: f32,
}

fn default_min_scale() -> f32 {
    0.5
}

fn default_max_scale() -> f32 {
    1.0
}

#[derive(Deserialize, Debug)]
pub struct DecalDef {
    pub name: String,
    pub tile: AtlasTile,
    #[serde(default = "default_tint")]
    pub tint: [u8; 4],
}
