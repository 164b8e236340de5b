//! Per-chunk simulation ticks, mod update hooks and the decorative mote layer.
#![forbid(unsafe_code)]

mod chunk_update;
mod hooks;
mod motes;
mod world;

pub use chunk_update::{ChunkUpdate, UpdateStats};
pub use hooks::{HookResult, VoxelUpdateHooks};
pub use motes::MoteGenerator;
pub use world::{FlatWorld, WorldContext};
