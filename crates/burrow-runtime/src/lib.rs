//! Chunk manager: the chunk map, rebuild queues and the background workers.
#![forbid(unsafe_code)]

mod config;
mod device;
mod live_chunks;
mod manager;
mod queue;
mod save;
mod water;
mod workers;

pub use config::{ConfigError, RuntimeConfig};
pub use device::HeadlessDevice;
pub use live_chunks::LiveChunks;
pub use manager::{ChunkManager, ChunkManagerError, ManagerStats};
pub use save::{ChunkFile, ChunkRecord};
pub use water::{WaterStats, step_liquids};
