use std::error::Error;
use std::fs;
use std::path::Path;
use std::time::Instant;

use burrow_chunk::{VoxelChunk, packed};
use burrow_runtime::ChunkManager;
use burrow_sim::WorldContext;
use burrow_voxels::VoxelLibrary;
use burrow_world::constants::{CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z, LIQUID_SCALE};
use burrow_world::{GlobalVoxelCoordinate, LocalVoxelCoordinate};
use fastnoise_lite::{FastNoiseLite, NoiseType};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct TerrainConfig {
    #[serde(default = "default_base_height")]
    pub base_height: f32,
    #[serde(default = "default_amplitude")]
    pub amplitude: f32,
    #[serde(default = "default_height_frequency")]
    pub height_frequency: f32,
    /// Depth of the dirt layer above stone.
    #[serde(default = "default_soil_depth")]
    pub soil_depth: i32,
    #[serde(default = "default_sea_level")]
    pub sea_level: i32,
    #[serde(default = "default_biome_frequency")]
    pub biome_frequency: f32,
    /// Noise above which a buried voxel becomes magma.
    #[serde(default = "default_magma_threshold")]
    pub magma_threshold: f32,
    #[serde(default = "default_grass")]
    pub grass: String,
    /// Grass of the second biome.
    #[serde(default = "default_dry_grass")]
    pub dry_grass: String,
}

fn default_base_height() -> f32 {
    12.0
}
fn default_amplitude() -> f32 {
    6.0
}
fn default_height_frequency() -> f32 {
    0.03
}
fn default_soil_depth() -> i32 {
    3
}
fn default_sea_level() -> i32 {
    9
}
fn default_biome_frequency() -> f32 {
    0.01
}
fn default_magma_threshold() -> f32 {
    0.85
}
fn default_grass() -> String {
    "grass".to_string()
}
fn default_dry_grass() -> String {
    "dry_grass".to_string()
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            base_height: default_base_height(),
            amplitude: default_amplitude(),
            height_frequency: default_height_frequency(),
            soil_depth: default_soil_depth(),
            sea_level: default_sea_level(),
            biome_frequency: default_biome_frequency(),
            magma_threshold: default_magma_threshold(),
            grass: default_grass(),
            dry_grass: default_dry_grass(),
        }
    }
}

pub fn load_config_from_path(path: &Path) -> Result<TerrainConfig, Box<dyn Error>> {
    let s = fs::read_to_string(path)?;
    Ok(toml::from_str(&s)?)
}

/// Noise-driven height field with two biomes. Also the simulation's world context.
pub struct Terrain {
    cfg: TerrainConfig,
    height: FastNoiseLite,
    biome: FastNoiseLite,
    caves: FastNoiseLite,
    started: Instant,
}

impl Terrain {
    pub fn new(seed: i32, cfg: TerrainConfig) -> Self {
        let mut height = FastNoiseLite::with_seed(seed);
        height.set_noise_type(Some(NoiseType::OpenSimplex2));
        height.set_frequency(Some(cfg.height_frequency));
        let mut biome = FastNoiseLite::with_seed(seed ^ 0x1203_5F31);
        biome.set_noise_type(Some(NoiseType::OpenSimplex2));
        biome.set_frequency(Some(cfg.biome_frequency));
        let mut caves = FastNoiseLite::with_seed(seed ^ 41_337);
        caves.set_noise_type(Some(NoiseType::OpenSimplex2));
        caves.set_frequency(Some(0.09));
        Self {
            cfg,
            height,
            biome,
            caves,
            started: Instant::now(),
        }
    }

    pub fn surface_height(&self, x: i32, z: i32) -> i32 {
        let n = self.height.get_noise_2d(x as f32, z as f32);
        (self.cfg.base_height + n * self.cfg.amplitude).round() as i32
    }

    /// Fills `chunk` with stone under a dirt crust, grassy tops above sea level, magma
    /// pockets, and still ocean water between the surface and sea level. Every voxel is
    /// explored; sunlight is left to the chunk manager.
    pub fn fill_chunk(&self, chunk: &VoxelChunk, library: &VoxelLibrary) -> Result<(), Box<dyn Error>> {
        let id = |name: &str| library.voxel_id(name).ok_or_else(|| format!("voxel type {name:?} missing"));
        let grass_id = |name: &str| library.grass_id(name).ok_or_else(|| format!("grass type {name:?} missing"));
        let (stone, dirt, sand, magma) = (id("stone")?, id("dirt")?, id("sand")?, id("magma")?);
        let grasses = [grass_id(&self.cfg.grass)?, grass_id(&self.cfg.dry_grass)?];
        let origin = chunk.id().origin();

        for lz in 0..CHUNK_SIZE_Z {
            for lx in 0..CHUNK_SIZE_X {
                let (x, z) = (origin.x + lx as i32, origin.z + lz as i32);
                let top = self.surface_height(x, z);
                let beach = top <= self.cfg.sea_level;
                for ly in 0..CHUNK_SIZE_Y {
                    let y = origin.y + ly as i32;
                    let l = LocalVoxelCoordinate::new(lx, ly, lz);
                    chunk.data.update_flags(l, |b| packed::with_explored(b, true));
                    if y > top {
                        if y <= self.cfg.sea_level {
                            fill_liquid(chunk, l, packed::with_ocean(packed::with_liquid_type(0, 1), true));
                        }
                        continue;
                    }
                    let t = if y > top - self.cfg.soil_depth {
                        if beach { sand } else { dirt }
                    } else if self.caves.get_noise_3d(x as f32, y as f32, z as f32) > self.cfg.magma_threshold {
                        magma
                    } else {
                        stone
                    };
                    chunk.data.set_type(l, t);
                    if y == top && t == dirt {
                        let grass = grasses[usize::from(self.biome_at(x, z))];
                        let decay = library.grass_type(grass).map_or(0, |g| g.initial_decay);
                        chunk.data.update_grass(l, |_| packed::with_grass_decay(packed::with_grass_type(0, grass), decay));
                    }
                }
            }
        }
        Ok(())
    }

    /// Drops a block of fresh (non-ocean) water above the surface at `(x, z)`.
    pub fn spring(&self, manager: &ChunkManager, x: i32, z: i32) -> usize {
        let base = self.surface_height(x, z).max(self.cfg.sea_level) + 3;
        let mut placed = 0;
        for dy in 0..2 {
            for dz in -1..=1 {
                for dx in -1..=1 {
                    let at = GlobalVoxelCoordinate::new(x + dx, base + dy, z + dz);
                    let Some(chunk) = manager.chunk(at.chunk()) else {
                        continue;
                    };
                    if chunk.data.type_at(at.local()) == 0 {
                        fill_liquid(&chunk, at.local(), packed::with_liquid_type(0, 1));
                        placed += 1;
                    }
                }
            }
        }
        placed
    }
}

fn fill_liquid(chunk: &VoxelChunk, l: LocalVoxelCoordinate, cell: u8) {
    let (x, y, z) = (usize::from(l.x), usize::from(l.y), usize::from(l.z));
    for i in 0..LIQUID_SCALE {
        for j in 0..LIQUID_SCALE {
            for k in 0..LIQUID_SCALE {
                chunk
                    .data
                    .set_liquid(x * LIQUID_SCALE + i, y * LIQUID_SCALE + j, z * LIQUID_SCALE + k, cell);
            }
        }
    }
}

impl WorldContext for Terrain {
    fn biome_at(&self, x: i32, z: i32) -> u8 {
        u8::from(self.biome.get_noise_2d(x as f32, z as f32) > 0.0)
    }

    fn game_seconds(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }
}
