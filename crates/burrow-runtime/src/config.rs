use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read runtime config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid runtime config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("water interval range is empty ({min} ms > {max} ms)")]
    WaterInterval { min: u64, max: u64 },
    #[error("{name} must lie in [0, 1], got {value}")]
    Probability { name: &'static str, value: f32 },
}

/// Tunables of the chunk manager and its workers.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct RuntimeConfig {
    /// Built chunks kept resident before the least recently seen ones drop their meshes.
    #[serde(default = "default_max_live_chunks")]
    pub max_live_chunks: usize,
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
    #[serde(default = "default_water_min_interval_ms")]
    pub water_min_interval_ms: u64,
    #[serde(default = "default_water_max_interval_ms")]
    pub water_max_interval_ms: u64,
    #[serde(default = "default_water_spread_chance")]
    pub water_spread_chance: f32,
    #[serde(default = "default_grass_spread_chance")]
    pub grass_spread_chance: f32,
    #[serde(default = "default_max_viewing_level")]
    pub max_viewing_level: i32,
    /// Threads of the initial parallel build; 0 picks one per core.
    #[serde(default)]
    pub rebuild_threads: usize,
    #[serde(default = "default_emitter_range")]
    pub emitter_light_range: f32,
    #[serde(default)]
    pub seed: u64,
}

fn default_max_live_chunks() -> usize {
    512
}

fn default_update_interval_ms() -> u64 {
    100
}

fn default_water_min_interval_ms() -> u64 {
    50
}

fn default_water_max_interval_ms() -> u64 {
    1000
}

fn default_water_spread_chance() -> f32 {
    0.5
}

fn default_grass_spread_chance() -> f32 {
    0.1
}

fn default_max_viewing_level() -> i32 {
    i32::MAX
}

fn default_emitter_range() -> f32 {
    8.0
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_live_chunks: default_max_live_chunks(),
            update_interval_ms: default_update_interval_ms(),
            water_min_interval_ms: default_water_min_interval_ms(),
            water_max_interval_ms: default_water_max_interval_ms(),
            water_spread_chance: default_water_spread_chance(),
            grass_spread_chance: default_grass_spread_chance(),
            max_viewing_level: default_max_viewing_level(),
            rebuild_threads: 0,
            emitter_light_range: default_emitter_range(),
            seed: 0,
        }
    }
}

impl RuntimeConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: RuntimeConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let s = fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.water_min_interval_ms > self.water_max_interval_ms {
            return Err(ConfigError::WaterInterval {
                min: self.water_min_interval_ms,
                max: self.water_max_interval_ms,
            });
        }
        for (name, value) in [
            ("water_spread_chance", self.water_spread_chance),
            ("grass_spread_chance", self.grass_spread_chance),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { name, value });
            }
        }
        Ok(())
    }
}
