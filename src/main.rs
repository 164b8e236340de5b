mod terrain;

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use burrow_chunk::{GraphicsDevice, VoxelChunk};
use burrow_runtime::{ChunkManager, HeadlessDevice, RuntimeConfig};
use burrow_sim::WorldContext;
use burrow_voxels::VoxelLibrary;
use burrow_world::GlobalChunkCoordinate;
use clap::Parser;

use crate::terrain::{Terrain, TerrainConfig};

#[derive(Debug, Parser)]
#[command(about = "Generates a voxel world, builds its chunk meshes and runs the chunk workers headless", long_about = None)]
struct Cli {
    /// Chunk manager tunables
    #[arg(long, value_name = "PATH", default_value = "assets/runtime.toml")]
    config: PathBuf,
    /// Voxel, grass and decal type definitions
    #[arg(long, value_name = "PATH", default_value = "assets/voxels/library.toml")]
    library: PathBuf,
    /// Height field parameters; built-in defaults when absent
    #[arg(long, value_name = "PATH")]
    terrain: Option<PathBuf>,
    #[arg(long, default_value_t = 4)]
    chunks_x: i32,
    #[arg(long, default_value_t = 2)]
    chunks_y: i32,
    #[arg(long, default_value_t = 4)]
    chunks_z: i32,
    /// How long the workers run before shutdown
    #[arg(long, default_value_t = 3)]
    seconds: u64,
    /// Overrides the seed from the config
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    max_viewing_level: Option<i32>,
    /// Magma turns to stone once the world clock passes this many seconds
    #[arg(long, default_value_t = 1.5)]
    magma_cools_after: f64,
}

fn main() -> Result<(), Box<dyn Error>> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();

    let cli = Cli::parse();
    let mut config = RuntimeConfig::from_path(&cli.config)?;
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    if let Some(level) = cli.max_viewing_level {
        config.max_viewing_level = level;
    }
    let terrain_cfg = match &cli.terrain {
        Some(path) => terrain::load_config_from_path(path)?,
        None => TerrainConfig::default(),
    };
    let library = Arc::new(VoxelLibrary::from_path(&cli.library)?);
    log::info!(
        "library: {} voxel types, {} grass types",
        library.voxel_types().count(),
        library.grass_types().count()
    );

    let terrain = Arc::new(Terrain::new(config.seed as i32, terrain_cfg));
    let manager = ChunkManager::new(Arc::clone(&library), config, Arc::clone(&terrain) as Arc<dyn WorldContext + Send>);
    register_hooks(&manager, &library, cli.magma_cools_after)?;

    let started = Instant::now();
    manager.initialize_chunk_map(
        GlobalChunkCoordinate::new(0, 0, 0),
        [cli.chunks_x, cli.chunks_y, cli.chunks_z],
    );
    for y in 0..cli.chunks_y {
        for z in 0..cli.chunks_z {
            for x in 0..cli.chunks_x {
                let chunk = VoxelChunk::new(GlobalChunkCoordinate::new(x, y, z));
                terrain.fill_chunk(&chunk, &library)?;
                manager.add_chunk(Arc::new(chunk))?;
            }
        }
    }
    manager.recompute_sunlight();
    let center = (cli.chunks_x * 8, cli.chunks_z * 8);
    let water = terrain.spring(&manager, center.0, center.1);
    log::info!(
        "generated {} chunks in {}ms, {} water voxels in the spring",
        manager.chunk_count(),
        started.elapsed().as_millis(),
        water
    );

    let device = Arc::new(HeadlessDevice::new());
    manager.set_graphics_device(Some(Arc::clone(&device) as Arc<dyn GraphicsDevice>));
    let chunks = manager.chunks();
    for chunk in &chunks {
        manager.mark_visible(chunk, 0);
    }
    manager.rebuild_all();
    manager.start_threads()?;

    let frame = Duration::from_millis(100);
    let deadline = Instant::now() + Duration::from_secs(cli.seconds);
    let mut cycle = 0u64;
    let mut changes = 0usize;
    while Instant::now() < deadline {
        cycle += 1;
        for chunk in &chunks {
            manager.mark_visible(chunk, cycle);
            chunk.render(device.as_ref());
            chunk.render_liquids(device.as_ref());
        }
        changes += manager.drain_changed_voxels().len();
        std::thread::sleep(frame);
    }
    manager.shutdown();

    let stats = manager.stats();
    log::info!(
        "{} frames: {} draws, {} uploads ({} quads), {} voxel changes",
        cycle,
        device.draws(),
        device.uploads(),
        device.uploaded_quads(),
        changes
    );
    log::info!("{stats:?}");
    Ok(())
}

fn register_hooks(manager: &ChunkManager, library: &VoxelLibrary, cools_after: f64) -> Result<(), Box<dyn Error>> {
    let stone = library.voxel_id("stone").ok_or("voxel type \"stone\" missing")?;
    manager.hooks().register_voxel_update_hook("magma_cools", move |voxel, world| {
        if world.game_seconds() >= cools_after {
            voxel.set_type(stone);
        }
        Ok(())
    });
    Ok(())
}
