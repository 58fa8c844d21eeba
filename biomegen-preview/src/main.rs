//! Classify a square of regions around the origin and print it as an ASCII biome map.

use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use biomegen::{BiomeId, BiomeSource, GeneratorConfig};
use biomegen::climate::REGION_WIDTH;

pub mod config;
pub mod registry;
pub mod pool;

use pool::RegionPool;


pub fn main() -> ExitCode {

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_thread_names(true)
        .init();

    let palette = match registry::default_palette() {
        Ok(palette) => palette,
        Err(e) => {
            error!("invalid biome registry: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut generator_config = GeneratorConfig::default();
    if let Some(max_elev) = config::max_elev() {
        generator_config.max_elev = max_elev;
    }

    let source = match BiomeSource::new(config::seed(), palette.registry.clone(), &generator_config) {
        Ok(source) => Arc::new(source),
        Err(e) => {
            error!("failed to create biome source: {e}");
            return ExitCode::FAILURE;
        }
    };

    let radius = config::radius() as i32;
    let side = (radius * 2) as usize;
    let workers = config::workers();
    info!("classifying {side}x{side} regions of seed {} on {workers} workers", source.seed());

    let pool = RegionPool::new(Arc::clone(&source), workers);
    for rz in -radius..radius {
        for rx in -radius..radius {
            pool.request(rx, rz);
        }
    }

    // Unclassified columns stay empty on the map.
    let width = side * REGION_WIDTH;
    let mut map: Vec<Option<BiomeId>> = vec![None; width * width];
    let mut failed = 0;

    for _ in 0..side * side {

        let Some(result) = pool.recv() else { break };
        let Ok(biomes) = result.biomes else {
            failed += 1;
            continue;
        };

        let origin_x = (result.rx + radius) as usize * REGION_WIDTH;
        let origin_z = (result.rz + radius) as usize * REGION_WIDTH;
        for lz in 0..REGION_WIDTH {
            for lx in 0..REGION_WIDTH {
                map[(origin_z + lz) * width + origin_x + lx] = Some(biomes.get(lx, lz));
            }
        }

    }

    drop(pool);

    // Columns are printed once every two rows to keep the map roughly square.
    for row in map.chunks(width).step_by(2) {
        let line = row.iter()
            .map(|id| id.map_or(' ', |id| palette.symbol(id)))
            .collect::<String>();
        println!("{line}");
    }

    let noise_stats = source.noise_cache_stats();
    let biome_stats = source.biome_cache_stats();
    info!("noise cache: {} hits, {} misses, {} evictions", noise_stats.hits, noise_stats.misses, noise_stats.evictions);
    info!("biome cache: {} hits, {} misses, {} evictions", biome_stats.hits, biome_stats.misses, biome_stats.evictions);

    for (index, stats) in source.chain().stats().iter().enumerate() {
        info!("stage {index} (flags {:#05x}): {} consulted, {} matched", stats.flags.bits(), stats.consulted, stats.matched);
    }

    let mut counts = vec![0usize; palette.registry.len()];
    for id in map.iter().flatten() {
        counts[id.index()] += 1;
    }
    for (id, def) in palette.registry.iter() {
        info!("{} {}: {} columns", palette.symbol(id), def.name, counts[id.index()]);
    }

    if failed != 0 {
        error!("{failed} regions could not be classified");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS

}
