//! The biome source of a world: climate fields, their caches and the classifier, all
//! derived from a single seed and a biome registry.

use std::convert::Infallible;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::biome::{BiomeDefinition, BiomeId, BiomeMatcher, BiomeRegistry, ChainError, CoverageGap, MatcherChain, RarityField, RegistryError};
use crate::cache::{CacheStats, SharedRegionCache};
use crate::climate::{ClimateFields, ClimateKind, ClimateSample, FieldCache, NoiseGrid, REGION_WIDTH};
use crate::config::GeneratorConfig;
use crate::field::NoiseFieldError;


/// The classified biomes of a region, indexed `[x][z]` relative to the region origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionBiomes {
    ids: [[BiomeId; REGION_WIDTH]; REGION_WIDTH],
}

impl RegionBiomes {

    #[inline]
    pub fn get(&self, x: usize, z: usize) -> BiomeId {
        self.ids[x][z]
    }

    #[inline]
    pub fn as_array(&self) -> &[[BiomeId; REGION_WIDTH]; REGION_WIDTH] {
        &self.ids
    }

}


/// Deterministic biome classification of a world. Every query is a pure function of the
/// seed, the registry, the configuration and the coordinates, caches only change the
/// time it takes.
///
/// The source is meant to be shared between threads behind an [`Arc`].
pub struct BiomeSource {
    seed: i64,
    fields: FieldCache,
    biomes: SharedRegionCache<RegionBiomes>,
    registry: BiomeRegistry,
    rarity: Box<dyn RarityField + Send + Sync>,
    chain: MatcherChain,
}

impl BiomeSource {

    /// Build the climate fields of the given seed, the classification uses the standard
    /// matcher chain and the seeded rarity field.
    pub fn new(seed: i64, registry: BiomeRegistry, config: &GeneratorConfig) -> Result<Self, GeneratorError> {

        let fields = ClimateFields::new(seed, config)?;
        let rarity = fields.rarity().clone();

        debug!("new biome source for seed {seed} with {} biomes", registry.len());

        Ok(Self {
            seed,
            fields: FieldCache::new(fields, config.noise_cache),
            biomes: SharedRegionCache::new("biome", config.biome_cache),
            registry,
            rarity: Box::new(rarity),
            chain: MatcherChain::standard(),
        })

    }

    /// Replace the rarity field, intended for tests and tools that need to remove the
    /// jitter. Must be called before any classification, cached regions are not
    /// invalidated.
    pub fn with_rarity(mut self, rarity: impl RarityField + Send + Sync + 'static) -> Self {
        self.rarity = Box::new(rarity);
        self
    }

    /// Register the given definitions in order and build a source from them.
    pub fn from_definitions<I>(seed: i64, definitions: I, config: &GeneratorConfig) -> Result<Self, GeneratorError>
    where
        I: IntoIterator<Item = BiomeDefinition>,
    {
        Self::new(seed, BiomeRegistry::new(definitions)?, config)
    }

    /// Replace the standard chain by the given matchers, tried in order. Same
    /// restriction as [`Self::with_rarity`].
    pub fn with_matchers(mut self, matchers: Vec<BiomeMatcher>) -> Result<Self, GeneratorError> {
        self.chain = MatcherChain::new(matchers)?;
        Ok(self)
    }

    #[inline]
    pub fn seed(&self) -> i64 {
        self.seed
    }

    /// Classify a single column.
    pub fn classify(&self, x: i32, z: i32) -> Result<BiomeId, CoverageGap> {
        let sample = self.climate_at(x, z);
        self.resolve(x as f64, z as f64, &sample)
    }

    /// Remapped climate of a column, from the cached grids.
    pub fn climate_at(&self, x: i32, z: i32) -> ClimateSample {
        let (rx, lx) = split_coord(x);
        let (rz, lz) = split_coord(z);
        self.fields.bundle(rx, rz).climate(lx, lz)
    }

    #[inline]
    fn resolve(&self, x: f64, z: f64, sample: &ClimateSample) -> Result<BiomeId, CoverageGap> {
        self.chain.resolve(x, z, sample, &self.registry, &*self.rarity)
    }

    pub fn grid(&self, rx: i32, rz: i32, kind: ClimateKind) -> NoiseGrid {
        self.fields.get_or_build(rx, rz, kind)
    }

    pub fn height_grid(&self, rx: i32, rz: i32) -> NoiseGrid {
        self.grid(rx, rz, ClimateKind::Height)
    }

    pub fn volatility_grid(&self, rx: i32, rz: i32) -> NoiseGrid {
        self.grid(rx, rz, ClimateKind::Volatility)
    }

    pub fn temperature_grid(&self, rx: i32, rz: i32) -> NoiseGrid {
        self.grid(rx, rz, ClimateKind::Temperature)
    }

    pub fn rainfall_grid(&self, rx: i32, rz: i32) -> NoiseGrid {
        self.grid(rx, rz, ClimateKind::Rainfall)
    }

    /// Raw height of a column sampled directly from the field, bypassing the cache.
    #[inline]
    pub fn raw_height(&self, x: i32, z: i32) -> f64 {
        self.fields.fields().sample(ClimateKind::Height, x, z)
    }

    #[inline]
    pub fn raw_volatility(&self, x: i32, z: i32) -> f64 {
        self.fields.fields().sample(ClimateKind::Volatility, x, z)
    }

    #[inline]
    pub fn raw_temperature(&self, x: i32, z: i32) -> f64 {
        self.fields.fields().sample(ClimateKind::Temperature, x, z)
    }

    #[inline]
    pub fn raw_rainfall(&self, x: i32, z: i32) -> f64 {
        self.fields.fields().sample(ClimateKind::Rainfall, x, z)
    }

    /// Get the classified biomes of a whole region. A region with a single column not
    /// covered by the registry fails as a whole and is not cached.
    pub fn region_biomes(&self, rx: i32, rz: i32) -> Result<Arc<RegionBiomes>, CoverageGap> {
        self.biomes.get_or_try_build(rx, rz, || self.build_region_biomes(rx, rz))
    }

    #[instrument(skip(self))]
    fn build_region_biomes(&self, rx: i32, rz: i32) -> Result<RegionBiomes, CoverageGap> {

        let bundle = self.fields.bundle(rx, rz);
        let origin_x = region_origin(rx);
        let origin_z = region_origin(rz);

        // Placeholder, every cell is overwritten below.
        let mut ids = [[BiomeId::new(0); REGION_WIDTH]; REGION_WIDTH];

        for (lx, column) in ids.iter_mut().enumerate() {
            for (lz, id) in column.iter_mut().enumerate() {
                let sample = bundle.climate(lx, lz);
                *id = self.resolve((origin_x + lx as i64) as f64, (origin_z + lz as i64) as f64, &sample)?;
            }
        }

        Ok(RegionBiomes { ids })

    }

    /// Classify a rectangular area of `width` columns along x and `length` along z,
    /// the result is row-major: column `(x + dx, z + dz)` is at `dz * width + dx`.
    pub fn biomes_in_area(&self, x: i32, z: i32, width: usize, length: usize) -> Result<Vec<BiomeId>, CoverageGap> {
        fill_area(x, z, width, length, BiomeId::new(0),
            |rx, rz| self.region_biomes(rx, rz),
            |region, lx, lz| region.get(lx, lz))
    }

    /// Rainfall of a rectangular area, same layout as [`Self::biomes_in_area`].
    pub fn rainfall_in_area(&self, x: i32, z: i32, width: usize, length: usize) -> Vec<f32> {
        let res = fill_area(x, z, width, length, 0.0,
            |rx, rz| Ok::<_, Infallible>(self.fields.bundle(rx, rz)),
            |bundle, lx, lz| bundle.get(ClimateKind::Rainfall).get(lx, lz) as f32);
        match res {
            Ok(values) => values,
            Err(never) => match never {},
        }
    }

    /// Iterate over the biomes suitable for spawning players.
    pub fn spawn_biomes(&self) -> impl Iterator<Item = BiomeId> + '_ {
        self.registry.iter().filter(|(_, def)| def.spawnable).map(|(id, _)| id)
    }

    #[inline]
    pub fn registry(&self) -> &BiomeRegistry {
        &self.registry
    }

    #[inline]
    pub fn chain(&self) -> &MatcherChain {
        &self.chain
    }

    pub fn noise_cache_stats(&self) -> CacheStats {
        self.fields.stats()
    }

    pub fn biome_cache_stats(&self) -> CacheStats {
        self.biomes.stats()
    }

    /// Evict both caches down to their capacity, returns the number of evicted regions.
    pub fn trim_caches(&self) -> usize {
        self.fields.trim() + self.biomes.trim()
    }

}


/// Split a block coordinate into its region coordinate and its offset in the region.
#[inline]
fn split_coord(value: i32) -> (i32, usize) {
    let width = REGION_WIDTH as i32;
    (value.div_euclid(width), value.rem_euclid(width) as usize)
}

/// Block coordinate of the first column of a region, regions at the edge of the `i32`
/// range start outside of it.
#[inline]
fn region_origin(region: i32) -> i64 {
    region as i64 * REGION_WIDTH as i64
}

/// Fill a row-major area from per-region values, each region is fetched once. The area
/// may extend past `i32::MAX`, columns beyond it are left to `init`.
fn fill_area<R, T, E>(
    x: i32,
    z: i32,
    width: usize,
    length: usize,
    init: T,
    mut region: impl FnMut(i32, i32) -> Result<R, E>,
    mut cell: impl FnMut(&R, usize, usize) -> T,
) -> Result<Vec<T>, E>
where
    T: Clone,
{

    let mut values = vec![init; width * length];
    if values.is_empty() {
        return Ok(values);
    }

    let region_width = REGION_WIDTH as i64;
    let (x, z) = (x as i64, z as i64);
    let x_end = (x + width as i64).min(i32::MAX as i64 + 1);
    let z_end = (z + length as i64).min(i32::MAX as i64 + 1);

    for rz in z.div_euclid(region_width)..=(z_end - 1).div_euclid(region_width) {
        for rx in x.div_euclid(region_width)..=(x_end - 1).div_euclid(region_width) {

            let value = region(rx as i32, rz as i32)?;
            let origin_x = rx * region_width;
            let origin_z = rz * region_width;

            for bz in origin_z.max(z)..(origin_z + region_width).min(z_end) {
                for bx in origin_x.max(x)..(origin_x + region_width).min(x_end) {
                    let index = (bz - z) as usize * width + (bx - x) as usize;
                    values[index] = cell(&value, (bx - origin_x) as usize, (bz - origin_z) as usize);
                }
            }

        }
    }

    Ok(values)

}


/// Error while creating a [`BiomeSource`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeneratorError {
    #[error("noise field: {0}")]
    NoiseField(#[from] NoiseFieldError),
    #[error("registry: {0}")]
    Registry(#[from] RegistryError),
    #[error("matcher chain: {0}")]
    Chain(#[from] ChainError),
}
