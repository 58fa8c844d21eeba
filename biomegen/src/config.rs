//! Generator configuration.

use crate::cache::CacheBounds;


/// Parameters of a [`BiomeSource`](crate::source::BiomeSource) that are not derived
/// from the seed.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    /// Approximate maximum terrain elevation in blocks. Field frequencies are scaled by
    /// it so that climate features grow with the world, and the octave count of all
    /// climate fields is `ln(max_elev)`.
    pub max_elev: f64,
    /// Horizontal frequency of the rarity field, before the per-biome size divisor.
    pub rarity_frequency: f64,
    /// Bounds of the per-region noise grid cache.
    pub noise_cache: CacheBounds,
    /// Bounds of the per-region classified biome cache.
    pub biome_cache: CacheBounds,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_elev: 800.0,
            rarity_frequency: 0.01,
            noise_cache: CacheBounds::default(),
            biome_cache: CacheBounds::default(),
        }
    }
}
