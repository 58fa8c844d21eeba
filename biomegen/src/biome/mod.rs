//! Biome definitions and their classification from climate samples.
//!
//! A biome is accepted at a point when the point's climate lies within the biome's
//! ranges, and among accepted biomes the nearest one wins. The [`MatcherChain`] retries
//! with relaxed criteria when no biome accepts a point.

use arcstr::ArcStr;

use crate::field::NoiseField;

mod registry;
mod matcher;
mod chain;

pub use registry::{BiomeRegistry, RegistryError};
pub use matcher::{BiomeMatcher, MatcherFlags, DistanceMetric, rarity_jitter, DIST_DIMENSIONS};
pub use chain::{MatcherChain, StageStats, ChainError, CoverageGap};


/// Ordinal of a biome within its [`BiomeRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BiomeId(u16);

impl BiomeId {

    #[inline]
    pub(crate) fn new(index: usize) -> Self {
        debug_assert!(index <= u16::MAX as usize);
        Self(index as u16)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

}


/// Climate ranges and selection parameters of a biome. Definitions are immutable once
/// registered, all ranges are validated by [`BiomeRegistry::new`].
#[derive(Debug, Clone, PartialEq)]
pub struct BiomeDefinition {
    pub name: ArcStr,
    pub min_height: f64,
    pub max_height: f64,
    pub min_volatility: f64,
    pub max_volatility: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub min_rainfall: f64,
    pub max_rainfall: f64,
    /// Rarity in `[-1, 1]`, higher values push the biome away in the distance ranking.
    pub rarity: f64,
    /// Divisor of the coordinates given to the rarity field, larger biomes get
    /// smoother rarity jitter.
    pub size: f64,
    /// When enabled, volatility is considered as an extension of the height range of
    /// the point, and the whole extended range must fit in the biome's height range.
    pub extended_height_volatility_checks: bool,
    /// The biome is suitable for players to spawn in.
    pub spawnable: bool,
}

impl BiomeDefinition {

    /// Create a new definition accepting every climate, with no rarity, a size of 1 and
    /// no extended checks.
    pub fn new(name: impl Into<ArcStr>) -> Self {
        Self {
            name: name.into(),
            min_height: -1.0,
            max_height: 1.0,
            min_volatility: 0.0,
            max_volatility: 1.0,
            min_temperature: 0.0,
            max_temperature: 1.0,
            min_rainfall: 0.0,
            max_rainfall: 1.0,
            rarity: 0.0,
            size: 1.0,
            extended_height_volatility_checks: false,
            spawnable: false,
        }
    }

    #[inline]
    pub fn height(mut self, min: f64, max: f64) -> Self {
        self.min_height = min;
        self.max_height = max;
        self
    }

    #[inline]
    pub fn volatility(mut self, min: f64, max: f64) -> Self {
        self.min_volatility = min;
        self.max_volatility = max;
        self
    }

    #[inline]
    pub fn temperature(mut self, min: f64, max: f64) -> Self {
        self.min_temperature = min;
        self.max_temperature = max;
        self
    }

    #[inline]
    pub fn rainfall(mut self, min: f64, max: f64) -> Self {
        self.min_rainfall = min;
        self.max_rainfall = max;
        self
    }

    #[inline]
    pub fn rarity(mut self, rarity: f64) -> Self {
        self.rarity = rarity;
        self
    }

    #[inline]
    pub fn size(mut self, size: f64) -> Self {
        self.size = size;
        self
    }

    #[inline]
    pub fn extended_checks(mut self, enabled: bool) -> Self {
        self.extended_height_volatility_checks = enabled;
        self
    }

    #[inline]
    pub fn spawnable(mut self, spawnable: bool) -> Self {
        self.spawnable = spawnable;
        self
    }

}


/// A deterministic source of rarity noise, in `[-1, 1]`, for a biome at a point. The
/// coordinates are already divided by the biome size.
pub trait RarityField {

    fn rarity(&self, x: f64, biome_index: usize, z: f64) -> f64;

}

impl RarityField for NoiseField {

    #[inline]
    fn rarity(&self, x: f64, biome_index: usize, z: f64) -> f64 {
        self.sample(x, biome_index as f64, z)
    }

}

impl<F> RarityField for F
where
    F: Fn(f64, usize, f64) -> f64,
{

    #[inline]
    fn rarity(&self, x: f64, biome_index: usize, z: f64) -> f64 {
        self(x, biome_index, z)
    }

}
