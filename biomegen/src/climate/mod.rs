//! Climate fields: the four noise fields sampled for every column, their per-region
//! grids and the remapping of raw values into classifier inputs.

mod remap;
mod fields;
mod cache;

pub use remap::{remap_height, remap_volatility};
pub use fields::{ClimateFields, RARITY_INDEX_FREQUENCY};
pub use cache::{FieldCache, NoiseGrid, NoiseGridBundle, GRID_SIZE, REGION_WIDTH};


/// One of the four climate dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClimateKind {
    Height,
    Volatility,
    Temperature,
    Rainfall,
}

impl ClimateKind {

    pub const ALL: [ClimateKind; 4] = [
        ClimateKind::Height,
        ClimateKind::Volatility,
        ClimateKind::Temperature,
        ClimateKind::Rainfall,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ClimateKind::Height => "height",
            ClimateKind::Volatility => "volatility",
            ClimateKind::Temperature => "temperature",
            ClimateKind::Rainfall => "rainfall",
        }
    }

}


/// The remapped climate of a single column, input of biome classification.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClimateSample {
    /// Height in `[-1, 1]`, negative under sea level.
    pub height: f64,
    /// Local height variation, never more than the height magnitude.
    pub volatility: f64,
    pub temperature: f64,
    pub rainfall: f64,
}

impl ClimateSample {

    #[inline]
    pub fn new(height: f64, volatility: f64, temperature: f64, rainfall: f64) -> Self {
        Self { height, volatility, temperature, rainfall }
    }

    #[inline]
    pub fn get(&self, kind: ClimateKind) -> f64 {
        match kind {
            ClimateKind::Height => self.height,
            ClimateKind::Volatility => self.volatility,
            ClimateKind::Temperature => self.temperature,
            ClimateKind::Rainfall => self.rainfall,
        }
    }

}
