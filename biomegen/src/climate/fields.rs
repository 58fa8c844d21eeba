//! The climate noise fields of a world, all derived from the world seed.

use std::f64::consts::PI;

use tracing::debug;

use crate::field::{NoiseField, NoiseFieldBuilder, NoiseFieldError};
use crate::config::GeneratorConfig;
use crate::util::JavaRandom;

use super::ClimateKind;


/// Frequency of the rarity field along the biome index axis. Kept away from integer
/// multiples so that consecutive biome indices do not land on the noise lattice.
pub const RARITY_INDEX_FREQUENCY: f64 = 0.37;


/// Immutable set of the height, volatility, temperature and rainfall fields, plus the
/// rarity field used for biome jitter.
#[derive(Debug, Clone)]
pub struct ClimateFields {
    height: NoiseField,
    volatility: NoiseField,
    temperature: NoiseField,
    rainfall: NoiseField,
    rarity: NoiseField,
}

impl ClimateFields {

    /// Build all fields for the given world seed.
    pub fn new(seed: i64, config: &GeneratorConfig) -> Result<Self, NoiseFieldError> {

        let elev_factor = config.max_elev / 256.0;
        let freq_height = 0.003 / elev_factor / (4.0 * PI);
        let freq_volatility = 0.003 / elev_factor / (4.0 * PI);
        let freq_temperature = 0.005 / elev_factor / (4.0 * PI);
        let freq_rainfall = 0.005 / elev_factor / (4.0 * PI);

        // Non-positive or tiny elevations give zero octaves, rejected by the builder.
        let octaves = config.max_elev.ln().max(0.0) as usize;

        // Field seeds are consecutive draws of a scrambled generator, so each field
        // gets an independent seed from a single world seed.
        let mut rand = JavaRandom::new(seed);
        let scrambled = rand.next_long() ^ rand.next_long();
        rand.set_seed(scrambled);

        let height = NoiseFieldBuilder::new(rand.next_int() as i64)
            .octaves(octaves)
            .amplitude(1.3)
            .frequency(freq_height)
            .build()?;

        let volatility = NoiseFieldBuilder::new(rand.next_int() as i64)
            .octaves(octaves)
            .amplitude(1.0)
            .clamp(-0.5, 0.5)
            .frequency(freq_volatility)
            .build()?;

        let temperature = NoiseFieldBuilder::new(rand.next_int() as i64)
            .octaves(octaves)
            .amplitude(0.9)
            .bias(0.5)
            .clamp(0.0, 1.0)
            .frequency(freq_temperature)
            .build()?;

        let rainfall = NoiseFieldBuilder::new(rand.next_int() as i64)
            .octaves(octaves)
            .amplitude(0.9)
            .bias(0.5)
            .clamp(0.0, 1.0)
            .frequency(freq_rainfall)
            .build()?;

        let rarity = NoiseFieldBuilder::new(rand.next_int() as i64)
            .octaves(octaves)
            .amplitude(1.0)
            .clamp(-1.0, 1.0)
            .frequency_xyz(config.rarity_frequency, RARITY_INDEX_FREQUENCY, config.rarity_frequency)
            .build()?;

        debug!("built climate fields with {octaves} octaves for seed {seed}");

        Ok(Self {
            height,
            volatility,
            temperature,
            rainfall,
            rarity,
        })

    }

    #[inline]
    pub fn field(&self, kind: ClimateKind) -> &NoiseField {
        match kind {
            ClimateKind::Height => &self.height,
            ClimateKind::Volatility => &self.volatility,
            ClimateKind::Temperature => &self.temperature,
            ClimateKind::Rainfall => &self.rainfall,
        }
    }

    #[inline]
    pub fn rarity(&self) -> &NoiseField {
        &self.rarity
    }

    /// Sample a raw climate value of a column, directly from the field.
    #[inline]
    pub fn sample(&self, kind: ClimateKind, x: i32, z: i32) -> f64 {
        self.field(kind).sample(x as f64, 0.0, z as f64)
    }

}
