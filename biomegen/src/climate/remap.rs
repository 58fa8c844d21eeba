//! Remapping of raw climate noise into the bands used to classify biomes.
//!
//! Height goes first: volatility is derived from the remapped height.

use super::ClimateSample;


/// Shape a raw height sample into a realistic land/ocean/mountain distribution. The
/// curve is piecewise linear and continuous, the result must still be clamped to
/// `[-1, 1]` by the caller.
pub fn remap_height(raw: f64) -> f64 {
    if raw <= 0.0 {
        // Ocean.
        raw
    } else if raw <= 0.05 {
        // Beach and swamp.
        raw * 0.2
    } else if raw <= 0.3 {
        // Plains-like.
        raw * 0.5 - 0.015
    } else if raw <= 0.6 {
        // Forest-like.
        raw - 0.165
    } else if raw <= 0.8 {
        // Hills.
        1.5 * raw - 0.465
    } else {
        // Mountains.
        1.75 * raw - 0.665
    }
}

/// Compute the real volatility at a point. Volatility can never exceed the magnitude of
/// the height and vanishes in dry or cold climates.
pub fn remap_volatility(raw: f64, height: f64, rainfall: f64, temperature: f64) -> f64 {
    let capped = height.abs().min((raw.abs() * 0.95 + 0.05) * (height * height).abs().sqrt());
    capped * (1.0 - (1.0 - rainfall * temperature).powi(4))
}


impl ClimateSample {

    /// Build a sample from the raw noise values of a point.
    pub fn from_raw(raw_height: f64, raw_volatility: f64, temperature: f64, rainfall: f64) -> Self {
        let height = remap_height(raw_height).clamp(-1.0, 1.0);
        let volatility = remap_volatility(raw_volatility / 2.0, height, rainfall, temperature);
        Self {
            height,
            volatility,
            temperature,
            rainfall,
        }
    }

}
