//! Layered noise fields: octaves of Perlin noise composed with point scaling, an affine
//! scale and bias stage, and a final clamp.
//!
//! A field is configured through [`NoiseFieldBuilder`] and is immutable once built, so
//! it can be sampled concurrently from any number of threads. Invalid parameters are
//! rejected by [`NoiseFieldBuilder::build`], sampling itself never fails.

use std::f64::consts::E;

use glam::DVec3;
use thiserror::Error;

use crate::util::{JavaRandom, PerlinNoise};


/// Maximum number of octaves a field can be built with.
pub const MAX_OCTAVES: usize = 30;


/// Builder for a [`NoiseField`], all setters can be chained.
#[derive(Debug, Clone)]
pub struct NoiseFieldBuilder {
    seed: i64,
    octaves: usize,
    persistence: f64,
    lacunarity: f64,
    frequency: DVec3,
    amplitude: f64,
    bias: f64,
    clamp: Option<(f64, f64)>,
}

impl NoiseFieldBuilder {

    /// Create a new builder with the given seed and default parameters: 10 octaves,
    /// persistence of 0.5, lacunarity of `e`, unit frequency and amplitude, no bias.
    pub fn new(seed: i64) -> Self {
        Self {
            seed,
            octaves: 10,
            persistence: 0.5,
            lacunarity: E,
            frequency: DVec3::ONE,
            amplitude: 1.0,
            bias: 0.0,
            clamp: None,
        }
    }

    /// Number of noise layers summed together.
    #[inline]
    pub fn octaves(mut self, octaves: usize) -> Self {
        self.octaves = octaves;
        self
    }

    /// Amplitude factor applied between two successive octaves.
    #[inline]
    pub fn persistence(mut self, persistence: f64) -> Self {
        self.persistence = persistence;
        self
    }

    /// Frequency factor applied between two successive octaves.
    #[inline]
    pub fn lacunarity(mut self, lacunarity: f64) -> Self {
        self.lacunarity = lacunarity;
        self
    }

    /// Set the same frequency on all three axes.
    #[inline]
    pub fn frequency(mut self, frequency: f64) -> Self {
        self.frequency = DVec3::splat(frequency);
        self
    }

    #[inline]
    pub fn frequency_xyz(mut self, x: f64, y: f64, z: f64) -> Self {
        self.frequency = DVec3::new(x, y, z);
        self
    }

    /// Scale applied to the summed octaves. Unless [`Self::clamp`] is called, the output
    /// is clamped to `bias ± amplitude`.
    #[inline]
    pub fn amplitude(mut self, amplitude: f64) -> Self {
        self.amplitude = amplitude;
        self
    }

    #[inline]
    pub fn bias(mut self, bias: f64) -> Self {
        self.bias = bias;
        self
    }

    /// Explicit output bounds, overriding the amplitude-derived ones.
    #[inline]
    pub fn clamp(mut self, min: f64, max: f64) -> Self {
        self.clamp = Some((min, max));
        self
    }

    /// Validate the parameters and build the octave generators.
    pub fn build(self) -> Result<NoiseField, NoiseFieldError> {

        if self.octaves == 0 || self.octaves > MAX_OCTAVES {
            return Err(NoiseFieldError::OctaveCount(self.octaves));
        }

        if !self.lacunarity.is_finite() || self.lacunarity <= 1.0 {
            return Err(NoiseFieldError::Lacunarity(self.lacunarity));
        }

        if !self.persistence.is_finite() || self.persistence <= 0.0 {
            return Err(NoiseFieldError::Persistence(self.persistence));
        }

        if !self.frequency.is_finite() || self.frequency.min_element() <= 0.0 {
            return Err(NoiseFieldError::Frequency(self.frequency));
        }

        if !self.amplitude.is_finite() || !self.bias.is_finite() {
            return Err(NoiseFieldError::ScaleBias { amplitude: self.amplitude, bias: self.bias });
        }

        let (clamp_min, clamp_max) = self.clamp.unwrap_or_else(|| {
            let half = self.amplitude.abs();
            (self.bias - half, self.bias + half)
        });

        if clamp_min.is_nan() || clamp_max.is_nan() || clamp_min > clamp_max {
            return Err(NoiseFieldError::Clamp { min: clamp_min, max: clamp_max });
        }

        let mut rand = JavaRandom::new(self.seed);
        let octaves = (0..self.octaves)
            .map(|_| PerlinNoise::new(&mut rand))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Ok(NoiseField {
            octaves,
            persistence: self.persistence,
            lacunarity: self.lacunarity,
            frequency: self.frequency,
            amplitude: self.amplitude,
            bias: self.bias,
            clamp_min,
            clamp_max,
        })

    }

}


/// An immutable scalar field over 3D coordinates.
#[derive(Debug, Clone)]
pub struct NoiseField {
    /// One generator per octave, from lowest to highest frequency.
    octaves: Box<[PerlinNoise]>,
    persistence: f64,
    lacunarity: f64,
    /// Per-axis frequency applied to the point before sampling.
    frequency: DVec3,
    amplitude: f64,
    bias: f64,
    clamp_min: f64,
    clamp_max: f64,
}

impl NoiseField {

    #[inline]
    pub fn sample(&self, x: f64, y: f64, z: f64) -> f64 {
        self.sample_point(DVec3::new(x, y, z))
    }

    /// Sample the field at the given point, the result is always within the field's
    /// clamp bounds.
    pub fn sample_point(&self, pos: DVec3) -> f64 {

        let mut pos = pos * self.frequency;
        let mut weight = 1.0;
        let mut value = 0.0;

        for octave in &self.octaves[..] {
            value += octave.sample(pos) * weight;
            pos *= self.lacunarity;
            weight *= self.persistence;
        }

        (value * self.amplitude + self.bias).clamp(self.clamp_min, self.clamp_max)

    }

    /// Return the inclusive output bounds of this field.
    #[inline]
    pub fn bounds(&self) -> (f64, f64) {
        (self.clamp_min, self.clamp_max)
    }

    #[inline]
    pub fn octave_count(&self) -> usize {
        self.octaves.len()
    }

}


/// Configuration error returned when building a [`NoiseField`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NoiseFieldError {
    #[error("octave count must be in 1..=30, got {0}")]
    OctaveCount(usize),
    #[error("lacunarity must be finite and greater than 1, got {0}")]
    Lacunarity(f64),
    #[error("persistence must be finite and positive, got {0}")]
    Persistence(f64),
    #[error("frequency must be finite and positive on every axis, got {0}")]
    Frequency(DVec3),
    #[error("amplitude and bias must be finite, got {amplitude} and {bias}")]
    ScaleBias { amplitude: f64, bias: f64 },
    #[error("clamp bounds are invalid: [{min}, {max}]")]
    Clamp { min: f64, max: f64 },
}
