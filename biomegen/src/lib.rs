//! Climate noise fields and biome classification for procedural worlds.
//!
//! A [`BiomeSource`] derives four climate fields (height, volatility, temperature and
//! rainfall) from a world seed, and classifies every column into the nearest biome of
//! a [`BiomeRegistry`] through an ordered chain of increasingly relaxed matchers.

pub mod util;

pub mod field;
pub mod cache;
pub mod climate;
pub mod biome;

pub mod config;
pub mod source;

pub use biome::{BiomeDefinition, BiomeId, BiomeRegistry, CoverageGap};
pub use config::GeneratorConfig;
pub use source::{BiomeSource, GeneratorError};
