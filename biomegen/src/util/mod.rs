//! Seeded randomness and coherent noise primitives.

mod rand;
mod noise;

pub use rand::JavaRandom;
pub use noise::PerlinNoise;
