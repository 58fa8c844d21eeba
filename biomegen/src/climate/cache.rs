//! Per-region grids of raw climate values and their cache.

use std::sync::Arc;

use tracing::instrument;

use crate::cache::{CacheBounds, CacheStats, SharedRegionCache};
use crate::field::NoiseField;

use super::{ClimateFields, ClimateKind, ClimateSample};


/// Width of a region in blocks.
pub const REGION_WIDTH: usize = 16;
/// Width of a region grid, one more than the region so that the last row and column
/// overlap the first ones of the next region, which interpolation needs.
pub const GRID_SIZE: usize = REGION_WIDTH + 1;


/// A grid of raw values of one climate field over a region, indexed `[x][z]` relative
/// to the region origin.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseGrid {
    values: [[f64; GRID_SIZE]; GRID_SIZE],
}

impl NoiseGrid {

    fn sample(field: &NoiseField, origin_x: i64, origin_z: i64) -> Self {
        Self {
            values: std::array::from_fn(|x| std::array::from_fn(|z| {
                field.sample((origin_x + x as i64) as f64, 0.0, (origin_z + z as i64) as f64)
            })),
        }
    }

    #[inline]
    pub fn get(&self, x: usize, z: usize) -> f64 {
        self.values[x][z]
    }

    #[inline]
    pub fn as_array(&self) -> &[[f64; GRID_SIZE]; GRID_SIZE] {
        &self.values
    }

}


/// The four climate grids of a region, always built together.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseGridBundle {
    height: NoiseGrid,
    volatility: NoiseGrid,
    temperature: NoiseGrid,
    rainfall: NoiseGrid,
}

impl NoiseGridBundle {

    /// Sample all fields over the 17x17 lattice of the given region.
    #[instrument(skip(fields))]
    pub fn build(fields: &ClimateFields, rx: i32, rz: i32) -> Self {
        // Computed in 64 bits, the last lattice row of the last region is past i32::MAX.
        let origin_x = rx as i64 * REGION_WIDTH as i64;
        let origin_z = rz as i64 * REGION_WIDTH as i64;
        Self {
            height: NoiseGrid::sample(fields.field(ClimateKind::Height), origin_x, origin_z),
            volatility: NoiseGrid::sample(fields.field(ClimateKind::Volatility), origin_x, origin_z),
            temperature: NoiseGrid::sample(fields.field(ClimateKind::Temperature), origin_x, origin_z),
            rainfall: NoiseGrid::sample(fields.field(ClimateKind::Rainfall), origin_x, origin_z),
        }
    }

    #[inline]
    pub fn get(&self, kind: ClimateKind) -> &NoiseGrid {
        match kind {
            ClimateKind::Height => &self.height,
            ClimateKind::Volatility => &self.volatility,
            ClimateKind::Temperature => &self.temperature,
            ClimateKind::Rainfall => &self.rainfall,
        }
    }

    /// Remapped climate at the given position relative to the region origin.
    #[inline]
    pub fn climate(&self, x: usize, z: usize) -> ClimateSample {
        ClimateSample::from_raw(
            self.height.get(x, z),
            self.volatility.get(x, z),
            self.temperature.get(x, z),
            self.rainfall.get(x, z))
    }

}


/// The climate fields together with the cache of their region grids.
#[derive(Debug)]
pub struct FieldCache {
    fields: ClimateFields,
    cache: SharedRegionCache<NoiseGridBundle>,
}

impl FieldCache {

    pub fn new(fields: ClimateFields, bounds: CacheBounds) -> Self {
        Self {
            fields,
            cache: SharedRegionCache::new("noise", bounds),
        }
    }

    /// Get the grid bundle of a region, building all four grids on a miss.
    pub fn bundle(&self, rx: i32, rz: i32) -> Arc<NoiseGridBundle> {
        self.cache.get_or_build(rx, rz, || NoiseGridBundle::build(&self.fields, rx, rz))
    }

    /// Get a copy of one grid of a region.
    pub fn get_or_build(&self, rx: i32, rz: i32, kind: ClimateKind) -> NoiseGrid {
        self.bundle(rx, rz).get(kind).clone()
    }

    #[inline]
    pub fn fields(&self) -> &ClimateFields {
        &self.fields
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn trim(&self) -> usize {
        self.cache.trim()
    }

}


#[cfg(test)]
mod tests {

    use crate::config::GeneratorConfig;

    use super::*;

    fn fields() -> ClimateFields {
        ClimateFields::new(0x5EED, &GeneratorConfig::default()).unwrap()
    }

    #[test]
    fn grid_matches_direct_samples() {

        let fields = fields();
        let bundle = NoiseGridBundle::build(&fields, -2, 3);

        for kind in ClimateKind::ALL {
            let grid = bundle.get(kind);
            for (x, z) in [(0, 0), (16, 0), (0, 16), (16, 16), (7, 11)] {
                let expected = fields.sample(kind, -32 + x as i32, 48 + z as i32);
                assert_eq!(grid.get(x, z).to_bits(), expected.to_bits());
            }
        }

    }

    #[test]
    fn neighbor_grids_overlap() {

        let fields = fields();
        let a = NoiseGridBundle::build(&fields, 0, 0);
        let b = NoiseGridBundle::build(&fields, 1, 0);

        for z in 0..GRID_SIZE {
            assert_eq!(a.get(ClimateKind::Height).get(16, z), b.get(ClimateKind::Height).get(0, z));
        }

    }

    #[test]
    fn cold_warm_rebuilt_identical() {

        let cold = FieldCache::new(fields(), CacheBounds::new(1, 1));
        let first = cold.bundle(5, -9);
        let warm = cold.bundle(5, -9);
        assert!(Arc::ptr_eq(&first, &warm));

        // Push the region out of the cache then build it again.
        cold.bundle(6, -9);
        cold.bundle(7, -9);
        let rebuilt = cold.bundle(5, -9);
        assert!(!Arc::ptr_eq(&first, &rebuilt));
        assert_eq!(*first, *rebuilt);

        let other = FieldCache::new(fields(), CacheBounds::default());
        assert_eq!(other.get_or_build(5, -9, ClimateKind::Rainfall), *first.get(ClimateKind::Rainfall));

        let stats = cold.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 4);
        assert!(stats.evictions >= 2);

    }

    #[test]
    fn values_within_field_bounds() {

        let fields = fields();
        let bundle = NoiseGridBundle::build(&fields, 12, 12);

        for kind in ClimateKind::ALL {
            let (min, max) = fields.field(kind).bounds();
            for row in bundle.get(kind).as_array() {
                for &value in row {
                    assert!(value >= min && value <= max);
                }
            }
        }

        for x in 0..REGION_WIDTH {
            for z in 0..REGION_WIDTH {
                let sample = bundle.climate(x, z);
                assert!((-1.0..=1.0).contains(&sample.height));
                assert!(sample.volatility >= 0.0 && sample.volatility <= sample.height.abs());
            }
        }

    }

    #[test]
    fn climate_passes_temperature_and_rainfall_through() {

        let bundle = NoiseGridBundle::build(&fields(), -7, 0);

        for (x, z) in [(0, 0), (5, 12), (15, 15)] {
            let sample = bundle.climate(x, z);
            for kind in [ClimateKind::Temperature, ClimateKind::Rainfall] {
                assert_eq!(sample.get(kind), bundle.get(kind).get(x, z));
            }
            assert_eq!(sample.get(ClimateKind::Height), sample.height);
            assert_eq!(sample.get(ClimateKind::Volatility), sample.volatility);
        }

    }

}
