//! Nearest-biome search for a single matcher configuration.

use std::ops::{BitOr, BitOrAssign};

use crate::climate::ClimateSample;

use super::{BiomeDefinition, BiomeId, BiomeRegistry, RarityField};


/// Number of climate dimensions taking part in the distance.
pub const DIST_DIMENSIONS: usize = 4;


/// Flags selecting the checks and metrics of a [`BiomeMatcher`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MatcherFlags(u16);

impl MatcherFlags {

    /// Check everything, normal metrics, rarity applied.
    pub const STRICT: Self = Self(0);
    pub const IGNORE_HEIGHT: Self = Self(1);
    pub const IGNORE_VOLATILITY: Self = Self(2);
    pub const IGNORE_TEMPERATURE: Self = Self(4);
    pub const IGNORE_RAINFALL: Self = Self(8);
    pub const HEIGHT_INV: Self = Self(16);
    pub const VOLATILITY_INV: Self = Self(32);
    pub const TEMPERATURE_INV: Self = Self(64);
    pub const RAINFALL_INV: Self = Self(128);
    /// Disable extended height/volatility checks even for biomes requesting them.
    pub const FORCE_NO_EXTENDED_CHECKS: Self = Self(256);
    pub const NO_RARITY: Self = Self(512);

    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn bits(self) -> u16 {
        self.0
    }

}

impl BitOr for MatcherFlags {

    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }

}

impl BitOrAssign for MatcherFlags {

    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }

}


/// The per-dimension distance between a value and a biome range. Neither metric is a
/// true distance, values are only meaningful for ranking biomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    /// Offset from the range center weighted by the range width.
    Normal,
    /// Offset from the range center divided by the range width, used by relaxed
    /// matchers as a secondary ranking.
    Inverted,
}

impl DistanceMetric {

    #[inline]
    fn from_inverted(inverted: bool) -> Self {
        if inverted { Self::Inverted } else { Self::Normal }
    }

    #[inline]
    pub fn distance(self, min: f64, max: f64, value: f64) -> f64 {
        let center_offset = (min + max) * 0.5 - value;
        let width = min - max;
        match self {
            Self::Normal => center_offset * width,
            Self::Inverted => center_offset / width + width * width * 0.5 - 0.5,
        }
    }

}


/// Compute the distance jitter of a biome from the rarity noise at its point and its
/// own rarity, both in `[-1, 1]`. The result is in `[-DIST_DIMENSIONS, DIST_DIMENSIONS]`,
/// the same range as the squared distance it is added to.
#[inline]
pub fn rarity_jitter(noise: f64, rarity: f64) -> f64 {
    (noise + rarity) * (DIST_DIMENSIONS as f64 / 2.0)
}


/// Finds the nearest biome accepting a climate sample, under one configuration.
#[derive(Debug, Clone)]
pub struct BiomeMatcher {
    flags: MatcherFlags,
    height_metric: DistanceMetric,
    volatility_metric: DistanceMetric,
    temperature_metric: DistanceMetric,
    rainfall_metric: DistanceMetric,
    ignore_height: bool,
    ignore_volatility: bool,
    ignore_temperature: bool,
    ignore_rainfall: bool,
    no_extended_checks: bool,
    no_rarity: bool,
}

impl BiomeMatcher {

    pub fn new(flags: MatcherFlags) -> Self {
        Self {
            flags,
            height_metric: DistanceMetric::from_inverted(flags.contains(MatcherFlags::HEIGHT_INV)),
            volatility_metric: DistanceMetric::from_inverted(flags.contains(MatcherFlags::VOLATILITY_INV)),
            temperature_metric: DistanceMetric::from_inverted(flags.contains(MatcherFlags::TEMPERATURE_INV)),
            rainfall_metric: DistanceMetric::from_inverted(flags.contains(MatcherFlags::RAINFALL_INV)),
            ignore_height: flags.contains(MatcherFlags::IGNORE_HEIGHT),
            ignore_volatility: flags.contains(MatcherFlags::IGNORE_VOLATILITY),
            ignore_temperature: flags.contains(MatcherFlags::IGNORE_TEMPERATURE),
            ignore_rainfall: flags.contains(MatcherFlags::IGNORE_RAINFALL),
            no_extended_checks: flags.contains(MatcherFlags::FORCE_NO_EXTENDED_CHECKS),
            no_rarity: flags.contains(MatcherFlags::NO_RARITY),
        }
    }

    #[inline]
    pub fn flags(&self) -> MatcherFlags {
        self.flags
    }

    /// Return true if the sample lies within all of the biome's non-ignored ranges.
    pub fn accepts(&self, biome: &BiomeDefinition, sample: &ClimateSample) -> bool {

        let extended = !self.no_extended_checks && biome.extended_height_volatility_checks;

        // With extended checks the point spans height ± volatility, so volatility can
        // never exceed half of the biome's height range.
        let max_volatility = if extended {
            f64::min((biome.max_height - biome.min_height) * 0.5, biome.max_volatility)
        } else {
            biome.max_volatility
        };

        let height_ok = self.ignore_height || if extended {
            in_range(biome.min_height, biome.max_height, sample.height - sample.volatility)
                && in_range(biome.min_height, biome.max_height, sample.height + sample.volatility)
        } else {
            in_range(biome.min_height, biome.max_height, sample.height)
        };

        height_ok
            && (self.ignore_volatility || in_range(biome.min_volatility, max_volatility, sample.volatility))
            && (self.ignore_temperature || in_range(biome.min_temperature, biome.max_temperature, sample.temperature))
            && (self.ignore_rainfall || in_range(biome.min_rainfall, biome.max_rainfall, sample.rainfall))

    }

    /// Sum of the squared per-dimension distances, without rarity.
    pub fn distance_squared(&self, biome: &BiomeDefinition, sample: &ClimateSample) -> f64 {
        let height = self.height_metric.distance(biome.min_height, biome.max_height, sample.height);
        let volatility = self.volatility_metric.distance(biome.min_volatility, biome.max_volatility, sample.volatility);
        let temperature = self.temperature_metric.distance(biome.min_temperature, biome.max_temperature, sample.temperature);
        let rainfall = self.rainfall_metric.distance(biome.min_rainfall, biome.max_rainfall, sample.rainfall);
        height * height + volatility * volatility + temperature * temperature + rainfall * rainfall
    }

    /// Find the nearest biome accepting the sample at the given block coordinates, the
    /// first registered biome wins exact ties. Returns none only if no biome accepts it,
    /// an accepted biome with a non-finite distance ranks after every finite one.
    pub fn find<R>(&self,
        x: f64,
        z: f64,
        sample: &ClimateSample,
        registry: &BiomeRegistry,
        rarity: &R,
    ) -> Option<BiomeId>
    where
        R: RarityField + ?Sized,
    {

        let mut nearest: Option<(BiomeId, f64)> = None;

        for (id, biome) in registry.iter() {

            if !self.accepts(biome, sample) {
                continue;
            }

            let mut dist = self.distance_squared(biome, sample);

            if !self.no_rarity {
                let noise = rarity.rarity(x / biome.size, id.index(), z / biome.size);
                let jitter = rarity_jitter(noise, biome.rarity);
                debug_assert!(jitter.abs() <= DIST_DIMENSIONS as f64, "rarity noise out of range: {noise}");
                dist += jitter;
            }

            // Degenerate ranges divide by zero with the inverted metric.
            if dist.is_nan() {
                dist = f64::INFINITY;
            }

            if nearest.is_none_or(|(_, min_dist)| dist < min_dist) {
                nearest = Some((id, dist));
            }

        }

        nearest.map(|(id, _)| id)

    }

}

#[inline]
fn in_range(min: f64, max: f64, value: f64) -> bool {
    value >= min && value <= max
}


#[cfg(test)]
mod tests {

    use super::*;

    fn no_rarity(_x: f64, _index: usize, _z: f64) -> f64 {
        0.0
    }

    fn full_range(name: &'static str) -> BiomeDefinition {
        BiomeDefinition::new(name)
            .height(-1.0, 1.0)
            .volatility(0.0, 1.0)
            .temperature(0.0, 1.0)
            .rainfall(0.0, 1.0)
    }

    #[test]
    fn flags_decode() {

        let matcher = BiomeMatcher::new(MatcherFlags::IGNORE_TEMPERATURE | MatcherFlags::RAINFALL_INV | MatcherFlags::NO_RARITY);
        assert!(matcher.ignore_temperature);
        assert!(!matcher.ignore_rainfall);
        assert!(matcher.no_rarity);
        assert_eq!(matcher.rainfall_metric, DistanceMetric::Inverted);
        assert_eq!(matcher.temperature_metric, DistanceMetric::Normal);
        assert_eq!(matcher.flags().bits(), 4 | 128 | 512);

        let mut flags = MatcherFlags::STRICT;
        flags |= MatcherFlags::HEIGHT_INV;
        assert!(flags.contains(MatcherFlags::HEIGHT_INV));
        assert!(!flags.contains(MatcherFlags::HEIGHT_INV | MatcherFlags::IGNORE_HEIGHT));

    }

    #[test]
    fn metrics() {

        // Center is 0.5, width is -1.
        assert_eq!(DistanceMetric::Normal.distance(0.0, 1.0, 0.5), 0.0);
        assert_eq!(DistanceMetric::Normal.distance(0.0, 1.0, 0.0), -0.5);
        assert_eq!(DistanceMetric::Normal.distance(0.0, 1.0, 1.0), 0.5);
        assert_eq!(DistanceMetric::Inverted.distance(0.0, 1.0, 0.5), 0.0);
        assert_eq!(DistanceMetric::Inverted.distance(0.0, 1.0, 0.0), -0.5);

        // Center is 0.25, width is -0.5.
        assert_eq!(DistanceMetric::Normal.distance(0.0, 0.5, 0.75), 0.25);
        assert_eq!(DistanceMetric::Inverted.distance(0.0, 0.5, 0.75), 1.0 + 0.125 - 0.5);

    }

    #[test]
    fn jitter_bounds() {

        assert_eq!(rarity_jitter(1.0, 1.0), 4.0);
        assert_eq!(rarity_jitter(-1.0, -1.0), -4.0);
        assert_eq!(rarity_jitter(1.0, -1.0), 0.0);
        assert_eq!(rarity_jitter(0.0, -1.0), -2.0);

        for n in -10..=10 {
            for r in -10..=10 {
                let jitter = rarity_jitter(n as f64 / 10.0, r as f64 / 10.0);
                assert!(jitter.abs() <= DIST_DIMENSIONS as f64);
            }
        }

    }

    #[test]
    fn single_biome_in_range() {

        let registry = BiomeRegistry::new([full_range("only").rarity(0.0).size(1.0)]).unwrap();
        let matcher = BiomeMatcher::new(MatcherFlags::NO_RARITY);
        let sample = ClimateSample::new(0.0, 0.1, 0.5, 0.5);

        assert_eq!(matcher.find(0.0, 0.0, &sample, &registry, &no_rarity), registry.id_of("only"));

    }

    #[test]
    fn out_of_range_is_none() {

        let registry = BiomeRegistry::new([full_range("only")]).unwrap();
        let matcher = BiomeMatcher::new(MatcherFlags::STRICT);

        assert_eq!(matcher.find(0.0, 0.0, &ClimateSample::new(5.0, 0.1, 0.5, 0.5), &registry, &no_rarity), None);
        assert_eq!(matcher.find(0.0, 0.0, &ClimateSample::new(0.0, 0.1, 1.5, 0.5), &registry, &no_rarity), None);

        let relaxed = BiomeMatcher::new(MatcherFlags::IGNORE_TEMPERATURE);
        assert!(relaxed.find(0.0, 0.0, &ClimateSample::new(0.0, 0.1, 1.5, 0.5), &registry, &no_rarity).is_some());

    }

    #[test]
    fn extended_checks() {

        let biome = full_range("hills").height(0.2, 0.6).volatility(0.0, 0.5).extended_checks(true);
        let strict = BiomeMatcher::new(MatcherFlags::STRICT);
        let no_ext = BiomeMatcher::new(MatcherFlags::FORCE_NO_EXTENDED_CHECKS);

        // 0.4 ± 0.15 fits in [0.2, 0.6].
        assert!(strict.accepts(&biome, &ClimateSample::new(0.4, 0.15, 0.5, 0.5)));
        // 0.3 - 0.15 goes below the range, only the plain height check passes.
        let low = ClimateSample::new(0.3, 0.15, 0.5, 0.5);
        assert!(!strict.accepts(&biome, &low));
        assert!(no_ext.accepts(&biome, &low));
        // Volatility is capped by half the height range (0.2) instead of 0.5.
        let volatile = ClimateSample::new(0.4, 0.25, 0.5, 0.5);
        assert!(!strict.accepts(&biome, &volatile));
        assert!(no_ext.accepts(&biome, &volatile));

    }

    #[test]
    fn nearest_wins_and_ties_keep_first() {

        let registry = BiomeRegistry::new([
            full_range("wide"),
            full_range("narrow").temperature(0.4, 0.6),
            full_range("narrow_twin").temperature(0.4, 0.6),
        ]).unwrap();

        let matcher = BiomeMatcher::new(MatcherFlags::NO_RARITY);
        let sample = ClimateSample::new(0.0, 0.0, 0.45, 0.5);

        // Both narrow biomes have a smaller temperature distance, the first one wins.
        assert_eq!(matcher.find(0.0, 0.0, &sample, &registry, &no_rarity), registry.id_of("narrow"));

    }

    #[test]
    fn rarity_sign_decides() {

        let registry = BiomeRegistry::new([
            full_range("common").rarity(1.0),
            full_range("rare").rarity(-1.0),
        ]).unwrap();

        let matcher = BiomeMatcher::new(MatcherFlags::STRICT);
        let sample = ClimateSample::new(0.0, 0.1, 0.5, 0.5);

        // Same ranges so same raw distance, with a null rarity field only the biome
        // rarity matters and the lowest one wins.
        assert_eq!(matcher.find(3.0, -7.0, &sample, &registry, &no_rarity), registry.id_of("rare"));

        // Without rarity, the tie is broken by registration order.
        let no_rarity_matcher = BiomeMatcher::new(MatcherFlags::NO_RARITY);
        assert_eq!(no_rarity_matcher.find(3.0, -7.0, &sample, &registry, &no_rarity), registry.id_of("common"));

    }

    #[test]
    fn rarity_field_receives_scaled_coordinates() {

        let registry = BiomeRegistry::new([
            full_range("a").size(4.0),
            full_range("b").size(2.0),
        ]).unwrap();

        // Favor biome b only at its own index and scaled coordinates.
        let field = |x: f64, index: usize, z: f64| {
            if index == 1 && x == 5.0 && z == -3.0 { -1.0 } else { 0.0 }
        };

        let matcher = BiomeMatcher::new(MatcherFlags::STRICT);
        let sample = ClimateSample::new(0.0, 0.1, 0.5, 0.5);
        assert_eq!(matcher.find(10.0, -6.0, &sample, &registry, &field), registry.id_of("b"));
        assert_eq!(matcher.find(10.0, -8.0, &sample, &registry, &field), registry.id_of("a"));

    }

    #[test]
    fn degenerate_range_still_found() {

        let registry = BiomeRegistry::new([
            full_range("flat").temperature(0.5, 0.5),
        ]).unwrap();

        // Temperature is ignored but the inverted metric divides by a zero width.
        let relaxed = BiomeMatcher::new(MatcherFlags::IGNORE_TEMPERATURE | MatcherFlags::TEMPERATURE_INV | MatcherFlags::NO_RARITY);
        let sample = ClimateSample::new(0.0, 0.1, 0.2, 0.5);
        assert!(relaxed.accepts(&registry[registry.id_of("flat").unwrap()], &sample));
        assert!(!relaxed.distance_squared(&registry[registry.id_of("flat").unwrap()], &sample).is_finite());
        assert_eq!(relaxed.find(0.0, 0.0, &sample, &registry, &no_rarity), registry.id_of("flat"));

        // At the exact center the distance is NaN, it still wins alone.
        let center = ClimateSample::new(0.0, 0.1, 0.5, 0.5);
        assert_eq!(relaxed.find(0.0, 0.0, &center, &registry, &no_rarity), registry.id_of("flat"));

    }

    #[test]
    fn finite_distance_beats_degenerate() {

        let registry = BiomeRegistry::new([
            full_range("flat").temperature(0.5, 0.5),
            full_range("wide"),
        ]).unwrap();

        let relaxed = BiomeMatcher::new(MatcherFlags::IGNORE_TEMPERATURE | MatcherFlags::TEMPERATURE_INV | MatcherFlags::NO_RARITY);
        let sample = ClimateSample::new(0.0, 0.1, 0.2, 0.5);
        assert_eq!(relaxed.find(0.0, 0.0, &sample, &registry, &no_rarity), registry.id_of("wide"));

    }

}
