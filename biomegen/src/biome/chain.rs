//! Ordered fallback of biome matchers.

use std::sync::atomic::{AtomicU64, Ordering};

use thiserror::Error;
use tracing::{debug, trace};

use crate::climate::ClimateSample;

use super::{BiomeId, BiomeMatcher, BiomeRegistry, MatcherFlags, RarityField};


/// An ordered list of matchers, each one consulted only when all the previous ones
/// found no biome for a point.
#[derive(Debug)]
pub struct MatcherChain {
    stages: Vec<Stage>,
}

#[derive(Debug)]
struct Stage {
    matcher: BiomeMatcher,
    consulted: AtomicU64,
    matched: AtomicU64,
}

impl MatcherChain {

    pub fn new(matchers: Vec<BiomeMatcher>) -> Result<Self, ChainError> {

        if matchers.is_empty() {
            return Err(ChainError::Empty);
        }

        Ok(Self {
            stages: matchers.into_iter().map(|matcher| Stage {
                matcher,
                consulted: AtomicU64::new(0),
                matched: AtomicU64::new(0),
            }).collect(),
        })

    }

    /// The default chain: a strict matcher, then relaxed on temperature and rainfall,
    /// then without extended checks, and finally relaxed on volatility without rarity.
    pub fn standard() -> Self {

        let stage0 = MatcherFlags::STRICT;
        let stage1 = MatcherFlags::IGNORE_TEMPERATURE
            | MatcherFlags::IGNORE_RAINFALL
            | MatcherFlags::TEMPERATURE_INV
            | MatcherFlags::RAINFALL_INV;
        let stage2 = stage1 | MatcherFlags::FORCE_NO_EXTENDED_CHECKS;
        let stage3 = stage2
            | MatcherFlags::IGNORE_VOLATILITY
            | MatcherFlags::VOLATILITY_INV
            | MatcherFlags::NO_RARITY;

        Self {
            stages: [stage0, stage1, stage2, stage3].into_iter().map(|flags| Stage {
                matcher: BiomeMatcher::new(flags),
                consulted: AtomicU64::new(0),
                matched: AtomicU64::new(0),
            }).collect(),
        }

    }

    /// Classify a point, falling back stage by stage. The error is returned when no
    /// stage, including the last one, finds a biome: the registry does not cover the
    /// climate of this point.
    pub fn resolve<R>(&self,
        x: f64,
        z: f64,
        sample: &ClimateSample,
        registry: &BiomeRegistry,
        rarity: &R,
    ) -> Result<BiomeId, CoverageGap>
    where
        R: RarityField + ?Sized,
    {

        let last = self.stages.len() - 1;

        for (index, stage) in self.stages.iter().enumerate() {

            stage.consulted.fetch_add(1, Ordering::Relaxed);

            if let Some(id) = stage.matcher.find(x, z, sample, registry, rarity) {

                stage.matched.fetch_add(1, Ordering::Relaxed);

                if index == last && index != 0 {
                    debug!("last stage matched at {x}/{z}: {sample:?}");
                } else if index != 0 {
                    trace!("stage {index} matched at {x}/{z}");
                }

                return Ok(id);

            }

        }

        Err(CoverageGap { x, z, sample: *sample })

    }

    #[inline]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always false, a chain cannot be built empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stages(&self) -> impl Iterator<Item = &BiomeMatcher> + '_ {
        self.stages.iter().map(|stage| &stage.matcher)
    }

    /// Snapshot of the per-stage counters, in stage order.
    pub fn stats(&self) -> Vec<StageStats> {
        self.stages.iter().map(|stage| StageStats {
            flags: stage.matcher.flags(),
            consulted: stage.consulted.load(Ordering::Relaxed),
            matched: stage.matched.load(Ordering::Relaxed),
        }).collect()
    }

}

impl Default for MatcherChain {
    fn default() -> Self {
        Self::standard()
    }
}


/// Counters of one stage of a [`MatcherChain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageStats {
    pub flags: MatcherFlags,
    pub consulted: u64,
    pub matched: u64,
}


#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("a matcher chain needs at least one matcher")]
    Empty,
}


/// No biome of the registry covers the climate of a point, even with the most relaxed
/// matcher of the chain.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("no biome for values found: h = {h}, v = {v}, t = {t}, r = {r} at {x}/{z}",
    h = .sample.height, v = .sample.volatility, t = .sample.temperature, r = .sample.rainfall)]
pub struct CoverageGap {
    pub x: f64,
    pub z: f64,
    pub sample: ClimateSample,
}


#[cfg(test)]
mod tests {

    use crate::biome::BiomeDefinition;

    use super::*;

    fn no_rarity(_x: f64, _index: usize, _z: f64) -> f64 {
        0.0
    }

    fn land_registry() -> BiomeRegistry {
        BiomeRegistry::new([
            BiomeDefinition::new("cold_plains").height(0.0, 0.5).temperature(0.0, 0.3),
            BiomeDefinition::new("hot_plains").height(0.0, 0.5).temperature(0.7, 1.0),
            BiomeDefinition::new("hills").height(0.2, 0.6).volatility(0.0, 0.3).extended_checks(true),
        ]).unwrap()
    }

    #[test]
    fn standard_flags() {

        let chain = MatcherChain::standard();
        let flags = chain.stages().map(|m| m.flags().bits()).collect::<Vec<_>>();
        assert_eq!(flags, [0, 4 | 8 | 64 | 128, 4 | 8 | 64 | 128 | 256, 4 | 8 | 64 | 128 | 256 | 2 | 32 | 512]);
        assert_eq!(chain.len(), 4);

    }

    #[test]
    fn empty_chain_rejected() {
        assert_eq!(MatcherChain::new(Vec::new()).unwrap_err(), ChainError::Empty);
    }

    #[test]
    fn first_stage_match() {

        let registry = land_registry();
        let chain = MatcherChain::standard();
        let sample = ClimateSample::new(0.1, 0.05, 0.1, 0.5);

        assert_eq!(chain.resolve(0.0, 0.0, &sample, &registry, &no_rarity), Ok(registry.id_of("cold_plains").unwrap()));

        let stats = chain.stats();
        assert_eq!((stats[0].consulted, stats[0].matched), (1, 1));
        assert_eq!(stats[1].consulted, 0);

    }

    #[test]
    fn falls_back_on_temperature() {

        let registry = land_registry();
        let chain = MatcherChain::standard();
        // Mild temperature, outside of both plains and too low for the hills.
        let sample = ClimateSample::new(0.1, 0.05, 0.5, 0.5);

        let id = chain.resolve(0.0, 0.0, &sample, &registry, &no_rarity).unwrap();
        assert!(registry[id].name.starts_with("cold") || registry[id].name.starts_with("hot"));

        let stats = chain.stats();
        assert_eq!((stats[0].consulted, stats[0].matched), (1, 0));
        assert_eq!((stats[1].consulted, stats[1].matched), (1, 1));
        assert_eq!(stats[2].consulted, 0);

    }

    #[test]
    fn falls_back_on_extended_checks() {

        let registry = BiomeRegistry::new([
            BiomeDefinition::new("hills").height(0.2, 0.6).volatility(0.0, 0.3).extended_checks(true),
        ]).unwrap();
        let chain = MatcherChain::standard();
        // 0.25 - 0.1 goes below the hills, only accepted once extended checks are off.
        let sample = ClimateSample::new(0.25, 0.1, 0.5, 0.5);

        assert_eq!(chain.resolve(1.0, 2.0, &sample, &registry, &no_rarity), Ok(registry.id_of("hills").unwrap()));

        let stats = chain.stats();
        assert_eq!(stats[0].matched, 0);
        assert_eq!(stats[1].matched, 0);
        assert_eq!(stats[2].matched, 1);

    }

    #[test]
    fn coverage_gap() {

        let registry = land_registry();
        let chain = MatcherChain::standard();
        let sample = ClimateSample::new(5.0, 0.1, 0.5, 0.5);

        let err = chain.resolve(3.0, -4.0, &sample, &registry, &no_rarity).unwrap_err();
        assert_eq!(err, CoverageGap { x: 3.0, z: -4.0, sample });
        assert_eq!(err.to_string(), "no biome for values found: h = 5, v = 0.1, t = 0.5, r = 0.5 at 3/-4");

        // Every stage was consulted once and none matched.
        for stats in chain.stats() {
            assert_eq!((stats.consulted, stats.matched), (1, 0));
        }

    }

    #[test]
    fn counters_are_monotonic() {

        let registry = land_registry();
        let chain = MatcherChain::standard();
        let mut previous = chain.stats();

        for i in 0..50 {
            let t = i as f64 / 49.0;
            let sample = ClimateSample::new(0.1 + t * 0.3, t * 0.1, t, 1.0 - t);
            let _ = chain.resolve(i as f64, 0.0, &sample, &registry, &no_rarity);
            let current = chain.stats();
            for (prev, cur) in previous.iter().zip(&current) {
                assert!(cur.consulted >= prev.consulted);
                assert!(cur.matched >= prev.matched);
                assert!(cur.matched <= cur.consulted);
            }
            previous = current;
        }

        // A later stage is only consulted when all the previous ones missed.
        for pair in previous.windows(2) {
            assert_eq!(pair[1].consulted, pair[0].consulted - pair[0].matched);
        }

    }

    #[test]
    fn resolved_biome_accepted_by_matching_stage() {

        let registry = land_registry();
        let chain = MatcherChain::standard();

        for i in 0..40 {
            let t = i as f64 / 39.0;
            let sample = ClimateSample::new(t * 0.5, t * 0.05, t, 0.5);
            let before = chain.stats();
            if let Ok(id) = chain.resolve(0.0, i as f64, &sample, &registry, &no_rarity) {
                let after = chain.stats();
                let stage = (0..after.len()).find(|&s| after[s].matched > before[s].matched).unwrap();
                let matcher = chain.stages().nth(stage).unwrap();
                assert!(matcher.accepts(&registry[id], &sample));
            }
        }

    }

    #[test]
    fn zero_width_range_resolved_by_fallback() {

        let registry = BiomeRegistry::new([BiomeDefinition::new("only").temperature(0.5, 0.5)]).unwrap();
        let chain = MatcherChain::standard();
        let sample = ClimateSample::new(0.0, 0.1, 0.2, 0.5);

        assert_eq!(chain.resolve(0.0, 0.0, &sample, &registry, &no_rarity), Ok(registry.id_of("only").unwrap()));

        let stats = chain.stats();
        assert_eq!((stats[0].consulted, stats[0].matched), (1, 0));
        assert_eq!((stats[1].consulted, stats[1].matched), (1, 1));

    }

}
