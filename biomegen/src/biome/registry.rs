//! Ordered registry of biome definitions.

use std::ops::Index;

use arcstr::ArcStr;
use indexmap::IndexMap;
use indexmap::map::Entry;
use thiserror::Error;

use crate::climate::ClimateKind;

use super::{BiomeDefinition, BiomeId};


/// The ordered set of biomes known to a generator.
///
/// Registration order is significant: it breaks ties between equally near biomes and
/// selects the slice of the rarity field of each biome. Reordering a registry changes
/// the classification of an existing world.
#[derive(Debug, Clone)]
pub struct BiomeRegistry {
    biomes: IndexMap<ArcStr, BiomeDefinition>,
}

impl BiomeRegistry {

    /// Validate and register the given definitions, in order.
    pub fn new<I>(definitions: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = BiomeDefinition>,
    {

        let mut biomes = IndexMap::new();

        for definition in definitions {
            validate(&definition)?;
            match biomes.entry(definition.name.clone()) {
                Entry::Occupied(_) => return Err(RegistryError::DuplicateName(definition.name)),
                Entry::Vacant(v) => { v.insert(definition); }
            }
        }

        if biomes.is_empty() {
            return Err(RegistryError::Empty);
        } else if biomes.len() > u16::MAX as usize + 1 {
            return Err(RegistryError::TooMany(biomes.len()));
        }

        Ok(Self { biomes })

    }

    #[inline]
    pub fn get(&self, id: BiomeId) -> Option<&BiomeDefinition> {
        self.biomes.get_index(id.index()).map(|(_, def)| def)
    }

    #[inline]
    pub fn id_of(&self, name: &str) -> Option<BiomeId> {
        self.biomes.get_index_of(name).map(BiomeId::new)
    }

    /// Iterate over all biomes in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (BiomeId, &BiomeDefinition)> + '_ {
        self.biomes.values().enumerate().map(|(index, def)| (BiomeId::new(index), def))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.biomes.len()
    }

    /// Always false, a registry cannot be built empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.biomes.is_empty()
    }

}

impl Index<BiomeId> for BiomeRegistry {

    type Output = BiomeDefinition;

    /// Panics if the id does not come from this registry.
    #[inline]
    fn index(&self, id: BiomeId) -> &Self::Output {
        self.get(id).expect("biome id should come from this registry")
    }

}

fn validate(def: &BiomeDefinition) -> Result<(), RegistryError> {

    let ranges = [
        (ClimateKind::Height, def.min_height, def.max_height),
        (ClimateKind::Volatility, def.min_volatility, def.max_volatility),
        (ClimateKind::Temperature, def.min_temperature, def.max_temperature),
        (ClimateKind::Rainfall, def.min_rainfall, def.max_rainfall),
    ];

    for (kind, min, max) in ranges {
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(RegistryError::MalformedRange { name: def.name.clone(), kind, min, max });
        }
    }

    // Volatility inflates the height range symmetrically, a negative bound makes no sense.
    if def.max_volatility < 0.0 {
        return Err(RegistryError::NegativeVolatility { name: def.name.clone(), max: def.max_volatility });
    }

    if !(-1.0..=1.0).contains(&def.rarity) {
        return Err(RegistryError::Rarity { name: def.name.clone(), rarity: def.rarity });
    }

    if !def.size.is_finite() || def.size <= 0.0 {
        return Err(RegistryError::Size { name: def.name.clone(), size: def.size });
    }

    Ok(())

}


/// Configuration error of a biome registry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("the registry has no biome")]
    Empty,
    #[error("too many biomes: {0}")]
    TooMany(usize),
    #[error("duplicate biome name: {0}")]
    DuplicateName(ArcStr),
    #[error("biome {name}: malformed {} range [{min}, {max}]", .kind.name())]
    MalformedRange { name: ArcStr, kind: ClimateKind, min: f64, max: f64 },
    #[error("biome {name}: negative maximum volatility {max}")]
    NegativeVolatility { name: ArcStr, max: f64 },
    #[error("biome {name}: rarity {rarity} is out of [-1, 1]")]
    Rarity { name: ArcStr, rarity: f64 },
    #[error("biome {name}: size {size} must be finite and positive")]
    Size { name: ArcStr, size: f64 },
}


#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn ordered_lookup() {

        let registry = BiomeRegistry::new([
            BiomeDefinition::new("ocean").height(-1.0, 0.0),
            BiomeDefinition::new("plains").height(0.0, 0.3),
            BiomeDefinition::new("mountains").height(0.3, 1.0),
        ]).unwrap();

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.id_of("plains").map(BiomeId::index), Some(1));
        assert_eq!(registry.id_of("desert"), None);

        let names = registry.iter().map(|(_, def)| def.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, ["ocean", "plains", "mountains"]);

        let mountains = registry.id_of("mountains").unwrap();
        assert_eq!(registry[mountains].max_height, 1.0);
        assert_eq!(registry.get(mountains).map(|def| def.min_height), Some(0.3));

    }

    #[test]
    fn rejects_bad_definitions() {

        assert_eq!(BiomeRegistry::new(Vec::<BiomeDefinition>::new()).unwrap_err(), RegistryError::Empty);

        assert!(matches!(
            BiomeRegistry::new([BiomeDefinition::new("a"), BiomeDefinition::new("a")]),
            Err(RegistryError::DuplicateName(name)) if name.as_str() == "a"));

        assert!(matches!(
            BiomeRegistry::new([BiomeDefinition::new("a").height(0.5, 0.1)]),
            Err(RegistryError::MalformedRange { kind: ClimateKind::Height, .. })));

        assert!(matches!(
            BiomeRegistry::new([BiomeDefinition::new("a").rainfall(0.0, f64::NAN)]),
            Err(RegistryError::MalformedRange { kind: ClimateKind::Rainfall, .. })));

        assert!(matches!(
            BiomeRegistry::new([BiomeDefinition::new("a").volatility(-0.5, -0.1)]),
            Err(RegistryError::NegativeVolatility { .. })));

        assert!(matches!(
            BiomeRegistry::new([BiomeDefinition::new("a").rarity(1.5)]),
            Err(RegistryError::Rarity { .. })));

        assert!(matches!(
            BiomeRegistry::new([BiomeDefinition::new("a").size(0.0)]),
            Err(RegistryError::Size { .. })));

    }

    #[test]
    fn error_message() {
        let err = BiomeRegistry::new([BiomeDefinition::new("swamp").temperature(0.9, 0.2)]).unwrap_err();
        assert_eq!(err.to_string(), "biome swamp: malformed temperature range [0.9, 0.2]");
    }

}
