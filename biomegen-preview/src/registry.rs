//! The default biome set of the preview, with the symbol of each biome on the map.

use biomegen::{BiomeDefinition, BiomeId, BiomeRegistry};
use biomegen::biome::RegistryError;


/// A registry together with the map symbol of every biome, indexed by biome id.
pub struct Palette {
    pub registry: BiomeRegistry,
    symbols: Vec<char>,
}

impl Palette {

    /// Symbol of a biome of this palette's registry.
    pub fn symbol(&self, id: BiomeId) -> char {
        self.symbols.get(id.index()).copied().unwrap_or('?')
    }

}


/// Build the default palette. Height ranges of ocean, beach, land and mountains join
/// without gaps over `[-1, 1]`, so the most relaxed matcher always finds a biome.
pub fn default_palette() -> Result<Palette, RegistryError> {

    let biomes = [
        ('~', BiomeDefinition::new("ocean")
            .height(-1.0, 0.0)),
        ('.', BiomeDefinition::new("beach")
            .height(0.0, 0.05)
            .volatility(0.0, 0.05)),
        ('R', BiomeDefinition::new("rain_forest")
            .height(0.05, 0.5)
            .temperature(0.75, 1.0)
            .rainfall(0.7, 1.0)
            .rarity(0.3)
            .spawnable(true)),
        ('S', BiomeDefinition::new("swampland")
            .height(0.05, 0.15)
            .volatility(0.0, 0.05)
            .temperature(0.4, 0.9)
            .rainfall(0.6, 1.0)
            .rarity(0.4)
            .size(2.0)),
        ('F', BiomeDefinition::new("seasonal_forest")
            .height(0.05, 0.5)
            .temperature(0.5, 0.9)
            .rainfall(0.45, 0.8)
            .spawnable(true)),
        ('f', BiomeDefinition::new("forest")
            .height(0.05, 0.55)
            .temperature(0.3, 0.75)
            .rainfall(0.35, 0.75)
            .rarity(-0.2)
            .spawnable(true)),
        ('v', BiomeDefinition::new("savanna")
            .height(0.05, 0.4)
            .temperature(0.7, 1.0)
            .rainfall(0.15, 0.45)),
        ('s', BiomeDefinition::new("shrubland")
            .height(0.05, 0.45)
            .temperature(0.4, 0.8)
            .rainfall(0.1, 0.4)
            .size(0.5)),
        ('T', BiomeDefinition::new("taiga")
            .height(0.05, 0.6)
            .temperature(0.05, 0.35)
            .rainfall(0.3, 1.0)
            .spawnable(true)),
        ('d', BiomeDefinition::new("desert")
            .height(0.05, 0.35)
            .temperature(0.6, 1.0)
            .rainfall(0.0, 0.2)
            .spawnable(true)),
        ('p', BiomeDefinition::new("plains")
            .height(0.05, 0.4)
            .temperature(0.35, 0.9)
            .rainfall(0.2, 0.55)
            .rarity(-0.4)
            .size(4.0)
            .spawnable(true)),
        ('i', BiomeDefinition::new("ice_desert")
            .height(0.05, 0.4)
            .temperature(0.0, 0.15)
            .rainfall(0.0, 0.3)),
        ('t', BiomeDefinition::new("tundra")
            .height(0.05, 0.6)
            .temperature(0.0, 0.3)
            .rainfall(0.0, 0.5)),
        ('^', BiomeDefinition::new("mountains")
            .height(0.5, 1.0)
            .volatility(0.0, 0.6)
            .extended_checks(true)),
    ];

    let symbols = biomes.iter().map(|(symbol, _)| *symbol).collect();
    let registry = BiomeRegistry::new(biomes.into_iter().map(|(_, def)| def))?;

    Ok(Palette { registry, symbols })

}
