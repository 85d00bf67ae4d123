//! Scrap definitions produced by the extractor and consumed by the game

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialType {
    Metal,
    Plastic,
    Food,
    Glass,
    Paper,
    Organic,
    Other,
}

impl MaterialType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialType::Metal => "metal",
            MaterialType::Plastic => "plastic",
            MaterialType::Food => "food",
            MaterialType::Glass => "glass",
            MaterialType::Paper => "paper",
            MaterialType::Organic => "organic",
            MaterialType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeClass {
    XS,
    S,
    M,
    L,
    XL,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
}

impl Rarity {
    /// Scrap value multiplier
    pub fn multiplier(&self) -> f64 {
        match self {
            Rarity::Common => 1.0,
            Rarity::Uncommon => 1.25,
            Rarity::Rare => 1.8,
            Rarity::Legendary => 2.5,
        }
    }
}

/// Bounding box extents in scene units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size3 {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const GREY: Rgb = Rgb {
        r: 0.5,
        g: 0.5,
        b: 0.5,
    };
}

/// One classified piece of scrap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapDefinition {
    pub id: String,
    /// Model path relative to the source root, forward slashes
    pub asset_path: String,
    pub size: Size3,
    pub size_class: SizeClass,
    pub approx_volume: f64,
    pub material_type: MaterialType,
    pub base_color: Rgb,
    pub shininess: f64,
    pub emissive: bool,
    pub density: f64,
    pub mass: f64,
    pub burn_energy: f64,
    pub scrap_value: i64,
    pub rarity: Rarity,
    pub smell_level: f64,
    pub toxicity: f64,
}

/// A definition paired with a loadable model URL
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapAsset {
    pub definition: ScrapDefinition,
    pub asset_url: String,
}

/// Lookup over a generated definition list
#[derive(Debug, Clone, Default)]
pub struct ScrapCatalog {
    definitions: Vec<ScrapDefinition>,
    by_id: HashMap<String, usize>,
}

impl ScrapCatalog {
    pub fn new(definitions: Vec<ScrapDefinition>) -> Self {
        let by_id = definitions
            .iter()
            .enumerate()
            .map(|(i, def)| (def.id.clone(), i))
            .collect();
        Self { definitions, by_id }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let definitions: Vec<ScrapDefinition> = serde_json::from_str(json)?;
        log::info!("Loaded {} scrap definitions", definitions.len());
        Ok(Self::new(definitions))
    }

    pub fn get(&self, id: &str) -> Option<&ScrapDefinition> {
        self.by_id.get(id).map(|&i| &self.definitions[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScrapDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn by_rarity(&self, rarity: Rarity) -> impl Iterator<Item = &ScrapDefinition> {
        self.definitions.iter().filter(move |d| d.rarity == rarity)
    }

    /// Pair definitions with model URLs; definitions without one are skipped
    pub fn resolve_assets<F>(&self, mut url_for: F) -> Vec<ScrapAsset>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut assets = Vec::with_capacity(self.definitions.len());
        let mut missing = Vec::new();
        for definition in &self.definitions {
            match url_for(&definition.asset_path) {
                Some(asset_url) => assets.push(ScrapAsset {
                    definition: definition.clone(),
                    asset_url,
                }),
                None => missing.push(definition.id.as_str()),
            }
        }
        if !missing.is_empty() {
            log::warn!("Missing model URLs for: {}", missing.join(", "));
        }
        assets
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
      {
        "id": "Banana",
        "assetPath": "assets/Banana.fbx",
        "size": { "width": 0.2, "height": 0.1, "depth": 0.05 },
        "sizeClass": "XS",
        "approxVolume": 0.001,
        "materialType": "food",
        "baseColor": { "r": 0.9, "g": 0.8, "b": 0.1 },
        "shininess": 0.3,
        "emissive": true,
        "density": 0.9,
        "mass": 0.0009,
        "burnEnergy": 0.0018,
        "scrapValue": 0,
        "rarity": "common",
        "smellLevel": 0.7,
        "toxicity": 0.2
      },
      {
        "id": "Dumpster",
        "assetPath": "assets/props/Dumpster.fbx",
        "size": { "width": 3, "height": 2, "depth": 2 },
        "sizeClass": "M",
        "approxVolume": 12,
        "materialType": "metal",
        "baseColor": { "r": 0.2, "g": 0.4, "b": 0.2 },
        "shininess": 0.3,
        "emissive": true,
        "density": 7.5,
        "mass": 90,
        "burnEnergy": 288,
        "scrapValue": 16875,
        "rarity": "legendary",
        "smellLevel": 0.05,
        "toxicity": 0.55
      }
    ]"#;

    #[test]
    fn test_catalog_from_generated_json() {
        let catalog = ScrapCatalog::from_json(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 2);
        let dumpster = catalog.get("Dumpster").unwrap();
        assert_eq!(dumpster.material_type, MaterialType::Metal);
        assert_eq!(dumpster.size_class, SizeClass::M);
        assert_eq!(dumpster.scrap_value, 16875);
        assert!(catalog.get("Missing").is_none());
        assert_eq!(catalog.by_rarity(Rarity::Legendary).count(), 1);
    }

    #[test]
    fn test_definition_serializes_with_generated_keys() {
        let catalog = ScrapCatalog::from_json(SAMPLE).unwrap();
        let json = serde_json::to_value(catalog.get("Banana").unwrap()).unwrap();
        assert_eq!(json["sizeClass"], "XS");
        assert_eq!(json["materialType"], "food");
        assert_eq!(json["assetPath"], "assets/Banana.fbx");
        assert!(json.get("burnEnergy").is_some());
    }

    #[test]
    fn test_resolve_assets_skips_missing_urls() {
        let catalog = ScrapCatalog::from_json(SAMPLE).unwrap();
        let assets = catalog.resolve_assets(|path| {
            path.starts_with("assets/props/")
                .then(|| format!("/models/{}", path.trim_start_matches("assets/")))
        });
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].definition.id, "Dumpster");
        assert_eq!(assets[0].asset_url, "/models/props/Dumpster.fbx");
    }
}
