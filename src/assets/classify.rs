//! Heuristic classification of scrap models
//!
//! Material, rarity, smell and toxicity are guessed from the file name and
//! material names; mass and value follow from the bounding box.

use super::definition::{MaterialType, Rarity, ScrapDefinition, Size3, SizeClass};
use super::scene::{MaterialStats, SceneSummary};
use crate::round4;

/// Per-material physical and economic constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialProfile {
    pub density: f64,
    pub energy: f64,
    pub value: f64,
    pub base_smell: f64,
    pub base_toxicity: f64,
}

pub fn profile(material: MaterialType) -> MaterialProfile {
    let (density, energy, value, base_smell, base_toxicity) = match material {
        MaterialType::Metal => (7.5, 3.2, 75.0, 0.05, 0.55),
        MaterialType::Plastic => (1.1, 8.0, 45.0, 0.12, 0.68),
        MaterialType::Food => (0.9, 2.0, 28.0, 0.7, 0.2),
        MaterialType::Glass => (2.5, 0.4, 60.0, 0.07, 0.25),
        MaterialType::Paper => (0.7, 3.8, 32.0, 0.18, 0.18),
        MaterialType::Organic => (0.8, 1.5, 24.0, 0.6, 0.35),
        MaterialType::Other => (1.0, 2.2, 36.0, 0.2, 0.3),
    };
    MaterialProfile {
        density,
        energy,
        value,
        base_smell,
        base_toxicity,
    }
}

/// Keyword lists, checked in order; first hit wins
static MATERIAL_KEYWORDS: &[(MaterialType, &[&str])] = &[
    (
        MaterialType::Food,
        &[
            "apple", "banana", "bread", "burger", "pizza", "taco", "chicken", "ham", "meat",
            "fish", "egg", "eggplant", "aubergine", "grape", "melon", "pasta", "soup", "sauce",
            "salad", "cheese", "milk", "cookie", "donut", "sandwich", "hot_dog", "hotdog",
            "french_fries", "fries", "toast", "waffle", "ice_cream", "icecream", "nugget",
            "bacon", "ketchup", "mustard", "ribs", "ramen", "nachos", "corn", "carrot",
            "cucumber", "lettuce", "tomato", "tomate", "tissue", "cupcake", "coffee",
            "chocolate", "burrito", "pancake", "spring_roll", "popcorn", "pretzel", "sushi",
            "fryer", "bagel",
        ],
    ),
    (
        MaterialType::Metal,
        &[
            "metal", "trashcan", "dumpster", "shopingcar", "shoppingcart", "stove", "oven",
            "cookware", "pot", "pan", "toaster", "kettle", "cupboard", "cashier", "door", "table",
        ],
    ),
    (
        MaterialType::Plastic,
        &[
            "plastic", "bottle", "bagg", "bag", "cup", "soap", "soda", "drink", "juice", "ketchup",
            "mustard", "trash", "container", "tissue", "tupper",
        ],
    ),
    (MaterialType::Glass, &["glass", "glasses", "jar"]),
    (
        MaterialType::Paper,
        &["paper", "box", "bag", "tissue", "napkin", "plate"],
    ),
    (MaterialType::Organic, &["plant", "flower", "mushroom"]),
];

static RARITY_OVERRIDES: &[(&[&str], Rarity)] = &[
    (
        &["dumpster", "shopingcar", "refrigerator", "frezer", "deepfryer", "oven"],
        Rarity::Legendary,
    ),
    (&["door", "table", "cashier", "drinks", "shelf"], Rarity::Rare),
];

static RARITY_DOWNGRADES: &[(&[&str], Rarity)] = &[
    (&["rotten", "spoiled", "mold", "trash"], Rarity::Common),
    (&["bottle", "cup", "tissue", "bag"], Rarity::Common),
];

static SMELL_BOOSTERS: &[(&[&str], f64)] = &[
    (&["rotten", "spoiled", "mold", "rancid"], 0.25),
    (&["fish", "seafood"], 0.2),
    (&["egg", "yolk"], 0.18),
    (&["sauce", "soup", "broth", "ramen"], 0.12),
    (&["coffee", "milk", "shake"], 0.1),
];

static TOXICITY_BOOSTERS: &[(&[&str], f64)] = &[
    (&["battery", "acid", "chemical", "soap"], 0.25),
    (&["plastic", "poly"], 0.12),
    (&["rotten", "mold", "rancid"], 0.08),
];

/// Upper bound (inclusive) of each size class
static SIZE_CLASSES: &[(SizeClass, f64)] = &[
    (SizeClass::XS, 0.3),
    (SizeClass::S, 1.0),
    (SizeClass::M, 3.5),
    (SizeClass::L, 8.0),
];

fn matches_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// `"{name} {materials...}"` lowercased, the text all heuristics scan
fn context(name: &str, material_names: &[String]) -> String {
    let mut text = name.to_string();
    for material in material_names {
        text.push(' ');
        text.push_str(material);
    }
    text.to_lowercase()
}

pub fn infer_material(name: &str, material_names: &[String]) -> MaterialType {
    let haystack = context(name, material_names);
    MATERIAL_KEYWORDS
        .iter()
        .find(|(_, keywords)| matches_any(&haystack, keywords))
        .map(|(material, _)| *material)
        .unwrap_or(MaterialType::Other)
}

pub fn pick_size_class(max_dim: f64) -> SizeClass {
    SIZE_CLASSES
        .iter()
        .find(|(_, threshold)| max_dim <= *threshold)
        .map(|(class, _)| *class)
        .unwrap_or(SizeClass::XL)
}

fn size_rarity(size_class: SizeClass) -> Rarity {
    match size_class {
        SizeClass::XS | SizeClass::S => Rarity::Common,
        SizeClass::M => Rarity::Uncommon,
        SizeClass::L => Rarity::Rare,
        SizeClass::XL => Rarity::Legendary,
    }
}

/// Overrides by name first, then size, then the first matching downgrade
pub fn infer_rarity(size_class: SizeClass, name: &str) -> Rarity {
    let lower = name.to_lowercase();
    if let Some((_, rarity)) = RARITY_OVERRIDES.iter().find(|(p, _)| matches_any(&lower, p)) {
        return *rarity;
    }
    RARITY_DOWNGRADES
        .iter()
        .find(|(p, _)| matches_any(&lower, p))
        .map(|(_, rarity)| *rarity)
        .unwrap_or_else(|| size_rarity(size_class))
}

fn boosted(base: f64, context: &str, boosters: &[(&[&str], f64)]) -> f64 {
    let lower = context.to_lowercase();
    let total = boosters
        .iter()
        .filter(|(p, _)| matches_any(&lower, p))
        .fold(base, |acc, (_, amount)| acc + amount);
    total.clamp(0.0, 1.0)
}

pub fn score_smell(base: f64, context: &str) -> f64 {
    boosted(base, context, SMELL_BOOSTERS)
}

pub fn score_toxicity(base: f64, context: &str) -> f64 {
    boosted(base, context, TOXICITY_BOOSTERS)
}

/// Build the full definition for one model
pub fn compute_definition(id: &str, asset_path: &str, summary: &SceneSummary) -> ScrapDefinition {
    let size = summary.size();
    let max_dim = match size.max_element() {
        d if d > 0.0 => d,
        _ => 1.0,
    };
    let volume = size.x * size.y * size.z;

    let stats = MaterialStats::from_samples(&summary.materials);
    let material_type = infer_material(id, &stats.names);
    let profile = profile(material_type);
    let mass = volume * profile.density;
    let burn_energy = mass * profile.energy;
    let size_class = pick_size_class(max_dim);
    let rarity = infer_rarity(size_class, id);

    let scan = format!("{} {}", id, stats.names.join(" "));
    let smell_level = score_smell(profile.base_smell, &scan);
    let toxicity = score_toxicity(profile.base_toxicity, &scan);
    let scrap_value = (mass * profile.value * rarity.multiplier()).round() as i64;

    ScrapDefinition {
        id: id.to_string(),
        asset_path: asset_path.to_string(),
        size: Size3 {
            width: round4(size.x),
            height: round4(size.y),
            depth: round4(size.z),
        },
        size_class,
        approx_volume: round4(volume),
        material_type,
        base_color: stats.base_color,
        shininess: stats.shininess,
        emissive: stats.emissive,
        density: round4(profile.density),
        mass: round4(mass),
        burn_energy: round4(burn_energy),
        scrap_value,
        rarity,
        smell_level: round4(smell_level),
        toxicity: round4(toxicity),
    }
}
