//! Scrap assets
//!
//! - `definition`: the generated scrap definition format and catalog
//! - `fbx`: binary FBX container reader
//! - `scene`: bounds and materials of an FBX scene
//! - `classify`: heuristics turning a scene summary into a definition
//! - `extract`: the batch pipeline behind the `extract-scrap` tool

pub mod classify;
pub mod definition;
pub mod extract;
pub mod fbx;
pub mod scene;

pub use classify::compute_definition;
pub use definition::{
    MaterialType, Rarity, Rgb, ScrapAsset, ScrapCatalog, ScrapDefinition, Size3, SizeClass,
};
pub use extract::{ExtractError, ExtractOptions, ExtractReport, extract_all, list_fbx_files};
pub use fbx::{FbxDocument, FbxError, FbxNode, Property};
pub use scene::{MaterialSample, MaterialStats, SceneSummary, ShadingModel};
