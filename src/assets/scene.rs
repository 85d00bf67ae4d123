//! Mesh and material summary of an FBX scene
//!
//! Walks the `Objects`/`Connections` sections to find every mesh model,
//! its world transform, its geometry bounds and its materials.

use std::collections::{HashMap, HashSet};

use glam::{DMat4, DQuat, DVec3, EulerRot};

use super::definition::Rgb;
use super::fbx::{FbxDocument, FbxNode, Property};
use crate::round4;

/// Shininess assumed for Phong materials without an explicit value
const DEFAULT_PHONG_SHININESS: f64 = 30.0;
/// Shininess reported when no material provides one
const DEFAULT_SHININESS: f64 = 0.4;
/// Name and colour given to meshes with no material attached
pub const DEFAULT_MATERIAL_NAME: &str = "__DEFAULT";
const DEFAULT_MATERIAL_COLOR: [f64; 3] = [0.8, 0.8, 0.8];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadingModel {
    #[default]
    Phong,
    Lambert,
    /// Anything else; shaded as Phong
    Unknown,
}

impl ShadingModel {
    fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "phong" => ShadingModel::Phong,
            "lambert" => ShadingModel::Lambert,
            _ => ShadingModel::Unknown,
        }
    }
}

/// One material as attached to a mesh
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MaterialSample {
    pub name: String,
    /// Diffuse colour, if the file sets one
    pub color: Option<[f64; 3]>,
    pub shading: ShadingModel,
    pub shininess: Option<f64>,
    pub emissive_color: Option<[f64; 3]>,
    pub emissive_factor: Option<f64>,
}

impl MaterialSample {
    /// Normalized shininess, `None` for Lambert
    pub fn shininess_level(&self) -> Option<f64> {
        match self.shading {
            ShadingModel::Lambert => None,
            ShadingModel::Phong | ShadingModel::Unknown => Some(
                (self.shininess.unwrap_or(DEFAULT_PHONG_SHININESS) / 100.0).clamp(0.0, 1.0),
            ),
        }
    }

    pub fn is_emissive(&self) -> bool {
        let lit = self
            .emissive_color
            .is_some_and(|c| c.iter().any(|&v| v != 0.0));
        lit || self.emissive_factor.unwrap_or(1.0) > 0.01
    }
}

/// Aggregated material look of a whole model
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialStats {
    pub base_color: Rgb,
    pub shininess: f64,
    pub emissive: bool,
    /// Unique non-empty material names in encounter order
    pub names: Vec<String>,
}

impl MaterialStats {
    pub fn from_samples(samples: &[MaterialSample]) -> Self {
        let mut sum = [0.0f64; 3];
        let mut shininess_sum = 0.0;
        let mut shininess_samples = 0usize;
        let mut emissive = false;
        let mut names: Vec<String> = Vec::new();

        for sample in samples {
            if !sample.name.is_empty() && !names.contains(&sample.name) {
                names.push(sample.name.clone());
            }
            let color = sample.color.unwrap_or([1.0, 1.0, 1.0]);
            for (acc, c) in sum.iter_mut().zip(color) {
                *acc += c;
            }
            if let Some(level) = sample.shininess_level() {
                shininess_sum += level;
                shininess_samples += 1;
            }
            emissive |= sample.is_emissive();
        }

        let base_color = if samples.is_empty() {
            Rgb::GREY
        } else {
            let n = samples.len() as f64;
            Rgb {
                r: round4(sum[0] / n),
                g: round4(sum[1] / n),
                b: round4(sum[2] / n),
            }
        };
        let shininess = if shininess_samples > 0 {
            round4(shininess_sum / shininess_samples as f64)
        } else {
            DEFAULT_SHININESS
        };

        Self {
            base_color,
            shininess,
            emissive,
            names,
        }
    }
}

/// What the classifier needs from a model file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneSummary {
    /// World-space bounding box over all meshes
    pub bounds: Option<(DVec3, DVec3)>,
    /// Materials of every mesh, in traversal order
    pub materials: Vec<MaterialSample>,
}

impl SceneSummary {
    /// Bounding box extents (zero when there is no geometry)
    pub fn size(&self) -> DVec3 {
        self.bounds.map(|(min, max)| max - min).unwrap_or(DVec3::ZERO)
    }

    pub fn from_document(doc: &FbxDocument) -> Self {
        let Some(objects) = doc.find("Objects") else {
            return Self::default();
        };

        let mut geometries: HashMap<i64, Option<(DVec3, DVec3)>> = HashMap::new();
        let mut models: HashMap<i64, &FbxNode> = HashMap::new();
        let mut model_order: Vec<i64> = Vec::new();
        let mut materials: HashMap<i64, MaterialSample> = HashMap::new();

        for node in &objects.children {
            let Some(id) = node.prop(0).and_then(Property::as_i64) else {
                continue;
            };
            match node.name.as_str() {
                "Geometry" => {
                    geometries.insert(id, geometry_bounds(node));
                }
                "Model" => {
                    models.insert(id, node);
                    model_order.push(id);
                }
                "Material" => {
                    materials.insert(id, material_sample(node));
                }
                _ => {}
            }
        }

        // child -> parent model, parent -> attached geometry/materials
        let mut parent_of: HashMap<i64, i64> = HashMap::new();
        let mut geometry_of: HashMap<i64, Vec<i64>> = HashMap::new();
        let mut materials_of: HashMap<i64, Vec<i64>> = HashMap::new();
        if let Some(connections) = doc.find("Connections") {
            for c in connections.children_named("C") {
                if c.prop(0).and_then(Property::as_str) != Some("OO") {
                    continue;
                }
                let (Some(child), Some(parent)) = (
                    c.prop(1).and_then(Property::as_i64),
                    c.prop(2).and_then(Property::as_i64),
                ) else {
                    continue;
                };
                if !models.contains_key(&parent) {
                    continue;
                }
                if models.contains_key(&child) {
                    parent_of.insert(child, parent);
                } else if geometries.contains_key(&child) {
                    geometry_of.entry(parent).or_default().push(child);
                } else if materials.contains_key(&child) {
                    materials_of.entry(parent).or_default().push(child);
                }
            }
        }

        let mut summary = Self::default();
        for model_id in model_order {
            let Some(geometry_ids) = geometry_of.get(&model_id) else {
                continue;
            };
            let world = world_matrix(model_id, &models, &parent_of);

            for geometry_id in geometry_ids {
                if let Some(Some((min, max))) = geometries.get(geometry_id) {
                    let (wmin, wmax) = transform_aabb(&world, *min, *max);
                    summary.bounds = Some(match summary.bounds {
                        Some((bmin, bmax)) => (bmin.min(wmin), bmax.max(wmax)),
                        None => (wmin, wmax),
                    });
                }

                let attached = materials_of.get(&model_id);
                match attached {
                    Some(ids) if !ids.is_empty() => {
                        summary
                            .materials
                            .extend(ids.iter().filter_map(|id| materials.get(id)).cloned());
                    }
                    _ => summary.materials.push(MaterialSample {
                        name: DEFAULT_MATERIAL_NAME.to_string(),
                        color: Some(DEFAULT_MATERIAL_COLOR),
                        ..MaterialSample::default()
                    }),
                }
            }
        }
        summary
    }
}

/// Display name of an object: `Name\0\x01Class` (binary) or `Class::Name`
fn object_name(node: &FbxNode) -> String {
    let raw = node.prop(1).and_then(Property::as_str).unwrap_or("");
    let raw = raw.split('\0').next().unwrap_or("");
    match raw.split_once("::") {
        Some((class, name)) if !class.is_empty() && class.chars().all(|c| c.is_alphanumeric() || c == '_') => {
            name.to_string()
        }
        _ => raw.to_string(),
    }
}

fn geometry_bounds(node: &FbxNode) -> Option<(DVec3, DVec3)> {
    let vertices = node
        .child("Vertices")
        .and_then(|v| v.prop(0))
        .and_then(Property::to_f64_vec)?;
    let mut points = vertices.chunks_exact(3).map(|p| DVec3::new(p[0], p[1], p[2]));
    let first = points.next()?;
    Some(points.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
}

/// `P` entries of a `Properties70` block by name
fn properties70(node: &FbxNode) -> HashMap<&str, &FbxNode> {
    node.child("Properties70")
        .map(|block| {
            block
                .children_named("P")
                .filter_map(|p| p.prop(0).and_then(Property::as_str).map(|name| (name, p)))
                .collect()
        })
        .unwrap_or_default()
}

fn p_number(p: &FbxNode) -> Option<f64> {
    p.prop(4).and_then(Property::as_f64)
}

fn p_vec3(p: &FbxNode) -> Option<[f64; 3]> {
    Some([
        p.prop(4)?.as_f64()?,
        p.prop(5)?.as_f64()?,
        p.prop(6)?.as_f64()?,
    ])
}

fn material_sample(node: &FbxNode) -> MaterialSample {
    let props = properties70(node);
    let first_vec3 = |keys: &[&str]| keys.iter().find_map(|k| props.get(k).and_then(|p| p_vec3(p)));
    let first_number = |keys: &[&str]| keys.iter().find_map(|k| props.get(k).and_then(|p| p_number(p)));

    let shading = node
        .child("ShadingModel")
        .and_then(|s| s.prop(0))
        .and_then(Property::as_str)
        .map(ShadingModel::parse)
        .unwrap_or_default();

    MaterialSample {
        name: object_name(node),
        color: first_vec3(&["Diffuse", "DiffuseColor"]),
        shading,
        shininess: first_number(&["Shininess", "ShininessExponent"]),
        emissive_color: first_vec3(&["Emissive", "EmissiveColor"]),
        emissive_factor: first_number(&["EmissiveFactor"]),
    }
}

fn local_matrix(model: &FbxNode) -> DMat4 {
    let props = properties70(model);
    let read = |key: &str, default: [f64; 3]| {
        props
            .get(key)
            .and_then(|p| p_vec3(p))
            .map(DVec3::from_array)
            .unwrap_or(DVec3::from_array(default))
    };
    let translation = read("Lcl Translation", [0.0; 3]);
    let rotation = read("Lcl Rotation", [0.0; 3]);
    let scale = read("Lcl Scaling", [1.0; 3]);
    let rotation = DQuat::from_euler(
        EulerRot::ZYX,
        rotation.z.to_radians(),
        rotation.y.to_radians(),
        rotation.x.to_radians(),
    );
    DMat4::from_scale_rotation_translation(scale, rotation, translation)
}

fn world_matrix(id: i64, models: &HashMap<i64, &FbxNode>, parent_of: &HashMap<i64, i64>) -> DMat4 {
    let mut world = DMat4::IDENTITY;
    let mut seen = HashSet::new();
    let mut current = Some(id);
    while let Some(model_id) = current {
        if !seen.insert(model_id) {
            log::warn!("Model parent cycle at {}", model_id);
            break;
        }
        let Some(model) = models.get(&model_id) else {
            break;
        };
        world = local_matrix(model) * world;
        current = parent_of.get(&model_id).copied();
    }
    world
}

fn transform_aabb(world: &DMat4, min: DVec3, max: DVec3) -> (DVec3, DVec3) {
    let mut out_min = DVec3::splat(f64::INFINITY);
    let mut out_max = DVec3::splat(f64::NEG_INFINITY);
    for i in 0..8 {
        let corner = DVec3::new(
            if i & 1 == 0 { min.x } else { max.x },
            if i & 2 == 0 { min.y } else { max.y },
            if i & 4 == 0 { min.z } else { max.z },
        );
        let p = world.transform_point3(corner);
        out_min = out_min.min(p);
        out_max = out_max.max(p);
    }
    (out_min, out_max)
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn summarize(nodes: Vec<FbxNode>) -> SceneSummary {
        SceneSummary::from_document(&FbxDocument {
            version: 7400,
            nodes,
        })
    }

    fn close(a: DVec3, b: DVec3) -> bool {
        (a - b).abs().max_element() < 1e-9
    }

    #[test]
    fn test_simple_box_summary() {
        let summary = summarize(simple_box("Red"));
        let (min, max) = summary.bounds.unwrap();
        assert!(close(min, DVec3::new(-1.0, 0.0, -0.25)));
        assert!(close(max, DVec3::new(1.0, 1.0, 0.25)));
        assert_eq!(summary.materials.len(), 1);
        assert_eq!(summary.materials[0].name, "Red");
        assert_eq!(summary.materials[0].color, Some([1.0, 0.0, 0.0]));
    }

    #[test]
    fn test_transforms_apply_through_parents() {
        let nodes = document(
            vec![
                geometry(10, [-1.0, -1.0, -1.0], [1.0, 1.0, 1.0]),
                model(
                    20,
                    "Parent",
                    vec![
                        p_vec("Lcl Translation", "Lcl Translation", [10.0, 0.0, 0.0]),
                        p_vec("Lcl Scaling", "Lcl Scaling", [2.0, 2.0, 2.0]),
                    ],
                ),
                model(
                    21,
                    "Child",
                    vec![p_vec("Lcl Rotation", "Lcl Rotation", [0.0, 0.0, 90.0])],
                ),
            ],
            vec![oo(20, 0), oo(21, 20), oo(10, 21)],
        );
        let summary = summarize(nodes);
        let (min, max) = summary.bounds.unwrap();
        assert!(close(min, DVec3::new(8.0, -2.0, -2.0)));
        assert!(close(max, DVec3::new(12.0, 2.0, 2.0)));
        assert!(close(summary.size(), DVec3::new(4.0, 4.0, 4.0)));
    }

    #[test]
    fn test_rotation_grows_bounds() {
        let nodes = document(
            vec![
                geometry(10, [-1.0, -0.5, 0.0], [1.0, 0.5, 0.0]),
                model(
                    20,
                    "Tilted",
                    vec![p_vec("Lcl Rotation", "Lcl Rotation", [0.0, 0.0, 90.0])],
                ),
            ],
            vec![oo(10, 20)],
        );
        let size = summarize(nodes).size();
        assert!(close(size, DVec3::new(1.0, 2.0, 0.0)));
    }

    #[test]
    fn test_plain_diffuse_wins_over_diffuse_color() {
        let nodes = document(
            vec![
                geometry(10, [0.0; 3], [1.0; 3]),
                model(20, "Tin", vec![]),
                material(
                    30,
                    "Tin",
                    "Phong",
                    vec![
                        p_vec("DiffuseColor", "Color", [1.0, 0.0, 0.0]),
                        p_vec("Diffuse", "Vector3D", [0.0, 0.0, 1.0]),
                        p_vec("EmissiveColor", "Color", [0.0, 1.0, 0.0]),
                        p_vec("Emissive", "Vector3D", [0.0, 0.0, 0.0]),
                    ],
                ),
            ],
            vec![oo(10, 20), oo(30, 20)],
        );
        let summary = summarize(nodes);
        assert_eq!(summary.materials[0].color, Some([0.0, 0.0, 1.0]));
        assert_eq!(summary.materials[0].emissive_color, Some([0.0, 0.0, 0.0]));
    }

    #[test]
    fn test_mesh_without_material_gets_default() {
        let nodes = document(
            vec![geometry(10, [0.0; 3], [1.0; 3]), model(20, "Bare", vec![])],
            vec![oo(10, 20)],
        );
        let summary = summarize(nodes);
        assert_eq!(summary.materials.len(), 1);
        assert_eq!(summary.materials[0].name, DEFAULT_MATERIAL_NAME);
    }

    #[test]
    fn test_no_geometry_means_no_bounds() {
        let summary = summarize(document(vec![model(20, "Empty", vec![])], vec![]));
        assert!(summary.bounds.is_none());
        assert!(summary.materials.is_empty());
        assert_eq!(summary.size(), DVec3::ZERO);
    }

    #[test]
    fn test_material_stats_defaults() {
        let stats = MaterialStats::from_samples(&[]);
        assert_eq!(stats.base_color, Rgb::GREY);
        assert_eq!(stats.shininess, 0.4);
        assert!(!stats.emissive);
    }

    #[test]
    fn test_material_stats_mix() {
        let samples = vec![
            MaterialSample {
                name: "Red".into(),
                color: Some([1.0, 0.0, 0.0]),
                shininess: Some(50.0),
                emissive_factor: Some(0.0),
                ..Default::default()
            },
            MaterialSample {
                name: "Plain".into(),
                shading: ShadingModel::Lambert,
                emissive_factor: Some(0.0),
                ..Default::default()
            },
            MaterialSample {
                name: "Red".into(),
                color: Some([0.0, 0.0, 0.0]),
                emissive_factor: Some(0.0),
                ..Default::default()
            },
        ];
        let stats = MaterialStats::from_samples(&samples);
        // White stands in for the missing diffuse colour
        assert_eq!(
            stats.base_color,
            Rgb {
                r: 0.6667,
                g: 0.3333,
                b: 0.3333
            }
        );
        // (0.5 + 0.3) / 2; Lambert has no shininess
        assert_eq!(stats.shininess, 0.4);
        assert!(!stats.emissive);
        assert_eq!(stats.names, vec!["Red".to_string(), "Plain".to_string()]);
    }

    #[test]
    fn test_emissive_rules() {
        let mut sample = MaterialSample::default();
        assert!(sample.is_emissive());
        sample.emissive_factor = Some(0.0);
        assert!(!sample.is_emissive());
        sample.emissive_color = Some([0.0, 0.2, 0.0]);
        assert!(sample.is_emissive());
    }

    #[test]
    fn test_object_name_forms() {
        let binary = FbxNode::new("Material", vec![Property::I64(1), Property::String("Steel\0\x01Material".into())], vec![]);
        assert_eq!(object_name(&binary), "Steel");
        let ascii = FbxNode::new("Material", vec![Property::I64(1), Property::String("Material::Steel".into())], vec![]);
        assert_eq!(object_name(&ascii), "Steel");
    }
}
