//! Surfacing and lighting data: materials, world settings and light payloads.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::IdentityTag;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<IdentityTag>,

    #[serde(default)]
    pub nodes: Vec<ShaderNode>,

    /// Index into `nodes` of the node shown in texture paint and the viewport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_node: Option<usize>,
}

impl Material {
    pub fn new() -> Self {
        Material {
            tag: None,
            nodes: Vec::new(),
            active_node: None,
        }
    }

    pub fn with_node(mut self, node: ShaderNode) -> Self {
        self.nodes.push(node);
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderNode {
    pub name: String,
    pub kind: ShaderNodeKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShaderNodeKind {
    ImageTexture { image: Option<String> },
    Other { node_type: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialSlot {
    /// Name of a material in the owning scene's material library.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,

    #[serde(default)]
    pub link: SlotLink,
}

impl MaterialSlot {
    pub fn new(material: impl Into<String>) -> Self {
        MaterialSlot {
            material: Some(material.into()),
            link: SlotLink::Data,
        }
    }
}

/// Whether a slot's material is stored on the leaf itself or on its data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotLink {
    Object,
    #[default]
    Data,
}

/// Scene-wide environment lighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub name: String,
    pub color: Vec3,

    #[serde(default = "default_strength")]
    pub strength: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_image: Option<String>,

    #[serde(default)]
    pub mist_start: f32,

    #[serde(default)]
    pub mist_depth: f32,
}

fn default_strength() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightData {
    pub kind: LightKind,
    pub color: Vec3,
    pub energy: f32,

    #[serde(default)]
    pub radius: f32,

    #[serde(default)]
    pub spot_size: f32,

    #[serde(default)]
    pub spot_blend: f32,

    #[serde(default)]
    pub use_shadow: bool,

    #[serde(default)]
    pub specular_factor: f32,
}

impl LightData {
    /// Copies every user-facing light setting. The list is explicit so a new
    /// field has to be added here on purpose.
    pub fn copy_settings_from(&mut self, source: &LightData) {
        let LightData {
            kind,
            color,
            energy,
            radius,
            spot_size,
            spot_blend,
            use_shadow,
            specular_factor,
        } = source;

        self.kind = *kind;
        self.color = *color;
        self.energy = *energy;
        self.radius = *radius;
        self.spot_size = *spot_size;
        self.spot_blend = *spot_blend;
        self.use_shadow = *use_shadow;
        self.specular_factor = *specular_factor;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightKind {
    Point,
    Sun,
    Spot,
    Area,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightProbeData {
    pub kind: LightProbeKind,

    #[serde(default)]
    pub influence_distance: f32,

    #[serde(default)]
    pub falloff: f32,

    #[serde(default = "default_strength")]
    pub intensity: f32,

    #[serde(default)]
    pub clip_start: f32,

    #[serde(default)]
    pub clip_end: f32,
}

impl LightProbeData {
    pub fn copy_settings_from(&mut self, source: &LightProbeData) {
        let LightProbeData {
            kind,
            influence_distance,
            falloff,
            intensity,
            clip_start,
            clip_end,
        } = source;

        self.kind = *kind;
        self.influence_distance = *influence_distance;
        self.falloff = *falloff;
        self.intensity = *intensity;
        self.clip_start = *clip_start;
        self.clip_end = *clip_end;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightProbeKind {
    Cubemap,
    Planar,
    Grid,
}
