use std::collections::BTreeMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::NodeId;

/// One entry of a leaf's procedural modifier stack. Modifiers are identified by
/// name within a stack; the kind never changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modifier {
    pub name: String,
    pub kind: ModifierKind,

    #[serde(default = "default_true")]
    pub show_viewport: bool,

    #[serde(default = "default_true")]
    pub show_render: bool,

    /// Kind-specific settings. All of them are writable.
    #[serde(default)]
    pub params: BTreeMap<String, ParamValue>,

    /// Cache produced when a deform modifier binds to its target mesh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<BindData>,
}

fn default_true() -> bool {
    true
}

impl Modifier {
    pub fn new(name: impl Into<String>, kind: ModifierKind) -> Self {
        Modifier {
            name: name.into(),
            kind,
            show_viewport: true,
            show_render: true,
            params: BTreeMap::new(),
            bind: None,
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: ParamValue) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Every node this modifier points at through its parameters.
    pub fn node_params(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.params.values().filter_map(|value| match value {
            ParamValue::Node(Some(id)) => Some(*id),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    Subdivision,
    Mirror,
    Bevel,
    Solidify,
    Armature,
    ShrinkWrap,
    SurfaceDeform,
    MeshDeform,
    CorrectiveSmooth,
    Other(String),
}

impl ModifierKind {
    /// Modifiers whose effect is computed once at bind time and cached. Their
    /// cache goes stale whenever their settings change.
    pub fn binds(&self) -> bool {
        matches!(
            self,
            ModifierKind::SurfaceDeform | ModifierKind::MeshDeform | ModifierKind::CorrectiveSmooth
        )
    }

    /// Bind-cached modifiers that bind against another object. Corrective
    /// smooth caches its own rest shape instead.
    pub fn binds_to_target(&self) -> bool {
        matches!(self, ModifierKind::SurfaceDeform | ModifierKind::MeshDeform)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f32),
    String(String),
    Vector(Vec3),
    Node(Option<NodeId>),
}

/// What a bound deform modifier remembers about the mesh it was bound to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindData {
    pub target: Option<NodeId>,
    pub vertex_count: usize,
}
