use glam::Mat4;
use serde::{Deserialize, Serialize};

use super::{
    Curve, Driver, IdentityTag, LightData, LightProbeData, MaterialSlot, Mesh, Modifier, NodeId,
    ParamValue,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub(super) id: NodeId,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(super) parent: Option<NodeId>,

    /// Ordered. Only containers have children.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(super) children: Vec<NodeId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<IdentityTag>,

    pub kind: NodeKind,
}

impl Node {
    pub fn container(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Container)
    }

    pub fn leaf(name: impl Into<String>, leaf: Leaf) -> Self {
        Self::with_kind(name, NodeKind::Leaf(Box::new(leaf)))
    }

    fn with_kind(name: impl Into<String>, kind: NodeKind) -> Self {
        Node {
            id: NodeId::new(),
            name: name.into(),
            parent: None,
            children: Vec::new(),
            tag: None,
            kind,
        }
    }

    pub fn tagged(self, tag: IdentityTag) -> Self {
        Node {
            tag: Some(tag),
            ..self
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, NodeKind::Container)
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match &self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Container => None,
        }
    }

    pub fn as_leaf_mut(&mut self) -> Option<&mut Leaf> {
        match &mut self.kind {
            NodeKind::Leaf(leaf) => Some(leaf),
            NodeKind::Container => None,
        }
    }

    /// The uuid used for matching, if this node belongs to the given asset.
    pub fn uuid_in(&self, asset: &str) -> Option<uuid::Uuid> {
        self.tag
            .as_ref()
            .filter(|tag| tag.in_namespace(asset))
            .and_then(|tag| tag.uuid)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "leaf", rename_all = "snake_case")]
pub enum NodeKind {
    Container,
    Leaf(Box<Leaf>),
}

/// A concrete scene entity: its world placement plus the payload it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leaf {
    #[serde(default = "identity")]
    pub transform: Mat4,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentBinding>,

    pub data: LeafData,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub material_slots: Vec<MaterialSlot>,

    #[serde(default)]
    pub active_material: usize,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<Modifier>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub drivers: Vec<Driver>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<Constraint>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<Animation>,
}

fn identity() -> Mat4 {
    Mat4::IDENTITY
}

impl Leaf {
    pub fn new(data: LeafData) -> Self {
        Leaf {
            transform: Mat4::IDENTITY,
            parent: None,
            data,
            material_slots: Vec::new(),
            active_material: 0,
            modifiers: Vec::new(),
            drivers: Vec::new(),
            constraints: Vec::new(),
            animation: None,
        }
    }

    pub fn category(&self) -> LeafCategory {
        self.data.category()
    }

    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.data {
            LeafData::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut Mesh> {
        match &mut self.data {
            LeafData::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }

    pub fn vertex_count(&self) -> usize {
        match &self.data {
            LeafData::Mesh(mesh) => mesh.vertices.len(),
            LeafData::Curve(curve) => curve.splines.iter().map(|s| s.points.len()).sum(),
            _ => 0,
        }
    }

    /// Kinds of sub-payload this leaf carries, used to decide which layers
    /// care about it.
    pub fn payload_kinds(&self) -> Vec<PayloadKind> {
        let mut kinds = Vec::new();

        match &self.data {
            LeafData::Mesh(mesh) => {
                kinds.push(PayloadKind::Mesh);
                if !mesh.shape_keys.is_empty() {
                    kinds.push(PayloadKind::ShapeKeys);
                }
            }
            LeafData::Curve(_) => kinds.push(PayloadKind::Curve),
            LeafData::HairCurves(_) => kinds.push(PayloadKind::HairCurves),
            LeafData::Light(_) => kinds.push(PayloadKind::Light),
            LeafData::LightProbe(_) => kinds.push(PayloadKind::LightProbe),
            LeafData::Armature => kinds.push(PayloadKind::Armature),
            LeafData::Camera => kinds.push(PayloadKind::Camera),
            LeafData::Speaker | LeafData::Empty => {}
        }

        if self.material_slots.iter().any(|slot| slot.material.is_some()) {
            kinds.push(PayloadKind::Material);
        }

        if self.animation.as_ref().and_then(|a| a.action.as_ref()).is_some() {
            kinds.push(PayloadKind::Action);
        }

        kinds
    }

    /// Visits every reference this leaf holds to another node: its parent
    /// binding, node-typed modifier parameters, bind targets, driver targets
    /// and constraint targets.
    pub fn for_each_ref_mut(&mut self, mut visit: impl FnMut(&mut Option<NodeId>)) {
        if let Some(binding) = &mut self.parent {
            visit(&mut binding.target);
        }

        for modifier in &mut self.modifiers {
            for value in modifier.params.values_mut() {
                if let ParamValue::Node(slot) = value {
                    visit(slot);
                }
            }

            if let Some(bind) = &mut modifier.bind {
                visit(&mut bind.target);
            }
        }

        for driver in &mut self.drivers {
            for target in driver.targets_mut() {
                visit(&mut target.id);
            }
        }

        for constraint in &mut self.constraints {
            for target in &mut constraint.targets {
                visit(target);
            }
        }
    }

    /// Wipes animation data, drivers included.
    pub fn clear_animation(&mut self) {
        self.animation = None;
        self.drivers.clear();
    }

    pub fn clear_materials(&mut self) {
        self.material_slots.clear();
        self.active_material = 0;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum LeafData {
    Mesh(Mesh),
    Curve(Curve),
    HairCurves(Curve),
    Light(LightData),
    LightProbe(LightProbeData),
    Armature,
    Camera,
    Speaker,
    Empty,
}

impl LeafData {
    pub fn category(&self) -> LeafCategory {
        match self {
            LeafData::Mesh(_) => LeafCategory::Mesh,
            LeafData::Curve(_) => LeafCategory::Curve,
            LeafData::HairCurves(_) => LeafCategory::HairCurves,
            LeafData::Light(_) => LeafCategory::Light,
            LeafData::LightProbe(_) => LeafCategory::LightProbe,
            LeafData::Armature => LeafCategory::Armature,
            LeafData::Camera => LeafCategory::Camera,
            LeafData::Speaker => LeafCategory::Speaker,
            LeafData::Empty => LeafCategory::Empty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafCategory {
    Mesh,
    Curve,
    HairCurves,
    Light,
    LightProbe,
    Armature,
    Camera,
    Speaker,
    Empty,
}

impl LeafCategory {
    pub fn is_lighting(self) -> bool {
        matches!(self, LeafCategory::Light | LeafCategory::LightProbe)
    }
}

/// Sub-payload types a layer can own. Publishing data of one of these kinds
/// through a layer makes that layer's version relevant to the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Mesh,
    Curve,
    HairCurves,
    ShapeKeys,
    Material,
    Light,
    LightProbe,
    Armature,
    Camera,
    Action,
}

/// Placement of a leaf relative to another node, on top of the container
/// hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentBinding {
    pub target: Option<NodeId>,

    #[serde(default)]
    pub kind: ParentKind,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bone: String,

    #[serde(default = "identity")]
    pub inverse: Mat4,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentKind {
    #[default]
    Object,
    Armature,
    Bone,
    Vertex,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub name: String,
    pub kind: ConstraintKind,

    #[serde(default = "enabled")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<Option<NodeId>>,
}

fn enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Armature,
    CopyTransforms,
    ChildOf,
    TrackTo,
    Other(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}
