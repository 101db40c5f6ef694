use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::NodeId;

/// An expression that drives a property of its owner from other properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    /// Path of the driven property on the owning leaf, for example
    /// `shape_keys["Smile"].value`.
    pub data_path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub array_index: Option<usize>,

    pub kind: DriverKind,

    #[serde(default)]
    pub expression: String,

    /// Lets the expression read its owner through `self`.
    #[serde(default)]
    pub use_self: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<CurveModifier>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variables: Vec<DriverVariable>,
}

impl Driver {
    /// A freshly added driver. Like the authoring tool, it starts with a
    /// default variable and a generator modifier that copying has to clear.
    pub fn scaffold(data_path: impl Into<String>, array_index: Option<usize>) -> Self {
        Driver {
            data_path: data_path.into(),
            array_index,
            kind: DriverKind::Scripted,
            expression: "var".to_owned(),
            use_self: false,
            modifiers: vec![CurveModifier::new(CurveModifierKind::Generator)],
            variables: vec![DriverVariable::new("var", VariableKind::SingleProp)],
        }
    }

    /// If this driver animates a shape key's value, the key's name.
    pub fn shape_key_name(&self) -> Option<&str> {
        let rest = self.data_path.strip_prefix("shape_keys[\"")?;
        let end = rest.find("\"]")?;
        Some(&rest[..end])
    }

    pub fn targets(&self) -> impl Iterator<Item = &DriverTarget> {
        self.variables.iter().flat_map(|variable| variable.targets.iter())
    }

    pub fn targets_mut(&mut self) -> impl Iterator<Item = &mut DriverTarget> {
        self.variables
            .iter_mut()
            .flat_map(|variable| variable.targets.iter_mut())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    Average,
    Sum,
    Scripted,
    Min,
    Max,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveModifier {
    pub kind: CurveModifierKind,

    #[serde(default)]
    pub muted: bool,

    #[serde(default)]
    pub params: BTreeMap<String, f32>,
}

impl CurveModifier {
    pub fn new(kind: CurveModifierKind) -> Self {
        CurveModifier {
            kind,
            muted: false,
            params: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveModifierKind {
    Generator,
    Noise,
    Cycles,
    Limits,
    Stepped,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverVariable {
    pub name: String,
    pub kind: VariableKind,

    #[serde(default)]
    pub targets: Vec<DriverTarget>,
}

impl DriverVariable {
    pub fn new(name: impl Into<String>, kind: VariableKind) -> Self {
        DriverVariable {
            name: name.into(),
            targets: vec![DriverTarget::default(); kind.target_count()],
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    SingleProp,
    Transforms,
    RotationDiff,
    LocationDiff,
}

impl VariableKind {
    /// Number of target slots a variable of this kind always has.
    pub fn target_count(self) -> usize {
        match self {
            VariableKind::SingleProp | VariableKind::Transforms => 1,
            VariableKind::RotationDiff | VariableKind::LocationDiff => 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeId>,

    #[serde(default)]
    pub data_path: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub bone_target: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub transform_type: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub transform_space: String,
}
