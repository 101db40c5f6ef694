use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Handle to a node inside a [`SceneTree`](super::SceneTree).
///
/// IDs are random and globally unique, so a node keeps its ID when it is moved
/// from a loaded snapshot into the workspace. References held by modifiers,
/// drivers and constraints stay valid across that move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> NodeId {
        NodeId(Uuid::new_v4())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, writer: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(writer, "{}", self.0)
    }
}
