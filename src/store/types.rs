use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use uuid::Uuid;

use crate::compute::RateType;

/// Placeholder stored when a scenario's name is emptied.
pub const DEFAULT_SCENARIO_NAME: &str = "Scenario";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(pub Uuid);

impl OperationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioId(pub Uuid);

impl ScenarioId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ScenarioId {
    fn default() -> Self {
        Self::new()
    }
}

/// A reusable computation step, shared across scenarios by reference.
///
/// `usage` counts the nodes referencing this record across all scenarios;
/// the record is deleted when it drops to zero. `color` is the visual tag
/// drawn from the shared palette once the operation is referenced by more
/// than one scenario (it can stay `None` if the palette is exhausted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: OperationId,
    pub name: String,
    /// Numeric operand stored as the raw input string; parsed at
    /// evaluation time by the rate engine.
    pub rate: String,
    // Older export payloads predate sharing and carry neither field.
    #[serde(default = "default_usage")]
    pub usage: u32,
    #[serde(default)]
    pub color: Option<String>,
}

fn default_usage() -> u32 {
    1
}

impl Operation {
    pub fn new(name: impl Into<String>, rate: impl Into<String>) -> Self {
        Self {
            id: OperationId::new(),
            name: name.into(),
            rate: rate.into(),
            usage: 1,
            color: None,
        }
    }
}

/// One link in a scenario's chain: a reference to an operation plus the
/// arithmetic kind it applies *in this scenario*.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioNode {
    #[serde(rename = "opId")]
    pub op_id: OperationId,
    #[serde(rename = "rateType")]
    pub rate_type: RateType,
}

pub type NodeChain = SmallVec<[ScenarioNode; 4]>;

/// A named ordered chain of nodes plus a starting value.
///
/// `order` is the scenario's position among all scenarios; the store keeps
/// the set of orders a contiguous `0..N-1` permutation at all times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: ScenarioId,
    // Re-based on import anyway; absent in older payloads.
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub name: String,
    /// Seed value as the raw input string; parsed at evaluation time.
    pub init: String,
    pub nodes: NodeChain,
}

impl Scenario {
    pub fn new(order: u32) -> Self {
        Self {
            id: ScenarioId::new(),
            order,
            name: DEFAULT_SCENARIO_NAME.to_string(),
            init: "0".to_string(),
            nodes: NodeChain::new(),
        }
    }

    /// Position of the first node referencing `op_id`, if any.
    pub fn node_index(&self, op_id: OperationId) -> Option<usize> {
        self.nodes.iter().position(|n| n.op_id == op_id)
    }

    pub fn references(&self, op_id: OperationId) -> bool {
        self.node_index(op_id).is_some()
    }
}
