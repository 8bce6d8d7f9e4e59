pub mod colors;
pub mod operations;
pub mod scenarios;
pub mod types;

pub use colors::{ColorPool, OP_COLORS};
pub use operations::OperationTable;
pub use scenarios::{Store, StoreError};
pub use types::{
    NodeChain, Operation, OperationId, Scenario, ScenarioId, ScenarioNode,
    DEFAULT_SCENARIO_NAME,
};
