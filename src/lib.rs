//! Core state model for chained rate scenarios.
//!
//! A *scenario* is a named, ordered chain of arithmetic adjustments
//! applied to a starting value; an *operation* is one reusable adjustment,
//! shared across scenarios by reference and tagged with a palette color
//! once more than one scenario uses it. This crate owns that state tree
//! and its mutation algebra — creation, deletion, drag-reordering,
//! sharing, import/export and the persistence blob — while rendering and
//! gesture handling live in the presentation layer on top.

pub mod compute;
pub mod display;
pub mod exchange;
pub mod persist;
pub mod store;

pub use compute::{apply_rate, RateType};
pub use display::{scenario_rows, spread, OperationRow, Spread};
pub use exchange::{parse_import, ExchangePayload, ImportError};
pub use persist::{DebouncedSaver, FileGateway, PersistenceGateway};
pub use store::{Operation, OperationId, Scenario, ScenarioId, ScenarioNode, Store, StoreError};
