//! Presentation-facing read models.
//!
//! The presentation layer never walks the raw state tree; it reads these
//! derived views and dispatches mutations back to the store. Everything
//! here is recomputed on demand from the current state, so it is always
//! consistent with the latest mutation.

use crate::compute::{apply_rate, parse_seed, RateType};
use crate::store::{Operation, Scenario, ScenarioId, Store};

/// One row of a scenario's table: the operation record, the arithmetic
/// kind it applies in this scenario, and the running result after it.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRow {
    pub operation: Operation,
    pub rate_type: RateType,
    pub result: f64,
}

/// Difference between a scenario's final result and its seed, in absolute
/// and percentage terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spread {
    pub delta: f64,
    pub percent: f64,
}

/// Computes the scenario's chain left-to-right: the seed feeds the first
/// node, every node after that consumes its predecessor's result.
///
/// Nodes referencing a missing operation (possible after an import with
/// dangling ids) are skipped rather than breaking the chain.
pub fn scenario_rows(store: &Store, scenario_id: ScenarioId) -> Vec<OperationRow> {
    let Some(scenario) = store.scenario(scenario_id) else {
        return Vec::new();
    };

    let mut rows = Vec::with_capacity(scenario.nodes.len());
    let mut running = parse_seed(&scenario.init);

    for node in &scenario.nodes {
        let Some(operation) = store.operations().get(node.op_id) else {
            continue;
        };
        running = apply_rate(node.rate_type, &operation.rate, running);
        rows.push(OperationRow {
            operation: operation.clone(),
            rate_type: node.rate_type,
            result: running,
        });
    }
    rows
}

/// The spread summary for a scenario, or `None` when there is nothing to
/// show: no computed rows, or a zero/empty seed (the percentage would
/// divide by zero).
pub fn spread(store: &Store, scenario_id: ScenarioId) -> Option<Spread> {
    let scenario = store.scenario(scenario_id)?;
    let seed = parse_seed(&scenario.init);
    if seed == 0.0 {
        return None;
    }
    let rows = scenario_rows(store, scenario_id);
    let last = rows.last()?;
    let delta = last.result - seed;
    Some(Spread {
        delta,
        percent: delta / seed * 100.0,
    })
}

/// Scenarios currently shown in the working table, sorted by their order.
pub fn display_order(store: &Store) -> Vec<&Scenario> {
    let mut shown: Vec<&Scenario> = store
        .scenarios()
        .filter(|sc| store.is_displayed(sc.id))
        .collect();
    shown.sort_by_key(|sc| sc.order);
    shown
}
