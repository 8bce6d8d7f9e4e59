//! The root state tree: scenarios, the operation table, the color pool
//! and the visibility lists, with every mutation the presentation layer
//! can issue.
//!
//! All mutations take `&mut self`, so exclusive access is enforced by the
//! borrow checker: a mutation runs to completion before the next one is
//! accepted, and cross-field invariants (usage, color, order) are never
//! observable half-updated. Unknown-id lookups are defensive early-return
//! no-ops; the only mutation that reports a failure to the caller is the
//! duplicate-attach rejection.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::compute::RateType;
use crate::exchange::ExchangePayload;

use super::colors::ColorPool;
use super::operations::OperationTable;
use super::types::{
    OperationId, Scenario, ScenarioId, ScenarioNode, DEFAULT_SCENARIO_NAME,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    /// A scenario holds each operation at most once; a second attach of
    /// the same operation is rejected without touching the store.
    #[error("operation is already attached to this scenario")]
    OperationAlreadyAttached,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Store {
    scenarios: HashMap<ScenarioId, Scenario>,
    operations: OperationTable,

    // Derived from the operation records; rebuilt after deserialization.
    #[serde(skip)]
    colors: ColorPool,

    #[serde(rename = "collapsedScenariosIds")]
    collapsed_scenarios_ids: Vec<ScenarioId>,
    #[serde(rename = "displayedScenariosIds")]
    displayed_scenarios_ids: Vec<ScenarioId>,

    /// UI locale; carried in the state blob alongside the model.
    language: String,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            scenarios: HashMap::new(),
            operations: OperationTable::new(),
            colors: ColorPool::new(),
            collapsed_scenarios_ids: Vec::new(),
            displayed_scenarios_ids: Vec::new(),
            language: "ru".to_string(),
        }
    }
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Read accessors ---

    pub fn scenario(&self, id: ScenarioId) -> Option<&Scenario> {
        self.scenarios.get(&id)
    }

    pub fn scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.values()
    }

    pub fn scenario_count(&self) -> usize {
        self.scenarios.len()
    }

    pub fn operations(&self) -> &OperationTable {
        &self.operations
    }

    pub fn colors(&self) -> &ColorPool {
        &self.colors
    }

    pub fn collapsed_ids(&self) -> &[ScenarioId] {
        &self.collapsed_scenarios_ids
    }

    pub fn displayed_ids(&self) -> &[ScenarioId] {
        &self.displayed_scenarios_ids
    }

    pub fn is_collapsed(&self, id: ScenarioId) -> bool {
        self.collapsed_scenarios_ids.contains(&id)
    }

    pub fn is_displayed(&self, id: ScenarioId) -> bool {
        self.displayed_scenarios_ids.contains(&id)
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn set_language(&mut self, language: impl Into<String>) {
        self.language = language.into();
    }

    /// Rebuilds the derived color pool from the operation records, after
    /// the store has been deserialized from a state blob.
    pub fn rebuild_color_pool(&mut self) {
        let Self {
            operations, colors, ..
        } = self;
        colors.rebuild(operations.held_colors());
    }

    // --- Scenario lifecycle ---

    /// Creates an empty scenario appended at the end of the order and
    /// shows it in the working table, expanded.
    pub fn add_scenario(&mut self) -> ScenarioId {
        let scenario = Scenario::new(self.scenarios.len() as u32);
        let id = scenario.id;
        self.scenarios.insert(id, scenario);
        self.displayed_scenarios_ids.push(id);
        id
    }

    /// The one bulk-reset entry point: drops every scenario and operation,
    /// empties the visibility lists and frees the whole palette. The UI
    /// locale survives.
    pub fn clear_all(&mut self) {
        self.scenarios.clear();
        self.operations.clear();
        self.collapsed_scenarios_ids.clear();
        self.displayed_scenarios_ids.clear();
        self.colors.reset();
        debug!("store cleared");
    }

    /// Full-record replace for simple field edits (name, init). The stored
    /// `order` is kept: ordering changes go through [`Store::move_scenario`]
    /// only, so the permutation invariant cannot be broken by a stale
    /// record from the UI. An emptied name falls back to the placeholder;
    /// an unknown id is a no-op.
    pub fn update_scenario(&mut self, mut scenario: Scenario) {
        let Some(existing) = self.scenarios.get_mut(&scenario.id) else {
            return;
        };
        scenario.order = existing.order;
        if scenario.name.trim().is_empty() {
            scenario.name = DEFAULT_SCENARIO_NAME.to_string();
        }
        *existing = scenario;
    }

    /// Deletes a scenario, cascading to the operations it references.
    ///
    /// Every node's operation gets one reference dropped, with color
    /// release and reaping per the operation lifecycle. When
    /// `clear_orphan_operations` is set, an operation whose usage was
    /// already 1 (this scenario was its sole user) is removed outright
    /// rather than left to the usage-0 sweep. Remaining scenarios'
    /// `order` values are re-compacted to stay contiguous.
    pub fn delete_scenario(&mut self, id: ScenarioId, clear_orphan_operations: bool) {
        let Some(scenario) = self.scenarios.remove(&id) else {
            return;
        };

        for node in &scenario.nodes {
            let was_sole_user = self
                .operations
                .get(node.op_id)
                .map(|op| op.usage == 1)
                .unwrap_or(false);
            if clear_orphan_operations && was_sole_user {
                self.operations.remove(node.op_id, &mut self.colors);
            } else {
                self.operations.decrement_usage(node.op_id, &mut self.colors);
            }
        }

        self.collapsed_scenarios_ids.retain(|sid| *sid != id);
        self.displayed_scenarios_ids.retain(|sid| *sid != id);

        for sc in self.scenarios.values_mut() {
            if sc.order > scenario.order {
                sc.order -= 1;
            }
        }
    }

    /// Moves the scenario at `from_order` to `to_order`, shifting every
    /// scenario strictly between them by one to keep the orders a
    /// contiguous permutation. No-op when the positions are equal, when
    /// no scenario sits at `from_order`, or when `to_order` points past
    /// the last slot (stale indices from the UI must not corrupt the
    /// permutation).
    pub fn move_scenario(&mut self, from_order: u32, to_order: u32) {
        if from_order == to_order || to_order >= self.scenarios.len() as u32 {
            return;
        }
        let Some(moved_id) = self
            .scenarios
            .values()
            .find(|sc| sc.order == from_order)
            .map(|sc| sc.id)
        else {
            return;
        };

        for sc in self.scenarios.values_mut() {
            if sc.id == moved_id {
                continue;
            }
            if from_order < to_order && sc.order > from_order && sc.order <= to_order {
                sc.order -= 1;
            } else if from_order > to_order && sc.order >= to_order && sc.order < from_order {
                sc.order += 1;
            }
        }
        if let Some(sc) = self.scenarios.get_mut(&moved_id) {
            sc.order = to_order;
        }
    }

    // --- Node / operation mutations ---

    /// Creates a fresh default operation and attaches it to the scenario.
    /// Returns `None` (and creates nothing) when the scenario is unknown.
    pub fn add_operation(
        &mut self,
        scenario_id: ScenarioId,
        at: Option<usize>,
    ) -> Option<OperationId> {
        if !self.scenarios.contains_key(&scenario_id) {
            return None;
        }
        let op_id = self.operations.create("", "1");
        // Cannot collide: the id is fresh.
        let _ = self.insert_node(scenario_id, op_id, at);
        Some(op_id)
    }

    /// Attaches an existing operation to a scenario, adding a reference.
    /// This is the path by which an operation becomes shared. Rejects a
    /// duplicate attach; unknown scenario or operation ids are no-ops.
    pub fn attach_node(
        &mut self,
        scenario_id: ScenarioId,
        op_id: OperationId,
        at: Option<usize>,
    ) -> Result<(), StoreError> {
        if !self.scenarios.contains_key(&scenario_id) || !self.operations.contains(op_id) {
            return Ok(());
        }
        self.insert_node(scenario_id, op_id, at)?;
        self.operations.increment_usage(op_id, &mut self.colors);
        Ok(())
    }

    fn insert_node(
        &mut self,
        scenario_id: ScenarioId,
        op_id: OperationId,
        at: Option<usize>,
    ) -> Result<(), StoreError> {
        let Some(scenario) = self.scenarios.get_mut(&scenario_id) else {
            return Ok(());
        };
        if scenario.references(op_id) {
            return Err(StoreError::OperationAlreadyAttached);
        }
        let node = ScenarioNode {
            op_id,
            rate_type: RateType::Mul,
        };
        let index = at.unwrap_or(scenario.nodes.len()).min(scenario.nodes.len());
        scenario.nodes.insert(index, node);
        Ok(())
    }

    /// Removes the first node referencing `op_id` from the scenario and
    /// drops one reference. First-match only: a hypothetical duplicate
    /// loses a single instance per call.
    pub fn remove_node(&mut self, scenario_id: ScenarioId, op_id: OperationId) {
        let Some(scenario) = self.scenarios.get_mut(&scenario_id) else {
            return;
        };
        let Some(index) = scenario.node_index(op_id) else {
            return;
        };
        scenario.nodes.remove(index);
        self.operations.decrement_usage(op_id, &mut self.colors);
    }

    /// Plain array move inside one scenario's chain; no usage or color
    /// side effects.
    pub fn reorder_node(&mut self, scenario_id: ScenarioId, from: usize, to: usize) {
        let Some(scenario) = self.scenarios.get_mut(&scenario_id) else {
            return;
        };
        if from == to || from >= scenario.nodes.len() {
            return;
        }
        let node = scenario.nodes.remove(from);
        let index = to.min(scenario.nodes.len());
        scenario.nodes.insert(index, node);
    }

    /// Changes the arithmetic kind of one node in place. The operation
    /// record itself is untouched: the same operation keeps behaving
    /// differently in other scenarios.
    pub fn update_node_rate_type(
        &mut self,
        scenario_id: ScenarioId,
        op_id: OperationId,
        rate_type: RateType,
    ) {
        let Some(scenario) = self.scenarios.get_mut(&scenario_id) else {
            return;
        };
        if let Some(index) = scenario.node_index(op_id) {
            scenario.nodes[index].rate_type = rate_type;
        }
    }

    /// Edits an operation's own fields (name, rate), visible in every
    /// scenario referencing it. Unknown id is a no-op.
    pub fn update_operation(
        &mut self,
        op_id: OperationId,
        name: impl Into<String>,
        rate: impl Into<String>,
    ) {
        self.operations.update(op_id, name, rate);
    }

    /// Explicit user delete of an operation, independent of usage: every
    /// node referencing it, in every scenario, is removed along with the
    /// record itself.
    pub fn delete_operation(&mut self, op_id: OperationId) {
        if self.operations.remove(op_id, &mut self.colors).is_none() {
            return;
        }
        for scenario in self.scenarios.values_mut() {
            scenario.nodes.retain(|node| node.op_id != op_id);
        }
    }

    // --- Visibility ---

    /// Expanded <-> collapsed toggle; orthogonal to display membership.
    pub fn toggle_collapse(&mut self, id: ScenarioId) {
        if !self.scenarios.contains_key(&id) {
            return;
        }
        if let Some(pos) = self.collapsed_scenarios_ids.iter().position(|sid| *sid == id) {
            self.collapsed_scenarios_ids.remove(pos);
        } else {
            self.collapsed_scenarios_ids.push(id);
        }
    }

    /// Shown-in-table <-> parked-in-menu toggle. When re-adding, `at`
    /// places the scenario at a specific slot of the displayed list.
    pub fn toggle_display(&mut self, id: ScenarioId, at: Option<usize>) {
        if !self.scenarios.contains_key(&id) {
            return;
        }
        if let Some(pos) = self.displayed_scenarios_ids.iter().position(|sid| *sid == id) {
            self.displayed_scenarios_ids.remove(pos);
        } else {
            let index = at
                .unwrap_or(self.displayed_scenarios_ids.len())
                .min(self.displayed_scenarios_ids.len());
            self.displayed_scenarios_ids.insert(index, id);
        }
    }

    // --- Import / export ---

    /// Additive, conflict-avoidant import: an incoming record whose id is
    /// already present is skipped, never merged or overwritten. Incoming
    /// scenarios keep their relative ordering but are re-based onto the
    /// end of the existing order so the permutation stays contiguous.
    /// Incoming colors are claimed from the pool when still free; on a
    /// collision the incoming tag is dropped.
    ///
    /// A node reference that resolves to an operation the store already
    /// held before this call adds to that record's usage (the record
    /// itself is never overwritten). References to operations absent from
    /// both the payload and the store are left as-is; the read models
    /// skip them.
    pub fn import(&mut self, payload: ExchangePayload) {
        let mut inserted_ops = 0usize;
        let mut arrived_ops = std::collections::HashSet::new();
        for mut op in payload.operations {
            if self.operations.contains(op.id) {
                continue;
            }
            if op.usage > 1 {
                if let Some(color) = op.color.take() {
                    if self.colors.claim(&color) {
                        op.color = Some(color);
                    }
                }
            } else {
                op.color = None;
            }
            arrived_ops.insert(op.id);
            self.operations.insert(op);
            inserted_ops += 1;
        }

        let mut incoming: Vec<Scenario> = payload
            .scenarios
            .into_iter()
            .filter(|sc| !self.scenarios.contains_key(&sc.id))
            .collect();
        incoming.sort_by_key(|sc| sc.order);

        let mut next_order = self.scenarios.len() as u32;
        let inserted_scenarios = incoming.len();
        for mut scenario in incoming {
            scenario.order = next_order;
            next_order += 1;
            if scenario.name.trim().is_empty() {
                scenario.name = DEFAULT_SCENARIO_NAME.to_string();
            }
            // A reference landing on a pre-existing record is one more
            // live node for it; payload records carry their own usage.
            for node in &scenario.nodes {
                if !arrived_ops.contains(&node.op_id) && self.operations.contains(node.op_id) {
                    self.operations.increment_usage(node.op_id, &mut self.colors);
                }
            }
            let id = scenario.id;
            self.scenarios.insert(id, scenario);
            self.displayed_scenarios_ids.push(id);
        }

        debug!(
            operations = inserted_ops,
            scenarios = inserted_scenarios,
            "import applied"
        );
    }

    /// Snapshots the chosen scenarios plus the deduplicated transitive
    /// closure of the operations they reference. Unknown ids and dangling
    /// node references are skipped.
    pub fn export_selected(&self, ids: &[ScenarioId]) -> ExchangePayload {
        let mut scenarios = Vec::new();
        let mut operations = Vec::new();
        let mut seen_ops = std::collections::HashSet::new();

        for id in ids {
            let Some(scenario) = self.scenarios.get(id) else {
                continue;
            };
            for node in &scenario.nodes {
                if seen_ops.insert(node.op_id) {
                    if let Some(op) = self.operations.get(node.op_id) {
                        operations.push(op.clone());
                    }
                }
            }
            scenarios.push(scenario.clone());
        }

        ExchangePayload {
            scenarios,
            operations,
        }
    }
}
