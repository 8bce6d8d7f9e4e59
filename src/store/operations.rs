//! The operation table: id -> operation records, reference counting and
//! color tagging.
//!
//! Operations have no single owner; they are owned collectively by the
//! scenarios referencing them and reaped when the last reference goes
//! away. All usage transitions route through [`OperationTable::increment_usage`]
//! and [`OperationTable::decrement_usage`] so the color invariant
//! (`color.is_some()` iff `usage > 1`, palette permitting) holds after
//! every mutation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::colors::ColorPool;
use super::types::{Operation, OperationId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationTable {
    ops: HashMap<OperationId, Operation>,
}

impl OperationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn get(&self, id: OperationId) -> Option<&Operation> {
        self.ops.get(&id)
    }

    pub fn contains(&self, id: OperationId) -> bool {
        self.ops.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operation> {
        self.ops.values()
    }

    /// Inserts a fresh operation with a single reference and no tag.
    /// Returns its id for the caller to attach as a node.
    pub fn create(&mut self, name: impl Into<String>, rate: impl Into<String>) -> OperationId {
        let op = Operation::new(name, rate);
        let id = op.id;
        self.ops.insert(id, op);
        id
    }

    /// Inserts a pre-built record as-is (import path). The caller is
    /// responsible for color reconciliation against the pool.
    pub fn insert(&mut self, op: Operation) {
        self.ops.insert(op.id, op);
    }

    /// Replaces the mutable fields of an operation. Silent no-op on an
    /// unknown id: updates may race with deletion in the calling layer.
    pub fn update(&mut self, id: OperationId, name: impl Into<String>, rate: impl Into<String>) {
        if let Some(op) = self.ops.get_mut(&id) {
            op.name = name.into();
            op.rate = rate.into();
        }
    }

    /// Adds one reference. Crossing 1 -> 2 makes the operation shared and
    /// draws a tag color from the pool (left `None` on exhaustion).
    pub fn increment_usage(&mut self, id: OperationId, colors: &mut ColorPool) {
        let Some(op) = self.ops.get_mut(&id) else {
            return;
        };
        op.usage += 1;
        if op.usage == 2 {
            op.color = colors.acquire();
        }
    }

    /// Drops one reference. Crossing 2 -> 1 releases the tag color;
    /// reaching 0 deletes the record entirely.
    pub fn decrement_usage(&mut self, id: OperationId, colors: &mut ColorPool) {
        let Some(op) = self.ops.get_mut(&id) else {
            return;
        };
        op.usage = op.usage.saturating_sub(1);
        if op.usage == 1 {
            if let Some(color) = op.color.take() {
                colors.release(&color);
            }
        } else if op.usage == 0 {
            self.ops.remove(&id);
        }
    }

    /// Removes a record outright (explicit user delete), returning its
    /// color, if any, to the pool.
    pub fn remove(&mut self, id: OperationId, colors: &mut ColorPool) -> Option<Operation> {
        let op = self.ops.remove(&id)?;
        if let Some(color) = &op.color {
            colors.release(color);
        }
        Some(op)
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    /// Colors held by the current records, for pool rebuilds after load.
    pub fn held_colors(&self) -> impl Iterator<Item = &str> {
        self.ops.values().filter_map(|op| op.color.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::colors::OP_COLORS;

    #[test]
    fn create_starts_unshared() {
        let mut table = OperationTable::new();
        let id = table.create("fee", "1.5");
        let op = table.get(id).unwrap();
        assert_eq!(op.usage, 1);
        assert_eq!(op.color, None);
    }

    #[test]
    fn sharing_assigns_and_releases_color() {
        let mut table = OperationTable::new();
        let mut colors = ColorPool::new();
        let id = table.create("fee", "1.5");

        table.increment_usage(id, &mut colors);
        let held = table.get(id).unwrap().color.clone().unwrap();
        assert_eq!(held, OP_COLORS[0]);
        assert!(!colors.is_free(&held));

        table.decrement_usage(id, &mut colors);
        assert_eq!(table.get(id).unwrap().color, None);
        assert!(colors.is_free(&held));
    }

    #[test]
    fn usage_zero_reaps_the_record() {
        let mut table = OperationTable::new();
        let mut colors = ColorPool::new();
        let id = table.create("fee", "2");
        table.decrement_usage(id, &mut colors);
        assert!(!table.contains(id));
    }

    #[test]
    fn pool_exhaustion_leaves_color_none() {
        let mut table = OperationTable::new();
        let mut colors = ColorPool::new();
        while colors.acquire().is_some() {}

        let id = table.create("fee", "2");
        table.increment_usage(id, &mut colors);
        let op = table.get(id).unwrap();
        assert_eq!(op.usage, 2);
        assert_eq!(op.color, None);
    }

    #[test]
    fn update_unknown_id_is_a_noop() {
        let mut table = OperationTable::new();
        table.update(OperationId::new(), "x", "1");
        assert!(table.is_empty());
    }
}
