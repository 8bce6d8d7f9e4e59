//! The shared palette of tag colors for operations used by more than one
//! scenario.
//!
//! The pool is derived state: a color is free iff no operation record
//! currently holds it. It is not serialized; after loading a state blob it
//! is rebuilt from the operation records.

use std::collections::HashSet;

/// Fixed palette; order defines allocation preference.
pub const OP_COLORS: [&str; 8] = [
    "magenta", "cyan", "gold", "lime", "volcano", "geekblue", "orange", "purple",
];

#[derive(Debug, Clone)]
pub struct ColorPool {
    in_use: HashSet<String>,
}

impl Default for ColorPool {
    fn default() -> Self {
        Self {
            in_use: HashSet::new(),
        }
    }
}

impl ColorPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_free(&self, color: &str) -> bool {
        !self.in_use.contains(color)
    }

    /// Takes the first free color in palette order, or `None` when every
    /// color is held. Callers tolerate exhaustion: a shared operation
    /// simply goes untagged.
    pub fn acquire(&mut self) -> Option<String> {
        for color in OP_COLORS {
            if !self.in_use.contains(color) {
                self.in_use.insert(color.to_string());
                return Some(color.to_string());
            }
        }
        None
    }

    /// Marks a specific color as held, e.g. when an imported operation
    /// arrives already tagged. Returns `false` (and changes nothing) if
    /// the color was already taken.
    pub fn claim(&mut self, color: &str) -> bool {
        if self.in_use.contains(color) {
            return false;
        }
        self.in_use.insert(color.to_string());
        true
    }

    /// Returns a color to the pool. Idempotent: releasing a free color is
    /// a no-op.
    pub fn release(&mut self, color: &str) {
        self.in_use.remove(color);
    }

    /// Marks every color free again.
    pub fn reset(&mut self) {
        self.in_use.clear();
    }

    /// Rebuilds the pool from the colors currently held by operation
    /// records, after deserialization.
    pub fn rebuild<'a>(&mut self, held: impl IntoIterator<Item = &'a str>) {
        self.in_use = held.into_iter().map(str::to_string).collect();
    }
}
