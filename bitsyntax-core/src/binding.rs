//! Variable binding table used to resolve dynamic segment sizes.
//!
//! Populated incrementally as the matcher binds named segments; each entry
//! stores the bound *value*, not a reference back into the segment that
//! produced it, so the table outlives nothing and aliases nothing.

use std::collections::HashMap;

/// A name → integer map, scoped to a single matcher invocation.
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    values: HashMap<String, i64>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`, overwriting any prior binding.
    pub fn bind(&mut self, name: impl Into<String>, value: i64) {
        self.values.insert(name.into(), value);
    }

    /// Look up a previously bound value.
    pub fn get(&self, name: &str) -> Option<i64> {
        self.values.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_then_get() {
        let mut table = VariableTable::new();
        assert_eq!(table.get("size"), None);
        table.bind("size", 5);
        assert_eq!(table.get("size"), Some(5));
    }

    #[test]
    fn rebinding_overwrites() {
        let mut table = VariableTable::new();
        table.bind("x", 1);
        table.bind("x", 2);
        assert_eq!(table.get("x"), Some(2));
    }
}
