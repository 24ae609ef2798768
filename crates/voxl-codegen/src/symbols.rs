//! Block-scoped symbol table.
//!
//! Maps local names to their declared type and stack slot. Scopes are
//! pushed on block entry and popped on exit; lookup walks innermost
//! outward. Attributes live in the flat attribute registry, not here.

use indexmap::IndexMap;
use voxl_types::AxType;

use crate::ir::SlotId;

/// One resolved local.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Symbol {
    /// Declared type.
    pub ty: AxType,
    /// Backing stack slot.
    pub slot: SlotId,
}

/// A stack of lexical scopes.
#[derive(Debug, Default)]
pub struct SymbolTable {
    scopes: Vec<IndexMap<String, Symbol>>,
}

impl SymbolTable {
    /// A table with the root scope open.
    pub fn new() -> SymbolTable {
        SymbolTable {
            scopes: vec![IndexMap::new()],
        }
    }

    /// Open a scope.
    pub fn push(&mut self) {
        self.scopes.push(IndexMap::new());
    }

    /// Close the innermost scope.
    ///
    /// # Panics
    ///
    /// Panics on underflow; the generator pairs push/pop structurally.
    pub fn pop(&mut self) {
        assert!(self.scopes.len() > 1, "symbol table scope underflow");
        self.scopes.pop();
    }

    /// Declare a name in the innermost scope. Returns false if the name
    /// already exists in that scope.
    pub fn declare(&mut self, name: &str, symbol: Symbol) -> bool {
        let scope = self.scopes.last_mut().expect("symbol table has a scope");
        if scope.contains_key(name) {
            return false;
        }
        scope.insert(name.to_string(), symbol);
        true
    }

    /// Look a name up, innermost scope first.
    pub fn lookup(&self, name: &str) -> Option<Symbol> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }
}
