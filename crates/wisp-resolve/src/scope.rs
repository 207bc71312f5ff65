// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Scope tree for name resolution.

use std::collections::HashMap;

use crate::symbol::SymbolId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ScopeId(u32);

#[derive(Debug)]
struct Scope {
    parent: Option<ScopeId>,
    bindings: HashMap<String, SymbolId>,
}

/// Tree of scopes for name lookup: the unit's global scope, then one scope
/// per type, method and block as the walk enters them.
#[derive(Debug)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl ScopeTree {
    /// Create a new scope tree with a global scope.
    pub fn new() -> Self {
        let global = Scope {
            parent: None,
            bindings: HashMap::new(),
        };
        Self {
            scopes: vec![global],
            current: ScopeId(0),
        }
    }

    /// Push a new scope.
    pub fn push(&mut self) {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent: Some(self.current),
            bindings: HashMap::new(),
        });
        self.current = id;
    }

    /// Pop the current scope and return to parent.
    pub fn pop(&mut self) {
        if let Some(scope) = self.scopes.get(self.current.0 as usize) {
            if let Some(parent) = scope.parent {
                self.current = parent;
            }
        }
    }

    /// Look up a name in the current scope chain.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        let mut scope_id = Some(self.current);
        while let Some(id) = scope_id {
            let scope = self.scopes.get(id.0 as usize)?;
            if let Some(&symbol) = scope.bindings.get(name) {
                return Some(symbol);
            }
            scope_id = scope.parent;
        }
        None
    }

    /// Define a name in the current scope.
    /// A later binding of the same name in the same scope replaces the earlier one.
    pub fn define(&mut self, name: String, symbol: SymbolId) {
        let scope = &mut self.scopes[self.current.0 as usize];
        scope.bindings.insert(name, symbol);
    }
}

impl Default for ScopeTree {
    fn default() -> Self {
        Self::new()
    }
}
