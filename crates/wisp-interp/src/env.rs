// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Environment for variable bindings.

use std::collections::HashMap;

use wisp_rt::Value;

#[derive(Debug, Default)]
struct Scope {
    bindings: HashMap<String, Value>,
}

/// Local bindings of one call, innermost scope last.
#[derive(Debug)]
pub(crate) struct Environment {
    scopes: Vec<Scope>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop_scope(&mut self) {
        // The call's outermost scope stays.
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn define(&mut self, name: String, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.bindings.insert(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.bindings.get(name))
    }

    /// Assign to an existing binding; false if there is none.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.bindings.get_mut(name) {
                *slot = value;
                return true;
            }
        }
        false
    }
}
