// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Symbol definitions and symbol table.

use wisp_ast::NodeId;

/// Unique identifier for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(pub u32);

/// The kind of symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolKind {
    /// A local variable of a method or constructor body.
    Local,
    /// A method or constructor parameter.
    Parameter,
    /// A field of `owner`.
    Field {
        owner: String,
        is_static: bool,
    },
    /// A method of `owner`.
    Method {
        owner: String,
        is_static: bool,
    },
    /// A class declared in the unit.
    Type,
    /// A name supplied by the host environment.
    Builtin,
}

/// A declared symbol.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub kind: SymbolKind,
    /// Type annotation, if any.
    pub ty: Option<String>,
    /// Declaring node. Builtins have none.
    pub decl: Option<NodeId>,
}

/// Table of all symbols in a unit.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self { symbols: Vec::new() }
    }

    /// Insert a new symbol and return its ID.
    pub fn insert(&mut self, name: String, kind: SymbolKind, ty: Option<String>, decl: Option<NodeId>) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(Symbol { id, name, kind, ty, decl });
        id
    }

    /// Get a symbol by ID.
    pub fn get(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.get(id.0 as usize)
    }

    /// Iterate over all symbols.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
