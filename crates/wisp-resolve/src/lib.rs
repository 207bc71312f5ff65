// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Semantic queries over a syntax tree.
//!
//! The translator's real front end owns name and type resolution. This crate
//! defines the query surface the lowering passes consume
//! ([`SemanticModel`]), a lexically scoped implementation of it
//! ([`ScopeModel`]), and the back-reference classifier that decides which
//! identifiers inside a synthesized state holder belong to the outer
//! instance.

mod symbol;
mod scope;
mod model;
mod backref;

pub use symbol::{Symbol, SymbolId, SymbolKind, SymbolTable};
pub use scope::ScopeTree;
pub use model::{ScopeModel, SemanticModel, TypeInfo};
pub use backref::{classify, outer_references, BackRef};
