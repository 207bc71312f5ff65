// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Syntax tree for the class-based source language.
//!
//! This crate defines the nodes shared between the front end, the lowering
//! passes and the reference evaluator, plus a read-only index that answers
//! parent/kind queries about a tree.

pub mod span;
pub mod expr;
pub mod stmt;
pub mod decl;
pub mod index;
pub mod visit;
pub mod build;

pub use span::Span;
pub use index::{NodeKind, SyntaxIndex};
pub use build::AstBuilder;

/// Unique identifier for AST nodes.
///
/// Used by semantic queries as the lookup key for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u32);

impl NodeId {
    pub const DUMMY: NodeId = NodeId(u32::MAX);
}

/// Source of fresh node ids for one compilation unit.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeIdGen {
    next: u32,
}

impl NodeIdGen {
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Continue numbering after ids handed out elsewhere.
    pub fn starting_at(next: u32) -> Self {
        Self { next }
    }

    pub fn fresh(&mut self) -> NodeId {
        let id = NodeId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u32 {
        self.next
    }
}
