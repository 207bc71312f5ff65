// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Statement AST nodes.

use crate::expr::Expr;
use crate::{NodeId, Span};

/// A statement in the AST.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stmt {
    pub id: NodeId,
    pub kind: StmtKind,
    pub span: Span,
}

/// The kind of statement.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StmtKind {
    /// Expression statement
    Expr(Expr),
    /// Local declaration
    Let {
        name: String,
        ty: Option<String>,
        init: Option<Expr>,
    },
    /// Assignment
    Assign {
        target: Expr,
        value: Expr,
    },
    /// If statement
    If {
        cond: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Vec<Stmt>,
    },
    /// While loop
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    /// Infinite loop
    Loop {
        body: Vec<Stmt>,
    },
    /// `foreach (binding in iter)` over anything with `GetEnumerator()`
    ForEach {
        binding: String,
        iter: Expr,
        body: Vec<Stmt>,
    },
    /// Nested block
    Block(Vec<Stmt>),
    /// Integer switch without fallthrough. `break`/`continue` inside a case
    /// target the enclosing loop.
    Switch {
        scrutinee: Expr,
        cases: Vec<SwitchCase>,
        default: Vec<Stmt>,
    },
    /// Return statement
    Return(Option<Expr>),
    /// Break statement
    Break,
    /// Continue statement
    Continue,
    /// `yield return value`
    YieldReturn(Expr),
    /// `yield break`
    YieldBreak,
}

/// One arm of a [`StmtKind::Switch`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SwitchCase {
    pub value: i64,
    pub body: Vec<Stmt>,
}

impl Stmt {
    /// Whether this statement, or any statement nested in it, yields.
    pub fn contains_yield(&self) -> bool {
        match &self.kind {
            StmtKind::YieldReturn(_) | StmtKind::YieldBreak => true,
            StmtKind::If { then_branch, else_branch, .. } => {
                contains_yield(then_branch) || contains_yield(else_branch)
            }
            StmtKind::While { body, .. }
            | StmtKind::Loop { body }
            | StmtKind::ForEach { body, .. }
            | StmtKind::Block(body) => contains_yield(body),
            StmtKind::Switch { cases, default, .. } => {
                cases.iter().any(|c| contains_yield(&c.body)) || contains_yield(default)
            }
            StmtKind::Expr(_)
            | StmtKind::Let { .. }
            | StmtKind::Assign { .. }
            | StmtKind::Return(_)
            | StmtKind::Break
            | StmtKind::Continue => false,
        }
    }
}

/// Whether any statement in the list yields.
pub fn contains_yield(stmts: &[Stmt]) -> bool {
    stmts.iter().any(Stmt::contains_yield)
}
