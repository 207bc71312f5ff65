// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! What a lowering run did.

use serde::Serialize;
use thiserror::Error;

/// Summary of one lowering run over a unit.
#[derive(Debug, Default, Serialize)]
pub struct LowerReport {
    pub lowered: Vec<LoweredMethod>,
    /// Identifiers rewritten to go through the back-reference.
    pub redirected: usize,
    pub diagnostics: Vec<LowerDiagnostic>,
}

impl LowerReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn holder_for(&self, owner: &str, method: &str) -> Option<&str> {
        self.lowered
            .iter()
            .find(|l| l.owner == owner && l.method == method)
            .map(|l| l.state_holder.as_str())
    }
}

/// One generator method that was replaced by a state holder.
#[derive(Debug, Clone, Serialize)]
pub struct LoweredMethod {
    pub owner: String,
    pub method: String,
    pub state_holder: String,
    /// Number of resume points, including the entry state.
    pub states: usize,
    /// Parameters and locals carried as state-holder fields.
    pub captured: Vec<String>,
}

/// A shape the pass did not rewrite faithfully. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LowerDiagnostic {
    #[error("{owner}.{method}: `return` with a value inside a generator was treated as `yield break`")]
    ReturnValueInGenerator { owner: String, method: String },

    #[error("{owner}.{method}: `{keyword}` outside of any loop was left as written")]
    StrayJump {
        owner: String,
        method: String,
        keyword: String,
    },
}
