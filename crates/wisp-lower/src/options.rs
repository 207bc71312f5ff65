// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Lowering configuration.

use serde::{Deserialize, Serialize};

/// Names the lowering pass gives to synthesized members.
///
/// Every name starts with a character the source language cannot use in an
/// identifier, so synthesized members never collide with user code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowerOptions {
    /// Prefix of state-holder type names (`<prefix><Owner>$<method>`).
    pub state_holder_prefix: String,
    /// Field holding the enclosing instance.
    pub back_reference: String,
    /// Field holding the resume point.
    pub state_field: String,
    /// Field holding the last yielded value.
    pub current_field: String,
    /// Host globals that resolve everywhere (never redirected).
    pub builtins: Vec<String>,
}

impl Default for LowerOptions {
    fn default() -> Self {
        Self {
            state_holder_prefix: "YieldEnumerator$".to_string(),
            back_reference: "$this".to_string(),
            state_field: "$state".to_string(),
            current_field: "$current".to_string(),
            builtins: Vec::new(),
        }
    }
}

impl LowerOptions {
    /// Parse options from JSON; missing keys keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn state_holder_name(&self, owner: &str, method: &str) -> String {
        format!("{}{}${}", self.state_holder_prefix, owner, method)
    }
}
