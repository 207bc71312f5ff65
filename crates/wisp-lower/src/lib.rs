// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Iterator lowering.
//!
//! Turns every generator method (a method whose body contains
//! `yield return` or `yield break`) into a synthesized state-holder type
//! implementing the enumerator protocol, then rewrites the moved body's
//! references to the original instance's members so they go through the
//! back-reference field.
//!
//! Lowering never fails: shapes it cannot handle faithfully are reported as
//! [`LowerDiagnostic`]s and left as written.

mod flatten;
mod generator;
mod hoist;
mod options;
pub mod protocol;
mod report;
mod rewrite;

use std::collections::HashSet;

use wisp_ast::decl::CompilationUnit;
use wisp_ast::AstBuilder;

pub use options::LowerOptions;
pub use report::{LowerDiagnostic, LowerReport, LoweredMethod};
pub use rewrite::{redirect_outer_references, redirect_with_model};

/// Lower every generator in `unit` in place.
///
/// State holders are appended after the source types. Types that are
/// already state holders are skipped, so running the pass twice is a no-op.
pub fn lower_unit(unit: &mut CompilationUnit, options: &LowerOptions) -> LowerReport {
    let mut report = LowerReport::default();
    let mut taken: HashSet<String> = unit.types.iter().map(|t| t.name.clone()).collect();
    let mut holders = Vec::new();
    let mut b = AstBuilder::from_gen(std::mem::take(&mut unit.ids));

    for ty in &mut unit.types {
        if ty.is_state_holder() {
            continue;
        }
        let owner = ty.name.clone();
        for method in &mut ty.methods {
            if !method.is_generator() {
                continue;
            }
            let name = unique_name(&mut taken, options.state_holder_name(&owner, &method.name));
            let lowered = generator::lower_generator(
                &mut b,
                options,
                &owner,
                method,
                name,
                &mut report.diagnostics,
            );
            holders.push(lowered.holder);
            report.lowered.push(lowered.report);
        }
    }
    unit.types.extend(holders);
    unit.ids = b.into_gen();

    if !report.lowered.is_empty() {
        report.redirected = redirect_outer_references(unit, options);
    }
    for diagnostic in &report.diagnostics {
        tracing::warn!(%diagnostic, "lowering left code as written");
    }
    tracing::debug!(
        lowered = report.lowered.len(),
        redirected = report.redirected,
        "iterator lowering finished"
    );
    report
}

/// Overloads share a base name; later ones get `$2`, `$3`, ...
fn unique_name(taken: &mut HashSet<String>, base: String) -> String {
    let mut name = base.clone();
    let mut n = 2;
    while taken.contains(&name) {
        name = format!("{base}${n}");
        n += 1;
    }
    taken.insert(name.clone());
    name
}
