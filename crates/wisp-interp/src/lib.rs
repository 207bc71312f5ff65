// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Tree-walk evaluator for translated programs.
//!
//! Executes a unit directly, with `wisp-rt` values and reflection. Generator
//! methods must be lowered first; [`Interpreter::load_lowered`] does both.

mod env;
mod interp;

pub use interp::{HostFn, Interpreter, RuntimeError};
