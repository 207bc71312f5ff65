// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Member names of the enumerator protocol.
//!
//! Generated state holders expose these; `foreach` lowering and the host
//! call them.

pub const MOVE_NEXT: &str = "MoveNext";
pub const CURRENT: &str = "Current";
pub const RESET: &str = "Reset";
pub const DISPOSE: &str = "Dispose";
pub const GET_ENUMERATOR: &str = "GetEnumerator";

/// `$state` value of an enumerator that has run to completion.
pub const FINISHED: i64 = -1;
