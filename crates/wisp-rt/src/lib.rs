// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Runtime library for translated programs.
//!
//! Everything here runs on the host's single thread: shared state uses
//! `Rc`/`RefCell`, and nothing blocks.
//!
//! Components:
//! - error — `Exception` and the error taxonomy every API reports
//! - value — dynamic values and objects used by reflection and the evaluator
//! - nullable — value-or-empty cell with lifted operators
//! - lazy — once-initialized cell with fault caching and reentrancy guard
//! - dictionary — insertion-ordered map over the key type's own equality
//! - queue — FIFO collection
//! - enumerator — the MoveNext/Current protocol
//! - reflect — type descriptors, constructors, activation
//! - observer — push sequences: observers, disposables, subjects

pub mod dictionary;
pub mod enumerator;
pub mod error;
pub mod lazy;
pub mod nullable;
pub mod observer;
pub mod queue;
pub mod reflect;
pub mod value;

pub use dictionary::{ByIdentity, Dictionary};
pub use enumerator::{Enumerator, SeqEnumerator};
pub use error::{ErrorKind, Exception, Result};
pub use lazy::Lazy;
pub use nullable::{Null, Nullable};
pub use observer::{Disposable, Observer, ObserverState, Subject};
pub use queue::Queue;
pub use reflect::{Activator, ConstructorInfo, ParameterInfo, TypeBuilder, TypeId, TypeRef, TypeRegistry};
pub use value::{ObjectRef, Value};
