// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Runtime errors.
//!
//! An `Exception` is a shared handle: cloning it yields the *same* exception,
//! which `Exception::ptr_eq` can tell apart from an equal-looking new one.
//! A faulted `Lazy` relies on this to surface one exception on every read.

use std::fmt;
use std::rc::Rc;

use thiserror::Error;

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// Operation not valid in the object's current state (empty nullable,
    /// empty queue, enumerator not positioned).
    #[error("{0}")]
    InvalidOperation(String),

    #[error("an item with the same key has already been added: {0}")]
    DuplicateKey(String),

    #[error("the given key was not present in the dictionary: {0}")]
    KeyNotFound(String),

    #[error("argument mismatch: {0}")]
    ArgumentMismatch(String),

    #[error("argument out of range: {0}")]
    ArgumentOutOfRange(String),

    #[error("recursive access to a lazy value during its own initialization")]
    RecursiveInitialization,

    #[error("no member `{member}` on `{ty}`")]
    MissingMember { ty: String, member: String },

    #[error("not supported: {0}")]
    NotSupported(String),

    /// Raised by user code (factories, constructors, observer delegates).
    #[error("{0}")]
    User(String),
}

/// A raised error. Cheap to clone; clones share identity.
#[derive(Clone, Error)]
#[error("{kind}")]
pub struct Exception {
    kind: Rc<ErrorKind>,
}

pub type Result<T> = std::result::Result<T, Exception>;

impl Exception {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind: Rc::new(kind) }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Whether both handles refer to the same raised exception.
    pub fn ptr_eq(a: &Exception, b: &Exception) -> bool {
        Rc::ptr_eq(&a.kind, &b.kind)
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidOperation(message.into()))
    }

    pub fn argument_mismatch(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ArgumentMismatch(message.into()))
    }

    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotSupported(message.into()))
    }

    pub fn user(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::User(message.into()))
    }
}

impl From<ErrorKind> for Exception {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Debug for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Exception").field(&*self.kind).finish()
    }
}
