// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Value-or-empty cell.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

use crate::error::{Exception, Result};

/// The empty literal. Every `Nullable<T>` that has no value equals it,
/// whatever `T` is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Null;

/// A `T` that may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Nullable<T> {
    value: Option<T>,
}

impl<T> Nullable<T> {
    pub const fn new(value: T) -> Self {
        Self { value: Some(value) }
    }

    pub const fn null() -> Self {
        Self { value: None }
    }

    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Strict read.
    pub fn value(&self) -> Result<T>
    where
        T: Clone,
    {
        self.value
            .clone()
            .ok_or_else(|| Exception::invalid_operation("nullable object must have a value"))
    }

    pub fn get_value_or_default(&self) -> T
    where
        T: Clone + Default,
    {
        self.value.clone().unwrap_or_default()
    }

    pub fn get_value_or(&self, fallback: T) -> T
    where
        T: Clone,
    {
        self.value.clone().unwrap_or(fallback)
    }

    pub fn as_option(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Widen the underlying value; empty stays empty.
    pub fn convert<U: From<T>>(self) -> Nullable<U> {
        Nullable { value: self.value.map(U::from) }
    }

    /// Lifted comparison: `None` when either side is empty, so every
    /// ordering test against an empty cell is false.
    pub fn compare(&self, other: &Self) -> Option<Ordering>
    where
        T: PartialOrd,
    {
        match (&self.value, &other.value) {
            (Some(a), Some(b)) => a.partial_cmp(b),
            _ => None,
        }
    }

    pub fn lt(&self, other: &Self) -> bool
    where
        T: PartialOrd,
    {
        self.compare(other) == Some(Ordering::Less)
    }

    pub fn gt(&self, other: &Self) -> bool
    where
        T: PartialOrd,
    {
        self.compare(other) == Some(Ordering::Greater)
    }

    pub fn le(&self, other: &Self) -> bool
    where
        T: PartialOrd,
    {
        matches!(self.compare(other), Some(Ordering::Less | Ordering::Equal))
    }

    pub fn ge(&self, other: &Self) -> bool
    where
        T: PartialOrd,
    {
        matches!(self.compare(other), Some(Ordering::Greater | Ordering::Equal))
    }

    fn lift<U>(self, other: Nullable<T>, op: impl FnOnce(T, T) -> U) -> Nullable<U> {
        match (self.value, other.value) {
            (Some(a), Some(b)) => Nullable::new(op(a, b)),
            _ => Nullable::null(),
        }
    }
}

impl<T> Default for Nullable<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> From<Option<T>> for Nullable<T> {
    fn from(value: Option<T>) -> Self {
        Self { value }
    }
}

impl<T> From<Null> for Nullable<T> {
    fn from(_: Null) -> Self {
        Self::null()
    }
}

impl<T> From<Nullable<T>> for Option<T> {
    fn from(cell: Nullable<T>) -> Self {
        cell.value
    }
}

impl<T> PartialEq<Null> for Nullable<T> {
    fn eq(&self, _: &Null) -> bool {
        self.value.is_none()
    }
}

impl<T> PartialEq<Nullable<T>> for Null {
    fn eq(&self, other: &Nullable<T>) -> bool {
        other.value.is_none()
    }
}

macro_rules! lifted_op {
    ($trait:ident, $method:ident) => {
        impl<T: $trait<Output = T>> $trait for Nullable<T> {
            type Output = Nullable<T>;

            fn $method(self, rhs: Self) -> Nullable<T> {
                self.lift(rhs, T::$method)
            }
        }
    };
}

lifted_op!(Add, add);
lifted_op!(Sub, sub);
lifted_op!(Mul, mul);
lifted_op!(Div, div);

/// Empty cells print as the empty string.
impl<T: fmt::Display> fmt::Display for Nullable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{v}"),
            None => Ok(()),
        }
    }
}
