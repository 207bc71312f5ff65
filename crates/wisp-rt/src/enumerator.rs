// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The pull-based enumerator protocol.
//!
//! `move_next` advances and reports whether a value is available;
//! `current` reads it. Generated state holders implement the same protocol
//! as ordinary methods.

use crate::error::{Exception, Result};

pub trait Enumerator {
    type Item;

    fn move_next(&mut self) -> Result<bool>;

    /// The value at the current position. Fails before the first
    /// `move_next` and after the sequence ends.
    fn current(&self) -> Result<Self::Item>;

    fn reset(&mut self) -> Result<()> {
        Err(Exception::not_supported("this enumerator cannot be reset"))
    }

    fn dispose(&mut self) {}

    /// Drain the remaining values.
    fn collect_remaining(&mut self) -> Result<Vec<Self::Item>>
    where
        Self: Sized,
    {
        let mut out = Vec::new();
        while self.move_next()? {
            out.push(self.current()?);
        }
        Ok(out)
    }
}

enum Position<T> {
    BeforeFirst,
    At(T),
    Finished,
}

/// Adapts a Rust iterator to the enumerator protocol.
pub struct SeqEnumerator<I: Iterator> {
    iter: I,
    position: Position<I::Item>,
}

impl<I: Iterator> SeqEnumerator<I> {
    pub fn new(iter: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            iter: iter.into_iter(),
            position: Position::BeforeFirst,
        }
    }
}

impl<I> Enumerator for SeqEnumerator<I>
where
    I: Iterator,
    I::Item: Clone,
{
    type Item = I::Item;

    fn move_next(&mut self) -> Result<bool> {
        if matches!(self.position, Position::Finished) {
            return Ok(false);
        }
        self.position = match self.iter.next() {
            Some(item) => Position::At(item),
            None => Position::Finished,
        };
        Ok(matches!(self.position, Position::At(_)))
    }

    fn current(&self) -> Result<I::Item> {
        match &self.position {
            Position::At(item) => Ok(item.clone()),
            Position::BeforeFirst => Err(Exception::invalid_operation("enumeration has not started")),
            Position::Finished => Err(Exception::invalid_operation("enumeration already finished")),
        }
    }

    fn dispose(&mut self) {
        self.position = Position::Finished;
    }
}
