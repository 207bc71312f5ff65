// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! FIFO queue.

use std::collections::VecDeque;

use crate::enumerator::SeqEnumerator;
use crate::error::{ErrorKind, Exception, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Queue<T> {
    items: VecDeque<T>,
}

impl<T> Queue<T> {
    pub fn new() -> Self {
        Self { items: VecDeque::new() }
    }

    pub fn enqueue(&mut self, item: T) {
        self.items.push_back(item);
    }

    pub fn dequeue(&mut self) -> Result<T> {
        self.items.pop_front().ok_or_else(empty)
    }

    pub fn peek(&self) -> Result<&T> {
        self.items.front().ok_or_else(empty)
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn contains(&self, item: &T) -> bool
    where
        T: PartialEq,
    {
        self.items.contains(item)
    }

    /// Front to back.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Copy every item, front first, into `dest[index..]`.
    pub fn copy_to(&self, dest: &mut [T], index: usize) -> Result<()>
    where
        T: Clone,
    {
        let end = index
            .checked_add(self.items.len())
            .filter(|&end| end <= dest.len())
            .ok_or_else(|| {
                Exception::new(ErrorKind::ArgumentOutOfRange(format!(
                    "{} item(s) do not fit at index {} of a slice of length {}",
                    self.items.len(),
                    index,
                    dest.len()
                )))
            })?;
        for (slot, item) in dest[index..end].iter_mut().zip(&self.items) {
            *slot = item.clone();
        }
        Ok(())
    }

    /// An enumerator over a snapshot of the current contents.
    pub fn get_enumerator(&self) -> SeqEnumerator<std::vec::IntoIter<T>>
    where
        T: Clone,
    {
        SeqEnumerator::new(self.items.iter().cloned().collect::<Vec<_>>())
    }
}

fn empty() -> Exception {
    Exception::invalid_operation("queue empty")
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for Queue<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self { items: iter.into_iter().collect() }
    }
}
