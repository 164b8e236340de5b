use std::collections::VecDeque;
use std::hash::Hash;

use hashbrown::HashSet;

/// FIFO queue that holds each key at most once.
#[derive(Debug)]
pub(crate) struct UniqueQueue<T> {
    order: VecDeque<T>,
    members: HashSet<T>,
}

impl<T> Default for UniqueQueue<T> {
    fn default() -> Self {
        Self {
            order: VecDeque::new(),
            members: HashSet::new(),
        }
    }
}

impl<T: Copy + Eq + Hash> UniqueQueue<T> {
    /// Returns false when `item` is already queued.
    pub fn push(&mut self, item: T) -> bool {
        if !self.members.insert(item) {
            return false;
        }
        self.order.push_back(item);
        true
    }

    pub fn pop(&mut self) -> Option<T> {
        let item = self.order.pop_front()?;
        self.members.remove(&item);
        Some(item)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }
}
