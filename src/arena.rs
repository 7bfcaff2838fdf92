//! Slot storage for tree nodes.
//!
//! Nodes live in a single `Vec` and refer to each other by index. Removed
//! nodes leave a vacant slot that is chained into an intrusive free list and
//! reused by the next insert. Each slot carries a generation that is bumped
//! whenever its node is removed, so a handle to a removed node can be told
//! apart from the node that later reuses the slot. The arena itself carries an
//! epoch that is bumped whenever all slots are dropped at once.

use std::collections::TryReserveError;
use std::fmt;
use std::mem;
use std::ops::{Index, IndexMut};

/// Index of a node slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

/// A parent or child link. `None` is the end sentinel.
pub(crate) type Link = Option<NodeId>;

/// The arena epoch and slot generation a node was stored under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct Generation {
    epoch: u32,
    slot: u32,
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}", self.epoch, self.slot)
    }
}

pub(crate) struct Node<T> {
    pub(crate) key: T,
    pub(crate) height: usize,
    pub(crate) left: Link,
    pub(crate) right: Link,
    pub(crate) parent: Link,
}

impl<T> Node<T> {
    pub(crate) fn leaf(key: T, parent: Link) -> Self {
        Self {
            key,
            height: 1,
            left: None,
            right: None,
            parent,
        }
    }
}

enum Entry<T> {
    Occupied(Node<T>),
    Vacant { next_free: Link },
}

struct Slot<T> {
    generation: u32,
    entry: Entry<T>,
}

pub(crate) struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: Link,
    len: usize,
    epoch: u32,
}

#[cfg(test)]
thread_local! {
    static FAIL_NEXT_RESERVE: std::cell::Cell<bool> = const { std::cell::Cell::new(false) };
}

/// Makes the next slot reservation on this thread fail.
#[cfg(test)]
pub(crate) fn fail_next_reserve() {
    FAIL_NEXT_RESERVE.with(|fail| fail.set(true));
}

#[cfg(test)]
fn requested(additional: usize) -> usize {
    if FAIL_NEXT_RESERVE.with(|fail| fail.replace(false)) {
        usize::MAX
    } else {
        additional
    }
}

#[cfg(not(test))]
fn requested(additional: usize) -> usize {
    additional
}

impl<T> Arena<T> {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
            epoch: 0,
        }
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_head: None,
            len: 0,
            epoch: 0,
        }
    }

    pub(crate) fn try_with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        let mut slots = Vec::new();
        slots.try_reserve_exact(requested(capacity))?;
        Ok(Self {
            slots,
            free_head: None,
            len: 0,
            epoch: 0,
        })
    }

    /// Returns the number of occupied slots.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Makes sure the next `insert` will not have to grow the slot vector.
    pub(crate) fn try_reserve_one(&mut self) -> Result<(), TryReserveError> {
        if self.free_head.is_none() {
            self.slots.try_reserve(requested(1))?;
        }
        Ok(())
    }

    pub(crate) fn insert(&mut self, node: Node<T>) -> NodeId {
        self.len += 1;
        match self.free_head {
            Some(id) => {
                let slot = &mut self.slots[id.0];
                let next_free = match slot.entry {
                    Entry::Vacant { next_free } => next_free,
                    Entry::Occupied(_) => {
                        unreachable!("free list points at occupied slot {}", id.0)
                    }
                };
                slot.entry = Entry::Occupied(node);
                self.free_head = next_free;
                id
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: Entry::Occupied(node),
                });
                NodeId(self.slots.len() - 1)
            }
        }
    }

    pub(crate) fn remove(&mut self, id: NodeId) -> Node<T> {
        let vacant = Entry::Vacant {
            next_free: self.free_head,
        };
        let slot = &mut self.slots[id.0];
        match mem::replace(&mut slot.entry, vacant) {
            Entry::Occupied(node) => {
                slot.generation = slot.generation.wrapping_add(1);
                self.free_head = Some(id);
                self.len -= 1;
                node
            }
            Entry::Vacant { .. } => unreachable!("removing vacant slot {}", id.0),
        }
    }

    /// Drops every node and releases the slot storage. Starts a new epoch,
    /// so handles taken before stay dead once their slots are reused.
    pub(crate) fn clear(&mut self) {
        self.slots = Vec::new();
        self.free_head = None;
        self.len = 0;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Moves this arena to the epoch after `previous`, for an arena that is
    /// about to take the place of `previous`.
    pub(crate) fn succeed(&mut self, previous: &Self) {
        self.epoch = previous.epoch.wrapping_add(1);
    }

    pub(crate) fn generation(&self, id: NodeId) -> Generation {
        Generation {
            epoch: self.epoch,
            slot: self.slots[id.0].generation,
        }
    }

    /// Returns whether `id` names an occupied slot of the given generation.
    pub(crate) fn is_live(&self, id: NodeId, generation: Generation) -> bool {
        if generation.epoch != self.epoch {
            return false;
        }
        match self.slots.get(id.0) {
            Some(slot) => {
                slot.generation == generation.slot && matches!(slot.entry, Entry::Occupied(_))
            }
            None => false,
        }
    }
}

impl<T> Index<NodeId> for Arena<T> {
    type Output = Node<T>;

    fn index(&self, id: NodeId) -> &Node<T> {
        match &self.slots[id.0].entry {
            Entry::Occupied(node) => node,
            Entry::Vacant { .. } => panic!("vacant node slot {}", id.0),
        }
    }
}

impl<T> IndexMut<NodeId> for Arena<T> {
    fn index_mut(&mut self, id: NodeId) -> &mut Node<T> {
        match &mut self.slots[id.0].entry {
            Entry::Occupied(node) => node,
            Entry::Vacant { .. } => panic!("vacant node slot {}", id.0),
        }
    }
}
