//! Cursors over an [`AvlTreeSet`](crate::AvlTreeSet).
//!
//! A cursor points either at an element or at the end position, which lies
//! between the largest and the smallest element. Moving past either end of
//! the set lands on the end position; moving once more wraps around.

use std::fmt;

use crate::arena::Link;
use crate::set::Position;
use crate::tree::RawTree;

/// A cursor with read-only access to a set.
pub struct Cursor<'a, T> {
    tree: &'a RawTree<T>,
    current: Link,
}

/// A cursor that can remove and insert elements.
///
/// It converts into a [`Cursor`] with [`as_cursor`](CursorMut::as_cursor) or
/// `Cursor::from`, but not the other way round.
pub struct CursorMut<'a, T> {
    tree: &'a mut RawTree<T>,
    current: Link,
}

impl<'a, T> Cursor<'a, T> {
    pub(crate) fn new(tree: &'a RawTree<T>, current: Link) -> Self {
        Self { tree, current }
    }

    /// Returns the position the cursor points at.
    pub fn position(&self) -> Position {
        Position::from_link(self.tree, self.current)
    }

    /// Returns true if the cursor points at the end position.
    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    /// Returns the element the cursor points at, or `None` at the end position.
    pub fn current(&self) -> Option<&'a T> {
        let tree = self.tree;
        self.current.map(|id| tree.key(id))
    }

    /// Moves to the next element in ascending order.
    pub fn move_next(&mut self) {
        self.current = self.tree.next(self.current);
    }

    /// Moves to the previous element in ascending order.
    pub fn move_prev(&mut self) {
        self.current = self.tree.prev(self.current);
    }

    /// Returns the element after the current one without moving.
    pub fn peek_next(&self) -> Option<&'a T> {
        let tree = self.tree;
        tree.next(self.current).map(|id| tree.key(id))
    }

    /// Returns the element before the current one without moving.
    pub fn peek_prev(&self) -> Option<&'a T> {
        let tree = self.tree;
        tree.prev(self.current).map(|id| tree.key(id))
    }
}

// Auto derived clone seems to have an invalid type bound of T: Clone
impl<T> Clone for Cursor<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Cursor<'_, T> {}

impl<T> PartialEq for Cursor<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.current == other.current
    }
}

impl<T> Eq for Cursor<'_, T> {}

impl<T> PartialEq<CursorMut<'_, T>> for Cursor<'_, T> {
    fn eq(&self, other: &CursorMut<'_, T>) -> bool {
        self.current == other.current
    }
}

impl<T: fmt::Debug> fmt::Debug for Cursor<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Cursor").field(&self.current()).finish()
    }
}

impl<'a, T> CursorMut<'a, T> {
    pub(crate) fn new(tree: &'a mut RawTree<T>, current: Link) -> Self {
        Self { tree, current }
    }

    /// Returns the position the cursor points at.
    pub fn position(&self) -> Position {
        Position::from_link(self.tree, self.current)
    }

    /// Returns true if the cursor points at the end position.
    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    /// Returns the element the cursor points at, or `None` at the end position.
    pub fn current(&self) -> Option<&T> {
        self.current.map(|id| self.tree.key(id))
    }

    /// Moves to the next element in ascending order.
    pub fn move_next(&mut self) {
        self.current = self.tree.next(self.current);
    }

    /// Moves to the previous element in ascending order.
    pub fn move_prev(&mut self) {
        self.current = self.tree.prev(self.current);
    }

    /// Returns the element after the current one without moving.
    pub fn peek_next(&self) -> Option<&T> {
        self.tree.next(self.current).map(|id| self.tree.key(id))
    }

    /// Returns the element before the current one without moving.
    pub fn peek_prev(&self) -> Option<&T> {
        self.tree.prev(self.current).map(|id| self.tree.key(id))
    }

    /// Returns a read-only cursor at the same position, borrowing this one.
    pub fn as_cursor(&self) -> Cursor<'_, T> {
        Cursor::new(self.tree, self.current)
    }

    /// Removes the current element and moves to the one that followed it.
    /// Returns `None` without doing anything at the end position.
    pub fn remove_current(&mut self) -> Option<T> {
        let id = self.current?;
        let (key, next) = self.tree.remove_node(id);
        self.current = next;
        Some(key)
    }
}

impl<T: Ord> CursorMut<'_, T> {
    /// Inserts a value into the set without moving the cursor.
    /// Returns the position of the value and whether it was newly inserted.
    pub fn insert(&mut self, value: T) -> (Position, bool) {
        let (id, inserted) = self.tree.insert(value);
        (Position::from_link(self.tree, Some(id)), inserted)
    }
}

impl<'a, T> From<CursorMut<'a, T>> for Cursor<'a, T> {
    fn from(cursor: CursorMut<'a, T>) -> Self {
        Cursor::new(cursor.tree, cursor.current)
    }
}

impl<T> PartialEq for CursorMut<'_, T> {
    fn eq(&self, other: &Self) -> bool {
        self.current == other.current
    }
}

impl<T> PartialEq<Cursor<'_, T>> for CursorMut<'_, T> {
    fn eq(&self, other: &Cursor<'_, T>) -> bool {
        self.current == other.current
    }
}

impl<T: fmt::Debug> fmt::Debug for CursorMut<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("CursorMut").field(&self.current()).finish()
    }
}
