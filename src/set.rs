//! An ordered set implemented with an AVL tree.

use std::borrow::Borrow;
use std::fmt;
use std::iter::{FromIterator, FusedIterator};
use std::ops::{Bound, Index, RangeBounds};

use crate::arena::{Generation, Link, NodeId};
use crate::cursor::{Cursor, CursorMut};
use crate::error::AvlError;
use crate::tree::RawTree;

/// An ordered set implemented with an AVL tree.
///
/// Besides the usual set operations, elements can be addressed by
/// [`Position`]: a small copyable handle that stays valid while other
/// elements are inserted or erased.
///
/// ```
/// use avl_set::AvlTreeSet;
/// let mut set = AvlTreeSet::new();
/// for value in [5, 3, 4, 10, 20, 30] {
///     set.insert(value);
/// }
/// let next = set.erase(set.find(&10));
/// assert_eq!(set.value_at(next), Some(&20));
/// assert!(set.iter().eq([3, 4, 5, 20, 30].iter()));
/// ```
pub struct AvlTreeSet<T> {
    tree: RawTree<T>,
}

/// A handle to an element of an [`AvlTreeSet`], or to its end.
///
/// The end position sits both after the largest and before the smallest
/// element: stepping forward from it yields [`begin`], stepping backward
/// yields [`rbegin`]. Two positions are equal iff they name the same element
/// (or both name the end).
///
/// Positions do not borrow the set. A position stays valid until its element
/// is erased or the set is cleared or cloned over; positions to other
/// elements are not affected by inserts and erases. Using a position with a set other than the
/// one that produced it is a logic error: it never causes undefined behavior,
/// but the result is unspecified.
///
/// [`begin`]: AvlTreeSet::begin
/// [`rbegin`]: AvlTreeSet::rbegin
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    handle: Option<Handle>,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct Handle {
    id: NodeId,
    generation: Generation,
}

impl Position {
    /// Returns true if this is the end position.
    pub fn is_end(&self) -> bool {
        self.handle.is_none()
    }

    pub(crate) fn from_link<T>(tree: &RawTree<T>, link: Link) -> Self {
        Self {
            handle: link.map(|id| Handle {
                id,
                generation: tree.generation(id),
            }),
        }
    }

    /// Resolves to a link, or `None` if the element has been erased.
    pub(crate) fn to_link<T>(self, tree: &RawTree<T>) -> Option<Link> {
        match self.handle {
            None => Some(None),
            Some(handle) if tree.is_live(handle.id, handle.generation) => Some(Some(handle.id)),
            Some(_) => None,
        }
    }

    pub(crate) fn expect_link<T>(self, tree: &RawTree<T>) -> Link {
        match self.to_link(tree) {
            Some(link) => link,
            None => panic!("position refers to an erased element"),
        }
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.handle {
            None => write!(f, "Position(end)"),
            Some(handle) => write!(f, "Position({:?}@{})", handle.id, handle.generation),
        }
    }
}

/// An iterator over the values of a set.
pub struct Iter<'a, T> {
    tree: &'a RawTree<T>,
    front: Link,
    back: Link,
    len: usize,
}

/// An iterator over a range of values of a set.
pub struct Range<'a, T> {
    tree: &'a RawTree<T>,
    front: Link,
    back: Link,
}

/// An owning iterator over the values of a set.
pub struct IntoIter<T> {
    set: AvlTreeSet<T>,
}

impl<T> AvlTreeSet<T> {
    /// Creates an empty set.
    /// No memory is allocated until the first item is inserted.
    pub const fn new() -> Self {
        Self {
            tree: RawTree::new(),
        }
    }

    /// Returns true if the set contains no elements.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the number of elements in the set.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Clears the set, deallocating all memory.
    /// All positions except [`end`](Self::end) are invalidated.
    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Exchanges the contents of two sets in constant time.
    ///
    /// Positions follow the elements they name into the other set.
    pub fn swap(&mut self, other: &mut Self) {
        self.tree.swap(&mut other.tree);
    }

    /// Returns the position of the smallest element, or the end position if
    /// the set is empty.
    pub fn begin(&self) -> Position {
        Position::from_link(&self.tree, self.tree.first())
    }

    /// Returns the end position.
    pub fn end(&self) -> Position {
        Position { handle: None }
    }

    /// Returns the position of the largest element, or the end position if
    /// the set is empty. Walking from here with [`predecessor`](Self::predecessor)
    /// until [`rend`](Self::rend) visits the set in descending order.
    pub fn rbegin(&self) -> Position {
        Position::from_link(&self.tree, self.tree.last())
    }

    /// Returns the end position, which also terminates a descending walk.
    pub fn rend(&self) -> Position {
        self.end()
    }

    /// Returns the position of the element following `pos` in ascending
    /// order. The successor of the largest element is the end position; the
    /// successor of the end position is [`begin`](Self::begin).
    ///
    /// # Panics
    ///
    /// Panics if `pos` refers to an erased element.
    pub fn successor(&self, pos: Position) -> Position {
        let link = pos.expect_link(&self.tree);
        Position::from_link(&self.tree, self.tree.next(link))
    }

    /// Returns the position of the element preceding `pos` in ascending
    /// order. The predecessor of the smallest element is the end position; the
    /// predecessor of the end position is [`rbegin`](Self::rbegin).
    ///
    /// # Panics
    ///
    /// Panics if `pos` refers to an erased element.
    pub fn predecessor(&self, pos: Position) -> Position {
        let link = pos.expect_link(&self.tree);
        Position::from_link(&self.tree, self.tree.prev(link))
    }

    /// Returns the value at `pos`, or `None` for the end position and for
    /// positions whose element has been erased.
    pub fn value_at(&self, pos: Position) -> Option<&T> {
        match pos.to_link(&self.tree) {
            Some(Some(id)) => Some(self.tree.key(id)),
            _ => None,
        }
    }

    /// Erases the element at `pos`.
    /// Returns the position of the element that followed it, or the end
    /// position if the erased element was the largest.
    ///
    /// # Panics
    ///
    /// Panics if `pos` is the end position or refers to an erased element.
    pub fn erase(&mut self, pos: Position) -> Position {
        match pos.expect_link(&self.tree) {
            Some(id) => {
                let (_, next) = self.tree.remove_node(id);
                Position::from_link(&self.tree, next)
            }
            None => panic!("cannot erase the end position"),
        }
    }

    /// Returns a reference to the smallest value in the set.
    pub fn first(&self) -> Option<&T> {
        self.tree.first().map(|id| self.tree.key(id))
    }

    /// Returns a reference to the largest value in the set.
    pub fn last(&self) -> Option<&T> {
        self.tree.last().map(|id| self.tree.key(id))
    }

    /// Removes and returns the smallest value in the set.
    pub fn pop_first(&mut self) -> Option<T> {
        let id = self.tree.first()?;
        Some(self.tree.remove_node(id).0)
    }

    /// Removes and returns the largest value in the set.
    pub fn pop_last(&mut self) -> Option<T> {
        let id = self.tree.last()?;
        Some(self.tree.remove_node(id).0)
    }

    /// Returns a cursor pointing at `pos`.
    ///
    /// # Panics
    ///
    /// Panics if `pos` refers to an erased element.
    pub fn cursor(&self, pos: Position) -> Cursor<'_, T> {
        let link = pos.expect_link(&self.tree);
        Cursor::new(&self.tree, link)
    }

    /// Returns a cursor pointing at the smallest element.
    pub fn cursor_front(&self) -> Cursor<'_, T> {
        Cursor::new(&self.tree, self.tree.first())
    }

    /// Returns a cursor pointing at the largest element.
    pub fn cursor_back(&self) -> Cursor<'_, T> {
        Cursor::new(&self.tree, self.tree.last())
    }

    /// Returns a cursor pointing at `pos` that can erase elements.
    ///
    /// # Panics
    ///
    /// Panics if `pos` refers to an erased element.
    pub fn cursor_mut(&mut self, pos: Position) -> CursorMut<'_, T> {
        let link = pos.expect_link(&self.tree);
        CursorMut::new(&mut self.tree, link)
    }

    /// Gets an iterator over the values of the set in ascending order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            tree: &self.tree,
            front: self.tree.first(),
            back: self.tree.last(),
            len: self.tree.len(),
        }
    }
}

impl<T: Ord> AvlTreeSet<T> {
    /// Inserts a value into the set.
    ///
    /// Returns the position of the value and whether it was newly inserted.
    /// If an equal value is present the set is not modified and its position
    /// is returned together with `false`.
    pub fn insert(&mut self, value: T) -> (Position, bool) {
        let (id, inserted) = self.tree.insert(value);
        (Position::from_link(&self.tree, Some(id)), inserted)
    }

    /// Inserts a value into the set, reporting allocation failure instead of
    /// aborting. On error the set is unchanged.
    ///
    /// ```
    /// use avl_set::AvlTreeSet;
    /// let mut set = AvlTreeSet::new();
    /// let (pos, inserted) = set.try_insert(7)?;
    /// assert!(inserted);
    /// assert_eq!(set[pos], 7);
    /// # Ok::<(), avl_set::AvlError>(())
    /// ```
    pub fn try_insert(&mut self, value: T) -> Result<(Position, bool), AvlError> {
        let (id, inserted) = self.tree.try_insert(value)?;
        Ok((Position::from_link(&self.tree, Some(id)), inserted))
    }

    /// Returns the position of the value equal to `value`, or the end
    /// position if there is none.
    ///
    /// The value may be any borrowed form of the set's value type, but the ordering
    /// on the borrowed form *must* match the ordering on the value type.
    pub fn find<Q>(&self, value: &Q) -> Position
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Position::from_link(&self.tree, self.tree.find(value))
    }

    /// Returns the position of the smallest value not less than `value`, or
    /// the end position if there is none.
    pub fn lower_bound<Q>(&self, value: &Q) -> Position
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Position::from_link(&self.tree, self.tree.lower_bound(value))
    }

    /// Returns the position of the smallest value greater than `value`, or
    /// the end position if there is none.
    pub fn upper_bound<Q>(&self, value: &Q) -> Position
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Position::from_link(&self.tree, self.tree.upper_bound(value))
    }

    /// Returns a reference to the value in the set that is equal to the given value.
    ///
    /// The value may be any borrowed form of the set's value type, but the ordering
    /// on the borrowed form *must* match the ordering on the value type.
    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.find(value).map(|id| self.tree.key(id))
    }

    /// Returns true if the set contains a value.
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.find(value).is_some()
    }

    /// Removes a value from the set.
    /// Returns whether the value was previously in the set.
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.take(value).is_some()
    }

    /// Removes a value from the set.
    /// Returns the value if it was previously in the set.
    pub fn take<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let id = self.tree.find(value)?;
        Some(self.tree.remove_node(id).0)
    }

    /// Gets an iterator over a sub-range of values in the set in sorted order.
    ///
    /// The value may be any borrowed form of the set's value type, but the ordering
    /// on the borrowed form *must* match the ordering on the value type.
    ///
    /// # Panics
    ///
    /// Panics if range `start > end`.
    /// Panics if range `start == end` and both bounds are `Excluded`.
    pub fn range<Q, R>(&self, range: R) -> Range<'_, T>
    where
        T: Borrow<Q>,
        R: RangeBounds<Q>,
        Q: Ord + ?Sized,
    {
        match (range.start_bound(), range.end_bound()) {
            (Bound::Excluded(start), Bound::Excluded(end)) if start == end => {
                panic!("range start and end are equal and excluded in AvlTreeSet")
            }
            (
                Bound::Included(start) | Bound::Excluded(start),
                Bound::Included(end) | Bound::Excluded(end),
            ) if start > end => {
                panic!("range start is greater than range end in AvlTreeSet")
            }
            _ => {}
        }

        let front = match range.start_bound() {
            Bound::Included(start) => self.tree.lower_bound(start),
            Bound::Excluded(start) => self.tree.upper_bound(start),
            Bound::Unbounded => self.tree.first(),
        };
        let back = match range.end_bound() {
            Bound::Included(end) => self.tree.prev(self.tree.upper_bound(end)),
            Bound::Excluded(end) => self.tree.prev(self.tree.lower_bound(end)),
            Bound::Unbounded => self.tree.last(),
        };

        // An empty range leaves the back bound just before the front bound
        let is_empty = match (front, back) {
            (Some(front_id), Some(back_id)) => self.tree.key(front_id) > self.tree.key(back_id),
            _ => true,
        };
        if is_empty {
            Range {
                tree: &self.tree,
                front: None,
                back: None,
            }
        } else {
            Range {
                tree: &self.tree,
                front,
                back,
            }
        }
    }

    /// Asserts that the internal tree structure is consistent.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        self.tree.check_consistency()
    }

    #[cfg(test)]
    pub(crate) fn height(&self) -> usize {
        self.tree.height()
    }
}

impl<T: Clone> AvlTreeSet<T> {
    /// Creates a deep copy of the set, reporting allocation failure instead
    /// of aborting.
    pub fn try_clone(&self) -> Result<Self, AvlError> {
        Ok(Self {
            tree: self.tree.try_clone()?,
        })
    }

    /// Replaces the contents of `self` with a deep copy of `source`.
    ///
    /// The copy is built completely before `self` is touched, so on error
    /// `self` keeps its previous contents.
    pub fn try_clone_from(&mut self, source: &Self) -> Result<(), AvlError> {
        let copy = source.tree.try_clone()?;
        self.tree.replace(copy);
        Ok(())
    }
}

impl<T: Clone> Clone for AvlTreeSet<T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree.clone(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.tree.replace(source.tree.clone());
    }
}

impl<T> Default for AvlTreeSet<T> {
    /// Creates an empty set.
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<Position> for AvlTreeSet<T> {
    type Output = T;

    /// # Panics
    ///
    /// Panics if `pos` is the end position or refers to an erased element.
    fn index(&self, pos: Position) -> &T {
        match pos.expect_link(&self.tree) {
            Some(id) => self.tree.key(id),
            None => panic!("cannot dereference the end position"),
        }
    }
}

impl<T: PartialEq> PartialEq for AvlTreeSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for AvlTreeSet<T> {}

impl<T: Ord> FromIterator<T> for AvlTreeSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl<T: fmt::Debug> fmt::Debug for AvlTreeSet<T> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, T> IntoIterator for &'a AvlTreeSet<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> IntoIterator for AvlTreeSet<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;
    fn into_iter(self) -> Self::IntoIter {
        IntoIter { set: self }
    }
}

impl<T: Ord> Extend<T> for AvlTreeSet<T> {
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = T>,
    {
        iter.into_iter().for_each(move |value| {
            self.insert(value);
        });
    }
}

impl<'a, T> Extend<&'a T> for AvlTreeSet<T>
where
    T: Ord + Copy + 'a,
{
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = &'a T>,
    {
        self.extend(iter.into_iter().copied());
    }
}

// Auto derived clone seems to have an invalid type bound of T: Clone
impl<'a, T> Clone for Iter<'a, T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            front: self.front,
            back: self.back,
            len: self.len,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let id = self.front?;
        self.front = self.tree.successor(id);
        self.len -= 1;
        Some(self.tree.key(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let id = self.back?;
        self.back = self.tree.predecessor(id);
        self.len -= 1;
        Some(self.tree.key(id))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<'a, T> Range<'a, T> {
    fn advance(&mut self, id: NodeId) {
        if self.front == self.back {
            self.front = None;
            self.back = None;
        } else if self.front == Some(id) {
            self.front = self.tree.successor(id);
        } else {
            self.back = self.tree.predecessor(id);
        }
    }
}

// Auto derived clone seems to have an invalid type bound of T: Clone
impl<'a, T> Clone for Range<'a, T> {
    fn clone(&self) -> Self {
        Self {
            tree: self.tree,
            front: self.front,
            back: self.back,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Range<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, T> Iterator for Range<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.front?;
        self.advance(id);
        Some(self.tree.key(id))
    }
}

impl<'a, T> DoubleEndedIterator for Range<'a, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        let id = self.back?;
        self.advance(id);
        Some(self.tree.key(id))
    }
}

impl<T> FusedIterator for Range<'_, T> {}

impl<T: fmt::Debug> fmt::Debug for IntoIter<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list().entries(self.set.iter()).finish()
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.set.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.set.len(), Some(self.set.len()))
    }
}

impl<T> DoubleEndedIterator for IntoIter<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.set.pop_last()
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}

impl<T> FusedIterator for IntoIter<T> {}
