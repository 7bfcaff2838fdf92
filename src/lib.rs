//! An ordered set implemented with an AVL tree.
//!
//! [`AvlTreeSet`] keeps unique values in ascending order and supports
//! logarithmic insert, erase, lookup and bound queries. Nodes are stored in
//! an index arena, so the tree needs neither reference counting nor `unsafe`
//! to maintain its parent links.
//!
//! Elements can be addressed by [`Position`], a copyable handle that does not
//! borrow the set. Positions, [`Cursor`]s and the iterators all walk the tree
//! through its parent and child links alone.
//!
//! ```
//! use avl_set::AvlTreeSet;
//!
//! let mut set: AvlTreeSet<i32> = [1, 2, 3, 4].into_iter().collect();
//! set.erase(set.begin());
//! assert!(set.iter().eq([2, 3, 4].iter()));
//!
//! let pos = set.lower_bound(&3);
//! assert_eq!(set[pos], 3);
//! assert_eq!(set.upper_bound(&4), set.end());
//!
//! let mut pos = set.rbegin();
//! let mut descending = Vec::new();
//! while pos != set.rend() {
//!     descending.push(set[pos]);
//!     pos = set.predecessor(pos);
//! }
//! assert_eq!(descending, [4, 3, 2]);
//! ```

#![forbid(unsafe_code)]

mod arena;
mod cursor;
mod error;
mod set;
mod tree;

pub use crate::cursor::{Cursor, CursorMut};
pub use crate::error::AvlError;
pub use crate::set::{AvlTreeSet, IntoIter, Iter, Position, Range};
