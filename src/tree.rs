use std::borrow::Borrow;
use std::cmp::{self, Ordering};
use std::collections::TryReserveError;
use std::mem;

use crate::arena::{Arena, Generation, Link, Node, NodeId};

/// The AVL tree behind `AvlTreeSet`.
///
/// Nodes are addressed by `NodeId` within the tree's own arena. The `None`
/// link doubles as the end sentinel: it is the parent of the root, what
/// `successor` returns after the maximum and what `predecessor` returns
/// before the minimum.
pub(crate) struct RawTree<T> {
    nodes: Arena<T>,
    root: Link,
    first: Link,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

enum InsertPos {
    Occupied(NodeId),
    Vacant { parent: Link, side: Side },
}

#[allow(clippy::enum_variant_names)]
enum Direction {
    FromParent,
    FromLeft,
    FromRight,
}

impl<T> RawTree<T> {
    pub(crate) const fn new() -> Self {
        Self {
            nodes: Arena::new(),
            root: None,
            first: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    #[cfg(test)]
    pub(crate) fn height(&self) -> usize {
        self.height_of(self.root)
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
        self.first = None;
    }

    pub(crate) fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Replaces this tree with `other`. Handles into the old tree never
    /// resolve in the new one.
    pub(crate) fn replace(&mut self, mut other: Self) {
        other.nodes.succeed(&self.nodes);
        *self = other;
    }

    pub(crate) fn key(&self, id: NodeId) -> &T {
        &self.nodes[id].key
    }

    pub(crate) fn generation(&self, id: NodeId) -> Generation {
        self.nodes.generation(id)
    }

    pub(crate) fn is_live(&self, id: NodeId, generation: Generation) -> bool {
        self.nodes.is_live(id, generation)
    }

    /// Returns the cached minimum node.
    pub(crate) fn first(&self) -> Link {
        self.first
    }

    /// Returns the maximum node.
    pub(crate) fn last(&self) -> Link {
        self.root.map(|root| self.rightmost(root))
    }

    /// Steps forward; the sentinel steps to the minimum.
    pub(crate) fn next(&self, link: Link) -> Link {
        match link {
            None => self.first,
            Some(id) => self.successor(id),
        }
    }

    /// Steps backward; the sentinel steps to the maximum.
    pub(crate) fn prev(&self, link: Link) -> Link {
        match link {
            None => self.last(),
            Some(id) => self.predecessor(id),
        }
    }

    pub(crate) fn successor(&self, id: NodeId) -> Link {
        if let Some(right) = self.nodes[id].right {
            return Some(self.leftmost(right));
        }
        // Ascend until we arrive from a left child
        let mut child = id;
        let mut parent = self.nodes[id].parent;
        while let Some(parent_id) = parent {
            if self.nodes[parent_id].left == Some(child) {
                return Some(parent_id);
            }
            child = parent_id;
            parent = self.nodes[parent_id].parent;
        }
        None
    }

    pub(crate) fn predecessor(&self, id: NodeId) -> Link {
        if let Some(left) = self.nodes[id].left {
            return Some(self.rightmost(left));
        }
        // Ascend until we arrive from a right child
        let mut child = id;
        let mut parent = self.nodes[id].parent;
        while let Some(parent_id) = parent {
            if self.nodes[parent_id].right == Some(child) {
                return Some(parent_id);
            }
            child = parent_id;
            parent = self.nodes[parent_id].parent;
        }
        None
    }

    fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.nodes[id].left {
            id = left;
        }
        id
    }

    fn rightmost(&self, mut id: NodeId) -> NodeId {
        while let Some(right) = self.nodes[id].right {
            id = right;
        }
        id
    }

    /// Unlinks `id` from the tree, rebalances and frees its slot.
    /// Returns the key and the node that followed it in sorted order.
    pub(crate) fn remove_node(&mut self, id: NodeId) -> (T, Link) {
        debug_assert!(self.len() >= 1);
        let next = self.successor(id);
        if self.first == Some(id) {
            self.first = next;
        }
        self.unlink_node(id);
        let node = self.nodes.remove(id);
        (node.key, next)
    }

    fn unlink_node(&mut self, id: NodeId) {
        let (left, right, parent) = {
            let node = &self.nodes[id];
            (node.left, node.right, node.parent)
        };

        // Check if node to-unlink has right sub tree
        if let Some(right_id) = right {
            // Find smallest node in right sub tree
            let min_id = self.leftmost(right_id);

            // Smallest node is stem or leaf, detach it from its parent
            let rebalance_from = if min_id == right_id {
                min_id
            } else {
                let (min_parent, min_right) = {
                    let min = &self.nodes[min_id];
                    (min.parent, min.right)
                };
                if let Some(min_parent_id) = min_parent {
                    self.nodes[min_parent_id].left = min_right;
                }
                if let Some(min_right_id) = min_right {
                    self.nodes[min_right_id].parent = min_parent;
                }
                self.nodes[min_id].right = Some(right_id);
                self.nodes[right_id].parent = Some(min_id);
                match min_parent {
                    Some(min_parent_id) => min_parent_id,
                    None => min_id,
                }
            };

            // Move smallest node into the slot of the node to-unlink
            self.nodes[min_id].left = left;
            if let Some(left_id) = left {
                self.nodes[left_id].parent = Some(min_id);
            }
            self.nodes[min_id].parent = parent;
            self.replace_child(parent, id, Some(min_id));

            self.rebalance(Some(rebalance_from));
        } else {
            // Node to-unlink is stem or leaf, splice in its left child
            if let Some(left_id) = left {
                self.nodes[left_id].parent = parent;
            }
            self.replace_child(parent, id, left);
            // Parent node might be out of balance now
            self.rebalance(parent);
        }
    }

    /// Points the link of `parent` (or the root) that referred to `old` at `new`.
    fn replace_child(&mut self, parent: Link, old: NodeId, new: Link) {
        match parent {
            None => self.root = new,
            Some(parent_id) => {
                let parent_node = &mut self.nodes[parent_id];
                if parent_node.left == Some(old) {
                    parent_node.left = new;
                } else {
                    parent_node.right = new;
                }
            }
        }
    }

    fn height_of(&self, link: Link) -> usize {
        match link {
            None => 0,
            Some(id) => self.nodes[id].height,
        }
    }

    fn fix_height(&mut self, id: NodeId) {
        let node = &self.nodes[id];
        let height = 1 + cmp::max(self.height_of(node.left), self.height_of(node.right));
        self.nodes[id].height = height;
    }

    fn balance_factor(&self, id: NodeId) -> isize {
        let node = &self.nodes[id];
        self.height_of(node.left) as isize - self.height_of(node.right) as isize
    }

    /// Promotes the left child of `id` into its place. Returns the promoted node.
    fn rotate_left_left(&mut self, id: NodeId) -> NodeId {
        let Some(left_id) = self.nodes[id].left else {
            unreachable!("rotating node {:?} without a left child", id);
        };
        let parent = self.nodes[id].parent;

        let crossing = self.nodes[left_id].right;
        self.nodes[id].left = crossing;
        if let Some(crossing_id) = crossing {
            self.nodes[crossing_id].parent = Some(id);
        }

        self.nodes[left_id].parent = parent;
        self.replace_child(parent, id, Some(left_id));

        self.nodes[left_id].right = Some(id);
        self.nodes[id].parent = Some(left_id);

        self.fix_height(id);
        self.fix_height(left_id);
        left_id
    }

    /// Promotes the right child of `id` into its place. Returns the promoted node.
    fn rotate_right_right(&mut self, id: NodeId) -> NodeId {
        let Some(right_id) = self.nodes[id].right else {
            unreachable!("rotating node {:?} without a right child", id);
        };
        let parent = self.nodes[id].parent;

        let crossing = self.nodes[right_id].left;
        self.nodes[id].right = crossing;
        if let Some(crossing_id) = crossing {
            self.nodes[crossing_id].parent = Some(id);
        }

        self.nodes[right_id].parent = parent;
        self.replace_child(parent, id, Some(right_id));

        self.nodes[right_id].left = Some(id);
        self.nodes[id].parent = Some(right_id);

        self.fix_height(id);
        self.fix_height(right_id);
        right_id
    }

    fn rotate_left_right(&mut self, id: NodeId) -> NodeId {
        if let Some(left_id) = self.nodes[id].left {
            self.rotate_right_right(left_id);
        }
        self.rotate_left_left(id)
    }

    fn rotate_right_left(&mut self, id: NodeId) -> NodeId {
        if let Some(right_id) = self.nodes[id].right {
            self.rotate_left_left(right_id);
        }
        self.rotate_right_right(id)
    }

    /// Rebalances nodes starting from given position up to the root node.
    fn rebalance(&mut self, start_from: Link) {
        let mut current = start_from;
        while let Some(id) = current {
            let parent = self.nodes[id].parent;
            self.rebalance_node(id);
            current = parent;
        }
    }

    /// Rebalances nodes starting from given position up to the root node.
    /// Stops after the first rotation, which restores the height the subtree
    /// had before a single insert.
    fn rebalance_once(&mut self, start_from: Link) {
        let mut current = start_from;
        while let Some(id) = current {
            let parent = self.nodes[id].parent;
            if self.rebalance_node(id) {
                break;
            }
            current = parent;
        }
    }

    /// Restores the AVL condition at `id` and adjusts its height.
    /// The balance factor on entry must lie within -2..=2, which always holds
    /// after a single update below. Returns whether a rotation was applied.
    fn rebalance_node(&mut self, id: NodeId) -> bool {
        self.fix_height(id);
        let balance = self.balance_factor(id);
        debug_assert!((-2..=2).contains(&balance));
        let (left, right) = (self.nodes[id].left, self.nodes[id].right);
        if balance > 1 {
            match left {
                Some(left_id) if self.balance_factor(left_id) < 0 => self.rotate_left_right(id),
                _ => self.rotate_left_left(id),
            };
            true
        } else if balance < -1 {
            match right {
                Some(right_id) if self.balance_factor(right_id) > 0 => self.rotate_right_left(id),
                _ => self.rotate_right_right(id),
            };
            true
        } else {
            false
        }
    }

    fn attach(&mut self, parent: Link, side: Side, key: T) -> NodeId {
        let id = self.nodes.insert(Node::leaf(key, parent));
        match parent {
            None => self.root = Some(id),
            Some(parent_id) => match side {
                Side::Left => self.nodes[parent_id].left = Some(id),
                Side::Right => self.nodes[parent_id].right = Some(id),
            },
        }
        // A new minimum always hangs off the left of the old one
        if self.first.is_none() || (side == Side::Left && parent == self.first) {
            self.first = Some(id);
        }
        self.rebalance_once(parent);
        id
    }

    #[cfg(any(test, feature = "consistency_check"))]
    fn traverse<Pre, In, Post>(&self, mut preorder: Pre, mut inorder: In, mut postorder: Post)
    where
        Pre: FnMut(NodeId),
        In: FnMut(NodeId),
        Post: FnMut(NodeId),
    {
        if let Some(mut id) = self.root {
            let mut dir = Direction::FromParent;
            loop {
                match dir {
                    Direction::FromParent => {
                        preorder(id);
                        if let Some(left_id) = self.nodes[id].left {
                            id = left_id;
                        } else {
                            dir = Direction::FromLeft;
                        }
                    }
                    Direction::FromLeft => {
                        inorder(id);
                        if let Some(right_id) = self.nodes[id].right {
                            id = right_id;
                            dir = Direction::FromParent;
                        } else {
                            dir = Direction::FromRight;
                        }
                    }
                    Direction::FromRight => {
                        postorder(id);
                        if let Some(parent_id) = self.nodes[id].parent {
                            if self.nodes[parent_id].left == Some(id) {
                                dir = Direction::FromLeft;
                            } else {
                                dir = Direction::FromRight;
                            }
                            id = parent_id;
                        } else {
                            break;
                        }
                    }
                }
            }
        }
    }

    #[cfg(any(test, feature = "consistency_check"))]
    fn preorder<F: FnMut(NodeId)>(&self, f: F) {
        self.traverse(f, |_| {}, |_| {});
    }
}

impl<T: Ord> RawTree<T> {
    pub(crate) fn find<Q>(&self, key: &Q) -> Link
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut current = self.root;
        while let Some(id) = current {
            let node = &self.nodes[id];
            current = match key.cmp(node.key.borrow()) {
                Ordering::Equal => break,
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
            }
        }
        current
    }

    /// Returns the smallest node whose key is not less than `key`.
    pub(crate) fn lower_bound<Q>(&self, key: &Q) -> Link
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut candidate = None;
        let mut current = self.root;
        while let Some(id) = current {
            let node = &self.nodes[id];
            if key.cmp(node.key.borrow()) == Ordering::Greater {
                current = node.right;
            } else {
                candidate = Some(id);
                current = node.left;
            }
        }
        candidate
    }

    /// Returns the smallest node whose key is greater than `key`.
    pub(crate) fn upper_bound<Q>(&self, key: &Q) -> Link
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut candidate = None;
        let mut current = self.root;
        while let Some(id) = current {
            let node = &self.nodes[id];
            if key.cmp(node.key.borrow()) == Ordering::Less {
                candidate = Some(id);
                current = node.left;
            } else {
                current = node.right;
            }
        }
        candidate
    }

    /// Inserts `key` unless an equal key is present.
    /// Returns the node holding the key and whether it was newly created.
    pub(crate) fn insert(&mut self, key: T) -> (NodeId, bool) {
        match self.find_insert_pos(&key) {
            InsertPos::Occupied(id) => (id, false),
            InsertPos::Vacant { parent, side } => (self.attach(parent, side, key), true),
        }
    }

    /// Like `insert`, but reserves node storage before touching the tree.
    pub(crate) fn try_insert(&mut self, key: T) -> Result<(NodeId, bool), TryReserveError> {
        match self.find_insert_pos(&key) {
            InsertPos::Occupied(id) => Ok((id, false)),
            InsertPos::Vacant { parent, side } => {
                self.nodes.try_reserve_one()?;
                Ok((self.attach(parent, side, key), true))
            }
        }
    }

    fn find_insert_pos(&self, key: &T) -> InsertPos {
        let mut parent = None;
        let mut side = Side::Left;
        let mut current = self.root;
        while let Some(id) = current {
            let node = &self.nodes[id];
            parent = current;
            match key.cmp(&node.key) {
                Ordering::Equal => return InsertPos::Occupied(id),
                Ordering::Less => {
                    side = Side::Left;
                    current = node.left;
                }
                Ordering::Greater => {
                    side = Side::Right;
                    current = node.right;
                }
            }
        }
        InsertPos::Vacant { parent, side }
    }

    /// Asserts that the tree structure is consistent.
    #[cfg(any(test, feature = "consistency_check"))]
    pub(crate) fn check_consistency(&self) {
        // Check root link
        if let Some(root_id) = self.root {
            assert!(self.nodes[root_id].parent.is_none());
        }

        // Check tree nodes
        let mut num_nodes = 0;
        self.preorder(|id| {
            let node = &self.nodes[id];
            let mut left_height = 0;
            let mut right_height = 0;

            // Check link for left child node
            if let Some(left_id) = node.left {
                let left = &self.nodes[left_id];
                assert!(left.parent == Some(id));
                assert!(left.key < node.key);
                left_height = left.height;
            }

            // Check link for right child node
            if let Some(right_id) = node.right {
                let right = &self.nodes[right_id];
                assert!(right.parent == Some(id));
                assert!(right.key > node.key);
                right_height = right.height;
            }

            // Check height
            assert_eq!(node.height, 1 + cmp::max(left_height, right_height));

            // Check AVL condition (nearly balance)
            assert!(left_height <= right_height + 1);
            assert!(right_height <= left_height + 1);

            num_nodes += 1;
        });

        // Check number of nodes
        assert_eq!(num_nodes, self.nodes.len());

        // Check cached minimum
        assert_eq!(self.first, self.root.map(|root_id| self.leftmost(root_id)));
    }
}

impl<T: Clone> RawTree<T> {
    pub(crate) fn try_clone(&self) -> Result<Self, TryReserveError> {
        Ok(self.copy_into(Arena::try_with_capacity(self.len())?))
    }

    /// Copies every node into `nodes`, which must have room for `self.len()`
    /// nodes. Source and copy are walked in lockstep, so parent links of the
    /// copy are rebuilt without any lookup table.
    fn copy_into(&self, mut nodes: Arena<T>) -> Self {
        let Some(src_root) = self.root else {
            return Self {
                nodes,
                root: None,
                first: None,
            };
        };
        let dst_root = nodes.insert(self.copy_node(src_root, None));

        let (mut src, mut dst) = (src_root, dst_root);
        let mut dir = Direction::FromParent;
        loop {
            match dir {
                Direction::FromParent => {
                    if let Some(src_left) = self.nodes[src].left {
                        let dst_left = nodes.insert(self.copy_node(src_left, Some(dst)));
                        nodes[dst].left = Some(dst_left);
                        src = src_left;
                        dst = dst_left;
                    } else {
                        dir = Direction::FromLeft;
                    }
                }
                Direction::FromLeft => {
                    if let Some(src_right) = self.nodes[src].right {
                        let dst_right = nodes.insert(self.copy_node(src_right, Some(dst)));
                        nodes[dst].right = Some(dst_right);
                        src = src_right;
                        dst = dst_right;
                        dir = Direction::FromParent;
                    } else {
                        dir = Direction::FromRight;
                    }
                }
                Direction::FromRight => match (self.nodes[src].parent, nodes[dst].parent) {
                    (Some(src_parent), Some(dst_parent)) => {
                        if self.nodes[src_parent].left == Some(src) {
                            dir = Direction::FromLeft;
                        } else {
                            dir = Direction::FromRight;
                        }
                        src = src_parent;
                        dst = dst_parent;
                    }
                    _ => break,
                },
            }
        }

        let mut first = dst_root;
        while let Some(left) = nodes[first].left {
            first = left;
        }
        Self {
            nodes,
            root: Some(dst_root),
            first: Some(first),
        }
    }

    fn copy_node(&self, id: NodeId, parent: Link) -> Node<T> {
        let node = &self.nodes[id];
        Node {
            key: node.key.clone(),
            height: node.height,
            left: None,
            right: None,
            parent,
        }
    }
}

impl<T: Clone> Clone for RawTree<T> {
    fn clone(&self) -> Self {
        self.copy_into(Arena::with_capacity(self.len()))
    }
}
