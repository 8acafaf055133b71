//! # aa-rs
//!
//! An ordered associative container backed by an AA tree (Andersson tree): a
//! red-black-tree variant that keeps a single integer "level" per node
//! instead of color bits, trading slightly slower mutation for simpler
//! rebalancing.
//!
//! The tree stores payloads ordered by an injected comparator, so the same
//! container works as an ordered set, as a map keyed on a field of the
//! payload, or as a plain `Ord`-driven collection via [`Natural`].
//!
//! ## Example
//!
//! ```rust
//! use aa_rs::{AaTree, Natural};
//!
//! let mut tree = AaTree::new(Natural);
//! tree.insert(3);
//! tree.insert(1);
//! tree.insert(2);
//!
//! assert_eq!(tree.get(&2), Some(&2));
//! assert_eq!(tree.iter().copied().collect::<Vec<_>>(), [1, 2, 3]);
//! assert_eq!(tree.remove(&1), Some(1));
//! assert_eq!(tree.len(), 2);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::mem;

// =============================================================================
// Comparator
// =============================================================================

/// Total-order three-way comparison over payloads.
///
/// Injected at construction and fixed for the tree's lifetime; must be pure
/// and consistent. Any `Fn(&T, &T) -> Ordering` closure qualifies.
pub trait Comparator<T> {
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

impl<T, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

/// Comparator that defers to the payload's `Ord` implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Natural;

impl<T: Ord> Comparator<T> for Natural {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.cmp(b)
    }
}

// =============================================================================
// Node model
// =============================================================================

type Link<T> = Option<Box<Node<T>>>;

#[derive(Clone)]
struct Node<T> {
    left: Link<T>,
    right: Link<T>,
    /// Balance bookkeeping: leaves are level 1, increasing toward the root.
    /// An edge between two nodes of equal level is a "horizontal" link.
    level: u32,
    payload: T,
}

impl<T> Node<T> {
    fn leaf(payload: T) -> Box<Self> {
        Box::new(Self {
            left: None,
            right: None,
            level: 1,
            payload,
        })
    }
}

/// Level of a subtree. The empty link is the universal level-0 terminator,
/// which keeps "hit the bottom" and "hit a real node" uniform in the
/// rebalancing arithmetic below.
#[inline]
fn level<T>(link: &Link<T>) -> u32 {
    link.as_deref().map_or(0, |node| node.level)
}

// =============================================================================
// Rotations
// =============================================================================

/// Right rotation removing a left horizontal link: the left child becomes
/// the subtree root, its former right subtree reattaching as the old root's
/// left child.
fn skew<T>(link: &mut Link<T>) {
    let horizontal = match link.as_deref() {
        Some(node) => level(&node.left) == node.level,
        None => false,
    };
    if !horizontal {
        return;
    }

    let mut node = link.take().expect("skew checked a populated link");
    let mut left = node
        .left
        .take()
        .expect("a left horizontal link implies a left child");
    node.left = left.right.take();
    left.right = Some(node);
    *link = Some(left);
}

/// Left rotation removing a doubled right horizontal link: the right child
/// becomes the subtree root and gains a level.
fn split<T>(link: &mut Link<T>) {
    let doubled = match link.as_deref() {
        Some(node) => node
            .right
            .as_deref()
            .map_or(false, |right| level(&right.right) == node.level),
        None => false,
    };
    if !doubled {
        return;
    }

    let mut node = link.take().expect("split checked a populated link");
    let mut right = node
        .right
        .take()
        .expect("a doubled right link implies a right child");
    node.right = right.left.take();
    right.left = Some(node);
    right.level += 1;
    *link = Some(right);
}

// =============================================================================
// Tree container
// =============================================================================

/// Ordered associative container over payloads of type `T`, sorted by a
/// caller-supplied [`Comparator`].
///
/// Balance is maintained with the AA scheme. After every completed mutation:
/// - every leaf has level 1;
/// - a left child's level is exactly one below its parent's;
/// - a right child's level is equal to or one below its parent's;
/// - a right grandchild's level is strictly below its grandparent's;
/// - any node above level 1 has two children.
///
/// Together these bound the height at O(log n), so lookup, insertion, and
/// removal are all logarithmic. All mutation goes through `&mut self`;
/// concurrent use requires external synchronization.
#[derive(Clone)]
pub struct AaTree<T, C = Natural> {
    root: Link<T>,
    size: usize,
    cmp: C,
}

impl<T, C: Comparator<T>> AaTree<T, C> {
    /// Creates an empty tree ordered by `cmp`.
    pub fn new(cmp: C) -> Self {
        Self {
            root: None,
            size: 0,
            cmp,
        }
    }

    /// Number of payloads currently stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Looks up the stored payload comparing equal to `key`.
    ///
    /// Iterative descent, no mutation.
    pub fn get(&self, key: &T) -> Option<&T> {
        let mut cur = self.root.as_deref();
        while let Some(node) = cur {
            cur = match self.cmp.compare(key, &node.payload) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return Some(&node.payload),
            };
        }
        None
    }

    #[inline]
    pub fn contains(&self, key: &T) -> bool {
        self.get(key).is_some()
    }

    /// Inserts `payload` unless an equal payload is already stored.
    ///
    /// Returns `None` when the payload went in, or `Some(payload)` (the
    /// argument handed back untouched) when the key was already present. The
    /// stored payload is never modified here; see [`replace`] for overwrite
    /// semantics.
    ///
    /// [`replace`]: AaTree::replace
    pub fn insert(&mut self, payload: T) -> Option<T> {
        let displaced = insert_rec(&self.cmp, &mut self.root, payload, false);
        if displaced.is_none() {
            self.size += 1;
        }
        displaced
    }

    /// Inserts `payload`, swapping out and returning any previously stored
    /// equal payload.
    ///
    /// An overwrite is a pure payload exchange: no node is allocated, no
    /// rebalancing happens, and `len` is unchanged.
    pub fn replace(&mut self, payload: T) -> Option<T> {
        let evicted = insert_rec(&self.cmp, &mut self.root, payload, true);
        if evicted.is_none() {
            self.size += 1;
        }
        evicted
    }

    /// Removes the payload comparing equal to `key` and returns it.
    ///
    /// Returns `None`, with the tree untouched, when no such payload is
    /// stored, including on an empty tree.
    pub fn remove(&mut self, key: &T) -> Option<T> {
        let removed = remove_rec(&self.cmp, &mut self.root, key);
        if removed.is_some() {
            self.size -= 1;
        }
        removed
    }

    /// Drops every payload, leaving the tree empty and reusable.
    pub fn clear(&mut self) {
        self.root = None;
        self.size = 0;
    }

    /// In-order traversal: payloads in ascending comparator order.
    pub fn iter(&self) -> Iter<'_, T> {
        let mut iter = Iter { stack: Vec::new() };
        iter.push_left_spine(self.root.as_deref());
        iter
    }
}

// =============================================================================
// Insertion engine
// =============================================================================

/// Recursive descent insert. Returns the payload the tree did not absorb:
/// the caller's own payload on a duplicate without `overwrite`, or the
/// previously stored payload with it. `None` means a node was allocated and
/// the tree grew.
fn insert_rec<T, C: Comparator<T>>(
    cmp: &C,
    link: &mut Link<T>,
    payload: T,
    overwrite: bool,
) -> Option<T> {
    if link.is_none() {
        // Bottom of the descent: this is the one place the tree grows.
        *link = Some(Node::leaf(payload));
        return None;
    }
    let node = link.as_deref_mut().expect("descended into a populated link");

    let displaced = match cmp.compare(&payload, &node.payload) {
        Ordering::Less => insert_rec(cmp, &mut node.left, payload, overwrite),
        Ordering::Greater => insert_rec(cmp, &mut node.right, payload, overwrite),
        Ordering::Equal => {
            // No structural change on either duplicate path, so the unwind
            // below has nothing to fix.
            return Some(if overwrite {
                mem::replace(&mut node.payload, payload)
            } else {
                payload
            });
        }
    };

    // Skew before split, at every frame of the unwind.
    skew(link);
    split(link);
    displaced
}

// =============================================================================
// Deletion engine
// =============================================================================

/// Recursive successor-based removal. Returns the payload moved out of the
/// tree, or `None` when `key` is absent.
fn remove_rec<T, C: Comparator<T>>(cmp: &C, link: &mut Link<T>, key: &T) -> Option<T> {
    let ordering = match link.as_deref() {
        Some(node) => cmp.compare(key, &node.payload),
        None => return None,
    };

    let removed = match ordering {
        Ordering::Less => {
            let node = link.as_deref_mut().expect("compared node is present");
            remove_rec(cmp, &mut node.left, key)
        }
        Ordering::Greater => {
            let node = link.as_deref_mut().expect("compared node is present");
            remove_rec(cmp, &mut node.right, key)
        }
        Ordering::Equal => {
            let node = link.as_deref_mut().expect("compared node is present");
            if node.right.is_some() {
                // Pull the in-order successor's payload into the matched
                // node; the matched payload moves out to the caller and the
                // successor's bottom node is freed.
                let successor = take_min(&mut node.right);
                Some(mem::replace(&mut node.payload, successor.payload))
            } else {
                // The level rules leave no other shape here: a node without
                // a right child is a level-1 leaf.
                debug_assert_eq!(node.level, 1);
                debug_assert!(node.left.is_none());
                let leaf = link.take().expect("compared node is present");
                return Some(leaf.payload);
            }
        }
    };

    if removed.is_some() {
        rebalance_removal(link);
    }
    removed
}

/// Unlinks and returns the minimum node of a non-empty subtree, rebalancing
/// the descent path on the way back up.
fn take_min<T>(link: &mut Link<T>) -> Box<Node<T>> {
    let node = link
        .as_deref_mut()
        .expect("take_min requires a populated subtree");
    if node.left.is_some() {
        let min = take_min(&mut node.left);
        rebalance_removal(link);
        min
    } else {
        // Bottom of the left spine: splice the right child (a horizontal
        // level-1 leaf, or nothing) into the parent link.
        let mut min = link.take().expect("take_min requires a populated subtree");
        *link = min.right.take();
        min
    }
}

/// Post-removal fix-up for one unwind frame.
///
/// If either child lost a level, the node comes down with it (clamping a
/// right child that would otherwise sit above its parent), after which the
/// invariants are restored along the right spine: skew the node, its right
/// child, and its right-right grandchild, then split the node and its new
/// right child, in exactly that order.
fn rebalance_removal<T>(link: &mut Link<T>) {
    let Some(node) = link.as_deref_mut() else {
        return;
    };
    let floor = node.level - 1;
    if level(&node.left) >= floor && level(&node.right) >= floor {
        return;
    }

    node.level = floor;
    if let Some(right) = node.right.as_deref_mut() {
        if right.level > floor {
            right.level = floor;
        }
    }

    skew(link);
    if let Some(node) = link.as_deref_mut() {
        skew(&mut node.right);
        if let Some(right) = node.right.as_deref_mut() {
            skew(&mut right.right);
        }
    }
    split(link);
    if let Some(node) = link.as_deref_mut() {
        split(&mut node.right);
    }
}

// =============================================================================
// Iteration
// =============================================================================

/// Borrowing in-order iterator over a tree's payloads.
pub struct Iter<'a, T> {
    stack: Vec<&'a Node<T>>,
}

impl<'a, T> Iter<'a, T> {
    fn push_left_spine(&mut self, mut cur: Option<&'a Node<T>>) {
        while let Some(node) = cur {
            self.stack.push(node);
            cur = node.left.as_deref();
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let node = self.stack.pop()?;
        self.push_left_spine(node.right.as_deref());
        Some(&node.payload)
    }
}

/// Owning in-order iterator: yields payloads in comparator order, freeing
/// nodes as it goes.
pub struct IntoIter<T> {
    stack: Vec<Box<Node<T>>>,
}

impl<T> IntoIter<T> {
    fn push_left_spine(&mut self, mut cur: Link<T>) {
        while let Some(mut node) = cur {
            cur = node.left.take();
            self.stack.push(node);
        }
    }
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let mut node = self.stack.pop()?;
        self.push_left_spine(node.right.take());
        Some(node.payload)
    }
}

impl<T, C> IntoIterator for AaTree<T, C> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(mut self) -> IntoIter<T> {
        let mut iter = IntoIter { stack: Vec::new() };
        iter.push_left_spine(self.root.take());
        iter
    }
}

impl<'a, T, C: Comparator<T>> IntoIterator for &'a AaTree<T, C> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<T, C: Comparator<T> + Default> Default for AaTree<T, C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<T: fmt::Debug, C: Comparator<T>> fmt::Debug for AaTree<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
