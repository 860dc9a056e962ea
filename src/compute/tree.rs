//! Sparse grid tree: a bit-trie over [`GridKey`] accumulating per-cell values.
//!
//! Quadtree in 2D, octree in 3D. Branches, their child slots and leaf values
//! live in growable arenas and are addressed by `u32` index. An arena may
//! reallocate whenever a node is added, so code never holds a reference into
//! it across an allocation; it re-indexes instead.
//!
//! A branch at level `L` dispatches on bit `L` of every lane. The root is the
//! `2^D` branches at [`ROOT_LEVEL`], one per combination of the lanes' top
//! bits, allocated up front and never freed. Slots of a level-0 branch hold
//! leaves.

use std::collections::TryReserveError;

use super::grid_key::{GridKey, KEY_BITS};
use crate::schema::Strength;

/// Level of the permanently allocated root branches.
pub const ROOT_LEVEL: u32 = KEY_BITS - 2;

const LEVELS: usize = ROOT_LEVEL as usize + 1;

/// State of one child slot of a branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Empty,
    /// Index into the branch arena.
    Branch(u32),
    /// Index into the leaf pool. Only valid in a level-0 branch.
    Leaf(u32),
}

#[derive(Debug, Clone, Copy)]
struct Branch<const D: usize> {
    level: u32,
    /// Bits above `level` fixed, bits at and below `level` zero.
    key: GridKey<D>,
}

/// Sparse accumulator keyed by lattice coordinate.
#[derive(Debug, Clone)]
pub struct SparseGridTree<const D: usize, V> {
    branches: Vec<Branch<D>>,
    /// `CHILDREN` consecutive slots per branch.
    slots: Vec<Slot>,
    leaves: Vec<V>,
}

impl<const D: usize, V: Strength> Default for SparseGridTree<D, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const D: usize, V: Strength> SparseGridTree<D, V> {
    const CHILDREN: usize = GridKey::<D>::CHILDREN;

    /// Create an empty tree holding only the root branches.
    pub fn new() -> Self {
        let mut tree = Self {
            branches: Vec::new(),
            slots: Vec::new(),
            leaves: Vec::new(),
        };
        tree.reset_roots();
        tree
    }

    fn reset_roots(&mut self) {
        let origin = GridKey::new([0u32; D]);
        self.branches = (0..Self::CHILDREN)
            .map(|child| Branch {
                level: ROOT_LEVEL,
                key: origin.with_child(KEY_BITS - 1, child),
            })
            .collect();
        self.slots = vec![Slot::Empty; Self::CHILDREN * Self::CHILDREN];
    }

    /// Number of populated leaves.
    #[inline]
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// True when no leaf has been populated.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// Number of allocated branches, roots included.
    #[inline]
    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }

    /// Reset to the empty root-only state.
    pub fn clear(&mut self) {
        self.branches.truncate(Self::CHILDREN);
        self.slots.truncate(Self::CHILDREN * Self::CHILDREN);
        self.slots.fill(Slot::Empty);
        self.leaves.clear();
    }

    #[inline]
    fn slot_index(branch: u32, child: usize) -> usize {
        branch as usize * Self::CHILDREN + child
    }

    #[inline]
    fn root_of(key: &GridKey<D>) -> u32 {
        key.child_index(KEY_BITS - 1) as u32
    }

    fn alloc_branch(&mut self, level: u32, key: GridKey<D>) -> Result<u32, TryReserveError> {
        self.branches.try_reserve(1)?;
        self.slots.try_reserve(Self::CHILDREN)?;
        let index = self.branches.len() as u32;
        self.branches.push(Branch { level, key });
        self.slots.extend(std::iter::repeat_n(Slot::Empty, Self::CHILDREN));
        Ok(index)
    }

    fn alloc_leaf(&mut self, value: V) -> Result<u32, TryReserveError> {
        self.leaves.try_reserve(1)?;
        let index = self.leaves.len() as u32;
        self.leaves.push(value);
        Ok(index)
    }

    /// Accumulate `value` into the cell at `key`, creating it if needed.
    ///
    /// Zero contributions are skipped and create no cell.
    pub fn insert(&mut self, key: GridKey<D>, value: V) -> Result<(), TryReserveError> {
        if value.is_zero() {
            return Ok(());
        }
        let mut stack = [0u32; LEVELS];
        self.descend(key, value, Self::root_of(&key), ROOT_LEVEL, &mut stack)
    }

    /// Same result as calling [`SparseGridTree::insert`] for each pair.
    ///
    /// The path of the previous key is kept, so consecutive keys that share
    /// a long prefix (a particle's neighbourhood) resume descent at the
    /// deepest shared branch instead of at the root.
    pub fn insert_batch(
        &mut self,
        keys: &[GridKey<D>],
        values: &[V],
    ) -> Result<(), TryReserveError> {
        debug_assert_eq!(keys.len(), values.len());

        let mut stack = [0u32; LEVELS];
        let mut previous: Option<GridKey<D>> = None;

        for (key, &value) in keys.iter().zip(values) {
            if value.is_zero() {
                continue;
            }

            // A level-L branch is fixed by the top (31 - L) bits of each lane.
            let (branch, level) = match previous {
                Some(prev) => match key.matching_leading_bits(&prev) {
                    0 => (Self::root_of(key), ROOT_LEVEL),
                    matched => {
                        let level = (KEY_BITS - 1).saturating_sub(matched);
                        (stack[level as usize], level)
                    }
                },
                None => (Self::root_of(key), ROOT_LEVEL),
            };

            self.descend(*key, value, branch, level, &mut stack)?;
            previous = Some(*key);
        }

        Ok(())
    }

    /// Walk from `branch` at `level` down to the leaf for `key`, recording
    /// the visited branch at each level in `stack`.
    fn descend(
        &mut self,
        key: GridKey<D>,
        value: V,
        mut branch: u32,
        mut level: u32,
        stack: &mut [u32; LEVELS],
    ) -> Result<(), TryReserveError> {
        loop {
            stack[level as usize] = branch;
            let slot = Self::slot_index(branch, key.child_index(level));

            match self.slots[slot] {
                Slot::Leaf(leaf) => {
                    self.leaves[leaf as usize].accumulate(value);
                    return Ok(());
                }
                Slot::Branch(child) => {
                    branch = child;
                }
                Slot::Empty if level == 0 => {
                    let leaf = self.alloc_leaf(value)?;
                    self.slots[slot] = Slot::Leaf(leaf);
                    return Ok(());
                }
                Slot::Empty => {
                    let child = self.alloc_branch(level - 1, key.prefix(level))?;
                    // Slot arena may have moved; write back by index.
                    self.slots[slot] = Slot::Branch(child);
                    branch = child;
                }
            }
            level -= 1;
        }
    }

    /// Value accumulated at `key`, if the cell exists.
    pub fn get(&self, key: &GridKey<D>) -> Option<V> {
        let mut branch = Self::root_of(key);
        let mut level = ROOT_LEVEL;
        loop {
            match self.slots[Self::slot_index(branch, key.child_index(level))] {
                Slot::Empty => return None,
                Slot::Leaf(leaf) => return Some(self.leaves[leaf as usize]),
                Slot::Branch(child) => branch = child,
            }
            level -= 1;
        }
    }

    /// Fold `other` into this tree.
    ///
    /// Both trees must be built on the same corner and spacing. Cells present
    /// in both are accumulated, cells present only in `other` are copied.
    pub fn merge(&mut self, other: &Self) -> Result<(), TryReserveError> {
        for root in 0..Self::CHILDREN as u32 {
            self.merge_branch(root, root, other)?;
        }
        Ok(())
    }

    fn merge_branch(
        &mut self,
        mine: u32,
        theirs: u32,
        other: &Self,
    ) -> Result<(), TryReserveError> {
        debug_assert_eq!(
            self.branches[mine as usize].key,
            other.branches[theirs as usize].key
        );

        for child in 0..Self::CHILDREN {
            let my_slot = Self::slot_index(mine, child);
            match (self.slots[my_slot], other.slots[Self::slot_index(theirs, child)]) {
                (_, Slot::Empty) => {}
                (Slot::Empty, their_slot) => {
                    let copied = self.copy_slot(their_slot, other)?;
                    self.slots[my_slot] = copied;
                }
                (Slot::Branch(a), Slot::Branch(b)) => self.merge_branch(a, b, other)?,
                (Slot::Leaf(a), Slot::Leaf(b)) => {
                    self.leaves[a as usize].accumulate(other.leaves[b as usize]);
                }
                (left, right) => {
                    unreachable!("merging trees with different frames: {left:?} vs {right:?}")
                }
            }
        }
        Ok(())
    }

    /// Deep-copy a slot of `other` into this tree's arenas.
    fn copy_slot(&mut self, slot: Slot, other: &Self) -> Result<Slot, TryReserveError> {
        match slot {
            Slot::Empty => Ok(Slot::Empty),
            Slot::Leaf(leaf) => Ok(Slot::Leaf(self.alloc_leaf(other.leaves[leaf as usize])?)),
            Slot::Branch(source) => {
                let Branch { level, key } = other.branches[source as usize];
                let copy = self.alloc_branch(level, key)?;
                for child in 0..Self::CHILDREN {
                    let copied =
                        self.copy_slot(other.slots[Self::slot_index(source, child)], other)?;
                    self.slots[Self::slot_index(copy, child)] = copied;
                }
                Ok(Slot::Branch(copy))
            }
        }
    }

    /// Depth-first iterator over `(key, value)` in ascending key order.
    pub fn iter(&self) -> Iter<'_, D, V> {
        Iter {
            tree: self,
            stack: (0..Self::CHILDREN as u32).rev().map(|root| (root, 0)).collect(),
        }
    }

    /// Up to `max` cells in depth-first order.
    ///
    /// Truncates silently; compare against [`SparseGridTree::len`] first when
    /// every cell is needed.
    pub fn flatten(&self, max: usize) -> Result<Vec<(GridKey<D>, V)>, TryReserveError> {
        let mut cells = Vec::new();
        cells.try_reserve_exact(max.min(self.len()))?;
        cells.extend(self.iter().take(max));
        Ok(cells)
    }
}

/// Depth-first cell iterator, see [`SparseGridTree::iter`].
pub struct Iter<'a, const D: usize, V> {
    tree: &'a SparseGridTree<D, V>,
    /// (branch, next child slot to visit)
    stack: Vec<(u32, usize)>,
}

impl<const D: usize, V: Strength> Iterator for Iter<'_, D, V> {
    type Item = (GridKey<D>, V);

    fn next(&mut self) -> Option<Self::Item> {
        let children = GridKey::<D>::CHILDREN;
        while let Some(frame) = self.stack.last_mut() {
            let (branch, child) = *frame;
            if child == children {
                self.stack.pop();
                continue;
            }
            frame.1 += 1;

            match self.tree.slots[branch as usize * children + child] {
                Slot::Empty => {}
                Slot::Branch(next) => self.stack.push((next, 0)),
                Slot::Leaf(leaf) => {
                    let key = self.tree.branches[branch as usize].key.with_child(0, child);
                    return Some((key, self.tree.leaves[leaf as usize]));
                }
            }
        }
        None
    }
}
