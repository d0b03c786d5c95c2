//! Flat tree storage: five parallel arrays indexed by node id.
use crate::error::{Result, TreeError};

/// Child id marking a leaf.
pub const TREE_LEAF: i32 = -1;
/// Feature id (and threshold) of a leaf.
pub const UNDEFINED: i32 = -2;

/// Largest number of nodes whose ids fit the `i32` child arrays.
pub const MAX_NODES: usize = i32::MAX as usize;

const DEFAULT_CAPACITY: usize = 16;

/// A fitted decision tree. Node 0 is the root; ids are assigned in build order and
/// never change.
///
/// An internal node routes a row to `children_left` when its value at `feature` is
/// less than or equal to `threshold`, and to `children_right` otherwise.
#[derive(Clone, Debug, PartialEq)]
pub struct Tree {
    threshold: Vec<f64>,
    feature: Vec<i32>,
    children_left: Vec<i32>,
    children_right: Vec<i32>,
    value: Vec<f64>,
    n_features: usize,
    max_nodes: usize,
}

impl Tree {
    pub fn new(n_features: usize) -> Self {
        Self::with_capacity(n_features, DEFAULT_CAPACITY)
    }

    /// Preallocates room for `capacity` nodes. Storage still grows past it on demand.
    pub fn with_capacity(n_features: usize, capacity: usize) -> Self {
        Self {
            threshold: Vec::with_capacity(capacity),
            feature: Vec::with_capacity(capacity),
            children_left: Vec::with_capacity(capacity),
            children_right: Vec::with_capacity(capacity),
            value: Vec::with_capacity(capacity),
            n_features,
            max_nodes: MAX_NODES,
        }
    }

    /// Refuses to store more than `max_nodes` nodes, capped at [`MAX_NODES`].
    pub fn with_node_limit(n_features: usize, max_nodes: usize) -> Self {
        Self {
            max_nodes: max_nodes.min(MAX_NODES),
            ..Self::new(n_features)
        }
    }

    fn push(&mut self, threshold: f64, feature: i32, value: f64) -> Result<usize> {
        let id = self.value.len();
        if id >= self.max_nodes {
            return Err(TreeError::CapacityExceeded {
                max: self.max_nodes,
            });
        }
        self.threshold.push(threshold);
        self.feature.push(feature);
        self.children_left.push(TREE_LEAF);
        self.children_right.push(TREE_LEAF);
        self.value.push(value);
        Ok(id)
    }

    /// Appends an internal node whose children are wired later with [`Tree::set_child`].
    pub fn add_node(&mut self, threshold: f64, feature: usize, value: f64) -> Result<usize> {
        self.push(threshold, feature as i32, value)
    }

    pub fn add_terminal_node(&mut self, value: f64) -> Result<usize> {
        self.push(UNDEFINED as f64, UNDEFINED, value)
    }

    pub fn set_child(&mut self, parent: usize, child: usize, is_left: bool) {
        let slot = if is_left {
            &mut self.children_left[parent]
        } else {
            &mut self.children_right[parent]
        };
        *slot = child as i32;
    }

    /// Releases spare capacity once the build is complete.
    pub fn finalize(&mut self) {
        self.threshold.shrink_to_fit();
        self.feature.shrink_to_fit();
        self.children_left.shrink_to_fit();
        self.children_right.shrink_to_fit();
        self.value.shrink_to_fit();
    }

    pub fn node_count(&self) -> usize {
        self.value.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn is_leaf(&self, node: usize) -> bool {
        self.children_left[node] == TREE_LEAF && self.children_right[node] == TREE_LEAF
    }

    pub fn n_leaves(&self) -> usize {
        (0..self.node_count()).filter(|&node| self.is_leaf(node)).count()
    }

    /// Length of the longest root-to-leaf path; a lone root has depth 0.
    pub fn depth(&self) -> usize {
        if self.node_count() == 0 {
            return 0;
        }
        let mut deepest = 0;
        let mut pending = vec![(0usize, 0usize)];
        while let Some((node, depth)) = pending.pop() {
            deepest = deepest.max(depth);
            if !self.is_leaf(node) {
                pending.push((self.children_left[node] as usize, depth + 1));
                pending.push((self.children_right[node] as usize, depth + 1));
            }
        }
        deepest
    }

    pub fn threshold(&self) -> &[f64] {
        &self.threshold
    }

    pub fn feature(&self) -> &[i32] {
        &self.feature
    }

    pub fn children_left(&self) -> &[i32] {
        &self.children_left
    }

    pub fn children_right(&self) -> &[i32] {
        &self.children_right
    }

    pub fn value(&self) -> &[f64] {
        &self.value
    }
}
