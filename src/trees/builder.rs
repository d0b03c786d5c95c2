//! Greedy depth-first tree growth over an explicit work list.
use super::criterion::{Criterion, Entropy, Gini, Impurity, Mse};
use super::frontier::{Frontier, FrontierEntry};
use super::splitter::Splitter;
use super::tree::Tree;
use crate::error::{Result, TreeError};
use nalgebra::DMatrix;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, trace};

/// Resolved settings for one build.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildConfig {
    pub criterion: Criterion,
    /// Number of classes for Gini and entropy; ignored for MSE.
    pub n_classes: usize,
    /// Number of candidate features tried per node, in `1..=n_features`.
    pub max_features: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

/// A leaf together with the slice of the final sample permutation routed to it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LeafRange {
    pub node: usize,
    pub start: usize,
    pub end: usize,
}

/// A finished build together with the final sample permutation; each leaf owns the
/// training samples in `samples[start..end]` of its [`LeafRange`].
#[derive(Debug)]
pub struct Grown {
    pub tree: Tree,
    pub samples: Vec<usize>,
    pub leaves: Vec<LeafRange>,
}

/// Grows a tree on `x`/`y`.
///
/// `y` holds raw targets for MSE and dense class codes `0..n_classes` (as `f64`) for
/// Gini and entropy. Samples with zero weight are dropped before growing. `rng` reorders
/// the candidate features before each split search when `max_features` is smaller than
/// the number of columns.
///
/// # Errors
///
/// Fails on inconsistent input lengths, invalid weights or class codes, an out of range
/// `max_features`, when no sample has positive weight, or when node storage overflows.
pub fn build_tree<R: Rng + ?Sized>(
    x: &DMatrix<f64>,
    y: &[f64],
    sample_weight: &[f64],
    config: &BuildConfig,
    rng: &mut R,
) -> Result<Tree> {
    grow(x, y, sample_weight, config, rng).map(|grown| grown.tree)
}

fn validate(
    x: &DMatrix<f64>,
    y: &[f64],
    sample_weight: &[f64],
    config: &BuildConfig,
) -> Result<()> {
    if y.len() != x.nrows() {
        return Err(TreeError::LengthMismatch {
            what: "y",
            expected: x.nrows(),
            got: y.len(),
        });
    }
    if sample_weight.len() != x.nrows() {
        return Err(TreeError::LengthMismatch {
            what: "sample_weight",
            expected: x.nrows(),
            got: sample_weight.len(),
        });
    }
    if let Some((index, &value)) = sample_weight
        .iter()
        .enumerate()
        .find(|(_, w)| !w.is_finite() || **w < 0.0)
    {
        return Err(TreeError::InvalidWeight { index, value });
    }
    if config.max_features == 0 || config.max_features > x.ncols() {
        return Err(TreeError::InvalidParameter(format!(
            "max_features must be between 1 and {}, got {}.",
            x.ncols(),
            config.max_features
        )));
    }
    if config.criterion.is_classification() {
        if config.n_classes == 0 {
            return Err(TreeError::InvalidParameter(
                "Classification needs at least one class.".into(),
            ));
        }
        let n_classes = config.n_classes as f64;
        if let Some(index) = y
            .iter()
            .position(|&code| !(code >= 0.0 && code < n_classes && code.fract() == 0.0))
        {
            return Err(TreeError::InvalidClassLabel { index });
        }
    }
    Ok(())
}

/// Like [`build_tree`], but also reports which training samples reached each leaf.
pub fn grow<R: Rng + ?Sized>(
    x: &DMatrix<f64>,
    y: &[f64],
    sample_weight: &[f64],
    config: &BuildConfig,
    rng: &mut R,
) -> Result<Grown> {
    validate(x, y, sample_weight, config)?;
    match config.criterion {
        Criterion::Mse => TreeBuilder::<Mse, R>::new(x, y, sample_weight, config, rng).build(),
        Criterion::Gini => TreeBuilder::<Gini, R>::new(x, y, sample_weight, config, rng).build(),
        Criterion::Entropy => {
            TreeBuilder::<Entropy, R>::new(x, y, sample_weight, config, rng).build()
        }
    }
}

struct TreeBuilder<'a, C: Impurity, R: Rng + ?Sized> {
    config: &'a BuildConfig,
    rng: &'a mut R,
    splitter: Splitter<'a, C>,
    samples: Vec<usize>,
    features: Vec<usize>,
    frontier: Frontier,
    tree: Tree,
    leaves: Vec<LeafRange>,
}

impl<'a, C: Impurity, R: Rng + ?Sized> TreeBuilder<'a, C, R> {
    fn new(
        x: &'a DMatrix<f64>,
        y: &'a [f64],
        sample_weight: &'a [f64],
        config: &'a BuildConfig,
        rng: &'a mut R,
    ) -> Self {
        let samples = (0..x.nrows())
            .filter(|&i| sample_weight[i] > 0.0)
            .collect();
        Self {
            config,
            rng,
            splitter: Splitter::new(
                x,
                y,
                sample_weight,
                config.min_samples_leaf,
                config.n_classes,
            ),
            samples,
            features: (0..x.ncols()).collect(),
            frontier: Frontier::new(),
            tree: Tree::new(x.ncols()),
            leaves: Vec::new(),
        }
    }

    fn is_terminal(&self, entry: &FrontierEntry) -> bool {
        self.config
            .max_depth
            .is_some_and(|max_depth| entry.depth >= max_depth)
            || entry.n_samples() < self.config.min_samples_split
    }

    fn add_leaf(&mut self, entry: &FrontierEntry) -> Result<usize> {
        let node = self.tree.add_terminal_node(entry.value)?;
        self.leaves.push(LeafRange {
            node,
            start: entry.start,
            end: entry.end,
        });
        trace!(node, n_samples = entry.n_samples(), value = entry.value, "leaf");
        Ok(node)
    }

    fn build(mut self) -> Result<Grown> {
        if self.samples.is_empty() {
            return Err(TreeError::EmptyDataset);
        }
        let (weight, value) = self.splitter.node_value(&self.samples);
        debug!(
            criterion = %self.config.criterion,
            n_samples = self.samples.len(),
            n_features = self.features.len(),
            max_features = self.config.max_features,
            "growing tree"
        );

        self.frontier.push(FrontierEntry {
            start: 0,
            end: self.samples.len(),
            is_left: false,
            depth: 0,
            weight,
            parent: 0,
            value,
        });

        while let Some(entry) = self.frontier.pop() {
            let node = self.tree.node_count();
            if node > 0 {
                self.tree.set_child(entry.parent, node, entry.is_left);
            }

            if self.is_terminal(&entry) {
                self.add_leaf(&entry)?;
                continue;
            }

            if self.config.max_features < self.features.len() {
                self.features.shuffle(&mut *self.rng);
            }
            let candidates = &self.features[..self.config.max_features];
            let split = self
                .splitter
                .best_split(&mut self.samples, entry.start, entry.end, candidates);

            let Some(split) = split else {
                self.add_leaf(&entry)?;
                continue;
            };

            let node = self.tree.add_node(split.threshold, split.feature, entry.value)?;
            trace!(
                node,
                feature = split.feature,
                threshold = split.threshold,
                impurity = split.impurity,
                n_left = split.pos - entry.start,
                n_right = entry.end - split.pos,
                "split"
            );

            self.frontier.push(FrontierEntry {
                start: entry.start,
                end: split.pos,
                is_left: true,
                depth: entry.depth + 1,
                weight: split.stats.weight_left,
                parent: node,
                value: split.stats.value_left,
            });
            self.frontier.push(FrontierEntry {
                start: split.pos,
                end: entry.end,
                is_left: false,
                depth: entry.depth + 1,
                weight: split.stats.weight_right,
                parent: node,
                value: split.stats.value_right,
            });
        }

        self.tree.finalize();
        debug!(
            node_count = self.tree.node_count(),
            n_leaves = self.leaves.len(),
            depth = self.tree.depth(),
            "finished growing tree"
        );
        Ok(Grown {
            tree: self.tree,
            samples: self.samples,
            leaves: self.leaves,
        })
    }
}
