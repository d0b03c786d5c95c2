//! Impurity criteria used to score candidate split positions.
//!
//! Every criterion looks at one node's slice of the sample permutation, split at a local
//! position `pos` into a left part `samples[..pos]` and a right part `samples[pos..]`.
//! Lower impurity is better.
use crate::error::TreeError;
use std::fmt::{self, Display};
use std::str::FromStr;

/// Reported when one side of a split carries no weight.
pub const IMPURITY_MAX: f64 = f64::MAX;

/// Impurity metric selected for one build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Criterion {
    Mse,
    Gini,
    Entropy,
}

impl Criterion {
    pub fn is_classification(&self) -> bool {
        !matches!(self, Criterion::Mse)
    }
}

impl Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Criterion::Mse => "mse",
            Criterion::Gini => "gini",
            Criterion::Entropy => "entropy",
        };
        f.write_str(name)
    }
}

impl FromStr for Criterion {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mse" => Ok(Criterion::Mse),
            "gini" => Ok(Criterion::Gini),
            "entropy" => Ok(Criterion::Entropy),
            other => Err(TreeError::InvalidParameter(format!(
                "The criterion must be one of 'mse', 'gini' or 'entropy', got '{}'.",
                other
            ))),
        }
    }
}

/// Weighted sizes and leaf estimates of both sides of a candidate split.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SplitStats {
    pub weight_left: f64,
    pub weight_right: f64,
    pub weight_total: f64,
    pub value_left: f64,
    pub value_right: f64,
}

/// A split scoring rule. Implementations own whatever scratch space they need so the
/// hot loop never allocates.
pub trait Impurity {
    fn new(n_classes: usize) -> Self;

    /// Total weight and leaf estimate of all `samples`.
    fn node_value(&mut self, y: &[f64], sample_weight: &[f64], samples: &[usize]) -> (f64, f64);

    /// Starts a sweep over `samples` with all of them on the right side.
    fn reset(&mut self, y: &[f64], sample_weight: &[f64], samples: &[usize]);

    /// Moves `sample` from the right side of the sweep to the left.
    fn move_left(&mut self, y: &[f64], sample_weight: &[f64], sample: usize);

    /// Scores the current sweep position. The right side is derived as node total minus
    /// left, so the score can differ from [`Impurity::evaluate`] in the last bits.
    fn sweep_impurity(&self) -> f64;

    /// Scores splitting `samples` at `pos`, summing both sides from scratch.
    fn evaluate(
        &mut self,
        y: &[f64],
        sample_weight: &[f64],
        samples: &[usize],
        pos: usize,
    ) -> (f64, SplitStats);
}

/// Weighted count, sum and sum of squares of the targets on one side of a split.
#[derive(Clone, Copy, Debug, Default)]
struct Moments {
    weight: f64,
    sum: f64,
    sq: f64,
}

impl Moments {
    fn add(&mut self, y: f64, w: f64) {
        self.weight += w;
        self.sum += w * y;
        self.sq += w * y * y;
    }

    fn of(y: &[f64], sample_weight: &[f64], samples: &[usize]) -> Self {
        let mut moments = Self::default();
        for &i in samples {
            moments.add(y[i], sample_weight[i]);
        }
        moments
    }

    fn minus(&self, other: &Self) -> Self {
        Self {
            weight: self.weight - other.weight,
            sum: self.sum - other.sum,
            sq: self.sq - other.sq,
        }
    }

    /// Weighted sum of squared deviations from the mean.
    fn deviance(&self) -> f64 {
        self.sq - self.sum * self.sum / self.weight
    }
}

/// Weighted mean squared error.
#[derive(Debug, Default)]
pub struct Mse {
    total: Moments,
    left: Moments,
}

impl Impurity for Mse {
    fn new(_n_classes: usize) -> Self {
        Self::default()
    }

    fn node_value(&mut self, y: &[f64], sample_weight: &[f64], samples: &[usize]) -> (f64, f64) {
        let moments = Moments::of(y, sample_weight, samples);
        if moments.weight == 0.0 {
            return (0.0, 0.0);
        }
        (moments.weight, moments.sum / moments.weight)
    }

    fn reset(&mut self, y: &[f64], sample_weight: &[f64], samples: &[usize]) {
        self.total = Moments::of(y, sample_weight, samples);
        self.left = Moments::default();
    }

    fn move_left(&mut self, y: &[f64], sample_weight: &[f64], sample: usize) {
        self.left.add(y[sample], sample_weight[sample]);
    }

    fn sweep_impurity(&self) -> f64 {
        let right = self.total.minus(&self.left);
        if self.left.weight == 0.0 || right.weight <= 0.0 {
            return IMPURITY_MAX;
        }
        (self.left.deviance() + right.deviance()) / self.total.weight
    }

    fn evaluate(
        &mut self,
        y: &[f64],
        sample_weight: &[f64],
        samples: &[usize],
        pos: usize,
    ) -> (f64, SplitStats) {
        let (left, right) = samples.split_at(pos);

        let left = Moments::of(y, sample_weight, left);
        if left.weight == 0.0 {
            return (IMPURITY_MAX, SplitStats::default());
        }
        let right = Moments::of(y, sample_weight, right);
        if right.weight == 0.0 {
            return (IMPURITY_MAX, SplitStats::default());
        }
        let weight_total = left.weight + right.weight;

        let stats = SplitStats {
            weight_left: left.weight,
            weight_right: right.weight,
            weight_total,
            value_left: left.sum / left.weight,
            value_right: right.sum / right.weight,
        };
        ((left.deviance() + right.deviance()) / weight_total, stats)
    }
}

/// Per-class weight accumulators for both sides of a split, plus the node totals used
/// while sweeping.
#[derive(Debug)]
struct ClassCounts {
    left: Vec<f64>,
    right: Vec<f64>,
    total: Vec<f64>,
    weight_left: f64,
    weight_total: f64,
}

fn majority(counts: &[f64]) -> f64 {
    let mut best = -f64::MAX;
    let mut value = 0;
    for (k, &count) in counts.iter().enumerate() {
        if count > best {
            best = count;
            value = k;
        }
    }
    value as f64
}

impl ClassCounts {
    fn new(n_classes: usize) -> Self {
        Self {
            left: vec![0.0; n_classes],
            right: vec![0.0; n_classes],
            total: vec![0.0; n_classes],
            weight_left: 0.0,
            weight_total: 0.0,
        }
    }

    fn node_value(&mut self, y: &[f64], sample_weight: &[f64], samples: &[usize]) -> (f64, f64) {
        self.left.iter_mut().for_each(|c| *c = 0.0);
        let mut weight = 0.0;
        for &i in samples {
            weight += sample_weight[i];
            self.left[y[i] as usize] += sample_weight[i];
        }
        (weight, majority(&self.left))
    }

    fn reset(&mut self, y: &[f64], sample_weight: &[f64], samples: &[usize]) {
        self.left.iter_mut().for_each(|c| *c = 0.0);
        self.total.iter_mut().for_each(|c| *c = 0.0);
        self.weight_left = 0.0;
        self.weight_total = 0.0;
        for &i in samples {
            self.weight_total += sample_weight[i];
            self.total[y[i] as usize] += sample_weight[i];
        }
    }

    fn move_left(&mut self, y: &[f64], sample_weight: &[f64], sample: usize) {
        self.weight_left += sample_weight[sample];
        self.left[y[sample] as usize] += sample_weight[sample];
    }

    /// `(left, right)` class weights of the current sweep position.
    fn swept(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.left
            .iter()
            .zip(&self.total)
            .map(|(&left, &total)| (left, total - left))
    }

    fn count(
        &mut self,
        y: &[f64],
        sample_weight: &[f64],
        samples: &[usize],
        pos: usize,
    ) -> SplitStats {
        self.left.iter_mut().for_each(|c| *c = 0.0);
        self.right.iter_mut().for_each(|c| *c = 0.0);

        let (left, right) = samples.split_at(pos);
        let mut weight_left = 0.0;
        let mut weight_right = 0.0;
        for &i in left {
            weight_left += sample_weight[i];
            self.left[y[i] as usize] += sample_weight[i];
        }
        for &i in right {
            weight_right += sample_weight[i];
            self.right[y[i] as usize] += sample_weight[i];
        }

        SplitStats {
            weight_left,
            weight_right,
            weight_total: weight_left + weight_right,
            value_left: majority(&self.left),
            value_right: majority(&self.right),
        }
    }

    fn counted(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.left.iter().copied().zip(self.right.iter().copied())
    }
}

fn gini_score(
    counts: impl Iterator<Item = (f64, f64)>,
    weight_left: f64,
    weight_right: f64,
    weight_total: f64,
) -> f64 {
    let mut gini_left = 0.0;
    let mut gini_right = 0.0;
    for (count_left, count_right) in counts {
        let proba_left = count_left / weight_total;
        let proba_right = count_right / weight_total;
        gini_left += proba_left * (1.0 - proba_left);
        gini_right += proba_right * (1.0 - proba_right);
    }
    weight_left * gini_left + weight_right * gini_right
}

fn entropy_score(
    counts: impl Iterator<Item = (f64, f64)>,
    weight_left: f64,
    weight_right: f64,
    weight_total: f64,
) -> f64 {
    let mut ent_left = 0.0;
    let mut ent_right = 0.0;
    for (count_left, count_right) in counts {
        let proba_left = count_left / weight_total;
        let proba_right = count_right / weight_total;
        if proba_left > 0.0 {
            ent_left -= proba_left * proba_left.log2();
        }
        if proba_right > 0.0 {
            ent_right -= proba_right * proba_right.log2();
        }
    }
    weight_left * ent_left + weight_right * ent_right
}

/// Gini impurity, weighted by side size but not normalized by the node weight.
///
/// The node weight is constant across all positions scanned for one node, so the
/// argmin is the same as for the normalized form. Scores are not comparable across
/// nodes.
#[derive(Debug)]
pub struct Gini {
    counts: ClassCounts,
}

impl Impurity for Gini {
    fn new(n_classes: usize) -> Self {
        Self {
            counts: ClassCounts::new(n_classes),
        }
    }

    fn node_value(&mut self, y: &[f64], sample_weight: &[f64], samples: &[usize]) -> (f64, f64) {
        self.counts.node_value(y, sample_weight, samples)
    }

    fn reset(&mut self, y: &[f64], sample_weight: &[f64], samples: &[usize]) {
        self.counts.reset(y, sample_weight, samples);
    }

    fn move_left(&mut self, y: &[f64], sample_weight: &[f64], sample: usize) {
        self.counts.move_left(y, sample_weight, sample);
    }

    fn sweep_impurity(&self) -> f64 {
        let counts = &self.counts;
        let weight_right = counts.weight_total - counts.weight_left;
        if counts.weight_left == 0.0 && weight_right == 0.0 {
            return IMPURITY_MAX;
        }
        gini_score(
            counts.swept(),
            counts.weight_left,
            weight_right,
            counts.weight_total,
        )
    }

    fn evaluate(
        &mut self,
        y: &[f64],
        sample_weight: &[f64],
        samples: &[usize],
        pos: usize,
    ) -> (f64, SplitStats) {
        let stats = self.counts.count(y, sample_weight, samples, pos);
        if stats.weight_left == 0.0 && stats.weight_right == 0.0 {
            return (IMPURITY_MAX, stats);
        }
        let impurity = gini_score(
            self.counts.counted(),
            stats.weight_left,
            stats.weight_right,
            stats.weight_total,
        );
        (impurity, stats)
    }
}

/// Shannon entropy in bits, in the same unnormalized form as [`Gini`].
#[derive(Debug)]
pub struct Entropy {
    counts: ClassCounts,
}

impl Impurity for Entropy {
    fn new(n_classes: usize) -> Self {
        Self {
            counts: ClassCounts::new(n_classes),
        }
    }

    fn node_value(&mut self, y: &[f64], sample_weight: &[f64], samples: &[usize]) -> (f64, f64) {
        self.counts.node_value(y, sample_weight, samples)
    }

    fn reset(&mut self, y: &[f64], sample_weight: &[f64], samples: &[usize]) {
        self.counts.reset(y, sample_weight, samples);
    }

    fn move_left(&mut self, y: &[f64], sample_weight: &[f64], sample: usize) {
        self.counts.move_left(y, sample_weight, sample);
    }

    fn sweep_impurity(&self) -> f64 {
        let counts = &self.counts;
        let weight_right = counts.weight_total - counts.weight_left;
        if counts.weight_left == 0.0 || weight_right <= 0.0 {
            return IMPURITY_MAX;
        }
        entropy_score(
            counts.swept(),
            counts.weight_left,
            weight_right,
            counts.weight_total,
        )
    }

    fn evaluate(
        &mut self,
        y: &[f64],
        sample_weight: &[f64],
        samples: &[usize],
        pos: usize,
    ) -> (f64, SplitStats) {
        let stats = self.counts.count(y, sample_weight, samples, pos);
        if stats.weight_left == 0.0 || stats.weight_right == 0.0 {
            return (IMPURITY_MAX, stats);
        }
        let impurity = entropy_score(
            self.counts.counted(),
            stats.weight_left,
            stats.weight_right,
            stats.weight_total,
        );
        (impurity, stats)
    }
}
