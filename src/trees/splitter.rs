//! Exhaustive threshold search for a single node.
use super::criterion::{Impurity, SplitStats, IMPURITY_MAX};
use nalgebra::DMatrix;

/// The winning split of a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BestSplit {
    pub feature: usize,
    pub threshold: f64,
    /// Absolute position in the sample permutation where the right child starts.
    pub pos: usize,
    pub impurity: f64,
    pub stats: SplitStats,
}

/// Finds the best split of a node by sorting its samples along every candidate feature
/// and scanning all threshold positions.
pub struct Splitter<'a, C: Impurity> {
    x: &'a DMatrix<f64>,
    y: &'a [f64],
    sample_weight: &'a [f64],
    min_samples_leaf: usize,
    criterion: C,
    feature_values: Vec<(f64, usize)>,
}

impl<'a, C: Impurity> Splitter<'a, C> {
    pub fn new(
        x: &'a DMatrix<f64>,
        y: &'a [f64],
        sample_weight: &'a [f64],
        min_samples_leaf: usize,
        n_classes: usize,
    ) -> Self {
        Self {
            x,
            y,
            sample_weight,
            min_samples_leaf,
            criterion: C::new(n_classes),
            feature_values: vec![(0.0, 0); x.nrows()],
        }
    }

    /// Total weight and leaf estimate of `samples`.
    pub fn node_value(&mut self, samples: &[usize]) -> (f64, f64) {
        self.criterion
            .node_value(self.y, self.sample_weight, samples)
    }

    /// Sorts `samples[start..end]` by their value of `feature`. The sorted values are
    /// left in the scratch buffer at the same positions.
    fn sort_by_feature(&mut self, samples: &mut [usize], start: usize, end: usize, feature: usize) {
        let values = &mut self.feature_values[start..end];
        for (slot, &sample) in values.iter_mut().zip(&samples[start..end]) {
            *slot = (self.x[(sample, feature)], sample);
        }
        values.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));
        for (sample, &(_, sorted)) in samples[start..end].iter_mut().zip(values.iter()) {
            *sample = sorted;
        }
    }

    /// Searches `features` for the lowest-impurity split of `samples[start..end]`.
    ///
    /// On success the range is left sorted by the winning feature, so
    /// `samples[start..pos]` and `samples[pos..end]` are exactly the two children.
    /// Exact ties keep the first split found.
    pub fn best_split(
        &mut self,
        samples: &mut [usize],
        start: usize,
        end: usize,
        features: &[usize],
    ) -> Option<BestSplit> {
        // (feature, threshold, pos) of the best position swept so far
        let mut best: Option<(usize, f64, usize)> = None;
        let mut best_impurity = IMPURITY_MAX;

        for &feature in features {
            self.sort_by_feature(samples, start, end, feature);
            self.criterion
                .reset(self.y, self.sample_weight, &samples[start..end]);

            for pos in start + 1..end {
                self.criterion
                    .move_left(self.y, self.sample_weight, samples[pos - 1]);

                let n_left = pos - start;
                let n_right = end - pos;
                if n_left < self.min_samples_leaf || n_right < self.min_samples_leaf {
                    continue;
                }

                let previous = self.feature_values[pos - 1].0;
                let current = self.feature_values[pos].0;
                if current == previous {
                    continue;
                }

                let impurity = self.criterion.sweep_impurity();
                if impurity < best_impurity {
                    best_impurity = impurity;
                    best = Some((feature, midpoint(previous, current), pos));
                }
            }
        }

        let (feature, threshold, pos) = best?;
        self.sort_by_feature(samples, start, end, feature);
        let (impurity, stats) = self.criterion.evaluate(
            self.y,
            self.sample_weight,
            &samples[start..end],
            pos - start,
        );
        Some(BestSplit {
            feature,
            threshold,
            pos,
            impurity,
            stats,
        })
    }
}

/// Threshold between two distinct sorted values. Falls back to `previous` when the
/// midpoint rounds up to `current` or overflows, so `current` always routes right.
fn midpoint(previous: f64, current: f64) -> f64 {
    let threshold = previous + (current - previous) / 2.0;
    if threshold < current {
        threshold
    } else {
        previous
    }
}
