//! Sample collection and descriptive statistics.
//!
//! A [`SampleSet`] is an append-only series of observations for one operation and metric, for
//! example upload latency in milliseconds. All statistics are pure functions over the recorded
//! values and return `0.0` for an empty set, so a run without a single successful operation
//! still produces a well-defined report.
//!
//! Percentiles use linear interpolation between the closest ranks of the sorted series: for `n`
//! samples, percentile `p` sits at the fractional rank `p / 100 * (n - 1)`. The standard deviation
//! is the population standard deviation.

use std::cmp::Ordering;

/// An append-only collection of numeric observations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleSet {
    samples: Vec<f64>,
}

impl SampleSet {
    /// Creates an empty sample set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a single observation.
    pub fn append(&mut self, value: f64) {
        self.samples.push(value);
    }

    /// Returns the number of recorded observations.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the recorded observations in insertion order.
    pub fn values(&self) -> &[f64] {
        &self.samples
    }

    /// The smallest observation, or `0.0` if empty.
    pub fn min(&self) -> f64 {
        self.samples.iter().copied().min_by(f64::total_cmp).unwrap_or(0.0)
    }

    /// The largest observation, or `0.0` if empty.
    pub fn max(&self) -> f64 {
        self.samples.iter().copied().max_by(f64::total_cmp).unwrap_or(0.0)
    }

    /// The arithmetic mean, or `0.0` if empty.
    pub fn mean(&self) -> f64 {
        mean(&self.samples)
    }

    /// The `p`-th percentile for `p` in `[0, 100]`, or `0.0` if empty.
    ///
    /// Values of `p` outside the range are clamped.
    pub fn percentile(&self, p: f64) -> f64 {
        interpolate(&self.sorted(), p)
    }

    /// The population standard deviation, or `0.0` for fewer than two observations.
    pub fn stddev(&self) -> f64 {
        stddev(&self.samples)
    }

    /// Computes all statistics in one pass over a single sorted copy.
    pub fn summarize(&self, percentiles: &[f64]) -> Summary {
        let sorted = self.sorted();

        Summary {
            count: sorted.len(),
            min: sorted.first().copied().unwrap_or(0.0),
            max: sorted.last().copied().unwrap_or(0.0),
            percentiles: percentiles
                .iter()
                .map(|&p| (p, interpolate(&sorted, p)))
                .collect(),
            mean: mean(&sorted),
            stddev: stddev(&sorted),
        }
    }

    fn sorted(&self) -> Vec<f64> {
        let mut sorted = self.samples.clone();
        sorted.sort_unstable_by(f64::total_cmp);
        sorted
    }
}

impl Extend<f64> for SampleSet {
    fn extend<T: IntoIterator<Item = f64>>(&mut self, iter: T) {
        self.samples.extend(iter);
    }
}

impl FromIterator<f64> for SampleSet {
    fn from_iter<T: IntoIterator<Item = f64>>(iter: T) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

/// Precomputed statistics of a [`SampleSet`].
#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    /// Number of observations.
    pub count: usize,
    /// Smallest observation.
    pub min: f64,
    /// Largest observation.
    pub max: f64,
    /// Requested percentiles as `(p, value)` pairs, in request order.
    pub percentiles: Vec<(f64, f64)>,
    /// Arithmetic mean.
    pub mean: f64,
    /// Population standard deviation.
    pub stddev: f64,
}

impl Summary {
    /// Returns the value of a previously requested percentile.
    pub fn percentile(&self, p: f64) -> Option<f64> {
        self.percentiles
            .iter()
            .find(|(requested, _)| requested.total_cmp(&p) == Ordering::Equal)
            .map(|&(_, value)| value)
    }

    /// Applies `f` to every statistic, e.g. to convert units.
    ///
    /// The count and the percentile ranks are left untouched.
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            count: self.count,
            min: f(self.min),
            max: f(self.max),
            percentiles: self
                .percentiles
                .into_iter()
                .map(|(p, value)| (p, f(value)))
                .collect(),
            mean: f(self.mean),
            stddev: f(self.stddev),
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean(values);
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

/// Linear interpolation between closest ranks. `sorted` must be in ascending order.
fn interpolate(sorted: &[f64], p: f64) -> f64 {
    let Some(last) = sorted.len().checked_sub(1) else {
        return 0.0;
    };
    if p.is_nan() {
        return 0.0;
    }

    let rank = p.clamp(0.0, 100.0) / 100.0 * last as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn empty_set_is_neutral() {
        let set = SampleSet::new();

        assert_eq!(set.min(), 0.0);
        assert_eq!(set.max(), 0.0);
        assert_eq!(set.mean(), 0.0);
        assert_eq!(set.percentile(50.0), 0.0);
        assert_eq!(set.percentile(99.0), 0.0);
        assert_eq!(set.stddev(), 0.0);

        let summary = set.summarize(&[50.0, 90.0]);
        assert_eq!(summary.count, 0);
        assert_eq!(summary.percentile(90.0), Some(0.0));
        assert_eq!(summary.stddev, 0.0);
    }

    #[test]
    fn single_sample() {
        let set: SampleSet = [5.0].into_iter().collect();

        assert_eq!(set.stddev(), 0.0);
        assert_eq!(set.mean(), 5.0);
        assert_eq!(set.percentile(1.0), 5.0);
        assert_eq!(set.percentile(99.0), 5.0);
    }

    #[test]
    fn min_max_ignore_insertion_order() {
        let set: SampleSet = [3.0, -1.5, 8.25, 0.0].into_iter().collect();

        assert_eq!(set.min(), -1.5);
        assert_eq!(set.max(), 8.25);
        assert_eq!(set.values(), &[3.0, -1.5, 8.25, 0.0]);
    }

    #[test]
    fn mean_of_evens() {
        let set: SampleSet = [2.0, 4.0, 6.0].into_iter().collect();
        assert_eq!(set.mean(), 4.0);
    }

    #[test]
    fn percentiles_interpolate() {
        let set: SampleSet = [5.0, 1.0, 4.0, 2.0, 3.0].into_iter().collect();

        assert_eq!(set.percentile(50.0), 3.0);
        assert_eq!(set.percentile(0.0), 1.0);
        assert_eq!(set.percentile(100.0), 5.0);
        assert_close(set.percentile(90.0), 4.6);
        assert_close(set.percentile(99.0), 4.96);
        assert_close(set.percentile(10.0), 1.4);
        assert_close(set.percentile(1.0), 1.04);
    }

    #[test]
    fn percentile_out_of_range_is_clamped() {
        let set: SampleSet = [1.0, 2.0].into_iter().collect();

        assert_eq!(set.percentile(-10.0), 1.0);
        assert_eq!(set.percentile(250.0), 2.0);
        assert_eq!(set.percentile(f64::NAN), 0.0);
    }

    #[test]
    fn population_stddev() {
        let set: SampleSet = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]
            .into_iter()
            .collect();
        assert_eq!(set.stddev(), 2.0);
    }

    #[test]
    fn summary_matches_individual_statistics() {
        let set: SampleSet = (1..=100).map(f64::from).collect();
        let summary = set.summarize(&[50.0, 90.0, 99.0]);

        assert_eq!(summary.count, 100);
        assert_eq!(summary.min, set.min());
        assert_eq!(summary.max, set.max());
        assert_eq!(summary.mean, set.mean());
        assert_eq!(summary.stddev, set.stddev());
        assert_eq!(summary.percentile(50.0), Some(set.percentile(50.0)));
        assert_eq!(summary.percentile(99.0), Some(set.percentile(99.0)));
        assert_eq!(summary.percentile(10.0), None);
    }

    #[test]
    fn summary_map_scales_values() {
        let set: SampleSet = [1_000_000.0, 3_000_000.0].into_iter().collect();
        let summary = set.summarize(&[50.0]).map(|value| value / 1_000_000.0);

        assert_eq!(summary.count, 2);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 3.0);
        assert_eq!(summary.percentile(50.0), Some(2.0));
        assert_eq!(summary.stddev, 1.0);
    }
}
