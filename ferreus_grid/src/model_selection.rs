/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides train/test splitting, k-fold partitioning and cross-validated scoring.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Model selection: reproducible data splits and validation scores.

use crate::{
    common::make_rng,
    data::ScatteredData,
    error::{GridderError, Result},
    estimator::Estimator,
    progress::{self, ProgressMsg, ProgressSink},
};
use rand::seq::SliceRandom;
use std::sync::Arc;

/// Fraction of points held out by default.
pub const DEFAULT_TEST_SIZE: f64 = 0.25;

/// Shuffles `0..n` and splits it into `(train, test)` index sets with
/// `round(n * test_size)` test indices.
pub fn train_test_indices(
    n: usize,
    test_size: f64,
    random_state: Option<u64>,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !test_size.is_finite() || test_size <= 0.0 || test_size >= 1.0 {
        return Err(GridderError::invalid(
            "test_size",
            test_size,
            "test_size must lie strictly between 0 and 1",
        ));
    }

    let num_test = (n as f64 * test_size).round() as usize;
    if num_test == 0 || num_test >= n {
        return Err(GridderError::invalid(
            "test_size",
            test_size,
            format!("splitting {} points leaves an empty train or test set", n),
        ));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(&mut make_rng(random_state));

    let train = indices.split_off(num_test);
    Ok((train, indices))
}

/// Randomly splits a dataset into `(train, test)` datasets.
///
/// The same `random_state` always gives the same split. `None` seeds the
/// shuffle from the operating system. Coordinates, values and weights stay
/// associated per point.
///
/// # Examples
/// ```
/// use ferreus_grid::{train_test_split, ScatteredData, DEFAULT_TEST_SIZE};
///
/// let x: Vec<f64> = (0..20).map(f64::from).collect();
/// let data = ScatteredData::from_slices(&x, &x, &x)?;
/// let (train, test) = train_test_split(&data, DEFAULT_TEST_SIZE, Some(0))?;
/// assert_eq!((train.len(), test.len()), (15, 5));
/// # Ok::<(), ferreus_grid::GridderError>(())
/// ```
///
/// # Errors
/// - `EmptyInput` for an empty dataset.
/// - `InvalidParameter` when `test_size` is outside `(0, 1)` or leaves either
///   set empty.
pub fn train_test_split(
    data: &ScatteredData,
    test_size: f64,
    random_state: Option<u64>,
) -> Result<(ScatteredData, ScatteredData)> {
    if data.is_empty() {
        return Err(GridderError::EmptyInput("cannot split zero points".into()));
    }

    let (train, test) = train_test_indices(data.len(), test_size, random_state)?;
    Ok((data.select(&train), data.select(&test)))
}

/// K-fold partition of point indices.
#[derive(Debug, Clone)]
pub struct KFold {
    pub n_splits: usize,
    pub shuffle: bool,
    pub random_state: Option<u64>,
    pub progress_callback: Option<Arc<dyn ProgressSink>>,
}

impl Default for KFold {
    fn default() -> Self {
        KFold::new(5)
    }
}

impl KFold {
    /// Contiguous folds without shuffling.
    pub fn new(n_splits: usize) -> Self {
        KFold {
            n_splits,
            shuffle: false,
            random_state: None,
            progress_callback: None,
        }
    }

    /// Shuffles indices before partitioning.
    pub fn shuffle(mut self, random_state: Option<u64>) -> Self {
        self.shuffle = true;
        self.random_state = random_state;
        self
    }

    /// Receives a [`ProgressMsg::FoldScored`] per fold.
    pub fn progress_callback(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress_callback = Some(sink);
        self
    }

    /// `(train, test)` index pairs for `n` points. Test folds are disjoint and
    /// cover every index once; the first `n % n_splits` folds hold one extra
    /// index.
    pub fn split(&self, n: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
        if self.n_splits < 2 || self.n_splits > n {
            return Err(GridderError::invalid(
                "n_splits",
                self.n_splits,
                format!("must be at least 2 and at most the number of points ({})", n),
            ));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        if self.shuffle {
            indices.shuffle(&mut make_rng(self.random_state));
        }

        let base = n / self.n_splits;
        let extra = n % self.n_splits;

        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0;
        for fold in 0..self.n_splits {
            let size = base + usize::from(fold < extra);
            let test = indices[start..start + size].to_vec();
            let train = indices[..start]
                .iter()
                .chain(&indices[start + size..])
                .copied()
                .collect();
            folds.push((train, test));
            start += size;
        }

        Ok(folds)
    }
}

/// Fits the estimator on each training fold and scores it on the held-out
/// fold, returning one R² per fold.
///
/// The estimator is left fitted on the last training fold.
pub fn cross_val_score<E>(estimator: &mut E, data: &ScatteredData, kfold: &KFold) -> Result<Vec<f64>>
where
    E: Estimator + ?Sized,
{
    let folds = kfold.split(data.len())?;
    let mut scores = Vec::with_capacity(folds.len());

    for (fold, (train, test)) in folds.iter().enumerate() {
        estimator.fit_transform(&data.select(train))?;
        let score = estimator.score(&data.select(test))?;

        log::debug!("fold {} of {}: score {:.6}", fold + 1, folds.len(), score);
        progress::emit(&kfold.progress_callback, ProgressMsg::FoldScored { fold, score });

        scores.push(score);
    }

    Ok(scores)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{generate_random_points, Region, Spline, TestFunctions};

    fn sample(n: usize) -> ScatteredData {
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let v: Vec<f64> = x.iter().map(|x| x * x).collect();
        ScatteredData::from_slices(&x, &x, &v).unwrap()
    }

    #[test]
    fn split_is_an_exact_partition() {
        let (mut train, test) = train_test_indices(40, 0.3, Some(7)).unwrap();
        assert_eq!(test.len(), 12);
        assert_eq!(train.len(), 28);

        train.extend(&test);
        train.sort_unstable();
        assert_eq!(train, (0..40).collect::<Vec<_>>());
    }

    #[test]
    fn split_is_deterministic() {
        let data = sample(30);
        let (train_a, test_a) = train_test_split(&data, 0.25, Some(0)).unwrap();
        let (train_b, test_b) = train_test_split(&data, 0.25, Some(0)).unwrap();
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);
    }

    #[test]
    fn different_seeds_give_different_splits() {
        let (_, a) = train_test_indices(100, 0.25, Some(1)).unwrap();
        let (_, b) = train_test_indices(100, 0.25, Some(2)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn split_keeps_points_associated() {
        let data = sample(20);
        let (train, _) = train_test_split(&data, 0.5, Some(3)).unwrap();
        for i in 0..train.len() {
            let x = train.coordinates()[(i, 0)];
            assert_eq!(train.values()[(i, 0)], x * x);
        }
    }

    #[test]
    fn bad_test_size_is_rejected() {
        let data = sample(10);
        for test_size in [0.0, 1.0, -0.1, 1.5, f64::NAN, 0.01, 0.99] {
            assert!(matches!(
                train_test_split(&data, test_size, Some(0)),
                Err(GridderError::InvalidParameter { name: "test_size", .. })
            ));
        }
    }

    #[test]
    fn kfold_covers_every_index_once() {
        let folds = KFold::new(3).shuffle(Some(5)).split(10).unwrap();
        assert_eq!(folds.len(), 3);
        assert_eq!(folds[0].1.len(), 4);
        assert_eq!(folds[2].1.len(), 3);

        let mut seen: Vec<usize> = folds.iter().flat_map(|(_, test)| test.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());

        for (train, test) in &folds {
            assert_eq!(train.len() + test.len(), 10);
            assert!(test.iter().all(|i| !train.contains(i)));
        }
    }

    #[test]
    fn kfold_needs_two_splits() {
        assert!(KFold::new(1).split(10).is_err());
        assert!(KFold::new(11).split(10).is_err());
    }

    #[test]
    fn cross_validation_scores_each_fold() {
        let region = Region::new(0.0, 10.0, 0.0, 10.0).unwrap();
        let coords = generate_random_points(60, &region, Some(17));
        let values = TestFunctions::linear(coords.as_ref(), 2.0, 3.0, 0.0);
        let data = ScatteredData::new(coords, values, None).unwrap();

        let mut spline = Spline::builder().damping(1e-8).build().unwrap();
        let scores = cross_val_score(&mut spline, &data, &KFold::new(4).shuffle(Some(0))).unwrap();

        assert_eq!(scores.len(), 4);
        assert!(scores.iter().all(|&s| s > 0.9));
    }
}
