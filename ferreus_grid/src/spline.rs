/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the biharmonic spline estimator: fitting, prediction and duplicate handling.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Biharmonic spline interpolation of scattered data.
//!
//! The fitted surface is a sum of Green's functions of the biharmonic
//! operator centred at a set of force points,
//!
//! ```text
//! ŷ(x) = Σ_j c_j g(‖x − f_j‖),    g(r) = r² (ln r − 1)
//! ```
//!
//! which describes the deflection of a thin elastic sheet pushed by point
//! forces at `f_j`. Coefficients are found by damped weighted least squares.

use crate::{
    config::{DuplicatePolicy, SplineBuilder, SplineSettings},
    coordinates::Region,
    data::{check_coordinates, ScatteredData},
    error::{GridderError, Result},
    estimator::Estimator,
    kdtree::{DistanceMetric, KDTree},
    linalg,
    progress::{self, ProgressMsg},
};
use faer::{Mat, MatRef};
use ferreus_grid_utils::{kernels::BiharmonicGreens, GreensFunction};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{fmt, time::Instant};

/// State produced by a successful fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SplineFit {
    force_coords: Mat<f64>,
    /// `n_force x K`
    coefficients: Mat<f64>,
    damping: f64,
    mindist: f64,
    region: Region,
}

/// Biharmonic spline estimator.
///
/// # Examples
/// ```
/// use ferreus_grid::{Spline, ScatteredData, Estimator};
/// use faer::mat;
///
/// let data = ScatteredData::from_slices(
///     &[0.0, 1.0, 0.0, 1.0, 0.5],
///     &[0.0, 0.0, 1.0, 1.0, 0.5],
///     &[1.0, 2.0, 3.0, 4.0, 2.5],
/// )?;
///
/// let mut spline = Spline::builder().build()?;
/// spline.fit(&data)?;
///
/// let predicted = spline.predict(mat![[0.5, 0.5f64]].as_ref())?;
/// assert!((predicted[(0, 0)] - 2.5).abs() < 1e-8);
/// # Ok::<(), ferreus_grid::GridderError>(())
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Spline {
    settings: SplineSettings,
    fit: Option<SplineFit>,
}

impl Spline {
    /// Returns a builder with exact interpolation defaults.
    pub fn builder() -> SplineBuilder {
        SplineBuilder::default()
    }

    /// Creates an unfitted spline from validated settings.
    pub fn new(settings: SplineSettings) -> Result<Self> {
        settings.check()?;
        Ok(Spline {
            settings,
            fit: None,
        })
    }

    pub fn settings(&self) -> &SplineSettings {
        &self.settings
    }

    /// Force point locations of the current fit.
    pub fn force_coords(&self) -> Option<MatRef<'_, f64>> {
        self.fit.as_ref().map(|f| f.force_coords.as_ref())
    }

    /// `n_force x K` coefficients of the current fit.
    pub fn coefficients(&self) -> Option<MatRef<'_, f64>> {
        self.fit.as_ref().map(|f| f.coefficients.as_ref())
    }

    /// Region of the data of the current fit.
    pub fn region(&self) -> Option<Region> {
        self.fit.as_ref().map(|f| f.region)
    }

    /// Fits the spline to `data`, replacing any previous fit.
    ///
    /// On error the previous fit (if any) is kept untouched.
    ///
    /// # Errors
    /// - `EmptyInput` for an empty dataset.
    /// - `SingularSystem` for force points within `mindist` of each other
    ///   under [`DuplicatePolicy::Reject`], or a solve that does not produce a
    ///   finite solution.
    pub fn fit(&mut self, data: &ScatteredData) -> Result<()> {
        let fit_start = Instant::now();

        self.settings.check()?;

        if data.is_empty() {
            return Err(GridderError::EmptyInput("cannot fit a spline to zero points".into()));
        }

        let region = data.region()?;

        let (data, force_coords) = match &self.settings.force_coords {
            None => {
                let data = self.mitigate_data(data)?;
                let force = data.coordinates().to_owned();
                (data, force)
            }
            Some(force) => (data.clone(), self.mitigate_force(force.as_ref())?),
        };

        let symmetric = self.settings.force_coords.is_none();
        let jacobian = jacobian(data.coordinates(), force_coords.as_ref(), symmetric);
        progress::emit(
            &self.settings.progress_callback,
            ProgressMsg::SystemAssembled {
                nrows: jacobian.nrows(),
                ncols: jacobian.ncols(),
            },
        );

        let coefficients = linalg::damped_least_squares(
            jacobian.as_ref(),
            data.values(),
            data.weights(),
            self.settings.damping,
        )?;

        log::debug!(
            "fitted spline with {} force points to {} data points in {:.3?}",
            force_coords.nrows(),
            data.len(),
            fit_start.elapsed()
        );

        self.fit = Some(SplineFit {
            force_coords,
            coefficients,
            damping: self.settings.damping,
            mindist: self.settings.mindist,
            region,
        });

        Ok(())
    }

    /// Applies the duplicate policy to data points used as force points.
    ///
    /// Merging repeats until no two points lie within `mindist`, since a
    /// merged point can land within `mindist` of a neighbour.
    fn mitigate_data(&self, data: &ScatteredData) -> Result<ScatteredData> {
        let mut merged = data.clone();

        loop {
            let groups = group_close_points(merged.coordinates(), self.settings.mindist);
            if groups.len() == merged.len() {
                break;
            }
            if self.settings.duplicates == DuplicatePolicy::Reject {
                return Err(duplicates_error(merged.len() - groups.len(), self.settings.mindist));
            }
            merged = merge_groups(&merged, &groups)?;
        }

        if merged.len() < data.len() {
            self.report_merge(data.len() - merged.len());
        }
        Ok(merged)
    }

    /// Applies the duplicate policy to explicit force points. The data keep
    /// their locations.
    fn mitigate_force(&self, force: MatRef<f64>) -> Result<Mat<f64>> {
        let mut merged = force.to_owned();
        // Original points represented by each merged point.
        let mut counts = vec![1.0; force.nrows()];

        loop {
            let groups = group_close_points(merged.as_ref(), self.settings.mindist);
            if groups.len() == merged.nrows() {
                break;
            }
            if self.settings.duplicates == DuplicatePolicy::Reject {
                return Err(duplicates_error(merged.nrows() - groups.len(), self.settings.mindist));
            }

            let group_counts: Vec<f64> = groups
                .iter()
                .map(|g| g.iter().map(|&i| counts[i]).sum())
                .collect();
            merged = Mat::from_fn(groups.len(), 2, |g, d| {
                groups[g].iter().map(|&i| counts[i] * merged[(i, d)]).sum::<f64>() / group_counts[g]
            });
            counts = group_counts;
        }

        if merged.nrows() < force.nrows() {
            self.report_merge(force.nrows() - merged.nrows());
        }
        Ok(merged)
    }

    fn report_merge(&self, num_merged: usize) {
        log::warn!(
            "merged {} force points closer than mindist = {}",
            num_merged,
            self.settings.mindist
        );
        progress::emit(
            &self.settings.progress_callback,
            ProgressMsg::ForcePointsMerged { num_merged },
        );
    }

    /// Evaluates the fitted spline at `N x 2` coordinates, returning `N x K`.
    ///
    /// # Errors
    /// - `NotFitted` before a successful [`fit`](Self::fit).
    pub fn predict(&self, coordinates: MatRef<f64>) -> Result<Mat<f64>> {
        let fit = self
            .fit
            .as_ref()
            .ok_or_else(|| GridderError::NotFitted("Spline".into()))?;

        check_coordinates(coordinates)?;

        let num_channels = fit.coefficients.ncols();
        let force = fit.force_coords.as_ref();
        let coefficients = fit.coefficients.as_ref();

        let rows: Vec<Vec<f64>> = (0..coordinates.nrows())
            .into_par_iter()
            .map(|i| {
                let target = coordinates.row(i);
                let mut out = vec![0.0; num_channels];
                for j in 0..force.nrows() {
                    let g = BiharmonicGreens.evaluate(target, force.row(j));
                    for (k, v) in out.iter_mut().enumerate() {
                        *v += g * coefficients[(j, k)];
                    }
                }
                out
            })
            .collect();

        Ok(Mat::from_fn(rows.len(), num_channels, |i, k| rows[i][k]))
    }
}

impl SplineBuilder {
    /// Validates the settings and returns an unfitted [`Spline`].
    pub fn build(self) -> Result<Spline> {
        Spline::new(self.settings()?)
    }
}

impl fmt::Display for Spline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Spline(damping={}, mindist={}, duplicates={:?}, force_coords={})",
            self.settings.damping,
            self.settings.mindist,
            self.settings.duplicates,
            match &self.settings.force_coords {
                Some(force) => format!("{} points", force.nrows()),
                None => "data".to_string(),
            }
        )
    }
}

impl Estimator for Spline {
    fn name(&self) -> &'static str {
        "Spline"
    }

    fn fit_transform(&mut self, data: &ScatteredData) -> Result<ScatteredData> {
        self.fit(data)?;
        Ok(data.clone())
    }

    fn predict(&self, coordinates: MatRef<f64>) -> Result<Mat<f64>> {
        Spline::predict(self, coordinates)
    }

    fn is_fitted(&self) -> bool {
        self.fit.is_some()
    }

    fn fitted_region(&self) -> Result<Region> {
        self.region()
            .ok_or_else(|| GridderError::NotFitted(self.name().to_string()))
    }
}

/// `G[i][j] = g(‖data_i − force_j‖)`. `symmetric` means the force points
/// are the data points.
fn jacobian(data: MatRef<f64>, force: MatRef<f64>, symmetric: bool) -> Mat<f64> {
    if symmetric {
        ferreus_grid_utils::get_greens_matrix_symmetric(data, &BiharmonicGreens)
    } else {
        ferreus_grid_utils::get_greens_matrix(data, force, &BiharmonicGreens)
    }
}

/// Groups points whose infinity-norm separation is at most `mindist`.
///
/// Every point lands in exactly one group; the first point of a group is the
/// one whose neighbourhood formed it. Exact duplicates are always grouped.
pub(crate) fn group_close_points(points: MatRef<f64>, mindist: f64) -> Vec<Vec<usize>> {
    let kdtree = KDTree::new(points);
    let mut visited = vec![false; points.nrows()];
    let mut groups = Vec::new();

    for i in 0..points.nrows() {
        if visited[i] {
            continue;
        }

        let mut group = vec![i];
        visited[i] = true;

        let mut neighbours = kdtree.radius_search(
            [points[(i, 0)], points[(i, 1)]],
            mindist,
            DistanceMetric::InfinityNorm,
        );
        neighbours.sort_unstable();

        for j in neighbours {
            if !visited[j] {
                visited[j] = true;
                group.push(j);
            }
        }
        groups.push(group);
    }

    groups
}

/// Replaces each group by its weighted mean, carrying the summed weight.
fn merge_groups(data: &ScatteredData, groups: &[Vec<usize>]) -> Result<ScatteredData> {
    let coords = data.coordinates();
    let values = data.values();
    let num_channels = data.n_channels();

    let group_weights: Vec<f64> = groups
        .iter()
        .map(|g| g.iter().map(|&i| data.weight(i)).sum())
        .collect();

    let weighted_mean = |source: MatRef<f64>, g: usize, col: usize| -> f64 {
        let members = &groups[g];
        match group_weights[g] > 0.0 {
            true => {
                members
                    .iter()
                    .map(|&i| data.weight(i) * source[(i, col)])
                    .sum::<f64>()
                    / group_weights[g]
            }
            false => members.iter().map(|&i| source[(i, col)]).sum::<f64>() / members.len() as f64,
        }
    };

    let merged_coords = Mat::from_fn(groups.len(), 2, |g, d| weighted_mean(coords, g, d));
    let merged_values = Mat::from_fn(groups.len(), num_channels, |g, k| weighted_mean(values, g, k));

    ScatteredData::new(merged_coords, merged_values, Some(group_weights))
}

fn duplicates_error(num_duplicates: usize, mindist: f64) -> GridderError {
    GridderError::SingularSystem(format!(
        "{} force points lie within mindist = {} of another point",
        num_duplicates, mindist
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{generate_random_points, TestFunctions};
    use approx::assert_abs_diff_eq;
    use equator::assert;
    use faer::{mat, utils::approx::*};

    fn franke_data(n: usize, seed: u64) -> ScatteredData {
        let region = Region::new(0.0, 1.0, 0.0, 1.0).unwrap();
        let coords = generate_random_points(n, &region, Some(seed));
        let values = TestFunctions::franke_2d(coords.as_ref());
        ScatteredData::new(coords, values, None).unwrap()
    }

    #[test]
    fn exact_interpolation_reproduces_training_values() {
        let data = franke_data(60, 11);
        let mut spline = Spline::builder().build().unwrap();
        spline.fit(&data).unwrap();

        let predicted = spline.predict(data.coordinates()).unwrap();
        let expected = data.values().to_owned();

        let approx_eq = CwiseMat(ApproxEq::eps() * 1e9);
        assert!(&predicted ~ &expected);
    }

    #[test]
    fn predict_before_fit_is_an_error() {
        let spline = Spline::builder().build().unwrap();
        assert_eq!(
            spline.predict(mat![[0.0, 0.0f64]].as_ref()).unwrap_err(),
            GridderError::NotFitted("Spline".into())
        );
    }

    #[test]
    fn damping_lowers_training_score() {
        let data = franke_data(80, 3);
        let mut previous = f64::INFINITY;

        for damping in [0.0, 1e-4, 1e-2, 1.0] {
            let mut spline = Spline::builder().damping(damping).build().unwrap();
            spline.fit(&data).unwrap();
            let score = spline.score(&data).unwrap();

            if damping == 0.0 {
                assert_abs_diff_eq!(score, 1.0, epsilon = 1e-8);
            }
            assert!(score <= previous + 1e-10);
            previous = score;
        }
    }

    #[test]
    fn duplicates_are_merged_by_default() {
        let data = ScatteredData::from_slices(
            &[0.0, 1.0, 0.0, 1.0, 1.0],
            &[0.0, 0.0, 1.0, 1.0, 1.0],
            &[1.0, 2.0, 3.0, 4.0, 6.0],
        )
        .unwrap();

        let mut spline = Spline::builder().build().unwrap();
        spline.fit(&data).unwrap();

        assert_eq!(spline.force_coords().unwrap().nrows(), 4);
        let predicted = spline.predict(mat![[1.0, 1.0f64]].as_ref()).unwrap();
        assert_abs_diff_eq!(predicted[(0, 0)], 5.0, epsilon = 1e-8);
    }

    #[test]
    fn merge_uses_weighted_mean() {
        let data = ScatteredData::from_slices(&[0.0, 0.05, 1.0, 0.0], &[0.0, 0.0, 0.0, 1.0], &[1.0, 4.0, 0.0, 0.0])
            .unwrap()
            .with_weights(vec![2.0, 1.0, 1.0, 1.0])
            .unwrap();

        let groups = group_close_points(data.coordinates(), 0.1);
        assert_eq!(groups, vec![vec![0, 1], vec![2], vec![3]]);

        let merged = merge_groups(&data, &groups).unwrap();
        assert_abs_diff_eq!(merged.values()[(0, 0)], 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(merged.coordinates()[(0, 0)], 0.05 / 3.0, epsilon = 1e-12);
        assert_eq!(merged.weights(), Some(&[3.0, 1.0, 1.0][..]));
    }

    #[test]
    fn reject_policy_fails_on_duplicates() {
        let data = ScatteredData::from_slices(&[0.0, 0.0, 1.0], &[0.0, 0.0, 1.0], &[1.0, 2.0, 3.0]).unwrap();
        let mut spline = Spline::builder()
            .duplicates(DuplicatePolicy::Reject)
            .build()
            .unwrap();

        assert!(matches!(spline.fit(&data), Err(GridderError::SingularSystem(_))));
        assert!(!spline.is_fitted());
    }

    #[test]
    fn failed_refit_keeps_previous_state() {
        let good = franke_data(20, 1);
        let mut spline = Spline::builder()
            .duplicates(DuplicatePolicy::Reject)
            .build()
            .unwrap();
        spline.fit(&good).unwrap();
        let before = spline.coefficients().unwrap().to_owned();

        let bad = ScatteredData::from_slices(&[0.0, 0.0], &[0.0, 0.0], &[1.0, 2.0]).unwrap();
        assert!(spline.fit(&bad).is_err());
        assert_eq!(spline.coefficients().unwrap().to_owned(), before);
    }

    #[test]
    fn mindist_merges_close_points() {
        let data = ScatteredData::from_slices(&[0.0, 0.01, 1.0, 2.0], &[0.0, 0.0, 1.0, 0.0], &[1.0, 1.2, 3.0, 2.0])
            .unwrap();
        let mut spline = Spline::builder().mindist(0.05).build().unwrap();
        spline.fit(&data).unwrap();
        assert_eq!(spline.force_coords().unwrap().nrows(), 3);
    }

    fn min_separation(points: MatRef<f64>) -> f64 {
        let mut min = f64::INFINITY;
        for i in 0..points.nrows() {
            for j in i + 1..points.nrows() {
                let de = points[(i, 0)] - points[(j, 0)];
                let dn = points[(i, 1)] - points[(j, 1)];
                min = min.min(de.hypot(dn));
            }
        }
        min
    }

    #[test]
    fn merged_points_respect_mindist() {
        // The first pass places (0, 0) and (1, 0) at (0.5, 0), within 1 of (1.2, 0)
        let data = ScatteredData::from_slices(&[0.0, 1.0, 1.2, 5.0], &[0.0, 0.0, 0.0, 3.0], &[1.0, 2.0, 4.0, 0.0])
            .unwrap();

        let mut spline = Spline::builder().mindist(1.0).build().unwrap();
        spline.fit(&data).unwrap();

        let force = spline.force_coords().unwrap();
        assert_eq!(force.nrows(), 2);
        assert!(min_separation(force) > 1.0);
        assert_abs_diff_eq!(force[(0, 0)], 2.2 / 3.0, epsilon = 1e-12);

        let predicted = spline.predict(mat![[2.2 / 3.0, 0.0f64]].as_ref()).unwrap();
        assert_abs_diff_eq!(predicted[(0, 0)], 7.0 / 3.0, epsilon = 1e-8);

        let mut strict = Spline::builder()
            .mindist(1.0)
            .duplicates(DuplicatePolicy::Reject)
            .build()
            .unwrap();
        assert!(matches!(strict.fit(&data), Err(GridderError::SingularSystem(_))));
    }

    #[test]
    fn merged_force_points_respect_mindist() {
        let data = franke_data(20, 5);
        let force = mat![[0.0, 0.0], [0.1, 0.0], [0.12, 0.0], [0.9, 0.9f64]];

        let mut spline = Spline::builder()
            .force_coords(force)
            .mindist(0.1)
            .damping(1e-6)
            .build()
            .unwrap();
        spline.fit(&data).unwrap();

        let force = spline.force_coords().unwrap();
        assert_eq!(force.nrows(), 2);
        assert!(min_separation(force) > 0.1);
        assert_abs_diff_eq!(force[(0, 0)], 0.22 / 3.0, epsilon = 1e-12);
        assert_eq!(spline.coefficients().unwrap().nrows(), 2);
    }

    #[test]
    fn explicit_force_points_with_damping() {
        let data = franke_data(100, 8);
        let force = generate_random_points(30, &Region::new(0.0, 1.0, 0.0, 1.0).unwrap(), Some(2));

        let mut spline = Spline::builder()
            .force_coords(force)
            .damping(1e-6)
            .build()
            .unwrap();
        spline.fit(&data).unwrap();

        assert_eq!(spline.coefficients().unwrap().shape(), (30, 1));
        assert!(spline.score(&data).unwrap() > 0.5);
    }

    #[test]
    fn multi_channel_fit() {
        let region = Region::new(0.0, 1.0, 0.0, 1.0).unwrap();
        let coords = generate_random_points(40, &region, Some(4));
        let franke = TestFunctions::franke_2d(coords.as_ref());
        let plane = TestFunctions::linear(coords.as_ref(), 1.0, -2.0, 0.5);
        let values = Mat::from_fn(40, 2, |i, k| match k {
            0 => franke[(i, 0)],
            _ => plane[(i, 0)],
        });
        let data = ScatteredData::new(coords, values, None).unwrap();

        let mut spline = Spline::builder().build().unwrap();
        spline.fit(&data).unwrap();

        let predicted = spline.predict(data.coordinates()).unwrap();
        assert_eq!(predicted.shape(), (40, 2));
        assert_abs_diff_eq!(predicted[(7, 1)], data.values()[(7, 1)], epsilon = 1e-6);
    }

    #[test]
    fn serialised_spline_predicts_identically() {
        let data = franke_data(30, 21);
        let mut spline = Spline::builder().damping(1e-6).build().unwrap();
        spline.fit(&data).unwrap();

        let json = serde_json::to_string(&spline).unwrap();
        let restored: Spline = serde_json::from_str(&json).unwrap();

        let query = mat![[0.3, 0.7], [0.9, 0.1f64]];
        let before = spline.predict(query.as_ref()).unwrap();
        let after = restored.predict(query.as_ref()).unwrap();

        let approx_eq = CwiseMat(ApproxEq::eps() * 1e6);
        assert!(&before ~ &after);
    }

    #[test]
    fn display_lists_settings() {
        let spline = Spline::builder().damping(0.5).build().unwrap();
        assert_eq!(
            spline.to_string(),
            "Spline(damping=0.5, mindist=0, duplicates=Merge, force_coords=data)"
        );
    }
}
