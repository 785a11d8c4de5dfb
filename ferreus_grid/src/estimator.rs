/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines the estimator contract shared by filters, splines and chains.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! The [`Estimator`] trait and the grid/score behaviour built on top of `predict`.

use crate::{
    coordinates::grid_axes,
    data::ScatteredData,
    error::{GridderError, Result},
    grid::{Grid, GridSpec, GridVariable},
    projection::project_coordinates,
};
use faer::{Mat, MatRef};
use std::fmt::Display;

/// Common capability set of every processing step.
///
/// Filters (such as [`BlockReduce`](crate::BlockReduce)) transform the data
/// and cannot predict. Predictors (such as [`Spline`](crate::Spline)) pass
/// their input through unchanged and evaluate a fitted model.
pub trait Estimator: Display + Send + Sync {
    /// Short type name used in error messages.
    fn name(&self) -> &'static str;

    /// Fits the step and returns the data the next step consumes.
    fn fit_transform(&mut self, data: &ScatteredData) -> Result<ScatteredData>;

    /// Evaluates the fitted model at `N x 2` coordinates, returning `N x K`.
    fn predict(&self, coordinates: MatRef<f64>) -> Result<Mat<f64>>;

    fn is_fitted(&self) -> bool;

    fn supports_prediction(&self) -> bool {
        true
    }

    /// Region of the data the model was fitted on.
    fn fitted_region(&self) -> Result<crate::Region>;

    /// Evaluates the model over a regular grid.
    fn grid(&self, spec: &GridSpec) -> Result<Grid> {
        predict_grid(self, spec)
    }

    /// R² of the predictions at `data` against its values.
    fn score(&self, data: &ScatteredData) -> Result<f64> {
        let predicted = self.predict(data.coordinates())?;
        r2_score(data, predicted.as_ref())
    }
}

/// Checks an estimator can serve predictions.
pub(crate) fn ensure_predictive<E: Estimator + ?Sized>(estimator: &E) -> Result<()> {
    if !estimator.supports_prediction() {
        return Err(GridderError::NotPredictive(estimator.name().to_string()));
    }
    if !estimator.is_fitted() {
        return Err(GridderError::NotFitted(estimator.name().to_string()));
    }
    Ok(())
}

/// Generates the grid nodes described by `spec`, predicts at them and packs
/// the result into a [`Grid`].
pub fn predict_grid<E: Estimator + ?Sized>(estimator: &E, spec: &GridSpec) -> Result<Grid> {
    ensure_predictive(estimator)?;

    let region = match (spec.region, &spec.projection) {
        (Some(region), _) => region,
        (None, None) => estimator.fitted_region()?,
        (None, Some(_)) => {
            return Err(GridderError::invalid(
                "region",
                "None",
                "a region in unprojected coordinates is required when a projection is given",
            ))
        }
    };

    let (northing, easting) = grid_axes(&region, spec.spacing, spec.adjust)?;
    let rows = northing.len();
    let cols = easting.len();

    let mut nodes = Mat::from_fn(rows * cols, 2, |k, d| match d {
        0 => easting[k % cols],
        _ => northing[k / cols],
    });

    if let Some(projection) = &spec.projection {
        nodes = project_coordinates(nodes.as_ref(), projection.as_ref());
    }

    let predicted = estimator.predict(nodes.as_ref())?;
    let names = spec.resolve_names(predicted.ncols())?;

    log::debug!(
        "gridded {} channel(s) on {} x {} nodes",
        predicted.ncols(),
        rows,
        cols
    );

    let variables = names
        .into_iter()
        .enumerate()
        .map(|(channel, name)| GridVariable {
            name,
            values: Mat::from_fn(rows, cols, |i, j| predicted[(i * cols + j, channel)]),
        })
        .collect();

    Grid::new(spec.dims.clone(), northing, easting, variables)
}

/// Coefficient of determination between `predicted` and the values of `data`.
///
/// Uses the dataset weights when present and averages uniformly across
/// value channels.
///
/// # Errors
/// - `EmptyInput` for an empty dataset.
/// - `InvalidParameter` when the shapes differ or a channel has zero variance.
pub fn r2_score(data: &ScatteredData, predicted: MatRef<f64>) -> Result<f64> {
    if data.is_empty() {
        return Err(GridderError::EmptyInput("cannot score zero points".into()));
    }

    let observed = data.values();
    if predicted.shape() != observed.shape() {
        return Err(GridderError::invalid(
            "predicted",
            format!("{:?}", predicted.shape()),
            format!("expected shape {:?}", observed.shape()),
        ));
    }

    let n = data.len();
    let total_weight: f64 = (0..n).map(|i| data.weight(i)).sum();
    if total_weight <= 0.0 {
        return Err(GridderError::invalid(
            "weights",
            total_weight,
            "weights must not all be zero",
        ));
    }

    let mut total = 0.0;
    for channel in 0..observed.ncols() {
        let mean = (0..n)
            .map(|i| data.weight(i) * observed[(i, channel)])
            .sum::<f64>()
            / total_weight;

        let ss_res: f64 = (0..n)
            .map(|i| data.weight(i) * (observed[(i, channel)] - predicted[(i, channel)]).powi(2))
            .sum();
        let ss_tot: f64 = (0..n)
            .map(|i| data.weight(i) * (observed[(i, channel)] - mean).powi(2))
            .sum();

        if ss_tot == 0.0 {
            return Err(GridderError::invalid(
                "values",
                format!("channel {}", channel),
                "R² is undefined for data with zero variance",
            ));
        }

        total += 1.0 - ss_res / ss_tot;
    }

    Ok(total / observed.ncols() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use faer::mat;

    fn data() -> ScatteredData {
        ScatteredData::from_slices(&[0.0, 1.0, 2.0, 3.0], &[0.0; 4], &[1.0, 2.0, 3.0, 4.0]).unwrap()
    }

    #[test]
    fn perfect_prediction_scores_one() {
        let predicted = mat![[1.0], [2.0], [3.0], [4.0f64]];
        assert_relative_eq!(r2_score(&data(), predicted.as_ref()).unwrap(), 1.0);
    }

    #[test]
    fn mean_prediction_scores_zero() {
        let predicted = Mat::from_fn(4, 1, |_, _| 2.5);
        assert_relative_eq!(r2_score(&data(), predicted.as_ref()).unwrap(), 0.0);
    }

    #[test]
    fn known_residuals() {
        // ss_res = 0.25 * 4 = 1, ss_tot = 5
        let predicted = mat![[1.5], [2.5], [2.5], [3.5f64]];
        assert_relative_eq!(r2_score(&data(), predicted.as_ref()).unwrap(), 0.8);
    }

    #[test]
    fn zero_weight_points_are_ignored() {
        let weighted = data().with_weights(vec![1.0, 1.0, 1.0, 0.0]).unwrap();
        let predicted = mat![[1.0], [2.0], [3.0], [100.0f64]];
        assert_relative_eq!(r2_score(&weighted, predicted.as_ref()).unwrap(), 1.0);
    }

    #[test]
    fn zero_variance_is_an_error() {
        let flat = ScatteredData::from_slices(&[0.0, 1.0], &[0.0, 0.0], &[5.0, 5.0]).unwrap();
        let predicted = mat![[5.0], [5.0f64]];
        assert!(matches!(
            r2_score(&flat, predicted.as_ref()),
            Err(GridderError::InvalidParameter { name: "values", .. })
        ));
    }

    #[test]
    fn channels_are_averaged() {
        let values = mat![[1.0, 0.0], [2.0, 1.0], [3.0, 0.0], [4.0, 1.0f64]];
        let coords = Mat::from_fn(4, 2, |i, j| (i * j) as f64);
        let data = ScatteredData::new(coords, values, None).unwrap();

        // Channel 0 perfect, channel 1 predicted at its mean
        let predicted = mat![[1.0, 0.5], [2.0, 0.5], [3.0, 0.5], [4.0, 0.5f64]];
        assert_relative_eq!(r2_score(&data, predicted.as_ref()).unwrap(), 0.5);
    }
}
