/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines the scattered dataset container consumed by every estimator.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Scattered point data: planar coordinates, one or more value channels and
//! optional per-point weights.

use crate::{
    coordinates::{self, Region},
    error::{GridderError, Result},
};
use faer::{Mat, MatRef};
use serde::{Deserialize, Serialize};

/// An ordered collection of `N` scattered observations.
///
/// - `coordinates` is `N x 2`, columns are `(easting, northing)`.
/// - `values` is `N x K`, one column per observed channel.
/// - `weights`, when present, holds one finite non-negative weight per point.
///   Missing weights behave as `1.0` everywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatteredData {
    coordinates: Mat<f64>,
    values: Mat<f64>,
    weights: Option<Vec<f64>>,
}

impl ScatteredData {
    /// Creates a dataset after checking the shape and value invariants.
    pub fn new(coordinates: Mat<f64>, values: Mat<f64>, weights: Option<Vec<f64>>) -> Result<Self> {
        if coordinates.ncols() != 2 {
            return Err(GridderError::invalid(
                "coordinates",
                format!("{} columns", coordinates.ncols()),
                "expected (easting, northing) columns",
            ));
        }

        if values.ncols() == 0 {
            return Err(GridderError::invalid(
                "values",
                "0 columns",
                "at least one value channel is required",
            ));
        }

        let n = coordinates.nrows();

        if values.nrows() != n {
            return Err(GridderError::invalid(
                "values",
                format!("{} rows", values.nrows()),
                format!("expected {} rows to match the coordinates", n),
            ));
        }

        if coordinates.row_iter().any(|row| row.iter().any(|v| !v.is_finite())) {
            return Err(GridderError::invalid(
                "coordinates",
                "non-finite",
                "coordinates must be finite",
            ));
        }

        if values.row_iter().any(|row| row.iter().any(|v| !v.is_finite())) {
            return Err(GridderError::invalid(
                "values",
                "non-finite",
                "values must be finite",
            ));
        }

        if let Some(w) = &weights {
            if w.len() != n {
                return Err(GridderError::invalid(
                    "weights",
                    format!("{} entries", w.len()),
                    format!("expected {} entries to match the coordinates", n),
                ));
            }
            if let Some(bad) = w.iter().find(|w| !w.is_finite() || **w < 0.0) {
                return Err(GridderError::invalid(
                    "weights",
                    bad,
                    "weights must be finite and non-negative",
                ));
            }
        }

        Ok(Self {
            coordinates,
            values,
            weights,
        })
    }

    /// Single channel dataset from separate easting, northing and value slices.
    pub fn from_slices(easting: &[f64], northing: &[f64], values: &[f64]) -> Result<Self> {
        if easting.len() != northing.len() {
            return Err(GridderError::invalid(
                "northing",
                format!("{} entries", northing.len()),
                format!("expected {} entries to match easting", easting.len()),
            ));
        }

        let coordinates = Mat::from_fn(easting.len(), 2, |i, j| match j {
            0 => easting[i],
            _ => northing[i],
        });
        let values = Mat::from_fn(values.len(), 1, |i, _| values[i]);

        Self::new(coordinates, values, None)
    }

    /// Returns the dataset with the given per-point weights attached.
    pub fn with_weights(self, weights: Vec<f64>) -> Result<Self> {
        Self::new(self.coordinates, self.values, Some(weights))
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.coordinates.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of value channels.
    pub fn n_channels(&self) -> usize {
        self.values.ncols()
    }

    pub fn coordinates(&self) -> MatRef<'_, f64> {
        self.coordinates.as_ref()
    }

    pub fn values(&self) -> MatRef<'_, f64> {
        self.values.as_ref()
    }

    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    /// Weight of point `i`, `1.0` when the dataset is unweighted.
    #[inline]
    pub fn weight(&self, i: usize) -> f64 {
        self.weights.as_ref().map_or(1.0, |w| w[i])
    }

    /// Bounding region of the coordinates.
    pub fn region(&self) -> Result<Region> {
        coordinates::get_region(self.coordinates.as_ref())
    }

    /// Subset of the dataset at `indices`, keeping coordinates, values and
    /// weights associated per point.
    pub fn select(&self, indices: &[usize]) -> ScatteredData {
        ScatteredData {
            coordinates: ferreus_grid_utils::select_mat_rows(self.coordinates.as_ref(), indices),
            values: ferreus_grid_utils::select_mat_rows(self.values.as_ref(), indices),
            weights: self
                .weights
                .as_ref()
                .map(|w| ferreus_grid_utils::select_slice(w, indices)),
        }
    }
}

/// Checks that a query coordinate matrix has `(easting, northing)` columns.
pub(crate) fn check_coordinates(coordinates: MatRef<f64>) -> Result<()> {
    if coordinates.ncols() != 2 {
        return Err(GridderError::invalid(
            "coordinates",
            format!("{} columns", coordinates.ncols()),
            "expected (easting, northing) columns",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::mat;

    #[test]
    fn rejects_mismatched_lengths() {
        let coords = mat![[0.0, 0.0], [1.0, 1.0f64]];
        let values = mat![[1.0f64]];
        let err = ScatteredData::new(coords, values, None).unwrap_err();
        assert!(matches!(err, GridderError::InvalidParameter { name: "values", .. }));
    }

    #[test]
    fn rejects_negative_weights() {
        let data = ScatteredData::from_slices(&[0.0, 1.0], &[0.0, 1.0], &[1.0, 2.0]).unwrap();
        let err = data.with_weights(vec![1.0, -0.5]).unwrap_err();
        assert!(matches!(err, GridderError::InvalidParameter { name: "weights", .. }));
    }

    #[test]
    fn rejects_wrong_weight_count() {
        let data = ScatteredData::from_slices(&[0.0, 1.0], &[0.0, 1.0], &[1.0, 2.0]).unwrap();
        assert!(data.with_weights(vec![1.0]).is_err());
    }

    #[test]
    fn rejects_non_finite_values() {
        let err = ScatteredData::from_slices(&[0.0], &[0.0], &[f64::NAN]).unwrap_err();
        assert!(matches!(err, GridderError::InvalidParameter { name: "values", .. }));
    }

    #[test]
    fn default_weight_is_one() {
        let data = ScatteredData::from_slices(&[0.0, 1.0], &[0.0, 1.0], &[1.0, 2.0]).unwrap();
        assert_eq!(data.weight(1), 1.0);
        assert!(data.weights().is_none());
    }

    #[test]
    fn select_keeps_points_associated() {
        let data = ScatteredData::from_slices(&[0.0, 1.0, 2.0], &[5.0, 6.0, 7.0], &[10.0, 11.0, 12.0])
            .unwrap()
            .with_weights(vec![0.1, 0.2, 0.3])
            .unwrap();

        let subset = data.select(&[2, 0]);

        assert_eq!(subset.len(), 2);
        assert_eq!(subset.coordinates()[(0, 0)], 2.0);
        assert_eq!(subset.coordinates()[(0, 1)], 7.0);
        assert_eq!(subset.values()[(0, 0)], 12.0);
        assert_eq!(subset.weights(), Some(&[0.3, 0.1][..]));
    }
}
