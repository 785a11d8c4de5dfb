/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares configuration types for fitting biharmonic splines.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Declares configuration types for fitting biharmonic splines.
use crate::{
    error::{GridderError, Result},
    progress::ProgressSink,
};
use faer::Mat;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How a spline handles force points closer together than `mindist`.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Each group of close points is replaced by its weighted mean location
    /// and value, carrying the summed weight of the group.
    #[default]
    Merge,

    /// Any group of close points fails the fit with `SingularSystem`.
    Reject,
}

/// Parameters controlling a biharmonic spline fit.
///
/// ### Default Values
/// - `damping`: `0.0` (exact interpolation)
/// - `mindist`: `0.0` (only exact duplicates are grouped)
/// - `duplicates`: [`DuplicatePolicy::Merge`]
/// - `force_coords`: `None` (force points at the data locations)
#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct SplineSettings {
    /// Regularisation added to the diagonal of the normal equations. Larger
    /// values trade exactness at the data for a smoother surface.
    pub damping: f64,

    /// Force points within this infinity-norm distance of each other are
    /// treated as duplicates.
    pub mindist: f64,

    /// What to do with duplicate force points.
    pub duplicates: DuplicatePolicy,

    /// Explicit `M x 2` force point locations.
    pub force_coords: Option<Mat<f64>>,

    /// Receives fit progress events.
    #[serde(skip, default)]
    pub progress_callback: Option<Arc<dyn ProgressSink>>,
}

impl Default for SplineSettings {
    fn default() -> Self {
        SplineSettings {
            damping: 0.0,
            mindist: 0.0,
            duplicates: DuplicatePolicy::Merge,
            force_coords: None,
            progress_callback: None,
        }
    }
}

impl SplineSettings {
    pub(crate) fn check(&self) -> Result<()> {
        if !self.damping.is_finite() || self.damping < 0.0 {
            return Err(GridderError::invalid(
                "damping",
                self.damping,
                "damping must be finite and non-negative",
            ));
        }

        if !self.mindist.is_finite() || self.mindist < 0.0 {
            return Err(GridderError::invalid(
                "mindist",
                self.mindist,
                "mindist must be finite and non-negative",
            ));
        }

        if let Some(force) = &self.force_coords {
            crate::data::check_coordinates(force.as_ref())?;
            if force.nrows() == 0 {
                return Err(GridderError::EmptyInput(
                    "force_coords must hold at least one point".into(),
                ));
            }
            if force.row_iter().any(|row| row.iter().any(|v| !v.is_finite())) {
                return Err(GridderError::invalid(
                    "force_coords",
                    "non-finite",
                    "force coordinates must be finite",
                ));
            }
        }

        Ok(())
    }
}

/// Builder for a [`Spline`](crate::Spline), created with
/// [`Spline::builder`](crate::Spline::builder).
#[derive(Debug, Clone, Default)]
pub struct SplineBuilder {
    pub(crate) settings: SplineSettings,
}

impl SplineBuilder {
    /// Sets the damping parameter.
    pub fn damping(mut self, damping: f64) -> Self {
        self.settings.damping = damping;
        self
    }

    /// Sets the minimum separation between force points.
    pub fn mindist(mut self, mindist: f64) -> Self {
        self.settings.mindist = mindist;
        self
    }

    /// Sets the duplicate force point policy.
    pub fn duplicates(mut self, duplicates: DuplicatePolicy) -> Self {
        self.settings.duplicates = duplicates;
        self
    }

    /// Places force points at explicit `M x 2` locations instead of the data.
    pub fn force_coords(mut self, force_coords: Mat<f64>) -> Self {
        self.settings.force_coords = Some(force_coords);
        self
    }

    /// Attaches a progress sink.
    pub fn progress_callback(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.settings.progress_callback = Some(sink);
        self
    }

    /// Validates and returns the settings.
    pub fn settings(self) -> Result<SplineSettings> {
        self.settings.check()?;
        Ok(self.settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_exact_interpolation() {
        let settings = SplineBuilder::default().settings().unwrap();
        assert_eq!(settings.damping, 0.0);
        assert_eq!(settings.mindist, 0.0);
        assert_eq!(settings.duplicates, DuplicatePolicy::Merge);
    }

    #[test]
    fn negative_damping_is_rejected() {
        let err = SplineBuilder::default().damping(-1e-3).settings().unwrap_err();
        assert!(matches!(err, GridderError::InvalidParameter { name: "damping", .. }));
    }

    #[test]
    fn nan_mindist_is_rejected() {
        let err = SplineBuilder::default().mindist(f64::NAN).settings().unwrap_err();
        assert!(matches!(err, GridderError::InvalidParameter { name: "mindist", .. }));
    }

    #[test]
    fn empty_force_coords_are_rejected() {
        let err = SplineBuilder::default()
            .force_coords(Mat::zeros(0, 2))
            .settings()
            .unwrap_err();
        assert!(matches!(err, GridderError::EmptyInput(_)));
    }

    #[test]
    fn settings_serialise_without_sink() {
        let settings = SplineBuilder::default().damping(1e-4).settings().unwrap();
        let json = serde_json::to_string(&settings).unwrap();
        let back: SplineSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.damping, 1e-4);
        assert!(back.progress_callback.is_none());
    }
}
