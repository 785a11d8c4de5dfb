/////////////////////////////////////////////////////////////////////////////////////////////
//
// Exposes the public API and high-level documentation for biharmonic spline gridding.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Gridding of scattered data with biharmonic splines.
//!
//! Turns irregularly located measurements (temperature, gravity, magnetic
//! anomalies, ...) into a regular grid of estimated values. The core model is
//! the biharmonic spline \[1\]: the data are reproduced by the deflection of a
//! thin elastic sheet pushed by point forces, which reduces to a dense linear
//! system of Green's function evaluations solved by damped least squares.
//!
//! Around the spline sits the processing machinery for a full gridding
//! workflow:
//!
//! - [`BlockReduce`] decimates dense data to one point per block.
//! - [`Chain`] runs named steps in order and predicts with the last one.
//! - [`train_test_split`], [`KFold`] and [`cross_val_score`] validate a model
//!   against held-out points with the R² score.
//! - [`distance_mask`] invalidates grid nodes too far from any observation.
//!
//! Map projections are never computed here. Pass any
//! `Fn(f64, f64) -> (f64, f64)` as a [`Projection`] to grid geographic data.
//!
//! Check out the examples directory in the repository for a complete workflow.
//!
//! # Examples
//!
//! ```
//! use ferreus_grid::{
//!     generate_random_points, train_test_split, BlockReduce, Chain, Estimator,
//!     GridSpec, Reduction, Region, ScatteredData, Spline, TestFunctions,
//! };
//!
//! // Sample a plane at random locations
//! let region = Region::new(0.0, 10.0, 0.0, 10.0)?;
//! let coordinates = generate_random_points(200, &region, Some(42));
//! let values = TestFunctions::linear(coordinates.as_ref(), 2.0, 3.0, 0.0);
//! let data = ScatteredData::new(coordinates, values, None)?;
//!
//! let (train, test) = train_test_split(&data, 0.25, Some(0))?;
//!
//! let mut chain = Chain::new(vec![
//!     ("reduce".to_string(), Box::new(BlockReduce::new(Reduction::mean(), 0.5)) as Box<dyn Estimator>),
//!     ("spline".to_string(), Box::new(Spline::builder().damping(1e-8).build()?) as Box<dyn Estimator>),
//! ])?;
//! chain.fit(&train)?;
//!
//! assert!(chain.score(&test)? > 0.95);
//!
//! let grid = chain.grid(&GridSpec::new(1.0).region(region))?;
//! assert_eq!(grid.shape(), (11, 11));
//! # Ok::<(), ferreus_grid::GridderError>(())
//! ```
//!
//! # References
//! 1.  Sandwell, D. T. (1987). Biharmonic spline interpolation of GEOS-3 and
//!     SEASAT altimeter data. Geophysical Research Letters, 14(2), 139–142.
pub mod error;

pub mod coordinates;

mod data;

pub mod grid;

mod projection;

pub mod estimator;

mod blockreduce;

mod spline;

mod chain;

pub mod model_selection;

mod mask;

mod common;

mod kdtree;

mod rtree;

mod linalg;

pub mod progress;

pub mod config;

mod test_functions;

pub use {
    blockreduce::{BlockReduce, Reduction},
    chain::{Chain, Step},
    common::generate_random_points,
    config::{DuplicatePolicy, SplineBuilder, SplineSettings},
    coordinates::{
        get_region, grid_axes, grid_coordinates, inside, pad_region, Adjust, Region, Spacing,
        MAX_AXIS_INTERVALS,
    },
    data::ScatteredData,
    error::{GridderError, Result},
    estimator::{predict_grid, r2_score, Estimator},
    grid::{Grid, GridSpec, GridVariable},
    kdtree::{DistanceMetric, KDTree},
    mask::{distance_mask, distance_mask_with, NearestNeighbours},
    model_selection::{
        cross_val_score, train_test_indices, train_test_split, KFold, DEFAULT_TEST_SIZE,
    },
    projection::{project_coordinates, Projection},
    rtree::PointRTree,
    spline::Spline,
    test_functions::TestFunctions,
};
