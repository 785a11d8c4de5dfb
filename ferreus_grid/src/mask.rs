/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements distance-based masking of grid nodes far from observations.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Masks grid nodes that are too far from any data point.

use crate::{
    data::check_coordinates,
    error::{GridderError, Result},
    grid::Grid,
    kdtree::{DistanceMetric, KDTree},
    projection::{project_coordinates, Projection},
    rtree::PointRTree,
};
use faer::{Mat, MatRef};
use rayon::prelude::*;

/// Spatial index answering nearest-point distance queries.
pub trait NearestNeighbours: Send + Sync {
    /// Builds the index over `N x 2` planar points.
    fn build(points: MatRef<f64>) -> Self
    where
        Self: Sized;

    /// Euclidean distance from `target` to the closest indexed point.
    fn nearest_distance(&self, target: [f64; 2]) -> Option<f64>;
}

impl NearestNeighbours for PointRTree {
    fn build(points: MatRef<f64>) -> Self {
        PointRTree::new(points)
    }

    fn nearest_distance(&self, target: [f64; 2]) -> Option<f64> {
        self.nearest(target).map(|(_, d)| d)
    }
}

impl NearestNeighbours for KDTree {
    fn build(points: MatRef<f64>) -> Self {
        KDTree::new(points)
    }

    fn nearest_distance(&self, target: [f64; 2]) -> Option<f64> {
        self.nearest(target, DistanceMetric::Euclidean).map(|(_, d)| d)
    }
}

/// Masks the nodes of `grid` farther than `maxdist` from the nearest of the
/// `N x 2` data `coordinates`, using an R-tree for the distance queries.
///
/// When a projection is given both the data coordinates and the grid node
/// coordinates are projected first and `maxdist` is in projected units.
/// A node exactly `maxdist` away stays valid. Masked nodes have every
/// variable set to NaN; nodes already masked stay masked.
///
/// # Errors
/// - `EmptyInput` for zero data points.
/// - `InvalidParameter` for a negative or non-finite `maxdist`.
pub fn distance_mask(
    coordinates: MatRef<f64>,
    maxdist: f64,
    grid: Grid,
    projection: Option<&dyn Projection>,
) -> Result<Grid> {
    distance_mask_with::<PointRTree>(coordinates, maxdist, grid, projection)
}

/// [`distance_mask`] with a caller-chosen spatial index.
pub fn distance_mask_with<I: NearestNeighbours>(
    coordinates: MatRef<f64>,
    maxdist: f64,
    mut grid: Grid,
    projection: Option<&dyn Projection>,
) -> Result<Grid> {
    check_coordinates(coordinates)?;

    if coordinates.nrows() == 0 {
        return Err(GridderError::EmptyInput("cannot mask against zero points".into()));
    }

    if !maxdist.is_finite() || maxdist < 0.0 {
        return Err(GridderError::invalid(
            "maxdist",
            maxdist,
            "maxdist must be finite and non-negative",
        ));
    }

    let (rows, cols) = grid.shape();
    let (axis0, axis1) = (grid.axis0(), grid.axis1());

    // Axis 0 holds northing, axis 1 easting.
    let mut nodes = Mat::from_fn(rows * cols, 2, |k, d| match d {
        0 => axis1[k % cols],
        _ => axis0[k / cols],
    });

    let data = match projection {
        Some(projection) => {
            nodes = project_coordinates(nodes.as_ref(), projection);
            project_coordinates(coordinates, projection)
        }
        None => coordinates.to_owned(),
    };

    let index = I::build(data.as_ref());
    let nodes = nodes.as_ref();

    let masked: Vec<bool> = (0..rows * cols)
        .into_par_iter()
        .map(|k| {
            index
                .nearest_distance([nodes[(k, 0)], nodes[(k, 1)]])
                .map_or(true, |d| d > maxdist)
        })
        .collect();

    log::debug!(
        "masked {} of {} grid nodes farther than {} from data",
        masked.iter().filter(|&&m| m).count(),
        rows * cols,
        maxdist
    );

    grid.apply_mask(&masked);
    Ok(grid)
}
