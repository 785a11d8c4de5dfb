/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines the injected geographic to planar projection interface.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Map projections are supplied by the caller; this crate only applies them.

use faer::{Mat, MatRef};
use rayon::prelude::*;

/// Forward map projection from `(longitude, latitude)` to planar
/// `(easting, northing)`.
///
/// Any `Fn(f64, f64) -> (f64, f64) + Send + Sync` closure is a projection.
pub trait Projection: Send + Sync {
    fn forward(&self, longitude: f64, latitude: f64) -> (f64, f64);
}

impl<F> Projection for F
where
    F: Fn(f64, f64) -> (f64, f64) + Send + Sync,
{
    #[inline]
    fn forward(&self, longitude: f64, latitude: f64) -> (f64, f64) {
        self(longitude, latitude)
    }
}

/// Projects every row of an `N x 2` `(longitude, latitude)` matrix.
pub fn project_coordinates(coordinates: MatRef<f64>, projection: &dyn Projection) -> Mat<f64> {
    let projected: Vec<(f64, f64)> = (0..coordinates.nrows())
        .into_par_iter()
        .map(|i| projection.forward(coordinates[(i, 0)], coordinates[(i, 1)]))
        .collect();

    Mat::from_fn(projected.len(), 2, |i, j| match j {
        0 => projected[i].0,
        _ => projected[i].1,
    })
}
