/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines shared helpers for synthetic point generation.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::coordinates::Region;
use faer::Mat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Creates the random generator used across the crate.
///
/// `Some(seed)` gives a reproducible sequence, `None` seeds from the
/// operating system's randomness source.
pub(crate) fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Generate a matrix of uniformly distributed random points inside a region.
///
/// # Parameters
/// - `n`: Number of points to generate (rows in the output matrix).
/// - `region`: Bounds the points are drawn from.
/// - `seed`: Optional random seed.
///   - If `Some(seed)` is provided, the same sequence of points will be generated
///     deterministically across runs and platforms (useful for reproducible tests).
///   - If `None`, the generator is seeded from the operating system's randomness source.
///
/// # Returns
/// A `Mat<f64>` of shape `(n, 2)` holding `(easting, northing)` rows.
///
/// # Example
/// ```
/// use ferreus_grid::{generate_random_points, Region};
///
/// let region = Region::new(0.0, 10.0, -5.0, 5.0)?;
/// let pts = generate_random_points(100, &region, Some(42));
/// assert_eq!(pts.shape(), (100, 2));
/// # Ok::<(), ferreus_grid::GridderError>(())
/// ```
pub fn generate_random_points(n: usize, region: &Region, seed: Option<u64>) -> Mat<f64> {
    let mut rng = make_rng(seed);

    Mat::from_fn(n, 2, |_, j| {
        let u: f64 = rng.random_range(0.0..1.0);
        match j {
            0 => region.west + u * region.width(),
            _ => region.south + u * region.height(),
        }
    })
}
