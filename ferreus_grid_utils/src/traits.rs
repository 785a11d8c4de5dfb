/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares the trait shared by all Green's function kernels.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use faer::RowRef;

/// A radially symmetric Green's function `phi(r)` evaluated between a
/// target (data or query) point and a source (force) point.
pub trait GreensFunction: Send + Sync {
    /// Evaluates the kernel at distance `r >= 0`.
    fn phi(&self, r: f64) -> f64;

    /// Evaluates the kernel between two points given as matrix rows.
    #[inline(always)]
    fn evaluate(&self, target: RowRef<f64>, source: RowRef<f64>) -> f64 {
        self.phi(crate::get_distance(target, source))
    }
}
