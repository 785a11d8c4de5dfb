/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the biharmonic Green's function used by the elastic sheet spline.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::GreensFunction;
use serde::{Deserialize, Serialize};

/// Green's function of the 2D biharmonic operator, `phi(r) = r^2 (ln r - 1)`.
///
/// Describes the deflection of a thin elastic sheet under a vertical point
/// force. The `r = 0` singularity of the logarithm is removable
/// (`r^2 ln r -> 0`), so `phi(0)` is defined as `0`.
///
/// # Examples
///
/// ```
/// use ferreus_grid_utils::{GreensFunction, kernels::BiharmonicGreens};
///
/// let g = BiharmonicGreens;
/// assert_eq!(g.phi(0.0), 0.0);
/// assert_eq!(g.phi(1.0), -1.0);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BiharmonicGreens;

impl GreensFunction for BiharmonicGreens {
    #[inline(always)]
    fn phi(&self, r: f64) -> f64 {
        match r.abs() < f64::EPSILON {
            true => 0.0,
            false => r.powi(2) * (r.ln() - 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use faer::mat;

    #[test]
    fn zero_distance_is_special_cased() {
        let g = BiharmonicGreens;
        assert_eq!(g.phi(0.0), 0.0);
        assert!(g.phi(1e-300).is_finite());
    }

    #[test]
    fn matches_closed_form() {
        let g = BiharmonicGreens;
        for r in [0.5_f64, 2.0, std::f64::consts::E, 150.0, 1.0e5] {
            assert_relative_eq!(g.phi(r), r * r * (r.ln() - 1.0), max_relative = 1e-14);
        }
        // Root of ln(r) - 1
        assert!(g.phi(std::f64::consts::E).abs() < 1e-12);
    }

    #[test]
    fn evaluate_uses_euclidean_distance() {
        let points = mat![[0.0, 0.0], [3.0, 4.0f64]];
        let g = BiharmonicGreens;
        assert_relative_eq!(
            g.evaluate(points.row(0), points.row(1)),
            25.0 * (5.0_f64.ln() - 1.0),
            max_relative = 1e-14
        );
    }
}
