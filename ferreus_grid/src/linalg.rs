/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the damped weighted least-squares solve used to fit spline coefficients.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Dense least-squares helpers.

use crate::error::{GridderError, Result};
use faer::{linalg::solvers::SolveLstsq, Mat, MatRef};

/// Solves `min ‖W^½(G c − y)‖² + λ‖c‖²` for every column of `y` at once.
///
/// The minimiser satisfies the normal equations `(GᵀWG + λI) c = GᵀWy`.
/// Rather than forming them, the stacked system
///
/// ```text
/// [ W^½ G ]       [ W^½ y ]
/// [ √λ  I ] c  ≈  [   0   ]
/// ```
///
/// is solved with a QR factorisation, which has the same minimiser and keeps
/// the condition number of `G` instead of squaring it.
///
/// # Errors
/// - `SingularSystem` if the system is underdetermined (more unknowns than
///   equations with `λ = 0`) or the solution is not finite.
pub(crate) fn damped_least_squares(
    jacobian: MatRef<f64>,
    rhs: MatRef<f64>,
    weights: Option<&[f64]>,
    damping: f64,
) -> Result<Mat<f64>> {
    let (n, m) = jacobian.shape();
    let num_channels = rhs.ncols();
    let num_damping_rows = if damping > 0.0 { m } else { 0 };
    let nrows = n + num_damping_rows;

    if nrows < m {
        return Err(GridderError::SingularSystem(format!(
            "{} force points cannot be determined from {} data points without damping",
            m, n
        )));
    }

    let sqrt_w: Vec<f64> = (0..n)
        .map(|i| weights.map_or(1.0, |w| w[i].sqrt()))
        .collect();
    let sqrt_damping = damping.sqrt();

    let lhs = Mat::from_fn(nrows, m, |i, j| match i < n {
        true => sqrt_w[i] * jacobian[(i, j)],
        false => match i - n == j {
            true => sqrt_damping,
            false => 0.0,
        },
    });

    let stacked_rhs = Mat::from_fn(nrows, num_channels, |i, k| match i < n {
        true => sqrt_w[i] * rhs[(i, k)],
        false => 0.0,
    });

    let qr = lhs.qr();
    let solution = qr.solve_lstsq(&stacked_rhs);

    if solution
        .row_iter()
        .any(|row| row.iter().any(|v| !v.is_finite()))
    {
        return Err(GridderError::SingularSystem(
            "least-squares solution is not finite; increase damping or mindist".into(),
        ));
    }

    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use equator::assert;
    use faer::{mat, utils::approx::*};

    #[test]
    fn square_system_is_solved_exactly() {
        let a = mat![[4.0, 1.0], [1.0, 3.0f64]];
        let x = mat![[1.0], [-2.0f64]];
        let b = &a * &x;

        let solved = damped_least_squares(a.as_ref(), b.as_ref(), None, 0.0).unwrap();

        let approx_eq = CwiseMat(ApproxEq::eps() * 128.0 * 2.0);
        assert!(&solved ~ &x);
    }

    #[test]
    fn matches_normal_equations() {
        let a = mat![
            [1.0, 0.5, 0.0],
            [0.2, 1.0, 0.3],
            [0.0, 0.4, 1.0],
            [0.7, 0.1, 0.2],
            [0.3, 0.3, 0.3f64],
        ];
        let b = mat![[1.0], [2.0], [0.5], [-1.0], [0.0f64]];
        let weights = [1.0, 2.0, 0.5, 1.0, 3.0];
        let damping = 0.1;

        let solved = damped_least_squares(a.as_ref(), b.as_ref(), Some(&weights), damping).unwrap();

        // (AᵀWA + λI) x = AᵀWb
        let w = Mat::from_fn(5, 5, |i, j| if i == j { weights[i] } else { 0.0 });
        let mut normal = a.transpose() * &w * &a;
        for i in 0..3 {
            normal[(i, i)] += damping;
        }
        let residual = &normal * &solved - a.transpose() * &w * &b;

        for i in 0..3 {
            approx::assert_abs_diff_eq!(residual[(i, 0)], 0.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn underdetermined_without_damping_is_singular() {
        let a = mat![[1.0, 2.0, 3.0f64]];
        let b = mat![[1.0f64]];
        assert!(matches!(
            damped_least_squares(a.as_ref(), b.as_ref(), None, 0.0),
            Err(GridderError::SingularSystem(_))
        ));
        assert!(damped_least_squares(a.as_ref(), b.as_ref(), None, 1e-3).is_ok());
    }
}
