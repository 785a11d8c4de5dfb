/////////////////////////////////////////////////////////////////////////////////////////////
//
// Supplies general-purpose utilities for matrices, distances and Green's matrix assembly.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::GreensFunction;
use faer::{Mat, MatRef, RowRef};

/// Returns an owned `Mat<T>` from a subset of row indices.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use ferreus_grid_utils::select_mat_rows;
///
/// let matrix = mat![
///     [0.0, 1.0],
///     [1.0, 1.0],
///     [2.0, 2.0],
///     [3.0, 3.0f64],
/// ];
///
/// let sub_matrix = select_mat_rows(matrix.as_ref(), &[0, 2]);
///
/// assert_eq!(
///     sub_matrix,
///     mat![
///         [0.0, 1.0],
///         [2.0, 2.0f64],
///     ]
/// );
/// ```
#[inline(always)]
pub fn select_mat_rows<T>(existing_mat: MatRef<T>, row_indices: &[usize]) -> Mat<T>
where
    T: Clone,
{
    Mat::from_fn(row_indices.len(), existing_mat.ncols(), |i, j| {
        existing_mat.get(row_indices[i], j).clone()
    })
}

/// Returns the elements of `values` at `indices`, in the order given.
///
/// # Examples
///
/// ```
/// use ferreus_grid_utils::select_slice;
///
/// assert_eq!(select_slice(&[10, 20, 30], &[2, 0]), vec![30, 10]);
/// ```
#[inline(always)]
pub fn select_slice<T: Clone>(values: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| values[i].clone()).collect()
}

/// Computes the axis aligned bounding box (AABB) extents of a matrix of points.
///
/// The result is arranged as `[min_0, ..., min_n, max_0, ..., max_n]` where `n`
/// is the number of columns. Returns `None` when the matrix has no rows.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use ferreus_grid_utils::get_pointarray_extents;
///
/// let points = mat![
///     [1.0, 2.0],
///     [3.0, -1.0],
///     [0.5, 4.0f64]
/// ];
/// let extents = get_pointarray_extents(points.as_ref());
/// assert_eq!(extents, Some(vec![0.5, -1.0, 3.0, 4.0]));
/// ```
pub fn get_pointarray_extents<T>(points: MatRef<T>) -> Option<Vec<T>>
where
    T: PartialOrd + Clone,
{
    if points.nrows() == 0 {
        return None;
    }

    let ncols = points.ncols();
    let mut extents: Vec<T> = Vec::with_capacity(2 * ncols);

    // First half stores mins, second half stores maxs.
    for col in 0..ncols {
        extents.push(points.get(0, col).clone());
    }
    for col in 0..ncols {
        extents.push(points.get(0, col).clone());
    }

    for row in points.row_iter() {
        for (col, item) in row.iter().enumerate() {
            if item < &extents[col] {
                extents[col] = item.clone();
            }
            if item > &extents[col + ncols] {
                extents[col + ncols] = item.clone();
            }
        }
    }

    Some(extents)
}

/// Squared euclidean distance between two points.
#[inline(always)]
pub fn get_distance_sq(target: RowRef<f64>, source: RowRef<f64>) -> f64 {
    let mut dist = 0.0;
    for (t, s) in target.iter().zip(source.iter()) {
        let diff = t - s;
        dist += diff * diff;
    }
    dist
}

/// Calculates the euclidean distance between two points.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use ferreus_grid_utils::get_distance;
///
/// let points = mat![
///     [1.0, 2.0],
///     [4.0, 6.0],
/// ];
///
/// assert_eq!(get_distance(points.row(0), points.row(1)), 5.0);
/// ```
#[inline(always)]
pub fn get_distance(target: RowRef<f64>, source: RowRef<f64>) -> f64 {
    get_distance_sq(target, source).sqrt()
}

/// Builds the dense `(n_targets x n_sources)` Green's matrix
/// `G[i][j] = phi(|target_i - source_j|)`.
pub fn get_greens_matrix<K>(
    target_points: MatRef<f64>,
    source_points: MatRef<f64>,
    kernel: &K,
) -> Mat<f64>
where
    K: GreensFunction,
{
    let m = target_points.nrows();
    let n = source_points.nrows();

    let mut greens = Mat::<f64>::zeros(m, n);

    for j in 0..n {
        let source = source_points.row(j);

        for i in 0..m {
            greens[(i, j)] = kernel.evaluate(target_points.row(i), source);
        }
    }

    greens
}

/// Builds the square Green's matrix of a point set with itself, evaluating
/// only the lower triangle and mirroring it.
pub fn get_greens_matrix_symmetric<K>(points: MatRef<f64>, kernel: &K) -> Mat<f64>
where
    K: GreensFunction,
{
    let n = points.nrows();

    let mut greens = Mat::<f64>::zeros(n, n);

    for j in 0..n {
        let source_row = points.row(j);

        for i in j..n {
            let value = kernel.evaluate(points.row(i), source_row);
            greens[(i, j)] = value;
            greens[(j, i)] = value;
        }
    }

    greens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::BiharmonicGreens;
    use faer::mat;

    #[test]
    fn extents_of_empty_matrix_is_none() {
        let points = Mat::<f64>::zeros(0, 2);
        assert!(get_pointarray_extents(points.as_ref()).is_none());
    }

    #[test]
    fn symmetric_matrix_matches_general_assembly() {
        let points = mat![
            [0.0, 0.0],
            [1.0, 0.5],
            [3.0, 2.0],
            [-1.0, 4.0f64],
        ];
        let kernel = BiharmonicGreens;

        let general = get_greens_matrix(points.as_ref(), points.as_ref(), &kernel);
        let symmetric = get_greens_matrix_symmetric(points.as_ref(), &kernel);

        for i in 0..points.nrows() {
            assert_eq!(general[(i, i)], 0.0);
            for j in 0..points.nrows() {
                assert!((general[(i, j)] - symmetric[(i, j)]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn rectangular_matrix_shape() {
        let targets = mat![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0f64]];
        let sources = mat![[0.5, 0.5], [1.5, 1.5f64]];
        let greens = get_greens_matrix(targets.as_ref(), sources.as_ref(), &BiharmonicGreens);
        assert_eq!(greens.shape(), (3, 2));
    }
}
