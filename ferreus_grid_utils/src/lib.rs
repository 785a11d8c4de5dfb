/////////////////////////////////////////////////////////////////////////////////////////////
//
// Re-exports the Green's function kernel, distance helpers and matrix utilities used across the ferreus_grid crates.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Utilities for the [`ferreus_grid`] crate
//!
//! Holds the pieces of the biharmonic spline that do not depend on the
//! estimator machinery: the Green's function itself, Euclidean distance
//! helpers, bounding extents of point arrays and dense Green's matrix assembly.
mod greens;
mod traits;
mod utils;

/// Green's functions available to the spline estimators.
pub mod kernels {
    pub use super::greens::*;
}

pub use {
    traits::GreensFunction,
    utils::{
        get_distance, get_distance_sq, get_greens_matrix, get_greens_matrix_symmetric,
        get_pointarray_extents, select_mat_rows, select_slice,
    },
};
