/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides regions, grid spacings and regular grid node generation.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Bounding regions of scattered points and regular grid coordinates.

use crate::error::{GridderError, Result};
use faer::{Mat, MatRef};
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box `(west, east, south, north)` in the coordinate
/// space of the data.
///
/// `west == east` or `south == north` is a valid degenerate region: grids
/// built over it have a single node along that axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub west: f64,
    pub east: f64,
    pub south: f64,
    pub north: f64,
}

impl Region {
    /// Creates a region, checking that bounds are finite and ordered.
    pub fn new(west: f64, east: f64, south: f64, north: f64) -> Result<Self> {
        let region = Self {
            west,
            east,
            south,
            north,
        };
        region.check()?;
        Ok(region)
    }

    pub(crate) fn check(&self) -> Result<()> {
        let bounds = [self.west, self.east, self.south, self.north];
        if bounds.iter().any(|b| !b.is_finite()) {
            return Err(GridderError::invalid(
                "region",
                format!("{:?}", bounds),
                "bounds must be finite",
            ));
        }
        if self.west > self.east {
            return Err(GridderError::invalid(
                "region",
                format!("{:?}", bounds),
                "west must not be greater than east",
            ));
        }
        if self.south > self.north {
            return Err(GridderError::invalid(
                "region",
                format!("{:?}", bounds),
                "south must not be greater than north",
            ));
        }
        Ok(())
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Inclusive containment test.
    #[inline]
    pub fn contains(&self, easting: f64, northing: f64) -> bool {
        easting >= self.west && easting <= self.east && northing >= self.south && northing <= self.north
    }
}

/// Grid spacing along the northing and easting axes.
///
/// A single `f64` converts into an equal spacing on both axes; a tuple is read
/// as `(north, east)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spacing {
    pub north: f64,
    pub east: f64,
}

impl From<f64> for Spacing {
    fn from(value: f64) -> Self {
        Spacing {
            north: value,
            east: value,
        }
    }
}

impl From<(f64, f64)> for Spacing {
    fn from((north, east): (f64, f64)) -> Self {
        Spacing { north, east }
    }
}

impl Spacing {
    pub(crate) fn check(&self) -> Result<()> {
        for value in [self.north, self.east] {
            if !value.is_finite() || value <= 0.0 {
                return Err(GridderError::invalid(
                    "spacing",
                    value,
                    "spacing must be finite and positive",
                ));
            }
        }
        Ok(())
    }
}

/// What to change when the region extent is not a multiple of the spacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Adjust {
    /// Keep the region bounds and shrink or stretch the spacing.
    #[default]
    Spacing,

    /// Keep the spacing and move the east/north bounds.
    Region,
}

/// Computes the bounding region of an `N x 2` coordinate matrix.
///
/// # Errors
/// - `EmptyInput` if there are no points.
/// - `InvalidParameter` if the matrix does not have two columns.
pub fn get_region(coordinates: MatRef<f64>) -> Result<Region> {
    crate::data::check_coordinates(coordinates)?;

    let extents = ferreus_grid_utils::get_pointarray_extents(coordinates).ok_or_else(|| {
        GridderError::EmptyInput("cannot compute the region of zero points".into())
    })?;

    Region::new(extents[0], extents[2], extents[1], extents[3])
}

/// Expands a region by `pad` on every side.
pub fn pad_region(region: &Region, pad: impl Into<Spacing>) -> Result<Region> {
    let pad = pad.into();
    if [pad.north, pad.east].iter().any(|p| !p.is_finite() || *p < 0.0) {
        return Err(GridderError::invalid(
            "pad",
            format!("({}, {})", pad.north, pad.east),
            "padding must be finite and non-negative",
        ));
    }
    Region::new(
        region.west - pad.east,
        region.east + pad.east,
        region.south - pad.north,
        region.north + pad.north,
    )
}

/// Flags which of the `N x 2` coordinates fall inside `region` (inclusive).
pub fn inside(coordinates: MatRef<f64>, region: &Region) -> Vec<bool> {
    coordinates
        .row_iter()
        .map(|row| region.contains(row[0], row[1]))
        .collect()
}

/// Largest number of intervals (grid cells or blocks) allowed along one axis.
pub const MAX_AXIS_INTERVALS: usize = 1 << 24;

/// Number of `spacing` intervals that fit in `[min, max]`, rounded to the
/// nearest integer.
///
/// # Errors
/// - `InvalidParameter` ("spacing") if the count is not finite or exceeds
///   [`MAX_AXIS_INTERVALS`].
pub(crate) fn axis_intervals(min: f64, max: f64, spacing: f64) -> Result<usize> {
    let count = ((max - min) / spacing).round();
    if !count.is_finite() || count > MAX_AXIS_INTERVALS as f64 {
        return Err(GridderError::invalid(
            "spacing",
            spacing,
            format!(
                "[{}, {}] spans more than {} intervals",
                min, max, MAX_AXIS_INTERVALS
            ),
        ));
    }
    Ok(count as usize)
}

/// Nodes along one axis between `min` and `max`.
fn axis_nodes(min: f64, max: f64, spacing: f64, adjust: Adjust, axis: &str) -> Result<Vec<f64>> {
    let extent = max - min;
    let num_nodes = axis_intervals(min, max, spacing)? + 1;

    if num_nodes == 1 {
        return Ok(vec![min]);
    }

    match adjust {
        Adjust::Spacing => {
            let step = extent / (num_nodes - 1) as f64;

            if ((step - spacing) / spacing).abs() > 0.01 {
                log::warn!(
                    "{} spacing adjusted from {} to {} to fit the region [{}, {}]",
                    axis,
                    spacing,
                    step,
                    min,
                    max
                );
            }

            // Pin the last node so both edges are reproduced exactly.
            Ok((0..num_nodes)
                .map(|i| match i == num_nodes - 1 {
                    true => max,
                    false => min + step * i as f64,
                })
                .collect())
        }
        Adjust::Region => Ok((0..num_nodes).map(|i| min + spacing * i as f64).collect()),
    }
}

/// Generates the 1D node coordinates of a regular grid over `region`.
///
/// Returns `(northing, easting)` axes. Each axis holds
/// `round((max - min) / spacing) + 1` nodes. With [`Adjust::Spacing`] the
/// first and last node equal the region bounds; with [`Adjust::Region`] the
/// spacing is kept and the last node may move by up to half a spacing.
///
/// # Errors
/// - `InvalidParameter` for a non-positive spacing or an invalid region, or
///   when an axis would hold more than [`MAX_AXIS_INTERVALS`] intervals.
pub fn grid_axes(
    region: &Region,
    spacing: impl Into<Spacing>,
    adjust: Adjust,
) -> Result<(Vec<f64>, Vec<f64>)> {
    let spacing = spacing.into();
    spacing.check()?;
    region.check()?;

    let northing = axis_nodes(region.south, region.north, spacing.north, adjust, "north")?;
    let easting = axis_nodes(region.west, region.east, spacing.east, adjust, "east")?;

    Ok((northing, easting))
}

/// Generates the 2D coordinate arrays of a regular grid over `region`.
///
/// Returns `(easting, northing)` matrices of shape `(n_northing, n_easting)`:
/// row `i` runs along constant northing, column `j` along constant easting.
///
/// # Examples
/// ```
/// use ferreus_grid::{grid_coordinates, Adjust, Region};
///
/// let region = Region::new(0.0, 10.0, -5.0, 5.0)?;
/// let (easting, northing) = grid_coordinates(&region, 2.5, Adjust::Spacing)?;
/// assert_eq!(easting.shape(), (5, 5));
/// assert_eq!(easting[(0, 4)], 10.0);
/// assert_eq!(northing[(4, 0)], 5.0);
/// # Ok::<(), ferreus_grid::GridderError>(())
/// ```
pub fn grid_coordinates(
    region: &Region,
    spacing: impl Into<Spacing>,
    adjust: Adjust,
) -> Result<(Mat<f64>, Mat<f64>)> {
    let (northing, easting) = grid_axes(region, spacing, adjust)?;

    let rows = northing.len();
    let cols = easting.len();

    Ok((
        Mat::from_fn(rows, cols, |_, j| easting[j]),
        Mat::from_fn(rows, cols, |i, _| northing[i]),
    ))
}
