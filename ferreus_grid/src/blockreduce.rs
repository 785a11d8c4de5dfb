/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements block-based decimation of scattered data.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Block reduction splits the plane into a regular grid of blocks and
//! replaces the points inside each block by a single representative point.

use crate::{
    coordinates::{axis_intervals, Adjust, Region, Spacing},
    data::ScatteredData,
    error::{GridderError, Result},
    estimator::Estimator,
};
use faer::{Mat, MatRef};
use std::{collections::BTreeMap, fmt};

/// A named aggregation function applied to the values inside a block.
///
/// Any `fn(&[f64]) -> f64` can be used. The slice is never empty.
#[derive(Clone, Copy)]
pub struct Reduction {
    name: &'static str,
    func: fn(&[f64]) -> f64,
}

impl Reduction {
    pub fn new(name: &'static str, func: fn(&[f64]) -> f64) -> Self {
        Reduction { name, func }
    }

    pub fn mean() -> Self {
        Reduction::new("mean", |v| v.iter().sum::<f64>() / v.len() as f64)
    }

    pub fn median() -> Self {
        Reduction::new("median", |v| {
            let mut sorted = v.to_vec();
            sorted.sort_by(f64::total_cmp);
            let mid = sorted.len() / 2;
            match sorted.len() % 2 {
                0 => 0.5 * (sorted[mid - 1] + sorted[mid]),
                _ => sorted[mid],
            }
        })
    }

    pub fn min() -> Self {
        Reduction::new("min", |v| v.iter().copied().fold(f64::INFINITY, f64::min))
    }

    pub fn max() -> Self {
        Reduction::new("max", |v| v.iter().copied().fold(f64::NEG_INFINITY, f64::max))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn apply(&self, values: &[f64]) -> f64 {
        (self.func)(values)
    }
}

impl Default for Reduction {
    fn default() -> Self {
        Reduction::mean()
    }
}

impl fmt::Debug for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Block layout along one axis.
#[derive(Debug, Clone, Copy)]
struct BlockAxis {
    min: f64,
    size: f64,
    count: usize,
}

impl BlockAxis {
    fn new(min: f64, max: f64, spacing: f64, adjust: Adjust) -> Result<Self> {
        let count = axis_intervals(min, max, spacing)?.max(1);
        let size = match adjust {
            Adjust::Spacing => (max - min) / count as f64,
            Adjust::Region => spacing,
        };
        Ok(BlockAxis { min, size, count })
    }

    #[inline]
    fn index(&self, x: f64) -> usize {
        if self.size <= 0.0 {
            return 0;
        }
        let i = ((x - self.min) / self.size).floor().max(0.0) as usize;
        i.min(self.count - 1)
    }

    #[inline]
    fn center(&self, i: usize) -> f64 {
        self.min + (i as f64 + 0.5) * self.size
    }
}

/// Decimates scattered data by reducing every block of a regular partition
/// to one point.
///
/// # Examples
/// ```
/// use ferreus_grid::{BlockReduce, Reduction, ScatteredData};
///
/// let data = ScatteredData::from_slices(
///     &[0.1, 0.2, 3.5],
///     &[0.1, 0.3, 3.5],
///     &[1.0, 3.0, 10.0],
/// )?;
/// let reduced = BlockReduce::new(Reduction::mean(), 1.0).filter(&data)?;
/// assert_eq!(reduced.len(), 2);
/// assert_eq!(reduced.values()[(0, 0)], 2.0);
/// # Ok::<(), ferreus_grid::GridderError>(())
/// ```
#[derive(Debug, Clone)]
pub struct BlockReduce {
    reduction: Reduction,
    spacing: Spacing,
    region: Option<Region>,
    center_coordinates: bool,
    adjust: Adjust,
    fitted: bool,
}

impl BlockReduce {
    pub fn new(reduction: Reduction, spacing: impl Into<Spacing>) -> Self {
        BlockReduce {
            reduction,
            spacing: spacing.into(),
            region: None,
            center_coordinates: false,
            adjust: Adjust::default(),
            fitted: false,
        }
    }

    /// Partitions this region instead of the data's bounding region. Points
    /// outside it are dropped.
    pub fn region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    /// Places each output point at its block centre instead of reducing the
    /// point coordinates.
    pub fn center_coordinates(mut self, center_coordinates: bool) -> Self {
        self.center_coordinates = center_coordinates;
        self
    }

    pub fn adjust(mut self, adjust: Adjust) -> Self {
        self.adjust = adjust;
        self
    }

    pub fn reduction(&self) -> Reduction {
        self.reduction
    }

    pub fn spacing(&self) -> Spacing {
        self.spacing
    }

    /// Reduces `data` to one point per non-empty block.
    ///
    /// Output points are ordered by block, northing block first. Coordinates
    /// and every value channel are reduced independently; weights are summed.
    ///
    /// # Errors
    /// - `EmptyInput` if there are no points (inside the region).
    /// - `InvalidParameter` for a non-positive spacing, an invalid region, or a
    ///   partition with more than [`MAX_AXIS_INTERVALS`](crate::MAX_AXIS_INTERVALS) blocks per axis.
    pub fn filter(&self, data: &ScatteredData) -> Result<ScatteredData> {
        self.spacing.check()?;

        if data.is_empty() {
            return Err(GridderError::EmptyInput("cannot block reduce zero points".into()));
        }

        let region = match self.region {
            Some(region) => {
                region.check()?;
                region
            }
            None => data.region()?,
        };

        let east_axis = BlockAxis::new(region.west, region.east, self.spacing.east, self.adjust)?;
        let north_axis = BlockAxis::new(region.south, region.north, self.spacing.north, self.adjust)?;

        let coords = data.coordinates();
        let mut blocks: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
        for i in 0..data.len() {
            let (e, n) = (coords[(i, 0)], coords[(i, 1)]);
            if self.region.is_some() && !region.contains(e, n) {
                continue;
            }
            blocks
                .entry((north_axis.index(n), east_axis.index(e)))
                .or_default()
                .push(i);
        }

        if blocks.is_empty() {
            return Err(GridderError::EmptyInput(
                "no points fall inside the block reduction region".into(),
            ));
        }

        let num_blocks = blocks.len();
        let num_channels = data.n_channels();
        let values = data.values();

        let mut out_coords = Mat::<f64>::zeros(num_blocks, 2);
        let mut out_values = Mat::<f64>::zeros(num_blocks, num_channels);
        let mut out_weights = Vec::with_capacity(num_blocks);

        let mut buffer = Vec::new();
        for (b, (&(row, col), members)) in blocks.iter().enumerate() {
            match self.center_coordinates {
                true => {
                    out_coords[(b, 0)] = east_axis.center(col);
                    out_coords[(b, 1)] = north_axis.center(row);
                }
                false => {
                    out_coords[(b, 0)] = self.reduce_column(coords, 0, members, &mut buffer);
                    out_coords[(b, 1)] = self.reduce_column(coords, 1, members, &mut buffer);
                }
            }

            for channel in 0..num_channels {
                out_values[(b, channel)] = self.reduce_column(values, channel, members, &mut buffer);
            }

            out_weights.push(members.iter().map(|&i| data.weight(i)).sum::<f64>());
        }

        log::debug!(
            "block reduced {} points to {} blocks with {}",
            data.len(),
            num_blocks,
            self.reduction.name()
        );

        ScatteredData::new(
            out_coords,
            out_values,
            data.weights().map(|_| out_weights),
        )
    }

    fn reduce_column(
        &self,
        source: MatRef<f64>,
        column: usize,
        members: &[usize],
        buffer: &mut Vec<f64>,
    ) -> f64 {
        buffer.clear();
        buffer.extend(members.iter().map(|&i| source[(i, column)]));
        self.reduction.apply(buffer)
    }
}

impl fmt::Display for BlockReduce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BlockReduce(reduction={}, spacing=({}, {}), center_coordinates={}, adjust={:?})",
            self.reduction.name(),
            self.spacing.north,
            self.spacing.east,
            self.center_coordinates,
            self.adjust
        )
    }
}

impl Estimator for BlockReduce {
    fn name(&self) -> &'static str {
        "BlockReduce"
    }

    fn fit_transform(&mut self, data: &ScatteredData) -> Result<ScatteredData> {
        let reduced = self.filter(data)?;
        self.fitted = true;
        Ok(reduced)
    }

    fn predict(&self, _coordinates: MatRef<f64>) -> Result<Mat<f64>> {
        Err(GridderError::NotPredictive(self.name().to_string()))
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }

    fn supports_prediction(&self) -> bool {
        false
    }

    fn fitted_region(&self) -> Result<Region> {
        Err(GridderError::NotPredictive(self.name().to_string()))
    }
}
