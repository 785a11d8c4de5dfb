/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines the regular grid container and the request describing a grid to evaluate.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Regular grids of estimated values with named axes and variables.

use crate::{
    coordinates::{Adjust, Region, Spacing},
    error::{GridderError, Result},
    projection::Projection,
};
use faer::Mat;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};

/// One named data variable of a [`Grid`], shaped `(rows, cols)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridVariable {
    pub name: String,
    pub values: Mat<f64>,
}

/// A regular grid of values.
///
/// Axis 0 (rows) runs along `dims[0]`, axis 1 (columns) along `dims[1]`.
/// Every variable and the mask have shape `(axis0.len(), axis1.len())`.
/// Deserialisation goes through the same checks as [`Grid::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GridFields")]
pub struct Grid {
    dims: [String; 2],
    axis0: Vec<f64>,
    axis1: Vec<f64>,
    variables: Vec<GridVariable>,
    /// Row-major, `true` marks an invalid node.
    mask: Option<Vec<bool>>,
}

/// Unchecked serialised form of a [`Grid`].
#[derive(Deserialize)]
struct GridFields {
    dims: [String; 2],
    axis0: Vec<f64>,
    axis1: Vec<f64>,
    variables: Vec<GridVariable>,
    mask: Option<Vec<bool>>,
}

impl TryFrom<GridFields> for Grid {
    type Error = GridderError;

    fn try_from(fields: GridFields) -> Result<Self> {
        let mut grid = Grid::new(fields.dims, fields.axis0, fields.axis1, fields.variables)?;

        if let Some(mask) = fields.mask {
            let (rows, cols) = grid.shape();
            if mask.len() != rows * cols {
                return Err(GridderError::invalid(
                    "mask",
                    mask.len(),
                    format!("expected {} nodes", rows * cols),
                ));
            }
            grid.mask = Some(mask);
        }

        Ok(grid)
    }
}

impl Grid {
    /// Creates a grid after checking every variable against the axis lengths.
    pub fn new(
        dims: [String; 2],
        axis0: Vec<f64>,
        axis1: Vec<f64>,
        variables: Vec<GridVariable>,
    ) -> Result<Self> {
        let shape = (axis0.len(), axis1.len());

        if let Some(bad) = variables.iter().find(|v| v.values.shape() != shape) {
            return Err(GridderError::invalid(
                "variables",
                format!("{} with shape {:?}", bad.name, bad.values.shape()),
                format!("expected shape {:?}", shape),
            ));
        }

        for (i, var) in variables.iter().enumerate() {
            if variables[..i].iter().any(|other| other.name == var.name) {
                return Err(GridderError::invalid(
                    "variables",
                    &var.name,
                    "variable names must be unique",
                ));
            }
        }

        Ok(Self {
            dims,
            axis0,
            axis1,
            variables,
            mask: None,
        })
    }

    pub fn dims(&self) -> &[String; 2] {
        &self.dims
    }

    /// Node coordinates along axis 0 (rows).
    pub fn axis0(&self) -> &[f64] {
        &self.axis0
    }

    /// Node coordinates along axis 1 (columns).
    pub fn axis1(&self) -> &[f64] {
        &self.axis1
    }

    /// Node coordinates of the axis labelled `dim`.
    pub fn coords(&self, dim: &str) -> Option<&[f64]> {
        match dim {
            d if d == self.dims[0] => Some(&self.axis0),
            d if d == self.dims[1] => Some(&self.axis1),
            _ => None,
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.axis0.len(), self.axis1.len())
    }

    pub fn variables(&self) -> &[GridVariable] {
        &self.variables
    }

    /// Values of the variable called `name`.
    pub fn variable(&self, name: &str) -> Option<&Mat<f64>> {
        self.variables
            .iter()
            .find(|v| v.name == name)
            .map(|v| &v.values)
    }

    /// Row-major node mask, `None` when nothing has been masked.
    pub fn mask(&self) -> Option<&[bool]> {
        self.mask.as_deref()
    }

    pub fn is_masked(&self, row: usize, col: usize) -> bool {
        self.mask
            .as_ref()
            .is_some_and(|m| m[row * self.axis1.len() + col])
    }

    /// Number of masked nodes.
    pub fn num_masked(&self) -> usize {
        self.mask
            .as_ref()
            .map_or(0, |m| m.iter().filter(|&&b| b).count())
    }

    /// Marks nodes as invalid and sets every variable to NaN there.
    /// Nodes already masked stay masked.
    pub(crate) fn apply_mask(&mut self, masked: &[bool]) {
        let cols = self.axis1.len();
        let total = self.axis0.len() * cols;
        debug_assert_eq!(masked.len(), total);

        let mask = self.mask.get_or_insert_with(|| vec![false; total]);
        mask.iter_mut()
            .zip(masked)
            .for_each(|(m, &new)| *m |= new);

        for var in self.variables.iter_mut() {
            for (k, _) in mask.iter().enumerate().filter(|&(_, &m)| m) {
                var.values[(k / cols, k % cols)] = f64::NAN;
            }
        }
    }
}

/// Describes the grid an estimator should be evaluated on.
///
/// # Examples
/// ```
/// use ferreus_grid::{Adjust, GridSpec, Region};
///
/// let spec = GridSpec::new(0.5)
///     .region(Region::new(0.0, 10.0, 0.0, 10.0)?)
///     .adjust(Adjust::Region)
///     .data_names(vec!["temperature".into()]);
/// assert_eq!(spec.dims[0], "northing");
/// # Ok::<(), ferreus_grid::GridderError>(())
/// ```
#[derive(Clone)]
pub struct GridSpec {
    /// Region to grid. Defaults to the region the estimator was fitted on.
    pub region: Option<Region>,
    pub spacing: Spacing,
    pub adjust: Adjust,
    /// Applied to the grid nodes before prediction. When set, `region` is in
    /// the unprojected coordinates and must be given explicitly.
    pub projection: Option<Arc<dyn Projection>>,
    pub dims: [String; 2],
    /// Defaults to `"scalars"` for one channel, `"component_{i}"` otherwise.
    pub data_names: Option<Vec<String>>,
}

impl GridSpec {
    pub fn new(spacing: impl Into<Spacing>) -> Self {
        Self {
            region: None,
            spacing: spacing.into(),
            adjust: Adjust::default(),
            projection: None,
            dims: ["northing".to_string(), "easting".to_string()],
            data_names: None,
        }
    }

    pub fn region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    pub fn adjust(mut self, adjust: Adjust) -> Self {
        self.adjust = adjust;
        self
    }

    pub fn projection<P: Projection + 'static>(mut self, projection: P) -> Self {
        self.projection = Some(Arc::new(projection));
        self
    }

    pub fn dims(mut self, axis0: impl Into<String>, axis1: impl Into<String>) -> Self {
        self.dims = [axis0.into(), axis1.into()];
        self
    }

    pub fn data_names(mut self, names: Vec<String>) -> Self {
        self.data_names = Some(names);
        self
    }

    /// Variable names for `n_channels` predicted channels.
    pub(crate) fn resolve_names(&self, n_channels: usize) -> Result<Vec<String>> {
        match &self.data_names {
            Some(names) if names.len() != n_channels => Err(GridderError::invalid(
                "data_names",
                format!("{} names", names.len()),
                format!("expected {} names, one per value channel", n_channels),
            )),
            Some(names) => Ok(names.clone()),
            None if n_channels == 1 => Ok(vec!["scalars".to_string()]),
            None => Ok((0..n_channels).map(|i| format!("component_{}", i)).collect()),
        }
    }
}

impl fmt::Debug for GridSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridSpec")
            .field("region", &self.region)
            .field("spacing", &self.spacing)
            .field("adjust", &self.adjust)
            .field("projection", &self.projection.as_ref().map(|_| "<projection>"))
            .field("dims", &self.dims)
            .field("data_names", &self.data_names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_grid() -> Grid {
        let values = Mat::from_fn(2, 3, |i, j| (i * 3 + j) as f64);
        Grid::new(
            ["northing".into(), "easting".into()],
            vec![0.0, 1.0],
            vec![0.0, 1.0, 2.0],
            vec![GridVariable {
                name: "scalars".into(),
                values,
            }],
        )
        .unwrap()
    }

    #[test]
    fn rejects_mismatched_variable_shape() {
        let err = Grid::new(
            ["northing".into(), "easting".into()],
            vec![0.0, 1.0],
            vec![0.0],
            vec![GridVariable {
                name: "scalars".into(),
                values: Mat::zeros(2, 2),
            }],
        )
        .unwrap_err();
        assert!(matches!(err, GridderError::InvalidParameter { name: "variables", .. }));
    }

    #[test]
    fn coords_by_dimension_name() {
        let grid = sample_grid();
        assert_eq!(grid.coords("easting"), Some(&[0.0, 1.0, 2.0][..]));
        assert_eq!(grid.coords("depth"), None);
    }

    #[test]
    fn apply_mask_accumulates() {
        let mut grid = sample_grid();
        grid.apply_mask(&[true, false, false, false, false, false]);
        grid.apply_mask(&[false, false, false, false, false, true]);

        assert_eq!(grid.num_masked(), 2);
        assert!(grid.is_masked(0, 0));
        assert!(grid.is_masked(1, 2));

        let values = grid.variable("scalars").unwrap();
        assert!(values[(0, 0)].is_nan());
        assert!(values[(1, 2)].is_nan());
        assert_eq!(values[(1, 1)], 4.0);
    }

    #[test]
    fn default_data_names() {
        let spec = GridSpec::new(1.0);
        assert_eq!(spec.resolve_names(1).unwrap(), vec!["scalars"]);
        assert_eq!(
            spec.resolve_names(2).unwrap(),
            vec!["component_0", "component_1"]
        );
    }

    #[test]
    fn data_name_count_must_match_channels() {
        let spec = GridSpec::new(1.0).data_names(vec!["a".into()]);
        assert!(spec.resolve_names(2).is_err());
    }

    #[test]
    fn deserialisation_checks_mask_length() {
        let mut grid = sample_grid();
        grid.mask = Some(vec![false, true, false, false, false, true]);

        let json = serde_json::to_value(&grid).unwrap();
        let restored: Grid = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(restored.num_masked(), 2);
        assert!(restored.is_masked(0, 1));

        let mut truncated = json;
        truncated["mask"] = serde_json::json!([true]);
        assert!(serde_json::from_value::<Grid>(truncated).is_err());
    }
}
