/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the pipeline chain of named estimators.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Ordered pipelines of estimators.

use crate::{
    coordinates::Region,
    data::ScatteredData,
    error::{GridderError, Result},
    estimator::{ensure_predictive, Estimator},
    grid::{Grid, GridSpec},
};
use faer::{Mat, MatRef};
use std::fmt;

/// A named step of a [`Chain`].
pub type Step = (String, Box<dyn Estimator>);

/// Runs a sequence of estimators, feeding each step the output of the
/// previous one. Prediction is delegated to the last step.
///
/// # Examples
/// ```
/// use ferreus_grid::{BlockReduce, Chain, Estimator, Reduction, Spline};
///
/// let chain = Chain::new(vec![
///     ("reduce".to_string(), Box::new(BlockReduce::new(Reduction::mean(), 1.0)) as Box<dyn Estimator>),
///     ("spline".to_string(), Box::new(Spline::builder().build()?) as Box<dyn Estimator>),
/// ])?;
/// assert!(chain.to_string().starts_with("Chain(steps=[('reduce', BlockReduce("));
/// # Ok::<(), ferreus_grid::GridderError>(())
/// ```
pub struct Chain {
    steps: Vec<Step>,
    fitted: bool,
}

impl Chain {
    /// Creates an unfitted chain.
    ///
    /// # Errors
    /// - `EmptyInput` for zero steps.
    /// - `InvalidParameter` for repeated step names.
    /// - `NotPredictive` if the last step cannot predict.
    pub fn new(steps: Vec<Step>) -> Result<Self> {
        let Some((last_name, last)) = steps.last() else {
            return Err(GridderError::EmptyInput("a chain needs at least one step".into()));
        };

        if !last.supports_prediction() {
            return Err(GridderError::NotPredictive(format!(
                "Chain (last step '{}' is a {})",
                last_name,
                last.name()
            )));
        }

        for (i, (name, _)) in steps.iter().enumerate() {
            if steps[..i].iter().any(|(other, _)| other == name) {
                return Err(GridderError::invalid(
                    "steps",
                    name,
                    "step names must be unique",
                ));
            }
        }

        Ok(Chain {
            steps,
            fitted: false,
        })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The step called `name`.
    pub fn named_step(&self, name: &str) -> Option<&dyn Estimator> {
        self.steps
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, step)| step.as_ref())
    }

    /// Fits every step in order.
    ///
    /// On the first failing step the error is returned and the chain is left
    /// unfitted.
    pub fn fit(&mut self, data: &ScatteredData) -> Result<()> {
        self.fitted = false;

        let mut current = data.clone();
        for (name, step) in self.steps.iter_mut() {
            log::debug!("fitting chain step '{}' on {} points", name, current.len());
            current = step.fit_transform(&current)?;
        }

        self.fitted = true;
        Ok(())
    }

    fn last(&self) -> Result<&dyn Estimator> {
        if !self.fitted {
            return Err(GridderError::NotFitted("Chain".into()));
        }
        self.steps
            .last()
            .map(|(_, step)| step.as_ref())
            .ok_or_else(|| GridderError::EmptyInput("a chain needs at least one step".into()))
    }

    pub fn predict(&self, coordinates: MatRef<f64>) -> Result<Mat<f64>> {
        self.last()?.predict(coordinates)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chain(steps=[")?;
        for (i, (name, step)) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "('{}', {})", name, step)?;
        }
        write!(f, "])")
    }
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Estimator for Chain {
    fn name(&self) -> &'static str {
        "Chain"
    }

    fn fit_transform(&mut self, data: &ScatteredData) -> Result<ScatteredData> {
        self.fit(data)?;
        Ok(data.clone())
    }

    fn predict(&self, coordinates: MatRef<f64>) -> Result<Mat<f64>> {
        Chain::predict(self, coordinates)
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }

    fn fitted_region(&self) -> Result<Region> {
        self.last()?.fitted_region()
    }

    fn grid(&self, spec: &GridSpec) -> Result<Grid> {
        ensure_predictive(self)?;
        self.last()?.grid(spec)
    }

    fn score(&self, data: &ScatteredData) -> Result<f64> {
        self.last()?.score(data)
    }
}
