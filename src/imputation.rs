//! Iterative imputation of missing keypoint coordinates.
//!
//! Each pass regresses every gapped column on the columns that have no gaps
//! and fills only the missing cells. Passes repeat until no cell is missing
//! or the missing-cell count changes by no more than a tolerance between
//! passes. When every column has a gap there is nothing complete to regress
//! on, so the table goes through a round-robin multivariate estimator
//! instead and its result is returned directly.

use crate::config::ImputationConfig;
use crate::regression::LinearModel;
use crate::{Error, Result};
use nalgebra::{DMatrix, DVector};
use ndarray::{Array2, Axis};

/// Result of a single imputation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// No missing cells were present
    Complete,
    /// Missing count moved by no more than the tolerance since the last pass
    Converged { missing: usize },
    /// Every column had a gap; the multivariate estimator filled the table
    Fallback { missing: usize },
    /// Gapped columns were regressed on the complete ones
    Filled { missing: usize },
}

/// Indices of columns with at least one `NaN`
#[must_use]
pub fn columns_with_missing(table: &Array2<f64>) -> Vec<usize> {
    table
        .axis_iter(Axis(1))
        .enumerate()
        .filter(|(_, column)| column.iter().any(|v| v.is_nan()))
        .map(|(j, _)| j)
        .collect()
}

/// Number of `NaN` cells
#[must_use]
pub fn missing_count(table: &Array2<f64>) -> usize {
    table.iter().filter(|v| v.is_nan()).count()
}

/// Regression-based imputer with a missing-count convergence check
#[derive(Debug, Clone)]
pub struct IterativeImputer {
    tolerance: usize,
    max_passes: usize,
    fallback: RoundRobinImputer,
}

impl Default for IterativeImputer {
    fn default() -> Self {
        Self::from_config(&ImputationConfig::default())
    }
}

impl IterativeImputer {
    /// Create an imputer
    ///
    /// # Panics
    ///
    /// Panics if `max_passes` is zero
    #[must_use]
    pub fn new(tolerance: usize, max_passes: usize) -> Self {
        assert!(max_passes > 0, "Max passes must be greater than 0");
        Self {
            tolerance,
            max_passes,
            fallback: RoundRobinImputer::default(),
        }
    }

    #[must_use]
    pub fn from_config(config: &ImputationConfig) -> Self {
        Self::new(config.tolerance, config.max_passes)
            .with_fallback(RoundRobinImputer::new(config.fallback_max_iter, config.fallback_tol))
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: RoundRobinImputer) -> Self {
        self.fallback = fallback;
        self
    }

    /// Fill every missing cell, keeping shape and column order.
    ///
    /// Consumes the table and returns the filled copy.
    ///
    /// # Errors
    ///
    /// Returns an error if a gapped column has no observed rows to train on
    /// while other columns are complete
    pub fn fill_missing_values(&self, mut table: Array2<f64>) -> Result<Array2<f64>> {
        let mut previous = None;
        for pass in 0..self.max_passes {
            match self.pass(&mut table, previous)? {
                PassOutcome::Complete => return Ok(table),
                PassOutcome::Converged { missing } => {
                    log::debug!("Imputation converged after {pass} passes with {missing} cells missing");
                    return Ok(table);
                }
                PassOutcome::Fallback { missing } => {
                    log::debug!("All columns gapped, multivariate fallback filled {missing} cells");
                    return Ok(table);
                }
                PassOutcome::Filled { missing } => {
                    log::debug!("Imputation pass {pass}: {missing} cells were missing");
                    previous = Some(missing);
                }
            }
        }

        log::warn!(
            "Imputation stopped after {} passes with {} cells still missing",
            self.max_passes,
            missing_count(&table)
        );
        Ok(table)
    }

    /// Run one pass, given the missing count seen by the previous pass
    ///
    /// # Errors
    ///
    /// Returns an error if a gapped column cannot be regressed
    pub fn pass(&self, table: &mut Array2<f64>, previous: Option<usize>) -> Result<PassOutcome> {
        let gapped = columns_with_missing(table);
        if gapped.is_empty() {
            return Ok(PassOutcome::Complete);
        }

        let missing = missing_count(table);
        if let Some(previous) = previous {
            if previous.abs_diff(missing) <= self.tolerance {
                return Ok(PassOutcome::Converged { missing });
            }
        }

        if gapped.len() == table.ncols() {
            *table = self.fallback.fit_transform(table)?;
            return Ok(PassOutcome::Fallback { missing });
        }

        fill_from_complete_columns(table, &gapped)?;
        Ok(PassOutcome::Filled { missing })
    }
}

/// Fill with the default imputer settings
///
/// # Errors
///
/// See [`IterativeImputer::fill_missing_values`]
pub fn fill_missing_values(table: Array2<f64>) -> Result<Array2<f64>> {
    IterativeImputer::default().fill_missing_values(table)
}

fn fill_from_complete_columns(table: &mut Array2<f64>, gapped: &[usize]) -> Result<()> {
    let predictors: Vec<usize> = (0..table.ncols()).filter(|j| !gapped.contains(j)).collect();
    if predictors.is_empty() {
        return Err(Error::ImputationError(
            "No complete predictor columns available for regression".to_string(),
        ));
    }

    for &target in gapped {
        let observed: Vec<usize> = (0..table.nrows()).filter(|&i| !table[[i, target]].is_nan()).collect();
        if observed.is_empty() {
            return Err(Error::ImputationError(format!(
                "Column {target} has no observed values to train on"
            )));
        }

        let x = DMatrix::from_fn(observed.len(), predictors.len(), |r, c| table[[observed[r], predictors[c]]]);
        let y = DVector::from_iterator(observed.len(), observed.iter().map(|&i| table[[i, target]]));
        let model = LinearModel::fit(&x, &y)?;

        let mut features = vec![0.0; predictors.len()];
        for i in 0..table.nrows() {
            if table[[i, target]].is_nan() {
                for (slot, &p) in features.iter_mut().zip(&predictors) {
                    *slot = table[[i, p]];
                }
                table[[i, target]] = model.predict(&features);
            }
        }
    }
    Ok(())
}

/// Multivariate imputer that cycles regressions over every gapped column.
///
/// Cells start at their column mean (zero for a column with no observed
/// values). Each round regresses every gapped column, least-missing first,
/// on all other columns and overwrites its missing cells. Rounds stop when
/// the infinity norm of the change (largest absolute row sum) falls below
/// `tol` times the largest observed magnitude, or after `max_iter` rounds. No step is randomised, so the
/// output is deterministic.
#[derive(Debug, Clone)]
pub struct RoundRobinImputer {
    max_iter: usize,
    tol: f64,
}

impl Default for RoundRobinImputer {
    fn default() -> Self {
        Self::new(
            crate::constants::DEFAULT_FALLBACK_MAX_ITER,
            crate::constants::DEFAULT_FALLBACK_TOL,
        )
    }
}

impl RoundRobinImputer {
    /// # Panics
    ///
    /// Panics if `max_iter` is zero or `tol` is negative
    #[must_use]
    pub fn new(max_iter: usize, tol: f64) -> Self {
        assert!(max_iter > 0, "Max iterations must be greater than 0");
        assert!(tol >= 0.0, "Tolerance must be non-negative, got {}", tol);
        Self { max_iter, tol }
    }

    /// Impute all missing cells of `table`
    ///
    /// # Errors
    ///
    /// Returns an error if a regression cannot be fitted
    pub fn fit_transform(&self, table: &Array2<f64>) -> Result<Array2<f64>> {
        let mask = table.mapv(f64::is_nan);
        let (n_rows, n_cols) = table.dim();

        let mut filled = table.clone();
        for (j, mut column) in filled.axis_iter_mut(Axis(1)).enumerate() {
            let observed: Vec<f64> = table.column(j).iter().copied().filter(|v| !v.is_nan()).collect();
            #[allow(clippy::cast_precision_loss)]
            let mean = if observed.is_empty() {
                0.0
            } else {
                observed.iter().sum::<f64>() / observed.len() as f64
            };
            column.mapv_inplace(|v| if v.is_nan() { mean } else { v });
        }

        let mut order: Vec<(usize, usize)> = (0..n_cols)
            .map(|j| (mask.column(j).iter().filter(|&&m| m).count(), j))
            .filter(|&(count, _)| count > 0)
            .collect();
        order.sort_by_key(|&(count, _)| count);

        let scale = table
            .iter()
            .filter(|v| !v.is_nan())
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let threshold = self.tol * scale;

        for round in 0..self.max_iter {
            let previous = filled.clone();

            for &(_, target) in &order {
                let train: Vec<usize> = (0..n_rows).filter(|&i| !mask[[i, target]]).collect();
                if train.is_empty() {
                    continue;
                }
                let others: Vec<usize> = (0..n_cols).filter(|&j| j != target).collect();

                let x = DMatrix::from_fn(train.len(), others.len(), |r, c| filled[[train[r], others[c]]]);
                let y = DVector::from_iterator(train.len(), train.iter().map(|&i| filled[[i, target]]));
                let model = LinearModel::fit(&x, &y)?;

                let mut features = vec![0.0; others.len()];
                for i in (0..n_rows).filter(|&i| mask[[i, target]]) {
                    for (slot, &o) in features.iter_mut().zip(&others) {
                        *slot = filled[[i, o]];
                    }
                    filled[[i, target]] = model.predict(&features);
                }
            }

            let change = max_abs_row_sum(&(&filled - &previous));
            if change < threshold {
                log::debug!("Round-robin imputation converged after {} rounds", round + 1);
                return Ok(filled);
            }
        }

        log::debug!("Round-robin imputation reached {} rounds without converging", self.max_iter);
        Ok(filled)
    }
}

/// Matrix infinity norm: the largest sum of absolute values over a row
fn max_abs_row_sum(values: &Array2<f64>) -> f64 {
    values
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0_f64, f64::max)
}
