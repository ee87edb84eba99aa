//! Ordinary least squares with an intercept term.

use crate::{Error, Result};
use nalgebra::{DMatrix, DVector};

/// Fitted linear model `y = intercept + x . coefficients`
#[derive(Debug, Clone)]
pub struct LinearModel {
    intercept: f64,
    coefficients: DVector<f64>,
}

impl LinearModel {
    /// Fit by least squares on mean-centred data.
    ///
    /// Rank-deficient designs get the minimum-norm solution, with singular
    /// values below the usual `lstsq` cutoff treated as zero.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no samples or the shapes disagree
    pub fn fit(x: &DMatrix<f64>, y: &DVector<f64>) -> Result<Self> {
        let (n, p) = x.shape();
        if n == 0 {
            return Err(Error::ImputationError("Cannot fit regression on zero samples".to_string()));
        }
        if y.len() != n {
            return Err(Error::ImputationError(format!(
                "Regression target has {} rows, design has {n}",
                y.len()
            )));
        }

        let y_mean = y.mean();
        if p == 0 {
            return Ok(Self {
                intercept: y_mean,
                coefficients: DVector::zeros(0),
            });
        }

        let x_means = DVector::from_iterator(p, x.column_iter().map(|c| c.mean()));
        let mut centred = x.clone();
        for (j, mut column) in centred.column_iter_mut().enumerate() {
            column.add_scalar_mut(-x_means[j]);
        }
        let y_centred = y.add_scalar(-y_mean);

        // Constant predictors carry no information
        let coefficients = if centred.amax() == 0.0 {
            DVector::zeros(p)
        } else {
            let svd = centred.svd(true, true);
            let max_sv = svd.singular_values.max();
            #[allow(clippy::cast_precision_loss)]
            let eps = f64::EPSILON * n.max(p) as f64 * max_sv;
            svd.solve(&y_centred, eps)
                .map_err(|e| Error::ImputationError(format!("Least squares solve failed: {e}")))?
        };

        let intercept = y_mean - x_means.dot(&coefficients);
        Ok(Self {
            intercept,
            coefficients,
        })
    }

    /// Predict for one sample
    #[must_use]
    pub fn predict(&self, features: &[f64]) -> f64 {
        self.intercept
            + features
                .iter()
                .zip(self.coefficients.iter())
                .map(|(x, c)| x * c)
                .sum::<f64>()
    }

    #[must_use]
    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    #[must_use]
    pub fn coefficients(&self) -> &DVector<f64> {
        &self.coefficients
    }
}
