//! Feature standardization
//!
//! `z = (x - mean) / scale`, with the population standard deviation as scale.

use crate::error::{DietError, DietResult};
use crate::models::{FeatureRow, FEATURE_COLUMNS, NUM_FEATURES};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Variance below this is treated as zero
const ZERO_VARIANCE_EPSILON: f64 = 1e-12;

/// What to do with a feature whose variance is zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroVariancePolicy {
    /// Fail the fit with [`DietError::DegenerateFeature`]
    #[default]
    Reject,
    /// Center the feature but leave it unscaled (scale = 1)
    Passthrough,
}

/// Fits a [`ScalerState`] from a feature matrix
#[derive(Debug, Clone, Default)]
pub struct Scaler {
    zero_variance: ZeroVariancePolicy,
}

impl Scaler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zero_variance_policy(mut self, policy: ZeroVariancePolicy) -> Self {
        self.zero_variance = policy;
        self
    }

    pub fn fit(&self, rows: &[FeatureRow]) -> DietResult<ScalerState> {
        if rows.is_empty() {
            return Err(DietError::DataIntegrity(
                "cannot fit a scaler on zero rows".to_string(),
            ));
        }
        let n = rows.len() as f64;

        let mut mean = [0.0; NUM_FEATURES];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut variance = [0.0; NUM_FEATURES];
        for row in rows {
            for j in 0..NUM_FEATURES {
                variance[j] += (row[j] - mean[j]).powi(2);
            }
        }

        let mut scale = [1.0; NUM_FEATURES];
        for j in 0..NUM_FEATURES {
            let var = variance[j] / n;
            if var <= ZERO_VARIANCE_EPSILON {
                match self.zero_variance {
                    ZeroVariancePolicy::Reject => {
                        return Err(DietError::DegenerateFeature {
                            feature: FEATURE_COLUMNS[j].to_string(),
                        })
                    }
                    ZeroVariancePolicy::Passthrough => {
                        warn!(feature = FEATURE_COLUMNS[j], "Zero-variance feature left unscaled");
                        scale[j] = 1.0;
                    }
                }
            } else {
                scale[j] = var.sqrt();
            }
        }

        Ok(ScalerState { mean, scale })
    }
}

/// Fitted per-feature mean and scale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    pub mean: FeatureRow,
    pub scale: FeatureRow,
}

impl ScalerState {
    pub fn transform_row(&self, row: &FeatureRow) -> FeatureRow {
        let mut out = [0.0; NUM_FEATURES];
        for j in 0..NUM_FEATURES {
            out[j] = (row[j] - self.mean[j]) / self.scale[j];
        }
        out
    }

    pub fn inverse_transform_row(&self, row: &FeatureRow) -> FeatureRow {
        let mut out = [0.0; NUM_FEATURES];
        for j in 0..NUM_FEATURES {
            out[j] = row[j] * self.scale[j] + self.mean[j];
        }
        out
    }

    pub fn transform(&self, rows: &[FeatureRow]) -> Vec<FeatureRow> {
        rows.iter().map(|r| self.transform_row(r)).collect()
    }

    pub fn inverse_transform(&self, rows: &[FeatureRow]) -> Vec<FeatureRow> {
        rows.iter().map(|r| self.inverse_transform_row(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<FeatureRow> {
        vec![
            [52.0, 0.3, 0.2, 14.0],
            [250.0, 9.0, 3.2, 49.0],
            [165.0, 31.0, 3.6, 0.0],
            [30.0, 2.8, 0.4, 6.0],
        ]
    }

    #[test]
    fn test_standardized_columns_have_zero_mean_unit_variance() {
        let state = Scaler::new().fit(&sample()).unwrap();
        let scaled = state.transform(&sample());

        for j in 0..NUM_FEATURES {
            let mean: f64 = scaled.iter().map(|r| r[j]).sum::<f64>() / scaled.len() as f64;
            let var: f64 =
                scaled.iter().map(|r| (r[j] - mean).powi(2)).sum::<f64>() / scaled.len() as f64;
            assert!(mean.abs() < 1e-9, "column {} mean {}", j, mean);
            assert!((var - 1.0).abs() < 1e-9, "column {} variance {}", j, var);
        }
    }

    #[test]
    fn test_round_trip() {
        let data = sample();
        let state = Scaler::new().fit(&data).unwrap();
        let restored = state.inverse_transform(&state.transform(&data));

        for (original, back) in data.iter().zip(&restored) {
            for j in 0..NUM_FEATURES {
                assert!((original[j] - back[j]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_zero_variance_rejected_by_default() {
        let data = vec![[10.0, 1.0, 5.0, 2.0], [20.0, 1.0, 6.0, 3.0]];
        match Scaler::new().fit(&data) {
            Err(DietError::DegenerateFeature { feature }) => assert_eq!(feature, "Protein"),
            other => panic!("expected degenerate feature error, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_variance_passthrough() {
        let data = vec![[10.0, 1.0, 5.0, 2.0], [20.0, 1.0, 6.0, 3.0]];
        let state = Scaler::new()
            .with_zero_variance_policy(ZeroVariancePolicy::Passthrough)
            .fit(&data)
            .unwrap();
        assert_eq!(state.scale[1], 1.0);
        assert_eq!(state.transform_row(&data[0])[1], 0.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(Scaler::new().fit(&[]).is_err());
    }
}
