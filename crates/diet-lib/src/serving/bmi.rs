//! BMI computation and category thresholds

use crate::error::{DietError, DietResult};
use crate::models::ClusterLabel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower bound of the healthy range (inclusive)
pub const HEALTHY_BMI_MIN: f64 = 18.5;

/// Lower bound of the overweight range (inclusive)
pub const OVERWEIGHT_BMI_MIN: f64 = 25.0;

/// `weight_kg / (height_cm / 100)^2`
pub fn compute_bmi(height_cm: f64, weight_kg: f64) -> DietResult<f64> {
    if !height_cm.is_finite() || height_cm <= 0.0 {
        return Err(DietError::InvalidQuery(format!(
            "height must be a positive number of centimetres, got {}",
            height_cm
        )));
    }
    if !weight_kg.is_finite() || weight_kg <= 0.0 {
        return Err(DietError::InvalidQuery(format!(
            "weight must be a positive number of kilograms, got {}",
            weight_kg
        )));
    }
    let height_m = height_cm / 100.0;
    Ok(weight_kg / (height_m * height_m))
}

/// BMI rounded to two decimals for display
pub fn round_bmi(bmi: f64) -> f64 {
    (bmi * 100.0).round() / 100.0
}

/// BMI category with half-open ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BmiCategory {
    #[serde(rename = "Underweight")]
    Underweight,
    #[serde(rename = "Healthy Weight")]
    HealthyWeight,
    #[serde(rename = "Overweight")]
    Overweight,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < HEALTHY_BMI_MIN {
            BmiCategory::Underweight
        } else if bmi < OVERWEIGHT_BMI_MIN {
            BmiCategory::HealthyWeight
        } else {
            BmiCategory::Overweight
        }
    }

    /// Cluster whose foods are recommended for this category.
    ///
    /// Underweight users get the calorie-dense cluster and overweight users
    /// the calorie-sparse one.
    pub fn target_cluster(&self) -> ClusterLabel {
        match self {
            BmiCategory::Underweight => ClusterLabel::WeightGain,
            BmiCategory::HealthyWeight => ClusterLabel::Healthy,
            BmiCategory::Overweight => ClusterLabel::WeightLoss,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::HealthyWeight => "Healthy Weight",
            BmiCategory::Overweight => "Overweight",
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
