//! Core data models shared by the pipeline and the serving layer

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of nutrition features used for clustering
pub const NUM_FEATURES: usize = 4;

/// Feature column headers, in feature-vector order
pub const FEATURE_COLUMNS: [&str; NUM_FEATURES] =
    ["Caloric Value", "Protein", "Fat", "Carbohydrates"];

/// Index of the caloric value within a feature vector
pub const CALORIC_VALUE_INDEX: usize = 0;

/// Header of the food name column
pub const FOOD_COLUMN: &str = "food";

/// One row of nutrition features in [`FEATURE_COLUMNS`] order
pub type FeatureRow = [f64; NUM_FEATURES];

/// Dietary category of a food item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FoodType {
    #[serde(rename = "veg")]
    Veg,
    #[serde(rename = "non-veg")]
    NonVeg,
}

impl FoodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FoodType::Veg => "veg",
            FoodType::NonVeg => "non-veg",
        }
    }
}

impl fmt::Display for FoodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FoodType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "veg" => Ok(FoodType::Veg),
            "non-veg" | "nonveg" | "non_veg" => Ok(FoodType::NonVeg),
            other => Err(format!("unknown food preference '{}', expected veg or non-veg", other)),
        }
    }
}

/// Semantic label of a nutrition cluster, ordered by ascending caloric value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ClusterLabel {
    #[serde(rename = "Weight Loss")]
    WeightLoss,
    #[serde(rename = "Healthy")]
    Healthy,
    #[serde(rename = "Weight Gain")]
    WeightGain,
}

impl ClusterLabel {
    /// All labels from lowest to highest caloric value
    pub const ALL: [ClusterLabel; 3] = [
        ClusterLabel::WeightLoss,
        ClusterLabel::Healthy,
        ClusterLabel::WeightGain,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterLabel::WeightLoss => "Weight Loss",
            ClusterLabel::Healthy => "Healthy",
            ClusterLabel::WeightGain => "Weight Gain",
        }
    }
}

impl fmt::Display for ClusterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A food row after preparation, before clustering
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedFood {
    pub food: String,
    pub features: FeatureRow,
    pub food_type: FoodType,
}

/// A fully labeled food row, as persisted in the clustered dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodRecord {
    pub food: String,
    #[serde(rename = "Caloric Value")]
    pub caloric_value: f64,
    #[serde(rename = "Protein")]
    pub protein: f64,
    #[serde(rename = "Fat")]
    pub fat: f64,
    #[serde(rename = "Carbohydrates")]
    pub carbohydrates: f64,
    pub food_type: FoodType,
    pub cluster: usize,
    pub cluster_label: ClusterLabel,
}

impl FoodRecord {
    pub fn from_prepared(
        prepared: PreparedFood,
        cluster: usize,
        cluster_label: ClusterLabel,
    ) -> Self {
        let [caloric_value, protein, fat, carbohydrates] = prepared.features;
        Self {
            food: prepared.food,
            caloric_value,
            protein,
            fat,
            carbohydrates,
            food_type: prepared.food_type,
            cluster,
            cluster_label,
        }
    }

    pub fn features(&self) -> FeatureRow {
        [self.caloric_value, self.protein, self.fat, self.carbohydrates]
    }
}

/// Serving request from either front end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserQuery {
    pub age: u32,
    /// Height in centimetres
    #[serde(alias = "height_cm")]
    pub height: f64,
    /// Weight in kilograms
    #[serde(alias = "weight_kg")]
    pub weight: f64,
    pub food_pref: FoodType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_food_type_parsing() {
        assert_eq!("veg".parse::<FoodType>().unwrap(), FoodType::Veg);
        assert_eq!("Non-Veg".parse::<FoodType>().unwrap(), FoodType::NonVeg);
        assert!("vegan".parse::<FoodType>().is_err());
    }

    #[test]
    fn test_cluster_label_order_follows_calories() {
        let mut labels = vec![
            ClusterLabel::WeightGain,
            ClusterLabel::WeightLoss,
            ClusterLabel::Healthy,
        ];
        labels.sort();
        assert_eq!(labels, ClusterLabel::ALL.to_vec());
    }

    #[test]
    fn test_food_record_json_uses_dataset_headers() {
        let record = FoodRecord {
            food: "tofu".to_string(),
            caloric_value: 76.0,
            protein: 8.0,
            fat: 4.8,
            carbohydrates: 1.9,
            food_type: FoodType::Veg,
            cluster: 1,
            cluster_label: ClusterLabel::WeightLoss,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["Caloric Value"], 76.0);
        assert_eq!(json["food_type"], "veg");
        assert_eq!(json["cluster_label"], "Weight Loss");
    }

    #[test]
    fn test_user_query_accepts_unit_suffixed_aliases() {
        let query: UserQuery = serde_json::from_str(
            r#"{"age": 25, "height_cm": 170, "weight_kg": 65.0, "food_pref": "non-veg"}"#,
        )
        .unwrap();
        assert_eq!(query.height, 170.0);
        assert_eq!(query.food_pref, FoodType::NonVeg);
    }
}
