//! Re-score a single food against the persisted model

use anyhow::{Context, Result};
use colored::Colorize;
use diet_lib::pipeline::{classify_with_reason, ArtifactReader, ClassificationRule};
use diet_lib::{ClusterLabel, FeatureRow, FoodType};
use serde::Serialize;
use std::path::Path;

use crate::output::{color_label, format_calories, print_json, OutputFormat};

/// Result of scoring one food
#[derive(Debug, Clone, Serialize)]
pub struct ScoreResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food_type: Option<FoodType>,
    pub cluster: usize,
    pub cluster_label: ClusterLabel,
    /// Raw-unit centroid of the assigned cluster
    pub centroid: FeatureRow,
}

fn describe_rule(rule: ClassificationRule) -> String {
    match rule {
        ClassificationRule::CheeseOverride => "name mentions cheese".to_string(),
        ClassificationRule::Keyword(keyword) => format!("matched '{}'", keyword),
        ClassificationRule::Default => "no meat keyword".to_string(),
    }
}

pub fn score_food(
    model_dir: &Path,
    name: Option<String>,
    features: FeatureRow,
    format: OutputFormat,
) -> Result<()> {
    let model = ArtifactReader::new(model_dir)
        .load_model()
        .with_context(|| format!("Cannot load model from {}", model_dir.display()))?;

    let (cluster, cluster_label) = model.score(&features)?;
    let centroid = model.raw_centroids()[cluster];
    let classification = name.as_deref().map(classify_with_reason);

    let result = ScoreResult {
        food_type: classification.map(|(food_type, _)| food_type),
        food: name,
        cluster,
        cluster_label,
        centroid,
    };

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            if let (Some(food), Some((food_type, rule))) = (&result.food, classification) {
                println!(
                    "{} is {} ({})",
                    food.bold(),
                    food_type.to_string().cyan(),
                    describe_rule(rule)
                );
            }
            println!(
                "Cluster {} → {} (centroid {})",
                result.cluster,
                color_label(result.cluster_label),
                format_calories(result.centroid[0])
            );
        }
    }

    Ok(())
}
