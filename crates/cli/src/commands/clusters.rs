//! Summaries of a labeled dataset

use anyhow::{Context, Result};
use diet_lib::pipeline::read_records;
use diet_lib::serving::PLAN_SIZE;
use diet_lib::{ClusterLabel, FoodRecord, FoodType};
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

use crate::output::{
    color_label, format_calories, format_grams, print_json, print_warning, render_table,
    OutputFormat,
};

/// Per-label statistics in raw feature units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelStats {
    pub label: ClusterLabel,
    pub cluster: Option<usize>,
    pub veg: usize,
    pub non_veg: usize,
    pub mean_calories: f64,
    pub mean_protein: f64,
    pub mean_fat: f64,
    pub mean_carbohydrates: f64,
}

impl LabelStats {
    pub fn total(&self) -> usize {
        self.veg + self.non_veg
    }
}

#[derive(Tabled)]
struct LabelRow {
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Cluster")]
    cluster: String,
    #[tabled(rename = "Veg")]
    veg: usize,
    #[tabled(rename = "Non-veg")]
    non_veg: usize,
    #[tabled(rename = "Calories")]
    calories: String,
    #[tabled(rename = "Protein")]
    protein: String,
    #[tabled(rename = "Fat")]
    fat: String,
    #[tabled(rename = "Carbs")]
    carbs: String,
}

/// One entry per label in calorie order, including empty labels
pub fn summarize(records: &[FoodRecord]) -> Vec<LabelStats> {
    ClusterLabel::ALL
        .iter()
        .map(|&label| {
            let members: Vec<&FoodRecord> =
                records.iter().filter(|r| r.cluster_label == label).collect();
            let n = members.len().max(1) as f64;
            let mean = |f: fn(&FoodRecord) -> f64| members.iter().map(|r| f(r)).sum::<f64>() / n;
            LabelStats {
                label,
                cluster: members.first().map(|r| r.cluster),
                veg: members.iter().filter(|r| r.food_type == FoodType::Veg).count(),
                non_veg: members
                    .iter()
                    .filter(|r| r.food_type == FoodType::NonVeg)
                    .count(),
                mean_calories: mean(|r| r.caloric_value),
                mean_protein: mean(|r| r.protein),
                mean_fat: mean(|r| r.fat),
                mean_carbohydrates: mean(|r| r.carbohydrates),
            }
        })
        .collect()
}

pub fn show_clusters(dataset: &Path, format: OutputFormat) -> Result<()> {
    let records = read_records(dataset)
        .with_context(|| format!("Cannot read labeled dataset {}", dataset.display()))?;
    let stats = summarize(&records);

    match format {
        OutputFormat::Json => print_json(&stats)?,
        OutputFormat::Table => {
            let rows: Vec<LabelRow> = stats
                .iter()
                .map(|s| LabelRow {
                    label: color_label(s.label),
                    cluster: s.cluster.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string()),
                    veg: s.veg,
                    non_veg: s.non_veg,
                    calories: format_calories(s.mean_calories),
                    protein: format_grams(s.mean_protein),
                    fat: format_grams(s.mean_fat),
                    carbs: format_grams(s.mean_carbohydrates),
                })
                .collect();
            println!("{}", render_table(rows));
            println!("\nTotal: {} foods", records.len());

            for s in &stats {
                for (food_type, count) in [(FoodType::Veg, s.veg), (FoodType::NonVeg, s.non_veg)] {
                    if count < PLAN_SIZE {
                        print_warning(&format!(
                            "'{}' has {} {} foods; plans need {}",
                            s.label, count, food_type, PLAN_SIZE
                        ));
                    }
                }
            }
        }
    }

    Ok(())
}
