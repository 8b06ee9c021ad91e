//! Run the clustering pipeline and show what it produced

use anyhow::{Context, Result};
use colored::Colorize;
use diet_lib::pipeline::{ArtifactReader, Pipeline, PipelineConfig, ZeroVariancePolicy};
use diet_lib::StructuredLogger;
use std::path::PathBuf;
use tabled::Tabled;

use crate::output::{
    color_label, format_calories, format_grams, print_json, print_success, render_table,
    title_case, OutputFormat,
};

/// Rows shown from the head of the labeled dataset
const SAMPLE_ROWS: usize = 5;

pub struct FitOptions {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub seed: u64,
    pub n_init: usize,
    pub max_iter: usize,
    pub allow_constant_features: bool,
}

#[derive(Tabled)]
struct CentroidRow {
    #[tabled(rename = "Cluster")]
    cluster: usize,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Foods")]
    size: usize,
    #[tabled(rename = "Veg / Non-veg")]
    split: String,
    #[tabled(rename = "Calories")]
    calories: String,
    #[tabled(rename = "Protein")]
    protein: String,
    #[tabled(rename = "Fat")]
    fat: String,
    #[tabled(rename = "Carbs")]
    carbs: String,
}

#[derive(Tabled)]
struct SampleRow {
    #[tabled(rename = "Food")]
    food: String,
    #[tabled(rename = "Calories")]
    calories: String,
    #[tabled(rename = "Type")]
    food_type: String,
    #[tabled(rename = "Label")]
    label: String,
}

pub fn run_fit(options: FitOptions, format: OutputFormat) -> Result<()> {
    let mut config = PipelineConfig::new(&options.input, &options.output_dir);
    config.seed = options.seed;
    config.n_init = options.n_init;
    config.max_iter = options.max_iter;
    if options.allow_constant_features {
        config.zero_variance = ZeroVariancePolicy::Passthrough;
    }

    let report = Pipeline::new(config)
        .run()
        .with_context(|| format!("Pipeline failed for {}", options.input.display()))?;
    StructuredLogger::new("diet-cli").log_pipeline_completed(&report);

    if let OutputFormat::Json = format {
        return print_json(&report);
    }

    println!("{}", "Cluster Centers (Nutritional Averages)".bold());
    let rows: Vec<CentroidRow> = report
        .clusters
        .iter()
        .map(|c| CentroidRow {
            cluster: c.cluster,
            label: color_label(c.label),
            size: c.size,
            split: format!("{} / {}", c.veg, c.non_veg),
            calories: format_calories(c.centroid[0]),
            protein: format_grams(c.centroid[1]),
            fat: format_grams(c.centroid[2]),
            carbs: format_grams(c.centroid[3]),
        })
        .collect();
    println!("{}", render_table(rows));

    println!("\n{}", "Cluster Label Mapping".bold());
    let mut by_id = report.clusters.clone();
    by_id.sort_by_key(|c| c.cluster);
    for c in &by_id {
        println!("  {} → {}", c.cluster, color_label(c.label));
    }

    let records = ArtifactReader::new(&options.output_dir).load_records()?;
    println!("\n{}", "Sample of Clustered Data".bold());
    let sample: Vec<SampleRow> = records
        .iter()
        .take(SAMPLE_ROWS)
        .map(|r| SampleRow {
            food: title_case(&r.food),
            calories: format_calories(r.caloric_value),
            food_type: r.food_type.to_string(),
            label: color_label(r.cluster_label),
        })
        .collect();
    println!("{}", render_table(sample));

    println!(
        "\nRows: {} read, {} dropped, {} written. Inertia {:.3} after {} iterations.",
        report.rows_read, report.rows_dropped, report.rows_written, report.inertia, report.n_iter
    );
    print_success(&format!(
        "Model, scaler, and clustered data saved to {}",
        options.output_dir.display()
    ));

    Ok(())
}
