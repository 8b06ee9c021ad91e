//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use diet_lib::serving::BmiCategory;
use diet_lib::ClusterLabel;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Render rows as a rounded table
pub fn render_table<T: Tabled>(rows: Vec<T>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Pretty-print any serializable value
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Whole kilocalories
pub fn format_calories(calories: f64) -> String {
    format!("{:.0} kcal", calories)
}

/// Grams with one decimal
pub fn format_grams(grams: f64) -> String {
    format!("{:.1} g", grams)
}

/// Capitalise the first letter of each word
pub fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Color a cluster label by calorie tier
pub fn color_label(label: ClusterLabel) -> String {
    match label {
        ClusterLabel::WeightLoss => label.as_str().cyan().to_string(),
        ClusterLabel::Healthy => label.as_str().green().to_string(),
        ClusterLabel::WeightGain => label.as_str().magenta().to_string(),
    }
}

/// Color a BMI category
pub fn color_category(category: BmiCategory) -> String {
    match category {
        BmiCategory::HealthyWeight => category.as_str().green().to_string(),
        BmiCategory::Underweight | BmiCategory::Overweight => {
            category.as_str().yellow().to_string()
        }
    }
}
