//! Diet planner CLI
//!
//! Fits the food clustering model, inspects its artifacts and builds
//! meal plans locally or through the diet server.

mod client;
mod commands;
mod config;
mod output;
mod prompt;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{clusters, fit, recommend, score};
use diet_lib::pipeline::{kmeans, ArtifactPaths, DEFAULT_N_INIT, DEFAULT_SEED};
use diet_lib::FoodType;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Diet planner CLI
#[derive(Parser)]
#[command(name = "diet")]
#[command(
    author,
    version,
    about = "Diet planner: food clustering and meal plan recommendations",
    long_about = None
)]
pub struct Cli {
    /// API endpoint URL (can also be set via DIET_API_URL env var)
    #[arg(long, env = "DIET_API_URL")]
    pub api_url: Option<String>,

    /// Directory holding the pipeline artifacts (can also be set via DIET_ARTIFACT_DIR)
    #[arg(long, env = "DIET_ARTIFACT_DIR")]
    pub artifact_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable verbose output
    #[arg(long, short)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Cluster a raw nutrition dataset and write the model artifacts
    Fit {
        /// Raw nutrition CSV
        #[arg(long, short)]
        input: PathBuf,

        /// Output directory (defaults to the artifact directory)
        #[arg(long, short)]
        output_dir: Option<PathBuf>,

        /// Seed for k-means initialisation
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,

        /// Number of k-means restarts
        #[arg(long, default_value_t = DEFAULT_N_INIT)]
        n_init: usize,

        /// Lloyd iterations per restart
        #[arg(long, default_value_t = kmeans::DEFAULT_MAX_ITER)]
        max_iter: usize,

        /// Keep features with zero variance instead of failing
        #[arg(long)]
        allow_constant_features: bool,
    },

    /// Build a 3x3 meal plan; missing answers are prompted for
    Recommend {
        #[arg(long)]
        age: Option<u32>,

        /// Height in centimetres
        #[arg(long)]
        height: Option<f64>,

        /// Weight in kilograms
        #[arg(long)]
        weight: Option<f64>,

        /// veg or non-veg
        #[arg(long)]
        food_pref: Option<FoodType>,

        /// Labeled dataset (defaults to the one in the artifact directory)
        #[arg(long)]
        dataset: Option<PathBuf>,

        /// Seed for meal sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Ask the diet server instead of reading the dataset
        #[arg(long, conflicts_with_all = ["dataset", "seed"])]
        remote: bool,
    },

    /// Summarise the labeled dataset per cluster label
    Clusters {
        /// Labeled dataset (defaults to the one in the artifact directory)
        #[arg(long)]
        dataset: Option<PathBuf>,
    },

    /// Assign one food to a cluster with the persisted model
    Score {
        /// Food name, classified as veg or non-veg when given
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        calories: f64,

        #[arg(long)]
        protein: f64,

        #[arg(long)]
        fat: f64,

        #[arg(long)]
        carbs: f64,

        /// Model directory (defaults to the artifact directory)
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let file_config = config::Config::load()?;
    let artifact_dir = file_config.resolve_artifact_dir(cli.artifact_dir.as_deref());
    let artifacts = ArtifactPaths::new(&artifact_dir);

    match cli.command {
        Commands::Fit {
            input,
            output_dir,
            seed,
            n_init,
            max_iter,
            allow_constant_features,
        } => {
            fit::run_fit(
                fit::FitOptions {
                    input,
                    output_dir: output_dir.unwrap_or(artifact_dir),
                    seed,
                    n_init,
                    max_iter,
                    allow_constant_features,
                },
                cli.format,
            )?;
        }
        Commands::Recommend {
            age,
            height,
            weight,
            food_pref,
            dataset,
            seed,
            remote,
        } => {
            let source = if remote {
                let api_url = file_config.resolve_api_url(cli.api_url.as_deref());
                recommend::PlanSource::Remote {
                    client: client::ApiClient::new(&api_url)?,
                }
            } else {
                recommend::PlanSource::Local {
                    dataset: dataset.unwrap_or_else(|| artifacts.dataset()),
                    seed,
                }
            };
            let args = recommend::QueryArgs {
                age,
                height,
                weight,
                food_pref,
            };
            recommend::recommend(args, source, cli.format).await?;
        }
        Commands::Clusters { dataset } => {
            let dataset = dataset.unwrap_or_else(|| artifacts.dataset());
            clusters::show_clusters(&dataset, cli.format)?;
        }
        Commands::Score {
            name,
            calories,
            protein,
            fat,
            carbs,
            model_dir,
        } => {
            let model_dir = model_dir.unwrap_or(artifact_dir);
            score::score_food(&model_dir, name, [calories, protein, fat, carbs], cli.format)?;
        }
    }

    Ok(())
}
