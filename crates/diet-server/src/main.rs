//! Diet server - meal plan recommendations over HTTP
//!
//! Loads the labeled food catalog once at startup and serves
//! `POST /recommend` plus health and metrics endpoints.

use anyhow::Result;
use diet_lib::{
    health::{components, HealthRegistry},
    models::{ClusterLabel, FoodType},
    observability::{DietMetrics, StructuredLogger},
    serving::PLAN_SIZE,
    FoodCatalog, MealPlanner,
};
use diet_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting diet-server");

    let config = ServerConfig::load()?;
    info!(
        dataset = %config.dataset_path.display(),
        sampling_seed = ?config.sampling_seed,
        "Server configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::CATALOG).await;
    health_registry.register(components::PLANNER).await;

    let metrics = DietMetrics::new();
    let logger = StructuredLogger::new(&config.service_name);

    // A missing catalog keeps the server up; /recommend answers 503 until restart
    let planner = match FoodCatalog::load(&config.dataset_path) {
        Ok(catalog) => {
            metrics.set_catalog(catalog.len(), &config.dataset_path.display().to_string());
            let sparse = sparse_slices(&catalog);
            if !sparse.is_empty() {
                warn!(
                    slices = ?sparse,
                    "Some cluster and preference combinations cannot fill a plan"
                );
                health_registry
                    .set_degraded(
                        components::PLANNER,
                        format!("{} of 6 catalog slices below {} foods", sparse.len(), PLAN_SIZE),
                    )
                    .await;
            }
            Some(MealPlanner::new(catalog))
        }
        Err(e) => {
            error!(error = %e, "Failed to load food catalog");
            health_registry
                .set_unhealthy(components::CATALOG, e.to_string())
                .await;
            None
        }
    };

    logger.log_startup(
        SERVER_VERSION,
        planner.as_ref().map(|p| p.catalog().len()),
    );

    let app_state = Arc::new(api::AppState::new(
        health_registry.clone(),
        metrics,
        logger.clone(),
        planner,
        config.sampling_seed,
    ));

    health_registry.set_ready(true).await;

    let api_handle = tokio::spawn(api::serve(config.api_port, app_state));

    tokio::select! {
        result = api_handle => {
            match result {
                Ok(Ok(())) => logger.log_shutdown("API server exited"),
                Ok(Err(e)) => {
                    logger.log_shutdown("API server failed");
                    return Err(e);
                }
                Err(e) => {
                    logger.log_shutdown("API server task panicked");
                    return Err(e.into());
                }
            }
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
        }
    }

    info!("Shutting down");
    Ok(())
}

/// Cluster and preference combinations with too few foods for a full plan
fn sparse_slices(catalog: &FoodCatalog) -> Vec<String> {
    ClusterLabel::ALL
        .iter()
        .flat_map(|label| [FoodType::Veg, FoodType::NonVeg].map(|pref| (*label, pref)))
        .filter(|(label, pref)| catalog.count_matching(*label, *pref) < PLAN_SIZE)
        .map(|(label, pref)| format!("{}/{}", label, pref))
        .collect()
}
