//! Observability infrastructure for the diet planner
//!
//! Provides:
//! - Prometheus metrics for the serving path (latency, outcomes, catalog size)
//! - Structured logging of pipeline and serving events with tracing

use crate::pipeline::PipelineReport;
use crate::serving::Recommendation;
use prometheus::{
    register_gauge_vec, register_histogram, register_int_counter_vec, register_int_gauge, GaugeVec,
    Histogram, IntCounterVec, IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for request latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Recommendation outcome labels
pub mod outcomes {
    pub const PLAN: &str = "plan";
    pub const INSUFFICIENT_DATA: &str = "insufficient_data";
    pub const INVALID_QUERY: &str = "invalid_query";
    pub const UNAVAILABLE: &str = "unavailable";
}

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<DietMetricsInner> = OnceLock::new();

struct DietMetricsInner {
    recommendation_latency_seconds: Histogram,
    recommendations_total: IntCounterVec,
    catalog_rows: IntGauge,
    catalog_info: GaugeVec,
}

impl DietMetricsInner {
    fn new() -> Self {
        Self {
            recommendation_latency_seconds: register_histogram!(
                "diet_recommendation_latency_seconds",
                "Time spent building a meal plan",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register recommendation_latency_seconds"),

            recommendations_total: register_int_counter_vec!(
                "diet_recommendations_total",
                "Recommendation requests by outcome",
                &["outcome"]
            )
            .expect("Failed to register recommendations_total"),

            catalog_rows: register_int_gauge!(
                "diet_catalog_rows",
                "Number of labeled foods in the loaded catalog"
            )
            .expect("Failed to register catalog_rows"),

            catalog_info: register_gauge_vec!(
                "diet_catalog_info",
                "Source of the loaded food catalog",
                &["source"]
            )
            .expect("Failed to register catalog_info"),
        }
    }
}

/// Metrics handle for Prometheus exposition
///
/// Cheap to clone; all clones share the global registry entries.
#[derive(Clone)]
pub struct DietMetrics {
    _private: (),
}

impl Default for DietMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl DietMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(DietMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &DietMetricsInner {
        GLOBAL_METRICS.get_or_init(DietMetricsInner::new)
    }

    pub fn observe_recommendation_latency(&self, duration_secs: f64) {
        self.inner().recommendation_latency_seconds.observe(duration_secs);
    }

    pub fn inc_recommendations(&self, outcome: &str) {
        self.inner()
            .recommendations_total
            .with_label_values(&[outcome])
            .inc();
    }

    pub fn recommendations(&self, outcome: &str) -> u64 {
        self.inner()
            .recommendations_total
            .with_label_values(&[outcome])
            .get()
    }

    /// Record the catalog now being served
    pub fn set_catalog(&self, rows: usize, source: &str) {
        self.inner().catalog_rows.set(rows as i64);
        self.inner().catalog_info.reset();
        self.inner()
            .catalog_info
            .with_label_values(&[source])
            .set(1.0);
    }
}

/// Structured logger for planner events
#[derive(Clone)]
pub struct StructuredLogger {
    service: String,
}

impl StructuredLogger {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    pub fn log_pipeline_completed(&self, report: &PipelineReport) {
        info!(
            event = "pipeline_completed",
            service = %self.service,
            input = %report.input_path.display(),
            rows_read = report.rows_read,
            rows_dropped = report.rows_dropped,
            rows_written = report.rows_written,
            inertia = report.inertia,
            n_iter = report.n_iter,
            duration_secs = report.duration_secs,
            "Clustering pipeline finished"
        );
        for cluster in &report.clusters {
            info!(
                event = "cluster_labeled",
                service = %self.service,
                cluster = cluster.cluster,
                label = %cluster.label,
                size = cluster.size,
                mean_calories = cluster.centroid[0],
                "Cluster labeled"
            );
        }
    }

    pub fn log_recommendation(&self, age: u32, recommendation: &Recommendation) {
        match recommendation {
            Recommendation::Plan { plan, .. } => {
                info!(
                    event = "recommendation_served",
                    service = %self.service,
                    age = age,
                    bmi = recommendation.bmi(),
                    category = %recommendation.category(),
                    cluster = %recommendation.cluster(),
                    items = plan.items().count(),
                    "Meal plan served"
                );
            }
            Recommendation::InsufficientData {
                food_pref,
                available,
                required,
                ..
            } => {
                warn!(
                    event = "insufficient_data",
                    service = %self.service,
                    age = age,
                    bmi = recommendation.bmi(),
                    cluster = %recommendation.cluster(),
                    food_pref = %food_pref,
                    available = available,
                    required = required,
                    "Not enough foods for a meal plan"
                );
            }
        }
    }

    pub fn log_startup(&self, version: &str, catalog_rows: Option<usize>) {
        info!(
            event = "service_started",
            service = %self.service,
            version = %version,
            catalog_rows = ?catalog_rows,
            "Diet planner started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            service = %self.service,
            reason = %reason,
            "Diet planner shutting down"
        );
    }
}
