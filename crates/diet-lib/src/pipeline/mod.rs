//! Offline clustering pipeline
//!
//! raw CSV → feature preparation → scaling → K-Means → calorie labeling →
//! artifacts. The run is synchronous and either completes or fails without
//! partial recovery.

pub mod artifacts;
pub mod classifier;
pub mod features;
pub mod kmeans;
pub mod labeler;
pub mod scaler;

pub use artifacts::{
    read_records, write_records, ArtifactBundle, ArtifactPaths, ArtifactReader, ArtifactWriter,
    ClusterModel, DATASET_FILE, MODEL_FILE, REPORT_FILE, SCALER_FILE,
};
pub use classifier::{classify, classify_with_reason, ClassificationRule, NON_VEG_KEYWORDS};
pub use features::{FeaturePreparer, PreparationStats, PreparedDataset, RawFoodRow};
pub use kmeans::{KMeans, KMeansFit, KMeansModel, DEFAULT_N_INIT, DEFAULT_SEED};
pub use labeler::{label_clusters, ClusterLabelMap, LABELED_CLUSTERS};
pub use scaler::{Scaler, ScalerState, ZeroVariancePolicy};

use crate::error::{DietError, DietResult};
use crate::models::{ClusterLabel, FeatureRow, FoodRecord, FoodType};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Configuration of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Raw nutrition CSV
    pub input_path: PathBuf,
    /// Directory receiving the model, scaler and labeled dataset
    pub output_dir: PathBuf,
    pub seed: u64,
    pub n_init: usize,
    pub max_iter: usize,
    pub tol: f64,
    pub zero_variance: ZeroVariancePolicy,
}

impl PipelineConfig {
    pub fn new(input_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_dir: output_dir.into(),
            seed: DEFAULT_SEED,
            n_init: DEFAULT_N_INIT,
            max_iter: kmeans::DEFAULT_MAX_ITER,
            tol: kmeans::DEFAULT_TOL,
            zero_variance: ZeroVariancePolicy::default(),
        }
    }
}

/// Per-cluster summary in raw feature units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    pub cluster: usize,
    pub label: ClusterLabel,
    pub size: usize,
    pub veg: usize,
    pub non_veg: usize,
    /// De-standardized centroid
    pub centroid: FeatureRow,
}

/// Outcome of a pipeline run, persisted next to the artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub input_path: PathBuf,
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub rows_written: usize,
    pub seed: u64,
    pub n_init: usize,
    pub n_iter: usize,
    pub inertia: f64,
    pub clusters: Vec<ClusterSummary>,
    pub duration_secs: f64,
}

/// Pure in-memory result of fitting, before anything is written
#[derive(Debug, Clone)]
pub struct FittedPipeline {
    pub model: ClusterModel,
    pub label_map: ClusterLabelMap,
    pub records: Vec<FoodRecord>,
    pub stats: PreparationStats,
}

impl FittedPipeline {
    /// Summaries ordered by label (Weight Loss first)
    pub fn cluster_summaries(&self) -> Vec<ClusterSummary> {
        let raw = self.model.raw_centroids();
        let mut summaries: Vec<ClusterSummary> = self
            .label_map
            .iter()
            .map(|(cluster, label)| {
                let members = self.records.iter().filter(|r| r.cluster == cluster);
                let (veg, non_veg) = members.fold((0, 0), |(v, n), r| match r.food_type {
                    FoodType::Veg => (v + 1, n),
                    FoodType::NonVeg => (v, n + 1),
                });
                ClusterSummary {
                    cluster,
                    label,
                    size: veg + non_veg,
                    veg,
                    non_veg,
                    centroid: raw[cluster],
                }
            })
            .collect();
        summaries.sort_by_key(|s| s.label);
        summaries
    }
}

/// Runs the clustering pipeline
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fit a prepared dataset without touching the filesystem
    pub fn fit(&self, dataset: PreparedDataset) -> DietResult<FittedPipeline> {
        let raw = dataset.feature_matrix();

        let scaler = Scaler::new()
            .with_zero_variance_policy(self.config.zero_variance)
            .fit(&raw)?;
        let standardized = scaler.transform(&raw);

        let fit = KMeans::new(LABELED_CLUSTERS)
            .with_seed(self.config.seed)
            .with_n_init(self.config.n_init)
            .with_max_iter(self.config.max_iter)
            .with_tol(self.config.tol)
            .fit(&standardized)?;

        let label_map = label_clusters(&fit.model.centroids, &scaler)?;

        let records = dataset
            .rows
            .into_iter()
            .zip(&fit.labels)
            .map(|(row, &cluster)| {
                let label = label_map.label(cluster).ok_or(DietError::InvalidClusterCount {
                    expected: LABELED_CLUSTERS,
                    actual: cluster + 1,
                })?;
                Ok(FoodRecord::from_prepared(row, cluster, label))
            })
            .collect::<DietResult<Vec<_>>>()?;

        Ok(FittedPipeline {
            model: ClusterModel {
                kmeans: fit.model,
                scaler,
            },
            label_map,
            records,
            stats: dataset.stats,
        })
    }

    /// Load, fit and persist; returns the persisted report
    pub fn run(&self) -> DietResult<PipelineReport> {
        let start = Instant::now();
        info!(
            input = %self.config.input_path.display(),
            output = %self.config.output_dir.display(),
            seed = self.config.seed,
            n_init = self.config.n_init,
            "Starting clustering pipeline"
        );

        let dataset = FeaturePreparer::new().load_csv(&self.config.input_path)?;
        let fitted = self.fit(dataset)?;

        let report = PipelineReport {
            generated_at: chrono::Utc::now(),
            input_path: self.config.input_path.clone(),
            rows_read: fitted.stats.rows_read,
            rows_dropped: fitted.stats.rows_dropped,
            rows_written: fitted.records.len(),
            seed: fitted.model.kmeans.seed,
            n_init: fitted.model.kmeans.n_init,
            n_iter: fitted.model.kmeans.n_iter,
            inertia: fitted.model.kmeans.inertia,
            clusters: fitted.cluster_summaries(),
            duration_secs: start.elapsed().as_secs_f64(),
        };

        let bundle = ArtifactBundle {
            model: fitted.model,
            records: fitted.records,
            report,
        };
        ArtifactWriter::new(&self.config.output_dir).write(&bundle)?;

        Ok(bundle.report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const RAW_CSV: &str = "\
Unnamed: 0,food,Caloric Value,Protein,Fat,Carbohydrates
0,cucumber,15,0.7,0.1,3.6
1,lettuce,17,1.2,0.3,3.3
2,celery,14,0.7,0.2,3.0
3,boiled egg,78,6.3,5.3,0.6
4,grilled chicken,165,31,3.6,0
5,brown rice,216,5,1.8,45
6,tofu,144,15.7,8.7,2.8
7,cheddar cheese,403,25,33,1.3
8,bacon,541,37,42,1.4
9,peanut butter,588,25,50,20
10,,300,,,
11,butter,717,0.9,81,0.1
";

    fn write_input(dir: &std::path::Path) -> PathBuf {
        let path = dir.join("cleaned_dataset.csv");
        std::fs::write(&path, RAW_CSV).unwrap();
        path
    }

    #[test]
    fn test_run_writes_all_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let out = dir.path().join("artifacts");

        let report = Pipeline::new(PipelineConfig::new(&input, &out)).run().unwrap();

        assert_eq!(report.rows_read, 12);
        assert_eq!(report.rows_dropped, 1);
        assert_eq!(report.rows_written, 11);
        assert_eq!(report.clusters.len(), 3);

        let reader = ArtifactReader::new(&out);
        let records = reader.load_records().unwrap();
        assert_eq!(records.len(), 11);
        assert!(reader.load_model().is_ok());
        assert_eq!(reader.load_report().unwrap(), report);
    }

    #[test]
    fn test_persisted_model_matches_fit() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let out = dir.path().join("artifacts");
        let pipeline = Pipeline::new(PipelineConfig::new(&input, &out));

        pipeline.run().unwrap();
        let fitted = pipeline
            .fit(FeaturePreparer::new().load_csv(&input).unwrap())
            .unwrap();

        let reader = ArtifactReader::new(&out);
        let model = reader.load_model().unwrap();
        assert_eq!(model, fitted.model);
        assert_eq!(reader.load_report().unwrap().inertia, fitted.model.kmeans.inertia);
        for record in reader.load_records().unwrap() {
            assert_eq!(model.assign(&record.features()), record.cluster);
        }
    }

    #[test]
    fn test_cluster_calories_increase_with_label() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path());
        let report = Pipeline::new(PipelineConfig::new(&input, dir.path().join("out")))
            .run()
            .unwrap();

        let labels: Vec<ClusterLabel> = report.clusters.iter().map(|c| c.label).collect();
        assert_eq!(labels, ClusterLabel::ALL.to_vec());
        let calories: Vec<f64> = report.clusters.iter().map(|c| c.centroid[0]).collect();
        assert!(calories[0] <= calories[1] && calories[1] <= calories[2]);
    }

    #[test]
    fn test_fit_is_deterministic_and_rescoring_agrees() {
        let dataset = || FeaturePreparer::new().load_reader(RAW_CSV.as_bytes()).unwrap();
        let pipeline = Pipeline::new(PipelineConfig::new("unused.csv", "unused"));

        let a = pipeline.fit(dataset()).unwrap();
        let b = pipeline.fit(dataset()).unwrap();
        assert_eq!(a.records, b.records);
        assert_eq!(a.model, b.model);

        for record in &a.records {
            assert_eq!(a.model.assign(&record.features()), record.cluster);
        }
        let labels: HashSet<_> = a.records.iter().map(|r| r.cluster_label).collect();
        assert!(labels.len() <= 3);
    }

    #[test]
    fn test_missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::new(dir.path().join("absent.csv"), dir.path().join("out"));
        assert!(matches!(Pipeline::new(config).run(), Err(DietError::Io { .. })));
    }
}
