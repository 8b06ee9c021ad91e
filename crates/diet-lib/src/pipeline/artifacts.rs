//! Persistence of the fitted model and the labeled dataset
//!
//! Every write overwrites the previous artifact in place. There is no
//! versioning and no atomic rename; a crashed run can leave a truncated
//! file behind and is fixed by re-running the pipeline.

use super::kmeans::KMeansModel;
use super::labeler::{label_clusters, ClusterLabelMap};
use super::scaler::ScalerState;
use super::PipelineReport;
use crate::error::{DietError, DietResult};
use crate::models::{ClusterLabel, FeatureRow, FoodRecord};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const MODEL_FILE: &str = "kmeans_model.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const DATASET_FILE: &str = "clustered_food_data.csv";
pub const REPORT_FILE: &str = "pipeline_report.json";

/// File locations inside an artifact directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn model(&self) -> PathBuf {
        self.dir.join(MODEL_FILE)
    }

    pub fn scaler(&self) -> PathBuf {
        self.dir.join(SCALER_FILE)
    }

    pub fn dataset(&self) -> PathBuf {
        self.dir.join(DATASET_FILE)
    }

    pub fn report(&self) -> PathBuf {
        self.dir.join(REPORT_FILE)
    }
}

/// Fitted clusterer plus the scaler it was trained behind
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterModel {
    pub kmeans: KMeansModel,
    pub scaler: ScalerState,
}

impl ClusterModel {
    /// Cluster id for a raw (unscaled) feature row
    pub fn assign(&self, raw: &FeatureRow) -> usize {
        self.kmeans.predict_row(&self.scaler.transform_row(raw))
    }

    /// Label map recomputed from the persisted centroids
    pub fn label_map(&self) -> DietResult<ClusterLabelMap> {
        label_clusters(&self.kmeans.centroids, &self.scaler)
    }

    /// Cluster id and label for a raw feature row
    pub fn score(&self, raw: &FeatureRow) -> DietResult<(usize, ClusterLabel)> {
        let cluster = self.assign(raw);
        let label = self.label_map()?.label(cluster).ok_or(DietError::InvalidClusterCount {
            expected: 3,
            actual: self.kmeans.n_clusters(),
        })?;
        Ok((cluster, label))
    }

    /// Centroids converted back to raw feature units
    pub fn raw_centroids(&self) -> Vec<FeatureRow> {
        self.scaler.inverse_transform(&self.kmeans.centroids)
    }
}

/// Everything a pipeline run persists
#[derive(Debug, Clone)]
pub struct ArtifactBundle {
    pub model: ClusterModel,
    pub records: Vec<FoodRecord>,
    pub report: PipelineReport,
}

/// Writes artifacts into a directory, creating it when absent
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    paths: ArtifactPaths,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            paths: ArtifactPaths::new(dir),
        }
    }

    pub fn write(&self, bundle: &ArtifactBundle) -> DietResult<()> {
        fs::create_dir_all(&self.paths.dir).map_err(|e| DietError::io(&self.paths.dir, e))?;

        write_json(&self.paths.model(), &bundle.model.kmeans)?;
        write_json(&self.paths.scaler(), &bundle.model.scaler)?;
        write_records(&self.paths.dataset(), &bundle.records)?;
        write_json(&self.paths.report(), &bundle.report)?;

        info!(
            dir = %self.paths.dir.display(),
            rows = bundle.records.len(),
            "Artifacts written"
        );
        Ok(())
    }
}

/// Reads artifacts back from a directory
#[derive(Debug, Clone)]
pub struct ArtifactReader {
    paths: ArtifactPaths,
}

impl ArtifactReader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            paths: ArtifactPaths::new(dir),
        }
    }

    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    pub fn load_model(&self) -> DietResult<ClusterModel> {
        Ok(ClusterModel {
            kmeans: read_json(&self.paths.model())?,
            scaler: read_json(&self.paths.scaler())?,
        })
    }

    pub fn load_report(&self) -> DietResult<PipelineReport> {
        read_json(&self.paths.report())
    }

    pub fn load_records(&self) -> DietResult<Vec<FoodRecord>> {
        read_records(&self.paths.dataset())
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> DietResult<()> {
    let file = File::create(path).map_err(|e| DietError::io(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush().map_err(|e| DietError::io(path, e))?;
    debug!(path = %path.display(), "Wrote JSON artifact");
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> DietResult<T> {
    let content = fs::read(path).map_err(|e| missing_or_io(path, e))?;
    Ok(serde_json::from_slice(&content)?)
}

/// Write labeled rows with the dataset headers
pub fn write_records(path: &Path, records: &[FoodRecord]) -> DietResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush().map_err(|e| DietError::io(path, e))?;
    Ok(())
}

/// Read a labeled dataset written by [`write_records`]
pub fn read_records(path: &Path) -> DietResult<Vec<FoodRecord>> {
    let file = File::open(path).map_err(|e| missing_or_io(path, e))?;
    let mut reader = csv::Reader::from_reader(file);
    let mut records = Vec::new();
    for result in reader.deserialize() {
        let record: FoodRecord = result.map_err(|e| {
            DietError::DataIntegrity(format!("bad row in {}: {}", path.display(), e))
        })?;
        records.push(record);
    }
    Ok(records)
}

fn missing_or_io(path: &Path, err: std::io::Error) -> DietError {
    if err.kind() == std::io::ErrorKind::NotFound {
        DietError::ArtifactMissing {
            path: path.to_path_buf(),
        }
    } else {
        DietError::io(path, err)
    }
}
