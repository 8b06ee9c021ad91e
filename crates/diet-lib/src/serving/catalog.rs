//! Immutable handle to the labeled food dataset
//!
//! Loaded once at startup and shared by reference; cloning only bumps a
//! reference count.

use crate::error::{DietError, DietResult};
use crate::models::{ClusterLabel, FoodRecord, FoodType};
use crate::pipeline::artifacts::read_records;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone)]
pub struct FoodCatalog {
    records: Arc<[FoodRecord]>,
}

impl FoodCatalog {
    pub fn new(records: Vec<FoodRecord>) -> Self {
        Self {
            records: records.into(),
        }
    }

    /// Load the labeled dataset, failing with `ArtifactMissing` when absent
    pub fn load(path: &Path) -> DietResult<Self> {
        if !path.exists() {
            return Err(DietError::ArtifactMissing {
                path: path.to_path_buf(),
            });
        }
        let records = read_records(path)?;
        info!(path = %path.display(), rows = records.len(), "Food catalog loaded");
        Ok(Self::new(records))
    }

    pub fn records(&self) -> &[FoodRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows carrying `label` and `food_type`, in dataset order
    pub fn matching(&self, label: ClusterLabel, food_type: FoodType) -> Vec<&FoodRecord> {
        self.records
            .iter()
            .filter(|r| r.cluster_label == label && r.food_type == food_type)
            .collect()
    }

    pub fn count_matching(&self, label: ClusterLabel, food_type: FoodType) -> usize {
        self.records
            .iter()
            .filter(|r| r.cluster_label == label && r.food_type == food_type)
            .count()
    }
}
