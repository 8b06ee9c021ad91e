//! Calorie-ordered labeling of fitted clusters

use super::scaler::ScalerState;
use crate::error::{DietError, DietResult};
use crate::models::{ClusterLabel, FeatureRow, CALORIC_VALUE_INDEX};
use serde::{Deserialize, Serialize};

/// Number of clusters the labeling scheme is defined for
pub const LABELED_CLUSTERS: usize = ClusterLabel::ALL.len();

/// Bijective map from cluster id to semantic label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterLabelMap {
    labels: [ClusterLabel; LABELED_CLUSTERS],
}

impl ClusterLabelMap {
    /// Label of a cluster id, `None` for ids outside 0..3
    pub fn label(&self, cluster: usize) -> Option<ClusterLabel> {
        self.labels.get(cluster).copied()
    }

    /// Cluster id carrying a label
    pub fn cluster_for(&self, label: ClusterLabel) -> usize {
        self.labels
            .iter()
            .position(|l| *l == label)
            .unwrap_or_default()
    }

    /// `(cluster id, label)` pairs in cluster id order
    pub fn iter(&self) -> impl Iterator<Item = (usize, ClusterLabel)> + '_ {
        self.labels.iter().copied().enumerate()
    }
}

/// Rank clusters by the caloric value of their de-standardized centroid.
///
/// The lowest becomes Weight Loss, the middle Healthy, the highest Weight
/// Gain. Equal calories fall back to ascending cluster id.
pub fn label_clusters(
    centroids: &[FeatureRow],
    scaler: &ScalerState,
) -> DietResult<ClusterLabelMap> {
    if centroids.len() != LABELED_CLUSTERS {
        return Err(DietError::InvalidClusterCount {
            expected: LABELED_CLUSTERS,
            actual: centroids.len(),
        });
    }

    let calories: Vec<f64> = scaler
        .inverse_transform(centroids)
        .iter()
        .map(|c| c[CALORIC_VALUE_INDEX])
        .collect();

    let mut order: Vec<usize> = (0..LABELED_CLUSTERS).collect();
    order.sort_by(|&a, &b| calories[a].total_cmp(&calories[b]).then(a.cmp(&b)));

    let mut labels = [ClusterLabel::Healthy; LABELED_CLUSTERS];
    for (rank, cluster) in order.into_iter().enumerate() {
        labels[cluster] = ClusterLabel::ALL[rank];
    }

    Ok(ClusterLabelMap { labels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn identity_scaler() -> ScalerState {
        ScalerState {
            mean: [0.0; 4],
            scale: [1.0; 4],
        }
    }

    #[test]
    fn test_lowest_calories_is_weight_loss() {
        let centroids = vec![[500.0, 0.0, 0.0, 0.0], [50.0, 0.0, 0.0, 0.0], [200.0, 0.0, 0.0, 0.0]];
        let map = label_clusters(&centroids, &identity_scaler()).unwrap();

        assert_eq!(map.label(1), Some(ClusterLabel::WeightLoss));
        assert_eq!(map.label(2), Some(ClusterLabel::Healthy));
        assert_eq!(map.label(0), Some(ClusterLabel::WeightGain));
        assert_eq!(map.cluster_for(ClusterLabel::WeightLoss), 1);
    }

    #[test]
    fn test_ranking_uses_destandardized_calories() {
        // negative scale flips the standardized order
        let scaler = ScalerState {
            mean: [100.0, 0.0, 0.0, 0.0],
            scale: [-10.0, 1.0, 1.0, 1.0],
        };
        let centroids = vec![[1.0, 0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 0.0], [-1.0, 0.0, 0.0, 0.0]];
        let map = label_clusters(&centroids, &scaler).unwrap();
        assert_eq!(map.label(0), Some(ClusterLabel::WeightLoss));
        assert_eq!(map.label(2), Some(ClusterLabel::WeightGain));
    }

    #[test]
    fn test_labels_are_a_bijection() {
        let centroids = vec![[0.3, 1.0, 0.0, 2.0], [-1.2, 0.0, 1.0, 0.0], [2.5, 0.5, 0.5, 0.5]];
        let map = label_clusters(&centroids, &identity_scaler()).unwrap();
        let labels: HashSet<_> = map.iter().map(|(_, l)| l).collect();
        assert_eq!(labels, ClusterLabel::ALL.into_iter().collect());
    }

    #[test]
    fn test_ties_break_by_cluster_id() {
        let centroids = vec![[10.0, 0.0, 0.0, 0.0], [10.0, 5.0, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0]];
        let map = label_clusters(&centroids, &identity_scaler()).unwrap();
        assert_eq!(map.label(2), Some(ClusterLabel::WeightLoss));
        assert_eq!(map.label(0), Some(ClusterLabel::Healthy));
        assert_eq!(map.label(1), Some(ClusterLabel::WeightGain));
    }

    #[test]
    fn test_wrong_cluster_count_rejected() {
        let centroids = vec![[0.0; 4]; 4];
        match label_clusters(&centroids, &identity_scaler()) {
            Err(DietError::InvalidClusterCount { expected, actual }) => {
                assert_eq!((expected, actual), (3, 4));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_cluster_has_no_label() {
        let centroids = vec![[0.0; 4], [1.0, 0.0, 0.0, 0.0], [2.0, 0.0, 0.0, 0.0]];
        let map = label_clusters(&centroids, &identity_scaler()).unwrap();
        assert_eq!(map.label(3), None);
    }
}
