//! K-Means clustering over standardized feature rows
//!
//! Lloyd iterations from k-means++ seeds. Several initializations are run
//! from a single seeded ChaCha stream and the one with the lowest inertia is
//! kept, so a fit is fully reproducible for a given input, k, seed and
//! initialization count.

use crate::error::{DietError, DietResult};
use crate::models::{FeatureRow, NUM_FEATURES};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default seed for centroid initialization
pub const DEFAULT_SEED: u64 = 42;

/// Default number of initializations
pub const DEFAULT_N_INIT: usize = 10;

/// Default iteration cap per initialization
pub const DEFAULT_MAX_ITER: usize = 300;

/// Default relative convergence tolerance
pub const DEFAULT_TOL: f64 = 1e-4;

/// K-Means estimator configuration
#[derive(Debug, Clone)]
pub struct KMeans {
    n_clusters: usize,
    n_init: usize,
    max_iter: usize,
    tol: f64,
    seed: u64,
}

impl KMeans {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            n_init: DEFAULT_N_INIT,
            max_iter: DEFAULT_MAX_ITER,
            tol: DEFAULT_TOL,
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Tolerance relative to the mean feature variance of the input
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Fit on `data` and return per-row cluster ids plus the fitted model
    pub fn fit(&self, data: &[FeatureRow]) -> DietResult<KMeansFit> {
        if self.n_clusters == 0 {
            return Err(DietError::DataIntegrity("number of clusters must be positive".to_string()));
        }
        if self.n_init == 0 {
            return Err(DietError::DataIntegrity("n_init must be positive".to_string()));
        }
        if data.len() < self.n_clusters {
            return Err(DietError::DataIntegrity(format!(
                "need at least {} rows to form {} clusters, got {}",
                self.n_clusters,
                self.n_clusters,
                data.len()
            )));
        }

        let tol = self.tol * mean_feature_variance(data);
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut best: Option<LloydRun> = None;

        for init in 0..self.n_init {
            let seeds = kmeans_plusplus(data, self.n_clusters, &mut rng);
            let run = self.lloyd(data, seeds, tol);
            debug!(
                init,
                inertia = run.inertia,
                n_iter = run.n_iter,
                "K-Means initialization finished"
            );

            if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
                best = Some(run);
            }
        }

        let best = best
            .ok_or_else(|| DietError::DataIntegrity("no K-Means run completed".to_string()))?;

        Ok(KMeansFit {
            labels: best.labels,
            model: KMeansModel {
                centroids: best.centroids,
                inertia: best.inertia,
                n_iter: best.n_iter,
                seed: self.seed,
                n_init: self.n_init,
            },
        })
    }

    fn lloyd(&self, data: &[FeatureRow], mut centroids: Vec<FeatureRow>, tol: f64) -> LloydRun {
        let mut labels = assign(data, &centroids);
        let mut n_iter = 0;

        for iter in 0..self.max_iter {
            let new_centroids = update_centroids(data, &labels, &centroids);
            let shift: f64 = centroids
                .iter()
                .zip(&new_centroids)
                .map(|(old, new)| distance_sq(old, new))
                .sum();

            centroids = new_centroids;
            labels = assign(data, &centroids);
            n_iter = iter + 1;

            if shift <= tol {
                break;
            }
        }

        let inertia = data
            .iter()
            .zip(&labels)
            .map(|(row, &label)| distance_sq(row, &centroids[label]))
            .sum();

        LloydRun {
            labels,
            centroids,
            inertia,
            n_iter,
        }
    }
}

/// Result of [`KMeans::fit`]
#[derive(Debug, Clone)]
pub struct KMeansFit {
    /// Cluster id of every input row
    pub labels: Vec<usize>,
    pub model: KMeansModel,
}

/// Fitted clusterer state, centroids in standardized feature space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeansModel {
    pub centroids: Vec<FeatureRow>,
    /// Within-cluster sum of squared distances
    pub inertia: f64,
    pub n_iter: usize,
    pub seed: u64,
    pub n_init: usize,
}

impl KMeansModel {
    pub fn n_clusters(&self) -> usize {
        self.centroids.len()
    }

    /// Nearest centroid for a standardized row
    pub fn predict_row(&self, row: &FeatureRow) -> usize {
        nearest(row, &self.centroids).0
    }

    pub fn predict(&self, rows: &[FeatureRow]) -> Vec<usize> {
        assign(rows, &self.centroids)
    }
}

struct LloydRun {
    labels: Vec<usize>,
    centroids: Vec<FeatureRow>,
    inertia: f64,
    n_iter: usize,
}

fn distance_sq(a: &FeatureRow, b: &FeatureRow) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Index of and squared distance to the closest centroid; ties go to the lower index
fn nearest(row: &FeatureRow, centroids: &[FeatureRow]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (k, centroid) in centroids.iter().enumerate() {
        let dist = distance_sq(row, centroid);
        if dist < best.1 {
            best = (k, dist);
        }
    }
    best
}

fn assign(data: &[FeatureRow], centroids: &[FeatureRow]) -> Vec<usize> {
    data.iter().map(|row| nearest(row, centroids).0).collect()
}

/// Mean of assigned rows; empty clusters take the rows farthest from their centroid
fn update_centroids(
    data: &[FeatureRow],
    labels: &[usize],
    previous: &[FeatureRow],
) -> Vec<FeatureRow> {
    let k = previous.len();
    let mut sums = vec![[0.0; NUM_FEATURES]; k];
    let mut counts = vec![0usize; k];

    for (row, &label) in data.iter().zip(labels) {
        counts[label] += 1;
        for (s, v) in sums[label].iter_mut().zip(row) {
            *s += v;
        }
    }

    let empty: Vec<usize> = (0..k).filter(|&c| counts[c] == 0).collect();
    let mut centroids: Vec<FeatureRow> = sums
        .into_iter()
        .zip(&counts)
        .map(|(mut sum, &count)| {
            if count > 0 {
                sum.iter_mut().for_each(|s| *s /= count as f64);
            }
            sum
        })
        .collect();

    if !empty.is_empty() {
        let mut far: Vec<(usize, f64)> = data
            .iter()
            .zip(labels)
            .enumerate()
            .map(|(i, (row, &label))| (i, distance_sq(row, &previous[label])))
            .collect();
        far.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        for (cluster, (idx, _)) in empty.into_iter().zip(far) {
            debug!(cluster, row = idx, "Relocating empty cluster");
            centroids[cluster] = data[idx];
        }
    }

    centroids
}

/// k-means++ seeding: first centre uniform, then proportional to squared distance
fn kmeans_plusplus<R: Rng>(data: &[FeatureRow], k: usize, rng: &mut R) -> Vec<FeatureRow> {
    let n = data.len();
    let mut centroids = Vec::with_capacity(k);
    centroids.push(data[rng.gen_range(0..n)]);

    let mut closest: Vec<f64> = data.iter().map(|row| distance_sq(row, &centroids[0])).collect();

    while centroids.len() < k {
        let total: f64 = closest.iter().sum();
        let idx = if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut acc = 0.0;
            closest
                .iter()
                .position(|d| {
                    acc += d;
                    acc > target
                })
                .unwrap_or(n - 1)
        } else {
            // every row coincides with a chosen centre
            rng.gen_range(0..n)
        };

        let chosen = data[idx];
        for (d, row) in closest.iter_mut().zip(data) {
            *d = d.min(distance_sq(row, &chosen));
        }
        centroids.push(chosen);
    }

    centroids
}

fn mean_feature_variance(data: &[FeatureRow]) -> f64 {
    let n = data.len() as f64;
    let mut total = 0.0;
    for j in 0..NUM_FEATURES {
        let mean = data.iter().map(|r| r[j]).sum::<f64>() / n;
        total += data.iter().map(|r| (r[j] - mean).powi(2)).sum::<f64>() / n;
    }
    total / NUM_FEATURES as f64
}
