//! Feature preparation for clustering
//!
//! Loads the raw nutrition table, mean-fills missing feature values, drops
//! rows without a food name and tags every row as veg or non-veg. The steps
//! run in a fixed order: means are computed over every row, including rows
//! that are dropped afterwards for lacking a name.

use super::classifier::classify;
use crate::error::{DietError, DietResult};
use crate::models::{FeatureRow, PreparedFood, FEATURE_COLUMNS, FOOD_COLUMN, NUM_FEATURES};
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Header prefix of stray index columns written by CSV exporters
pub const UNNAMED_COLUMN_PREFIX: &str = "Unnamed";

/// Cell spellings treated as a missing value
const MISSING_MARKERS: [&str; 3] = ["nan", "na", "null"];

/// One raw row: an optional name and optional feature values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFoodRow {
    pub food: Option<String>,
    pub values: [Option<f64>; NUM_FEATURES],
}

/// Summary of a preparation pass
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparationStats {
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub rows_kept: usize,
    /// Mean used to fill each feature column
    pub fill_values: FeatureRow,
    /// Number of filled cells per feature column
    pub imputed_cells: [usize; NUM_FEATURES],
    /// Columns ignored as export index artifacts
    pub ignored_columns: Vec<String>,
}

/// Output of [`FeaturePreparer::prepare`]
#[derive(Debug, Clone)]
pub struct PreparedDataset {
    pub rows: Vec<PreparedFood>,
    pub stats: PreparationStats,
}

impl PreparedDataset {
    /// Feature matrix in row order
    pub fn feature_matrix(&self) -> Vec<FeatureRow> {
        self.rows.iter().map(|r| r.features).collect()
    }
}

/// Column positions resolved from a CSV header
#[derive(Debug, Clone)]
struct ColumnLayout {
    food: usize,
    features: [usize; NUM_FEATURES],
    ignored: Vec<String>,
}

impl ColumnLayout {
    fn resolve(headers: &csv::StringRecord) -> DietResult<Self> {
        let mut ignored = Vec::new();
        let mut usable: Vec<(usize, &str)> = Vec::new();

        for (idx, header) in headers.iter().enumerate() {
            let header = header.trim();
            if header.starts_with(UNNAMED_COLUMN_PREFIX) {
                ignored.push(header.to_string());
            } else {
                usable.push((idx, header));
            }
        }

        let find = |name: &str| {
            usable
                .iter()
                .find(|(_, header)| *header == name)
                .map(|(idx, _)| *idx)
                .ok_or_else(|| {
                    DietError::DataIntegrity(format!("missing required column '{}'", name))
                })
        };

        let food = find(FOOD_COLUMN)?;
        let mut features = [0usize; NUM_FEATURES];
        for (slot, name) in features.iter_mut().zip(FEATURE_COLUMNS) {
            *slot = find(name)?;
        }

        Ok(Self {
            food,
            features,
            ignored,
        })
    }
}

/// Prepares raw nutrition rows for scaling and clustering
#[derive(Debug, Clone, Default)]
pub struct FeaturePreparer;

impl FeaturePreparer {
    pub fn new() -> Self {
        Self
    }

    /// Load and prepare a CSV file
    pub fn load_csv(&self, path: &Path) -> DietResult<PreparedDataset> {
        let file = File::open(path).map_err(|e| DietError::io(path, e))?;
        info!(path = %path.display(), "Loading raw nutrition dataset");
        self.load_reader(file)
    }

    /// Load and prepare CSV content from any reader
    pub fn load_reader<R: Read>(&self, reader: R) -> DietResult<PreparedDataset> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers = csv_reader
            .headers()
            .map_err(|e| DietError::DataIntegrity(format!("unreadable CSV header: {}", e)))?
            .clone();
        let layout = ColumnLayout::resolve(&headers)?;
        if !layout.ignored.is_empty() {
            debug!(columns = ?layout.ignored, "Ignoring unnamed index columns");
        }

        let mut raw_rows = Vec::new();
        for result in csv_reader.records() {
            let record =
                result.map_err(|e| DietError::DataIntegrity(format!("malformed CSV row: {}", e)))?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            raw_rows.push(parse_record(&record, &layout, line)?);
        }

        let mut dataset = self.prepare(raw_rows)?;
        dataset.stats.ignored_columns = layout.ignored;
        Ok(dataset)
    }

    /// Mean-fill, drop nameless rows and classify, in that order
    pub fn prepare(&self, raw_rows: Vec<RawFoodRow>) -> DietResult<PreparedDataset> {
        let rows_read = raw_rows.len();
        let fill_values = column_means(&raw_rows)?;
        let mut imputed_cells = [0usize; NUM_FEATURES];

        let rows: Vec<PreparedFood> = raw_rows
            .into_iter()
            .filter_map(|raw| {
                let mut features = [0.0; NUM_FEATURES];
                for (j, value) in raw.values.iter().enumerate() {
                    features[j] = match value {
                        Some(v) => *v,
                        None => {
                            imputed_cells[j] += 1;
                            fill_values[j]
                        }
                    };
                }
                let food = raw.food?;
                let food_type = classify(&food);
                Some(PreparedFood {
                    food,
                    features,
                    food_type,
                })
            })
            .collect();

        if rows.is_empty() {
            return Err(DietError::DataIntegrity(
                "no rows with a food name remain after preparation".to_string(),
            ));
        }

        let stats = PreparationStats {
            rows_read,
            rows_dropped: rows_read - rows.len(),
            rows_kept: rows.len(),
            fill_values,
            imputed_cells,
            ignored_columns: Vec::new(),
        };

        info!(
            rows_read = stats.rows_read,
            rows_dropped = stats.rows_dropped,
            imputed = ?stats.imputed_cells,
            "Prepared nutrition features"
        );

        Ok(PreparedDataset { rows, stats })
    }
}

fn parse_record(
    record: &csv::StringRecord,
    layout: &ColumnLayout,
    line: u64,
) -> DietResult<RawFoodRow> {
    let food = record
        .get(layout.food)
        .map(str::trim)
        .filter(|name| !name.is_empty() && !is_missing(name))
        .map(str::to_string);

    let mut values = [None; NUM_FEATURES];
    for (j, &idx) in layout.features.iter().enumerate() {
        values[j] = parse_cell(record.get(idx).unwrap_or(""), FEATURE_COLUMNS[j], line)?;
    }

    Ok(RawFoodRow { food, values })
}

fn is_missing(cell: &str) -> bool {
    let lowered = cell.to_lowercase();
    MISSING_MARKERS.contains(&lowered.as_str())
}

fn parse_cell(cell: &str, column: &str, line: u64) -> DietResult<Option<f64>> {
    let cell = cell.trim();
    if cell.is_empty() || is_missing(cell) {
        return Ok(None);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(DietError::DataIntegrity(format!(
            "non-numeric value '{}' in column '{}' at line {}",
            cell, column, line
        ))),
    }
}

/// Mean of the present values of each feature column
fn column_means(rows: &[RawFoodRow]) -> DietResult<FeatureRow> {
    let mut sums = [0.0; NUM_FEATURES];
    let mut counts = [0usize; NUM_FEATURES];

    for row in rows {
        for (j, value) in row.values.iter().enumerate() {
            if let Some(v) = value {
                sums[j] += v;
                counts[j] += 1;
            }
        }
    }

    let mut means = [0.0; NUM_FEATURES];
    for j in 0..NUM_FEATURES {
        if counts[j] == 0 {
            return Err(DietError::DataIntegrity(format!(
                "column '{}' has no values to compute a mean from",
                FEATURE_COLUMNS[j]
            )));
        }
        means[j] = sums[j] / counts[j] as f64;
    }
    Ok(means)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FoodType;

    fn row(food: Option<&str>, values: [Option<f64>; 4]) -> RawFoodRow {
        RawFoodRow {
            food: food.map(str::to_string),
            values,
        }
    }

    #[test]
    fn test_mean_fill_per_column() {
        let rows = vec![
            row(Some("apple"), [Some(50.0), None, Some(0.2), Some(14.0)]),
            row(Some("bread"), [Some(250.0), Some(9.0), None, Some(49.0)]),
            row(Some("rice"), [None, Some(3.0), Some(0.4), Some(28.0)]),
        ];
        let prepared = FeaturePreparer::new().prepare(rows).unwrap();

        assert_eq!(prepared.rows.len(), 3);
        assert_eq!(prepared.rows[0].features[1], 6.0);
        assert!((prepared.rows[1].features[2] - 0.3).abs() < 1e-12);
        assert_eq!(prepared.rows[2].features[0], 150.0);
        assert_eq!(prepared.stats.imputed_cells, [1, 1, 1, 0]);
    }

    #[test]
    fn test_nameless_rows_contribute_to_mean_then_drop() {
        let rows = vec![
            row(Some("apple"), [None, Some(1.0), Some(1.0), Some(1.0)]),
            row(None, [Some(300.0), Some(1.0), Some(1.0), Some(1.0)]),
            row(Some("pear"), [Some(100.0), Some(1.0), Some(1.0), Some(1.0)]),
        ];
        let prepared = FeaturePreparer::new().prepare(rows).unwrap();

        assert_eq!(prepared.rows.len(), 2);
        assert_eq!(prepared.stats.rows_dropped, 1);
        // mean over 300 and 100, the nameless row included
        assert_eq!(prepared.rows[0].features[0], 200.0);
    }

    #[test]
    fn test_output_has_no_missing_values() {
        let rows = vec![
            row(Some("a"), [Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
            row(Some("b"), [None, None, None, None]),
            row(None, [None, None, None, None]),
        ];
        let prepared = FeaturePreparer::new().prepare(rows).unwrap();
        for food in &prepared.rows {
            assert!(!food.food.is_empty());
            assert!(food.features.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_food_type_is_classified() {
        let rows = vec![
            row(Some("grilled chicken"), [Some(1.0); 4]),
            row(Some("cheddar cheese"), [Some(1.0); 4]),
        ];
        let prepared = FeaturePreparer::new().prepare(rows).unwrap();
        assert_eq!(prepared.rows[0].food_type, FoodType::NonVeg);
        assert_eq!(prepared.rows[1].food_type, FoodType::Veg);
    }

    #[test]
    fn test_column_without_values_is_rejected() {
        let rows = vec![row(Some("a"), [Some(1.0), None, Some(1.0), Some(1.0)])];
        let err = FeaturePreparer::new().prepare(rows).unwrap_err();
        assert!(matches!(err, DietError::DataIntegrity(_)));
    }

    #[test]
    fn test_csv_ignores_unnamed_and_extra_columns() {
        let csv = "\
Unnamed: 0,food,Caloric Value,Fat,Protein,Carbohydrates,Sugars
0,cream cheese,51,5,0.9,0.8,0.5
1,,120,1,1,1,0
2,chicken breast,NaN,3.6,31,0,0
";
        let prepared = FeaturePreparer::new().load_reader(csv.as_bytes()).unwrap();

        assert_eq!(prepared.stats.ignored_columns, vec!["Unnamed: 0".to_string()]);
        assert_eq!(prepared.rows.len(), 2);
        assert_eq!(prepared.rows[0].food, "cream cheese");
        // columns are read by name, not position
        assert_eq!(prepared.rows[0].features, [51.0, 0.9, 5.0, 0.8]);
        // NaN calorie is filled with mean of 51 and 120
        assert_eq!(prepared.rows[1].features[0], 85.5);
    }

    #[test]
    fn test_csv_missing_required_column() {
        let csv = "food,Caloric Value,Protein,Fat\napple,52,0.3,0.2\n";
        let err = FeaturePreparer::new().load_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("Carbohydrates"));
    }

    #[test]
    fn test_csv_non_numeric_value() {
        let csv = "food,Caloric Value,Protein,Fat,Carbohydrates\napple,lots,0.3,0.2,14\n";
        let err = FeaturePreparer::new().load_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DietError::DataIntegrity(_)));
        assert!(err.to_string().contains("Caloric Value"));
    }

    #[test]
    fn test_csv_missing_markers() {
        let csv = "\
food,Caloric Value,Protein,Fat,Carbohydrates
apple,NaN,0.3,null,14
rice,130,NA,0.3,
-,50,1,1,10
";
        let dataset = FeaturePreparer::new().load_reader(csv.as_bytes()).unwrap();
        assert_eq!(dataset.rows.len(), 3);
        assert_eq!(dataset.rows[2].food, "-");
        assert_eq!(dataset.stats.imputed_cells, [1, 1, 1, 1]);

        let dash = "food,Caloric Value,Protein,Fat,Carbohydrates\napple,-,0.3,0.2,14\n";
        let err = FeaturePreparer::new().load_reader(dash.as_bytes()).unwrap_err();
        assert!(matches!(err, DietError::DataIntegrity(_)));
    }
}
