//! Meal plan serving over the labeled catalog
//!
//! Stateless and read-only: BMI → category → target cluster → filter by
//! cluster label and food preference → sample 9 distinct rows → split
//! breakfast / lunch / dinner in sample order.

pub mod bmi;
pub mod catalog;

pub use bmi::{compute_bmi, round_bmi, BmiCategory, HEALTHY_BMI_MIN, OVERWEIGHT_BMI_MIN};
pub use catalog::FoodCatalog;

use crate::error::DietResult;
use crate::models::{ClusterLabel, FoodRecord, FoodType, UserQuery};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Items per meal
pub const ITEMS_PER_MEAL: usize = 3;

/// Meals per day
pub const MEALS_PER_DAY: usize = 3;

/// Rows a plan draws from the catalog
pub const PLAN_SIZE: usize = ITEMS_PER_MEAL * MEALS_PER_DAY;

/// Message used when a plan cannot be built
pub const INSUFFICIENT_DATA_MESSAGE: &str = "Not enough food items";

/// Three meals of three distinct foods each
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub breakfast: Vec<FoodRecord>,
    pub lunch: Vec<FoodRecord>,
    pub dinner: Vec<FoodRecord>,
}

impl MealPlan {
    /// All planned items in breakfast, lunch, dinner order
    pub fn items(&self) -> impl Iterator<Item = &FoodRecord> {
        self.breakfast.iter().chain(&self.lunch).chain(&self.dinner)
    }
}

/// Result of a serving call
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendation {
    Plan {
        bmi: f64,
        category: BmiCategory,
        cluster: ClusterLabel,
        plan: MealPlan,
    },
    /// Fewer matching rows than a plan needs; no partial plan is produced
    InsufficientData {
        bmi: f64,
        category: BmiCategory,
        cluster: ClusterLabel,
        food_pref: FoodType,
        available: usize,
        required: usize,
    },
}

impl Recommendation {
    pub fn bmi(&self) -> f64 {
        match self {
            Recommendation::Plan { bmi, .. } | Recommendation::InsufficientData { bmi, .. } => *bmi,
        }
    }

    pub fn category(&self) -> BmiCategory {
        match self {
            Recommendation::Plan { category, .. }
            | Recommendation::InsufficientData { category, .. } => *category,
        }
    }

    pub fn cluster(&self) -> ClusterLabel {
        match self {
            Recommendation::Plan { cluster, .. }
            | Recommendation::InsufficientData { cluster, .. } => *cluster,
        }
    }

    pub fn is_plan(&self) -> bool {
        matches!(self, Recommendation::Plan { .. })
    }

    /// Wire shape shared by the HTTP endpoint and the CLI's JSON output
    pub fn to_response(&self) -> RecommendationResponse {
        match self {
            Recommendation::Plan {
                bmi,
                category,
                cluster,
                plan,
            } => RecommendationResponse::Plan(PlanResponse {
                bmi: round_bmi(*bmi),
                category: *category,
                cluster: *cluster,
                breakfast: plan.breakfast.clone(),
                lunch: plan.lunch.clone(),
                dinner: plan.dinner.clone(),
            }),
            Recommendation::InsufficientData {
                bmi,
                category,
                cluster,
                food_pref,
                available,
                required,
            } => RecommendationResponse::InsufficientData(InsufficientDataResponse {
                error: INSUFFICIENT_DATA_MESSAGE.to_string(),
                code: "insufficient_data".to_string(),
                bmi: round_bmi(*bmi),
                category: *category,
                cluster: *cluster,
                food_pref: *food_pref,
                available: *available,
                required: *required,
            }),
        }
    }
}

/// Successful plan as sent over the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResponse {
    pub bmi: f64,
    pub category: BmiCategory,
    pub cluster: ClusterLabel,
    pub breakfast: Vec<FoodRecord>,
    pub lunch: Vec<FoodRecord>,
    pub dinner: Vec<FoodRecord>,
}

impl PlanResponse {
    /// Meals with their display names
    pub fn meals(&self) -> [(&'static str, &[FoodRecord]); MEALS_PER_DAY] {
        [
            ("Breakfast", self.breakfast.as_slice()),
            ("Lunch", self.lunch.as_slice()),
            ("Dinner", self.dinner.as_slice()),
        ]
    }

    pub fn total_calories(&self) -> f64 {
        self.meals()
            .iter()
            .flat_map(|(_, items)| items.iter())
            .map(|r| r.caloric_value)
            .sum()
    }
}

/// Insufficient-data indicator as sent over the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsufficientDataResponse {
    pub error: String,
    pub code: String,
    pub bmi: f64,
    pub category: BmiCategory,
    pub cluster: ClusterLabel,
    pub food_pref: FoodType,
    pub available: usize,
    pub required: usize,
}

/// Either response body; distinguished on the wire by the `error` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecommendationResponse {
    InsufficientData(InsufficientDataResponse),
    Plan(PlanResponse),
}

/// Builds meal plans from a catalog with a caller-supplied random source
#[derive(Debug, Clone)]
pub struct MealPlanner {
    catalog: FoodCatalog,
}

impl MealPlanner {
    pub fn new(catalog: FoodCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &FoodCatalog {
        &self.catalog
    }

    pub fn recommend<R: Rng + ?Sized>(
        &self,
        query: &UserQuery,
        rng: &mut R,
    ) -> DietResult<Recommendation> {
        let bmi = compute_bmi(query.height, query.weight)?;
        let category = BmiCategory::from_bmi(bmi);
        let cluster = category.target_cluster();

        let candidates = self.catalog.matching(cluster, query.food_pref);
        debug!(
            bmi,
            category = %category,
            cluster = %cluster,
            food_pref = %query.food_pref,
            candidates = candidates.len(),
            "Filtered catalog"
        );

        if candidates.len() < PLAN_SIZE {
            return Ok(Recommendation::InsufficientData {
                bmi,
                category,
                cluster,
                food_pref: query.food_pref,
                available: candidates.len(),
                required: PLAN_SIZE,
            });
        }

        let mut selected: Vec<FoodRecord> =
            rand::seq::index::sample(rng, candidates.len(), PLAN_SIZE)
                .into_iter()
                .map(|i| candidates[i].clone())
                .collect();

        let dinner = selected.split_off(2 * ITEMS_PER_MEAL);
        let lunch = selected.split_off(ITEMS_PER_MEAL);
        let breakfast = selected;

        Ok(Recommendation::Plan {
            bmi,
            category,
            cluster,
            plan: MealPlan {
                breakfast,
                lunch,
                dinner,
            },
        })
    }
}
