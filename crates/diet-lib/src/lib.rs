//! Diet planner library
//!
//! This crate provides:
//! - The offline clustering pipeline that labels foods by nutritional cluster
//! - The serving filter that turns a user's BMI into a 3x3 meal plan
//! - Health checks and observability shared by the front ends

pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod pipeline;
pub mod serving;

pub use error::{DietError, DietResult};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{DietMetrics, StructuredLogger};
pub use pipeline::{Pipeline, PipelineConfig, PipelineReport};
pub use serving::{BmiCategory, FoodCatalog, MealPlan, MealPlanner, Recommendation};
