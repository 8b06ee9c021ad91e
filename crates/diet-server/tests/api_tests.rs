//! Integration tests for the diet server API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use diet_lib::{
    health::{components, HealthRegistry},
    models::{ClusterLabel, FoodRecord, FoodType},
    observability::{outcomes, DietMetrics, StructuredLogger},
    FoodCatalog, MealPlanner,
};
use diet_server::api::{create_router, AppState};
use std::collections::HashSet;
use std::sync::Arc;
use tower::ServiceExt;

fn record(food: String, label: ClusterLabel, food_type: FoodType, calories: f64) -> FoodRecord {
    FoodRecord {
        food,
        caloric_value: calories,
        protein: 5.0,
        fat: 3.0,
        carbohydrates: 20.0,
        food_type,
        cluster: match label {
            ClusterLabel::WeightLoss => 2,
            ClusterLabel::Healthy => 0,
            ClusterLabel::WeightGain => 1,
        },
        cluster_label: label,
    }
}

/// Twelve healthy veg foods, four weight-loss non-veg foods
fn test_catalog() -> FoodCatalog {
    let mut records: Vec<_> = (0..12)
        .map(|i| {
            record(
                format!("veg dish {}", i),
                ClusterLabel::Healthy,
                FoodType::Veg,
                200.0 + i as f64,
            )
        })
        .collect();
    records.extend((0..4).map(|i| {
        record(
            format!("fish broth {}", i),
            ClusterLabel::WeightLoss,
            FoodType::NonVeg,
            40.0 + i as f64,
        )
    }));
    FoodCatalog::new(records)
}

async fn setup_test_app_with(planner: Option<MealPlanner>) -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::new();
    health_registry.register(components::CATALOG).await;
    health_registry.register(components::PLANNER).await;

    let state = Arc::new(AppState::new(
        health_registry,
        DietMetrics::new(),
        StructuredLogger::new("diet-server-test"),
        planner,
        Some(42),
    ));
    let router = create_router(state.clone());

    (router, state)
}

async fn setup_test_app() -> (Router, Arc<AppState>) {
    setup_test_app_with(Some(MealPlanner::new(test_catalog()))).await
}

async fn get(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_recommend(app: Router, body: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/recommend")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_recommend_returns_plan() {
    let (app, state) = setup_test_app().await;
    let before = state.metrics.recommendations(outcomes::PLAN);

    let (status, body) = post_recommend(
        app,
        r#"{"age": 30, "height": 170, "weight": 65, "food_pref": "veg"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bmi"], 22.49);
    assert_eq!(body["category"], "Healthy Weight");
    assert_eq!(body["cluster"], "Healthy");
    assert!(body.get("error").is_none());

    let mut names = HashSet::new();
    for meal in ["breakfast", "lunch", "dinner"] {
        let items = body[meal].as_array().unwrap();
        assert_eq!(items.len(), 3, "{}", meal);
        for item in items {
            assert_eq!(item["food_type"], "veg");
            assert_eq!(item["cluster_label"], "Healthy");
            names.insert(item["food"].as_str().unwrap().to_string());
        }
    }
    assert_eq!(names.len(), 9);
    assert!(state.metrics.recommendations(outcomes::PLAN) > before);
}

#[tokio::test]
async fn test_recommend_accepts_unit_suffixed_fields() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = post_recommend(
        app,
        r#"{"age": 30, "height_cm": 170, "weight_kg": 65, "food_pref": "veg"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["category"], "Healthy Weight");
}

#[tokio::test]
async fn test_recommend_reports_insufficient_data() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = post_recommend(
        app,
        r#"{"age": 45, "height": 170, "weight": 100, "food_pref": "non-veg"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "Not enough food items");
    assert_eq!(body["code"], "insufficient_data");
    assert_eq!(body["bmi"], 34.6);
    assert_eq!(body["category"], "Overweight");
    assert_eq!(body["cluster"], "Weight Loss");
    assert_eq!(body["available"], 4);
    assert_eq!(body["required"], 9);
    assert!(body.get("breakfast").is_none());
}

#[tokio::test]
async fn test_recommend_rejects_non_positive_height() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = post_recommend(
        app,
        r#"{"age": 30, "height": 0, "weight": 65, "food_pref": "veg"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_query");
}

#[tokio::test]
async fn test_recommend_rejects_unknown_preference() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = post_recommend(
        app,
        r#"{"age": 30, "height": 170, "weight": 65, "food_pref": "vegan"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_query");
    assert!(body["error"].as_str().unwrap().len() > 0);
}

#[tokio::test]
async fn test_recommend_rejects_malformed_body() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = post_recommend(app, "{not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_query");
}

#[tokio::test]
async fn test_recommend_without_catalog_returns_503() {
    let (app, state) = setup_test_app_with(None).await;
    let before = state.metrics.recommendations(outcomes::UNAVAILABLE);

    let (status, body) = post_recommend(
        app,
        r#"{"age": 30, "height": 170, "weight": 65, "food_pref": "veg"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "artifact_missing");
    assert!(state.metrics.recommendations(outcomes::UNAVAILABLE) > before);
}

#[tokio::test]
async fn test_fixed_seed_gives_repeatable_plans() {
    let body = r#"{"age": 30, "height": 170, "weight": 65, "food_pref": "veg"}"#;
    let (first_app, _) = setup_test_app().await;
    let (second_app, _) = setup_test_app().await;

    let (_, first) = post_recommend(first_app, body).await;
    let (_, second) = post_recommend(second_app, body).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_healthz_returns_ok_when_healthy() {
    let (app, _state) = setup_test_app().await;

    let (status, health) = get(app, "/healthz").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "healthy");
    assert!(health["components"]["catalog"].is_object());
    assert!(health["components"]["planner"].is_object());
}

#[tokio::test]
async fn test_healthz_returns_ok_when_degraded() {
    let (app, state) = setup_test_app().await;

    state
        .health_registry
        .set_degraded(components::PLANNER, "2 of 6 catalog slices below 9 foods")
        .await;

    let (status, health) = get(app, "/healthz").await;

    // Degraded still returns 200 (operational)
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "degraded");
}

#[tokio::test]
async fn test_healthz_returns_503_when_catalog_missing() {
    let (app, state) = setup_test_app_with(None).await;

    state
        .health_registry
        .set_unhealthy(components::CATALOG, "clustered_food_data.csv not found")
        .await;

    let (status, health) = get(app, "/healthz").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health["status"], "unhealthy");
    assert_eq!(
        health["components"]["catalog"]["message"],
        "clustered_food_data.csv not found"
    );
}

#[tokio::test]
async fn test_readyz_returns_503_when_not_ready() {
    let (app, _state) = setup_test_app().await;

    let (status, readiness) = get(app, "/readyz").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["ready"], false);
}

#[tokio::test]
async fn test_readyz_returns_ok_when_ready() {
    let (app, state) = setup_test_app().await;
    state.health_registry.set_ready(true).await;

    let (status, readiness) = get(app, "/readyz").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(readiness["ready"], true);
}

#[tokio::test]
async fn test_readyz_returns_503_when_ready_but_unhealthy() {
    let (app, state) = setup_test_app().await;
    state.health_registry.set_ready(true).await;
    state
        .health_registry
        .set_unhealthy(components::CATALOG, "artifact missing")
        .await;

    let (status, readiness) = get(app, "/readyz").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(readiness["reason"], "catalog unhealthy: artifact missing");
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, state) = setup_test_app().await;

    state.metrics.observe_recommendation_latency(0.002);
    state.metrics.set_catalog(16, "clustered_food_data.csv");
    state.metrics.inc_recommendations(outcomes::PLAN);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("diet_recommendation_latency_seconds_bucket"));
    assert!(metrics_text.contains("diet_recommendations_total"));
    assert!(metrics_text.contains("diet_catalog_rows"));
    assert!(metrics_text.contains("diet_catalog_info"));
}
