#![allow(dead_code)]

use stepwise_core::{models::Problem, EngineConfig, Guide, GuideBuilder};
use tempfile::TempDir;

/// The router walkthrough shipped in `demos/`.
pub const ROUTER_PROBLEM: &str = include_str!("../../../../demos/router-no-internet.json");

pub fn router_problem() -> Problem {
    serde_json::from_str(ROUTER_PROBLEM).expect("demo problem parses")
}

/// Helper function to create a test guide with a seeded random source
pub async fn create_test_guide() -> (TempDir, Guide) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");
    let guide = GuideBuilder::new()
        .with_database_path(Some(&db_path))
        .with_config(EngineConfig::default())
        .with_rng_seed(42)
        .build()
        .await
        .expect("Failed to create guide");
    (temp_dir, guide)
}
