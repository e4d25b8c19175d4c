//! Offline unit tests for rankwatch-db pool configuration and row types.
//! These tests do not require a live database connection.

use rankwatch_core::{
    AppConfig, BudgetConfig, ChangeThresholds, DailyCollectionResult, Environment,
};
use rankwatch_db::{CollectionRunRow, PoolConfig, RankHistoryRow, RunTotals};

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        search_base_url: "https://openapi.example.com/".to_string(),
        search_client_id: None,
        search_client_secret: None,
        search_timeout_secs: 10,
        search_min_interval_ms: 100,
        rank_check_limit: 300,
        display_per_request: 100,
        rate_limit_delay_ms: 100,
        keyword_delay_ms: 500,
        max_retries: 3,
        retry_base_delay_ms: 1000,
        budget: BudgetConfig::default(),
        change_thresholds: ChangeThresholds::default(),
        collect_cron: "0 0 6 * * *".to_string(),
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn run_totals_from_daily_result() {
    let result = DailyCollectionResult {
        total_products: 4,
        total_keywords: 19,
        total_api_calls: 51,
        execution_time_ms: 12_000,
        skipped_products: 2,
        failed_products: 1,
    };

    let totals = RunTotals::from(&result);
    assert_eq!(totals.products_processed, 4);
    assert_eq!(totals.keywords_processed, 19);
    assert_eq!(totals.api_calls_used, 51);
    assert_eq!(totals.products_skipped, 2);
}

/// Compile-time smoke test: confirm that [`CollectionRunRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn collection_run_row_has_expected_fields() {
    use chrono::Utc;
    use uuid::Uuid;

    let row = CollectionRunRow {
        id: 1_i64,
        public_id: Uuid::new_v4(),
        run_type: "rankings".to_string(),
        trigger_source: "cli".to_string(),
        status: "queued".to_string(),
        started_at: None,
        completed_at: None,
        products_processed: 0_i32,
        keywords_processed: 0_i32,
        api_calls_used: 0_i32,
        products_skipped: 0_i32,
        error_message: None,
        created_at: Utc::now(),
    };

    assert_eq!(row.run_type, "rankings");
    assert_eq!(row.status, "queued");
    assert!(row.started_at.is_none());
    assert!(row.error_message.is_none());
}

#[test]
fn rank_history_row_converts_rank() {
    use chrono::Utc;

    let mut row = RankHistoryRow {
        id: 1,
        product_external_id: "8801".to_string(),
        keyword: "linen shirt".to_string(),
        rank: Some(250),
        rank_limit: 300,
        checked_at: Utc::now(),
        api_calls: 3,
    };
    assert_eq!(row.rank_u32(), Some(250));

    row.rank = None;
    assert_eq!(row.rank_u32(), None);
}
