use crate::app_config::{AppConfig, Environment};
use crate::budget::BudgetConfig;
use crate::change::ChangeThresholds;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_positive_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let value = parse_u32(var, default)?;
        if value == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(value)
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("RANKWATCH_ENV", "development"))?;
    let log_level = or_default("RANKWATCH_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("RANKWATCH_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("RANKWATCH_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("RANKWATCH_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let search_base_url = or_default("RANKWATCH_SEARCH_BASE_URL", "https://openapi.naver.com/");
    let search_client_id = lookup("RANKWATCH_SEARCH_CLIENT_ID").ok();
    let search_client_secret = lookup("RANKWATCH_SEARCH_CLIENT_SECRET").ok();
    let search_timeout_secs = parse_u64("RANKWATCH_SEARCH_TIMEOUT_SECS", "10")?;
    let search_min_interval_ms = parse_u64("RANKWATCH_SEARCH_MIN_INTERVAL_MS", "100")?;

    let rank_check_limit = parse_positive_u32("RANK_CHECK_LIMIT", "300")?;
    let display_per_request = parse_positive_u32("DISPLAY_PER_REQUEST", "100")?;
    let rate_limit_delay_ms = parse_u64("RATE_LIMIT_DELAY", "100")?;
    let keyword_delay_ms = parse_u64("RANKWATCH_KEYWORD_DELAY_MS", "500")?;
    let max_retries = parse_u32("RANKWATCH_MAX_RETRIES", "3")?;
    let retry_base_delay_ms = parse_u64("RANKWATCH_RETRY_BASE_DELAY_MS", "1000")?;

    let budget = BudgetConfig {
        daily_limit: parse_u32("RANKWATCH_DAILY_CALL_LIMIT", "25000")?,
        ranking_limit: parse_u32("RANKWATCH_BUDGET_RANKING", "20000")?,
        color_analysis_limit: parse_u32("RANKWATCH_BUDGET_COLOR_ANALYSIS", "3000")?,
        reserve_limit: parse_u32("RANKWATCH_BUDGET_RESERVE", "2000")?,
    };

    let change_thresholds = ChangeThresholds {
        surge: parse_positive_u32("RANKWATCH_ALERT_SURGE_THRESHOLD", "10")?,
        drop: parse_positive_u32("RANKWATCH_ALERT_DROP_THRESHOLD", "10")?,
    };

    let collect_cron = or_default("RANKWATCH_COLLECT_CRON", "0 0 6 * * *");

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        search_base_url,
        search_client_id,
        search_client_secret,
        search_timeout_secs,
        search_min_interval_ms,
        rank_check_limit,
        display_per_request,
        rate_limit_delay_ms,
        keyword_delay_ms,
        max_retries,
        retry_base_delay_ms,
        budget,
        change_thresholds,
        collect_cron,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "RANKWATCH_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
