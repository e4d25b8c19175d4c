use crate::budget::BudgetConfig;
use crate::change::ChangeThresholds;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub search_base_url: String,
    pub search_client_id: Option<String>,
    pub search_client_secret: Option<String>,
    pub search_timeout_secs: u64,
    /// Minimum spacing between two HTTP requests to the search API.
    pub search_min_interval_ms: u64,
    pub rank_check_limit: u32,
    pub display_per_request: u32,
    pub rate_limit_delay_ms: u64,
    pub keyword_delay_ms: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub budget: BudgetConfig,
    pub change_thresholds: ChangeThresholds,
    pub collect_cron: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("search_base_url", &self.search_base_url)
            .field(
                "search_client_id",
                &self.search_client_id.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "search_client_secret",
                &self.search_client_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("search_timeout_secs", &self.search_timeout_secs)
            .field("search_min_interval_ms", &self.search_min_interval_ms)
            .field("rank_check_limit", &self.rank_check_limit)
            .field("display_per_request", &self.display_per_request)
            .field("rate_limit_delay_ms", &self.rate_limit_delay_ms)
            .field("keyword_delay_ms", &self.keyword_delay_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .field("budget", &self.budget)
            .field("change_thresholds", &self.change_thresholds)
            .field("collect_cron", &self.collect_cron)
            .finish()
    }
}
