use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Catalog pages and fetch behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    #[serde(default = "default_targets")]
    pub targets: Vec<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,

    /// Budget for detail-page escalation; capped at the page timeout.
    #[serde(default = "default_detail_timeout_secs")]
    pub detail_timeout_secs: u64,
}

/// Seen-link persistence
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_seen_path")]
    pub seen_path: PathBuf,
}

/// Telegram bot credentials. Without both, alerts go to the log.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: Option<String>,

    #[serde(default)]
    pub chat_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl ScraperConfig {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn detail_timeout(&self) -> Duration {
        Duration::from_secs(self.detail_timeout_secs.min(self.page_timeout_secs))
    }
}

impl ScheduleConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_targets() -> Vec<String> {
    vec![
        "https://www.udemy.com/courses/it-and-software/it-certification/?closed_captions=en&closed_captions=en_cc&instructional_level=beginner&instructional_level=all&instructional_level=intermediate&instructional_level=expert&lang=en&price=price-free&ratings=4.0&sort=most-reviewed".to_string(),
        "https://www.udemy.com/courses/it-and-software/other-it-and-software/?closed_captions=en&closed_captions=en_cc&lang=en&price=price-free&ratings=4.0&sort=most-reviewed".to_string(),
        "https://www.coursera.org/search?language=Arabic&language=English&productTypeDescription=Professional%20Certificates&subtitleLanguage=English&subtitleLanguage=Arabic&topic=Computer%20Science&topic=Information%20Technology&sortBy=BEST_MATCH".to_string(),
    ]
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36".to_string()
}
fn default_page_timeout_secs() -> u64 {
    15
}
fn default_detail_timeout_secs() -> u64 {
    10
}
fn default_seen_path() -> PathBuf {
    PathBuf::from("sent_courses.json")
}
fn default_interval_secs() -> u64 {
    2 * 60 * 60
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            targets: default_targets(),
            user_agent: default_user_agent(),
            page_timeout_secs: default_page_timeout_secs(),
            detail_timeout_secs: default_detail_timeout_secs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            seen_path: default_seen_path(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::Environment::with_prefix("COURSE_WATCHER")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("scraper.targets")
                    .try_parsing(true),
            )
            .build()?;

        let app_cfg: AppConfig = cfg.try_deserialize().unwrap_or_else(|e| {
            tracing::warn!("Invalid configuration ({}), using defaults", e);
            AppConfig::default()
        });
        Ok(app_cfg)
    }
}
