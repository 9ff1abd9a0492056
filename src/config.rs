use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

use crate::services::reporting::dataset::{DatasetRegistry, EntitySpec};

const DEFAULT_MYSQL_PORT: u16 = 3306;
const DEFAULT_MAX_RANGE_DAYS: u32 = 366;

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigOverrides {
    #[serde(default)]
    database_url: Option<String>,
    #[serde(default)]
    max_range_days: Option<u32>,
}

fn config_override_path() -> Option<PathBuf> {
    env_optional_string("REPORT_CONFIG_PATH").map(PathBuf::from)
}

fn load_config_overrides(path: &Path) -> Option<ConfigOverrides> {
    if !path.exists() {
        return None;
    }
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to read config file; using env defaults"
            );
            return None;
        }
    };
    match serde_json::from_str(&contents) {
        Ok(value) => Some(value),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to parse config file; using env defaults"
            );
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub database_url: String,
    pub datasets: DatasetRegistry,
    pub max_range_days: u32,
    /// Empty means any origin.
    pub cors_allow_origins: Vec<String>,
}

impl ReportConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let overrides = config_override_path()
            .and_then(|path| load_config_overrides(&path))
            .unwrap_or_default();

        let database_url = match env_optional_string("REPORT_DATABASE_URL").or_else(|| {
            overrides
                .database_url
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(ToOwned::to_owned)
        }) {
            Some(url) => url,
            None => {
                let host = env_optional_string("MYSQL_HOST").context(
                    "MYSQL_HOST must be set when REPORT_DATABASE_URL is not provided",
                )?;
                mysql_url(
                    &host,
                    env_u16("MYSQL_PORT", DEFAULT_MYSQL_PORT),
                    env_optional_string("MYSQL_USER").as_deref(),
                    env_optional_string("MYSQL_PASSWORD").as_deref(),
                )?
            }
        };

        let datasets = DatasetRegistry::new(
            entity_from_env("DIFFENJOBMETRICS_DATABASE", "DIFFENJOBMETRICS_TABLE")?,
            entity_from_env("EXTRACTION_INFO_DATABASE", "EXTRACTION_INFO_TABLE")?,
        );

        let max_range_days = std::env::var("REPORT_MAX_RANGE_DAYS")
            .ok()
            .and_then(|value| value.trim().parse::<u32>().ok())
            .or(overrides.max_range_days)
            .unwrap_or(DEFAULT_MAX_RANGE_DAYS)
            .max(1);

        Ok(Self {
            database_url,
            datasets,
            max_range_days,
            cors_allow_origins: parse_origins(&env_string("REPORT_CORS_ALLOW_ORIGINS", "")),
        })
    }
}

fn entity_from_env(database_key: &str, table_key: &str) -> Result<EntitySpec> {
    let database =
        env_optional_string(database_key).with_context(|| format!("{database_key} must be set"))?;
    let table =
        env_optional_string(table_key).with_context(|| format!("{table_key} must be set"))?;
    EntitySpec::new(&database, &table)
        .with_context(|| format!("invalid dataset identifiers in {database_key}/{table_key}"))
}

fn mysql_url(host: &str, port: u16, user: Option<&str>, password: Option<&str>) -> Result<String> {
    let mut url = Url::parse(&format!("mysql://{host}:{port}"))
        .with_context(|| format!("invalid MYSQL_HOST '{host}'"))?;
    if let Some(user) = user {
        url.set_username(user)
            .map_err(|_| anyhow::anyhow!("MYSQL_USER cannot be used in a connection URL"))?;
    }
    if let Some(password) = password {
        url.set_password(Some(password))
            .map_err(|_| anyhow::anyhow!("MYSQL_PASSWORD cannot be used in a connection URL"))?;
    }
    Ok(url.to_string())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty() && *origin != "*")
        .map(ToOwned::to_owned)
        .collect()
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_optional_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<u16>().ok())
        .unwrap_or(default)
}
