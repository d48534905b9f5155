use std::{env, path::PathBuf};

use sea_orm::ConnectOptions;
use thiserror::Error;
use tracing::info;

use crate::{entity::company_settings, store::SettingsStore, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_opt: ConnectOptions,

    pub log_file: PathBuf,

    /// Overrides the company settings row when present
    pub working_days_per_month: Option<u32>,
    pub geo_fence_enabled: Option<bool>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment `{0}` is required to be set")]
    Missing(&'static str),

    #[error("environment `{var}` is not in a valid format: `{value}`")]
    Invalid { var: &'static str, value: String },
}

pub fn load() -> Result<Config, ConfigError> {
    let _ = dotenvy::dotenv();

    load_from(|var| env::var(var).ok())
}

/// `LOG_FILE` alone, for installing telemetry before the rest of the config is read
pub fn log_file() -> PathBuf {
    let _ = dotenvy::dotenv();

    load_log_file(&|var: &str| env::var(var).ok())
}

fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
    Ok(Config {
        database_opt: load_database_opt(&lookup)?.into(),
        log_file: load_log_file(&lookup),
        working_days_per_month: load_working_days(&lookup)?,
        geo_fence_enabled: load_geo_fence_enabled(&lookup)?,
    })
}

fn load_database_opt(lookup: &impl Fn(&str) -> Option<String>) -> Result<impl Into<ConnectOptions>, ConfigError> {
    info!("Loading environment `DATABASE_URL`");

    lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))
}

fn load_log_file(lookup: &impl Fn(&str) -> Option<String>) -> PathBuf {
    info!("Loading environment `LOG_FILE`");

    lookup("LOG_FILE").unwrap_or_else(|| "trace.log".to_string()).into()
}

fn load_working_days(lookup: &impl Fn(&str) -> Option<String>) -> Result<Option<u32>, ConfigError> {
    info!("Loading environment `WORKING_DAYS_PER_MONTH`");

    let Some(var) = lookup("WORKING_DAYS_PER_MONTH") else {
        return Ok(None)
    };

    match var.trim().parse::<u32>() {
        Ok(days) if (1..=31).contains(&days) => Ok(Some(days)),
        _ => Err(ConfigError::Invalid { var: "WORKING_DAYS_PER_MONTH", value: var }),
    }
}

fn load_geo_fence_enabled(lookup: &impl Fn(&str) -> Option<String>) -> Result<Option<bool>, ConfigError> {
    info!("Loading environment `GEOFENCE_ENABLED`");

    let Some(var) = lookup("GEOFENCE_ENABLED") else {
        return Ok(None)
    };

    match var.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(Some(true)),
        "0" | "false" | "no" => Ok(Some(false)),
        _ => Err(ConfigError::Invalid { var: "GEOFENCE_ENABLED", value: var }),
    }
}

/// Settings resolved once per request and handed to the operations that need them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Settings {
    pub working_days_per_month: Option<u32>,
    pub geo_fence_enabled: bool,
}

impl Settings {
    pub fn from_company(company: Option<&company_settings::Model>) -> Self {
        let Some(company) = company else {
            return Self::default()
        };

        Self {
            working_days_per_month: company.working_days_per_month
                .and_then(|days| u32::try_from(days).ok())
                .filter(|days| *days > 0),
            geo_fence_enabled: company.geo_fence_enabled,
        }
    }

    pub fn with_overrides(self, config: &Config) -> Self {
        Self {
            working_days_per_month: config.working_days_per_month.or(self.working_days_per_month),
            geo_fence_enabled: config.geo_fence_enabled.unwrap_or(self.geo_fence_enabled),
        }
    }
}

pub async fn resolve_settings<S: SettingsStore>(store: &S, config: &Config) -> Result<Settings> {
    let company = store.company_settings().await?;

    Ok(Settings::from_company(company.as_ref()).with_overrides(config))
}
