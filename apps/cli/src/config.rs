use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context};
use asset_manager_core::constants::BASE_UNIT_DECIMALS;

/// Output format of diagnostic logs. Logs go to stderr; stdout carries the snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => bail!("Invalid AM_LOG_FORMAT '{}', expected text or json", other),
        }
    }
}

/// Runtime configuration read from `AM_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub fixture_path: PathBuf,
    /// Asset to inspect. Defaults to the first asset in the fixture.
    pub asset_id: Option<String>,
    /// Caller identity. Defaults to the selected asset's manager.
    pub caller: Option<String>,
    pub base_unit_decimals: u32,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let fixture_path = lookup("AM_FIXTURE_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| anyhow!("AM_FIXTURE_PATH must be set"))?;

        let base_unit_decimals = match lookup("AM_BASE_UNIT_DECIMALS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .with_context(|| format!("Invalid AM_BASE_UNIT_DECIMALS: {}", raw))?,
            None => BASE_UNIT_DECIMALS,
        };

        let log_format = match lookup("AM_LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        Ok(Config {
            fixture_path,
            asset_id: lookup("AM_ASSET_ID").filter(|v| !v.is_empty()),
            caller: lookup("AM_CALLER").filter(|v| !v.is_empty()),
            base_unit_decimals,
            log_format,
        })
    }
}
