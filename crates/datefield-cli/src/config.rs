// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use datefield_app::{DISPLAY_LAYOUT, ISO_LAYOUT, parse_iso};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::Date;
use tracing_subscriber::EnvFilter;

pub const APP_NAME: &str = "datefield";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_LABEL: &str = "Date";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub field: Field,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            field: Field::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Field {
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub clearable: Option<bool>,
    pub min_date: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: Some(DEFAULT_LOG_LEVEL.to_owned()),
            file: None,
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("DATEFIELD_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set DATEFIELD_CONFIG_PATH to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and move values under [field] and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1. Regenerate it with --print-example-config",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(min_date) = &self.field.min_date {
            parse_config_date(min_date)
                .with_context(|| format!("field.min_date in {}", path.display()))?;
        }

        // A bad initial value is tolerated by the field itself, but in a
        // config file it is almost certainly a typo.
        if let Some(value) = &self.field.value {
            parse_config_date(value)
                .with_context(|| format!("field.value in {}", path.display()))?;
        }

        if let Some(level) = &self.log.level {
            EnvFilter::try_new(level).map_err(|error| {
                anyhow!(
                    "log.level {level:?} in {} is not a valid filter ({error}); use a level such as info or debug",
                    path.display()
                )
            })?;
        }

        if let Some(file) = &self.log.file
            && file.trim().is_empty()
        {
            bail!(
                "log.file in {} is empty; remove it to use the default location",
                path.display()
            );
        }

        Ok(())
    }

    pub fn label(&self) -> &str {
        self.field.label.as_deref().unwrap_or(DEFAULT_LABEL)
    }

    pub fn placeholder(&self) -> &str {
        self.field.placeholder.as_deref().unwrap_or(DISPLAY_LAYOUT)
    }

    pub fn clearable(&self) -> bool {
        self.field.clearable.unwrap_or(false)
    }

    pub fn min_date(&self) -> Result<Option<Date>> {
        self.field
            .min_date
            .as_deref()
            .map(parse_config_date)
            .transpose()
    }

    pub fn value(&self) -> Option<&str> {
        self.field.value.as_deref()
    }

    pub fn log_level(&self) -> &str {
        self.log.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(file) = &self.log.file {
            return Ok(PathBuf::from(file));
        }
        let state_root = dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .ok_or_else(|| {
                anyhow!("cannot resolve a log directory; set [log].file in the config")
            })?;
        Ok(state_root.join(APP_NAME).join(format!("{APP_NAME}.log")))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# datefield config\n# Place this file at: {}\n\nversion = 1\n\n[field]\nlabel = \"{}\"\nplaceholder = \"{}\"\nclearable = false\n# Earliest selectable day, YYYY-MM-DD.\n# min_date = \"2024-01-01\"\n# Initial value, YYYY-MM-DD.\n# value = \"2024-03-15\"\n\n[log]\nlevel = \"{}\"\n# Optional. Default is the platform state dir (for example ~/.local/state/datefield/datefield.log)\n# file = \"/absolute/path/to/datefield.log\"\n",
            path.display(),
            DEFAULT_LABEL,
            DISPLAY_LAYOUT,
            DEFAULT_LOG_LEVEL,
        )
    }
}

pub fn parse_config_date(raw: &str) -> Result<Date> {
    parse_iso(raw)
        .ok_or_else(|| anyhow!("invalid date {raw:?}; use {ISO_LAYOUT}, for example 2024-03-15"))
}

#[cfg(test)]
mod tests {
    use super::{Config, parse_config_date};
    use anyhow::Result;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use time::{Date, Month};

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.label(), "Date");
        assert_eq!(config.placeholder(), "MM/DD/YYYY");
        assert!(!config.clearable());
        assert_eq!(config.min_date()?, None);
        assert_eq!(config.log_level(), "info");
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[field]\nlabel = \"Due\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[field] and [log]"));
        Ok(())
    }

    #[test]
    fn v1_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[field]\nlabel = \"Due\"\nclearable = true\nmin_date = \"2024-01-01\"\nvalue = \"2024-03-15\"\n[log]\nlevel = \"debug\"\nfile = \"/tmp/datefield.log\"\n",
        )?;
        let config = Config::load(&path)?;
        assert_eq!(config.label(), "Due");
        assert!(config.clearable());
        assert_eq!(
            config.min_date()?,
            Some(Date::from_calendar_date(2024, Month::January, 1)?)
        );
        assert_eq!(config.value(), Some("2024-03-15"));
        assert_eq!(config.log_level(), "debug");
        assert_eq!(config.log_path()?, PathBuf::from("/tmp/datefield.log"));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn display_formatted_dates_are_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[field]\nmin_date = \"01/01/2024\"\n")?;
        let error = Config::load(&path).expect_err("display format should fail");
        let message = format!("{error:#}");
        assert!(message.contains("field.min_date"), "unexpected message: {message}");
        assert!(message.contains("YYYY-MM-DD"), "unexpected message: {message}");
        Ok(())
    }

    #[test]
    fn invalid_log_level_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[log]\nlevel = \"datefield=loud\"\n")?;
        let error = Config::load(&path).expect_err("bad filter should fail");
        assert!(error.to_string().contains("log.level"));
        Ok(())
    }

    #[test]
    fn empty_log_file_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[log]\nfile = \"  \"\n")?;
        let error = Config::load(&path).expect_err("empty log file should fail");
        assert!(error.to_string().contains("log.file"));
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("DATEFIELD_CONFIG_PATH", &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("DATEFIELD_CONFIG_PATH");
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn default_path_uses_config_toml_suffix_when_no_env_override() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var("DATEFIELD_CONFIG_PATH");
        }
        let resolved = Config::default_path()?;
        assert!(resolved.ends_with("datefield/config.toml"));
        Ok(())
    }

    #[test]
    fn parse_config_date_accepts_iso_only() -> Result<()> {
        assert_eq!(
            parse_config_date("2024-02-29")?,
            Date::from_calendar_date(2024, Month::February, 29)?
        );
        assert!(parse_config_date("2023-02-29").is_err());
        Ok(())
    }

    #[test]
    fn example_config_round_trips_through_loader() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        assert!(example.contains("version = 1"));
        assert!(example.contains("[field]"));
        assert!(example.contains("[log]"));

        std::fs::write(&path, example)?;
        let config = Config::load(&path)?;
        assert_eq!(config.label(), "Date");
        Ok(())
    }
}
