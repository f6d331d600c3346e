//! Configuration management for complaint-lens
//!
//! Settings come from built-in defaults, an optional TOML file and
//! environment variables, in that order of increasing precedence.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::analytics::{ExportOptions, MatchMode};
use crate::models::Category;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Analysis configuration
    pub analysis: AnalysisConfig,

    /// Export configuration
    pub export: ExportOptions,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Category definitions, in report order
    pub categories: Vec<CategoryConfig>,
}

/// Analysis-specific configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Keyword match mode (word, substring)
    pub match_mode: MatchMode,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

/// One category as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Identifier used as report key
    pub name: String,

    /// Display label; defaults to the name
    #[serde(default)]
    pub label: String,

    /// Worksheet name for exports; defaults to the sanitized label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet_name: Option<String>,

    /// Keyword fragments
    pub keywords: Vec<String>,
}

impl CategoryConfig {
    fn new(name: &str, label: &str, sheet_name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            sheet_name: Some(sheet_name.to_string()),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Validate and convert into a [`Category`]
    pub fn build(&self) -> Result<Category> {
        let category = Category::new(&self.name, &self.label, &self.keywords)
            .with_context(|| format!("Invalid category '{}'", self.name))?;

        Ok(match &self.sheet_name {
            Some(sheet) if !sheet.trim().is_empty() => category.with_sheet_name(sheet),
            _ => category,
        })
    }
}

/// Built-in reception / administrator category
fn admin_category() -> CategoryConfig {
    CategoryConfig::new(
        "admin",
        "Регистратура / Администратор",
        "Регистратура_Администратор",
        &[
            "регистрат",
            "администрат",
            "ресепш",
            "не приняли",
            "ошибка при записи",
            "в регистратуре",
            "в регистратуру",
            "кассир",
            "касса",
        ],
    )
}

/// Built-in waiting / queue category
fn wait_category() -> CategoryConfig {
    CategoryConfig::new(
        "wait",
        "Ожидание / Очередь",
        "Ожидание_Очередь",
        &[
            "очеред",
            "ожидан",
            "ждать",
            "задерж",
            "поздно",
            "долго",
            "задержка",
            "задержали",
            "долго не",
        ],
    )
}

fn env_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        config.with_env_overrides()
    }

    /// Apply `COMPLAINT_LENS_*` environment variables
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(mode) = std::env::var("COMPLAINT_LENS_MATCH_MODE") {
            self.analysis.match_mode = mode
                .parse()
                .map_err(anyhow::Error::msg)
                .context("Invalid COMPLAINT_LENS_MATCH_MODE")?;
        }

        if let Ok(level) = std::env::var("COMPLAINT_LENS_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = std::env::var("COMPLAINT_LENS_LOG_FORMAT") {
            self.logging.format = format;
        }

        if let Ok(flag) = std::env::var("COMPLAINT_LENS_INCLUDE_DATES") {
            self.export.include_derived_dates = env_flag(&flag).with_context(|| {
                format!("Invalid COMPLAINT_LENS_INCLUDE_DATES value: {flag}")
            })?;
        }

        Ok(self)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            anyhow::bail!("at least one category must be configured");
        }

        let mut names = std::collections::HashSet::new();
        for category in &self.categories {
            if !names.insert(category.name.trim()) {
                anyhow::bail!("duplicate category name: {}", category.name);
            }
            category.build()?;
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("log format must be 'text' or 'json', got '{}'", self.logging.format);
        }

        Ok(())
    }

    /// Build the validated category list
    pub fn build_categories(&self) -> Result<Vec<Category>> {
        self.validate()?;
        self.categories.iter().map(CategoryConfig::build).collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            export: ExportOptions::default(),
            logging: LoggingConfig::default(),
            categories: vec![admin_category(), wait_category()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.analysis.match_mode, MatchMode::Word);
        assert!(!config.export.include_derived_dates);
    }

    #[test]
    fn test_default_categories() {
        let categories = Config::default().build_categories().unwrap();
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].name(), "admin");
        assert_eq!(categories[0].sheet_name(), "Регистратура_Администратор");
        assert_eq!(categories[0].keywords().len(), 9);
        assert_eq!(categories[1].label(), "Ожидание / Очередь");
        assert!(categories[1].keywords().contains(&"долго не".to_string()));
    }

    #[test]
    fn test_empty_keywords_rejected() {
        let mut config = Config::default();
        config.categories[1].keywords = vec!["  ".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut config = Config::default();
        config.categories[1].name = "admin".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_no_categories_rejected() {
        let mut config = Config::default();
        config.categories.clear();
        assert!(config.build_categories().is_err());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [analysis]
            match_mode = "substring"

            [[categories]]
            name = "billing"
            keywords = ["счет", "оплат"]
            "#,
        )
        .unwrap();

        assert_eq!(config.analysis.match_mode, MatchMode::Substring);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.categories.len(), 1);

        let categories = config.build_categories().unwrap();
        assert_eq!(categories[0].label(), "billing");
        assert_eq!(categories[0].sheet_name(), "billing");
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var("COMPLAINT_LENS_MATCH_MODE", "substring");
        std::env::set_var("COMPLAINT_LENS_INCLUDE_DATES", "yes");
        std::env::set_var("COMPLAINT_LENS_LOG_FORMAT", "json");

        let config = Config::from_env().unwrap();

        std::env::remove_var("COMPLAINT_LENS_MATCH_MODE");
        std::env::remove_var("COMPLAINT_LENS_INCLUDE_DATES");
        std::env::remove_var("COMPLAINT_LENS_LOG_FORMAT");

        assert_eq!(config.analysis.match_mode, MatchMode::Substring);
        assert!(config.export.include_derived_dates);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    #[serial]
    fn test_invalid_env_match_mode() {
        std::env::set_var("COMPLAINT_LENS_MATCH_MODE", "fuzzy");
        let result = Config::from_env();
        std::env::remove_var("COMPLAINT_LENS_MATCH_MODE");
        assert!(result.is_err());
    }
}
