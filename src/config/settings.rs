//! Application settings loaded from config.toml
//!
//! Every field is optional. A missing file yields the defaults: monthly cycles,
//! five recent transactions on the summary, and the built-in category catalog.
//!
//! ```toml
//! default_frequency = "WEEKLY"
//! recent_limit = 10
//!
//! [categories]
//! income = [{ code = "ALLOWANCE", display_name = "Allowance" }]
//! expense = [{ code = "FOOD", display_name = "Food" }]
//! ```

use crate::{
    core::{
        category::{CategoryCatalog, CategoryDef},
        cycle::Frequency,
    },
    errors::{Error, Result},
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Frequency used when an account is opened without one
    pub default_frequency: Frequency,
    /// How many recent transactions the summary shows
    pub recent_limit: usize,
    /// Replaces the built-in catalog when present
    pub categories: Option<CategoriesConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_frequency: Frequency::Monthly,
            recent_limit: 5,
            categories: None,
        }
    }
}

/// The `[categories]` table
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CategoriesConfig {
    pub income: Vec<CategoryDef>,
    pub expense: Vec<CategoryDef>,
}

impl AppConfig {
    /// Category catalog described by this configuration.
    ///
    /// # Errors
    /// `Error::Config` if the configured lists are empty or contain duplicate codes.
    pub fn catalog(&self) -> Result<CategoryCatalog> {
        match &self.categories {
            None => Ok(CategoryCatalog::default()),
            Some(categories) => {
                if categories.income.is_empty() || categories.expense.is_empty() {
                    return Err(Error::Config {
                        message: "both income and expense category lists must be non-empty"
                            .to_string(),
                    });
                }
                CategoryCatalog::new(categories.income.clone(), categories.expense.clone())
            }
        }
    }
}

/// Loads the configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path);
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;

    parse_config(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path.display()),
    })
}

fn parse_config(contents: &str) -> std::result::Result<AppConfig, toml::de::Error> {
    toml::from_str(contents)
}

/// Loads the configuration named by `LEDGER_CONFIG`, or `./config.toml`.
///
/// An explicitly named file must exist; the default file is optional and the built-in
/// defaults are used without it.
pub fn load_app_configuration() -> Result<AppConfig> {
    if let Ok(path) = std::env::var("LEDGER_CONFIG") {
        return load_config(PathBuf::from(path));
    }

    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        load_config(default_path)
    } else {
        info!("No {} found, using built-in defaults", DEFAULT_CONFIG_PATH);
        Ok(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::category::TransactionKind;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.catalog().unwrap(), CategoryCatalog::default());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            default_frequency = "BIWEEKLY"
            recent_limit = 10

            [categories]
            income = [
                { code = "pocket money", display_name = "Pocket Money" },
            ]
            expense = [
                { code = "SNACKS", display_name = "Snacks" },
                { code = "BOOKS", display_name = "Books" },
            ]
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.default_frequency, Frequency::Biweekly);
        assert_eq!(config.recent_limit, 10);

        let catalog = config.catalog().unwrap();
        assert_eq!(
            catalog.resolve(TransactionKind::Income, "Pocket Money").unwrap().code,
            "POCKET_MONEY"
        );
        assert!(catalog.resolve(TransactionKind::Expense, "FOOD").is_err());
    }

    #[test]
    fn test_empty_category_list_is_rejected() {
        let toml_str = r"
            [categories]
            income = []
            expense = []
        ";
        let config = parse_config(toml_str).unwrap();
        assert!(matches!(config.catalog(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(parse_config("rollover_day = 3").is_err());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = load_config("does/not/exist.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
