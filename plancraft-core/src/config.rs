//! Configuration system for plan sheets, formulas and import

use crate::sheet::{DEFAULT_HEADERS, DEFAULT_TITLE};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sheets: SheetsConfig,
    #[serde(default)]
    pub formulas: FormulaConfig,
    #[serde(default)]
    pub rst: RstConfig,
    #[serde(default)]
    pub import: ImportConfig,
}

impl PlanConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: PlanConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Validate values against their allowed ranges and known formula ids
    pub fn validate(&self, known_formulas: &HashSet<String>) -> Result<()> {
        if self.storage.data_dir.as_os_str().is_empty() {
            anyhow::bail!("Configuration error: storage.data_dir must not be empty");
        }

        if self.formulas.last_year_column < 2 {
            anyhow::bail!(
                "Configuration error: formulas.last_year_column must be at least 2 (got {})",
                self.formulas.last_year_column
            );
        }

        for id in &self.formulas.disabled {
            if !known_formulas.contains(id) {
                anyhow::bail!(
                    "Configuration error: Unknown formula '{}' in formulas.disabled",
                    id
                );
            }
        }

        if !self.rst.percentage.is_finite() || self.rst.percentage < 0.0 {
            anyhow::bail!(
                "Configuration error: rst.percentage must be a non-negative number (got {})",
                self.rst.percentage
            );
        }

        if self.import.preview_rows == 0 {
            anyhow::bail!("Configuration error: import.preview_rows must be at least 1");
        }

        if self.import.default_lifespan == 0 {
            anyhow::bail!("Configuration error: import.default_lifespan must be at least 1");
        }

        if self.sheets.default_headers.is_empty() {
            anyhow::bail!("Configuration error: sheets.default_headers must not be empty");
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one JSON file per sheet
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
        }
    }
}

/// Layout given to sheets that were never saved
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetsConfig {
    pub default_title: String,
    pub default_headers: Vec<String>,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            default_title: DEFAULT_TITLE.to_string(),
            default_headers: DEFAULT_HEADERS.iter().map(|h| h.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormulaConfig {
    /// Last year column a formula fills (column 1 is the initial year)
    pub last_year_column: usize,
    /// Formula ids switched off
    pub disabled: HashSet<String>,
}

impl Default for FormulaConfig {
    fn default() -> Self {
        Self {
            last_year_column: 6,
            disabled: HashSet::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RstConfig {
    /// Share of revenue held as reserve; 0 selects the 1.5-month policy
    pub percentage: f64,
    /// Decimals used when displaying reserves
    pub decimals: usize,
}

impl Default for RstConfig {
    fn default() -> Self {
        Self {
            percentage: 0.0,
            decimals: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub default_sheet_key: String,
    pub default_category: String,
    pub unnamed_placeholder: String,
    pub preview_rows: usize,
    /// Amortization years when no category keyword matches
    pub default_lifespan: u32,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            default_sheet_key: "imported_items".to_string(),
            default_category: "Geral".to_string(),
            unnamed_placeholder: "Item sem nome".to_string(),
            preview_rows: 5,
            default_lifespan: 10,
        }
    }
}
