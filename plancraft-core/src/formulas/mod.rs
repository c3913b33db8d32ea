//! Formula recalculation
//!
//! Derived cells are computed from the current rows and returned keyed by
//! `"<row label>-<column index>"`. They are never written back into the
//! sheet: storage keeps the raw user input.

pub mod inflation;
pub mod registry;

use crate::config::PlanConfig;
use crate::sheet::Sheet;
use std::collections::{BTreeMap, HashMap};

/// Formatted derived values keyed by `"<label>-<column>"`
pub type DerivedValues = BTreeMap<String, String>;

/// Key under which a derived cell is reported
pub fn derived_key(label: &str, column: usize) -> String {
    format!("{}-{}", label, column)
}

/// Trait implemented by every formula family
pub trait Formula: Send + Sync {
    /// Unique identifier (e.g., "INFLATION")
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Whether this family computes anything for the named sheet
    fn applies_to(&self, sheet_name: &str) -> bool;

    /// Compute derived values; `index` maps row labels to row positions
    fn evaluate(&self, sheet: &Sheet, index: &HashMap<&str, usize>) -> DerivedValues;
}

/// Runs the enabled formula families against sheets
pub struct Recalculator {
    formulas: Vec<Box<dyn Formula>>,
}

impl Recalculator {
    /// Recalculator with default configuration
    pub fn new() -> Self {
        Self::with_config(&PlanConfig::default())
    }

    pub fn with_config(config: &PlanConfig) -> Self {
        Self {
            formulas: registry::create_enabled_formulas(config),
        }
    }

    /// Derived values for `sheet`; empty for sheets no family understands
    pub fn recalculate(&self, sheet_name: &str, sheet: &Sheet) -> DerivedValues {
        let applicable: Vec<_> = self
            .formulas
            .iter()
            .filter(|f| f.applies_to(sheet_name))
            .collect();
        if applicable.is_empty() {
            return DerivedValues::new();
        }

        let index = sheet.label_index();
        let mut values = DerivedValues::new();
        for formula in applicable {
            let computed = formula.evaluate(sheet, &index);
            log::debug!(
                "{} produced {} values for '{}'",
                formula.id(),
                computed.len(),
                sheet_name
            );
            values.extend(computed);
        }
        values
    }
}

impl Default for Recalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Recalculate with the default formula set
pub fn recalculate(sheet_name: &str, sheet: &Sheet) -> DerivedValues {
    Recalculator::new().recalculate(sheet_name, sheet)
}
