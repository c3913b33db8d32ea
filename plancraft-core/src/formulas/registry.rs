//! Formula registry for creating formula family instances

use super::*;
use crate::config::PlanConfig;
use std::collections::HashSet;

/// All formula ids known to the registry
pub fn all_formula_ids() -> HashSet<String> {
    create_all_formulas(&PlanConfig::default())
        .into_iter()
        .map(|f| f.id().to_string())
        .collect()
}

/// Create the formula families not disabled by configuration
pub fn create_enabled_formulas(config: &PlanConfig) -> Vec<Box<dyn Formula>> {
    create_all_formulas(config)
        .into_iter()
        .filter(|f| !config.formulas.disabled.contains(f.id()))
        .collect()
}

fn create_all_formulas(config: &PlanConfig) -> Vec<Box<dyn Formula>> {
    vec![Box::new(inflation::InflationIndexFormula::new(config))]
}
