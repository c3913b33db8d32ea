//! INFLATION: compounding inflation index on the assumptions sheet
//!
//! `index[c] = (1 + rate[c] / 100) * index[c - 1]` folded left to right over
//! the year columns, seeded from column 1 of the index row.

use super::{DerivedValues, Formula, derived_key};
use crate::config::PlanConfig;
use crate::number::{format_decimal, parse_optional, parse_value};
use crate::sheet::Sheet;
use std::collections::HashMap;

/// The assumptions sheet name
pub const ASSUMPTIONS_SHEET: &str = "pressupostos";
pub const INDEX_ROW: &str = "Índice de Inflação";
pub const RATE_ROW: &str = "Taxa de Inflação";

const FIRST_YEAR_COLUMN: usize = 2;
const DECIMALS: usize = 4;

/// One compounding step; `rate` is a percentage (2.5 means 2.5%)
pub fn inflation_step(rate: f64, previous_index: f64) -> f64 {
    (1.0 + rate / 100.0) * previous_index
}

pub struct InflationIndexFormula {
    last_year_column: usize,
}

impl InflationIndexFormula {
    pub fn new(config: &PlanConfig) -> Self {
        Self {
            last_year_column: config.formulas.last_year_column,
        }
    }
}

impl Default for InflationIndexFormula {
    fn default() -> Self {
        Self {
            last_year_column: 6,
        }
    }
}

impl Formula for InflationIndexFormula {
    fn id(&self) -> &str {
        "INFLATION"
    }

    fn name(&self) -> &str {
        "Inflation index"
    }

    fn applies_to(&self, sheet_name: &str) -> bool {
        sheet_name == ASSUMPTIONS_SHEET
    }

    fn evaluate(&self, sheet: &Sheet, index: &HashMap<&str, usize>) -> DerivedValues {
        let mut values = DerivedValues::new();

        let (Some(&index_pos), Some(&rate_pos)) = (index.get(INDEX_ROW), index.get(RATE_ROW))
        else {
            return values;
        };
        let index_row = &sheet.rows[index_pos];
        let rate_row = &sheet.rows[rate_pos];

        // A row without column 1 seeds a neutral index; a blank cell reads as 0
        let mut previous = match index_row.cells.first() {
            None => 1.0,
            Some(cell) => parse_optional(cell.as_deref()),
        };

        let end = (self.last_year_column + 1).min(rate_row.len());
        for column in FIRST_YEAR_COLUMN..end {
            let rate = rate_row.get(column).map(parse_value).unwrap_or(0.0);
            let current = inflation_step(rate, previous);
            values.insert(
                derived_key(INDEX_ROW, column),
                format_decimal(current, DECIMALS),
            );
            previous = current;
        }

        values
    }
}
