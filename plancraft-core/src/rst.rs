//! Treasury safety reserve (RST, "Reserva de Segurança de Tesouraria")
//!
//! The minimum cash buffer against late receipts or early payments, derived
//! from yearly revenue.

use crate::number::{format_decimal, parse_optional};
use crate::sheet::Sheet;
use std::collections::BTreeMap;

/// Months of average monthly revenue held when no percentage is configured
pub const DEFAULT_RESERVE_MONTHS: f64 = 1.5;

/// Row labels that count as revenue
pub const REVENUE_MARKERS: [&str; 2] = ["Rendimentos", "Vendas"];

const LAST_YEAR_COLUMN: usize = 6;

/// Reserve per year.
///
/// With `percentage > 0` the reserve is that share of the year's revenue;
/// otherwise it is 1.5 months of average monthly revenue.
pub fn calculate_rst(revenues: &BTreeMap<String, f64>, percentage: f64) -> BTreeMap<String, f64> {
    revenues
        .iter()
        .map(|(year, revenue)| {
            let reserve = if percentage > 0.0 {
                revenue * (percentage / 100.0)
            } else {
                (revenue / 12.0) * DEFAULT_RESERVE_MONTHS
            };
            (year.clone(), reserve)
        })
        .collect()
}

/// Sum every revenue row of `sheet` per year column into `"Ano N"` keys
pub fn revenues_from_sheet(sheet: &Sheet) -> BTreeMap<String, f64> {
    let mut revenues = BTreeMap::new();
    for row in &sheet.rows {
        if !REVENUE_MARKERS.iter().any(|m| row.label.contains(m)) {
            continue;
        }
        let end = row.len().min(LAST_YEAR_COLUMN + 1);
        for column in 1..end {
            *revenues.entry(format!("Ano {}", column)).or_insert(0.0) +=
                parse_optional(row.get(column));
        }
    }
    revenues
}

/// Render reserves for display
pub fn format_rst(values: &BTreeMap<String, f64>, decimals: usize) -> BTreeMap<String, String> {
    values
        .iter()
        .map(|(year, v)| (year.clone(), format_decimal(*v, decimals)))
        .collect()
}
