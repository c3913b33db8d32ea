//! Output formatters for sheets, records and reports

use anyhow::Result;
use colored::*;
use plancraft_core::import::{ImportReport, ImportSummary};
use plancraft_core::records::{Equipment, Project};
use plancraft_core::rst::DEFAULT_RESERVE_MONTHS;
use plancraft_core::tax::TaxSettings;
use plancraft_core::{DerivedValues, Sheet, UpdateOutcome, UpsertKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a sheet as an aligned table
pub fn print_sheet(name: &str, sheet: &Sheet) {
    println!("{} {}", "Sheet:".bold(), name.cyan().bold());
    if !sheet.title.is_empty() {
        println!("{}", sheet.title.bold());
    }
    if !sheet.subtitle.is_empty() {
        println!("{}", sheet.subtitle);
    }
    println!();

    if sheet.rows.is_empty() {
        println!("{}", "(no rows)".bright_black());
        return;
    }

    let columns = sheet
        .rows
        .iter()
        .map(|r| r.len())
        .chain(std::iter::once(sheet.headers.len()))
        .max()
        .unwrap_or(0);
    let header = |i: usize| sheet.headers.get(i).map(String::as_str).unwrap_or("");

    let mut widths: Vec<usize> = (0..columns).map(|i| header(i).chars().count()).collect();
    for row in &sheet.rows {
        for (i, cell) in row.to_wire().iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        (0..columns)
            .map(|i| {
                let cell = cells.get(i).copied().unwrap_or("");
                format!("{:width$}", cell, width = widths[i])
            })
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("{}", line((0..columns).map(header).collect()).bold().underline());
    for row in &sheet.rows {
        println!("{}", line(row.to_wire()));
    }
}

pub fn print_update(sheet: &str, row: &str, column: usize, outcome: &UpdateOutcome) {
    let action = match outcome.upsert {
        UpsertKind::Updated => "Updated".green().bold(),
        UpsertKind::Inserted => "Inserted".green().bold(),
    };
    println!(
        "{} {}[{}] column {} (row {})",
        action,
        sheet.cyan(),
        row,
        column,
        outcome.row_index
    );
    print_derived(&outcome.calculated_values);
}

pub fn print_derived(values: &DerivedValues) {
    if values.is_empty() {
        println!("{}", "No derived values".bright_black());
        return;
    }
    println!("{}", "Derived values:".bold().underline());
    for (key, value) in values {
        println!("  {} {}", key.yellow(), value);
    }
}

pub fn print_rst(values: &BTreeMap<String, String>, percentage: f64) {
    let policy = if percentage > 0.0 {
        format!("{}% of revenue", percentage)
    } else {
        format!("{} months of revenue", DEFAULT_RESERVE_MONTHS)
    };
    println!("{} {}", "Treasury safety reserve:".bold(), policy.bright_black());
    for (year, value) in values {
        println!("  {} {}", year.cyan(), value);
    }
}

pub fn print_import(report: &ImportReport, summary: Option<&ImportSummary>) {
    println!(
        "{} {} items, total {}",
        "Parsed".bold(),
        report.count,
        report.total_formatted.green().bold()
    );
    println!();
    println!("{}", "Preview:".bold().underline());
    for item in &report.preview {
        println!(
            "  {} x{} @ {} = {} [{}; {} years]",
            item.description.cyan(),
            item.quantity,
            item.unit_price,
            item.total,
            item.category,
            item.lifespan_years
        );
    }

    if let Some(summary) = summary {
        println!();
        println!("{}", summary.message().green().bold());
        for failure in &summary.failures {
            println!("  {} {}", "FAILED".red().bold(), failure);
        }
    }
}

pub fn import_json(report: &ImportReport, summary: Option<&ImportSummary>) -> serde_json::Value {
    let mut output = serde_json::json!({
        "success": true,
        "count": report.count,
        "items": report.items,
        "preview": report.preview,
        "totalValue": report.total_value,
        "totalFormatted": report.total_formatted,
    });
    if let Some(summary) = summary {
        output["message"] = summary.message().into();
        output["savedCount"] = summary.saved.into();
        output["sheetKey"] = summary.sheet_key.clone().into();
        output["sheetName"] = summary.sheet_name.clone().into();
        output["currency"] = summary.currency.clone().into();
        output["failures"] = summary
            .failures
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .into();
    }
    output
}

pub fn print_projects(projects: &[Project]) {
    if projects.is_empty() {
        println!("{}", "No projects".bright_black());
        return;
    }
    for project in projects {
        print_project(project);
    }
}

pub fn print_project(project: &Project) {
    println!(
        "{} {} ({}, {} years from {}) {}",
        format!("#{}", project.id).bright_black(),
        project.name.cyan().bold(),
        project.currency,
        project.num_years,
        project.first_year,
        format!("updated {}", project.updated_at.format("%Y-%m-%d %H:%M")).bright_black()
    );
}

pub fn print_equipment(items: &[Equipment]) {
    if items.is_empty() {
        println!("{}", "No equipment".bright_black());
        return;
    }
    for item in items {
        println!(
            "{} {} {}",
            format!("#{}", item.id).bright_black(),
            item.equipment_name.cyan(),
            item.ano0
        );
        for (year, value) in &item.year_values {
            println!("    {} {}", year.yellow(), value);
        }
    }
}

pub fn replaced_message(count: usize) -> String {
    format!("{} equipamento(s) salvo(s) com sucesso!", count)
}

pub fn print_replaced(items: &[Equipment]) {
    println!("{}", replaced_message(items.len()).green().bold());
    print_equipment(items);
}

pub fn print_tax(settings: &TaxSettings) {
    println!("{} {}", settings.name.cyan().bold(), settings.currency.bright_black());
    println!("{}", "Taxes:".bold().underline());
    for (name, rate) in settings.taxes {
        println!("  {} {}%", name, rate);
    }
    println!("{}", "Depreciation rates:".bold().underline());
    for (class, rate) in settings.depreciation_rates {
        println!("  {} {}%", class, rate);
    }
    println!("{}", "Depreciation periods:".bold().underline());
    for (class, years) in settings.depreciation_years {
        println!("  {} {} years", class, years);
    }
}
