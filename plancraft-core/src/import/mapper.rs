//! Table rows -> canonical import rows

use super::columns::{CanonicalColumn, ColumnMap, ColumnRule, default_column_rules, map_headers};
use super::lifespan::{LifespanRule, default_lifespan_rules, infer_lifespan};
use super::table::{Table, TableCell};
use super::ImportError;
use crate::config::ImportConfig;
use crate::number::{format_grouped_decimal, parse_number};
use serde::Serialize;

/// One normalized line item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportRow {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    /// Always `quantity * unit_price`
    pub total: f64,
    pub category: String,
    pub lifespan_years: u32,
}

/// Outcome of mapping one table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportReport {
    pub count: usize,
    pub items: Vec<ImportRow>,
    pub preview: Vec<ImportRow>,
    pub total_value: f64,
    pub total_formatted: String,
}

impl ImportReport {
    fn new(items: Vec<ImportRow>, preview_rows: usize) -> Self {
        let total_value: f64 = items.iter().map(|i| i.total).sum();
        Self {
            count: items.len(),
            preview: items.iter().take(preview_rows).cloned().collect(),
            total_formatted: format_grouped_decimal(total_value),
            total_value,
            items,
        }
    }
}

/// Maps tables onto the canonical schema with explicit rule tables
#[derive(Debug, Clone)]
pub struct ColumnMapper {
    column_rules: Vec<ColumnRule>,
    lifespan_rules: Vec<LifespanRule>,
    options: ImportConfig,
}

impl ColumnMapper {
    /// Mapper using the default synonym and lifespan tables
    pub fn new(options: ImportConfig) -> Self {
        Self::with_rules(default_column_rules(), default_lifespan_rules(), options)
    }

    pub fn with_rules(
        column_rules: Vec<ColumnRule>,
        lifespan_rules: Vec<LifespanRule>,
        options: ImportConfig,
    ) -> Self {
        Self {
            column_rules,
            lifespan_rules,
            options,
        }
    }

    pub fn options(&self) -> &ImportConfig {
        &self.options
    }

    /// Normalize every data row of `table`.
    ///
    /// Fails only when the table has no columns or no rows; bad cells fall
    /// back to defaults instead of failing their row.
    pub fn map(&self, table: &Table) -> Result<ImportReport, ImportError> {
        table.ensure_not_empty()?;

        let columns = map_headers(&table.headers, &self.column_rules);
        let items: Vec<ImportRow> = (0..table.rows.len())
            .map(|row| self.map_row(table, &columns, row))
            .collect();

        log::info!(
            "Mapped {} import rows ({} columns recognized)",
            items.len(),
            columns.iter().count()
        );
        Ok(ImportReport::new(items, self.options.preview_rows))
    }

    fn map_row(&self, table: &Table, columns: &ColumnMap, row: usize) -> ImportRow {
        let cell = |column: CanonicalColumn| columns.get(column).map(|pos| table.cell(row, pos));

        let description = match cell(CanonicalColumn::Description) {
            Some(c) if !c.is_blank() => c.to_text().trim().to_string(),
            _ => self.options.unnamed_placeholder.clone(),
        };

        // Without a quantity column every row counts once
        let raw_quantity = match cell(CanonicalColumn::Quantity) {
            Some(c) => numeric(c),
            None => Some(1.0),
        };
        let quantity = raw_quantity.unwrap_or(1.0);

        let unit_price = match cell(CanonicalColumn::UnitPrice) {
            Some(c) => numeric(c),
            None => match (cell(CanonicalColumn::Total).and_then(numeric), raw_quantity) {
                (Some(total), Some(qty)) => Some(total / qty).filter(|v| v.is_finite()),
                _ => None,
            },
        }
        .unwrap_or(0.0);

        let category = match cell(CanonicalColumn::Category) {
            Some(c) if !c.is_blank() => c.to_text().trim().to_string(),
            _ => self.options.default_category.clone(),
        };

        let lifespan_years = cell(CanonicalColumn::Lifespan)
            .and_then(numeric)
            .filter(|years| *years >= 1.0)
            .map(|years| years.round() as u32)
            .unwrap_or_else(|| {
                infer_lifespan(
                    &category,
                    &self.lifespan_rules,
                    self.options.default_lifespan,
                )
            });

        ImportRow {
            description,
            quantity,
            unit_price,
            total: quantity * unit_price,
            category,
            lifespan_years,
        }
    }
}

impl Default for ColumnMapper {
    fn default() -> Self {
        Self::new(ImportConfig::default())
    }
}

/// Numeric coercion: invalid or blank cells are `None`
fn numeric(cell: &TableCell) -> Option<f64> {
    match cell {
        TableCell::Number(n) if n.is_finite() => Some(*n),
        TableCell::Text(s) => {
            let parsed = parse_number(s);
            parsed.valid.then_some(parsed.value)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> TableCell {
        TableCell::Text(s.to_string())
    }

    fn num(n: f64) -> TableCell {
        TableCell::Number(n)
    }

    fn table(headers: &[&str], rows: Vec<Vec<TableCell>>) -> Table {
        Table::new(headers.iter().map(|h| h.to_string()).collect(), rows)
    }

    #[test]
    fn test_full_schema() {
        let report = ColumnMapper::default()
            .map(&table(
                &["Descrição", "Quantidade", "Preço Unitário", "Categoria"],
                vec![
                    vec![text("Exemplo Item A"), num(10.0), num(5000.0), text("Mobiliário")],
                    vec![text("Exemplo Item B"), num(5.0), num(15000.0), text("Informática")],
                ],
            ))
            .unwrap();

        assert_eq!(report.count, 2);
        assert_eq!(report.items[0].total, 50000.0);
        assert_eq!(report.items[0].lifespan_years, 10);
        assert_eq!(report.items[1].total, 75000.0);
        assert_eq!(report.items[1].lifespan_years, 4);
        assert_eq!(report.total_value, 125000.0);
        assert_eq!(report.total_formatted, "125.000,00");
    }

    #[test]
    fn test_missing_quantity_defaults_to_one() {
        let report = ColumnMapper::default()
            .map(&table(&["Produto", "Preço"], vec![vec![text("Forno"), num(250.5)]]))
            .unwrap();

        let item = &report.items[0];
        assert_eq!(item.quantity, 1.0);
        assert_eq!(item.unit_price, 250.5);
        assert_eq!(item.total, 250.5);
        assert_eq!(item.category, "Geral");
        assert_eq!(item.lifespan_years, 10);
        assert_eq!(report.total_formatted, "250,50");
    }

    #[test]
    fn test_unit_price_from_total() {
        let report = ColumnMapper::default()
            .map(&table(
                &["Item", "Qtd", "Total"],
                vec![
                    vec![text("Cadeira"), num(4.0), num(400.0)],
                    vec![text("Mesa"), text("x"), num(300.0)],
                    vec![text("Armário"), num(0.0), num(300.0)],
                ],
            ))
            .unwrap();

        assert_eq!(report.items[0].unit_price, 100.0);
        assert_eq!(report.items[0].total, 400.0);
        // Invalid quantity: unit price cannot be derived, quantity falls back to 1
        assert_eq!(report.items[1].quantity, 1.0);
        assert_eq!(report.items[1].unit_price, 0.0);
        // Division by zero is not a price
        assert_eq!(report.items[2].unit_price, 0.0);
    }

    #[test]
    fn test_total_recomputed_from_quantity_and_price() {
        let report = ColumnMapper::default()
            .map(&table(
                &["Designação", "Unidades", "Custo", "Total"],
                vec![vec![text("Forno"), num(2.0), num(10.0), num(999.0)]],
            ))
            .unwrap();
        assert_eq!(report.items[0].total, 20.0);
    }

    #[test]
    fn test_blank_cells_use_defaults() {
        let report = ColumnMapper::default()
            .map(&table(
                &["Descrição", "Quantidade", "Preço unitário", "Tipo"],
                vec![vec![text("  "), TableCell::Empty, text("n/a"), TableCell::Empty]],
            ))
            .unwrap();

        let item = &report.items[0];
        assert_eq!(item.description, "Item sem nome");
        assert_eq!(item.quantity, 1.0);
        assert_eq!(item.unit_price, 0.0);
        assert_eq!(item.category, "Geral");
    }

    #[test]
    fn test_text_numbers_are_coerced() {
        let report = ColumnMapper::default()
            .map(&table(
                &["Descrição", "Quantidade", "Preço"],
                vec![vec![text("Viatura"), text("2"), text("1.234,50")]],
            ))
            .unwrap();
        assert_eq!(report.items[0].unit_price, 1234.5);
        assert_eq!(report.items[0].total, 2469.0);
        assert_eq!(report.total_formatted, "2.469,00");
    }

    #[test]
    fn test_lifespan_column_overrides_category() {
        let report = ColumnMapper::default()
            .map(&table(
                &["Descrição", "Categoria", "Vida útil"],
                vec![
                    vec![text("Servidor"), text("Informática"), num(6.0)],
                    vec![text("Portátil"), text("Informática"), TableCell::Empty],
                ],
            ))
            .unwrap();
        assert_eq!(report.items[0].lifespan_years, 6);
        assert_eq!(report.items[1].lifespan_years, 4);
    }

    #[test]
    fn test_preview_is_first_rows() {
        let rows = (0..8)
            .map(|i| vec![text(&format!("Item {}", i)), num(1.0)])
            .collect();
        let report = ColumnMapper::default()
            .map(&table(&["Descrição", "Preço"], rows))
            .unwrap();
        assert_eq!(report.count, 8);
        assert_eq!(report.preview.len(), 5);
        assert_eq!(report.preview[4].description, "Item 4");
    }

    #[test]
    fn test_positional_description() {
        let report = ColumnMapper::default()
            .map(&table(&["Nome", "Qtd"], vec![vec![num(123.0), num(3.0)]]))
            .unwrap();
        assert_eq!(report.items[0].description, "123");
        assert_eq!(report.items[0].quantity, 3.0);
    }

    #[test]
    fn test_aggregate_below_threshold() {
        let report = ColumnMapper::default()
            .map(&table(&["Descrição", "Preço"], vec![vec![text("Cadeira"), num(999.99)]]))
            .unwrap();
        assert_eq!(report.total_formatted, "999,99");
    }

    #[test]
    fn test_empty_table_is_rejected() {
        let mapper = ColumnMapper::default();
        assert!(matches!(
            mapper.map(&table(&["Descrição"], Vec::new())),
            Err(ImportError::Empty)
        ));
        assert!(matches!(
            mapper.map(&Table::default()),
            Err(ImportError::NoColumns)
        ));
    }
}
