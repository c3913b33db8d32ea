//! Header normalization against an ordered synonym table
//!
//! Each header is lower-cased and trimmed, then renamed after the FIRST rule
//! whose pattern occurs in it. Rule order is part of the contract: "valor
//! total" contains both "valor" and "total", and resolves to whichever rule
//! comes first (unit price, in the default table).

use serde::Serialize;
use std::fmt;

/// Canonical import schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalColumn {
    Description,
    Quantity,
    UnitPrice,
    Total,
    Category,
    Lifespan,
}

impl CanonicalColumn {
    pub const ALL: [CanonicalColumn; 6] = [
        CanonicalColumn::Description,
        CanonicalColumn::Quantity,
        CanonicalColumn::UnitPrice,
        CanonicalColumn::Total,
        CanonicalColumn::Category,
        CanonicalColumn::Lifespan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalColumn::Description => "description",
            CanonicalColumn::Quantity => "quantity",
            CanonicalColumn::UnitPrice => "unit_price",
            CanonicalColumn::Total => "total",
            CanonicalColumn::Category => "category",
            CanonicalColumn::Lifespan => "lifespan",
        }
    }

    /// Exact canonical name (e.g. a header already called "unit_price")
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CanonicalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Headers containing `pattern` map to `column`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRule {
    pub pattern: String,
    pub column: CanonicalColumn,
}

impl ColumnRule {
    pub fn new(pattern: impl Into<String>, column: CanonicalColumn) -> Self {
        Self {
            pattern: pattern.into(),
            column,
        }
    }
}

/// The synonym table, in matching order
pub fn default_column_rules() -> Vec<ColumnRule> {
    use CanonicalColumn::*;

    [
        ("descrição", Description),
        ("descricao", Description),
        ("item", Description),
        ("produto", Description),
        ("designação", Description),
        ("quantidade", Quantity),
        ("qtd", Quantity),
        ("unidades", Quantity),
        ("preço unitário", UnitPrice),
        ("preco unitario", UnitPrice),
        ("preço", UnitPrice),
        ("valor", UnitPrice),
        ("custo", UnitPrice),
        ("valor unitário", UnitPrice),
        ("total", Total),
        ("valor total", Total),
        ("categoria", Category),
        ("tipo", Category),
        ("vida útil", Lifespan),
        ("vida util", Lifespan),
        ("anos", Lifespan),
    ]
    .into_iter()
    .map(|(pattern, column)| ColumnRule::new(pattern, column))
    .collect()
}

/// Canonical column -> source column position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    positions: [Option<usize>; 6],
}

impl ColumnMap {
    pub fn get(&self, column: CanonicalColumn) -> Option<usize> {
        self.positions[column.slot()]
    }

    pub fn contains(&self, column: CanonicalColumn) -> bool {
        self.get(column).is_some()
    }

    /// Source position of every mapped column, in schema order
    pub fn iter(&self) -> impl Iterator<Item = (CanonicalColumn, usize)> + '_ {
        CanonicalColumn::ALL
            .into_iter()
            .filter_map(|c| self.get(c).map(|pos| (c, pos)))
    }

    fn assign(&mut self, column: CanonicalColumn, position: usize) {
        self.positions[column.slot()] = Some(position);
    }

    fn release(&mut self, position: usize) {
        for slot in self.positions.iter_mut() {
            if *slot == Some(position) {
                *slot = None;
            }
        }
    }
}

/// Canonical name for one header, if any rule matches
pub fn classify_header(header: &str, rules: &[ColumnRule]) -> Option<CanonicalColumn> {
    let normalized = header.trim().to_lowercase();
    rules
        .iter()
        .find(|rule| normalized.contains(rule.pattern.as_str()))
        .map(|rule| rule.column)
        .or_else(|| CanonicalColumn::from_name(&normalized))
}

/// Map source headers onto the canonical schema.
///
/// When two headers resolve to the same canonical column the left-most one
/// is used. When nothing resolves to `description`, the first column is taken
/// as the description, whatever it was mapped to before.
pub fn map_headers(headers: &[String], rules: &[ColumnRule]) -> ColumnMap {
    let mut map = ColumnMap::default();

    for (position, header) in headers.iter().enumerate() {
        let Some(column) = classify_header(header, rules) else {
            continue;
        };
        if let Some(existing) = map.get(column) {
            log::warn!(
                "Column '{}' also maps to {}; keeping column '{}'",
                header,
                column,
                headers[existing]
            );
            continue;
        }
        map.assign(column, position);
    }

    if !map.contains(CanonicalColumn::Description) && !headers.is_empty() {
        log::debug!(
            "No description column found; using first column '{}'",
            headers[0]
        );
        map.release(0);
        map.assign(CanonicalColumn::Description, 0);
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn classify(header: &str) -> Option<CanonicalColumn> {
        classify_header(header, &default_column_rules())
    }

    #[test]
    fn test_synonyms() {
        assert_eq!(classify("Preço Unitário"), Some(CanonicalColumn::UnitPrice));
        assert_eq!(classify("  DESCRIÇÃO "), Some(CanonicalColumn::Description));
        assert_eq!(classify("Qtd."), Some(CanonicalColumn::Quantity));
        assert_eq!(classify("Categoria"), Some(CanonicalColumn::Category));
        assert_eq!(classify("Vida Útil (anos)"), Some(CanonicalColumn::Lifespan));
        assert_eq!(classify("Observações"), None);
    }

    #[test]
    fn test_first_match_wins() {
        // "valor" is declared before "total" and "valor total"
        assert_eq!(classify("Valor Total"), Some(CanonicalColumn::UnitPrice));
        // "valor" also shadows "valor unitário"
        assert_eq!(classify("Valor Unitário"), Some(CanonicalColumn::UnitPrice));
        // "item" comes before "tipo"
        assert_eq!(classify("Tipo de item"), Some(CanonicalColumn::Description));
        assert_eq!(classify("Total"), Some(CanonicalColumn::Total));
    }

    #[test]
    fn test_rule_order_is_caller_controlled() {
        let rules = vec![
            ColumnRule::new("valor total", CanonicalColumn::Total),
            ColumnRule::new("valor", CanonicalColumn::UnitPrice),
        ];
        assert_eq!(
            classify_header("Valor Total", &rules),
            Some(CanonicalColumn::Total)
        );
        assert_eq!(
            classify_header("Valor", &rules),
            Some(CanonicalColumn::UnitPrice)
        );
    }

    #[test]
    fn test_canonical_names_pass_through() {
        assert_eq!(classify("unit_price"), Some(CanonicalColumn::UnitPrice));
        assert_eq!(classify("Quantity"), Some(CanonicalColumn::Quantity));
    }

    #[test]
    fn test_map_headers() {
        let map = map_headers(
            &headers(&["Descrição", "Quantidade", "Preço Unitário", "Categoria"]),
            &default_column_rules(),
        );
        assert_eq!(map.get(CanonicalColumn::Description), Some(0));
        assert_eq!(map.get(CanonicalColumn::Quantity), Some(1));
        assert_eq!(map.get(CanonicalColumn::UnitPrice), Some(2));
        assert_eq!(map.get(CanonicalColumn::Category), Some(3));
        assert!(!map.contains(CanonicalColumn::Total));
    }

    #[test]
    fn test_duplicate_canonical_keeps_first() {
        let map = map_headers(
            &headers(&["Produto", "Preço", "Custo"]),
            &default_column_rules(),
        );
        assert_eq!(map.get(CanonicalColumn::UnitPrice), Some(1));
    }

    #[test]
    fn test_positional_description_fallback() {
        let map = map_headers(&headers(&["Nome", "Qtd"]), &default_column_rules());
        assert_eq!(map.get(CanonicalColumn::Description), Some(0));
        assert_eq!(map.get(CanonicalColumn::Quantity), Some(1));

        // The first column loses its previous meaning
        let map = map_headers(&headers(&["Qtd", "Preço"]), &default_column_rules());
        assert_eq!(map.get(CanonicalColumn::Description), Some(0));
        assert!(!map.contains(CanonicalColumn::Quantity));
        assert_eq!(map.get(CanonicalColumn::UnitPrice), Some(1));
    }

    #[test]
    fn test_no_headers() {
        let map = map_headers(&[], &default_column_rules());
        assert_eq!(map.iter().count(), 0);
    }
}
