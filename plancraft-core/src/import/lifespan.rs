//! Amortization lifespan inferred from an item's category

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Categories containing any keyword amortize over `years`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifespanRule {
    pub keywords: Vec<String>,
    pub years: u32,
}

impl LifespanRule {
    pub fn new(keywords: &[&str], years: u32) -> Self {
        Self {
            keywords: keywords.iter().map(|k| fold(k)).collect(),
            years,
        }
    }

    fn matches(&self, folded_category: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| folded_category.contains(k.as_str()))
    }
}

/// Rules in matching order; the first rule with a matching keyword wins
pub fn default_lifespan_rules() -> Vec<LifespanRule> {
    vec![
        LifespanRule::new(&["informatic", "computador", "computer"], 4),
        LifespanRule::new(
            &["mobiliari", "mesa", "cadeira", "furniture", "table", "chair"],
            10,
        ),
        LifespanRule::new(&["veiculo", "viatura", "vehicle"], 4),
        LifespanRule::new(&["maquinaria", "equipamento", "machinery", "equipment"], 8),
    ]
}

/// Years of amortization for `category`, or `default_years` when no rule matches.
/// Matching ignores case and accents ("Informática" hits "informatic").
pub fn infer_lifespan(category: &str, rules: &[LifespanRule], default_years: u32) -> u32 {
    let folded = fold(category);
    rules
        .iter()
        .find(|rule| rule.matches(&folded))
        .map(|rule| rule.years)
        .unwrap_or(default_years)
}

fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lifespan(category: &str) -> u32 {
        infer_lifespan(category, &default_lifespan_rules(), 10)
    }

    #[test]
    fn test_category_keywords() {
        assert_eq!(lifespan("Informática"), 4);
        assert_eq!(lifespan("Computadores portáteis"), 4);
        assert_eq!(lifespan("Mobiliário"), 10);
        assert_eq!(lifespan("Veículo ligeiro"), 4);
        assert_eq!(lifespan("VIATURAS"), 4);
        assert_eq!(lifespan("Maquinaria industrial"), 8);
        assert_eq!(lifespan("Equipamento básico"), 8);
    }

    #[test]
    fn test_default_lifespan() {
        assert_eq!(lifespan("Geral"), 10);
        assert_eq!(lifespan(""), 10);
        assert_eq!(infer_lifespan("Diversos", &default_lifespan_rules(), 6), 6);
    }

    #[test]
    fn test_first_rule_wins() {
        // Matches both the computer and the equipment rule
        assert_eq!(lifespan("Equipamento informático"), 4);
        // Matches both the furniture and the equipment rule
        assert_eq!(lifespan("Equipamento de mesa"), 10);
    }
}
