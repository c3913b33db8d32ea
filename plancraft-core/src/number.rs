//! Locale-aware parsing and formatting of cell values
//!
//! Cells travel as free text ("€ 1.234,56", "2,5%", "1000"), so every numeric
//! read goes through [`parse_value`], which never fails: malformed text is
//! read as zero. Callers that must tell "zero" apart from "unparseable" use
//! [`parse_number`] instead.

use serde::Serialize;

/// Result of a strict parse
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParsedNumber {
    pub value: f64,
    /// False when the text held no readable number (value is then 0)
    pub valid: bool,
}

impl ParsedNumber {
    const INVALID: ParsedNumber = ParsedNumber {
        value: 0.0,
        valid: false,
    };

    fn valid(value: f64) -> Self {
        Self { value, valid: true }
    }
}

/// Parse cell text, reporting whether it actually held a number
///
/// Whitespace and percent signs are dropped anywhere; currency glyphs or codes
/// are dropped from both ends. Decimal separator resolution:
/// - both `.` and `,` present: the right-most one is decimal, the other groups
/// - a single `.` or `,`: decimal separator
/// - repeated `.` or repeated `,`: thousands grouping
pub fn parse_number(text: &str) -> ParsedNumber {
    let compact: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '%')
        .collect();

    let core = compact.trim_matches(|c: char| !is_numeric_char(c));
    if core.is_empty() {
        return ParsedNumber::INVALID;
    }

    match normalize_separators(core).parse::<f64>() {
        Ok(value) if value.is_finite() => ParsedNumber::valid(value),
        _ => ParsedNumber::INVALID,
    }
}

/// Lenient parse: anything unreadable becomes 0
pub fn parse_value(text: &str) -> f64 {
    parse_number(text).value
}

/// Lenient parse of an optional cell; a missing cell reads as 0
pub fn parse_optional(text: Option<&str>) -> f64 {
    text.map(parse_value).unwrap_or(0.0)
}

fn is_numeric_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | ',')
}

fn normalize_separators(text: &str) -> String {
    let last_dot = text.rfind('.');
    let last_comma = text.rfind(',');

    match (last_dot, last_comma) {
        (Some(dot), Some(comma)) => {
            let (decimal, group) = if dot > comma { ('.', ',') } else { (',', '.') };
            text.chars()
                .filter(|c| *c != group)
                .map(|c| if c == decimal { '.' } else { c })
                .collect()
        }
        (Some(_), None) => {
            if text.matches('.').count() > 1 {
                text.replace('.', "")
            } else {
                text.to_string()
            }
        }
        (None, Some(_)) => {
            if text.matches(',').count() > 1 {
                text.replace(',', "")
            } else {
                text.replace(',', ".")
            }
        }
        (None, None) => text.to_string(),
    }
}

/// Fixed-point with exactly `decimals` fractional digits, no grouping
pub fn format_decimal(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}

/// Two decimals followed by `%` (e.g. "2.50%")
pub fn format_percentage(value: f64) -> String {
    format!("{:.2}%", value)
}

/// Symbol-prefixed, comma-grouped, two decimals (e.g. "€1,234.56")
pub fn format_currency(value: f64, symbol: &str) -> String {
    format!("{}{}", symbol, group_thousands(&format!("{:.2}", value), ',', '.'))
}

/// Display style used for imported totals: `1.234,50` from 1000 upwards,
/// `999,99` below (no grouping)
pub fn format_grouped_decimal(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    if value >= 1000.0 {
        group_thousands(&fixed, '.', ',')
    } else {
        fixed.replace('.', ",")
    }
}

/// Regroup a `[-]digits[.digits]` string with the given separators
fn group_thousands(fixed: &str, group_sep: char, decimal_sep: char) -> String {
    let (sign, unsigned) = match fixed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", fixed),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(fixed.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(group_sep);
        }
        grouped.push(ch);
    }

    let mut result = String::from(sign);
    result.push_str(&grouped);
    if let Some(frac) = frac_part {
        result.push(decimal_sep);
        result.push_str(frac);
    }
    result
}
