use std::sync::LazyLock;

use regex::Regex;

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<sign>[-+\u{2212}\u{2013}])?\s*(?P<number>\d(?:[\d.,\u{a0}\u{202f}]*\d)?|[.,]\d+)")
        .expect("hardcoded number regex is valid")
});

static FOUR_DIGIT_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\D)((?:19|20)\d{2})(?:\D|$)").expect("hardcoded year regex is valid")
});

static DASH_SUFFIX_YEAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[-\u{2013}](\d{2})(?:\D|$)").expect("hardcoded year suffix regex is valid")
});

static TRAILING_TWO_DIGIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)(\d{2})$").expect("hardcoded trailing year regex is valid")
});

const CURRENCY_SYMBOLS: [char; 4] = ['€', '$', '£', '¥'];

fn is_decimal_comma(raw: &str) -> bool {
    let Some((int_part, frac_part)) = raw.split_once(',') else {
        return false;
    };
    int_part.is_empty() || int_part == "0" || frac_part.len() != 3
}

fn normalize_number(raw: &str) -> Option<f64> {
    let raw = raw.replace(['\u{a0}', '\u{202f}'], "");
    let commas = raw.matches(',').count();
    let dots = raw.matches('.').count();

    let normalized = match (commas, dots) {
        (0, 0) => raw,
        (1, 0) if is_decimal_comma(&raw) => raw.replace(',', "."),
        (_, 0) => raw.replace(',', ""),
        (0, 1) => raw,
        (0, _) => raw.replace('.', ""),
        _ => {
            let last_comma = raw.rfind(',').unwrap_or(0);
            let last_dot = raw.rfind('.').unwrap_or(0);
            if last_comma > last_dot {
                raw.replace('.', "").replace(',', ".")
            } else {
                raw.replace(',', "")
            }
        }
    };

    let normalized = if normalized.starts_with('.') {
        format!("0{normalized}")
    } else {
        normalized
    };
    normalized.parse::<f64>().ok()
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Leading signed literal of `body`, with the remainder after it.
fn leading_number(body: &str) -> Option<(f64, &str)> {
    let captures = NUMBER_RE.captures(body)?;
    let number = captures.name("number")?;
    let mut value = normalize_number(number.as_str())?;
    if captures
        .name("sign")
        .is_some_and(|sign| sign.as_str() != "+")
    {
        value = -value;
    }
    Some((value, &body[number.end()..]))
}

/// `(1,234) EUR` style negatives.
fn accounting_negative(text: &str) -> Option<(f64, Option<String>)> {
    let inner = text.strip_prefix('(')?;
    let (number, rest) = inner.split_once(')')?;
    let (value, remainder) = leading_number(number.trim())?;
    if !remainder.trim().is_empty() {
        return None;
    }
    Some((-value.abs(), non_empty(rest)))
}

/// Parses a raw cell string into its numeric value and trailing unit token.
///
/// Thousands separators are dropped and a decimal comma is read as a decimal
/// point. Text that does not start with a number yields `(None, None)`.
///
/// ```
/// use table_facts::parse_value;
///
/// assert_eq!(parse_value("23.2 EUR/ton"), (Some(23.2), Some("EUR/ton".to_string())));
/// assert_eq!(parse_value("N/A"), (None, None));
/// ```
#[must_use]
pub fn parse_value(text: &str) -> (Option<f64>, Option<String>) {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return (None, None);
    }

    if let Some((value, unit)) = accounting_negative(trimmed) {
        return (Some(value), unit);
    }

    let (currency, body) = match trimmed.strip_prefix(CURRENCY_SYMBOLS) {
        Some(rest) => (trimmed.chars().next().map(String::from), rest.trim_start()),
        None => (None, trimmed),
    };

    match leading_number(body) {
        Some((value, remainder)) => (Some(value), non_empty(remainder).or(currency)),
        None => (None, None),
    }
}

/// Whether the cell text starts with a parsable number.
#[must_use]
pub fn is_numeric(text: &str) -> bool {
    parse_value(text).0.is_some()
}

/// Fiscal year referenced by a period label.
///
/// A 4-digit year (1900–2099) wins; otherwise a 2-digit year after a dash
/// (`Aug-25`), then a trailing standalone 2-digit token (`Q2 25`), both read
/// as 2000+N. `FY99` has neither form and yields `None`.
#[must_use]
pub fn extract_fiscal_year(period: &str) -> Option<i32> {
    let period = period.trim();
    if period.is_empty() {
        return None;
    }

    if let Some(year) = FOUR_DIGIT_YEAR_RE
        .captures(period)
        .and_then(|captures| captures.get(1))
    {
        return year.as_str().parse().ok();
    }

    DASH_SUFFIX_YEAR_RE
        .captures(period)
        .or_else(|| TRAILING_TWO_DIGIT_RE.captures(period))
        .and_then(|captures| captures.get(1))
        .and_then(|suffix| suffix.as_str().parse::<i32>().ok())
        .map(|suffix| 2000 + suffix)
}

#[cfg(test)]
mod tests {
    use super::{extract_fiscal_year, is_numeric, parse_value};

    fn unit(text: &str) -> Option<String> {
        Some(text.to_string())
    }

    #[test]
    fn parses_value_with_trailing_unit() {
        assert_eq!(parse_value("23.2 EUR/ton"), (Some(23.2), unit("EUR/ton")));
        assert_eq!(parse_value("1,234.56 GJ"), (Some(1234.56), unit("GJ")));
        assert_eq!(parse_value("12.5%"), (Some(12.5), unit("%")));
    }

    #[test]
    fn parses_plain_signed_values() {
        assert_eq!(parse_value("-23.4"), (Some(-23.4), None));
        assert_eq!(parse_value("+7"), (Some(7.0), None));
        assert_eq!(parse_value("\u{2212}5.9"), (Some(-5.9), None));
    }

    #[test]
    fn non_numeric_text_yields_nothing() {
        assert_eq!(parse_value("N/A"), (None, None));
        assert_eq!(parse_value("-"), (None, None));
        assert_eq!(parse_value("   "), (None, None));
        assert_eq!(parse_value("(EUR)"), (None, None));
    }

    #[test]
    fn reads_decimal_comma_and_thousands_conventions() {
        assert_eq!(parse_value("23,2").0, Some(23.2));
        assert_eq!(parse_value("1,234").0, Some(1234.0));
        assert_eq!(parse_value("0,125").0, Some(0.125));
        assert_eq!(parse_value("1.234.567").0, Some(1_234_567.0));
        assert_eq!(parse_value("1.234,56 EUR"), (Some(1234.56), unit("EUR")));
        assert_eq!(parse_value("1\u{a0}234").0, Some(1234.0));
    }

    #[test]
    fn accounting_parentheses_are_negative() {
        assert_eq!(parse_value("(1,234)"), (Some(-1234.0), None));
        assert_eq!(parse_value("(12.5) kt"), (Some(-12.5), unit("kt")));
    }

    #[test]
    fn leading_currency_becomes_unit_when_nothing_trails() {
        assert_eq!(parse_value("€ 12.5"), (Some(12.5), unit("€")));
        assert_eq!(parse_value("$3 m"), (Some(3.0), unit("m")));
    }

    #[test]
    fn numeric_check_follows_parser() {
        assert!(is_numeric("42"));
        assert!(!is_numeric("Thermal Energy"));
    }

    #[test]
    fn fiscal_year_forms() {
        assert_eq!(extract_fiscal_year("Aug-25"), Some(2025));
        assert_eq!(extract_fiscal_year("Q2 2025"), Some(2025));
        assert_eq!(extract_fiscal_year("2024"), Some(2024));
        assert_eq!(extract_fiscal_year("FY2023"), Some(2023));
        assert_eq!(extract_fiscal_year("Q2 25"), Some(2025));
    }

    #[test]
    fn fiscal_year_requires_dash_or_standalone_suffix() {
        assert_eq!(extract_fiscal_year("FY99"), None);
        assert_eq!(extract_fiscal_year("Budget"), None);
        assert_eq!(extract_fiscal_year(""), None);
    }
}
