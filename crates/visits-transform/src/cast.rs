//! Numeric casting of `visit_cost`.

use visits_model::{Dataset, NormalizedVisit};

/// Parse a cost cell.
///
/// Handles:
/// - Standard numbers: "123", "-45.67"
/// - Thousands separators: "1,234.50"
/// - Scientific notation: "1.2e3"
///
/// Empty, non-numeric and non-finite values (`nan`, `inf`) are `None`.
pub fn parse_f64(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '\u{a0}'))
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Cast every row's cost, preserving order.
pub fn cast(rows: Vec<NormalizedVisit>) -> Dataset {
    rows.into_iter()
        .map(|row| row.map_cost(|cost| cost.as_deref().and_then(parse_f64)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_numbers() {
        assert_eq!(parse_f64("123"), Some(123.0));
        assert_eq!(parse_f64(" -45.67 "), Some(-45.67));
        assert_eq!(parse_f64("1.2e3"), Some(1200.0));
    }

    #[test]
    fn strips_thousands_separators() {
        assert_eq!(parse_f64("1,234.50"), Some(1234.5));
    }

    #[test]
    fn rejects_non_numeric_and_non_finite() {
        assert_eq!(parse_f64(""), None);
        assert_eq!(parse_f64("abc"), None);
        assert_eq!(parse_f64("$120"), None);
        assert_eq!(parse_f64("NaN"), None);
        assert_eq!(parse_f64("inf"), None);
    }

    #[test]
    fn cast_keeps_rows_with_bad_costs() {
        let rows = vec![
            NormalizedVisit {
                visit_id: Some("V1".into()),
                visit_cost: Some("10.5".into()),
                ..NormalizedVisit::default()
            },
            NormalizedVisit {
                visit_id: Some("V2".into()),
                visit_cost: Some("n/a".into()),
                ..NormalizedVisit::default()
            },
            NormalizedVisit::default(),
        ];
        let dataset = cast(rows);
        let costs: Vec<_> = dataset.iter().map(|r| r.visit_cost).collect();
        assert_eq!(costs, vec![Some(10.5), None, None]);
        assert_eq!(dataset.records()[1].visit_id.as_deref(), Some("V2"));
    }
}
