//! Display adapter for simulation statistics.
//!
//! Turns the numeric [`Statistics`] record into currency strings and human
//! labels. Nothing in `core` depends on this module.

use serde::Serialize;

use crate::core::Statistics;

/// A value destined for display: numbers get formatted, text passes through.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayValue {
    Number(f64),
    Text(String),
}

impl From<f64> for DisplayValue {
    fn from(value: f64) -> Self {
        DisplayValue::Number(value)
    }
}

impl From<&str> for DisplayValue {
    fn from(value: &str) -> Self {
        DisplayValue::Text(value.to_string())
    }
}

impl From<String> for DisplayValue {
    fn from(value: String) -> Self {
        DisplayValue::Text(value)
    }
}

pub trait ValueFormatter {
    fn format_number(&self, value: f64) -> String;

    fn format_value(&self, value: &DisplayValue) -> String {
        match value {
            DisplayValue::Number(n) => self.format_number(*n),
            DisplayValue::Text(s) => s.clone(),
        }
    }
}

/// Currency formatting with a configurable symbol, separators and precision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormatter {
    unit: String,
    delimiter: char,
    separator: char,
    precision: usize,
}

impl CurrencyFormatter {
    pub fn new(
        unit: impl Into<String>,
        delimiter: char,
        separator: char,
        precision: usize,
    ) -> Self {
        Self {
            unit: unit.into(),
            delimiter,
            separator,
            precision,
        }
    }

    /// `$1,234.56`
    pub fn usd() -> Self {
        Self::new("$", ',', '.', 2)
    }
}

impl Default for CurrencyFormatter {
    fn default() -> Self {
        Self::usd()
    }
}

impl ValueFormatter for CurrencyFormatter {
    fn format_number(&self, value: f64) -> String {
        if !value.is_finite() {
            return value.to_string();
        }

        let fixed = format!("{:.*}", self.precision, value.abs());
        let (whole, fraction) = match fixed.split_once('.') {
            Some((whole, fraction)) => (whole, Some(fraction)),
            None => (fixed.as_str(), None),
        };

        let mut out = String::with_capacity(fixed.len() + whole.len() / 3 + self.unit.len() + 1);
        let rounds_to_zero = fixed.bytes().all(|b| b == b'0' || b == b'.');
        if value < 0.0 && !rounds_to_zero {
            out.push('-');
        }
        out.push_str(&self.unit);
        out.push_str(&group_thousands(whole, self.delimiter));
        if let Some(fraction) = fraction {
            out.push(self.separator);
            out.push_str(fraction);
        }
        out
    }
}

fn group_thousands(digits: &str, delimiter: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(delimiter);
        }
        grouped.push(c);
    }
    grouped
}

/// `"average"` -> `"Average"`, `"final_balance"` -> `"Final balance"`,
/// `"user_id"` -> `"User"`.
pub fn labelize(key: &str) -> String {
    let key = key.strip_suffix("_id").unwrap_or(key);
    let spaced = key.replace('_', " ");
    let trimmed = spaced.trim();

    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Formatted statistics, serialized with keys in `average, median, min, max` order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormattedStatistics {
    pub average: String,
    pub median: String,
    pub min: String,
    pub max: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatisticsRow {
    pub key: &'static str,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Default)]
pub struct StatisticsPresenter<F = CurrencyFormatter> {
    formatter: F,
}

impl StatisticsPresenter<CurrencyFormatter> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F: ValueFormatter> StatisticsPresenter<F> {
    pub fn with_formatter(formatter: F) -> Self {
        Self { formatter }
    }

    pub fn format_value(&self, value: impl Into<DisplayValue>) -> String {
        self.formatter.format_value(&value.into())
    }

    pub fn formatted_statistics(&self, stats: &Statistics) -> FormattedStatistics {
        FormattedStatistics {
            average: self.formatter.format_number(stats.average),
            median: self.formatter.format_number(stats.median),
            min: self.formatter.format_number(stats.min),
            max: self.formatter.format_number(stats.max),
        }
    }

    pub fn statistics_rows(&self, stats: &Statistics) -> Vec<StatisticsRow> {
        stats
            .fields()
            .into_iter()
            .map(|(key, value)| StatisticsRow {
                key,
                label: labelize(key),
                value: self.formatter.format_number(value),
            })
            .collect()
    }

    /// Labels and formats arbitrary named values, keeping their order.
    pub fn named_rows<'a, I>(&self, values: I) -> Vec<(String, String)>
    where
        I: IntoIterator<Item = (&'a str, DisplayValue)>,
    {
        values
            .into_iter()
            .map(|(key, value)| (labelize(key), self.formatter.format_value(&value)))
            .collect()
    }

    pub fn to_json(&self, stats: &Statistics) -> serde_json::Result<String> {
        serde_json::to_string(&self.formatted_statistics(stats))
    }

    /// Two-column plain-text table, labels left-aligned and values right-aligned.
    pub fn render_table(&self, stats: &Statistics) -> String {
        let rows = self.statistics_rows(stats);
        let label_width = rows.iter().map(|r| r.label.len()).max().unwrap_or(0);
        let value_width = rows.iter().map(|r| r.value.len()).max().unwrap_or(0);

        let mut out = String::new();
        for row in rows {
            out.push_str(&format!(
                "{:<label_width$}  {:>value_width$}\n",
                row.label, row.value
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd(value: f64) -> String {
        CurrencyFormatter::usd().format_number(value)
    }

    fn sample_stats() -> Statistics {
        Statistics {
            average: 300_000.0,
            median: 250_000.5,
            min: 999.999,
            max: 1_234_567.891,
        }
    }

    #[test]
    fn formats_usd_with_separators_and_cents() {
        assert_eq!(usd(300_000.0), "$300,000.00");
        assert_eq!(usd(10_000.0), "$10,000.00");
        assert_eq!(usd(0.0), "$0.00");
        assert_eq!(usd(999.0), "$999.00");
        assert_eq!(usd(1_000.0), "$1,000.00");
        assert_eq!(usd(1_234_567.891), "$1,234,567.89");
    }

    #[test]
    fn rounding_can_carry_into_a_new_group() {
        assert_eq!(usd(999.999), "$1,000.00");
    }

    #[test]
    fn negative_values_lead_with_minus() {
        assert_eq!(usd(-1_234.5), "-$1,234.50");
        assert_eq!(usd(-0.001), "$0.00");
    }

    #[test]
    fn non_finite_values_use_literal_form() {
        assert_eq!(usd(f64::NAN), "NaN");
        assert_eq!(usd(f64::INFINITY), "inf");
    }

    #[test]
    fn custom_locale_formatter() {
        let euro = CurrencyFormatter::new("€", '.', ',', 2);
        assert_eq!(euro.format_number(1_234_567.5), "€1.234.567,50");
        let whole = CurrencyFormatter::new("$", ',', '.', 0);
        assert_eq!(whole.format_number(12_345.4), "$12,345");

        let presenter = StatisticsPresenter::with_formatter(euro);
        let formatted = presenter.formatted_statistics(&sample_stats());
        assert_eq!(formatted.average, "€300.000,00");
    }

    #[test]
    fn text_values_pass_through() {
        let presenter = StatisticsPresenter::new();
        assert_eq!(presenter.format_value("n/a"), "n/a");
        assert_eq!(presenter.format_value(5.0), "$5.00");
    }

    #[test]
    fn labelize_humanizes_field_names() {
        assert_eq!(labelize("average"), "Average");
        assert_eq!(labelize("median"), "Median");
        assert_eq!(labelize("final_balance"), "Final balance");
        assert_eq!(labelize("simulation_id"), "Simulation");
        assert_eq!(labelize(""), "");
    }

    #[test]
    fn formatted_statistics_json_keeps_field_order() {
        let presenter = StatisticsPresenter::new();
        let json = presenter.to_json(&sample_stats()).expect("serializes");
        assert_eq!(
            json,
            r#"{"average":"$300,000.00","median":"$250,000.50","min":"$1,000.00","max":"$1,234,567.89"}"#
        );
    }

    #[test]
    fn statistics_rows_pair_labels_with_values() {
        let presenter = StatisticsPresenter::new();
        let rows = presenter.statistics_rows(&sample_stats());
        let pairs: Vec<_> = rows
            .iter()
            .map(|r| (r.label.as_str(), r.value.as_str()))
            .collect();
        assert_eq!(
            pairs,
            [
                ("Average", "$300,000.00"),
                ("Median", "$250,000.50"),
                ("Min", "$1,000.00"),
                ("Max", "$1,234,567.89"),
            ]
        );
    }

    #[test]
    fn named_rows_format_mixed_values() {
        let presenter = StatisticsPresenter::new();
        let rows = presenter.named_rows([
            ("final_balance", DisplayValue::from(2_000.0)),
            ("status", DisplayValue::from("complete")),
        ]);
        assert_eq!(
            rows,
            [
                ("Final balance".to_string(), "$2,000.00".to_string()),
                ("Status".to_string(), "complete".to_string()),
            ]
        );
    }

    #[test]
    fn render_table_aligns_columns() {
        let presenter = StatisticsPresenter::new();
        let table = presenter.render_table(&Statistics {
            average: 2_000.0,
            median: 2_000.0,
            min: 2_000.0,
            max: 12_000.0,
        });
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "Average   $2,000.00");
        assert_eq!(lines[3], "Max      $12,000.00");
    }
}
