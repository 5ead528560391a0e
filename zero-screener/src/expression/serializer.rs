//! Condition list → expression text.

use zero_common::config::{ExpressionLayout, RangeStyle, ScreenerConfig};

use crate::condition::{Condition, LogicalConnector};
use crate::dictionary::{FieldDictionary, Operator};

/// Rendering choices for [`serialize_with`].
///
/// Neither option changes meaning: every combination validates and parses
/// back to the same chain of comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderOptions {
    pub layout: ExpressionLayout,
    pub range_style: RangeStyle,
}

impl RenderOptions {
    pub fn single_line() -> Self {
        Self {
            layout: ExpressionLayout::SingleLine,
            ..Self::default()
        }
    }

    pub fn keyword() -> Self {
        Self {
            range_style: RangeStyle::Keyword,
            ..Self::default()
        }
    }
}

impl From<&ScreenerConfig> for RenderOptions {
    fn from(config: &ScreenerConfig) -> Self {
        Self {
            layout: config.layout,
            range_style: config.range_style,
        }
    }
}

/// Serialize with the default options (pretty layout, expanded ranges).
pub fn serialize(conditions: &[Condition], dictionary: &FieldDictionary) -> String {
    serialize_with(conditions, dictionary, RenderOptions::default())
}

/// Serialize a condition chain into one boolean expression.
///
/// Condition `i` is prefixed with the connector stored on condition `i - 1`,
/// `AND` when that connector is absent. Never fails: unknown fields render
/// under their cached label or key, and mis-shaped values render as-is.
pub fn serialize_with(
    conditions: &[Condition],
    dictionary: &FieldDictionary,
    options: RenderOptions,
) -> String {
    let separator = match options.layout {
        ExpressionLayout::Pretty => "\n",
        ExpressionLayout::SingleLine => " ",
    };

    let mut out = String::new();
    for (i, condition) in conditions.iter().enumerate() {
        let text = condition_to_text(condition, dictionary, options.range_style);
        if i == 0 {
            out.push_str(&text);
            continue;
        }

        let connector = conditions[i - 1].logical_connector.unwrap_or_default();
        out.push_str(separator);
        out.push_str(connector.keyword());
        out.push(' ');
        out.push_str(&text);
    }

    tracing::debug!(
        conditions = conditions.len(),
        chars = out.chars().count(),
        "Serialized condition list"
    );
    out
}

/// Render one condition.
pub fn condition_to_text(
    condition: &Condition,
    dictionary: &FieldDictionary,
    range_style: RangeStyle,
) -> String {
    let label = display_label(condition, dictionary);

    match condition.operator {
        Operator::Between => match (condition.value.as_pair(), range_style) {
            (Some((min, max)), RangeStyle::Expanded) => format!(
                "({label} >= {min} {and} {label} <= {max})",
                and = LogicalConnector::And
            ),
            (Some((min, max)), RangeStyle::Keyword) => {
                format!("{label} BETWEEN [{min}, {max}]")
            }
            (None, _) => format!("{label} BETWEEN {}", condition.value),
        },
        Operator::In => {
            let items: Vec<String> = condition
                .value
                .items()
                .iter()
                .map(|item| item.to_string())
                .collect();
            format!("{label} IN [{}]", items.join(", "))
        }
        op => format!("{label} {} {}", op.symbol(), condition.value),
    }
}

/// Prefer the dictionary, then the cached label, then the raw key.
fn display_label<'a>(condition: &'a Condition, dictionary: &'a FieldDictionary) -> &'a str {
    match dictionary.get(&condition.field_key) {
        Some(field) => &field.label,
        None if !condition.field_label.is_empty() => &condition.field_label,
        None => &condition.field_key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ConditionValue;

    fn dict() -> std::sync::Arc<FieldDictionary> {
        FieldDictionary::builtin()
    }

    fn cond(key: &str, op: Operator, value: ConditionValue) -> Condition {
        Condition::new(&dict(), key, op, value)
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(serialize(&[], &dict()), "");
    }

    #[test]
    fn test_single_condition() {
        let list = vec![cond("rsi", Operator::Lt, ConditionValue::number(30.0))];
        assert_eq!(serialize(&list, &dict()), "RSI < 30");
    }

    #[test]
    fn test_two_conditions_pretty() {
        let list = vec![
            cond("peRatio", Operator::Lt, ConditionValue::number(30.0))
                .with_connector(LogicalConnector::And),
            cond("roe", Operator::Gt, ConditionValue::number(10.0)),
        ];
        assert_eq!(
            serialize(&list, &dict()),
            "市盈率PE < 30\nAND 净资产收益率ROE > 10"
        );
        assert_eq!(
            serialize_with(&list, &dict(), RenderOptions::single_line()),
            "市盈率PE < 30 AND 净资产收益率ROE > 10"
        );
    }

    #[test]
    fn test_missing_connector_defaults_to_and() {
        let list = vec![
            cond("price", Operator::Gt, ConditionValue::number(10.0)),
            cond("volume", Operator::Gte, ConditionValue::number(1000.0))
                .with_connector(LogicalConnector::Or),
            cond("rsi", Operator::Lt, ConditionValue::number(70.0)),
        ];
        assert_eq!(
            serialize_with(&list, &dict(), RenderOptions::single_line()),
            "价格 > 10 AND 成交量 >= 1000 OR RSI < 70"
        );
    }

    #[test]
    fn test_trailing_connector_ignored() {
        let list = vec![cond("rsi", Operator::Lt, ConditionValue::number(30.0))
            .with_connector(LogicalConnector::Or)];
        assert_eq!(serialize(&list, &dict()), "RSI < 30");
    }

    #[test]
    fn test_between_expanded() {
        let list = vec![cond("peRatio", Operator::Between, ConditionValue::range(10.0, 30.0))];
        assert_eq!(
            serialize(&list, &dict()),
            "(市盈率PE >= 10 AND 市盈率PE <= 30)"
        );
    }

    #[test]
    fn test_between_keyword() {
        let list = vec![cond("peRatio", Operator::Between, ConditionValue::range(10.0, 30.0))];
        assert_eq!(
            serialize_with(&list, &dict(), RenderOptions::keyword()),
            "市盈率PE BETWEEN [10, 30]"
        );
    }

    #[test]
    fn test_in_quotes_strings() {
        let list = vec![cond(
            "industry",
            Operator::In,
            ConditionValue::list(["银行", "保险"]),
        )];
        assert_eq!(serialize(&list, &dict()), "行业 IN ['银行', '保险']");
    }

    #[test]
    fn test_in_numbers_unquoted() {
        let list = vec![cond("ma5", Operator::In, ConditionValue::list([5.0, 10.0, 20.0]))];
        assert_eq!(serialize(&list, &dict()), "MA5 IN [5, 10, 20]");
    }

    #[test]
    fn test_string_scalar_quoted() {
        let list = vec![cond("industry", Operator::Eq, ConditionValue::text("银行"))];
        assert_eq!(serialize(&list, &dict()), "行业 = '银行'");
    }

    #[test]
    fn test_apostrophe_switches_to_double_quotes() {
        let list = vec![cond("industry", Operator::Eq, ConditionValue::text("O'Neil"))];
        let text = serialize(&list, &dict());
        assert_eq!(text, r#"行业 = "O'Neil""#);
        assert!(crate::expression::validate(&text).valid);

        let outcome = crate::expression::parse(&text, &dict());
        assert!(outcome.is_complete());
        assert_eq!(outcome.conditions[0].value, ConditionValue::text("O'Neil"));

        let list = vec![cond(
            "industry",
            Operator::In,
            ConditionValue::list(["银行", "O'Neil"]),
        )];
        assert_eq!(serialize(&list, &dict()), r#"行业 IN ['银行', "O'Neil"]"#);
    }

    #[test]
    fn test_unknown_field_uses_cached_label_then_key() {
        let mut c = cond("customScore", Operator::Gt, ConditionValue::number(1.0));
        assert_eq!(serialize(&[c.clone()], &dict()), "customScore > 1");

        c.field_label = "自定义评分".into();
        assert_eq!(serialize(&[c], &dict()), "自定义评分 > 1");
    }

    #[test]
    fn test_dictionary_label_wins_over_stale_cache() {
        let mut c = cond("roe", Operator::Gt, ConditionValue::number(10.0));
        c.field_label = "旧标签".into();
        assert_eq!(serialize(&[c], &dict()), "净资产收益率ROE > 10");
    }

    #[test]
    fn test_malformed_between_does_not_panic() {
        let list = vec![cond("peRatio", Operator::Between, ConditionValue::number(10.0))];
        assert_eq!(serialize(&list, &dict()), "市盈率PE BETWEEN 10");
    }
}
