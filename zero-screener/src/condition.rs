//! Structured screening conditions.
//!
//! A condition list is a flat, left-to-right chain: the connector stored on a
//! condition joins it to the *next* one, and the last connector is ignored.
//! The chain has no precedence and no negation; see [`crate::expression::Expr`]
//! for a tree form that has both.

use serde::{Deserialize, Serialize};

use crate::dictionary::{FieldDictionary, Operator};

/// Ordered chain of conditions.
pub type ConditionList = Vec<Condition>;

// ============================================================================
// Values
// ============================================================================

/// A single literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Number(_))
    }

    /// Text holding both quote kinds has no quoted form.
    pub fn is_quotable(&self) -> bool {
        match self {
            Self::Number(_) => true,
            Self::Text(s) => !(s.contains('\'') && s.contains('"')),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Numbers print as-is; text is single-quoted, or double-quoted when it
/// contains a `'`.
impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) if s.contains('\'') => write!(f, "\"{s}\""),
            Self::Text(s) => write!(f, "'{s}'"),
        }
    }
}

/// Value of a condition. Its shape should follow the operator: a pair for
/// `between`, a non-empty list for `in`, a scalar otherwise.
///
/// On the wire a two-element array always reads back as [`ConditionValue::Pair`];
/// the accessors below treat pairs and lists interchangeably.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Scalar(Scalar),
    Pair(Scalar, Scalar),
    List(Vec<Scalar>),
}

impl ConditionValue {
    pub fn number(n: f64) -> Self {
        Self::Scalar(Scalar::Number(n))
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self::Scalar(Scalar::Text(s.into()))
    }

    pub fn range(min: f64, max: f64) -> Self {
        Self::Pair(Scalar::Number(min), Scalar::Number(max))
    }

    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Scalar>,
    {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_pair(&self) -> Option<(&Scalar, &Scalar)> {
        match self {
            Self::Pair(a, b) => Some((a, b)),
            Self::List(items) if items.len() == 2 => Some((&items[0], &items[1])),
            _ => None,
        }
    }

    pub fn items(&self) -> Vec<&Scalar> {
        match self {
            Self::Scalar(s) => vec![s],
            Self::Pair(a, b) => vec![a, b],
            Self::List(items) => items.iter().collect(),
        }
    }
}

impl std::fmt::Display for ConditionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar(s) => write!(f, "{s}"),
            _ => {
                let items: Vec<String> = self.items().iter().map(|s| s.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}

// ============================================================================
// Connector
// ============================================================================

/// Logical connector between a condition and the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalConnector {
    #[default]
    And,
    Or,
}

impl LogicalConnector {
    pub fn from_keyword(word: &str) -> Option<Self> {
        if word.eq_ignore_ascii_case("AND") {
            Some(Self::And)
        } else if word.eq_ignore_ascii_case("OR") {
            Some(Self::Or)
        } else {
            None
        }
    }

    pub const fn keyword(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

impl std::fmt::Display for LogicalConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.keyword())
    }
}

// ============================================================================
// Condition
// ============================================================================

/// One `field operator value` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default = "zero_common::logging::generate_short_id")]
    pub id: String,
    pub field_key: String,
    /// Label captured when the field was chosen; may go stale
    #[serde(default)]
    pub field_label: String,
    pub operator: Operator,
    pub value: ConditionValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_connector: Option<LogicalConnector>,
}

impl Condition {
    /// Create a condition with a fresh id and the field's current label.
    pub fn new(
        dictionary: &FieldDictionary,
        field_key: impl Into<String>,
        operator: Operator,
        value: ConditionValue,
    ) -> Self {
        let field_key = field_key.into();
        let field_label = dictionary.lookup_label(&field_key).to_string();
        Self {
            id: zero_common::logging::generate_short_id(),
            field_key,
            field_label,
            operator,
            value,
            logical_connector: None,
        }
    }

    pub fn with_connector(mut self, connector: LogicalConnector) -> Self {
        self.logical_connector = Some(connector);
        self
    }

    /// Re-read the cached label from the dictionary.
    pub fn refresh_label(&mut self, dictionary: &FieldDictionary) {
        self.field_label = dictionary.lookup_label(&self.field_key).to_string();
    }

    /// Whether the value shape matches the operator.
    ///
    /// `between` needs two numbers (order is not checked), `in` a non-empty
    /// list, ordering comparisons a number, and equality any scalar. Text
    /// must not contain both `'` and `"`.
    pub fn is_well_formed(&self) -> bool {
        if !self.value.items().into_iter().all(Scalar::is_quotable) {
            return false;
        }
        match self.operator {
            Operator::Between => self
                .value
                .as_pair()
                .is_some_and(|(min, max)| min.is_number() && max.is_number()),
            Operator::In => match &self.value {
                ConditionValue::List(items) => !items.is_empty(),
                ConditionValue::Pair(..) => true,
                ConditionValue::Scalar(_) => false,
            },
            Operator::Gt | Operator::Gte | Operator::Lt | Operator::Lte => self
                .value
                .as_scalar()
                .is_some_and(Scalar::is_number),
            Operator::Eq | Operator::Neq => self.value.as_scalar().is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> std::sync::Arc<FieldDictionary> {
        FieldDictionary::builtin()
    }

    #[test]
    fn test_new_condition_caches_label() {
        let c = Condition::new(&dict(), "peRatio", Operator::Lt, ConditionValue::number(30.0));
        assert_eq!(c.field_label, "市盈率PE");
        assert_eq!(c.id.len(), 12);
        assert!(c.logical_connector.is_none());
    }

    #[test]
    fn test_new_condition_ids_are_unique() {
        let d = dict();
        let a = Condition::new(&d, "roe", Operator::Gt, ConditionValue::number(10.0));
        let b = Condition::new(&d, "roe", Operator::Gt, ConditionValue::number(10.0));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_refresh_label() {
        let mut c = Condition::new(&dict(), "roe", Operator::Gt, ConditionValue::number(10.0));
        c.field_key = "roa".into();
        assert_eq!(c.field_label, "净资产收益率ROE");
        c.refresh_label(&dict());
        assert_eq!(c.field_label, "总资产收益率ROA");
    }

    #[test]
    fn test_well_formed_shapes() {
        let d = dict();
        assert!(Condition::new(&d, "peRatio", Operator::Between, ConditionValue::range(10.0, 30.0))
            .is_well_formed());
        // min > max is left to the backend
        assert!(Condition::new(&d, "peRatio", Operator::Between, ConditionValue::range(30.0, 10.0))
            .is_well_formed());
        assert!(!Condition::new(&d, "peRatio", Operator::Between, ConditionValue::number(10.0))
            .is_well_formed());
        assert!(Condition::new(&d, "industry", Operator::In, ConditionValue::list(["银行"]))
            .is_well_formed());
        assert!(!Condition::new(&d, "industry", Operator::In, ConditionValue::List(vec![]))
            .is_well_formed());
        assert!(!Condition::new(&d, "price", Operator::Gt, ConditionValue::text("高"))
            .is_well_formed());
        assert!(Condition::new(&d, "industry", Operator::Eq, ConditionValue::text("银行"))
            .is_well_formed());
        assert!(Condition::new(&d, "industry", Operator::Eq, ConditionValue::text("O'Neil"))
            .is_well_formed());
        assert!(!Condition::new(&d, "industry", Operator::Eq, ConditionValue::text(r#"a'b"c"#))
            .is_well_formed());
        assert!(!Condition::new(&d, "industry", Operator::In, ConditionValue::list(["银行", r#"a'"b"#]))
            .is_well_formed());
    }

    #[test]
    fn test_scalar_display() {
        assert_eq!(Scalar::Number(30.0).to_string(), "30");
        assert_eq!(Scalar::Number(2.5).to_string(), "2.5");
        assert_eq!(Scalar::from("银行").to_string(), "'银行'");
        assert_eq!(Scalar::from("O'Neil").to_string(), r#""O'Neil""#);
    }

    #[test]
    fn test_connector_keywords() {
        assert_eq!(LogicalConnector::from_keyword("and"), Some(LogicalConnector::And));
        assert_eq!(LogicalConnector::from_keyword("Or"), Some(LogicalConnector::Or));
        assert_eq!(LogicalConnector::from_keyword("NOT"), None);
        assert_eq!(LogicalConnector::default(), LogicalConnector::And);
    }

    #[test]
    fn test_condition_json_shape() {
        let json = r#"{
            "id": "c1",
            "fieldKey": "peRatio",
            "fieldLabel": "市盈率PE",
            "operator": "between",
            "value": [10, 30],
            "logicalConnector": "AND"
        }"#;
        let c: Condition = serde_json::from_str(json).unwrap();
        assert_eq!(c.operator, Operator::Between);
        assert_eq!(c.value, ConditionValue::range(10.0, 30.0));
        assert_eq!(c.logical_connector, Some(LogicalConnector::And));

        let list: ConditionValue = serde_json::from_str(r#"["银行", "保险", "证券"]"#).unwrap();
        assert_eq!(list.items().len(), 3);

        let scalar: ConditionValue = serde_json::from_str("12.5").unwrap();
        assert_eq!(scalar, ConditionValue::number(12.5));
    }
}
