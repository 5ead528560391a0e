//! Tree form of a filter expression.
//!
//! The editor works on a flat chain. When precedence or negation matters, the
//! chain is lifted into this tree instead of giving the chain more meaning.

use serde::Serialize;
use zero_common::config::RangeStyle;

use crate::condition::{Condition, ConditionList, LogicalConnector};
use crate::dictionary::FieldDictionary;
use crate::expression::serializer::condition_to_text;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Expr {
    Leaf(Condition),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

impl Expr {
    /// Fold a chain left to right: `a AND b OR c` becomes `(a AND b) OR c`.
    pub fn from_chain(conditions: &[Condition]) -> Option<Self> {
        let (first, rest) = conditions.split_first()?;
        let mut expr = Expr::Leaf(first.clone());
        let mut connector = first.logical_connector.unwrap_or_default();

        for condition in rest {
            let leaf = Expr::Leaf(condition.clone());
            expr = match connector {
                LogicalConnector::And => expr.and(leaf),
                LogicalConnector::Or => expr.or(leaf),
            };
            connector = condition.logical_connector.unwrap_or_default();
        }

        Some(expr)
    }

    pub fn and(self, other: Expr) -> Self {
        Expr::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Expr) -> Self {
        Expr::Or(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Expr::Not(Box::new(self))
    }

    /// Flatten back into a chain.
    ///
    /// Only left-deep trees without `NOT` have a chain form.
    pub fn to_chain(&self) -> Option<ConditionList> {
        match self {
            Expr::Leaf(condition) => {
                let mut condition = condition.clone();
                condition.logical_connector = None;
                Some(vec![condition])
            }
            Expr::And(left, right) | Expr::Or(left, right) => {
                let Expr::Leaf(next) = right.as_ref() else {
                    return None;
                };
                let mut chain = left.to_chain()?;
                if let Some(last) = chain.last_mut() {
                    last.logical_connector = Some(self.connector()?);
                }
                let mut next = next.clone();
                next.logical_connector = None;
                chain.push(next);
                Some(chain)
            }
            Expr::Not(_) => None,
        }
    }

    /// All conditions, left to right.
    pub fn leaves(&self) -> Vec<&Condition> {
        match self {
            Expr::Leaf(condition) => vec![condition],
            Expr::And(left, right) | Expr::Or(left, right) => {
                let mut leaves = left.leaves();
                leaves.extend(right.leaves());
                leaves
            }
            Expr::Not(inner) => inner.leaves(),
        }
    }

    /// Render with explicit parentheses wherever grouping is not obvious.
    pub fn render(&self, dictionary: &FieldDictionary, range_style: RangeStyle) -> String {
        match self {
            Expr::Leaf(condition) => condition_to_text(condition, dictionary, range_style),
            Expr::And(left, right) | Expr::Or(left, right) => {
                let keyword = self.connector().map_or("AND", LogicalConnector::keyword);
                let left_text = left.render(dictionary, range_style);
                let right_text = right.render(dictionary, range_style);
                let left_text = if left.is_binary() && left.connector() != self.connector() {
                    format!("({left_text})")
                } else {
                    left_text
                };
                let right_text = if right.is_binary() {
                    format!("({right_text})")
                } else {
                    right_text
                };
                format!("{left_text} {keyword} {right_text}")
            }
            Expr::Not(inner) => {
                let inner_text = inner.render(dictionary, range_style);
                if inner.is_binary() {
                    format!("NOT ({inner_text})")
                } else {
                    format!("NOT {inner_text}")
                }
            }
        }
    }

    fn connector(&self) -> Option<LogicalConnector> {
        match self {
            Expr::And(..) => Some(LogicalConnector::And),
            Expr::Or(..) => Some(LogicalConnector::Or),
            _ => None,
        }
    }

    fn is_binary(&self) -> bool {
        matches!(self, Expr::And(..) | Expr::Or(..))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::ConditionValue;
    use crate::dictionary::Operator;
    use crate::expression::validate;

    fn dict() -> std::sync::Arc<FieldDictionary> {
        FieldDictionary::builtin()
    }

    fn leaf(key: &str, op: Operator, n: f64) -> Condition {
        Condition::new(&dict(), key, op, ConditionValue::number(n))
    }

    #[test]
    fn test_empty_chain() {
        assert!(Expr::from_chain(&[]).is_none());
    }

    #[test]
    fn test_left_fold_makes_grouping_explicit() {
        let chain = vec![
            leaf("price", Operator::Gt, 10.0).with_connector(LogicalConnector::And),
            leaf("rsi", Operator::Lt, 30.0).with_connector(LogicalConnector::Or),
            leaf("macd", Operator::Gt, 0.0),
        ];
        let expr = Expr::from_chain(&chain).unwrap();
        assert!(matches!(expr, Expr::Or(..)));
        assert_eq!(
            expr.render(&dict(), RangeStyle::Expanded),
            "(价格 > 10 AND RSI < 30) OR MACD > 0"
        );
    }

    #[test]
    fn test_same_connector_needs_no_parens() {
        let chain = vec![
            leaf("price", Operator::Gt, 10.0),
            leaf("rsi", Operator::Lt, 30.0),
            leaf("macd", Operator::Gt, 0.0),
        ];
        let expr = Expr::from_chain(&chain).unwrap();
        assert_eq!(
            expr.render(&dict(), RangeStyle::Expanded),
            "价格 > 10 AND RSI < 30 AND MACD > 0"
        );
    }

    #[test]
    fn test_not_and_right_grouping() {
        let expr = Expr::Leaf(leaf("price", Operator::Gt, 10.0)).and(
            Expr::Leaf(leaf("rsi", Operator::Gt, 70.0))
                .or(Expr::Leaf(leaf("macd", Operator::Lt, 0.0)))
                .not(),
        );
        let text = expr.render(&dict(), RangeStyle::Expanded);
        assert_eq!(text, "价格 > 10 AND NOT (RSI > 70 OR MACD < 0)");
        assert!(validate(&text).valid);
        assert!(expr.to_chain().is_none());
        assert_eq!(expr.leaves().len(), 3);
    }

    #[test]
    fn test_chain_round_trip() {
        let chain = vec![
            leaf("price", Operator::Gt, 10.0).with_connector(LogicalConnector::Or),
            leaf("rsi", Operator::Lt, 30.0).with_connector(LogicalConnector::And),
            leaf("macd", Operator::Gt, 0.0).with_connector(LogicalConnector::Or),
        ];
        let back = Expr::from_chain(&chain).unwrap().to_chain().unwrap();
        assert_eq!(back.len(), 3);
        assert_eq!(back[0].logical_connector, Some(LogicalConnector::Or));
        assert_eq!(back[1].logical_connector, Some(LogicalConnector::And));
        // The trailing connector carries no meaning and is dropped
        assert_eq!(back[2].logical_connector, None);
        assert_eq!(back[1].id, chain[1].id);
    }
}
