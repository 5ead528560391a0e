//! Best-effort expression text → condition list.
//!
//! The text is cut at whitespace-delimited `AND` / `OR` keywords and every
//! piece is matched against three fixed shapes:
//!
//! - `field op value` with `>=`, `<=`, `!=`, `==`, `=`, `>`, `<`
//! - `field IN [v1, v2, ...]`
//! - `field BETWEEN [min, max]`
//!
//! Anything else is reported back in [`ParseOutcome::unparsed`] and left out
//! of the result. Nesting, precedence and `NOT` have no place in a flat chain,
//! so the expanded `between` rendering comes back as two comparisons.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::condition::{Condition, ConditionList, ConditionValue, LogicalConnector, Scalar};
use crate::dictionary::{FieldDictionary, Operator};

static CONNECTOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(AND|OR)\s+").expect("connector pattern"));

static COMPARISON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(.+?)\s*(>=|<=|!=|==|>|<|=)\s*(.+)$").expect("comparison pattern")
});

static IN_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^(.+?)\s+IN\s*\[(.*)\]$").expect("in-list pattern"));

static BETWEEN_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^(.+?)\s+BETWEEN\s*\[([^,\]]+),([^,\]]+)\]$").expect("between pattern")
});

/// Conditions recovered from an expression, plus the pieces that were not.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseOutcome {
    pub conditions: ConditionList,
    pub unparsed: Vec<String>,
}

impl ParseOutcome {
    /// Whether every segment became a condition.
    pub fn is_complete(&self) -> bool {
        self.unparsed.is_empty()
    }
}

/// Recover a condition chain from expression text.
pub fn parse(text: &str, dictionary: &FieldDictionary) -> ParseOutcome {
    let mut parsed: Vec<(Option<LogicalConnector>, Condition)> = Vec::new();
    let mut unparsed = Vec::new();

    for (preceding, segment) in split_segments(text) {
        if segment.is_empty() {
            continue;
        }
        match parse_segment(segment, dictionary) {
            Some(condition) => parsed.push((preceding, condition)),
            None => {
                tracing::warn!(
                    segment = %zero_common::util::log_preview(
                        segment,
                        zero_common::config::DEFAULT_LOG_PREVIEW_CHARS
                    ),
                    "Dropping unrecognized expression segment"
                );
                unparsed.push(segment.to_string());
            }
        }
    }

    // A connector belongs to the condition *before* it
    let connectors: Vec<Option<LogicalConnector>> =
        parsed.iter().skip(1).map(|(preceding, _)| *preceding).collect();
    let mut conditions: ConditionList = parsed.into_iter().map(|(_, c)| c).collect();
    for (condition, connector) in conditions.iter_mut().zip(connectors) {
        condition.logical_connector = connector;
    }

    tracing::debug!(
        conditions = conditions.len(),
        unparsed = unparsed.len(),
        "Parsed expression"
    );
    ParseOutcome {
        conditions,
        unparsed,
    }
}

/// Split at connectors, pairing each segment with the connector before it.
fn split_segments(text: &str) -> Vec<(Option<LogicalConnector>, &str)> {
    let mut segments = Vec::new();
    let mut preceding = None;
    let mut start = 0;

    for caps in CONNECTOR.captures_iter(text) {
        let (Some(whole), Some(word)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        segments.push((preceding, text[start..whole.start()].trim()));
        preceding = LogicalConnector::from_keyword(word.as_str());
        start = whole.end();
    }
    segments.push((preceding, text[start..].trim()));

    segments
}

fn parse_segment(segment: &str, dictionary: &FieldDictionary) -> Option<Condition> {
    let body = strip_parens(segment);

    if let Some(caps) = COMPARISON.captures(body) {
        let field = field_name(&caps[1])?;
        let operator = Operator::from_symbol(&caps[2])?;
        let raw = caps[3].trim();
        if raw.is_empty() || raw.contains(['<', '>', '=']) {
            return None;
        }
        let value = ConditionValue::Scalar(parse_scalar(raw));
        return Some(Condition::new(
            dictionary,
            dictionary.lookup_key_by_label(field),
            operator,
            value,
        ));
    }

    if let Some(caps) = IN_LIST.captures(body) {
        let field = field_name(&caps[1])?;
        let items: Vec<Scalar> = caps[2]
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(parse_scalar)
            .collect();
        if items.is_empty() {
            return None;
        }
        return Some(Condition::new(
            dictionary,
            dictionary.lookup_key_by_label(field),
            Operator::In,
            ConditionValue::List(items),
        ));
    }

    if let Some(caps) = BETWEEN_RANGE.captures(body) {
        let field = field_name(&caps[1])?;
        let min = parse_scalar(caps[2].trim());
        let max = parse_scalar(caps[3].trim());
        return Some(Condition::new(
            dictionary,
            dictionary.lookup_key_by_label(field),
            Operator::Between,
            ConditionValue::Pair(min, max),
        ));
    }

    None
}

/// Drop one leading `(` and one trailing `)`, independently.
fn strip_parens(segment: &str) -> &str {
    let s = segment.trim();
    let s = s.strip_prefix('(').unwrap_or(s);
    let s = s.strip_suffix(')').unwrap_or(s);
    s.trim()
}

/// The field part of a segment, or `None` when it cannot be a plain field.
fn field_name(raw: &str) -> Option<&str> {
    let field = raw.trim();
    if field.is_empty() || field.contains(['(', ')', '[', ']', '\'', '"']) {
        return None;
    }

    let first_word = field.split_whitespace().next().unwrap_or_default();
    if ["NOT", "AND", "OR"]
        .iter()
        .any(|kw| first_word.eq_ignore_ascii_case(kw))
    {
        return None;
    }

    Some(field)
}

/// Quoted text stays text; other numeric-looking input becomes a number.
fn parse_scalar(raw: &str) -> Scalar {
    let raw = raw.trim();

    for quote in ['\'', '"'] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return Scalar::Text(raw[1..raw.len() - 1].to_string());
        }
    }

    let numeric_start = raw
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'));
    if numeric_start {
        if let Ok(n) = raw.parse::<f64>() {
            if n.is_finite() {
                return Scalar::Number(n);
            }
        }
    }

    Scalar::Text(raw.trim_matches(['\'', '"']).to_string())
}
