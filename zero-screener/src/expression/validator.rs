//! Heuristic syntax checks for free-form filter expressions.
//!
//! There is no grammar here. Each check is an independent function over the
//! raw text that adds errors or warnings to a shared [`Diagnostic`], so one
//! pass reports every problem at once. Only errors make an expression
//! unusable; warnings are advisory.
//!
//! | # | Check                                   | Severity |
//! |---|-----------------------------------------|----------|
//! | 1 | `(` and `)` counts match                | error    |
//! | 2 | input is not blank                      | error    |
//! | 3 | at least one field name                 | error    |
//! | 4 | a comparison or keyword operator exists | warning  |
//! | 5 | no digits glued to letters (`10x`)      | error    |
//! | 6 | no doubled logical keywords             | error    |
//! | 7 | every `'` and `"` string is closed        | error    |
//! | 8 | only supported characters               | warning  |

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use zero_common::config::DEFAULT_LOG_PREVIEW_CHARS;
use zero_common::util::log_preview;

static FIELD_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z\p{Han}]+").expect("field token pattern"));

static OPERATOR_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:AND|OR|NOT|IN|BETWEEN)\b").expect("operator keyword pattern")
});

/// Han characters count as letters so unit suffixes like `5元` are caught.
static MALFORMED_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+[A-Za-z\p{Han}]+").expect("malformed number pattern"));

/// A keyword followed by `AND` / `OR`, or a doubled `NOT`. `AND NOT` is legal.
static REPEATED_LOGICAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:(?:AND|OR|NOT)\s+(?:AND|OR)|NOT\s+NOT)\b")
        .expect("repeated logical pattern")
});

static UNSUPPORTED_CHAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[^\w\p{Han}\s()<>=!&|+\-*/.,%'"\[\]]"#).expect("unsupported char pattern")
});

// ============================================================================
// Diagnostic
// ============================================================================

/// What a reported issue is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IssueKind {
    UnbalancedBrackets { open: usize, close: usize },
    Empty,
    MissingField,
    MissingOperator,
    MalformedNumber { tokens: Vec<String> },
    RepeatedLogicalOperator { sequences: Vec<String> },
    UnbalancedQuotes { quote: char, count: usize },
    UnsupportedCharacters { chars: Vec<char> },
}

/// One error or warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
    /// Character offset of the first offending character, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

/// Result of validating an expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub valid: bool,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
}

impl Diagnostic {
    fn error(&mut self, kind: IssueKind, message: String, position: Option<usize>) {
        self.errors.push(Issue {
            kind,
            message,
            position,
        });
    }

    fn warn(&mut self, kind: IssueKind, message: String) {
        self.warnings.push(Issue {
            kind,
            message,
            position: None,
        });
    }

    /// Every message, errors first.
    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .map(|issue| issue.message.as_str())
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

// ============================================================================
// Validation
// ============================================================================

type Check = fn(&str, &mut Diagnostic);

/// Checks that need non-blank input.
const CONTENT_CHECKS: &[Check] = &[
    check_field_presence,
    check_operator_presence,
    check_malformed_numbers,
    check_repeated_logical,
    check_quotes,
    check_characters,
];

/// Validate an expression.
///
/// Blank input reports only the emptiness error; content checks are skipped.
pub fn validate(text: &str) -> Diagnostic {
    let mut diagnostic = Diagnostic::default();

    check_brackets(text, &mut diagnostic);
    if text.trim().is_empty() {
        diagnostic.error(IssueKind::Empty, "表达式不能为空".to_string(), None);
    } else {
        for check in CONTENT_CHECKS {
            check(text, &mut diagnostic);
        }
    }

    diagnostic.valid = diagnostic.errors.is_empty();

    tracing::debug!(
        expression = %log_preview(text, DEFAULT_LOG_PREVIEW_CHARS),
        valid = diagnostic.valid,
        errors = diagnostic.errors.len(),
        warnings = diagnostic.warnings.len(),
        "Validated expression"
    );
    diagnostic
}

/// Character offset of a byte offset.
fn char_offset(text: &str, byte: usize) -> usize {
    text[..byte].chars().count()
}

fn check_brackets(text: &str, diagnostic: &mut Diagnostic) {
    let mut open = 0usize;
    let mut close = 0usize;
    let mut unclosed: Vec<usize> = Vec::new();
    let mut stray_close: Option<usize> = None;

    for (i, c) in text.chars().enumerate() {
        match c {
            '(' => {
                open += 1;
                unclosed.push(i);
            }
            ')' => {
                close += 1;
                if unclosed.pop().is_none() && stray_close.is_none() {
                    stray_close = Some(i);
                }
            }
            _ => {}
        }
    }

    if open != close {
        let position = stray_close.or_else(|| unclosed.last().copied());
        diagnostic.error(
            IssueKind::UnbalancedBrackets { open, close },
            format!("括号不匹配：左括号 {open} 个，右括号 {close} 个"),
            position,
        );
    }
}

fn check_field_presence(text: &str, diagnostic: &mut Diagnostic) {
    if !FIELD_TOKEN.is_match(text) {
        diagnostic.error(IssueKind::MissingField, "未找到字段名".to_string(), None);
    }
}

fn check_operator_presence(text: &str, diagnostic: &mut Diagnostic) {
    let has_comparison = text.contains(['>', '<', '=']);
    if !has_comparison && !OPERATOR_KEYWORD.is_match(text) {
        diagnostic.warn(
            IssueKind::MissingOperator,
            "未找到比较运算符（>、<、>=、<=、=、!=）或逻辑运算符（AND、OR、NOT）".to_string(),
        );
    }
}

fn check_malformed_numbers(text: &str, diagnostic: &mut Diagnostic) {
    let mut tokens: Vec<String> = Vec::new();
    let mut first: Option<usize> = None;

    for m in MALFORMED_NUMBER.find_iter(text) {
        first.get_or_insert(m.start());
        if !tokens.iter().any(|t| t == m.as_str()) {
            tokens.push(m.as_str().to_string());
        }
    }

    if let Some(start) = first {
        let message = format!("无效的数字格式: {}", tokens.join(", "));
        diagnostic.error(
            IssueKind::MalformedNumber { tokens },
            message,
            Some(char_offset(text, start)),
        );
    }
}

fn check_repeated_logical(text: &str, diagnostic: &mut Diagnostic) {
    let mut sequences: Vec<String> = Vec::new();
    let mut first: Option<usize> = None;

    for m in REPEATED_LOGICAL.find_iter(text) {
        first.get_or_insert(m.start());
        sequences.push(zero_common::util::collapse_whitespace(m.as_str()));
    }

    if let Some(start) = first {
        let message = format!("逻辑运算符重复或使用不当: {}", sequences.join(", "));
        diagnostic.error(
            IssueKind::RepeatedLogicalOperator { sequences },
            message,
            Some(char_offset(text, start)),
        );
    }
}

/// Quotes are paired in order, so one kind may appear inside the other
/// (`"O'Neil"`). Reports the quote left open at the end of the text.
fn check_quotes(text: &str, diagnostic: &mut Diagnostic) {
    let mut open: Option<(char, usize)> = None;

    for (i, c) in text.chars().enumerate() {
        match open {
            Some((quote, _)) if c == quote => open = None,
            None if c == '\'' || c == '"' => open = Some((c, i)),
            _ => {}
        }
    }

    if let Some((quote, position)) = open {
        let name = if quote == '\'' { "单引号" } else { "双引号" };
        let count = text.chars().filter(|&c| c == quote).count();
        diagnostic.error(
            IssueKind::UnbalancedQuotes { quote, count },
            format!("{name}不匹配"),
            Some(position),
        );
    }
}

fn check_characters(text: &str, diagnostic: &mut Diagnostic) {
    let mut chars: Vec<char> = Vec::new();
    for m in UNSUPPORTED_CHAR.find_iter(text) {
        for c in m.as_str().chars() {
            if !chars.contains(&c) {
                chars.push(c);
            }
        }
    }

    if !chars.is_empty() {
        let listed: String = chars.iter().map(|c| format!("'{c}'")).collect::<Vec<_>>().join(" ");
        diagnostic.warn(
            IssueKind::UnsupportedCharacters { chars },
            format!("包含不支持的字符: {listed}"),
        );
    }
}

// ============================================================================
// Tests
// ============================================================================
