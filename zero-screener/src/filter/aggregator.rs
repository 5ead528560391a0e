//! One editing session's filter specification.
//!
//! The aggregator owns every facet, hands out condition ids, and decides what
//! goes downstream: a non-blank expression is sent alone, otherwise the
//! structured facets are.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use zero_common::config::{ScreenerConfig, DEFAULT_LOG_PREVIEW_CHARS};
use zero_common::util::log_preview;
use zero_common::{Error, Result};

use super::facets::{BasicFilter, Facet, FundamentalFilter, TechnicalFilter};
use crate::condition::{Condition, ConditionList, ConditionValue, LogicalConnector};
use crate::dictionary::{FieldDictionary, Operator};
use crate::expression::{self, Diagnostic, RenderOptions};

// ============================================================================
// Filter Specification
// ============================================================================

/// Everything the user has set up in one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic: Option<BasicFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical: Option<TechnicalFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fundamental: Option<FundamentalFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_rules: ConditionList,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub expression: String,
}

impl FilterSpec {
    /// Whether any structured facet carries a constraint.
    pub fn has_structured(&self) -> bool {
        self.basic.as_ref().is_some_and(|f| !f.is_empty())
            || self.technical.as_ref().is_some_and(|f| !f.is_empty())
            || self.fundamental.as_ref().is_some_and(|f| !f.is_empty())
            || !self.custom_rules.is_empty()
    }

    pub fn has_expression(&self) -> bool {
        !self.expression.trim().is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_structured() && !self.has_expression()
    }
}

// ============================================================================
// Mode & Outbound Request
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMode {
    #[default]
    Structured,
    Advanced,
}

impl std::fmt::Display for EditMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Structured => write!(f, "结构化"),
            Self::Advanced => write!(f, "高级表达式"),
        }
    }
}

/// Structured facets as sent downstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basic: Option<BasicFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical: Option<TechnicalFilter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fundamental: Option<FundamentalFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_rules: ConditionList,
}

/// What the execution side receives. Exactly one mode is ever sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FilterRequest {
    Structured(StructuredFilter),
    Advanced { expression: String },
}

// ============================================================================
// Condition Edits
// ============================================================================

/// Partial edit of one condition. Unset fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionUpdate {
    pub field_key: Option<String>,
    pub operator: Option<Operator>,
    pub value: Option<ConditionValue>,
    /// `Some(None)` removes the connector
    pub logical_connector: Option<Option<LogicalConnector>>,
}

impl ConditionUpdate {
    pub fn field(key: impl Into<String>) -> Self {
        Self {
            field_key: Some(key.into()),
            ..Self::default()
        }
    }

    pub fn operator(operator: Operator) -> Self {
        Self {
            operator: Some(operator),
            ..Self::default()
        }
    }

    pub fn value(value: ConditionValue) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn connector(connector: Option<LogicalConnector>) -> Self {
        Self {
            logical_connector: Some(connector),
            ..Self::default()
        }
    }
}

// ============================================================================
// Aggregator
// ============================================================================

/// Owns one session's [`FilterSpec`] and its editing mode.
///
/// Sessions never share mutable state; the dictionary is shared read-only.
pub struct FilterAggregator {
    dictionary: Arc<FieldDictionary>,
    render: RenderOptions,
    preview_chars: usize,
    session_id: String,
    spec: FilterSpec,
    mode: EditMode,
}

impl FilterAggregator {
    pub fn new(dictionary: Arc<FieldDictionary>) -> Self {
        Self::build(dictionary, RenderOptions::default(), DEFAULT_LOG_PREVIEW_CHARS)
    }

    pub fn with_config(dictionary: Arc<FieldDictionary>, config: &ScreenerConfig) -> Self {
        Self::build(
            dictionary,
            RenderOptions::from(config),
            config.log_preview_chars,
        )
    }

    fn build(dictionary: Arc<FieldDictionary>, render: RenderOptions, preview_chars: usize) -> Self {
        let session_id = zero_common::logging::generate_session_id();
        tracing::debug!(session_id = %session_id, "Filter session started");
        Self {
            dictionary,
            render,
            preview_chars,
            session_id,
            spec: FilterSpec::default(),
            mode: EditMode::default(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn dictionary(&self) -> &FieldDictionary {
        &self.dictionary
    }

    pub fn spec(&self) -> &FilterSpec {
        &self.spec
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.spec.custom_rules
    }

    pub fn condition(&self, id: &str) -> Option<&Condition> {
        self.spec.custom_rules.iter().find(|c| c.id == id)
    }

    // === Facets ===

    pub fn set_basic(&mut self, patch: BasicFilter) {
        merge_facet(&mut self.spec.basic, patch);
    }

    pub fn set_technical(&mut self, patch: TechnicalFilter) {
        merge_facet(&mut self.spec.technical, patch);
    }

    pub fn set_fundamental(&mut self, patch: FundamentalFilter) {
        merge_facet(&mut self.spec.fundamental, patch);
    }

    // === Custom rules ===

    /// Append a condition and return its id.
    pub fn add_condition(
        &mut self,
        field_key: impl Into<String>,
        operator: Operator,
        value: ConditionValue,
    ) -> String {
        let condition = Condition::new(&self.dictionary, field_key, operator, value);
        self.push_condition(condition)
    }

    /// Append an already built condition and return its id.
    pub fn push_condition(&mut self, condition: Condition) -> String {
        let _span = zero_common::session_span!(self.session_id).entered();
        if !self.dictionary.contains(&condition.field_key) {
            tracing::debug!(field = %condition.field_key, "Condition uses a field outside the dictionary");
        }
        let id = condition.id.clone();
        self.spec.custom_rules.push(condition);
        tracing::debug!(id = %id, total = self.spec.custom_rules.len(), "Condition added");
        id
    }

    /// Apply a partial edit. Changing the field refreshes the cached label.
    pub fn update_condition(&mut self, id: &str, update: ConditionUpdate) -> Result<()> {
        let _span = zero_common::session_span!(self.session_id).entered();
        let dictionary = Arc::clone(&self.dictionary);
        let condition = self
            .spec
            .custom_rules
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::ConditionNotFound(id.to_string()))?;

        if let Some(field_key) = update.field_key {
            condition.field_key = field_key;
            condition.refresh_label(&dictionary);
        }
        if let Some(operator) = update.operator {
            condition.operator = operator;
        }
        if let Some(value) = update.value {
            condition.value = value;
        }
        if let Some(connector) = update.logical_connector {
            condition.logical_connector = connector;
        }

        if !condition.is_well_formed() {
            tracing::debug!(id = %id, operator = ?condition.operator, "Condition value does not fit its operator");
        }
        Ok(())
    }

    /// Remove a condition.
    ///
    /// The predecessor keeps its connector, which now joins it to whatever
    /// follows the removed condition.
    pub fn remove_condition(&mut self, id: &str) -> Result<Condition> {
        let _span = zero_common::session_span!(self.session_id).entered();
        let index = self
            .spec
            .custom_rules
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| Error::ConditionNotFound(id.to_string()))?;
        let removed = self.spec.custom_rules.remove(index);
        tracing::debug!(id = %id, total = self.spec.custom_rules.len(), "Condition removed");
        Ok(removed)
    }

    // === Expression ===

    /// Store raw expression text. Custom rules are untouched.
    pub fn set_expression(&mut self, text: impl Into<String>) {
        self.spec.expression = text.into();
        tracing::debug!(
            session_id = %self.session_id,
            expression = %log_preview(&self.spec.expression, self.preview_chars),
            "Expression set"
        );
    }

    pub fn validate_expression(&self) -> Diagnostic {
        expression::validate(&self.spec.expression)
    }

    /// Overwrite the expression with the serialized custom rules.
    pub fn sync_expression_from_rules(&mut self) -> &str {
        self.spec.expression =
            expression::serialize_with(&self.spec.custom_rules, &self.dictionary, self.render);
        &self.spec.expression
    }

    /// Replace the custom rules with what can be recovered from the expression.
    ///
    /// Returns the segments that could not be turned into conditions. When
    /// nothing at all is recovered the existing rules are kept.
    pub fn import_expression(&mut self) -> Vec<String> {
        let _span = zero_common::session_span!(self.session_id).entered();
        let outcome = expression::parse(&self.spec.expression, &self.dictionary);
        if outcome.conditions.is_empty() {
            tracing::warn!(
                unparsed = outcome.unparsed.len(),
                "No condition recovered from expression, keeping existing rules"
            );
        } else {
            tracing::info!(
                conditions = outcome.conditions.len(),
                unparsed = outcome.unparsed.len(),
                "Imported expression into custom rules"
            );
            self.spec.custom_rules = outcome.conditions;
        }
        outcome.unparsed
    }

    // === Mode ===

    /// Switch between structured and advanced editing.
    ///
    /// Leaving advanced mode clears the expression. Entering it leaves the
    /// structured facets in place; they are simply not sent while an
    /// expression is present.
    pub fn toggle_advanced_mode(&mut self, enabled: bool) {
        let next = if enabled {
            EditMode::Advanced
        } else {
            EditMode::Structured
        };
        if !enabled {
            self.spec.expression.clear();
        }
        if next != self.mode {
            tracing::debug!(
                session_id = %self.session_id,
                from = ?self.mode,
                to = ?next,
                "Edit mode changed"
            );
        }
        self.mode = next;
    }

    pub fn has_any_filter(&self) -> bool {
        !self.spec.is_empty()
    }

    /// Drop every facet and return to structured mode.
    pub fn clear(&mut self) {
        self.spec = FilterSpec::default();
        self.mode = EditMode::Structured;
        tracing::debug!(session_id = %self.session_id, "Filter cleared");
    }

    /// Build the outbound request, or `None` when there is nothing to send.
    pub fn build_request(&self) -> Option<FilterRequest> {
        if self.spec.has_expression() {
            if self.spec.has_structured() {
                tracing::debug!(
                    session_id = %self.session_id,
                    "Structured facets present but superseded by expression"
                );
            }
            return Some(FilterRequest::Advanced {
                expression: self.spec.expression.trim().to_string(),
            });
        }

        if !self.spec.has_structured() {
            return None;
        }

        Some(FilterRequest::Structured(StructuredFilter {
            basic: self.spec.basic.clone().filter(|f| !f.is_empty()),
            technical: self.spec.technical.clone().filter(|f| !f.is_empty()),
            fundamental: self.spec.fundamental.clone().filter(|f| !f.is_empty()),
            custom_rules: self.spec.custom_rules.clone(),
        }))
    }

    pub fn into_spec(self) -> FilterSpec {
        self.spec
    }
}

impl std::fmt::Debug for FilterAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterAggregator")
            .field("session_id", &self.session_id)
            .field("mode", &self.mode)
            .field("spec", &self.spec)
            .field("dictionary_fields", &self.dictionary.len())
            .finish()
    }
}

fn merge_facet<F: Facet>(slot: &mut Option<F>, patch: F) {
    slot.get_or_insert_with(F::default).merge(patch);
}
