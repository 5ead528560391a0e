//! Field and operator registries.
//!
//! The field dictionary maps canonical keys such as `peRatio` to the display
//! labels used in expressions (`市盈率PE`). Both directions are served from one
//! descriptor list: the reverse label index is built at load time, never kept
//! by hand.
//!
//! Lookups never fail. An unknown key or label resolves to itself so that
//! serialization and parsing degrade instead of erroring.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use zero_common::config::ScreenerConfig;
use zero_common::{Error, Result, ResultExt};

// ============================================================================
// Field Descriptor
// ============================================================================

/// Category a screenable field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldCategory {
    Basic,
    Technical,
    Fundamental,
}

impl std::fmt::Display for FieldCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic => write!(f, "基础指标"),
            Self::Technical => write!(f, "技术指标"),
            Self::Fundamental => write!(f, "基本面指标"),
        }
    }
}

impl std::str::FromStr for FieldCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "technical" => Ok(Self::Technical),
            "fundamental" => Ok(Self::Fundamental),
            other => Err(format!("unknown field category: {other}")),
        }
    }
}

/// Value type a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Number,
    String,
    Enum,
}

/// Static description of one screenable field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    /// Canonical key (e.g. `peRatio`)
    pub key: String,
    /// Display label used in expressions (e.g. `市盈率PE`)
    pub label: String,
    pub category: FieldCategory,
    pub value_type: ValueType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_options: Option<Vec<String>>,
}

impl FieldDescriptor {
    fn number(key: &str, label: &str, category: FieldCategory, unit: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            category,
            value_type: ValueType::Number,
            unit: unit.map(str::to_string),
            enum_options: None,
        }
    }

    fn text(key: &str, label: &str, category: FieldCategory) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            category,
            value_type: ValueType::String,
            unit: None,
            enum_options: None,
        }
    }

    fn choice(key: &str, label: &str, category: FieldCategory, options: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            category,
            value_type: ValueType::Enum,
            unit: None,
            enum_options: Some(options.iter().map(|o| o.to_string()).collect()),
        }
    }
}

// ============================================================================
// Operators
// ============================================================================

/// Comparison operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Gt,
    Gte,
    Lt,
    Lte,
    Eq,
    Neq,
    Between,
    In,
}

/// Static description of an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorDescriptor {
    pub key: Operator,
    pub label: &'static str,
    pub symbol: &'static str,
    pub applicable_value_types: &'static [ValueType],
}

const NUMERIC: &[ValueType] = &[ValueType::Number];
const ANY_SCALAR: &[ValueType] = &[ValueType::Number, ValueType::String, ValueType::Enum];
const DISCRETE: &[ValueType] = &[ValueType::String, ValueType::Enum, ValueType::Number];

impl Operator {
    /// Every operator, in editor order.
    pub const ALL: [Operator; 8] = [
        Operator::Gt,
        Operator::Gte,
        Operator::Lt,
        Operator::Lte,
        Operator::Eq,
        Operator::Neq,
        Operator::Between,
        Operator::In,
    ];

    pub const fn descriptor(self) -> OperatorDescriptor {
        let (label, symbol, applicable_value_types) = match self {
            Self::Gt => ("大于", ">", NUMERIC),
            Self::Gte => ("大于等于", ">=", NUMERIC),
            Self::Lt => ("小于", "<", NUMERIC),
            Self::Lte => ("小于等于", "<=", NUMERIC),
            Self::Eq => ("等于", "=", ANY_SCALAR),
            Self::Neq => ("不等于", "!=", ANY_SCALAR),
            Self::Between => ("介于", "BETWEEN", NUMERIC),
            Self::In => ("属于", "IN", DISCRETE),
        };
        OperatorDescriptor {
            key: self,
            label,
            symbol,
            applicable_value_types,
        }
    }

    pub const fn symbol(self) -> &'static str {
        self.descriptor().symbol
    }

    pub const fn label(self) -> &'static str {
        self.descriptor().label
    }

    pub fn applies_to(self, value_type: ValueType) -> bool {
        self.descriptor().applicable_value_types.contains(&value_type)
    }

    /// Map a comparison symbol found in expression text to an operator.
    ///
    /// Accepts both `=` and `==` for equality.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Gte),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Lte),
            "=" | "==" => Some(Self::Eq),
            "!=" => Some(Self::Neq),
            _ => None,
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.symbol())
    }
}

// ============================================================================
// Field Dictionary
// ============================================================================

static BUILTIN: Lazy<Arc<FieldDictionary>> =
    Lazy::new(|| Arc::new(FieldDictionary::index(builtin_fields())));

/// Registry of screenable fields with forward and reverse indices.
#[derive(Debug, Clone)]
pub struct FieldDictionary {
    fields: Vec<FieldDescriptor>,
    by_key: HashMap<String, usize>,
    by_label: HashMap<String, usize>,
}

impl FieldDictionary {
    /// Build a dictionary, rejecting duplicate keys or labels.
    pub fn new(fields: Vec<FieldDescriptor>) -> Result<Self> {
        let mut seen_keys = HashSet::new();
        let mut seen_labels = HashSet::new();

        for field in &fields {
            if field.key.trim().is_empty() {
                return Err(Error::Dictionary("field key must not be empty".into()));
            }
            if field.label.trim().is_empty() {
                return Err(Error::Dictionary(format!(
                    "field {} has an empty label",
                    field.key
                )));
            }
            if !seen_keys.insert(field.key.as_str()) {
                return Err(Error::Dictionary(format!("duplicate field key: {}", field.key)));
            }
            if !seen_labels.insert(field.label.as_str()) {
                return Err(Error::Dictionary(format!(
                    "duplicate field label: {}",
                    field.label
                )));
            }
        }

        Ok(Self::index(fields))
    }

    fn index(fields: Vec<FieldDescriptor>) -> Self {
        let by_key = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.key.clone(), i))
            .collect();
        let by_label = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.label.clone(), i))
            .collect();

        Self {
            fields,
            by_key,
            by_label,
        }
    }

    /// The shared built-in A-share dictionary.
    pub fn builtin() -> Arc<Self> {
        Arc::clone(&BUILTIN)
    }

    /// Load a dictionary from a JSON array of field descriptors.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let fields: Vec<FieldDescriptor> = serde_json::from_str(json)?;
        Self::new(fields)
    }

    /// Load a dictionary from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("reading field dictionary {}", path.display()))?;
        let dictionary = Self::from_json_str(&content)
            .context(format!("loading field dictionary {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            fields = dictionary.len(),
            "Field dictionary loaded"
        );
        Ok(dictionary)
    }

    /// The configured dictionary file, or the built-in one when none is set.
    pub fn from_config(config: &ScreenerConfig) -> Result<Arc<Self>> {
        match &config.dictionary_path {
            Some(path) => Ok(Arc::new(Self::from_json_file(path)?)),
            None => Ok(Self::builtin()),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldDescriptor> {
        self.by_key.get(key).map(|&i| &self.fields[i])
    }

    pub fn get_by_label(&self, label: &str) -> Option<&FieldDescriptor> {
        self.by_label.get(label).map(|&i| &self.fields[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Display label for a key; the key itself when unknown.
    pub fn lookup_label<'a>(&'a self, key: &'a str) -> &'a str {
        match self.get(key) {
            Some(field) => &field.label,
            None => {
                tracing::debug!(key, "Unknown field key, using key as label");
                key
            }
        }
    }

    /// Canonical key for a label; the label itself when unknown.
    ///
    /// A canonical key is accepted in place of a label, and ASCII labels
    /// match case-insensitively (`rsi` → `RSI`).
    pub fn lookup_key_by_label<'a>(&'a self, label: &'a str) -> &'a str {
        if let Some(field) = self.get_by_label(label) {
            return &field.key;
        }
        if let Some(field) = self.get(label) {
            return &field.key;
        }
        if label.is_ascii() {
            if let Some(field) = self
                .fields
                .iter()
                .find(|f| f.label.eq_ignore_ascii_case(label))
            {
                return &field.key;
            }
        }

        tracing::debug!(label, "Unknown field label, using label as key");
        label
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn fields_in(&self, category: FieldCategory) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(move |f| f.category == category)
    }

    /// Operators an editor should offer for the given field.
    ///
    /// Unknown fields are treated as numeric.
    pub fn operators_for(&self, key: &str) -> Vec<Operator> {
        let value_type = self.get(key).map_or(ValueType::Number, |f| f.value_type);
        Operator::ALL
            .into_iter()
            .filter(|op| op.applies_to(value_type))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for FieldDictionary {
    fn default() -> Self {
        (*Self::builtin()).clone()
    }
}

fn builtin_fields() -> Vec<FieldDescriptor> {
    use FieldCategory::{Basic, Fundamental, Technical};

    vec![
        // === Basic ===
        FieldDescriptor::choice(
            "market",
            "市场",
            Basic,
            &["沪市主板", "深市主板", "创业板", "科创板", "北交所"],
        ),
        FieldDescriptor::text("industry", "行业", Basic),
        FieldDescriptor::text("sector", "板块", Basic),
        FieldDescriptor::number("price", "价格", Basic, Some("元")),
        FieldDescriptor::number("changePercent", "涨跌幅", Basic, Some("%")),
        FieldDescriptor::number("volume", "成交量", Basic, Some("手")),
        FieldDescriptor::number("turnover", "成交额", Basic, Some("万元")),
        FieldDescriptor::number("turnoverRate", "换手率", Basic, Some("%")),
        FieldDescriptor::number("marketCap", "总市值", Basic, Some("亿元")),
        FieldDescriptor::number("floatMarketCap", "流通市值", Basic, Some("亿元")),
        // === Technical ===
        FieldDescriptor::number("rsi", "RSI", Technical, None),
        FieldDescriptor::number("macd", "MACD", Technical, None),
        FieldDescriptor::number("macdSignal", "MACD信号线", Technical, None),
        FieldDescriptor::number("ma5", "MA5", Technical, Some("元")),
        FieldDescriptor::number("ma10", "MA10", Technical, Some("元")),
        FieldDescriptor::number("ma20", "MA20", Technical, Some("元")),
        FieldDescriptor::number("ma60", "MA60", Technical, Some("元")),
        FieldDescriptor::number("kdjK", "KDJ_K", Technical, None),
        FieldDescriptor::number("volumeRatio", "量比", Technical, None),
        FieldDescriptor::number("volatility", "波动率", Technical, Some("%")),
        // === Fundamental ===
        FieldDescriptor::number("peRatio", "市盈率PE", Fundamental, Some("倍")),
        FieldDescriptor::number("pbRatio", "市净率PB", Fundamental, Some("倍")),
        FieldDescriptor::number("psRatio", "市销率PS", Fundamental, Some("倍")),
        FieldDescriptor::number("roe", "净资产收益率ROE", Fundamental, Some("%")),
        FieldDescriptor::number("roa", "总资产收益率ROA", Fundamental, Some("%")),
        FieldDescriptor::number("grossMargin", "毛利率", Fundamental, Some("%")),
        FieldDescriptor::number("netMargin", "净利率", Fundamental, Some("%")),
        FieldDescriptor::number("revenueGrowth", "营收增长率", Fundamental, Some("%")),
        FieldDescriptor::number("profitGrowth", "净利润增长率", Fundamental, Some("%")),
        FieldDescriptor::number("debtRatio", "资产负债率", Fundamental, Some("%")),
        FieldDescriptor::number("currentRatio", "流动比率", Fundamental, None),
        FieldDescriptor::number("dividendYield", "股息率", Fundamental, Some("%")),
        FieldDescriptor::number("eps", "每股收益EPS", Fundamental, Some("元")),
    ]
}

// ============================================================================
// Tests
// ============================================================================
