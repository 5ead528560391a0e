//! Filter facets edited independently of the custom condition list.
//!
//! Every facet field is optional. A patch passed to [`Facet::merge`] only
//! overwrites the fields it sets; nothing is validated here.

use serde::{Deserialize, Serialize};

/// A shallow-mergeable group of filter settings.
pub trait Facet: Default {
    /// Overwrite every field that `patch` sets.
    fn merge(&mut self, patch: Self);

    /// Whether no field carries a constraint.
    fn is_empty(&self) -> bool;
}

fn overwrite<T>(slot: &mut Option<T>, patch: Option<T>) {
    if patch.is_some() {
        *slot = patch;
    }
}

fn list_is_empty(list: &Option<Vec<String>>) -> bool {
    list.as_ref().map_or(true, Vec::is_empty)
}

fn range_is_empty(range: &Option<Range>) -> bool {
    range.as_ref().map_or(true, Range::is_empty)
}

// ============================================================================
// Range
// ============================================================================

/// Inclusive numeric bounds; either side may be open.
///
/// `min <= max` is not enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Range {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl Range {
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn at_most(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

// ============================================================================
// Basic
// ============================================================================

/// Market structure filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub markets: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industries: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sectors: Option<Vec<String>>,
    /// Total market cap (亿元)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<Range>,
    /// Latest price (元)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Range>,
    /// Volume (手)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<Range>,
    /// Turnover rate (%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turnover_rate: Option<Range>,
}

impl Facet for BasicFilter {
    fn merge(&mut self, patch: Self) {
        overwrite(&mut self.markets, patch.markets);
        overwrite(&mut self.industries, patch.industries);
        overwrite(&mut self.sectors, patch.sectors);
        overwrite(&mut self.market_cap, patch.market_cap);
        overwrite(&mut self.price, patch.price);
        overwrite(&mut self.volume, patch.volume);
        overwrite(&mut self.turnover_rate, patch.turnover_rate);
    }

    fn is_empty(&self) -> bool {
        list_is_empty(&self.markets)
            && list_is_empty(&self.industries)
            && list_is_empty(&self.sectors)
            && range_is_empty(&self.market_cap)
            && range_is_empty(&self.price)
            && range_is_empty(&self.volume)
            && range_is_empty(&self.turnover_rate)
    }
}

// ============================================================================
// Technical
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossDirection {
    /// Fast average crosses above the slow one
    Golden,
    /// Fast average crosses below the slow one
    Death,
}

impl std::fmt::Display for CrossDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Golden => write!(f, "金叉"),
            Self::Death => write!(f, "死叉"),
        }
    }
}

/// Moving-average cross, e.g. MA5 crossing MA20.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaCross {
    pub fast_period: u32,
    pub slow_period: u32,
    pub direction: CrossDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdSignal {
    GoldenCross,
    DeathCross,
    AboveZero,
    BelowZero,
}

impl std::fmt::Display for MacdSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GoldenCross => write!(f, "MACD金叉"),
            Self::DeathCross => write!(f, "MACD死叉"),
            Self::AboveZero => write!(f, "MACD零轴上方"),
            Self::BelowZero => write!(f, "MACD零轴下方"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolatilityLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for VolatilityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "低波动"),
            Self::Medium => write!(f, "中等波动"),
            Self::High => write!(f, "高波动"),
        }
    }
}

/// Technical indicator filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ma_cross: Option<MaCross>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rsi: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macd: Option<MacdSignal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volatility: Option<VolatilityLevel>,
}

impl Facet for TechnicalFilter {
    fn merge(&mut self, patch: Self) {
        overwrite(&mut self.ma_cross, patch.ma_cross);
        overwrite(&mut self.rsi, patch.rsi);
        overwrite(&mut self.macd, patch.macd);
        overwrite(&mut self.volatility, patch.volatility);
    }

    fn is_empty(&self) -> bool {
        self.ma_cross.is_none()
            && range_is_empty(&self.rsi)
            && self.macd.is_none()
            && self.volatility.is_none()
    }
}

// ============================================================================
// Fundamental
// ============================================================================

/// Valuation, profitability, growth and leverage ranges.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundamentalFilter {
    // === Valuation ===
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pb_ratio: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ps_ratio: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dividend_yield: Option<Range>,

    // === Profitability ===
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roe: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roa: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gross_margin: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_margin: Option<Range>,

    // === Growth ===
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_growth: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_growth: Option<Range>,

    // === Leverage ===
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_ratio: Option<Range>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_ratio: Option<Range>,
}

impl FundamentalFilter {
    fn ranges(&self) -> [&Option<Range>; 12] {
        [
            &self.pe_ratio,
            &self.pb_ratio,
            &self.ps_ratio,
            &self.dividend_yield,
            &self.roe,
            &self.roa,
            &self.gross_margin,
            &self.net_margin,
            &self.revenue_growth,
            &self.profit_growth,
            &self.debt_ratio,
            &self.current_ratio,
        ]
    }
}

impl Facet for FundamentalFilter {
    fn merge(&mut self, patch: Self) {
        overwrite(&mut self.pe_ratio, patch.pe_ratio);
        overwrite(&mut self.pb_ratio, patch.pb_ratio);
        overwrite(&mut self.ps_ratio, patch.ps_ratio);
        overwrite(&mut self.dividend_yield, patch.dividend_yield);
        overwrite(&mut self.roe, patch.roe);
        overwrite(&mut self.roa, patch.roa);
        overwrite(&mut self.gross_margin, patch.gross_margin);
        overwrite(&mut self.net_margin, patch.net_margin);
        overwrite(&mut self.revenue_growth, patch.revenue_growth);
        overwrite(&mut self.profit_growth, patch.profit_growth);
        overwrite(&mut self.debt_ratio, patch.debt_ratio);
        overwrite(&mut self.current_ratio, patch.current_ratio);
    }

    fn is_empty(&self) -> bool {
        self.ranges().into_iter().all(range_is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_merge_is_shallow() {
        let mut basic = BasicFilter {
            industries: Some(vec!["银行".into()]),
            price: Some(Range::between(5.0, 50.0)),
            ..Default::default()
        };
        basic.merge(BasicFilter {
            price: Some(Range::at_most(20.0)),
            ..Default::default()
        });

        assert_eq!(basic.industries, Some(vec!["银行".to_string()]));
        // The whole range is replaced, not merged per bound
        assert_eq!(basic.price, Some(Range::at_most(20.0)));
    }

    #[test]
    fn test_empty_detection() {
        assert!(BasicFilter::default().is_empty());
        assert!(BasicFilter {
            markets: Some(vec![]),
            price: Some(Range::default()),
            ..Default::default()
        }
        .is_empty());
        assert!(!BasicFilter {
            markets: Some(vec!["创业板".into()]),
            ..Default::default()
        }
        .is_empty());

        assert!(TechnicalFilter::default().is_empty());
        assert!(!TechnicalFilter {
            macd: Some(MacdSignal::GoldenCross),
            ..Default::default()
        }
        .is_empty());

        assert!(FundamentalFilter::default().is_empty());
        assert!(!FundamentalFilter {
            current_ratio: Some(Range::at_least(1.5)),
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn test_technical_merge() {
        let mut technical = TechnicalFilter {
            rsi: Some(Range::between(30.0, 70.0)),
            ..Default::default()
        };
        technical.merge(TechnicalFilter {
            ma_cross: Some(MaCross {
                fast_period: 5,
                slow_period: 20,
                direction: CrossDirection::Golden,
            }),
            volatility: Some(VolatilityLevel::Low),
            ..Default::default()
        });

        assert_eq!(technical.rsi, Some(Range::between(30.0, 70.0)));
        assert_eq!(technical.volatility, Some(VolatilityLevel::Low));
        assert_eq!(technical.ma_cross.map(|c| c.slow_period), Some(20));
    }

    #[test]
    fn test_facet_json_shape() {
        let fundamental = FundamentalFilter {
            pe_ratio: Some(Range::at_most(30.0)),
            roe: Some(Range::at_least(15.0)),
            ..Default::default()
        };
        let json = serde_json::to_value(&fundamental).unwrap();
        assert_eq!(json, serde_json::json!({"peRatio": {"max": 30.0}, "roe": {"min": 15.0}}));

        let technical: TechnicalFilter = serde_json::from_str(
            r#"{"maCross": {"fastPeriod": 5, "slowPeriod": 10, "direction": "death"}, "macd": "above_zero"}"#,
        )
        .unwrap();
        assert_eq!(
            technical.ma_cross.map(|c| c.direction),
            Some(CrossDirection::Death)
        );
        assert_eq!(technical.macd, Some(MacdSignal::AboveZero));
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(CrossDirection::Golden.to_string(), "金叉");
        assert_eq!(MacdSignal::BelowZero.to_string(), "MACD零轴下方");
        assert_eq!(VolatilityLevel::High.to_string(), "高波动");
    }
}
