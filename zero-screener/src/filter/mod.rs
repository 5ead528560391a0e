//! Filter facets and the per-session aggregator.

pub mod aggregator;
pub mod facets;

pub use aggregator::{
    ConditionUpdate, EditMode, FilterAggregator, FilterRequest, FilterSpec, StructuredFilter,
};
pub use facets::{
    BasicFilter, CrossDirection, Facet, FundamentalFilter, MaCross, MacdSignal, Range,
    TechnicalFilter, VolatilityLevel,
};
