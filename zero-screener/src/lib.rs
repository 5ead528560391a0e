//! Zero Screener Library
//!
//! Filter editing for the stock screener: a field dictionary, a flat
//! condition model, the expression text that mirrors it, and the per-session
//! aggregator that decides what is sent to the screening backend.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      FilterAggregator (session)                  │
//! │  basic │ technical │ fundamental │ customRules │ expression       │
//! └────────────────────────────┬─────────────────────────────────────┘
//!                              │ build_request()
//!                              ▼
//!            FilterRequest::Structured | FilterRequest::Advanced
//!
//!   ConditionList ──serialize──▶ text ──validate──▶ Diagnostic
//!         ▲                       │
//!         └──────── parse ────────┘
//! ```
//!
//! # Key Concepts
//!
//! - **Condition chain**: conditions are read left to right; each connector
//!   joins a condition to the next one.
//! - **Advanced wins**: a non-blank expression is sent on its own and the
//!   structured facets are left out of the request.
//! - **Total text functions**: serialization, validation and parsing never
//!   fail; problems come back as data.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod condition;
pub mod dictionary;
pub mod expression;
pub mod filter;

pub use condition::{Condition, ConditionList, ConditionValue, LogicalConnector, Scalar};
pub use dictionary::{
    FieldCategory, FieldDescriptor, FieldDictionary, Operator, OperatorDescriptor, ValueType,
};
pub use expression::{
    parse, serialize, serialize_with, validate, Diagnostic, ParseOutcome, RenderOptions,
};
pub use filter::{EditMode, FilterAggregator, FilterRequest, FilterSpec};
