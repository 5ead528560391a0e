//! Expression text: serializing condition chains, validating free-form input,
//! and recovering chains from text.
//!
//! # Round trip
//!
//! ```text
//!   ConditionList ──serialize──▶ text ──validate──▶ Diagnostic
//!         ▲                       │
//!         └──────── parse ────────┘   (best effort, reports leftovers)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use zero_screener::expression::{parse, serialize, validate};
//!
//! let text = serialize(&conditions, &dictionary);
//! assert!(validate(&text).valid);
//! let outcome = parse(&text, &dictionary);
//! ```

pub mod parser;
pub mod serializer;
pub mod tree;
pub mod validator;

pub use parser::{parse, ParseOutcome};
pub use serializer::{condition_to_text, serialize, serialize_with, RenderOptions};
pub use tree::Expr;
pub use validator::{validate, Diagnostic, Issue, IssueKind};
