//! Condition evaluation against article records.
//!
//! A filter is an ordered sequence of [`crate::models::Condition`]s reduced
//! left to right: each condition's atomic match (XOR'd with its `negate`
//! flag) is folded into the running result with that condition's `and`/`or`
//! tag. There is no precedence and no grouping; `A or B and C` means
//! `(A or B) and C`.
//!
//! # Example
//!
//! ```
//! use newshound::filter::{evaluate, valid_conditions};
//! use newshound::models::{Condition, Field, Logic, Operator};
//!
//! let conditions = vec![Condition {
//!     id: 1,
//!     logic: Logic::None,
//!     negate: false,
//!     field: Field::Title,
//!     operator: Operator::Contains,
//!     value: "rust".to_string(),
//!     values: vec![],
//! }];
//!
//! let conditions = valid_conditions(&conditions);
//! # let articles: Vec<newshound::models::Article> = vec![];
//! let matches: Vec<_> = articles
//!     .iter()
//!     .filter(|a| evaluate(a, &conditions))
//!     .collect();
//! ```

pub mod codec;
mod evaluator;

pub use evaluator::{evaluate, evaluate_at, valid_conditions};
