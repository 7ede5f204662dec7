//! Insight Core
//!
//! Core types for the Insight log query tool.
//!
//! This crate contains:
//! - Domain types: query requests, job handles, status snapshots and result rows
//! - Validation errors raised while building a query request

pub mod domain;
pub mod error;

pub use domain::job::{JobHandle, QueryStatus, ResultField, ResultRow, StatusSnapshot};
pub use domain::query::{QueryRequest, TimeRange};
pub use error::ValidationError;
