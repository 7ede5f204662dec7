//! Validation errors for query requests

use thiserror::Error;

/// Reasons a query request can be rejected before it is submitted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("limit must be at least 1")]
    ZeroLimit,

    #[error("limit {limit} exceeds the maximum of {max}")]
    LimitTooLarge { limit: u32, max: u32 },

    #[error("resource name cannot be empty")]
    EmptyResourceName,

    #[error("resource name is {len} characters, maximum is {max}")]
    ResourceNameTooLong { len: usize, max: usize },

    #[error("query text cannot be empty")]
    EmptyQuery,

    #[error("query text is {len} characters, maximum is {max}")]
    QueryTooLong { len: usize, max: usize },

    #[error("end time {end} is before start time {start}")]
    InvertedTimeRange { start: i64, end: i64 },

    #[error("invalid date '{input}', expected YYYY-MM-DD")]
    InvalidDate { input: String },
}
