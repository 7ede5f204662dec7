//! Query request domain types

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::ValidationError;

/// Date layout accepted on the command line
pub const DATE_LAYOUT: &str = "%Y-%m-%d";

/// Largest result limit the service accepts
pub const MAX_LIMIT: u32 = 10_000;

/// Longest log group name the service accepts
pub const MAX_RESOURCE_NAME_LEN: usize = 512;

/// Longest query string the service accepts
pub const MAX_QUERY_LEN: usize = 10_000;

/// Time window a query runs over, in epoch seconds
///
/// Only constructible through [`TimeRange::new`], so the end never precedes the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    start: i64,
    end: i64,
}

impl TimeRange {
    /// Builds a range from two epoch timestamps, rejecting an end before the start
    pub fn new(start: i64, end: i64) -> Result<Self, ValidationError> {
        if end < start {
            return Err(ValidationError::InvertedTimeRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Builds a range from two `YYYY-MM-DD` dates, each taken as UTC midnight
    pub fn from_dates(start: &str, end: &str) -> Result<Self, ValidationError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    /// Inclusive start
    pub fn start(&self) -> i64 {
        self.start
    }

    pub fn end(&self) -> i64 {
        self.end
    }
}

/// Parses a `YYYY-MM-DD` date into epoch seconds at UTC midnight
pub fn parse_date(input: &str) -> Result<i64, ValidationError> {
    let date = NaiveDate::parse_from_str(input.trim(), DATE_LAYOUT).map_err(|_| {
        ValidationError::InvalidDate {
            input: input.to_string(),
        }
    })?;

    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .ok_or_else(|| ValidationError::InvalidDate {
            input: input.to_string(),
        })
}

/// A validated query, ready for submission
///
/// Constructed once from command-line input and consumed by the submitter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRequest {
    range: TimeRange,
    limit: u32,
    resource_name: String,
    query: String,
}

impl QueryRequest {
    /// Validates the fields and builds a request
    pub fn new(
        range: TimeRange,
        limit: u32,
        resource_name: impl Into<String>,
        query: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let resource_name = resource_name.into();
        let query = query.into();

        if limit == 0 {
            return Err(ValidationError::ZeroLimit);
        }
        if limit > MAX_LIMIT {
            return Err(ValidationError::LimitTooLarge {
                limit,
                max: MAX_LIMIT,
            });
        }

        if resource_name.trim().is_empty() {
            return Err(ValidationError::EmptyResourceName);
        }
        let len = resource_name.chars().count();
        if len > MAX_RESOURCE_NAME_LEN {
            return Err(ValidationError::ResourceNameTooLong {
                len,
                max: MAX_RESOURCE_NAME_LEN,
            });
        }

        if query.trim().is_empty() {
            return Err(ValidationError::EmptyQuery);
        }
        let len = query.chars().count();
        if len > MAX_QUERY_LEN {
            return Err(ValidationError::QueryTooLong {
                len,
                max: MAX_QUERY_LEN,
            });
        }

        Ok(Self {
            range,
            limit,
            resource_name,
            query,
        })
    }

    pub fn start_time(&self) -> i64 {
        self.range.start
    }

    pub fn end_time(&self) -> i64 {
        self.range.end
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Log group the query runs against
    pub fn resource_name(&self) -> &str {
        &self.resource_name
    }

    pub fn query(&self) -> &str {
        &self.query
    }
}
