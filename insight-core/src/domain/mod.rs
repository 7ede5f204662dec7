//! Core domain types
//!
//! These types are shared between the service client (which produces them from
//! API responses) and the command-line binary (which drives the poll loop and
//! renders the results).

pub mod job;
pub mod query;
