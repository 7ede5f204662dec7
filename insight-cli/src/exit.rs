//! Process exit codes
//!
//! Every failure is mapped to a fixed code so scripts can tell a rejected
//! request from an unreachable service or a query that failed remotely.

use insight_client::ClientError;
use insight_core::ValidationError;
use std::process::ExitCode;

use crate::config::ConfigError;
use crate::scheduler::PollError;

pub const GENERIC: u8 = 1;
pub const VALIDATION: u8 = 2;
pub const TRANSPORT: u8 = 3;
pub const JOB_FAILED: u8 = 4;
pub const JOB_CANCELLED: u8 = 5;
pub const UNKNOWN_STATUS: u8 = 6;
pub const CANCEL_FAILED: u8 = 7;

/// Exit code for a client error raised outside the poll loop
pub fn client_exit_code(err: &ClientError) -> u8 {
    if err.is_validation() {
        VALIDATION
    } else {
        TRANSPORT
    }
}

/// Finds the most specific exit code in an error chain
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<PollError>() {
            return e.exit_code();
        }
        if let Some(e) = cause.downcast_ref::<ClientError>() {
            return client_exit_code(e);
        }
        if cause.is::<ValidationError>() || cause.is::<ConfigError>() {
            return VALIDATION;
        }
    }
    GENERIC
}

pub fn to_exit_code(err: &anyhow::Error) -> ExitCode {
    ExitCode::from(exit_code_for(err))
}
