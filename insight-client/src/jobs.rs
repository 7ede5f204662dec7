//! Query job API calls
//!
//! Defines the collaborator traits used by the poll loop and implements them
//! for [`InsightsClient`] on top of StartQuery, GetQueryResults and StopQuery.

use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::error::DisplayErrorContext;
use aws_sdk_cloudwatchlogs::operation::get_query_results::GetQueryResultsOutput;
use aws_sdk_cloudwatchlogs::operation::stop_query::{StopQueryError, StopQueryOutput};
use insight_core::{JobHandle, QueryRequest, QueryStatus, ResultField, ResultRow, StatusSnapshot};
use tracing::{debug, info, warn};

use crate::InsightsClient;
use crate::error::{ClientError, Result};

/// Starts queries on the service
#[async_trait]
pub trait JobSubmitter: Send + Sync {
    /// Submits a validated query
    ///
    /// # Returns
    /// The handle of the newly started job
    async fn submit(&self, request: &QueryRequest) -> Result<JobHandle>;
}

/// Reads the state of running queries
#[async_trait]
pub trait StatusProber: Send + Sync {
    /// Fetches the current status and the rows collected so far
    async fn probe(&self, handle: &JobHandle) -> Result<StatusSnapshot>;
}

/// Stops running queries
#[async_trait]
pub trait JobCanceller: Send + Sync {
    /// Requests early termination of a job
    ///
    /// A job that already finished is reported as
    /// [`ClientError::AlreadyTerminal`].
    async fn cancel(&self, handle: &JobHandle) -> Result<CancelAck>;
}

/// Acknowledgement of a stop request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancelAck {
    pub handle: JobHandle,
}

#[async_trait]
impl JobSubmitter for InsightsClient {
    async fn submit(&self, request: &QueryRequest) -> Result<JobHandle> {
        debug!(
            log_group = request.resource_name(),
            start = request.start_time(),
            end = request.end_time(),
            limit = request.limit(),
            "Starting query"
        );

        let output = self
            .client
            .start_query()
            .log_group_name(request.resource_name())
            .start_time(request.start_time())
            .end_time(request.end_time())
            .limit(i32::try_from(request.limit()).unwrap_or(i32::MAX))
            .query_string(request.query())
            .send()
            .await
            .map_err(|e| {
                let rejected = e.as_service_error().is_some_and(|se| {
                    se.is_invalid_parameter_exception() || se.is_malformed_query_exception()
                });
                if rejected {
                    ClientError::InvalidRequest(DisplayErrorContext(&e).to_string())
                } else {
                    ClientError::transport("StartQuery", DisplayErrorContext(&e).to_string())
                }
            })?;

        let query_id = output.query_id().ok_or(ClientError::MissingField("queryId"))?;

        info!("Started query {}", query_id);
        Ok(JobHandle::new(query_id))
    }
}

#[async_trait]
impl StatusProber for InsightsClient {
    async fn probe(&self, handle: &JobHandle) -> Result<StatusSnapshot> {
        let output = self
            .client
            .get_query_results()
            .query_id(handle.as_str())
            .send()
            .await
            .map_err(|e| {
                ClientError::transport("GetQueryResults", DisplayErrorContext(&e).to_string())
            })?;

        let snapshot = snapshot_from_output(&output);
        debug!(
            "Query {} is {} with {} row(s)",
            handle,
            snapshot.status,
            snapshot.row_count()
        );
        Ok(snapshot)
    }
}

#[async_trait]
impl JobCanceller for InsightsClient {
    async fn cancel(&self, handle: &JobHandle) -> Result<CancelAck> {
        let output = self
            .client
            .stop_query()
            .query_id(handle.as_str())
            .send()
            .await
            .map_err(|e| {
                stop_error(
                    handle,
                    e.as_service_error(),
                    DisplayErrorContext(&e).to_string(),
                )
            })?;

        let ack = stop_ack(handle, &output)?;
        info!("Stopped query {}", handle);
        Ok(ack)
    }
}

/// Classifies a failed StopQuery call
///
/// The service answers InvalidParameterException for a query that is no
/// longer running; everything else is a transport failure.
fn stop_error(
    handle: &JobHandle,
    service_error: Option<&StopQueryError>,
    message: String,
) -> ClientError {
    if service_error.is_some_and(|se| se.is_invalid_parameter_exception()) {
        ClientError::AlreadyTerminal {
            handle: handle.clone(),
            message,
        }
    } else {
        ClientError::transport("StopQuery", message)
    }
}

/// Turns a StopQuery response into an acknowledgement
fn stop_ack(handle: &JobHandle, output: &StopQueryOutput) -> Result<CancelAck> {
    if !output.success() {
        warn!("Service declined to stop query {}", handle);
        return Err(ClientError::CancelRejected {
            handle: handle.clone(),
        });
    }

    Ok(CancelAck {
        handle: handle.clone(),
    })
}

/// Converts a GetQueryResults response into a status snapshot
///
/// A response without a status is classified as an unrecognized empty label.
/// Fields without a name or value are rendered as empty strings.
pub fn snapshot_from_output(output: &GetQueryResultsOutput) -> StatusSnapshot {
    let status = output
        .status()
        .map(|s| QueryStatus::from_label(s.as_str()))
        .unwrap_or_else(|| QueryStatus::Unrecognized(String::new()));

    let rows = output
        .results()
        .iter()
        .map(|row| {
            row.iter()
                .map(|f| {
                    ResultField::new(f.field().unwrap_or_default(), f.value().unwrap_or_default())
                })
                .collect::<ResultRow>()
        })
        .collect();

    StatusSnapshot::new(status, rows)
}
