//! Insight Client
//!
//! Client for the CloudWatch Logs Insights query API.
//!
//! The poll loop never talks to the SDK directly. It depends on three narrow
//! traits, one per collaborator:
//! - [`JobSubmitter`]: starts a query and returns its handle
//! - [`StatusProber`]: reads the current status and rows of a query
//! - [`JobCanceller`]: asks the service to stop a query early
//!
//! [`InsightsClient`] implements all three against AWS.
//!
//! # Example
//!
//! ```no_run
//! use insight_client::{InsightsClient, JobSubmitter, StatusProber};
//! use insight_core::{QueryRequest, TimeRange};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = InsightsClient::connect("ap-northeast-1", None).await;
//!
//! let request = QueryRequest::new(
//!     TimeRange::from_dates("2018-12-25", "2018-12-26")?,
//!     10,
//!     "/aws/lambda/hoge",
//!     "fields @timestamp, @message",
//! )?;
//!
//! let handle = client.submit(&request).await?;
//! let snapshot = client.probe(&handle).await?;
//! println!("{} rows so far", snapshot.row_count());
//! # Ok(())
//! # }
//! ```

pub mod error;
mod jobs;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use jobs::{CancelAck, JobCanceller, JobSubmitter, StatusProber, snapshot_from_output};

use aws_config::{BehaviorVersion, Region};
use aws_sdk_cloudwatchlogs::Client;
use tracing::debug;

/// CloudWatch Logs Insights client
#[derive(Debug, Clone)]
pub struct InsightsClient {
    /// Region the client was configured for
    region: String,
    /// SDK client instance
    client: Client,
}

impl InsightsClient {
    /// Create a client using the default AWS credential chain
    ///
    /// # Arguments
    /// * `region` - AWS region to send requests to (e.g., "ap-northeast-1")
    /// * `profile` - Optional named profile from the shared config files
    pub async fn connect(region: impl Into<String>, profile: Option<&str>) -> Self {
        let region = region.into();

        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(region.clone()));
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        let sdk_config = loader.load().await;

        debug!(region = %region, profile = ?profile, "Loaded AWS configuration");

        Self {
            region,
            client: Client::new(&sdk_config),
        }
    }

    /// Get the region of this client
    pub fn region(&self) -> &str {
        &self.region
    }
}

