use kit_common::attributes::AttributeStoreError;
use thiserror::Error;

/// Enumeration of errors related to building and running identity syncs.
///
/// Only construction errors reach callers; request-path errors are logged by the sync loop.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("error parsing identity endpoint url: {0}")]
    ParseUrlError(#[from] url::ParseError),
    #[error("failed to construct http client for identity sync: {0}")]
    ClientBuildError(reqwest::Error),
    #[error("identity sync requires a running tokio runtime")]
    NoRuntime,
    #[error("identity sync request could not be delivered: {0}")]
    RequestError(reqwest::Error),
    #[error("identity endpoint responded with status {0}")]
    UnexpectedStatus(http::StatusCode),
    #[error("identity response is not valid json: {0}")]
    ParseResponseError(#[from] serde_json::Error),
    #[error("identity response does not contain a d_mid")]
    MissingCloudId,
    #[error("attribute store failure: {0}")]
    AttributeStoreError(#[from] AttributeStoreError),
}
