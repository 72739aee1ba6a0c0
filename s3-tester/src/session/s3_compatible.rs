use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use s3::creds::Credentials;
use s3::creds::error::CredentialsError;
use s3::error::S3Error;
use s3::{Bucket, Region};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use super::{Operation, StorageSession, TransferError, TransferResult};

const CONTENT_TYPE: &str = "application/octet-stream";

/// Errors while setting up an [`S3Session`].
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The static credentials were rejected by the client.
    #[error("invalid S3 credentials: {0}")]
    Credentials(#[from] CredentialsError),

    /// The bucket handle could not be created.
    #[error("failed to set up S3 bucket: {0}")]
    Bucket(#[from] S3Error),
}

/// Connection settings for an [`S3Session`].
#[derive(Debug)]
pub struct S3SessionConfig {
    /// Base URL of the store, including scheme and port, e.g. `http://localhost:9000`.
    pub endpoint: String,
    /// Region to sign requests for.
    pub region: String,
    /// Name of an existing bucket.
    pub bucket: String,
    /// Access key for static V4 credentials.
    pub access_key: String,
    /// Secret key for static V4 credentials.
    pub secret_key: SecretString,
    /// Address the bucket as a path segment instead of a subdomain.
    pub path_style: bool,
    /// Timeout applied to each request.
    pub request_timeout: Option<Duration>,
}

/// A [`StorageSession`] talking to an S3-compatible object store.
pub struct S3Session {
    bucket: Box<Bucket>,
}

impl S3Session {
    /// Creates a session bound to the configured bucket.
    ///
    /// No request is sent, so an unreachable endpoint only surfaces as failed operations.
    pub fn new(config: S3SessionConfig) -> Result<Self, ConnectError> {
        let credentials = Credentials::new(
            Some(config.access_key.as_str()),
            Some(config.secret_key.expose_secret()),
            None,
            None,
            None,
        )?;

        let region = Region::Custom {
            region: config.region,
            endpoint: config.endpoint,
        };

        let mut bucket = Bucket::new(&config.bucket, region, credentials)?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }
        if let Some(timeout) = config.request_timeout {
            bucket = bucket.with_request_timeout(timeout)?;
        }

        Ok(Self { bucket })
    }
}

impl fmt::Debug for S3Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Session")
            .field("bucket", &self.bucket.name())
            .field("endpoint", &self.bucket.host())
            .finish_non_exhaustive()
    }
}

fn check_status(operation: Operation, key: &str, status: u16) -> TransferResult<()> {
    match status {
        200..=299 => Ok(()),
        404 => Err(TransferError::NotFound(key.to_owned())),
        status => Err(TransferError::UnexpectedStatus {
            operation,
            key: key.to_owned(),
            status,
        }),
    }
}

#[async_trait::async_trait]
impl StorageSession for S3Session {
    fn name(&self) -> &'static str {
        "s3-compatible"
    }

    #[tracing::instrument(level = "trace", skip_all, fields(%key))]
    async fn put_object(&self, key: &str, body: Bytes) -> TransferResult<()> {
        let response = self
            .bucket
            .put_object_with_content_type(key, &body, CONTENT_TYPE)
            .await?;
        check_status(Operation::Upload, key, response.status_code())
    }

    #[tracing::instrument(level = "trace", skip_all, fields(%key))]
    async fn get_object(&self, key: &str) -> TransferResult<Bytes> {
        let response = self.bucket.get_object(key).await?;
        check_status(Operation::Download, key, response.status_code())?;

        let body = response.bytes().clone();
        tracing::trace!("downloaded {} bytes", body.len());
        Ok(body)
    }

    #[tracing::instrument(level = "trace", skip_all, fields(%key))]
    async fn delete_object(&self, key: &str) -> TransferResult<()> {
        let response = self.bucket.delete_object(key).await?;
        check_status(Operation::Delete, key, response.status_code())
    }
}
