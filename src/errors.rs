//! Error types
//!
//! One enum per boundary: reading the playlist, talking to the remote catalog,
//! writing to the store, and the two workflows built on top of them.

use thiserror::Error;

use crate::services::playlist_reader::TextEncoding;

/// Failure reading a playlist resource
#[derive(Error, Debug)]
pub enum ReadError {
    /// The resource does not exist
    #[error("Playlist not found: {path}")]
    NotFound { path: String },

    /// Every configured encoding failed to decode the resource
    #[error("Could not decode {path} with any configured encoding ({})", format_attempts(.attempts))]
    Decode {
        path: String,
        attempts: Vec<(TextEncoding, String)>,
    },

    /// Any other I/O failure while reading
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn format_attempts(attempts: &[(TextEncoding, String)]) -> String {
    attempts
        .iter()
        .map(|(encoding, cause)| format!("{}: {}", encoding, cause))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Remote catalog API errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Non-success HTTP status
    #[error("Remote catalog returned HTTP {status} for {endpoint}")]
    Status { status: u16, endpoint: String },

    /// Payload did not have the expected shape
    #[error("Unexpected payload from {endpoint}: {message}")]
    Schema { endpoint: String, message: String },

    /// Connection, TLS or timeout failure
    #[error("Network error calling {endpoint}: {message}")]
    Network { endpoint: String, message: String },

    /// Client could not be built (bad base URL, TLS backend)
    #[error("Invalid remote catalog client setup: {0}")]
    Setup(String),
}

/// Catalog store errors
#[derive(Error, Debug)]
pub enum StoreError {
    /// Unique/foreign key or check constraint violated
    #[error("Constraint violation on {relation}: {message}")]
    Constraint { relation: String, message: String },

    /// Store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Stored cache payload could not be (de)serialized
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err)
                if db_err.is_unique_violation()
                    || db_err.is_foreign_key_violation()
                    || db_err.is_check_violation() =>
            {
                StoreError::Constraint {
                    relation: db_err.table().unwrap_or("unknown").to_string(),
                    message: db_err.message().to_string(),
                }
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

/// Catalog synchronization errors
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Remote(#[from] CatalogError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Cancelled between iterations; already committed batches stay committed
    #[error("Sync cancelled")]
    Cancelled,
}

/// Channel import errors
#[derive(Error, Debug)]
pub enum ImportError {
    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_lists_every_attempt() {
        let err = ReadError::Decode {
            path: "list.m3u".to_string(),
            attempts: vec![
                (TextEncoding::Utf8, "invalid utf-8 at byte 3".to_string()),
                (TextEncoding::Ascii, "non-ascii byte 0xe9 at 3".to_string()),
            ],
        };
        let message = err.to_string();
        assert!(message.contains("utf-8: invalid utf-8 at byte 3"));
        assert!(message.contains("ascii: non-ascii byte 0xe9 at 3"));
    }

    #[test]
    fn test_status_error_names_endpoint() {
        let err = CatalogError::Status {
            status: 401,
            endpoint: "trending/movie/day".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Remote catalog returned HTTP 401 for trending/movie/day"
        );
    }
}
