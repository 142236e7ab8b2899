use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::data::model::WaveType;

/// Failures of the record store itself (as opposed to "no rows matched").
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store lock poisoned")]
    Poisoned,
    #[error("reading snapshot {path}")]
    ReadSnapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("writing snapshot {path}")]
    WriteSnapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot {path} is not valid JSON")]
    DecodeSnapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("encoding snapshot")]
    EncodeSnapshot(#[source] serde_json::Error),
}

/// Every way a query can end without a text body.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("{0}")]
    Validation(String),

    #[error("No data found for author: {author} and NFO: {nfo}")]
    NoData1D { author: String, nfo: String },

    #[error("No {wave_type} data found for author: {author}{}", nfo_suffix(.nfo))]
    NoData3D {
        wave_type: WaveType,
        author: String,
        nfo: String,
    },

    #[error("Offset {offset} exceeds total records ({total}). Max offset: {max_offset}")]
    OffsetExceeded {
        offset: usize,
        total: usize,
        max_offset: usize,
    },

    #[error("Internal server error: {0}")]
    Store(#[from] StoreError),
}

fn nfo_suffix(nfo: &str) -> String {
    if nfo.is_empty() {
        String::new()
    } else {
        format!(" and NFO: {nfo}")
    }
}

/// Error payload handed back to callers: `{"detail": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub detail: String,
}

impl QueryError {
    /// HTTP-equivalent status for the error kind.
    pub fn status_code(&self) -> u16 {
        match self {
            QueryError::Validation(_) => 422,
            QueryError::NoData1D { .. } | QueryError::NoData3D { .. } => 404,
            QueryError::OffsetExceeded { .. } => 400,
            QueryError::Store(_) => 500,
        }
    }

    pub fn detail(&self) -> ErrorDetail {
        ErrorDetail {
            detail: self.to_string(),
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status_code() < 500
    }
}
