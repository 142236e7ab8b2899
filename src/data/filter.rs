use serde::Deserialize;

use super::model::WaveType;
use crate::error::QueryError;

pub const DEFAULT_LIMIT: i64 = 10_000;
pub const MAX_LIMIT: i64 = 100_000;

// ---------------------------------------------------------------------------
// Partial-match predicate
// ---------------------------------------------------------------------------

/// Case-sensitive substring test. An empty `wanted` matches everything.
pub fn partial_match(stored: &str, wanted: &str) -> bool {
    stored.contains(wanted)
}

/// Author / nfo predicate shared by every velocity collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelFilter {
    pub author: String,
    pub nfo: String,
}

impl ModelFilter {
    pub fn new(author: impl Into<String>, nfo: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            nfo: nfo.into(),
        }
    }

    /// A row passes when both stored values contain the filter values.
    pub fn matches(&self, author: &str, nfo: &str) -> bool {
        partial_match(author, &self.author) && partial_match(nfo, &self.nfo)
    }
}

// ---------------------------------------------------------------------------
// Pagination window
// ---------------------------------------------------------------------------

/// Validated `(limit, offset)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: usize,
    pub offset: usize,
}

impl Window {
    /// Check raw caller values against `[1, MAX_LIMIT]` and `>= 0`.
    pub fn new(limit: i64, offset: i64) -> Result<Self, QueryError> {
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(QueryError::Validation(format!(
                "limit must be between 1 and {MAX_LIMIT}, got {limit}"
            )));
        }
        if offset < 0 {
            return Err(QueryError::Validation(format!(
                "offset must be >= 0, got {offset}"
            )));
        }
        Ok(Self {
            limit: limit as usize,
            offset: offset as usize,
        })
    }
}

impl Default for Window {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT as usize,
            offset: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Raw requests, as handed over by a front end
// ---------------------------------------------------------------------------

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Parameters of a 1D query before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct Query1D {
    pub author: String,
    pub nfo: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

/// Parameters of a 3D query before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct Query3D {
    pub wave_type: String,
    pub author: String,
    #[serde(default)]
    pub nfo: String,
    #[serde(default)]
    pub include_r: bool,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

/// A 1D query that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved1D {
    pub filter: ModelFilter,
    pub window: Window,
}

/// A 3D query that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved3D {
    pub wave_type: WaveType,
    pub filter: ModelFilter,
    pub include_r: bool,
    pub window: Window,
}

impl Query1D {
    pub fn resolve(&self) -> Result<Resolved1D, QueryError> {
        Ok(Resolved1D {
            filter: ModelFilter::new(self.author.as_str(), self.nfo.as_str()),
            window: Window::new(self.limit, self.offset)?,
        })
    }
}

impl Query3D {
    pub fn resolve(&self) -> Result<Resolved3D, QueryError> {
        let wave_type = self
            .wave_type
            .parse::<WaveType>()
            .map_err(|e| QueryError::Validation(e.to_string()))?;
        Ok(Resolved3D {
            wave_type,
            filter: ModelFilter::new(self.author.as_str(), self.nfo.as_str()),
            include_r: self.include_r,
            window: Window::new(self.limit, self.offset)?,
        })
    }
}
