use chrono::{DateTime, TimeZone, Utc};

use crate::app::{Result, TributaryError};
use crate::domain::Marker;

/// Which entries a page request covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    All,
    Feed(i64),
    Category(i64),
}

/// One page request over accumulated entries. Not persisted; built per call.
#[derive(Debug, Clone)]
pub struct Page {
    pub filter: Filter,
    /// Resume position from a previous page, if any.
    pub cursor: Option<Cursor>,
    /// Upper bound on returned entries.
    pub count: usize,
    /// Newest-first when true, oldest-first otherwise.
    pub newest: bool,
    /// `None` means any marker.
    pub marker: Option<Marker>,
}

impl Page {
    pub fn new(filter: Filter, count: usize) -> Self {
        Self {
            filter,
            cursor: None,
            count,
            newest: true,
            marker: None,
        }
    }
}

/// Continuation position: the sort key of the last entry already seen.
///
/// Defined purely in terms of publication timestamp plus entry id so that
/// pagination stays stable while new entries are inserted between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub published_at: DateTime<Utc>,
    pub id: i64,
}

impl Cursor {
    /// Opaque token handed back to callers.
    pub fn encode(&self) -> String {
        hex::encode(format!(
            "{}|{}",
            self.published_at.timestamp_millis(),
            self.id
        ))
    }

    pub fn decode(token: &str) -> Result<Self> {
        let invalid = || TributaryError::Validation(format!("invalid cursor: {token}"));

        let bytes = hex::decode(token).map_err(|_| invalid())?;
        let raw = String::from_utf8(bytes).map_err(|_| invalid())?;
        let (millis, id) = raw.split_once('|').ok_or_else(invalid)?;
        let millis: i64 = millis.parse().map_err(|_| invalid())?;
        let id: i64 = id.parse().map_err(|_| invalid())?;
        let published_at = Utc
            .timestamp_millis_opt(millis)
            .single()
            .ok_or_else(invalid)?;

        Ok(Self { published_at, id })
    }
}
