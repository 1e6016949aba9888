//! Audit trail rows for history-enabled entity types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Values;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryChange {
    Created,
    Updated,
    Deleted,
}

impl HistoryChange {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryChange::Created => "+",
            HistoryChange::Updated => "~",
            HistoryChange::Deleted => "-",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "+" => Some(HistoryChange::Created),
            "~" => Some(HistoryChange::Updated),
            "-" => Some(HistoryChange::Deleted),
            _ => None,
        }
    }
}

/// A snapshot of an entity's stored values at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub history_id: i64,
    pub pk: i64,
    pub change: HistoryChange,
    pub values: Values,
    pub recorded_at: DateTime<Utc>,
}
