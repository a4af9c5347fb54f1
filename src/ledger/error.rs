use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::storage::activity_store::StoreError;

use super::activity::MINUTES_PER_DAY;

/// Failures the presentation layer is expected to match on and render.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("activity name cannot be empty")]
    EmptyName,

    #[error("duration must be a positive number of minutes")]
    InvalidDuration,

    #[error(
        "{date} would hold {attempted} minutes, {over} over the {capacity} minute day",
        over = .attempted - .capacity
    )]
    CapacityExceeded {
        date: NaiveDate,
        /// Total the date would have reached had the mutation been applied.
        attempted: u32,
        capacity: u32,
    },

    #[error("no activity with id {0}")]
    NotFound(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    pub(crate) fn capacity(date: NaiveDate, attempted: u32) -> Self {
        LedgerError::CapacityExceeded {
            date,
            attempted,
            capacity: MINUTES_PER_DAY,
        }
    }
}

pub type Result<T, E = LedgerError> = std::result::Result<T, E>;
