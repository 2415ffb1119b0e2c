use std::cell::Cell;
use std::rc::Rc;

use time::{format_description, Date, Duration, OffsetDateTime, PrimitiveDateTime};

use crate::error::AppError;

/// Fixed-precision local "date and time" layout used for every persisted timestamp.
pub const TIMESTAMP_FORMAT: &str = "[year]-[month]-[day] [hour]:[minute]:[second]";
/// Calendar date layout used for date-only fields and report window bounds.
pub const DATE_FORMAT: &str = "[year]-[month]-[day]";

/// Source of "now" for registration and resolution stamps.
pub trait Clock {
    fn now(&self) -> PrimitiveDateTime;
}

/// Wall clock in the local offset, truncated to whole seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> PrimitiveDateTime {
        let now = OffsetDateTime::now_local().unwrap_or_else(|e| {
            log::warn!("Local UTC offset is indeterminate ({e}); stamping in UTC");
            OffsetDateTime::now_utc()
        });
        let time = now.time().replace_nanosecond(0).unwrap_or(now.time());
        PrimitiveDateTime::new(now.date(), time)
    }
}

/// Manually driven clock for deterministic tests and demo seeding.
///
/// Clones share the same instant, so a test can keep a handle and advance the
/// clock that a session owns.
#[derive(Debug, Clone)]
pub struct FixedClock {
    now: Rc<Cell<PrimitiveDateTime>>,
}

impl FixedClock {
    pub fn new(now: PrimitiveDateTime) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        Ok(Self::new(parse_timestamp(raw)?))
    }

    pub fn set(&self, now: PrimitiveDateTime) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> PrimitiveDateTime {
        self.now.get()
    }
}

fn format_items(fmt: &str) -> Result<Vec<format_description::BorrowedFormatItem<'_>>, AppError> {
    format_description::parse(fmt).map_err(|e| {
        AppError::storage("TS_FORMAT_CONFIG_FAILED", "Timestamp format config error")
            .with_details(format!("fmt={fmt}; err={e}"))
    })
}

pub fn format_timestamp(dt: PrimitiveDateTime) -> Result<String, AppError> {
    let items = format_items(TIMESTAMP_FORMAT)?;
    dt.format(&items).map_err(|e| {
        AppError::storage("TS_FORMAT_FAILED", "Failed to format timestamp").with_details(e.to_string())
    })
}

pub fn format_date(date: Date) -> Result<String, AppError> {
    let items = format_items(DATE_FORMAT)?;
    date.format(&items).map_err(|e| {
        AppError::storage("TS_FORMAT_FAILED", "Failed to format date").with_details(e.to_string())
    })
}

pub fn parse_timestamp(raw: &str) -> Result<PrimitiveDateTime, AppError> {
    let items = format_items(TIMESTAMP_FORMAT)?;
    PrimitiveDateTime::parse(raw.trim(), &items).map_err(|e| {
        AppError::validation("VALIDATION_INVALID_TIMESTAMP", "Timestamp must be YYYY-MM-DD HH:MM:SS")
            .with_details(format!("value={raw}; err={e}"))
    })
}

/// Parse a calendar date; `field` names the input in the resulting error.
pub fn parse_calendar_date(field: &str, raw: &str) -> Result<Date, AppError> {
    let items = format_items(DATE_FORMAT)?;
    Date::parse(raw.trim(), &items).map_err(|e| {
        AppError::validation(
            "VALIDATION_INVALID_DATE",
            format!("{field} must be a calendar date in YYYY-MM-DD format"),
        )
        .with_field(field)
        .with_details(format!("value={raw}; err={e}"))
    })
}

/// Validate an optional date input, returning its canonical form.
///
/// Blank input means "no date" and yields `None`.
pub fn normalize_optional_date(field: &str, raw: Option<&str>) -> Result<Option<String>, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let date = parse_calendar_date(field, raw)?;
    format_date(date).map(Some)
}
