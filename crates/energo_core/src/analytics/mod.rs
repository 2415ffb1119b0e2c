//! Report Aggregator: grouped counts and resolution durations over a registration-date window.
//!
//! Every aggregation is a pure function of the windowed incident set; only
//! `aggregate_incidents` touches the store.

use std::collections::BTreeMap;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, PrimitiveDateTime};

use crate::domain::IncidentStatus;
use crate::error::AppError;
use crate::timestamps::{format_date, parse_calendar_date, parse_timestamp};

/// Bucket label for incidents with no assigned brigade.
pub const UNASSIGNED_BRIGADE: &str = "unassigned";
pub const RESOLUTION_HISTOGRAM_BINS: usize = 20;

/// Inclusive registration-date window. Blank or missing bounds are open.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateWindow {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DateWindow {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
        }
    }

    fn bound(field: &str, raw: &Option<String>) -> Result<Option<Date>, AppError> {
        match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => parse_calendar_date(field, s).map(Some),
            None => Ok(None),
        }
    }

    /// Parse both bounds up front so a bad bound aborts before any aggregation work.
    pub fn parse(&self) -> Result<(Option<Date>, Option<Date>), AppError> {
        Ok((
            Self::bound("start", &self.start)?,
            Self::bound("end", &self.end)?,
        ))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    ByType,
    ByStatus,
    DailyRegistrations,
    ByBrigade,
    ResolutionDuration,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryBucket {
    pub key: String,
    pub count: i64,
    pub incident_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyCount {
    pub date: String,
    pub count: i64,
    pub incident_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DurationSample {
    pub incident_id: i64,
    pub hours: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistogramBin {
    pub lower_hours: f64,
    pub upper_hours: f64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolutionDurations {
    pub samples: Vec<DurationSample>,
    pub histogram: Vec<HistogramBin>,
    /// Resolved incidents left out because a timestamp was unusable.
    pub skipped_incident_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum AggregationResult {
    ByType(Vec<CategoryBucket>),
    ByStatus(Vec<CategoryBucket>),
    DailyRegistrations(Vec<DailyCount>),
    ByBrigade(Vec<CategoryBucket>),
    ResolutionDuration(ResolutionDurations),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", content = "result", rename_all = "snake_case")]
pub enum AggregationOutcome {
    Ready(AggregationResult),
    NoData,
}

impl AggregationOutcome {
    pub fn is_no_data(&self) -> bool {
        matches!(self, AggregationOutcome::NoData)
    }
}

/// Incident columns the aggregations need, kept as stored so that foreign
/// status values and unparseable timestamps can be reported rather than rejected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReportRow {
    pub id: i64,
    pub incident_type: String,
    pub status: String,
    pub assigned_brigade: Option<String>,
    pub registered_at: String,
    pub resolved_at: Option<String>,
}

/// A report row whose registration timestamp parsed and fell inside the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowedIncident {
    pub row: ReportRow,
    pub registered: PrimitiveDateTime,
}

pub fn load_report_rows(conn: &Connection) -> Result<Vec<ReportRow>, AppError> {
    let mut stmt = conn
        .prepare(
            r#"
      SELECT id, incident_type, status, assigned_brigade, registered_at, resolved_at
      FROM incidents
      ORDER BY registered_at ASC, id ASC
      "#,
        )
        .map_err(|e| {
            AppError::storage("DB_QUERY_FAILED", "Failed to prepare report query")
                .with_details(e.to_string())
        })?;

    let rows = stmt
        .query_map([], |row| {
            Ok(ReportRow {
                id: row.get(0)?,
                incident_type: row.get(1)?,
                status: row.get(2)?,
                assigned_brigade: row.get(3)?,
                registered_at: row.get(4)?,
                resolved_at: row.get(5)?,
            })
        })
        .map_err(|e| {
            AppError::storage("DB_QUERY_FAILED", "Failed to query incidents for report")
                .with_details(e.to_string())
        })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| {
            AppError::storage("DB_QUERY_FAILED", "Failed to decode report row")
                .with_details(e.to_string())
        })?);
    }
    Ok(out)
}

pub fn window_rows(
    rows: Vec<ReportRow>,
    start: Option<Date>,
    end: Option<Date>,
) -> Vec<WindowedIncident> {
    let mut out = Vec::new();
    for row in rows {
        let registered = match parse_timestamp(&row.registered_at) {
            Ok(dt) => dt,
            Err(_) => {
                log::warn!(
                    "Could not parse registration time for incident ID:{}: {}",
                    row.id,
                    row.registered_at
                );
                continue;
            }
        };
        let date = registered.date();
        if start.is_some_and(|s| date < s) || end.is_some_and(|e| date > e) {
            continue;
        }
        out.push(WindowedIncident { row, registered });
    }
    out
}

fn into_buckets(map: BTreeMap<String, Vec<i64>>) -> Vec<CategoryBucket> {
    map.into_iter()
        .map(|(key, mut ids)| {
            ids.sort();
            CategoryBucket {
                key,
                count: ids.len() as i64,
                incident_ids: ids,
            }
        })
        .collect()
}

pub fn count_by_type(incidents: &[WindowedIncident]) -> Vec<CategoryBucket> {
    let mut map: BTreeMap<String, Vec<i64>> = BTreeMap::new();
    for inc in incidents {
        map.entry(inc.row.incident_type.clone())
            .or_default()
            .push(inc.row.id);
    }
    into_buckets(map)
}

fn status_order_key(key: &str) -> (usize, &str) {
    match IncidentStatus::parse(key) {
        Some(IncidentStatus::Registered) => (0, key),
        Some(IncidentStatus::InProgress) => (1, key),
        Some(IncidentStatus::Resolved) => (2, key),
        None => (3, key),
    }
}

/// Lifecycle statuses first in lifecycle order, then any other stored value ascending.
pub fn count_by_status(incidents: &[WindowedIncident]) -> Vec<CategoryBucket> {
    let mut map: BTreeMap<String, Vec<i64>> = BTreeMap::new();
    for inc in incidents {
        map.entry(inc.row.status.clone()).or_default().push(inc.row.id);
    }
    let mut buckets = into_buckets(map);
    buckets.sort_by(|a, b| status_order_key(&a.key).cmp(&status_order_key(&b.key)));
    buckets
}

pub fn count_by_brigade(incidents: &[WindowedIncident]) -> Vec<CategoryBucket> {
    let mut map: BTreeMap<String, Vec<i64>> = BTreeMap::new();
    for inc in incidents {
        let key = inc
            .row
            .assigned_brigade
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .unwrap_or(UNASSIGNED_BRIGADE)
            .to_string();
        map.entry(key).or_default().push(inc.row.id);
    }
    into_buckets(map)
}

/// Registrations per calendar day, chronological. Days without incidents are absent.
pub fn daily_registrations(incidents: &[WindowedIncident]) -> Result<Vec<DailyCount>, AppError> {
    let mut map: BTreeMap<Date, Vec<i64>> = BTreeMap::new();
    for inc in incidents {
        map.entry(inc.registered.date())
            .or_default()
            .push(inc.row.id);
    }

    let mut out = Vec::new();
    for (date, mut ids) in map {
        ids.sort();
        out.push(DailyCount {
            date: format_date(date)?,
            count: ids.len() as i64,
            incident_ids: ids,
        });
    }
    Ok(out)
}

pub fn resolution_durations(incidents: &[WindowedIncident]) -> ResolutionDurations {
    let mut samples = Vec::new();
    let mut skipped_incident_ids = Vec::new();

    for inc in incidents {
        let Some(resolved_raw) = inc.row.resolved_at.as_deref() else {
            continue;
        };
        let resolved = match parse_timestamp(resolved_raw) {
            Ok(dt) => dt,
            Err(_) => {
                log::warn!(
                    "Could not parse datetime for incident resolution: {}, {resolved_raw}",
                    inc.row.registered_at
                );
                skipped_incident_ids.push(inc.row.id);
                continue;
            }
        };

        let hours = (resolved - inc.registered).as_seconds_f64() / 3600.0;
        if hours < 0.0 {
            log::warn!(
                "Incident ID:{} resolved before it was registered; skipping duration",
                inc.row.id
            );
            skipped_incident_ids.push(inc.row.id);
            continue;
        }
        samples.push(DurationSample {
            incident_id: inc.row.id,
            hours,
        });
    }

    let hours = samples.iter().map(|s| s.hours).collect::<Vec<_>>();
    ResolutionDurations {
        histogram: histogram(&hours, RESOLUTION_HISTOGRAM_BINS),
        samples,
        skipped_incident_ids,
    }
}

/// Equal-width histogram over `[min, max]`; the last bin includes its upper edge.
///
/// A single-valued sample set is spread over `[v - 0.5, v + 0.5]`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = if max - min > 0.0 {
        (min, max)
    } else {
        (min - 0.5, max + 0.5)
    };
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0i64; bins];
    for v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower_hours: lo + width * i as f64,
            upper_hours: if i + 1 == bins {
                hi
            } else {
                lo + width * (i + 1) as f64
            },
            count,
        })
        .collect()
}

pub fn aggregate(
    incidents: &[WindowedIncident],
    kind: AggregationKind,
) -> Result<AggregationOutcome, AppError> {
    if incidents.is_empty() {
        return Ok(AggregationOutcome::NoData);
    }

    let result = match kind {
        AggregationKind::ByType => AggregationResult::ByType(count_by_type(incidents)),
        AggregationKind::ByStatus => AggregationResult::ByStatus(count_by_status(incidents)),
        AggregationKind::DailyRegistrations => {
            AggregationResult::DailyRegistrations(daily_registrations(incidents)?)
        }
        AggregationKind::ByBrigade => AggregationResult::ByBrigade(count_by_brigade(incidents)),
        AggregationKind::ResolutionDuration => {
            let durations = resolution_durations(incidents);
            if durations.samples.is_empty() {
                return Ok(AggregationOutcome::NoData);
            }
            AggregationResult::ResolutionDuration(durations)
        }
    };

    Ok(AggregationOutcome::Ready(result))
}

pub fn aggregate_incidents(
    conn: &Connection,
    window: &DateWindow,
    kind: AggregationKind,
) -> Result<AggregationOutcome, AppError> {
    let (start, end) = window.parse()?;
    let rows = load_report_rows(conn)?;
    let windowed = window_rows(rows, start, end);
    log::debug!(
        "Aggregating {} incidents ({kind:?}) in window {:?}..{:?}",
        windowed.len(),
        window.start,
        window.end
    );
    aggregate(&windowed, kind)
}
