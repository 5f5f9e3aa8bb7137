//! Request performance tracking.
//!
//! [`PerformanceTracker`] keeps the most recent `max_entries` request
//! records in a FIFO ring and aggregates them on demand. The ring is
//! independent of the response cache: records are dropped strictly
//! oldest-first, never by recency of use.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use serde::Serialize;

use crate::cache::response::round2;

/// Default number of records retained.
pub const DEFAULT_MAX_RECORDS: usize = 1_000;

/// One upstream resource request as seen by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestRecord {
    pub endpoint: String,
    pub duration_ms: f64,
    pub cached: bool,
    pub status_code: Option<u16>,
    pub error: Option<String>,
    #[serde(skip)]
    pub recorded_at: SystemTime,
}

impl RequestRecord {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Duration and cache aggregates over successful records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DurationStats {
    pub avg_duration_ms: f64,
    pub min_duration_ms: f64,
    pub max_duration_ms: f64,
    pub cached_requests: usize,
    pub cache_hit_rate_percent: f64,
}

/// Statistics for one endpoint.
///
/// `durations` is `None` when the endpoint has no successful records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointStats {
    pub endpoint: String,
    pub count: usize,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub durations: Option<DurationStats>,
}

/// Statistics across every retained record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallStats {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub error_requests: usize,
    pub error_rate_percent: f64,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub durations: Option<DurationStats>,
}

/// Bounded FIFO store of recent request records.
pub struct PerformanceTracker {
    records: Mutex<VecDeque<RequestRecord>>,
    max_entries: usize,
}

impl PerformanceTracker {
    pub fn new(max_entries: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(max_entries.min(DEFAULT_MAX_RECORDS))),
            max_entries,
        }
    }

    fn records(&self) -> MutexGuard<'_, VecDeque<RequestRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a record, dropping the oldest ones beyond `max_entries`.
    pub fn record(
        &self,
        endpoint: impl Into<String>,
        duration_ms: f64,
        cached: bool,
        status_code: Option<u16>,
        error: Option<String>,
    ) {
        let record = RequestRecord {
            endpoint: endpoint.into(),
            duration_ms,
            cached,
            status_code,
            error,
            recorded_at: SystemTime::now(),
        };

        let mut records = self.records();
        records.push_back(record);
        while records.len() > self.max_entries {
            records.pop_front();
        }
    }

    /// Aggregate successful records for `endpoint`.
    pub fn endpoint_stats(&self, endpoint: &str) -> EndpointStats {
        let records = self.records();
        let matching: Vec<&RequestRecord> = records
            .iter()
            .filter(|r| r.endpoint == endpoint && r.is_success())
            .collect();

        EndpointStats {
            endpoint: endpoint.to_string(),
            count: matching.len(),
            durations: aggregate(&matching),
        }
    }

    /// Aggregate every retained record.
    pub fn overall_stats(&self) -> OverallStats {
        let records = self.records();
        let successful: Vec<&RequestRecord> = records.iter().filter(|r| r.is_success()).collect();
        let total = records.len();
        let errors = total - successful.len();

        OverallStats {
            total_requests: total,
            successful_requests: successful.len(),
            error_requests: errors,
            error_rate_percent: percent(errors, total),
            durations: aggregate(&successful),
        }
    }

    /// Copy of the retained records, oldest first.
    pub fn recent(&self) -> Vec<RequestRecord> {
        self.records().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every record. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut records = self.records();
        let removed = records.len();
        records.clear();
        removed
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}

impl Default for PerformanceTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RECORDS)
    }
}

fn aggregate(records: &[&RequestRecord]) -> Option<DurationStats> {
    if records.is_empty() {
        return None;
    }

    let durations = records.iter().map(|r| r.duration_ms);
    let sum: f64 = durations.clone().sum();
    let min = durations.clone().fold(f64::INFINITY, f64::min);
    let max = durations.fold(f64::NEG_INFINITY, f64::max);
    let cached = records.iter().filter(|r| r.cached).count();

    Some(DurationStats {
        avg_duration_ms: round2(sum / records.len() as f64),
        min_duration_ms: min,
        max_duration_ms: max,
        cached_requests: cached,
        cache_hit_rate_percent: percent(cached, records.len()),
    })
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round2(part as f64 / whole as f64 * 100.0)
    }
}
