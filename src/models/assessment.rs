//! Threshold assessment of an enriched domain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::records::{ArchiveRecord, TrafficRecord};

/// Thresholds from the `analysis` configuration section.
///
/// Each threshold is optional; the flag it drives is left unset when it is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisThresholds {
    /// Average visits below which a domain counts as low-traffic
    #[serde(default)]
    pub traffic_threshold: Option<f64>,
    /// Archive age in days below which a domain counts as recently archived
    #[serde(default)]
    pub days_threshold: Option<i64>,
}

/// Flags derived from a domain's records. Fields backed by a missing record are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Assessment {
    /// Days since the earliest capture
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_age_days: Option<i64>,
    /// Earliest capture is younger than `days_threshold`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recently_archived: Option<bool>,
    /// Mean of the visit series
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_visits: Option<f64>,
    /// Mean visits are below `traffic_threshold`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_traffic: Option<bool>,
}

impl Assessment {
    /// Evaluates the records against `thresholds` as of `now`.
    pub fn evaluate(
        archive: Option<&ArchiveRecord>,
        traffic: Option<&TrafficRecord>,
        thresholds: &AnalysisThresholds,
        now: DateTime<Utc>,
    ) -> Self {
        let archive_age_days = archive.map(|record| (now - record.captured_at).num_days().max(0));
        let average_visits = traffic.and_then(TrafficRecord::average_visits);
        Self {
            archive_age_days,
            recently_archived: archive_age_days
                .zip(thresholds.days_threshold)
                .map(|(days, threshold)| days < threshold),
            average_visits,
            low_traffic: average_visits
                .zip(thresholds.traffic_threshold)
                .map(|(avg, threshold)| avg < threshold),
        }
    }
}
