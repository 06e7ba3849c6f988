//! Crowd report session clustering
//!
//! Reports arrive sorted by time. A session is a run of reports in which
//! every gap to the previous report is under `SESSION_GAP_SECS`. Sessions
//! with at least `MIN_CLUSTER_SIZE` reports become one synthesized record
//! (code 5610) carrying per-region, per-prefecture and per-area tallies;
//! smaller sessions are dropped.

use quake_common::{area, codes, time, Area};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::warn;

use crate::store::Document;

/// Idle gap that closes a session
pub const SESSION_GAP_SECS: i64 = 30;

/// Smallest session promoted to a cluster record
pub const MIN_CLUSTER_SIZE: usize = 3;

/// One crowd "felt it" report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserQuakeReport {
    /// `YYYY/MM/DD HH:MM:SS[.fff]`
    pub time: String,
    /// Area code from the registry
    pub area: i64,
}

impl UserQuakeReport {
    pub fn new(time: impl Into<String>, area: i64) -> Self {
        Self {
            time: time.into(),
            area,
        }
    }

    /// Decode a stored report; `None` when `time` or `area` is missing
    pub fn from_document(doc: &Document) -> Option<Self> {
        let time = doc.get("time")?.as_str()?;
        let area = doc.get("area")?.as_i64()?;
        Some(Self::new(time, area))
    }
}

/// Synthesized record for one qualifying session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterRecord {
    /// Time of the first report in the session
    pub time: String,
    /// Reports in the session, including unmapped areas
    pub count: usize,
    pub regions: BTreeMap<String, u64>,
    pub prefectures: BTreeMap<String, u64>,
    pub areas: BTreeMap<String, u64>,
}

impl ClusterRecord {
    fn from_session<'a>(
        session: &[UserQuakeReport],
        lookup: &impl Fn(i64) -> Option<&'a Area>,
    ) -> Option<Self> {
        let first = session.first()?;
        let mut record = ClusterRecord {
            time: first.time.clone(),
            count: session.len(),
            regions: BTreeMap::new(),
            prefectures: BTreeMap::new(),
            areas: BTreeMap::new(),
        };

        for report in session {
            // Unknown codes still count toward `count`
            if let Some(a) = lookup(report.area) {
                *record.regions.entry(a.region.to_string()).or_default() += 1;
                *record.prefectures.entry(a.prefecture.to_string()).or_default() += 1;
                *record.areas.entry(a.name.to_string()).or_default() += 1;
            }
        }

        Some(record)
    }

    /// Timeline document form
    pub fn to_document(&self) -> Value {
        json!({
            "code": codes::USER_QUAKE_CLUSTER,
            "time": self.time,
            "count": self.count,
            "regions": self.regions,
            "prefectures": self.prefectures,
            "areas": self.areas,
        })
    }
}

fn close_session<'a>(
    session: &mut Vec<UserQuakeReport>,
    out: &mut Vec<ClusterRecord>,
    lookup: &impl Fn(i64) -> Option<&'a Area>,
) {
    if session.len() >= MIN_CLUSTER_SIZE {
        out.extend(ClusterRecord::from_session(session, lookup));
    }
    session.clear();
}

/// Segment time-ordered reports into sessions and aggregate the large ones,
/// naming areas from the built-in registry
pub fn aggregate(reports: &[UserQuakeReport]) -> Vec<ClusterRecord> {
    aggregate_with(reports, area::lookup)
}

/// `aggregate` with a caller-supplied area lookup
///
/// Reports whose timestamp cannot be parsed are skipped.
pub fn aggregate_with<'a>(
    reports: &[UserQuakeReport],
    lookup: impl Fn(i64) -> Option<&'a Area>,
) -> Vec<ClusterRecord> {
    let mut clusters = Vec::new();
    let mut session: Vec<UserQuakeReport> = Vec::new();
    let mut previous: Option<time::NaiveDateTime> = None;

    for report in reports {
        let Some(at) = time::parse_timestamp(&report.time) else {
            warn!("Skipping crowd report with unparsable time: {:?}", report.time);
            continue;
        };

        let starts_session = match previous {
            None => true,
            Some(prev) => (at - prev).num_seconds() >= SESSION_GAP_SECS,
        };
        if starts_session {
            close_session(&mut session, &mut clusters, &lookup);
        }

        session.push(report.clone());
        previous = Some(at);
    }
    close_session(&mut session, &mut clusters, &lookup);

    clusters
}
