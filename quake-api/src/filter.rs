//! Query filter construction
//!
//! Turns validated request parameters into a `FindQuery`. The functions are
//! pure: no I/O, and no errors once the parameters have passed validation.
//!
//! Two clause rules callers rely on:
//! - a max-only magnitude or scale bound also adds a `>= 0` floor clause,
//!   which excludes negative stored values;
//! - every `prefectures[]` entry adds its own element match, so a record must
//!   satisfy all listed prefecture/scale pairs at once.

use quake_common::codes;
use quake_common::{QuakeType, Scale};

use crate::pagination::calculate_pagination;
use crate::store::{FindQuery, Predicate, Sort, SortOrder, ID_FIELD};

pub const CODE_FIELD: &str = "code";
pub const TIME_FIELD: &str = "time";
pub const QUAKE_TIME_FIELD: &str = "earthquake.time";
pub const ISSUE_TIME_FIELD: &str = "issue.time";
pub const ISSUE_TYPE_FIELD: &str = "issue.type";
pub const MAGNITUDE_FIELD: &str = "earthquake.hypocenter.magnitude";
pub const MAX_SCALE_FIELD: &str = "earthquake.maxScale";
pub const POINTS_FIELD: &str = "points";
pub const POINT_PREF_FIELD: &str = "pref";
pub const POINT_SCALE_FIELD: &str = "scale";

/// Codes fetched as the bulletin side of the human-readable timeline
pub const BULLETIN_WINDOW_CODES: [i64; 2] = [codes::QUAKE_EVALUATION, codes::TSUNAMI_EVALUATION];

/// One `prefectures[]` entry: `<prefecture>,<minimum scale>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefectureFilter {
    pub prefecture: String,
    pub min_scale: i64,
}

impl PrefectureFilter {
    /// Parse `"<prefecture>,<scale>"`; text after a second comma is ignored
    ///
    /// Only the comma is required. A scale that is not a plain integer
    /// (including one with surrounding spaces) becomes 0.
    pub fn parse(entry: &str) -> Option<Self> {
        let mut parts = entry.split(',');
        let prefecture = parts.next()?;
        let min_scale = parts.next()?.parse().unwrap_or(0);
        Some(Self {
            prefecture: prefecture.to_string(),
            min_scale,
        })
    }
}

/// Earthquake bulletin search parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuakeParams {
    pub offset: i64,
    pub limit: i64,
    pub order: i64,
    pub quake_type: Option<QuakeType>,
    pub min_scale: Option<Scale>,
    pub max_scale: Option<Scale>,
    pub min_magnitude: f64,
    pub max_magnitude: f64,
    pub since_date: String,
    pub until_date: String,
    pub prefectures: Vec<PrefectureFilter>,
}

/// Tsunami bulletin search parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TsunamiParams {
    pub offset: i64,
    pub limit: i64,
    pub order: i64,
    pub since_date: String,
    pub until_date: String,
}

/// Generic history listing parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryParams {
    pub offset: i64,
    pub limit: i64,
    pub order: i64,
    /// Restrict to these record codes; empty means any code
    pub codes: Vec<i64>,
    /// Leave out last-evaluation markers
    pub exclude_evaluation: bool,
}

/// Human-readable timeline parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HumanReadableParams {
    pub offset: i64,
    pub limit: i64,
}

/// Split `YYYYMMDD` into `YYYY/MM/DD`; `None` unless exactly eight ASCII digits
fn split_date(date: &str) -> Option<String> {
    if date.len() != 8 || !date.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(format!("{}/{}/{}", &date[0..4], &date[4..6], &date[6..8]))
}

/// `YYYYMMDD` → `YYYY/MM/DD 00:00:00`
pub fn format_since_date(date: &str) -> Option<String> {
    split_date(date).map(|d| format!("{} 00:00:00", d))
}

/// `YYYYMMDD` → `YYYY/MM/DD 23:59:59`
pub fn format_until_date(date: &str) -> Option<String> {
    split_date(date).map(|d| format!("{} 23:59:59", d))
}

fn push_date_range(clauses: &mut Vec<Predicate>, field: &str, since: &str, until: &str) {
    if let Some(since) = format_since_date(since) {
        clauses.push(Predicate::gte(field, since));
    }
    if let Some(until) = format_until_date(until) {
        clauses.push(Predicate::lte(field, until));
    }
}

fn paged_query(clauses: Vec<Predicate>, offset: i64, limit: i64, order: i64) -> FindQuery {
    let page = calculate_pagination(offset, limit, order);
    FindQuery {
        predicate: Predicate::And(clauses),
        sort: Sort::new(TIME_FIELD, page.order),
        skip: page.skip,
        limit: Some(page.limit),
    }
}

/// Earthquake bulletin search
pub fn build_quake_query(params: &QuakeParams) -> FindQuery {
    let mut clauses = vec![Predicate::eq(CODE_FIELD, codes::QUAKE)];

    push_date_range(&mut clauses, QUAKE_TIME_FIELD, &params.since_date, &params.until_date);

    if let Some(quake_type) = params.quake_type {
        clauses.push(Predicate::eq(ISSUE_TYPE_FIELD, quake_type.as_str()));
    }

    if params.min_magnitude != 0.0 {
        clauses.push(Predicate::gte(MAGNITUDE_FIELD, params.min_magnitude));
    }
    if params.max_magnitude != 0.0 {
        clauses.push(Predicate::lte(MAGNITUDE_FIELD, params.max_magnitude));
        clauses.push(Predicate::gte(MAGNITUDE_FIELD, 0.0));
    }

    if let Some(min_scale) = params.min_scale {
        clauses.push(Predicate::gte(MAX_SCALE_FIELD, min_scale.value()));
    }
    if let Some(max_scale) = params.max_scale {
        clauses.push(Predicate::lte(MAX_SCALE_FIELD, max_scale.value()));
        clauses.push(Predicate::gte(MAX_SCALE_FIELD, 0));
    }

    for entry in &params.prefectures {
        clauses.push(Predicate::elem_match(
            POINTS_FIELD,
            vec![
                Predicate::eq(POINT_PREF_FIELD, entry.prefecture.as_str()),
                Predicate::gte(POINT_SCALE_FIELD, entry.min_scale),
            ],
        ));
    }

    paged_query(clauses, params.offset, params.limit, params.order)
}

/// Tsunami bulletin search
pub fn build_tsunami_query(params: &TsunamiParams) -> FindQuery {
    let mut clauses = vec![Predicate::eq(CODE_FIELD, codes::TSUNAMI)];
    push_date_range(&mut clauses, ISSUE_TIME_FIELD, &params.since_date, &params.until_date);
    paged_query(clauses, params.offset, params.limit, params.order)
}

/// Predicate for a generic history listing or count
pub fn build_history_predicate(params: &HistoryParams) -> Predicate {
    let mut clauses = Vec::new();
    if !params.codes.is_empty() {
        clauses.push(Predicate::is_in(CODE_FIELD, params.codes.iter().copied()));
    }
    if params.exclude_evaluation {
        clauses.push(Predicate::not_in(CODE_FIELD, [codes::LAST_EVALUATION]));
    }
    Predicate::And(clauses)
}

/// Generic history listing
pub fn build_history_query(params: &HistoryParams) -> FindQuery {
    let clauses = build_history_predicate(params).clauses().to_vec();
    paged_query(clauses, params.offset, params.limit, params.order)
}

/// Single-record lookup by code and store identifier
pub fn build_record_predicate(code: i64, id: &str) -> Predicate {
    Predicate::And(vec![Predicate::eq(CODE_FIELD, code), Predicate::eq(ID_FIELD, id)])
}

/// Bulletin side of the human-readable timeline, newest first
pub fn build_bulletin_window_query(params: &HumanReadableParams) -> FindQuery {
    let clauses = vec![Predicate::is_in(CODE_FIELD, BULLETIN_WINDOW_CODES)];
    paged_query(clauses, params.offset, params.limit, 0)
}

/// Crowd reports at or after `since`, oldest first, unlimited
pub fn build_user_quake_query(since: &str) -> FindQuery {
    FindQuery {
        predicate: Predicate::And(vec![
            Predicate::eq(CODE_FIELD, codes::USER_QUAKE),
            Predicate::gte(TIME_FIELD, since),
        ]),
        sort: Sort::new(TIME_FIELD, SortOrder::Ascending),
        skip: 0,
        limit: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scale(v: i64) -> Option<Scale> {
        Scale::new(v)
    }

    #[test]
    fn test_date_formatting() {
        assert_eq!(format_since_date("20240101").as_deref(), Some("2024/01/01 00:00:00"));
        assert_eq!(format_until_date("20241231").as_deref(), Some("2024/12/31 23:59:59"));
    }

    #[test]
    fn test_malformed_dates_ignored() {
        for bad in ["", "2024011", "202401011", "2024-1-1", "1234.567", "+2024010", "２０２４0101"] {
            assert!(format_since_date(bad).is_none(), "{:?}", bad);
            assert!(format_until_date(bad).is_none(), "{:?}", bad);
        }
    }

    #[test]
    fn test_quake_defaults() {
        let q = build_quake_query(&QuakeParams::default());
        assert_eq!(q.predicate, Predicate::And(vec![Predicate::eq("code", 551)]));
        assert_eq!(q.sort, Sort::new("time", SortOrder::Descending));
        assert_eq!(q.skip, 0);
        assert_eq!(q.limit, Some(10));
    }

    #[test]
    fn test_quake_pagination_passthrough() {
        let q = build_quake_query(&QuakeParams {
            offset: 40,
            limit: 100,
            order: 1,
            ..Default::default()
        });
        assert_eq!(q.skip, 40);
        assert_eq!(q.limit, Some(100));
        assert_eq!(q.sort.order, SortOrder::Ascending);
    }

    #[test]
    fn test_quake_date_range_on_earthquake_time() {
        let q = build_quake_query(&QuakeParams {
            since_date: "20240101".to_string(),
            until_date: "20240102".to_string(),
            ..Default::default()
        });
        assert_eq!(
            q.predicate.clauses(),
            &[
                Predicate::eq("code", 551),
                Predicate::gte("earthquake.time", "2024/01/01 00:00:00"),
                Predicate::lte("earthquake.time", "2024/01/02 23:59:59"),
            ]
        );
    }

    #[test]
    fn test_quake_malformed_date_adds_no_clause() {
        let q = build_quake_query(&QuakeParams {
            since_date: "1234.567".to_string(),
            until_date: "2024010".to_string(),
            ..Default::default()
        });
        assert_eq!(q.predicate.clauses().len(), 1);
    }

    #[test]
    fn test_quake_type_clause() {
        let q = build_quake_query(&QuakeParams {
            quake_type: Some(QuakeType::DetailScale),
            ..Default::default()
        });
        assert!(q
            .predicate
            .clauses()
            .contains(&Predicate::eq("issue.type", "DetailScale")));
    }

    #[test]
    fn test_min_magnitude_only() {
        let q = build_quake_query(&QuakeParams {
            min_magnitude: 4.5,
            ..Default::default()
        });
        assert_eq!(
            &q.predicate.clauses()[1..],
            &[Predicate::gte("earthquake.hypocenter.magnitude", 4.5)]
        );
    }

    // Max-only bounds also add a zero floor; kept as observed behavior
    #[test]
    fn test_max_magnitude_adds_zero_floor() {
        let q = build_quake_query(&QuakeParams {
            max_magnitude: 5.0,
            ..Default::default()
        });
        assert_eq!(
            &q.predicate.clauses()[1..],
            &[
                Predicate::lte("earthquake.hypocenter.magnitude", 5.0),
                Predicate::gte("earthquake.hypocenter.magnitude", 0.0),
            ]
        );

        let negative = json!({ "code": 551, "earthquake": { "hypocenter": { "magnitude": -1.0 } } });
        let positive = json!({ "code": 551, "earthquake": { "hypocenter": { "magnitude": 3.2 } } });
        assert!(!q.predicate.matches(&negative));
        assert!(q.predicate.matches(&positive));
    }

    #[test]
    fn test_min_and_max_scale_clauses() {
        let q = build_quake_query(&QuakeParams {
            min_scale: scale(20),
            max_scale: scale(40),
            ..Default::default()
        });
        assert_eq!(
            &q.predicate.clauses()[1..],
            &[
                Predicate::gte("earthquake.maxScale", 20),
                Predicate::lte("earthquake.maxScale", 40),
                Predicate::gte("earthquake.maxScale", 0),
            ]
        );
    }

    #[test]
    fn test_max_scale_floor_excludes_negative_scale() {
        let q = build_quake_query(&QuakeParams {
            max_scale: scale(30),
            ..Default::default()
        });
        let unknown = json!({ "code": 551, "earthquake": { "maxScale": -1 } });
        let low = json!({ "code": 551, "earthquake": { "maxScale": 10 } });
        assert!(!q.predicate.matches(&unknown));
        assert!(q.predicate.matches(&low));
    }

    #[test]
    fn test_prefecture_filters_are_anded() {
        let q = build_quake_query(&QuakeParams {
            prefectures: vec![
                PrefectureFilter::parse("13,30").unwrap(),
                PrefectureFilter::parse("27,10").unwrap(),
            ],
            ..Default::default()
        });

        let both = json!({ "code": 551, "points": [
            { "pref": "13", "scale": 30 },
            { "pref": "27", "scale": 10 }
        ]});
        let only_tokyo = json!({ "code": 551, "points": [
            { "pref": "13", "scale": 40 }
        ]});
        let osaka_too_weak = json!({ "code": 551, "points": [
            { "pref": "13", "scale": 30 },
            { "pref": "27", "scale": 0 }
        ]});
        let tokyo_too_weak = json!({ "code": 551, "points": [
            { "pref": "13", "scale": 20 },
            { "pref": "27", "scale": 50 }
        ]});

        assert!(q.predicate.matches(&both));
        assert!(!q.predicate.matches(&osaka_too_weak));
        assert!(!q.predicate.matches(&only_tokyo));
        assert!(!q.predicate.matches(&tokyo_too_weak));
    }

    #[test]
    fn test_prefecture_filter_parse() {
        assert_eq!(
            PrefectureFilter::parse("石川県,50"),
            Some(PrefectureFilter {
                prefecture: "石川県".to_string(),
                min_scale: 50
            })
        );
        assert_eq!(PrefectureFilter::parse("13,30,extra").map(|p| p.min_scale), Some(30));
        assert!(PrefectureFilter::parse("13").is_none());

        for entry in ["13,high", "13,", "13, 30"] {
            let filter = PrefectureFilter::parse(entry).unwrap();
            assert_eq!(filter.prefecture, "13");
            assert_eq!(filter.min_scale, 0, "{entry:?}");
        }
    }

    #[test]
    fn test_tsunami_dates_on_issue_time() {
        let q = build_tsunami_query(&TsunamiParams {
            since_date: "20110311".to_string(),
            ..Default::default()
        });
        assert_eq!(
            q.predicate.clauses(),
            &[
                Predicate::eq("code", 552),
                Predicate::gte("issue.time", "2011/03/11 00:00:00"),
            ]
        );
        assert_eq!(q.limit, Some(10));
    }

    #[test]
    fn test_history_predicate() {
        let all = build_history_query(&HistoryParams::default());
        assert_eq!(all.predicate, Predicate::And(vec![]));

        let filtered = build_history_query(&HistoryParams {
            codes: vec![551, 561],
            exclude_evaluation: true,
            ..Default::default()
        });
        assert_eq!(
            filtered.predicate.clauses(),
            &[
                Predicate::is_in("code", [551, 561]),
                Predicate::not_in("code", [9611]),
            ]
        );
    }

    #[test]
    fn test_bulletin_window_query() {
        let q = build_bulletin_window_query(&HumanReadableParams { offset: 0, limit: 0 });
        assert_eq!(q.predicate.clauses(), &[Predicate::is_in("code", [5510, 5520])]);
        assert_eq!(q.sort, Sort::new("time", SortOrder::Descending));
        assert_eq!(q.limit, Some(10));
    }

    #[test]
    fn test_user_quake_query_is_unbounded_ascending() {
        let q = build_user_quake_query("2024/01/01 16:10:00");
        assert_eq!(
            q.predicate.clauses(),
            &[
                Predicate::eq("code", 561),
                Predicate::gte("time", "2024/01/01 16:10:00"),
            ]
        );
        assert_eq!(q.sort.order, SortOrder::Ascending);
        assert_eq!(q.limit, None);
    }

    #[test]
    fn test_record_predicate() {
        let p = build_record_predicate(552, "5e8f7b2c9d1a4b0012345678");
        assert_eq!(
            p.to_document(),
            json!({ "code": 552, "_id": "5e8f7b2c9d1a4b0012345678" })
        );
    }
}
