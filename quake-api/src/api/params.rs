//! Query-string binding and validation
//!
//! Scalar parameters deserialize into per-endpoint query structs. A missing
//! or empty value takes its zero value. Repeated keys (`prefectures[]`,
//! `codes[]`) are read from the raw pairs. Anything that fails to bind or
//! validate is an `ApiError::Validation`.

use std::fmt;
use std::str::FromStr;

use axum::extract::{rejection::QueryRejection, Query};
use serde::de::{self, DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Deserializer};

use quake_common::{QuakeType, Scale};

use crate::error::{ApiError, ApiResult};
use crate::filter::{
    HistoryParams, HumanReadableParams, PrefectureFilter, QuakeParams, TsunamiParams,
};
use crate::pagination::MAX_LIMIT;

/// Length of a `YYYYMMDD` date parameter
pub const DATE_PARAM_LEN: usize = 8;

/// Empty value means `T::default()`
fn empty_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Default,
    T::Err: fmt::Display,
{
    let raw = String::deserialize(deserializer)?;
    if raw.is_empty() {
        return Ok(T::default());
    }
    raw.parse().map_err(de::Error::custom)
}

/// Empty value means `None`; anything else goes through `T`'s own serde impl
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = String::deserialize(deserializer)?;
    if raw.is_empty() {
        return Ok(None);
    }
    T::deserialize(raw.as_str().into_deserializer()).map(Some)
}

/// `GET /v2/jma/quake` scalars
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QuakeQuery {
    #[serde(deserialize_with = "empty_as_default")]
    pub offset: i64,
    #[serde(deserialize_with = "empty_as_default")]
    pub limit: i64,
    #[serde(deserialize_with = "empty_as_default")]
    pub order: i64,
    #[serde(deserialize_with = "empty_as_none")]
    pub quake_type: Option<QuakeType>,
    /// 0 means "not given"
    #[serde(deserialize_with = "empty_as_default")]
    pub min_scale: i64,
    #[serde(deserialize_with = "empty_as_default")]
    pub max_scale: i64,
    #[serde(deserialize_with = "empty_as_default")]
    pub min_magnitude: f64,
    #[serde(deserialize_with = "empty_as_default")]
    pub max_magnitude: f64,
    pub since_date: String,
    pub until_date: String,
}

/// `GET /v2/jma/tsunami` scalars
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TsunamiQuery {
    #[serde(deserialize_with = "empty_as_default")]
    pub offset: i64,
    #[serde(deserialize_with = "empty_as_default")]
    pub limit: i64,
    #[serde(deserialize_with = "empty_as_default")]
    pub order: i64,
    pub since_date: String,
    pub until_date: String,
}

/// `GET /v2/history` and `/v2/history/count` scalars
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HistoryQuery {
    #[serde(deserialize_with = "empty_as_default")]
    pub offset: i64,
    #[serde(deserialize_with = "empty_as_default")]
    pub limit: i64,
    #[serde(deserialize_with = "empty_as_default")]
    pub order: i64,
    /// `true` or `false`
    #[serde(deserialize_with = "empty_as_default")]
    pub exclude_evaluation: bool,
}

/// `GET /v1/human-readable` scalars
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HumanReadableQuery {
    #[serde(deserialize_with = "empty_as_default")]
    pub offset: i64,
    #[serde(deserialize_with = "empty_as_default")]
    pub limit: i64,
}

/// Unwrap a query extractor, turning axum's plain-text rejection into an
/// empty 400
pub fn bind<T>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    query
        .map(|Query(inner)| inner)
        .map_err(|rejection| ApiError::Validation(rejection.body_text()))
}

/// Raw query pairs in request order, for repeated keys
#[derive(Debug, Clone, Default)]
pub struct QueryPairs(Vec<(String, String)>);

impl QueryPairs {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }

    /// Every value for `key`, in order
    pub fn all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

fn invalid(key: &str, raw: impl fmt::Debug) -> ApiError {
    ApiError::Validation(format!("{}={:?}", key, raw))
}

/// Optional sign, digits, optional fractional digits
///
/// Values such as `1234.567` pass here but are not valid dates; the filter
/// builder ignores them.
fn is_numeric(raw: &str) -> bool {
    let unsigned = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(whole) && fraction.map_or(true, digits)
}

fn in_range(key: &str, value: i64, min: i64, max: i64) -> ApiResult<i64> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(invalid(key, value))
    }
}

struct Page {
    offset: i64,
    limit: i64,
    order: i64,
}

fn page(offset: i64, limit: i64, order: i64) -> ApiResult<Page> {
    Ok(Page {
        offset: in_range("offset", offset, 0, i64::MAX)?,
        limit: in_range("limit", limit, 0, MAX_LIMIT)?,
        order: in_range("order", order, -1, 1)?,
    })
}

/// Zero means "not given"; any other value must be a known scale
fn scale(key: &str, value: i64) -> ApiResult<Option<Scale>> {
    match value {
        0 => Ok(None),
        value => Scale::new(value)
            .map(Some)
            .ok_or_else(|| invalid(key, value)),
    }
}

fn magnitude(key: &str, value: f64) -> ApiResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(invalid(key, value))
    }
}

fn date(key: &str, raw: String) -> ApiResult<String> {
    if raw.is_empty() || (raw.chars().count() == DATE_PARAM_LEN && is_numeric(&raw)) {
        Ok(raw)
    } else {
        Err(invalid(key, raw))
    }
}

fn prefectures(pairs: &QueryPairs) -> ApiResult<Vec<PrefectureFilter>> {
    pairs
        .all("prefectures[]")
        .map(|entry| PrefectureFilter::parse(entry).ok_or_else(|| invalid("prefectures[]", entry)))
        .collect()
}

/// `GET /v2/jma/quake`
pub fn quake_params(query: QuakeQuery, pairs: &QueryPairs) -> ApiResult<QuakeParams> {
    let Page { offset, limit, order } = page(query.offset, query.limit, query.order)?;
    Ok(QuakeParams {
        offset,
        limit,
        order,
        quake_type: query.quake_type,
        min_scale: scale("min_scale", query.min_scale)?,
        max_scale: scale("max_scale", query.max_scale)?,
        min_magnitude: magnitude("min_magnitude", query.min_magnitude)?,
        max_magnitude: magnitude("max_magnitude", query.max_magnitude)?,
        since_date: date("since_date", query.since_date)?,
        until_date: date("until_date", query.until_date)?,
        prefectures: prefectures(pairs)?,
    })
}

/// `GET /v2/jma/tsunami`
pub fn tsunami_params(query: TsunamiQuery) -> ApiResult<TsunamiParams> {
    let Page { offset, limit, order } = page(query.offset, query.limit, query.order)?;
    Ok(TsunamiParams {
        offset,
        limit,
        order,
        since_date: date("since_date", query.since_date)?,
        until_date: date("until_date", query.until_date)?,
    })
}

/// `GET /v2/history` and `/v2/history/count`
pub fn history_params(query: HistoryQuery, pairs: &QueryPairs) -> ApiResult<HistoryParams> {
    let Page { offset, limit, order } = page(query.offset, query.limit, query.order)?;
    let codes = pairs
        .all("codes[]")
        .map(|raw| raw.parse::<i64>().map_err(|_| invalid("codes[]", raw)))
        .collect::<ApiResult<Vec<_>>>()?;

    Ok(HistoryParams {
        offset,
        limit,
        order,
        codes,
        exclude_evaluation: query.exclude_evaluation,
    })
}

/// `GET /v1/human-readable`
pub fn human_readable_params(query: HumanReadableQuery) -> ApiResult<HumanReadableParams> {
    Ok(HumanReadableParams {
        offset: in_range("offset", query.offset, 0, i64::MAX)?,
        limit: in_range("limit", query.limit, 0, MAX_LIMIT)?,
    })
}
