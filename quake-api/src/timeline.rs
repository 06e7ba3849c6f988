//! Merge bulletins and crowd clusters into one newest-first timeline

use serde_json::Value;
use std::cmp::Ordering;

use crate::filter::TIME_FIELD;

fn time_of(record: &Value) -> Option<&str> {
    record.get(TIME_FIELD).and_then(Value::as_str)
}

/// Newest first; records without a time go last
fn newest_first(a: &Value, b: &Value) -> Ordering {
    match (time_of(a), time_of(b)) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Concatenate, sort by `time` descending and keep at most `limit` records
///
/// The sort is stable, so records with equal times keep bulletin-then-cluster
/// order.
pub fn merge(bulletins: Vec<Value>, clusters: Vec<Value>, limit: usize) -> Vec<Value> {
    let mut timeline = bulletins;
    timeline.extend(clusters);
    timeline.sort_by(newest_first);
    timeline.truncate(limit);
    timeline
}
