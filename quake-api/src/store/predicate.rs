//! Storage-independent query predicates
//!
//! A predicate is a tree of clauses over dotted field paths. Stores translate
//! it into their own query language; `matches` is the reference evaluation
//! used by the in-memory store and by tests.
//!
//! Comparison follows document-store rules: numbers compare numerically,
//! strings lexicographically, and values of different types never match.

use serde_json::{json, Map, Value};
use std::cmp::Ordering;

/// A stored document
pub type Document = Map<String, Value>;

/// Query predicate tree
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// All clauses must hold
    And(Vec<Predicate>),
    /// Field equals value
    Eq { field: String, value: Value },
    /// Field is greater than or equal to value
    Gte { field: String, value: Value },
    /// Field is less than or equal to value
    Lte { field: String, value: Value },
    /// Field equals one of the values
    In { field: String, values: Vec<Value> },
    /// Field equals none of the values (a missing field matches)
    NotIn { field: String, values: Vec<Value> },
    /// Array field has at least one element satisfying every condition;
    /// condition fields are relative to the element
    ElemMatch {
        field: String,
        conditions: Vec<Predicate>,
    },
}

impl Predicate {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Gte {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Lte {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Predicate::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn not_in<V: Into<Value>>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Predicate::NotIn {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn elem_match(field: impl Into<String>, conditions: Vec<Predicate>) -> Self {
        Predicate::ElemMatch {
            field: field.into(),
            conditions,
        }
    }

    /// Top-level clauses (a non-conjunction is its own single clause)
    pub fn clauses(&self) -> &[Predicate] {
        match self {
            Predicate::And(clauses) => clauses,
            other => std::slice::from_ref(other),
        }
    }

    /// Evaluate against a document
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Predicate::And(clauses) => clauses.iter().all(|c| c.matches(doc)),
            Predicate::Eq { field, value } => {
                resolve(doc, field).is_some_and(|actual| values_equal(actual, value))
            }
            Predicate::Gte { field, value } => resolve(doc, field)
                .and_then(|actual| compare_values(actual, value))
                .is_some_and(|ord| ord != Ordering::Less),
            Predicate::Lte { field, value } => resolve(doc, field)
                .and_then(|actual| compare_values(actual, value))
                .is_some_and(|ord| ord != Ordering::Greater),
            Predicate::In { field, values } => resolve(doc, field)
                .is_some_and(|actual| values.iter().any(|v| values_equal(actual, v))),
            Predicate::NotIn { field, values } => match resolve(doc, field) {
                Some(actual) => !values.iter().any(|v| values_equal(actual, v)),
                None => true,
            },
            Predicate::ElemMatch { field, conditions } => match resolve(doc, field) {
                Some(Value::Array(items)) => items
                    .iter()
                    .any(|item| conditions.iter().all(|c| c.matches(item))),
                _ => false,
            },
        }
    }

    /// Render in document-store filter syntax (`$gte`, `$in`, `$elemMatch`, ...)
    ///
    /// A conjunction renders as one object when its field names are distinct,
    /// otherwise as `{"$and": [...]}`.
    pub fn to_document(&self) -> Value {
        match self {
            Predicate::And(clauses) => render_conjunction(clauses),
            Predicate::Eq { field, value } => json!({ field.as_str(): value }),
            Predicate::Gte { field, value } => json!({ field.as_str(): { "$gte": value } }),
            Predicate::Lte { field, value } => json!({ field.as_str(): { "$lte": value } }),
            Predicate::In { field, values } => json!({ field.as_str(): { "$in": values } }),
            Predicate::NotIn { field, values } => json!({ field.as_str(): { "$nin": values } }),
            Predicate::ElemMatch { field, conditions } => {
                json!({ field.as_str(): { "$elemMatch": render_conjunction(conditions) } })
            }
        }
    }
}

fn render_conjunction(clauses: &[Predicate]) -> Value {
    let rendered: Vec<Value> = clauses.iter().map(Predicate::to_document).collect();

    let mut merged = Map::new();
    for clause in &rendered {
        if let Value::Object(fields) = clause {
            for (key, value) in fields {
                if merged.insert(key.clone(), value.clone()).is_some() {
                    return json!({ "$and": rendered });
                }
            }
        }
    }
    Value::Object(merged)
}

/// Resolve a dotted path (`earthquake.hypocenter.magnitude`) inside a document
pub fn resolve<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |current, key| current.get(key))
}

/// Order two values of the same type; `None` when the types differ
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match compare_values(a, b) {
        Some(ord) => ord == Ordering::Equal,
        None => a == b,
    }
}
