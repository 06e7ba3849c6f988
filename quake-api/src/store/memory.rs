//! In-memory document store

use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;

use super::predicate::{compare_values, resolve};
use super::{Document, EventStore, FindQuery, Predicate, SortOrder, StoreError};

/// Documents held in a vector, evaluated with `Predicate::matches`
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Vec<Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        Self {
            documents: documents.into_iter().map(Value::Object).collect(),
        }
    }

    /// Load one JSON object per non-blank line
    pub fn from_json_lines(content: &str) -> Result<Self, StoreError> {
        let documents = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(serde_json::from_str::<Document>)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::with_documents(documents))
    }

    pub fn insert(&mut self, document: Document) {
        self.documents.push(Value::Object(document));
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn matching<'a>(&'a self, predicate: &'a Predicate) -> impl Iterator<Item = &'a Value> + 'a {
        self.documents.iter().filter(move |doc| predicate.matches(doc))
    }
}

/// Cross-type sort rank: null < number < string < object < array < bool
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Object(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 5,
    }
}

/// Missing values sort before present ones, as in the document store.
/// Values of different types are ordered by `type_rank`.
fn sort_key_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => type_rank(x).cmp(&type_rank(y)).then_with(|| {
            compare_values(x, y).unwrap_or_else(|| x.to_string().cmp(&y.to_string()))
        }),
    }
}

fn into_document(value: &Value) -> Option<Document> {
    value.as_object().cloned()
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn find(&self, query: &FindQuery) -> Result<Vec<Document>, StoreError> {
        let mut hits: Vec<&Value> = self.matching(&query.predicate).collect();

        let field = query.sort.field.as_str();
        hits.sort_by(|a, b| {
            let ord = sort_key_order(resolve(a, field), resolve(b, field));
            match query.sort.order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        });

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let limit = query
            .limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        Ok(hits
            .into_iter()
            .skip(skip)
            .take(limit)
            .filter_map(into_document)
            .collect())
    }

    async fn find_one(&self, predicate: &Predicate) -> Result<Option<Document>, StoreError> {
        Ok(self.matching(predicate).next().and_then(into_document))
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        Ok(self.matching(predicate).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Sort;
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::from_json_lines(
            r#"
{"_id":"000000000000000000000001","code":551,"time":"2024/01/01 10:00:00"}
{"_id":"000000000000000000000002","code":552,"time":"2024/01/01 11:00:00"}
{"_id":"000000000000000000000003","code":551,"time":"2024/01/01 12:00:00"}
{"_id":"000000000000000000000004","code":551}
"#,
        )
        .unwrap()
    }

    fn ids(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d["_id"].as_str().unwrap()).collect()
    }

    #[tokio::test]
    async fn test_find_sorts_descending() {
        let query = FindQuery {
            predicate: Predicate::eq("code", 551),
            sort: Sort::new("time", SortOrder::Descending),
            skip: 0,
            limit: Some(10),
        };
        let docs = store().find(&query).await.unwrap();
        assert_eq!(
            ids(&docs),
            vec![
                "000000000000000000000003",
                "000000000000000000000001",
                "000000000000000000000004"
            ]
        );
    }

    #[tokio::test]
    async fn test_find_skip_and_limit() {
        let query = FindQuery {
            predicate: Predicate::And(vec![]),
            sort: Sort::new("time", SortOrder::Ascending),
            skip: 1,
            limit: Some(2),
        };
        let docs = store().find(&query).await.unwrap();
        assert_eq!(
            ids(&docs),
            vec!["000000000000000000000001", "000000000000000000000002"]
        );
    }

    #[tokio::test]
    async fn test_find_one_and_count() {
        let s = store();
        let doc = s
            .find_one(&Predicate::eq("_id", "000000000000000000000002"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["code"], json!(552));
        assert_eq!(s.count(&Predicate::eq("code", 551)).await.unwrap(), 3);
        assert!(s.find_one(&Predicate::eq("code", 9611)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_sorts_mixed_type_keys() {
        let mut s = MemoryStore::new();
        for i in 0..64 {
            let time = if i % 2 == 0 {
                json!(i)
            } else {
                json!(format!("2024/01/01 10:00:{:02}", i))
            };
            s.insert(json!({ "code": 551, "time": time }).as_object().cloned().unwrap());
        }
        s.insert(json!({ "code": 551, "time": true }).as_object().cloned().unwrap());
        s.insert(json!({ "code": 551, "time": null }).as_object().cloned().unwrap());

        let query = FindQuery {
            predicate: Predicate::eq("code", 551),
            sort: Sort::new("time", SortOrder::Descending),
            skip: 0,
            limit: None,
        };
        let docs = s.find(&query).await.unwrap();
        assert_eq!(docs.len(), 66);

        // Bool first, then strings, then numbers, then null
        assert_eq!(docs[0]["time"], json!(true));
        assert_eq!(docs[1]["time"], json!("2024/01/01 10:00:63"));
        assert_eq!(docs[32]["time"], json!("2024/01/01 10:00:01"));
        assert_eq!(docs[33]["time"], json!(62));
        assert_eq!(docs[64]["time"], json!(0));
        assert_eq!(docs[65]["time"], Value::Null);
    }

    #[test]
    fn test_from_json_lines_rejects_non_objects() {
        assert!(MemoryStore::from_json_lines("[1,2,3]").is_err());
        assert!(MemoryStore::from_json_lines("").unwrap().is_empty());
    }
}
