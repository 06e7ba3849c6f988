//! SQLite-backed document store
//!
//! Documents live as JSON text in a single `documents` table. Predicates are
//! rendered to SQL with `json_extract`/`json_type`; element matches become
//! `EXISTS` subqueries over `json_each`. Field paths and values are always
//! bound as parameters.

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::path::Path;
use tracing::debug;

use super::{Document, EventStore, FindQuery, Predicate, SortOrder, StoreError};

/// Document store over an SQLite database
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect in read-only mode
    pub async fn connect_readonly(db_path: &Path) -> anyhow::Result<Self> {
        if !db_path.exists() {
            anyhow::bail!("Database not found: {}", db_path.display());
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .read_only(true);

        let pool = SqlitePool::connect_with(options)
            .await
            .context("Failed to connect to database in read-only mode")?;

        Ok(Self::new(pool))
    }

    /// Open read-write, creating the file if needed (fixture loading and tests)
    pub async fn open(db_path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the `documents` table if it does not exist
    pub async fn create_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                body TEXT NOT NULL CHECK (json_valid(body))
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert(&self, document: &Document) -> Result<(), StoreError> {
        let body = serde_json::to_string(document)?;
        sqlx::query("INSERT INTO documents (body) VALUES (?)")
            .bind(body)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn fetch_documents(&self, mut qb: QueryBuilder<'_, Sqlite>) -> Result<Vec<Document>, StoreError> {
        let sql = qb.sql().to_string();
        debug!("sqlite find: {}", sql);

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| -> Result<Document, StoreError> {
                let body: String = row.try_get(0)?;
                Ok(serde_json::from_str::<Document>(&body)?)
            })
            .collect()
    }
}

/// `$."a"."b"` JSON path for a dotted field name
fn json_path(field: &str) -> String {
    field.split('.').fold(String::from("$"), |mut path, key| {
        path.push_str(".\"");
        path.push_str(&key.replace('"', "\\\""));
        path.push('"');
        path
    })
}

/// `json_type` results a bound value may be compared against
fn comparable_types(value: &Value) -> &'static str {
    match value {
        Value::Number(_) => "'integer', 'real'",
        Value::String(_) => "'text'",
        Value::Bool(_) => "'true', 'false'",
        Value::Null => "'null'",
        Value::Array(_) | Value::Object(_) => "'array', 'object'",
    }
}

fn push_value(qb: &mut QueryBuilder<'_, Sqlite>, value: &Value) {
    match value {
        Value::String(s) => {
            qb.push_bind(s.clone());
        }
        Value::Number(n) => match n.as_i64() {
            Some(i) => {
                qb.push_bind(i);
            }
            None => {
                qb.push_bind(n.as_f64().unwrap_or_default());
            }
        },
        Value::Bool(b) => {
            qb.push_bind(i64::from(*b));
        }
        other => {
            qb.push_bind(other.to_string());
        }
    }
}

fn push_extract(qb: &mut QueryBuilder<'_, Sqlite>, source: &str, field: &str) {
    qb.push("json_extract(")
        .push(source)
        .push(", ")
        .push_bind(json_path(field))
        .push(")");
}

/// Typed comparison: the stored value must have the bound value's JSON type
fn push_comparison(qb: &mut QueryBuilder<'_, Sqlite>, source: &str, field: &str, op: &str, value: &Value) {
    qb.push("(json_type(")
        .push(source)
        .push(", ")
        .push_bind(json_path(field))
        .push(") IN (")
        .push(comparable_types(value))
        .push(") AND ");
    push_extract(qb, source, field);
    qb.push(" ").push(op).push(" ");
    push_value(qb, value);
    qb.push(")");
}

fn push_value_list(qb: &mut QueryBuilder<'_, Sqlite>, values: &[Value]) {
    qb.push("(");
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        push_value(qb, value);
    }
    qb.push(")");
}

/// Render `predicate` evaluated against the JSON in `source`
fn push_predicate(qb: &mut QueryBuilder<'_, Sqlite>, predicate: &Predicate, source: &str, depth: usize) {
    match predicate {
        Predicate::And(clauses) => {
            if clauses.is_empty() {
                qb.push("1");
                return;
            }
            qb.push("(");
            for (i, clause) in clauses.iter().enumerate() {
                if i > 0 {
                    qb.push(" AND ");
                }
                push_predicate(qb, clause, source, depth);
            }
            qb.push(")");
        }
        Predicate::Eq { field, value } => push_comparison(qb, source, field, "=", value),
        Predicate::Gte { field, value } => push_comparison(qb, source, field, ">=", value),
        Predicate::Lte { field, value } => push_comparison(qb, source, field, "<=", value),
        Predicate::In { field, values } => {
            if values.is_empty() {
                qb.push("0");
                return;
            }
            push_extract(qb, source, field);
            qb.push(" IN ");
            push_value_list(qb, values);
        }
        Predicate::NotIn { field, values } => {
            if values.is_empty() {
                qb.push("1");
                return;
            }
            qb.push("(");
            push_extract(qb, source, field);
            qb.push(" IS NULL OR ");
            push_extract(qb, source, field);
            qb.push(" NOT IN ");
            push_value_list(qb, values);
            qb.push(")");
        }
        Predicate::ElemMatch { field, conditions } => {
            let alias = format!("elem{}", depth);
            let element = format!("{}.value", alias);
            qb.push("EXISTS (SELECT 1 FROM json_each(")
                .push(source)
                .push(", ")
                .push_bind(json_path(field))
                .push(") AS ")
                .push(&alias)
                .push(" WHERE ")
                .push(&alias)
                .push(".type = 'object' AND ");
            push_predicate(qb, &Predicate::And(conditions.clone()), &element, depth + 1);
            qb.push(")");
        }
    }
}

fn push_where(qb: &mut QueryBuilder<'_, Sqlite>, predicate: &Predicate) {
    qb.push(" WHERE ");
    push_predicate(qb, predicate, "body", 0);
}

/// Build the SELECT for a `find` call
fn find_sql(query: &FindQuery) -> QueryBuilder<'static, Sqlite> {
    let mut qb = QueryBuilder::new("SELECT body FROM documents");
    push_where(&mut qb, &query.predicate);

    qb.push(" ORDER BY ");
    push_extract(&mut qb, "body", &query.sort.field);
    qb.push(match query.sort.order {
        SortOrder::Ascending => " ASC",
        SortOrder::Descending => " DESC",
    });

    // LIMIT -1 means no limit in SQLite
    qb.push(" LIMIT ");
    qb.push_bind(query.limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX)).unwrap_or(-1));
    qb.push(" OFFSET ");
    qb.push_bind(i64::try_from(query.skip).unwrap_or(i64::MAX));
    qb
}

#[async_trait]
impl EventStore for SqliteStore {
    async fn find(&self, query: &FindQuery) -> Result<Vec<Document>, StoreError> {
        self.fetch_documents(find_sql(query)).await
    }

    async fn find_one(&self, predicate: &Predicate) -> Result<Option<Document>, StoreError> {
        let mut qb = QueryBuilder::new("SELECT body FROM documents");
        push_where(&mut qb, predicate);
        qb.push(" LIMIT 1");
        Ok(self.fetch_documents(qb).await?.into_iter().next())
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM documents");
        push_where(&mut qb, predicate);
        let count: i64 = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Sort;

    #[test]
    fn test_json_path_quotes_each_key() {
        assert_eq!(json_path("code"), "$.\"code\"");
        assert_eq!(
            json_path("earthquake.hypocenter.magnitude"),
            "$.\"earthquake\".\"hypocenter\".\"magnitude\""
        );
        assert_eq!(json_path("user-agent"), "$.\"user-agent\"");
    }

    #[test]
    fn test_find_sql_shape() {
        let query = FindQuery {
            predicate: Predicate::And(vec![
                Predicate::eq("code", 551),
                Predicate::elem_match("points", vec![Predicate::gte("scale", 30)]),
            ]),
            sort: Sort::new("time", SortOrder::Descending),
            skip: 0,
            limit: Some(10),
        };
        let qb = find_sql(&query);
        let sql = qb.sql();
        assert!(sql.starts_with("SELECT body FROM documents WHERE ("));
        assert!(sql.contains("EXISTS (SELECT 1 FROM json_each(body, ?) AS elem0"));
        assert!(sql.contains("json_extract(elem0.value, ?) >= ?"));
        assert!(sql.ends_with("DESC LIMIT ? OFFSET ?"));
    }

    #[test]
    fn test_empty_conjunction_matches_everything() {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT 1");
        push_where(&mut qb, &Predicate::And(vec![]));
        assert_eq!(qb.sql(), "SELECT 1 WHERE 1");
    }
}
