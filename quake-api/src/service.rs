//! Query service: filter building, store access and post-processing
//!
//! Every store call goes through [`StoreGuard`], which bounds it with the
//! configured query timeout. Handlers in `api` only bind parameters and call
//! the functions here.

use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use quake_common::codes;

use crate::cluster::{self, ClusterRecord, UserQuakeReport};
use crate::error::{ApiError, ApiResult};
use crate::filter::{
    build_bulletin_window_query, build_history_predicate, build_history_query,
    build_quake_query, build_record_predicate, build_tsunami_query, build_user_quake_query,
    HistoryParams, HumanReadableParams, QuakeParams, TsunamiParams, TIME_FIELD,
};
use crate::pagination::DEFAULT_LIMIT;
use crate::sanitize::{sanitize_bulletin, sanitize_human_readable};
use crate::store::{
    Document, EventStore, FindQuery, Predicate, RecordId, StoreError,
};
use crate::timeline;

/// Store handle with a per-call timeout
#[derive(Clone)]
pub struct StoreGuard {
    store: Arc<dyn EventStore>,
    timeout: Duration,
}

impl StoreGuard {
    pub fn new(store: Arc<dyn EventStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
    }

    pub async fn find(&self, query: &FindQuery) -> Result<Vec<Document>, StoreError> {
        debug!(
            "find {} sort={:?} skip={} limit={:?}",
            query.predicate.to_document(),
            query.sort,
            query.skip,
            query.limit
        );
        self.bounded(self.store.find(query)).await
    }

    pub async fn find_one(&self, predicate: &Predicate) -> Result<Option<Document>, StoreError> {
        debug!("find_one {}", predicate.to_document());
        self.bounded(self.store.find_one(predicate)).await
    }

    pub async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError> {
        debug!("count {}", predicate.to_document());
        self.bounded(self.store.count(predicate)).await
    }
}

fn into_bulletins(documents: Vec<Document>) -> Vec<Value> {
    documents
        .into_iter()
        .map(|mut doc| {
            sanitize_bulletin(&mut doc);
            Value::Object(doc)
        })
        .collect()
}

/// Earthquake bulletins matching `params`
pub async fn search_quake(store: &StoreGuard, params: &QuakeParams) -> ApiResult<Vec<Value>> {
    let documents = store.find(&build_quake_query(params)).await?;
    Ok(into_bulletins(documents))
}

/// Tsunami bulletins matching `params`
pub async fn search_tsunami(store: &StoreGuard, params: &TsunamiParams) -> ApiResult<Vec<Value>> {
    let documents = store.find(&build_tsunami_query(params)).await?;
    Ok(into_bulletins(documents))
}

/// Records of any code, newest first by default
pub async fn search_history(store: &StoreGuard, params: &HistoryParams) -> ApiResult<Vec<Value>> {
    let documents = store.find(&build_history_query(params)).await?;
    Ok(into_bulletins(documents))
}

/// Number of records a history listing would page through
pub async fn count_history(store: &StoreGuard, params: &HistoryParams) -> ApiResult<u64> {
    Ok(store.count(&build_history_predicate(params)).await?)
}

async fn get_record(store: &StoreGuard, code: i64, id: &str) -> ApiResult<Value> {
    let id = RecordId::parse(id)?;

    let mut doc = store
        .find_one(&build_record_predicate(code, id.as_str()))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("code {} id {}", code, id)))?;

    sanitize_bulletin(&mut doc);
    Ok(Value::Object(doc))
}

/// Single earthquake bulletin by id
pub async fn get_quake(store: &StoreGuard, id: &str) -> ApiResult<Value> {
    get_record(store, codes::QUAKE, id).await
}

/// Single tsunami bulletin by id
pub async fn get_tsunami(store: &StoreGuard, id: &str) -> ApiResult<Value> {
    get_record(store, codes::TSUNAMI, id).await
}

fn decode_reports(documents: &[Document]) -> Vec<UserQuakeReport> {
    documents
        .iter()
        .filter_map(|doc| {
            let report = UserQuakeReport::from_document(doc);
            if report.is_none() {
                warn!("Skipping crowd report without time or area: {:?}", doc.get("_id"));
            }
            report
        })
        .collect()
}

/// Human-readable timeline: evaluation bulletins fused with crowd clusters
///
/// The bulletin page fixes the time window. Crowd reports from the oldest
/// bulletin onward are clustered and merged in, and the merged list is cut
/// back to the page size. An empty bulletin page skips the crowd query.
pub async fn human_readable(
    store: &StoreGuard,
    params: &HumanReadableParams,
) -> ApiResult<Vec<Value>> {
    let window = build_bulletin_window_query(params);
    let limit = usize::try_from(window.limit.unwrap_or(DEFAULT_LIMIT)).unwrap_or(usize::MAX);

    let documents = store.find(&window).await?;
    let Some(oldest) = documents.last() else {
        return Ok(Vec::new());
    };
    let since = oldest
        .get(TIME_FIELD)
        .and_then(Value::as_str)
        .map(str::to_string);

    let bulletins: Vec<Value> = documents
        .into_iter()
        .map(|mut doc| {
            sanitize_human_readable(&mut doc);
            Value::Object(doc)
        })
        .collect();

    let Some(since) = since else {
        warn!("Oldest bulletin has no time; returning bulletins without crowd clusters");
        return Ok(bulletins);
    };

    let reports = decode_reports(&store.find(&build_user_quake_query(&since)).await?);
    let clusters: Vec<Value> = cluster::aggregate(&reports)
        .iter()
        .map(ClusterRecord::to_document)
        .collect();

    debug!(
        "human-readable: {} bulletins, {} crowd reports, {} clusters since {}",
        bulletins.len(),
        reports.len(),
        clusters.len(),
        since
    );

    Ok(timeline::merge(bulletins, clusters, limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn guard(lines: &str) -> StoreGuard {
        let store = MemoryStore::from_json_lines(lines).unwrap();
        StoreGuard::new(Arc::new(store), Duration::from_secs(5))
    }

    /// Store that never answers within the timeout
    struct StalledStore;

    #[async_trait]
    impl EventStore for StalledStore {
        async fn find(&self, _query: &FindQuery) -> Result<Vec<Document>, StoreError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }

        async fn find_one(&self, _predicate: &Predicate) -> Result<Option<Document>, StoreError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }

        async fn count(&self, _predicate: &Predicate) -> Result<u64, StoreError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(0)
        }
    }

    /// MemoryStore that counts `find` calls and can fail from a given call on
    struct CountingStore {
        inner: MemoryStore,
        finds: AtomicUsize,
        fail_from: Option<usize>,
    }

    impl CountingStore {
        fn new(lines: &str, fail_from: Option<usize>) -> Arc<Self> {
            Arc::new(Self {
                inner: MemoryStore::from_json_lines(lines).unwrap(),
                finds: AtomicUsize::new(0),
                fail_from,
            })
        }

        fn finds(&self) -> usize {
            self.finds.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EventStore for CountingStore {
        async fn find(&self, query: &FindQuery) -> Result<Vec<Document>, StoreError> {
            let call = self.finds.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_from.is_some_and(|n| call >= n) {
                return Err(StoreError::Database(sqlx::Error::PoolClosed));
            }
            self.inner.find(query).await
        }

        async fn find_one(&self, predicate: &Predicate) -> Result<Option<Document>, StoreError> {
            self.inner.find_one(predicate).await
        }

        async fn count(&self, predicate: &Predicate) -> Result<u64, StoreError> {
            self.inner.count(predicate).await
        }
    }

    const CROWD_ONLY: &str = r#"{"code":561,"time":"2024/01/01 16:10:00.000","area":250}
{"code":561,"time":"2024/01/01 16:10:01.000","area":250}
{"code":561,"time":"2024/01/01 16:10:02.000","area":250}"#;

    const BULLETIN_AND_CROWD: &str = r#"{"code":5510,"time":"2024/01/01 16:00:00.000"}
{"code":561,"time":"2024/01/01 16:10:00.000","area":250}
{"code":561,"time":"2024/01/01 16:10:01.000","area":250}
{"code":561,"time":"2024/01/01 16:10:02.000","area":250}"#;

    #[tokio::test]
    async fn test_store_timeout() {
        let store = StoreGuard::new(Arc::new(StalledStore), Duration::from_millis(20));
        let err = search_quake(&store, &QuakeParams::default()).await.unwrap_err();
        assert!(matches!(err, ApiError::Store(StoreError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_get_quake_checks_code_and_id() {
        let store = guard(
            r#"{"_id":"5e8f7b2c9d1a4b0012345678","code":551,"expire":"x","time":"2024/01/01 10:00:00"}
{"_id":"5e8f7b2c9d1a4b0012345679","code":552,"time":"2024/01/01 11:00:00"}"#,
        );

        let quake = get_quake(&store, "5e8f7b2c9d1a4b0012345678").await.unwrap();
        assert_eq!(
            quake,
            json!({ "id": "5e8f7b2c9d1a4b0012345678", "code": 551, "time": "2024/01/01 10:00:00" })
        );

        let wrong_code = get_quake(&store, "5e8f7b2c9d1a4b0012345679").await;
        assert!(matches!(wrong_code, Err(ApiError::NotFound(_))));

        let bad_id = get_tsunami(&store, "not-an-id").await;
        assert!(matches!(bad_id, Err(ApiError::InvalidId(_))));
    }

    #[tokio::test]
    async fn test_human_readable_empty_window_skips_crowd_query() {
        let counting = CountingStore::new(CROWD_ONLY, None);
        let store = StoreGuard::new(counting.clone(), Duration::from_secs(5));

        let timeline = human_readable(&store, &HumanReadableParams::default()).await.unwrap();
        assert!(timeline.is_empty());
        assert_eq!(counting.finds(), 1);

        // A non-empty window goes on to fetch crowd reports
        let counting = CountingStore::new(BULLETIN_AND_CROWD, None);
        let store = StoreGuard::new(counting.clone(), Duration::from_secs(5));
        let timeline = human_readable(&store, &HumanReadableParams::default()).await.unwrap();
        assert_eq!(timeline.len(), 2);
        assert_eq!(counting.finds(), 2);
    }

    #[tokio::test]
    async fn test_human_readable_crowd_failure_fails_request() {
        let counting = CountingStore::new(BULLETIN_AND_CROWD, Some(2));
        let store = StoreGuard::new(counting.clone(), Duration::from_secs(5));

        let result = human_readable(&store, &HumanReadableParams::default()).await;
        assert!(matches!(result, Err(ApiError::Store(StoreError::Database(_)))));
        assert_eq!(counting.finds(), 2);
    }

    #[tokio::test]
    async fn test_human_readable_fuses_clusters() {
        let store = guard(
            r#"{"_id":"000000000000000000000001","code":5510,"time":"2024/01/01 16:00:00.000","ver":"1"}
{"_id":"000000000000000000000002","code":5520,"time":"2024/01/01 16:20:00.000"}
{"code":561,"time":"2024/01/01 15:59:00.000","area":250}
{"code":561,"time":"2024/01/01 16:10:00.000","area":250}
{"code":561,"time":"2024/01/01 16:10:05.000","area":270}
{"code":561,"time":"2024/01/01 16:10:10.000","area":9999}"#,
        );
        let timeline = human_readable(&store, &HumanReadableParams::default()).await.unwrap();

        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline[0]["code"], json!(552));
        assert_eq!(timeline[0]["issue"]["type"], json!("Focus"));
        assert_eq!(timeline[1]["code"], json!(5610));
        assert_eq!(timeline[1]["count"], json!(3));
        assert_eq!(timeline[1]["prefectures"], json!({ "東京": 1, "神奈川": 1 }));
        assert_eq!(timeline[2]["code"], json!(551));
        assert_eq!(timeline[2]["_id"], json!({ "$oid": "000000000000000000000001" }));
        assert!(timeline[2].get("ver").is_none());
    }

    #[tokio::test]
    async fn test_human_readable_truncates_to_page_size() {
        let store = guard(
            r#"{"code":5510,"time":"2024/01/01 16:00:00.000"}
{"code":5510,"time":"2024/01/01 16:20:00.000"}
{"code":561,"time":"2024/01/01 16:10:00.000","area":250}
{"code":561,"time":"2024/01/01 16:10:01.000","area":250}
{"code":561,"time":"2024/01/01 16:10:02.000","area":250}"#,
        );
        let params = HumanReadableParams { offset: 0, limit: 2 };
        let timeline = human_readable(&store, &params).await.unwrap();

        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0]["time"], json!("2024/01/01 16:20:00.000"));
        assert_eq!(timeline[1]["code"], json!(5610));
    }

    #[tokio::test]
    async fn test_count_history_excludes_evaluation() {
        let store = guard(
            r#"{"code":551,"time":"2024/01/01 10:00:00"}
{"code":9611,"time":"2024/01/01 10:01:00"}
{"code":561,"time":"2024/01/01 10:02:00"}"#,
        );
        let all = count_history(&store, &HistoryParams::default()).await.unwrap();
        assert_eq!(all, 3);

        let params = HistoryParams {
            exclude_evaluation: true,
            ..Default::default()
        };
        assert_eq!(count_history(&store, &params).await.unwrap(), 2);
    }
}
