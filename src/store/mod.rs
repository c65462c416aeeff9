//! JSON document collections with the query surface the section handlers
//! need: equality filters, numeric lower bounds, substring matches, the two
//! fixed sort specs, limits, distinct values, and the conditional bulk
//! flag-clear behind the pricing exclusivity rule.

pub mod document;

pub use document::Document;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;

use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("snapshot failed: {0}")]
    Snapshot(String),
}

/// Sort spec per the section contract: featured entities sort
/// `(isFeatured desc, order asc, createdAt desc)`, the rest
/// `(order asc, createdAt desc)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Sort {
    #[default]
    OrderRecency,
    FeaturedOrderRecency,
}

/// Builder-style list query assembled by the handlers from query strings.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    eq: Vec<(String, Value)>,
    at_least: Vec<(String, f64)>,
    contains_ci: Vec<(String, String)>,
    sort: Sort,
    limit: Option<usize>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.eq.push((field.into(), value.into()));
        self
    }

    /// Equality filter only when the caller supplied a value.
    pub fn eq_opt(self, field: impl Into<String>, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(v) => self.eq(field, v),
            None => self,
        }
    }

    /// Numeric lower bound, e.g. `rating >= 4`.
    pub fn at_least(mut self, field: impl Into<String>, min: f64) -> Self {
        self.at_least.push((field.into(), min));
        self
    }

    /// Case-insensitive substring match, e.g. trainer specialty search.
    pub fn contains_ci(mut self, field: impl Into<String>, needle: impl Into<String>) -> Self {
        self.contains_ci.push((field.into(), needle.into()));
        self
    }

    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        // Cap at the configured maximum
        let max = crate::config::config().api.max_list_limit;
        self.limit = limit.map(|n| n.min(max));
        self
    }

    fn matches(&self, doc: &Document) -> bool {
        for (field, expected) in &self.eq {
            if doc.body.get(field) != Some(expected) {
                return false;
            }
        }
        for (field, min) in &self.at_least {
            match doc.num_field(field) {
                Some(n) if n >= *min => {}
                _ => return false,
            }
        }
        for (field, needle) in &self.contains_ci {
            match doc.str_field(field) {
                Some(s) if s.to_lowercase().contains(&needle.to_lowercase()) => {}
                _ => return false,
            }
        }
        true
    }

    fn compare(&self, a: &Document, b: &Document) -> Ordering {
        if self.sort == Sort::FeaturedOrderRecency {
            let fa = a.bool_field("isFeatured").unwrap_or(false);
            let fb = b.bool_field("isFeatured").unwrap_or(false);
            match fb.cmp(&fa) {
                Ordering::Equal => {}
                other => return other,
            }
        }
        let oa = a.num_field("order").unwrap_or(0.0);
        let ob = b.num_field("order").unwrap_or(0.0);
        match oa.partial_cmp(&ob).unwrap_or(Ordering::Equal) {
            Ordering::Equal => b.created_at.cmp(&a.created_at),
            other => other,
        }
    }
}

/// In-memory document store with optional JSON snapshot persistence.
/// Persistence is write-behind and best-effort; a failed snapshot is
/// logged, never surfaced to the request.
pub struct DocumentStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    snapshot_path: Option<PathBuf>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            snapshot_path: None,
        }
    }

    /// Open a store backed by a JSON snapshot file, loading any existing
    /// content from it.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let collections = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(StoreError::Snapshot(e.to_string())),
        };
        Ok(Self {
            collections: RwLock::new(collections),
            snapshot_path: Some(path),
        })
    }

    async fn persist(&self) {
        let Some(path) = &self.snapshot_path else {
            return;
        };
        let bytes = {
            let collections = self.collections.read().await;
            match serde_json::to_vec_pretty(&*collections) {
                Ok(b) => b,
                Err(e) => {
                    tracing::warn!("snapshot serialization failed: {}", e);
                    return;
                }
            }
        };
        if let Err(e) = tokio::fs::write(path, bytes).await {
            tracing::warn!("snapshot write to {} failed: {}", path.display(), e);
        }
    }

    pub async fn insert(&self, collection: &str, body: Map<String, Value>) -> Document {
        let doc = Document::new(body);
        {
            let mut collections = self.collections.write().await;
            collections
                .entry(collection.to_string())
                .or_default()
                .push(doc.clone());
        }
        self.persist().await;
        doc
    }

    pub async fn find(&self, collection: &str, query: &ListQuery) -> Vec<Document> {
        let collections = self.collections.read().await;
        let mut docs: Vec<Document> = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| query.matches(d)).cloned().collect())
            .unwrap_or_default();
        docs.sort_by(|a, b| query.compare(a, b));
        if let Some(limit) = query.limit {
            docs.truncate(limit);
        }
        docs
    }

    pub async fn find_one(&self, collection: &str, query: &ListQuery) -> Option<Document> {
        self.find(collection, query).await.into_iter().next()
    }

    pub async fn get(&self, collection: &str, id: Uuid) -> Option<Document> {
        let collections = self.collections.read().await;
        collections
            .get(collection)?
            .iter()
            .find(|d| d.id == id)
            .cloned()
    }

    /// Fetch by id, failing with NotFound when the id does not resolve.
    pub async fn fetch(&self, collection: &str, id: Uuid) -> Result<Document, StoreError> {
        self.get(collection, id)
            .await
            .ok_or_else(|| StoreError::NotFound(format!("{} {} not found", collection, id)))
    }

    /// Does any document exist in the collection? Used by singleton creates.
    pub async fn any(&self, collection: &str) -> bool {
        let collections = self.collections.read().await;
        collections.get(collection).is_some_and(|docs| !docs.is_empty())
    }

    /// Merge a partial update into one document and bump `updatedAt`.
    pub async fn update(
        &self,
        collection: &str,
        id: Uuid,
        updates: Map<String, Value>,
    ) -> Result<Document, StoreError> {
        let updated = {
            let mut collections = self.collections.write().await;
            let doc = collections
                .get_mut(collection)
                .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
                .ok_or_else(|| StoreError::NotFound(format!("{} {} not found", collection, id)))?;
            doc.merge(updates);
            doc.clone()
        };
        self.persist().await;
        Ok(updated)
    }

    pub async fn remove(&self, collection: &str, id: Uuid) -> Result<Document, StoreError> {
        let removed = {
            let mut collections = self.collections.write().await;
            let docs = collections
                .get_mut(collection)
                .ok_or_else(|| StoreError::NotFound(format!("{} {} not found", collection, id)))?;
            let index = docs
                .iter()
                .position(|d| d.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("{} {} not found", collection, id)))?;
            docs.remove(index)
        };
        self.persist().await;
        Ok(removed)
    }

    /// Add `delta` to a numeric field, e.g. the gallery view counter.
    pub async fn increment(
        &self,
        collection: &str,
        id: Uuid,
        field: &str,
        delta: i64,
    ) -> Result<Document, StoreError> {
        let updated = {
            let mut collections = self.collections.write().await;
            let doc = collections
                .get_mut(collection)
                .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
                .ok_or_else(|| StoreError::NotFound(format!("{} {} not found", collection, id)))?;
            let current = doc.num_field(field).unwrap_or(0.0) as i64;
            doc.body
                .insert(field.to_string(), Value::from(current + delta));
            doc.clone()
        };
        self.persist().await;
        Ok(updated)
    }

    /// Clear a boolean flag on every document in the collection except one.
    /// One conditional bulk write, issued alongside the target update.
    pub async fn clear_flag_except(
        &self,
        collection: &str,
        field: &str,
        except: Option<Uuid>,
    ) -> usize {
        let cleared = {
            let mut collections = self.collections.write().await;
            let Some(docs) = collections.get_mut(collection) else {
                return 0;
            };
            let mut cleared = 0;
            for doc in docs.iter_mut() {
                if Some(doc.id) == except {
                    continue;
                }
                if doc.bool_field(field).unwrap_or(false) {
                    doc.body.insert(field.to_string(), Value::Bool(false));
                    cleared += 1;
                }
            }
            cleared
        };
        if cleared > 0 {
            self.persist().await;
        }
        cleared
    }

    /// Distinct string values of one field across matching documents.
    pub async fn distinct(&self, collection: &str, field: &str, query: &ListQuery) -> Vec<String> {
        let docs = self.find(collection, query).await;
        let mut values: Vec<String> = docs
            .iter()
            .filter_map(|d| d.str_field(field).map(str::to_string))
            .collect();
        values.sort();
        values.dedup();
        values
    }

    pub async fn count(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map_or(0, Vec::len)
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(pairs: Vec<(&str, Value)>) -> Map<String, Value> {
        let mut m = Map::new();
        for (k, v) in pairs {
            m.insert(k.to_string(), v);
        }
        m
    }

    #[tokio::test]
    async fn featured_sort_puts_featured_first_then_order() {
        let store = DocumentStore::new();
        store
            .insert("gallery", body(vec![("title", json!("c")), ("order", json!(2)), ("isFeatured", json!(false)), ("isActive", json!(true))]))
            .await;
        store
            .insert("gallery", body(vec![("title", json!("b")), ("order", json!(9)), ("isFeatured", json!(true)), ("isActive", json!(true))]))
            .await;
        store
            .insert("gallery", body(vec![("title", json!("a")), ("order", json!(1)), ("isFeatured", json!(false)), ("isActive", json!(true))]))
            .await;

        let docs = store
            .find("gallery", &ListQuery::new().sort(Sort::FeaturedOrderRecency))
            .await;
        let titles: Vec<_> = docs.iter().map(|d| d.str_field("title").unwrap()).collect();
        assert_eq!(titles, vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn recency_breaks_order_ties_newest_first() {
        let store = DocumentStore::new();
        store
            .insert("hero", body(vec![("title", json!("old")), ("order", json!(0))]))
            .await;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store
            .insert("hero", body(vec![("title", json!("new")), ("order", json!(0))]))
            .await;

        let docs = store.find("hero", &ListQuery::new()).await;
        assert_eq!(docs[0].str_field("title"), Some("new"));
    }

    #[tokio::test]
    async fn eq_filter_is_exact_match() {
        let store = DocumentStore::new();
        store
            .insert("training", body(vec![("category", json!("yoga")), ("isActive", json!(true))]))
            .await;
        store
            .insert("training", body(vec![("category", json!("yoga")), ("isActive", json!(false))]))
            .await;

        let active = store
            .find("training", &ListQuery::new().eq("isActive", true))
            .await;
        assert_eq!(active.len(), 1);
        let inactive = store
            .find("training", &ListQuery::new().eq("isActive", false))
            .await;
        assert_eq!(inactive.len(), 1);
    }

    #[tokio::test]
    async fn at_least_and_contains_filters() {
        let store = DocumentStore::new();
        store
            .insert("trainers", body(vec![("specialty", json!("Strength & Conditioning")), ("rating", json!(5))]))
            .await;
        store
            .insert("trainers", body(vec![("specialty", json!("Yoga")), ("rating", json!(3))]))
            .await;

        let strength = store
            .find("trainers", &ListQuery::new().contains_ci("specialty", "strength"))
            .await;
        assert_eq!(strength.len(), 1);

        let top = store
            .find("trainers", &ListQuery::new().at_least("rating", 4.0))
            .await;
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].str_field("specialty"), Some("Strength & Conditioning"));
    }

    #[tokio::test]
    async fn clear_flag_except_leaves_only_the_target() {
        let store = DocumentStore::new();
        let a = store
            .insert("pricing", body(vec![("name", json!("Basic")), ("isPopular", json!(true))]))
            .await;
        let b = store
            .insert("pricing", body(vec![("name", json!("Pro")), ("isPopular", json!(true))]))
            .await;

        let cleared = store
            .clear_flag_except("pricing", "isPopular", Some(b.id))
            .await;
        assert_eq!(cleared, 1);
        assert_eq!(
            store.get("pricing", a.id).await.unwrap().bool_field("isPopular"),
            Some(false)
        );
        assert_eq!(
            store.get("pricing", b.id).await.unwrap().bool_field("isPopular"),
            Some(true)
        );
    }

    #[tokio::test]
    async fn increment_is_cumulative() {
        let store = DocumentStore::new();
        let doc = store
            .insert("gallery", body(vec![("views", json!(0))]))
            .await;
        store.increment("gallery", doc.id, "views", 1).await.unwrap();
        store.increment("gallery", doc.id, "views", 1).await.unwrap();
        let doc = store.get("gallery", doc.id).await.unwrap();
        assert_eq!(doc.num_field("views"), Some(2.0));
    }

    #[tokio::test]
    async fn distinct_sorts_and_dedupes() {
        let store = DocumentStore::new();
        for cat in ["facility", "equipment", "facility"] {
            store
                .insert("gallery", body(vec![("category", json!(cat)), ("isActive", json!(true))]))
                .await;
        }
        let cats = store
            .distinct("gallery", "category", &ListQuery::new().eq("isActive", true))
            .await;
        assert_eq!(cats, vec!["equipment", "facility"]);
    }

    #[tokio::test]
    async fn snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.json");

        let store = DocumentStore::open(&path).await.unwrap();
        store
            .insert("hero", body(vec![("title", json!("persisted"))]))
            .await;
        drop(store);

        let reopened = DocumentStore::open(&path).await.unwrap();
        let docs = reopened.find("hero", &ListQuery::new()).await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].str_field("title"), Some("persisted"));
    }
}
