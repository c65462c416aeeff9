//! Shared machinery behind every section resource: the entity descriptor
//! registry, the media lifecycle (upload precedence, replace, cascade), and
//! the singleton guard. Per-entity handlers stay thin wiring over this.

pub mod fields;

use std::collections::HashMap;

use serde_json::{json, Value};

use crate::error::ApiError;
use crate::extract::UploadedFile;
use crate::media::MediaStore;
use crate::sections::fields::FieldMap;
use crate::store::{Document, DocumentStore, StoreError};

/// Map a store NotFound onto the entity's own 404 message; anything else
/// goes through the generic store-error conversion.
pub fn not_found_as(err: StoreError, message: &str) -> ApiError {
    match err {
        StoreError::NotFound(_) => ApiError::not_found(message),
        other => other.into(),
    }
}

/// One media-bearing field of an entity. `doc_field` is the (possibly
/// dotted) document path; `file_field`/`url_field`/`alt_field` are the
/// request parameter names.
pub struct MediaFieldSpec {
    pub doc_field: &'static str,
    pub file_field: &'static str,
    pub url_field: &'static str,
    pub alt_field: &'static str,
}

/// Static description of one section entity, driving the generic parts of
/// the protocol: collection name, singleton-or-collection nature, and the
/// media fields whose lifecycle is tied to the document.
pub struct SectionDescriptor {
    pub collection: &'static str,
    pub singleton: bool,
    pub media: &'static [MediaFieldSpec],
}

/// A resolved media replacement: the new field value plus the superseded
/// locally-stored URL, which is only deleted after the document write
/// commits so the document never references a missing object.
pub struct MediaUpdate {
    pub value: Value,
    pub stale_url: Option<String>,
}

/// Media precedence on create: uploaded file, then explicit URL field,
/// then nothing (the caller applies any default).
pub async fn media_from_payload(
    files: &mut HashMap<String, UploadedFile>,
    fields: &FieldMap,
    spec: &MediaFieldSpec,
    default_alt: &str,
    media: &MediaStore,
) -> Result<Option<Value>, ApiError> {
    if let Some(file) = files.remove(spec.file_field) {
        let url = media.store(&file.file_name, &file.bytes).await?;
        let alt = fields
            .str_value(spec.alt_field)
            .unwrap_or_else(|| default_alt.to_string());
        return Ok(Some(json!({ "url": url, "alt": alt })));
    }
    if let Some(url) = fields.str_value(spec.url_field) {
        let alt = fields
            .str_value(spec.alt_field)
            .unwrap_or_else(|| default_alt.to_string());
        return Ok(Some(json!({ "url": url, "alt": alt })));
    }
    Ok(None)
}

/// Media replacement on update. Returns `None` when the request does not
/// touch the field; otherwise the new value and the stale local URL (if
/// the previous value was locally stored and is being superseded).
pub async fn media_update_from_payload(
    files: &mut HashMap<String, UploadedFile>,
    fields: &FieldMap,
    spec: &MediaFieldSpec,
    existing: Option<&Value>,
    default_alt: &str,
    media: &MediaStore,
) -> Result<Option<MediaUpdate>, ApiError> {
    let existing_url = existing.and_then(|m| m.get("url")).and_then(Value::as_str);
    let existing_alt = existing.and_then(|m| m.get("alt")).and_then(Value::as_str);

    if let Some(file) = files.remove(spec.file_field) {
        let url = media.store(&file.file_name, &file.bytes).await?;
        let alt = fields
            .str_value(spec.alt_field)
            .or_else(|| existing_alt.map(str::to_string))
            .unwrap_or_else(|| default_alt.to_string());
        let stale_url = existing_url
            .filter(|u| MediaStore::is_local(u))
            .map(str::to_string);
        return Ok(Some(MediaUpdate {
            value: json!({ "url": url, "alt": alt }),
            stale_url,
        }));
    }

    if let Some(url) = fields.str_value(spec.url_field) {
        let alt = fields
            .str_value(spec.alt_field)
            .or_else(|| existing_alt.map(str::to_string))
            .unwrap_or_else(|| default_alt.to_string());
        let stale_url = existing_url
            .filter(|u| MediaStore::is_local(u) && *u != url)
            .map(str::to_string);
        return Ok(Some(MediaUpdate {
            value: json!({ "url": url, "alt": alt }),
            stale_url,
        }));
    }

    Ok(None)
}

/// Delete superseded local media after the document write has committed.
/// Failures are logged, never surfaced: the document is already consistent.
pub async fn delete_stale_media(urls: Vec<String>, media: &MediaStore) {
    for url in urls {
        if let Err(e) = media.delete(&url).await {
            tracing::warn!(url = %url, "failed to delete superseded media: {}", e);
        }
    }
}

/// Cascade delete of every locally-stored media object a document owns,
/// driven by the entity descriptor.
pub async fn delete_owned_media(
    doc: &Document,
    descriptor: &SectionDescriptor,
    media: &MediaStore,
) {
    for spec in descriptor.media {
        let url_path = format!("{}.url", spec.doc_field);
        let Some(url) = doc.get_path(&url_path).and_then(Value::as_str) else {
            continue;
        };
        if MediaStore::is_local(url) {
            if let Err(e) = media.delete(url).await {
                tracing::warn!(url = %url, "failed to delete owned media: {}", e);
            }
        }
    }
}

/// Singleton guard: creation conflicts when any document already exists.
pub async fn ensure_singleton_absent(
    store: &DocumentStore,
    descriptor: &SectionDescriptor,
    message: &str,
) -> Result<(), ApiError> {
    if store.any(descriptor.collection).await {
        return Err(ApiError::conflict(message));
    }
    Ok(())
}

/// One-level merge of a sub-tree update into its existing value, used by
/// the singleton sub-tree semantics (`site`, `seo`, `gym`).
pub fn merge_one_level(existing: Option<&Value>, updates: serde_json::Map<String, Value>) -> Value {
    let mut merged = match existing {
        Some(Value::Object(map)) => map.clone(),
        _ => serde_json::Map::new(),
    };
    for (k, v) in updates {
        merged.insert(k, v);
    }
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::fields::FieldMap;

    const SPEC: MediaFieldSpec = MediaFieldSpec {
        doc_field: "image",
        file_field: "image",
        url_field: "imageUrl",
        alt_field: "imageAlt",
    };

    fn field_map(pairs: Vec<(&str, Value)>) -> FieldMap {
        let mut m = serde_json::Map::new();
        for (k, v) in pairs {
            m.insert(k.to_string(), v);
        }
        FieldMap::new(m)
    }

    fn media_store(dir: &std::path::Path) -> MediaStore {
        MediaStore::new(dir, "http://localhost:5000", 1024 * 1024)
    }

    #[tokio::test]
    async fn uploaded_file_wins_over_url_field() {
        let dir = tempfile::tempdir().unwrap();
        let media = media_store(dir.path());
        let fields = field_map(vec![("imageUrl", json!("https://cdn.example.com/a.png"))]);
        let mut files = HashMap::new();
        files.insert(
            "image".to_string(),
            UploadedFile {
                file_name: "a.png".to_string(),
                content_type: Some("image/png".to_string()),
                bytes: axum::body::Bytes::from_static(b"png"),
            },
        );

        let value = media_from_payload(&mut files, &fields, &SPEC, "Photo", &media)
            .await
            .unwrap()
            .unwrap();
        assert!(MediaStore::is_local(value["url"].as_str().unwrap()));
    }

    #[tokio::test]
    async fn url_field_used_when_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let media = media_store(dir.path());
        let fields = field_map(vec![("imageUrl", json!("https://cdn.example.com/a.png"))]);
        let mut files = HashMap::new();

        let value = media_from_payload(&mut files, &fields, &SPEC, "Photo", &media)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(value["url"], "https://cdn.example.com/a.png");
        assert_eq!(value["alt"], "Photo");
    }

    #[tokio::test]
    async fn replacement_reports_stale_local_url_only() {
        let dir = tempfile::tempdir().unwrap();
        let media = media_store(dir.path());
        let fields = field_map(vec![("imageUrl", json!("https://cdn.example.com/new.png"))]);
        let mut files = HashMap::new();

        // Locally stored previous value: superseded object is flagged stale.
        let local = json!({ "url": "http://localhost:5000/uploads/old.png", "alt": "old" });
        let update = media_update_from_payload(&mut files, &fields, &SPEC, Some(&local), "Photo", &media)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            update.stale_url.as_deref(),
            Some("http://localhost:5000/uploads/old.png")
        );
        // Alt carries over when the request doesn't supply one.
        assert_eq!(update.value["alt"], "old");

        // External previous value: nothing to clean up.
        let external = json!({ "url": "https://cdn.example.com/old.png", "alt": "old" });
        let update = media_update_from_payload(&mut files, &fields, &SPEC, Some(&external), "Photo", &media)
            .await
            .unwrap()
            .unwrap();
        assert!(update.stale_url.is_none());
    }

    #[test]
    fn merge_one_level_keeps_untouched_keys() {
        let existing = json!({ "name": "Iron Temple", "tagline": "Lift" });
        let mut updates = serde_json::Map::new();
        updates.insert("tagline".to_string(), json!("Lift heavier"));
        let merged = merge_one_level(Some(&existing), updates);
        assert_eq!(merged["name"], "Iron Temple");
        assert_eq!(merged["tagline"], "Lift heavier");
    }
}
