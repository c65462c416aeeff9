use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::SectionPayload;
use crate::response::{ApiResult, Envelope};
use crate::sections::fields::{FieldErrors, FieldMap};
use crate::sections::{self, MediaFieldSpec, SectionDescriptor};
use crate::state::AppState;
use crate::store::{Document, ListQuery, Sort};

pub const DESCRIPTOR: SectionDescriptor = SectionDescriptor {
    collection: "gallery",
    singleton: false,
    media: &[
        MediaFieldSpec {
            doc_field: "media",
            file_field: "media",
            url_field: "mediaUrl",
            alt_field: "mediaAlt",
        },
        MediaFieldSpec {
            doc_field: "thumbnail",
            file_field: "thumbnail",
            url_field: "thumbnailUrl",
            alt_field: "thumbnailAlt",
        },
    ],
};

const TYPES: &[&str] = &["image", "video"];
const CATEGORIES: &[&str] = &["equipment", "training", "facility", "classes", "events"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    category: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    is_featured: Option<bool>,
    is_active: Option<bool>,
    limit: Option<usize>,
}

/// GET /api/gallery - list gallery items
pub async fn list(State(state): State<AppState>, Query(params): Query<ListParams>) -> ApiResult {
    let query = ListQuery::new()
        .eq("isActive", params.is_active.unwrap_or(true))
        .eq_opt("category", params.category)
        .eq_opt("type", params.kind)
        .eq_opt("isFeatured", params.is_featured)
        .sort(Sort::FeaturedOrderRecency)
        .limit(params.limit);

    let docs = state.store.find(DESCRIPTOR.collection, &query).await;
    Ok(Envelope::list(docs.iter().map(Document::to_value).collect()))
}

/// GET /api/gallery/:id - get one item, bumping its view counter
pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult {
    let doc = state
        .store
        .increment(DESCRIPTOR.collection, id, "views", 1)
        .await
        .map_err(|e| sections::not_found_as(e, "Gallery item not found"))?;
    Ok(Envelope::data(doc.to_value()))
}

/// GET /api/gallery/categories/list - distinct categories of active items
pub async fn categories(State(state): State<AppState>) -> ApiResult {
    let values = state
        .store
        .distinct(
            DESCRIPTOR.collection,
            "category",
            &ListQuery::new().eq("isActive", true),
        )
        .await;
    Ok(Envelope::data(values))
}

/// POST /api/gallery - create a gallery item
pub async fn create(State(state): State<AppState>, mut payload: SectionPayload) -> ApiResult {
    let fields = FieldMap::new(std::mem::take(&mut payload.fields));
    let mut errors = FieldErrors::new();

    let title = fields.required_str("title", "Title", &mut errors);
    let kind = fields.required_enum("type", "Type", TYPES, &mut errors);
    let category = fields.required_enum("category", "Category", CATEGORIES, &mut errors);
    let description = fields.optional_str_max("description", "Description", 200, &mut errors);
    let tags = fields.optional_string_array("tags", "Tags", &mut errors);
    let is_active = fields.optional_bool("isActive", "isActive", &mut errors);
    let is_featured = fields.optional_bool("isFeatured", "isFeatured", &mut errors);
    let order = fields.optional_i64("order", "Order", &mut errors);
    errors.into_result()?;

    let title = title.unwrap_or_default();
    let mut body = Map::new();
    body.insert("title".into(), Value::String(title.clone()));
    if let Some(v) = kind {
        body.insert("type".into(), Value::String(v));
    }
    if let Some(v) = category {
        body.insert("category".into(), Value::String(v));
    }
    if let Some(v) = description {
        body.insert("description".into(), Value::String(v));
    }
    if let Some(v) = tags {
        body.insert("tags".into(), json!(v));
    }

    if let Some(media) = sections::media_from_payload(
        &mut payload.files,
        &fields,
        &DESCRIPTOR.media[0],
        &title,
        &state.media,
    )
    .await?
    {
        body.insert("media".into(), media);
    }

    // Thumbnails only apply to videos
    if body.get("type").and_then(Value::as_str) == Some("video") {
        if let Some(thumbnail) = sections::media_from_payload(
            &mut payload.files,
            &fields,
            &DESCRIPTOR.media[1],
            &format!("{} thumbnail", title),
            &state.media,
        )
        .await?
        {
            body.insert("thumbnail".into(), thumbnail);
        }
    }

    body.insert("isActive".into(), Value::Bool(is_active.unwrap_or(true)));
    body.insert("isFeatured".into(), Value::Bool(is_featured.unwrap_or(false)));
    body.insert("order".into(), json!(order.unwrap_or(0)));
    body.insert("views".into(), json!(0));

    let doc = state.store.insert(DESCRIPTOR.collection, body).await;
    Ok(Envelope::created("Gallery item created successfully", doc.to_value()))
}

/// PUT /api/gallery/:id - partial update with media replacement
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut payload: SectionPayload,
) -> ApiResult {
    let fields = FieldMap::new(std::mem::take(&mut payload.fields));
    let mut errors = FieldErrors::new();

    let title = fields.optional_nonempty_str("title", "Title", &mut errors);
    let kind = fields.optional_enum("type", "Type", TYPES, &mut errors);
    let category = fields.optional_enum("category", "Category", CATEGORIES, &mut errors);
    let description = fields.optional_str_max("description", "Description", 200, &mut errors);
    let tags = fields.optional_string_array("tags", "Tags", &mut errors);
    let is_active = fields.optional_bool("isActive", "isActive", &mut errors);
    let is_featured = fields.optional_bool("isFeatured", "isFeatured", &mut errors);
    let order = fields.optional_i64("order", "Order", &mut errors);
    errors.into_result()?;

    let existing = state
        .store
        .get(DESCRIPTOR.collection, id)
        .await
        .ok_or_else(|| ApiError::not_found("Gallery item not found"))?;

    let mut updates = Map::new();
    if let Some(v) = title {
        updates.insert("title".into(), Value::String(v));
    }
    if let Some(v) = kind {
        updates.insert("type".into(), Value::String(v));
    }
    if let Some(v) = category {
        updates.insert("category".into(), Value::String(v));
    }
    if let Some(v) = description {
        updates.insert("description".into(), Value::String(v));
    }
    if let Some(v) = tags {
        updates.insert("tags".into(), json!(v));
    }
    if let Some(v) = is_active {
        updates.insert("isActive".into(), Value::Bool(v));
    }
    if let Some(v) = is_featured {
        updates.insert("isFeatured".into(), Value::Bool(v));
    }
    if let Some(v) = order {
        updates.insert("order".into(), json!(v));
    }

    let current_title = updates
        .get("title")
        .and_then(Value::as_str)
        .or_else(|| existing.str_field("title"))
        .unwrap_or_default()
        .to_string();

    let mut stale = Vec::new();
    if let Some(media) = sections::media_update_from_payload(
        &mut payload.files,
        &fields,
        &DESCRIPTOR.media[0],
        existing.body.get("media"),
        &current_title,
        &state.media,
    )
    .await?
    {
        updates.insert("media".into(), media.value);
        stale.extend(media.stale_url);
    }
    if let Some(thumbnail) = sections::media_update_from_payload(
        &mut payload.files,
        &fields,
        &DESCRIPTOR.media[1],
        existing.body.get("thumbnail"),
        &format!("{} thumbnail", current_title),
        &state.media,
    )
    .await?
    {
        updates.insert("thumbnail".into(), thumbnail.value);
        stale.extend(thumbnail.stale_url);
    }

    let doc = state
        .store
        .update(DESCRIPTOR.collection, id, updates)
        .await
        .map_err(|e| sections::not_found_as(e, "Gallery item not found"))?;

    // Superseded objects go only after the write has committed
    sections::delete_stale_media(stale, &state.media).await;

    Ok(Envelope::message_data("Gallery item updated successfully", doc.to_value()))
}

/// DELETE /api/gallery/:id - delete the item and its locally-stored media
pub async fn remove(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult {
    let doc = state
        .store
        .remove(DESCRIPTOR.collection, id)
        .await
        .map_err(|e| sections::not_found_as(e, "Gallery item not found"))?;

    sections::delete_owned_media(&doc, &DESCRIPTOR, &state.media).await;

    Ok(Envelope::message("Gallery item deleted successfully"))
}
