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
use crate::store::{Document, ListQuery};

pub const DESCRIPTOR: SectionDescriptor = SectionDescriptor {
    collection: "training",
    singleton: false,
    media: &[MediaFieldSpec {
        doc_field: "image",
        file_field: "image",
        url_field: "imageUrl",
        alt_field: "imageAlt",
    }],
};

pub const CATEGORIES: &[&str] = &[
    "weight-loss",
    "muscle-building",
    "functional-fitness",
    "hiit-training",
    "yoga",
    "athletic-performance",
];

const DIFFICULTIES: &[&str] = &["beginner", "intermediate", "advanced"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    category: Option<String>,
    difficulty: Option<String>,
    is_active: Option<bool>,
    limit: Option<usize>,
}

/// GET /api/training - list training programs
pub async fn list(State(state): State<AppState>, Query(params): Query<ListParams>) -> ApiResult {
    let query = ListQuery::new()
        .eq("isActive", params.is_active.unwrap_or(true))
        .eq_opt("category", params.category)
        .eq_opt("difficulty", params.difficulty)
        .limit(params.limit);

    let docs = state.store.find(DESCRIPTOR.collection, &query).await;
    Ok(Envelope::list(docs.iter().map(Document::to_value).collect()))
}

/// GET /api/training/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult {
    let doc = state
        .store
        .fetch(DESCRIPTOR.collection, id)
        .await
        .map_err(|e| sections::not_found_as(e, "Training program not found"))?;
    Ok(Envelope::data(doc.to_value()))
}

/// GET /api/training/categories/list - distinct categories of active programs
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

/// POST /api/training
pub async fn create(State(state): State<AppState>, mut payload: SectionPayload) -> ApiResult {
    let fields = FieldMap::new(std::mem::take(&mut payload.fields));
    let mut errors = FieldErrors::new();

    let title = fields.required_str("title", "Title", &mut errors);
    let description = fields.required_str("description", "Description", &mut errors);
    let category = fields.required_enum("category", "Category", CATEGORIES, &mut errors);
    let features = fields.string_array("features", "Feature", 1, &mut errors);
    let duration = fields.optional_str("duration", "Duration", &mut errors);
    let difficulty = fields.optional_enum("difficulty", "Difficulty level", DIFFICULTIES, &mut errors);
    let price = fields.optional_f64_min("price", "Price", 0.0, &mut errors);
    let is_active = fields.optional_bool("isActive", "isActive", &mut errors);
    let order = fields.optional_i64("order", "Order", &mut errors);
    errors.into_result()?;

    let title = title.unwrap_or_default();
    let mut body = Map::new();
    body.insert("title".into(), Value::String(title.clone()));
    if let Some(v) = description {
        body.insert("description".into(), Value::String(v));
    }
    if let Some(v) = category {
        body.insert("category".into(), Value::String(v));
    }
    if let Some(v) = features {
        body.insert("features".into(), json!(v));
    }
    if let Some(v) = duration {
        body.insert("duration".into(), Value::String(v));
    }
    if let Some(v) = price {
        body.insert("price".into(), json!(v));
    }
    body.insert(
        "difficulty".into(),
        Value::String(difficulty.unwrap_or_else(|| "beginner".to_string())),
    );

    if let Some(media) = sections::media_from_payload(
        &mut payload.files,
        &fields,
        &DESCRIPTOR.media[0],
        &format!("{} training program", title),
        &state.media,
    )
    .await?
    {
        body.insert("image".into(), media);
    }

    body.insert("isActive".into(), Value::Bool(is_active.unwrap_or(true)));
    body.insert("order".into(), json!(order.unwrap_or(0)));

    let doc = state.store.insert(DESCRIPTOR.collection, body).await;
    Ok(Envelope::created("Training program created successfully", doc.to_value()))
}

/// PUT /api/training/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut payload: SectionPayload,
) -> ApiResult {
    let fields = FieldMap::new(std::mem::take(&mut payload.fields));
    let mut errors = FieldErrors::new();

    let title = fields.optional_nonempty_str("title", "Title", &mut errors);
    let description = fields.optional_nonempty_str("description", "Description", &mut errors);
    let category = fields.optional_enum("category", "Category", CATEGORIES, &mut errors);
    let features = if fields.has("features") {
        fields.string_array("features", "Feature", 1, &mut errors)
    } else {
        None
    };
    let duration = fields.optional_str("duration", "Duration", &mut errors);
    let difficulty = fields.optional_enum("difficulty", "Difficulty level", DIFFICULTIES, &mut errors);
    let price = fields.optional_f64_min("price", "Price", 0.0, &mut errors);
    let is_active = fields.optional_bool("isActive", "isActive", &mut errors);
    let order = fields.optional_i64("order", "Order", &mut errors);
    errors.into_result()?;

    let existing = state
        .store
        .get(DESCRIPTOR.collection, id)
        .await
        .ok_or_else(|| ApiError::not_found("Training program not found"))?;

    let mut updates = Map::new();
    if let Some(v) = title {
        updates.insert("title".into(), Value::String(v));
    }
    if let Some(v) = description {
        updates.insert("description".into(), Value::String(v));
    }
    if let Some(v) = category {
        updates.insert("category".into(), Value::String(v));
    }
    if let Some(v) = features {
        updates.insert("features".into(), json!(v));
    }
    if let Some(v) = duration {
        updates.insert("duration".into(), Value::String(v));
    }
    if let Some(v) = difficulty {
        updates.insert("difficulty".into(), Value::String(v));
    }
    if let Some(v) = price {
        updates.insert("price".into(), json!(v));
    }
    if let Some(v) = is_active {
        updates.insert("isActive".into(), Value::Bool(v));
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
        existing.body.get("image"),
        &format!("{} training program", current_title),
        &state.media,
    )
    .await?
    {
        updates.insert("image".into(), media.value);
        stale.extend(media.stale_url);
    }

    let doc = state
        .store
        .update(DESCRIPTOR.collection, id, updates)
        .await
        .map_err(|e| sections::not_found_as(e, "Training program not found"))?;

    sections::delete_stale_media(stale, &state.media).await;

    Ok(Envelope::message_data("Training program updated successfully", doc.to_value()))
}

/// DELETE /api/training/:id
pub async fn remove(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult {
    let doc = state
        .store
        .remove(DESCRIPTOR.collection, id)
        .await
        .map_err(|e| sections::not_found_as(e, "Training program not found"))?;

    sections::delete_owned_media(&doc, &DESCRIPTOR, &state.media).await;

    Ok(Envelope::message("Training program deleted successfully"))
}
