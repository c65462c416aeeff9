use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
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
    collection: "hero",
    singleton: false,
    media: &[MediaFieldSpec {
        doc_field: "backgroundImage",
        file_field: "backgroundImage",
        url_field: "backgroundImageUrl",
        alt_field: "backgroundImageAlt",
    }],
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum ButtonStyle {
    Primary,
    Outline,
}

impl Default for ButtonStyle {
    fn default() -> Self {
        ButtonStyle::Primary
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Button {
    text: String,
    link: String,
    #[serde(default)]
    style: ButtonStyle,
}

#[derive(Debug, Serialize, Deserialize)]
struct Stat {
    number: String,
    label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    is_active: Option<bool>,
    limit: Option<usize>,
}

/// GET /api/hero - list hero sections
pub async fn list(State(state): State<AppState>, Query(params): Query<ListParams>) -> ApiResult {
    let query = ListQuery::new()
        .eq("isActive", params.is_active.unwrap_or(true))
        .limit(params.limit);

    let docs = state.store.find(DESCRIPTOR.collection, &query).await;
    Ok(Envelope::list(docs.iter().map(Document::to_value).collect()))
}

/// GET /api/hero/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult {
    let doc = state
        .store
        .fetch(DESCRIPTOR.collection, id)
        .await
        .map_err(|e| sections::not_found_as(e, "Hero section not found"))?;
    Ok(Envelope::data(doc.to_value()))
}

/// POST /api/hero
pub async fn create(State(state): State<AppState>, mut payload: SectionPayload) -> ApiResult {
    let fields = FieldMap::new(std::mem::take(&mut payload.fields));
    let mut errors = FieldErrors::new();

    let title = fields.required_str_max("title", "Title", 100, &mut errors);
    let subtitle = fields.required_str_max("subtitle", "Subtitle", 300, &mut errors);
    let buttons: Option<Vec<Button>> = fields.structured("buttons", "Buttons", &mut errors);
    let stats: Option<Vec<Stat>> = fields.structured("stats", "Stats", &mut errors);
    let is_active = fields.optional_bool("isActive", "isActive", &mut errors);
    let order = fields.optional_i64("order", "Order", &mut errors);
    errors.into_result()?;

    let title = title.unwrap_or_default();
    let mut body = Map::new();
    body.insert("title".into(), Value::String(title.clone()));
    if let Some(v) = subtitle {
        body.insert("subtitle".into(), Value::String(v));
    }
    if let Some(v) = buttons {
        body.insert("buttons".into(), json!(v));
    }
    if let Some(v) = stats {
        body.insert("stats".into(), json!(v));
    }

    if let Some(media) = sections::media_from_payload(
        &mut payload.files,
        &fields,
        &DESCRIPTOR.media[0],
        &format!("{} background image", title),
        &state.media,
    )
    .await?
    {
        body.insert("backgroundImage".into(), media);
    }

    body.insert("isActive".into(), Value::Bool(is_active.unwrap_or(true)));
    body.insert("order".into(), json!(order.unwrap_or(0)));

    let doc = state.store.insert(DESCRIPTOR.collection, body).await;
    Ok(Envelope::created("Hero section created successfully", doc.to_value()))
}

/// PUT /api/hero/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut payload: SectionPayload,
) -> ApiResult {
    let fields = FieldMap::new(std::mem::take(&mut payload.fields));
    let mut errors = FieldErrors::new();

    let title = fields.optional_nonempty_str("title", "Title", &mut errors);
    let subtitle = fields.optional_nonempty_str("subtitle", "Subtitle", &mut errors);
    let buttons: Option<Vec<Button>> = fields.structured("buttons", "Buttons", &mut errors);
    let stats: Option<Vec<Stat>> = fields.structured("stats", "Stats", &mut errors);
    let is_active = fields.optional_bool("isActive", "isActive", &mut errors);
    let order = fields.optional_i64("order", "Order", &mut errors);
    errors.into_result()?;

    let existing = state
        .store
        .get(DESCRIPTOR.collection, id)
        .await
        .ok_or_else(|| ApiError::not_found("Hero section not found"))?;

    let mut updates = Map::new();
    if let Some(v) = title {
        updates.insert("title".into(), Value::String(v));
    }
    if let Some(v) = subtitle {
        updates.insert("subtitle".into(), Value::String(v));
    }
    if let Some(v) = buttons {
        updates.insert("buttons".into(), json!(v));
    }
    if let Some(v) = stats {
        updates.insert("stats".into(), json!(v));
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
        existing.body.get("backgroundImage"),
        &format!("{} background image", current_title),
        &state.media,
    )
    .await?
    {
        updates.insert("backgroundImage".into(), media.value);
        stale.extend(media.stale_url);
    }

    let doc = state
        .store
        .update(DESCRIPTOR.collection, id, updates)
        .await
        .map_err(|e| sections::not_found_as(e, "Hero section not found"))?;

    sections::delete_stale_media(stale, &state.media).await;

    Ok(Envelope::message_data("Hero section updated successfully", doc.to_value()))
}

/// DELETE /api/hero/:id
pub async fn remove(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult {
    let doc = state
        .store
        .remove(DESCRIPTOR.collection, id)
        .await
        .map_err(|e| sections::not_found_as(e, "Hero section not found"))?;

    sections::delete_owned_media(&doc, &DESCRIPTOR, &state.media).await;

    Ok(Envelope::message("Hero section deleted successfully"))
}
