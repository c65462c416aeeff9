use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::SectionPayload;
use crate::response::{ApiResult, Envelope};
use crate::sections::fields::{FieldErrors, FieldMap};
use crate::sections::{self, MediaFieldSpec, SectionDescriptor};
use crate::state::AppState;
use crate::store::ListQuery;

pub const DESCRIPTOR: SectionDescriptor = SectionDescriptor {
    collection: "about",
    singleton: true,
    media: &[MediaFieldSpec {
        doc_field: "image",
        file_field: "image",
        url_field: "imageUrl",
        alt_field: "imageAlt",
    }],
};

const DEFAULT_ALT: &str = "About us image";

#[derive(Debug, Serialize, Deserialize)]
struct Feature {
    icon: String,
    title: String,
    description: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OverlayContent {
    title: String,
    subtitle: String,
}

/// GET /api/about - the active about section
pub async fn get(State(state): State<AppState>) -> ApiResult {
    let doc = state
        .store
        .find_one(DESCRIPTOR.collection, &ListQuery::new().eq("isActive", true))
        .await
        .ok_or_else(|| ApiError::not_found("About section not found"))?;
    Ok(Envelope::data(doc.to_value()))
}

/// POST /api/about - create the singleton about section
pub async fn create(State(state): State<AppState>, mut payload: SectionPayload) -> ApiResult {
    let fields = FieldMap::new(std::mem::take(&mut payload.fields));
    let mut errors = FieldErrors::new();

    let title = fields.required_str("title", "Title", &mut errors);
    let subtitle = fields.required_str("subtitle", "Subtitle", &mut errors);
    let description = fields.string_array("description", "Description paragraph", 1, &mut errors);
    let features: Option<Vec<Feature>> = if fields.has("features") {
        fields.structured("features", "Features", &mut errors)
    } else {
        errors.push("features", "At least one feature is required");
        None
    };
    let overlay: Option<OverlayContent> = fields.structured("overlayContent", "Overlay content", &mut errors);
    errors.into_result()?;

    sections::ensure_singleton_absent(
        &state.store,
        &DESCRIPTOR,
        "About section already exists. Use PUT to update.",
    )
    .await?;

    let mut body = Map::new();
    if let Some(v) = title {
        body.insert("title".into(), Value::String(v));
    }
    if let Some(v) = subtitle {
        body.insert("subtitle".into(), Value::String(v));
    }
    if let Some(v) = description {
        body.insert("description".into(), json!(v));
    }
    if let Some(v) = features {
        body.insert("features".into(), json!(v));
    }
    if let Some(v) = overlay {
        body.insert("overlayContent".into(), json!(v));
    }

    if let Some(media) = sections::media_from_payload(
        &mut payload.files,
        &fields,
        &DESCRIPTOR.media[0],
        DEFAULT_ALT,
        &state.media,
    )
    .await?
    {
        body.insert("image".into(), media);
    }

    body.insert("isActive".into(), Value::Bool(true));

    let doc = state.store.insert(DESCRIPTOR.collection, body).await;
    Ok(Envelope::created("About section created successfully", doc.to_value()))
}

/// PUT /api/about/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut payload: SectionPayload,
) -> ApiResult {
    let fields = FieldMap::new(std::mem::take(&mut payload.fields));
    let mut errors = FieldErrors::new();

    let title = fields.optional_nonempty_str("title", "Title", &mut errors);
    let subtitle = fields.optional_nonempty_str("subtitle", "Subtitle", &mut errors);
    let description = if fields.has("description") {
        fields.string_array("description", "Description paragraph", 1, &mut errors)
    } else {
        None
    };
    let features: Option<Vec<Feature>> = fields.structured("features", "Features", &mut errors);
    let overlay: Option<OverlayContent> = fields.structured("overlayContent", "Overlay content", &mut errors);
    let is_active = fields.optional_bool("isActive", "isActive", &mut errors);
    errors.into_result()?;

    let existing = state
        .store
        .get(DESCRIPTOR.collection, id)
        .await
        .ok_or_else(|| ApiError::not_found("About section not found"))?;

    let mut updates = Map::new();
    if let Some(v) = title {
        updates.insert("title".into(), Value::String(v));
    }
    if let Some(v) = subtitle {
        updates.insert("subtitle".into(), Value::String(v));
    }
    if let Some(v) = description {
        updates.insert("description".into(), json!(v));
    }
    if let Some(v) = features {
        updates.insert("features".into(), json!(v));
    }
    if let Some(v) = overlay {
        updates.insert("overlayContent".into(), json!(v));
    }
    if let Some(v) = is_active {
        updates.insert("isActive".into(), Value::Bool(v));
    }

    let mut stale = Vec::new();
    if let Some(media) = sections::media_update_from_payload(
        &mut payload.files,
        &fields,
        &DESCRIPTOR.media[0],
        existing.body.get("image"),
        DEFAULT_ALT,
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
        .map_err(|e| sections::not_found_as(e, "About section not found"))?;

    sections::delete_stale_media(stale, &state.media).await;

    Ok(Envelope::message_data("About section updated successfully", doc.to_value()))
}

/// DELETE /api/about/:id
pub async fn remove(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult {
    let doc = state
        .store
        .remove(DESCRIPTOR.collection, id)
        .await
        .map_err(|e| sections::not_found_as(e, "About section not found"))?;

    sections::delete_owned_media(&doc, &DESCRIPTOR, &state.media).await;

    Ok(Envelope::message("About section deleted successfully"))
}
