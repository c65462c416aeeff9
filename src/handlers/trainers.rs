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
    collection: "trainers",
    singleton: false,
    media: &[MediaFieldSpec {
        doc_field: "image",
        file_field: "image",
        url_field: "imageUrl",
        alt_field: "imageAlt",
    }],
};

#[derive(Debug, Serialize, Deserialize, Default)]
struct SocialLinks {
    #[serde(skip_serializing_if = "Option::is_none")]
    instagram: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    facebook: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    twitter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    linkedin: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Availability {
    day: Day,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    is_active: Option<bool>,
    specialty: Option<String>,
    limit: Option<usize>,
}

/// GET /api/trainers - list trainers, optionally matching a specialty
pub async fn list(State(state): State<AppState>, Query(params): Query<ListParams>) -> ApiResult {
    let mut query = ListQuery::new()
        .eq("isActive", params.is_active.unwrap_or(true))
        .limit(params.limit);
    if let Some(specialty) = params.specialty {
        query = query.contains_ci("specialty", specialty);
    }

    let docs = state.store.find(DESCRIPTOR.collection, &query).await;
    Ok(Envelope::list(docs.iter().map(Document::to_value).collect()))
}

/// GET /api/trainers/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult {
    let doc = state
        .store
        .fetch(DESCRIPTOR.collection, id)
        .await
        .map_err(|e| sections::not_found_as(e, "Trainer not found"))?;
    Ok(Envelope::data(doc.to_value()))
}

/// POST /api/trainers
pub async fn create(State(state): State<AppState>, mut payload: SectionPayload) -> ApiResult {
    let fields = FieldMap::new(std::mem::take(&mut payload.fields));
    let mut errors = FieldErrors::new();

    let name = fields.required_str("name", "Name", &mut errors);
    let specialty = fields.required_str("specialty", "Specialty", &mut errors);
    let experience = fields.required_str("experience", "Experience", &mut errors);
    let bio = fields.required_str_max("bio", "Bio", 500, &mut errors);
    let certifications = fields.string_array("certifications", "Certification", 1, &mut errors);
    let social_links: Option<SocialLinks> = fields.structured("socialLinks", "Social links", &mut errors);
    let email = fields.optional_email("email", &mut errors);
    let phone = fields.optional_str("phone", "Phone", &mut errors);
    let availability: Option<Vec<Availability>> =
        fields.structured("availability", "Availability", &mut errors);
    let rating = fields.optional_f64_range("rating", "Rating", 0.0, 5.0, &mut errors);
    let is_active = fields.optional_bool("isActive", "isActive", &mut errors);
    let order = fields.optional_i64("order", "Order", &mut errors);
    errors.into_result()?;

    let name = name.unwrap_or_default();
    let mut body = Map::new();
    body.insert("name".into(), Value::String(name.clone()));
    if let Some(v) = specialty {
        body.insert("specialty".into(), Value::String(v));
    }
    if let Some(v) = experience {
        body.insert("experience".into(), Value::String(v));
    }
    if let Some(v) = bio {
        body.insert("bio".into(), Value::String(v));
    }
    if let Some(v) = certifications {
        body.insert("certifications".into(), json!(v));
    }
    if let Some(v) = social_links {
        body.insert("socialLinks".into(), json!(v));
    }
    if let Some(v) = email {
        body.insert("email".into(), Value::String(v));
    }
    if let Some(v) = phone {
        body.insert("phone".into(), Value::String(v));
    }
    if let Some(v) = availability {
        body.insert("availability".into(), json!(v));
    }
    body.insert("rating".into(), json!(rating.unwrap_or(5.0)));

    if let Some(media) = sections::media_from_payload(
        &mut payload.files,
        &fields,
        &DESCRIPTOR.media[0],
        &format!("{} photo", name),
        &state.media,
    )
    .await?
    {
        body.insert("image".into(), media);
    }

    body.insert("isActive".into(), Value::Bool(is_active.unwrap_or(true)));
    body.insert("order".into(), json!(order.unwrap_or(0)));

    let doc = state.store.insert(DESCRIPTOR.collection, body).await;
    Ok(Envelope::created("Trainer created successfully", doc.to_value()))
}

/// PUT /api/trainers/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut payload: SectionPayload,
) -> ApiResult {
    let fields = FieldMap::new(std::mem::take(&mut payload.fields));
    let mut errors = FieldErrors::new();

    let name = fields.optional_nonempty_str("name", "Name", &mut errors);
    let specialty = fields.optional_nonempty_str("specialty", "Specialty", &mut errors);
    let experience = fields.optional_nonempty_str("experience", "Experience", &mut errors);
    let bio = fields.optional_str_max("bio", "Bio", 500, &mut errors);
    let certifications = if fields.has("certifications") {
        fields.string_array("certifications", "Certification", 1, &mut errors)
    } else {
        None
    };
    let social_links: Option<SocialLinks> = fields.structured("socialLinks", "Social links", &mut errors);
    let email = fields.optional_email("email", &mut errors);
    let phone = fields.optional_str("phone", "Phone", &mut errors);
    let availability: Option<Vec<Availability>> =
        fields.structured("availability", "Availability", &mut errors);
    let rating = fields.optional_f64_range("rating", "Rating", 0.0, 5.0, &mut errors);
    let is_active = fields.optional_bool("isActive", "isActive", &mut errors);
    let order = fields.optional_i64("order", "Order", &mut errors);
    errors.into_result()?;

    let existing = state
        .store
        .get(DESCRIPTOR.collection, id)
        .await
        .ok_or_else(|| ApiError::not_found("Trainer not found"))?;

    let mut updates = Map::new();
    if let Some(v) = name {
        updates.insert("name".into(), Value::String(v));
    }
    if let Some(v) = specialty {
        updates.insert("specialty".into(), Value::String(v));
    }
    if let Some(v) = experience {
        updates.insert("experience".into(), Value::String(v));
    }
    if let Some(v) = bio {
        updates.insert("bio".into(), Value::String(v));
    }
    if let Some(v) = certifications {
        updates.insert("certifications".into(), json!(v));
    }
    if let Some(v) = social_links {
        updates.insert("socialLinks".into(), json!(v));
    }
    if let Some(v) = email {
        updates.insert("email".into(), Value::String(v));
    }
    if let Some(v) = phone {
        updates.insert("phone".into(), Value::String(v));
    }
    if let Some(v) = availability {
        updates.insert("availability".into(), json!(v));
    }
    if let Some(v) = rating {
        updates.insert("rating".into(), json!(v));
    }
    if let Some(v) = is_active {
        updates.insert("isActive".into(), Value::Bool(v));
    }
    if let Some(v) = order {
        updates.insert("order".into(), json!(v));
    }

    let current_name = updates
        .get("name")
        .and_then(Value::as_str)
        .or_else(|| existing.str_field("name"))
        .unwrap_or_default()
        .to_string();

    let mut stale = Vec::new();
    if let Some(media) = sections::media_update_from_payload(
        &mut payload.files,
        &fields,
        &DESCRIPTOR.media[0],
        existing.body.get("image"),
        &format!("{} photo", current_name),
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
        .map_err(|e| sections::not_found_as(e, "Trainer not found"))?;

    sections::delete_stale_media(stale, &state.media).await;

    Ok(Envelope::message_data("Trainer updated successfully", doc.to_value()))
}

/// DELETE /api/trainers/:id
pub async fn remove(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult {
    let doc = state
        .store
        .remove(DESCRIPTOR.collection, id)
        .await
        .map_err(|e| sections::not_found_as(e, "Trainer not found"))?;

    sections::delete_owned_media(&doc, &DESCRIPTOR, &state.media).await;

    Ok(Envelope::message("Trainer deleted successfully"))
}
