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
    collection: "testimonials",
    singleton: false,
    media: &[
        MediaFieldSpec {
            doc_field: "image",
            file_field: "image",
            url_field: "imageUrl",
            alt_field: "imageAlt",
        },
        MediaFieldSpec {
            doc_field: "beforeImage",
            file_field: "beforeImage",
            url_field: "beforeImageUrl",
            alt_field: "beforeImageAlt",
        },
        MediaFieldSpec {
            doc_field: "afterImage",
            file_field: "afterImage",
            url_field: "afterImageUrl",
            alt_field: "afterImageAlt",
        },
    ],
};

const PROGRAMS: &[&str] = &[
    "weight-loss",
    "muscle-building",
    "functional-fitness",
    "hiit-training",
    "yoga",
    "athletic-performance",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    program: Option<String>,
    rating: Option<u8>,
    is_featured: Option<bool>,
    is_active: Option<bool>,
    limit: Option<usize>,
}

/// GET /api/testimonials - list testimonials
pub async fn list(State(state): State<AppState>, Query(params): Query<ListParams>) -> ApiResult {
    let mut query = ListQuery::new()
        .eq("isActive", params.is_active.unwrap_or(true))
        .eq_opt("program", params.program)
        .eq_opt("isFeatured", params.is_featured)
        .sort(Sort::FeaturedOrderRecency)
        .limit(params.limit);
    if let Some(rating) = params.rating {
        // Lower bound, not exact match: ?rating=4 means 4 stars and up
        query = query.at_least("rating", rating as f64);
    }

    let docs = state.store.find(DESCRIPTOR.collection, &query).await;
    Ok(Envelope::list(docs.iter().map(Document::to_value).collect()))
}

/// GET /api/testimonials/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult {
    let doc = state
        .store
        .fetch(DESCRIPTOR.collection, id)
        .await
        .map_err(|e| sections::not_found_as(e, "Testimonial not found"))?;
    Ok(Envelope::data(doc.to_value()))
}

/// POST /api/testimonials
pub async fn create(State(state): State<AppState>, mut payload: SectionPayload) -> ApiResult {
    let fields = FieldMap::new(std::mem::take(&mut payload.fields));
    let mut errors = FieldErrors::new();

    let name = fields.required_str("name", "Name", &mut errors);
    let role = fields.required_str("role", "Role", &mut errors);
    let text = fields.required_str_max("text", "Testimonial text", 500, &mut errors);
    let rating = fields.required_i64_range("rating", "Rating", 1, 5, &mut errors);
    let result = fields.required_str("result", "Result", &mut errors);
    let program = fields.required_enum("program", "Program", PROGRAMS, &mut errors);
    let duration = fields.optional_str("duration", "Duration", &mut errors);
    let is_active = fields.optional_bool("isActive", "isActive", &mut errors);
    let is_featured = fields.optional_bool("isFeatured", "isFeatured", &mut errors);
    let order = fields.optional_i64("order", "Order", &mut errors);
    errors.into_result()?;

    let name = name.unwrap_or_default();
    let mut body = Map::new();
    body.insert("name".into(), Value::String(name.clone()));
    if let Some(v) = role {
        body.insert("role".into(), Value::String(v));
    }
    if let Some(v) = text {
        body.insert("text".into(), Value::String(v));
    }
    if let Some(v) = rating {
        body.insert("rating".into(), json!(v));
    }
    if let Some(v) = result {
        body.insert("result".into(), Value::String(v));
    }
    if let Some(v) = program {
        body.insert("program".into(), Value::String(v));
    }
    if let Some(v) = duration {
        body.insert("duration".into(), Value::String(v));
    }

    for (spec, default_alt) in [
        (&DESCRIPTOR.media[0], name.clone()),
        (&DESCRIPTOR.media[1], format!("{} before", name)),
        (&DESCRIPTOR.media[2], format!("{} after", name)),
    ] {
        if let Some(media) =
            sections::media_from_payload(&mut payload.files, &fields, spec, &default_alt, &state.media)
                .await?
        {
            body.insert(spec.doc_field.into(), media);
        }
    }

    body.insert("isActive".into(), Value::Bool(is_active.unwrap_or(true)));
    body.insert("isFeatured".into(), Value::Bool(is_featured.unwrap_or(false)));
    body.insert("order".into(), json!(order.unwrap_or(0)));

    let doc = state.store.insert(DESCRIPTOR.collection, body).await;
    Ok(Envelope::created("Testimonial created successfully", doc.to_value()))
}

/// PUT /api/testimonials/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut payload: SectionPayload,
) -> ApiResult {
    let fields = FieldMap::new(std::mem::take(&mut payload.fields));
    let mut errors = FieldErrors::new();

    let name = fields.optional_nonempty_str("name", "Name", &mut errors);
    let role = fields.optional_nonempty_str("role", "Role", &mut errors);
    let text = fields.optional_str_max("text", "Testimonial text", 500, &mut errors);
    let rating = if fields.has("rating") {
        fields.required_i64_range("rating", "Rating", 1, 5, &mut errors)
    } else {
        None
    };
    let result = fields.optional_nonempty_str("result", "Result", &mut errors);
    let program = fields.optional_enum("program", "Program", PROGRAMS, &mut errors);
    let duration = fields.optional_str("duration", "Duration", &mut errors);
    let is_active = fields.optional_bool("isActive", "isActive", &mut errors);
    let is_featured = fields.optional_bool("isFeatured", "isFeatured", &mut errors);
    let order = fields.optional_i64("order", "Order", &mut errors);
    errors.into_result()?;

    let existing = state
        .store
        .get(DESCRIPTOR.collection, id)
        .await
        .ok_or_else(|| ApiError::not_found("Testimonial not found"))?;

    let mut updates = Map::new();
    if let Some(v) = name {
        updates.insert("name".into(), Value::String(v));
    }
    if let Some(v) = role {
        updates.insert("role".into(), Value::String(v));
    }
    if let Some(v) = text {
        updates.insert("text".into(), Value::String(v));
    }
    if let Some(v) = rating {
        updates.insert("rating".into(), json!(v));
    }
    if let Some(v) = result {
        updates.insert("result".into(), Value::String(v));
    }
    if let Some(v) = program {
        updates.insert("program".into(), Value::String(v));
    }
    if let Some(v) = duration {
        updates.insert("duration".into(), Value::String(v));
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

    let current_name = updates
        .get("name")
        .and_then(Value::as_str)
        .or_else(|| existing.str_field("name"))
        .unwrap_or_default()
        .to_string();

    let mut stale = Vec::new();
    for (spec, default_alt) in [
        (&DESCRIPTOR.media[0], current_name.clone()),
        (&DESCRIPTOR.media[1], format!("{} before", current_name)),
        (&DESCRIPTOR.media[2], format!("{} after", current_name)),
    ] {
        if let Some(media) = sections::media_update_from_payload(
            &mut payload.files,
            &fields,
            spec,
            existing.body.get(spec.doc_field),
            &default_alt,
            &state.media,
        )
        .await?
        {
            updates.insert(spec.doc_field.into(), media.value);
            stale.extend(media.stale_url);
        }
    }

    let doc = state
        .store
        .update(DESCRIPTOR.collection, id, updates)
        .await
        .map_err(|e| sections::not_found_as(e, "Testimonial not found"))?;

    sections::delete_stale_media(stale, &state.media).await;

    Ok(Envelope::message_data("Testimonial updated successfully", doc.to_value()))
}

/// DELETE /api/testimonials/:id
pub async fn remove(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult {
    let doc = state
        .store
        .remove(DESCRIPTOR.collection, id)
        .await
        .map_err(|e| sections::not_found_as(e, "Testimonial not found"))?;

    sections::delete_owned_media(&doc, &DESCRIPTOR, &state.media).await;

    Ok(Envelope::message("Testimonial deleted successfully"))
}
