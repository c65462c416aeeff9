use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::SectionPayload;
use crate::response::{ApiResult, Envelope};
use crate::sections::fields::{is_valid_email, FieldErrors, FieldMap};
use crate::sections::{self, MediaFieldSpec, SectionDescriptor};
use crate::state::AppState;
use crate::store::ListQuery;

pub const DESCRIPTOR: SectionDescriptor = SectionDescriptor {
    collection: "contact",
    singleton: true,
    media: &[MediaFieldSpec {
        doc_field: "gym.logo",
        file_field: "logo",
        url_field: "logoUrl",
        alt_field: "logoAlt",
    }],
};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TransportMode {
    Car,
    Metro,
    Bus,
    Bike,
    Walk,
}

#[derive(Debug, Serialize, Deserialize)]
struct TransportOption {
    #[serde(rename = "type")]
    mode: TransportMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

fn nested_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn nested_f64(obj: &Map<String, Value>, path: &[&str]) -> Option<f64> {
    let mut current = obj.get(path[0])?;
    for key in &path[1..] {
        current = current.get(key)?;
    }
    match current {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn require_nested(
    obj: Option<&Map<String, Value>>,
    key: &str,
    path: &str,
    label: &str,
    errors: &mut FieldErrors,
) -> Option<String> {
    let value = obj.and_then(|o| nested_str(o, key));
    if value.is_none() {
        errors.push(path, format!("{} is required", label));
    }
    value
}

fn default_hours() -> Value {
    json!({
        "weekdays": { "open": "05:00", "close": "23:00" },
        "weekends": { "open": "06:00", "close": "22:00" },
        "specialNote": "24/7 Access for Premium & Elite Members"
    })
}

/// GET /api/contact - the active contact document
pub async fn get(State(state): State<AppState>) -> ApiResult {
    let doc = state
        .store
        .find_one(DESCRIPTOR.collection, &ListQuery::new().eq("isActive", true))
        .await
        .ok_or_else(|| ApiError::not_found("Contact information not found"))?;
    Ok(Envelope::data(doc.to_value()))
}

/// POST /api/contact - create the singleton contact document
pub async fn create(State(state): State<AppState>, mut payload: SectionPayload) -> ApiResult {
    let fields = FieldMap::new(std::mem::take(&mut payload.fields));
    let mut errors = FieldErrors::new();

    let gym = fields.structured_object("gym", "Gym", &mut errors);
    let mut address = fields.structured_object("address", "Address", &mut errors);
    let mut contact_info = fields.structured_object("contact", "Contact", &mut errors);
    let hours = fields.structured_object("hours", "Hours", &mut errors);
    let location = fields.structured_object("location", "Location", &mut errors);
    let social_media = fields.structured_object("socialMedia", "Social media", &mut errors);
    let amenities = fields.optional_string_array("amenities", "Amenities", &mut errors);
    let transportation: Option<Vec<TransportOption>> =
        fields.structured("transportation", "Transportation", &mut errors);

    let gym_name = require_nested(gym.as_ref(), "name", "gym.name", "Gym name", &mut errors);
    require_nested(address.as_ref(), "street", "address.street", "Street address", &mut errors);
    require_nested(address.as_ref(), "city", "address.city", "City", &mut errors);
    require_nested(address.as_ref(), "state", "address.state", "State", &mut errors);
    require_nested(address.as_ref(), "zipCode", "address.zipCode", "Zip code", &mut errors);
    require_nested(contact_info.as_ref(), "phone", "contact.phone", "Phone number", &mut errors);

    let email = contact_info.as_ref().and_then(|c| nested_str(c, "email"));
    match &email {
        Some(e) if is_valid_email(&e.to_lowercase()) => {}
        _ => errors.push("contact.email", "Valid email is required"),
    }

    let latitude = location
        .as_ref()
        .and_then(|l| nested_f64(l, &["coordinates", "latitude"]));
    let longitude = location
        .as_ref()
        .and_then(|l| nested_f64(l, &["coordinates", "longitude"]));
    if latitude.is_none() {
        errors.push("location.coordinates.latitude", "Valid latitude is required");
    }
    if longitude.is_none() {
        errors.push("location.coordinates.longitude", "Valid longitude is required");
    }
    errors.into_result()?;

    sections::ensure_singleton_absent(
        &state.store,
        &DESCRIPTOR,
        "Contact information already exists. Use PUT to update.",
    )
    .await?;

    let mut gym = gym.unwrap_or_default();
    let gym_name = gym_name.unwrap_or_default();
    if let Some(logo) = sections::media_from_payload(
        &mut payload.files,
        &fields,
        &DESCRIPTOR.media[0],
        &format!("{} logo", gym_name),
        &state.media,
    )
    .await?
    {
        gym.insert("logo".into(), logo);
    }

    if let Some(addr) = address.as_mut() {
        addr.entry("country".to_string())
            .or_insert_with(|| Value::String("USA".to_string()));
    }
    if let Some(c) = contact_info.as_mut() {
        if let Some(e) = email {
            c.insert("email".into(), Value::String(e.to_lowercase()));
        }
    }

    let mut body = Map::new();
    body.insert("gym".into(), Value::Object(gym));
    if let Some(v) = address {
        body.insert("address".into(), Value::Object(v));
    }
    if let Some(v) = contact_info {
        body.insert("contact".into(), Value::Object(v));
    }
    body.insert(
        "hours".into(),
        match hours {
            Some(h) => sections::merge_one_level(Some(&default_hours()), h),
            None => default_hours(),
        },
    );
    if let Some(v) = location {
        body.insert("location".into(), Value::Object(v));
    }
    if let Some(v) = social_media {
        body.insert("socialMedia".into(), Value::Object(v));
    }
    if let Some(v) = amenities {
        body.insert("amenities".into(), json!(v));
    }
    if let Some(v) = transportation {
        body.insert("transportation".into(), json!(v));
    }
    body.insert("isActive".into(), Value::Bool(true));

    let doc = state.store.insert(DESCRIPTOR.collection, body).await;
    Ok(Envelope::created("Contact information created successfully", doc.to_value()))
}

/// PUT /api/contact/:id - partial update; `gym` merges, other sub-trees
/// replace wholesale
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut payload: SectionPayload,
) -> ApiResult {
    let fields = FieldMap::new(std::mem::take(&mut payload.fields));
    let mut errors = FieldErrors::new();

    let gym = fields.structured_object("gym", "Gym", &mut errors);
    let address = fields.structured_object("address", "Address", &mut errors);
    let mut contact_info = fields.structured_object("contact", "Contact", &mut errors);
    let hours = fields.structured_object("hours", "Hours", &mut errors);
    let location = fields.structured_object("location", "Location", &mut errors);
    let social_media = fields.structured_object("socialMedia", "Social media", &mut errors);
    let amenities = fields.optional_string_array("amenities", "Amenities", &mut errors);
    let transportation: Option<Vec<TransportOption>> =
        fields.structured("transportation", "Transportation", &mut errors);
    let is_active = fields.optional_bool("isActive", "isActive", &mut errors);

    if let Some(c) = contact_info.as_mut() {
        if c.contains_key("email") {
            match nested_str(c, "email") {
                Some(e) if is_valid_email(&e.to_lowercase()) => {
                    c.insert("email".into(), Value::String(e.to_lowercase()));
                }
                _ => errors.push("contact.email", "Valid email is required"),
            }
        }
    }
    if let Some(l) = &location {
        if l.get("coordinates").is_some() {
            if nested_f64(l, &["coordinates", "latitude"]).is_none() {
                errors.push("location.coordinates.latitude", "Valid latitude is required");
            }
            if nested_f64(l, &["coordinates", "longitude"]).is_none() {
                errors.push("location.coordinates.longitude", "Valid longitude is required");
            }
        }
    }
    errors.into_result()?;

    let existing = state
        .store
        .get(DESCRIPTOR.collection, id)
        .await
        .ok_or_else(|| ApiError::not_found("Contact information not found"))?;

    let mut updates = Map::new();

    // gym merges one level so a tagline change doesn't drop the logo
    let mut merged_gym = match sections::merge_one_level(existing.body.get("gym"), gym.unwrap_or_default()) {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let gym_name = nested_str(&merged_gym, "name").unwrap_or_default();

    let mut stale = Vec::new();
    if let Some(logo) = sections::media_update_from_payload(
        &mut payload.files,
        &fields,
        &DESCRIPTOR.media[0],
        merged_gym.get("logo"),
        &format!("{} logo", gym_name),
        &state.media,
    )
    .await?
    {
        merged_gym.insert("logo".into(), logo.value);
        stale.extend(logo.stale_url);
    }
    updates.insert("gym".into(), Value::Object(merged_gym));

    if let Some(v) = address {
        updates.insert("address".into(), Value::Object(v));
    }
    if let Some(v) = contact_info {
        updates.insert("contact".into(), Value::Object(v));
    }
    if let Some(v) = hours {
        updates.insert("hours".into(), Value::Object(v));
    }
    if let Some(v) = location {
        updates.insert("location".into(), Value::Object(v));
    }
    if let Some(v) = social_media {
        updates.insert("socialMedia".into(), Value::Object(v));
    }
    if let Some(v) = amenities {
        updates.insert("amenities".into(), json!(v));
    }
    if let Some(v) = transportation {
        updates.insert("transportation".into(), json!(v));
    }
    if let Some(v) = is_active {
        updates.insert("isActive".into(), Value::Bool(v));
    }

    let doc = state
        .store
        .update(DESCRIPTOR.collection, id, updates)
        .await
        .map_err(|e| sections::not_found_as(e, "Contact information not found"))?;

    sections::delete_stale_media(stale, &state.media).await;

    Ok(Envelope::message_data("Contact information updated successfully", doc.to_value()))
}

/// DELETE /api/contact/:id
pub async fn remove(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult {
    let doc = state
        .store
        .remove(DESCRIPTOR.collection, id)
        .await
        .map_err(|e| sections::not_found_as(e, "Contact information not found"))?;

    sections::delete_owned_media(&doc, &DESCRIPTOR, &state.media).await;

    Ok(Envelope::message("Contact information deleted successfully"))
}
