use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::extract::SectionPayload;
use crate::response::{ApiResult, Envelope};
use crate::sections::fields::{FieldErrors, FieldMap};
use crate::sections::{self, SectionDescriptor};
use crate::state::AppState;
use crate::store::{Document, ListQuery};

pub const DESCRIPTOR: SectionDescriptor = SectionDescriptor {
    collection: "pricing",
    singleton: false,
    media: &[],
};

const PERIODS: &[&str] = &["month", "year", "week", "day"];

const DEFAULT_COLOR: &str = "#EAA620";

#[derive(Debug, Serialize, Deserialize)]
struct BenefitGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(default)]
    items: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    is_active: Option<bool>,
    limit: Option<usize>,
}

/// GET /api/pricing - list pricing plans
pub async fn list(State(state): State<AppState>, Query(params): Query<ListParams>) -> ApiResult {
    let query = ListQuery::new()
        .eq("isActive", params.is_active.unwrap_or(true))
        .limit(params.limit);

    let docs = state.store.find(DESCRIPTOR.collection, &query).await;
    Ok(Envelope::list(docs.iter().map(Document::to_value).collect()))
}

/// GET /api/pricing/:id
pub async fn get(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult {
    let doc = state
        .store
        .fetch(DESCRIPTOR.collection, id)
        .await
        .map_err(|e| sections::not_found_as(e, "Pricing plan not found"))?;
    Ok(Envelope::data(doc.to_value()))
}

/// POST /api/pricing
pub async fn create(State(state): State<AppState>, mut payload: SectionPayload) -> ApiResult {
    let fields = FieldMap::new(std::mem::take(&mut payload.fields));
    let mut errors = FieldErrors::new();

    let name = fields.required_str("name", "Plan name", &mut errors);
    let price = fields.required_f64_min("price", "Price", 0.0, &mut errors);
    let period = fields.optional_enum("period", "Billing period", PERIODS, &mut errors);
    let description = fields.required_str("description", "Description", &mut errors);
    let features = fields.string_array("features", "Feature", 1, &mut errors);
    let is_popular = fields.optional_bool("isPopular", "isPopular", &mut errors);
    let button_text = fields.required_str("buttonText", "Button text", &mut errors);
    let color = fields.optional_nonempty_str("color", "Color", &mut errors);
    let max_members = fields.optional_i64_min("maxMembers", "Max members", 0, &mut errors);
    let trial_days = fields.optional_i64_min("trialDays", "Trial days", 0, &mut errors);
    let benefits: Option<Vec<BenefitGroup>> = fields.structured("benefits", "Benefits", &mut errors);
    let restrictions = fields.optional_string_array("restrictions", "Restrictions", &mut errors);
    let is_active = fields.optional_bool("isActive", "isActive", &mut errors);
    let order = fields.optional_i64("order", "Order", &mut errors);
    errors.into_result()?;

    let is_popular = is_popular.unwrap_or(false);
    let mut body = Map::new();
    if let Some(v) = name {
        body.insert("name".into(), Value::String(v));
    }
    if let Some(v) = price {
        body.insert("price".into(), json!(v));
    }
    body.insert(
        "period".into(),
        Value::String(period.unwrap_or_else(|| "month".to_string())),
    );
    if let Some(v) = description {
        body.insert("description".into(), Value::String(v));
    }
    if let Some(v) = features {
        body.insert("features".into(), json!(v));
    }
    body.insert("isPopular".into(), Value::Bool(is_popular));
    if let Some(v) = button_text {
        body.insert("buttonText".into(), Value::String(v));
    }
    body.insert(
        "color".into(),
        Value::String(color.unwrap_or_else(|| DEFAULT_COLOR.to_string())),
    );
    if let Some(v) = max_members {
        body.insert("maxMembers".into(), json!(v));
    }
    body.insert("trialDays".into(), json!(trial_days.unwrap_or(7)));
    if let Some(v) = benefits {
        body.insert("benefits".into(), json!(v));
    }
    if let Some(v) = restrictions {
        body.insert("restrictions".into(), json!(v));
    }
    body.insert("isActive".into(), Value::Bool(is_active.unwrap_or(true)));
    body.insert("order".into(), json!(order.unwrap_or(0)));

    // At most one plan is popular: clear the flag everywhere else first
    if is_popular {
        state
            .store
            .clear_flag_except(DESCRIPTOR.collection, "isPopular", None)
            .await;
    }

    let doc = state.store.insert(DESCRIPTOR.collection, body).await;
    Ok(Envelope::created("Pricing plan created successfully", doc.to_value()))
}

/// PUT /api/pricing/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut payload: SectionPayload,
) -> ApiResult {
    let fields = FieldMap::new(std::mem::take(&mut payload.fields));
    let mut errors = FieldErrors::new();

    let name = fields.optional_nonempty_str("name", "Plan name", &mut errors);
    let price = fields.optional_f64_min("price", "Price", 0.0, &mut errors);
    let period = fields.optional_enum("period", "Billing period", PERIODS, &mut errors);
    let description = fields.optional_nonempty_str("description", "Description", &mut errors);
    let features = if fields.has("features") {
        fields.string_array("features", "Feature", 1, &mut errors)
    } else {
        None
    };
    let is_popular = fields.optional_bool("isPopular", "isPopular", &mut errors);
    let button_text = fields.optional_nonempty_str("buttonText", "Button text", &mut errors);
    let color = fields.optional_nonempty_str("color", "Color", &mut errors);
    let max_members = fields.optional_i64_min("maxMembers", "Max members", 0, &mut errors);
    let trial_days = fields.optional_i64_min("trialDays", "Trial days", 0, &mut errors);
    let benefits: Option<Vec<BenefitGroup>> = fields.structured("benefits", "Benefits", &mut errors);
    let restrictions = fields.optional_string_array("restrictions", "Restrictions", &mut errors);
    let is_active = fields.optional_bool("isActive", "isActive", &mut errors);
    let order = fields.optional_i64("order", "Order", &mut errors);
    errors.into_result()?;

    let mut updates = Map::new();
    if let Some(v) = name {
        updates.insert("name".into(), Value::String(v));
    }
    if let Some(v) = price {
        updates.insert("price".into(), json!(v));
    }
    if let Some(v) = period {
        updates.insert("period".into(), Value::String(v));
    }
    if let Some(v) = description {
        updates.insert("description".into(), Value::String(v));
    }
    if let Some(v) = features {
        updates.insert("features".into(), json!(v));
    }
    if let Some(v) = is_popular {
        updates.insert("isPopular".into(), Value::Bool(v));
    }
    if let Some(v) = button_text {
        updates.insert("buttonText".into(), Value::String(v));
    }
    if let Some(v) = color {
        updates.insert("color".into(), Value::String(v));
    }
    if let Some(v) = max_members {
        updates.insert("maxMembers".into(), json!(v));
    }
    if let Some(v) = trial_days {
        updates.insert("trialDays".into(), json!(v));
    }
    if let Some(v) = benefits {
        updates.insert("benefits".into(), json!(v));
    }
    if let Some(v) = restrictions {
        updates.insert("restrictions".into(), json!(v));
    }
    if let Some(v) = is_active {
        updates.insert("isActive".into(), Value::Bool(v));
    }
    if let Some(v) = order {
        updates.insert("order".into(), json!(v));
    }

    state
        .store
        .fetch(DESCRIPTOR.collection, id)
        .await
        .map_err(|e| sections::not_found_as(e, "Pricing plan not found"))?;

    // At most one plan is popular: one conditional bulk clear alongside
    // the target write. Not transactional; last write wins under races.
    if is_popular == Some(true) {
        state
            .store
            .clear_flag_except(DESCRIPTOR.collection, "isPopular", Some(id))
            .await;
    }

    let doc = state
        .store
        .update(DESCRIPTOR.collection, id, updates)
        .await
        .map_err(|e| sections::not_found_as(e, "Pricing plan not found"))?;

    Ok(Envelope::message_data("Pricing plan updated successfully", doc.to_value()))
}

/// DELETE /api/pricing/:id
pub async fn remove(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult {
    state
        .store
        .remove(DESCRIPTOR.collection, id)
        .await
        .map_err(|e| sections::not_found_as(e, "Pricing plan not found"))?;

    Ok(Envelope::message("Pricing plan deleted successfully"))
}
