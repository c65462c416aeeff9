use axum::extract::State;
use serde_json::{json, Map, Value};

use crate::extract::SectionPayload;
use crate::response::{ApiResult, Envelope};
use crate::sections::fields::{is_valid_email, FieldErrors, FieldMap};
use crate::sections::{self, MediaFieldSpec, SectionDescriptor};
use crate::state::AppState;
use crate::store::{Document, DocumentStore, ListQuery};

pub const DESCRIPTOR: SectionDescriptor = SectionDescriptor {
    collection: "settings",
    singleton: true,
    media: &[
        MediaFieldSpec {
            doc_field: "site.logo",
            file_field: "logo",
            url_field: "logoUrl",
            alt_field: "logoAlt",
        },
        MediaFieldSpec {
            doc_field: "site.favicon",
            file_field: "favicon",
            url_field: "faviconUrl",
            alt_field: "faviconAlt",
        },
        MediaFieldSpec {
            doc_field: "seo.ogImage",
            file_field: "ogImage",
            url_field: "ogImageUrl",
            alt_field: "ogImageAlt",
        },
    ],
};

/// Schema defaults materialized on first read.
fn default_body() -> Map<String, Value> {
    let defaults = json!({
        "site": {
            "name": "Wolverines Fitness Studio",
            "tagline": "Transform your body, transform your life",
            "description": "Transform your body and mind at our premium fitness studio",
            "keywords": []
        },
        "theme": {
            "primaryColor": "#EAA620",
            "secondaryColor": "#F3CE4D",
            "darkColor": "#000000",
            "lightColor": "#FCF8F8",
            "fontPrimary": "Oswald",
            "fontSecondary": "Open Sans"
        },
        "seo": {
            "metaTitle": "Fitness Studio - Transform Your Body",
            "metaDescription": "Transform your body and mind at our premium fitness studio"
        },
        "email": {
            "fromName": "Wolverines Fitness Studio",
            "fromEmail": "noreply@wolverinesfitness.com",
            "replyToEmail": "info@wolverinesfitness.com"
        },
        "business": {
            "established": 2019,
            "certifications": []
        },
        "features": {
            "onlineBooking": true,
            "membershipSignup": true,
            "classScheduling": true,
            "paymentProcessing": false,
            "liveChat": true,
            "newsletter": true
        },
        "maintenance": {
            "enabled": false,
            "message": "We are currently performing maintenance. Please check back soon!"
        },
        "isActive": true
    });
    match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Get-or-create: the unique active settings document, materialized with
/// schema defaults if none exists yet.
async fn site_settings(store: &DocumentStore) -> Document {
    match store
        .find_one(DESCRIPTOR.collection, &ListQuery::new().eq("isActive", true))
        .await
    {
        Some(doc) => doc,
        None => store.insert(DESCRIPTOR.collection, default_body()).await,
    }
}

/// Public projection: operational secrets (SMTP credentials, analytics
/// ids, business records) never leave the server on the public route.
fn public_projection(doc: &Document) -> Value {
    let body = &doc.body;
    let seo = body.get("seo").cloned().unwrap_or_else(|| json!({}));
    json!({
        "site": body.get("site"),
        "theme": body.get("theme"),
        "seo": {
            "metaTitle": seo.get("metaTitle"),
            "metaDescription": seo.get("metaDescription"),
            "ogImage": seo.get("ogImage"),
        },
        "features": body.get("features"),
        "maintenance": body.get("maintenance"),
    })
}

fn is_hex_color(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// GET /api/settings - public subset of the site settings
pub async fn get(State(state): State<AppState>) -> ApiResult {
    let doc = site_settings(&state.store).await;
    Ok(Envelope::data(public_projection(&doc)))
}

/// GET /api/settings/admin - full settings document
pub async fn get_admin(State(state): State<AppState>) -> ApiResult {
    let doc = site_settings(&state.store).await;
    Ok(Envelope::data(doc.to_value()))
}

/// PUT /api/settings - full update; `site` and `seo` merge one level,
/// the other sub-trees replace wholesale
pub async fn update(State(state): State<AppState>, mut payload: SectionPayload) -> ApiResult {
    let fields = FieldMap::new(std::mem::take(&mut payload.fields));
    let mut errors = FieldErrors::new();

    let site = fields.structured_object("site", "Site", &mut errors);
    let theme = fields.structured_object("theme", "Theme", &mut errors);
    let seo = fields.structured_object("seo", "SEO", &mut errors);
    let email = fields.structured_object("email", "Email", &mut errors);
    let business = fields.structured_object("business", "Business", &mut errors);
    let features = fields.structured_object("features", "Features", &mut errors);
    let maintenance = fields.structured_object("maintenance", "Maintenance", &mut errors);

    if let Some(site) = &site {
        if site.contains_key("name")
            && site.get("name").and_then(Value::as_str).map_or(true, |s| s.trim().is_empty())
        {
            errors.push("site.name", "Site name cannot be empty");
        }
    }
    if let Some(seo) = &seo {
        if seo.contains_key("metaTitle")
            && seo.get("metaTitle").and_then(Value::as_str).map_or(true, |s| s.trim().is_empty())
        {
            errors.push("seo.metaTitle", "Meta title cannot be empty");
        }
    }
    if let Some(email) = &email {
        for key in ["fromEmail", "replyToEmail"] {
            if email.contains_key(key)
                && email.get(key).and_then(Value::as_str).map_or(true, |s| !is_valid_email(&s.to_lowercase()))
            {
                errors.push(format!("email.{}", key), "Valid email is required");
            }
        }
    }
    errors.into_result()?;

    let existing = site_settings(&state.store).await;

    let mut merged_site = match sections::merge_one_level(existing.body.get("site"), site.unwrap_or_default()) {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let mut merged_seo = match sections::merge_one_level(existing.body.get("seo"), seo.unwrap_or_default()) {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let site_name = merged_site
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let mut stale = Vec::new();
    let media_targets = [
        (&DESCRIPTOR.media[0], "logo", format!("{} logo", site_name)),
        (&DESCRIPTOR.media[1], "favicon", format!("{} favicon", site_name)),
        (&DESCRIPTOR.media[2], "ogImage", format!("{} social media image", site_name)),
    ];
    for (spec, key, default_alt) in media_targets {
        let container = if spec.doc_field.starts_with("site.") {
            &mut merged_site
        } else {
            &mut merged_seo
        };
        if let Some(media) = sections::media_update_from_payload(
            &mut payload.files,
            &fields,
            spec,
            container.get(key),
            &default_alt,
            &state.media,
        )
        .await?
        {
            container.insert(key.to_string(), media.value);
            stale.extend(media.stale_url);
        }
    }

    let mut updates = Map::new();
    updates.insert("site".into(), Value::Object(merged_site));
    updates.insert("seo".into(), Value::Object(merged_seo));
    if let Some(v) = theme {
        updates.insert("theme".into(), Value::Object(v));
    }
    if let Some(v) = email {
        updates.insert("email".into(), Value::Object(v));
    }
    if let Some(v) = business {
        updates.insert("business".into(), Value::Object(v));
    }
    if let Some(v) = features {
        updates.insert("features".into(), Value::Object(v));
    }
    if let Some(v) = maintenance {
        updates.insert("maintenance".into(), Value::Object(v));
    }

    let doc = state
        .store
        .update(DESCRIPTOR.collection, existing.id, updates)
        .await?;

    sections::delete_stale_media(stale, &state.media).await;

    Ok(Envelope::message_data("Settings updated successfully", doc.to_value()))
}

/// PUT /api/settings/theme - narrow update touching only the theme
/// sub-tree, bypassing full-document validation
pub async fn update_theme(State(state): State<AppState>, mut payload: SectionPayload) -> ApiResult {
    let fields = FieldMap::new(std::mem::take(&mut payload.fields));
    let mut errors = FieldErrors::new();

    let mut theme_updates = Map::new();
    for (key, label) in [
        ("primaryColor", "Primary color"),
        ("secondaryColor", "Secondary color"),
        ("darkColor", "Dark color"),
        ("lightColor", "Light color"),
    ] {
        if let Some(value) = fields.optional_nonempty_str(key, label, &mut errors) {
            if is_hex_color(&value) {
                theme_updates.insert(key.to_string(), Value::String(value));
            } else {
                errors.push(key, format!("{} must be a valid hex color", label));
            }
        }
    }
    for (key, label) in [("fontPrimary", "Primary font"), ("fontSecondary", "Secondary font")] {
        if let Some(value) = fields.optional_nonempty_str(key, label, &mut errors) {
            theme_updates.insert(key.to_string(), Value::String(value));
        }
    }
    errors.into_result()?;

    let existing = site_settings(&state.store).await;
    let theme = sections::merge_one_level(existing.body.get("theme"), theme_updates);

    let mut updates = Map::new();
    updates.insert("theme".into(), theme);
    let doc = state
        .store
        .update(DESCRIPTOR.collection, existing.id, updates)
        .await?;

    Ok(Envelope::message_data(
        "Theme settings updated successfully",
        doc.body.get("theme").cloned().unwrap_or(Value::Null),
    ))
}

/// PUT /api/settings/maintenance - toggle maintenance mode
pub async fn update_maintenance(
    State(state): State<AppState>,
    mut payload: SectionPayload,
) -> ApiResult {
    let fields = FieldMap::new(std::mem::take(&mut payload.fields));
    let mut errors = FieldErrors::new();

    let enabled = fields.required_bool("enabled", "Enabled", &mut errors);
    let message = fields.optional_nonempty_str("message", "Message", &mut errors);
    let completion = fields.optional_nonempty_str("estimatedCompletion", "Estimated completion", &mut errors);
    let completion = match completion {
        Some(value) => match chrono::DateTime::parse_from_rfc3339(&value) {
            Ok(parsed) => Some(parsed.to_rfc3339()),
            Err(_) => {
                errors.push("estimatedCompletion", "Estimated completion must be a valid date");
                None
            }
        },
        None => None,
    };
    errors.into_result()?;

    let enabled = enabled.unwrap_or(false);
    let existing = site_settings(&state.store).await;

    let mut maintenance_updates = Map::new();
    maintenance_updates.insert("enabled".into(), Value::Bool(enabled));
    if let Some(v) = message {
        maintenance_updates.insert("message".into(), Value::String(v));
    }
    if let Some(v) = completion {
        maintenance_updates.insert("estimatedCompletion".into(), Value::String(v));
    }
    let maintenance = sections::merge_one_level(existing.body.get("maintenance"), maintenance_updates);

    let mut updates = Map::new();
    updates.insert("maintenance".into(), maintenance);
    let doc = state
        .store
        .update(DESCRIPTOR.collection, existing.id, updates)
        .await?;

    Ok(Envelope::message_data(
        format!(
            "Maintenance mode {} successfully",
            if enabled { "enabled" } else { "disabled" }
        ),
        doc.body.get("maintenance").cloned().unwrap_or(Value::Null),
    ))
}
