mod common;

use axum::http::StatusCode;
use serde_json::json;

fn about_payload() -> serde_json::Value {
    json!({
        "title": "About Us",
        "subtitle": "Our story",
        "description": ["We opened in 2019."],
        "features": [{ "icon": "dumbbell", "title": "Equipment", "description": "Full racks" }],
        "overlayContent": { "title": "Est. 2019", "subtitle": "Coach-owned" }
    })
}

fn contact_payload() -> serde_json::Value {
    json!({
        "gym": { "name": "Iron Temple", "tagline": "Lift heavy" },
        "address": { "street": "1 Main St", "city": "Springfield", "state": "IL", "zipCode": "62701" },
        "contact": { "phone": "555-0100", "email": "Info@IronTemple.com" },
        "location": { "coordinates": { "latitude": 39.78, "longitude": -89.65 } }
    })
}

#[tokio::test]
async fn about_get_is_404_until_created() {
    let app = common::test_app();
    let (status, body) = common::get(&app, "/api/about").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "About section not found");
}

#[tokio::test]
async fn about_second_create_conflicts_and_leaves_store_unchanged() {
    let app = common::test_app();
    let token = common::editor_token();

    let (status, body) = common::post_json(&app, "/api/about", &token, about_payload()).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let first_id = common::doc_id(&body);

    let (status, body) = common::post_json(&app, "/api/about", &token, about_payload()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    // Still exactly the first document
    let (status, body) = common::get(&app, "/api/about").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], json!(first_id));
}

#[tokio::test]
async fn about_create_requires_description_and_features() {
    let app = common::test_app();
    let token = common::editor_token();

    let (status, body) = common::post_json(
        &app,
        "/api/about",
        &token,
        json!({ "title": "About", "subtitle": "Us" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields = common::error_fields(&body);
    assert!(fields.contains(&"description".to_string()), "{}", body);
    assert!(fields.contains(&"features".to_string()), "{}", body);
}

#[tokio::test]
async fn contact_create_validates_nested_required_fields() {
    let app = common::test_app();
    let token = common::editor_token();

    let (status, body) = common::post_json(
        &app,
        "/api/contact",
        &token,
        json!({ "gym": {}, "contact": { "email": "not-an-email" } }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields = common::error_fields(&body);
    for expected in [
        "gym.name",
        "address.street",
        "address.city",
        "address.state",
        "address.zipCode",
        "contact.phone",
        "contact.email",
        "location.coordinates.latitude",
        "location.coordinates.longitude",
    ] {
        assert!(fields.contains(&expected.to_string()), "missing {}: {}", expected, body);
    }
}

#[tokio::test]
async fn contact_round_trip_applies_defaults_and_conflicts_on_second_create() {
    let app = common::test_app();
    let token = common::editor_token();

    let (status, body) = common::post_json(&app, "/api/contact", &token, contact_payload()).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["address"]["country"], "USA");
    assert_eq!(body["data"]["contact"]["email"], "info@irontemple.com");
    assert_eq!(body["data"]["hours"]["weekdays"]["open"], "05:00");
    let id = common::doc_id(&body);

    let (status, _) = common::post_json(&app, "/api/contact", &token, contact_payload()).await;
    assert_eq!(status, StatusCode::CONFLICT);

    // gym merges one level; other sub-trees replace wholesale
    let (status, body) = common::put_json(
        &app,
        &format!("/api/contact/{}", id),
        &token,
        json!({ "gym": { "tagline": "Lift heavier" } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["gym"]["name"], "Iron Temple");
    assert_eq!(body["data"]["gym"]["tagline"], "Lift heavier");
}

#[tokio::test]
async fn contact_encoded_sub_trees_match_native_ones() {
    let app = common::test_app();
    let token = common::editor_token();

    // Same payload with every sub-tree as a JSON-encoded string, the way a
    // multipart client sends it
    let encoded = json!({
        "gym": "{ \"name\": \"Iron Temple\", \"tagline\": \"Lift heavy\" }",
        "address": "{ \"street\": \"1 Main St\", \"city\": \"Springfield\", \"state\": \"IL\", \"zipCode\": \"62701\" }",
        "contact": "{ \"phone\": \"555-0100\", \"email\": \"info@irontemple.com\" }",
        "location": "{ \"coordinates\": { \"latitude\": 39.78, \"longitude\": -89.65 } }"
    });

    let (status, body) = common::post_json(&app, "/api/contact", &token, encoded).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["gym"]["name"], "Iron Temple");
    assert_eq!(body["data"]["location"]["coordinates"]["latitude"], 39.78);
}
