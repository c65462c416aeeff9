mod common;

use axum::http::StatusCode;
use serde_json::json;

fn file_name(url: &str) -> &str {
    url.rsplit('/').next().unwrap()
}

#[tokio::test]
async fn gallery_get_increments_views_once_per_call() {
    let app = common::test_app();
    let token = common::editor_token();

    let (_, body) = common::post_json(
        &app,
        "/api/gallery",
        &token,
        json!({
            "title": "Deadlift platform",
            "type": "image",
            "category": "equipment",
            "mediaUrl": "https://cdn.example.com/platform.jpg"
        }),
    )
    .await;
    let id = common::doc_id(&body);
    assert_eq!(body["data"]["views"], 0);

    for expected in 1..=3 {
        let (status, body) = common::get(&app, &format!("/api/gallery/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["views"], expected);
    }
}

#[tokio::test]
async fn gallery_list_sorts_featured_first() {
    let app = common::test_app();
    let token = common::editor_token();

    for (title, featured, order) in [("plain", false, 1), ("star", true, 9)] {
        common::post_json(
            &app,
            "/api/gallery",
            &token,
            json!({
                "title": title,
                "type": "image",
                "category": "facility",
                "mediaUrl": "https://cdn.example.com/a.jpg",
                "isFeatured": featured,
                "order": order
            }),
        )
        .await;
    }

    let (_, body) = common::get(&app, "/api/gallery").await;
    assert_eq!(body["data"][0]["title"], "star");

    let (_, body) = common::get(&app, "/api/gallery?isFeatured=false").await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["title"], "plain");
}

#[tokio::test]
async fn gallery_categories_endpoint_lists_distinct_values() {
    let app = common::test_app();
    let token = common::editor_token();

    for category in ["equipment", "classes", "equipment"] {
        common::post_json(
            &app,
            "/api/gallery",
            &token,
            json!({
                "title": "item",
                "type": "image",
                "category": category,
                "mediaUrl": "https://cdn.example.com/a.jpg"
            }),
        )
        .await;
    }

    let (status, body) = common::get(&app, "/api/gallery/categories/list").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!(["classes", "equipment"]));
}

#[tokio::test]
async fn uploaded_media_lives_under_uploads_and_dies_with_the_document() {
    let app = common::test_app();
    let token = common::editor_token();

    let (status, body) = common::post_multipart(
        &app,
        "/api/gallery",
        &token,
        &[("title", "Turf"), ("type", "image"), ("category", "facility")],
        &[("media", "turf.jpg", b"jpeg-bytes")],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let url = body["data"]["media"]["url"].as_str().unwrap().to_string();
    assert!(url.contains("/uploads/"), "{}", url);
    assert!(app.media_dir.path().join(file_name(&url)).exists());
    let id = common::doc_id(&body);

    let (status, _) = common::delete(&app, &format!("/api/gallery/{}", id), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!app.media_dir.path().join(file_name(&url)).exists());
}

#[tokio::test]
async fn replacing_media_deletes_the_superseded_local_object() {
    let app = common::test_app();
    let token = common::editor_token();

    let (_, body) = common::post_multipart(
        &app,
        "/api/gallery",
        &token,
        &[("title", "Rack"), ("type", "image"), ("category", "equipment")],
        &[("media", "rack-v1.jpg", b"old-bytes")],
    )
    .await;
    let id = common::doc_id(&body);
    let old_url = body["data"]["media"]["url"].as_str().unwrap().to_string();

    let (status, body) = common::put_multipart(
        &app,
        &format!("/api/gallery/{}", id),
        &token,
        &[],
        &[("media", "rack-v2.jpg", b"new-bytes")],
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let new_url = body["data"]["media"]["url"].as_str().unwrap().to_string();
    assert_ne!(new_url, old_url);
    assert!(app.media_dir.path().join(file_name(&new_url)).exists());
    assert!(!app.media_dir.path().join(file_name(&old_url)).exists());
}

#[tokio::test]
async fn switching_to_an_external_url_cleans_up_the_local_object() {
    let app = common::test_app();
    let token = common::editor_token();

    let (_, body) = common::post_multipart(
        &app,
        "/api/gallery",
        &token,
        &[("title", "Bikes"), ("type", "image"), ("category", "equipment")],
        &[("media", "bikes.jpg", b"bytes")],
    )
    .await;
    let id = common::doc_id(&body);
    let old_url = body["data"]["media"]["url"].as_str().unwrap().to_string();

    let (status, body) = common::put_json(
        &app,
        &format!("/api/gallery/{}", id),
        &token,
        json!({ "mediaUrl": "https://cdn.example.com/bikes.jpg" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["media"]["url"], "https://cdn.example.com/bikes.jpg");
    assert!(!app.media_dir.path().join(file_name(&old_url)).exists());
}

#[tokio::test]
async fn external_media_is_never_touched_on_delete() {
    let app = common::test_app();
    let token = common::editor_token();

    let (_, body) = common::post_json(
        &app,
        "/api/gallery",
        &token,
        json!({
            "title": "Hosted",
            "type": "image",
            "category": "events",
            "mediaUrl": "https://cdn.example.com/hosted.jpg"
        }),
    )
    .await;
    let id = common::doc_id(&body);

    // Drop an unrelated file into the upload root; the cascade must not
    // reach it when the document's media is external
    let bystander = app.media_dir.path().join("bystander.jpg");
    std::fs::write(&bystander, b"keep").unwrap();

    let (status, _) = common::delete(&app, &format!("/api/gallery/{}", id), &token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(bystander.exists());
}

#[tokio::test]
async fn multipart_fields_decode_like_json_fields() {
    let app = common::test_app();
    let token = common::editor_token();

    let (status, body) = common::post_multipart(
        &app,
        "/api/gallery",
        &token,
        &[
            ("title", "Tagged"),
            ("type", "image"),
            ("category", "events"),
            ("mediaUrl", "https://cdn.example.com/t.jpg"),
            ("tags", "[\"open-day\", \"community\"]"),
            ("isFeatured", "true"),
            ("order", "2"),
        ],
        &[],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["tags"], json!(["open-day", "community"]));
    assert_eq!(body["data"]["isFeatured"], true);
    assert_eq!(body["data"]["order"], 2);
}
