//! HTTP-level tests for direct annotation creation and retrieval.
//!
//! Images are created through the repository layer to keep the tests
//! focused on annotation behaviour.

mod common;

use annotator_db::models::image::CreateImage;
use annotator_db::repositories::ImageRepo;
use axum::http::StatusCode;
use common::{body_json, build_test_app, count, get, post_json};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

async fn seed_image(pool: &PgPool, file: &str) {
    ImageRepo::create(
        pool,
        &CreateImage {
            file: file.to_string(),
            format: "PNG".to_string(),
            size_bytes: 64,
            width: Some(4),
            height: Some(3),
        },
    )
    .await
    .unwrap();
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_annotation_with_labels(pool: PgPool) {
    seed_image(&pool, "road.png").await;
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(pool.clone(), dir.path());

    let response = post_json(
        app.clone(),
        "/api/v1/annotations",
        json!({
            "image_id": "road.png",
            "labels": [
                { "class_id": "lane", "surface": ["0,0", "1,1"], "meta": { "by": "qa" } },
                { "class_id": "sign", "surface": ["5,5"] },
            ]
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert!(created.get("image_id").is_none());
    assert_eq!(created["labels"].as_array().unwrap().len(), 2);
    assert_eq!(created["labels"][0]["meta"], json!({ "by": "qa" }));
    assert!(created["labels"][0].get("annotation_id").is_none());

    let id = created["id"].as_i64().unwrap();
    let fetched = body_json(get(app, &format!("/api/v1/annotations/{id}")).await).await;
    assert_eq!(fetched, created);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_annotation_without_labels(pool: PgPool) {
    seed_image(&pool, "empty.png").await;
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(pool.clone(), dir.path());

    let response = post_json(app, "/api/v1/annotations", json!({ "image_id": "empty.png" })).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["labels"], json!([]));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn image_id_is_required_and_must_exist(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(pool.clone(), dir.path());

    let response = post_json(app.clone(), "/api/v1/annotations", json!({ "labels": [] })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["fields"]["image_id"],
        json!(["This field is required."])
    );

    let response = post_json(
        app,
        "/api/v1/annotations",
        json!({ "image_id": "ghost.png" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["fields"]["image_id"].is_array());
    assert_eq!(count(&pool, "annotations").await, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn an_image_has_at_most_one_annotation(pool: PgPool) {
    seed_image(&pool, "once.png").await;
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(pool.clone(), dir.path());

    let body = json!({ "image_id": "once.png" });
    let first = post_json(app.clone(), "/api/v1/annotations", body.clone()).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = post_json(app, "/api/v1/annotations", body).await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(second).await["fields"]["image_id"],
        json!(["Image already has an annotation."])
    );
    assert_eq!(count(&pool, "annotations").await, 1);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn a_failing_label_rolls_back_the_annotation(pool: PgPool) {
    seed_image(&pool, "atomic.png").await;
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(pool.clone(), dir.path());
    let id = Uuid::new_v4();

    let response = post_json(
        app,
        "/api/v1/annotations",
        json!({
            "image_id": "atomic.png",
            "labels": [
                { "id": id, "class_id": "a", "surface": [] },
                { "class_id": "b", "surface": [] },
                { "id": id, "class_id": "c", "surface": [] },
            ]
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let fields = body_json(response).await["fields"].clone();
    assert!(fields.get("labels[2].id").is_some());
    assert_eq!(count(&pool, "annotations").await, 0);
    assert_eq!(count(&pool, "labels").await, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn get_annotation_supports_export(pool: PgPool) {
    seed_image(&pool, "export.png").await;
    let dir = tempfile::tempdir().unwrap();
    let app = build_test_app(pool.clone(), dir.path());

    let created = body_json(
        post_json(
            app.clone(),
            "/api/v1/annotations",
            json!({
                "image_id": "export.png",
                "labels": [{ "class_id": "k", "surface": ["A", "B", "C"], "shape": { "r": 1 } }]
            }),
        )
        .await,
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let export = body_json(get(app, &format!("/api/v1/annotations/{id}?format=export")).await).await;
    let label = &export["labels"][0];
    assert_eq!(label["surface"], "ABC");
    assert!(label.get("shape").is_none());
    assert!(label.get("meta").is_none());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_annotation_returns_404(pool: PgPool) {
    let dir = tempfile::tempdir().unwrap();
    let response = get(build_test_app(pool, dir.path()), "/api/v1/annotations/999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
