//! Tests for the Bearer-gated admin surface.

use reqwest::multipart::Form;
use serde_json::{json, Value};

mod common;

use common::{TestApp, ADMIN_KEY};

async fn seed_contacts(app: &TestApp, count: usize) -> Vec<i64> {
    let mut ids = Vec::new();
    for i in 0..count {
        let mut payload = common::valid_contact();
        payload["email"] = json!(format!("person{i}@example.com"));
        let response = app
            .client
            .post(app.url("/api/contact"))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 201);
        let body: Value = response.json().await.unwrap();
        ids.push(body["data"]["id"].as_i64().unwrap());
    }
    ids
}

async fn seed_application(app: &TestApp) -> i64 {
    let form = Form::new()
        .text("fullName", "Jane O'Neil")
        .text("email", "jane@example.com")
        .text("phone", "+14155550100")
        .text("location", "Remote")
        .text("position", "software-engineer")
        .text("experience", "3-5")
        .text("qualification", "bachelors")
        .text("consent", "true");
    let response = app
        .client
        .post(app.url("/api/careers/apply"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn admin_routes_require_the_bearer_key() {
    let app = common::spawn_app().await;

    let response = app
        .client
        .get(app.url("/api/admin/contact"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = app
        .client
        .get(app.url("/api/admin/contact"))
        .bearer_auth("wrong-key")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn admin_surface_is_unmounted_without_a_key() {
    let app = common::spawn_app_with(|config| {
        config.admin.api_key.clear();
    })
    .await;

    let response = app
        .client
        .get(app.url("/api/admin/contact"))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn contact_list_paginates_newest_first() {
    let app = common::spawn_app().await;
    let ids = seed_contacts(&app, 3).await;

    let response = app
        .client
        .get(app.url("/api/admin/contact"))
        .query(&[("page", "1"), ("limit", "2")])
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let data = &body["data"];
    assert_eq!(data["total"], 3);
    assert_eq!(data["totalPages"], 2);
    assert_eq!(data["page"], 1);
    let items = data["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    // Default order is created_at descending.
    assert_eq!(items[0]["id"].as_i64(), Some(ids[2]));
    assert_eq!(items[1]["id"].as_i64(), Some(ids[1]));

    let response = app
        .client
        .get(app.url("/api/admin/contact"))
        .query(&[("page", "2"), ("limit", "2")])
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    let items = body["data"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"].as_i64(), Some(ids[0]));
}

#[tokio::test]
async fn out_of_range_pagination_is_rejected() {
    let app = common::spawn_app().await;

    for query in [[("page", "0"), ("limit", "20")], [("page", "1"), ("limit", "101")]] {
        let response = app
            .client
            .get(app.url("/api/admin/contact"))
            .query(&query)
            .bearer_auth(ADMIN_KEY)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }
}

#[tokio::test]
async fn contact_detail_roundtrips_and_misses_404() {
    let app = common::spawn_app().await;
    let ids = seed_contacts(&app, 1).await;

    let response = app
        .client
        .get(app.url(&format!("/api/admin/contact/{}", ids[0])))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["fullName"], "John Doe");
    assert_eq!(body["data"]["email"], "person0@example.com");

    let response = app
        .client
        .get(app.url("/api/admin/contact/9999"))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn status_update_moves_an_application_through_the_pipeline() {
    let app = common::spawn_app().await;
    let id = seed_application(&app).await;

    let response = app
        .client
        .patch(app.url(&format!("/api/admin/careers/{id}/status")))
        .bearer_auth(ADMIN_KEY)
        .json(&json!({"status": "reviewing", "notes": "strong portfolio"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["applicationStatus"], "reviewing");
    assert_eq!(body["data"]["adminNotes"], "strong portfolio");

    let rows = app.backend.careers.lock().unwrap();
    assert_eq!(rows[0]["application_status"], "reviewing");
    assert_eq!(rows[0]["admin_notes"], "strong portfolio");
}

#[tokio::test]
async fn unknown_status_value_is_a_field_error() {
    let app = common::spawn_app().await;
    let id = seed_application(&app).await;

    let response = app
        .client
        .patch(app.url(&format!("/api/admin/careers/{id}/status")))
        .bearer_auth(ADMIN_KEY)
        .json(&json!({"status": "on-hold"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["errors"][0]["field"], "status");
    assert_eq!(body["errors"][0]["offendingValue"], "on-hold");
}

#[tokio::test]
async fn status_update_on_missing_application_is_404() {
    let app = common::spawn_app().await;

    let response = app
        .client
        .patch(app.url("/api/admin/careers/9999/status"))
        .bearer_auth(ADMIN_KEY)
        .json(&json!({"status": "reviewing"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn stats_count_submissions_and_statuses() {
    let app = common::spawn_app().await;
    seed_contacts(&app, 2).await;
    let id = seed_application(&app).await;
    seed_application(&app).await;

    app.client
        .patch(app.url(&format!("/api/admin/careers/{id}/status")))
        .bearer_auth(ADMIN_KEY)
        .json(&json!({"status": "shortlisted"}))
        .send()
        .await
        .unwrap();

    let response = app
        .client
        .get(app.url("/api/admin/contact/stats"))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["lastSevenDays"], 2);

    let response = app
        .client
        .get(app.url("/api/admin/careers/stats"))
        .bearer_auth(ADMIN_KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["total"], 2);
    let by_status = body["data"]["byStatus"].as_array().unwrap();
    let count_of = |status: &str| {
        by_status
            .iter()
            .find(|entry| entry["status"] == status)
            .and_then(|entry| entry["count"].as_u64())
            .unwrap()
    };
    assert_eq!(count_of("pending"), 1);
    assert_eq!(count_of("shortlisted"), 1);
    assert_eq!(count_of("hired"), 0);
}
