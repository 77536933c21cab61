mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::create_test_app;

#[tokio::test]
async fn test_health() {
    let app = create_test_app().await;
    let (status, body) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_post_returns_confirmation() {
    let app = create_test_app().await;
    let alice = app.register("alice").await;

    let (status, body) = app
        .post(
            "/api/v1/posts/",
            &alice.token,
            json!({"title": "T", "body": "B", "post_image": "/media/a.png", "tags": ["Rust", "rust"]}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Post has been created!");

    let (status, list) = app.get("/api/v1/posts/", &alice.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["count"], 1);
    assert_eq!(list["results"][0]["author"], "alice");
    assert_eq!(list["results"][0]["tags"], json!(["rust"]));
    assert_eq!(list["results"][0]["views"], 0);
}

#[tokio::test]
async fn test_create_post_validation_envelope() {
    let app = create_test_app().await;
    let alice = app.register("alice").await;

    let (status, body) = app
        .post("/api/v1/posts/", &alice.token, json!({"title": "", "body": "B", "image": "x"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status_code"], 400);
    assert_eq!(body["code"], "validation_error");
    assert!(body["errors"]["title"].is_array());
}

#[tokio::test]
async fn test_malformed_json_uses_envelope() {
    let app = create_test_app().await;
    let alice = app.register("alice").await;

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/v1/posts/")
        .header("authorization", format!("Bearer {}", alice.token))
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn test_posts_require_authentication() {
    let app = create_test_app().await;
    let (status, body) = app.request(Method::GET, "/api/v1/posts/", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "not_authenticated");

    let (status, body) = app.get("/api/v1/posts/", "not-a-token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "token_not_valid");
}

#[tokio::test]
async fn test_view_counted_once_per_ip() {
    let app = create_test_app().await;
    let alice = app.register("alice").await;
    let (pkid, id) = app.create_post(&alice, "T").await;
    let by_pkid = format!("/api/v1/posts/{pkid}/");
    let by_id = format!("/api/v1/posts/{id}/");

    let view = |uri: String, ip: &'static str| {
        let app = &app;
        let token = alice.token.clone();
        async move {
            let (status, body) = app
                .request_from(Method::GET, &uri, Some(&token), None, Some(ip))
                .await;
            assert_eq!(status, StatusCode::OK);
            body["views"].as_i64().unwrap()
        }
    };

    assert_eq!(view(by_pkid.clone(), "203.0.113.1").await, 1);
    assert_eq!(view(by_pkid.clone(), "203.0.113.1").await, 1);
    assert_eq!(view(by_id.clone(), "203.0.113.1, 10.0.0.1").await, 1);
    assert_eq!(view(by_id, "203.0.113.2").await, 2);
}

#[tokio::test]
async fn test_retrieve_missing_post() {
    let app = create_test_app().await;
    let alice = app.register("alice").await;

    let (status, body) = app.get("/api/v1/posts/9999/", &alice.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "That Post does not exist in our catalog");

    let (status, _) = app.get("/api/v1/posts/not-an-id/", &alice.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_and_delete_are_author_only() {
    let app = create_test_app().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let (pkid, _) = app.create_post(&alice, "T").await;
    let uri = format!("/api/v1/posts/{pkid}/");

    let (status, body) = app
        .request(Method::PATCH, &uri, Some(&bob.token), Some(json!({"title": "Hijacked"})))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "permission_denied");

    let (status, _) = app.request(Method::DELETE, &uri, Some(&bob.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .request(Method::PUT, &uri, Some(&alice.token), Some(json!({"title": "Renamed"})))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, serde_json::Value::Null);

    let (_, post) = app.get(&uri, &alice.token).await;
    assert_eq!(post["title"], "Renamed");
    assert_eq!(post["body"], "B");

    let (status, _) = app.request(Method::DELETE, &uri, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.request(Method::DELETE, &uri, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "That Post does not exist in our catalog");
}

#[tokio::test]
async fn test_superuser_may_delete_and_post_for_others() {
    let app = create_test_app().await;
    let alice = app.register("alice").await;
    let admin = app.superuser("admin").await;
    let (pkid, _) = app.create_post(&alice, "T").await;

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/v1/posts/{pkid}/"), Some(&admin.token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .post(
            "/api/v1/posts/",
            &admin.token,
            json!({"author": alice.id, "title": "Ghost", "body": "B", "image": "x"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post(
            "/api/v1/posts/",
            &alice.token,
            json!({"author": admin.id, "title": "Nope", "body": "B", "image": "x"}),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_list_filters_ordering_and_pagination() {
    let app = create_test_app().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    app.create_post(&alice, "Alpha").await;
    app.create_post(&alice, "Beta").await;
    app.create_post(&bob, "Gamma").await;

    let (_, page) = app.get("/api/v1/posts/?page_size=2", &alice.token).await;
    assert_eq!(page["count"], 3);
    assert_eq!(page["next"], 2);
    assert_eq!(page["previous"], serde_json::Value::Null);
    assert_eq!(page["results"][0]["title"], "Gamma");

    let (_, page) = app.get("/api/v1/posts/?author=alice&ordering=title", &alice.token).await;
    assert_eq!(page["count"], 2);
    assert_eq!(page["results"][0]["title"], "Alpha");

    let (_, page) = app.get("/api/v1/posts/?title=amm", &alice.token).await;
    assert_eq!(page["count"], 1);

    let (status, _) = app.get("/api/v1/posts/?ordering=bogus", &alice.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_of_missing_post_ignores_invalid_body() {
    let app = create_test_app().await;
    let alice = app.register("alice").await;
    let bob = app.register("bob").await;
    let (pkid, _) = app.create_post(&alice, "T").await;
    let blank = json!({"title": ""});

    let (status, body) = app
        .request(Method::PATCH, "/api/v1/posts/9999/", Some(&alice.token), Some(blank.clone()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "That Post does not exist in our catalog");

    let uri = format!("/api/v1/posts/{pkid}/");
    let (status, _) = app
        .request(Method::PATCH, &uri, Some(&bob.token), Some(blank.clone()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.request(Method::PATCH, &uri, Some(&alice.token), Some(blank)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["title"].is_array());
}
