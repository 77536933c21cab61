//! Shared helpers for the HTTP integration tests.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{self, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use agora_server::auth::hash_password;
use agora_server::media_store::MediaStore;
use agora_server::{build_router, AppState, ServerConfig};
use agora_store::{Database, NewUser};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _media_dir: TempDir,
}

pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password: String,
    pub token: String,
}

pub fn test_config(media_dir: &TempDir) -> ServerConfig {
    ServerConfig {
        media_root: media_dir.path().to_path_buf(),
        jwt_secret: "integration-secret".to_string(),
        rate_limit_burst: 10_000.0,
        rate_limit_per_sec: 10_000.0,
        ..Default::default()
    }
}

pub async fn create_test_app() -> TestApp {
    let media_dir = TempDir::new().unwrap();
    create_test_app_with(|config| config, media_dir).await
}

pub async fn create_test_app_with(
    customize: impl FnOnce(ServerConfig) -> ServerConfig,
    media_dir: TempDir,
) -> TestApp {
    let config = customize(test_config(&media_dir));
    let db = Database::open_in_memory().unwrap();
    let media = MediaStore::new(
        config.media_root.clone(),
        config.media_url.clone(),
        config.max_upload_size,
    )
    .await
    .unwrap();
    let state = AppState::new(db, media, config);
    TestApp {
        router: build_router(state.clone()),
        state,
        _media_dir: media_dir,
    }
}

impl TestApp {
    /// Send a JSON request and return the status with the decoded body
    /// (`Value::Null` for an empty body).
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        self.request_from(method, uri, token, body, None).await
    }

    pub async fn request_from(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
        forwarded_for: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(ip) = forwarded_for {
            builder = builder.header("x-forwarded-for", ip);
        }
        let request = match body {
            Some(body) => builder
                .header(http::header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    /// Register through the API and log in.
    pub async fn register(&self, username: &str) -> TestUser {
        let email = format!("{username}@example.com");
        let password = "password123".to_string();
        let (status, body) = self
            .request(
                Method::POST,
                "/api/v1/account/register/",
                None,
                Some(json!({
                    "username": username,
                    "email": email,
                    "first_name": username,
                    "last_name": "tester",
                    "password": password,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
        let id: Uuid = body["id"].as_str().unwrap().parse().unwrap();
        let token = self.login(&email, &password).await;
        TestUser {
            id,
            username: username.to_string(),
            email,
            password,
            token,
        }
    }

    /// Insert a superuser directly and log in.
    pub async fn superuser(&self, username: &str) -> TestUser {
        let email = format!("{username}@example.com");
        let password = "password123".to_string();
        let user = {
            let db = self.state.db().unwrap();
            db.create_user(&NewUser {
                username: username.to_string(),
                email: email.clone(),
                first_name: username.to_string(),
                last_name: "admin".to_string(),
                password_hash: hash_password(&password).unwrap(),
                is_superuser: true,
            })
            .unwrap()
        };
        let token = self.login(&email, &password).await;
        TestUser {
            id: user.id,
            username: username.to_string(),
            email,
            password,
            token,
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/v1/account/token/",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["access"].as_str().unwrap().to_string()
    }

    /// Create a post as `author` and return its `(pkid, id)`.
    pub async fn create_post(&self, author: &TestUser, title: &str) -> (i64, Uuid) {
        let (status, body) = self
            .post(
                "/api/v1/posts/",
                &author.token,
                json!({
                    "title": title,
                    "body": "B",
                    "image": "/media/cover.png",
                    "tags": ["rust"],
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create post failed: {body}");

        let db = self.state.db().unwrap();
        let (posts, _) = db
            .list_posts(
                &agora_store::PostFilter {
                    author: Some(author.username.clone()),
                    title: Some(title.to_string()),
                    ..Default::default()
                },
                1,
                0,
            )
            .unwrap();
        (posts[0].pkid, posts[0].id)
    }
}
