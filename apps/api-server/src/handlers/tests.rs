use std::path::Path;
use std::sync::Arc;

use actix_web::cookie::Cookie;
use actix_web::http::{StatusCode, header};
use actix_web::{App, test, web};
use serde_json::{Value, json};
use uuid::Uuid;

use agora_infra::{Argon2PasswordService, InMemoryMailSender};

use super::{configure_routes, json_config, query_config};
use crate::config::{AppConfig, MediaConfig};
use crate::observability::RequestIdMiddleware;
use crate::state::{AppState, Repositories};

const PNG_BASE64: &str = "iVBORw0KGgo=";

fn test_state(media_root: &Path) -> (AppState, Arc<InMemoryMailSender>) {
    let config = AppConfig {
        media: MediaConfig {
            root: media_root.to_path_buf(),
            base_url: "/media".to_string(),
            max_upload_bytes: 1024,
        },
        ..AppConfig::default()
    };
    let mail = Arc::new(InMemoryMailSender::new());
    let passwords = Arc::new(Argon2PasswordService::with_params(8, 1, 1).unwrap());

    let state = AppState::from_parts(config, Repositories::in_memory(), passwords, mail.clone());
    (state, mail)
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .app_data(web::Data::new($state.clone()))
                .app_data(json_config($state.config.media.json_limit()))
                .app_data(query_config())
                .configure(configure_routes),
        )
        .await
    };
}

/// Register a user straight through the service layer and return a token.
async fn signed_up(state: &AppState, name: &str) -> (Uuid, String) {
    let user = state
        .accounts
        .register(name, &format!("{name}@example.com"), "password123")
        .await
        .unwrap();
    let token = state.tokens.generate_token(user.id, &user.username).unwrap();
    (user.id, token)
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

#[actix_rt::test]
async fn health_reports_store_and_echoes_request_id() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(dir.path());
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/health")
        .insert_header(("x-request-id", "abc-123"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("x-request-id").unwrap(), "abc-123");
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "in-memory");
    assert_eq!(body["request_id"], "abc-123");
}

#[actix_rt::test]
async fn register_login_and_me() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(dir.path());
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "password123"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(resp.headers().get(header::SET_COOKIE).is_some());
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["username"], "alice");
    assert!(body["user"].get("password_hash").is_none());

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "alice@example.com", "password": "password123" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let token = body["access_token"].as_str().unwrap().to_string();
    assert_eq!(body["token_type"], "Bearer");

    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["user"]["email"], "alice@example.com");

    // The session cookie works as well as the header.
    let req = test::TestRequest::get()
        .uri("/api/auth/me")
        .cookie(Cookie::new("token", token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "alice@example.com", "password": "wrong-password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn protected_routes_require_a_token() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(dir.path());
    let app = test_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/users/notifications")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Authentication Required");

    let req = test::TestRequest::get()
        .uri("/api/users/notifications")
        .insert_header(bearer("not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn follow_twice_conflicts_and_notifies_once() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(dir.path());
    let app = test_app!(state);
    let (_, alice) = signed_up(&state, "alice").await;
    let (bob_id, bob) = signed_up(&state, "bob").await;

    let follow = || {
        test::TestRequest::post()
            .uri(&format!("/api/users/follow/{bob_id}"))
            .insert_header(bearer(&alice))
            .to_request()
    };

    let body: Value = test::call_and_read_body_json(&app, follow()).await;
    assert_eq!(body["message"], "You are now following bob");

    let resp = test::call_service(&app, follow()).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let problem: Value = test::read_body_json(resp).await;
    assert_eq!(problem["status"], 409);

    let req = test::TestRequest::get()
        .uri("/api/users/notifications")
        .insert_header(bearer(&bob))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let notifications = body["notifications"].as_array().unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0]["type"], "follow");
    assert_eq!(notifications[0]["from"]["username"], "alice");

    let req = test::TestRequest::post()
        .uri(&format!("/api/users/unfollow/{bob_id}"))
        .insert_header(bearer(&alice))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn post_media_is_served_and_only_owner_can_delete() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(dir.path());
    let app = test_app!(state);
    let (_, owner) = signed_up(&state, "owner").await;
    let (_, other) = signed_up(&state, "other").await;

    let req = test::TestRequest::post()
        .uri("/api/posts/create")
        .insert_header(bearer(&owner))
        .set_json(json!({
            "text": "look",
            "media": { "content_type": "image/png", "data": PNG_BASE64 }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["post"]["media_type"], "image");
    let post_id = body["post"]["id"].as_str().unwrap().to_string();
    let media_url = body["post"]["media_url"].as_str().unwrap().to_string();

    let req = test::TestRequest::get().uri(&media_url).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
    assert_eq!(resp.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
    assert!(resp.headers().get(header::CONTENT_DISPOSITION).is_none());

    let delete = |token: &str| {
        test::TestRequest::delete()
            .uri(&format!("/api/posts/delete/{post_id}"))
            .insert_header(bearer(token))
            .to_request()
    };

    let resp = test::call_service(&app, delete(&other)).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let body: Value = test::call_and_read_body_json(&app, delete(&owner)).await;
    assert_eq!(body["message"], "Post deleted successfully");

    let req = test::TestRequest::get().uri(&media_url).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn create_post_rejects_empty_and_unsupported_media() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(dir.path());
    let app = test_app!(state);
    let (_, owner) = signed_up(&state, "owner").await;

    for body in [
        json!({}),
        json!({ "text": "doc", "media": { "content_type": "application/pdf", "data": "aGVsbG8=" } }),
        json!({ "media": { "content_type": "image/png", "data": "%%%" } }),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/posts/create")
            .insert_header(bearer(&owner))
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

#[actix_rt::test]
async fn like_toggles_and_comment_validates() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(dir.path());
    let app = test_app!(state);
    let (_, owner) = signed_up(&state, "owner").await;
    let (_, fan) = signed_up(&state, "fan").await;

    let req = test::TestRequest::post()
        .uri("/api/posts/create")
        .insert_header(bearer(&owner))
        .set_json(json!({ "text": "hello" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let post_id = body["post"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["post"]["media_type"], "none");

    let like = || {
        test::TestRequest::post()
            .uri(&format!("/api/posts/like/{post_id}"))
            .insert_header(bearer(&fan))
            .to_request()
    };
    let body: Value = test::call_and_read_body_json(&app, like()).await;
    assert_eq!(body["message"], "Post liked successfully");
    let body: Value = test::call_and_read_body_json(&app, like()).await;
    assert_eq!(body["message"], "Post unliked successfully");

    let comment = |text: &str| {
        test::TestRequest::post()
            .uri(&format!("/api/posts/comment/{post_id}"))
            .insert_header(bearer(&fan))
            .set_json(json!({ "text": text }))
            .to_request()
    };
    let resp = test::call_service(&app, comment("")).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::call_and_read_body_json(&app, comment("great")).await;
    assert_eq!(body["comment"]["text"], "great");
    assert_eq!(body["comment"]["user"]["username"], "fan");

    let req = test::TestRequest::get()
        .uri("/api/posts/all?filter=all")
        .insert_header(bearer(&fan))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["posts"][0]["comments"][0]["text"], "great");
    assert_eq!(body["posts"][0]["likes"].as_array().unwrap().len(), 0);
}

#[actix_rt::test]
async fn bad_payloads_are_problem_details() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(dir.path());
    let app = test_app!(state);
    let (_, token) = signed_up(&state, "alice").await;

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["title"], "Bad Request");

    let req = test::TestRequest::get()
        .uri("/api/posts/all?filter=everything")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn forgot_and_reset_password_over_http() {
    let dir = tempfile::tempdir().unwrap();
    let (state, mail) = test_state(dir.path());
    let app = test_app!(state);
    let (alice_id, _) = signed_up(&state, "alice").await;

    let req = test::TestRequest::post()
        .uri("/api/auth/forgot-password")
        .set_json(json!({ "email": "alice@example.com" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(mail.sent().await.len(), 1);

    let token = state
        .accounts
        .profile(alice_id)
        .await
        .unwrap()
        .reset_token
        .unwrap()
        .token;

    let req = test::TestRequest::post()
        .uri(&format!("/api/auth/reset-password/{token}"))
        .set_json(json!({ "password": "fresh-password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({ "email": "alice@example.com", "password": "fresh-password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_rt::test]
async fn svg_uploads_are_refused() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(dir.path());
    let app = test_app!(state);
    let (_, owner) = signed_up(&state, "owner").await;

    // <svg><script>alert(1)</script></svg>
    let svg = "PHN2Zz48c2NyaXB0PmFsZXJ0KDEpPC9zY3JpcHQ+PC9zdmc+";
    let req = test::TestRequest::post()
        .uri("/api/posts/create")
        .insert_header(bearer(&owner))
        .set_json(json!({
            "text": "vector",
            "media": { "content_type": "image/svg+xml", "data": svg }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[actix_rt::test]
async fn stored_files_are_served_without_active_content() {
    let dir = tempfile::tempdir().unwrap();
    let (state, _) = test_state(dir.path());
    let app = test_app!(state);
    std::fs::write(
        dir.path().join("legacy.svg"),
        "<svg><script>alert(1)</script></svg>",
    )
    .unwrap();

    let req = test::TestRequest::get().uri("/media/legacy.svg").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let headers = resp.headers();
    assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
    assert_eq!(
        headers.get(header::CONTENT_SECURITY_POLICY).unwrap(),
        "default-src 'none'; sandbox"
    );
    assert_eq!(headers.get(header::CONTENT_DISPOSITION).unwrap(), "attachment");
}
