//! HTTP tests for the /v1/threads surface.

use actix_web::cookie::Cookie;
use actix_web::{test, web, App};
use chat_core::session::sign_user_id;
use chat_core::Config;
use web_service::server::{app_config, AppState};

const SECRET: &str = "test-secret";

fn test_config(data_dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.session_secret = SECRET.to_string();
    config.data_dir = data_dir.to_string_lossy().into_owned();
    config
}

fn session_cookie(user_id: &str) -> Cookie<'static> {
    Cookie::new(
        "session",
        format!("{user_id}.{}", sign_user_id(user_id, SECRET)),
    )
}

macro_rules! test_app {
    ($config:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::new($config).unwrap()))
                .configure(app_config),
        )
        .await
    };
}

#[actix_web::test]
async fn test_missing_cookie_is_auth_required() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(test_config(dir.path()));

    let req = test::TestRequest::get().uri("/v1/threads").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["authRequired"], true);
}

#[actix_web::test]
async fn test_invalid_signature_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(test_config(dir.path()));

    let req = test::TestRequest::get()
        .uri("/v1/threads")
        .cookie(Cookie::new("session", "u1.deadbeef"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_thread_crud_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(test_config(dir.path()));
    let cookie = session_cookie("u1");

    // Create
    let req = test::TestRequest::post()
        .uri("/v1/threads")
        .cookie(cookie.clone())
        .set_json(serde_json::json!({
            "title": "Rust questions",
            "messages": [],
            "model": "sonar"
        }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["success"], true);
    let thread_id = body["thread"]["id"].as_str().unwrap().to_string();

    // Get
    let req = test::TestRequest::get()
        .uri(&format!("/v1/threads/{thread_id}"))
        .cookie(cookie.clone())
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["thread"]["title"], "Rust questions");

    // List
    let req = test::TestRequest::get()
        .uri("/v1/threads")
        .cookie(cookie.clone())
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["threads"].as_array().unwrap().len(), 1);

    // Update
    let req = test::TestRequest::put()
        .uri(&format!("/v1/threads/{thread_id}"))
        .cookie(cookie.clone())
        .set_json(serde_json::json!({ "title": "Renamed" }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["thread"]["title"], "Renamed");

    // Delete
    let req = test::TestRequest::delete()
        .uri(&format!("/v1/threads/{thread_id}"))
        .cookie(cookie.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    // Gone
    let req = test::TestRequest::get()
        .uri(&format!("/v1/threads/{thread_id}"))
        .cookie(cookie)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_threads_are_scoped_to_cookie_user() {
    let dir = tempfile::tempdir().unwrap();
    let app = test_app!(test_config(dir.path()));

    let req = test::TestRequest::post()
        .uri("/v1/threads")
        .cookie(session_cookie("u1"))
        .set_json(serde_json::json!({ "title": "mine", "model": "sonar" }))
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let thread_id = body["thread"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri(&format!("/v1/threads/{thread_id}"))
        .cookie(session_cookie("u2"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}
