//! HTTP tests for the /v1/chat streaming endpoint, with a wiremock upstream.

use actix_web::cookie::Cookie;
use actix_web::{test, web, App};
use chat_core::session::sign_user_id;
use chat_core::Config;
use web_service::server::{app_config, AppState};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET: &str = "test-secret";

fn test_config(data_dir: &std::path::Path, upstream: &str) -> Config {
    let mut config = Config::default();
    config.session_secret = SECRET.to_string();
    config.data_dir = data_dir.to_string_lossy().into_owned();
    config.search.api_base = upstream.to_string();
    config
}

fn session_cookie(user_id: &str) -> Cookie<'static> {
    Cookie::new(
        "session",
        format!("{user_id}.{}", sign_user_id(user_id, SECRET)),
    )
}

fn ndjson_lines(body: &[u8]) -> Vec<serde_json::Value> {
    std::str::from_utf8(body)
        .unwrap()
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

async fn mount_happy_upstream(server: &MockServer) {
    let body = concat!(
        r#"{"choices":[{"delta":{"content":"Hel"}}]}"#,
        "\n",
        r#"{"citations":[{"url":"https://example.com"}]}"#,
        "\n",
        r#"{"choices":[{"delta":{"content":"lo"}}]}"#,
        "\n",
        r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#,
        "\n",
    );
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/x-ndjson"))
        .mount(server)
        .await;
}

#[actix_web::test]
async fn test_chat_streams_snapshots_and_persists_thread() {
    let upstream = MockServer::start().await;
    mount_happy_upstream(&upstream).await;
    let dir = tempfile::tempdir().unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(
                AppState::new(test_config(dir.path(), &upstream.uri())).unwrap(),
            ))
            .configure(app_config),
    )
    .await;
    let cookie = session_cookie("u1");

    let req = test::TestRequest::post()
        .uri("/v1/chat")
        .cookie(cookie.clone())
        .set_json(serde_json::json!({ "query": "hello there", "model": "sonar" }))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    let lines = ndjson_lines(&body);

    // Incremental snapshots, then the done marker with the new thread id.
    assert!(lines
        .iter()
        .any(|l| l["message"]["content"] == "Hel"));
    let done = lines.last().unwrap();
    assert_eq!(done["done"], true);
    let thread_id = done["threadId"].as_str().unwrap().to_string();

    // The completed snapshot carries the full content and the citation.
    let completed = lines
        .iter()
        .filter(|l| l["message"]["completed"] == true)
        .last()
        .unwrap();
    assert_eq!(completed["message"]["content"], "Hello");
    assert_eq!(completed["message"]["citations"][0]["url"], "https://example.com");

    // Thread persisted with both the user and assistant messages.
    let req = test::TestRequest::get()
        .uri(&format!("/v1/threads/{thread_id}"))
        .cookie(cookie)
        .to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    let messages = body["thread"]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[1]["content"], "Hello");
    // Title derived from the first user message.
    assert_eq!(body["thread"]["title"], "hello there");
}

#[actix_web::test]
async fn test_chat_upstream_auth_failure_reported_in_stream() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&upstream)
        .await;
    let dir = tempfile::tempdir().unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(
                AppState::new(test_config(dir.path(), &upstream.uri())).unwrap(),
            ))
            .configure(app_config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/v1/chat")
        .cookie(session_cookie("u1"))
        .set_json(serde_json::json!({ "query": "q", "model": "sonar" }))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    let lines = ndjson_lines(&body);

    let error = lines.last().unwrap();
    assert_eq!(error["error"]["authRequired"], true);
}

#[actix_web::test]
async fn test_chat_unknown_thread_is_404() {
    let upstream = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(
                AppState::new(test_config(dir.path(), &upstream.uri())).unwrap(),
            ))
            .configure(app_config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/v1/chat")
        .cookie(session_cookie("u1"))
        .set_json(serde_json::json!({
            "threadId": "missing",
            "query": "q",
            "model": "sonar"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_chat_requires_session_cookie() {
    let upstream = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(
                AppState::new(test_config(dir.path(), &upstream.uri())).unwrap(),
            ))
            .configure(app_config),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/v1/chat")
        .set_json(serde_json::json!({ "query": "q", "model": "sonar" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}
