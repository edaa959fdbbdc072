//! Integration tests for the gateway API endpoints.

use super::*;
use crate::backend::testing::ScriptedBackend;
use crate::backend::UpstreamCompletion;
use crate::directory::ProviderDirectory;
use axum::http::{header, HeaderName, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};

const CLIENT_KEY: &str = "sk-test-client";
const ADMIN_KEY: &str = "admin-secret";

fn test_state(backend: Arc<ScriptedBackend>) -> AppState {
    let keys = ApiKeyStore::in_memory().unwrap();
    keys.insert(CLIENT_KEY, Some("tests")).unwrap();

    let router = FallbackRouter::new(Arc::new(ProviderDirectory::builtin()), backend);
    AppState::new(router, keys).with_admin_key(Some(ADMIN_KEY.to_string()))
}

fn server_with(state: AppState) -> TestServer {
    TestServer::new(create_router_with_state(state)).unwrap()
}

fn api_key_header() -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-api-key"),
        HeaderValue::from_static(CLIENT_KEY),
    )
}

fn admin_header(value: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("x-admin-key"),
        HeaderValue::from_str(value).unwrap(),
    )
}

fn hello() -> Value {
    json!({"messages": [{"role": "user", "content": "Hello"}]})
}

// =========================================================================
// Public endpoints
// =========================================================================

#[tokio::test]
async fn health_needs_no_key() {
    let server = server_with(test_state(Arc::new(ScriptedBackend::default())));

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "freegate");
}

#[tokio::test]
async fn root_lists_endpoints() {
    let server = server_with(test_state(Arc::new(ScriptedBackend::default())));

    let response = server.get("/").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["endpoints"]["chat"], "/v1/chat/completions");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn unknown_route_returns_json_404() {
    let server = server_with(test_state(Arc::new(ScriptedBackend::default())));

    let response = server.get("/v2/nothing").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["type"], "not_found");
}

// =========================================================================
// Client authentication
// =========================================================================

#[tokio::test]
async fn chat_without_key_is_unauthorized() {
    let backend = Arc::new(ScriptedBackend::default().reply("auto", "hi"));
    let server = server_with(test_state(backend.clone()));

    let response = server.post("/v1/chat/completions").json(&hello()).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["type"], "authentication_error");
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn chat_with_unknown_key_is_forbidden() {
    let backend = Arc::new(ScriptedBackend::default().reply("auto", "hi"));
    let server = server_with(test_state(backend.clone()));

    let response = server
        .post("/v1/chat/completions")
        .add_header(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_static("sk-nope"),
        )
        .json(&hello())
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(response.json::<Value>()["type"], "permission_error");
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn bearer_token_is_accepted() {
    let backend = Arc::new(ScriptedBackend::default().reply("auto", "hi"));
    let server = server_with(test_state(backend));

    let response = server
        .post("/v1/chat/completions")
        .add_header(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", CLIENT_KEY)).unwrap(),
        )
        .json(&hello())
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["content"], "hi");
}

#[tokio::test]
async fn listing_endpoints_require_a_key() {
    let server = server_with(test_state(Arc::new(ScriptedBackend::default())));

    for path in ["/v1/models", "/v1/providers", "/v1/test"] {
        let response = server.get(path).await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}

// =========================================================================
// Chat completions
// =========================================================================

#[tokio::test]
async fn chat_returns_envelope_by_default() {
    let backend = Arc::new(ScriptedBackend::default().reply("auto", "Hello there"));
    let server = server_with(test_state(backend.clone()));
    let (name, value) = api_key_header();

    let response = server
        .post("/v1/chat/completions")
        .add_header(name, value)
        .json(&json!({
            "model": "gpt-4o",
            "messages": [
                {"role": "system", "content": "Be brief."},
                {"role": "user", "content": "Hello"}
            ]
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    pretty_assertions::assert_eq!(
        body,
        json!({
            "success": true,
            "data": {
                "content": "Hello there",
                "model": "gpt-4o",
                "finish_reason": "stop",
                "messages_count": 2,
                "provider": "auto"
            }
        })
    );
    assert_eq!(backend.calls(), vec!["auto"]);
}

#[tokio::test]
async fn chat_defaults_to_gpt_4() {
    let backend = Arc::new(ScriptedBackend::default().reply("auto", "hi"));
    let server = server_with(test_state(backend));
    let (name, value) = api_key_header();

    let response = server
        .post("/v1/chat/completions")
        .add_header(name, value)
        .json(&hello())
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["model"], "gpt-4");
}

#[tokio::test]
async fn chat_reports_fallback_provider() {
    let backend = Arc::new(
        ScriptedBackend::default()
            .fail("auto", "request timed out")
            .reply("Airforce", "hi"),
    );
    let server = server_with(test_state(backend.clone()));
    let (name, value) = api_key_header();

    let response = server
        .post("/v1/chat/completions")
        .add_header(name, value)
        .json(&json!({"model": "gpt-4", "messages": [{"role": "user", "content": "Hello"}]}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["content"], "hi");
    assert_eq!(body["data"]["provider"], "Airforce");
    assert_eq!(backend.calls(), vec!["auto", "Airforce"]);
}

#[tokio::test]
async fn exhaustion_is_a_500_with_last_error() {
    let backend = Arc::new(ScriptedBackend::default().fail("Airforce", "connection refused"));
    let server = server_with(test_state(backend.clone()));
    let (name, value) = api_key_header();

    let response = server
        .post("/v1/chat/completions")
        .add_header(name, value)
        .json(&hello())
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["type"], "providers_exhausted");
    assert_eq!(
        body["error"],
        "All providers for model gpt-4 failed after 2 attempt(s). Last error: connection refused"
    );
    assert_eq!(backend.calls(), vec!["auto", "Airforce"]);
}

#[tokio::test]
async fn malformed_upstream_answer_is_a_500() {
    let backend = Arc::new(ScriptedBackend::default().raw("auto", UpstreamCompletion::default()));
    let server = server_with(test_state(backend.clone()));
    let (name, value) = api_key_header();

    let response = server
        .post("/v1/chat/completions")
        .add_header(name, value)
        .json(&hello())
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>()["type"], "upstream_error");
    assert_eq!(backend.calls(), vec!["auto"]);
}

#[tokio::test]
async fn empty_messages_are_a_400() {
    let backend = Arc::new(ScriptedBackend::default().reply("auto", "hi"));
    let server = server_with(test_state(backend.clone()));
    let (name, value) = api_key_header();

    let response = server
        .post("/v1/chat/completions")
        .add_header(name, value)
        .json(&json!({"messages": []}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["type"], "invalid_request");
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn unknown_role_is_a_400() {
    let backend = Arc::new(ScriptedBackend::default().reply("auto", "hi"));
    let server = server_with(test_state(backend.clone()));
    let (name, value) = api_key_header();

    let response = server
        .post("/v1/chat/completions")
        .add_header(name, value)
        .json(&json!({"messages": [{"role": "narrator", "content": "Once"}]}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("narrator"));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn malformed_json_is_a_400() {
    let backend = Arc::new(ScriptedBackend::default().reply("auto", "hi"));
    let server = server_with(test_state(backend.clone()));
    let (name, value) = api_key_header();

    let response = server
        .post("/v1/chat/completions")
        .add_header(name, value)
        .text("{not json")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(response.json::<Value>()["type"], "invalid_request");
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn stream_flag_is_forwarded_but_answer_is_one_body() {
    let backend = Arc::new(ScriptedBackend::default().reply("auto", "streamed"));
    let server = server_with(test_state(backend.clone()));
    let (name, value) = api_key_header();

    let response = server
        .post("/v1/chat/completions")
        .add_header(name, value)
        .json(&json!({"stream": true, "messages": [{"role": "user", "content": "Hi"}]}))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["content"], "streamed");
    assert_eq!(backend.calls_with_stream(), vec![("auto".to_string(), true)]);
}

#[tokio::test]
async fn openai_format_returns_chat_completion_object() {
    let backend = Arc::new(ScriptedBackend::default().reply("auto", "Hello!"));
    let state = test_state(backend).with_response_format(ResponseFormat::Openai);
    let server = server_with(state);
    let (name, value) = api_key_header();

    let response = server
        .post("/v1/chat/completions")
        .add_header(name, value)
        .json(&hello())
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["id"].as_str().unwrap().starts_with("chatcmpl-"));
    assert_eq!(body["object"], "chat.completion");
    assert_eq!(body["model"], "gpt-4");
    assert_eq!(body["choices"][0]["index"], 0);
    assert_eq!(body["choices"][0]["message"]["role"], "assistant");
    assert_eq!(body["choices"][0]["message"]["content"], "Hello!");
    assert_eq!(body["choices"][0]["finish_reason"], "stop");
}

#[tokio::test]
async fn requests_are_counted_against_the_key() {
    let backend = Arc::new(ScriptedBackend::default().reply("auto", "hi"));
    let state = test_state(backend);
    let server = server_with(state);
    let (name, value) = api_key_header();

    for _ in 0..2 {
        server
            .post("/v1/chat/completions")
            .add_header(name.clone(), value.clone())
            .json(&hello())
            .await
            .assert_status_ok();
    }

    let (name, value) = admin_header(ADMIN_KEY);
    let response = server.get("/v1/admin/api_keys").add_header(name, value).await;
    let body: Value = response.json();
    assert_eq!(body["data"]["api_keys"][0]["used_requests"], 2);
}

// =========================================================================
// Catalog endpoints
// =========================================================================

#[tokio::test]
async fn models_envelope_lists_catalog() {
    let server = server_with(test_state(Arc::new(ScriptedBackend::default())));
    let (name, value) = api_key_header();

    let response = server.get("/v1/models").add_header(name, value).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["default_model"], "gpt-4");
    assert_eq!(body["data"]["total"], 11);
    assert_eq!(body["data"]["models"].as_array().unwrap().len(), 11);
}

#[tokio::test]
async fn models_openai_format_is_a_list() {
    let state = test_state(Arc::new(ScriptedBackend::default()))
        .with_response_format(ResponseFormat::Openai);
    let server = server_with(state);
    let (name, value) = api_key_header();

    let response = server.get("/v1/models").add_header(name, value).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["object"], "list");
    assert_eq!(body["data"][0]["id"], "gpt-4");
    assert_eq!(body["data"][0]["object"], "model");
}

#[tokio::test]
async fn providers_are_listed() {
    let server = server_with(test_state(Arc::new(ScriptedBackend::default())));
    let (name, value) = api_key_header();

    let response = server.get("/v1/providers").add_header(name, value).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"].as_array().unwrap().len(), 4);
    assert_eq!(body["data"][0]["name"], "api.airforce");
}

#[tokio::test]
async fn smoke_test_routes_default_model() {
    let backend = Arc::new(ScriptedBackend::default().reply("auto", "Hello, World!"));
    let server = server_with(test_state(backend.clone()));
    let (name, value) = api_key_header();

    let response = server.get("/v1/test").add_header(name, value).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["message"], "Hello, World!");
    assert_eq!(body["data"]["model"], "gpt-4");
    assert_eq!(body["data"]["status"], "working");
    assert_eq!(body["data"]["provider"], "auto");
    assert_eq!(backend.calls(), vec!["auto"]);
}

// =========================================================================
// Admin endpoints
// =========================================================================

#[tokio::test]
async fn admin_without_key_is_unauthorized() {
    let server = server_with(test_state(Arc::new(ScriptedBackend::default())));

    let response = server.get("/v1/admin/api_keys").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_with_wrong_key_is_forbidden() {
    let server = server_with(test_state(Arc::new(ScriptedBackend::default())));
    let (name, value) = admin_header("guess");

    let response = server.get("/v1/admin/api_keys").add_header(name, value).await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_is_closed_when_no_admin_key_configured() {
    let state = test_state(Arc::new(ScriptedBackend::default())).with_admin_key(None);
    let server = server_with(state);
    let (name, value) = admin_header(ADMIN_KEY);

    let response = server.get("/v1/admin/api_keys").add_header(name, value).await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn client_key_does_not_open_admin_routes() {
    let server = server_with(test_state(Arc::new(ScriptedBackend::default())));
    let (name, value) = api_key_header();

    let response = server.get("/v1/admin/api_keys").add_header(name, value).await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn generated_key_can_be_used_for_chat() {
    let backend = Arc::new(ScriptedBackend::default().reply("auto", "hi"));
    let server = server_with(test_state(backend));
    let (name, value) = admin_header(ADMIN_KEY);

    let response = server
        .post("/v1/admin/generate_api_key")
        .add_query_param("remark", "ci runner")
        .add_header(name, value)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["data"]["remark"], "ci runner");
    let new_key = body["data"]["api_key"].as_str().unwrap().to_string();
    assert!(new_key.starts_with("sk-"));

    let response = server
        .post("/v1/chat/completions")
        .add_header(
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_str(&new_key).unwrap(),
        )
        .json(&hello())
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn list_api_keys_shows_stored_keys() {
    let server = server_with(test_state(Arc::new(ScriptedBackend::default())));
    let (name, value) = admin_header(ADMIN_KEY);

    let response = server.get("/v1/admin/api_keys").add_header(name, value).await;

    response.assert_status_ok();
    let body: Value = response.json();
    let keys = body["data"]["api_keys"].as_array().unwrap();
    assert_eq!(keys.len(), 1);
    assert_eq!(keys[0]["key"], CLIENT_KEY);
    assert_eq!(keys[0]["remark"], "tests");
    assert_eq!(keys[0]["active"], true);
}

#[tokio::test]
async fn revoked_key_is_rejected() {
    let server = server_with(test_state(Arc::new(ScriptedBackend::default().reply("auto", "hi"))));
    let (admin_name, admin_value) = admin_header(ADMIN_KEY);

    let response = server
        .delete(&format!("/v1/admin/revoke_api_key/{}", CLIENT_KEY))
        .add_header(admin_name, admin_value)
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["message"], "API key revoked");

    let (name, value) = api_key_header();
    let response = server
        .post("/v1/chat/completions")
        .add_header(name, value)
        .json(&hello())
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn revoking_unknown_key_is_not_found() {
    let server = server_with(test_state(Arc::new(ScriptedBackend::default())));
    let (name, value) = admin_header(ADMIN_KEY);

    let response = server
        .delete("/v1/admin/revoke_api_key/sk-missing")
        .add_header(name, value)
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["success"], false);
}

#[tokio::test]
async fn disabled_key_is_rejected_until_enabled() {
    let server = server_with(test_state(Arc::new(ScriptedBackend::default().reply("auto", "hi"))));
    let path = format!("/v1/admin/api_keys/{}", CLIENT_KEY);

    let (name, value) = admin_header(ADMIN_KEY);
    server
        .patch(&path)
        .add_header(name, value)
        .json(&json!({"active": false}))
        .await
        .assert_status_ok();

    let (name, value) = api_key_header();
    server
        .post("/v1/chat/completions")
        .add_header(name, value)
        .json(&hello())
        .await
        .assert_status(StatusCode::FORBIDDEN);

    let (name, value) = admin_header(ADMIN_KEY);
    let response = server
        .patch(&path)
        .add_header(name, value)
        .json(&json!({"active": true}))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["data"]["message"], "API key enabled");

    let (name, value) = api_key_header();
    server
        .post("/v1/chat/completions")
        .add_header(name, value)
        .json(&hello())
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn patching_unknown_key_is_not_found() {
    let server = server_with(test_state(Arc::new(ScriptedBackend::default())));
    let (name, value) = admin_header(ADMIN_KEY);

    let response = server
        .patch("/v1/admin/api_keys/sk-missing")
        .add_header(name, value)
        .json(&json!({"active": false}))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}
