//! Post-process scripts driving follow-up requests through the real QuickJS host.

use super::{engine_for, write_profile};
use http_cli::executor::{ExecutionContext, ExecutionError};
use http_cli::models::{AdhocRequest, PostProcessSource};
use http_cli::session::SessionStore;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn script(code: &str) -> PostProcessSource {
    PostProcessSource::new(code, "cli")
}

#[tokio::test]
async fn test_login_then_named_request_with_captured_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"token": "t-123"}"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("Authorization", "Bearer t-123"))
        .respond_with(ResponseTemplate::new(200).set_body_string("profile"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    write_profile(
        &dir,
        "local.yml",
        &format!(
            r#"
baseURL: {}
requests:
  login:
    url: /login
    body: '{{"user": "admin"}}'
    postProcessScript: |
      addVariable('token', JSON.parse(response.body).token);
      addRequest('@me');
  me:
    url: /me
    headers:
      Authorization: "Bearer {{token}}"
"#,
            server.uri()
        ),
    );

    let engine = engine_for(dir.path());
    let context = ExecutionContext::default()
        .with_profile("local")
        .with_request_name("login");

    let outcome = engine.execute(&context).await;
    assert!(outcome.is_success(), "unexpected error: {:?}", outcome.error);
    assert_eq!(outcome.exchanges.len(), 2);
    assert_eq!(outcome.exchanges[0].post_process_error, None);
    assert_eq!(outcome.exchanges[1].response.body, "profile");

    // The captured variable lives on the host's session.
    assert_eq!(engine.sessions().get("127.0.0.1").variables["token"], "t-123");
    assert!(!engine.sessions().get("").variables.contains_key("token"));
}

#[tokio::test]
async fn test_relative_added_request_resolves_against_current_url() {
    let server = MockServer::start().await;
    Mock::given(path("/start"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(path("/next"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = engine_for(dir.path());
    let context =
        ExecutionContext::new(AdhocRequest::for_url(format!("{}/start", server.uri())))
            .with_post_process(script("addRequest('/next');"));

    let outcome = engine.execute(&context).await;
    assert!(outcome.is_success(), "unexpected error: {:?}", outcome.error);
    assert_eq!(outcome.exchanges.len(), 2);
    assert_eq!(
        outcome.exchanges[1].request.url,
        format!("{}/next", server.uri())
    );
    assert_eq!(outcome.exchanges[1].response.status_code, 204);
}

#[tokio::test]
async fn test_relative_templated_request_uses_captured_variable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/companies"))
        .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"id": 42}"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/companies/42"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Acme"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = engine_for(dir.path());
    let mut adhoc = AdhocRequest::for_url(format!("{}/companies", server.uri()));
    adhoc.method = "POST".into();
    let context = ExecutionContext::new(adhoc).with_post_process(script(
        "addVariable('companyId', JSON.parse(response.body).id); addRequest('/companies/{companyId}');",
    ));

    let outcome = engine.execute(&context).await;
    assert!(outcome.is_success(), "unexpected error: {:?}", outcome.error);
    assert_eq!(outcome.exchanges.len(), 2);
    assert_eq!(
        outcome.exchanges[1].request.url,
        format!("{}/companies/42", server.uri())
    );
    assert_eq!(outcome.exchanges[1].response.body, "Acme");
}

#[tokio::test]
async fn test_script_sees_response_and_prints() {
    let server = MockServer::start().await;
    Mock::given(path("/status"))
        .respond_with(ResponseTemplate::new(202).set_body_string("queued"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = engine_for(dir.path());
    let context =
        ExecutionContext::new(AdhocRequest::for_url(format!("{}/status", server.uri())))
            .with_post_process(script(
                "println(response.statusCode, executed.length); print(response.Body);",
            ));

    let outcome = engine.execute(&context).await;
    assert!(outcome.is_success());
    assert_eq!(outcome.exchanges[0].post_process_output, "202 1\nqueued");
}

#[tokio::test]
async fn test_script_error_is_attached_to_exchange() {
    let server = MockServer::start().await;
    Mock::given(path("/a"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = engine_for(dir.path());
    let context = ExecutionContext::new(AdhocRequest::for_url(format!("{}/a", server.uri())))
        .with_post_process(script(
            "println('before'); addVariable('kept', 'yes'); notAFunction(); addRequest('/a');",
        ));

    let outcome = engine.execute(&context).await;
    assert!(outcome.error.is_none());
    assert_eq!(outcome.exchanges.len(), 1);

    let exchange = &outcome.exchanges[0];
    assert_eq!(exchange.post_process_output, "before\n");
    let error = exchange.post_process_error.as_deref().unwrap();
    assert!(error.contains("ReferenceError"), "got {}", error);
    assert!(error.ends_with(" @ cli"), "got {}", error);

    // Work done before the fault still counts.
    assert_eq!(engine.sessions().get("127.0.0.1").variables["kept"], "yes");
}

#[tokio::test]
async fn test_unknown_named_request_fails_the_script() {
    let server = MockServer::start().await;
    Mock::given(path("/a"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = engine_for(dir.path());
    let context = ExecutionContext::new(AdhocRequest::for_url(format!("{}/a", server.uri())))
        .with_post_process(script("addRequest('@missing');"));

    let outcome = engine.execute(&context).await;
    assert_eq!(outcome.exchanges.len(), 1);
    let error = outcome.exchanges[0].post_process_error.as_deref().unwrap();
    assert!(error.contains("missing"), "got {}", error);
}

#[tokio::test]
async fn test_added_request_limit_is_terminal() {
    let server = MockServer::start().await;
    Mock::given(path("/a"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = engine_for(dir.path());
    let mut context =
        ExecutionContext::new(AdhocRequest::for_url(format!("{}/a", server.uri())))
            .with_post_process(script("addRequest('/a'); addRequest('/a'); addRequest('/a');"));
    context.max_added_requests = Some(2);

    let outcome = engine.execute(&context).await;
    assert_eq!(outcome.exchanges.len(), 1);
    assert!(matches!(
        outcome.error,
        Some(ExecutionError::AddedRequestLimitExceeded { count: 3, max: 2 })
    ));
}

#[tokio::test]
async fn test_transport_failure_keeps_prior_exchanges() {
    let server = MockServer::start().await;
    Mock::given(path("/first"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = engine_for(dir.path());
    let context =
        ExecutionContext::new(AdhocRequest::for_url(format!("{}/first", server.uri())))
            .with_post_process(script("addRequest('http://127.0.0.1:1/down');"));

    let outcome = engine.execute(&context).await;
    assert_eq!(outcome.exchanges.len(), 1);
    assert_eq!(outcome.exchanges[0].response.status_code, 200);
    assert_eq!(outcome.error.unwrap().kind(), "TransportError");
}

#[tokio::test]
async fn test_added_object_request_is_configured() {
    let server = MockServer::start().await;
    Mock::given(path("/a"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/items"))
        .and(header("X-Source", "script"))
        .respond_with(ResponseTemplate::new(200).set_body_string("stored"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = engine_for(dir.path());
    let code = format!(
        "addRequest({{ url: '{}/items', method: 'PUT', headers: {{ 'X-Source': 'script' }}, values: {{ name: 'Acme' }} }});",
        server.uri()
    );
    let context = ExecutionContext::new(AdhocRequest::for_url(format!("{}/a", server.uri())))
        .with_post_process(script(&code));

    let outcome = engine.execute(&context).await;
    assert!(outcome.is_success(), "unexpected error: {:?}", outcome.error);
    assert_eq!(outcome.exchanges.len(), 2);
    assert_eq!(outcome.exchanges[1].request.body, r#"{"name":"Acme"}"#);
    assert_eq!(outcome.exchanges[1].response.body, "stored");
}
