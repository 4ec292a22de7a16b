//! Redirects, session cookies and transport failures across whole executions.

use super::engine_for;
use http_cli::executor::{ExecutionContext, ExecutionError};
use http_cli::models::{AdhocRequest, HttpMethod};
use http_cli::session::SessionStore;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn redirecting_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(path("/a"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/b"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(200).set_body_string("landed"))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_redirect_followed_within_limit() {
    let server = redirecting_server().await;
    let dir = TempDir::new().unwrap();
    let engine = engine_for(dir.path());

    let mut context = ExecutionContext::new(AdhocRequest::for_url(format!("{}/a", server.uri())));
    context.max_redirect = Some(1);

    let outcome = engine.execute(&context).await;
    assert!(outcome.is_success(), "unexpected error: {:?}", outcome.error);
    assert_eq!(outcome.exchanges.len(), 2);
    assert_eq!(outcome.exchanges[0].response.status_code, 302);
    assert_eq!(outcome.exchanges[1].request.url, format!("{}/b", server.uri()));
    assert_eq!(outcome.exchanges[1].response.body, "landed");
}

#[tokio::test]
async fn test_redirect_limit_zero_keeps_first_exchange() {
    let server = redirecting_server().await;
    let dir = TempDir::new().unwrap();
    let engine = engine_for(dir.path());

    let mut context = ExecutionContext::new(AdhocRequest::for_url(format!("{}/a", server.uri())));
    context.max_redirect = Some(0);

    let outcome = engine.execute(&context).await;
    assert_eq!(outcome.exchanges.len(), 1);
    assert_eq!(outcome.exchanges[0].response.status_code, 302);
    assert!(matches!(
        outcome.error,
        Some(ExecutionError::RedirectLimitExceeded { count: 1, max: 0 })
    ));
}

#[tokio::test]
async fn test_redirect_loop_is_bounded() {
    let server = MockServer::start().await;
    Mock::given(path("/loop"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/loop"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = engine_for(dir.path());
    let mut context =
        ExecutionContext::new(AdhocRequest::for_url(format!("{}/loop", server.uri())));
    context.max_redirect = Some(3);

    let outcome = engine.execute(&context).await;
    assert_eq!(outcome.exchanges.len(), 4);
    let error = outcome.error.expect("loop must stop with an error");
    assert_eq!(error.kind(), "RedirectLimitExceeded");
}

#[tokio::test]
async fn test_non_followable_redirect_status_is_final() {
    let server = MockServer::start().await;
    Mock::given(path("/moved"))
        .respond_with(ResponseTemplate::new(307).insert_header("Location", "/elsewhere"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = engine_for(dir.path());
    let context = ExecutionContext::new(AdhocRequest::for_url(format!("{}/moved", server.uri())));

    let outcome = engine.execute(&context).await;
    assert!(outcome.is_success());
    assert_eq!(outcome.exchanges.len(), 1);
}

#[tokio::test]
async fn test_cookies_persist_across_executions() {
    let server = MockServer::start().await;
    Mock::given(path("/login"))
        .respond_with(
            ResponseTemplate::new(200).append_header("Set-Cookie", "session=abc; Path=/"),
        )
        .mount(&server)
        .await;
    Mock::given(path("/me"))
        .and(header("Cookie", "session=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("it's you"))
        .mount(&server)
        .await;
    Mock::given(path("/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = engine_for(dir.path());

    let login = engine
        .execute(&ExecutionContext::new(AdhocRequest::for_url(format!(
            "{}/login",
            server.uri()
        ))))
        .await;
    assert!(login.is_success());

    let me = engine
        .execute(&ExecutionContext::new(AdhocRequest::for_url(format!(
            "{}/me",
            server.uri()
        ))))
        .await;
    assert_eq!(me.exchanges[0].response.status_code, 200);
    assert_eq!(me.exchanges[0].response.body, "it's you");
}

#[tokio::test]
async fn test_expired_cookie_removes_stored_one() {
    let server = MockServer::start().await;
    Mock::given(path("/login"))
        .respond_with(ResponseTemplate::new(200).append_header("Set-Cookie", "session=abc"))
        .mount(&server)
        .await;
    Mock::given(path("/logout"))
        .respond_with(
            ResponseTemplate::new(200).append_header("Set-Cookie", "session=; Max-Age=0"),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = engine_for(dir.path());
    for step in ["login", "logout"] {
        let outcome = engine
            .execute(&ExecutionContext::new(AdhocRequest::for_url(format!(
                "{}/{}",
                server.uri(),
                step
            ))))
            .await;
        assert!(outcome.is_success());
    }

    let session = engine.sessions().get("127.0.0.1");
    assert!(!session.cookies.contains_key("session"));
}

#[tokio::test]
async fn test_session_variables_are_host_scoped() {
    let server = MockServer::start().await;
    Mock::given(path("/companies/7"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = engine_for(dir.path());
    engine.sessions().set_global_variable("companyId", "1");
    engine.sessions().set_variable("127.0.0.1", "companyId", "7");

    let context = ExecutionContext::new(AdhocRequest::for_url(format!(
        "{}/companies/{{companyId}}",
        server.uri()
    )));
    let outcome = engine.execute(&context).await;
    assert_eq!(outcome.exchanges[0].response.status_code, 200);

    // A passed variable beats the session.
    let context = context.with_variable("companyId", "9");
    let outcome = engine.execute(&context).await;
    assert!(outcome.exchanges[0].request.url.ends_with("/companies/9"));
}

#[tokio::test]
async fn test_unresolved_placeholder_is_sent_literally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/echo"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let engine = engine_for(dir.path());
    let mut adhoc = AdhocRequest::for_url(format!("{}/echo", server.uri()));
    adhoc.body = r#"{"id": "{unknown}"}"#.to_string();

    let outcome = engine.execute(&ExecutionContext::new(adhoc)).await;
    assert!(outcome.is_success());
    let sent = &outcome.exchanges[0].request;
    assert_eq!(sent.method, HttpMethod::POST);
    assert_eq!(sent.body, r#"{"id": "{unknown}"}"#);
}

#[tokio::test]
async fn test_transport_failure_is_reported() {
    let dir = TempDir::new().unwrap();
    let engine = engine_for(dir.path());
    let context = ExecutionContext::new(AdhocRequest::for_url("http://127.0.0.1:1/unreachable"));

    let outcome = engine.execute(&context).await;
    assert!(outcome.exchanges.is_empty());
    assert_eq!(outcome.error.unwrap().kind(), "TransportError");
}
