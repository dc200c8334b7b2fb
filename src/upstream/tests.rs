use super::*;
use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct Echo {
    value: u32,
}

fn agent() -> ureq::Agent {
    build_agent(Duration::from_secs(5))
}

#[test]
fn endpoint_keeps_base_path() {
    let base = Url::parse("https://openrouter.ai/api/v1").expect("url should parse");
    let url = endpoint(&base, "chat/completions").expect("endpoint should build");
    assert_eq!(url.as_str(), "https://openrouter.ai/api/v1/chat/completions");

    let base = Url::parse("https://generativelanguage.googleapis.com/").expect("url should parse");
    let url = endpoint(&base, "/v1beta/models/text-embedding-004:embedContent")
        .expect("endpoint should build");
    assert_eq!(
        url.as_str(),
        "https://generativelanguage.googleapis.com/v1beta/models/text-embedding-004:embedContent"
    );
}

#[test]
fn long_error_bodies_are_truncated() {
    let body = "x".repeat(MAX_ERROR_BODY_CHARS + 10);
    let truncated = truncate_body(&body);
    assert_eq!(truncated.chars().count(), MAX_ERROR_BODY_CHARS + 1);
    assert!(truncated.ends_with('…'));

    assert_eq!(truncate_body("short"), "short");
}

#[tokio::test]
async fn post_json_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/echo"))
        .and(header("x-test", "yes"))
        .and(body_json(json!({"value": 7})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": 8})))
        .expect(1)
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/echo", server.uri())).expect("url should parse");
    let echo: Echo = post_json(&agent(), &url, &[("x-test", "yes")], &json!({"value": 7}))
        .expect("request should succeed");

    assert_eq!(echo, Echo { value: 8 });
}

#[tokio::test]
async fn error_status_keeps_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/limited", server.uri())).expect("url should parse");
    let result: Result<Echo, _> = get_json(&agent(), &url, &[]);

    match result {
        Err(UpstreamError::Status { status, body }) => {
            assert_eq!(status, 429);
            assert_eq!(body, "slow down");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_json_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/broken", server.uri())).expect("url should parse");
    let result: Result<Echo, _> = get_json(&agent(), &url, &[]);

    assert!(matches!(result, Err(UpstreamError::Decode(_))));
}

#[test]
fn unreachable_host_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("should bind port");
    let port = listener.local_addr().expect("should have address").port();
    drop(listener);
    let url = Url::parse(&format!("http://127.0.0.1:{port}/gone")).expect("url should parse");

    let result: Result<Echo, _> = get_json(&agent(), &url, &[]);
    assert!(matches!(result, Err(UpstreamError::Transport(_))));
}

#[tokio::test]
async fn run_blocking_propagates_result() {
    let value = run_blocking(|| Ok::<_, UpstreamError>(42))
        .await
        .expect("blocking call should succeed");
    assert_eq!(value, 42);

    let error = run_blocking(|| Err::<u32, _>(UpstreamError::Decode("bad".to_string()))).await;
    assert!(matches!(error, Err(UpstreamError::Decode(_))));
}
