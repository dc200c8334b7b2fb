use super::*;
use crate::server::GENERIC_ERROR_MESSAGE;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ChatClient {
    let url = Url::parse(&server.uri()).expect("mock uri should parse");
    ChatClient::new(&url, Duration::from_secs(5)).expect("client should build")
}

async fn send(client: ChatClient, messages: Vec<Message>) -> Result<String, ClientError> {
    tokio::task::spawn_blocking(move || client.send(&messages))
        .await
        .expect("blocking task should join")
}

#[test]
fn chat_url_keeps_base_path() {
    let base = Url::parse("http://localhost:3000/rag").expect("valid url");
    let client = ChatClient::new(&base, DEFAULT_CLIENT_TIMEOUT).expect("client should build");
    assert_eq!(client.chat_url().as_str(), "http://localhost:3000/rag/api/chat");
}

#[tokio::test]
async fn sends_transcript_and_reads_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_json(json!([
            {"role": "assistant", "content": GREETING},
            {"role": "user", "content": "Who teaches algorithms well?"}
        ])))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"response": "Try Professor Ada."})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transcript = reduce(
        &Transcript::default(),
        TranscriptEvent::UserSubmitted("Who teaches algorithms well?".to_string()),
    );
    let reply = send(client_for(&server), transcript.messages().to_vec())
        .await
        .expect("request should succeed");

    assert_eq!(reply, "Try Professor Ada.");
}

#[tokio::test]
async fn server_error_message_is_extracted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"error": GENERIC_ERROR_MESSAGE})),
        )
        .mount(&server)
        .await;

    let error = send(client_for(&server), vec![Message::user("hi")])
        .await
        .expect_err("500 should fail");

    match error {
        ClientError::Server { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, GENERIC_ERROR_MESSAGE);
        }
        other => panic!("expected server error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_error_body_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway\n"))
        .mount(&server)
        .await;

    let error = send(client_for(&server), vec![Message::user("hi")])
        .await
        .expect_err("502 should fail");

    assert!(
        matches!(error, ClientError::Server { status: 502, ref message } if message == "Bad Gateway")
    );
}

#[tokio::test]
async fn missing_response_field_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "wrong key"})))
        .mount(&server)
        .await;

    let error = send(client_for(&server), vec![Message::user("hi")])
        .await
        .expect_err("wrong shape should fail");

    assert!(matches!(error, ClientError::Decode(_)));
}

#[test]
fn unreachable_server_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
    let address = listener.local_addr().expect("listener has an address");
    drop(listener);

    let url = Url::parse(&format!("http://{address}")).expect("valid url");
    let client = ChatClient::new(&url, Duration::from_secs(2)).expect("client should build");

    let error = client
        .send(&[Message::user("hi")])
        .expect_err("nothing is listening");
    assert!(matches!(error, ClientError::Transport(_)));
}
