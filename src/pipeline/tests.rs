use super::testing::Fakes;
use super::*;
use crate::chat::{Message, Role};
use crate::retrieval::RetrievedMatch;

fn question(text: &str) -> ChatHistory {
    ChatHistory::new(vec![Message::user(text)]).expect("history should validate")
}

fn review_match() -> RetrievedMatch {
    RetrievedMatch {
        id: "1".to_string(),
        score: Some(0.9),
        source: "reviews.pdf".to_string(),
        author: "N/A".to_string(),
        text: "Great lecturer".to_string(),
    }
}

#[tokio::test]
async fn round_trip_calls_each_service_once() {
    let fakes = Fakes::with_matches(vec![review_match()]);
    let pipeline = fakes.pipeline();

    let response = pipeline
        .respond(&question("Who teaches algorithms well?"))
        .await
        .expect("pipeline should succeed");

    assert_eq!(response, "Professor Ada is a great pick.");
    assert_eq!(fakes.embed_calls(), ["Who teaches algorithms well?"]);

    let queries = fakes.query_calls();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].0, vec![0.1, 0.2, 0.3]);
    assert_eq!(queries[0].1, 3);

    let completions = fakes.completion_calls();
    assert_eq!(completions.len(), 1);
    let sent = &completions[0];
    assert_eq!(sent[0].role, Role::System);
    assert_eq!(sent[0].content, "You recommend professors.");
    let last = sent.last().expect("messages sent");
    assert!(last.content.contains("Who teaches algorithms well?"));
    assert!(last.content.contains("Context from vector DB:"));
    assert!(last.content.contains("Great lecturer"));
}

#[tokio::test]
async fn only_latest_message_is_embedded() {
    let fakes = Fakes::healthy();
    let history = ChatHistory::new(vec![
        Message::assistant("Hello, how can I help?"),
        Message::user("Any chemistry professors?"),
        Message::assistant("Dr. Curie."),
        Message::user("What about physics?"),
    ])
    .expect("history should validate");

    fakes
        .pipeline()
        .respond(&history)
        .await
        .expect("pipeline should succeed");

    assert_eq!(fakes.embed_calls(), ["What about physics?"]);
    let sent = &fakes.completion_calls()[0];
    assert_eq!(sent.len(), history.turn_count() + 1);
    assert_eq!(sent[1].content, "Hello, how can I help?");
    assert_eq!(sent[3].content, "Dr. Curie.");
}

#[tokio::test]
async fn empty_retrieval_still_completes() {
    let fakes = Fakes::healthy();

    let response = fakes
        .pipeline()
        .respond(&question("Who teaches algorithms well?"))
        .await;

    assert!(response.is_ok());
    let sent = &fakes.completion_calls()[0];
    let last = sent.last().expect("messages sent");
    assert!(last.content.ends_with("Context from vector DB:\n[]"));
}

#[tokio::test]
async fn custom_top_k_is_forwarded() {
    let fakes = Fakes::healthy();
    let pipeline = fakes.pipeline().with_top_k(5);
    assert_eq!(pipeline.top_k(), 5);

    pipeline
        .respond(&question("hi"))
        .await
        .expect("pipeline should succeed");
    assert_eq!(fakes.query_calls()[0].1, 5);
}

#[tokio::test]
async fn embedding_failure_stops_pipeline() {
    let fakes = Fakes::failing("embedding");

    let error = fakes
        .pipeline()
        .respond(&question("hi"))
        .await
        .expect_err("pipeline should fail");

    assert!(matches!(error, PipelineError::Embedding(_)));
    assert_eq!(error.stage(), PipelineStage::Augmenting);
    assert!(error.is_external());
    assert!(fakes.query_calls().is_empty());
    assert!(fakes.completion_calls().is_empty());
}

#[tokio::test]
async fn retrieval_failure_has_no_fallback() {
    let fakes = Fakes::failing("retrieval");

    let error = fakes
        .pipeline()
        .respond(&question("hi"))
        .await
        .expect_err("pipeline should fail");

    assert!(matches!(error, PipelineError::Retrieval(_)));
    assert_eq!(error.stage(), PipelineStage::Augmenting);
    assert!(fakes.completion_calls().is_empty());
}

#[tokio::test]
async fn completion_failure_is_tagged() {
    let fakes = Fakes::failing("completion");

    let error = fakes
        .pipeline()
        .respond(&question("hi"))
        .await
        .expect_err("pipeline should fail");

    assert!(matches!(error, PipelineError::Completion(_)));
    assert_eq!(error.stage(), PipelineStage::Completing);
    assert_eq!(fakes.embed_calls().len(), 1);
    assert_eq!(fakes.query_calls().len(), 1);
}

#[test]
fn malformed_request_is_not_external() {
    let error = PipelineError::from(HistoryError::Empty);
    assert!(!error.is_external());
    assert_eq!(error.stage(), PipelineStage::Received);
}

#[test]
fn upstream_error_is_exposed_with_its_status() {
    let error = PipelineError::Embedding(UpstreamError::Status {
        status: 401,
        body: "bad key".to_string(),
    });
    assert_eq!(error.upstream().and_then(UpstreamError::status), Some(401));

    let transport = PipelineError::Retrieval(UpstreamError::Transport("down".to_string()));
    assert_eq!(transport.upstream().and_then(UpstreamError::status), None);
    assert!(PipelineError::from(HistoryError::Empty).upstream().is_none());
}

#[test]
fn stage_names() {
    assert_eq!(PipelineStage::Augmenting.to_string(), "augmenting");
    assert_eq!(PipelineStage::Responded.to_string(), "responded");
}

#[test]
fn invalid_config_is_rejected_before_connecting() {
    let mut config = Config::default();
    config.retrieval.top_k = 0;
    let credentials = Credentials {
        gemini_api_key: "g".to_string(),
        pinecone_api_key: "p".to_string(),
        openrouter_api_key: "o".to_string(),
    };

    let error = RagPipeline::from_config(&config, &credentials).expect_err("top_k 0 is invalid");
    assert!(matches!(error, RagError::Config(message) if message.contains("top_k")));
}
