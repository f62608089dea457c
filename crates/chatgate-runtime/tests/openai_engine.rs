//! Integration tests for the OpenAI-compatible engine client.
//!
//! A small axum app stands in for the engine server so the client can be
//! exercised over real HTTP without a GPU.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chatgate_core::{
    AbortOnDrop, EngineError, GenerationSnapshot, InferenceEngine, RequestId, SamplingParams,
};
use chatgate_runtime::{OpenAiEngine, OpenAiEngineConfig};
use futures_util::StreamExt;

const MODEL: &str = "test-model";

#[derive(Clone, Default)]
struct Recorded {
    bodies: Arc<Mutex<Vec<serde_json::Value>>>,
    request_ids: Arc<Mutex<Vec<String>>>,
}

fn chunk(text: &str, finish: Option<&str>) -> String {
    let choice = serde_json::json!({ "index": 0, "text": text, "finish_reason": finish });
    format!("data: {}\n\n", serde_json::json!({ "id": "cmpl-1", "choices": [choice] }))
}

async fn completions(
    State(recorded): State<Recorded>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> Response {
    if let Some(id) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
        recorded.request_ids.lock().unwrap().push(id.to_string());
    }
    let prompt = body["prompt"].as_str().unwrap_or_default().to_string();
    recorded.bodies.lock().unwrap().push(body);

    match prompt.as_str() {
        "too long" => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "object": "error",
                "message": "This model's maximum context length is 2048 tokens",
                "code": 400
            })),
        )
            .into_response(),
        "hang" => {
            let first = futures_util::stream::once(async {
                Ok::<_, Infallible>(Bytes::from(chunk("Thinking", None)))
            });
            let body = first.chain(futures_util::stream::pending());
            Response::builder()
                .header("content-type", "text/event-stream")
                .body(Body::from_stream(body))
                .unwrap()
        }
        "crash" => Response::builder()
            .header("content-type", "text/event-stream")
            .body(Body::from(chunk("He", None)))
            .unwrap(),
        _ => {
            let events = [
                chunk("He", None),
                chunk("llo", None),
                chunk("!", Some("stop")),
                "data: [DONE]\n\n".to_string(),
            ]
            .concat();
            Response::builder()
                .header("content-type", "text/event-stream")
                .body(Body::from(events))
                .unwrap()
        }
    }
}

async fn spawn_fake_engine() -> (SocketAddr, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .route("/v1/completions", post(completions))
        .with_state(recorded.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, recorded)
}

fn engine_for(addr: SocketAddr) -> OpenAiEngine {
    OpenAiEngine::new(OpenAiEngineConfig::new(format!("http://{addr}/"), MODEL)).unwrap()
}

fn params() -> SamplingParams {
    SamplingParams {
        temperature: 0.7,
        top_p: 0.9,
        max_tokens: 200,
    }
}

#[tokio::test]
async fn generate_streams_cumulative_snapshots() {
    let (addr, recorded) = spawn_fake_engine().await;
    let engine = engine_for(addr);
    let id = RequestId::new("chat-1");

    let stream = engine.generate("Hi", &params(), &id).await.unwrap();
    let snapshots: Vec<GenerationSnapshot> = stream.map(Result::unwrap).collect().await;

    let texts: Vec<&str> = snapshots.iter().map(GenerationSnapshot::text).collect();
    assert_eq!(texts, vec!["He", "Hello", "Hello!"]);
    assert!(snapshots.last().unwrap().finished);
    assert_eq!(engine.inflight(), 0);

    let bodies = recorded.bodies.lock().unwrap();
    assert_eq!(bodies[0]["model"], MODEL);
    assert_eq!(bodies[0]["prompt"], "Hi");
    assert_eq!(bodies[0]["max_tokens"], 200);
    assert_eq!(bodies[0]["stream"], true);
    assert!((bodies[0]["top_p"].as_f64().unwrap() - 0.9).abs() < 1e-6);
    assert_eq!(recorded.request_ids.lock().unwrap().as_slice(), ["chat-1"]);
}

#[tokio::test]
async fn engine_error_status_is_upstream_error() {
    let (addr, _) = spawn_fake_engine().await;
    let engine = engine_for(addr);

    let err = engine
        .generate("too long", &params(), &RequestId::new("chat-2"))
        .await
        .err()
        .unwrap();

    match err {
        EngineError::Upstream { status, message } => {
            assert_eq!(status, 400);
            assert!(message.contains("maximum context length"), "{message}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(engine.inflight(), 0);
}

#[tokio::test]
async fn unreachable_engine_is_unavailable() {
    let engine = OpenAiEngine::new(OpenAiEngineConfig::new("http://127.0.0.1:9", MODEL)).unwrap();

    let err = engine
        .generate("Hi", &params(), &RequestId::new("chat-3"))
        .await
        .err()
        .unwrap();

    assert!(matches!(err, EngineError::Unavailable(_)));
    assert!(engine.health().await.is_err());
}

#[tokio::test]
async fn health_reports_ready_engine() {
    let (addr, _) = spawn_fake_engine().await;
    assert!(engine_for(addr).health().await.is_ok());
}

#[tokio::test]
async fn abort_cancels_inflight_stream() {
    let (addr, _) = spawn_fake_engine().await;
    let engine = engine_for(addr);
    let id = RequestId::new("chat-4");

    let mut stream = engine.generate("hang", &params(), &id).await.unwrap();
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.text(), "Thinking");
    assert_eq!(engine.inflight(), 1);

    engine.abort(&id);

    assert!(matches!(stream.next().await, Some(Err(EngineError::Aborted(_)))));
    assert!(stream.next().await.is_none());
    drop(stream);
    assert_eq!(engine.inflight(), 0);
}

#[tokio::test]
async fn body_closed_before_done_is_protocol_error() {
    let (addr, _) = spawn_fake_engine().await;
    let engine = engine_for(addr);

    let stream = engine.generate("crash", &params(), &RequestId::new("chat-5")).await.unwrap();
    let items: Vec<_> = stream.collect().await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap().text(), "He");
    assert!(matches!(items[1], Err(EngineError::Protocol(_))));
    assert_eq!(engine.inflight(), 0);
}

#[tokio::test]
async fn dropping_one_generation_keeps_another_with_same_id() {
    let (addr, _) = spawn_fake_engine().await;
    let engine = Arc::new(engine_for(addr));
    let handle: Arc<dyn InferenceEngine> = engine.clone();
    let id = RequestId::new("1760000000000-127.0.0.1");

    let mut first = AbortOnDrop::new(
        engine.generate("hang", &params(), &id).await.unwrap(),
        Arc::clone(&handle),
        id.clone(),
    );
    let mut second = AbortOnDrop::new(
        engine.generate("hang", &params(), &id).await.unwrap(),
        Arc::clone(&handle),
        id.clone(),
    );
    assert_eq!(first.next().await.unwrap().unwrap().text(), "Thinking");
    assert_eq!(second.next().await.unwrap().unwrap().text(), "Thinking");
    assert_eq!(engine.inflight(), 2);

    drop(first);
    assert_eq!(engine.inflight(), 1);
    let next = tokio::time::timeout(Duration::from_millis(200), second.next()).await;
    assert!(next.is_err(), "second generation ended early: {next:?}");

    // With a single live generation the id is unambiguous again.
    engine.abort(&id);
    assert!(matches!(second.next().await, Some(Err(EngineError::Aborted(_)))));
    drop(second);
    assert_eq!(engine.inflight(), 0);
}
