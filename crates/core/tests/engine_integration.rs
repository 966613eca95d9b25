//! Engine integration tests
//!
//! Exercise the runner, observer fan-out, bulk executor and cursor against
//! a scripted in-memory transport, checking the caller-visible semantics:
//! header assembly, envelope classification, notification on every path and
//! the single-use cursor lifecycle.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use folio_core::{
    BulkExecutor, ChunkOutcome, CommandObserver, CommandRunner, CommandTransport,
    FindCursor, ObserverRegistry, RunnerContext, TransportRequest, TransportResponse,
};
use folio_domain::{Command, Error, ExecutionInfo, FindOptions};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::mpsc;

/// Transport that replays a scripted sequence of responses and records
/// every request it saw.
#[derive(Default)]
struct ScriptedTransport {
    script: Mutex<VecDeque<folio_domain::Result<TransportResponse>>>,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn enqueue_ok(&self, body: Value) {
        self.script.lock().push_back(Ok(TransportResponse {
            status: 200,
            headers: HashMap::from([("x-served-by".to_string(), "script".to_string())]),
            body: body.to_string(),
        }));
    }

    fn enqueue_err(&self, error: Error) {
        self.script.lock().push_back(Err(error));
    }

    fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl CommandTransport for ScriptedTransport {
    async fn roundtrip(&self, request: TransportRequest) -> folio_domain::Result<TransportResponse> {
        self.requests.lock().push(request);
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(Error::IllegalState("no scripted response left".into())))
    }
}

struct ChannelObserver {
    tx: mpsc::UnboundedSender<Arc<ExecutionInfo>>,
}

#[async_trait]
impl CommandObserver for ChannelObserver {
    async fn on_command(&self, info: Arc<ExecutionInfo>) {
        let _ = self.tx.send(info);
    }
}

struct PanickingObserver;

#[async_trait]
impl CommandObserver for PanickingObserver {
    async fn on_command(&self, _info: Arc<ExecutionInfo>) {
        panic!("observer bug");
    }
}

fn runner_for(transport: Arc<ScriptedTransport>) -> CommandRunner {
    let ctx = Arc::new(RunnerContext {
        transport,
        observers: Arc::new(ObserverRegistry::new()),
        token: "test-token".to_string(),
        user_agent: "folio-test/0.0".to_string(),
        default_deadline: Duration::from_secs(20),
    });
    CommandRunner::new("http://service.local/v1/ks/people", ctx)
}

#[tokio::test(flavor = "multi_thread")]
async fn run_sends_wire_body_and_required_headers() {
    let transport = ScriptedTransport::new();
    transport.enqueue_ok(json!({ "status": { "insertedIds": [1] } }));
    transport.enqueue_ok(json!({ "status": { "insertedIds": [2] } }));
    let runner = runner_for(Arc::clone(&transport));

    let command = Command::new("insertOne").with_field("document", json!({"_id": 1}));
    runner.run(&command).await.unwrap();
    runner.run(&command).await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    let first = &requests[0];
    assert_eq!(first.url, "http://service.local/v1/ks/people");
    assert_eq!(first.body, json!({"insertOne": {"document": {"_id": 1}}}));
    assert_eq!(first.timeout, Duration::from_secs(20));

    assert_eq!(first.headers.get("Content-Type").map(String::as_str), Some("application/json"));
    assert_eq!(first.headers.get("Accept").map(String::as_str), Some("application/json"));
    assert_eq!(first.headers.get("User-Agent").map(String::as_str), Some("folio-test/0.0"));
    assert_eq!(
        first.headers.get("X-Requested-With").map(String::as_str),
        Some("folio-test/0.0")
    );
    assert_eq!(
        first.headers.get("Authorization").map(String::as_str),
        Some("Bearer test-token")
    );
    assert_eq!(first.headers.get("X-Folio-Token").map(String::as_str), Some("test-token"));

    // Correlation ids are fresh per call.
    let id_a = requests[0].headers.get("X-Request-Id").cloned().unwrap();
    let id_b = requests[1].headers.get("X-Request-Id").cloned().unwrap();
    assert!(!id_a.is_empty());
    assert_ne!(id_a, id_b);
}

#[tokio::test(flavor = "multi_thread")]
async fn command_deadline_overrides_client_default() {
    let transport = ScriptedTransport::new();
    transport.enqueue_ok(json!({ "status": { "ok": 1 } }));
    let runner = runner_for(Arc::clone(&transport));

    let command = Command::new("find").with_deadline(Duration::from_secs(3));
    runner.run(&command).await.unwrap();

    assert_eq!(transport.requests()[0].timeout, Duration::from_secs(3));
}

#[tokio::test(flavor = "multi_thread")]
async fn envelope_errors_override_http_success() {
    let transport = ScriptedTransport::new();
    transport.enqueue_ok(json!({
        "status": { "insertedIds": [] },
        "errors": [{ "message": "document already exists", "errorCode": "EXISTS" }]
    }));
    let runner = runner_for(transport);

    let error = runner.run(&Command::new("insertOne")).await.unwrap_err();
    match error {
        Error::Api { info } => {
            assert_eq!(info.http_status(), Some(200));
            assert_eq!(info.error_details()[0].error_code.as_deref(), Some("EXISTS"));
            assert_eq!(
                info.http_headers().get("x-served-by").map(String::as_str),
                Some("script")
            );
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn run_as_maps_documents_and_rejects_bare_status() {
    #[derive(Debug, serde::Deserialize, PartialEq)]
    struct Person {
        _id: u32,
        name: String,
    }

    let transport = ScriptedTransport::new();
    transport.enqueue_ok(json!({ "data": { "document": { "_id": 7, "name": "ann" } } }));
    transport.enqueue_ok(json!({ "status": { "count": 3 } }));
    let runner = runner_for(transport);

    let person: Person = runner.run_as(&Command::new("findOne")).await.unwrap();
    assert_eq!(person, Person { _id: 7, name: "ann".to_string() });

    let error = runner.run_as::<Person>(&Command::new("findOne")).await.unwrap_err();
    assert!(matches!(error, Error::Mapping(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn observers_see_success_and_transport_failure() {
    let transport = ScriptedTransport::new();
    transport.enqueue_ok(json!({ "status": { "ok": 1 } }));
    transport.enqueue_err(Error::transport("connection refused", true));
    let runner = runner_for(transport);

    let (tx, mut rx) = mpsc::unbounded_channel();
    runner.observers().register("probe", Arc::new(ChannelObserver { tx }));

    runner.run(&Command::new("find")).await.unwrap();
    let success = rx.recv().await.unwrap();
    assert_eq!(success.command().name(), "find");
    assert_eq!(success.http_status(), Some(200));

    let error = runner.run(&Command::new("find")).await.unwrap_err();
    assert!(matches!(error, Error::Transport { .. }));
    let failure = rx.recv().await.unwrap();
    assert!(failure.response().is_none());
    assert!(failure.http_status().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn panicking_observer_leaves_caller_result_untouched() {
    let transport = ScriptedTransport::new();
    transport.enqueue_ok(json!({ "status": { "insertedIds": [5] } }));
    let runner = runner_for(transport);

    let (tx, mut rx) = mpsc::unbounded_channel();
    runner.observers().register("bad", Arc::new(PanickingObserver));
    runner.observers().register("good", Arc::new(ChannelObserver { tx }));

    let response = runner.run(&Command::new("insertOne")).await.unwrap();
    assert_eq!(response.status_value("insertedIds"), Some(&json!([5])));

    // The well-behaved observer still gets the record.
    let seen = rx.recv().await.unwrap();
    assert_eq!(seen.command().name(), "insertOne");
}

#[tokio::test(flavor = "multi_thread")]
async fn bulk_ordered_carries_prefix_and_envelope_detail() {
    let transport = ScriptedTransport::new();
    transport.enqueue_ok(json!({ "status": { "insertedIds": [1, 2] } }));
    transport.enqueue_ok(json!({
        "errors": [{ "message": "chunk rejected", "errorCode": "REJECTED" }]
    }));
    let runner = runner_for(Arc::clone(&transport));

    let executor = BulkExecutor::new(true, 1);
    let runner_ref = &runner;
    let result = executor
        .execute(3, |index| async move {
            let command = Command::new("insertMany")
                .with_field("documents", json!([{ "chunk": index }]));
            let response = runner_ref.run(&command).await?;
            Ok(ChunkOutcome::from_insert_response(index, response))
        })
        .await;

    match result {
        Err(Error::Aggregated { partial, failures }) => {
            assert_eq!(partial.inserted_ids, vec![json!(1), json!(2)]);
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].chunk_index, 1);
            assert_eq!(failures[0].errors[0].error_code.as_deref(), Some("REJECTED"));
        }
        other => panic!("expected aggregated error, got {other:?}"),
    }

    // The third chunk never reached the transport.
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn cursor_walks_pages_lazily_and_drains_once() {
    let transport = ScriptedTransport::new();
    transport.enqueue_ok(json!({
        "data": { "documents": [{"n": 1}, {"n": 2}], "nextPageState": "p1" }
    }));
    transport.enqueue_ok(json!({
        "data": { "documents": [{"n": 3}] }
    }));
    let runner = runner_for(Arc::clone(&transport));

    let mut cursor: FindCursor<Value> =
        FindCursor::new(runner, json!({}), FindOptions::default());
    let all = cursor.all().await.unwrap();
    assert_eq!(all, vec![json!({"n": 1}), json!({"n": 2}), json!({"n": 3})]);

    // Second page was requested with the continuation token.
    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(
        requests[1].body,
        json!({"find": {"filter": {}, "options": {"pageState": "p1"}}})
    );

    // A second drain is a lifecycle violation.
    assert!(matches!(cursor.all().await, Err(Error::IllegalState(_))));
    // But element access after a drain just reports exhaustion.
    assert_eq!(cursor.next().await.unwrap(), None::<Value>);
}

#[tokio::test(flavor = "multi_thread")]
async fn cursor_rejects_drain_after_manual_advance() {
    let transport = ScriptedTransport::new();
    transport.enqueue_ok(json!({
        "data": { "documents": [{"n": 1}, {"n": 2}] }
    }));
    let runner = runner_for(transport);

    let mut cursor: FindCursor<Value> =
        FindCursor::new(runner, json!({}), FindOptions::default());
    let first = cursor.next().await.unwrap();
    assert_eq!(first, Some(json!({"n": 1})));

    assert!(matches!(cursor.all().await, Err(Error::IllegalState(_))));

    // Element-wise iteration still works to the end.
    assert_eq!(cursor.next().await.unwrap(), Some(json!({"n": 2})));
    assert_eq!(cursor.next().await.unwrap(), None::<Value>);
}
