// tests/api_tests.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use assessment::{
    config::Config,
    exam::ExamEngine,
    models::{
        history::HistoryRecord,
        identity::Identity,
        question::{AssessmentType, Choice, Question},
        score::PassRatio,
    },
    repository::{
        AppendOutcome, AuthorizationRegistry, HistoryRepository, RepositoryError,
        memory::{InMemoryHistory, InMemoryQuestionBank, InMemoryRegistry},
    },
    routes,
    state::AppState,
};
use async_trait::async_trait;
use serde_json::{Value, json};

struct TestApp {
    address: String,
    history: InMemoryHistory,
}

/// Helper function to spawn the app on a random port for testing.
/// Seeds one authorized identity and a three-question test (type 42).
async fn spawn_app() -> TestApp {
    let history = InMemoryHistory::new();
    let address = spawn_app_with_history(Arc::new(history.clone())).await;
    TestApp { address, history }
}

async fn spawn_app_with_history(history: Arc<dyn HistoryRepository>) -> String {
    spawn_app_with(Arc::new(alice_registry()), history).await
}

fn alice_registry() -> InMemoryRegistry {
    let registry = InMemoryRegistry::new();
    registry.allow("alice@example.com").unwrap();
    registry
}

async fn spawn_app_with(
    registry: Arc<dyn AuthorizationRegistry>,
    history: Arc<dyn HistoryRepository>,
) -> String {
    let bank = InMemoryQuestionBank::new();
    bank.add_type(AssessmentType {
        id: 42,
        name: "Engineering".to_string(),
        pass_ratio: None,
    })
    .unwrap();
    for id in 1..=3 {
        bank.add_question(Question {
            id,
            type_id: 42,
            prompt: format!("Question {}", id),
            level: 1,
            choices: vec![
                Choice {
                    id: id * 10,
                    question_id: id,
                    text: "A".to_string(),
                    is_correct: true,
                },
                Choice {
                    id: id * 10 + 1,
                    question_id: id,
                    text: "B".to_string(),
                    is_correct: false,
                },
            ],
        })
        .unwrap();
    }

    let config = Config {
        database_url: "postgres://unused".to_string(),
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        pass_ratio: PassRatio::default(),
        call_timeout: Some(Duration::from_secs(5)),
        session_ttl: Duration::from_secs(600),
    };

    let engine = ExamEngine::new(
        registry,
        Arc::new(bank),
        history,
        config.pass_ratio,
        config.call_timeout,
    );

    let state = AppState::new(config, engine);
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

/// Registry whose first lookup fails.
struct FlakyRegistry {
    inner: InMemoryRegistry,
    failed: AtomicBool,
}

#[async_trait]
impl AuthorizationRegistry for FlakyRegistry {
    async fn is_authorized(&self, identity: &Identity) -> Result<bool, RepositoryError> {
        if !self.failed.swap(true, Ordering::SeqCst) {
            return Err(RepositoryError::Connection("registry unreachable".to_string()));
        }
        self.inner.is_authorized(identity).await
    }
}

/// History store that is never reachable.
struct UnreachableHistory;

#[async_trait]
impl HistoryRepository for UnreachableHistory {
    async fn append(&self, _record: &HistoryRecord) -> Result<AppendOutcome, RepositoryError> {
        Err(RepositoryError::Connection(
            "pool timed out connecting to db.internal:5432 user=svc".to_string(),
        ))
    }
}

async fn start(client: &reqwest::Client, address: &str, slug: &str, identity: &str) -> reqwest::Response {
    client
        .post(&format!("{}/api/tests/{}/sessions", address, slug))
        .json(&json!({ "identity": identity }))
        .send()
        .await
        .expect("Failed to execute request")
}

async fn answer(client: &reqwest::Client, address: &str, id: &str, question_id: i64, choice_id: i64) -> reqwest::Response {
    client
        .put(&format!("{}/api/sessions/{}/answers", address, id))
        .json(&json!({ "question_id": question_id, "choice_id": choice_id }))
        .send()
        .await
        .expect("Failed to execute request")
}

#[tokio::test]
async fn health_check_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/random_path_that_does_not_exist", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn start_rejects_bad_input() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = start(&client, &app.address, "alice-engineering-42", "not-an-email").await;
    assert_eq!(response.status().as_u16(), 400);

    let response = start(&client, &app.address, "alice-engineering", "alice@example.com").await;
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn start_denies_unknown_identity() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = start(&client, &app.address, "bob-sales-42", "bob@x.com").await;
    assert_eq!(response.status().as_u16(), 403);
}

#[tokio::test]
async fn start_unknown_test_is_not_found() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = start(&client, &app.address, "alice-engineering-7", "alice@example.com").await;
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "no questions configured for this test");
}

#[tokio::test]
async fn start_hides_answer_keys() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = start(&client, &app.address, "alice-engineering-42", "Alice@Example.com").await;
    assert_eq!(response.status().as_u16(), 201);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "in_progress");
    assert_eq!(body["question_count"], 3);
    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 3);
    for q in questions {
        for c in q["choices"].as_array().unwrap() {
            assert!(c.get("is_correct").is_none());
        }
    }
}

#[tokio::test]
async fn test_exam_flow() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    // 1. Open the link
    let body: Value = start(&client, &app.address, "alice-engineering-42", "alice@example.com")
        .await
        .json()
        .await
        .unwrap();
    let id = body["session_id"].as_str().expect("session id").to_string();

    // 2. Answer two of three and try to submit
    assert_eq!(answer(&client, &app.address, &id, 1, 10).await.status().as_u16(), 200);
    assert_eq!(answer(&client, &app.address, &id, 2, 21).await.status().as_u16(), 200);

    let submit_resp = client
        .post(&format!("{}/api/sessions/{}/submit", app.address, id))
        .send()
        .await
        .expect("Submit failed");
    assert_eq!(submit_resp.status().as_u16(), 422);
    let body: Value = submit_resp.json().await.unwrap();
    assert_eq!(body["unanswered"], json!([3]));

    // 3. Choice from another question is rejected
    assert_eq!(answer(&client, &app.address, &id, 3, 10).await.status().as_u16(), 400);

    // 4. Navigation clamps
    let nav: Value = client
        .post(&format!("{}/api/sessions/{}/navigate", app.address, id))
        .json(&json!({ "delta": 10 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(nav["index"], 2);

    // 5. Finish and submit
    assert_eq!(answer(&client, &app.address, &id, 3, 30).await.status().as_u16(), 200);
    let submit_resp = client
        .post(&format!("{}/api/sessions/{}/submit", app.address, id))
        .send()
        .await
        .expect("Submit failed");
    assert_eq!(submit_resp.status().as_u16(), 200);
    let result: Value = submit_resp.json().await.unwrap();
    assert_eq!(result["status"], "submitted");
    assert_eq!(result["result"]["correct"], 2);
    assert_eq!(result["result"]["total"], 3);
    assert_eq!(result["result"]["passed"], false);

    // 6. Second submit is an illegal transition
    let again = client
        .post(&format!("{}/api/sessions/{}/submit", app.address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 409);

    // 7. The background write lands with the same numbers
    let mut saved = false;
    for _ in 0..50 {
        let snapshot: Value = client
            .get(&format!("{}/api/sessions/{}", app.address, id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if snapshot["persistence"]["state"] == "saved" {
            saved = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(saved, "history write never settled");

    let records = app.history.records().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].correct, 2);
    assert_eq!(records[0].total, 3);

    // 8. Nothing to retry after a successful save
    let retry = client
        .post(&format!("{}/api/sessions/{}/history/retry", app.address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(retry.status().as_u16(), 409);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(&format!("{}/api/sessions/{}", app.address, uuid::Uuid::new_v4()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn failed_save_still_shows_result_with_warning() {
    let address = spawn_app_with_history(Arc::new(UnreachableHistory)).await;
    let client = reqwest::Client::new();

    let body: Value = start(&client, &address, "alice-engineering-42", "alice@example.com")
        .await
        .json()
        .await
        .unwrap();
    let id = body["session_id"].as_str().expect("session id").to_string();
    for q in 1..=3 {
        assert_eq!(answer(&client, &address, &id, q, q * 10).await.status().as_u16(), 200);
    }

    let submit_resp = client
        .post(&format!("{}/api/sessions/{}/submit", address, id))
        .send()
        .await
        .expect("Submit failed");
    assert_eq!(submit_resp.status().as_u16(), 200);
    let result: Value = submit_resp.json().await.unwrap();
    assert_eq!(result["result"]["correct"], 3);
    assert_eq!(result["result"]["passed"], true);

    let mut snapshot = Value::Null;
    for _ in 0..50 {
        snapshot = client
            .get(&format!("{}/api/sessions/{}", address, id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if snapshot["persistence"]["state"] == "failed" {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(snapshot["persistence"]["state"], "failed");
    assert!(snapshot["warning"].is_string());
    assert_eq!(snapshot["result"]["correct"], 3);

    let raw = snapshot.to_string();
    assert!(!raw.contains("db.internal"));
    assert!(!raw.contains("connection error"));

    let retry = client
        .post(&format!("{}/api/sessions/{}/history/retry", address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(retry.status().as_u16(), 202);
}

#[tokio::test]
async fn retry_after_failed_start_opens_new_session() {
    let registry = FlakyRegistry {
        inner: alice_registry(),
        failed: AtomicBool::new(false),
    };
    let address = spawn_app_with(Arc::new(registry), Arc::new(InMemoryHistory::new())).await;
    let client = reqwest::Client::new();

    let first = start(&client, &address, "alice-engineering-42", "alice@example.com").await;
    assert_eq!(first.status().as_u16(), 503);
    let body: Value = first.json().await.unwrap();
    assert_eq!(body["retryable"], true);
    assert!(body.get("session_id").is_none());

    let second = start(&client, &address, "alice-engineering-42", "alice@example.com").await;
    assert_eq!(second.status().as_u16(), 201);
    let body: Value = second.json().await.unwrap();
    let id = body["session_id"].as_str().expect("session id");

    let snapshot = client
        .get(&format!("{}/api/sessions/{}", address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(snapshot.status().as_u16(), 200);
}
