//! End-to-end tests against a stub backend served by axum on an ephemeral
//! port. The library is driven over real HTTP, and the `dash` binary is run
//! as a subprocess pointed at the same stub.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

use dashboard_harness::chat::{ChatEndpoint, ChatSession, SendOutcome, FALLBACK_REPLY};
use dashboard_harness::config::Config;
use dashboard_harness::document::{DocumentKind, DocumentSync, SaveOutcome, SaveState};
use dashboard_harness::fetcher::DataFetcher;
use dashboard_harness::models::ChatRole;
use dashboard_harness::screens::{Dashboard, EcomAgentScreen, EcomTab, EmailScreen, EmailTab};
use dashboard_harness::transport::{HttpTransport, Transport};
use dashboard_harness::view::Filter;

// ─── Stub backend ───────────────────────────────────────────────────

#[derive(Clone, Default)]
struct Stub {
    posts: Arc<Mutex<Vec<(String, Value)>>>,
}

impl Stub {
    fn posts_to(&self, path: &str) -> Vec<Value> {
        self.posts
            .lock()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

fn emails_payload() -> Value {
    json!({
        "emails": [
            {"id": "email_001", "from": "ana@example.com", "from_name": "Ana Duarte",
             "subject": "Where is my order?", "body": "Ordered a week ago.",
             "timestamp": "2024-01-15T10:30:00", "sentiment": "urgent", "read": false,
             "ai_reply": "Your order ships tomorrow."},
            {"id": "email_002", "from": "li@example.com", "from_name": "Li Wei",
             "subject": "Thanks!", "body": "Great service.",
             "timestamp": "2024-01-15T09:00:00Z", "sentiment": "normal", "read": true,
             "ai_reply": "Glad to help."},
            {"id": "email_003", "from": "promo@spam.test", "from_name": "",
             "subject": "WIN NOW", "body": "...",
             "timestamp": "2024-01-14T08:00:00+00:00", "sentiment": "spam", "read": false,
             "ai_reply": ""}
        ],
        "email_statistics": {
            "total_emails": 3, "total_replied": 2, "avg_response_time_minutes": 4.5,
            "sentiment_breakdown": {"normal": 1, "urgent": 1, "angry": 0, "spam": 1, "handover": 0},
            "ai_reply_accuracy": 92.0, "customer_satisfaction": 4.6
        }
    })
}

fn connectors_payload() -> Value {
    json!({"connectors": [
        {"name": "Gmail", "type": "email", "status": "connected", "records": 128},
        {"name": "Shopify", "type": "ecommerce", "status": "disconnected"}
    ]})
}

fn record(stub: &Stub, path: &str, body: Value) {
    stub.posts.lock().push((path.to_string(), body));
}

fn app(stub: Stub) -> Router {
    let api = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/emails", get(|| async { Json(emails_payload()) }))
        .route(
            "/bot/knowledge-base",
            get(|| async { Json(json!({"knowledge_base": "Returns within 30 days."})) }).post(
                |State(stub): State<Stub>, Json(body): Json<Value>| async move {
                    record(&stub, "/bot/knowledge-base", body);
                    Json(json!({"success": true}))
                },
            ),
        )
        .route(
            "/bot/instructions",
            get(|| async { Json(json!({"instructions": "Be polite."})) }).post(
                |State(stub): State<Stub>, Json(body): Json<Value>| async move {
                    record(&stub, "/bot/instructions", body);
                    Json(json!({"success": true}))
                },
            ),
        )
        .route(
            "/bot/connectors/status",
            get(|| async { Json(connectors_payload()) }),
        )
        .route(
            "/bot/chat",
            post(
                |State(stub): State<Stub>, Json(body): Json<Value>| async move {
                    let reply = format!(
                        "echo: {}",
                        body["message"].as_str().unwrap_or_default()
                    );
                    record(&stub, "/bot/chat", body);
                    Json(json!({"response": reply}))
                },
            ),
        )
        .route(
            "/ecom-agent/knowledge-base",
            get(|| async { Json(json!({"knowledge_base": "Catalog of 24 products."})) })
                .post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "disk full") }),
        )
        .route(
            "/ecom-agent/connectors",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream down") }),
        )
        .route(
            "/ecom-agent/chat",
            post(|| async { (StatusCode::SERVICE_UNAVAILABLE, "agent offline") }),
        )
        .route(
            "/qualitative/dashboard",
            get(|| async {
                Json(json!({
                    "overview": {
                        "total_revenue": 125000.5, "total_orders": 840, "total_customers": 312,
                        "avg_order_value": 148.81, "overall_roas": 3.4, "low_stock_products": 2
                    },
                    "revenue_by_channel": [{"channel": "Shopify", "revenue": 70000}]
                }))
            }),
        )
        .route(
            "/qualitative/connectors",
            get(|| async {
                Json(json!({"connectors": [
                    {"name": "Meta Ads", "type": "advertising", "platform": "Facebook & Instagram",
                     "status": "connected", "campaigns": 3, "spend": 1500, "revenue": 4650, "roas": 3.1},
                    {"name": "Google Analytics", "type": "analytics", "status": "connected"}
                ]}))
            }),
        );
    Router::new().nest("/api", api).with_state(stub)
}

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/api/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Stub backend did not become ready within 5 seconds");
}

/// Start the stub backend and return its API base URL.
async fn start_stub(stub: Stub) -> String {
    let port = find_free_port();
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(stub)).await.ok();
    });
    wait_for_server(port).await;
    format!("http://127.0.0.1:{}/api", port)
}

fn transport(base_url: &str) -> Arc<dyn Transport> {
    Arc::new(HttpTransport::new(&Config::with_base_url(base_url)).unwrap())
}

// ─── Library over HTTP ──────────────────────────────────────────────

#[tokio::test]
async fn test_email_inbox_over_http() {
    let base = start_stub(Stub::default()).await;
    let transport = transport(&base);
    let cfg = Config::with_base_url(&base);
    let mut dash = Dashboard::new(
        EmailScreen::new(transport.clone(), &cfg),
        DataFetcher::new(transport),
    );

    assert!(dash.activate(EmailTab::Inbox).await.is_applied());
    let screen = dash.screen_mut();
    assert_eq!(screen.emails.len(), 3);
    assert_eq!(screen.stats.as_ref().unwrap().total_emails, 3);

    screen.emails.set_filter(Filter::Only("urgent".into()));
    let ids: Vec<&str> = screen.emails.derived().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["email_001"]);
    assert!(screen.emails.select(&"email_001".to_string()));
    assert_eq!(
        screen.emails.selected().unwrap().ai_reply,
        "Your order ships tomorrow."
    );
}

#[tokio::test]
async fn test_train_tab_loads_documents_and_saves() {
    let stub = Stub::default();
    let base = start_stub(stub.clone()).await;
    let transport = transport(&base);
    let cfg = Config::with_base_url(&base);
    let mut dash = Dashboard::new(
        EmailScreen::new(transport.clone(), &cfg),
        DataFetcher::new(transport),
    );

    assert!(dash.activate(EmailTab::Train).await.is_applied());
    let screen = dash.screen();
    assert_eq!(screen.knowledge_base.text(), "Returns within 30 days.");
    assert_eq!(screen.instructions.text(), "Be polite.");
    assert_eq!(screen.connectors.len(), 2);

    screen.instructions.edit("Be polite and brief.");
    assert_eq!(screen.instructions.save().await, SaveOutcome::Saved);
    assert_eq!(screen.instructions.save_state(), SaveState::Saved);
    assert_eq!(
        stub.posts_to("/bot/instructions"),
        vec![json!({"instructions": "Be polite and brief."})]
    );
}

#[tokio::test]
async fn test_failed_fetch_keeps_last_good_state() {
    let base = start_stub(Stub::default()).await;
    let transport = transport(&base);
    let cfg = Config::with_base_url(&base);
    let mut dash = Dashboard::new(
        EcomAgentScreen::new(transport.clone(), &cfg),
        DataFetcher::new(transport),
    );
    dash.screen().knowledge_base.load("previous");

    // The knowledge base read succeeds but connectors return 500, so neither
    // is committed.
    assert!(!dash.activate(EcomTab::Connectors).await.is_applied());
    assert_eq!(dash.screen().knowledge_base.text(), "previous");
    assert!(dash.screen().connectors.is_empty());
}

#[tokio::test]
async fn test_save_failure_reports_error_state() {
    let base = start_stub(Stub::default()).await;
    let doc = DocumentSync::new(
        DocumentKind::EcomKnowledgeBase,
        transport(&base),
        std::time::Duration::from_secs(60),
    );
    doc.edit("new catalog");

    assert!(matches!(doc.save().await, SaveOutcome::Failed(_)));
    assert_eq!(doc.save_state(), SaveState::Error);
    assert_eq!(doc.text(), "new catalog");
}

#[tokio::test]
async fn test_chat_sends_prior_history() {
    let stub = Stub::default();
    let base = start_stub(stub.clone()).await;
    let chat = ChatSession::new(ChatEndpoint::Bot, transport(&base));

    assert_eq!(chat.send("hello").await, SendOutcome::Replied);
    assert_eq!(chat.send("again").await, SendOutcome::Replied);

    let transcript = chat.transcript();
    assert_eq!(transcript.len(), 4);
    assert_eq!(transcript[3].role, ChatRole::Assistant);
    assert_eq!(transcript[3].message, "echo: again");

    let posts = stub.posts_to("/bot/chat");
    assert_eq!(posts[0]["conversation_history"], json!([]));
    assert_eq!(
        posts[1]["conversation_history"],
        json!([
            {"role": "user", "message": "hello"},
            {"role": "assistant", "message": "echo: hello"}
        ])
    );
}

#[tokio::test]
async fn test_chat_failure_appends_fallback() {
    let base = start_stub(Stub::default()).await;
    let chat = ChatSession::new(ChatEndpoint::EcomAgent, transport(&base));

    assert_eq!(chat.send("best campaign?").await, SendOutcome::FellBack);
    let last = chat.last().unwrap();
    assert_eq!(last.role, ChatRole::Assistant);
    assert_eq!(last.message, FALLBACK_REPLY);
    assert!(!chat.is_pending());
}

// ─── CLI ────────────────────────────────────────────────────────────

fn dash_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("dash");
    path
}

async fn run_dash(args: &[&str]) -> (String, String, bool) {
    let binary = dash_binary();
    let output = tokio::process::Command::new(&binary)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .await
        .unwrap_or_else(|e| panic!("Failed to run dash binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

#[tokio::test]
async fn test_cli_emails_with_filter_and_selection() {
    let base = start_stub(Stub::default()).await;
    let (stdout, stderr, success) = run_dash(&[
        "--base-url",
        &base,
        "emails",
        "--filter",
        "urgent",
        "--select",
        "email_001",
    ])
    .await;

    assert!(success, "emails failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("filter: urgent  (1 of 3)"));
    assert!(stdout.contains("Where is my order?"));
    assert!(!stdout.contains("WIN NOW"));
    assert!(stdout.contains("AI reply:\nYour order ships tomorrow."));
}

#[tokio::test]
async fn test_cli_config_file() {
    let base = start_stub(Stub::default()).await;
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("dash.toml");
    fs::write(
        &config_path,
        format!("[api]\nbase_url = \"{}\"\n\n[sync]\nrevert_after_ms = 500\n", base),
    )
    .unwrap();

    let (stdout, stderr, success) = run_dash(&[
        "--config",
        config_path.to_str().unwrap(),
        "connectors",
        "--source",
        "qualitative",
        "--filter",
        "advertising",
    ])
    .await;

    assert!(success, "connectors failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Meta Ads"));
    assert!(!stdout.contains("Google Analytics"));
}

#[tokio::test]
async fn test_cli_qualitative_connector_metrics() {
    let base = start_stub(Stub::default()).await;
    let (stdout, stderr, success) =
        run_dash(&["--base-url", &base, "connectors", "--source", "qualitative"]).await;

    assert!(success, "connectors failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains(
        "platform: Facebook & Instagram · campaigns: 3 · spend: 1500 · revenue: 4650 · roas: 3.1"
    ));
    assert!(stdout.contains("Google Analytics"));
}

#[tokio::test]
async fn test_cli_dashboard_overview() {
    let base = start_stub(Stub::default()).await;
    let (stdout, stderr, success) = run_dash(&["--base-url", &base, "dashboard"]).await;

    assert!(success, "dashboard failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Total revenue:   125000.5"));
    assert!(stdout.contains("Orders:          840"));
    assert!(stdout.contains("ROAS:            3.4"));
    assert!(stdout.contains("Low stock:       2"));
    assert!(stdout.contains("\"revenue_by_channel\""));
    assert!(!stdout.contains("\"overview\""));
}

#[tokio::test]
async fn test_cli_doc_save() {
    let stub = Stub::default();
    let base = start_stub(stub.clone()).await;
    let (stdout, stderr, success) =
        run_dash(&["--base-url", &base, "doc", "save", "kb", "--text", "New policy."]).await;

    assert!(success, "doc save failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("bot knowledge base: saved"));
    assert_eq!(
        stub.posts_to("/bot/knowledge-base"),
        vec![json!({"content": "New policy."})]
    );
}

#[tokio::test]
async fn test_cli_fetch_failure_is_not_fatal() {
    let base = start_stub(Stub::default()).await;
    let (stdout, stderr, success) =
        run_dash(&["--base-url", &base, "connectors", "--source", "ecom"]).await;

    assert!(success, "connectors failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("No connectors."));
    assert!(
        stderr.contains("server returned 500"),
        "expected the status in the log: {}",
        stderr
    );
}

#[tokio::test]
async fn test_cli_missing_config_errors() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.toml");
    let (_, stderr, success) = run_dash(&["--config", missing.to_str().unwrap(), "stats"]).await;

    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}

#[tokio::test]
async fn test_cli_rejects_bad_base_url() {
    let (_, stderr, success) = run_dash(&["--base-url", "localhost:8000", "stats"]).await;

    assert!(!success);
    assert!(stderr.contains("must start with http://"));
}
