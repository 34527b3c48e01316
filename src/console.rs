//! Terminal rendering of the dashboard screens for the `dash` CLI.
//!
//! Every command builds the screen it needs, activates the relevant tab, and
//! prints the resulting view to stdout. Fetch failures are not errors here:
//! they are logged (stderr) and the screen renders in its last-good state,
//! which for a one-shot command is the empty state.

use anyhow::Result;
use chrono::Utc;
use serde_json::{Map, Value};
use std::io::IsTerminal;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::chat::{ChatEndpoint, ChatSession, SendOutcome};
use crate::config::Config;
use crate::document::{DocumentKind, DocumentSync};
use crate::fetcher::DataFetcher;
use crate::models::{ChatRole, Connector, Email};
use crate::reltime::format_relative;
use crate::screens::{
    Dashboard, EcomAgentScreen, EcomTab, EmailScreen, EmailTab, QualitativeScreen,
    QualitativeTab,
};
use crate::transport::{HttpTransport, Transport};
use crate::view::{Filter, ViewState};

/// Which screen's connector list to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorSource {
    Bot,
    Ecom,
    Qualitative,
}

pub fn connect(config: &Config) -> Result<Arc<dyn Transport>> {
    Ok(Arc::new(HttpTransport::new(config)?))
}

fn email_dashboard(config: &Config, transport: Arc<dyn Transport>) -> Dashboard<EmailScreen> {
    Dashboard::new(
        EmailScreen::new(transport.clone(), config),
        DataFetcher::new(transport),
    )
}

fn ecom_dashboard(config: &Config, transport: Arc<dyn Transport>) -> Dashboard<EcomAgentScreen> {
    Dashboard::new(
        EcomAgentScreen::new(transport.clone(), config),
        DataFetcher::new(transport),
    )
}

// ============ Emails ============

pub async fn run_emails(
    config: &Config,
    filter: Option<String>,
    select: Option<String>,
) -> Result<()> {
    let mut dash = email_dashboard(config, connect(config)?);
    dash.activate(EmailTab::Inbox).await;

    let screen = dash.screen_mut();
    let filter: Filter = filter.as_deref().unwrap_or("all").parse()?;
    screen.emails.set_filter(filter);
    if let Some(id) = select {
        if !screen.emails.select(&id) {
            tracing::warn!(id = %id, "no email with that id");
        }
    }

    print_inbox(&screen.emails);
    if let Some(email) = screen.emails.selected() {
        println!();
        print_email(email);
    }
    Ok(())
}

fn print_inbox(emails: &ViewState<Email>) {
    let view = emails.derived();
    println!(
        "filter: {}  ({} of {})",
        emails.filter(),
        view.len(),
        emails.len()
    );
    if view.is_empty() {
        println!("No emails.");
        return;
    }

    let now = Utc::now();
    println!(
        "{:<10} {:<9} {:<10} {:<24} SUBJECT",
        "ID", "SENTIMENT", "WHEN", "FROM"
    );
    for email in view {
        let marker = if email.read { ' ' } else { '*' };
        println!(
            "{:<10} {:<9} {:<10} {:<24} {}{}",
            truncate(&email.id, 10),
            email.sentiment.as_str(),
            format_relative(email.timestamp, now),
            truncate(display_sender(email), 24),
            marker,
            email.subject
        );
    }

    let counts: Vec<String> = emails
        .counts_by_discriminator()
        .into_iter()
        .map(|(tag, n)| format!("{} {}", tag, n))
        .collect();
    println!("\n{}", counts.join(" · "));
}

fn print_email(email: &Email) {
    println!("From:      {} <{}>", display_sender(email), email.from);
    println!("Subject:   {}", email.subject);
    println!(
        "Received:  {}",
        format_relative(email.timestamp, Utc::now())
    );
    println!("Sentiment: {}", email.sentiment.as_str().to_uppercase());
    println!("\n{}\n", email.body);
    println!("AI reply:\n{}", email.ai_reply);
}

fn display_sender(email: &Email) -> &str {
    if email.from_name.is_empty() {
        &email.from
    } else {
        &email.from_name
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

pub async fn run_stats(config: &Config) -> Result<()> {
    let mut dash = email_dashboard(config, connect(config)?);
    dash.activate(EmailTab::Stats).await;

    let Some(stats) = dash.screen().stats.as_ref() else {
        println!("No statistics available.");
        return Ok(());
    };
    println!("Total emails:          {}", stats.total_emails);
    println!("Replied:               {}", stats.total_replied);
    println!(
        "Avg response time:     {:.1} min",
        stats.avg_response_time_minutes
    );
    println!("AI reply accuracy:     {:.1}%", stats.ai_reply_accuracy);
    println!("Customer satisfaction: {:.1}", stats.customer_satisfaction);
    let b = &stats.sentiment_breakdown;
    println!(
        "Sentiment:             normal {} · urgent {} · angry {} · spam {} · handover {}",
        b.normal, b.urgent, b.angry, b.spam, b.handover
    );
    Ok(())
}

// ============ Connectors & analytics ============

pub async fn run_connectors(
    config: &Config,
    source: ConnectorSource,
    filter: Option<String>,
) -> Result<()> {
    let filter: Filter = filter.as_deref().unwrap_or("all").parse()?;
    let transport = connect(config)?;

    match source {
        ConnectorSource::Bot => {
            let mut dash = email_dashboard(config, transport);
            dash.activate(EmailTab::Train).await;
            let connectors = &mut dash.screen_mut().connectors;
            connectors.set_filter(filter);
            print_connectors(connectors);
        }
        ConnectorSource::Ecom => {
            let mut dash = ecom_dashboard(config, transport);
            dash.activate(EcomTab::Connectors).await;
            let connectors = &mut dash.screen_mut().connectors;
            connectors.set_filter(filter);
            print_connectors(connectors);
        }
        ConnectorSource::Qualitative => {
            let mut dash = Dashboard::new(
                QualitativeScreen::new(config),
                DataFetcher::new(transport),
            );
            dash.activate(QualitativeTab::Connectors).await;
            let connectors = &mut dash.screen_mut().connectors;
            connectors.set_filter(filter);
            print_connectors(connectors);
        }
    }
    Ok(())
}

fn print_connectors(connectors: &ViewState<Connector>) {
    let view = connectors.derived();
    if view.is_empty() {
        println!("No connectors.");
        return;
    }
    println!("{:<22} {:<20} {:<10} RECORDS", "CONNECTOR", "TYPE", "STATUS");
    for c in view {
        let records = c
            .records
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<22} {:<20} {:<10} {}", c.name, c.kind, c.status, records);
        if let Some(description) = &c.description {
            println!("  {}", description);
        }
        if let Some(metrics) = connector_metrics(c) {
            println!("  {}", metrics);
        }
    }
}

/// Platform and performance fields the analytics connectors carry.
const CONNECTOR_METRICS: &[&str] = &[
    "platform",
    "campaigns",
    "spend",
    "revenue",
    "roas",
    "orders",
    "total_revenue",
    "products",
    "total_users",
    "total_sessions",
    "conversion_rate",
];

fn connector_metrics(connector: &Connector) -> Option<String> {
    let parts: Vec<String> = CONNECTOR_METRICS
        .iter()
        .filter_map(|key| {
            let value = connector.extra.get(*key)?;
            Some(format!("{}: {}", key, display_value(value)))
        })
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" · "))
    }
}

/// Strings without quotes; everything else as compact JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub async fn run_dashboard(config: &Config) -> Result<()> {
    let mut dash = Dashboard::new(
        QualitativeScreen::new(config),
        DataFetcher::new(connect(config)?),
    );
    dash.activate(QualitativeTab::Dashboard).await;
    let Some(payload) = &dash.screen().dashboard else {
        println!("No analytics available.");
        return Ok(());
    };

    if let Some(overview) = payload.get("overview") {
        print_overview(overview);
    }
    let details: Map<String, Value> = payload
        .as_object()
        .map(|sections| {
            sections
                .iter()
                .filter(|(key, _)| key.as_str() != "overview")
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect()
        })
        .unwrap_or_default();
    if !details.is_empty() {
        println!("\n{}", serde_json::to_string_pretty(&details)?);
    }
    Ok(())
}

const OVERVIEW_LABELS: &[(&str, &str)] = &[
    ("total_revenue", "Total revenue"),
    ("total_orders", "Orders"),
    ("total_customers", "Customers"),
    ("avg_order_value", "Avg order value"),
    ("overall_roas", "ROAS"),
    ("total_ad_spend", "Ad spend"),
    ("total_products", "Products"),
    ("total_stock", "Stock"),
    ("low_stock_products", "Low stock"),
];

fn print_overview(overview: &Value) {
    for (key, label) in OVERVIEW_LABELS {
        if let Some(value) = overview.get(*key) {
            println!("{:<16} {}", format!("{}:", label), display_value(value));
        }
    }
}

// ============ Documents ============

pub async fn run_doc_show(config: &Config, kind: DocumentKind) -> Result<()> {
    let transport = connect(config)?;
    match kind {
        DocumentKind::EcomKnowledgeBase => {
            let mut dash = ecom_dashboard(config, transport);
            dash.activate(EcomTab::Knowledge).await;
            println!("{}", dash.screen().knowledge_base.text());
        }
        DocumentKind::BotKnowledgeBase | DocumentKind::BotInstructions => {
            let mut dash = email_dashboard(config, transport);
            dash.activate(EmailTab::Train).await;
            if let Some(doc) = dash.screen().document(kind) {
                println!("{}", doc.text());
            }
        }
    }
    Ok(())
}

/// Replace a document with `text` and save it. The whole text is written, so
/// there is no need to fetch the current version first.
pub async fn run_doc_save(config: &Config, kind: DocumentKind, text: String) -> Result<()> {
    let doc = DocumentSync::new(kind, connect(config)?, config.revert_after());
    doc.edit(text);
    doc.save().await;
    println!("{}: {}", kind, doc.save_state());
    Ok(())
}

// ============ Chat ============

pub async fn run_chat(
    config: &Config,
    endpoint: ChatEndpoint,
    message: Option<String>,
) -> Result<()> {
    let chat = ChatSession::new(endpoint, connect(config)?);

    if let Some(message) = message {
        if let SendOutcome::Replied | SendOutcome::FellBack = chat.send(&message).await {
            print_reply(&chat);
        }
        return Ok(());
    }

    let interactive = std::io::stdin().is_terminal();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if interactive {
            eprint!("{}> ", chat.endpoint());
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line == "/quit" || line == "/exit" {
            break;
        }
        chat.set_input(line);
        if let SendOutcome::Replied | SendOutcome::FellBack = chat.submit().await {
            print_reply(&chat);
        }
    }
    Ok(())
}

fn print_reply(chat: &ChatSession) {
    let Some(entry) = chat.last() else {
        return;
    };
    if entry.role != ChatRole::Assistant {
        return;
    }
    println!("{}", entry.message);
    if let Some(sources) = entry.sources.filter(|s| !s.is_empty()) {
        println!("sources: {}", sources.join(", "));
    }
}
