//! Core data models shared by the dashboard screens.
//!
//! Records are immutable snapshots received from the backend. A fetch never
//! patches a record in place; it replaces the whole collection.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt::Debug;

/// An item displayed by a screen, with a stable identity and a discriminator
/// field that filters compare against.
pub trait Record: Clone {
    type Key: Eq + Clone + Debug;

    fn key(&self) -> Self::Key;

    fn discriminator(&self) -> &str;
}

// ═══════════════════════════════════════════════════════════════════════
// Email
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Normal,
    Urgent,
    Angry,
    Spam,
    Handover,
    #[serde(other)]
    Other,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Normal => "normal",
            Sentiment::Urgent => "urgent",
            Sentiment::Angry => "angry",
            Sentiment::Spam => "spam",
            Sentiment::Handover => "handover",
            Sentiment::Other => "other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Email {
    pub id: String,
    pub from: String,
    #[serde(default)]
    pub from_name: String,
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub sentiment: Sentiment,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub ai_reply: String,
}

impl Record for Email {
    type Key = String;

    fn key(&self) -> String {
        self.id.clone()
    }

    fn discriminator(&self) -> &str {
        self.sentiment.as_str()
    }
}

/// Accepts RFC 3339 with an offset, or a naive ISO timestamp taken as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("bad timestamp: {raw}")))
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SentimentBreakdown {
    pub normal: u64,
    pub urgent: u64,
    pub angry: u64,
    pub spam: u64,
    pub handover: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailStats {
    pub total_emails: u64,
    pub total_replied: u64,
    pub avg_response_time_minutes: f64,
    pub sentiment_breakdown: SentimentBreakdown,
    pub ai_reply_accuracy: f64,
    pub customer_satisfaction: f64,
}

// ═══════════════════════════════════════════════════════════════════════
// Connector
// ═══════════════════════════════════════════════════════════════════════

/// A backend data source. The qualitative endpoint adds analytics fields
/// (spend, revenue, roas, ...) which are kept verbatim in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub records: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Connector {
    pub fn is_connected(&self) -> bool {
        self.status == "connected"
    }
}

impl Record for Connector {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }

    fn discriminator(&self) -> &str {
        &self.kind
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Chat
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    #[serde(alias = "bot")]
    Assistant,
}

/// One turn of a chat transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub role: ChatRole,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<String>>,
}

impl ChatEntry {
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            message: message.into(),
            sources: None,
        }
    }

    pub fn assistant(message: impl Into<String>, sources: Option<Vec<String>>) -> Self {
        Self {
            role: ChatRole::Assistant,
            message: message.into(),
            sources,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Wire payloads
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub struct EmailsPayload {
    pub emails: Vec<Email>,
    #[serde(default)]
    pub email_statistics: EmailStats,
}

#[derive(Debug, Deserialize)]
pub struct KnowledgeBasePayload {
    pub knowledge_base: String,
}

#[derive(Debug, Deserialize)]
pub struct InstructionsPayload {
    pub instructions: String,
}

#[derive(Debug, Deserialize)]
pub struct ConnectorsPayload {
    pub connectors: Vec<Connector>,
}

/// A history turn as sent to the chat endpoints. Sources are never echoed back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryTurn {
    pub role: ChatRole,
    pub message: String,
}

impl From<&ChatEntry> for HistoryTurn {
    fn from(entry: &ChatEntry) -> Self {
        Self {
            role: entry.role,
            message: entry.message.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub conversation_history: Vec<HistoryTurn>,
}

#[derive(Debug, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub sources: Option<Vec<String>>,
}
