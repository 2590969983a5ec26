//! Domain models for Tally

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Argon2id hash of the password; never serialized into API responses
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Transaction kind - money in or money out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Income,
    Expense,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

impl std::str::FromStr for TxKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            _ => Err(format!("Unknown transaction kind: {}", s)),
        }
    }
}

impl std::fmt::Display for TxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A money movement owned by a single user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub amount: f64,
    pub kind: TxKind,
    pub category: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a transaction
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    pub amount: f64,
    pub kind: TxKind,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: NaiveDate,
}

/// Payload for updating a transaction; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTransaction {
    pub amount: Option<f64>,
    pub kind: Option<TxKind>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
}

/// Expense total for one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpending {
    pub name: String,
    pub value: f64,
}

/// Expense total for one calendar month, labeled "M/YYYY"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub name: String,
    pub expense: f64,
}

/// Month-over-month expense comparison
///
/// `percent_change` is None when last month had no expenses - there is
/// no meaningful percentage to report in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthComparison {
    pub this_month: f64,
    pub last_month: f64,
    pub difference: f64,
    pub percent_change: Option<f64>,
}

/// Aggregated view of a user's finances, recomputed on every request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Income total for the current calendar month
    pub income: f64,
    /// Expense total for the current calendar month
    pub expense: f64,
    /// income - expense, exactly
    pub savings: f64,
    /// Expense totals per category across the full history
    pub category_breakdown: Vec<CategorySpending>,
    /// Expense totals per calendar month, chronological ascending
    pub monthly_trend: Vec<TrendPoint>,
    pub month_comparison: MonthComparison,
    /// Three most recently created transactions (dashboard display only;
    /// excluded from the fingerprint)
    pub recent: Vec<Transaction>,
}

/// The fixed set of AI advice features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdviceKind {
    Summary,
    Insights,
    Budget,
    MonthlySummary,
    Anomaly,
}

impl AdviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Insights => "insights",
            Self::Budget => "budget",
            Self::MonthlySummary => "monthly-summary",
            Self::Anomaly => "anomaly",
        }
    }

    /// Name of the single JSON field each advice endpoint responds with
    pub fn response_field(&self) -> &'static str {
        match self {
            Self::Summary | Self::MonthlySummary => "summary",
            Self::Insights => "insights",
            Self::Budget => "budget",
            Self::Anomaly => "anomalies",
        }
    }
}

impl std::fmt::Display for AdviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A cached AI response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub cache_key: String,
    pub user_id: i64,
    pub endpoint: String,
    pub stats_hash: String,
    pub response: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Chat participant role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for ChatRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(format!("Unknown chat role: {}", s)),
        }
    }
}

/// One turn in the finance chat, append-only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub user_id: i64,
    pub session_id: String,
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A day flagged by the spending anomaly detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// Day in YYYY-MM-DD form
    pub day: String,
    /// Total expense on that day
    pub amount: f64,
    pub message: String,
}
