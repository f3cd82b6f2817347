//! Shared data models for person queries, candidates, exclusions, and
//! the persisted search/result/batch records.
//!
//! These types form the stable JSON API surface used by the CLI and
//! the HTTP surface.

use serde::{Deserialize, Serialize};

/// Schema version for result JSON payloads.
pub const SEARCH_RESULT_VERSION: &str = "1.0.0";

/// Status of a single persisted result in the match lifecycle (§4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl ResultStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultStatus::Pending => "pending",
            ResultStatus::Confirmed => "confirmed",
            ResultStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "pending" => Ok(ResultStatus::Pending),
            "confirmed" => Ok(ResultStatus::Confirmed),
            "rejected" => Ok(ResultStatus::Rejected),
            other => anyhow::bail!("unknown result status: {other}"),
        }
    }
}

/// Scope of an exclusion rule (§3, §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExclusionScope {
    PerQuery,
    Global,
}

impl ExclusionScope {
    pub fn as_str(self) -> &'static str {
        match self {
            ExclusionScope::PerQuery => "per-query",
            ExclusionScope::Global => "global",
        }
    }

    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "per-query" => Ok(ExclusionScope::PerQuery),
            "global" => Ok(ExclusionScope::Global),
            other => anyhow::bail!("unknown exclusion scope: {other}"),
        }
    }
}

/// Which third-party search provider produced a candidate (§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Serper,
    Serpapi,
    Google,
    /// A native funeral-home/obituary-host source, as distinct from a
    /// general web search hit. Used by dedup (§4.4) to prefer
    /// structured fields from native sources.
    Native,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Serper => "serper",
            ProviderKind::Serpapi => "serpapi",
            ProviderKind::Google => "google",
            ProviderKind::Native => "native",
        }
    }
}

/// A person query (input), as described in §3.
///
/// Required: `last`, and at least one of `first`/`nickname`. All other
/// fields are optional refinements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonQuery {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub nickname: Option<String>,
    pub last_name: String,
    pub age: Option<f64>,
    pub city: Option<String>,
    pub state: Option<String>,
    /// Comma-separated keywords, normalized downstream (§4.1).
    pub keywords: Option<String>,
    /// ISO date the query was entered/last aged from (§9 open question).
    /// Missing is treated as "today"; future dates are rejected.
    pub input_date: Option<String>,
}

/// The normalized form of a `PersonQuery`, produced by `normalize::normalize_query`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedQuery {
    pub first_norm: Option<String>,
    pub middle_norm: Option<String>,
    pub last_norm: String,
    pub city_norm: Option<String>,
    pub state_norm: Option<String>,
    pub age: Option<i64>,
    pub keywords: Vec<String>,
    pub input_date: chrono::NaiveDate,
    /// Deterministic 16-hex-char search key (§3).
    pub search_key: String,
}

/// A structured candidate/result extracted from a single source URL (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Opaque identifier allocated at candidate creation (§9); not
    /// cryptographically unique, only used to correlate within a run.
    pub id: String,

    pub name_full: Option<String>,
    pub name_first: Option<String>,
    pub name_last: Option<String>,
    pub age: Option<i64>,
    pub dod: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,

    pub source: String,
    pub url: String,
    pub snippet: String,
    pub title: String,
    pub provider: ProviderKind,
    pub image_url: Option<String>,

    pub date_visitation: Option<String>,
    pub date_funeral: Option<String>,

    #[serde(default)]
    pub also_found_at: Vec<String>,

    #[serde(default)]
    pub scores: CriteriaScores,
    pub score_final: i64,
    pub score_max: i64,
    pub criteria_cnt: i64,
    pub rank: i64,

    #[serde(default)]
    pub is_read: bool,
    pub status: ResultStatus,
    /// UTC timestamp (RFC 3339) of the batch/search run that produced
    /// this candidate (§3).
    pub ran_dt: String,
}

impl Candidate {
    /// Fingerprint per §6: `last-firstInitial-city-state-dod`, lowercased,
    /// hyphen-joined, missing components rendered as the literal `unknown`.
    pub fn fingerprint(&self) -> String {
        crate::fingerprint::fingerprint(
            self.name_last.as_deref(),
            self.name_first.as_deref(),
            self.city.as_deref(),
            self.state.as_deref(),
            self.dod.as_deref(),
        )
    }
}

/// Per-criterion scores for a candidate (§4.5). `None` means the
/// criterion was not scorable because an input was absent on either side.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CriteriaScores {
    pub last_name: Option<i64>,
    pub first_name: Option<i64>,
    pub state: Option<i64>,
    pub city: Option<i64>,
    pub age: Option<i64>,
    pub keywords: Option<i64>,
}

impl CriteriaScores {
    pub fn iter(&self) -> impl Iterator<Item = Option<i64>> {
        [
            self.last_name,
            self.first_name,
            self.state,
            self.city,
            self.age,
            self.keywords,
        ]
        .into_iter()
    }

    pub fn sum(&self) -> i64 {
        self.iter().flatten().sum()
    }

    pub fn count(&self) -> i64 {
        self.iter().flatten().count() as i64
    }
}

/// A suppression rule (§3, §4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exclusion {
    pub id: i64,
    pub scope: ExclusionScope,
    pub search_key: Option<String>,
    pub fingerprint_excluded: Option<String>,
    pub url_excluded: Option<String>,
    pub name_excluded: Option<String>,
    pub reason: Option<String>,
    pub created_at: String,
}

/// Input to `ExclusionStore::add` (§4.7).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewExclusion {
    pub scope: Option<ExclusionScope>,
    pub search_key: Option<String>,
    pub fingerprint: Option<String>,
    pub url: Option<String>,
    pub name: Option<String>,
    pub reason: Option<String>,
}

/// Aggregate counters returned by `ExclusionStore::stats`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ExclusionStats {
    pub total: i64,
    pub per_query: i64,
    pub global: i64,
}

/// The persisted form of a person query plus ownership (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserQuery {
    pub id: i64,
    pub login_id: String,
    pub query: PersonQuery,
    pub search_key: String,
    pub disabled: bool,
    pub confirmed: bool,
    pub confirmed_at: Option<String>,
}

/// A record of one daily sweep (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: i64,
    pub input_file: Option<String>,
    pub created_at: String,
    pub total_queries: i64,
    pub total_results: i64,
}

/// Per-query error captured during a batch sweep (§4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchQueryError {
    pub user_query_id: i64,
    pub message: String,
}

/// Counters emitted by one batch sweep (§4.9).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchMetrics {
    pub queries_run: i64,
    pub new_results_inserted: i64,
    pub provider_calls: i64,
    pub enrichment_fetches: i64,
    pub errors: Vec<BatchQueryError>,
}

/// Per-user summary of newly-pending, unread results after a sweep (§4.9).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserNotification {
    pub login_id: String,
    pub searches: Vec<SearchNotification>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchNotification {
    pub user_query_id: i64,
    pub unread_count: i64,
}

/// Outcome of one batch sweep: the batch record, aggregate metrics,
/// and the notification summary handed to the (external) notifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub batch: Batch,
    pub metrics: BatchMetrics,
    pub notifications: Vec<UserNotification>,
}

/// Outcome of a single search (immediate or batch-driven): ranked
/// candidates plus the search key the engine computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub version: String,
    pub search_key: String,
    pub results: Vec<Candidate>,
}
