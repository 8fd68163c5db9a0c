use serde::{Deserialize, Serialize};

use crate::error::FaerscopeError;
use crate::resolve::{relevance, retrieve, synonyms};
use crate::sources::openfda::OpenFdaClient;
use crate::transform;

const MIN_NAME_LEN: usize = 2;
const MAX_NAME_LEN: usize = 100;

const DEFAULT_MAX_RESULTS: usize = 100;
const MAX_MAX_RESULTS: usize = 1000;

const DISCLAIMER: &str = "FAERS reports are spontaneous submissions and do not establish \
causation; rates cannot be computed from report counts.";
const NO_RESULTS_DISCLAIMER: &str = "No adverse-event reports matched this substance. Absence \
of reports does not imply absence of risk; the name may also be indexed under a different \
synonym.";

/// Options for an adverse-event query.
#[derive(Debug, Clone, Default)]
pub struct AdverseEventOptions {
    /// Result budget for retrieval; defaults to 100, clamped to 1..=1000.
    pub max_results: Option<usize>,
    /// Externally sourced synonyms (e.g. from a compound identity database)
    /// merged into the expansion; CAS numbers and non-name tokens are
    /// filtered out.
    pub synonyms: Vec<String>,
}

/// One reaction on a report, with the FAERS outcome decoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionDetail {
    pub term: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    pub severity: String,
}

/// One (report, matched drug) pair: the externally consumed result row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrugReaction {
    pub report_id: String,
    pub medication: String,
    pub generic_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reactions: Vec<ReactionDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reporter_country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    pub serious: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionFrequency {
    pub reaction: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactionStats {
    pub total_events: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub top_reactions: Vec<ReactionFrequency>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdverseEventMeta {
    pub total: usize,
    pub disclaimer: String,
}

/// Response envelope for the service layer. `success` is part of the wire
/// contract consumed downstream; Rust callers get failures as `Err` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdverseEventsResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<DrugReaction>,
    pub meta: AdverseEventMeta,
    pub stats: ReactionStats,
}

fn validate_name(name: &str) -> Result<&str, FaerscopeError> {
    let name = name.trim();
    if name.len() < MIN_NAME_LEN || name.len() > MAX_NAME_LEN {
        return Err(FaerscopeError::InvalidArgument(format!(
            "drug name must be between {MIN_NAME_LEN} and {MAX_NAME_LEN} characters"
        )));
    }
    Ok(name)
}

/// Resolves a free-text drug name into adverse-event evidence.
///
/// Pipeline: synonym expansion → multi-strategy retrieval with
/// deduplication → weighted relevance filtering → per-drug reaction
/// projection with aggregate statistics.
///
/// Zero matches is a successful response with empty `results` and an
/// explanatory disclaimer; only invalid input and unrecoverable transport
/// setup failures return `Err`.
pub async fn get_adverse_events(
    name: &str,
    options: &AdverseEventOptions,
) -> Result<AdverseEventsResponse, FaerscopeError> {
    let name = validate_name(name)?;
    let client = OpenFdaClient::new()?;
    get_adverse_events_with_client(&client, name, options).await
}

pub(crate) async fn get_adverse_events_with_client(
    client: &OpenFdaClient,
    name: &str,
    options: &AdverseEventOptions,
) -> Result<AdverseEventsResponse, FaerscopeError> {
    let name = validate_name(name)?;
    let synonym_set = synonyms::expand(name, &options.synonyms);
    let max_results = options
        .max_results
        .unwrap_or(DEFAULT_MAX_RESULTS)
        .clamp(1, MAX_MAX_RESULTS);

    let pool = retrieve::retrieve(client, &synonym_set, max_results).await;
    let relevant = relevance::filter_relevant(pool, &synonym_set);
    let results = transform::adverse_event::project_reactions(&relevant, name);
    let stats = transform::adverse_event::summarize_reactions(relevant.len(), &results);

    let disclaimer = if results.is_empty() {
        NO_RESULTS_DISCLAIMER
    } else {
        DISCLAIMER
    };

    Ok(AdverseEventsResponse {
        success: true,
        meta: AdverseEventMeta {
            total: results.len(),
            disclaimer: disclaimer.to_string(),
        },
        results,
        stats,
    })
}
