use std::collections::HashMap;

use tracing::{debug, warn};

use crate::resolve::query;
use crate::sources::openfda::{FaersEventResult, OpenFdaClient};

/// Result budget for each narrow per-synonym query.
const SINGLE_TERM_BUDGET: usize = 200;

/// Result budget for the legacy-field query.
const FIELD_SPECIFIC_BUDGET: usize = 300;

/// How many synonyms get their own targeted query.
const SINGLE_TERM_STRATEGY_LIMIT: usize = 5;

/// One independent retrieval approach. The strategies deliberately overlap:
/// each one reaches reports the others miss, and the registry deduplicates
/// the union.
#[derive(Debug, Clone)]
pub(crate) enum SearchStrategy {
    /// Broad weighted-field expression across the whole synonym set.
    Expanded,
    /// Narrow query for one synonym over the reliable name fields.
    SingleTerm(String),
    /// Legacy product-name fields across the whole synonym set.
    FieldSpecific,
}

impl SearchStrategy {
    fn query(&self, synonyms: &[String]) -> String {
        match self {
            Self::Expanded => query::build_expanded_query(synonyms),
            Self::SingleTerm(synonym) => query::build_single_term_query(synonym),
            Self::FieldSpecific => query::build_field_specific_query(synonyms),
        }
    }

    fn budget(&self, max_results: usize) -> usize {
        match self {
            Self::Expanded => max_results.min(crate::sources::openfda::OPENFDA_MAX_PAGE_SIZE),
            Self::SingleTerm(_) => SINGLE_TERM_BUDGET,
            Self::FieldSpecific => FIELD_SPECIFIC_BUDGET,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Expanded => "expanded",
            Self::SingleTerm(_) => "single-term",
            Self::FieldSpecific => "field-specific",
        }
    }
}

/// Insertion-ordered report registry used to merge strategy results.
/// First-seen wins: a report id already present keeps its original record.
#[derive(Default)]
pub(crate) struct EventRegistry {
    order: Vec<String>,
    by_id: HashMap<String, FaersEventResult>,
}

impl EventRegistry {
    pub(crate) fn insert(&mut self, event: FaersEventResult) {
        let id = event.safetyreportid.clone();
        if id.is_empty() || self.by_id.contains_key(&id) {
            return;
        }
        self.order.push(id.clone());
        self.by_id.insert(id, event);
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn into_events(mut self) -> Vec<FaersEventResult> {
        self.order
            .iter()
            .filter_map(|id| self.by_id.remove(id))
            .collect()
    }
}

/// Runs the retrieval strategies in order, merging results by report id and
/// stopping as soon as the registry holds `max_results` events.
///
/// Strategies execute sequentially, not concurrently: each one paginates
/// against the same upstream service, and the early-exit check between
/// strategies keeps the total load bounded. Failures inside a strategy have
/// already been degraded to partial results by the paginated fetcher.
pub(crate) async fn retrieve(
    client: &OpenFdaClient,
    synonyms: &[String],
    max_results: usize,
) -> Vec<FaersEventResult> {
    let mut strategies: Vec<SearchStrategy> = vec![SearchStrategy::Expanded];
    strategies.extend(
        synonyms
            .iter()
            .take(SINGLE_TERM_STRATEGY_LIMIT)
            .map(|s| SearchStrategy::SingleTerm(s.clone())),
    );
    strategies.push(SearchStrategy::FieldSpecific);

    let mut registry = EventRegistry::default();
    for strategy in strategies {
        if registry.len() >= max_results {
            break;
        }

        let query = strategy.query(synonyms);
        if query.is_empty() {
            warn!(strategy = strategy.label(), "strategy produced an empty query; skipping");
            continue;
        }

        let budget = strategy.budget(max_results);
        let events = client.fetch_paginated(&query, budget).await;
        debug!(
            strategy = strategy.label(),
            fetched = events.len(),
            merged = registry.len(),
            "strategy finished"
        );
        for event in events {
            registry.insert(event);
        }
    }

    let mut events = registry.into_events();
    events.truncate(max_results);
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param, query_param_contains};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn event(id: &str) -> FaersEventResult {
        FaersEventResult {
            safetyreportid: id.into(),
            ..Default::default()
        }
    }

    fn body(ids: &[&str]) -> serde_json::Value {
        let results: Vec<serde_json::Value> = ids
            .iter()
            .map(|id| serde_json::json!({"safetyreportid": id}))
            .collect();
        serde_json::json!({
            "meta": {"results": {"skip": 0, "limit": results.len(), "total": results.len()}},
            "results": results
        })
    }

    #[test]
    fn registry_keeps_first_seen_record_per_id() {
        let mut registry = EventRegistry::default();
        let mut first = event("100");
        first.serious = Some("1".into());
        registry.insert(first);
        registry.insert(event("100"));
        registry.insert(event("200"));

        assert_eq!(registry.len(), 2);
        let events = registry.into_events();
        assert_eq!(events[0].safetyreportid, "100");
        assert_eq!(events[0].serious.as_deref(), Some("1"));
        assert_eq!(events[1].safetyreportid, "200");
    }

    #[test]
    fn registry_ignores_events_without_report_id() {
        let mut registry = EventRegistry::default();
        registry.insert(event(""));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn strategy_budgets_follow_the_retrieval_plan() {
        assert_eq!(SearchStrategy::Expanded.budget(100), 100);
        assert_eq!(SearchStrategy::Expanded.budget(5000), 1000);
        assert_eq!(SearchStrategy::SingleTerm("aspirin".into()).budget(100), 200);
        assert_eq!(SearchStrategy::FieldSpecific.budget(100), 300);
    }

    #[tokio::test]
    async fn retrieve_merges_overlapping_strategies_by_report_id() {
        let server = MockServer::start().await;
        // Broad expanded query: mentions the contextual indication field.
        Mock::given(method("GET"))
            .and(path("/drug/event.json"))
            .and(query_param_contains("search", "drugindication"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body(&["1", "2"])))
            .mount(&server)
            .await;
        // Narrow per-synonym and field-specific queries overlap with it.
        Mock::given(method("GET"))
            .and(path("/drug/event.json"))
            .and(query_param_contains("search", "activesubstancename"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body(&["3"])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/drug/event.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body(&["2", "3"])))
            .mount(&server)
            .await;

        let client = OpenFdaClient::new_for_test(server.uri(), None).unwrap();
        let synonyms = vec!["aspirin".to_string()];
        let events = retrieve(&client, &synonyms, 100).await;

        let ids: Vec<&str> = events.iter().map(|e| e.safetyreportid.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[tokio::test]
    async fn retrieve_stops_once_budget_is_reached() {
        let server = MockServer::start().await;
        // Only the expanded strategy should ever run: it alone fills the
        // budget, so the per-synonym and field-specific strategies are skipped.
        Mock::given(method("GET"))
            .and(path("/drug/event.json"))
            .and(query_param("limit", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body(&["1", "2"])))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenFdaClient::new_for_test(server.uri(), None).unwrap();
        let synonyms = vec!["aspirin".to_string()];
        let events = retrieve(&client, &synonyms, 2).await;
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn retrieve_survives_a_failing_strategy() {
        let server = MockServer::start().await;
        // Expanded strategy gets garbage; later strategies still run.
        Mock::given(method("GET"))
            .and(path("/drug/event.json"))
            .and(query_param_contains("search", "drugindication"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/drug/event.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body(&["7"])))
            .mount(&server)
            .await;

        let client = OpenFdaClient::new_for_test(server.uri(), None).unwrap();
        let synonyms = vec!["aspirin".to_string()];
        let events = retrieve(&client, &synonyms, 50).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].safetyreportid, "7");
    }
}
