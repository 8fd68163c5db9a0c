use std::borrow::Cow;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::FaerscopeError;

const OPENFDA_BASE: &str = "https://api.fda.gov";
const OPENFDA_API: &str = "openfda";
const OPENFDA_BASE_ENV: &str = "FAERSCOPE_OPENFDA_BASE";

/// Maximum page size accepted by the openFDA search endpoints.
pub(crate) const OPENFDA_MAX_PAGE_SIZE: usize = 1000;

const MAX_QUERY_BYTES: usize = 16 * 1024;

pub(crate) struct OpenFdaClient {
    client: reqwest_middleware::ClientWithMiddleware,
    base: Cow<'static, str>,
    api_key: Option<String>,
    page_size: usize,
}

impl OpenFdaClient {
    pub(crate) fn new() -> Result<Self, FaerscopeError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: crate::sources::env_base(OPENFDA_BASE, OPENFDA_BASE_ENV),
            api_key: crate::sources::openfda_api_key(),
            page_size: OPENFDA_MAX_PAGE_SIZE,
        })
    }

    #[cfg(test)]
    pub(crate) fn new_for_test(
        base: String,
        api_key: Option<String>,
    ) -> Result<Self, FaerscopeError> {
        Ok(Self {
            client: crate::sources::shared_client()?,
            base: Cow::Owned(base),
            api_key: api_key
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            page_size: OPENFDA_MAX_PAGE_SIZE,
        })
    }

    #[cfg(test)]
    pub(crate) fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base.as_ref().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub(crate) fn escape_query_value(value: &str) -> String {
        crate::utils::query::escape_lucene_value(value)
    }

    async fn get_json_optional<T: DeserializeOwned>(
        &self,
        req: reqwest_middleware::RequestBuilder,
    ) -> Result<Option<T>, FaerscopeError> {
        let resp = crate::sources::apply_cache_mode_with_auth(req, self.api_key.is_some())
            .send()
            .await?;
        let status = resp.status();
        let bytes = crate::sources::read_limited_body(resp, OPENFDA_API).await?;

        if status.as_u16() == 404 {
            return Ok(None);
        }

        if !status.is_success() {
            let excerpt = crate::sources::body_excerpt(&bytes);
            return Err(FaerscopeError::Api {
                api: OPENFDA_API.to_string(),
                message: format!("HTTP {status}: {excerpt}"),
            });
        }

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| FaerscopeError::ApiJson {
                api: OPENFDA_API.to_string(),
                source,
            })
    }

    /// Fetches one page of FAERS drug-event reports.
    ///
    /// `Ok(None)` means the endpoint returned 404, which openFDA uses for
    /// "no results at this offset" rather than as an error.
    pub(crate) async fn faers_search(
        &self,
        query: &str,
        limit: usize,
        skip: usize,
    ) -> Result<Option<OpenFdaResponse<FaersEventResult>>, FaerscopeError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(FaerscopeError::InvalidArgument(
                "Search query must not be empty.".into(),
            ));
        }
        if query.len() > MAX_QUERY_BYTES {
            return Err(FaerscopeError::InvalidArgument("Query is too long.".into()));
        }
        if limit == 0 || limit > OPENFDA_MAX_PAGE_SIZE {
            return Err(FaerscopeError::InvalidArgument(format!(
                "limit must be between 1 and {OPENFDA_MAX_PAGE_SIZE}"
            )));
        }

        let url = self.endpoint("drug/event.json");
        let skip = skip.to_string();
        let mut req = self.client.get(&url).query(&[
            ("search", query),
            ("limit", &limit.to_string()),
            ("skip", skip.as_str()),
        ]);
        if let Some(key) = self.api_key.as_deref() {
            req = req.query(&[("api_key", key)]);
        }
        self.get_json_optional(req).await
    }

    /// Accumulates FAERS reports across successive pages up to `max_results`.
    ///
    /// Pagination stops on: budget reached, an empty page, a page shorter than
    /// requested, or a 404 from the endpoint. A transport or decode failure on
    /// any page logs a warning and returns whatever was accumulated so far;
    /// coverage degrades, the pipeline keeps going. Inter-page pacing is
    /// enforced by the rate-limit middleware's openFDA policy.
    pub(crate) async fn fetch_paginated(
        &self,
        query: &str,
        max_results: usize,
    ) -> Vec<FaersEventResult> {
        let mut out: Vec<FaersEventResult> = Vec::new();
        let mut skip = 0usize;

        while out.len() < max_results {
            let remaining = max_results - out.len();
            let limit = remaining.min(self.page_size);

            match self.faers_search(query, limit, skip).await {
                Ok(None) => break,
                Ok(Some(resp)) => {
                    let page_len = resp.results.len();
                    debug!(
                        skip,
                        page_len,
                        total = resp.meta.results.total,
                        "fetched openFDA page"
                    );
                    if page_len == 0 {
                        break;
                    }
                    out.extend(resp.results);
                    if page_len < limit {
                        break;
                    }
                    skip += page_len;
                }
                Err(err) => {
                    warn!(
                        skip,
                        accumulated = out.len(),
                        error = %err,
                        "openFDA page fetch failed; returning partial results"
                    );
                    break;
                }
            }
        }

        out.truncate(max_results);
        out
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenFdaResponse<T> {
    pub meta: OpenFdaMeta,
    pub results: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenFdaMeta {
    pub results: OpenFdaMetaResults,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenFdaMetaResults {
    #[serde(default)]
    #[allow(dead_code)]
    pub skip: usize,
    #[serde(default)]
    #[allow(dead_code)]
    pub limit: usize,
    #[serde(default)]
    pub total: usize,
}

/// One FAERS safety report, keyed by `safetyreportid`.
///
/// Every field except the report id may be absent; the deserialized struct is
/// the single place where openFDA's inconsistent field vocabulary is pinned
/// down into explicit optional fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct FaersEventResult {
    #[serde(default)]
    pub safetyreportid: String,
    #[serde(default)]
    pub serious: Option<String>,
    #[serde(default)]
    pub receivedate: Option<String>,
    #[serde(default)]
    pub seriousnessdeath: Option<String>,
    #[serde(default)]
    pub patient: Option<FaersPatient>,
    #[serde(default)]
    pub primarysource: Option<FaersPrimarySource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct FaersPatient {
    #[serde(default)]
    pub patientonsetage: Option<String>,
    #[serde(default)]
    pub patientonsetageunit: Option<String>,
    #[serde(default)]
    pub patientsex: Option<String>,
    #[serde(default)]
    pub patientweight: Option<String>,
    #[serde(default)]
    pub reaction: Vec<FaersReaction>,
    #[serde(default)]
    pub drug: Vec<FaersDrug>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct FaersReaction {
    #[serde(default)]
    pub reactionmeddrapt: Option<String>,
    #[serde(default)]
    pub reactionoutcome: Option<String>,
}

/// One drug entry on a report: legacy free-text fields alongside the
/// harmonized `openfda` block. Field population is wildly uneven in practice,
/// which is why relevance scoring weighs them individually.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct FaersDrug {
    #[serde(default)]
    pub medicinalproduct: Option<String>,
    #[serde(default)]
    pub drugname: Option<String>,
    #[serde(default)]
    pub drugindication: Option<String>,
    #[serde(default)]
    pub activesubstance: Option<FaersActiveSubstance>,
    #[serde(default)]
    pub openfda: Option<FaersOpenFdaDrug>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct FaersActiveSubstance {
    #[serde(default)]
    pub activesubstancename: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct FaersOpenFdaDrug {
    #[serde(default)]
    pub generic_name: Vec<String>,
    #[serde(default)]
    pub substance_name: Vec<String>,
    #[serde(default)]
    pub brand_name: Vec<String>,
    #[serde(default)]
    pub active_ingredient: Vec<String>,
    #[serde(default)]
    pub manufacturer_name: Vec<String>,
    #[serde(default)]
    pub product_ndc: Vec<String>,
    #[serde(default)]
    pub route: Vec<String>,
    #[serde(default)]
    pub dosage_form: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct FaersPrimarySource {
    #[serde(default)]
    pub reportercountry: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn page_body(ids: std::ops::Range<usize>, total: usize) -> serde_json::Value {
        let results: Vec<serde_json::Value> = ids
            .map(|id| serde_json::json!({"safetyreportid": id.to_string()}))
            .collect();
        serde_json::json!({
            "meta": {"results": {"skip": 0, "limit": results.len(), "total": total}},
            "results": results
        })
    }

    #[test]
    fn escape_query_value_escapes_lucene_special_chars() {
        assert_eq!(
            OpenFdaClient::escape_query_value(r#"co-amoxiclav "DS"\x"#),
            r#"co\-amoxiclav \"DS\"\\x"#
        );
    }

    #[tokio::test]
    async fn faers_search_validates_limit_bounds() {
        let client = OpenFdaClient::new_for_test("http://127.0.0.1".into(), None).unwrap();
        let err = client.faers_search("drug:x", 0, 0).await.unwrap_err();
        assert!(matches!(err, FaerscopeError::InvalidArgument(_)));

        let err = client.faers_search("drug:x", 1001, 0).await.unwrap_err();
        assert!(matches!(err, FaerscopeError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn faers_search_rejects_empty_query() {
        let client = OpenFdaClient::new_for_test("http://127.0.0.1".into(), None).unwrap();
        let err = client.faers_search("  ", 10, 0).await.unwrap_err();
        assert!(matches!(err, FaerscopeError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn faers_search_treats_404_as_end_of_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drug/event.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = OpenFdaClient::new_for_test(server.uri(), None).unwrap();
        let resp = client.faers_search("drug:x", 10, 0).await.unwrap();
        assert!(resp.is_none());
    }

    #[tokio::test]
    async fn faers_search_includes_api_key_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drug/event.json"))
            .and(query_param("api_key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(0..1, 1)))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenFdaClient::new_for_test(server.uri(), Some("test-key".into())).unwrap();
        let resp = client.faers_search("drug:x", 10, 0).await.unwrap();
        assert_eq!(resp.map(|r| r.results.len()), Some(1));
    }

    #[tokio::test]
    async fn fetch_paginated_issues_three_pages_for_250_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drug/event.json"))
            .and(query_param("skip", "0"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(0..100, 250)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/drug/event.json"))
            .and(query_param("skip", "100"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(100..200, 250)))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/drug/event.json"))
            .and(query_param("skip", "200"))
            .and(query_param("limit", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(200..250, 250)))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenFdaClient::new_for_test(server.uri(), None)
            .unwrap()
            .with_page_size(100);
        let events = client.fetch_paginated("drug:x", 1000).await;
        assert_eq!(events.len(), 250);
        assert_eq!(events[0].safetyreportid, "0");
        assert_eq!(events[249].safetyreportid, "249");
    }

    #[tokio::test]
    async fn fetch_paginated_stops_at_requested_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drug/event.json"))
            .and(query_param("skip", "0"))
            .and(query_param("limit", "40"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(0..40, 250)))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenFdaClient::new_for_test(server.uri(), None)
            .unwrap()
            .with_page_size(100);
        let events = client.fetch_paginated("drug:x", 40).await;
        assert_eq!(events.len(), 40);
    }

    #[tokio::test]
    async fn fetch_paginated_returns_partial_results_on_page_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drug/event.json"))
            .and(query_param("skip", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(0..100, 200)))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/drug/event.json"))
            .and(query_param("skip", "100"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = OpenFdaClient::new_for_test(server.uri(), None)
            .unwrap()
            .with_page_size(100);
        let events = client.fetch_paginated("drug:x", 500).await;
        assert_eq!(events.len(), 100);
    }

    #[tokio::test]
    async fn fetch_paginated_handles_404_as_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/drug/event.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = OpenFdaClient::new_for_test(server.uri(), None).unwrap();
        let events = client.fetch_paginated("drug:x", 100).await;
        assert!(events.is_empty());
    }

    #[test]
    fn faers_event_deserializes_sparse_records() {
        let raw = serde_json::json!({
            "safetyreportid": "123",
            "patient": {
                "drug": [
                    {"medicinalproduct": "ASPIRIN."},
                    {"openfda": {"generic_name": ["aspirin"], "route": ["ORAL"]}}
                ],
                "reaction": [{"reactionmeddrapt": "Nausea"}]
            }
        });
        let event: FaersEventResult = serde_json::from_value(raw).unwrap();
        assert_eq!(event.safetyreportid, "123");
        let patient = event.patient.unwrap();
        assert_eq!(patient.drug.len(), 2);
        assert!(patient.drug[0].openfda.is_none());
        assert_eq!(
            patient.drug[1].openfda.as_ref().unwrap().generic_name,
            vec!["aspirin"]
        );
    }
}
