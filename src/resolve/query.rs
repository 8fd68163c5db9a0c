use std::collections::HashSet;

use crate::resolve::fields::{FIELD_WEIGHTS, FieldTier};
use crate::sources::openfda::OpenFdaClient;

/// Cap on the number of disjuncts in one boolean expression, to bound URL
/// length. Higher-trust disjuncts are emitted first, so the cap sheds the
/// weakest clauses.
pub(crate) const MAX_DISJUNCTS: usize = 100;

/// Contextual fields only join the expression for synonyms longer than this;
/// short tokens produce too many false hits in free-text context fields.
const CONTEXTUAL_MIN_SYNONYM_LEN: usize = 4;

fn quoted_clause(path: &str, value: &str) -> String {
    format!("{path}:\"{}\"", OpenFdaClient::escape_query_value(value))
}

/// Builds the broad weighted-field expression for the full synonym set:
/// one quoted disjunct per (field, synonym), harmonized fields first, legacy
/// second, contextual last, deduplicated and capped at [`MAX_DISJUNCTS`].
pub(crate) fn build_expanded_query(synonyms: &[String]) -> String {
    let mut seen: HashSet<String> = HashSet::new();
    let mut disjuncts: Vec<String> = Vec::new();

    'fields: for field in FIELD_WEIGHTS {
        for synonym in synonyms {
            if field.tier == FieldTier::Contextual && synonym.len() <= CONTEXTUAL_MIN_SYNONYM_LEN {
                continue;
            }
            let clause = quoted_clause(field.query_path, synonym);
            if !seen.insert(clause.clone()) {
                continue;
            }
            disjuncts.push(clause);
            if disjuncts.len() >= MAX_DISJUNCTS {
                break 'fields;
            }
        }
    }

    disjuncts.join(" OR ")
}

/// Narrow per-synonym query over the three most reliable name fields.
pub(crate) fn build_single_term_query(synonym: &str) -> String {
    let escaped = OpenFdaClient::escape_query_value(synonym);
    format!(
        "patient.drug.openfda.generic_name:\"{escaped}\" \
         OR patient.drug.openfda.brand_name:\"{escaped}\" \
         OR patient.drug.medicinalproduct:\"{escaped}\""
    )
}

/// Query restricted to the two legacy product-name fields across the whole
/// synonym set; catches reports that never got openfda harmonization.
pub(crate) fn build_field_specific_query(synonyms: &[String]) -> String {
    let mut disjuncts: Vec<String> = Vec::new();
    for synonym in synonyms {
        disjuncts.push(quoted_clause("patient.drug.medicinalproduct", synonym));
        disjuncts.push(quoted_clause(
            "patient.drug.activesubstance.activesubstancename",
            synonym,
        ));
        if disjuncts.len() >= MAX_DISJUNCTS {
            disjuncts.truncate(MAX_DISJUNCTS);
            break;
        }
    }
    disjuncts.join(" OR ")
}
