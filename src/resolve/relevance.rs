use tracing::debug;

use crate::resolve::fields::FIELD_WEIGHTS;
use crate::resolve::normalize::normalize;
use crate::sources::openfda::{FaersDrug, FaersEventResult};

/// Minimum weighted score for a report to count as evidence about the
/// queried substance.
pub(crate) const RELEVANCE_THRESHOLD: u32 = 3;

/// The permissive fallback engages when the strict pass keeps fewer than
/// this many events...
pub(crate) const FALLBACK_MIN_KEPT: usize = 5;

/// ...out of a pool larger than this. Both values are tuned heuristics
/// carried over unchanged from the product's observed behavior.
pub(crate) const FALLBACK_POOL_MIN: usize = 10;

/// Re-scores every retrieved report against the synonym set and keeps the
/// relevant ones.
///
/// The strict pass demands a weighted score of at least
/// [`RELEVANCE_THRESHOLD`] from a single drug record. When that keeps fewer
/// than [`FALLBACK_MIN_KEPT`] events out of a pool larger than
/// [`FALLBACK_POOL_MIN`], a permissive substring-only pass over the reliable
/// name fields reruns, and its result is used if it keeps strictly more.
pub(crate) fn filter_relevant(
    events: Vec<FaersEventResult>,
    synonyms: &[String],
) -> Vec<FaersEventResult> {
    let strict_keep: Vec<bool> = events
        .iter()
        .map(|e| event_score(e, synonyms) >= RELEVANCE_THRESHOLD)
        .collect();
    let strict_count = strict_keep.iter().filter(|keep| **keep).count();

    if strict_count < FALLBACK_MIN_KEPT && events.len() > FALLBACK_POOL_MIN {
        let permissive_keep: Vec<bool> = events
            .iter()
            .map(|e| permissive_match(e, synonyms))
            .collect();
        let permissive_count = permissive_keep.iter().filter(|keep| **keep).count();
        if permissive_count > strict_count {
            debug!(
                pool = events.len(),
                strict = strict_count,
                permissive = permissive_count,
                "permissive relevance fallback engaged"
            );
            return events
                .into_iter()
                .zip(permissive_keep)
                .filter_map(|(event, keep)| keep.then_some(event))
                .collect();
        }
    }

    events
        .into_iter()
        .zip(strict_keep)
        .filter_map(|(event, keep)| keep.then_some(event))
        .collect()
}

/// Weighted score of one report: the maximum over its drug records, so one
/// record must independently accumulate enough evidence. Summing across
/// records would let several weak co-medication hits masquerade as a match.
pub(crate) fn event_score(event: &FaersEventResult, synonyms: &[String]) -> u32 {
    let Some(patient) = event.patient.as_ref() else {
        return 0;
    };
    patient
        .drug
        .iter()
        .map(|drug| drug_record_score(drug, synonyms))
        .max()
        .unwrap_or(0)
}

fn drug_record_score(drug: &FaersDrug, synonyms: &[String]) -> u32 {
    FIELD_WEIGHTS
        .iter()
        .filter(|field| {
            (field.extract)(drug).iter().any(|value| {
                let candidate = normalize(value);
                synonyms
                    .iter()
                    .any(|synonym| flexible_match(&candidate, synonym))
            })
        })
        .map(|field| field.weight)
        .sum()
}

/// Flexible comparison for the strict pass: exact match, substring
/// containment either direction when the contained string is longer than 3
/// characters, or word-level overlap between words longer than 3 characters.
/// The length guard keeps short tokens like "asa" from matching inside
/// unrelated names; exact equality still admits them.
pub(crate) fn flexible_match(candidate: &str, synonym: &str) -> bool {
    if candidate.is_empty() || synonym.is_empty() {
        return false;
    }
    if candidate == synonym {
        return true;
    }
    if synonym.len() > 3 && candidate.contains(synonym) {
        return true;
    }
    if candidate.len() > 3 && synonym.contains(candidate) {
        return true;
    }
    candidate
        .split(' ')
        .filter(|word| word.len() > 3)
        .any(|cw| {
            synonym
                .split(' ')
                .filter(|word| word.len() > 3)
                .any(|sw| cw == sw || cw.contains(sw) || sw.contains(cw))
        })
}

/// Permissive single-criterion match: plain bidirectional substring
/// containment, no length guard, restricted to the reliable name fields.
fn permissive_match(event: &FaersEventResult, synonyms: &[String]) -> bool {
    let Some(patient) = event.patient.as_ref() else {
        return false;
    };
    patient.drug.iter().any(|drug| {
        FIELD_WEIGHTS
            .iter()
            .filter(|field| field.permissive)
            .any(|field| {
                (field.extract)(drug).iter().any(|value| {
                    let candidate = normalize(value);
                    !candidate.is_empty()
                        && synonyms.iter().any(|synonym| {
                            candidate.contains(synonym.as_str()) || synonym.contains(&candidate)
                        })
                })
            })
    })
}
