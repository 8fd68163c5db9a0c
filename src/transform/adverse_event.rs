use std::collections::{HashMap, HashSet};

use crate::entities::adverse_event::{
    DrugReaction, ReactionDetail, ReactionFrequency, ReactionStats,
};
use crate::resolve::normalize::normalize;
use crate::sources::openfda::{FaersDrug, FaersEventResult, FaersPatient};

/// Projects relevance-filtered reports into per-drug reaction entries.
///
/// One entry is emitted per (report, matched drug record) pair. The match
/// here is deliberately stricter than the weighted admission filter: the
/// drug record must carry the query name in its harmonized generic or
/// substance name (substring, either direction). Admission maximizes recall;
/// this final grouping keeps the user-facing rows precise.
pub(crate) fn project_reactions(
    events: &[FaersEventResult],
    query_name: &str,
) -> Vec<DrugReaction> {
    let query = normalize(query_name);
    if query.is_empty() {
        return Vec::new();
    }

    let mut out: Vec<DrugReaction> = Vec::new();
    for event in events {
        let Some(patient) = event.patient.as_ref() else {
            continue;
        };
        for drug in &patient.drug {
            let Some(matched_name) = matched_generic_name(drug, &query) else {
                continue;
            };
            out.push(DrugReaction {
                report_id: event.safetyreportid.clone(),
                medication: medication_name(drug).unwrap_or_else(|| matched_name.clone()),
                generic_name: matched_name,
                manufacturer: manufacturer(drug),
                reactions: reaction_details(event, patient),
                patient: patient_demographics(Some(patient)),
                reporter_country: reporter_country(event),
                date: normalize_date_yyyymmdd(event.receivedate.as_deref()),
                serious: event.serious.as_deref() == Some("1"),
            });
        }
    }
    out
}

/// First harmonized generic/substance name that contains the query (or is
/// contained by it, so e.g. a query for "aspirina" still groups under
/// "aspirin").
fn matched_generic_name(drug: &FaersDrug, query: &str) -> Option<String> {
    let openfda = drug.openfda.as_ref()?;
    openfda
        .generic_name
        .iter()
        .chain(openfda.substance_name.iter())
        .map(|raw| normalize(raw))
        .find(|name| !name.is_empty() && (name.contains(query) || query.contains(name.as_str())))
}

fn medication_name(drug: &FaersDrug) -> Option<String> {
    drug.medicinalproduct
        .as_deref()
        .or(drug.drugname.as_deref())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.trim_matches('.').to_string())
}

fn manufacturer(drug: &FaersDrug) -> Option<String> {
    drug.openfda
        .as_ref()
        .and_then(|o| o.manufacturer_name.first())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn reaction_details(event: &FaersEventResult, patient: &FaersPatient) -> Vec<ReactionDetail> {
    let mut out: Vec<ReactionDetail> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for reaction in &patient.reaction {
        let Some(term) = reaction
            .reactionmeddrapt
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
        else {
            continue;
        };
        if !seen.insert(term.to_ascii_lowercase()) {
            continue;
        }
        let code = reaction.reactionoutcome.as_deref().map(str::trim);
        out.push(ReactionDetail {
            term: term.to_string(),
            outcome: outcome_description(code).map(str::to_string),
            severity: severity_label(code, event).to_string(),
        });
    }
    out
}

/// FAERS `reactionoutcome` code table.
fn outcome_description(code: Option<&str>) -> Option<&'static str> {
    match code {
        Some("1") => Some("Recovered/resolved"),
        Some("2") => Some("Recovering/resolving"),
        Some("3") => Some("Not recovered/not resolved"),
        Some("4") => Some("Recovered/resolved with sequelae"),
        Some("5") => Some("Fatal"),
        Some("6") => Some("Unknown"),
        _ => None,
    }
}

fn severity_label(outcome_code: Option<&str>, event: &FaersEventResult) -> &'static str {
    if outcome_code == Some("5") || event.seriousnessdeath.as_deref() == Some("1") {
        return "fatal";
    }
    if event.serious.as_deref() == Some("1") {
        return "serious";
    }
    "non-serious"
}

fn normalize_patient_sex(code: Option<&str>) -> Option<&'static str> {
    match code.map(str::trim) {
        Some("1") => Some("Male"),
        Some("2") => Some("Female"),
        _ => None,
    }
}

fn normalize_age_unit(unit: Option<&str>) -> Option<&'static str> {
    match unit.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        Some("801") | Some("year") | Some("years") => Some("years"),
        Some("802") | Some("month") | Some("months") => Some("months"),
        Some("803") | Some("week") | Some("weeks") => Some("weeks"),
        Some("804") | Some("day") | Some("days") => Some("days"),
        Some("805") | Some("hour") | Some("hours") => Some("hours"),
        Some("806") | Some("decade") | Some("decades") => Some("decades"),
        _ => None,
    }
}

fn patient_demographics(patient: Option<&FaersPatient>) -> Option<String> {
    let patient = patient?;
    let age = patient
        .patientonsetage
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|age| {
            if age.chars().any(|c| c.is_ascii_alphabetic()) {
                age.to_string()
            } else if let Some(unit) = normalize_age_unit(patient.patientonsetageunit.as_deref()) {
                format!("{age} {unit}")
            } else {
                age.to_string()
            }
        });

    let sex = normalize_patient_sex(patient.patientsex.as_deref()).map(str::to_string);
    let weight = patient
        .patientweight
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| format!("{v} kg"));

    let parts: Vec<String> = [age, sex, weight].into_iter().flatten().collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

fn reporter_country(event: &FaersEventResult) -> Option<String> {
    event
        .primarysource
        .as_ref()
        .and_then(|s| s.reportercountry.as_deref())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn normalize_date_yyyymmdd(value: Option<&str>) -> Option<String> {
    let v = value?.trim();
    if v.len() != 8 || !v.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(format!("{}-{}-{}", &v[0..4], &v[4..6], &v[6..8]))
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Aggregates the projected entries into a reaction-frequency table: top 10
/// terms by count with each count as a percentage of the distinct reports
/// processed. A term is counted once per report even when several matched
/// drug records repeat it.
pub(crate) fn summarize_reactions(
    total_events: usize,
    reactions: &[DrugReaction],
) -> ReactionStats {
    let mut counts: HashMap<String, (String, usize)> = HashMap::new();
    let mut counted: HashSet<(String, String)> = HashSet::new();
    for row in reactions {
        for reaction in &row.reactions {
            let key = reaction.term.to_ascii_lowercase();
            if !counted.insert((row.report_id.clone(), key.clone())) {
                continue;
            }
            let entry = counts
                .entry(key)
                .or_insert_with(|| (reaction.term.clone(), 0usize));
            entry.1 += 1;
        }
    }

    let mut top: Vec<(String, usize)> = counts.into_values().collect();
    top.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    top.truncate(10);

    let denom = total_events.max(1) as f64;
    let top_reactions = top
        .into_iter()
        .map(|(reaction, count)| ReactionFrequency {
            reaction,
            count,
            percentage: round_one_decimal((count as f64 * 100.0) / denom),
        })
        .collect();

    ReactionStats {
        total_events,
        top_reactions,
    }
}
