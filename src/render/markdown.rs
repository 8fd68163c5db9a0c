use crate::entities::adverse_event::AdverseEventsResponse;

/// Renders an adverse-event response as markdown: a summary header, the
/// top-reaction frequency table, then one block per matched report.
pub(crate) fn render_adverse_events(name: &str, resp: &AdverseEventsResponse) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Adverse events: {name}\n\n"));
    out.push_str(&format!(
        "{} matched report(s), {} distinct event(s) analyzed.\n\n",
        resp.meta.total, resp.stats.total_events
    ));

    if !resp.stats.top_reactions.is_empty() {
        out.push_str("| Reaction | Count | % of events |\n");
        out.push_str("|----------|-------|-------------|\n");
        for row in &resp.stats.top_reactions {
            out.push_str(&format!(
                "| {} | {} | {:.1} |\n",
                row.reaction, row.count, row.percentage
            ));
        }
        out.push('\n');
    }

    for row in &resp.results {
        out.push_str(&format!(
            "## {} — report {}\n",
            row.medication, row.report_id
        ));
        out.push_str(&format!("- Generic name: {}\n", row.generic_name));
        if let Some(manufacturer) = row.manufacturer.as_deref() {
            out.push_str(&format!("- Manufacturer: {manufacturer}\n"));
        }
        if let Some(patient) = row.patient.as_deref() {
            out.push_str(&format!("- Patient: {patient}\n"));
        }
        if let Some(country) = row.reporter_country.as_deref() {
            out.push_str(&format!("- Reporter country: {country}\n"));
        }
        if let Some(date) = row.date.as_deref() {
            out.push_str(&format!("- Received: {date}\n"));
        }
        out.push_str(&format!(
            "- Serious: {}\n",
            if row.serious { "yes" } else { "no" }
        ));
        for reaction in &row.reactions {
            match reaction.outcome.as_deref() {
                Some(outcome) => out.push_str(&format!(
                    "- {} ({}, {})\n",
                    reaction.term, outcome, reaction.severity
                )),
                None => out.push_str(&format!("- {} ({})\n", reaction.term, reaction.severity)),
            }
        }
        out.push('\n');
    }

    out.push_str(&format!("_{}_\n", resp.meta.disclaimer));
    out
}

/// Renders a synonym expansion for the `expand` debugging subcommand.
pub(crate) fn render_synonyms(name: &str, synonyms: &[String]) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Synonyms: {name}\n\n"));
    for synonym in synonyms {
        out.push_str(&format!("- {synonym}\n"));
    }
    out.push_str(&format!("\n{} term(s)\n", synonyms.len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::adverse_event::{
        AdverseEventMeta, DrugReaction, ReactionDetail, ReactionFrequency, ReactionStats,
    };

    fn sample_response() -> AdverseEventsResponse {
        AdverseEventsResponse {
            success: true,
            results: vec![DrugReaction {
                report_id: "9001".into(),
                medication: "ASPIRIN 81MG".into(),
                generic_name: "aspirin".into(),
                manufacturer: Some("Bayer".into()),
                reactions: vec![ReactionDetail {
                    term: "Tinnitus".into(),
                    outcome: Some("Recovering/resolving".into()),
                    severity: "serious".into(),
                }],
                patient: Some("63 years, Female".into()),
                reporter_country: Some("US".into()),
                date: Some("2023-12-01".into()),
                serious: true,
            }],
            meta: AdverseEventMeta {
                total: 1,
                disclaimer: "Reports do not establish causation.".into(),
            },
            stats: ReactionStats {
                total_events: 1,
                top_reactions: vec![ReactionFrequency {
                    reaction: "Tinnitus".into(),
                    count: 1,
                    percentage: 100.0,
                }],
            },
        }
    }

    #[test]
    fn markdown_includes_summary_table_and_report_rows() {
        let md = render_adverse_events("aspirin", &sample_response());
        assert!(md.contains("# Adverse events: aspirin"));
        assert!(md.contains("| Tinnitus | 1 | 100.0 |"));
        assert!(md.contains("## ASPIRIN 81MG — report 9001"));
        assert!(md.contains("- Tinnitus (Recovering/resolving, serious)"));
        assert!(md.contains("_Reports do not establish causation._"));
    }

    #[test]
    fn synonym_rendering_lists_terms() {
        let md = render_synonyms("aspirin", &["aspirin".into(), "asa".into()]);
        assert!(md.contains("- aspirin"));
        assert!(md.contains("2 term(s)"));
    }
}
