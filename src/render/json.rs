use serde::Serialize;

use crate::error::FaerscopeError;

pub(crate) fn to_pretty<T: Serialize>(value: &T) -> Result<String, FaerscopeError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::to_pretty;
    use crate::entities::adverse_event::{ReactionFrequency, ReactionStats};

    #[test]
    fn to_pretty_serializes_with_indentation() {
        let stats = ReactionStats {
            total_events: 12,
            top_reactions: vec![ReactionFrequency {
                reaction: "Nausea".into(),
                count: 4,
                percentage: 33.3,
            }],
        };
        let json = to_pretty(&stats).expect("json");
        assert!(json.contains('\n'));
        assert!(json.contains("\"total_events\": 12"));
        assert!(json.contains("\"reaction\": \"Nausea\""));
    }
}
