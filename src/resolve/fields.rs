//! The weighted-field model shared by query construction and relevance
//! scoring.
//!
//! openFDA's queryable drug fields are uneven: the harmonized `openfda`
//! block is trustworthy but sparsely populated, while the legacy FAERS
//! free-text fields are ubiquitous but noisy. Each field therefore carries a
//! trust weight, and the whole policy lives in one table so it can be tested
//! apart from the traversal code that applies it.

use crate::sources::openfda::FaersDrug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldTier {
    /// Harmonized `openfda.*` arrays.
    Harmonized,
    /// Legacy FAERS free-text fields.
    Legacy,
    /// Weak context signals; only queried for synonyms longer than 4 chars.
    Contextual,
}

pub(crate) struct FieldSpec {
    pub name: &'static str,
    pub query_path: &'static str,
    pub weight: u32,
    pub tier: FieldTier,
    /// Whether the permissive fallback pass consults this field.
    pub permissive: bool,
    pub extract: fn(&FaersDrug) -> Vec<&str>,
}

/// Field table in query-emission order: harmonized first, then legacy, then
/// contextual, highest trust first within each tier.
pub(crate) const FIELD_WEIGHTS: &[FieldSpec] = &[
    FieldSpec {
        name: "generic_name",
        query_path: "patient.drug.openfda.generic_name",
        weight: 10,
        tier: FieldTier::Harmonized,
        permissive: true,
        extract: extract_generic_name,
    },
    FieldSpec {
        name: "substance_name",
        query_path: "patient.drug.openfda.substance_name",
        weight: 9,
        tier: FieldTier::Harmonized,
        permissive: true,
        extract: extract_substance_name,
    },
    FieldSpec {
        name: "brand_name",
        query_path: "patient.drug.openfda.brand_name",
        weight: 8,
        tier: FieldTier::Harmonized,
        permissive: true,
        extract: extract_brand_name,
    },
    FieldSpec {
        name: "active_ingredient",
        query_path: "patient.drug.openfda.active_ingredient",
        weight: 7,
        tier: FieldTier::Harmonized,
        permissive: false,
        extract: extract_active_ingredient,
    },
    FieldSpec {
        name: "active_substance",
        query_path: "patient.drug.activesubstance.activesubstancename",
        weight: 9,
        tier: FieldTier::Legacy,
        permissive: true,
        extract: extract_active_substance,
    },
    FieldSpec {
        name: "medicinal_product",
        query_path: "patient.drug.medicinalproduct",
        weight: 8,
        tier: FieldTier::Legacy,
        permissive: true,
        extract: extract_medicinal_product,
    },
    FieldSpec {
        name: "drug_name",
        query_path: "patient.drug.drugname",
        weight: 6,
        tier: FieldTier::Legacy,
        permissive: true,
        extract: extract_drug_name,
    },
    FieldSpec {
        name: "drug_indication",
        query_path: "patient.drug.drugindication",
        weight: 3,
        tier: FieldTier::Contextual,
        permissive: false,
        extract: extract_drug_indication,
    },
    FieldSpec {
        name: "manufacturer_name",
        query_path: "patient.drug.openfda.manufacturer_name",
        weight: 2,
        tier: FieldTier::Contextual,
        permissive: false,
        extract: extract_manufacturer_name,
    },
    FieldSpec {
        name: "product_ndc",
        query_path: "patient.drug.openfda.product_ndc",
        weight: 1,
        tier: FieldTier::Contextual,
        permissive: false,
        extract: extract_product_ndc,
    },
    FieldSpec {
        name: "route",
        query_path: "patient.drug.openfda.route",
        weight: 1,
        tier: FieldTier::Contextual,
        permissive: false,
        extract: extract_route,
    },
    FieldSpec {
        name: "dosage_form",
        query_path: "patient.drug.openfda.dosage_form",
        weight: 1,
        tier: FieldTier::Contextual,
        permissive: false,
        extract: extract_dosage_form,
    },
];

fn harmonized_list(
    drug: &FaersDrug,
    pick: impl Fn(&crate::sources::openfda::FaersOpenFdaDrug) -> &Vec<String>,
) -> Vec<&str> {
    drug.openfda
        .as_ref()
        .map(|o| pick(o).iter().map(String::as_str).collect())
        .unwrap_or_default()
}

fn extract_generic_name(drug: &FaersDrug) -> Vec<&str> {
    harmonized_list(drug, |o| &o.generic_name)
}

fn extract_substance_name(drug: &FaersDrug) -> Vec<&str> {
    harmonized_list(drug, |o| &o.substance_name)
}

fn extract_brand_name(drug: &FaersDrug) -> Vec<&str> {
    harmonized_list(drug, |o| &o.brand_name)
}

fn extract_active_ingredient(drug: &FaersDrug) -> Vec<&str> {
    harmonized_list(drug, |o| &o.active_ingredient)
}

fn extract_manufacturer_name(drug: &FaersDrug) -> Vec<&str> {
    harmonized_list(drug, |o| &o.manufacturer_name)
}

fn extract_product_ndc(drug: &FaersDrug) -> Vec<&str> {
    harmonized_list(drug, |o| &o.product_ndc)
}

fn extract_route(drug: &FaersDrug) -> Vec<&str> {
    harmonized_list(drug, |o| &o.route)
}

fn extract_dosage_form(drug: &FaersDrug) -> Vec<&str> {
    harmonized_list(drug, |o| &o.dosage_form)
}

fn extract_active_substance(drug: &FaersDrug) -> Vec<&str> {
    drug.activesubstance
        .as_ref()
        .and_then(|s| s.activesubstancename.as_deref())
        .into_iter()
        .collect()
}

fn extract_medicinal_product(drug: &FaersDrug) -> Vec<&str> {
    drug.medicinalproduct.as_deref().into_iter().collect()
}

fn extract_drug_name(drug: &FaersDrug) -> Vec<&str> {
    drug.drugname.as_deref().into_iter().collect()
}

fn extract_drug_indication(drug: &FaersDrug) -> Vec<&str> {
    drug.drugindication.as_deref().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::openfda::{FaersActiveSubstance, FaersOpenFdaDrug};

    #[test]
    fn table_is_ordered_by_tier_then_weight() {
        let tier_rank = |tier: FieldTier| match tier {
            FieldTier::Harmonized => 0,
            FieldTier::Legacy => 1,
            FieldTier::Contextual => 2,
        };
        for pair in FIELD_WEIGHTS.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let ordered = (tier_rank(a.tier), std::cmp::Reverse(a.weight))
                <= (tier_rank(b.tier), std::cmp::Reverse(b.weight));
            assert!(ordered, "{} must precede {}", a.name, b.name);
        }
    }

    #[test]
    fn weights_match_trust_model() {
        let weight_of = |name: &str| {
            FIELD_WEIGHTS
                .iter()
                .find(|f| f.name == name)
                .map(|f| f.weight)
                .unwrap()
        };
        assert_eq!(weight_of("generic_name"), 10);
        assert_eq!(weight_of("active_substance"), 9);
        assert_eq!(weight_of("medicinal_product"), 8);
        assert_eq!(weight_of("drug_name"), 6);
        assert_eq!(weight_of("drug_indication"), 3);
        assert_eq!(weight_of("manufacturer_name"), 2);
        assert_eq!(weight_of("route"), 1);
    }

    #[test]
    fn extraction_covers_legacy_and_harmonized_fields() {
        let drug = FaersDrug {
            medicinalproduct: Some("ASPIRIN 81MG".into()),
            activesubstance: Some(FaersActiveSubstance {
                activesubstancename: Some("ACETYLSALICYLIC ACID".into()),
            }),
            openfda: Some(FaersOpenFdaDrug {
                generic_name: vec!["aspirin".into()],
                route: vec!["ORAL".into()],
                ..Default::default()
            }),
            ..Default::default()
        };

        assert_eq!(extract_medicinal_product(&drug), vec!["ASPIRIN 81MG"]);
        assert_eq!(extract_active_substance(&drug), vec!["ACETYLSALICYLIC ACID"]);
        assert_eq!(extract_generic_name(&drug), vec!["aspirin"]);
        assert_eq!(extract_route(&drug), vec!["ORAL"]);
        assert!(extract_drug_name(&drug).is_empty());
        assert!(extract_brand_name(&drug).is_empty());
    }
}
