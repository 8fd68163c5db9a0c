//! Identity resolution: from a free-text drug name to a relevance-filtered
//! set of FAERS reports.
//!
//! The flow is linear: [`normalize`] canonicalizes the input,
//! [`synonyms::expand`] builds the candidate name set, [`retrieve::retrieve`]
//! runs the multi-strategy openFDA search, and [`relevance::filter_relevant`]
//! re-scores the merged pool against the synonym set.
//!
//! [`normalize`]: normalize::normalize

pub(crate) mod fields;
pub(crate) mod normalize;
pub(crate) mod query;
pub(crate) mod relevance;
pub(crate) mod retrieve;
pub(crate) mod synonyms;
