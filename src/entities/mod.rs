//! Consumer-facing models and query workflows.

pub mod adverse_event;
