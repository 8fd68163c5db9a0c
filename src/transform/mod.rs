//! Transform adapters from upstream API shapes into consumer-facing models.

pub(crate) mod adverse_event;
