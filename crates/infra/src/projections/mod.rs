//! Read-model projections feeding the availability computation.
//!
//! Every projection consumes published envelopes, keeps a cursor per
//! `(tenant, aggregate)` stream so redelivered events are ignored, and can be
//! rebuilt from scratch by replaying the store.

pub mod catalog;
pub mod cursor;
pub mod sales_lines;
pub mod stock_ledger;

use serde_json::Value as JsonValue;
use thiserror::Error;

use availerp_core::{AggregateId, TenantId};
use availerp_events::EventEnvelope;

pub use catalog::{CatalogProjection, ProductReadModel};
pub use cursor::StreamCursors;
pub use sales_lines::{SalesLineReadModel, SalesLinesProjection, SalesOrderReadModel};
pub use stock_ledger::{LocationReadModel, MoveReadModel, StockLedgerProjection};

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("failed to deserialize event payload: {0}")]
    Deserialize(String),

    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },

    /// A handler panicked while holding the cursor lock.
    #[error("projection cursor lock poisoned")]
    LockPoisoned,
}

/// Decode an envelope payload into a domain event type.
pub(crate) fn decode<E>(envelope: &EventEnvelope<JsonValue>) -> Result<E, ProjectionError>
where
    E: serde::de::DeserializeOwned,
{
    serde_json::from_value(envelope.payload().clone())
        .map_err(|e| ProjectionError::Deserialize(e.to_string()))
}

/// Reject events whose payload disagrees with the envelope they travel in.
pub(crate) fn check_stream(
    envelope: &EventEnvelope<JsonValue>,
    event_tenant: TenantId,
    event_aggregate: AggregateId,
) -> Result<(), ProjectionError> {
    if envelope.belongs_to(event_tenant, event_aggregate) {
        return Ok(());
    }
    Err(ProjectionError::TenantIsolation(format!(
        "event for {event_tenant}/{event_aggregate} delivered on stream {}/{}",
        envelope.tenant_id(),
        envelope.aggregate_id()
    )))
}

/// Replay order for rebuilds: tenant, aggregate, then stream position.
pub(crate) fn replay_order(envelopes: &mut [EventEnvelope<JsonValue>]) {
    envelopes.sort_by_key(|e| e.position());
}
