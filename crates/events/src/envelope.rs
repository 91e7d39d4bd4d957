use serde::{Deserialize, Serialize};
use uuid::Uuid;

use availerp_core::{AggregateId, TenantId};

/// Where an event sits: its stream and its 1-based position in that stream.
///
/// Orders by tenant, then aggregate, then sequence, which is the order
/// projections replay a store in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StreamPosition {
    pub tenant_id: TenantId,
    pub aggregate_id: AggregateId,
    pub sequence_number: u64,
}

/// A persisted event plus the stream metadata consumers need.
///
/// Projections use `sequence_number` as their per-stream cursor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    aggregate_type: String,
    #[serde(flatten)]
    position: StreamPosition,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        sequence_number: u64,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            aggregate_type: aggregate_type.into(),
            position: StreamPosition {
                tenant_id,
                aggregate_id,
                sequence_number,
            },
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn tenant_id(&self) -> TenantId {
        self.position.tenant_id
    }

    pub fn aggregate_id(&self) -> AggregateId {
        self.position.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.position.sequence_number
    }

    pub fn position(&self) -> StreamPosition {
        self.position
    }

    /// True when the envelope travels on the given tenant's aggregate stream.
    pub fn belongs_to(&self, tenant_id: TenantId, aggregate_id: AggregateId) -> bool {
        self.position.tenant_id == tenant_id && self.position.aggregate_id == aggregate_id
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }

    /// Convert the payload, keeping the stream metadata.
    pub fn try_map<T, Err>(
        self,
        f: impl FnOnce(E) -> Result<T, Err>,
    ) -> Result<EventEnvelope<T>, Err> {
        Ok(EventEnvelope {
            event_id: self.event_id,
            aggregate_type: self.aggregate_type,
            position: self.position,
            payload: f(self.payload)?,
        })
    }
}
