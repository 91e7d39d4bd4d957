use std::collections::HashMap;
use std::sync::Mutex;

use availerp_core::{AggregateId, TenantId};

use super::ProjectionError;

/// Last applied sequence number per `(tenant, aggregate)` stream.
#[derive(Debug, Default)]
pub struct StreamCursors {
    inner: Mutex<HashMap<(TenantId, AggregateId), u64>>,
}

impl StreamCursors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(&self, tenant_id: TenantId, aggregate_id: AggregateId) -> u64 {
        self.inner
            .lock()
            .map(|c| c.get(&(tenant_id, aggregate_id)).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Run `apply` for event `seq` of a stream unless it was already seen.
    ///
    /// Returns `Ok(false)` for duplicates. The first event of a stream may
    /// carry any positive number; after that numbers must be contiguous. The
    /// cursor only moves when `apply` succeeds, and the lock is held while it
    /// runs so concurrent deliveries of one stream cannot interleave.
    pub fn advance(
        &self,
        tenant_id: TenantId,
        aggregate_id: AggregateId,
        seq: u64,
        apply: impl FnOnce() -> Result<(), ProjectionError>,
    ) -> Result<bool, ProjectionError> {
        let mut cursors = self
            .inner
            .lock()
            .map_err(|_| ProjectionError::LockPoisoned)?;
        let key = (tenant_id, aggregate_id);
        let last = cursors.get(&key).copied().unwrap_or(0);

        if seq == 0 {
            return Err(ProjectionError::NonMonotonicSequence { last, found: seq });
        }
        if seq <= last {
            return Ok(false);
        }
        if last != 0 && seq != last + 1 {
            return Err(ProjectionError::NonMonotonicSequence { last, found: seq });
        }

        apply()?;
        cursors.insert(key, seq);
        Ok(true)
    }

    /// Forget every stream of a tenant so its history can be replayed.
    pub fn clear_tenant(&self, tenant_id: TenantId) {
        if let Ok(mut cursors) = self.inner.lock() {
            cursors.retain(|(t, _), _| *t != tenant_id);
        }
    }
}
