use std::io;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use serde_json::Value as JsonValue;
use tracing::{info, warn};

use availerp_core::TenantId;
use availerp_events::{EventBus, EventEnvelope, Subscription, TenantScoped};

use crate::read_side::AvailabilityReadSide;

const TICK: Duration = Duration::from_millis(250);

/// Handle to stop and join a background worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<WorkerStats>>,
}

/// Message counts reported when a worker stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub applied: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl WorkerHandle {
    /// Request shutdown and wait for the worker thread.
    pub fn shutdown(mut self) -> WorkerStats {
        let _ = self.shutdown.send(());
        self.join
            .take()
            .and_then(|j| j.join().ok())
            .unwrap_or_default()
    }
}

/// Background thread feeding bus messages to an idempotent handler.
#[derive(Debug)]
pub struct ProjectionWorker;

impl ProjectionWorker {
    /// Subscribe to `bus` and hand every message to `handler` until shutdown.
    ///
    /// With `tenant_id` set, messages of other tenants are skipped. Handler
    /// failures are logged and the loop keeps going; delivery is
    /// at-least-once so handlers must tolerate redelivery.
    pub fn spawn<M, B, H, E>(
        name: &'static str,
        bus: &B,
        tenant_id: Option<TenantId>,
        mut handler: H,
    ) -> io::Result<WorkerHandle>
    where
        M: TenantScoped + Send + 'static,
        B: EventBus<M>,
        H: FnMut(M) -> Result<(), E> + Send + 'static,
        E: core::fmt::Debug + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let sub: Subscription<M> = bus.subscribe();

        let join = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || worker_loop(name, sub, shutdown_rx, tenant_id, &mut handler))?;

        Ok(WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
        })
    }

    /// Keep an [`AvailabilityReadSide`] in sync with the bus.
    pub fn spawn_read_side<B>(
        bus: &B,
        read_side: AvailabilityReadSide,
        tenant_id: Option<TenantId>,
    ) -> io::Result<WorkerHandle>
    where
        B: EventBus<EventEnvelope<JsonValue>>,
    {
        Self::spawn(
            "availability-read-side",
            bus,
            tenant_id,
            move |env: EventEnvelope<JsonValue>| read_side.apply_envelope(&env),
        )
    }
}

fn worker_loop<M, H, E>(
    name: &'static str,
    sub: Subscription<M>,
    shutdown_rx: mpsc::Receiver<()>,
    tenant_id: Option<TenantId>,
    handler: &mut H,
) -> WorkerStats
where
    M: TenantScoped,
    H: FnMut(M) -> Result<(), E>,
    E: core::fmt::Debug,
{
    let mut stats = WorkerStats::default();

    loop {
        if shutdown_rx.try_recv().is_ok() {
            break;
        }

        match sub.recv_timeout(TICK) {
            Ok(msg) => {
                if tenant_id.is_some_and(|t| msg.tenant_id() != t) {
                    stats.skipped += 1;
                    continue;
                }
                match handler(msg) {
                    Ok(()) => stats.applied += 1,
                    Err(err) => {
                        stats.failed += 1;
                        warn!(worker = name, error = ?err, "projection worker handler failed");
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    info!(
        worker = name,
        applied = stats.applied,
        failed = stats.failed,
        skipped = stats.skipped,
        "projection worker stopped"
    );
    stats
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Instant;

    use chrono::Utc;
    use uuid::Uuid;

    use availerp_core::AggregateId;
    use availerp_events::InMemoryEventBus;
    use availerp_products::{CreateProduct, Product, ProductCommand, ProductId, ProductKind};

    use super::*;
    use crate::command_dispatcher::CommandDispatcher;
    use crate::event_store::InMemoryEventStore;

    fn wait_until(mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        false
    }

    #[test]
    fn read_side_worker_follows_the_bus() {
        let bus = Arc::new(InMemoryEventBus::<EventEnvelope<JsonValue>>::new());
        let read_side = AvailabilityReadSide::default();
        let tenant_id = TenantId::new();
        let worker =
            ProjectionWorker::spawn_read_side(&bus, read_side.clone(), Some(tenant_id)).unwrap();
        let dispatcher = CommandDispatcher::new(InMemoryEventStore::new(), bus.clone());

        let create = |tenant_id: TenantId| {
            let product_id = ProductId::new(AggregateId::new());
            let cmd = ProductCommand::CreateProduct(CreateProduct {
                tenant_id,
                product_id,
                sku: "SKU".to_string(),
                name: "Widget".to_string(),
                kind: ProductKind::Goods,
                uom: "kg".to_string(),
                occurred_at: Utc::now(),
            });
            dispatcher
                .dispatch(tenant_id, product_id.0, "products.product", cmd, |_, id| {
                    Product::empty(ProductId::new(id))
                })
                .unwrap();
            product_id
        };
        // Delivered in order, so once ours is visible theirs was already skipped.
        let theirs = create(TenantId::new());
        let ours = create(tenant_id);

        assert!(wait_until(|| read_side.catalog().get(tenant_id, &ours).is_some()));
        let stats = worker.shutdown();
        assert_eq!(stats.applied, 1);
        assert_eq!(stats.skipped, 1);
        assert!(read_side.catalog().list(tenant_id).iter().all(|p| p.product_id != theirs));
    }

    #[test]
    fn handler_errors_do_not_stop_the_worker() {
        let bus = Arc::new(InMemoryEventBus::<EventEnvelope<JsonValue>>::new());
        let (seen_tx, seen_rx) = mpsc::channel();
        let worker = ProjectionWorker::spawn("failing", &bus, None, move |env: EventEnvelope<JsonValue>| {
            let _ = seen_tx.send(env.sequence_number());
            if env.sequence_number() == 1 { Err("boom") } else { Ok(()) }
        })
        .unwrap();

        let tenant_id = TenantId::new();
        for seq in 1..=3 {
            bus.publish(EventEnvelope::new(
                Uuid::now_v7(),
                tenant_id,
                AggregateId::new(),
                "test",
                seq,
                JsonValue::Null,
            ))
            .unwrap();
        }

        for _ in 0..3 {
            seen_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        }
        let stats = worker.shutdown();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.applied, 2);
    }
}
