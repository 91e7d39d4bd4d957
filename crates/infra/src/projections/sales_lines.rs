use serde_json::Value as JsonValue;

use availerp_availability::{
    AvailabilityError, ConfirmedDemand, ConfirmedLine, OrderContext, SaleLineSnapshot,
};
use availerp_core::TenantId;
use availerp_events::EventEnvelope;
use availerp_inventory::LocationId;
use availerp_products::ProductId;
use availerp_sales::{LineKind, SaleLineId, SalesOrderEvent, SalesOrderId, SalesOrderStatus};

use super::{ProjectionError, StreamCursors, check_stream, decode, replay_order};
use crate::read_model::TenantStore;

pub const SALES_ORDER_AGGREGATE: &str = "sales.order";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesLineReadModel {
    pub line_id: SaleLineId,
    pub kind: LineKind,
    pub product_id: Option<ProductId>,
    pub description: Option<String>,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesOrderReadModel {
    pub order_id: SalesOrderId,
    pub status: SalesOrderStatus,
    pub warehouse: Option<LocationId>,
    pub lines: Vec<SalesLineReadModel>,
}

impl SalesOrderReadModel {
    pub fn context(&self) -> OrderContext {
        OrderContext {
            status: self.status,
            warehouse: self.warehouse,
        }
    }

    /// Persisted lines as availability inputs, in line order.
    pub fn snapshots(&self) -> Vec<SaleLineSnapshot> {
        self.lines
            .iter()
            .map(|l| SaleLineSnapshot {
                line_id: Some(l.line_id),
                order: self.context(),
                kind: l.kind,
                product_id: l.product_id,
                quantity: l.quantity,
            })
            .collect()
    }
}

/// Sales orders with their lines: the demand side of availability.
#[derive(Debug)]
pub struct SalesLinesProjection<S>
where
    S: TenantStore<SalesOrderId, SalesOrderReadModel>,
{
    store: S,
    cursors: StreamCursors,
}

impl<S> SalesLinesProjection<S>
where
    S: TenantStore<SalesOrderId, SalesOrderReadModel>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: StreamCursors::new(),
        }
    }

    pub fn get(&self, tenant_id: TenantId, order_id: &SalesOrderId) -> Option<SalesOrderReadModel> {
        self.store.get(tenant_id, order_id)
    }

    pub fn list(&self, tenant_id: TenantId) -> Vec<SalesOrderReadModel> {
        self.store.list(tenant_id)
    }

    pub fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        self.cursors.advance(
            envelope.tenant_id(),
            envelope.aggregate_id(),
            envelope.sequence_number(),
            || self.apply(envelope),
        )?;
        Ok(())
    }

    /// Drop the tenant's rows and replay its history; other tenants' envelopes
    /// are ignored.
    pub fn rebuild_tenant(
        &self,
        tenant_id: TenantId,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), ProjectionError> {
        let mut envs: Vec<_> = envelopes
            .into_iter()
            .filter(|e| e.tenant_id() == tenant_id && e.aggregate_type() == SALES_ORDER_AGGREGATE)
            .collect();
        self.store.clear_tenant(tenant_id);
        self.cursors.clear_tenant(tenant_id);
        replay_order(&mut envs);
        envs.iter().try_for_each(|env| self.apply_envelope(env))
    }

    fn apply(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        let event: SalesOrderEvent = decode(envelope)?;
        let tenant_id = event.tenant_id();
        let order_id = event.order_id();
        check_stream(envelope, tenant_id, order_id.0)?;

        if let SalesOrderEvent::SalesOrderCreated(e) = &event {
            self.store.upsert(
                tenant_id,
                order_id,
                SalesOrderReadModel {
                    order_id,
                    status: SalesOrderStatus::Draft,
                    warehouse: e.warehouse,
                    lines: Vec::new(),
                },
            );
            return Ok(());
        }

        self.store
            .update(tenant_id, order_id, &mut |rm: Option<SalesOrderReadModel>| {
                let mut rm = rm?;
                match &event {
                    SalesOrderEvent::SalesOrderCreated(_) => {}
                    SalesOrderEvent::LineAdded(e) => rm.lines.push(SalesLineReadModel {
                        line_id: SaleLineId::new(order_id, e.line_no),
                        kind: LineKind::Line,
                        product_id: Some(e.product_id),
                        description: None,
                        quantity: e.quantity,
                    }),
                    SalesOrderEvent::CommentAdded(e) => rm.lines.push(SalesLineReadModel {
                        line_id: SaleLineId::new(order_id, e.line_no),
                        kind: LineKind::Comment,
                        product_id: None,
                        description: Some(e.description.clone()),
                        quantity: 0,
                    }),
                    SalesOrderEvent::LineQuantityChanged(e) => {
                        if let Some(line) =
                            rm.lines.iter_mut().find(|l| l.line_id.line_no == e.line_no)
                        {
                            line.quantity = e.quantity;
                        }
                    }
                    SalesOrderEvent::StatusChanged(e) => rm.status = e.to,
                }
                Some(rm)
            });
        Ok(())
    }
}

impl<S> ConfirmedDemand for SalesLinesProjection<S>
where
    S: TenantStore<SalesOrderId, SalesOrderReadModel>,
{
    fn confirmed_lines(
        &self,
        tenant_id: TenantId,
        warehouses: &[LocationId],
    ) -> Result<Vec<ConfirmedLine>, AvailabilityError> {
        let mut lines: Vec<ConfirmedLine> = self
            .store
            .list(tenant_id)
            .into_iter()
            .filter(|o| o.status == SalesOrderStatus::Confirmed)
            .filter(|o| o.warehouse.is_none_or(|w| warehouses.contains(&w)))
            .flat_map(|o| {
                let warehouse = o.warehouse;
                o.lines.into_iter().filter_map(move |l| {
                    let product_id = match l.kind {
                        LineKind::Line => l.product_id?,
                        LineKind::Comment => return None,
                    };
                    Some(ConfirmedLine {
                        line_id: l.line_id,
                        product_id,
                        quantity: l.quantity,
                        warehouse,
                    })
                })
            })
            .collect();
        lines.sort_by_key(|l| l.line_id);
        Ok(lines)
    }
}
