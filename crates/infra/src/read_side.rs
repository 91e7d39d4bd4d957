//! The in-memory read side wired to the availability computation.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, info};

use availerp_availability::{
    AvailabilityContext, AvailabilityError, AvailabilityOptions, LineAvailability, LineQuantities,
    QuantityField,
};
use availerp_core::TenantId;
use availerp_events::EventEnvelope;
use availerp_inventory::{LocationId, StockMoveId};
use availerp_products::ProductId;
use availerp_sales::SalesOrderId;

use crate::event_store::{EventStore, EventStoreError};
use crate::projections::catalog::PRODUCT_AGGREGATE;
use crate::projections::sales_lines::SALES_ORDER_AGGREGATE;
use crate::projections::stock_ledger::{LOCATION_AGGREGATE, MOVE_AGGREGATE};
use crate::projections::{
    CatalogProjection, LocationReadModel, MoveReadModel, ProductReadModel, ProjectionError,
    SalesLinesProjection, SalesOrderReadModel, StockLedgerProjection,
};
use crate::read_model::InMemoryTenantStore;

pub type InMemoryCatalog = CatalogProjection<InMemoryTenantStore<ProductId, ProductReadModel>>;

pub type InMemoryStockLedger = StockLedgerProjection<
    InMemoryTenantStore<LocationId, LocationReadModel>,
    InMemoryTenantStore<StockMoveId, MoveReadModel>,
>;

pub type InMemorySalesLines =
    SalesLinesProjection<InMemoryTenantStore<SalesOrderId, SalesOrderReadModel>>;

pub type ReadSideAvailability =
    LineAvailability<Arc<InMemoryStockLedger>, Arc<InMemorySalesLines>, Arc<InMemoryCatalog>>;

#[derive(Debug, Error)]
pub enum ReadSideError {
    #[error(transparent)]
    Store(#[from] EventStoreError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

/// Catalog, stock ledger and sales lines kept up to date from one event feed.
#[derive(Debug, Clone)]
pub struct AvailabilityReadSide {
    catalog: Arc<InMemoryCatalog>,
    stock: Arc<InMemoryStockLedger>,
    sales: Arc<InMemorySalesLines>,
    options: AvailabilityOptions,
}

impl AvailabilityReadSide {
    pub fn new(options: AvailabilityOptions) -> Self {
        Self {
            catalog: Arc::new(CatalogProjection::new(InMemoryTenantStore::new())),
            stock: Arc::new(StockLedgerProjection::new(
                InMemoryTenantStore::new(),
                InMemoryTenantStore::new(),
            )),
            sales: Arc::new(SalesLinesProjection::new(InMemoryTenantStore::new())),
            options,
        }
    }

    pub fn catalog(&self) -> &InMemoryCatalog {
        &self.catalog
    }

    pub fn stock(&self) -> &InMemoryStockLedger {
        &self.stock
    }

    pub fn sales(&self) -> &InMemorySalesLines {
        &self.sales
    }

    /// Route an envelope to the projection owning its aggregate type.
    pub fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        match envelope.aggregate_type() {
            PRODUCT_AGGREGATE => self.catalog.apply_envelope(envelope),
            LOCATION_AGGREGATE | MOVE_AGGREGATE => self.stock.apply_envelope(envelope),
            SALES_ORDER_AGGREGATE => self.sales.apply_envelope(envelope),
            other => {
                debug!(aggregate_type = other, "no projection for aggregate type");
                Ok(())
            }
        }
    }

    /// Drop the tenant's read models and replay its whole history.
    pub fn rebuild_tenant(
        &self,
        store: &impl EventStore,
        tenant_id: TenantId,
    ) -> Result<(), ReadSideError> {
        let envelopes: Vec<_> = store
            .load_tenant(tenant_id)?
            .iter()
            .map(|e| e.to_envelope())
            .collect();
        let events = envelopes.len();

        self.catalog.rebuild_tenant(tenant_id, envelopes.clone())?;
        self.stock.rebuild_tenant(tenant_id, envelopes.clone())?;
        self.sales.rebuild_tenant(tenant_id, envelopes)?;

        info!(%tenant_id, events, "read side rebuilt");
        Ok(())
    }

    /// Computation bound to these projections.
    pub fn availability(&self) -> ReadSideAvailability {
        LineAvailability::with_options(
            self.stock.clone(),
            self.sales.clone(),
            self.catalog.clone(),
            self.options.clone(),
        )
    }

    /// Values for every persisted line of an order, in line order.
    ///
    /// `None` when the order is unknown to the read side.
    pub fn order_line_quantities(
        &self,
        ctx: &AvailabilityContext,
        order_id: SalesOrderId,
        fields: &[QuantityField],
    ) -> Result<Option<Vec<LineQuantities>>, AvailabilityError> {
        let Some(order) = self.sales.get(ctx.tenant_id, &order_id) else {
            return Ok(None);
        };
        self.availability()
            .compute(ctx, &order.snapshots(), fields)
            .map(Some)
    }
}

impl Default for AvailabilityReadSide {
    fn default() -> Self {
        Self::new(AvailabilityOptions::default())
    }
}
