use serde_json::Value as JsonValue;

use availerp_availability::{AvailabilityError, ProductCatalog};
use availerp_core::TenantId;
use availerp_events::EventEnvelope;
use availerp_products::{ProductEvent, ProductId, ProductKind};

use super::{ProjectionError, StreamCursors, check_stream, decode, replay_order};
use crate::read_model::TenantStore;

pub const PRODUCT_AGGREGATE: &str = "products.product";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductReadModel {
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub kind: ProductKind,
    pub uom: String,
    pub archived: bool,
}

/// Product catalog as seen by the sales side: kind and display unit.
#[derive(Debug)]
pub struct CatalogProjection<S>
where
    S: TenantStore<ProductId, ProductReadModel>,
{
    store: S,
    cursors: StreamCursors,
}

impl<S> CatalogProjection<S>
where
    S: TenantStore<ProductId, ProductReadModel>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: StreamCursors::new(),
        }
    }

    pub fn get(&self, tenant_id: TenantId, product_id: &ProductId) -> Option<ProductReadModel> {
        self.store.get(tenant_id, product_id)
    }

    pub fn list(&self, tenant_id: TenantId) -> Vec<ProductReadModel> {
        let mut products = self.store.list(tenant_id);
        products.sort_by(|a, b| a.sku.cmp(&b.sku));
        products
    }

    pub fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        let tenant_id = envelope.tenant_id();
        self.cursors.advance(
            tenant_id,
            envelope.aggregate_id(),
            envelope.sequence_number(),
            || {
                let event: ProductEvent = decode(envelope)?;
                check_stream(envelope, event.tenant_id(), event.product_id().0)?;

                match event {
                    ProductEvent::ProductCreated(e) => self.store.upsert(
                        tenant_id,
                        e.product_id,
                        ProductReadModel {
                            product_id: e.product_id,
                            sku: e.sku,
                            name: e.name,
                            kind: e.kind,
                            uom: e.uom,
                            archived: false,
                        },
                    ),
                    ProductEvent::ProductArchived(e) => {
                        self.store.update(tenant_id, e.product_id, &mut |rm: Option<ProductReadModel>| {
                            rm.map(|rm| ProductReadModel { archived: true, ..rm })
                        })
                    }
                }
                Ok(())
            },
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
            .filter(|e| e.tenant_id() == tenant_id && e.aggregate_type() == PRODUCT_AGGREGATE)
            .collect();
        self.store.clear_tenant(tenant_id);
        self.cursors.clear_tenant(tenant_id);
        replay_order(&mut envs);
        envs.iter().try_for_each(|env| self.apply_envelope(env))
    }
}

impl<S> ProductCatalog for CatalogProjection<S>
where
    S: TenantStore<ProductId, ProductReadModel>,
{
    fn uom_symbol(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Option<String>, AvailabilityError> {
        Ok(self.store.get(tenant_id, &product_id).map(|p| p.uom))
    }
}
