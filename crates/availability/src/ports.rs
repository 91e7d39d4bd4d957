//! Lookups the computation needs from the rest of the ERP.
//!
//! Infra implements these over its read models; tests use small in-memory
//! fakes.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use availerp_core::TenantId;
use availerp_inventory::LocationId;
use availerp_products::ProductId;
use availerp_sales::SaleLineId;

use crate::error::AvailabilityError;

/// Tenant and business date the values are computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvailabilityContext {
    pub tenant_id: TenantId,
    pub today: NaiveDate,
}

/// Stock level query, grouped by product.
///
/// With `forecast == false` only executed moves up to `date_end` count. With
/// `forecast == true` pending moves planned up to `date_end` count as well;
/// `date_end == None` is an unbounded horizon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockQuery {
    pub locations: Vec<LocationId>,
    pub products: Vec<ProductId>,
    pub date_end: Option<NaiveDate>,
    pub forecast: bool,
    /// Include every location below the given ones.
    pub with_children: bool,
}

/// Next pending delivery into a set of locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingSupply {
    pub date: NaiveDate,
    /// Total quantity planned to arrive on `date`.
    pub quantity: i64,
}

/// A line of a confirmed order: demand not yet turned into stock moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmedLine {
    pub line_id: SaleLineId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub warehouse: Option<LocationId>,
}

/// Inventory valuation service.
pub trait StockLedger {
    /// Every warehouse of the tenant.
    fn warehouses(&self, tenant_id: TenantId) -> Result<Vec<LocationId>, AvailabilityError>;

    /// Quantities per requested product. Products without moves may be absent.
    fn product_quantities(
        &self,
        tenant_id: TenantId,
        query: &StockQuery,
    ) -> Result<HashMap<ProductId, i64>, AvailabilityError>;

    /// Earliest pending move into `locations` (or their children) from outside.
    fn incoming_supply(
        &self,
        tenant_id: TenantId,
        locations: &[LocationId],
        product_id: ProductId,
    ) -> Result<Option<IncomingSupply>, AvailabilityError>;
}

/// Sales side: demand of orders that are confirmed but not yet shipping.
pub trait ConfirmedDemand {
    /// Product lines of confirmed orders whose warehouse is one of
    /// `warehouses` or unset.
    fn confirmed_lines(
        &self,
        tenant_id: TenantId,
        warehouses: &[LocationId],
    ) -> Result<Vec<ConfirmedLine>, AvailabilityError>;
}

pub trait ProductCatalog {
    /// Unit symbol quantities of `product_id` are displayed in.
    fn uom_symbol(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Option<String>, AvailabilityError>;
}

impl<T: StockLedger + ?Sized> StockLedger for &T {
    fn warehouses(&self, tenant_id: TenantId) -> Result<Vec<LocationId>, AvailabilityError> {
        (**self).warehouses(tenant_id)
    }

    fn product_quantities(
        &self,
        tenant_id: TenantId,
        query: &StockQuery,
    ) -> Result<HashMap<ProductId, i64>, AvailabilityError> {
        (**self).product_quantities(tenant_id, query)
    }

    fn incoming_supply(
        &self,
        tenant_id: TenantId,
        locations: &[LocationId],
        product_id: ProductId,
    ) -> Result<Option<IncomingSupply>, AvailabilityError> {
        (**self).incoming_supply(tenant_id, locations, product_id)
    }
}

impl<T: ConfirmedDemand + ?Sized> ConfirmedDemand for &T {
    fn confirmed_lines(
        &self,
        tenant_id: TenantId,
        warehouses: &[LocationId],
    ) -> Result<Vec<ConfirmedLine>, AvailabilityError> {
        (**self).confirmed_lines(tenant_id, warehouses)
    }
}

impl<T: ProductCatalog + ?Sized> ProductCatalog for &T {
    fn uom_symbol(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Option<String>, AvailabilityError> {
        (**self).uom_symbol(tenant_id, product_id)
    }
}

impl<T: StockLedger + ?Sized> StockLedger for Arc<T> {
    fn warehouses(&self, tenant_id: TenantId) -> Result<Vec<LocationId>, AvailabilityError> {
        (**self).warehouses(tenant_id)
    }

    fn product_quantities(
        &self,
        tenant_id: TenantId,
        query: &StockQuery,
    ) -> Result<HashMap<ProductId, i64>, AvailabilityError> {
        (**self).product_quantities(tenant_id, query)
    }

    fn incoming_supply(
        &self,
        tenant_id: TenantId,
        locations: &[LocationId],
        product_id: ProductId,
    ) -> Result<Option<IncomingSupply>, AvailabilityError> {
        (**self).incoming_supply(tenant_id, locations, product_id)
    }
}

impl<T: ConfirmedDemand + ?Sized> ConfirmedDemand for Arc<T> {
    fn confirmed_lines(
        &self,
        tenant_id: TenantId,
        warehouses: &[LocationId],
    ) -> Result<Vec<ConfirmedLine>, AvailabilityError> {
        (**self).confirmed_lines(tenant_id, warehouses)
    }
}

impl<T: ProductCatalog + ?Sized> ProductCatalog for Arc<T> {
    fn uom_symbol(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
    ) -> Result<Option<String>, AvailabilityError> {
        (**self).uom_symbol(tenant_id, product_id)
    }
}
