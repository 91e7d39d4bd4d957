//! Inputs and outputs of the line availability computation.

use serde::{Deserialize, Serialize};

use availerp_inventory::LocationId;
use availerp_products::ProductId;
use availerp_sales::{LineKind, SaleLineId, SalesOrderStatus};

/// One of the computed line fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantityField {
    Available,
    Forecast,
    IncomingSupply,
}

impl QuantityField {
    pub const ALL: [QuantityField; 3] = [
        QuantityField::Available,
        QuantityField::Forecast,
        QuantityField::IncomingSupply,
    ];
}

/// The parts of the parent order a line's availability depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderContext {
    pub status: SalesOrderStatus,
    pub warehouse: Option<LocationId>,
}

impl OrderContext {
    /// Whether this order's own quantities are still absent from stock moves.
    ///
    /// Draft, quotation and confirmed orders have no outgoing moves yet, so
    /// their demand has to be subtracted from forecast stock explicitly.
    pub fn holds_unshipped_demand(&self) -> bool {
        matches!(
            self.status,
            SalesOrderStatus::Draft | SalesOrderStatus::Quotation | SalesOrderStatus::Confirmed
        )
    }
}

/// A sale line as the user currently sees it.
///
/// `line_id` is `None` for a line that has not been saved yet; `quantity` is
/// the value being edited, which may differ from what is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLineSnapshot {
    pub line_id: Option<SaleLineId>,
    pub order: OrderContext,
    pub kind: LineKind,
    pub product_id: Option<ProductId>,
    pub quantity: i64,
}

impl SaleLineSnapshot {
    /// Product of a line that takes part in availability, if any.
    pub fn stock_product(&self) -> Option<ProductId> {
        match self.kind {
            LineKind::Line => self.product_id,
            LineKind::Comment => None,
        }
    }
}

/// Computed, non-persisted values for one line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineQuantities {
    pub line_id: Option<SaleLineId>,
    pub available: Option<i64>,
    pub forecast: Option<i64>,
    /// e.g. `"03/14/2024 (100 u)"`.
    pub incoming_supply: Option<String>,
    pub visibility: FieldVisibility,
}

impl LineQuantities {
    pub fn empty(line_id: Option<SaleLineId>, status: SalesOrderStatus) -> Self {
        Self {
            line_id,
            available: None,
            forecast: None,
            incoming_supply: None,
            visibility: field_visibility(status),
        }
    }
}

/// UI state of the computed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldVisibility {
    pub invisible: bool,
}

/// Availability is meaningless once the order is finished or cancelled.
pub fn field_visibility(status: SalesOrderStatus) -> FieldVisibility {
    FieldVisibility {
        invisible: status.is_closed(),
    }
}
