//! Live stock availability for sales order lines.
//!
//! For a batch of sale lines this crate derives three display-only values:
//! on-hand stock, forecast stock net of confirmed demand, and the next
//! expected incoming delivery. Nothing is persisted; the inputs come from the
//! inventory and sales read models through the traits in [`ports`].

pub mod compute;
pub mod error;
pub mod format;
pub mod model;
pub mod ports;

pub use compute::{AvailabilityOptions, LineAvailability};
pub use error::AvailabilityError;
pub use format::{DEFAULT_DATE_FORMAT, SupplyFormat};
pub use model::{
    FieldVisibility, LineQuantities, OrderContext, QuantityField, SaleLineSnapshot,
    field_visibility,
};
pub use ports::{
    AvailabilityContext, ConfirmedDemand, ConfirmedLine, IncomingSupply, ProductCatalog,
    StockLedger, StockQuery,
};
