//! Sales orders (event-sourced).
//!
//! Business rules only: no IO, no storage, no stock lookups. Availability of
//! the products on a line is computed by `availerp-availability`.

pub mod order;

pub use order::{
    AddComment, AddLine, ChangeLineQuantity, CommentAdded, CreateSalesOrder, LineAdded, LineKind,
    LineQuantityChanged, OrderLine, OrderStatusChanged, OrderTransition, SaleLineId, SalesOrder,
    SalesOrderCommand, SalesOrderCreated, SalesOrderEvent, SalesOrderId, SalesOrderStatus,
};
