use thiserror::Error;

use availerp_core::DomainError;
use availerp_products::ProductId;

/// Failure while assembling line availability.
///
/// Lookup failures carry the backing service's message. Once its inputs are
/// loaded the computation only fails when a quantity sum leaves `i64`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AvailabilityError {
    #[error("stock lookup failed: {0}")]
    Stock(String),

    #[error("confirmed demand lookup failed: {0}")]
    Demand(String),

    #[error("catalog lookup failed: {0}")]
    Catalog(String),

    #[error("invalid date format: {0:?}")]
    DateFormat(String),

    #[error("quantity overflow for product {0}")]
    QuantityOverflow(ProductId),

    #[error(transparent)]
    Domain(#[from] DomainError),
}
