//! `availerp-core`: building blocks shared by every domain crate.
//!
//! Pure domain primitives only: identifiers, the error model and the
//! aggregate contract. Nothing here performs IO.

pub mod aggregate;
pub mod error;
pub mod id;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, TenantId, UserId};
