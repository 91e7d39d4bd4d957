//! Host ERP plumbing around the availability computation.
//!
//! Event store and command dispatch for the domain aggregates, in-memory read
//! models that implement the availability lookups, shipment planning,
//! configuration and the background projection worker.

pub mod command_dispatcher;
pub mod config;
pub mod event_store;
pub mod fulfillment;
pub mod projections;
pub mod read_model;
pub mod read_side;
pub mod workers;


pub use command_dispatcher::{CommandDispatcher, DispatchError};
pub use config::{AvailabilityConfig, ConfigError};
pub use fulfillment::{Shipment, ShipmentPlanner, ShipmentRequest};
pub use read_side::{AvailabilityReadSide, ReadSideError};
pub use workers::{ProjectionWorker, WorkerHandle, WorkerStats};
