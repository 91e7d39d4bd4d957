//! Event contracts shared by the domain crates and the infrastructure layer.
//!
//! Domain crates implement [`Event`] for their event enums; infra wraps them in
//! an [`EventEnvelope`] once persisted and fans them out over an [`EventBus`].

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;
pub mod tenant;

pub use bus::{EventBus, Subscription};
pub use envelope::{EventEnvelope, StreamPosition};
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use tenant::TenantScoped;
