use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use availerp_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId};
use availerp_events::Event;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub AggregateId);

impl LocationId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for LocationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Warehouses are tree roots; storage locations hang below them. Supplier,
/// customer and lost locations sit outside every warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    Warehouse,
    Storage,
    Supplier,
    Customer,
    Lost,
}

impl LocationKind {
    /// Whether a location of this kind can hold physical stock.
    pub fn is_internal(self) -> bool {
        matches!(self, LocationKind::Warehouse | LocationKind::Storage)
    }
}

/// Aggregate root: Location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    id: LocationId,
    tenant_id: Option<TenantId>,
    code: String,
    name: String,
    kind: LocationKind,
    parent: Option<LocationId>,
    version: u64,
    created: bool,
}

impl Location {
    pub fn empty(id: LocationId) -> Self {
        Self {
            id,
            tenant_id: None,
            code: String::new(),
            name: String::new(),
            kind: LocationKind::Storage,
            parent: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> LocationId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> LocationKind {
        self.kind
    }

    pub fn parent(&self) -> Option<LocationId> {
        self.parent
    }
}

impl AggregateRoot for Location {
    type Id = LocationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLocation {
    pub tenant_id: TenantId,
    pub location_id: LocationId,
    pub code: String,
    pub name: String,
    pub kind: LocationKind,
    pub parent: Option<LocationId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationCommand {
    CreateLocation(CreateLocation),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationCreated {
    pub tenant_id: TenantId,
    pub location_id: LocationId,
    pub code: String,
    pub name: String,
    pub kind: LocationKind,
    pub parent: Option<LocationId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationEvent {
    LocationCreated(LocationCreated),
}

impl Event for LocationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            LocationEvent::LocationCreated(_) => "inventory.location.created",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            LocationEvent::LocationCreated(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Location {
    type Command = LocationCommand;
    type Event = LocationEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            LocationEvent::LocationCreated(e) => {
                self.id = e.location_id;
                self.tenant_id = Some(e.tenant_id);
                self.code = e.code.clone();
                self.name = e.name.clone();
                self.kind = e.kind;
                self.parent = e.parent;
                self.created = true;
            }
        }
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            LocationCommand::CreateLocation(cmd) => self.handle_create(cmd),
        }
    }
}

impl Location {
    fn handle_create(&self, cmd: &CreateLocation) -> Result<Vec<LocationEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("location already exists"));
        }
        let code = cmd.code.trim();
        if code.is_empty() {
            return Err(DomainError::validation("code cannot be empty"));
        }
        match (cmd.kind, cmd.parent) {
            (LocationKind::Warehouse, Some(_)) => {
                return Err(DomainError::validation("a warehouse cannot have a parent"));
            }
            (LocationKind::Storage, None) => {
                return Err(DomainError::validation("a storage location needs a parent"));
            }
            (_, Some(parent)) if parent == cmd.location_id => {
                return Err(DomainError::validation("a location cannot be its own parent"));
            }
            _ => {}
        }

        Ok(vec![LocationEvent::LocationCreated(LocationCreated {
            tenant_id: cmd.tenant_id,
            location_id: cmd.location_id,
            code: code.to_string(),
            name: cmd.name.trim().to_string(),
            kind: cmd.kind,
            parent: cmd.parent,
            occurred_at: cmd.occurred_at,
        })])
    }
}
