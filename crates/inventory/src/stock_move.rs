use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use availerp_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId};
use availerp_events::Event;
use availerp_products::ProductId;

use crate::location::LocationId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockMoveId(pub AggregateId);

impl StockMoveId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for StockMoveId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Move lifecycle. `Done` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveState {
    Draft,
    Assigned,
    Done,
    Cancelled,
}

impl MoveState {
    /// Planned but not yet executed: counts towards forecast only.
    pub fn is_pending(self) -> bool {
        matches!(self, MoveState::Draft | MoveState::Assigned)
    }
}

/// Aggregate root: StockMove.
///
/// A quantity of one product travelling from one location to another,
/// planned for a date and eventually executed on an effective date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockMove {
    id: StockMoveId,
    tenant_id: Option<TenantId>,
    product_id: Option<ProductId>,
    quantity: i64,
    from: Option<LocationId>,
    to: Option<LocationId>,
    planned_date: Option<NaiveDate>,
    effective_date: Option<NaiveDate>,
    state: MoveState,
    version: u64,
    created: bool,
}

impl StockMove {
    pub fn empty(id: StockMoveId) -> Self {
        Self {
            id,
            tenant_id: None,
            product_id: None,
            quantity: 0,
            from: None,
            to: None,
            planned_date: None,
            effective_date: None,
            state: MoveState::Draft,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> StockMoveId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn product_id(&self) -> Option<ProductId> {
        self.product_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn from(&self) -> Option<LocationId> {
        self.from
    }

    pub fn to(&self) -> Option<LocationId> {
        self.to
    }

    pub fn planned_date(&self) -> Option<NaiveDate> {
        self.planned_date
    }

    pub fn effective_date(&self) -> Option<NaiveDate> {
        self.effective_date
    }

    pub fn state(&self) -> MoveState {
        self.state
    }
}

impl AggregateRoot for StockMove {
    type Id = StockMoveId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanMove {
    pub tenant_id: TenantId,
    pub move_id: StockMoveId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub from: LocationId,
    pub to: LocationId,
    pub planned_date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignMove {
    pub tenant_id: TenantId,
    pub move_id: StockMoveId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoMove {
    pub tenant_id: TenantId,
    pub move_id: StockMoveId,
    pub effective_date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelMove {
    pub tenant_id: TenantId,
    pub move_id: StockMoveId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockMoveCommand {
    PlanMove(PlanMove),
    AssignMove(AssignMove),
    DoMove(DoMove),
    CancelMove(CancelMove),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePlanned {
    pub tenant_id: TenantId,
    pub move_id: StockMoveId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub from: LocationId,
    pub to: LocationId,
    pub planned_date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveAssigned {
    pub tenant_id: TenantId,
    pub move_id: StockMoveId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDone {
    pub tenant_id: TenantId,
    pub move_id: StockMoveId,
    pub effective_date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCancelled {
    pub tenant_id: TenantId,
    pub move_id: StockMoveId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockMoveEvent {
    MovePlanned(MovePlanned),
    MoveAssigned(MoveAssigned),
    MoveDone(MoveDone),
    MoveCancelled(MoveCancelled),
}

impl StockMoveEvent {
    pub fn tenant_id(&self) -> TenantId {
        match self {
            StockMoveEvent::MovePlanned(e) => e.tenant_id,
            StockMoveEvent::MoveAssigned(e) => e.tenant_id,
            StockMoveEvent::MoveDone(e) => e.tenant_id,
            StockMoveEvent::MoveCancelled(e) => e.tenant_id,
        }
    }

    pub fn move_id(&self) -> StockMoveId {
        match self {
            StockMoveEvent::MovePlanned(e) => e.move_id,
            StockMoveEvent::MoveAssigned(e) => e.move_id,
            StockMoveEvent::MoveDone(e) => e.move_id,
            StockMoveEvent::MoveCancelled(e) => e.move_id,
        }
    }
}

impl Event for StockMoveEvent {
    fn event_type(&self) -> &'static str {
        match self {
            StockMoveEvent::MovePlanned(_) => "inventory.move.planned",
            StockMoveEvent::MoveAssigned(_) => "inventory.move.assigned",
            StockMoveEvent::MoveDone(_) => "inventory.move.done",
            StockMoveEvent::MoveCancelled(_) => "inventory.move.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            StockMoveEvent::MovePlanned(e) => e.occurred_at,
            StockMoveEvent::MoveAssigned(e) => e.occurred_at,
            StockMoveEvent::MoveDone(e) => e.occurred_at,
            StockMoveEvent::MoveCancelled(e) => e.occurred_at,
        }
    }
}

impl Aggregate for StockMove {
    type Command = StockMoveCommand;
    type Event = StockMoveEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            StockMoveEvent::MovePlanned(e) => {
                self.id = e.move_id;
                self.tenant_id = Some(e.tenant_id);
                self.product_id = Some(e.product_id);
                self.quantity = e.quantity;
                self.from = Some(e.from);
                self.to = Some(e.to);
                self.planned_date = Some(e.planned_date);
                self.state = MoveState::Draft;
                self.created = true;
            }
            StockMoveEvent::MoveAssigned(_) => {
                self.state = MoveState::Assigned;
            }
            StockMoveEvent::MoveDone(e) => {
                self.state = MoveState::Done;
                self.effective_date = Some(e.effective_date);
            }
            StockMoveEvent::MoveCancelled(_) => {
                self.state = MoveState::Cancelled;
            }
        }
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            StockMoveCommand::PlanMove(cmd) => self.handle_plan(cmd),
            StockMoveCommand::AssignMove(cmd) => self.handle_assign(cmd),
            StockMoveCommand::DoMove(cmd) => self.handle_do(cmd),
            StockMoveCommand::CancelMove(cmd) => self.handle_cancel(cmd),
        }
    }
}

impl StockMove {
    fn ensure_existing(&self, tenant_id: TenantId, move_id: StockMoveId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found("stock move"));
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        if self.id != move_id {
            return Err(DomainError::invariant("move_id mismatch"));
        }
        Ok(())
    }

    fn handle_plan(&self, cmd: &PlanMove) -> Result<Vec<StockMoveEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("stock move already exists"));
        }
        if cmd.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if cmd.from == cmd.to {
            return Err(DomainError::validation(
                "source and destination must differ",
            ));
        }

        Ok(vec![StockMoveEvent::MovePlanned(MovePlanned {
            tenant_id: cmd.tenant_id,
            move_id: cmd.move_id,
            product_id: cmd.product_id,
            quantity: cmd.quantity,
            from: cmd.from,
            to: cmd.to,
            planned_date: cmd.planned_date,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_assign(&self, cmd: &AssignMove) -> Result<Vec<StockMoveEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.move_id)?;
        if self.state != MoveState::Draft {
            return Err(DomainError::invariant("only draft moves can be assigned"));
        }
        Ok(vec![StockMoveEvent::MoveAssigned(MoveAssigned {
            tenant_id: cmd.tenant_id,
            move_id: cmd.move_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_do(&self, cmd: &DoMove) -> Result<Vec<StockMoveEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.move_id)?;
        if !self.state.is_pending() {
            return Err(DomainError::invariant(
                "only draft or assigned moves can be done",
            ));
        }
        Ok(vec![StockMoveEvent::MoveDone(MoveDone {
            tenant_id: cmd.tenant_id,
            move_id: cmd.move_id,
            effective_date: cmd.effective_date,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelMove) -> Result<Vec<StockMoveEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.move_id)?;
        if !self.state.is_pending() {
            return Err(DomainError::invariant(
                "only draft or assigned moves can be cancelled",
            ));
        }
        Ok(vec![StockMoveEvent::MoveCancelled(MoveCancelled {
            tenant_id: cmd.tenant_id,
            move_id: cmd.move_id,
            occurred_at: cmd.occurred_at,
        })])
    }
}
