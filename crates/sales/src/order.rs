use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use availerp_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId};
use availerp_events::Event;
use availerp_inventory::LocationId;
use availerp_products::ProductId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SalesOrderId(pub AggregateId);

impl SalesOrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for SalesOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A line is addressed by its order and its 1-based position.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SaleLineId {
    pub order_id: SalesOrderId,
    pub line_no: u32,
}

impl SaleLineId {
    pub fn new(order_id: SalesOrderId, line_no: u32) -> Self {
        Self { order_id, line_no }
    }
}

impl core::fmt::Display for SaleLineId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.order_id, self.line_no)
    }
}

/// Sales order lifecycle.
///
/// `Draft → Quotation → Confirmed → Processing → Done`, with `Cancelled`
/// reachable from the first two. `Processing` means shipments (outgoing stock
/// moves) exist for the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalesOrderStatus {
    Draft,
    Quotation,
    Confirmed,
    Processing,
    Done,
    Cancelled,
}

impl SalesOrderStatus {
    pub fn is_modifiable(self) -> bool {
        matches!(self, SalesOrderStatus::Draft | SalesOrderStatus::Quotation)
    }

    /// Whether the order's lines already exist as stock moves.
    pub fn is_shipped_out(self) -> bool {
        matches!(self, SalesOrderStatus::Processing | SalesOrderStatus::Done)
    }

    /// Finished orders: nothing left to fulfil or decide.
    pub fn is_closed(self) -> bool {
        matches!(self, SalesOrderStatus::Done | SalesOrderStatus::Cancelled)
    }

    fn can_become(self, next: SalesOrderStatus) -> bool {
        use SalesOrderStatus::*;
        matches!(
            (self, next),
            (Draft, Quotation)
                | (Quotation, Confirmed)
                | (Confirmed, Processing)
                | (Processing, Done)
                | (Draft, Cancelled)
                | (Quotation, Cancelled)
        )
    }
}

/// Product lines carry demand; comment lines only carry text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Line,
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub line_no: u32,
    pub kind: LineKind,
    pub product_id: Option<ProductId>,
    pub description: Option<String>,
    pub quantity: i64,
}

/// Aggregate root: SalesOrder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalesOrder {
    id: SalesOrderId,
    tenant_id: Option<TenantId>,
    warehouse: Option<LocationId>,
    status: SalesOrderStatus,
    lines: Vec<OrderLine>,
    version: u64,
    created: bool,
}

impl SalesOrder {
    pub fn empty(id: SalesOrderId) -> Self {
        Self {
            id,
            tenant_id: None,
            warehouse: None,
            status: SalesOrderStatus::Draft,
            lines: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> SalesOrderId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn warehouse(&self) -> Option<LocationId> {
        self.warehouse
    }

    pub fn status(&self) -> SalesOrderStatus {
        self.status
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn line(&self, line_no: u32) -> Option<&OrderLine> {
        self.lines.iter().find(|l| l.line_no == line_no)
    }

    pub fn has_product_lines(&self) -> bool {
        self.lines.iter().any(|l| l.kind == LineKind::Line)
    }
}

impl AggregateRoot for SalesOrder {
    type Id = SalesOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSalesOrder {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    /// Warehouse the order ships from; `None` means "any warehouse".
    pub warehouse: Option<LocationId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLine {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddComment {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLineQuantity {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub line_no: u32,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Payload shared by the status-only commands (quote, confirm, process, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTransition {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SalesOrderCommand {
    CreateSalesOrder(CreateSalesOrder),
    AddLine(AddLine),
    AddComment(AddComment),
    ChangeLineQuantity(ChangeLineQuantity),
    Quote(OrderTransition),
    Confirm(OrderTransition),
    Process(OrderTransition),
    Complete(OrderTransition),
    Cancel(OrderTransition),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesOrderCreated {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub warehouse: Option<LocationId>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineAdded {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAdded {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub line_no: u32,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineQuantityChanged {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub line_no: u32,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChanged {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub from: SalesOrderStatus,
    pub to: SalesOrderStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SalesOrderEvent {
    SalesOrderCreated(SalesOrderCreated),
    LineAdded(LineAdded),
    CommentAdded(CommentAdded),
    LineQuantityChanged(LineQuantityChanged),
    StatusChanged(OrderStatusChanged),
}

impl SalesOrderEvent {
    pub fn tenant_id(&self) -> TenantId {
        match self {
            SalesOrderEvent::SalesOrderCreated(e) => e.tenant_id,
            SalesOrderEvent::LineAdded(e) => e.tenant_id,
            SalesOrderEvent::CommentAdded(e) => e.tenant_id,
            SalesOrderEvent::LineQuantityChanged(e) => e.tenant_id,
            SalesOrderEvent::StatusChanged(e) => e.tenant_id,
        }
    }

    pub fn order_id(&self) -> SalesOrderId {
        match self {
            SalesOrderEvent::SalesOrderCreated(e) => e.order_id,
            SalesOrderEvent::LineAdded(e) => e.order_id,
            SalesOrderEvent::CommentAdded(e) => e.order_id,
            SalesOrderEvent::LineQuantityChanged(e) => e.order_id,
            SalesOrderEvent::StatusChanged(e) => e.order_id,
        }
    }
}

impl Event for SalesOrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SalesOrderEvent::SalesOrderCreated(_) => "sales.order.created",
            SalesOrderEvent::LineAdded(_) => "sales.order.line_added",
            SalesOrderEvent::CommentAdded(_) => "sales.order.comment_added",
            SalesOrderEvent::LineQuantityChanged(_) => "sales.order.line_quantity_changed",
            SalesOrderEvent::StatusChanged(e) => match e.to {
                SalesOrderStatus::Draft => "sales.order.reset",
                SalesOrderStatus::Quotation => "sales.order.quoted",
                SalesOrderStatus::Confirmed => "sales.order.confirmed",
                SalesOrderStatus::Processing => "sales.order.processing",
                SalesOrderStatus::Done => "sales.order.done",
                SalesOrderStatus::Cancelled => "sales.order.cancelled",
            },
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SalesOrderEvent::SalesOrderCreated(e) => e.occurred_at,
            SalesOrderEvent::LineAdded(e) => e.occurred_at,
            SalesOrderEvent::CommentAdded(e) => e.occurred_at,
            SalesOrderEvent::LineQuantityChanged(e) => e.occurred_at,
            SalesOrderEvent::StatusChanged(e) => e.occurred_at,
        }
    }
}

impl Aggregate for SalesOrder {
    type Command = SalesOrderCommand;
    type Event = SalesOrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            SalesOrderEvent::SalesOrderCreated(e) => {
                self.id = e.order_id;
                self.tenant_id = Some(e.tenant_id);
                self.warehouse = e.warehouse;
                self.status = SalesOrderStatus::Draft;
                self.lines.clear();
                self.created = true;
            }
            SalesOrderEvent::LineAdded(e) => {
                self.lines.push(OrderLine {
                    line_no: e.line_no,
                    kind: LineKind::Line,
                    product_id: Some(e.product_id),
                    description: None,
                    quantity: e.quantity,
                });
            }
            SalesOrderEvent::CommentAdded(e) => {
                self.lines.push(OrderLine {
                    line_no: e.line_no,
                    kind: LineKind::Comment,
                    product_id: None,
                    description: Some(e.description.clone()),
                    quantity: 0,
                });
            }
            SalesOrderEvent::LineQuantityChanged(e) => {
                if let Some(line) = self.lines.iter_mut().find(|l| l.line_no == e.line_no) {
                    line.quantity = e.quantity;
                }
            }
            SalesOrderEvent::StatusChanged(e) => {
                self.status = e.to;
            }
        }
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            SalesOrderCommand::CreateSalesOrder(cmd) => self.handle_create(cmd),
            SalesOrderCommand::AddLine(cmd) => self.handle_add_line(cmd),
            SalesOrderCommand::AddComment(cmd) => self.handle_add_comment(cmd),
            SalesOrderCommand::ChangeLineQuantity(cmd) => self.handle_change_quantity(cmd),
            SalesOrderCommand::Quote(cmd) => self.handle_quote(cmd),
            SalesOrderCommand::Confirm(cmd) => {
                self.transition(cmd, SalesOrderStatus::Confirmed)
            }
            SalesOrderCommand::Process(cmd) => {
                self.transition(cmd, SalesOrderStatus::Processing)
            }
            SalesOrderCommand::Complete(cmd) => self.transition(cmd, SalesOrderStatus::Done),
            SalesOrderCommand::Cancel(cmd) => {
                self.transition(cmd, SalesOrderStatus::Cancelled)
            }
        }
    }
}

impl SalesOrder {
    fn ensure_existing(&self, tenant_id: TenantId, order_id: SalesOrderId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found("sales order"));
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn ensure_modifiable(&self) -> Result<(), DomainError> {
        if !self.status.is_modifiable() {
            return Err(DomainError::invariant(
                "lines can only change while the order is a draft or quotation",
            ));
        }
        Ok(())
    }

    fn next_line_no(&self) -> u32 {
        self.lines.iter().map(|l| l.line_no).max().unwrap_or(0) + 1
    }

    fn handle_create(&self, cmd: &CreateSalesOrder) -> Result<Vec<SalesOrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("sales order already exists"));
        }
        Ok(vec![SalesOrderEvent::SalesOrderCreated(SalesOrderCreated {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            warehouse: cmd.warehouse,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_line(&self, cmd: &AddLine) -> Result<Vec<SalesOrderEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.order_id)?;
        self.ensure_modifiable()?;
        if cmd.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        Ok(vec![SalesOrderEvent::LineAdded(LineAdded {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            line_no: self.next_line_no(),
            product_id: cmd.product_id,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_comment(&self, cmd: &AddComment) -> Result<Vec<SalesOrderEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.order_id)?;
        self.ensure_modifiable()?;
        Ok(vec![SalesOrderEvent::CommentAdded(CommentAdded {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            line_no: self.next_line_no(),
            description: cmd.description.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_change_quantity(
        &self,
        cmd: &ChangeLineQuantity,
    ) -> Result<Vec<SalesOrderEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.order_id)?;
        self.ensure_modifiable()?;
        let line = self
            .line(cmd.line_no)
            .ok_or(DomainError::not_found("sale line"))?;
        if line.kind != LineKind::Line {
            return Err(DomainError::validation("comment lines have no quantity"));
        }
        if cmd.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        if cmd.quantity == line.quantity {
            return Ok(vec![]);
        }
        Ok(vec![SalesOrderEvent::LineQuantityChanged(LineQuantityChanged {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            line_no: cmd.line_no,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_quote(&self, cmd: &OrderTransition) -> Result<Vec<SalesOrderEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.order_id)?;
        if self.status == SalesOrderStatus::Draft && !self.has_product_lines() {
            return Err(DomainError::validation(
                "cannot quote an order without product lines",
            ));
        }
        self.transition(cmd, SalesOrderStatus::Quotation)
    }

    fn transition(
        &self,
        cmd: &OrderTransition,
        to: SalesOrderStatus,
    ) -> Result<Vec<SalesOrderEvent>, DomainError> {
        self.ensure_existing(cmd.tenant_id, cmd.order_id)?;
        if !self.status.can_become(to) {
            return Err(DomainError::invariant(format!(
                "cannot move order from {:?} to {:?}",
                self.status, to
            )));
        }
        Ok(vec![SalesOrderEvent::StatusChanged(OrderStatusChanged {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            from: self.status,
            to,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        tenant_id: TenantId,
        order_id: SalesOrderId,
        order: SalesOrder,
    }

    impl Fixture {
        fn created() -> Self {
            let tenant_id = TenantId::new();
            let order_id = SalesOrderId::new(AggregateId::new());
            let mut fx = Self {
                tenant_id,
                order_id,
                order: SalesOrder::empty(order_id),
            };
            fx.run(SalesOrderCommand::CreateSalesOrder(CreateSalesOrder {
                tenant_id,
                order_id,
                warehouse: None,
                occurred_at: Utc::now(),
            }))
            .unwrap();
            fx
        }

        fn run(&mut self, cmd: SalesOrderCommand) -> Result<Vec<SalesOrderEvent>, DomainError> {
            let events = self.order.handle(&cmd)?;
            for ev in &events {
                self.order.apply(ev);
            }
            Ok(events)
        }

        fn transition(&self) -> OrderTransition {
            OrderTransition {
                tenant_id: self.tenant_id,
                order_id: self.order_id,
                occurred_at: Utc::now(),
            }
        }

        fn add_line(&mut self, quantity: i64) -> Result<Vec<SalesOrderEvent>, DomainError> {
            let cmd = AddLine {
                tenant_id: self.tenant_id,
                order_id: self.order_id,
                product_id: ProductId::new(AggregateId::new()),
                quantity,
                occurred_at: Utc::now(),
            };
            self.run(SalesOrderCommand::AddLine(cmd))
        }
    }

    #[test]
    fn lines_are_numbered_across_kinds() {
        let mut fx = Fixture::created();
        fx.add_line(2).unwrap();
        let cmd = AddComment {
            tenant_id: fx.tenant_id,
            order_id: fx.order_id,
            description: "gift wrap".to_string(),
            occurred_at: Utc::now(),
        };
        fx.run(SalesOrderCommand::AddComment(cmd)).unwrap();
        fx.add_line(1).unwrap();

        let kinds: Vec<_> = fx.order.lines().iter().map(|l| (l.line_no, l.kind)).collect();
        assert_eq!(
            kinds,
            vec![(1, LineKind::Line), (2, LineKind::Comment), (3, LineKind::Line)]
        );
        assert_eq!(fx.order.line(2).unwrap().product_id, None);
    }

    #[test]
    fn full_lifecycle_to_done() {
        let mut fx = Fixture::created();
        fx.add_line(5).unwrap();
        fx.run(SalesOrderCommand::Quote(fx.transition())).unwrap();
        fx.run(SalesOrderCommand::Confirm(fx.transition())).unwrap();
        assert_eq!(fx.order.status(), SalesOrderStatus::Confirmed);
        fx.run(SalesOrderCommand::Process(fx.transition())).unwrap();
        assert!(fx.order.status().is_shipped_out());
        fx.run(SalesOrderCommand::Complete(fx.transition())).unwrap();
        assert_eq!(fx.order.status(), SalesOrderStatus::Done);
        assert!(fx.order.status().is_closed());
        assert_eq!(fx.order.version(), 6);
    }

    #[test]
    fn confirm_skipping_quotation_is_rejected() {
        let mut fx = Fixture::created();
        fx.add_line(1).unwrap();
        let err = fx.run(SalesOrderCommand::Confirm(fx.transition())).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn quote_requires_a_product_line() {
        let mut fx = Fixture::created();
        let err = fx.run(SalesOrderCommand::Quote(fx.transition())).unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("cannot quote an order without product lines")
        );
    }

    #[test]
    fn confirmed_order_lines_are_frozen() {
        let mut fx = Fixture::created();
        fx.add_line(1).unwrap();
        fx.run(SalesOrderCommand::Quote(fx.transition())).unwrap();
        fx.run(SalesOrderCommand::Confirm(fx.transition())).unwrap();
        let err = fx.add_line(1).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn change_quantity_updates_line_and_skips_no_ops() {
        let mut fx = Fixture::created();
        fx.add_line(4).unwrap();
        let mut cmd = ChangeLineQuantity {
            tenant_id: fx.tenant_id,
            order_id: fx.order_id,
            line_no: 1,
            quantity: 4,
            occurred_at: Utc::now(),
        };
        assert!(fx
            .run(SalesOrderCommand::ChangeLineQuantity(cmd.clone()))
            .unwrap()
            .is_empty());

        cmd.quantity = 9;
        fx.run(SalesOrderCommand::ChangeLineQuantity(cmd)).unwrap();
        assert_eq!(fx.order.line(1).unwrap().quantity, 9);
    }

    #[test]
    fn change_quantity_of_unknown_line_is_not_found() {
        let mut fx = Fixture::created();
        let cmd = ChangeLineQuantity {
            tenant_id: fx.tenant_id,
            order_id: fx.order_id,
            line_no: 7,
            quantity: 1,
            occurred_at: Utc::now(),
        };
        assert_eq!(
            fx.run(SalesOrderCommand::ChangeLineQuantity(cmd)).unwrap_err(),
            DomainError::not_found("sale line")
        );
    }

    #[test]
    fn cancel_only_before_confirmation() {
        let mut fx = Fixture::created();
        fx.add_line(1).unwrap();
        fx.run(SalesOrderCommand::Quote(fx.transition())).unwrap();
        fx.run(SalesOrderCommand::Confirm(fx.transition())).unwrap();
        assert!(fx.run(SalesOrderCommand::Cancel(fx.transition())).is_err());

        let mut other = Fixture::created();
        other.run(SalesOrderCommand::Cancel(other.transition())).unwrap();
        assert_eq!(other.order.status(), SalesOrderStatus::Cancelled);
    }

    #[test]
    fn status_events_are_named_after_target_state() {
        let mut fx = Fixture::created();
        fx.add_line(1).unwrap();
        let events = fx.run(SalesOrderCommand::Quote(fx.transition())).unwrap();
        assert_eq!(events[0].event_type(), "sales.order.quoted");
    }

    #[test]
    fn apply_is_deterministic() {
        let mut fx = Fixture::created();
        let mut history = vec![];
        history.extend(fx.add_line(3).unwrap());
        history.extend(fx.run(SalesOrderCommand::Quote(fx.transition())).unwrap());

        let mut replayed = SalesOrder::empty(fx.order_id);
        replayed.apply(&SalesOrderEvent::SalesOrderCreated(SalesOrderCreated {
            tenant_id: fx.tenant_id,
            order_id: fx.order_id,
            warehouse: None,
            occurred_at: Utc::now(),
        }));
        for ev in &history {
            replayed.apply(ev);
        }
        assert_eq!(replayed, fx.order);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn non_positive_quantities_never_produce_lines(quantity in -1000i64..=0) {
                let mut fx = Fixture::created();
                prop_assert!(fx.add_line(quantity).is_err());
                prop_assert!(fx.order.lines().is_empty());
            }

            #[test]
            fn line_numbers_stay_dense(count in 1usize..20) {
                let mut fx = Fixture::created();
                for _ in 0..count {
                    fx.add_line(1).unwrap();
                }
                let numbers: Vec<u32> = fx.order.lines().iter().map(|l| l.line_no).collect();
                let expected: Vec<u32> = (1..=count as u32).collect();
                prop_assert_eq!(numbers, expected);
            }
        }
    }
}
