//! Turns confirmed sales orders into outgoing stock moves.
//!
//! Planning a shipment moves an order from `Confirmed` to `Processing`: its
//! demand stops being "confirmed demand" and becomes pending moves out of the
//! warehouse, which the stock ledger already counts in forecast stock.
//!
//! The moves are planned before the order transition. If the transition
//! loses against another planner, or any step fails, the moves planned so
//! far are cancelled again.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use availerp_core::{AggregateId, TenantId};
use availerp_events::{EventBus, EventEnvelope};
use availerp_inventory::{
    CancelMove, DoMove, LocationId, PlanMove, StockMove, StockMoveCommand, StockMoveId,
};
use availerp_sales::{
    LineKind, OrderTransition, SalesOrder, SalesOrderCommand, SalesOrderId, SalesOrderStatus,
};

use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::event_store::EventStore;
use crate::projections::sales_lines::SALES_ORDER_AGGREGATE;
use crate::projections::stock_ledger::MOVE_AGGREGATE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentRequest {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    /// Ship-from location when the order has no warehouse.
    pub from: Option<LocationId>,
    /// Customer location the goods go to.
    pub to: LocationId,
    pub planned_date: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

/// Moves planned for one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub tenant_id: TenantId,
    pub order_id: SalesOrderId,
    pub moves: Vec<StockMoveId>,
}

pub struct ShipmentPlanner<'a, S, B> {
    dispatcher: &'a CommandDispatcher<S, B>,
}

impl<'a, S, B> ShipmentPlanner<'a, S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    pub fn new(dispatcher: &'a CommandDispatcher<S, B>) -> Self {
        Self { dispatcher }
    }

    /// Plan one outgoing move per product line, then mark the order processing.
    pub fn plan(&self, req: &ShipmentRequest) -> Result<Shipment, DispatchError> {
        let order: SalesOrder = self
            .dispatcher
            .load(req.tenant_id, req.order_id.0, |_, id| {
                SalesOrder::empty(SalesOrderId::new(id))
            })?;
        if order.tenant_id().is_none() {
            return Err(DispatchError::NotFound("sales order"));
        }
        if order.status() != SalesOrderStatus::Confirmed {
            return Err(DispatchError::InvariantViolation(format!(
                "only confirmed orders can be shipped (status: {:?})",
                order.status()
            )));
        }
        let from = order.warehouse().or(req.from).ok_or_else(|| {
            DispatchError::Validation("order has no warehouse and no ship-from location".into())
        })?;

        let mut moves = Vec::new();
        let planned: Result<(), DispatchError> = order
            .lines()
            .iter()
            .filter(|l| l.kind == LineKind::Line)
            .filter_map(|l| l.product_id.map(|p| (p, l.quantity)))
            .try_for_each(|(product_id, quantity)| {
                let move_id = StockMoveId::new(AggregateId::new());
                let cmd = StockMoveCommand::PlanMove(PlanMove {
                    tenant_id: req.tenant_id,
                    move_id,
                    product_id,
                    quantity,
                    from,
                    to: req.to,
                    planned_date: req.planned_date,
                    occurred_at: req.occurred_at,
                });
                self.dispatch_move(req.tenant_id, move_id, cmd)?;
                moves.push(move_id);
                Ok(())
            });

        // The order version serialises concurrent planners: only one
        // `Process` commits, the losers withdraw their moves.
        if let Err(err) = planned.and_then(|()| {
            self.transition(req.tenant_id, req.order_id, req.occurred_at, SalesOrderCommand::Process)
        }) {
            self.withdraw(req.tenant_id, &moves, req.occurred_at);
            return Err(err);
        }

        info!(
            tenant_id = %req.tenant_id,
            order_id = %req.order_id,
            moves = moves.len(),
            "shipment planned"
        );

        Ok(Shipment {
            tenant_id: req.tenant_id,
            order_id: req.order_id,
            moves,
        })
    }

    /// Execute every move of a shipment and complete the order.
    pub fn deliver(
        &self,
        shipment: &Shipment,
        effective_date: NaiveDate,
        occurred_at: DateTime<Utc>,
    ) -> Result<(), DispatchError> {
        for &move_id in &shipment.moves {
            let cmd = StockMoveCommand::DoMove(DoMove {
                tenant_id: shipment.tenant_id,
                move_id,
                effective_date,
                occurred_at,
            });
            self.dispatch_move(shipment.tenant_id, move_id, cmd)?;
        }
        self.transition(
            shipment.tenant_id,
            shipment.order_id,
            occurred_at,
            SalesOrderCommand::Complete,
        )?;
        info!(
            tenant_id = %shipment.tenant_id,
            order_id = %shipment.order_id,
            "shipment delivered"
        );
        Ok(())
    }

    fn dispatch_move(
        &self,
        tenant_id: TenantId,
        move_id: StockMoveId,
        cmd: StockMoveCommand,
    ) -> Result<(), DispatchError> {
        self.dispatcher
            .dispatch(tenant_id, move_id.0, MOVE_AGGREGATE, cmd, |_, id| {
                StockMove::empty(StockMoveId::new(id))
            })?;
        Ok(())
    }

    /// Cancel moves planned by a failed `plan` so they stop counting.
    fn withdraw(&self, tenant_id: TenantId, moves: &[StockMoveId], occurred_at: DateTime<Utc>) {
        for &move_id in moves {
            let cmd = StockMoveCommand::CancelMove(CancelMove {
                tenant_id,
                move_id,
                occurred_at,
            });
            if let Err(err) = self.dispatch_move(tenant_id, move_id, cmd) {
                warn!(%tenant_id, %move_id, error = %err, "could not withdraw planned move");
            }
        }
    }

    fn transition(
        &self,
        tenant_id: TenantId,
        order_id: SalesOrderId,
        occurred_at: DateTime<Utc>,
        command: fn(OrderTransition) -> SalesOrderCommand,
    ) -> Result<(), DispatchError> {
        let cmd = command(OrderTransition {
            tenant_id,
            order_id,
            occurred_at,
        });
        self.dispatcher
            .dispatch(tenant_id, order_id.0, SALES_ORDER_AGGREGATE, cmd, |_, id| {
                SalesOrder::empty(SalesOrderId::new(id))
            })?;
        Ok(())
    }
}
