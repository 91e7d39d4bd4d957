//! Locations and stock moves, and the stock levels derived from them.
//!
//! Stock at a set of locations is the sum of moves crossing the boundary of
//! that set: moves coming in from outside add, moves going out subtract,
//! moves inside the set cancel out.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::NaiveDate;
use serde_json::Value as JsonValue;
use tracing::debug;

use availerp_availability::{AvailabilityError, IncomingSupply, StockLedger, StockQuery};
use availerp_core::TenantId;
use availerp_events::EventEnvelope;
use availerp_inventory::{LocationEvent, LocationId, LocationKind, MoveState, StockMoveEvent, StockMoveId};
use availerp_products::ProductId;

use super::{ProjectionError, StreamCursors, check_stream, decode, replay_order};
use crate::read_model::TenantStore;

pub const LOCATION_AGGREGATE: &str = "inventory.location";
pub const MOVE_AGGREGATE: &str = "inventory.move";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationReadModel {
    pub location_id: LocationId,
    pub code: String,
    pub name: String,
    pub kind: LocationKind,
    pub parent: Option<LocationId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveReadModel {
    pub move_id: StockMoveId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub from: LocationId,
    pub to: LocationId,
    pub planned_date: NaiveDate,
    pub effective_date: Option<NaiveDate>,
    pub state: MoveState,
}

impl MoveReadModel {
    /// Whether the move counts for a stock query ending at `date_end`.
    fn counts_for(&self, forecast: bool, date_end: Option<NaiveDate>) -> bool {
        let within = |d: NaiveDate| date_end.is_none_or(|end| d <= end);
        match self.state {
            MoveState::Done => self.effective_date.is_some_and(within),
            MoveState::Draft | MoveState::Assigned => forecast && within(self.planned_date),
            MoveState::Cancelled => false,
        }
    }

    /// Signed effect of this move on the stock of `scope`.
    fn delta(&self, scope: &HashSet<LocationId>) -> i64 {
        match (scope.contains(&self.from), scope.contains(&self.to)) {
            (false, true) => self.quantity,
            (true, false) => -self.quantity,
            _ => 0,
        }
    }
}

/// Inventory read side: the location tree plus every stock move.
#[derive(Debug)]
pub struct StockLedgerProjection<LS, MS>
where
    LS: TenantStore<LocationId, LocationReadModel>,
    MS: TenantStore<StockMoveId, MoveReadModel>,
{
    locations: LS,
    moves: MS,
    cursors: StreamCursors,
}

impl<LS, MS> StockLedgerProjection<LS, MS>
where
    LS: TenantStore<LocationId, LocationReadModel>,
    MS: TenantStore<StockMoveId, MoveReadModel>,
{
    pub fn new(locations: LS, moves: MS) -> Self {
        Self {
            locations,
            moves,
            cursors: StreamCursors::new(),
        }
    }

    pub fn location(&self, tenant_id: TenantId, location_id: &LocationId) -> Option<LocationReadModel> {
        self.locations.get(tenant_id, location_id)
    }

    pub fn stock_move(&self, tenant_id: TenantId, move_id: &StockMoveId) -> Option<MoveReadModel> {
        self.moves.get(tenant_id, move_id)
    }

    pub fn moves(&self, tenant_id: TenantId) -> Vec<MoveReadModel> {
        self.moves.list(tenant_id)
    }

    /// `roots`, plus every descendant when `with_children` is set.
    pub fn scope(
        &self,
        tenant_id: TenantId,
        roots: &[LocationId],
        with_children: bool,
    ) -> HashSet<LocationId> {
        let mut scope: HashSet<LocationId> = roots.iter().copied().collect();
        if !with_children {
            return scope;
        }

        let mut children: HashMap<LocationId, Vec<LocationId>> = HashMap::new();
        for loc in self.locations.list(tenant_id) {
            if let Some(parent) = loc.parent {
                children.entry(parent).or_default().push(loc.location_id);
            }
        }

        let mut queue: VecDeque<LocationId> = roots.iter().copied().collect();
        while let Some(next) = queue.pop_front() {
            for child in children.get(&next).into_iter().flatten() {
                if scope.insert(*child) {
                    queue.push_back(*child);
                }
            }
        }
        scope
    }

    pub fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        match envelope.aggregate_type() {
            LOCATION_AGGREGATE => self.advance(envelope, || self.apply_location(envelope)),
            MOVE_AGGREGATE => self.advance(envelope, || self.apply_move(envelope)),
            _ => Ok(()),
        }
    }

    /// Drop everything known about `tenant_id` and replay its history.
    ///
    /// Envelopes of other tenants or aggregate types are ignored.
    pub fn rebuild_tenant(
        &self,
        tenant_id: TenantId,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), ProjectionError> {
        let mut envs: Vec<_> = envelopes
            .into_iter()
            .filter(|e| {
                e.tenant_id() == tenant_id
                    && matches!(e.aggregate_type(), LOCATION_AGGREGATE | MOVE_AGGREGATE)
            })
            .collect();
        self.locations.clear_tenant(tenant_id);
        self.moves.clear_tenant(tenant_id);
        self.cursors.clear_tenant(tenant_id);
        replay_order(&mut envs);
        envs.iter().try_for_each(|env| self.apply_envelope(env))
    }

    fn advance(
        &self,
        envelope: &EventEnvelope<JsonValue>,
        apply: impl FnOnce() -> Result<(), ProjectionError>,
    ) -> Result<(), ProjectionError> {
        self.cursors.advance(
            envelope.tenant_id(),
            envelope.aggregate_id(),
            envelope.sequence_number(),
            apply,
        )?;
        Ok(())
    }

    fn apply_location(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        let event: LocationEvent = decode(envelope)?;
        let LocationEvent::LocationCreated(e) = event;
        check_stream(envelope, e.tenant_id, e.location_id.0)?;
        self.locations.upsert(
            e.tenant_id,
            e.location_id,
            LocationReadModel {
                location_id: e.location_id,
                code: e.code,
                name: e.name,
                kind: e.kind,
                parent: e.parent,
            },
        );
        Ok(())
    }

    fn apply_move(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        let event: StockMoveEvent = decode(envelope)?;
        let tenant_id = event.tenant_id();
        check_stream(envelope, tenant_id, event.move_id().0)?;

        match event {
            StockMoveEvent::MovePlanned(e) => self.moves.upsert(
                tenant_id,
                e.move_id,
                MoveReadModel {
                    move_id: e.move_id,
                    product_id: e.product_id,
                    quantity: e.quantity,
                    from: e.from,
                    to: e.to,
                    planned_date: e.planned_date,
                    effective_date: None,
                    state: MoveState::Draft,
                },
            ),
            StockMoveEvent::MoveAssigned(e) => {
                self.set_state(tenant_id, e.move_id, MoveState::Assigned, None)
            }
            StockMoveEvent::MoveDone(e) => {
                self.set_state(tenant_id, e.move_id, MoveState::Done, Some(e.effective_date))
            }
            StockMoveEvent::MoveCancelled(e) => {
                self.set_state(tenant_id, e.move_id, MoveState::Cancelled, None)
            }
        }
        Ok(())
    }

    fn set_state(
        &self,
        tenant_id: TenantId,
        move_id: StockMoveId,
        state: MoveState,
        effective_date: Option<NaiveDate>,
    ) {
        self.moves
            .update(tenant_id, move_id, &mut |rm: Option<MoveReadModel>| {
                rm.map(|rm| MoveReadModel {
                    state,
                    effective_date: effective_date.or(rm.effective_date),
                    ..rm
                })
            });
    }
}

impl<LS, MS> StockLedger for StockLedgerProjection<LS, MS>
where
    LS: TenantStore<LocationId, LocationReadModel>,
    MS: TenantStore<StockMoveId, MoveReadModel>,
{
    fn warehouses(&self, tenant_id: TenantId) -> Result<Vec<LocationId>, AvailabilityError> {
        let mut warehouses: Vec<LocationId> = self
            .locations
            .list(tenant_id)
            .into_iter()
            .filter(|l| l.kind == LocationKind::Warehouse)
            .map(|l| l.location_id)
            .collect();
        warehouses.sort();
        Ok(warehouses)
    }

    fn product_quantities(
        &self,
        tenant_id: TenantId,
        query: &StockQuery,
    ) -> Result<HashMap<ProductId, i64>, AvailabilityError> {
        let scope = self.scope(tenant_id, &query.locations, query.with_children);
        let mut quantities: HashMap<ProductId, i64> =
            query.products.iter().map(|p| (*p, 0)).collect();

        for mv in self.moves.list(tenant_id) {
            let Some(qty) = quantities.get_mut(&mv.product_id) else {
                continue;
            };
            if mv.counts_for(query.forecast, query.date_end) {
                *qty = qty
                    .checked_add(mv.delta(&scope))
                    .ok_or(AvailabilityError::QuantityOverflow(mv.product_id))?;
            }
        }

        debug!(
            %tenant_id,
            locations = scope.len(),
            products = quantities.len(),
            forecast = query.forecast,
            "computed product quantities"
        );
        Ok(quantities)
    }

    fn incoming_supply(
        &self,
        tenant_id: TenantId,
        locations: &[LocationId],
        product_id: ProductId,
    ) -> Result<Option<IncomingSupply>, AvailabilityError> {
        let scope = self.scope(tenant_id, locations, true);
        let incoming: Vec<MoveReadModel> = self
            .moves
            .list(tenant_id)
            .into_iter()
            .filter(|mv| {
                mv.product_id == product_id
                    && mv.state.is_pending()
                    && scope.contains(&mv.to)
                    && !scope.contains(&mv.from)
            })
            .collect();

        let Some(date) = incoming.iter().map(|mv| mv.planned_date).min() else {
            return Ok(None);
        };
        let quantity = incoming
            .iter()
            .filter(|mv| mv.planned_date == date)
            .try_fold(0i64, |acc, mv| acc.checked_add(mv.quantity))
            .ok_or(AvailabilityError::QuantityOverflow(product_id))?;
        Ok(Some(IncomingSupply { date, quantity }))
    }
}
