//! Inventory domain (event-sourced): the location tree and stock moves.
//!
//! Stock levels are never stored on an aggregate; they are derived by summing
//! moves that cross a location subtree boundary (see the infra stock ledger).

pub mod location;
pub mod stock_move;

pub use location::{
    CreateLocation, Location, LocationCommand, LocationCreated, LocationEvent, LocationId,
    LocationKind,
};
pub use stock_move::{
    AssignMove, CancelMove, DoMove, MoveAssigned, MoveCancelled, MoveDone, MovePlanned, MoveState,
    PlanMove, StockMove, StockMoveCommand, StockMoveEvent, StockMoveId,
};
