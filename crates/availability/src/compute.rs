//! Per-line aggregation of stock and confirmed demand.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::Days;
use tracing::{debug, instrument};

use availerp_inventory::LocationId;
use availerp_products::ProductId;
use availerp_sales::SaleLineId;

use crate::error::AvailabilityError;
use crate::format::SupplyFormat;
use crate::model::{LineQuantities, QuantityField, SaleLineSnapshot};
use crate::ports::{
    AvailabilityContext, ConfirmedDemand, ProductCatalog, StockLedger, StockQuery,
};

/// Tunables supplied by configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityOptions {
    pub supply_format: SupplyFormat,
    /// Forecast horizon in days from today; `None` is unbounded.
    pub forecast_horizon_days: Option<u32>,
}

/// Computes available, forecast and incoming-supply values for sale lines.
#[derive(Debug)]
pub struct LineAvailability<L, D, C> {
    ledger: L,
    demand: D,
    catalog: C,
    options: AvailabilityOptions,
}

/// Stock figures loaded for one warehouse scope.
#[derive(Debug, Default)]
struct ScopeFigures {
    on_hand: HashMap<ProductId, i64>,
    forecast: HashMap<ProductId, i64>,
    reserved: HashMap<ProductId, i64>,
    /// Persisted quantity of each confirmed line inside `reserved`.
    confirmed_by_line: HashMap<SaleLineId, i64>,
    supply: HashMap<ProductId, String>,
}

impl<L, D, C> LineAvailability<L, D, C>
where
    L: StockLedger,
    D: ConfirmedDemand,
    C: ProductCatalog,
{
    pub fn new(ledger: L, demand: D, catalog: C) -> Self {
        Self::with_options(ledger, demand, catalog, AvailabilityOptions::default())
    }

    pub fn with_options(ledger: L, demand: D, catalog: C, options: AvailabilityOptions) -> Self {
        Self {
            ledger,
            demand,
            catalog,
            options,
        }
    }

    pub fn options(&self) -> &AvailabilityOptions {
        &self.options
    }

    /// Values for `fields` on every line, in input order.
    ///
    /// Fields not requested, comment lines and lines without a product stay
    /// `None`. Lines are grouped by the warehouse of their order; an order
    /// without warehouse reads from every warehouse of the tenant.
    #[instrument(skip_all, fields(tenant_id = %ctx.tenant_id, lines = lines.len()))]
    pub fn compute(
        &self,
        ctx: &AvailabilityContext,
        lines: &[SaleLineSnapshot],
        fields: &[QuantityField],
    ) -> Result<Vec<LineQuantities>, AvailabilityError> {
        let mut results: Vec<LineQuantities> = lines
            .iter()
            .map(|l| LineQuantities::empty(l.line_id, l.order.status))
            .collect();

        let mut scopes: BTreeMap<Option<LocationId>, Vec<usize>> = BTreeMap::new();
        for (idx, line) in lines.iter().enumerate() {
            if line.stock_product().is_some() {
                scopes.entry(line.order.warehouse).or_default().push(idx);
            }
        }
        if scopes.is_empty() || fields.is_empty() {
            return Ok(results);
        }

        let mut all_warehouses: Option<Vec<LocationId>> = None;
        for (scope, indices) in scopes {
            let locations = match scope {
                Some(warehouse) => vec![warehouse],
                None => match &all_warehouses {
                    Some(w) => w.clone(),
                    None => {
                        let w = self.ledger.warehouses(ctx.tenant_id)?;
                        all_warehouses = Some(w.clone());
                        w
                    }
                },
            };

            let products: Vec<ProductId> = indices
                .iter()
                .filter_map(|&i| lines[i].stock_product())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();

            let figures = self.load_scope(ctx, &locations, &products, fields)?;
            debug!(
                scope = ?scope,
                locations = locations.len(),
                products = products.len(),
                "loaded stock figures"
            );

            for idx in indices {
                fill_line(&mut results[idx], &lines[idx], &figures, fields)?;
            }
        }

        Ok(results)
    }

    /// Recompute everything after the line's product changed.
    pub fn on_change_product(
        &self,
        ctx: &AvailabilityContext,
        line: &SaleLineSnapshot,
    ) -> Result<LineQuantities, AvailabilityError> {
        if line.stock_product().is_none() {
            return Ok(LineQuantities::empty(line.line_id, line.order.status));
        }
        self.single(ctx, line, &QuantityField::ALL)
    }

    /// Recompute the forecast after the line's quantity changed.
    ///
    /// On-hand stock and incoming supply do not depend on the quantity, so
    /// they are carried over from `current`.
    pub fn on_change_quantity(
        &self,
        ctx: &AvailabilityContext,
        line: &SaleLineSnapshot,
        current: &LineQuantities,
    ) -> Result<LineQuantities, AvailabilityError> {
        if line.stock_product().is_none() {
            return Ok(current.clone());
        }
        let fresh = self.single(ctx, line, &[QuantityField::Forecast])?;
        Ok(LineQuantities {
            forecast: fresh.forecast,
            visibility: fresh.visibility,
            ..current.clone()
        })
    }

    fn single(
        &self,
        ctx: &AvailabilityContext,
        line: &SaleLineSnapshot,
        fields: &[QuantityField],
    ) -> Result<LineQuantities, AvailabilityError> {
        let mut out = self.compute(ctx, std::slice::from_ref(line), fields)?;
        Ok(out
            .pop()
            .unwrap_or_else(|| LineQuantities::empty(line.line_id, line.order.status)))
    }

    fn load_scope(
        &self,
        ctx: &AvailabilityContext,
        locations: &[LocationId],
        products: &[ProductId],
        fields: &[QuantityField],
    ) -> Result<ScopeFigures, AvailabilityError> {
        let mut figures = ScopeFigures::default();

        if fields.contains(&QuantityField::Available) {
            let query = StockQuery {
                locations: locations.to_vec(),
                products: products.to_vec(),
                date_end: Some(ctx.today),
                forecast: false,
                with_children: true,
            };
            figures.on_hand = self.ledger.product_quantities(ctx.tenant_id, &query)?;
        }

        if fields.contains(&QuantityField::Forecast) {
            let date_end = self
                .options
                .forecast_horizon_days
                .and_then(|days| ctx.today.checked_add_days(Days::new(u64::from(days))));
            let query = StockQuery {
                locations: locations.to_vec(),
                products: products.to_vec(),
                date_end,
                forecast: true,
                with_children: true,
            };
            figures.forecast = self.ledger.product_quantities(ctx.tenant_id, &query)?;

            for confirmed in self.demand.confirmed_lines(ctx.tenant_id, locations)? {
                if !products.contains(&confirmed.product_id) {
                    continue;
                }
                let overflow = || AvailabilityError::QuantityOverflow(confirmed.product_id);
                let reserved = figures.reserved.entry(confirmed.product_id).or_insert(0);
                *reserved = reserved.checked_add(confirmed.quantity).ok_or_else(overflow)?;
                let by_line = figures.confirmed_by_line.entry(confirmed.line_id).or_insert(0);
                *by_line = by_line.checked_add(confirmed.quantity).ok_or_else(overflow)?;
            }
        }

        if fields.contains(&QuantityField::IncomingSupply) {
            for &product_id in products {
                let Some(supply) = self.ledger.incoming_supply(ctx.tenant_id, locations, product_id)?
                else {
                    continue;
                };
                let uom = self.catalog.uom_symbol(ctx.tenant_id, product_id)?;
                figures.supply.insert(
                    product_id,
                    self.options.supply_format.format(&supply, uom.as_deref()),
                );
            }
        }

        Ok(figures)
    }
}

fn fill_line(
    out: &mut LineQuantities,
    line: &SaleLineSnapshot,
    figures: &ScopeFigures,
    fields: &[QuantityField],
) -> Result<(), AvailabilityError> {
    let Some(product_id) = line.stock_product() else {
        return Ok(());
    };

    for field in fields {
        match field {
            QuantityField::Available => {
                out.available = Some(figures.on_hand.get(&product_id).copied().unwrap_or(0));
            }
            QuantityField::Forecast => {
                let stock = figures.forecast.get(&product_id).copied().unwrap_or(0);
                let reserved = figures.reserved.get(&product_id).copied().unwrap_or(0);
                // The line's own persisted demand is replaced by its current quantity below.
                let own_reserved = line
                    .line_id
                    .and_then(|id| figures.confirmed_by_line.get(&id).copied())
                    .unwrap_or(0);
                let own_pending = if line.order.holds_unshipped_demand() {
                    line.quantity
                } else {
                    0
                };
                let forecast = reserved
                    .checked_sub(own_reserved)
                    .and_then(|others| stock.checked_sub(others))
                    .and_then(|net| net.checked_sub(own_pending))
                    .ok_or(AvailabilityError::QuantityOverflow(product_id))?;
                out.forecast = Some(forecast);
            }
            QuantityField::IncomingSupply => {
                out.incoming_supply = figures.supply.get(&product_id).cloned();
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use chrono::NaiveDate;

    use availerp_core::{AggregateId, TenantId};
    use availerp_sales::{LineKind, SalesOrderId, SalesOrderStatus};

    use super::*;
    use crate::model::OrderContext;
    use crate::ports::{ConfirmedLine, IncomingSupply};

    #[derive(Default)]
    struct FakeLedger {
        warehouses: Vec<LocationId>,
        on_hand: HashMap<(LocationId, ProductId), i64>,
        forecast: HashMap<(LocationId, ProductId), i64>,
        supply: HashMap<ProductId, IncomingSupply>,
        queries: RefCell<Vec<StockQuery>>,
    }

    impl StockLedger for FakeLedger {
        fn warehouses(&self, _tenant_id: TenantId) -> Result<Vec<LocationId>, AvailabilityError> {
            Ok(self.warehouses.clone())
        }

        fn product_quantities(
            &self,
            _tenant_id: TenantId,
            query: &StockQuery,
        ) -> Result<HashMap<ProductId, i64>, AvailabilityError> {
            self.queries.borrow_mut().push(query.clone());
            let source = if query.forecast { &self.forecast } else { &self.on_hand };
            let mut out = HashMap::new();
            for ((location, product), qty) in source {
                if query.locations.contains(location) && query.products.contains(product) {
                    *out.entry(*product).or_insert(0) += qty;
                }
            }
            Ok(out)
        }

        fn incoming_supply(
            &self,
            _tenant_id: TenantId,
            _locations: &[LocationId],
            product_id: ProductId,
        ) -> Result<Option<IncomingSupply>, AvailabilityError> {
            Ok(self.supply.get(&product_id).copied())
        }
    }

    #[derive(Default)]
    struct FakeDemand {
        lines: Vec<ConfirmedLine>,
    }

    impl ConfirmedDemand for FakeDemand {
        fn confirmed_lines(
            &self,
            _tenant_id: TenantId,
            warehouses: &[LocationId],
        ) -> Result<Vec<ConfirmedLine>, AvailabilityError> {
            Ok(self
                .lines
                .iter()
                .filter(|l| l.warehouse.is_none_or(|w| warehouses.contains(&w)))
                .copied()
                .collect())
        }
    }

    struct Units;

    impl ProductCatalog for Units {
        fn uom_symbol(
            &self,
            _tenant_id: TenantId,
            _product_id: ProductId,
        ) -> Result<Option<String>, AvailabilityError> {
            Ok(Some("u".to_string()))
        }
    }

    struct FailingDemand;

    impl ConfirmedDemand for FailingDemand {
        fn confirmed_lines(
            &self,
            _tenant_id: TenantId,
            _warehouses: &[LocationId],
        ) -> Result<Vec<ConfirmedLine>, AvailabilityError> {
            Err(AvailabilityError::Demand("sales read model unavailable".to_string()))
        }
    }

    fn ctx() -> AvailabilityContext {
        AvailabilityContext {
            tenant_id: TenantId::new(),
            today: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
        }
    }

    fn location() -> LocationId {
        LocationId::new(AggregateId::new())
    }

    fn product() -> ProductId {
        ProductId::new(AggregateId::new())
    }

    fn line_id(line_no: u32) -> SaleLineId {
        SaleLineId::new(SalesOrderId::new(AggregateId::new()), line_no)
    }

    fn line(
        status: SalesOrderStatus,
        warehouse: Option<LocationId>,
        product_id: ProductId,
        quantity: i64,
    ) -> SaleLineSnapshot {
        SaleLineSnapshot {
            line_id: None,
            order: OrderContext { status, warehouse },
            kind: LineKind::Line,
            product_id: Some(product_id),
            quantity,
        }
    }

    #[test]
    fn draft_line_subtracts_its_own_quantity_from_forecast() {
        let wh = location();
        let p = product();
        let mut ledger = FakeLedger {
            warehouses: vec![wh],
            ..Default::default()
        };
        ledger.forecast.insert((wh, p), 100);
        let service = LineAvailability::new(ledger, FakeDemand::default(), Units);

        let out = service
            .compute(
                &ctx(),
                &[line(SalesOrderStatus::Draft, Some(wh), p, 5)],
                &QuantityField::ALL,
            )
            .unwrap();

        assert_eq!(out[0].available, Some(0));
        assert_eq!(out[0].forecast, Some(95));
        assert_eq!(out[0].incoming_supply, None);
    }

    #[test]
    fn confirmed_demand_of_other_lines_is_reserved() {
        let wh = location();
        let p = product();
        let mut ledger = FakeLedger::default();
        ledger.on_hand.insert((wh, p), 40);
        ledger.forecast.insert((wh, p), 60);
        let demand = FakeDemand {
            lines: vec![
                ConfirmedLine {
                    line_id: line_id(1),
                    product_id: p,
                    quantity: 7,
                    warehouse: Some(wh),
                },
                ConfirmedLine {
                    line_id: line_id(1),
                    product_id: p,
                    quantity: 3,
                    warehouse: None,
                },
            ],
        };
        let service = LineAvailability::new(ledger, demand, Units);

        let out = service
            .compute(
                &ctx(),
                &[line(SalesOrderStatus::Draft, Some(wh), p, 10)],
                &QuantityField::ALL,
            )
            .unwrap();

        assert_eq!(out[0].available, Some(40));
        assert_eq!(out[0].forecast, Some(60 - 10 - 10));
    }

    #[test]
    fn reservation_overflow_is_an_error() {
        let wh = location();
        let p = product();
        let mut ledger = FakeLedger::default();
        ledger.forecast.insert((wh, p), 0);
        let huge = i64::MAX / 2 + 1;
        let demand = FakeDemand {
            lines: vec![
                ConfirmedLine {
                    line_id: line_id(1),
                    product_id: p,
                    quantity: huge,
                    warehouse: Some(wh),
                },
                ConfirmedLine {
                    line_id: line_id(2),
                    product_id: p,
                    quantity: huge,
                    warehouse: Some(wh),
                },
            ],
        };
        let service = LineAvailability::new(ledger, demand, Units);

        let err = service
            .compute(
                &ctx(),
                &[line(SalesOrderStatus::Draft, Some(wh), p, 1)],
                &[QuantityField::Forecast],
            )
            .unwrap_err();
        assert_eq!(err, AvailabilityError::QuantityOverflow(p));
    }

    #[test]
    fn forecast_underflow_is_an_error() {
        let wh = location();
        let p = product();
        let mut ledger = FakeLedger::default();
        ledger.forecast.insert((wh, p), i64::MIN + 5);
        let service = LineAvailability::new(ledger, FakeDemand { lines: vec![] }, Units);

        let err = service
            .compute(
                &ctx(),
                &[line(SalesOrderStatus::Draft, Some(wh), p, 10)],
                &[QuantityField::Forecast],
            )
            .unwrap_err();
        assert_eq!(err, AvailabilityError::QuantityOverflow(p));
    }

    #[test]
    fn confirmed_line_is_not_counted_twice() {
        let wh = location();
        let p = product();
        let id = line_id(2);
        let mut ledger = FakeLedger::default();
        ledger.forecast.insert((wh, p), 95);
        let demand = FakeDemand {
            lines: vec![ConfirmedLine {
                line_id: id,
                product_id: p,
                quantity: 5,
                warehouse: Some(wh),
            }],
        };
        let service = LineAvailability::new(ledger, demand, Units);

        let mut snapshot = line(SalesOrderStatus::Confirmed, Some(wh), p, 5);
        snapshot.line_id = Some(id);
        let out = service
            .compute(&ctx(), &[snapshot.clone()], &[QuantityField::Forecast])
            .unwrap();
        assert_eq!(out[0].forecast, Some(90));

        // Editing the quantity replaces the persisted demand.
        snapshot.quantity = 8;
        let out = service
            .compute(&ctx(), &[snapshot], &[QuantityField::Forecast])
            .unwrap();
        assert_eq!(out[0].forecast, Some(87));
    }

    #[test]
    fn processing_orders_are_already_in_the_moves() {
        let wh = location();
        let p = product();
        let mut ledger = FakeLedger::default();
        ledger.forecast.insert((wh, p), 90);
        let service = LineAvailability::new(ledger, FakeDemand::default(), Units);

        let out = service
            .compute(
                &ctx(),
                &[line(SalesOrderStatus::Processing, Some(wh), p, 5)],
                &[QuantityField::Forecast],
            )
            .unwrap();
        assert_eq!(out[0].forecast, Some(90));
    }

    #[test]
    fn order_without_warehouse_reads_every_warehouse() {
        let (a, b) = (location(), location());
        let p = product();
        let mut ledger = FakeLedger {
            warehouses: vec![a, b],
            ..Default::default()
        };
        ledger.on_hand.insert((a, p), 4);
        ledger.on_hand.insert((b, p), 6);
        let service = LineAvailability::new(ledger, FakeDemand::default(), Units);

        let out = service
            .compute(
                &ctx(),
                &[
                    line(SalesOrderStatus::Draft, None, p, 1),
                    line(SalesOrderStatus::Draft, Some(a), p, 1),
                ],
                &[QuantityField::Available],
            )
            .unwrap();
        assert_eq!(out[0].available, Some(10));
        assert_eq!(out[1].available, Some(4));
        assert_eq!(out[0].forecast, None);
    }

    #[test]
    fn comment_and_productless_lines_stay_empty() {
        let wh = location();
        let p = product();
        let ledger = FakeLedger::default();
        let service = LineAvailability::new(ledger, FakeDemand::default(), Units);

        let mut comment = line(SalesOrderStatus::Draft, Some(wh), p, 0);
        comment.kind = LineKind::Comment;
        let mut empty = line(SalesOrderStatus::Draft, Some(wh), p, 3);
        empty.product_id = None;
        let stocked = line(SalesOrderStatus::Draft, Some(wh), p, 3);

        let out = service
            .compute(&ctx(), &[comment, empty, stocked], &QuantityField::ALL)
            .unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!((out[0].available, out[0].forecast), (None, None));
        assert_eq!((out[1].available, out[1].forecast), (None, None));
        assert_eq!(out[2].available, Some(0));
    }

    #[test]
    fn no_products_means_no_queries() {
        let ledger = FakeLedger::default();
        let service = LineAvailability::new(&ledger, FailingDemand, Units);
        let mut snapshot = line(SalesOrderStatus::Draft, None, product(), 1);
        snapshot.product_id = None;

        let out = service
            .compute(&ctx(), &[snapshot], &QuantityField::ALL)
            .unwrap();
        assert_eq!(out[0].forecast, None);
        assert!(ledger.queries.borrow().is_empty());
    }

    #[test]
    fn stock_queries_are_scoped_and_dated() {
        let wh = location();
        let p = product();
        let ledger = FakeLedger::default();
        let service = LineAvailability::with_options(
            &ledger,
            FakeDemand::default(),
            Units,
            AvailabilityOptions {
                forecast_horizon_days: Some(30),
                ..Default::default()
            },
        );
        let c = ctx();
        service
            .compute(
                &c,
                &[line(SalesOrderStatus::Draft, Some(wh), p, 1)],
                &[QuantityField::Available, QuantityField::Forecast],
            )
            .unwrap();

        let queries = ledger.queries.borrow();
        assert_eq!(queries.len(), 2);
        assert!(!queries[0].forecast);
        assert_eq!(queries[0].date_end, Some(c.today));
        assert!(queries[1].forecast);
        assert_eq!(queries[1].date_end, NaiveDate::from_ymd_opt(2024, 6, 1));
        assert!(queries.iter().all(|q| q.with_children && q.locations == vec![wh]));
    }

    #[test]
    fn incoming_supply_is_formatted_with_uom() {
        let wh = location();
        let p = product();
        let mut ledger = FakeLedger::default();
        ledger.supply.insert(
            p,
            IncomingSupply {
                date: NaiveDate::from_ymd_opt(2024, 5, 9).unwrap(),
                quantity: 100,
            },
        );
        let service = LineAvailability::new(ledger, FakeDemand::default(), Units);

        let out = service
            .compute(
                &ctx(),
                &[line(SalesOrderStatus::Quotation, Some(wh), p, 1)],
                &[QuantityField::IncomingSupply],
            )
            .unwrap();
        assert_eq!(out[0].incoming_supply.as_deref(), Some("05/09/2024 (100\u{a0}u)"));
        assert_eq!(out[0].available, None);
    }

    #[test]
    fn on_change_product_clears_values_when_product_removed() {
        let service = LineAvailability::new(FakeLedger::default(), FailingDemand, Units);
        let mut snapshot = line(SalesOrderStatus::Draft, None, product(), 2);
        snapshot.product_id = None;
        let out = service.on_change_product(&ctx(), &snapshot).unwrap();
        assert_eq!(out.available, None);
        assert_eq!(out.forecast, None);
        assert_eq!(out.incoming_supply, None);
    }

    #[test]
    fn on_change_quantity_only_touches_forecast() {
        let wh = location();
        let p = product();
        let mut ledger = FakeLedger::default();
        ledger.on_hand.insert((wh, p), 1);
        ledger.forecast.insert((wh, p), 50);
        let service = LineAvailability::new(ledger, FakeDemand::default(), Units);

        let snapshot = line(SalesOrderStatus::Draft, Some(wh), p, 20);
        let current = LineQuantities {
            available: Some(999),
            incoming_supply: Some("kept".to_string()),
            ..LineQuantities::empty(None, SalesOrderStatus::Draft)
        };
        let out = service.on_change_quantity(&ctx(), &snapshot, &current).unwrap();
        assert_eq!(out.forecast, Some(30));
        assert_eq!(out.available, Some(999));
        assert_eq!(out.incoming_supply.as_deref(), Some("kept"));
    }

    #[test]
    fn lookup_errors_propagate() {
        let wh = location();
        let service = LineAvailability::new(FakeLedger::default(), FailingDemand, Units);
        let err = service
            .compute(
                &ctx(),
                &[line(SalesOrderStatus::Draft, Some(wh), product(), 1)],
                &[QuantityField::Forecast],
            )
            .unwrap_err();
        assert!(matches!(err, AvailabilityError::Demand(_)));
    }

    #[test]
    fn closed_orders_are_computed_but_hidden() {
        let wh = location();
        let service = LineAvailability::new(FakeLedger::default(), FakeDemand::default(), Units);
        let out = service
            .compute(
                &ctx(),
                &[line(SalesOrderStatus::Done, Some(wh), product(), 1)],
                &[QuantityField::Available],
            )
            .unwrap();
        assert!(out[0].visibility.invisible);
        assert_eq!(out[0].available, Some(0));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn forecast_is_stock_minus_demand(
                stock in -500i64..500,
                others in proptest::collection::vec(1i64..50, 0..6),
                own in 0i64..100,
            ) {
                let wh = location();
                let p = product();
                let mut ledger = FakeLedger::default();
                ledger.forecast.insert((wh, p), stock);
                let demand = FakeDemand {
                    lines: others
                        .iter()
                        .enumerate()
                        .map(|(i, q)| ConfirmedLine {
                            line_id: line_id(i as u32 + 1),
                            product_id: p,
                            quantity: *q,
                            warehouse: Some(wh),
                        })
                        .collect(),
                };
                let service = LineAvailability::new(ledger, demand, Units);
                let out = service
                    .compute(
                        &ctx(),
                        &[line(SalesOrderStatus::Draft, Some(wh), p, own)],
                        &[QuantityField::Forecast],
                    )
                    .unwrap();

                let reserved: i64 = others.iter().sum();
                prop_assert_eq!(out[0].forecast, Some(stock - reserved - own));
            }

            #[test]
            fn one_result_per_line_in_order(count in 0usize..12) {
                let wh = location();
                let service = LineAvailability::new(FakeLedger::default(), FakeDemand::default(), Units);
                let lines: Vec<_> = (0..count)
                    .map(|i| {
                        let mut l = line(SalesOrderStatus::Draft, Some(wh), product(), 1);
                        l.line_id = Some(line_id(i as u32 + 1));
                        l
                    })
                    .collect();
                let out = service.compute(&ctx(), &lines, &QuantityField::ALL).unwrap();
                prop_assert_eq!(out.len(), count);
                for (l, q) in lines.iter().zip(&out) {
                    prop_assert_eq!(l.line_id, q.line_id);
                }
            }
        }
    }
}
