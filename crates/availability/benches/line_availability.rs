use std::collections::HashMap;

use chrono::NaiveDate;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use availerp_availability::{
    AvailabilityContext, AvailabilityError, ConfirmedDemand, ConfirmedLine, IncomingSupply,
    LineAvailability, OrderContext, ProductCatalog, QuantityField, SaleLineSnapshot, StockLedger,
    StockQuery,
};
use availerp_core::{AggregateId, TenantId};
use availerp_inventory::LocationId;
use availerp_products::ProductId;
use availerp_sales::{LineKind, SaleLineId, SalesOrderId, SalesOrderStatus};

/// Flat stock figures: every product has the same levels everywhere.
struct FlatLedger {
    warehouses: Vec<LocationId>,
}

impl StockLedger for FlatLedger {
    fn warehouses(&self, _tenant_id: TenantId) -> Result<Vec<LocationId>, AvailabilityError> {
        Ok(self.warehouses.clone())
    }

    fn product_quantities(
        &self,
        _tenant_id: TenantId,
        query: &StockQuery,
    ) -> Result<HashMap<ProductId, i64>, AvailabilityError> {
        let level = if query.forecast { 120 } else { 80 };
        Ok(query.products.iter().map(|p| (*p, level)).collect())
    }

    fn incoming_supply(
        &self,
        _tenant_id: TenantId,
        _locations: &[LocationId],
        _product_id: ProductId,
    ) -> Result<Option<IncomingSupply>, AvailabilityError> {
        Ok(Some(IncomingSupply {
            date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            quantity: 40,
        }))
    }
}

struct Demand(Vec<ConfirmedLine>);

impl ConfirmedDemand for Demand {
    fn confirmed_lines(
        &self,
        _tenant_id: TenantId,
        _warehouses: &[LocationId],
    ) -> Result<Vec<ConfirmedLine>, AvailabilityError> {
        Ok(self.0.clone())
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

fn bench_compute(c: &mut Criterion) {
    let warehouse = LocationId::new(AggregateId::new());
    let products: Vec<ProductId> = (0..50).map(|_| ProductId::new(AggregateId::new())).collect();
    let demand: Vec<ConfirmedLine> = (0..500)
        .map(|i| ConfirmedLine {
            line_id: SaleLineId::new(SalesOrderId::new(AggregateId::new()), 1),
            product_id: products[i % products.len()],
            quantity: 2,
            warehouse: Some(warehouse),
        })
        .collect();
    let service = LineAvailability::new(
        FlatLedger {
            warehouses: vec![warehouse],
        },
        Demand(demand),
        Units,
    );
    let ctx = AvailabilityContext {
        tenant_id: TenantId::new(),
        today: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
    };

    let mut group = c.benchmark_group("line_availability");
    for size in [10usize, 100, 1000] {
        let lines: Vec<SaleLineSnapshot> = (0..size)
            .map(|i| SaleLineSnapshot {
                line_id: None,
                order: OrderContext {
                    status: SalesOrderStatus::Draft,
                    warehouse: if i % 2 == 0 { Some(warehouse) } else { None },
                },
                kind: LineKind::Line,
                product_id: Some(products[i % products.len()]),
                quantity: 1,
            })
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("compute_all_fields", size), &lines, |b, lines| {
            b.iter(|| {
                service
                    .compute(black_box(&ctx), black_box(lines), &QuantityField::ALL)
                    .unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compute);
criterion_main!(benches);
