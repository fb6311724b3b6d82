use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{DateTime, Duration, Utc};
use millstock_core::{Currency, MaterialId, PurchaseItemId, WarehouseId};
use millstock_engine::{InventoryService, InMemoryStore, LedgerStore, LotTarget};
use millstock_ledger::{EventOrigin, LedgerEvent};
use millstock_orders::PurchaseItem;
use millstock_production::{InputUsage, ProcessInput, ProcessOutput};

fn usd() -> Currency {
    Currency::new("USD").unwrap()
}

fn service() -> InventoryService<InMemoryStore> {
    millstock_observability::init();
    InventoryService::new(InMemoryStore::new())
}

fn t(offset_secs: i64) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-03-01T08:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
        + Duration::seconds(offset_secs)
}

/// A production chain of `depth` stages: one purchased root lot, each stage
/// consuming the previous stage's full output. Returns the final lot's id.
fn setup_chain(
    service: &InventoryService<InMemoryStore>,
    depth: usize,
) -> millstock_core::InventoryLotId {
    let warehouse = WarehouseId::new();
    let quantity = 1000.0;

    let item = PurchaseItem::new(PurchaseItemId::new(), MaterialId::new(), quantity, 2.0, usd())
        .unwrap();
    service.store().save_purchase_item(item.clone()).unwrap();
    let root = service
        .fulfill_purchase(
            item.id,
            LotTarget::NewInWarehouse {
                warehouse_id: warehouse,
                unit: "kg".to_string(),
            },
            t(0),
        )
        .unwrap();

    let mut previous = root.lot_id;
    for stage in 0..depth {
        let output_lot = service
            .create_lot(
                MaterialId::new(),
                warehouse,
                Some(format!("stage-{stage}")),
                "kg",
                usd(),
                t(stage as i64 + 1),
            )
            .unwrap();
        service
            .record_production(
                "milling",
                vec![ProcessInput {
                    lot_id: previous,
                    quantity,
                }],
                vec![ProcessOutput::new(
                    output_lot.material_id,
                    output_lot.id,
                    quantity,
                    vec![InputUsage {
                        lot_id: previous,
                        quantity,
                    }],
                )],
                warehouse,
                t(stage as i64 + 1),
            )
            .unwrap();
        previous = output_lot.id;
    }
    previous
}

/// Cost resolution re-walks the production graph on every call (memoization
/// is per call only), so latency should scale with chain depth.
fn bench_cost_resolution_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("cost_resolution_depth");

    for depth in [1usize, 4, 16, 64].iter() {
        group.bench_with_input(BenchmarkId::new("chain", depth), depth, |b, &depth| {
            let service = service();
            let final_lot = setup_chain(&service, depth);

            b.iter(|| black_box(service.get_cost_per_unit(black_box(final_lot)).unwrap()));
        });
    }

    group.finish();
}

fn bench_fifo_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("fifo_allocation");

    for lot_count in [10usize, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*lot_count as u64));
        group.bench_with_input(
            BenchmarkId::new("allocate_across_lots", lot_count),
            lot_count,
            |b, &count| {
                let service = service();
                let material = MaterialId::new();
                let warehouse = WarehouseId::new();

                for i in 0..count {
                    let item = PurchaseItem::new(PurchaseItemId::new(), material, 10.0, 1.0, usd())
                        .unwrap();
                    service.store().save_purchase_item(item.clone()).unwrap();
                    let lot = service
                        .create_lot(
                            material,
                            warehouse,
                            Some(format!("batch-{i}")),
                            "kg",
                            usd(),
                            t(i as i64),
                        )
                        .unwrap();
                    service
                        .fulfill_purchase(item.id, LotTarget::Existing(lot.id), t(i as i64))
                        .unwrap();
                }

                // Spans ~90% of the lots, so the walk touches most of them.
                let requested = count as f64 * 10.0 * 0.9;
                b.iter(|| black_box(service.allocate(black_box(material), requested).unwrap()));
            },
        );
    }

    group.finish();
}

/// Quantities are never stored; every read folds the lot's event history.
fn bench_quantity_fold(c: &mut Criterion) {
    let mut group = c.benchmark_group("quantity_fold");

    for event_count in [10usize, 100, 1000, 10000].iter() {
        group.throughput(Throughput::Elements(*event_count as u64));
        group.bench_with_input(
            BenchmarkId::new("fold_events", event_count),
            event_count,
            |b, &count| {
                let service = service();
                let lot = service
                    .create_lot(
                        MaterialId::new(),
                        WarehouseId::new(),
                        None,
                        "kg",
                        usd(),
                        t(0),
                    )
                    .unwrap();

                let origin = EventOrigin::Purchase(PurchaseItemId::new());
                for i in 0..count {
                    let event =
                        LedgerEvent::baseline(lot.id, 1.0, origin, t(i as i64 + 1)).unwrap();
                    service.store().save_event(event).unwrap();
                }

                b.iter(|| black_box(service.get_current_quantity(black_box(lot.id)).unwrap()));
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_cost_resolution_depth,
    bench_fifo_allocation,
    bench_quantity_fold
);
criterion_main!(benches);
