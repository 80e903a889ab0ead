use common::{Money, ProductId};
use criterion::{Criterion, criterion_group, criterion_main};
use entities::{EntityDirectory, ProductCommand, ProductEntity, ProductRecord};

fn catalog_record(id: i64) -> ProductRecord {
    ProductRecord {
        id: ProductId::new(id),
        name: format!("Product {id}"),
        description: "benchmark product".to_string(),
        price: Money::new(100),
        stock_quantity: u32::MAX / 2,
    }
}

fn bench_get_info_roundtrip(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let directory: EntityDirectory<ProductEntity> = EntityDirectory::new();

    rt.block_on(async {
        directory
            .resolve(ProductId::new(1))
            .ask(|reply| ProductCommand::Initialize {
                record: catalog_record(1),
                reply,
            })
            .await
            .unwrap();
    });

    c.bench_function("entities/get_info_roundtrip", |b| {
        b.iter(|| {
            rt.block_on(async {
                directory
                    .resolve(ProductId::new(1))
                    .ask(|reply| ProductCommand::GetInfo { reply })
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_reduce_restore_cycle(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let directory: EntityDirectory<ProductEntity> = EntityDirectory::new();

    rt.block_on(async {
        directory
            .resolve(ProductId::new(2))
            .ask(|reply| ProductCommand::Initialize {
                record: catalog_record(2),
                reply,
            })
            .await
            .unwrap();
    });

    c.bench_function("entities/reduce_restore_cycle", |b| {
        b.iter(|| {
            rt.block_on(async {
                let handle = directory.resolve(ProductId::new(2));
                handle
                    .ask(|reply| ProductCommand::ReduceStock { quantity: 1, reply })
                    .await
                    .unwrap();
                handle
                    .ask(|reply| ProductCommand::RestoreStock { quantity: 1, reply })
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_fan_out_get_info_50(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let directory: EntityDirectory<ProductEntity> = EntityDirectory::new();

    rt.block_on(async {
        for id in 0..50 {
            directory
                .resolve(ProductId::new(id))
                .ask(|reply| ProductCommand::Initialize {
                    record: catalog_record(id),
                    reply,
                })
                .await
                .unwrap();
        }
    });

    c.bench_function("entities/fan_out_get_info_50", |b| {
        b.iter(|| {
            rt.block_on(async {
                let asks = directory.known_ids().into_iter().map(|id| {
                    let handle = directory.resolve(id);
                    async move {
                        handle
                            .ask(|reply| ProductCommand::GetInfo { reply })
                            .await
                            .unwrap()
                    }
                });
                futures_util::future::join_all(asks).await;
            });
        });
    });
}

criterion_group!(
    benches,
    bench_get_info_roundtrip,
    bench_reduce_restore_cycle,
    bench_fan_out_get_info_50,
);
criterion_main!(benches);
