//! Benchmarks para construção e resolução da DTMC

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use offload_core::{
    EnvironmentParameters, OffloadingSystemConfig, SymbolValues, UserEquipmentComponentsConfig,
    UserEquipmentConfig, UserEquipmentStateConfig,
};
use offload_dtmc::{DtmcCreator, IndependentTransitionCalculator};

fn config(queue: u32, tu: u32, cpu: u32) -> OffloadingSystemConfig {
    OffloadingSystemConfig::new(
        UserEquipmentConfig {
            state_config: UserEquipmentStateConfig::single_queue(queue, tu, cpu),
            components_config: UserEquipmentComponentsConfig::single_queue(0.3, 0.8, 2.0, 1.5, 1.5, 500.0),
        },
        EnvironmentParameters::default(),
    )
    .unwrap()
}

fn bench_create(c: &mut Criterion) {
    let small = config(5, 4, 3);
    let large = config(20, 5, 10);

    c.bench_function("dtmc_create_120_states", |b| {
        b.iter(|| DtmcCreator::new(black_box(&small)).unwrap().create().unwrap())
    });

    c.bench_function("dtmc_create_1386_states", |b| {
        b.iter(|| DtmcCreator::new(black_box(&large)).unwrap().create().unwrap())
    });
}

fn bench_resolve(c: &mut Criterion) {
    let config = config(20, 5, 10);
    let chain = DtmcCreator::new(&config).unwrap().create().unwrap();
    let values = SymbolValues::from_components(config.components());

    c.bench_function("dtmc_resolve_1386_states", |b| {
        b.iter(|| {
            IndependentTransitionCalculator::new(black_box(values.clone()), &chain)
                .unwrap()
                .resolve()
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_create, bench_resolve);
criterion_main!(benches);
