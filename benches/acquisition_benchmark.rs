use criterion::{black_box, criterion_group, criterion_main, Criterion};
use meshlock::{Resource, ResourceGroup, World};
use std::sync::Arc;
use std::thread;

fn bench_uncontended_acquire(c: &mut Criterion) {
    let world = World::new();
    let resource = Resource::<()>::create();

    c.bench_function("acquire_free_uncontended", |b| {
        b.iter(|| {
            let mut group = ResourceGroup::create_acquiring_in(&world, &[resource.clone()]);
            group.free().unwrap();
            black_box(&group);
        })
    });
}

fn bench_merge_then_acquire(c: &mut Criterion) {
    let world = World::new();

    c.bench_function("connect_then_acquire", |b| {
        b.iter(|| {
            let a = Resource::<()>::create();
            let bb = Resource::<()>::create();
            let mut group = ResourceGroup::create_acquiring_in(&world, &[a.clone(), bb.clone()]);
            group.connect(&a, &bb).unwrap();
            group.free().unwrap();
            black_box((&a, &bb));
        })
    });
}

fn bench_contended_acquisition(c: &mut Criterion) {
    let world = Arc::new(World::new());
    let resource = Resource::<()>::create();

    let mut group = c.benchmark_group("contended_acquisition");
    group.bench_function("two_threads", |b| {
        b.iter(|| {
            thread::scope(|s| {
                for _ in 0..2 {
                    let world = world.clone();
                    let resource = resource.clone();
                    s.spawn(move || {
                        for _ in 0..200 {
                            let mut g =
                                ResourceGroup::create_acquiring_in(&world, &[resource.clone()]);
                            g.free().unwrap();
                        }
                    });
                }
            });
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_uncontended_acquire,
    bench_merge_then_acquire,
    bench_contended_acquisition
);
criterion_main!(benches);
