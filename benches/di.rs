use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use keel_di::*;
use std::sync::Arc;

// ===== Micro Benchmarks =====

fn bench_singleton_hit(c: &mut Criterion) {
    let mut sc = ServiceCollection::new();
    sc.add_singleton_instance(42u64);
    let sp = sc.build();

    // Prime the singleton
    let _ = sp.get::<u64>().unwrap();

    c.bench_function("singleton_hit_u64", |b| {
        b.iter(|| {
            let v = sp.get::<u64>().unwrap();
            black_box(v);
        })
    });
}

fn bench_singleton_cold(c: &mut Criterion) {
    struct ExpensiveToCreate {
        data: Vec<u64>,
    }

    c.bench_function("singleton_cold_expensive", |b| {
        b.iter_batched(
            || {
                let mut sc = ServiceCollection::new();
                sc.add_singleton_factory::<ExpensiveToCreate, _>(|_| {
                    Ok(ExpensiveToCreate {
                        data: (0..1000).collect(),
                    })
                });
                sc.build()
            },
            |sp| {
                let v = sp.get::<ExpensiveToCreate>().unwrap();
                black_box(v.data.len());
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_scoped_vs_transient(c: &mut Criterion) {
    struct Service {
        data: [u8; 64],
    }

    let mut group = c.benchmark_group("scoped_vs_transient");

    let mut sc_scoped = ServiceCollection::new();
    sc_scoped.add_scoped_factory::<Service, _>(|_| Ok(Service { data: [0; 64] }));
    let sp_scoped = sc_scoped.build();
    let scope = sp_scoped.create_scope();
    let _ = scope.get::<Service>().unwrap();

    group.bench_function("scoped_hit", |b| {
        b.iter(|| {
            let v = scope.get::<Service>().unwrap();
            black_box(v.data[0]);
        })
    });

    let mut sc_transient = ServiceCollection::new();
    sc_transient.add_transient_factory::<Service, _>(|_| Ok(Service { data: [0; 64] }));
    let sp_transient = sc_transient.build();

    group.bench_function("transient_create", |b| {
        b.iter(|| {
            let v = sp_transient.get::<Service>().unwrap();
            black_box(v.data[0]);
        })
    });

    group.finish();
}

fn bench_concrete_vs_trait(c: &mut Criterion) {
    trait Greeter: Send + Sync {
        fn greet(&self) -> usize;
    }

    #[derive(Default)]
    struct Hello;
    impl Greeter for Hello {
        fn greet(&self) -> usize {
            5
        }
    }
    keel_di::injectable_default!(Hello);

    let mut sc = ServiceCollection::new();
    sc.add_singleton::<Hello>()
        .add_singleton_trait::<dyn Greeter, Hello, _>(|h| h)
        .add_singleton_token::<Hello>("greeter.hello");
    let sp = sc.build();

    let mut group = c.benchmark_group("identity_kind");
    group.bench_function("concrete", |b| {
        b.iter(|| black_box(sp.get::<Hello>().unwrap()))
    });
    group.bench_function("trait", |b| {
        b.iter(|| black_box(sp.get_trait::<dyn Greeter>().unwrap().greet()))
    });
    group.bench_function("token", |b| {
        b.iter(|| black_box(sp.get_token::<Hello>("greeter.hello").unwrap()))
    });
    group.finish();
}

fn bench_scope_lifecycle(c: &mut Criterion) {
    #[derive(Default)]
    struct RequestContext;
    keel_di::injectable_default!(RequestContext);

    let mut sc = ServiceCollection::new();
    sc.add_scoped::<RequestContext>();
    let sp = sc.build();

    c.bench_function("scope_create_resolve_dispose", |b| {
        b.iter(|| {
            let scope = sp.create_scope();
            black_box(scope.get::<RequestContext>().unwrap());
            scope.dispose();
        })
    });
}

fn bench_constructor_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("constructor_chain");

    // Non-circular chain of depth 8 built from metadata
    macro_rules! chain {
        ($first:ident $(, $next:ident => $dep:ident)*) => {
            #[derive(Default)]
            struct $first;
            keel_di::injectable_default!($first);
            $(
                struct $next {
                    _dep: Arc<$dep>,
                }
                impl Injectable for $next {
                    fn metadata() -> ConstructorMetadata {
                        ConstructorMetadata::new().param::<$dep>()
                    }
                    fn construct(args: &mut Arguments) -> DiResult<Self> {
                        Ok($next { _dep: args.next()? })
                    }
                }
            )*
        };
    }

    chain!(Service1, Service2 => Service1, Service3 => Service2, Service4 => Service3,
        Service5 => Service4, Service6 => Service5, Service7 => Service6, Service8 => Service7);

    let mut sc = ServiceCollection::new();
    sc.add_singleton::<Service1>()
        .add_transient::<Service2>()
        .add_transient::<Service3>()
        .add_transient::<Service4>()
        .add_transient::<Service5>()
        .add_transient::<Service6>()
        .add_transient::<Service7>()
        .add_transient::<Service8>();
    let sp = sc.build();

    group.bench_function("transient_depth_8", |b| {
        b.iter(|| {
            let service = sp.get::<Service8>().unwrap();
            black_box(&service);
        })
    });

    group.finish();
}

fn bench_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("contention");

    let mut sc = ServiceCollection::new();
    sc.add_singleton_instance(42u64);
    let sp = sc.build();

    // Prime the singleton
    let _ = sp.get::<u64>().unwrap();

    for &thread_count in &[1, 2, 4, 8] {
        group.bench_with_input(
            BenchmarkId::new("singleton_threads", thread_count),
            &thread_count,
            |b, &threads| {
                b.iter_custom(|iters| {
                    let start = std::time::Instant::now();
                    crossbeam_utils::thread::scope(|s| {
                        for _ in 0..threads {
                            let sp_ref = &sp;
                            s.spawn(move |_| {
                                for _ in 0..iters / threads as u64 {
                                    let v = sp_ref.get::<u64>().unwrap();
                                    black_box(v);
                                }
                            });
                        }
                    })
                    .unwrap();
                    start.elapsed()
                })
            },
        );
    }

    group.finish();
}

// ===== Macro Benchmarks =====

fn bench_large_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("large_registry");

    for &service_count in &[10, 100, 1000] {
        let mut sc = ServiceCollection::new();

        // Baseline service we always resolve
        sc.add_singleton_instance(42u64);

        // Distinct token identities to grow the index
        for i in 0..service_count {
            let token: &'static str = Box::leak(format!("service.{}", i).into_boxed_str());
            let value = i as u32;
            sc.add_factory::<u32, _>(Key::token(token), Lifetime::Singleton, move |_| Ok(value));
        }

        let sp = sc.build();

        group.bench_with_input(
            BenchmarkId::new("resolve_from_large_registry", service_count),
            &service_count,
            |b, _| {
                b.iter(|| {
                    let v = sp.get::<u64>().unwrap();
                    black_box(v);
                })
            },
        );
    }

    group.finish();
}

fn bench_validation(c: &mut Criterion) {
    #[derive(Default)]
    struct Leaf;
    keel_di::injectable_default!(Leaf);

    struct Node;
    impl Injectable for Node {
        fn metadata() -> ConstructorMetadata {
            ConstructorMetadata::new().param::<Leaf>().param::<ServiceProvider>()
        }
        fn construct(_: &mut Arguments) -> DiResult<Self> {
            Ok(Node)
        }
    }

    let mut sc = ServiceCollection::new();
    sc.add_singleton::<Leaf>().add_transient::<Node>();
    for i in 0..200 {
        let token: &'static str = Box::leak(format!("node.{}", i).into_boxed_str());
        sc.add::<Node>(Key::token(token), Lifetime::Transient);
    }

    c.bench_function("validate_200_services", |b| {
        b.iter(|| black_box(sc.validate().is_valid()))
    });
}

fn bench_mixed_workload(c: &mut Criterion) {
    // Realistic workload: 70% singleton hits, 20% scoped hits, 10% transient
    struct SingletonService(u64);
    struct ScopedService(u64);
    struct TransientService(u64);

    let mut sc = ServiceCollection::new();
    sc.add_singleton_instance(SingletonService(1));
    sc.add_scoped_factory::<ScopedService, _>(|_| Ok(ScopedService(2)));
    sc.add_transient_factory::<TransientService, _>(|_| Ok(TransientService(3)));

    let sp = sc.build();
    let scope = sp.create_scope();

    // Prime services
    let _ = sp.get::<SingletonService>().unwrap();
    let _ = scope.get::<ScopedService>().unwrap();

    c.bench_function("mixed_workload_realistic", |b| {
        b.iter(|| {
            for _ in 0..7 {
                let v = sp.get::<SingletonService>().unwrap();
                black_box(v.0);
            }

            for _ in 0..2 {
                let v = scope.get::<ScopedService>().unwrap();
                black_box(v.0);
            }

            let v = sp.get::<TransientService>().unwrap();
            black_box(v.0);
        })
    });
}

criterion_group!(
    micro_benches,
    bench_singleton_hit,
    bench_singleton_cold,
    bench_scoped_vs_transient,
    bench_concrete_vs_trait,
    bench_scope_lifecycle,
    bench_constructor_chain,
    bench_contention
);

criterion_group!(macro_benches, bench_large_registry, bench_validation, bench_mixed_workload);

criterion_main!(micro_benches, macro_benches);
