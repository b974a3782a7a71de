#![no_main]

use keel_di::{key_of_type, Lifetime, Resolver, ServiceCollection};
use libfuzzer_sys::fuzz_target;

#[derive(Debug)]
struct TestService {
    value: u8,
}

fn lifetime(byte: u8) -> Lifetime {
    match byte % 3 {
        0 => Lifetime::Singleton,
        1 => Lifetime::Scoped,
        _ => Lifetime::Transient,
    }
}

fuzz_target!(|data: &[u8]| {
    // Each pair of bytes is one registration: (lifetime, value)
    let registrations: Vec<(Lifetime, u8)> = data
        .chunks_exact(2)
        .take(64)
        .map(|pair| (lifetime(pair[0]), pair[1]))
        .collect();
    if registrations.is_empty() {
        return;
    }

    let mut services = ServiceCollection::new();
    for &(lifetime, value) in &registrations {
        services.add_factory::<TestService, _>(key_of_type::<TestService>(), lifetime, move |_| {
            Ok(TestService { value })
        });
    }

    let report = services.validate();
    assert!(report.is_valid());
    assert_eq!(report.warnings.len(), registrations.len() - 1);

    let provider = services.build();
    let (first_lifetime, first_value) = registrations[0];
    let scope = provider.create_scope();

    // The first registration always wins
    let resolved = scope.get::<TestService>().unwrap();
    assert_eq!(resolved.value, first_value);

    let again = scope.get::<TestService>().unwrap();
    assert_eq!(std::sync::Arc::ptr_eq(&resolved, &again), first_lifetime.is_cached());

    let from_root = provider.get::<TestService>();
    assert_eq!(from_root.is_ok(), first_lifetime != Lifetime::Scoped);

    scope.dispose();
    assert!(scope.get::<TestService>().is_err());
});
