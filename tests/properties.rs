/// Property-based tests for registration and resolution
///
/// These tests verify lifetime behaviour holds regardless of how many
/// registrations, scopes or resolutions are involved.

use keel_di::{Lifetime, Resolver, ServiceCollection};
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug)]
struct Value(u32);

fn lifetime_strategy() -> impl Strategy<Value = Lifetime> {
    prop_oneof![
        Just(Lifetime::Singleton),
        Just(Lifetime::Scoped),
        Just(Lifetime::Transient),
    ]
}

proptest! {
    #[test]
    fn first_registration_always_wins(values in prop::collection::vec(any::<u32>(), 1..16)) {
        let mut services = ServiceCollection::new();
        for v in &values {
            services.add_singleton_instance(Value(*v));
        }
        prop_assert_eq!(services.len(), values.len());

        let report = services.validate();
        prop_assert_eq!(report.warnings.len(), values.len() - 1);

        let provider = services.build();
        prop_assert_eq!(provider.get_required::<Value>().0, values[0]);
    }

    #[test]
    fn lifetime_caching_matches_tier(lifetime in lifetime_strategy(), resolutions in 2usize..10) {
        let mut services = ServiceCollection::new();
        services.add_factory::<Value, _>(keel_di::key_of_type::<Value>(), lifetime, |_| Ok(Value(0)));
        let provider = services.build();
        let scope = provider.create_scope();

        let resolved: Vec<Arc<Value>> = (0..resolutions).map(|_| scope.get_required::<Value>()).collect();
        let all_same = resolved.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1]));
        let distinct = resolved.windows(2).all(|w| !Arc::ptr_eq(&w[0], &w[1]));

        match lifetime {
            Lifetime::Transient => prop_assert!(distinct),
            _ => prop_assert!(all_same),
        }
    }

    #[test]
    fn scopes_never_share_scoped_instances(scope_count in 2usize..8) {
        let mut services = ServiceCollection::new();
        services.add_scoped_factory::<Value, _>(|_| Ok(Value(1)));
        services.add_singleton_factory::<String, _>(|_| Ok(String::from("shared")));
        let provider = services.build();

        let scopes: Vec<_> = (0..scope_count).map(|_| provider.create_scope()).collect();
        let scoped: Vec<Arc<Value>> = scopes.iter().map(|s| s.get_required::<Value>()).collect();
        let singletons: Vec<Arc<String>> = scopes.iter().map(|s| s.get_required::<String>()).collect();

        for i in 0..scope_count {
            for j in (i + 1)..scope_count {
                prop_assert!(!Arc::ptr_eq(&scoped[i], &scoped[j]));
            }
            prop_assert!(Arc::ptr_eq(&singletons[i], &singletons[0]));
        }
    }

    #[test]
    fn unregistered_tokens_fail(token in "[a-z]{1,12}") {
        let leaked: &'static str = Box::leak(token.into_boxed_str());
        let mut services = ServiceCollection::new();
        services.add_singleton_instance(Value(7));
        let provider = services.build();

        prop_assert!(provider.get_token::<Value>(leaked).is_err());
    }
}
