use keel_di::{Dispose, Resolver, ServiceCollection};
use std::sync::{Arc, Mutex};

struct Tracked {
    name: &'static str,
    log: Arc<Mutex<Vec<&'static str>>>,
}

impl Dispose for Tracked {
    fn dispose(&self) {
        self.log.lock().unwrap().push(self.name);
    }
}

struct First;
struct Second;
struct Shared;

fn services(log: &Arc<Mutex<Vec<&'static str>>>) -> ServiceCollection {
    let mut sc = ServiceCollection::new();

    let l = log.clone();
    sc.add_scoped_factory::<First, _>(move |ctx| {
        ctx.register_disposer(Arc::new(Tracked { name: "first", log: l.clone() }));
        Ok(First)
    });

    let l = log.clone();
    sc.add_scoped_factory::<Second, _>(move |ctx| {
        ctx.register_disposer(Arc::new(Tracked { name: "second", log: l.clone() }));
        Ok(Second)
    });

    let l = log.clone();
    sc.add_singleton_factory::<Shared, _>(move |ctx| {
        ctx.register_disposer(Arc::new(Tracked { name: "shared", log: l.clone() }));
        Ok(Shared)
    });

    sc
}

#[test]
fn test_scope_hooks_run_in_reverse_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let provider = services(&log).build();

    let scope = provider.create_scope();
    scope.get_required::<First>();
    scope.get_required::<Second>();
    scope.get_required::<First>();

    assert!(log.lock().unwrap().is_empty());
    scope.dispose();
    assert_eq!(*log.lock().unwrap(), vec!["second", "first"]);
}

#[test]
fn test_dispose_is_idempotent() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let provider = services(&log).build();

    let scope = provider.create_scope();
    scope.get_required::<First>();
    scope.dispose();
    scope.dispose();
    assert_eq!(log.lock().unwrap().len(), 1);
}

#[test]
fn test_singleton_hooks_belong_to_provider() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let provider = services(&log).build();

    let scope = provider.create_scope();
    scope.get_required::<Shared>();
    scope.get_required::<First>();
    scope.dispose();
    assert_eq!(*log.lock().unwrap(), vec!["first"]);

    provider.dispose_all();
    assert_eq!(*log.lock().unwrap(), vec!["first", "shared"]);

    // Hooks run once
    provider.dispose_all();
    assert_eq!(log.lock().unwrap().len(), 2);
}

#[test]
fn test_scopes_dispose_independently() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let provider = services(&log).build();

    let scope1 = provider.create_scope();
    let scope2 = provider.create_scope();
    scope1.get_required::<First>();
    scope2.get_required::<Second>();

    scope2.dispose();
    assert_eq!(*log.lock().unwrap(), vec!["second"]);
    assert!(scope1.get::<First>().is_ok());

    scope1.dispose();
    assert_eq!(*log.lock().unwrap(), vec!["second", "first"]);
}

#[test]
fn test_manual_registration_on_scope() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let provider = ServiceCollection::new().build();

    let scope = provider.create_scope();
    scope.register_disposer(Arc::new(Tracked { name: "a", log: log.clone() }));
    scope.register_disposer(Arc::new(Tracked { name: "b", log: log.clone() }));
    scope.dispose();

    assert_eq!(*log.lock().unwrap(), vec!["b", "a"]);
}

#[test]
fn test_transient_hooks_outside_scope_go_to_provider() {
    struct Temp;

    let log = Arc::new(Mutex::new(Vec::new()));
    let l = log.clone();
    let mut sc = ServiceCollection::new();
    sc.add_transient_factory::<Temp, _>(move |ctx| {
        ctx.register_disposer(Arc::new(Tracked { name: "temp", log: l.clone() }));
        Ok(Temp)
    });

    let provider = sc.build();
    provider.get_required::<Temp>();
    provider.get_required::<Temp>();
    assert!(log.lock().unwrap().is_empty());

    provider.dispose_all();
    assert_eq!(*log.lock().unwrap(), vec!["temp", "temp"]);
}

#[test]
fn test_hooks_beneath_a_singleton_outlive_the_scope() {
    struct Conn;
    struct Cache {
        _conn: Arc<Conn>,
    }

    let log = Arc::new(Mutex::new(Vec::new()));
    let l = log.clone();
    let mut sc = ServiceCollection::new();
    sc.add_transient_factory::<Conn, _>(move |ctx| {
        ctx.register_disposer(Arc::new(Tracked { name: "conn", log: l.clone() }));
        Ok(Conn)
    });
    sc.add_singleton_factory::<Cache, _>(|ctx| {
        Ok(Cache {
            _conn: ctx.get::<Conn>()?,
        })
    });

    let provider = sc.build();
    let scope = provider.create_scope();
    let cache = scope.get_required::<Cache>();

    // A transient resolved directly in the scope still belongs to the scope
    scope.get_required::<Conn>();

    scope.dispose();
    assert_eq!(*log.lock().unwrap(), vec!["conn"]);
    assert!(Arc::ptr_eq(&cache, &provider.get_required::<Cache>()));

    provider.dispose_all();
    assert_eq!(*log.lock().unwrap(), vec!["conn", "conn"]);
}
