use keel_di::{
    key_of_type, Arguments, ConstructorMetadata, DependencyGraph, DependencyType, DiError, DiResult, Injectable,
    Key, Lifetime, ServiceCollection, ValidationError, ValidationWarning,
};
use std::sync::Arc;

#[derive(Default)]
struct Clock;
keel_di::injectable_default!(Clock);

#[derive(Default)]
struct RequestContext;
keel_di::injectable_default!(RequestContext);

struct AuditLog {
    _clock: Arc<Clock>,
    _context: Arc<RequestContext>,
}

impl Injectable for AuditLog {
    fn metadata() -> ConstructorMetadata {
        ConstructorMetadata::new().param::<Clock>().param::<RequestContext>()
    }
    fn construct(args: &mut Arguments) -> DiResult<Self> {
        Ok(AuditLog {
            _clock: args.next()?,
            _context: args.next()?,
        })
    }
}

#[test]
fn test_valid_configuration() {
    let mut services = ServiceCollection::new();
    services
        .add_singleton::<Clock>()
        .add_scoped::<RequestContext>()
        .add_scoped::<AuditLog>();

    let report = services.validate();
    assert!(report.is_valid());
    assert!(!report.has_warnings());
    assert!(report.format_issues().is_empty());
    assert!(services.try_build().is_ok());
}

#[test]
fn test_missing_dependency() {
    let mut services = ServiceCollection::new();
    services.add_singleton::<Clock>().add_transient::<AuditLog>();

    let report = services.validate();
    assert_eq!(
        report.errors,
        vec![ValidationError::MissingDependency {
            service: key_of_type::<AuditLog>(),
            dependency: key_of_type::<RequestContext>(),
        }]
    );
    assert!(matches!(services.try_build(), Err(DiError::Validation(_))));
}

#[test]
fn test_singleton_capturing_scoped() {
    let mut services = ServiceCollection::new();
    services
        .add_transient::<Clock>()
        .add_scoped::<RequestContext>()
        .add_singleton::<AuditLog>();

    let report = services.validate();
    assert_eq!(
        report.errors,
        vec![ValidationError::SingletonDependsOnScoped {
            singleton: key_of_type::<AuditLog>(),
            scoped: key_of_type::<RequestContext>(),
        }]
    );
    assert_eq!(
        report.warnings,
        vec![ValidationWarning::SingletonDependsOnTransient {
            singleton: key_of_type::<AuditLog>(),
            transient: key_of_type::<Clock>(),
        }]
    );

    let text = report.format_issues();
    assert!(text.starts_with("Validation Errors:\n"));
    assert!(text.contains("Validation Warnings:\n"));
}

#[test]
fn test_factories_contribute_no_edges() {
    let mut services = ServiceCollection::new();
    services.add_singleton_factory::<AuditLog, _>(|ctx| {
        use keel_di::Resolver;
        Ok(AuditLog {
            _clock: ctx.get::<Clock>()?,
            _context: ctx.get::<RequestContext>()?,
        })
    });

    assert!(services.validate().is_valid());
    assert!(services.dependency_graph().edges.is_empty());
}

#[test]
fn test_shadowed_registration_warning() {
    let mut services = ServiceCollection::new();
    services.add_singleton::<Clock>().add_transient::<Clock>();

    let report = services.validate();
    assert!(report.is_valid());
    assert_eq!(report.warnings.len(), 1);
    assert!(matches!(
        report.warnings[0],
        ValidationWarning::ShadowedRegistration {
            lifetime: Lifetime::Transient,
            ..
        }
    ));
}

#[test]
fn test_try_build_rejects_bad_options() {
    let mut services = ServiceCollection::new();
    services.with_options(keel_di::ContainerOptions::new().with_max_depth(0));
    assert!(matches!(services.try_build(), Err(DiError::Config(_))));
}

#[test]
fn test_dependency_graph_shape() {
    let mut services = ServiceCollection::new();
    services
        .add_singleton::<Clock>()
        .add_scoped::<RequestContext>()
        .add_scoped::<AuditLog>()
        .describe(
            key_of_type::<AuditLog>(),
            ConstructorMetadata::new()
                .param::<Clock>()
                .param::<RequestContext>()
                .inject(0, Key::token("clock.fixed")),
        );

    let graph = DependencyGraph::from_collection(&services);
    assert_eq!(graph.nodes.len(), 3);
    assert_eq!(graph.metadata.scoped_count, 2);

    let kinds: Vec<_> = graph.edges.iter().map(|e| (e.parameter_index, e.dependency_type)).collect();
    assert_eq!(kinds, vec![(0, DependencyType::Missing), (1, DependencyType::Required)]);
    assert_eq!(graph.edges[0].to, "token \"clock.fixed\"");

    let dot = graph.to_dot();
    assert!(dot.contains("fillcolor=lightgreen"));
    assert!(dot.contains("style=bold, color=red"));

    // The provider reports the same graph
    let provider = services.build();
    assert_eq!(provider.dependency_graph(), graph);
    assert!(!provider.validate().is_valid());
}

#[cfg(feature = "graph-export")]
#[test]
fn test_dependency_graph_json() {
    let mut services = ServiceCollection::new();
    services.add_singleton::<Clock>();
    let json = DependencyGraph::from_collection(&services).to_json().unwrap();
    assert!(json.contains("\"lifetime\": \"singleton\""));
    assert!(json.contains("\"activation\": \"constructor\""));
}
