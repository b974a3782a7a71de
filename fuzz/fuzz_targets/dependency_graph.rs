#![no_main]

use keel_di::{ContainerOptions, DiError, Key, Lifetime, Resolver, ScopedFromRoot, ServiceCollection};
use libfuzzer_sys::fuzz_target;

const TOKENS: [&str; 16] = [
    "n0", "n1", "n2", "n3", "n4", "n5", "n6", "n7", "n8", "n9", "n10", "n11", "n12", "n13", "n14", "n15",
];

struct Node;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let node_count = (data[0] % 16) as usize + 1;
    let max_depth = (data[1] % 32) as usize + 1;
    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    let mut lifetimes = vec![Lifetime::Transient; node_count];

    // Remaining bytes: (node, lifetime/dependency) pairs; out-of-range targets become missing services
    for pair in data[2..].chunks_exact(2).take(128) {
        let node = pair[0] as usize % node_count;
        if pair[1] & 0x80 != 0 {
            lifetimes[node] = match pair[1] % 3 {
                0 => Lifetime::Singleton,
                1 => Lifetime::Scoped,
                _ => Lifetime::Transient,
            };
        } else {
            edges[node].push((pair[1] % 16) as usize);
        }
    }

    let mut services = ServiceCollection::new();
    services.with_options(
        ContainerOptions::new()
            .with_max_depth(max_depth)
            .with_scoped_from_root(ScopedFromRoot::RootScope),
    );
    for (i, deps) in edges.into_iter().enumerate() {
        services.add_factory::<Node, _>(Key::token(TOKENS[i]), lifetimes[i], move |ctx| {
            for dep in &deps {
                ctx.get_token::<Node>(TOKENS[*dep])?;
            }
            Ok(Node)
        });
    }

    let provider = services.build();
    let scope = provider.create_scope();
    for token in TOKENS.iter().take(node_count) {
        for result in [scope.get_token::<Node>(token), provider.get_token::<Node>(token)] {
            match result {
                Ok(_)
                | Err(DiError::Circular(_))
                | Err(DiError::DepthExceeded(_))
                | Err(DiError::NotFound(_)) => {}
                Err(other) => panic!("unexpected resolution error: {}", other),
            }
        }
    }
    scope.dispose();
    provider.dispose_all();
});
