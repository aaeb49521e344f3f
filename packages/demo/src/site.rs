//! Route table of the marketing site.

use std::time::Duration;

use prefetch::{FnLoader, RelatedRoute, RouteRegistry};
use scheduler_core::Priority;

const ROUTES: &[(&str, Priority)] = &[
    ("home", Priority::Critical),
    ("leistungen", Priority::Critical),
    ("preise", Priority::Critical),
    ("projekte", Priority::High),
    ("contact", Priority::High),
    ("restaurant", Priority::Medium),
    ("architecture", Priority::Medium),
    ("realestate", Priority::Medium),
    ("automationen", Priority::Low),
    ("configurator", Priority::Low),
    ("faq", Priority::Low),
    ("impressum", Priority::Low),
    ("datenschutz", Priority::Low),
    ("login", Priority::Low),
    ("register", Priority::Low),
    ("dashboard", Priority::Low),
    ("analytics", Priority::Low),
    ("chat", Priority::Low),
];

/// Registry whose loaders simulate fetching a page module.
pub fn registry(fetch_time: Duration) -> RouteRegistry {
    let mut registry = RouteRegistry::new();

    for (route, priority) in ROUTES {
        let name = route.to_string();
        registry.register(
            *route,
            *priority,
            FnLoader::new(move || {
                let name = name.clone();
                async move {
                    tokio::time::sleep(fetch_time).await;
                    tracing::debug!("Fetched module for {}", name);
                    Ok(())
                }
            }),
        );
    }

    registry
        .relate(
            "home",
            [
                RelatedRoute::new("leistungen", Priority::High),
                RelatedRoute::new("preise", Priority::High),
            ],
        )
        .relate(
            "leistungen",
            [
                RelatedRoute::new("preise", Priority::High),
                RelatedRoute::new("projekte", Priority::Medium),
            ],
        )
        .relate("preise", [RelatedRoute::new("contact", Priority::High)])
        .relate(
            "dashboard",
            [
                RelatedRoute::new("analytics", Priority::Medium),
                RelatedRoute::new("chat", Priority::Low),
            ],
        );

    registry
}
