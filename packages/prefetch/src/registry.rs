//! Route registry: which routes exist, how to load them and how urgent
//! they are.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use scheduler_core::Priority;

use crate::error::PrefetchError;

/// Future returned by a module loader.
pub type LoadFuture = Pin<Box<dyn Future<Output = Result<(), PrefetchError>> + Send + 'static>>;

/// Loads the module behind a route.
///
/// Loading the same module twice must be harmless; the scheduler only
/// guarantees that two loads of one route never overlap.
pub trait ModuleLoader: Send + Sync + 'static {
    fn load(&self) -> LoadFuture;
}

/// A closure-based module loader.
pub struct FnLoader<F> {
    load: F,
}

impl<F, Fut> FnLoader<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), PrefetchError>> + Send + 'static,
{
    pub fn new(load: F) -> Self {
        Self { load }
    }
}

impl<F, Fut> ModuleLoader for FnLoader<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), PrefetchError>> + Send + 'static,
{
    fn load(&self) -> LoadFuture {
        Box::pin((self.load)())
    }
}

/// A route to warm up alongside another one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelatedRoute {
    pub route: String,
    pub priority: Priority,
}

impl RelatedRoute {
    pub fn new(route: impl Into<String>, priority: Priority) -> Self {
        Self {
            route: route.into(),
            priority,
        }
    }
}

struct RouteEntry {
    loader: Option<Arc<dyn ModuleLoader>>,
    priority: Priority,
    related: Vec<RelatedRoute>,
}

/// Mapping from route identifiers to loaders, default priorities and
/// related routes.
///
/// Routes that are not registered have [`Priority::Low`].
#[derive(Default)]
pub struct RouteRegistry {
    routes: HashMap<String, RouteEntry>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Register a route with its loader and default priority, replacing any
    /// previous loader and priority. Related routes are kept.
    pub fn register<L: ModuleLoader>(
        &mut self,
        route: impl Into<String>,
        priority: Priority,
        loader: L,
    ) -> &mut Self {
        let loader: Arc<dyn ModuleLoader> = Arc::new(loader);
        let entry = self.entry(route.into());
        entry.loader = Some(loader);
        entry.priority = priority;
        self
    }

    /// Routes to warm up when `route` becomes current.
    pub fn relate(
        &mut self,
        route: impl Into<String>,
        related: impl IntoIterator<Item = RelatedRoute>,
    ) -> &mut Self {
        self.entry(route.into()).related.extend(related);
        self
    }

    fn entry(&mut self, route: String) -> &mut RouteEntry {
        self.routes.entry(route).or_insert_with(|| RouteEntry {
            loader: None,
            priority: Priority::Low,
            related: Vec::new(),
        })
    }

    pub fn loader(&self, route: &str) -> Option<Arc<dyn ModuleLoader>> {
        self.routes.get(route)?.loader.clone()
    }

    pub fn priority_of(&self, route: &str) -> Priority {
        self.routes
            .get(route)
            .map(|entry| entry.priority)
            .unwrap_or(Priority::Low)
    }

    pub fn related(&self, route: &str) -> &[RelatedRoute] {
        self.routes
            .get(route)
            .map(|entry| entry.related.as_slice())
            .unwrap_or_default()
    }

    /// Routes with a loader, in no particular order.
    pub fn routes(&self) -> Vec<&str> {
        self.routes
            .iter()
            .filter(|(_, entry)| entry.loader.is_some())
            .map(|(route, _)| route.as_str())
            .collect()
    }

    /// Routes with a loader at `priority`, sorted by name.
    pub fn routes_with_priority(&self, priority: Priority) -> Vec<String> {
        let mut routes: Vec<String> = self
            .routes
            .iter()
            .filter(|(_, entry)| entry.loader.is_some() && entry.priority == priority)
            .map(|(route, _)| route.clone())
            .collect();
        routes.sort();
        routes
    }

    /// Stable sort of `routes` by registered priority, most urgent first.
    pub fn sort_by_priority(&self, routes: &mut [String]) {
        routes.sort_by_key(|route| self.priority_of(route));
    }
}
