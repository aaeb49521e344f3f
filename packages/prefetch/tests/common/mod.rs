use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use prefetch::{DebounceDelays, FnLoader, PrefetchConfig, PrefetchError, RouteRegistry};
use scheduler_core::Priority;

/// Records every load: start order and peak concurrency.
#[derive(Clone, Default)]
pub struct LoadLog {
    inner: Arc<Mutex<LogInner>>,
}

#[derive(Default)]
struct LogInner {
    started: Vec<String>,
    running: usize,
    max_running: usize,
}

impl LoadLog {
    fn start(&self, route: &str) {
        let mut inner = self.inner.lock().unwrap();
        inner.started.push(route.to_string());
        inner.running += 1;
        inner.max_running = inner.max_running.max(inner.running);
    }

    fn finish(&self) {
        self.inner.lock().unwrap().running -= 1;
    }

    pub fn started(&self) -> Vec<String> {
        self.inner.lock().unwrap().started.clone()
    }

    pub fn count(&self, route: &str) -> usize {
        self.started().iter().filter(|r| *r == route).count()
    }

    pub fn max_running(&self) -> usize {
        self.inner.lock().unwrap().max_running
    }
}

/// Register `routes`, each loading for `delay`.
pub fn registry(log: &LoadLog, routes: &[(&str, Priority)], delay: Duration) -> RouteRegistry {
    let mut registry = RouteRegistry::new();
    for (route, priority) in routes {
        let log = log.clone();
        let name = route.to_string();
        registry.register(
            *route,
            *priority,
            FnLoader::new(move || {
                let log = log.clone();
                let name = name.clone();
                async move {
                    log.start(&name);
                    tokio::time::sleep(delay).await;
                    log.finish();
                    Ok(())
                }
            }),
        );
    }
    registry
}

/// A loader that fails on its first attempt and succeeds afterwards.
pub fn flaky_loader(
    attempts: Arc<AtomicUsize>,
) -> FnLoader<impl Fn() -> std::future::Ready<Result<(), PrefetchError>> + Send + Sync + 'static>
{
    FnLoader::new(move || {
        let attempt = attempts.fetch_add(1, Ordering::SeqCst);
        std::future::ready(if attempt == 0 {
            Err(PrefetchError::load_failed("flaky", "chunk missing"))
        } else {
            Ok(())
        })
    })
}

/// Short uniform debounce so tests stay quick.
pub fn fast_config() -> PrefetchConfig {
    PrefetchConfig::default().with_delays(DebounceDelays::uniform(Duration::from_millis(30)))
}

pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(120)).await;
}
