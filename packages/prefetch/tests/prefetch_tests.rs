#![allow(clippy::disallowed_methods)]

mod common;

use std::collections::HashSet;
use std::error::Error;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::time::Duration;

use prefetch::{
    IdleSignal, NetworkInfo, NoIdle, PrefetchConfig, PrefetchScheduler, RelatedRoute,
    StaticNetwork, UnknownNetwork,
};
use scheduler_core::Priority;

use common::LoadLog;

const SITE: &[(&str, Priority)] = &[
    ("home", Priority::Critical),
    ("leistungen", Priority::Critical),
    ("preise", Priority::Critical),
    ("projekte", Priority::High),
    ("contact", Priority::High),
    ("restaurant", Priority::Medium),
    ("faq", Priority::Low),
];

#[tokio::test]
async fn test_schedule_is_debounced() -> Result<(), Box<dyn Error>> {
    let log = LoadLog::default();
    let registry = common::registry(&log, SITE, Duration::ZERO);
    let prefetcher = PrefetchScheduler::start(common::fast_config(), registry).await?;

    prefetcher.schedule("faq", Priority::Low);
    prefetcher.schedule("faq", Priority::Low);
    prefetcher.schedule("faq", Priority::High);

    let stats = prefetcher.stats().await;
    assert_eq!(stats.scheduled, ["faq"]);

    common::settle().await;
    assert_eq!(log.count("faq"), 1);
    assert!(prefetcher.is_prefetched("faq").await);

    // Completed routes are never loaded again.
    prefetcher.schedule("faq", Priority::Critical);
    common::settle().await;
    assert_eq!(log.count("faq"), 1);
    assert!(prefetcher.stats().await.scheduled.is_empty());

    prefetcher.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_concurrent_prefetches_share_one_load() -> Result<(), Box<dyn Error>> {
    let log = LoadLog::default();
    let registry = common::registry(&log, SITE, Duration::from_millis(40));
    let prefetcher = PrefetchScheduler::start(PrefetchConfig::default(), registry).await?;

    tokio::join!(
        prefetcher.prefetch("home", Priority::Critical),
        prefetcher.prefetch("home", Priority::Critical),
        prefetcher.prefetch("home", Priority::Low),
    );

    assert_eq!(log.count("home"), 1);
    assert!(prefetcher.is_prefetched("home").await);

    // Scheduling while in flight is a no-op too.
    let slow = prefetcher.clone();
    let pending = tokio::spawn(async move { slow.prefetch("contact", Priority::High).await });
    tokio::time::sleep(Duration::from_millis(10)).await;
    prefetcher.schedule("contact", Priority::High);
    assert_eq!(prefetcher.stats().await.in_flight, ["contact"]);
    pending.await?;
    common::settle().await;
    assert_eq!(log.count("contact"), 1);

    prefetcher.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_constrained_host_loads_only_essential_routes() -> Result<(), Box<dyn Error>> {
    for info in [
        NetworkInfo::default().with_save_data(true),
        NetworkInfo::default().with_device_memory_gb(1.0),
    ] {
        let log = LoadLog::default();
        let registry = common::registry(&log, SITE, Duration::ZERO);
        let prefetcher = PrefetchScheduler::start_with(
            PrefetchConfig::default(),
            registry,
            Arc::new(StaticNetwork(info)),
            Arc::new(NoIdle),
        )
        .await?;

        prefetcher
            .prefetch_batch(["faq", "restaurant", "contact", "home"])
            .await;

        let loaded: HashSet<String> = log.started().into_iter().collect();
        let expected: HashSet<String> = ["contact", "home"].map(String::from).into();
        assert_eq!(loaded, expected);
        assert!(!prefetcher.is_prefetched("faq").await);

        prefetcher.shutdown();
    }
    Ok(())
}

#[tokio::test]
async fn test_batch_runs_critical_first_within_batch_size() -> Result<(), Box<dyn Error>> {
    let log = LoadLog::default();
    let registry = common::registry(&log, SITE, Duration::from_millis(20));
    let prefetcher = PrefetchScheduler::start(PrefetchConfig::default(), registry).await?;

    let routes = [
        "faq",
        "contact",
        "home",
        "restaurant",
        "preise",
        "projekte",
        "leistungen",
    ];
    prefetcher.prefetch_batch(routes).await;

    let started = log.started();
    assert_eq!(started.len(), 7);
    assert!(log.max_running() <= 3, "ran {} at once", log.max_running());

    let first: HashSet<&str> = started[..3].iter().map(String::as_str).collect();
    assert_eq!(first, HashSet::from(["home", "preise", "leistungen"]));
    assert_eq!(started.last().map(String::as_str), Some("faq"));

    let stats = prefetcher.stats().await;
    assert_eq!(stats.prefetched.len(), 7);
    assert!(stats.in_flight.is_empty());

    prefetcher.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_failed_load_stays_eligible() -> Result<(), Box<dyn Error>> {
    let attempts = Arc::new(AtomicUsize::new(0));
    let mut registry = prefetch::RouteRegistry::new();
    registry.register("flaky", Priority::High, common::flaky_loader(attempts.clone()));
    let prefetcher = PrefetchScheduler::start(PrefetchConfig::default(), registry).await?;

    prefetcher.prefetch("flaky", Priority::High).await;
    assert!(!prefetcher.is_prefetched("flaky").await);

    prefetcher.prefetch("flaky", Priority::High).await;
    assert!(prefetcher.is_prefetched("flaky").await);
    assert_eq!(attempts.load(std::sync::atomic::Ordering::SeqCst), 2);

    prefetcher.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_route_without_loader_is_skipped() -> Result<(), Box<dyn Error>> {
    let log = LoadLog::default();
    let registry = common::registry(&log, SITE, Duration::ZERO);
    let prefetcher = PrefetchScheduler::start(common::fast_config(), registry).await?;

    prefetcher.prefetch("ghost", Priority::Critical).await;
    prefetcher.schedule("ghost", Priority::Critical);
    common::settle().await;

    assert!(!prefetcher.is_prefetched("ghost").await);
    assert_eq!(prefetcher.stats().await, Default::default());

    prefetcher.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_prefetch_related_schedules_configured_routes() -> Result<(), Box<dyn Error>> {
    let log = LoadLog::default();
    let mut registry = common::registry(&log, SITE, Duration::ZERO);
    registry.relate(
        "home",
        [
            RelatedRoute::new("leistungen", Priority::High),
            RelatedRoute::new("preise", Priority::High),
        ],
    );
    let prefetcher = PrefetchScheduler::start(common::fast_config(), registry).await?;

    prefetcher.prefetch_related("home");
    prefetcher.prefetch_related("faq");
    common::settle().await;

    assert!(prefetcher.is_prefetched("leistungen").await);
    assert!(prefetcher.is_prefetched("preise").await);
    assert!(!prefetcher.is_prefetched("home").await);
    assert_eq!(log.started().len(), 2);

    prefetcher.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_critical_routes_load_when_idle() -> Result<(), Box<dyn Error>> {
    let log = LoadLog::default();
    let registry = common::registry(&log, SITE, Duration::ZERO);
    let signal = IdleSignal::new();
    let prefetcher = PrefetchScheduler::start_with(
        PrefetchConfig::default().with_idle_timeout(Duration::from_secs(10)),
        registry,
        Arc::new(UnknownNetwork),
        Arc::new(signal.clone()),
    )
    .await?;

    let task = prefetcher.prefetch_critical_on_idle();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(log.started().is_empty());

    signal.notify_idle();
    tokio::time::timeout(Duration::from_secs(1), task).await??;

    let stats = prefetcher.stats().await;
    assert_eq!(stats.prefetched, ["home", "leistungen", "preise"]);

    prefetcher.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_idle_signal_right_after_the_call_is_not_lost() -> Result<(), Box<dyn Error>> {
    let log = LoadLog::default();
    let registry = common::registry(&log, SITE, Duration::ZERO);
    let signal = IdleSignal::new();
    let prefetcher = PrefetchScheduler::start_with(
        PrefetchConfig::default().with_idle_timeout(Duration::from_secs(5)),
        registry,
        Arc::new(UnknownNetwork),
        Arc::new(signal.clone()),
    )
    .await?;

    let task = prefetcher.prefetch_critical_on_idle();
    signal.notify_idle();
    tokio::time::timeout(Duration::from_secs(1), task).await??;
    assert_eq!(log.started().len(), 3);

    prefetcher.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_critical_routes_load_after_idle_timeout() -> Result<(), Box<dyn Error>> {
    let log = LoadLog::default();
    let registry = common::registry(&log, SITE, Duration::ZERO);
    let prefetcher = PrefetchScheduler::start_with(
        PrefetchConfig::default().with_idle_timeout(Duration::from_millis(30)),
        registry,
        Arc::new(UnknownNetwork),
        Arc::new(IdleSignal::new()),
    )
    .await?;

    tokio::time::timeout(Duration::from_secs(1), prefetcher.prefetch_critical_on_idle()).await??;
    assert_eq!(log.started().len(), 3);

    // Without an idle facility the routes load right away.
    let log = LoadLog::default();
    let registry = common::registry(&log, SITE, Duration::ZERO);
    let immediate = PrefetchScheduler::start(
        PrefetchConfig::default().with_idle_timeout(Duration::from_secs(10)),
        registry,
    )
    .await?;
    tokio::time::timeout(Duration::from_secs(1), immediate.prefetch_critical_on_idle()).await??;
    assert_eq!(log.started().len(), 3);

    prefetcher.shutdown();
    immediate.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_clear_and_cancel_pending() -> Result<(), Box<dyn Error>> {
    let log = LoadLog::default();
    let registry = common::registry(&log, SITE, Duration::ZERO);
    let prefetcher = PrefetchScheduler::start(common::fast_config(), registry).await?;

    prefetcher.prefetch("home", Priority::Critical).await;
    prefetcher.schedule("faq", Priority::Low);
    prefetcher.clear();

    assert!(!prefetcher.is_prefetched("home").await);
    common::settle().await;
    assert_eq!(log.count("faq"), 0);

    // Cleared routes load again on the next request.
    prefetcher.prefetch("home", Priority::Critical).await;
    assert_eq!(log.count("home"), 2);

    prefetcher.schedule("contact", Priority::High);
    assert_eq!(prefetcher.stats().await.scheduled, ["contact"]);
    prefetcher.cancel_pending();
    common::settle().await;
    assert_eq!(log.count("contact"), 0);
    assert!(prefetcher.stats().await.scheduled.is_empty());

    prefetcher.shutdown();
    Ok(())
}

#[tokio::test]
async fn test_stopped_prefetcher_is_inert() -> Result<(), Box<dyn Error>> {
    let log = LoadLog::default();
    let registry = common::registry(&log, SITE, Duration::ZERO);
    let prefetcher = PrefetchScheduler::start(common::fast_config(), registry).await?;

    prefetcher.shutdown();
    tokio::time::sleep(Duration::from_millis(20)).await;

    tokio::time::timeout(
        Duration::from_secs(1),
        prefetcher.prefetch("home", Priority::Critical),
    )
    .await?;
    prefetcher.schedule("faq", Priority::Low);
    common::settle().await;

    assert!(log.started().is_empty());
    assert!(!prefetcher.is_prefetched("home").await);
    assert_eq!(prefetcher.stats().await, Default::default());
    Ok(())
}
