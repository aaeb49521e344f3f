//! Runs the worker pool and the prefetcher against the built-in workloads.
//!
//! Configuration comes from `WORKER_POOL_*` and `PREFETCH_*` environment
//! variables; `RUST_LOG` controls log output.

mod site;

use std::collections::HashMap;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use actors::{PoolConfig, WorkerPool};
use prefetch::{IdleSignal, PrefetchConfig, PrefetchScheduler, UnknownNetwork};
use scheduler_core::{
    AnalyticsInput, AnalyticsOperation, ChartInput, ChartPoint, CurrencyInput, PoolEvent,
    PricingInput, Priority, WorkerRequest,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    run_pool(PoolConfig::from_env()?).await?;
    run_prefetch(PrefetchConfig::from_env()?).await?;

    Ok(())
}

async fn run_pool(config: PoolConfig) -> Result<(), Box<dyn Error>> {
    let pool = WorkerPool::start(config).await?;
    tracing::info!("Worker pool up to {} workers", pool.max_workers());

    let mut events = pool.subscribe();
    let watcher = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            tracing::debug!("{:?}", event);
            if matches!(event, PoolEvent::PoolTerminated { .. }) {
                break;
            }
        }
    });

    let pricing = WorkerRequest::pricing(
        &PricingInput::new(100.0)
            .with_quantity(5)
            .with_options(vec!["analytics".to_string(), "blog".to_string()])
            .with_tax_rate(19.0),
    )?;
    let analytics = WorkerRequest::analytics(&AnalyticsInput {
        data: vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0],
        operation: AnalyticsOperation::Stddev,
    })?;
    let currency = WorkerRequest::currency(&CurrencyInput {
        amount: 100.0,
        from: "USD".to_string(),
        to: "GBP".to_string(),
        rates: HashMap::from([("USD".to_string(), 1.1), ("GBP".to_string(), 0.85)]),
    })?;
    let chart = WorkerRequest::chart(&ChartInput {
        data: (0..8)
            .map(|i| ChartPoint::new(i as f64, (i * i) as f64))
            .collect(),
        smoothing: Some(3.0),
    })?;

    let (pricing, analytics, currency, chart, unknown) = tokio::join!(
        pool.execute_as::<f64>(pricing),
        pool.execute_as::<f64>(analytics),
        pool.execute_as::<f64>(currency),
        pool.execute(chart),
        pool.execute(WorkerRequest::new("forecast", json!({}))),
    );

    tracing::info!("Pricing total: {}", pricing?);
    tracing::info!("Standard deviation: {}", analytics?);
    tracing::info!("100 USD in GBP: {:.2}", currency?);
    tracing::info!("Smoothed chart: {}", chart?);
    if let Err(e) = unknown {
        tracing::info!("Unsupported job rejected: {}", e);
    }

    let stats = pool.stats().await?;
    tracing::info!(
        "Pool stats: {} workers, {} active, {} queued",
        stats.total_workers,
        stats.active_jobs,
        stats.queued_jobs
    );

    pool.terminate();
    let _ = watcher.await;

    Ok(())
}

async fn run_prefetch(config: PrefetchConfig) -> Result<(), Box<dyn Error>> {
    let idle = IdleSignal::new();
    let prefetcher = PrefetchScheduler::start_with(
        config,
        site::registry(Duration::from_millis(25)),
        Arc::new(UnknownNetwork),
        Arc::new(idle.clone()),
    )
    .await?;

    let critical = prefetcher.prefetch_critical_on_idle();

    // A visitor hovers over a few links.
    prefetcher.schedule("faq", Priority::Low);
    prefetcher.schedule("faq", Priority::Low);
    prefetcher.schedule("contact", Priority::High);

    // The first render is done.
    tokio::time::sleep(Duration::from_millis(50)).await;
    idle.notify_idle();
    critical.await?;

    prefetcher.prefetch_related("dashboard");
    tokio::time::sleep(Duration::from_millis(500)).await;

    let stats = prefetcher.stats().await;
    tracing::info!("Prefetched routes: {}", stats.prefetched.join(", "));
    if !stats.scheduled.is_empty() || !stats.in_flight.is_empty() {
        tracing::info!(
            "Still pending: {} scheduled, {} loading",
            stats.scheduled.len(),
            stats.in_flight.len()
        );
    }

    prefetcher.cancel_pending();
    prefetcher.shutdown();

    Ok(())
}
