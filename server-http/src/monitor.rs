use canna::domain::request::FetchRequest;
use canna::planes::control::WorkerState;
use canna::ports::Fetcher;
use canna::sync::{ConnectivityMonitor, SyncTag};
use canna::OfflineWorker;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Any response at all means the upstream is reachable
pub async fn is_reachable(fetcher: &dyn Fetcher) -> bool {
    fetcher.fetch(&FetchRequest::get("/")).await.is_ok()
}

/// One connectivity check. Returns true when it observed the upstream coming back.
pub async fn check_once(
    monitor: &mut ConnectivityMonitor,
    worker: &OfflineWorker,
    fetcher: &dyn Fetcher,
) -> bool {
    let online = is_reachable(fetcher).await;
    if !monitor.observe(online) {
        return false;
    }
    on_reconnect(worker).await;
    true
}

/// Retry an install that never completed, then replay both queues
pub async fn on_reconnect(worker: &OfflineWorker) {
    if worker.state() == WorkerState::Parsed {
        match worker.start().await {
            Ok(report) => info!(
                "Worker controlling, deleted {} stale generation(s)",
                report.deleted.len()
            ),
            Err(e) => warn!("Install retry failed: {}", e),
        }
    }

    for tag in SyncTag::ALL {
        if let Err(e) = worker.sync(tag).await {
            debug!("{} not replayed on reconnect: {}", tag, e);
        }
    }
}

/// Check the upstream every `interval` until the task is aborted
pub async fn run(worker: Arc<OfflineWorker>, fetcher: Arc<dyn Fetcher>, interval: Duration) {
    let mut monitor = ConnectivityMonitor::new();
    // Startup already ran the first install; checks begin one interval later
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!("Connectivity monitor checking every {:?}", interval);
    loop {
        ticker.tick().await;
        check_once(&mut monitor, &worker, fetcher.as_ref()).await;
    }
}

/// Start the monitor task; an interval of zero seconds disables it
pub fn spawn(
    worker: Arc<OfflineWorker>,
    fetcher: Arc<dyn Fetcher>,
    interval_secs: u64,
) -> Option<JoinHandle<()>> {
    if interval_secs == 0 {
        info!("Connectivity monitor disabled");
        return None;
    }
    Some(tokio::spawn(run(
        worker,
        fetcher,
        Duration::from_secs(interval_secs),
    )))
}
