use std::time::Duration;

use log::*;
use loyalty_engine::{AccrualAuthority, AccrualClient, OrderManagement, ReconciliationApi, SqliteDatabase};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Starts the reconciliation worker against the HTTP accrual authority. The worker runs until `shutdown` is cancelled,
/// so await the returned JoinHandle only after cancelling the token.
pub fn start_accrual_worker(
    db: SqliteDatabase,
    client: AccrualClient,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    // Slightly longer than the client timeout, so the client reports its own error first.
    let call_timeout = client.timeout() + Duration::from_secs(1);
    let api = ReconciliationApi::new(db, client).with_call_timeout(call_timeout);
    tokio::spawn(run_accrual_worker(api, interval, shutdown))
}

/// Runs a reconciliation pass every `interval` until `shutdown` is cancelled. A pass that overruns the interval delays
/// the next one instead of triggering a burst of catch-up passes.
pub async fn run_accrual_worker<B, A>(api: ReconciliationApi<B, A>, interval: Duration, shutdown: CancellationToken)
where
    B: OrderManagement,
    A: AccrualAuthority,
{
    let mut timer = tokio::time::interval(interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!("🕰️ Accrual reconciliation worker started. Polling every {interval:?}");
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = timer.tick() => {},
        }
        trace!("🕰️ Running accrual reconciliation pass");
        match api.reconcile_pending(&shutdown).await {
            Ok(summary) if summary.rate_limited => {
                let Some(wait) = summary.retry_after else { continue };
                info!("🕰️ Pausing reconciliation for {wait:?} at the accrual authority's request");
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = tokio::time::sleep(wait) => timer.reset(),
                }
            },
            Ok(summary) if summary.checked > 0 => {
                info!(
                    "🕰️ Checked {} orders. {} updated, {} unchanged, {} not ready, {} failed",
                    summary.checked, summary.applied, summary.unchanged, summary.not_ready, summary.failed
                );
            },
            Ok(_) => trace!("🕰️ No orders are awaiting accrual results"),
            Err(e) => error!("🕰️ Could not fetch the orders awaiting accrual results. {e}"),
        }
    }
    info!("🕰️ Accrual reconciliation worker stopped");
}
