//! Pulls accrual results from the accrual authority into the order registry.
use std::{fmt::Debug, time::Duration};

use log::*;
use tokio_util::sync::CancellationToken;

use crate::{
    accrual::{AccrualAuthority, AccrualError, DEFAULT_ACCRUAL_TIMEOUT},
    api::order_registry_api::OrderRegistryApi,
    db_types::{AccrualUpdate, OrderNumber},
    traits::{OrderManagement, OrderRegistryError},
};

/// What a single reconciliation pass achieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconciliationSummary {
    /// Pending orders that were queried.
    pub checked: usize,
    /// Orders that moved to a new status.
    pub applied: usize,
    /// Orders whose reported status was stale or the same as before.
    pub unchanged: usize,
    /// Orders the authority has not started on (`REGISTERED`, or no record yet).
    pub not_ready: usize,
    /// Orders skipped because of an error. They are picked up again on the next pass.
    pub failed: usize,
    /// True if the pass stopped early because shutdown was requested.
    pub cancelled: bool,
    /// True if the pass stopped early because the authority is rate limiting us.
    pub rate_limited: bool,
    /// How long the authority asked us to back off, if it said.
    pub retry_after: Option<Duration>,
}

enum Reconciled {
    Applied,
    Unchanged,
    NotReady,
    Failed,
    RateLimited(Option<Duration>),
}

pub struct ReconciliationApi<B, A> {
    registry: OrderRegistryApi<B>,
    authority: A,
    call_timeout: Duration,
}

impl<B: Debug, A: Debug> Debug for ReconciliationApi<B, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi ({:?}, {:?})", self.registry, self.authority)
    }
}

impl<B, A> ReconciliationApi<B, A>
where
    B: OrderManagement,
    A: AccrualAuthority,
{
    pub fn new(db: B, authority: A) -> Self {
        // Slightly longer than the default client timeout, so the client reports its own error first.
        let call_timeout = DEFAULT_ACCRUAL_TIMEOUT + Duration::from_secs(1);
        Self { registry: OrderRegistryApi::new(db), authority, call_timeout }
    }

    /// Upper bound on a single authority query, regardless of how the authority itself is configured.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &OrderRegistryApi<B> {
        &self.registry
    }

    /// Runs one reconciliation pass over a snapshot of the pending orders.
    ///
    /// Each order is handled independently: a failure is logged, counted and skipped, and the order is retried on the
    /// next pass. Each applied result is committed on its own, so stopping part way through leaves nothing half
    /// applied. The pass checks `cancel` before each order and abandons an in-flight query when it fires.
    ///
    /// A rate-limit response ends the pass. The remaining orders wait for the next pass.
    ///
    /// Only a failure to read the pending list is returned as an error.
    pub async fn reconcile_pending(&self, cancel: &CancellationToken) -> Result<ReconciliationSummary, OrderRegistryError> {
        let pending = self.registry.list_pending().await?;
        let mut summary = ReconciliationSummary::default();
        trace!("🕰️ {} orders are awaiting accrual results", pending.len());
        for number in pending {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }
            let outcome = tokio::select! {
                _ = cancel.cancelled() => {
                    summary.cancelled = true;
                    break;
                },
                outcome = self.reconcile_one(&number) => outcome,
            };
            summary.checked += 1;
            match outcome {
                Reconciled::Applied => summary.applied += 1,
                Reconciled::Unchanged => summary.unchanged += 1,
                Reconciled::NotReady => summary.not_ready += 1,
                Reconciled::Failed => summary.failed += 1,
                Reconciled::RateLimited(retry_after) => {
                    summary.failed += 1;
                    summary.rate_limited = true;
                    summary.retry_after = retry_after;
                    break;
                },
            }
        }
        if summary.cancelled {
            info!("🕰️ Reconciliation pass cancelled after {} orders", summary.checked);
        }
        if summary.rate_limited {
            info!(
                "🕰️ Reconciliation pass stopped after {} orders. The accrual authority is rate limiting us (retry after \
                 {:?})",
                summary.checked, summary.retry_after
            );
        }
        Ok(summary)
    }

    async fn reconcile_one(&self, number: &OrderNumber) -> Reconciled {
        let report = match tokio::time::timeout(self.call_timeout, self.authority.fetch_accrual(number)).await {
            Ok(Ok(report)) => report,
            Ok(Err(AccrualError::NotRegistered(_))) => {
                trace!("🕰️ Order [{number}] is not known to the accrual authority yet");
                return Reconciled::NotReady;
            },
            Ok(Err(AccrualError::RateLimited { retry_after })) => {
                debug!("🕰️ Rate limited while fetching order [{number}]");
                return Reconciled::RateLimited(retry_after);
            },
            Ok(Err(e)) => {
                warn!("🕰️ Could not fetch the accrual for order [{number}]. {e}");
                return Reconciled::Failed;
            },
            Err(_) => {
                warn!("🕰️ The accrual authority did not answer for order [{number}] within {:?}", self.call_timeout);
                return Reconciled::Failed;
            },
        };
        if report.order != number.as_str() {
            warn!("🕰️ Asked about order [{number}] but the accrual authority answered about [{}]", report.order);
            return Reconciled::Failed;
        }
        let Some(result) = report.to_accrual_result() else {
            trace!("🕰️ Order [{number}] is registered with the accrual authority but not processed yet");
            return Reconciled::NotReady;
        };
        match self.registry.apply_accrual_result(number, result.status, result.accrual).await {
            Ok(AccrualUpdate::Applied(_)) => Reconciled::Applied,
            Ok(AccrualUpdate::Unchanged(_)) => Reconciled::Unchanged,
            Err(e) => {
                error!("🕰️ Could not apply the accrual result for order [{number}]. {e}");
                Reconciled::Failed
            },
        }
    }
}
