//! Background re-evaluation of working orders.
//!
//! One loop per monitor. Each tick walks the working orders, fills those
//! whose limit now crosses the market, cancels expired and stale day
//! orders, then records a heartbeat. `stop` takes effect at the next tick
//! boundary; a tick already in flight completes.

use crate::config::MonitorConfig;
use crate::ledger::OrderLedger;
use crate::models::{HeartbeatStatus, OrderStatus, SavedOrder, TimeInForce};
use crate::simulator;
use crate::storage::KeyValueStore;
use crate::trading::ChainSource;
use chrono::{DateTime, Local, NaiveDate, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};


/// Store key holding the last heartbeat as RFC 3339.
pub const HEARTBEAT_KEY: &str = "monitor.heartbeat";

/// Counts from one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Orders filled.
    pub filled: usize,
    /// Orders canceled (expired or stale day orders).
    pub canceled: usize,
    /// Orders evaluated and left working.
    pub untouched: usize,
    /// Orders that could not be evaluated this tick.
    pub skipped: usize,
}

enum Decision {
    Fill(Decimal),
    Cancel(&'static str),
    Keep,
}

/// Periodic order monitor.
pub struct OrderMonitor {
    ledger: Arc<OrderLedger>,
    chains: Arc<dyn ChainSource>,
    store: Arc<dyn KeyValueStore>,
    config: MonitorConfig,
    running: AtomicBool,
    epoch: AtomicU64,
    ticks: AtomicU64,
    shutdown: Arc<Notify>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl OrderMonitor {
    /// Creates a stopped monitor.
    #[must_use]
    pub fn new(
        ledger: Arc<OrderLedger>,
        chains: Arc<dyn ChainSource>,
        store: Arc<dyn KeyValueStore>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            ledger,
            chains,
            store,
            config,
            running: AtomicBool::new(false),
            epoch: AtomicU64::new(0),
            ticks: AtomicU64::new(0),
            shutdown: Arc::new(Notify::new()),
            handle: Mutex::new(None),
        }
    }

    /// Monitor settings.
    #[must_use]
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Starts the loop. Returns `false` if it was already running.
    ///
    /// The first tick runs immediately.
    pub fn start(self: &Arc<Self>) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            debug!("order monitor already running");
            return false;
        }

        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let weak = Arc::downgrade(self);
        let shutdown = Arc::clone(&self.shutdown);
        let interval = self.config.interval();

        let handle = tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "order monitor started");
            loop {
                let Some(monitor) = weak.upgrade() else {
                    break;
                };
                if !monitor.is_current(epoch) {
                    break;
                }
                monitor.tick().await;

                let notified = shutdown.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                let current = monitor.is_current(epoch);
                drop(monitor);
                if !current {
                    break;
                }

                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = &mut notified => {}
                }
            }
            info!("order monitor stopped");
        });

        *self.handle.lock() = Some(handle);
        true
    }

    /// Stops the loop after the current tick. Returns `false` if it was not
    /// running.
    pub fn stop(&self) -> bool {
        let was_running = self.running.swap(false, Ordering::SeqCst);
        self.shutdown.notify_waiters();
        was_running
    }

    /// Whether the loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ticks completed since construction.
    #[must_use]
    pub fn ticks_completed(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    /// Last persisted heartbeat, if any.
    #[must_use]
    pub fn last_heartbeat(&self) -> Option<DateTime<Utc>> {
        let raw = match self.store.get(HEARTBEAT_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "cannot read monitor heartbeat");
                return None;
            }
        };
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(at) => Some(at.with_timezone(&Utc)),
            Err(e) => {
                warn!(error = %e, value = %raw, "malformed monitor heartbeat");
                None
            }
        }
    }

    /// Classifies the last heartbeat relative to `now`.
    #[must_use]
    pub fn heartbeat_status(&self, now: DateTime<Utc>) -> HeartbeatStatus {
        match self.last_heartbeat() {
            None => HeartbeatStatus::Never,
            Some(at) if now - at > self.config.stale_after() => HeartbeatStatus::Stale,
            Some(_) => HeartbeatStatus::Alive,
        }
    }

    /// Runs one tick at the current time.
    pub async fn tick(&self) -> TickReport {
        self.tick_at(Utc::now()).await
    }

    /// Runs one tick as if the clock read `now`.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> TickReport {
        let today = now.with_timezone(&Local).date_naive();
        let mut report = TickReport::default();

        match self.ledger.working() {
            Ok(orders) => {
                for order in orders {
                    self.process(&order, today, &mut report).await;
                }
            }
            Err(e) => warn!(error = %e, "cannot load working orders"),
        }

        if let Err(e) = self.store.put(HEARTBEAT_KEY, now.to_rfc3339()) {
            warn!(error = %e, "cannot persist monitor heartbeat");
        }
        self.ticks.fetch_add(1, Ordering::SeqCst);

        info!(
            filled = report.filled,
            canceled = report.canceled,
            untouched = report.untouched,
            skipped = report.skipped,
            "monitor tick complete"
        );
        report
    }

    async fn process(&self, order: &SavedOrder, today: NaiveDate, report: &mut TickReport) {
        let decision = match self.decide(order, today).await {
            Ok(decision) => decision,
            Err(e) => {
                warn!(order_id = %order.id, symbol = %order.symbol, error = %e, "cannot evaluate order");
                report.skipped += 1;
                return;
            }
        };

        let result = match decision {
            Decision::Keep => {
                report.untouched += 1;
                return;
            }
            Decision::Fill(price) => self
                .ledger
                .update(&order.id, |o| o.mark_filled(price, "filled by monitor"))
                .map(|changed| (changed, OrderStatus::Filled)),
            Decision::Cancel(reason) => self
                .ledger
                .update(&order.id, |o| o.mark_canceled(reason))
                .map(|changed| (changed, OrderStatus::Canceled)),
        };

        match result {
            Ok((true, OrderStatus::Filled)) => {
                info!(order_id = %order.id, "working order filled");
                report.filled += 1;
            }
            Ok((true, _)) => {
                info!(order_id = %order.id, "working order canceled");
                report.canceled += 1;
            }
            // Changed or removed since the tick loaded it.
            Ok((false, _)) => report.untouched += 1,
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "cannot update order");
                report.skipped += 1;
            }
        }
    }

    async fn decide(&self, order: &SavedOrder, today: NaiveDate) -> Result<Decision, quote_client::Error> {
        if order.expiration < today {
            return Ok(Decision::Cancel("option expired"));
        }

        let chain = self
            .chains
            .fetch_option_chain(&order.symbol, Some(order.expiration))
            .await?;
        let price = chain
            .find(order.right.into(), order.strike)
            .and_then(|contract| simulator::execution_price(order.side, order.limit, contract));
        if let Some(price) = price {
            return Ok(Decision::Fill(price));
        }

        let placed_on = order.placed_at.with_timezone(&Local).date_naive();
        if order.time_in_force == TimeInForce::Day && placed_on < today {
            return Ok(Decision::Cancel("day order not filled"));
        }
        Ok(Decision::Keep)
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.running.load(Ordering::SeqCst) && self.epoch.load(Ordering::SeqCst) == epoch
    }
}

impl Drop for OrderMonitor {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.get_mut().take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for OrderMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderMonitor")
            .field("running", &self.is_running())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
