//! Cache invalidation bus and the debounced refresh worker
//!
//! ```text
//! collaborator ──emit(kind, reason)──▶ SignalBus (broadcast)
//!                                          │
//!                                          ▼
//!                                   RefreshWorker
//!                                     ├── pending: kind → latest signal
//!                                     └── debounce deadline
//!                                          │ flush
//!                                          ▼
//!                         ProjectStore / EmployeeStore / IssueDirectory
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use shared::message::{InvalidationSignal, SignalKind};
use tokio::sync::broadcast;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::issues::IssueDirectory;
use crate::providers::{EmployeeStore, ProjectStore};

/// Broadcast channel capacity
const BUS_CAPACITY: usize = 64;

/// Pub/sub for invalidation signals; cheap to clone.
#[derive(Clone)]
pub struct SignalBus {
    tx: broadcast::Sender<InvalidationSignal>,
    version: Arc<AtomicU64>,
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self {
            tx,
            version: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Publish a signal; returns it with its assigned version.
    pub fn emit(&self, kind: SignalKind, reason: impl Into<String>) -> InvalidationSignal {
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        let signal = InvalidationSignal::new(kind, reason, version);
        tracing::debug!(kind = %kind, version, reason = %signal.reason, "Signal emitted");
        // send only fails when nobody is subscribed
        let _ = self.tx.send(signal.clone());
        signal
    }

    pub fn subscribe(&self) -> broadcast::Receiver<InvalidationSignal> {
        self.tx.subscribe()
    }

    /// Version of the most recent signal, 0 when none was emitted
    pub fn current_version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }
}

/// Stores a worker refreshes
#[derive(Clone)]
pub struct RefreshTargets {
    pub projects: ProjectStore,
    pub employees: EmployeeStore,
    pub issues: IssueDirectory,
}

impl RefreshTargets {
    async fn refresh(&self, kind: SignalKind) {
        let result = match kind {
            SignalKind::ProjectStatusUpdated => self.projects.refresh().await,
            SignalKind::AttendanceUpdated => self.employees.refresh().await,
            SignalKind::IssuesChanged => self.issues.refresh().await,
        };
        if let Err(e) = result {
            tracing::error!(kind = %kind, "Refresh after signal failed: {e}");
        }
    }
}

/// Listens to the bus, coalesces signals per kind within the debounce
/// window and runs one refresh per kind.
pub struct RefreshWorker {
    bus: SignalBus,
    targets: RefreshTargets,
    debounce: Duration,
    shutdown: CancellationToken,
}

impl RefreshWorker {
    pub fn new(
        bus: SignalBus,
        targets: RefreshTargets,
        debounce: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            bus,
            targets,
            debounce,
            shutdown,
        }
    }

    pub async fn run(self) {
        tracing::info!(debounce_ms = self.debounce.as_millis() as u64, "RefreshWorker started");

        let mut rx = self.bus.subscribe();
        let mut pending: HashMap<SignalKind, InvalidationSignal> = HashMap::new();
        let mut debounce_deadline: Option<Instant> = None;

        loop {
            let sleep_until =
                debounce_deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));

            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("RefreshWorker shutting down");
                    break;
                }

                _ = tokio::time::sleep_until(sleep_until), if debounce_deadline.is_some() => {
                    self.flush(&mut pending).await;
                    debounce_deadline = None;
                }

                result = rx.recv() => {
                    match result {
                        Ok(signal) => {
                            pending.insert(signal.kind, signal);
                            debounce_deadline = Some(Instant::now() + self.debounce);
                        }
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            tracing::warn!("RefreshWorker lagged {n} signals, refreshing everything");
                            let version = self.bus.current_version();
                            for kind in SignalKind::ALL {
                                pending.insert(kind, InvalidationSignal::new(kind, "lagged", version));
                            }
                            debounce_deadline = Some(Instant::now() + self.debounce);
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            tracing::info!("Signal bus closed, RefreshWorker stopping");
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("RefreshWorker stopped");
    }

    async fn flush(&self, pending: &mut HashMap<SignalKind, InvalidationSignal>) {
        // Projects first so employee project labels resolve against fresh data
        for kind in SignalKind::ALL {
            if let Some(signal) = pending.remove(&kind) {
                tracing::debug!(kind = %kind, version = signal.version, reason = %signal.reason, "Refreshing");
                self.targets.refresh(kind).await;
            }
        }
    }
}
