//! Bounded instance pool with capability-aware lifecycle sweeps.
//!
//! Checkout path: acquire permit → reuse idle instance of the same kind,
//! or build a fresh one → hand out a `Lease`. Dropping the lease returns
//! the instance and its permit.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::sync::{Semaphore, SemaphorePermit, TryAcquireError};
use tracing::{debug, info, warn};

use vitrine_types::{ComponentKind, InstanceId};

use crate::component::{ComponentFactory, Engine, InstanceHandle, PooledComponent, ScriptedModel};
use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::metrics::PoolMetrics;
use crate::snapshot::{InstanceInfo, PoolSnapshot, PoolStatus};

/// Lifecycle state of a pooled slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    /// Unused, eligible for reuse and reset sweeps.
    Idle,
    /// Handed out to a caller, eligible for stop sweeps.
    Leased,
}

/// One tracked instance. Slots are appended in creation order and
/// never removed, so a slot index stays valid for the pool's lifetime.
struct Entry {
    id: InstanceId,
    kind: ComponentKind,
    instance: InstanceHandle,
    engine: Option<Arc<dyn Engine>>,
    model: Option<Arc<dyn ScriptedModel>>,
    state: SlotState,
    lease_count: u64,
    created_at: Instant,
}

/// Registered factories plus every instance ever built.
struct Registry {
    entries: Vec<Entry>,
    factories: HashMap<ComponentKind, ComponentFactory>,
}

struct PoolShared {
    registry: Mutex<Registry>,
    permits: Semaphore,
    config: PoolConfig,
    metrics: Arc<PoolMetrics>,
    next_id: AtomicU64,
}

/// Bounded pool of reusable component instances.
///
/// Capacity bounds the number of *leased* instances, not the number of
/// tracked ones: idle instances stay tracked for reuse and sweeps.
/// Cloning is cheap and shares the same pool.
#[derive(Clone)]
pub struct InstancePool {
    shared: Arc<PoolShared>,
}

/// Outcome of a [`InstancePool::reset`] sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetSummary {
    /// Idle engines stopped and reset.
    pub engines_reset: usize,
    /// Idle engines left untouched because they were still showing.
    pub skipped_showing: usize,
    /// Scripted models, leased or idle, whose scripts were halted.
    pub scripts_halted: usize,
    /// Engines whose reset returned an error.
    pub failures: usize,
}

/// Outcome of a [`InstancePool::stop_all_running`] sweep over leased instances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StopSummary {
    /// Engines stopped.
    pub engines_stopped: usize,
    /// Scripted models whose scripts were halted.
    pub scripts_halted: usize,
}

impl InstancePool {
    /// Creates a pool with the given configuration.
    ///
    /// # Errors
    /// Returns `PoolError::Config` if the capacity is zero.
    pub fn new(config: &PoolConfig) -> Result<Self, PoolError> {
        if config.capacity == 0 {
            return Err(PoolError::Config(
                "pool capacity must be at least 1".to_string(),
            ));
        }
        info!(capacity = config.capacity, "instance pool created");
        Ok(Self {
            shared: Arc::new(PoolShared {
                registry: Mutex::new(Registry {
                    entries: Vec::new(),
                    factories: HashMap::new(),
                }),
                permits: Semaphore::new(config.capacity),
                config: config.clone(),
                metrics: PoolMetrics::new_shared(),
                next_id: AtomicU64::new(1),
            }),
        })
    }

    /// Registers a factory for a component kind.
    ///
    /// The factory runs on the checkout path whenever no idle instance
    /// of the kind is available. It must not call back into the pool.
    ///
    /// # Errors
    /// Returns `PoolError::AlreadyRegistered` if the kind already has
    /// a factory.
    pub fn register(
        &self,
        kind: ComponentKind,
        factory: ComponentFactory,
    ) -> Result<(), PoolError> {
        let mut registry = self.lock_registry();
        if registry.factories.contains_key(&kind) {
            return Err(PoolError::AlreadyRegistered { kind });
        }
        debug!(kind = %kind, "component kind registered");
        registry.factories.insert(kind, factory);
        Ok(())
    }

    /// Checks out an instance of the given kind, waiting for capacity
    /// according to the pool's configured default. Waiters are served
    /// in arrival order.
    ///
    /// An idle instance of the exact kind is reused when one exists
    /// (oldest first); otherwise the registered factory builds a fresh
    /// one. The returned [`Lease`] holds the capacity permit until it
    /// is dropped.
    ///
    /// # Errors
    /// Returns `PoolError::UnknownKind` if no factory is registered,
    /// `PoolError::CheckoutTimeout` if the configured wait bound
    /// elapses, `PoolError::Closed` if the pool has been closed, and
    /// `PoolError::Build` if the factory fails twice.
    #[tracing::instrument(skip(self), fields(kind = %kind))]
    pub async fn checkout(&self, kind: &ComponentKind) -> Result<Lease, PoolError> {
        self.checkout_with_deadline(kind, self.shared.config.checkout_timeout)
            .await
    }

    /// Like [`checkout`](Self::checkout), but with an explicit wait bound
    /// that overrides the configured default.
    #[tracing::instrument(skip(self), fields(kind = %kind))]
    pub async fn checkout_timeout(
        &self,
        kind: &ComponentKind,
        wait: Duration,
    ) -> Result<Lease, PoolError> {
        self.checkout_with_deadline(kind, Some(wait)).await
    }

    /// Non-blocking checkout. Fails immediately when the pool is at
    /// capacity instead of waiting.
    ///
    /// # Errors
    /// Returns `PoolError::Exhausted` when no permit is free, plus the
    /// same errors as [`checkout`](Self::checkout).
    pub fn try_checkout(&self, kind: &ComponentKind) -> Result<Lease, PoolError> {
        self.ensure_registered(kind)?;
        self.shared.metrics.record_checkout();
        let permit = match self.shared.permits.try_acquire() {
            Ok(permit) => permit,
            Err(TryAcquireError::Closed) => return Err(PoolError::Closed),
            Err(TryAcquireError::NoPermits) => {
                self.shared.metrics.record_rejection();
                return Err(PoolError::Exhausted {
                    capacity: self.shared.config.capacity,
                });
            }
        };
        self.finish_checkout(kind, permit)
    }

    async fn checkout_with_deadline(
        &self,
        kind: &ComponentKind,
        wait: Option<Duration>,
    ) -> Result<Lease, PoolError> {
        self.ensure_registered(kind)?;
        self.shared.metrics.record_checkout();

        if self.shared.permits.available_permits() == 0 {
            debug!(kind = %kind, "pool at capacity, waiting for a free slot");
        }

        let started = Instant::now();
        let permit = match wait {
            None => self
                .shared
                .permits
                .acquire()
                .await
                .map_err(|_| PoolError::Closed)?,
            Some(bound) => match tokio::time::timeout(bound, self.shared.permits.acquire()).await {
                Ok(acquired) => acquired.map_err(|_| PoolError::Closed)?,
                Err(_elapsed) => {
                    self.shared.metrics.record_timeout();
                    return Err(PoolError::CheckoutTimeout {
                        kind: kind.clone(),
                        waited_ms: started.elapsed().as_millis() as u64,
                    });
                }
            },
        };
        self.finish_checkout(kind, permit)
    }

    /// Completes a checkout once a permit is held: reuse an idle slot
    /// or build a fresh instance. The permit is forgotten only on
    /// success; every error path drops it, restoring capacity.
    fn finish_checkout(
        &self,
        kind: &ComponentKind,
        permit: SemaphorePermit<'_>,
    ) -> Result<Lease, PoolError> {
        let factory = {
            let mut registry = self.lock_registry();
            if let Some(slot) = registry
                .entries
                .iter()
                .position(|e| e.state == SlotState::Idle && e.kind == *kind)
            {
                let entry = &mut registry.entries[slot];
                entry.state = SlotState::Leased;
                entry.lease_count += 1;
                let lease = Lease {
                    shared: Arc::clone(&self.shared),
                    slot,
                    id: entry.id,
                    kind: entry.kind.clone(),
                    instance: Arc::clone(&entry.instance),
                    reused: true,
                };
                self.shared.metrics.record_reuse();
                debug!(id = %entry.id, kind = %kind, "reusing idle instance");
                permit.forget();
                return Ok(lease);
            }
            let factory = registry
                .factories
                .get(kind)
                .ok_or_else(|| PoolError::UnknownKind { kind: kind.clone() })?;
            Arc::clone(factory)
        };

        // Factory runs outside the registry lock; an error here drops
        // the permit and frees the slot for other callers.
        let component = self.build_with_retry(kind, &factory)?;
        let (instance, engine, model) = component.into_parts();
        let id = InstanceId::new(self.shared.next_id.fetch_add(1, Ordering::Relaxed));

        let mut registry = self.lock_registry();
        let slot = registry.entries.len();
        registry.entries.push(Entry {
            id,
            kind: kind.clone(),
            instance: Arc::clone(&instance),
            engine,
            model,
            state: SlotState::Leased,
            lease_count: 1,
            created_at: Instant::now(),
        });
        self.shared.metrics.record_build();
        debug!(id = %id, kind = %kind, slot, "built fresh instance");
        permit.forget();
        Ok(Lease {
            shared: Arc::clone(&self.shared),
            slot,
            id,
            kind: kind.clone(),
            instance,
            reused: false,
        })
    }

    /// Runs the factory, retrying once on failure.
    fn build_with_retry(
        &self,
        kind: &ComponentKind,
        factory: &ComponentFactory,
    ) -> Result<PooledComponent, PoolError> {
        match factory() {
            Ok(component) => Ok(component),
            Err(first) => {
                self.shared.metrics.record_build_retry();
                warn!(kind = %kind, error = %first, "instance build failed, retrying");
                factory().map_err(|second| {
                    self.shared.metrics.record_build_failure();
                    warn!(kind = %kind, error = %second, "instance build failed twice");
                    PoolError::Build {
                        kind: kind.clone(),
                        attempts: 2,
                        reason: second.to_string(),
                    }
                })
            }
        }
    }

    fn ensure_registered(&self, kind: &ComponentKind) -> Result<(), PoolError> {
        let registry = self.lock_registry();
        if registry.factories.contains_key(kind) {
            Ok(())
        } else {
            Err(PoolError::UnknownKind { kind: kind.clone() })
        }
    }

    fn lock_registry(&self) -> MutexGuard<'_, Registry> {
        self.shared
            .registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    /// Sweeps the pool back to a clean state after a document closes.
    ///
    /// Idle engines that are not showing are stopped and reset; idle
    /// engines still showing are left entirely untouched. Leased
    /// engines are never stopped or reset, but scripts are halted on
    /// every tracked scripted model, leased or idle. A reset failure
    /// on one engine is logged and does not stop the sweep.
    pub fn reset(&self) -> ResetSummary {
        let mut summary = ResetSummary::default();
        let registry = self.lock_registry();
        for entry in registry.entries.iter() {
            if entry.state == SlotState::Idle {
                if let Some(engine) = &entry.engine {
                    if engine.is_showing() {
                        summary.skipped_showing += 1;
                        debug!(id = %entry.id, kind = %entry.kind, "engine still showing, skipped");
                    } else {
                        engine.stop_immediately();
                        match engine.reset() {
                            Ok(()) => summary.engines_reset += 1,
                            Err(error) => {
                                summary.failures += 1;
                                warn!(id = %entry.id, kind = %entry.kind, %error, "engine reset failed");
                            }
                        }
                    }
                }
            }
            if let Some(model) = &entry.model {
                model.halt_script();
                summary.scripts_halted += 1;
            }
        }
        info!(
            engines_reset = summary.engines_reset,
            skipped_showing = summary.skipped_showing,
            scripts_halted = summary.scripts_halted,
            failures = summary.failures,
            "reset sweep complete"
        );
        summary
    }

    /// Stops every leased engine and halts every leased scripted model.
    ///
    /// Idle instances are left untouched. Leases stay valid; holders
    /// simply observe their instance stopped.
    pub fn stop_all_running(&self) -> StopSummary {
        let mut summary = StopSummary::default();
        let registry = self.lock_registry();
        for entry in registry
            .entries
            .iter()
            .filter(|e| e.state == SlotState::Leased)
        {
            if let Some(engine) = &entry.engine {
                engine.stop_immediately();
                summary.engines_stopped += 1;
            }
            if let Some(model) = &entry.model {
                model.halt_script();
                summary.scripts_halted += 1;
            }
        }
        info!(
            engines_stopped = summary.engines_stopped,
            scripts_halted = summary.scripts_halted,
            "running instance sweep complete"
        );
        summary
    }

    /// Closes the pool. Pending and future checkouts fail with
    /// `PoolError::Closed`; existing leases stay valid until dropped.
    pub fn close(&self) {
        self.shared.permits.close();
        info!("instance pool closed");
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.shared.permits.is_closed()
    }

    /// Gracefully shuts the pool down: stops all running instances,
    /// waits for every lease to be returned, then closes the pool.
    pub async fn shutdown(&self) {
        self.stop_all_running();
        let capacity = self.shared.config.capacity as u32;
        // acquire_many fails only when the pool is already closed.
        if let Ok(drained) = self.shared.permits.acquire_many(capacity).await {
            self.close();
            drop(drained);
        }
        info!("instance pool shutdown complete");
    }

    /// Current counts of tracked, leased, and idle instances.
    pub fn status(&self) -> PoolStatus {
        let registry = self.lock_registry();
        let leased = registry
            .entries
            .iter()
            .filter(|e| e.state == SlotState::Leased)
            .count();
        PoolStatus {
            capacity: self.shared.config.capacity,
            tracked: registry.entries.len(),
            leased,
            idle: registry.entries.len() - leased,
            available_permits: self.shared.permits.available_permits(),
        }
    }

    /// Number of instances ever built and still tracked.
    pub fn tracked(&self) -> usize {
        self.lock_registry().entries.len()
    }

    /// Point-in-time diagnostic view of every tracked instance.
    pub fn snapshot(&self) -> PoolSnapshot {
        let registry = self.lock_registry();
        let instances = registry
            .entries
            .iter()
            .map(|entry| InstanceInfo {
                id: entry.id,
                kind: entry.kind.clone(),
                leased: entry.state == SlotState::Leased,
                engine: entry.engine.is_some(),
                scripted: entry.model.is_some(),
                showing: entry.engine.as_ref().map(|e| e.is_showing()),
                lease_count: entry.lease_count,
                age: entry.created_at.elapsed(),
            })
            .collect();
        let leased = registry
            .entries
            .iter()
            .filter(|e| e.state == SlotState::Leased)
            .count();
        PoolSnapshot {
            status: PoolStatus {
                capacity: self.shared.config.capacity,
                tracked: registry.entries.len(),
                leased,
                idle: registry.entries.len() - leased,
                available_permits: self.shared.permits.available_permits(),
            },
            instances,
        }
    }

    /// Returns a shared handle to the pool's live counters.
    pub fn metrics(&self) -> Arc<PoolMetrics> {
        Arc::clone(&self.shared.metrics)
    }

    /// Maximum number of simultaneously leased instances.
    pub fn capacity(&self) -> usize {
        self.shared.config.capacity
    }

    /// Number of free capacity permits.
    pub fn available_permits(&self) -> usize {
        self.shared.permits.available_permits()
    }
}

impl std::fmt::Debug for InstancePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = self.status();
        f.debug_struct("InstancePool")
            .field("capacity", &status.capacity)
            .field("tracked", &status.tracked)
            .field("leased", &status.leased)
            .finish()
    }
}

/// Exclusive handle to a checked-out instance.
///
/// Holds one capacity permit. Dropping the lease marks the instance
/// idle and releases the permit, waking one waiting checkout.
#[must_use = "dropping a lease immediately returns the instance to the pool"]
pub struct Lease {
    shared: Arc<PoolShared>,
    slot: usize,
    id: InstanceId,
    kind: ComponentKind,
    instance: InstanceHandle,
    reused: bool,
}

impl Lease {
    /// Stable identity of the leased instance.
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Kind the instance was registered under.
    pub fn kind(&self) -> &ComponentKind {
        &self.kind
    }

    /// Type-erased handle to the instance.
    pub fn instance(&self) -> &InstanceHandle {
        &self.instance
    }

    /// Downcasts the instance to its concrete type.
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.instance).downcast::<T>().ok()
    }

    /// `true` if this lease reused an idle instance rather than
    /// building a fresh one.
    pub fn was_reused(&self) -> bool {
        self.reused
    }
}

impl std::fmt::Debug for Lease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lease")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("reused", &self.reused)
            .finish()
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        {
            let mut registry = self
                .shared
                .registry
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            registry.entries[self.slot].state = SlotState::Idle;
        }
        self.shared.permits.add_permits(1);
        self.shared.metrics.record_release();
        debug!(id = %self.id, kind = %self.kind, "lease returned");
    }
}
