//! Thread-safe handle around a [`CertificateRegistry`].
//!
//! Every call takes the one lock for its whole duration, so operations are
//! serialised and no caller can observe a half-applied change. Events are
//! queued while the lock is held and delivered to listeners only after it
//! is released, so a listener may call back into the handle. This is also
//! where registry activity is logged; the core itself stays silent.

use std::collections::VecDeque;
use std::sync::{Arc, LockResult, Mutex, MutexGuard, PoisonError, TryLockError};

use ecn_types::{CertificateId, HolderAddress, Timestamp};

use crate::certificate::{Certificate, IssueRequest};
use crate::error::RegistryError;
use crate::event::{CertificateEvent, EventBus};
use crate::registry::CertificateRegistry;
use crate::snapshot::RegistrySnapshot;

fn recover<T>(result: LockResult<MutexGuard<'_, T>>) -> MutexGuard<'_, T> {
    result.unwrap_or_else(PoisonError::into_inner)
}

#[derive(Clone)]
pub struct SharedRegistry {
    inner: Arc<Mutex<CertificateRegistry>>,
    listeners: Arc<Mutex<EventBus>>,
    /// Events in the order their operations were applied, not yet delivered.
    pending: Arc<Mutex<VecDeque<CertificateEvent>>>,
    /// Held by whichever thread is currently draining `pending`.
    delivering: Arc<Mutex<()>>,
}

impl SharedRegistry {
    /// Wrap `registry`. Listeners already subscribed to it are taken over
    /// and, like later subscribers, run outside the lock.
    pub fn new(mut registry: CertificateRegistry) -> Self {
        let mut listeners = EventBus::new();
        listeners.append(&mut registry.events);
        registry.outbox = Some(Vec::new());
        Self {
            inner: Arc::new(Mutex::new(registry)),
            listeners: Arc::new(Mutex::new(listeners)),
            pending: Arc::new(Mutex::new(VecDeque::new())),
            delivering: Arc::new(Mutex::new(())),
        }
    }

    /// Exclusive access to the registry.
    ///
    /// Preconditions are checked before any mutation and listeners never
    /// run under this lock, so a poisoned lock is recovered rather than
    /// propagated.
    fn lock(&self) -> MutexGuard<'_, CertificateRegistry> {
        recover(self.inner.lock())
    }

    /// Run a mutation, queue its events under the same lock, then deliver.
    fn apply<T>(
        &self,
        op: impl FnOnce(&mut CertificateRegistry) -> Result<T, RegistryError>,
    ) -> Result<T, RegistryError> {
        let result = {
            let mut registry = self.lock();
            let result = op(&mut *registry);
            let events = registry.take_events();
            if !events.is_empty() {
                recover(self.pending.lock()).extend(events);
            }
            result
        };
        self.deliver();
        result
    }

    fn pop_pending(&self) -> Option<CertificateEvent> {
        recover(self.pending.lock()).pop_front()
    }

    /// Drain queued events to the listeners.
    ///
    /// Only one thread drains at a time, which keeps delivery in
    /// application order. A call made while another thread (or an outer
    /// frame on this one, from inside a listener) is draining leaves its
    /// events to that drainer and returns without waiting.
    fn deliver(&self) {
        loop {
            let turn = match self.delivering.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => return,
            };
            while let Some(event) = self.pop_pending() {
                let bus = recover(self.listeners.lock()).clone();
                let failed = bus.emit(&event);
                if failed > 0 {
                    tracing::warn!(failed, ?event, "event listener panicked");
                }
            }
            drop(turn);
            // An event queued between the last pop and the release above
            // would otherwise wait for the next call.
            if recover(self.pending.lock()).is_empty() {
                return;
            }
        }
    }

    /// Read-only access for queries not covered by a dedicated method.
    pub fn read<T>(&self, f: impl FnOnce(&CertificateRegistry) -> T) -> T {
        f(&self.lock())
    }

    /// Register a listener. It is called after the operation that produced
    /// the event has released the registry, and may use this handle.
    pub fn subscribe(&self, listener: Box<dyn Fn(&CertificateEvent) + Send + Sync>) {
        recover(self.listeners.lock()).subscribe(listener);
    }

    pub fn issue(
        &self,
        caller: &HolderAddress,
        request: IssueRequest,
    ) -> Result<CertificateId, RegistryError> {
        self.issue_certificate(caller, request).map(|(c, _)| c.id)
    }

    /// Issue and return the stored record with the event that was emitted,
    /// both read under the same lock so no other operation can interleave.
    pub fn issue_certificate(
        &self,
        caller: &HolderAddress,
        request: IssueRequest,
    ) -> Result<(Certificate, CertificateEvent), RegistryError> {
        let recipient = request.recipient;
        let result = self.apply(|registry| {
            let (id, event) = registry.issue_with_event(caller, request)?;
            let certificate = registry.get_certificate(id)?.clone();
            Ok((certificate, event))
        });
        match &result {
            Ok((c, _)) => tracing::info!(
                id = %c.id,
                %recipient,
                category = %c.category,
                carbon_offset = c.carbon_offset,
                "certificate issued"
            ),
            Err(e) => tracing::debug!(%caller, %recipient, error = %e, "issue rejected"),
        }
        result
    }

    pub fn transfer(
        &self,
        caller: &HolderAddress,
        id: CertificateId,
        from: &HolderAddress,
        to: &HolderAddress,
    ) -> Result<(), RegistryError> {
        let result = self.apply(|r| r.transfer(caller, id, from, to));
        match &result {
            Ok(()) => tracing::info!(%id, %from, %to, "certificate transferred"),
            Err(e) => tracing::debug!(%id, %caller, error = %e, "transfer rejected"),
        }
        result
    }

    pub fn approve(
        &self,
        caller: &HolderAddress,
        id: CertificateId,
        delegate: Option<HolderAddress>,
    ) -> Result<(), RegistryError> {
        let result = self.apply(|r| r.approve(caller, id, delegate));
        match &result {
            Ok(()) => tracing::debug!(%id, ?delegate, "delegate updated"),
            Err(e) => tracing::debug!(%id, %caller, error = %e, "approve rejected"),
        }
        result
    }

    pub fn set_approval_for_all(
        &self,
        caller: &HolderAddress,
        operator: &HolderAddress,
        approved: bool,
    ) -> Result<(), RegistryError> {
        let result = self.apply(|r| r.set_approval_for_all(caller, operator, approved));
        if let Err(e) = &result {
            tracing::debug!(%caller, %operator, error = %e, "operator approval rejected");
        }
        result
    }

    pub fn retire(&self, caller: &HolderAddress, id: CertificateId) -> Result<(), RegistryError> {
        let result = self.apply(|r| r.retire(caller, id));
        match &result {
            Ok(()) => tracing::info!(%id, holder = %caller, "certificate retired"),
            Err(e) => tracing::debug!(%id, %caller, error = %e, "retire rejected"),
        }
        result
    }

    pub fn suspend(&self, caller: &HolderAddress) -> Result<(), RegistryError> {
        let result = self.apply(|r| r.suspend(caller));
        match &result {
            Ok(()) => tracing::warn!(by = %caller, "registry suspended"),
            Err(e) => tracing::debug!(%caller, error = %e, "suspend rejected"),
        }
        result
    }

    pub fn resume(&self, caller: &HolderAddress) -> Result<(), RegistryError> {
        let result = self.apply(|r| r.resume(caller));
        match &result {
            Ok(()) => tracing::info!(by = %caller, "registry resumed"),
            Err(e) => tracing::debug!(%caller, error = %e, "resume rejected"),
        }
        result
    }

    pub fn get_certificate(&self, id: CertificateId) -> Result<Certificate, RegistryError> {
        self.lock().get_certificate(id).cloned()
    }

    pub fn active_offset_total(&self, holder: &HolderAddress) -> u64 {
        self.lock().active_offset_total(holder)
    }

    pub fn now(&self) -> Timestamp {
        self.lock().now()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        self.lock().snapshot()
    }
}
