//! The certificate registry core.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use ecn_accounting::{compute_offset, recompute_total, OffsetLedger};
use ecn_types::{CertificateId, Clock, HolderAddress, Timestamp};

use crate::certificate::{Certificate, IssueRequest};
use crate::error::RegistryError;
use crate::event::{CertificateEvent, EventBus};
use crate::guard::{LifecycleGuard, LifecycleState};

pub const DEFAULT_COLLECTION_NAME: &str = "EnergyCertificateNFT";
pub const DEFAULT_COLLECTION_SYMBOL: &str = "ECN";

/// Single-writer store of certificates, ownership and active offsets.
///
/// Invariants maintained by every operation:
/// - ids are dense from 1; a failed issuance consumes no id
/// - each certificate appears in exactly one holder's `owned` set
/// - `offsets.total(h)` equals the sum of `carbon_offset` over the
///   non-retired certificates `h` currently holds
pub struct CertificateRegistry {
    pub(crate) name: String,
    pub(crate) symbol: String,
    pub(crate) guard: LifecycleGuard,
    pub(crate) certificates: BTreeMap<CertificateId, Certificate>,
    pub(crate) owned: HashMap<HolderAddress, BTreeSet<CertificateId>>,
    pub(crate) token_approvals: HashMap<CertificateId, HolderAddress>,
    pub(crate) operators: HashMap<HolderAddress, BTreeSet<HolderAddress>>,
    pub(crate) offsets: OffsetLedger,
    pub(crate) next_id: CertificateId,
    pub(crate) events: EventBus,
    /// Events awaiting pickup by a [`crate::SharedRegistry`]; `None` when
    /// the registry is used directly.
    pub(crate) outbox: Option<Vec<CertificateEvent>>,
    pub(crate) failed_deliveries: u64,
    pub(crate) clock: Arc<dyn Clock>,
}

impl CertificateRegistry {
    /// Create an empty registry administered by `admin`.
    pub fn new(admin: HolderAddress, clock: Arc<dyn Clock>) -> Result<Self, RegistryError> {
        Ok(Self {
            name: DEFAULT_COLLECTION_NAME.to_string(),
            symbol: DEFAULT_COLLECTION_SYMBOL.to_string(),
            guard: LifecycleGuard::new(admin)?,
            certificates: BTreeMap::new(),
            owned: HashMap::new(),
            token_approvals: HashMap::new(),
            operators: HashMap::new(),
            offsets: OffsetLedger::new(),
            next_id: CertificateId::FIRST,
            events: EventBus::new(),
            outbox: None,
            failed_deliveries: 0,
            clock,
        })
    }

    /// Override the collection name and symbol.
    pub fn with_collection(mut self, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        self.name = name.into();
        self.symbol = symbol.into();
        self
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&CertificateEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    // ── Mutations ──────────────────────────────────────────────────────

    /// Issue a new certificate to `request.recipient`.
    ///
    /// The offset is computed here, once, and credited to the recipient's
    /// active total.
    pub fn issue(
        &mut self,
        caller: &HolderAddress,
        request: IssueRequest,
    ) -> Result<CertificateId, RegistryError> {
        self.issue_with_event(caller, request).map(|(id, _)| id)
    }

    /// [`Self::issue`], also returning the event that was emitted.
    pub fn issue_with_event(
        &mut self,
        caller: &HolderAddress,
        request: IssueRequest,
    ) -> Result<(CertificateId, CertificateEvent), RegistryError> {
        self.guard.authorize_issue(caller)?;
        if request.recipient.is_zero() {
            return Err(RegistryError::InvalidRecipient);
        }
        if request.energy_amount_kwh == 0 {
            return Err(RegistryError::InvalidEnergyAmount);
        }
        let id = self.next_id;
        let following = id.checked_next().ok_or(RegistryError::IdSpaceExhausted)?;
        let carbon_offset = compute_offset(request.energy_amount_kwh, &request.category);
        self.offsets.credit(&request.recipient, carbon_offset)?;

        let certificate = Certificate {
            id,
            energy_amount_kwh: request.energy_amount_kwh,
            category: request.category,
            issued_at: self.clock.now(),
            supplier: request.supplier,
            buyer: request.buyer,
            holder: request.recipient,
            location: request.location,
            descriptor_uri: request.descriptor_uri,
            carbon_offset,
            retired: false,
            retired_at: None,
        };
        let event = CertificateEvent::issued(&certificate);
        self.owned.entry(request.recipient).or_default().insert(id);
        self.certificates.insert(id, certificate);
        self.next_id = following;

        self.emit(event.clone());
        Ok((id, event))
    }

    /// Move certificate `id` from `from` to `to`.
    ///
    /// `caller` must be the owner, the certificate's approved delegate, or an
    /// operator of the owner. A retired certificate moves without touching
    /// any active total.
    pub fn transfer(
        &mut self,
        caller: &HolderAddress,
        id: CertificateId,
        from: &HolderAddress,
        to: &HolderAddress,
    ) -> Result<(), RegistryError> {
        self.guard.ensure_active()?;
        if to.is_zero() {
            return Err(RegistryError::InvalidRecipient);
        }
        let certificate = self.certificate(id)?;
        let owner = certificate.holder;
        let retired = certificate.retired;
        let carbon_offset = certificate.carbon_offset;
        if !self.is_authorized(caller, &owner, id) {
            return Err(RegistryError::NotAuthorized {
                caller: *caller,
                action: "transfer this certificate",
            });
        }
        if &owner != from {
            return Err(RegistryError::IncorrectOwner {
                id,
                claimed: *from,
                owner,
            });
        }
        if !retired {
            self.offsets.move_between(&owner, to, carbon_offset)?;
        }

        self.token_approvals.remove(&id);
        self.unlink_owner(&owner, id);
        self.owned.entry(*to).or_default().insert(id);
        if let Some(certificate) = self.certificates.get_mut(&id) {
            certificate.holder = *to;
        }

        self.emit(CertificateEvent::Transferred {
            id,
            from: owner,
            to: *to,
        });
        Ok(())
    }

    /// Set or clear the single delegate allowed to transfer `id`.
    ///
    /// The owner cannot be its own delegate.
    pub fn approve(
        &mut self,
        caller: &HolderAddress,
        id: CertificateId,
        delegate: Option<HolderAddress>,
    ) -> Result<(), RegistryError> {
        let owner = self.certificate(id)?.holder;
        if delegate == Some(owner) {
            return Err(RegistryError::ApprovalToOwner(id));
        }
        if caller != &owner && !self.is_approved_for_all(&owner, caller) {
            return Err(RegistryError::NotAuthorized {
                caller: *caller,
                action: "approve a delegate for this certificate",
            });
        }
        match delegate {
            Some(d) if !d.is_zero() => {
                self.token_approvals.insert(id, d);
            }
            _ => {
                self.token_approvals.remove(&id);
            }
        }
        self.emit(CertificateEvent::Approval {
            id,
            owner,
            approved: delegate.filter(|d| !d.is_zero()),
        });
        Ok(())
    }

    /// Grant or revoke `operator`'s right to transfer all of `caller`'s certificates.
    pub fn set_approval_for_all(
        &mut self,
        caller: &HolderAddress,
        operator: &HolderAddress,
        approved: bool,
    ) -> Result<(), RegistryError> {
        if operator.is_zero() {
            return Err(RegistryError::InvalidOperator);
        }
        if operator == caller {
            return Err(RegistryError::ApprovalToCaller);
        }
        if approved {
            self.operators.entry(*caller).or_default().insert(*operator);
        } else if let Some(set) = self.operators.get_mut(caller) {
            set.remove(operator);
            if set.is_empty() {
                self.operators.remove(caller);
            }
        }
        self.emit(CertificateEvent::ApprovalForAll {
            owner: *caller,
            operator: *operator,
            approved,
        });
        Ok(())
    }

    /// Retire certificate `id`. Only its current holder may do so, once.
    ///
    /// Permitted while the registry is suspended.
    pub fn retire(&mut self, caller: &HolderAddress, id: CertificateId) -> Result<(), RegistryError> {
        let certificate = self.certificate(id)?;
        if &certificate.holder != caller {
            return Err(RegistryError::NotAuthorized {
                caller: *caller,
                action: "retire this certificate",
            });
        }
        if certificate.retired {
            return Err(RegistryError::AlreadyRetired(id));
        }
        let holder = certificate.holder;
        let carbon_offset = certificate.carbon_offset;
        self.offsets.debit(&holder, carbon_offset)?;

        let now = self.clock.now();
        if let Some(certificate) = self.certificates.get_mut(&id) {
            certificate.retired = true;
            certificate.retired_at = Some(now);
        }

        self.emit(CertificateEvent::Retired { id, holder });
        Ok(())
    }

    pub fn suspend(&mut self, caller: &HolderAddress) -> Result<(), RegistryError> {
        self.guard.suspend(caller)?;
        self.emit(CertificateEvent::Suspended { by: *caller });
        Ok(())
    }

    pub fn resume(&mut self, caller: &HolderAddress) -> Result<(), RegistryError> {
        self.guard.resume(caller)?;
        self.emit(CertificateEvent::Resumed { by: *caller });
        Ok(())
    }

    // ── Queries ────────────────────────────────────────────────────────

    pub fn get_certificate(&self, id: CertificateId) -> Result<&Certificate, RegistryError> {
        self.certificate(id)
    }

    pub fn owner_of(&self, id: CertificateId) -> Result<HolderAddress, RegistryError> {
        self.certificate(id).map(|c| c.holder)
    }

    pub fn descriptor_uri(&self, id: CertificateId) -> Result<&str, RegistryError> {
        self.certificate(id).map(|c| c.descriptor_uri.as_str())
    }

    /// The delegate approved for `id`, if any.
    pub fn approved(&self, id: CertificateId) -> Result<Option<HolderAddress>, RegistryError> {
        self.certificate(id)?;
        Ok(self.token_approvals.get(&id).copied())
    }

    pub fn is_approved_for_all(&self, owner: &HolderAddress, operator: &HolderAddress) -> bool {
        self.operators
            .get(owner)
            .is_some_and(|set| set.contains(operator))
    }

    /// Number of certificates `holder` owns, retired ones included.
    pub fn balance_of(&self, holder: &HolderAddress) -> usize {
        self.owned.get(holder).map_or(0, BTreeSet::len)
    }

    /// Ids owned by `holder`, ascending.
    pub fn certificates_of(&self, holder: &HolderAddress) -> Vec<CertificateId> {
        self.owned
            .get(holder)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// All certificates in id order.
    pub fn certificates(&self) -> impl Iterator<Item = &Certificate> {
        self.certificates.values()
    }

    /// Sum of offsets of `holder`'s non-retired certificates (cached).
    pub fn active_offset_total(&self, holder: &HolderAddress) -> u64 {
        self.offsets.total(holder)
    }

    /// Same as [`Self::active_offset_total`] but computed by a full scan.
    pub fn recompute_active_offset_total(&self, holder: &HolderAddress) -> u64 {
        recompute_total(holder, self.certificates.values())
    }

    /// Check the cached total of every holder against a full recomputation.
    pub fn verify_accounting(&self) -> Result<(), RegistryError> {
        let mut recomputed: HashMap<HolderAddress, u64> = HashMap::new();
        for c in self.certificates.values().filter(|c| !c.retired) {
            let entry = recomputed.entry(c.holder).or_default();
            *entry = entry.saturating_add(c.carbon_offset);
        }
        let holders = recomputed
            .keys()
            .chain(self.offsets.holders())
            .copied()
            .collect::<BTreeSet<_>>();
        for holder in holders {
            let cached = self.offsets.total(&holder);
            let expected = recomputed.get(&holder).copied().unwrap_or(0);
            if cached != expected {
                return Err(RegistryError::AccountingMismatch {
                    holder,
                    cached,
                    recomputed: expected,
                });
            }
        }
        Ok(())
    }

    /// Number of certificates issued so far.
    pub fn total_issued(&self) -> u64 {
        self.next_id.as_u64() - 1
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn admin(&self) -> &HolderAddress {
        self.guard.admin()
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.guard.state()
    }

    pub fn is_suspended(&self) -> bool {
        self.guard.is_suspended()
    }

    /// Listener invocations that panicked since this registry was created.
    pub fn failed_deliveries(&self) -> u64 {
        self.failed_deliveries
    }

    /// Current time on the registry's clock.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // ── Internals ──────────────────────────────────────────────────────

    fn emit(&mut self, event: CertificateEvent) {
        let failed = self.events.emit(&event);
        self.failed_deliveries += failed as u64;
        if let Some(outbox) = &mut self.outbox {
            outbox.push(event);
        }
    }

    /// Hand over queued events and start queueing if not already.
    pub(crate) fn take_events(&mut self) -> Vec<CertificateEvent> {
        self.outbox.replace(Vec::new()).unwrap_or_default()
    }

    fn certificate(&self, id: CertificateId) -> Result<&Certificate, RegistryError> {
        self.certificates.get(&id).ok_or(RegistryError::NotFound(id))
    }

    fn is_authorized(&self, caller: &HolderAddress, owner: &HolderAddress, id: CertificateId) -> bool {
        caller == owner
            || self.token_approvals.get(&id) == Some(caller)
            || self.is_approved_for_all(owner, caller)
    }

    fn unlink_owner(&mut self, owner: &HolderAddress, id: CertificateId) {
        if let Some(set) = self.owned.get_mut(owner) {
            set.remove(&id);
            if set.is_empty() {
                self.owned.remove(owner);
            }
        }
    }
}
