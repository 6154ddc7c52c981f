//! Lifecycle guard: administrator authorization and suspension.

use ecn_types::HolderAddress;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::RegistryError;

/// Operational state of a registry instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    /// All operations permitted.
    Active,
    /// Issuance and transfers are blocked; retirement and reads still work.
    Suspended,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Suspended => f.write_str("suspended"),
        }
    }
}

/// Holds the administrator identity and the `Active`/`Suspended` state.
///
/// The administrator is the only identity allowed to issue certificates and
/// to toggle suspension. It is fixed when the guard is created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LifecycleGuard {
    admin: HolderAddress,
    state: LifecycleState,
}

impl LifecycleGuard {
    pub fn new(admin: HolderAddress) -> Result<Self, RegistryError> {
        Self::with_state(admin, LifecycleState::Active)
    }

    pub(crate) fn with_state(
        admin: HolderAddress,
        state: LifecycleState,
    ) -> Result<Self, RegistryError> {
        if admin.is_zero() {
            return Err(RegistryError::InvalidAdministrator);
        }
        Ok(Self { admin, state })
    }

    pub fn admin(&self) -> &HolderAddress {
        &self.admin
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_suspended(&self) -> bool {
        self.state == LifecycleState::Suspended
    }

    pub fn ensure_admin(
        &self,
        caller: &HolderAddress,
        action: &'static str,
    ) -> Result<(), RegistryError> {
        if caller != &self.admin {
            return Err(RegistryError::NotAuthorized {
                caller: *caller,
                action,
            });
        }
        Ok(())
    }

    pub fn ensure_active(&self) -> Result<(), RegistryError> {
        if self.is_suspended() {
            return Err(RegistryError::SystemSuspended);
        }
        Ok(())
    }

    /// Issuance requires the administrator and an active registry.
    pub fn authorize_issue(&self, caller: &HolderAddress) -> Result<(), RegistryError> {
        self.ensure_admin(caller, "issue certificates")?;
        self.ensure_active()
    }

    /// `Active -> Suspended`.
    pub fn suspend(&mut self, caller: &HolderAddress) -> Result<(), RegistryError> {
        self.transition(caller, LifecycleState::Suspended, "suspend the registry")
    }

    /// `Suspended -> Active`.
    pub fn resume(&mut self, caller: &HolderAddress) -> Result<(), RegistryError> {
        self.transition(caller, LifecycleState::Active, "resume the registry")
    }

    fn transition(
        &mut self,
        caller: &HolderAddress,
        target: LifecycleState,
        action: &'static str,
    ) -> Result<(), RegistryError> {
        self.ensure_admin(caller, action)?;
        if self.state == target {
            return Err(RegistryError::AlreadyInState(target));
        }
        self.state = target;
        Ok(())
    }
}
