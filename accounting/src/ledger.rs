//! Per-holder active offset totals.

use std::collections::HashMap;

use ecn_types::HolderAddress;
use serde::{Deserialize, Serialize};

use crate::error::AccountingError;

/// Anything that carries an offset attributable to a holder.
pub trait OffsetRecord {
    fn holder(&self) -> &HolderAddress;
    fn carbon_offset(&self) -> u64;
    fn is_retired(&self) -> bool;
}

/// Running sum of active (non-retired) offsets per holder.
///
/// Every mutation is all-or-nothing: a call that returns an error has not
/// touched any total. Holders whose total drops to zero are removed, so
/// [`OffsetLedger::holders`] lists only holders with a positive total.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetLedger {
    totals: HashMap<HolderAddress, u64>,
}

impl OffsetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active total for `holder`; zero for unknown holders.
    pub fn total(&self, holder: &HolderAddress) -> u64 {
        self.totals.get(holder).copied().unwrap_or(0)
    }

    /// Holders with a positive active total.
    pub fn holders(&self) -> impl Iterator<Item = &HolderAddress> {
        self.totals.keys()
    }

    /// Sum of all active totals.
    pub fn grand_total(&self) -> u128 {
        self.totals.values().map(|&v| u128::from(v)).sum()
    }

    /// Add `amount` to `holder`'s active total.
    pub fn credit(&mut self, holder: &HolderAddress, amount: u64) -> Result<(), AccountingError> {
        let updated = self.credited(holder, amount)?;
        self.set(holder, updated);
        Ok(())
    }

    /// Remove `amount` from `holder`'s active total.
    pub fn debit(&mut self, holder: &HolderAddress, amount: u64) -> Result<(), AccountingError> {
        let updated = self.debited(holder, amount)?;
        self.set(holder, updated);
        Ok(())
    }

    /// Move `amount` from one holder's total to another's.
    pub fn move_between(
        &mut self,
        from: &HolderAddress,
        to: &HolderAddress,
        amount: u64,
    ) -> Result<(), AccountingError> {
        if from == to || amount == 0 {
            // Still validate that `from` could cover the amount.
            self.debited(from, amount)?;
            return Ok(());
        }
        let from_total = self.debited(from, amount)?;
        let to_total = self.credited(to, amount)?;
        self.set(from, from_total);
        self.set(to, to_total);
        Ok(())
    }

    fn credited(&self, holder: &HolderAddress, amount: u64) -> Result<u64, AccountingError> {
        self.total(holder)
            .checked_add(amount)
            .ok_or(AccountingError::TotalOverflow { holder: *holder })
    }

    fn debited(&self, holder: &HolderAddress, amount: u64) -> Result<u64, AccountingError> {
        let available = self.total(holder);
        available
            .checked_sub(amount)
            .ok_or(AccountingError::Underflow {
                holder: *holder,
                amount,
                available,
            })
    }

    fn set(&mut self, holder: &HolderAddress, total: u64) {
        if total == 0 {
            self.totals.remove(holder);
        } else {
            self.totals.insert(*holder, total);
        }
    }
}

/// Recompute `holder`'s active total by scanning `records`.
///
/// This is the definition the cached [`OffsetLedger`] total must match.
pub fn recompute_total<'a, R, I>(holder: &HolderAddress, records: I) -> u64
where
    R: OffsetRecord + 'a,
    I: IntoIterator<Item = &'a R>,
{
    records
        .into_iter()
        .filter(|r| r.holder() == holder && !r.is_retired())
        .fold(0u64, |acc, r| acc.saturating_add(r.carbon_offset()))
}
