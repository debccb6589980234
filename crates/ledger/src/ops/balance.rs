//! Balance-delta application and direct adjustments.
//!
//! Every write to the persisted balance goes through [`Ledger::apply_delta`],
//! which holds the balance mutex across the read-modify-write. Item
//! operations and direct adjustments share that one critical section, so two
//! interleaved operations can never both read the pre-mutation balance and
//! lose an update.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::{Ledger, LedgerError, ResultLedger, money};

/// Outcome of a direct balance adjustment.
///
/// A refused withdrawal is a reported rejection, not an error: the operation
/// completes, nothing changes, and the caller learns the committed balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum BalanceAdjustment {
    Applied { balance_minor: i64 },
    Rejected { balance_minor: i64 },
}

impl BalanceAdjustment {
    /// The committed balance after the operation, applied or not.
    pub fn balance_minor(self) -> i64 {
        match self {
            Self::Applied { balance_minor } | Self::Rejected { balance_minor } => balance_minor,
        }
    }
}

impl Ledger {
    /// Adjusts the balance by `delta_minor` under the balance mutex.
    ///
    /// With `allow_negative == false` the adjustment is rejected, with no
    /// state change, when it would drive the balance below zero. Deposits and
    /// item-paired deltas pass `true`: adding a purchase may legally push the
    /// budget negative even though a manual withdrawal may not. A delta that
    /// would overflow the representable range is an [`InvalidAmount`] error,
    /// with no state change.
    ///
    /// [`InvalidAmount`]: LedgerError::InvalidAmount
    pub async fn adjust_balance(
        &self,
        delta_minor: i64,
        allow_negative: bool,
    ) -> ResultLedger<BalanceAdjustment> {
        let _guard = self.balance_lock.lock().await;
        let current = self.read_balance().await?;
        let next = current.checked_add(delta_minor).ok_or_else(|| {
            LedgerError::InvalidAmount(format!("balance overflow: {current} + {delta_minor}"))
        })?;

        if !allow_negative && next < 0 {
            warn!(
                current = %money::format_minor(current),
                delta = %money::format_minor(delta_minor),
                "adjustment rejected: balance would go negative"
            );
            return Ok(BalanceAdjustment::Rejected {
                balance_minor: current,
            });
        }

        self.write_balance(next).await?;
        debug!(
            delta = %money::format_minor(delta_minor),
            balance = %money::format_minor(next),
            "balance adjusted"
        );
        Ok(BalanceAdjustment::Applied {
            balance_minor: next,
        })
    }

    /// Manual deposit. Always permitted.
    pub async fn deposit(&self, amount_minor: i64) -> ResultLedger<BalanceAdjustment> {
        self.adjust_balance(amount_minor, true).await
    }

    /// Manual withdrawal. Rejected when it would leave the balance negative.
    pub async fn withdraw(&self, amount_minor: i64) -> ResultLedger<BalanceAdjustment> {
        self.adjust_balance(-amount_minor, false).await
    }

    /// Applies the compensating delta for an already-committed item mutation.
    ///
    /// The item half of the pair is durable by the time this runs. A failure
    /// here therefore leaves the stores detectably inconsistent (item present
    /// or absent without its matching delta); that is logged at error
    /// severity and surfaced to the caller instead of being retried.
    pub(crate) async fn apply_paired_delta(&self, delta_minor: i64) -> ResultLedger<()> {
        match self.adjust_balance(delta_minor, true).await {
            Ok(_) => Ok(()),
            Err(err) => {
                error!(
                    delta = %money::format_minor(delta_minor),
                    %err,
                    "balance delta lost after committed item mutation; stores are inconsistent"
                );
                Err(err)
            }
        }
    }
}
