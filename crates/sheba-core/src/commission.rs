//! # Commission Calculator
//!
//! Pure split arithmetic for settled appointments.
//!
//! ## The Split
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 total_price (appointment snapshot)                      │
//! │                                                                         │
//! │   platform ──► total × platform_fee_percent        (round half-up)     │
//! │                                                                         │
//! │   staff ────► percentage rule:                                         │
//! │                 total × rule% × staff%             (one rounding)      │
//! │               fixed rule:                                              │
//! │                 min(rule amount, total)            (staff% ignored)    │
//! │                                                                         │
//! │   salon ────► total − platform − staff             (balancing term)    │
//! │                                                                         │
//! │   INVARIANT: staff + salon + platform == total, to the exact cent.     │
//! │   The salon share absorbs every rounding residual.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Rule Composition
//! The source data model carries both a per-service commission rule and a
//! per-staff commission percentage without a composition rule. Resolution
//! applied uniformly here: a percentage-type service rule is the baseline
//! and the staff percentage scales it; a fixed-type rule pays the fixed
//! amount (capped at the price) and ignores the staff percentage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Rate};
use crate::types::CommissionRule;

// =============================================================================
// Split Amounts
// =============================================================================

/// The three-way division of an appointment's price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SplitAmounts {
    pub staff_share: Money,
    pub salon_share: Money,
    pub platform_share: Money,
}

impl SplitAmounts {
    /// Sum of the three shares. Always equals the appointment total for a
    /// computed split (the salon share balances the equation).
    pub fn total(&self) -> Money {
        self.staff_share + self.salon_share + self.platform_share
    }
}

/// Computes the (staff, salon, platform) split for a settled appointment.
///
/// ## Arguments
/// * `total` - The appointment's snapshotted price
/// * `rule` - The service's commission rule
/// * `staff_rate` - The staff member's commission percentage (0-100%)
/// * `platform_fee` - Configured platform fee percentage (default 0)
///
/// ## Errors
/// `InvalidCommissionRule` for a negative fixed amount, a percentage rule
/// above 100%, or a staff/platform rate above 100%. Rejected before any
/// arithmetic; the caller sees no partial state.
///
/// ## Example
/// ```rust
/// use sheba_core::commission::compute_split;
/// use sheba_core::money::{Money, Rate};
/// use sheba_core::types::CommissionRule;
///
/// // 100.00 appointment, fixed 30.00 rule, 5% platform fee
/// let split = compute_split(
///     Money::from_cents(10000),
///     &CommissionRule::Fixed(Money::from_cents(3000)),
///     Rate::from_bps(4000),
///     Rate::from_bps(500),
/// )
/// .unwrap();
///
/// assert_eq!(split.platform_share.cents(), 500);
/// assert_eq!(split.staff_share.cents(), 3000);
/// assert_eq!(split.salon_share.cents(), 6500);
/// ```
pub fn compute_split(
    total: Money,
    rule: &CommissionRule,
    staff_rate: Rate,
    platform_fee: Rate,
) -> CoreResult<SplitAmounts> {
    if total.is_negative() {
        return Err(CoreError::InvalidCommissionRule {
            reason: format!("appointment total {total} is negative"),
        });
    }
    if staff_rate.bps() > Rate::FULL_BPS {
        return Err(CoreError::InvalidCommissionRule {
            reason: format!("staff percentage {}% exceeds 100%", staff_rate.percent()),
        });
    }
    if platform_fee.bps() > Rate::FULL_BPS {
        return Err(CoreError::InvalidCommissionRule {
            reason: format!("platform fee {}% exceeds 100%", platform_fee.percent()),
        });
    }

    let platform_share = total.percent_of(platform_fee);

    let staff_share = match rule {
        CommissionRule::Percentage(rate) => {
            if rate.bps() > Rate::FULL_BPS {
                return Err(CoreError::InvalidCommissionRule {
                    reason: format!("percentage rule {}% exceeds 100%", rate.percent()),
                });
            }
            total.percent_of_composed(*rate, staff_rate)
        }
        CommissionRule::Fixed(amount) => {
            if amount.is_negative() {
                return Err(CoreError::InvalidCommissionRule {
                    reason: format!("fixed amount {amount} is negative"),
                });
            }
            (*amount).min(total)
        }
    };

    // The salon share is derived, not rounded: whatever cents remain after
    // the platform fee and staff share land here, so the three parts sum
    // to the total exactly. A fixed rule large enough to collide with the
    // platform fee can push it negative; the sum invariant still holds.
    let salon_share = total - platform_share - staff_share;

    Ok(SplitAmounts {
        staff_share,
        salon_share,
        platform_share,
    })
}

// =============================================================================
// Commission Split (ledger row)
// =============================================================================

/// Ledger entry kind.
///
/// Refunds never mutate the original row; they append a `Reversal` with
/// every share negated, keeping the ledger append-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SplitEntry {
    Original,
    Reversal,
}

impl SplitEntry {
    pub fn as_str(&self) -> &'static str {
        match self {
            SplitEntry::Original => "original",
            SplitEntry::Reversal => "reversal",
        }
    }
}

impl fmt::Display for SplitEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitEntry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "original" => Ok(SplitEntry::Original),
            "reversal" => Ok(SplitEntry::Reversal),
            other => Err(format!("unknown split entry kind: {other}")),
        }
    }
}

/// A persisted commission split.
///
/// Created exactly once per settled appointment (the store enforces
/// one-original-per-appointment as the finalize-once guard) and immutable
/// thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CommissionSplit {
    pub id: String,
    pub appointment_id: String,
    pub staff_id: String,
    pub salon_id: String,
    pub staff_share: Money,
    pub salon_share: Money,
    pub platform_share: Money,
    pub entry: SplitEntry,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl CommissionSplit {
    /// Sum of the three shares (negative for reversals).
    pub fn total(&self) -> Money {
        self.staff_share + self.salon_share + self.platform_share
    }

    /// Builds the compensating reversal entry for this split.
    pub fn reversal(&self, id: impl Into<String>, created_at: DateTime<Utc>) -> CommissionSplit {
        CommissionSplit {
            id: id.into(),
            appointment_id: self.appointment_id.clone(),
            staff_id: self.staff_id.clone(),
            salon_id: self.salon_id.clone(),
            staff_share: -self.staff_share,
            salon_share: -self.salon_share,
            platform_share: -self.platform_share,
            entry: SplitEntry::Reversal,
            created_at,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
