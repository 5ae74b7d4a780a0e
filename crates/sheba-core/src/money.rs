//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely, and the
//! `Rate` type for percentages expressed in basis points.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In a commission ledger:                                                │
//! │    100.00 × 30% × 40% = 11.999999999999998  → Who gets the cent?       │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    10000 cents × 3000 bps × 4000 bps = 1200 cents exactly              │
//! │    Rounding happens ONCE, half-up, and the residual is assigned        │
//! │    explicitly (to the salon share)                                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use sheba_core::money::{Money, Rate};
//!
//! // Create from cents (preferred)
//! let price = Money::from_cents(45000); // 450.00 ETB
//!
//! // Percentage arithmetic rounds half-up to the nearest cent
//! let fee = price.percent_of(Rate::from_bps(500)); // 5%
//! assert_eq!(fee.cents(), 2250);
//!
//! // NEVER do this:
//! // let bad = Money::from_float(10.99); // NO SUCH METHOD EXISTS!
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds and reversal entries
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Service.price ──► Appointment.total_price (snapshot at booking)       │
/// │                          │                                              │
/// │                          ├──► Payment.amount (settlement callback)      │
/// │                          │                                              │
/// │                          └──► CommissionSplit (staff/salon/platform)    │
/// │                                                                         │
/// │  EVERY monetary value in the system flows through this type            │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use sheba_core::money::Money;
    ///
    /// let price = Money::from_cents(45000); // 450.00
    /// assert_eq!(price.cents(), 45000);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from major and minor units.
    ///
    /// For negative amounts, only the major unit should be negative:
    /// `from_major_minor(-5, 50)` = -5.50, not -4.50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Calculates a percentage of this amount, rounding half-up to the cent.
    ///
    /// ## Rounding Policy
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  ROUND HALF-UP, ONCE                                                │
    /// │                                                                     │
    /// │  100.00 × 8.25% = 8.25    → 825 cents (exact)                      │
    /// │  100.01 × 5%    = 5.0005  → 500 cents (0.05 of a cent drops)       │
    /// │   10.01 × 5%    = 0.5005  → 50 cents                               │
    /// │   10.00 × 0.5%  = 0.05    → 5 cents                                │
    /// │    1.11 × 50%   = 0.555   → 56 cents (half rounds UP)              │
    /// │                                                                     │
    /// │  Residual cents from a split are assigned to a single named        │
    /// │  party (the salon share) so the parts always sum to the whole.     │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// ## Implementation
    /// Integer math in i128 to prevent overflow: `(cents * bps + 5000) / 10000`.
    /// The +5000 provides half-up rounding (5000/10000 = 0.5).
    ///
    /// ## Example
    /// ```rust
    /// use sheba_core::money::{Money, Rate};
    ///
    /// let price = Money::from_cents(11100); // 111.00
    /// let half = price.percent_of(Rate::from_bps(5000)); // 50%
    /// assert_eq!(half.cents(), 5550);
    /// ```
    pub fn percent_of(&self, rate: Rate) -> Money {
        let cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }

    /// Calculates a percentage of a percentage of this amount, with a single
    /// half-up rounding at the end.
    ///
    /// Used when a service commission rule and a staff commission percentage
    /// compose: rounding twice would leak cents, so both factors are applied
    /// in one widened integer expression.
    ///
    /// ## Example
    /// ```rust
    /// use sheba_core::money::{Money, Rate};
    ///
    /// let price = Money::from_cents(10000); // 100.00
    /// // 30% service rule, staff keeps 40% of it => 12.00
    /// let staff = price.percent_of_composed(Rate::from_bps(3000), Rate::from_bps(4000));
    /// assert_eq!(staff.cents(), 1200);
    /// ```
    pub fn percent_of_composed(&self, first: Rate, second: Rate) -> Money {
        // Denominator is 10000 * 10000; +half for half-up rounding
        const DENOM: i128 = 100_000_000;
        let numer = self.0 as i128 * first.bps() as i128 * second.bps() as i128;
        let cents = (numer + DENOM / 2) / DENOM;
        Money::from_cents(cents as i64)
    }

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }
}

// =============================================================================
// Rate Type
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 4000 bps = 40% (a typical stylist commission percentage)
///
/// Commission percentages, platform fees, and the salon default commission
/// rate are all stored in this form, never as floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage (for convenience at config edges).
    pub fn from_percent(pct: f64) -> Self {
        Rate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percent(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// 100% expressed in basis points.
    pub const FULL_BPS: u32 = 10000;
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and debugging. The dashboard formats amounts itself
/// to handle currency symbol and localization properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by integer (for quantity-style calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Negation (for reversal ledger entries).
impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(45099);
        assert_eq!(money.cents(), 45099);
        assert_eq!(money.major(), 450);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_from_major_minor() {
        let money = Money::from_major_minor(450, 99);
        assert_eq!(money.cents(), 45099);

        let negative = Money::from_major_minor(-5, 50);
        assert_eq!(negative.cents(), -550);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(45099)), "450.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!((-a).cents(), -1000);
    }

    #[test]
    fn test_percent_of_basic() {
        // 100.00 at 5% = 5.00
        let amount = Money::from_cents(10000);
        let fee = amount.percent_of(Rate::from_bps(500));
        assert_eq!(fee.cents(), 500);
    }

    #[test]
    fn test_percent_of_rounds_half_up() {
        // 1.11 at 50% = 0.555 → 0.56
        let amount = Money::from_cents(111);
        assert_eq!(amount.percent_of(Rate::from_bps(5000)).cents(), 56);

        // 1.13 at 50% = 0.565 → 0.57 (half always rounds up, no banker's)
        let amount = Money::from_cents(113);
        assert_eq!(amount.percent_of(Rate::from_bps(5000)).cents(), 57);
    }

    #[test]
    fn test_percent_of_composed_single_rounding() {
        // 99.99 × 33% × 33% = 10.888911 → 10.89
        let amount = Money::from_cents(9999);
        let composed = amount.percent_of_composed(Rate::from_bps(3300), Rate::from_bps(3300));
        assert_eq!(composed.cents(), 1089);

        // 0.50 × 33% × 33% = 0.05445 → 0.05
        // Rounding stepwise would give 0.17 × 33% = 0.06 instead
        let amount = Money::from_cents(50);
        let composed = amount.percent_of_composed(Rate::from_bps(3300), Rate::from_bps(3300));
        assert_eq!(composed.cents(), 5);
    }

    #[test]
    fn test_rate_conversions() {
        let rate = Rate::from_percent(8.25);
        assert_eq!(rate.bps(), 825);
        assert_eq!(rate.percent(), 8.25);

        assert!(Rate::zero().is_zero());
        assert_eq!(Rate::FULL_BPS, 10000);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let positive = Money::from_cents(100);
        assert!(positive.is_positive());

        let negative = Money::from_cents(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs().cents(), 100);
    }

    #[test]
    fn test_min() {
        let a = Money::from_cents(3000);
        let b = Money::from_cents(10000);
        assert_eq!(a.min(b), a);
        assert_eq!(b.min(a), a);
    }
}
