//! # Payment Reconciler
//!
//! Matches gateway settlement callbacks to appointments, tracks settlement
//! status, and finalizes commission exactly once per settled appointment.
//!
//! ## Settlement Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Settlement Flow                                     │
//! │                                                                         │
//! │  Gateway callback {appointmentId, amount, status, ...}                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  reconcile() ──► appointment lookup ──► OrphanPayment if unknown        │
//! │       │                                                                 │
//! │       ├── amount ≠ total_price ──► AmountMismatch flagged, NOT fatal    │
//! │       │                            (never auto-corrected either way)    │
//! │       ▼                                                                 │
//! │  payment row inserted / status updated                                  │
//! │       │                                                                 │
//! │       ├── completed + appointment completed ──► finalize ONCE           │
//! │       │                                         (try_insert_split CAS)  │
//! │       └── refunded ──► append compensating reversal entry               │
//! │                        (original row is never mutated)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Finalization is idempotent and safe to race: the store's
//! `try_insert_split` is the compare-and-set, so a caller losing the race
//! observes the winner's persisted split instead of recomputing.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use sheba_core::{
    compute_split, Appointment, AppointmentStatus, CommissionSplit, Money, Payment, PaymentMethod,
    PaymentStatus, SplitAmounts, SplitEntry,
};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::store::SalonStore;

// =============================================================================
// Settlement Callback
// =============================================================================

/// The payload a payment gateway posts back after processing.
///
/// The engine never initiates gateway calls; only the settlement outcome
/// arrives here. Field names follow the gateway JSON contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementCallback {
    pub appointment_id: String,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// What a reconcile call did.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    /// The payment row after this callback was applied.
    pub payment: Payment,

    /// The callback amount did not equal the appointment's price snapshot.
    /// Recorded for manual reconciliation; settlement proceeds anyway.
    pub amount_mismatch: bool,

    /// The original commission split, present when this call finalized it
    /// or found it already finalized.
    pub finalized: Option<CommissionSplit>,

    /// The compensating reversal entry appended by a refund.
    pub reversal: Option<CommissionSplit>,
}

// =============================================================================
// Payment Reconciler
// =============================================================================

/// Settlement tracking and finalize-once commission orchestration over an
/// injected store.
pub struct PaymentReconciler {
    store: Arc<dyn SalonStore>,
    config: EngineConfig,
}

impl PaymentReconciler {
    pub fn new(store: Arc<dyn SalonStore>, config: EngineConfig) -> Self {
        PaymentReconciler { store, config }
    }

    /// Applies a gateway settlement callback.
    ///
    /// ## Failure Modes
    /// - `OrphanPayment` — no appointment matches the callback
    /// - Store failures propagate unchanged
    ///
    /// An amount mismatch is NOT a failure: it is flagged in the outcome
    /// and logged, and neither the payment nor the appointment is adjusted.
    pub async fn reconcile(&self, callback: SettlementCallback) -> EngineResult<ReconcileOutcome> {
        let appointment = self
            .store
            .appointment(&callback.appointment_id)
            .await?
            .ok_or_else(|| EngineError::OrphanPayment {
                appointment_id: callback.appointment_id.clone(),
            })?;

        let amount_mismatch = callback.amount != appointment.total_price;
        if amount_mismatch {
            warn!(
                appointment_id = %appointment.id,
                expected = %appointment.total_price,
                received = %callback.amount,
                "Settlement amount mismatch, flagged for manual reconciliation"
            );
        }

        let payment = self.record_payment(&appointment, &callback).await?;

        let (finalized, reversal) = match payment.status {
            PaymentStatus::Completed => (self.finalize_settled(&appointment.id).await?, None),
            PaymentStatus::Refunded => (None, self.reverse(&appointment.id).await?),
            PaymentStatus::Pending | PaymentStatus::Failed => (None, None),
        };

        Ok(ReconcileOutcome {
            payment,
            amount_mismatch,
            finalized,
            reversal,
        })
    }

    /// Finalizes the commission split for an appointment, once, if both the
    /// appointment and its payment have reached `completed`.
    ///
    /// Safe to call from anywhere at any time: before settlement it returns
    /// `None`; after the first finalization it returns the persisted split.
    /// The booking engine's `completed` transition and the settlement
    /// callback both funnel through here, and whichever observes the
    /// (completed, completed) pair first wins the insert.
    pub async fn finalize_settled(
        &self,
        appointment_id: &str,
    ) -> EngineResult<Option<CommissionSplit>> {
        let appointment = self
            .store
            .appointment(appointment_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Appointment", appointment_id))?;

        if appointment.status != AppointmentStatus::Completed {
            debug!(
                appointment_id = %appointment.id,
                status = %appointment.status,
                "Settlement recorded before service completion, split deferred"
            );
            return Ok(None);
        }

        let Some(payment) = self.store.payment_by_appointment(appointment_id).await? else {
            return Ok(None);
        };
        if payment.status != PaymentStatus::Completed {
            return Ok(None);
        }

        if let Some(existing) = self.original_split(appointment_id).await? {
            return Ok(Some(existing));
        }

        let amounts = self.compute_for(&appointment).await?;
        if amounts.salon_share.is_negative() {
            warn!(
                appointment_id = %appointment.id,
                salon_share = %amounts.salon_share,
                "Fixed commission and platform fee exceed the appointment total"
            );
        }

        let split = CommissionSplit {
            id: Uuid::new_v4().to_string(),
            appointment_id: appointment.id.clone(),
            staff_id: appointment.staff_id.clone(),
            salon_id: appointment.salon_id.clone(),
            staff_share: amounts.staff_share,
            salon_share: amounts.salon_share,
            platform_share: amounts.platform_share,
            entry: SplitEntry::Original,
            created_at: Utc::now(),
        };

        if self.store.try_insert_split(&split).await? {
            info!(
                appointment_id = %appointment.id,
                staff_share = %split.staff_share,
                salon_share = %split.salon_share,
                platform_share = %split.platform_share,
                "Commission finalized"
            );
            Ok(Some(split))
        } else {
            // Lost the finalize race: the winner's row is the split
            self.original_split(appointment_id).await
        }
    }

    /// Reverses a previously finalized split by appending a compensating
    /// negative entry. The original row is never mutated.
    ///
    /// Returns `None` when nothing was finalized (a refund can arrive
    /// before settlement ever completed); idempotent otherwise.
    pub async fn reverse(&self, appointment_id: &str) -> EngineResult<Option<CommissionSplit>> {
        let splits = self.store.splits_by_appointment(appointment_id).await?;

        let Some(original) = splits.iter().find(|s| s.entry == SplitEntry::Original) else {
            debug!(
                appointment_id = %appointment_id,
                "Refund with no finalized split, nothing to reverse"
            );
            return Ok(None);
        };

        if let Some(existing) = splits.iter().find(|s| s.entry == SplitEntry::Reversal) {
            return Ok(Some(existing.clone()));
        }

        let reversal = original.reversal(Uuid::new_v4().to_string(), Utc::now());
        if self.store.try_insert_split(&reversal).await? {
            info!(
                appointment_id = %appointment_id,
                staff_share = %reversal.staff_share,
                "Commission reversed for refund"
            );
            Ok(Some(reversal))
        } else {
            let splits = self.store.splits_by_appointment(appointment_id).await?;
            Ok(splits.into_iter().find(|s| s.entry == SplitEntry::Reversal))
        }
    }

    /// Recomputes the split amounts from current catalog data, bypassing
    /// the persisted ledger.
    ///
    /// This is the explicit-force escape hatch: the persisted split never
    /// changes, but an operator can compare it against a fresh computation
    /// after a rule correction.
    pub async fn preview_split(&self, appointment_id: &str) -> EngineResult<SplitAmounts> {
        let appointment = self
            .store
            .appointment(appointment_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Appointment", appointment_id))?;
        self.compute_for(&appointment).await
    }

    async fn compute_for(&self, appointment: &Appointment) -> EngineResult<SplitAmounts> {
        let service = self
            .store
            .service(&appointment.service_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Service", &appointment.service_id))?;
        let staff = self
            .store
            .staff_member(&appointment.staff_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Staff", &appointment.staff_id))?;

        Ok(compute_split(
            appointment.total_price,
            &service.commission,
            staff.commission_percentage,
            self.config.platform_fee(),
        )?)
    }

    async fn original_split(
        &self,
        appointment_id: &str,
    ) -> EngineResult<Option<CommissionSplit>> {
        let splits = self.store.splits_by_appointment(appointment_id).await?;
        Ok(splits
            .into_iter()
            .find(|s| s.entry == SplitEntry::Original))
    }

    async fn update_payment(
        &self,
        mut existing: Payment,
        callback: &SettlementCallback,
    ) -> EngineResult<Payment> {
        self.store
            .update_payment_status(&existing.id, callback.status, callback.paid_at)
            .await?;
        existing.status = callback.status;
        if callback.paid_at.is_some() {
            existing.paid_at = callback.paid_at;
        }
        Ok(existing)
    }

    async fn record_payment(
        &self,
        appointment: &Appointment,
        callback: &SettlementCallback,
    ) -> EngineResult<Payment> {
        if let Some(existing) = self.store.payment_by_appointment(&appointment.id).await? {
            return self.update_payment(existing, callback).await;
        }

        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            appointment_id: appointment.id.clone(),
            amount: callback.amount,
            method: callback.payment_method,
            status: callback.status,
            transaction_id: callback.transaction_id.clone(),
            paid_at: callback.paid_at,
            created_at: Utc::now(),
        };
        self.store.insert_payment(&payment).await?;
        debug!(
            appointment_id = %appointment.id,
            payment_id = %payment.id,
            status = %payment.status.as_str(),
            "Payment recorded"
        );
        Ok(payment)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
