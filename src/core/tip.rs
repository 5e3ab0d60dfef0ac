//! Tip settlement - Peer-to-peer transfers with a platform fee.
//!
//! A tip debits the sender by the gross amount, credits the recipient with
//! the net amount, and records the withheld fee as a standalone audit
//! transaction. Debit and credit are separate commits by design; if the
//! credit fails after the debit succeeded, the sender is refunded and the
//! tip is recorded as failed. A debited-but-uncredited tip is never left
//! outstanding.

use crate::{
    config::WalletSettings,
    core::{limits, wallet},
    entities::{
        tip,
        tip::{Platform, TipStatus},
        transaction::{TransactionKind, TransactionMetadata},
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use tracing::warn;
use uuid::Uuid;

/// Result of a settled tip.
#[derive(Debug, Clone, Copy)]
pub struct TipOutcome {
    /// Id of the tip record
    pub tip_id: i64,
    /// Sender's balance after the debit, minor units
    pub sender_new_balance: i64,
}

/// Computes the platform fee with half-up rounding to the nearest minor unit.
/// Saturates on absurd inputs instead of overflowing; limit validation
/// rejects those amounts before any mutation.
pub const fn compute_fee(gross: i64, fee_bps: i64) -> i64 {
    gross.saturating_mul(fee_bps).saturating_add(5_000) / 10_000
}

/// Sends a tip from one user to another.
///
/// Validation happens before any mutation: self-tips are rejected, the
/// sender must already hold a wallet (the recipient's is created lazily),
/// the gross amount must satisfy the tip limit policy, and the sender's
/// balance must cover the gross amount.
///
/// # Errors
/// `SelfTipNotAllowed`, `WalletNotFound`, `LimitExceeded`,
/// `InsufficientBalance`; `PartialFailure` when a compensating refund could
/// not be applied.
#[allow(clippy::too_many_arguments)]
pub async fn send_tip(
    db: &DatabaseConnection,
    settings: &WalletSettings,
    sender_id: i64,
    recipient_id: i64,
    gross_amount: i64,
    platform: Platform,
    message: Option<String>,
    anonymous: bool,
) -> Result<TipOutcome> {
    if sender_id == recipient_id {
        return Err(Error::SelfTipNotAllowed);
    }

    let sender_wallet = wallet::get_wallet(db, sender_id)
        .await?
        .ok_or(Error::WalletNotFound { user_id: sender_id })?;

    // The recipient may never have transacted before
    wallet::ensure_wallet(db, recipient_id, &settings.currency).await?;

    let fee = compute_fee(gross_amount, settings.tip_fee_bps);

    limits::validate_for_user(db, settings, sender_id, gross_amount, TransactionKind::TipSent)
        .await?;

    if sender_wallet.balance < gross_amount {
        return Err(Error::InsufficientBalance {
            available: sender_wallet.balance,
            required: gross_amount,
        });
    }

    settle(
        db,
        sender_id,
        recipient_id,
        gross_amount,
        fee,
        &sender_wallet.currency,
        platform,
        message,
        anonymous,
    )
    .await
}

/// Performs the debit-then-credit transfer and writes the tip record.
///
/// Exposed within the crate so the compensation path is testable: callers
/// guarantee the sender wallet exists, but the credit may still fail, in
/// which case the sender is refunded and a failed tip is recorded.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn settle(
    db: &DatabaseConnection,
    sender_id: i64,
    recipient_id: i64,
    gross_amount: i64,
    fee: i64,
    currency: &str,
    platform: Platform,
    message: Option<String>,
    anonymous: bool,
) -> Result<TipOutcome> {
    let net_amount = gross_amount - fee;
    let transfer_ref = format!("tip_{}", Uuid::new_v4());
    let metadata = TransactionMetadata::Tip {
        transfer_ref: transfer_ref.clone(),
        anonymous,
    };

    // Debit first; only proceed to the credit once the debit committed.
    let debit_outcome = wallet::debit(
        db,
        sender_id,
        gross_amount,
        TransactionKind::TipSent,
        fee,
        Some(recipient_id),
        Some(transfer_ref.clone()),
        Some(metadata.clone()),
    )
    .await?;

    let credit_result = wallet::credit(
        db,
        recipient_id,
        net_amount,
        TransactionKind::TipReceived,
        Some(sender_id),
        Some(transfer_ref.clone()),
        Some(metadata),
    )
    .await;

    match credit_result {
        Ok(_) => {
            // Both mutations committed; a failure to write the audit records
            // from here on is a partial failure for reconciliation, never a
            // silent drop.
            let tip_record = insert_tip(
                db,
                sender_id,
                recipient_id,
                gross_amount,
                fee,
                currency,
                TipStatus::Completed,
                platform,
                message,
                anonymous,
                &transfer_ref,
            )
            .await
            .map_err(|e| Error::PartialFailure {
                detail: format!("tip {transfer_ref} settled but tip record write failed: {e}"),
            })?;

            if fee > 0 {
                wallet::record_fee(
                    db,
                    sender_id,
                    fee,
                    currency,
                    Some(recipient_id),
                    transfer_ref.clone(),
                )
                .await
                .map_err(|e| Error::PartialFailure {
                    detail: format!("tip {transfer_ref} settled but fee record write failed: {e}"),
                })?;
            }

            Ok(TipOutcome {
                tip_id: tip_record.id,
                sender_new_balance: debit_outcome.new_balance,
            })
        }
        Err(credit_err) => {
            warn!(
                sender_id,
                recipient_id,
                %transfer_ref,
                error = %credit_err,
                "Tip credit failed after debit, refunding sender"
            );

            match wallet::refund(
                db,
                sender_id,
                gross_amount,
                TransactionKind::TipSent,
                transfer_ref.clone(),
            )
            .await
            {
                Ok(_) => {
                    insert_tip(
                        db,
                        sender_id,
                        recipient_id,
                        gross_amount,
                        fee,
                        currency,
                        TipStatus::Failed,
                        platform,
                        message,
                        anonymous,
                        &transfer_ref,
                    )
                    .await?;
                    Err(credit_err)
                }
                Err(refund_err) => Err(Error::PartialFailure {
                    detail: format!(
                        "tip {transfer_ref}: sender {sender_id} debited {gross_amount} but \
                         credit to {recipient_id} failed ({credit_err}) and refund failed \
                         ({refund_err})"
                    ),
                }),
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn insert_tip(
    db: &DatabaseConnection,
    sender_id: i64,
    recipient_id: i64,
    gross_amount: i64,
    fee: i64,
    currency: &str,
    status: TipStatus,
    platform: Platform,
    message: Option<String>,
    anonymous: bool,
    transfer_ref: &str,
) -> Result<tip::Model> {
    let record = tip::ActiveModel {
        sender_id: Set(Some(sender_id)),
        recipient_id: Set(recipient_id),
        gross_amount: Set(gross_amount),
        fee: Set(fee),
        net_amount: Set(gross_amount - fee),
        currency: Set(currency.to_string()),
        anonymous: Set(anonymous),
        status: Set(status),
        platform: Set(platform),
        message: Set(message),
        transfer_ref: Set(transfer_ref.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    record.insert(db).await.map_err(Into::into)
}
