//! Gateway-backed deposits and withdrawals.
//!
//! Deposits mutate nothing until the gateway's webhook confirms the charge.
//! Withdrawals debit the wallet immediately with a pending transaction; the
//! webhook later completes it or triggers a compensating refund. Webhook
//! deliveries are signature-checked and de-duplicated by
//! (reference, event type) before any ledger mutation.

use crate::{
    config::WalletSettings,
    core::{limits, wallet},
    entities::{
        Transaction, Wallet, transaction,
        transaction::{TransactionKind, TransactionMetadata, TransactionStatus},
        wallet as wallet_entity, webhook_event,
    },
    errors::{Error, Result},
    services::gateway::{self, PaymentGateway},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, IntoActiveModel, Set, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

/// Result of initiating a deposit charge.
#[derive(Debug, Clone)]
pub struct DepositInit {
    /// Checkout URL the payer is redirected to
    pub redirect_url: String,
    /// Gateway reference the confirmation webhook will carry
    pub reference: String,
    /// Id of the pending deposit transaction
    pub transaction_id: i64,
}

/// Result of a withdrawal request.
#[derive(Debug, Clone)]
pub struct WithdrawalOutcome {
    /// Payout reference handed to the gateway
    pub reference: String,
    /// Id of the pending withdrawal transaction
    pub transaction_id: i64,
    /// Wallet balance after the immediate debit, minor units
    pub new_balance: i64,
}

/// How a webhook delivery was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookDisposition {
    /// The event mutated the ledger
    Processed,
    /// Duplicate or unknown event; nothing mutated
    Ignored,
}

/// Signed webhook payload shape delivered by the gateway.
#[derive(Debug, Deserialize)]
pub struct GatewayEvent {
    /// Event type, e.g. `"charge.success"`
    pub event: String,
    /// Event body
    pub data: GatewayEventData,
}

/// Body of a gateway event.
#[derive(Debug, Deserialize)]
pub struct GatewayEventData {
    /// Transaction reference the event refers to
    pub reference: String,
    /// Settled amount, minor units
    pub amount: i64,
}

/// Starts a deposit: validates limits, lazily creates the wallet, initiates
/// the gateway charge, and records a pending deposit transaction. The
/// balance is untouched until `charge.success` arrives.
pub async fn initiate_deposit<G: PaymentGateway>(
    db: &DatabaseConnection,
    settings: &WalletSettings,
    gateway: &G,
    user_id: i64,
    amount: i64,
    payer_email: &str,
) -> Result<DepositInit> {
    limits::validate_for_user(db, settings, user_id, amount, TransactionKind::Deposit).await?;
    let user_wallet = wallet::ensure_wallet(db, user_id, &settings.currency).await?;

    let reference = format!("dep_{}", Uuid::new_v4());
    let charge = gateway.initiate_charge(amount, payer_email, &reference).await?;

    let record = wallet::insert_transaction(
        db,
        user_id,
        TransactionKind::Deposit,
        amount,
        0,
        &user_wallet.currency,
        TransactionStatus::Pending,
        None,
        Some(charge.reference.clone()),
        Some(&TransactionMetadata::Deposit {
            payer_email: payer_email.to_string(),
        }),
    )
    .await?;

    info!(user_id, amount, reference = %charge.reference, "Deposit initiated");
    Ok(DepositInit {
        redirect_url: charge.redirect_url,
        reference: charge.reference,
        transaction_id: record.id,
    })
}

/// Requests a withdrawal: validates limits, debits the wallet immediately
/// with a pending transaction, then asks the gateway for a payout. A
/// gateway rejection triggers the compensating refund and fails the
/// transaction.
///
/// # Errors
/// `LimitExceeded`, `WalletNotFound`, `InsufficientBalance`,
/// `GatewayRejected` after a successful refund, `PartialFailure` when the
/// refund itself could not be applied.
pub async fn request_withdrawal<G: PaymentGateway>(
    db: &DatabaseConnection,
    settings: &WalletSettings,
    gateway: &G,
    user_id: i64,
    amount: i64,
    destination_account: &str,
) -> Result<WithdrawalOutcome> {
    limits::validate_for_user(db, settings, user_id, amount, TransactionKind::Withdrawal).await?;

    let reference = format!("wd_{}", Uuid::new_v4());
    let outcome = wallet::debit_pending(
        db,
        user_id,
        amount,
        TransactionKind::Withdrawal,
        0,
        Some(reference.clone()),
        Some(TransactionMetadata::Withdrawal {
            destination_account: destination_account.to_string(),
        }),
    )
    .await?;

    match gateway
        .initiate_payout(amount, destination_account, &reference)
        .await
    {
        Ok(payout) => {
            info!(user_id, amount, %reference, status = %payout.status, "Payout initiated");
            Ok(WithdrawalOutcome {
                reference,
                transaction_id: outcome.transaction_id,
                new_balance: outcome.new_balance,
            })
        }
        Err(gateway_err) => {
            warn!(user_id, %reference, error = %gateway_err, "Payout rejected, refunding wallet");
            compensate_withdrawal(db, user_id, amount, outcome.transaction_id, &reference)
                .await
                .map_err(|refund_err| Error::PartialFailure {
                    detail: format!(
                        "withdrawal {reference}: wallet {user_id} debited {amount} but payout \
                         was rejected ({gateway_err}) and refund failed ({refund_err})"
                    ),
                })?;
            Err(gateway_err)
        }
    }
}

/// Refunds a debited withdrawal and marks its transaction failed.
async fn compensate_withdrawal(
    db: &DatabaseConnection,
    user_id: i64,
    amount: i64,
    transaction_id: i64,
    reference: &str,
) -> Result<()> {
    wallet::refund(
        db,
        user_id,
        amount,
        TransactionKind::Withdrawal,
        reference.to_string(),
    )
    .await?;
    set_transaction_status(db, transaction_id, TransactionStatus::Failed).await?;
    Ok(())
}

/// Handles one signed webhook delivery.
///
/// Verification order is fixed: signature first (a mismatch rejects the
/// delivery with no mutation), then (reference, event type) de-duplication
/// (a duplicate is ignored with no mutation), and only then the ledger
/// effect of the event.
pub async fn handle_webhook(
    db: &DatabaseConnection,
    secret: &[u8],
    signature: &str,
    raw_body: &[u8],
) -> Result<WebhookDisposition> {
    gateway::verify_signature(secret, raw_body, signature)?;

    let event: GatewayEvent = serde_json::from_slice(raw_body)?;

    if already_delivered(db, &event.data.reference, &event.event).await? {
        info!(reference = %event.data.reference, event = %event.event, "Duplicate webhook ignored");
        return Ok(WebhookDisposition::Ignored);
    }

    let disposition = match event.event.as_str() {
        "charge.success" => settle_deposit(db, &event.data).await?,
        "payout.success" => complete_withdrawal(db, &event.data).await?,
        "payout.failed" => fail_withdrawal(db, &event.data).await?,
        other => {
            warn!(event = other, "Unhandled gateway event type");
            WebhookDisposition::Ignored
        }
    };

    // Recorded only once processing succeeded, so a delivery that failed
    // mid-processing can be retried by the gateway.
    if disposition == WebhookDisposition::Processed {
        record_delivery(db, &event.data.reference, &event.event).await?;
    }
    Ok(disposition)
}

async fn already_delivered(
    db: &DatabaseConnection,
    reference: &str,
    event_type: &str,
) -> Result<bool> {
    let existing = crate::entities::WebhookEvent::find()
        .filter(webhook_event::Column::Reference.eq(reference))
        .filter(webhook_event::Column::EventType.eq(event_type))
        .one(db)
        .await?;
    Ok(existing.is_some())
}

async fn record_delivery(db: &DatabaseConnection, reference: &str, event_type: &str) -> Result<()> {
    let record = webhook_event::ActiveModel {
        reference: Set(reference.to_string()),
        event_type: Set(event_type.to_string()),
        received_at: Set(Utc::now()),
        ..Default::default()
    };
    record.insert(db).await?;
    Ok(())
}

/// Applies a confirmed deposit: credits the wallet and completes the
/// pending transaction, both in one storage transaction.
async fn settle_deposit(
    db: &DatabaseConnection,
    data: &GatewayEventData,
) -> Result<WebhookDisposition> {
    let Some(pending) = find_pending(db, &data.reference, TransactionKind::Deposit).await? else {
        warn!(reference = %data.reference, "charge.success for unknown deposit");
        return Ok(WebhookDisposition::Ignored);
    };

    if pending.amount != data.amount {
        return Err(Error::GatewayRejected {
            reason: format!(
                "amount mismatch for {}: recorded {}, gateway settled {}",
                data.reference, pending.amount, data.amount
            ),
        });
    }

    let txn = db.begin().await?;

    Wallet::update_many()
        .col_expr(
            wallet_entity::Column::Balance,
            Expr::col(wallet_entity::Column::Balance).add(data.amount),
        )
        .col_expr(
            wallet_entity::Column::TotalDeposits,
            Expr::col(wallet_entity::Column::TotalDeposits).add(data.amount),
        )
        .col_expr(
            wallet_entity::Column::LastActivity,
            Expr::value(sea_orm::Value::from(Utc::now())),
        )
        .filter(wallet_entity::Column::UserId.eq(pending.user_id))
        .exec(&txn)
        .await?;

    let now = Utc::now();
    let mut active = pending.clone().into_active_model();
    active.status = Set(TransactionStatus::Completed);
    active.updated_at = Set(now);
    active.completed_at = Set(Some(now));
    active.update(&txn).await?;

    txn.commit().await?;

    info!(user_id = pending.user_id, amount = data.amount, reference = %data.reference,
          "Deposit settled");
    Ok(WebhookDisposition::Processed)
}

/// Completes a pending withdrawal after the gateway confirmed the payout.
async fn complete_withdrawal(
    db: &DatabaseConnection,
    data: &GatewayEventData,
) -> Result<WebhookDisposition> {
    let Some(pending) = find_pending(db, &data.reference, TransactionKind::Withdrawal).await?
    else {
        warn!(reference = %data.reference, "payout.success for unknown withdrawal");
        return Ok(WebhookDisposition::Ignored);
    };

    set_transaction_status(db, pending.id, TransactionStatus::Completed).await?;
    info!(user_id = pending.user_id, reference = %data.reference, "Withdrawal completed");
    Ok(WebhookDisposition::Processed)
}

/// Reverses a failed payout: compensating credit back to the wallet, and
/// the withdrawal transaction marked failed.
async fn fail_withdrawal(
    db: &DatabaseConnection,
    data: &GatewayEventData,
) -> Result<WebhookDisposition> {
    let Some(pending) = find_pending(db, &data.reference, TransactionKind::Withdrawal).await?
    else {
        warn!(reference = %data.reference, "payout.failed for unknown withdrawal");
        return Ok(WebhookDisposition::Ignored);
    };

    let amount = pending.amount.abs();
    compensate_withdrawal(db, pending.user_id, amount, pending.id, &data.reference)
        .await
        .map_err(|refund_err| Error::PartialFailure {
            detail: format!(
                "payout.failed {}: refund of {} to wallet {} failed ({refund_err})",
                data.reference, amount, pending.user_id
            ),
        })?;

    warn!(user_id = pending.user_id, amount, reference = %data.reference,
          "Payout failed, wallet refunded");
    Ok(WebhookDisposition::Processed)
}

async fn find_pending(
    db: &DatabaseConnection,
    reference: &str,
    kind: TransactionKind,
) -> Result<Option<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::ExternalRef.eq(reference))
        .filter(transaction::Column::Kind.eq(kind))
        .filter(transaction::Column::Status.eq(TransactionStatus::Pending))
        .one(db)
        .await
        .map_err(Into::into)
}

async fn set_transaction_status(
    db: &DatabaseConnection,
    transaction_id: i64,
    status: TransactionStatus,
) -> Result<()> {
    let record = Transaction::find_by_id(transaction_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::Config {
            message: format!("Transaction {transaction_id} not found"),
        })?;

    let now = Utc::now();
    let mut active = record.into_active_model();
    active.status = Set(status);
    active.updated_at = Set(now);
    active.completed_at = Set((status == TransactionStatus::Completed).then_some(now));
    active.update(db).await?;
    Ok(())
}
