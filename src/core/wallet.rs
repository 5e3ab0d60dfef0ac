//! Wallet engine - Balance mutation primitives.
//!
//! Every balance change goes through this module: an atomic database-level
//! update of the wallet row plus an append-only transaction record, committed
//! together in one storage transaction. Debits are guarded by a conditional
//! `balance >= amount` filter so concurrent operations can never overdraw a
//! wallet, and the `balance >= 0` invariant holds without in-process locking.

use crate::{
    entities::{
        Wallet, transaction,
        transaction::{TransactionKind, TransactionMetadata, TransactionStatus},
        wallet,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{DatabaseConnection, Set, TransactionTrait, prelude::*, sea_query::Expr};

/// Result of a single balance mutation.
#[derive(Debug, Clone, Copy)]
pub struct MutationOutcome {
    /// Wallet balance after the mutation, minor units
    pub new_balance: i64,
    /// Id of the transaction record written alongside the mutation
    pub transaction_id: i64,
}

/// Finds the wallet for a user, if one exists.
pub async fn get_wallet(db: &DatabaseConnection, user_id: i64) -> Result<Option<wallet::Model>> {
    Wallet::find()
        .filter(wallet::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Returns the user's wallet, creating a zero-balance one when absent.
/// Idempotent; wallets are created lazily on first need.
pub async fn ensure_wallet(
    db: &DatabaseConnection,
    user_id: i64,
    currency: &str,
) -> Result<wallet::Model> {
    if let Some(existing) = get_wallet(db, user_id).await? {
        return Ok(existing);
    }

    let now = Utc::now();
    let new_wallet = wallet::ActiveModel {
        user_id: Set(user_id),
        balance: Set(0),
        currency: Set(currency.to_string()),
        total_deposits: Set(0),
        total_withdrawals: Set(0),
        total_tips_sent: Set(0),
        total_tips_received: Set(0),
        total_referral_earnings: Set(0),
        last_activity: Set(now),
        is_active: Set(true),
        created_at: Set(now),
        ..Default::default()
    };

    new_wallet.insert(db).await.map_err(Into::into)
}

/// Maps a transaction kind to the wallet's running-total column it bumps.
/// Fee records are audit-only and touch no running total.
const fn total_column(kind: TransactionKind) -> Option<wallet::Column> {
    match kind {
        TransactionKind::Deposit => Some(wallet::Column::TotalDeposits),
        TransactionKind::Withdrawal => Some(wallet::Column::TotalWithdrawals),
        TransactionKind::TipSent => Some(wallet::Column::TotalTipsSent),
        TransactionKind::TipReceived => Some(wallet::Column::TotalTipsReceived),
        TransactionKind::ReferralBonus => Some(wallet::Column::TotalReferralEarnings),
        TransactionKind::Fee => None,
    }
}

/// Inserts one transaction record. Shared by the mutation paths and the
/// audit-only fee record.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn insert_transaction<C>(
    db: &C,
    user_id: i64,
    kind: TransactionKind,
    amount: i64,
    fee: i64,
    currency: &str,
    status: TransactionStatus,
    counterparty_id: Option<i64>,
    external_ref: Option<String>,
    metadata: Option<&TransactionMetadata>,
) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let metadata_json = match metadata {
        Some(m) => Some(m.to_json()?),
        None => None,
    };

    let record = transaction::ActiveModel {
        user_id: Set(user_id),
        kind: Set(kind),
        amount: Set(amount),
        fee: Set(fee),
        net_amount: Set(amount.abs() - fee),
        currency: Set(currency.to_string()),
        status: Set(status),
        counterparty_id: Set(counterparty_id),
        external_ref: Set(external_ref),
        metadata: Set(metadata_json),
        created_at: Set(now),
        updated_at: Set(now),
        completed_at: Set((status == TransactionStatus::Completed).then_some(now)),
        ..Default::default()
    };

    record.insert(db).await.map_err(Into::into)
}

/// Parameters for one atomic wallet mutation.
struct Mutation {
    user_id: i64,
    /// Signed change to the balance column
    balance_delta: i64,
    /// Signed change to the kind's running total (refunds subtract)
    total_delta: i64,
    kind: TransactionKind,
    /// Signed amount recorded on the transaction
    recorded_amount: i64,
    fee: i64,
    status: TransactionStatus,
    counterparty_id: Option<i64>,
    external_ref: Option<String>,
    metadata: Option<TransactionMetadata>,
}

/// Applies one mutation: atomic balance update (conditionally guarded for
/// debits) plus the transaction record, inside one storage transaction.
async fn apply(db: &DatabaseConnection, m: Mutation) -> Result<MutationOutcome> {
    let txn = db.begin().await?;

    let wallet_row = Wallet::find()
        .filter(wallet::Column::UserId.eq(m.user_id))
        .one(&txn)
        .await?
        .ok_or(Error::WalletNotFound { user_id: m.user_id })?;

    // Atomic update: `balance = balance + delta`, guarded so a debit can
    // never take the balance below zero even under concurrent mutations.
    let mut update = Wallet::update_many()
        .col_expr(
            wallet::Column::Balance,
            Expr::col(wallet::Column::Balance).add(m.balance_delta),
        )
        .col_expr(
            wallet::Column::LastActivity,
            Expr::value(sea_orm::Value::from(Utc::now())),
        )
        .filter(wallet::Column::UserId.eq(m.user_id));

    if let Some(total) = total_column(m.kind) {
        update = update.col_expr(total, Expr::col(total).add(m.total_delta));
    }

    if m.balance_delta < 0 {
        update = update.filter(wallet::Column::Balance.gte(-m.balance_delta));
    }

    let result = update.exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(Error::InsufficientBalance {
            available: wallet_row.balance,
            required: -m.balance_delta,
        });
    }

    let record = insert_transaction(
        &txn,
        m.user_id,
        m.kind,
        m.recorded_amount,
        m.fee,
        &wallet_row.currency,
        m.status,
        m.counterparty_id,
        m.external_ref,
        m.metadata.as_ref(),
    )
    .await?;

    let updated = Wallet::find()
        .filter(wallet::Column::UserId.eq(m.user_id))
        .one(&txn)
        .await?
        .ok_or(Error::WalletNotFound { user_id: m.user_id })?;

    txn.commit().await?;

    Ok(MutationOutcome {
        new_balance: updated.balance,
        transaction_id: record.id,
    })
}

/// Atomically increases the wallet balance and records a completed
/// transaction. Fails with `WalletNotFound` when no wallet exists; callers
/// that want lazy creation must `ensure_wallet` first.
///
/// # Errors
/// `InvalidAmount` when `amount <= 0`, `WalletNotFound` when absent.
pub async fn credit(
    db: &DatabaseConnection,
    user_id: i64,
    amount: i64,
    kind: TransactionKind,
    counterparty_id: Option<i64>,
    external_ref: Option<String>,
    metadata: Option<TransactionMetadata>,
) -> Result<MutationOutcome> {
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }

    apply(
        db,
        Mutation {
            user_id,
            balance_delta: amount,
            total_delta: amount,
            kind,
            recorded_amount: amount,
            fee: 0,
            status: TransactionStatus::Completed,
            counterparty_id,
            external_ref,
            metadata,
        },
    )
    .await
}

/// Atomically decreases the wallet balance and records a completed
/// transaction with `net_amount = amount - fee`.
///
/// # Errors
/// `InvalidAmount` when `amount <= 0`, `WalletNotFound` when absent,
/// `InsufficientBalance` when the guarded update matches no row.
#[allow(clippy::too_many_arguments)]
pub async fn debit(
    db: &DatabaseConnection,
    user_id: i64,
    amount: i64,
    kind: TransactionKind,
    fee: i64,
    counterparty_id: Option<i64>,
    external_ref: Option<String>,
    metadata: Option<TransactionMetadata>,
) -> Result<MutationOutcome> {
    debit_with_status(
        db,
        user_id,
        amount,
        kind,
        fee,
        TransactionStatus::Completed,
        counterparty_id,
        external_ref,
        metadata,
    )
    .await
}

/// Like [`debit`] but records the transaction as `Pending`. Used by
/// withdrawals, where funds leave the wallet immediately but settlement waits
/// for the gateway webhook.
#[allow(clippy::too_many_arguments)]
pub async fn debit_pending(
    db: &DatabaseConnection,
    user_id: i64,
    amount: i64,
    kind: TransactionKind,
    fee: i64,
    external_ref: Option<String>,
    metadata: Option<TransactionMetadata>,
) -> Result<MutationOutcome> {
    debit_with_status(
        db,
        user_id,
        amount,
        kind,
        fee,
        TransactionStatus::Pending,
        None,
        external_ref,
        metadata,
    )
    .await
}

#[allow(clippy::too_many_arguments)]
async fn debit_with_status(
    db: &DatabaseConnection,
    user_id: i64,
    amount: i64,
    kind: TransactionKind,
    fee: i64,
    status: TransactionStatus,
    counterparty_id: Option<i64>,
    external_ref: Option<String>,
    metadata: Option<TransactionMetadata>,
) -> Result<MutationOutcome> {
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }

    apply(
        db,
        Mutation {
            user_id,
            balance_delta: -amount,
            total_delta: amount,
            kind,
            recorded_amount: -amount,
            fee,
            status,
            counterparty_id,
            external_ref,
            metadata,
        },
    )
    .await
}

/// Compensating credit that reverses an earlier debit of `kind`. The balance
/// comes back and the kind's running total is reduced again, so per-kind
/// totals stay gross volumes and signed sums net to zero.
pub async fn refund(
    db: &DatabaseConnection,
    user_id: i64,
    amount: i64,
    kind: TransactionKind,
    reverses_ref: String,
) -> Result<MutationOutcome> {
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }

    apply(
        db,
        Mutation {
            user_id,
            balance_delta: amount,
            total_delta: -amount,
            kind,
            recorded_amount: amount,
            fee: 0,
            status: TransactionStatus::Completed,
            counterparty_id: None,
            external_ref: Some(reverses_ref.clone()),
            metadata: Some(TransactionMetadata::Refund { reverses_ref }),
        },
    )
    .await
}

/// Writes the standalone fee transaction for a transfer. Audit record only:
/// the fee was already withheld inside the gross debit, so no balance or
/// running total changes here.
pub async fn record_fee(
    db: &DatabaseConnection,
    user_id: i64,
    fee: i64,
    currency: &str,
    counterparty_id: Option<i64>,
    transfer_ref: String,
) -> Result<transaction::Model> {
    insert_transaction(
        db,
        user_id,
        TransactionKind::Fee,
        fee,
        0,
        currency,
        TransactionStatus::Completed,
        counterparty_id,
        Some(transfer_ref),
        None,
    )
    .await
}
