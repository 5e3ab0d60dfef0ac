//! Limit and validation policy.
//!
//! Per-operation bounds (minimum, maximum, rolling daily cap) checked before
//! any mutation. The daily total is the signed sum of same-kind transactions
//! created since UTC midnight, taken in the kind's own direction; failed and
//! cancelled records do not count, pending ones do (a pending withdrawal
//! already holds funds), and a compensating refund gives its amount back.

use crate::{
    config::{LimitBounds, WalletSettings},
    entities::{
        Transaction, transaction,
        transaction::{TransactionKind, TransactionStatus},
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{DatabaseConnection, prelude::*};

/// Returns the bounds governing a transaction kind, or None for kinds that
/// have no limit policy (fees, bonuses, tip credits).
pub const fn bounds_for(settings: &WalletSettings, kind: TransactionKind) -> Option<&LimitBounds> {
    match kind {
        TransactionKind::TipSent => Some(&settings.tip_limits),
        TransactionKind::Withdrawal => Some(&settings.withdrawal_limits),
        TransactionKind::Deposit => Some(&settings.deposit_limits),
        TransactionKind::TipReceived
        | TransactionKind::ReferralBonus
        | TransactionKind::Fee => None,
    }
}

/// Stateless bound check. `recent` is the user's same-kind transaction
/// history for the current day; the first violated bound is reported.
///
/// # Errors
/// `LimitExceeded` naming the violated bound.
pub fn validate(
    settings: &WalletSettings,
    amount: i64,
    kind: TransactionKind,
    recent: &[transaction::Model],
) -> Result<()> {
    let Some(bounds) = bounds_for(settings, kind) else {
        return Ok(());
    };

    if amount < bounds.min {
        return Err(Error::LimitExceeded {
            bound: format!("minimum amount is {}", bounds.min),
        });
    }

    if amount > bounds.max {
        return Err(Error::LimitExceeded {
            bound: format!("maximum amount is {}", bounds.max),
        });
    }

    // Compensating refunds reuse the kind with the opposite sign, so the
    // signed sum in the kind's own direction lets a refunded operation give
    // its amount back to the day's headroom.
    let today_total: i64 = recent
        .iter()
        .filter(|t| {
            t.kind == kind
                && !matches!(
                    t.status,
                    TransactionStatus::Failed | TransactionStatus::Cancelled
                )
        })
        .map(|t| match kind {
            TransactionKind::Deposit => t.amount,
            _ => -t.amount,
        })
        .sum::<i64>()
        .max(0);

    if today_total + amount > bounds.daily_cap {
        return Err(Error::LimitExceeded {
            bound: format!(
                "daily cap is {} ({} already used today)",
                bounds.daily_cap, today_total
            ),
        });
    }

    Ok(())
}

/// Fetches today's same-kind transactions for the user and runs [`validate`].
pub async fn validate_for_user(
    db: &DatabaseConnection,
    settings: &WalletSettings,
    user_id: i64,
    amount: i64,
    kind: TransactionKind,
) -> Result<()> {
    if bounds_for(settings, kind).is_none() {
        return Ok(());
    }

    let midnight = Utc::now()
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map_or_else(Utc::now, |naive| naive.and_utc());

    let recent = Transaction::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .filter(transaction::Column::Kind.eq(kind))
        .filter(transaction::Column::CreatedAt.gte(midnight))
        .all(db)
        .await?;

    validate(settings, amount, kind, &recent)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::wallet;
    use crate::test_utils::*;

    fn settings() -> WalletSettings {
        WalletSettings::default()
    }

    #[test]
    fn test_tip_below_minimum() {
        let result = validate(&settings(), 5, TransactionKind::TipSent, &[]);
        let err = result.unwrap_err();
        assert!(matches!(&err, Error::LimitExceeded { bound } if bound.contains("minimum")));
    }

    #[test]
    fn test_tip_above_maximum() {
        let result = validate(&settings(), 60_000, TransactionKind::TipSent, &[]);
        let err = result.unwrap_err();
        assert!(matches!(&err, Error::LimitExceeded { bound } if bound.contains("maximum")));
    }

    #[test]
    fn test_tip_within_bounds() {
        assert!(validate(&settings(), 500, TransactionKind::TipSent, &[]).is_ok());
        assert!(validate(&settings(), 10, TransactionKind::TipSent, &[]).is_ok());
        assert!(validate(&settings(), 50_000, TransactionKind::TipSent, &[]).is_ok());
    }

    #[test]
    fn test_unlimited_kinds_always_pass() {
        assert!(validate(&settings(), 1, TransactionKind::ReferralBonus, &[]).is_ok());
        assert!(validate(&settings(), i64::MAX, TransactionKind::Fee, &[]).is_ok());
    }

    #[tokio::test]
    async fn test_withdrawal_daily_cap() -> Result<()> {
        // 850_000 withdrawn today; a further 200_000 busts the 1_000_000 cap.
        let (db, user) = setup_with_wallet("walt", 5_000_000).await?;

        wallet::debit(
            &db,
            user.id,
            850_000,
            TransactionKind::Withdrawal,
            0,
            None,
            None,
            None,
        )
        .await?;

        let result =
            validate_for_user(&db, &settings(), user.id, 200_000, TransactionKind::Withdrawal)
                .await;
        let err = result.unwrap_err();
        assert!(matches!(&err, Error::LimitExceeded { bound } if bound.contains("daily cap")));

        // 150_000 still fits
        validate_for_user(&db, &settings(), user.id, 150_000, TransactionKind::Withdrawal)
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_refund_restores_daily_headroom() -> Result<()> {
        let (db, user) = setup_with_wallet("rita", 5_000_000).await?;

        wallet::debit(
            &db,
            user.id,
            400_000,
            TransactionKind::Withdrawal,
            0,
            None,
            Some("wd_r".to_string()),
            None,
        )
        .await?;
        wallet::refund(&db, user.id, 400_000, TransactionKind::Withdrawal, "wd_r".to_string())
            .await?;

        // The refunded withdrawal nets to zero against the cap, so the full
        // single-operation maximum is still available today.
        validate_for_user(&db, &settings(), user.id, 500_000, TransactionKind::Withdrawal)
            .await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_daily_cap_ignores_other_kinds_and_users() -> Result<()> {
        let (db, user) = setup_with_wallet("wren", 5_000_000).await?;
        let other = create_test_user(&db, "zoe", None).await?;
        wallet::ensure_wallet(&db, other.id, "NGN").await?;
        wallet::credit(
            &db,
            other.id,
            1_000_000,
            TransactionKind::Deposit,
            None,
            None,
            None,
        )
        .await?;

        // Other user's withdrawals do not count against this user
        wallet::debit(
            &db,
            other.id,
            900_000,
            TransactionKind::Withdrawal,
            0,
            None,
            None,
            None,
        )
        .await?;

        validate_for_user(&db, &settings(), user.id, 500_000, TransactionKind::Withdrawal)
            .await?;

        // This user's deposits do not count against withdrawals either
        validate_for_user(&db, &settings(), user.id, 500_000, TransactionKind::Withdrawal)
            .await?;
        Ok(())
    }
}
