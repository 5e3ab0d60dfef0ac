//! Referral cascade - Multi-level bonus propagation up the inviter chain.
//!
//! When a registration names a valid referrer, bonuses walk the chain up to
//! three levels. Levels settle strictly in order: a level's bonus must be
//! recorded as completed before the next level is attempted, and a failed
//! credit leaves its record pending for the background sweep without rolling
//! back lower levels. Level 3 additionally requires the level-2 referrer's
//! account to be at least 30 days old; an ineligible chain terminates
//! silently with no level-3 record at all.

use crate::{
    config::WalletSettings,
    core::wallet,
    entities::{
        Referral, User, referral,
        referral::{Platform, ReferralStatus},
        transaction::{TransactionKind, TransactionMetadata},
        user,
    },
    errors::{Error, Result},
};
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, IntoActiveModel, Set, prelude::*};
use tracing::{info, warn};

/// What a cascade invocation settled.
#[derive(Debug, Clone, Default)]
pub struct CascadeOutcome {
    /// Referral records completed by this invocation, lowest level first
    pub completed: Vec<referral::Model>,
}

/// Whether a referral record already exists for the pair, at any level.
pub async fn referral_exists(
    db: &DatabaseConnection,
    referrer_id: i64,
    referred_id: i64,
) -> Result<bool> {
    let existing = Referral::find()
        .filter(referral::Column::ReferrerId.eq(referrer_id))
        .filter(referral::Column::ReferredId.eq(referred_id))
        .one(db)
        .await?;
    Ok(existing.is_some())
}

/// Creates a pending referral record, enforcing (referrer, referred)
/// uniqueness.
///
/// # Errors
/// `ReferralAlreadyExists` when the pair is already recorded.
pub async fn create_referral(
    db: &DatabaseConnection,
    referrer_id: i64,
    referred_id: i64,
    level: i16,
    bonus_amount: i64,
    referral_code: &str,
    platform: Platform,
) -> Result<referral::Model> {
    if referral_exists(db, referrer_id, referred_id).await? {
        return Err(Error::ReferralAlreadyExists {
            referrer_id,
            referred_id,
        });
    }

    let record = referral::ActiveModel {
        referrer_id: Set(referrer_id),
        referred_id: Set(referred_id),
        level: Set(level),
        bonus_amount: Set(bonus_amount),
        status: Set(ReferralStatus::Pending),
        referral_code: Set(referral_code.to_string()),
        platform: Set(platform),
        bonus_transaction_id: Set(None),
        completed_at: Set(None),
        created_at: Set(Utc::now()),
        ..Default::default()
    };

    record.insert(db).await.map_err(Into::into)
}

/// Runs the referral cascade for a newly registered user.
///
/// Idempotent: a second invocation for the same registration finds the
/// existing level-1 record and returns without creating anything.
pub async fn settle_registration(
    db: &DatabaseConnection,
    settings: &WalletSettings,
    referred_user_id: i64,
    platform: Platform,
) -> Result<CascadeOutcome> {
    let referred = find_user(db, referred_user_id).await?;

    let Some(r1_id) = referred.referred_by else {
        return Ok(CascadeOutcome::default());
    };
    let r1 = find_user(db, r1_id).await?;

    // Invoked twice for the same registration event: the first run already
    // recorded level 1, so there is nothing left to do.
    if referral_exists(db, r1.id, referred_user_id).await? {
        return Ok(CascadeOutcome::default());
    }

    let mut outcome = CascadeOutcome::default();

    // Level 1
    let Some(level1) =
        settle_level(db, settings, &r1, referred_user_id, 1, platform).await?
    else {
        return Ok(outcome);
    };
    outcome.completed.push(level1);

    // Level 2: the referrer's own referrer, if any
    let Some(r2_id) = r1.referred_by else {
        return Ok(outcome);
    };
    let r2 = find_user(db, r2_id).await?;
    let Some(level2) =
        settle_level(db, settings, &r2, referred_user_id, 2, platform).await?
    else {
        return Ok(outcome);
    };
    outcome.completed.push(level2);

    // Level 3: gated on the level-2 referrer's account age. An ineligible
    // chain terminates with no level-3 record, not even a pending one.
    let Some(r3_id) = r2.referred_by else {
        return Ok(outcome);
    };
    let min_age = Duration::days(settings.level3_min_referrer_age_days);
    if r2.created_at > Utc::now() - min_age {
        info!(
            referrer_id = r2.id,
            referred_id = referred_user_id,
            "Level-3 bonus skipped: intermediate referrer account too young"
        );
        return Ok(outcome);
    }
    let r3 = find_user(db, r3_id).await?;
    if let Some(level3) =
        settle_level(db, settings, &r3, referred_user_id, 3, platform).await?
    {
        outcome.completed.push(level3);
    }

    Ok(outcome)
}

/// Creates one level's referral record and credits the bonus. Returns None
/// when the credit failed; the record stays pending for the sweep and the
/// cascade must not progress further.
async fn settle_level(
    db: &DatabaseConnection,
    settings: &WalletSettings,
    referrer: &user::Model,
    referred_id: i64,
    level: i16,
    platform: Platform,
) -> Result<Option<referral::Model>> {
    let bonus = settings.referral_bonuses[usize::from(level.unsigned_abs()) - 1];
    let record = create_referral(
        db,
        referrer.id,
        referred_id,
        level,
        bonus,
        &referrer.referral_code,
        platform,
    )
    .await?;

    // Bonus recipients may predate wallets; this is their first need.
    wallet::ensure_wallet(db, referrer.id, &settings.currency).await?;

    match credit_bonus(db, &record).await {
        Ok(completed) => Ok(Some(completed)),
        Err(e) => {
            warn!(
                referral_id = record.id,
                referrer_id = referrer.id,
                level,
                error = %e,
                "Referral bonus credit failed, leaving record pending"
            );
            Ok(None)
        }
    }
}

/// Credits one pending referral's bonus and marks the record completed with
/// a back-reference to the bonus transaction.
async fn credit_bonus(
    db: &DatabaseConnection,
    record: &referral::Model,
) -> Result<referral::Model> {
    let outcome = wallet::credit(
        db,
        record.referrer_id,
        record.bonus_amount,
        TransactionKind::ReferralBonus,
        Some(record.referred_id),
        None,
        Some(TransactionMetadata::Referral {
            referred_id: record.referred_id,
            level: record.level,
        }),
    )
    .await?;

    let mut active = record.clone().into_active_model();
    active.status = Set(ReferralStatus::Completed);
    active.bonus_transaction_id = Set(Some(outcome.transaction_id));
    active.completed_at = Set(Some(Utc::now()));
    active.update(db).await.map_err(Into::into)
}

/// Background sweep: retries the wallet credit for every referral left in
/// `pending` status. Returns the number of referrals settled.
pub async fn process_pending_referrals(
    db: &DatabaseConnection,
    settings: &WalletSettings,
) -> Result<usize> {
    let pending = Referral::find()
        .filter(referral::Column::Status.eq(ReferralStatus::Pending))
        .all(db)
        .await?;

    let mut settled = 0;
    for record in pending {
        wallet::ensure_wallet(db, record.referrer_id, &settings.currency).await?;
        match credit_bonus(db, &record).await {
            Ok(_) => settled += 1,
            Err(e) => {
                warn!(
                    referral_id = record.id,
                    error = %e,
                    "Pending referral bonus retry failed"
                );
            }
        }
    }

    if settled > 0 {
        info!(settled, "Pending referral bonuses settled");
    }
    Ok(settled)
}

async fn find_user(db: &DatabaseConnection, user_id: i64) -> Result<user::Model> {
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::Config {
            message: format!("User {user_id} not found"),
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::wallet::get_wallet;
    use crate::test_utils::*;

    async fn referrals_for(db: &DatabaseConnection, referred_id: i64) -> Vec<referral::Model> {
        Referral::find()
            .filter(referral::Column::ReferredId.eq(referred_id))
            .all(db)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_full_three_level_cascade() -> Result<()> {
        let db = setup_test_db().await?;
        let r3 = create_user_with_age(&db, "great", None, 90).await?;
        let r2 = create_user_with_age(&db, "grand", Some(r3.id), 60).await?;
        let r1 = create_user_with_age(&db, "parent", Some(r2.id), 40).await?;
        let newbie = create_test_user(&db, "newbie", Some(r1.id)).await?;

        let outcome =
            settle_registration(&db, &test_settings(), newbie.id, Platform::Whatsapp).await?;
        assert_eq!(outcome.completed.len(), 3);
        assert_eq!(outcome.completed[0].level, 1);
        assert_eq!(outcome.completed[2].level, 3);

        assert_eq!(get_wallet(&db, r1.id).await?.unwrap().balance, 100);
        assert_eq!(get_wallet(&db, r2.id).await?.unwrap().balance, 50);
        assert_eq!(get_wallet(&db, r3.id).await?.unwrap().balance, 25);
        assert_eq!(
            get_wallet(&db, r1.id).await?.unwrap().total_referral_earnings,
            100
        );

        let records = referrals_for(&db, newbie.id).await;
        assert_eq!(records.len(), 3);
        assert!(records
            .iter()
            .all(|r| r.status == ReferralStatus::Completed));
        assert!(records.iter().all(|r| r.bonus_transaction_id.is_some()));
        Ok(())
    }

    #[tokio::test]
    async fn test_level3_skipped_when_intermediate_referrer_too_young() -> Result<()> {
        // R1 is 40 days old, R2 only 10: levels 1 and 2 pay out, level 3 is
        // never created because eligibility is evaluated on R2's age.
        let db = setup_test_db().await?;
        let r3 = create_user_with_age(&db, "elder", None, 200).await?;
        let r2 = create_user_with_age(&db, "young", Some(r3.id), 10).await?;
        let r1 = create_user_with_age(&db, "mid", Some(r2.id), 40).await?;
        let newbie = create_test_user(&db, "fresh", Some(r1.id)).await?;

        let outcome =
            settle_registration(&db, &test_settings(), newbie.id, Platform::Whatsapp).await?;
        assert_eq!(outcome.completed.len(), 2);

        assert_eq!(get_wallet(&db, r1.id).await?.unwrap().balance, 100);
        assert_eq!(get_wallet(&db, r2.id).await?.unwrap().balance, 50);
        assert!(get_wallet(&db, r3.id).await?.is_none());

        let records = referrals_for(&db, newbie.id).await;
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.level <= 2));
        Ok(())
    }

    #[tokio::test]
    async fn test_level3_paid_when_intermediate_referrer_old_enough() -> Result<()> {
        let db = setup_test_db().await?;
        let r3 = create_user_with_age(&db, "elder2", None, 200).await?;
        let r2 = create_user_with_age(&db, "exactly", Some(r3.id), 31).await?;
        let r1 = create_user_with_age(&db, "mid2", Some(r2.id), 40).await?;
        let newbie = create_test_user(&db, "fresh2", Some(r1.id)).await?;

        let outcome =
            settle_registration(&db, &test_settings(), newbie.id, Platform::App).await?;
        assert_eq!(outcome.completed.len(), 3);
        assert_eq!(get_wallet(&db, r3.id).await?.unwrap().balance, 25);
        Ok(())
    }

    #[tokio::test]
    async fn test_cascade_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let r1 = create_user_with_age(&db, "solo_ref", None, 40).await?;
        let newbie = create_test_user(&db, "repeat", Some(r1.id)).await?;

        let first =
            settle_registration(&db, &test_settings(), newbie.id, Platform::Whatsapp).await?;
        assert_eq!(first.completed.len(), 1);

        let second =
            settle_registration(&db, &test_settings(), newbie.id, Platform::Whatsapp).await?;
        assert!(second.completed.is_empty());

        // Exactly one level-1 record, credited exactly once
        let records = referrals_for(&db, newbie.id).await;
        assert_eq!(records.len(), 1);
        assert_eq!(get_wallet(&db, r1.id).await?.unwrap().balance, 100);
        Ok(())
    }

    #[tokio::test]
    async fn test_no_referrer_means_no_records() -> Result<()> {
        let db = setup_test_db().await?;
        let loner = create_test_user(&db, "loner", None).await?;

        let outcome =
            settle_registration(&db, &test_settings(), loner.id, Platform::Whatsapp).await?;
        assert!(outcome.completed.is_empty());
        assert!(referrals_for(&db, loner.id).await.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_create_referral_rejects_duplicate_pair() -> Result<()> {
        let db = setup_test_db().await?;
        let r1 = create_test_user(&db, "dup_ref", None).await?;
        let newbie = create_test_user(&db, "dup_new", Some(r1.id)).await?;

        create_referral(&db, r1.id, newbie.id, 1, 100, "CODE1", Platform::Whatsapp).await?;
        let result =
            create_referral(&db, r1.id, newbie.id, 1, 100, "CODE1", Platform::Whatsapp).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::ReferralAlreadyExists { .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_pending_sweep_settles_bonus() -> Result<()> {
        let db = setup_test_db().await?;
        let r1 = create_test_user(&db, "waiting", None).await?;
        let newbie = create_test_user(&db, "cause", Some(r1.id)).await?;

        // A referral stuck in pending, e.g. from an earlier failed credit
        let record =
            create_referral(&db, r1.id, newbie.id, 1, 100, "CODEX", Platform::Whatsapp).await?;
        assert_eq!(record.status, ReferralStatus::Pending);

        let settled = process_pending_referrals(&db, &test_settings()).await?;
        assert_eq!(settled, 1);

        let refreshed = Referral::find_by_id(record.id).one(&db).await?.unwrap();
        assert_eq!(refreshed.status, ReferralStatus::Completed);
        assert!(refreshed.bonus_transaction_id.is_some());
        assert_eq!(get_wallet(&db, r1.id).await?.unwrap().balance, 100);

        // Second sweep finds nothing to do
        assert_eq!(process_pending_referrals(&db, &test_settings()).await?, 0);
        Ok(())
    }
}
