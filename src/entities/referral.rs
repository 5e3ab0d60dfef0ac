//! Referral entity - One bonus payout per (referrer, referred, level).
//!
//! Level 1 is created when a registration names a valid referral code; levels
//! 2 and 3 are created by the cascade only after the level below completed.
//! A `pending` row means the wallet credit has not succeeded yet and the
//! background sweep will retry it.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub use super::tip::Platform;

/// Settlement state of a referral bonus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    /// Bonus credit not yet applied; retried by the sweep
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Bonus credited to the referrer's wallet
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Bonus withdrawn (abuse, reversal)
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Referral database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "referrals")]
pub struct Model {
    /// Unique identifier for the referral record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// User receiving the bonus
    pub referrer_id: i64,
    /// Newly registered user that triggered the cascade
    pub referred_id: i64,
    /// Cascade level, 1..=3
    pub level: i16,
    /// Bonus amount in minor units
    pub bonus_amount: i64,
    /// Settlement state
    pub status: ReferralStatus,
    /// Referral code used at registration
    pub referral_code: String,
    /// Surface the registration came from
    pub platform: Platform,
    /// Back-reference to the bonus credit transaction once settled
    pub bonus_transaction_id: Option<i64>,
    /// When the bonus credit completed
    pub completed_at: Option<DateTimeUtc>,
    /// When the record was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Referral and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
