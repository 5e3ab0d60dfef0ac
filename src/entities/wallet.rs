//! Wallet entity - Per-user balance record plus running totals.
//!
//! One wallet per user, created lazily on first need and never hard-deleted.
//! `balance` is held in minor currency units (never floating point) and is
//! only ever mutated through the wallet engine primitive that also writes a
//! transaction record. Invariant: `balance >= 0` at all times.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Wallet database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    /// Unique identifier for the wallet
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user; exactly one wallet per user
    #[sea_orm(unique)]
    pub user_id: i64,
    /// Current balance in minor currency units
    pub balance: i64,
    /// ISO 4217 currency code (e.g. "NGN")
    pub currency: String,
    /// Lifetime gross deposits in minor units
    pub total_deposits: i64,
    /// Lifetime gross withdrawals in minor units
    pub total_withdrawals: i64,
    /// Lifetime gross tips sent in minor units
    pub total_tips_sent: i64,
    /// Lifetime net tips received in minor units
    pub total_tips_received: i64,
    /// Lifetime referral bonus earnings in minor units
    pub total_referral_earnings: i64,
    /// Timestamp of the last balance-affecting operation
    pub last_activity: DateTimeUtc,
    /// Soft-delete flag; deactivated wallets keep their history
    pub is_active: bool,
    /// When the wallet was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Wallet and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each wallet belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
