//! User entity - Account records referenced by the wallet core.
//!
//! The core only reads users: `referral_code` and `referred_by` drive the
//! referral chain walk, and `created_at` feeds the 30-day eligibility check
//! for level-3 bonuses. Registration itself lives outside the core.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// WhatsApp phone number in E.164 form, the messaging identity
    pub phone: String,
    /// Display name shown in notifications
    pub display_name: String,
    /// Unique code this user hands out to invitees
    #[sea_orm(unique)]
    pub referral_code: String,
    /// User id of whoever referred this account, if anyone.
    /// A lookup key only, never an ownership edge.
    pub referred_by: Option<i64>,
    /// Whether KYC verification has completed
    pub kyc_verified: bool,
    /// Soft-delete flag; inactive users keep their records
    pub is_active: bool,
    /// Account creation time, used for referral eligibility
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each user has at most one wallet
    #[sea_orm(has_many = "super::wallet::Entity")]
    Wallets,
    /// One user has many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::wallet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wallets.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
