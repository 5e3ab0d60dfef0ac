//! Transaction entity - Immutable append-only ledger records.
//!
//! Every balance-affecting event writes exactly one transaction per wallet it
//! touches; a peer-to-peer transfer is therefore two records sharing a
//! correlating reference, plus a standalone fee record when a fee is
//! withheld. Once `status` is `Completed` the amount and kind never change.
//! Metadata is a closed tagged union per kind rather than a free-form bag.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ledger event category. Stored as a string column but closed at the type
/// level so every consumer matches exhaustively.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Funds arriving from the payment gateway
    #[sea_orm(string_value = "deposit")]
    Deposit,
    /// Funds leaving to the payment gateway
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
    /// Debit side of a tip
    #[sea_orm(string_value = "tip_sent")]
    TipSent,
    /// Credit side of a tip
    #[sea_orm(string_value = "tip_received")]
    TipReceived,
    /// Multi-level referral bonus credit
    #[sea_orm(string_value = "referral_bonus")]
    ReferralBonus,
    /// Platform fee withheld from a tip (audit record, no balance effect)
    #[sea_orm(string_value = "fee")]
    Fee,
}

/// Lifecycle state of a transaction record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Awaiting external confirmation (gateway webhook)
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Picked up but not yet settled
    #[sea_orm(string_value = "processing")]
    Processing,
    /// Settled; amount and kind are now immutable
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Terminally failed; any applied mutation was compensated
    #[sea_orm(string_value = "failed")]
    Failed,
    /// Cancelled before any mutation applied
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Typed per-kind metadata, serialised to JSON in the `metadata` column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum TransactionMetadata {
    /// Deposit via the payment gateway
    Deposit {
        /// Email the charge was initiated for
        payer_email: String,
    },
    /// Withdrawal payout
    Withdrawal {
        /// Destination account identifier at the gateway
        destination_account: String,
    },
    /// Either side of a tip transfer
    Tip {
        /// Correlating reference shared by both sides of the transfer
        transfer_ref: String,
        /// Whether the sender asked to stay anonymous
        anonymous: bool,
    },
    /// Referral bonus credit
    Referral {
        /// The newly registered user that triggered the cascade
        referred_id: i64,
        /// Cascade level (1..=3)
        level: i16,
    },
    /// Compensating reversal of an earlier mutation
    Refund {
        /// External or transfer reference of the reversed operation
        reverses_ref: String,
    },
}

impl TransactionMetadata {
    /// Serialises the metadata for storage in the text column.
    pub fn to_json(&self) -> crate::errors::Result<String> {
        serde_json::to_string(self).map_err(Into::into)
    }

    /// Parses metadata back out of the stored column value.
    pub fn from_json(raw: &str) -> crate::errors::Result<Self> {
        serde_json::from_str(raw).map_err(Into::into)
    }
}

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Event category
    pub kind: TransactionKind,
    /// Signed amount in minor units (negative for debits)
    pub amount: i64,
    /// Fee withheld, in minor units
    pub fee: i64,
    /// Amount net of fee, in minor units
    pub net_amount: i64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Lifecycle state
    pub status: TransactionStatus,
    /// The other party of a transfer, when there is one
    pub counterparty_id: Option<i64>,
    /// Gateway reference or transfer correlation id
    pub external_ref: Option<String>,
    /// JSON-serialised [`TransactionMetadata`]
    pub metadata: Option<String>,
    /// When the record was created
    pub created_at: DateTimeUtc,
    /// Last state change
    pub updated_at: DateTimeUtc,
    /// When the record reached `Completed`, if it has
    pub completed_at: Option<DateTimeUtc>,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one user
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
