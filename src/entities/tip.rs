//! Tip entity - Denormalised record of one peer-to-peer gift.
//!
//! Backed by a pair of transactions (sender's `tip_sent`, recipient's
//! `tip_received`) sharing a transfer reference; the tip row exists for query
//! convenience. Anonymity is a presentation concern only: the real sender id
//! is always retained here.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Final state of a tip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum TipStatus {
    /// Both mutations settled
    #[sea_orm(string_value = "completed")]
    Completed,
    /// The credit half failed and the sender was refunded
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// Surface a tip originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    /// WhatsApp bot command
    #[sea_orm(string_value = "whatsapp")]
    Whatsapp,
    /// Mobile/web app
    #[sea_orm(string_value = "app")]
    App,
    /// External tipping link
    #[sea_orm(string_value = "external")]
    External,
}

/// Tip database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tips")]
pub struct Model {
    /// Unique identifier for the tip
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Sending user; None for anonymous external tips with no account
    pub sender_id: Option<i64>,
    /// Receiving user
    pub recipient_id: i64,
    /// Gross amount debited from the sender, minor units
    pub gross_amount: i64,
    /// Platform fee withheld, minor units
    pub fee: i64,
    /// Net amount credited to the recipient, minor units
    pub net_amount: i64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Whether the sender's identity is hidden from the recipient
    pub anonymous: bool,
    /// Final state
    pub status: TipStatus,
    /// Originating surface
    pub platform: Platform,
    /// Optional message shown to the recipient
    pub message: Option<String>,
    /// Correlating reference shared with the transaction pair
    pub transfer_ref: String,
    /// When the tip was settled
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Tip and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
