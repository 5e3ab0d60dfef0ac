//! Webhook event entity - De-duplication ledger for gateway callbacks.
//!
//! One row per (reference, event type) the core has accepted. A redelivered
//! webhook that matches an existing row is ignored without touching the
//! ledger.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Webhook event database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "webhook_events")]
pub struct Model {
    /// Unique identifier for the delivery record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Gateway transaction reference
    pub reference: String,
    /// Event type as delivered (e.g. `"charge.success"`)
    pub event_type: String,
    /// When the event was first accepted
    pub received_at: DateTimeUtc,
}

/// Defines relationships between WebhookEvent and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
