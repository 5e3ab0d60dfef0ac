//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod referral;
pub mod tip;
pub mod transaction;
pub mod user;
pub mod wallet;
pub mod webhook_event;

// Re-export specific types to avoid conflicts
pub use referral::{Column as ReferralColumn, Entity as Referral, Model as ReferralModel};
pub use tip::{Column as TipColumn, Entity as Tip, Model as TipModel};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
pub use wallet::{Column as WalletColumn, Entity as Wallet, Model as WalletModel};
pub use webhook_event::{
    Column as WebhookEventColumn, Entity as WebhookEvent, Model as WebhookEventModel,
};
