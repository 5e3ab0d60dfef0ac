//! Database configuration module.
//!
//! Handles the `SQLite` connection and table creation using `SeaORM`. Tables
//! are generated straight from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL.

use crate::entities::{Referral, Tip, Transaction, User, Wallet, WebhookEvent};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Gets the database URL from the environment or the default `SQLite` path.
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/pochi.sqlite".to_string())
}

/// Establishes a connection using `DATABASE_URL`, falling back to a local
/// `SQLite` file when the variable is not set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    Database::connect(get_database_url()).await.map_err(Into::into)
}

/// Creates all tables the wallet core needs: users, wallets, transactions,
/// tips, referrals, and the webhook de-duplication ledger.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut user_table = schema.create_table_from_entity(User);
    let mut wallet_table = schema.create_table_from_entity(Wallet);
    let mut transaction_table = schema.create_table_from_entity(Transaction);
    let mut tip_table = schema.create_table_from_entity(Tip);
    let mut referral_table = schema.create_table_from_entity(Referral);
    let mut webhook_table = schema.create_table_from_entity(WebhookEvent);

    db.execute(builder.build(user_table.if_not_exists())).await?;
    db.execute(builder.build(wallet_table.if_not_exists())).await?;
    db.execute(builder.build(transaction_table.if_not_exists()))
        .await?;
    db.execute(builder.build(tip_table.if_not_exists())).await?;
    db.execute(builder.build(referral_table.if_not_exists())).await?;
    db.execute(builder.build(webhook_table.if_not_exists())).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{UserModel, WalletModel};
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Tables exist if we can query them
        let _: Vec<UserModel> = User::find().limit(1).all(&db).await?;
        let _: Vec<WalletModel> = Wallet::find().limit(1).all(&db).await?;
        let _ = Transaction::find().limit(1).all(&db).await?;
        let _ = Tip::find().limit(1).all(&db).await?;
        let _ = Referral::find().limit(1).all(&db).await?;
        let _ = WebhookEvent::find().limit(1).all(&db).await?;

        Ok(())
    }
}
