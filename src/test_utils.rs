//! Shared test utilities.
//!
//! Helpers for setting up in-memory test databases, creating users and
//! funded wallets, and a programmable mock payment gateway.

use crate::{
    config::WalletSettings,
    core::wallet,
    entities::{transaction::TransactionKind, user},
    errors::{Error, Result},
    services::gateway::{ChargeInit, PaymentGateway, PayoutInit, VerifiedTransaction},
};
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Default settings used across tests (the production defaults).
pub fn test_settings() -> WalletSettings {
    WalletSettings::default()
}

/// Creates a test user registered just now.
pub async fn create_test_user(
    db: &DatabaseConnection,
    name: &str,
    referred_by: Option<i64>,
) -> Result<user::Model> {
    create_user_with_age(db, name, referred_by, 0).await
}

/// Creates a test user whose account is `age_days` old. Used for the
/// referral eligibility tests.
pub async fn create_user_with_age(
    db: &DatabaseConnection,
    name: &str,
    referred_by: Option<i64>,
    age_days: i64,
) -> Result<user::Model> {
    let created_at = Utc::now() - Duration::days(age_days);
    let record = user::ActiveModel {
        phone: Set(format!("+234700{name}")),
        display_name: Set(name.to_string()),
        referral_code: Set(format!("REF-{}", name.to_uppercase())),
        referred_by: Set(referred_by),
        kyc_verified: Set(true),
        is_active: Set(true),
        created_at: Set(created_at),
        ..Default::default()
    };
    record.insert(db).await.map_err(Into::into)
}

/// Sets up a database plus one user holding a wallet with the given balance.
/// The balance is seeded through a real deposit credit so a transaction
/// record exists for it.
pub async fn setup_with_wallet(
    name: &str,
    initial_balance: i64,
) -> Result<(DatabaseConnection, user::Model)> {
    let db = setup_test_db().await?;
    let user = create_test_user(&db, name, None).await?;
    wallet::ensure_wallet(&db, user.id, "NGN").await?;
    if initial_balance > 0 {
        wallet::credit(
            &db,
            user.id,
            initial_balance,
            TransactionKind::Deposit,
            None,
            None,
            None,
        )
        .await?;
    }
    Ok((db, user))
}

/// Mock payment gateway. Charges always succeed; payouts can be programmed
/// to be rejected.
#[derive(Debug, Default)]
pub struct MockGateway {
    reject_payouts: Option<String>,
}

impl MockGateway {
    /// A gateway that rejects every payout with the given reason.
    pub fn rejecting_payouts(reason: &str) -> Self {
        Self {
            reject_payouts: Some(reason.to_string()),
        }
    }
}

impl PaymentGateway for MockGateway {
    async fn initiate_charge(
        &self,
        _amount: i64,
        _payer_email: &str,
        reference: &str,
    ) -> Result<ChargeInit> {
        Ok(ChargeInit {
            redirect_url: format!("https://gateway.test/pay/{reference}"),
            reference: reference.to_string(),
        })
    }

    async fn initiate_payout(
        &self,
        _amount: i64,
        _destination_account: &str,
        _reference: &str,
    ) -> Result<PayoutInit> {
        match &self.reject_payouts {
            Some(reason) => Err(Error::GatewayRejected {
                reason: reason.clone(),
            }),
            None => Ok(PayoutInit {
                status: "queued".to_string(),
            }),
        }
    }

    async fn verify(&self, _reference: &str) -> Result<VerifiedTransaction> {
        Ok(VerifiedTransaction {
            status: "success".to_string(),
            amount: 0,
        })
    }
}
