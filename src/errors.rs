//! Unified error types for the wallet core.
//!
//! Every public operation returns [`Result`]; validation failures carry enough
//! context for the caller to render a human-readable reason. `PartialFailure`
//! marks a mutation that committed without its follow-up step and therefore
//! needs out-of-band reconciliation.

use thiserror::Error;

/// Error taxonomy for wallet, tip, referral, and gateway operations.
#[derive(Debug, Error)]
pub enum Error {
    /// No wallet exists for the user; callers must `ensure_wallet` first.
    #[error("No wallet found for user {user_id}")]
    WalletNotFound {
        /// User whose wallet was looked up
        user_id: i64,
    },

    /// The wallet balance cannot cover the requested debit.
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance {
        /// Balance at the time of the attempt, in minor units
        available: i64,
        /// Amount the operation needed, in minor units
        required: i64,
    },

    /// Sender and recipient of a tip are the same user.
    #[error("You cannot tip yourself")]
    SelfTipNotAllowed,

    /// A limit policy bound was violated; `bound` names which one.
    #[error("Limit exceeded: {bound}")]
    LimitExceeded {
        /// Description of the violated bound
        bound: String,
    },

    /// A referral record already exists for this (referrer, referred) pair.
    #[error("Referral already recorded for referrer {referrer_id} and user {referred_id}")]
    ReferralAlreadyExists {
        /// Referrer side of the pair
        referrer_id: i64,
        /// Referred side of the pair
        referred_id: i64,
    },

    /// Zero or negative amount passed to a mutation primitive.
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount, in minor units
        amount: i64,
    },

    /// The payment gateway refused an operation.
    #[error("Payment gateway rejected the request: {reason}")]
    GatewayRejected {
        /// Gateway-supplied reason
        reason: String,
    },

    /// A mutation committed but a follow-up step did not; needs reconciliation.
    #[error("Partial failure, reconciliation required: {detail}")]
    PartialFailure {
        /// What committed and what did not
        detail: String,
    },

    /// Webhook payload signature did not match the shared secret.
    #[error("Webhook signature verification failed")]
    InvalidSignature,

    /// Configuration error (missing/invalid settings).
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong
        message: String,
    },

    /// Database error from the storage layer.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Malformed webhook or metadata payload.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience `Result` type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
