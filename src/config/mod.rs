/// Database configuration and connection management
pub mod database;

/// Wallet settings (fees, bonuses, limits) from config.toml
pub mod settings;

pub use settings::{LimitBounds, WalletSettings};
