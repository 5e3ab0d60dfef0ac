//! Core business logic - framework-agnostic wallet, tip, referral, and
//! payment operations. Nothing in here knows about the bot transport or the
//! HTTP layer; everything is async functions over a database connection.

/// Limit and validation policy (min/max/daily caps per operation kind)
pub mod limits;
/// Gateway-backed deposits, withdrawals, and webhook settlement
pub mod payment;
/// Multi-level referral bonus cascade
pub mod referral;
/// Peer-to-peer tip settlement
pub mod tip;
/// Balance mutation primitives
pub mod wallet;
