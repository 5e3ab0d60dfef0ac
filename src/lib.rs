//! `Pochi` - WhatsApp-integrated digital wallet core
//!
//! This crate implements the settlement core of a chat-first wallet: balance
//! mutation primitives with a transaction record for every change, tip
//! settlement with fee withholding and compensating refunds, a three-level
//! referral bonus cascade, per-operation limit policies, and gateway-driven
//! deposits/withdrawals confirmed via signed webhooks. The bot transport,
//! HTTP layer, and concrete gateway client live outside and reach the core
//! through the traits in [`services`].

// Deny the most critical lints that could lead to bugs or security issues
#![deny(
    // Security and correctness
    unsafe_code,
    unsafe_op_in_unsafe_fn,

    // Code quality - things that are almost always bugs
    unreachable_code,
    unreachable_patterns,
    unused_must_use,

    // Documentation - broken links are bugs
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
// Warn on things that should be fixed but aren't necessarily bugs
#![warn(
    missing_docs,

    // Clippy categories for overall code quality
    clippy::all,
    clippy::pedantic,

    // Correctness
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::exit,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used,

    // Future compatibility
    future_incompatible,
    rust_2018_idioms,
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions,  // Common pattern in Rust
    clippy::missing_errors_doc,        // Will add gradually
    clippy::missing_panics_doc,        // Will add gradually
)]

/// Configuration management: database bootstrap and wallet settings
pub mod config;
/// Core business logic: wallet engine, tips, referrals, limits, payments
pub mod core;
/// SeaORM entity definitions for database tables
pub mod entities;
/// Unified error types and result handling
pub mod errors;
/// Collaborator traits: messaging, notifications, payment gateway
pub mod services;

#[cfg(test)]
pub mod test_utils;
