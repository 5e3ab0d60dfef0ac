//! Collaborator seams - traits the core uses to reach the outside world.
//!
//! The bot transport, notification pipeline, and payment gateway live
//! outside this crate; the core only knows these interfaces.

/// Payment gateway trait and webhook signature verification
pub mod gateway;
/// Chat and notification collaborators
pub mod messaging;

pub use gateway::{ChargeInit, PaymentGateway, PayoutInit, VerifiedTransaction};
pub use messaging::{Messenger, Notifier, NotifyPriority};
