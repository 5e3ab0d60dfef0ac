//! Messaging and notification collaborator interfaces.
//!
//! Both collaborators are best-effort from the core's perspective: a failed
//! send is logged and never blocks settlement. Anonymity of tips is applied
//! here, at the presentation boundary; the ledger itself always keeps the
//! real sender.

use crate::entities::tip;
use crate::errors::Result;
use tracing::warn;

/// Delivery priority for push notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyPriority {
    /// Default delivery
    Normal,
    /// Time-sensitive delivery
    High,
}

/// Chat transport: sends plain text to a user identifier (phone number).
pub trait Messenger {
    /// Sends a text message.
    fn send(&self, identifier: &str, text: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Push/email notification sink, fire-and-forget.
pub trait Notifier {
    /// Delivers a notification to a user.
    fn notify(
        &self,
        user_id: i64,
        title: &str,
        body: &str,
        priority: NotifyPriority,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Sends a message, logging failures instead of propagating them.
pub async fn send_best_effort<M: Messenger>(messenger: &M, identifier: &str, text: &str) {
    if let Err(e) = messenger.send(identifier, text).await {
        warn!(identifier, error = %e, "Message delivery failed");
    }
}

/// Recipient-facing text for a settled tip. The sender's name is suppressed
/// when the tip is anonymous.
pub fn tip_received_text(tip: &tip::Model, sender_name: &str) -> String {
    let who = if tip.anonymous { "Someone" } else { sender_name };
    format!(
        "{} sent you a tip of {} {} 🎉",
        who, tip.net_amount, tip.currency
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::tip::{Platform, TipStatus};
    use chrono::Utc;

    fn sample_tip(anonymous: bool) -> tip::Model {
        tip::Model {
            id: 1,
            sender_id: Some(7),
            recipient_id: 8,
            gross_amount: 500,
            fee: 10,
            net_amount: 490,
            currency: "NGN".to_string(),
            anonymous,
            status: TipStatus::Completed,
            platform: Platform::Whatsapp,
            message: None,
            transfer_ref: "tip_x".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_named_tip_shows_sender() {
        let text = tip_received_text(&sample_tip(false), "Ada");
        assert!(text.contains("Ada"));
        assert!(text.contains("490"));
    }

    #[test]
    fn test_anonymous_tip_suppresses_sender() {
        let text = tip_received_text(&sample_tip(true), "Ada");
        assert!(!text.contains("Ada"));
        assert!(text.starts_with("Someone"));
    }
}
