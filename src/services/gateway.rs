//! Payment gateway collaborator interface.
//!
//! The core never talks to a concrete gateway; it goes through
//! [`PaymentGateway`], and inbound webhook deliveries are authenticated here
//! with an HMAC-SHA256 over the raw payload before anything is trusted.

use crate::errors::{Error, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Result of initiating a charge: where to send the payer, and the gateway
/// reference the webhook will carry.
#[derive(Debug, Clone)]
pub struct ChargeInit {
    /// Checkout URL for the payer
    pub redirect_url: String,
    /// Gateway transaction reference
    pub reference: String,
}

/// Result of initiating a payout.
#[derive(Debug, Clone)]
pub struct PayoutInit {
    /// Gateway-side status string (e.g. `"queued"`)
    pub status: String,
}

/// Result of a server-side verification call.
#[derive(Debug, Clone)]
pub struct VerifiedTransaction {
    /// Gateway-side status string
    pub status: String,
    /// Amount the gateway settled, minor units
    pub amount: i64,
}

/// Charge and payout operations the core needs from a payment gateway.
/// Confirmations arrive asynchronously via signed webhooks.
pub trait PaymentGateway {
    /// Starts a charge; the payer completes it at the returned URL.
    fn initiate_charge(
        &self,
        amount: i64,
        payer_email: &str,
        reference: &str,
    ) -> impl Future<Output = Result<ChargeInit>> + Send;

    /// Starts a payout to an external account.
    fn initiate_payout(
        &self,
        amount: i64,
        destination_account: &str,
        reference: &str,
    ) -> impl Future<Output = Result<PayoutInit>> + Send;

    /// Re-verifies a transaction by reference.
    fn verify(&self, reference: &str) -> impl Future<Output = Result<VerifiedTransaction>> + Send;
}

/// Computes the hex HMAC-SHA256 signature for a payload. Used by tests and
/// by any outbound callback the platform itself signs.
pub fn sign_payload(secret: &[u8], raw_body: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|e| Error::Config {
        message: format!("Invalid webhook secret: {e}"),
    })?;
    mac.update(raw_body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verifies a webhook delivery's signature against the shared secret.
/// Comparison is constant-time via the MAC's own verifier.
///
/// # Errors
/// `InvalidSignature` when the hex is malformed or the MAC does not match.
pub fn verify_signature(secret: &[u8], raw_body: &[u8], signature_hex: &str) -> Result<()> {
    let signature = hex::decode(signature_hex).map_err(|_| Error::InvalidSignature)?;
    let mut mac = HmacSha256::new_from_slice(secret).map_err(|_| Error::InvalidSignature)?;
    mac.update(raw_body);
    mac.verify_slice(&signature).map_err(|_| Error::InvalidSignature)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_sign_and_verify_roundtrip() {
        let secret = b"shh-very-secret";
        let body = br#"{"event":"charge.success","data":{"reference":"dep_1","amount":500}}"#;

        let signature = sign_payload(secret, body).unwrap();
        verify_signature(secret, body, &signature).unwrap();
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let body = b"payload";
        let signature = sign_payload(b"secret-a", body).unwrap();
        let result = verify_signature(b"secret-b", body, &signature);
        assert!(matches!(result.unwrap_err(), Error::InvalidSignature));
    }

    #[test]
    fn test_tampered_body_rejected() {
        let secret = b"secret";
        let signature = sign_payload(secret, b"original").unwrap();
        let result = verify_signature(secret, b"tampered", &signature);
        assert!(matches!(result.unwrap_err(), Error::InvalidSignature));
    }

    #[test]
    fn test_malformed_hex_rejected() {
        let result = verify_signature(b"secret", b"body", "not-hex!");
        assert!(matches!(result.unwrap_err(), Error::InvalidSignature));
    }
}
