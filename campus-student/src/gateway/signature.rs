//! HMAC-SHA256 signature checks for gateway callbacks
//!
//! Signatures arrive hex encoded. Comparison goes through
//! `Mac::verify_slice`, which is constant time.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// True when `signature_hex` is the HMAC-SHA256 of `message` under `secret`
pub fn verify(secret: &str, message: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(message);
    mac.verify_slice(&expected).is_ok()
}

/// Checkout callback signature: HMAC over `"<order_id>|<payment_id>"`
pub fn verify_checkout(secret: &str, order_id: &str, payment_id: &str, signature_hex: &str) -> bool {
    let message = format!("{}|{}", order_id, payment_id);
    verify(secret, message.as_bytes(), signature_hex)
}

/// Hex HMAC-SHA256, as the gateway would compute it
pub fn sign(secret: &str, message: &[u8]) -> String {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_then_verify() {
        let body = br#"{"event":"payment.captured"}"#;
        let sig = sign("whsec", body);
        assert!(verify("whsec", body, &sig));
        assert!(!verify("other", body, &sig));
        assert!(!verify("whsec", b"tampered", &sig));
    }

    #[test]
    fn test_known_vector() {
        // RFC 4231 test case 2
        let sig = sign("Jefe", b"what do ya want for nothing?");
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_non_hex_signature_rejected() {
        assert!(!verify("secret", b"body", "not-hex"));
        assert!(!verify("secret", b"body", ""));
    }

    #[test]
    fn test_checkout_signature() {
        let sig = sign("key_secret", b"order_1|pay_1");
        assert!(verify_checkout("key_secret", "order_1", "pay_1", &sig));
        assert!(!verify_checkout("key_secret", "order_1", "pay_2", &sig));
    }
}
