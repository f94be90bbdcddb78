//! Payment gateway seam
//!
//! The service only needs three calls from the gateway: create an order,
//! read an order back (for its notes) and read a payment. Everything else
//! about the order/signature lifecycle belongs to the gateway itself.

pub mod razorpay;
pub mod signature;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use razorpay::RazorpayClient;

/// Payment gateway client errors
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Payment gateway credentials are not configured")]
    NotConfigured,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Gateway error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Order creation request (amount in minor units)
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
    pub notes: Map<String, Value>,
}

/// Order as returned by the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "notes_or_empty")]
    pub notes: Map<String, Value>,
}

/// Bank reference data attached to a payment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcquirerData {
    #[serde(default)]
    pub rrn: Option<String>,
    #[serde(default)]
    pub upi_transaction_id: Option<String>,
}

/// Payment as returned by the gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayment {
    pub id: String,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub amount: i64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub acquirer_data: AcquirerData,
    #[serde(default, deserialize_with = "notes_or_empty")]
    pub notes: Map<String, Value>,
}

impl GatewayPayment {
    pub fn is_captured(&self) -> bool {
        self.status == "captured"
    }
}

/// The gateway sends `notes: []` when an order carries no notes
fn notes_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}

/// Operations the service consumes from the payment gateway
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Public key handed to the checkout widget alongside a new order
    fn key_id(&self) -> Option<String>;

    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError>;

    async fn fetch_order(&self, order_id: &str) -> Result<GatewayOrder, GatewayError>;

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_with_array_notes() {
        let payment: GatewayPayment = serde_json::from_str(
            r#"{"id": "pay_1", "order_id": "order_1", "amount": 5000, "status": "captured", "notes": []}"#,
        )
        .unwrap();
        assert!(payment.is_captured());
        assert!(payment.notes.is_empty());
        assert!(payment.acquirer_data.rrn.is_none());
    }

    #[test]
    fn test_payment_with_acquirer_data() {
        let payment: GatewayPayment = serde_json::from_str(
            r#"{"id": "pay_2", "status": "authorized",
                "acquirer_data": {"upi_transaction_id": "UPI123"},
                "notes": {"payment_type": "emi"}}"#,
        )
        .unwrap();
        assert!(!payment.is_captured());
        assert_eq!(payment.acquirer_data.upi_transaction_id.as_deref(), Some("UPI123"));
        assert_eq!(payment.notes["payment_type"], "emi");
    }
}
