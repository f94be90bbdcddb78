//! Razorpay REST client
//!
//! Basic auth with the key id / key secret pair, JSON bodies, 30 s timeout.

use async_trait::async_trait;
use campus_common::config::RazorpayConfig;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::{GatewayError, GatewayOrder, GatewayPayment, OrderRequest, PaymentGateway};

const USER_AGENT: &str = concat!("campus-student/", env!("CARGO_PKG_VERSION"));

/// Razorpay API client
pub struct RazorpayClient {
    http_client: reqwest::Client,
    base_url: String,
    key_id: Option<String>,
    key_secret: Option<String>,
}

impl RazorpayClient {
    pub fn new(config: &RazorpayConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
        })
    }

    fn credentials(&self) -> Result<(&str, &str), GatewayError> {
        match (self.key_id.as_deref(), self.key_secret.as_deref()) {
            (Some(id), Some(secret)) => Ok((id, secret)),
            _ => Err(GatewayError::NotConfigured),
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GatewayError> {
        let (key_id, key_secret) = self.credentials()?;

        let response = request
            .basic_auth(key_id, Some(key_secret))
            .send()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;

        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(GatewayError::Api(status.as_u16(), "Authentication failed".to_string()));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    fn key_id(&self) -> Option<String> {
        self.key_id.clone()
    }

    async fn create_order(&self, request: &OrderRequest) -> Result<GatewayOrder, GatewayError> {
        tracing::debug!(amount = request.amount, receipt = %request.receipt, "Creating gateway order");

        let url = format!("{}/orders", self.base_url);
        let order: GatewayOrder = self.send(self.http_client.post(url).json(request)).await?;

        tracing::info!(order_id = %order.id, amount = order.amount, "Gateway order created");
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &str) -> Result<GatewayOrder, GatewayError> {
        let url = format!("{}/orders/{}", self.base_url, order_id);
        self.send(self.http_client.get(url)).await
    }

    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        let url = format!("{}/payments/{}", self.base_url, payment_id);
        self.send(self.http_client.get(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(key_id: Option<&str>, key_secret: Option<&str>) -> RazorpayConfig {
        RazorpayConfig {
            key_id: key_id.map(String::from),
            key_secret: key_secret.map(String::from),
            webhook_secret: None,
            base_url: "https://gateway.invalid/v1/".to_string(),
        }
    }

    #[test]
    fn test_client_creation_trims_base_url() {
        let client = RazorpayClient::new(&config(Some("id"), Some("secret"))).unwrap();
        assert_eq!(client.base_url, "https://gateway.invalid/v1");
        assert_eq!(client.key_id().as_deref(), Some("id"));
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_without_network() {
        let client = RazorpayClient::new(&config(Some("id"), None)).unwrap();
        let err = client.fetch_payment("pay_1").await.unwrap_err();
        assert!(matches!(err, GatewayError::NotConfigured));
    }
}
