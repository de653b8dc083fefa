use reqwest::Client;
use serde::{Deserialize, Serialize};

use tokoboost_common::Plan;

/// Client for the Midtrans Snap (token creation) and status APIs.
pub struct MidtransClient {
    http_client: Client,
    server_key: String,
    snap_base_url: String,
    api_base_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MidtransError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Midtrans error: {0}")]
    Gateway(String),
}

/// Settlement state reported by the status API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    /// Funds are confirmed (`settlement` or `capture`).
    Paid,
    Pending,
    /// Denied, cancelled, expired or otherwise failed.
    Failed,
}

impl PaymentStatus {
    fn from_transaction_status(status: &str) -> Self {
        match status {
            "settlement" | "capture" => PaymentStatus::Paid,
            "pending" => PaymentStatus::Pending,
            _ => PaymentStatus::Failed,
        }
    }
}

#[derive(Debug, Serialize)]
struct SnapTransactionRequest {
    transaction_details: TransactionDetails,
    item_details: Vec<ItemDetail>,
    customer_details: CustomerDetails,
}

#[derive(Debug, Serialize)]
struct TransactionDetails {
    order_id: String,
    gross_amount: u64,
}

#[derive(Debug, Serialize)]
struct ItemDetail {
    id: String,
    price: u64,
    quantity: u32,
    name: String,
    merchant_name: String,
}

#[derive(Debug, Serialize)]
struct CustomerDetails {
    first_name: String,
    email: String,
}

#[derive(Debug, Deserialize)]
struct SnapTransactionResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct TransactionStatusResponse {
    transaction_status: String,
}

impl MidtransClient {
    pub fn new(server_key: &str, snap_base_url: &str, api_base_url: &str) -> Self {
        Self {
            http_client: Client::new(),
            server_key: server_key.to_string(),
            snap_base_url: snap_base_url.trim_end_matches('/').to_string(),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a Snap transaction and return the client-redeemable token.
    pub async fn create_transaction(
        &self,
        order_id: &str,
        plan: &Plan,
        customer_name: Option<&str>,
        customer_email: Option<&str>,
    ) -> Result<String, MidtransError> {
        let request = SnapTransactionRequest {
            transaction_details: TransactionDetails {
                order_id: order_id.to_string(),
                gross_amount: plan.price_idr,
            },
            item_details: vec![ItemDetail {
                id: format!("credit-{}", plan.name.to_lowercase()),
                price: plan.price_idr,
                quantity: 1,
                name: format!("Paket Kredit {} ({} Kredit)", plan.name, plan.credits),
                merchant_name: "TokoBoost AI".to_string(),
            }],
            customer_details: CustomerDetails {
                first_name: customer_name.unwrap_or("Guest").to_string(),
                email: customer_email.unwrap_or("guest@example.com").to_string(),
            },
        };

        let url = format!("{}/snap/v1/transactions", self.snap_base_url);

        tracing::debug!("Creating Snap transaction {} for plan {}", order_id, plan.name);

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.server_key, Some(""))
            .json(&request)
            .send()
            .await
            .map_err(|e| MidtransError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MidtransError::Gateway(format!("{}: {}", status, body)));
        }

        let snap: SnapTransactionResponse = response
            .json()
            .await
            .map_err(|e| MidtransError::InvalidResponse(e.to_string()))?;

        Ok(snap.token)
    }

    /// Query the authoritative status of an order.
    ///
    /// This is the server-side verification step; a client claiming a
    /// successful checkout is never taken at its word.
    pub async fn transaction_status(&self, order_id: &str) -> Result<PaymentStatus, MidtransError> {
        let url = format!("{}/v2/{}/status", self.api_base_url, order_id);

        let response = self
            .http_client
            .get(&url)
            .basic_auth(&self.server_key, Some(""))
            .send()
            .await
            .map_err(|e| MidtransError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MidtransError::Gateway(format!("{}: {}", status, body)));
        }

        let status: TransactionStatusResponse = response
            .json()
            .await
            .map_err(|e| MidtransError::InvalidResponse(e.to_string()))?;

        Ok(PaymentStatus::from_transaction_status(&status.transaction_status))
    }
}
