use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request body for creating a payment-gateway transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopUpRequest {
    /// Plan name from the catalog, e.g. "UMKM".
    pub plan: String,
}

/// A created transaction the client can redeem in the hosted checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopUpResponse {
    /// Snap token for the checkout widget.
    pub token: String,
    pub order_id: String,
}

/// Request body for the server-verified confirmation of a paid top-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmTopUpRequest {
    pub order_id: String,
}

/// Result of a confirmed top-up.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmTopUpResponse {
    pub credits_added: i64,
    pub new_credits: i64,
}

/// Build a gateway order id: `KREDIT-<PLAN>-<suffix>`.
pub fn new_order_id(plan_name: &str) -> String {
    format!("KREDIT-{}-{}", plan_name.to_uppercase(), Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_carries_plan_name() {
        let order_id = new_order_id("Toko");
        assert!(order_id.starts_with("KREDIT-TOKO-"));
    }

    #[test]
    fn test_order_ids_are_unique() {
        assert_ne!(new_order_id("UMKM"), new_order_id("UMKM"));
    }

    #[test]
    fn test_confirm_request_camel_case() {
        let req: ConfirmTopUpRequest =
            serde_json::from_str(r#"{"orderId":"KREDIT-UMKM-abc"}"#).unwrap();
        assert_eq!(req.order_id, "KREDIT-UMKM-abc");
    }
}
