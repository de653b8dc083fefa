use serde::{Deserialize, Serialize};

/// Request body for the billable generation endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Product photo as a data URI (`data:<mimetype>;base64,<payload>`).
    pub product_image: String,
    /// Free-form product description written by the merchant.
    pub product_description: String,
}

impl GenerateRequest {
    /// Both fields are required; whitespace-only values count as missing.
    pub fn is_complete(&self) -> bool {
        !self.product_image.trim().is_empty() && !self.product_description.trim().is_empty()
    }
}

/// Response for a successful generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    /// Three marketing captions tailored to the product.
    pub captions: Vec<String>,
    /// Redesigned product flyer as a data URI.
    pub flyer_image_uri: String,
    /// Credit balance after the charge.
    pub new_credits: i64,
}
