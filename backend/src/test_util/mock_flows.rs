//! Canned Genkit flow responses for tests.

/// Body for a successful captions flow call.
pub fn captions_json() -> serde_json::Value {
    serde_json::json!({
        "result": {
            "captions": [
                "Rasakan gurihnya keripik singkong asli!",
                "Camilan keluarga, harga bersahabat.",
                "Stok terbatas, pesan sekarang!"
            ]
        }
    })
}

/// Body for a successful flyer flow call.
pub fn flyer_json() -> serde_json::Value {
    serde_json::json!({
        "result": {
            "flyerImageUri": "data:image/png;base64,Zmx5ZXI="
        }
    })
}

/// Body the flow server returns on failure.
pub fn error_json(message: &str) -> serde_json::Value {
    serde_json::json!({
        "error": message
    })
}

/// Body for a Snap transaction creation.
pub fn snap_token_json(token: &str) -> serde_json::Value {
    serde_json::json!({
        "token": token,
        "redirect_url": format!("https://app.midtrans.com/snap/v2/vtweb/{token}")
    })
}

/// Body for a Midtrans status lookup.
pub fn transaction_status_json(order_id: &str, status: &str) -> serde_json::Value {
    serde_json::json!({
        "order_id": order_id,
        "transaction_status": status,
        "status_code": "200",
        "gross_amount": "29000.00"
    })
}
