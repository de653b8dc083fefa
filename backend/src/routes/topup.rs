use std::sync::Arc;

use axum::http::HeaderMap;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use crate::payment::PaymentStatus;
use crate::AppState;
use tokoboost_common::{
    find_plan, new_order_id, ConfirmTopUpRequest, ConfirmTopUpResponse, TopUpRequest,
    TopUpResponse,
};

/// POST /api/topup - create a gateway transaction for a credit plan.
///
/// The pending order is recorded before the token is handed out, so the
/// confirmation step knows how many credits the order is worth.
async fn create_top_up(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<TopUpRequest>,
) -> Result<Json<TopUpResponse>, (StatusCode, String)> {
    let auth_user = state
        .jwks_client
        .authenticate(&headers)
        .await
        .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

    let plan = find_plan(&request.plan)
        .ok_or((StatusCode::BAD_REQUEST, "Paket kredit tidak dikenal.".to_string()))?;

    let order_id = new_order_id(plan.name);

    state
        .ledger
        .begin_top_up(&order_id, &auth_user.sub, plan.credits)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let token = state
        .midtrans_client
        .create_transaction(
            &order_id,
            plan,
            auth_user.name.as_deref(),
            auth_user.email.as_deref(),
        )
        .await
        .map_err(|e| {
            tracing::error!("Midtrans transaction creation failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Gagal membuat transaksi pembayaran.".to_string())
        })?;

    Ok(Json(TopUpResponse { token, order_id }))
}

/// POST /api/topup/confirm - credit the balance after a verified payment.
///
/// The order status is checked against the gateway's status API; the client
/// claiming a finished checkout is not enough. Settling the recorded order
/// before crediting makes duplicate confirmations harmless.
async fn confirm_top_up(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<ConfirmTopUpRequest>,
) -> Result<Json<ConfirmTopUpResponse>, (StatusCode, String)> {
    let auth_user = state
        .jwks_client
        .authenticate(&headers)
        .await
        .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

    let recorded = state
        .ledger
        .top_up(&request.order_id)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::NOT_FOUND, "Transaksi tidak dikenal.".to_string()))?;

    if recorded.account_id != auth_user.sub {
        return Err((StatusCode::FORBIDDEN, "Transaksi milik akun lain.".to_string()));
    }

    let status = state
        .midtrans_client
        .transaction_status(&request.order_id)
        .await
        .map_err(|e| {
            tracing::error!("Midtrans status check failed for {}: {}", request.order_id, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Gagal memeriksa status pembayaran.".to_string())
        })?;

    match status {
        PaymentStatus::Paid => {}
        PaymentStatus::Pending => {
            return Err((StatusCode::CONFLICT, "Pembayaran belum selesai.".to_string()));
        }
        PaymentStatus::Failed => {
            return Err((StatusCode::BAD_REQUEST, "Pembayaran gagal.".to_string()));
        }
    }

    let settled = state
        .ledger
        .settle_top_up(&request.order_id)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .ok_or((StatusCode::CONFLICT, "Top-up sudah diproses.".to_string()))?;

    let new_credits = state
        .credits
        .refund(&settled.account_id, settled.credits)
        .map_err(|e| {
            // The order is marked applied but the balance was not credited.
            tracing::error!(
                "Crediting settled top-up {} failed, manual reconciliation required: {}",
                settled.order_id,
                e
            );
            (StatusCode::INTERNAL_SERVER_ERROR, "Gagal menambahkan kredit.".to_string())
        })?;

    tracing::info!(
        "Applied top-up {}: {} credits to {}",
        settled.order_id,
        settled.credits,
        settled.account_id
    );

    Ok(Json(ConfirmTopUpResponse { credits_added: settled.credits, new_credits }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/topup", post(create_top_up))
        .route("/api/topup/confirm", post(confirm_top_up))
        .with_state(state)
}
