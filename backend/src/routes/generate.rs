use std::sync::Arc;

use axum::http::HeaderMap;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};

use crate::credits::{perform_billable_operation, BillingError};
use crate::AppState;
use tokoboost_common::{GenerateRequest, GenerateResponse};

/// POST /api/generate - the billable generation endpoint.
///
/// Charges the generation cost, invokes the content flows, and refunds the
/// charge when generation fails. Error messages shown to merchants stay in
/// Bahasa Indonesia; details go to the log.
async fn generate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, (StatusCode, String)> {
    let auth_user = state
        .jwks_client
        .authenticate(&headers)
        .await
        .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

    // Validate before charging; a malformed request must never cost credits.
    if !request.is_complete() {
        return Err((StatusCode::BAD_REQUEST, "Data produk tidak lengkap.".to_string()));
    }

    // First authenticated call creates the account with its starter credits.
    state
        .ledger
        .create_account_if_absent(
            &auth_user.sub,
            auth_user.email.as_deref(),
            auth_user.name.as_deref(),
            state.config.credits.initial_grant,
        )
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let cost = state.config.credits.generation_cost;
    let generator = state.generator_client.clone();
    let payload = request.clone();

    let billed = perform_billable_operation(&state.credits, &auth_user.sub, cost, move || {
        async move { generator.generate(&payload).await }
    })
    .await
    .map_err(|e| match e {
        BillingError::InsufficientCredits => {
            (StatusCode::PAYMENT_REQUIRED, "Kredit tidak cukup.".to_string())
        }
        BillingError::LedgerUnavailable(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Gagal memperbarui kredit.".to_string())
        }
        BillingError::Operation(err) => {
            tracing::error!("Generation failed for {}: {}", auth_user.sub, err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Gagal memproses permintaan di server. Kredit Anda tidak terpakai.".to_string(),
            )
        }
        BillingError::Aborted => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Gagal memproses permintaan di server. Kredit Anda tidak terpakai.".to_string(),
        ),
    })?;

    Ok(Json(GenerateResponse {
        captions: billed.value.captions,
        flyer_image_uri: billed.value.flyer_image_uri,
        new_credits: billed.new_balance,
    }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/generate", post(generate))
        .with_state(state)
}
