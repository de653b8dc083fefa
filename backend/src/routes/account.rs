use std::sync::Arc;

use axum::http::HeaderMap;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct InitUserResponse {
    pub credits: i64,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub credits: i64,
}

/// POST /api/init-user - create the ledger account on first sign-in.
///
/// The account id comes from the verified token, never from the request
/// body; a client cannot initialize someone else's ledger.
async fn init_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<InitUserResponse>, (StatusCode, String)> {
    let auth_user = state
        .jwks_client
        .authenticate(&headers)
        .await
        .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

    let account = state
        .ledger
        .create_account_if_absent(
            &auth_user.sub,
            auth_user.email.as_deref(),
            auth_user.name.as_deref(),
            state.config.credits.initial_grant,
        )
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(InitUserResponse { credits: account.balance }))
}

/// GET /api/credits - current balance for display.
///
/// Display data only; the authoritative sufficiency check happens inside
/// the charge.
async fn credits(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<BalanceResponse>, (StatusCode, String)> {
    let auth_user = state
        .jwks_client
        .authenticate(&headers)
        .await
        .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

    let balance = state
        .credits
        .balance(&auth_user.sub)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .unwrap_or(0);

    Ok(Json(BalanceResponse { credits: balance }))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/init-user", post(init_user))
        .route("/api/credits", get(credits))
        .with_state(state)
}
