//! Donation endpoint.

use axum::{extract::State, Json};

use crate::models::DonationAddress;
use crate::AppState;

/// GET /api/ton-address - Where donations should be sent.
pub async fn ton_address(State(state): State<AppState>) -> Json<DonationAddress> {
    Json(DonationAddress {
        address: state.config.ton_address.clone(),
    })
}
