//! TokoBoost Common Types
//!
//! Shared types used by the backend API and any client SDK: the generation
//! request/response payloads, the credit plan catalog and the top-up protocol.

pub mod generate;
pub mod plans;
pub mod topup;

pub use generate::{GenerateRequest, GenerateResponse};
pub use plans::{find_plan, Plan, PLANS};
pub use topup::{
    new_order_id, ConfirmTopUpRequest, ConfirmTopUpResponse, TopUpRequest, TopUpResponse,
};
