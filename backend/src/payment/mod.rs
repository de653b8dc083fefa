//! Payment gateway (Midtrans) integration.

mod midtrans;

pub use midtrans::{MidtransClient, MidtransError, PaymentStatus};
