use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle of a recorded top-up order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TopUpState {
    /// Transaction created, payment not yet verified.
    Pending,
    /// Payment verified and the balance credited.
    Applied,
}

impl TopUpState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopUpState::Pending => "pending",
            TopUpState::Applied => "applied",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TopUpState::Pending),
            "applied" => Some(TopUpState::Applied),
            _ => None,
        }
    }
}

/// A top-up order recorded when the gateway transaction is created.
///
/// The `order_id` is the idempotency key: a settled order credits the
/// balance at most once, no matter how many confirmations arrive.
#[derive(Debug, Clone, Serialize)]
pub struct PendingTopUp {
    pub order_id: String,
    pub account_id: String,
    pub credits: i64,
    pub state: TopUpState,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_round_trip() {
        assert_eq!(TopUpState::parse("pending"), Some(TopUpState::Pending));
        assert_eq!(TopUpState::parse("applied"), Some(TopUpState::Applied));
        assert_eq!(TopUpState::Pending.as_str(), "pending");
        assert_eq!(TopUpState::Applied.as_str(), "applied");
    }

    #[test]
    fn test_state_parse_unknown() {
        assert_eq!(TopUpState::parse("settled"), None);
        assert_eq!(TopUpState::parse(""), None);
    }
}
