//! Domain records shared across the workspace.

use serde::{Deserialize, Serialize};

/// One service in the storefront catalog.
///
/// `price_id` is the payment processor's price identifier; `price_cents` is
/// what the catalog page displays and is not sent to the processor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceItem {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub price_id: String,
    pub description: String,
}

impl ServiceItem {
    /// Display price in major units (dollars for USD).
    pub fn price_major(&self) -> f64 {
        self.price_cents as f64 / 100.0
    }
}

/// Input for appending an order after a completed checkout.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: String,
    pub checkout_session_id: String,
    pub payment_intent_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub customer_email: Option<String>,
}

/// A persisted order. Records are append-only: once written they are never
/// updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: String,
    pub user_id: String,
    pub checkout_session_id: String,
    pub payment_intent_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub status: String,
    pub customer_email: String,
    pub created_at: String,
}

impl OrderRecord {
    /// Amount in major units, for emails and JSON responses.
    pub fn amount_major(&self) -> f64 {
        self.amount_cents as f64 / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_major() {
        let svc = ServiceItem {
            id: "service_std".into(),
            name: "Standard Tint".into(),
            price_cents: 20_000,
            price_id: "price_standard_tint".into(),
            description: String::new(),
        };
        assert!((svc.price_major() - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_amount_major_rounds_cents() {
        let order = OrderRecord {
            id: "o-1".into(),
            user_id: "u-1".into(),
            checkout_session_id: "cs_1".into(),
            payment_intent_id: "pi_1".into(),
            amount_cents: 35_050,
            currency: "usd".into(),
            status: "paid".into(),
            customer_email: String::new(),
            created_at: String::new(),
        };
        assert!((order.amount_major() - 350.5).abs() < f64::EPSILON);
    }
}
