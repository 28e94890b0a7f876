//! The two transactional messages the storefront sends.

use tintworks_core::types::OrderRecord;

use crate::EmailContent;

/// Welcome email, sent when the identity provider reports a new account.
pub fn welcome(display_name: Option<&str>) -> EmailContent {
    let name = display_name.filter(|n| !n.is_empty()).unwrap_or("User");
    EmailContent {
        subject: "Welcome to Our Window Tinting Service!".into(),
        html: format!(
            "<h1>Welcome, {name}!</h1>\n\
             <p>Thank you for signing up for our window tinting service.</p>\n\
             <p>We're excited to have you on board.</p>"
        ),
    }
}

/// Order confirmation, sent after a paid checkout is recorded.
pub fn order_confirmation(order: &OrderRecord) -> EmailContent {
    EmailContent {
        subject: "Your Window Tinting Service Order Confirmation".into(),
        html: format!(
            "<h1>Order Confirmed!</h1>\n\
             <p>Thank you for your purchase.</p>\n\
             <p>Order ID: {}</p>\n\
             <p>Amount Paid: {} {}</p>\n\
             <p>We will contact you shortly to schedule your service.</p>",
            order.id,
            order.amount_major(),
            order.currency.to_uppercase()
        ),
    }
}
