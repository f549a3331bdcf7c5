//! Notification relay.
//!
//! Everything here is best effort: the order or status write is already
//! durable before any of these run, so a transport failure is logged with
//! enough context to diagnose and never propagated.

use teloxide::prelude::*;

use tracing::{error, warn};

use crate::db::{Order, OrderStatus};

use super::ui_builder::{admin_review_markup, render_admin_notification};

/// Push the new-order summary with Approve/Reject controls to the operator.
/// Skipped with a warning when no admin chat is configured.
pub async fn notify_admin_new_order(bot: &Bot, admin_chat_id: Option<i64>, order: &Order) {
    let Some(admin_chat_id) = admin_chat_id else {
        warn!(
            order_id = order.id,
            "ADMIN_CHAT_ID not configured. Skipping admin notification"
        );
        return;
    };

    let text = render_admin_notification(order);
    if let Err(e) = bot
        .send_message(ChatId(admin_chat_id), text)
        .reply_markup(admin_review_markup(order.id, order.user_id))
        .await
    {
        error!(
            order_id = order.id,
            admin_chat_id,
            error = %e,
            "Failed to send admin notification"
        );
    }
}

/// Relay a support ticket to the operator.
pub async fn notify_admin_support_ticket(
    bot: &Bot,
    admin_chat_id: Option<i64>,
    ticket_id: i64,
    user_id: i64,
    username: Option<&str>,
    message_text: &str,
) {
    let Some(admin_chat_id) = admin_chat_id else {
        warn!(
            ticket_id,
            "ADMIN_CHAT_ID not configured. Skipping support notification"
        );
        return;
    };

    let text = format!(
        "Support Ticket #{ticket_id}\nUser: {} ({user_id})\n\n{message_text}",
        username.map(|u| format!("@{u}")).unwrap_or_else(|| "N/A".to_string()),
    );
    if let Err(e) = bot.send_message(ChatId(admin_chat_id), text).await {
        error!(
            ticket_id,
            admin_chat_id,
            error = %e,
            "Failed to send support notification"
        );
    }
}

/// Tell the customer their order reached a terminal status.
pub async fn notify_customer_status(bot: &Bot, user_id: i64, order_id: i64, status: OrderStatus) {
    let text = format!("Your Order #{order_id} has been {}.", status.as_str());
    if let Err(e) = bot.send_message(ChatId(user_id), text).await {
        warn!(
            user_id,
            order_id,
            error = %e,
            "Could not notify user about order status"
        );
    }
}
