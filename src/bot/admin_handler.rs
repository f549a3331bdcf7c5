//! Admin Handler module for operator approve/reject decisions
//!
//! Authorization fails closed: a missing `ADMIN_CHAT_ID` or a mismatched
//! actor leaves the order untouched. The status write is the source of truth;
//! the customer notification afterwards is fire and forget.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::warn;

use crate::callback::Decision;
use crate::db::{self, OrderStatus};

use super::{notifier, AppContext};

/// A decision is honored only when an admin is configured and the actor is
/// that admin.
pub fn is_authorized(admin_chat_id: Option<i64>, actor_id: i64) -> bool {
    admin_chat_id == Some(actor_id)
}

pub async fn handle_admin_decision(
    bot: Bot,
    q: CallbackQuery,
    ctx: Arc<AppContext>,
    decision: Decision,
    order_id: i64,
    customer_id: i64,
) -> Result<()> {
    let actor_id = q.from.id.0 as i64;

    let Some(admin_chat_id) = ctx.config.admin_chat_id else {
        warn!(actor_id, order_id, "Admin action attempted with no ADMIN_CHAT_ID configured");
        bot.answer_callback_query(q.id).await?;
        if let Some(message) = q.message.as_ref() {
            bot.edit_message_text(
                message.chat().id,
                message.id(),
                "ADMIN_CHAT_ID is not configured.",
            )
            .await?;
        }
        return Ok(());
    };

    if !is_authorized(Some(admin_chat_id), actor_id) {
        warn!(actor_id, order_id, "Unauthorized admin action");
        bot.answer_callback_query(q.id)
            .text("Unauthorized")
            .show_alert(true)
            .await?;
        return Ok(());
    }

    bot.answer_callback_query(q.id.clone()).await?;

    let status = match decision {
        Decision::Approve => OrderStatus::Approved,
        Decision::Reject => OrderStatus::Rejected,
    };
    let updated = {
        let conn = ctx.conn.lock().await;
        db::update_order_status(&conn, order_id, status)?
    };

    let outcome = if updated {
        format!("Order #{order_id} marked as {}.", status.as_str())
    } else {
        // Second click on the same controls, or an unknown id.
        format!("Order #{order_id} was already reviewed.")
    };
    if let Some(message) = q.message.as_ref() {
        bot.edit_message_text(message.chat().id, message.id(), outcome)
            .await?;
    }

    if updated {
        notifier::notify_customer_status(&bot, customer_id, order_id, status).await;
    }
    Ok(())
}
