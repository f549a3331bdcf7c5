//! Message Handler module for processing incoming Telegram messages
//!
//! Free text and photos carry no category of their own; the user's current
//! input mode decides how they are interpreted. `/start` is the universal
//! escape: it resets the session from any mode before mode routing runs,
//! so it can never be captured as credentials, a ticket, or payment
//! evidence. With no mode active, only `/start` does anything.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::debug;

use crate::db;
use crate::session::{parse_credentials, Mode, Session};

use super::notifier;
use super::ui_builder::{confirm_markup, main_menu_markup, render_order_summary};
use super::AppContext;

const CREDENTIALS_PROMPT: &str = "Invalid format. Send as: email,password";
const NO_DRAFT: &str = "No active order draft. Please start again.";

/// `/start` resets the session regardless of the active mode, so it is
/// checked before any mode routing.
fn is_start_command(text: Option<&str>) -> bool {
    text.map(str::trim) == Some("/start")
}

/// Extract payment evidence or a fulfillment detail from a message: either
/// non-empty text or a photo resolved to an opaque file reference.
fn evidence_from_message(msg: &Message) -> Option<String> {
    if let Some(text) = msg.text() {
        let text = text.trim();
        if !text.is_empty() {
            return Some(text.to_string());
        }
    }
    msg.photo()
        .and_then(|photos| photos.last())
        .map(|photo| format!("PHOTO_FILE_ID:{}", photo.file.id.0))
}

pub async fn message_handler(bot: Bot, msg: Message, ctx: Arc<AppContext>) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = user.id.0 as i64;
    let username = user.username.clone();

    let session = ctx.sessions.get(user_id).await;
    debug!(user_id, mode = ?session.mode, "Received message from user");

    if is_start_command(msg.text()) {
        ctx.sessions.clear(user_id).await;
        bot.send_message(msg.chat.id, "Welcome! Choose an option:")
            .reply_markup(main_menu_markup())
            .await?;
        return Ok(());
    }

    match session.mode.clone() {
        Mode::AwaitingCredentials => {
            handle_credentials_input(&bot, &msg, &ctx, user_id, session).await
        }
        Mode::AwaitingDetail => handle_detail_input(&bot, &msg, &ctx, user_id, session).await,
        Mode::AwaitingSupportMessage => {
            handle_support_input(&bot, &msg, &ctx, user_id, username.as_deref()).await
        }
        Mode::AwaitingPaymentEvidence { order_id } => {
            handle_payment_evidence(&bot, &msg, &ctx, user_id, order_id).await
        }
        Mode::None => {
            bot.send_message(msg.chat.id, "Use /start to open the menu.")
                .await?;
            Ok(())
        }
    }
}

async fn handle_credentials_input(
    bot: &Bot,
    msg: &Message,
    ctx: &AppContext,
    user_id: i64,
    mut session: Session,
) -> Result<()> {
    let input = msg.text().unwrap_or("");
    let (email, password) = match parse_credentials(input) {
        Ok(parsed) => parsed,
        Err(reason) => {
            debug!(user_id, reason, "Rejected credential input");
            bot.send_message(msg.chat.id, CREDENTIALS_PROMPT).await?;
            return Ok(());
        }
    };

    let summary = session.draft.as_mut().and_then(|draft| {
        draft
            .set_credentials(email, password)
            .ok()
            .map(|_| render_order_summary(draft))
    });
    let Some(summary) = summary else {
        // The draft evaporated from under the mode; reset rather than guess.
        ctx.sessions.clear(user_id).await;
        bot.send_message(msg.chat.id, NO_DRAFT)
            .reply_markup(main_menu_markup())
            .await?;
        return Ok(());
    };

    session.mode = Mode::None;
    ctx.sessions.set(user_id, session).await;

    bot.send_message(msg.chat.id, summary)
        .reply_markup(confirm_markup())
        .await?;
    Ok(())
}

async fn handle_detail_input(
    bot: &Bot,
    msg: &Message,
    ctx: &AppContext,
    user_id: i64,
    mut session: Session,
) -> Result<()> {
    let text = msg.text().map(str::trim).filter(|t| !t.is_empty());
    let photo_ref = msg
        .photo()
        .and_then(|photos| photos.last())
        .map(|photo| format!("PHOTO_FILE_ID:{}", photo.file.id.0));
    if text.is_none() && photo_ref.is_none() {
        bot.send_message(
            msg.chat.id,
            "Please send the order details as text or a photo.",
        )
        .await?;
        return Ok(());
    }

    let Some(draft) = session.draft.as_mut() else {
        ctx.sessions.clear(user_id).await;
        bot.send_message(msg.chat.id, NO_DRAFT)
            .reply_markup(main_menu_markup())
            .await?;
        return Ok(());
    };

    if let Some(text) = text {
        draft.set_detail_text(text.to_string());
    } else if let Some(file_ref) = photo_ref {
        draft.set_detail_file(file_ref);
    }
    let summary = render_order_summary(draft);

    session.mode = Mode::None;
    ctx.sessions.set(user_id, session).await;

    bot.send_message(msg.chat.id, summary)
        .reply_markup(confirm_markup())
        .await?;
    Ok(())
}

async fn handle_support_input(
    bot: &Bot,
    msg: &Message,
    ctx: &AppContext,
    user_id: i64,
    username: Option<&str>,
) -> Result<()> {
    let text = msg.text().map(str::trim).unwrap_or("");
    if text.is_empty() {
        bot.send_message(
            msg.chat.id,
            "Please describe your issue in a text message.",
        )
        .await?;
        return Ok(());
    }

    let ticket_id = {
        let conn = ctx.conn.lock().await;
        db::create_support_ticket(&conn, user_id, username, text)?
    };

    ctx.sessions
        .update(user_id, |session| session.mode = Mode::None)
        .await;

    bot.send_message(
        msg.chat.id,
        format!("Support ticket #{ticket_id} received. Our team will respond soon."),
    )
    .reply_markup(main_menu_markup())
    .await?;

    notifier::notify_admin_support_ticket(
        bot,
        ctx.config.admin_chat_id,
        ticket_id,
        user_id,
        username,
        text,
    )
    .await;
    Ok(())
}

async fn handle_payment_evidence(
    bot: &Bot,
    msg: &Message,
    ctx: &AppContext,
    user_id: i64,
    order_id: i64,
) -> Result<()> {
    let Some(evidence) = evidence_from_message(msg) else {
        bot.send_message(
            msg.chat.id,
            "Please send a transaction ID text or a payment screenshot.",
        )
        .await?;
        return Ok(());
    };

    let (attached, order) = {
        let conn = ctx.conn.lock().await;
        let attached = db::attach_payment_reference(&conn, order_id, &evidence)?;
        let order = db::get_order(&conn, order_id)?;
        (attached, order)
    };

    ctx.sessions
        .update(user_id, |session| session.mode = Mode::None)
        .await;

    if !attached {
        // Unknown id or the operator already reviewed the order.
        bot.send_message(
            msg.chat.id,
            format!("Order #{order_id} can no longer accept payment evidence."),
        )
        .reply_markup(main_menu_markup())
        .await?;
        return Ok(());
    }

    bot.send_message(
        msg.chat.id,
        format!("Payment evidence received for Order #{order_id}. Awaiting admin review."),
    )
    .reply_markup(main_menu_markup())
    .await?;

    if let Some(order) = order {
        notifier::notify_admin_new_order(bot, ctx.config.admin_chat_id, &order).await;
    }
    Ok(())
}
