//! Callback Handler module for processing inline keyboard callback queries
//!
//! Payloads are parsed into a closed action set before dispatch; malformed or
//! stale tokens are answered and dropped without touching any state.

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, MessageId};
use tracing::debug;

use crate::callback::{CallbackAction, MenuTarget};
use crate::catalog::Capture;
use crate::db::{self, NewOrder};
use crate::session::{AccountType, Draft, Mode, Session};

use super::ui_builder::{
    account_type_markup, confirm_markup, durations_markup, main_menu_markup, payment_markup,
    products_markup, render_order_summary, render_orders_list, render_payment_instructions,
    render_profile,
};
use super::{admin_handler, notifier, AppContext};

const NO_DRAFT: &str = "No active order draft. Please start again.";

pub async fn callback_handler(bot: Bot, q: CallbackQuery, ctx: Arc<AppContext>) -> Result<()> {
    let user_id = q.from.id.0 as i64;
    let data = q.data.clone().unwrap_or_default();

    let Some(action) = CallbackAction::parse(&data) else {
        debug!(user_id, data, "Dropping malformed callback payload");
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };
    debug!(user_id, ?action, "Received callback query from user");

    // Admin decisions answer the query themselves (unauthorized actors get
    // an alert instead of a plain acknowledgement).
    if let CallbackAction::AdminDecision {
        decision,
        order_id,
        customer_id,
    } = action
    {
        return admin_handler::handle_admin_decision(bot, q, ctx, decision, order_id, customer_id)
            .await;
    }

    bot.answer_callback_query(q.id.clone()).await?;

    // Without the originating message there is nothing to edit.
    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };
    let chat_id = message.chat().id;
    let message_id = message.id();

    match action {
        CallbackAction::Menu(target) => {
            handle_menu(&bot, &ctx, &q, chat_id, message_id, target).await
        }
        CallbackAction::PickProduct { product } => {
            handle_product_pick(&bot, &ctx, user_id, chat_id, message_id, &product).await
        }
        CallbackAction::PickDuration { product, duration } => {
            handle_duration_pick(&bot, &ctx, user_id, chat_id, message_id, &product, &duration)
                .await
        }
        CallbackAction::PickAccountType(account_type) => {
            handle_account_type_pick(&bot, &ctx, user_id, chat_id, message_id, account_type).await
        }
        CallbackAction::ConfirmOrder => {
            handle_confirm(&bot, &ctx, &q, user_id, chat_id, message_id).await
        }
        CallbackAction::PaymentSubmitted { order_id } => {
            handle_payment_submitted(&bot, &ctx, user_id, chat_id, message_id, order_id).await
        }
        CallbackAction::AdminDecision { .. } => unreachable!("handled above"),
    }
}

async fn edit(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    text: String,
    markup: Option<InlineKeyboardMarkup>,
) -> Result<()> {
    let request = bot.edit_message_text(chat_id, message_id, text);
    match markup {
        Some(markup) => request.reply_markup(markup).await?,
        None => request.await?,
    };
    Ok(())
}

async fn handle_menu(
    bot: &Bot,
    ctx: &AppContext,
    q: &CallbackQuery,
    chat_id: ChatId,
    message_id: MessageId,
    target: MenuTarget,
) -> Result<()> {
    let user_id = q.from.id.0 as i64;
    match target {
        MenuTarget::Home => {
            ctx.sessions.clear(user_id).await;
            edit(
                bot,
                chat_id,
                message_id,
                "Main Menu".to_string(),
                Some(main_menu_markup()),
            )
            .await
        }
        MenuTarget::Order => {
            // Starting over discards any draft and pending mode.
            ctx.sessions
                .update(user_id, |session| *session = Session::default())
                .await;
            edit(
                bot,
                chat_id,
                message_id,
                "Choose a product:".to_string(),
                Some(products_markup(&ctx.catalog)),
            )
            .await
        }
        MenuTarget::Orders => {
            let orders = {
                let conn = ctx.conn.lock().await;
                db::list_orders_for_user(&conn, user_id)?
            };
            edit(
                bot,
                chat_id,
                message_id,
                render_orders_list(&orders),
                Some(main_menu_markup()),
            )
            .await
        }
        MenuTarget::Profile => {
            let (total, approved) = {
                let conn = ctx.conn.lock().await;
                db::counts_for_user(&conn, user_id)?
            };
            edit(
                bot,
                chat_id,
                message_id,
                render_profile(user_id, q.from.username.as_deref(), total, approved),
                Some(main_menu_markup()),
            )
            .await
        }
        MenuTarget::Support => {
            ctx.sessions
                .update(user_id, |session| {
                    session.mode = Mode::AwaitingSupportMessage
                })
                .await;
            edit(
                bot,
                chat_id,
                message_id,
                "Support: send one message describing your issue and our team will respond soon."
                    .to_string(),
                Some(main_menu_markup()),
            )
            .await
        }
    }
}

async fn handle_product_pick(
    bot: &Bot,
    ctx: &AppContext,
    user_id: i64,
    chat_id: ChatId,
    message_id: MessageId,
    product: &str,
) -> Result<()> {
    let Some(entry) = ctx.catalog.product(product) else {
        // Stale keyboard from an older catalog; re-render the product list.
        debug!(user_id, product, "Unknown product selected");
        return edit(
            bot,
            chat_id,
            message_id,
            "That product is no longer available. Choose a product:".to_string(),
            Some(products_markup(&ctx.catalog)),
        )
        .await;
    };

    let markup = durations_markup(entry);
    ctx.sessions
        .update(user_id, |session| {
            session.draft = Some(Draft::with_product(product));
            session.mode = Mode::None;
        })
        .await;

    edit(
        bot,
        chat_id,
        message_id,
        format!("Selected {product}. Choose duration:"),
        Some(markup),
    )
    .await
}

async fn handle_duration_pick(
    bot: &Bot,
    ctx: &AppContext,
    user_id: i64,
    chat_id: ChatId,
    message_id: MessageId,
    product: &str,
    duration: &str,
) -> Result<()> {
    let Some(price) = ctx.catalog.price(product, duration) else {
        debug!(user_id, product, duration, "Unknown duration selected");
        // Re-render the prior step without touching the draft.
        return match ctx.catalog.product(product) {
            Some(entry) => {
                edit(
                    bot,
                    chat_id,
                    message_id,
                    "That option is no longer available. Choose duration:".to_string(),
                    Some(durations_markup(entry)),
                )
                .await
            }
            None => {
                edit(
                    bot,
                    chat_id,
                    message_id,
                    "That product is no longer available. Choose a product:".to_string(),
                    Some(products_markup(&ctx.catalog)),
                )
                .await
            }
        };
    };

    let mut session = ctx.sessions.get(user_id).await;
    let mut draft = session.draft.take().unwrap_or_default();
    draft.select_duration(product, duration, price);

    match ctx.catalog.capture(product) {
        Capture::Login => {
            session.draft = Some(draft);
            session.mode = Mode::None;
            ctx.sessions.set(user_id, session).await;
            edit(
                bot,
                chat_id,
                message_id,
                "Choose account type:".to_string(),
                Some(account_type_markup()),
            )
            .await
        }
        Capture::Detail => {
            session.draft = Some(draft);
            session.mode = Mode::AwaitingDetail;
            ctx.sessions.set(user_id, session).await;
            edit(
                bot,
                chat_id,
                message_id,
                "Send the order details as text or a photo.".to_string(),
                None,
            )
            .await
        }
        Capture::None => {
            // No account choice for these products; seller fulfills.
            draft
                .select_account_type(AccountType::SellerProvided)
                .expect("duration was just set");
            let summary = render_order_summary(&draft);
            session.draft = Some(draft);
            session.mode = Mode::None;
            ctx.sessions.set(user_id, session).await;
            edit(bot, chat_id, message_id, summary, Some(confirm_markup())).await
        }
    }
}

async fn handle_account_type_pick(
    bot: &Bot,
    ctx: &AppContext,
    user_id: i64,
    chat_id: ChatId,
    message_id: MessageId,
    account_type: AccountType,
) -> Result<()> {
    let mut session = ctx.sessions.get(user_id).await;
    let summary = session.draft.as_mut().and_then(|draft| {
        draft
            .select_account_type(account_type)
            .ok()
            .map(|_| render_order_summary(draft))
    });
    let Some(summary) = summary else {
        ctx.sessions.clear(user_id).await;
        return edit(
            bot,
            chat_id,
            message_id,
            NO_DRAFT.to_string(),
            Some(main_menu_markup()),
        )
        .await;
    };

    match account_type {
        AccountType::UserProvided => {
            session.mode = Mode::AwaitingCredentials;
            ctx.sessions.set(user_id, session).await;
            edit(
                bot,
                chat_id,
                message_id,
                "Please send your email and password in this format:\nemail,password".to_string(),
                None,
            )
            .await
        }
        AccountType::SellerProvided => {
            session.mode = Mode::None;
            ctx.sessions.set(user_id, session).await;
            edit(bot, chat_id, message_id, summary, Some(confirm_markup())).await
        }
    }
}

async fn handle_confirm(
    bot: &Bot,
    ctx: &AppContext,
    q: &CallbackQuery,
    user_id: i64,
    chat_id: ChatId,
    message_id: MessageId,
) -> Result<()> {
    let session = ctx.sessions.get(user_id).await;
    let Some(draft) = session.draft.as_ref() else {
        ctx.sessions.clear(user_id).await;
        return edit(
            bot,
            chat_id,
            message_id,
            NO_DRAFT.to_string(),
            Some(main_menu_markup()),
        )
        .await;
    };

    let capture = ctx
        .catalog
        .capture(draft.product.as_deref().unwrap_or_default());
    let new_order = match NewOrder::from_draft(draft, capture, user_id, q.from.username.clone()) {
        Ok(new_order) => new_order,
        Err(missing) => {
            // A partial draft must never become an order.
            debug!(user_id, missing, "Confirm rejected, draft incomplete");
            ctx.sessions.clear(user_id).await;
            return edit(
                bot,
                chat_id,
                message_id,
                format!("Cannot confirm: {missing} is missing. Please start again."),
                Some(main_menu_markup()),
            )
            .await;
        }
    };

    let (order_id, order) = {
        let conn = ctx.conn.lock().await;
        let order_id = db::create_order(&conn, &new_order)?;
        let order = db::get_order(&conn, order_id)?;
        (order_id, order)
    };

    if ctx.flow.collect_payment_evidence {
        // Admin notification is deferred until payment evidence arrives.
        ctx.sessions
            .set(
                user_id,
                Session {
                    draft: None,
                    mode: Mode::AwaitingPaymentEvidence { order_id },
                },
            )
            .await;
        edit(
            bot,
            chat_id,
            message_id,
            render_payment_instructions(
                ctx.config.upi_id.as_deref(),
                ctx.config.binance_id.as_deref(),
                order_id,
            ),
            Some(payment_markup(order_id)),
        )
        .await
    } else {
        ctx.sessions.clear(user_id).await;
        edit(
            bot,
            chat_id,
            message_id,
            format!("Order #{order_id} submitted. Awaiting admin review."),
            Some(main_menu_markup()),
        )
        .await?;
        if let Some(order) = order {
            notifier::notify_admin_new_order(bot, ctx.config.admin_chat_id, &order).await;
        }
        Ok(())
    }
}

async fn handle_payment_submitted(
    bot: &Bot,
    ctx: &AppContext,
    user_id: i64,
    chat_id: ChatId,
    message_id: MessageId,
    order_id: i64,
) -> Result<()> {
    let order = {
        let conn = ctx.conn.lock().await;
        db::get_order(&conn, order_id)?
    };

    // The token must reference this user's own still-pending order.
    let valid = order
        .as_ref()
        .map(|order| order.user_id == user_id && !order.status.is_terminal())
        .unwrap_or(false);
    if !valid {
        debug!(user_id, order_id, "Stale or foreign payment token");
        return edit(
            bot,
            chat_id,
            message_id,
            format!("Order #{order_id} can no longer accept payment evidence."),
            Some(main_menu_markup()),
        )
        .await;
    }

    ctx.sessions
        .update(user_id, |session| {
            session.mode = Mode::AwaitingPaymentEvidence { order_id }
        })
        .await;
    edit(
        bot,
        chat_id,
        message_id,
        "Send Transaction ID OR upload payment screenshot.".to_string(),
        None,
    )
    .await
}
