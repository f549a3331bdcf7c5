//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::catalog::{Catalog, Product};
use crate::db::{Order, OrderStatus, OrderSummary};
use crate::session::Draft;

/// Main menu shown on /start and after every completed flow.
pub fn main_menu_markup() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback("🛒 Order", "menu:order")],
        vec![InlineKeyboardButton::callback("📦 My Orders", "menu:orders")],
        vec![InlineKeyboardButton::callback("👤 Profile", "menu:profile")],
        vec![InlineKeyboardButton::callback("📞 Support", "menu:support")],
    ])
}

/// One button per catalog product, plus a back button.
pub fn products_markup(catalog: &Catalog) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = catalog
        .products()
        .iter()
        .map(|product| {
            vec![InlineKeyboardButton::callback(
                product.name.clone(),
                format!("product:{}", product.name),
            )]
        })
        .collect();
    rows.push(vec![InlineKeyboardButton::callback("⬅️ Back", "menu:home")]);
    InlineKeyboardMarkup::new(rows)
}

/// Duration plans for one product, with prices on the labels.
pub fn durations_markup(product: &Product) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = product
        .plans
        .iter()
        .map(|plan| {
            vec![InlineKeyboardButton::callback(
                format!("{} - ₹{}", plan.duration, plan.price),
                format!("duration:{}:{}", product.name, plan.duration),
            )]
        })
        .collect();
    rows.push(vec![InlineKeyboardButton::callback("⬅️ Back", "menu:order")]);
    InlineKeyboardMarkup::new(rows)
}

pub fn account_type_markup() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "Use My Account",
            "acct:USER_PROVIDED",
        )],
        vec![InlineKeyboardButton::callback(
            "Use Seller Account",
            "acct:OUR_ACCOUNT",
        )],
    ])
}

pub fn confirm_markup() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "✅ Confirm Order",
            "order:confirm",
        )],
        vec![InlineKeyboardButton::callback("⬅️ Main Menu", "menu:home")],
    ])
}

/// Shown with the payment instructions after confirmation.
pub fn payment_markup(order_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "I Have Paid",
            format!("paid:{order_id}"),
        )],
        vec![InlineKeyboardButton::callback("⬅️ Main Menu", "menu:home")],
    ])
}

/// Approve/Reject controls attached to the admin's new-order notification.
pub fn admin_review_markup(order_id: i64, customer_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback(
            "Approve",
            format!("admin:APPROVE:{order_id}:{customer_id}"),
        ),
        InlineKeyboardButton::callback(
            "Reject",
            format!("admin:REJECTED:{order_id}:{customer_id}"),
        ),
    ]])
}

/// The order summary shown before the confirm button.
pub fn render_order_summary(draft: &Draft) -> String {
    let mut summary = format!(
        "Order Summary\nProduct: {}\nDuration: {}\nPrice: ₹{}\nAccount Type: {}",
        draft.product.as_deref().unwrap_or("-"),
        draft.duration.as_deref().unwrap_or("-"),
        draft.price.map_or("-".to_string(), |p| p.to_string()),
        draft
            .account_type
            .map(|t| t.as_str())
            .unwrap_or("OUR_ACCOUNT"),
    );
    if let Some(email) = &draft.email {
        summary.push_str(&format!("\nAccount Email: {email}"));
    }
    if draft.details_text.is_some() {
        summary.push_str("\nDetails: provided");
    } else if draft.details_file_ref.is_some() {
        summary.push_str("\nDetails: photo attached");
    }
    summary
}

/// Bullet list for "My Orders"; the store already caps and orders the rows.
pub fn render_orders_list(orders: &[OrderSummary]) -> String {
    if orders.is_empty() {
        return "You have no orders yet.".to_string();
    }
    orders
        .iter()
        .map(|order| {
            format!(
                "• Order #{} | {} {} | {}",
                order.id,
                order.product,
                order.duration,
                order.status.as_str()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_profile(
    user_id: i64,
    username: Option<&str>,
    total: i64,
    approved: i64,
) -> String {
    let handle = username
        .map(|name| format!("@{name}"))
        .unwrap_or_else(|| "N/A".to_string());
    format!(
        "Profile\nUser ID: {user_id}\nUsername: {handle}\nTotal Orders: {total}\nApproved Orders: {approved}"
    )
}

pub fn render_payment_instructions(
    upi_id: Option<&str>,
    binance_id: Option<&str>,
    order_id: i64,
) -> String {
    format!(
        "Payment Instructions:\nUPI: {}\nBinance ID: {}\n\nOrder ID: #{order_id}\nClick below after payment.",
        upi_id.unwrap_or("Not configured"),
        binance_id.unwrap_or("Not configured"),
    )
}

/// The new-order summary pushed to the operator.
pub fn render_admin_notification(order: &Order) -> String {
    format!(
        "New Order:\nOrder ID: #{}\nUser: {} ({})\nProduct: {}\nDuration: {}\nAccount Type: {}\nTxn ID: {}",
        order.id,
        order.username.as_deref().unwrap_or("N/A"),
        order.user_id,
        order.product,
        order.duration,
        order.account_type,
        order.payment_reference.as_deref().unwrap_or("N/A"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::AccountType;

    #[test]
    fn test_order_summary_includes_selection() {
        let mut draft = Draft::with_product("Spotify");
        draft.select_duration("Spotify", "2M", 49);
        draft.select_account_type(AccountType::UserProvided).unwrap();
        draft
            .set_credentials("a@b.com".into(), "secret".into())
            .unwrap();

        let summary = render_order_summary(&draft);
        assert!(summary.contains("Product: Spotify"));
        assert!(summary.contains("Duration: 2M"));
        assert!(summary.contains("Price: ₹49"));
        assert!(summary.contains("Account Type: USER_PROVIDED"));
        assert!(summary.contains("Account Email: a@b.com"));
        // The secret never appears in any rendered message.
        assert!(!summary.contains("secret"));
    }

    #[test]
    fn test_orders_list_empty_state() {
        assert_eq!(render_orders_list(&[]), "You have no orders yet.");
    }

    #[test]
    fn test_orders_list_rows() {
        let orders = vec![
            OrderSummary {
                id: 9,
                product: "YT".into(),
                duration: "1M".into(),
                status: OrderStatus::Approved,
            },
            OrderSummary {
                id: 3,
                product: "Gemini".into(),
                duration: "12M".into(),
                status: OrderStatus::Pending,
            },
        ];
        let text = render_orders_list(&orders);
        assert_eq!(
            text,
            "• Order #9 | YT 1M | APPROVED\n• Order #3 | Gemini 12M | PENDING"
        );
    }

    #[test]
    fn test_profile_handles_missing_username() {
        let text = render_profile(42, None, 3, 1);
        assert!(text.contains("Username: N/A"));
        let text = render_profile(42, Some("alice"), 3, 1);
        assert!(text.contains("Username: @alice"));
    }

    #[test]
    fn test_payment_instructions_fallbacks() {
        let text = render_payment_instructions(None, Some("bnb-1"), 7);
        assert!(text.contains("UPI: Not configured"));
        assert!(text.contains("Binance ID: bnb-1"));
        assert!(text.contains("Order ID: #7"));
    }

    #[test]
    fn test_keyboard_payloads_parse_back() {
        use crate::callback::CallbackAction;

        let catalog = Catalog::storefront();
        let markup = products_markup(&catalog);
        // Every generated payload must round-trip through the parser.
        for row in &markup.inline_keyboard {
            for button in row {
                if let teloxide::types::InlineKeyboardButtonKind::CallbackData(data) = &button.kind
                {
                    assert!(CallbackAction::parse(data).is_some(), "unparsable: {data}");
                }
            }
        }

        let markup = admin_review_markup(7, 12345);
        for row in &markup.inline_keyboard {
            for button in row {
                if let teloxide::types::InlineKeyboardButtonKind::CallbackData(data) = &button.kind
                {
                    assert!(CallbackAction::parse(data).is_some(), "unparsable: {data}");
                }
            }
        }
    }
}
