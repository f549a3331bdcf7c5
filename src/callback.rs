//! Callback payload parsing.
//!
//! Inline-keyboard buttons carry colon-delimited tokens. They are parsed into
//! a closed set of actions at the dispatch boundary; anything malformed is
//! dropped there instead of failing deep inside a handler.

use crate::session::AccountType;

/// Main-menu destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuTarget {
    Home,
    Order,
    Orders,
    Profile,
    Support,
}

/// Operator decision on a submitted order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

/// Every inline-button action the bot understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Menu(MenuTarget),
    PickProduct {
        product: String,
    },
    PickDuration {
        product: String,
        duration: String,
    },
    PickAccountType(AccountType),
    ConfirmOrder,
    PaymentSubmitted {
        order_id: i64,
    },
    AdminDecision {
        decision: Decision,
        order_id: i64,
        customer_id: i64,
    },
}

impl CallbackAction {
    /// Parse a raw callback payload. Returns `None` for unknown categories,
    /// wrong arity, or non-numeric ids.
    pub fn parse(data: &str) -> Option<Self> {
        let (category, rest) = data.split_once(':')?;
        match category {
            "menu" => {
                let target = match rest {
                    "home" => MenuTarget::Home,
                    "order" => MenuTarget::Order,
                    "orders" => MenuTarget::Orders,
                    "profile" => MenuTarget::Profile,
                    "support" => MenuTarget::Support,
                    _ => return None,
                };
                Some(CallbackAction::Menu(target))
            }
            "product" if !rest.is_empty() => Some(CallbackAction::PickProduct {
                product: rest.to_string(),
            }),
            "duration" => {
                let (product, duration) = rest.split_once(':')?;
                if product.is_empty() || duration.is_empty() {
                    return None;
                }
                Some(CallbackAction::PickDuration {
                    product: product.to_string(),
                    duration: duration.to_string(),
                })
            }
            "acct" => AccountType::parse(rest).map(CallbackAction::PickAccountType),
            "order" if rest == "confirm" => Some(CallbackAction::ConfirmOrder),
            "paid" => rest
                .parse::<i64>()
                .ok()
                .map(|order_id| CallbackAction::PaymentSubmitted { order_id }),
            "admin" => {
                let mut parts = rest.splitn(3, ':');
                let decision = match parts.next()? {
                    "APPROVE" => Decision::Approve,
                    "REJECTED" => Decision::Reject,
                    _ => return None,
                };
                let order_id = parts.next()?.parse::<i64>().ok()?;
                let customer_id = parts.next()?.parse::<i64>().ok()?;
                Some(CallbackAction::AdminDecision {
                    decision,
                    order_id,
                    customer_id,
                })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_menu_tokens() {
        assert_eq!(
            CallbackAction::parse("menu:home"),
            Some(CallbackAction::Menu(MenuTarget::Home))
        );
        assert_eq!(
            CallbackAction::parse("menu:support"),
            Some(CallbackAction::Menu(MenuTarget::Support))
        );
        assert_eq!(CallbackAction::parse("menu:settings"), None);
    }

    #[test]
    fn test_parse_selection_tokens() {
        assert_eq!(
            CallbackAction::parse("product:Spotify"),
            Some(CallbackAction::PickProduct {
                product: "Spotify".to_string()
            })
        );
        assert_eq!(
            CallbackAction::parse("duration:Spotify:2M"),
            Some(CallbackAction::PickDuration {
                product: "Spotify".to_string(),
                duration: "2M".to_string()
            })
        );
        assert_eq!(
            CallbackAction::parse("acct:USER_PROVIDED"),
            Some(CallbackAction::PickAccountType(AccountType::UserProvided))
        );
        assert_eq!(CallbackAction::parse("order:confirm"), Some(CallbackAction::ConfirmOrder));
        assert_eq!(
            CallbackAction::parse("paid:42"),
            Some(CallbackAction::PaymentSubmitted { order_id: 42 })
        );
    }

    #[test]
    fn test_parse_admin_tokens() {
        assert_eq!(
            CallbackAction::parse("admin:APPROVE:7:12345"),
            Some(CallbackAction::AdminDecision {
                decision: Decision::Approve,
                order_id: 7,
                customer_id: 12345
            })
        );
        assert_eq!(
            CallbackAction::parse("admin:REJECTED:7:12345"),
            Some(CallbackAction::AdminDecision {
                decision: Decision::Reject,
                order_id: 7,
                customer_id: 12345
            })
        );
    }

    #[test]
    fn test_parse_rejects_malformed_payloads() {
        assert_eq!(CallbackAction::parse(""), None);
        assert_eq!(CallbackAction::parse("garbage"), None);
        assert_eq!(CallbackAction::parse("product:"), None);
        assert_eq!(CallbackAction::parse("duration:Spotify"), None);
        assert_eq!(CallbackAction::parse("duration::2M"), None);
        assert_eq!(CallbackAction::parse("acct:SOMETHING_ELSE"), None);
        assert_eq!(CallbackAction::parse("order:cancel"), None);
        assert_eq!(CallbackAction::parse("paid:notanumber"), None);
        assert_eq!(CallbackAction::parse("admin:APPROVE:7"), None);
        assert_eq!(CallbackAction::parse("admin:MAYBE:7:1"), None);
        assert_eq!(CallbackAction::parse("admin:APPROVE:x:1"), None);
    }
}
