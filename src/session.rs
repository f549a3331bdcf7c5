//! Per-user session state: the order draft under construction and the
//! current input mode.
//!
//! Sessions live only in memory. A process restart loses in-progress drafts
//! by design; committed orders are already in the database by then.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::catalog::Capture;

/// Who supplies the account an order is fulfilled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountType {
    /// Customer hands over their own login.
    UserProvided,
    /// Seller fulfills on an account they control.
    SellerProvided,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::UserProvided => "USER_PROVIDED",
            AccountType::SellerProvided => "OUR_ACCOUNT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "USER_PROVIDED" => Some(AccountType::UserProvided),
            "OUR_ACCOUNT" => Some(AccountType::SellerProvided),
            _ => None,
        }
    }
}

/// How the next unstructured message from this user is interpreted.
/// At most one mode is active per user at any time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    None,
    AwaitingCredentials,
    AwaitingDetail,
    AwaitingSupportMessage,
    AwaitingPaymentEvidence {
        order_id: i64,
    },
}

/// An order under construction. Fields fill strictly in sequence:
/// product, then duration (with a snapshotted price), then account type,
/// then credentials or a fulfillment detail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub product: Option<String>,
    pub duration: Option<String>,
    pub price: Option<i64>,
    pub account_type: Option<AccountType>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub details_text: Option<String>,
    pub details_file_ref: Option<String>,
}

impl Draft {
    /// Start a fresh draft at the product step. Any previously captured
    /// downstream fields are discarded with the old draft.
    pub fn with_product(product: &str) -> Self {
        Self {
            product: Some(product.to_string()),
            ..Self::default()
        }
    }

    /// Record the duration pick with its catalog price snapshot. The product
    /// is set as well so a stale draft cannot pair a duration with a product
    /// it never belonged to.
    pub fn select_duration(&mut self, product: &str, duration: &str, price: i64) {
        self.product = Some(product.to_string());
        self.duration = Some(duration.to_string());
        self.price = Some(price);
    }

    /// Record the account-type pick. Refused while no duration is set.
    pub fn select_account_type(&mut self, account_type: AccountType) -> Result<(), &'static str> {
        if self.duration.is_none() {
            return Err("duration_not_selected");
        }
        self.account_type = Some(account_type);
        if account_type == AccountType::SellerProvided {
            self.email = None;
            self.password = None;
        }
        Ok(())
    }

    /// Attach customer credentials. Refused while no account type is set.
    pub fn set_credentials(&mut self, email: String, password: String) -> Result<(), &'static str> {
        if self.account_type != Some(AccountType::UserProvided) {
            return Err("account_type_not_selected");
        }
        self.email = Some(email);
        self.password = Some(password);
        Ok(())
    }

    /// Attach a text fulfillment detail. Text and photo are mutually
    /// exclusive; setting one clears the other.
    pub fn set_detail_text(&mut self, text: String) {
        self.details_text = Some(text);
        self.details_file_ref = None;
    }

    /// Attach a photo fulfillment detail.
    pub fn set_detail_file(&mut self, file_ref: String) {
        self.details_file_ref = Some(file_ref);
        self.details_text = None;
    }

    /// The first field still missing for the given capture policy, or `None`
    /// when the draft is ready to confirm.
    pub fn missing_field(&self, capture: Capture) -> Option<&'static str> {
        if self.product.is_none() {
            return Some("product");
        }
        if self.duration.is_none() || self.price.is_none() {
            return Some("duration");
        }
        match capture {
            Capture::Login => {
                match self.account_type {
                    None => return Some("account type"),
                    Some(AccountType::UserProvided) => {
                        if self.email.is_none() || self.password.is_none() {
                            return Some("credentials");
                        }
                    }
                    Some(AccountType::SellerProvided) => {}
                }
            }
            Capture::Detail => {
                if self.details_text.is_none() && self.details_file_ref.is_none() {
                    return Some("order details");
                }
            }
            Capture::None => {}
        }
        None
    }
}

/// Parse a `email,password` credential message.
///
/// Exactly one comma split into two non-empty trimmed fields; the password
/// may itself contain commas.
pub fn parse_credentials(input: &str) -> Result<(String, String), &'static str> {
    let trimmed = input.trim();
    let (email, password) = trimmed.split_once(',').ok_or("missing_separator")?;
    let email = email.trim();
    let password = password.trim();
    if email.is_empty() || password.is_empty() {
        return Err("empty_field");
    }
    Ok((email.to_string(), password.to_string()))
}

/// Everything the flow controller tracks for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub draft: Option<Draft>,
    pub mode: Mode,
}

/// In-memory session store keyed by Telegram user id.
///
/// Injected into handlers through the shared app context; cleared on
/// "home", confirmation, or `/start`.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<i64, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the user's session (default when none exists yet).
    pub async fn get(&self, user_id: i64) -> Session {
        self.inner
            .lock()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Replace the user's session.
    pub async fn set(&self, user_id: i64, session: Session) {
        self.inner.lock().await.insert(user_id, session);
    }

    /// Mutate the user's session in place, creating it if missing.
    pub async fn update<F>(&self, user_id: i64, f: F)
    where
        F: FnOnce(&mut Session),
    {
        let mut sessions = self.inner.lock().await;
        f(sessions.entry(user_id).or_default());
    }

    /// Drop all state for a user. The universal escape hatch.
    pub async fn clear(&self, user_id: i64) {
        self.inner.lock().await.remove(&user_id);
    }
}
