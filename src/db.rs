//! Order and support-ticket persistence over SQLite.
//!
//! All functions take a `&Connection`; the caller shares one connection
//! behind an `Arc<Mutex<_>>`. Single-statement atomicity is all the flow
//! needs: each commit step is one insert or one guarded update.

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::info;

use crate::catalog::Capture;
use crate::session::Draft;

/// Order lifecycle status. `Pending` is initial; `Approved` and `Rejected`
/// are terminal and never transition again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Approved,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Approved => "APPROVED",
            OrderStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(OrderStatus::Pending),
            "APPROVED" => Some(OrderStatus::Approved),
            "REJECTED" => Some(OrderStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Approved | OrderStatus::Rejected)
    }
}

impl ToSql for OrderStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for OrderStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        OrderStatus::parse(value.as_str()?).ok_or(FromSqlError::InvalidType)
    }
}

/// A persisted order row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub product: String,
    pub duration: String,
    pub price: Option<i64>,
    pub account_type: String,
    pub email: Option<String>,
    pub password: Option<String>,
    pub details_text: Option<String>,
    pub details_file_ref: Option<String>,
    pub status: OrderStatus,
    pub created_at: String,
    pub payment_reference: Option<String>,
}

/// Fields for a new pending order, copied out of a completed draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: i64,
    pub username: Option<String>,
    pub product: String,
    pub duration: String,
    pub price: i64,
    pub account_type: String,
    pub email: Option<String>,
    pub password: Option<String>,
    pub details_text: Option<String>,
    pub details_file_ref: Option<String>,
}

impl NewOrder {
    /// Copy a draft into insertable order fields. Fails with the name of the
    /// first missing field when the draft is incomplete for its capture
    /// policy, so a stale or partial draft can never become an order.
    pub fn from_draft(
        draft: &Draft,
        capture: Capture,
        user_id: i64,
        username: Option<String>,
    ) -> Result<Self, &'static str> {
        if let Some(missing) = draft.missing_field(capture) {
            return Err(missing);
        }
        Ok(Self {
            user_id,
            username,
            product: draft.product.clone().ok_or("product")?,
            duration: draft.duration.clone().ok_or("duration")?,
            price: draft.price.ok_or("duration")?,
            account_type: draft
                .account_type
                .unwrap_or(crate::session::AccountType::SellerProvided)
                .as_str()
                .to_string(),
            email: draft.email.clone(),
            password: draft.password.clone(),
            details_text: draft.details_text.clone(),
            details_file_ref: draft.details_file_ref.clone(),
        })
    }
}

/// A compact row for the "My Orders" listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSummary {
    pub id: i64,
    pub product: String,
    pub duration: String,
    pub status: OrderStatus,
}

/// Initialize the database schema. Idempotent.
pub fn init_schema(conn: &Connection) -> Result<()> {
    info!("Initializing database schema...");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS orders (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            username TEXT,
            product TEXT NOT NULL,
            duration TEXT NOT NULL,
            price INTEGER,
            account_type TEXT NOT NULL,
            email TEXT,
            password TEXT,
            details_text TEXT,
            details_file_ref TEXT,
            status TEXT NOT NULL DEFAULT 'PENDING',
            created_at TEXT NOT NULL,
            payment_reference TEXT
        )",
        [],
    )
    .context("Failed to create orders table")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS support_tickets (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            username TEXT,
            message_text TEXT NOT NULL,
            created_at TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'open'
        )",
        [],
    )
    .context("Failed to create support_tickets table")?;

    info!("Database schema initialized successfully");
    Ok(())
}

fn utc_now_seconds() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Insert a new pending order and return its id.
pub fn create_order(conn: &Connection, order: &NewOrder) -> Result<i64> {
    conn.execute(
        "INSERT INTO orders (
            user_id, username, product, duration, price, account_type,
            email, password, details_text, details_file_ref, status, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 'PENDING', ?11)",
        params![
            order.user_id,
            order.username,
            order.product,
            order.duration,
            order.price,
            order.account_type,
            order.email,
            order.password,
            order.details_text,
            order.details_file_ref,
            utc_now_seconds(),
        ],
    )
    .context("Failed to insert new order")?;

    let order_id = conn.last_insert_rowid();
    info!(order_id, user_id = order.user_id, "Order created");
    Ok(order_id)
}

/// Transition a pending order to a new status.
///
/// The update is guarded on `status = 'PENDING'`, so a terminal status can
/// never be overwritten. Returns false when no row transitioned.
pub fn update_order_status(conn: &Connection, order_id: i64, status: OrderStatus) -> Result<bool> {
    let rows_affected = conn
        .execute(
            "UPDATE orders SET status = ?1 WHERE id = ?2 AND status = 'PENDING'",
            params![status, order_id],
        )
        .context("Failed to update order status")?;

    if rows_affected > 0 {
        info!(order_id, status = status.as_str(), "Order status updated");
    }
    Ok(rows_affected > 0)
}

/// Attach payment evidence to an order that is still awaiting review.
///
/// Refused once the order has a terminal status. Returns false when nothing
/// was updated (unknown id or already reviewed).
pub fn attach_payment_reference(
    conn: &Connection,
    order_id: i64,
    reference: &str,
) -> Result<bool> {
    let rows_affected = conn
        .execute(
            "UPDATE orders SET payment_reference = ?1
             WHERE id = ?2 AND status NOT IN ('APPROVED', 'REJECTED')",
            params![reference, order_id],
        )
        .context("Failed to attach payment reference")?;

    if rows_affected > 0 {
        info!(order_id, "Payment reference attached");
    }
    Ok(rows_affected > 0)
}

/// Fetch a single order by id.
pub fn get_order(conn: &Connection, order_id: i64) -> Result<Option<Order>> {
    conn.query_row(
        "SELECT id, user_id, username, product, duration, price, account_type,
                email, password, details_text, details_file_ref, status,
                created_at, payment_reference
         FROM orders WHERE id = ?1",
        params![order_id],
        |row| {
            Ok(Order {
                id: row.get(0)?,
                user_id: row.get(1)?,
                username: row.get(2)?,
                product: row.get(3)?,
                duration: row.get(4)?,
                price: row.get(5)?,
                account_type: row.get(6)?,
                email: row.get(7)?,
                password: row.get(8)?,
                details_text: row.get(9)?,
                details_file_ref: row.get(10)?,
                status: row.get(11)?,
                created_at: row.get(12)?,
                payment_reference: row.get(13)?,
            })
        },
    )
    .optional()
    .context("Failed to read order")
}

/// The user's most recent orders, newest first, capped at 20 rows.
pub fn list_orders_for_user(conn: &Connection, user_id: i64) -> Result<Vec<OrderSummary>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, product, duration, status FROM orders
             WHERE user_id = ?1 ORDER BY id DESC LIMIT 20",
        )
        .context("Failed to prepare order listing")?;

    let rows = stmt
        .query_map(params![user_id], |row| {
            Ok(OrderSummary {
                id: row.get(0)?,
                product: row.get(1)?,
                duration: row.get(2)?,
                status: row.get(3)?,
            })
        })
        .context("Failed to list orders")?;

    let mut orders = Vec::new();
    for row in rows {
        orders.push(row.context("Failed to read order row")?);
    }
    Ok(orders)
}

/// Total and approved order counts for the profile view.
pub fn counts_for_user(conn: &Connection, user_id: i64) -> Result<(i64, i64)> {
    let total: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM orders WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .context("Failed to count orders")?;

    let approved: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM orders WHERE user_id = ?1 AND status = 'APPROVED'",
            params![user_id],
            |row| row.get(0),
        )
        .context("Failed to count approved orders")?;

    Ok((total, approved))
}

/// Record a support ticket and return its id.
pub fn create_support_ticket(
    conn: &Connection,
    user_id: i64,
    username: Option<&str>,
    message_text: &str,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO support_tickets (user_id, username, message_text, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![user_id, username, message_text, utc_now_seconds()],
    )
    .context("Failed to insert support ticket")?;

    let ticket_id = conn.last_insert_rowid();
    info!(ticket_id, user_id, "Support ticket created");
    Ok(ticket_id)
}
