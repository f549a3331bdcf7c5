//! End-to-end order flow tests against a temporary SQLite store.
//!
//! These walk the draft state machine the way the handlers do, without a
//! Telegram transport: catalog validation, draft accumulation, commit to the
//! store, payment evidence, and the operator decision.

use anyhow::Result;
use rusqlite::Connection;
use tempfile::NamedTempFile;

use storebot::bot::admin_handler::is_authorized;
use storebot::catalog::{Capture, Catalog, Product};
use storebot::db::{
    attach_payment_reference, counts_for_user, create_order, get_order, init_schema,
    list_orders_for_user, update_order_status, NewOrder, OrderStatus,
};
use storebot::session::{parse_credentials, AccountType, Draft};

fn test_catalog() -> Catalog {
    Catalog::new(vec![
        Product::new("ProductA", &[("30 days", 60)], Capture::Detail),
        Product::new("Spotify", &[("2M", 49)], Capture::Login),
        Product::new("YT", &[("1M", 25)], Capture::None),
    ])
}

fn setup_store() -> Result<(Connection, NamedTempFile)> {
    let temp_file = NamedTempFile::new()?;
    let conn = Connection::open(temp_file.path())?;
    init_schema(&conn)?;
    Ok((conn, temp_file))
}

#[test]
fn test_end_to_end_order_lifecycle() -> Result<()> {
    let catalog = test_catalog();
    let (conn, _temp_file) = setup_store()?;
    let user_id = 1001;

    // Customer walks the menu: product, duration, then a text detail.
    let mut draft = Draft::with_product("ProductA");
    let price = catalog.price("ProductA", "30 days").expect("catalog pair");
    draft.select_duration("ProductA", "30 days", price);
    draft.set_detail_text("ref123".to_string());

    let capture = catalog.capture("ProductA");
    let new_order = NewOrder::from_draft(&draft, capture, user_id, Some("alice".to_string()))
        .expect("draft is complete");
    let order_id = create_order(&conn, &new_order)?;

    let order = get_order(&conn, order_id)?.expect("order exists");
    assert_eq!(order.product, "ProductA");
    assert_eq!(order.duration, "30 days");
    assert_eq!(order.price, Some(60));
    assert_eq!(order.details_text.as_deref(), Some("ref123"));
    assert_eq!(order.status, OrderStatus::Pending);

    // Operator approves exactly once.
    assert!(update_order_status(&conn, order_id, OrderStatus::Approved)?);
    assert_eq!(
        get_order(&conn, order_id)?.unwrap().status,
        OrderStatus::Approved
    );
    assert!(!update_order_status(&conn, order_id, OrderStatus::Rejected)?);
    assert_eq!(
        get_order(&conn, order_id)?.unwrap().status,
        OrderStatus::Approved
    );

    Ok(())
}

#[test]
fn test_every_catalog_pair_commits_with_snapshot_price() -> Result<()> {
    let catalog = test_catalog();
    let (conn, _temp_file) = setup_store()?;

    for product in catalog.products() {
        for plan in &product.plans {
            let mut draft = Draft::with_product(&product.name);
            draft.select_duration(&product.name, &plan.duration, plan.price);
            match product.capture {
                Capture::Login => {
                    draft.select_account_type(AccountType::UserProvided).unwrap();
                    let (email, password) = parse_credentials("a@b.com,secret").unwrap();
                    draft.set_credentials(email, password).unwrap();
                }
                Capture::Detail => draft.set_detail_text("note".to_string()),
                Capture::None => {}
            }

            let new_order =
                NewOrder::from_draft(&draft, product.capture, 42, None).expect("complete draft");
            let order_id = create_order(&conn, &new_order)?;
            let order = get_order(&conn, order_id)?.unwrap();
            assert_eq!(order.price, Some(plan.price));
            assert_eq!(order.status, OrderStatus::Pending);
        }
    }

    Ok(())
}

#[test]
fn test_stale_duration_is_rejected_without_mutating_draft() {
    let catalog = test_catalog();

    let mut draft = Draft::with_product("ProductA");
    let before = draft.clone();

    // A stale keyboard references a duration the catalog no longer has; the
    // controller validates before touching the draft.
    assert_eq!(catalog.price("ProductA", "12M"), None);
    assert_eq!(draft, before);

    // And a duration belonging to a different product resolves the same way.
    assert_eq!(catalog.price("ProductA", "2M"), None);
    draft.select_duration(
        "ProductA",
        "30 days",
        catalog.price("ProductA", "30 days").unwrap(),
    );
    assert_eq!(draft.duration.as_deref(), Some("30 days"));
}

#[test]
fn test_confirm_with_missing_field_creates_nothing() -> Result<()> {
    let catalog = test_catalog();
    let (conn, _temp_file) = setup_store()?;
    let user_id = 2002;

    // Detail product without the detail.
    let mut draft = Draft::with_product("ProductA");
    draft.select_duration("ProductA", "30 days", 60);
    assert_eq!(
        NewOrder::from_draft(&draft, catalog.capture("ProductA"), user_id, None),
        Err("order details")
    );

    // Login product without credentials.
    let mut draft = Draft::with_product("Spotify");
    draft.select_duration("Spotify", "2M", 49);
    draft.select_account_type(AccountType::UserProvided).unwrap();
    assert_eq!(
        NewOrder::from_draft(&draft, catalog.capture("Spotify"), user_id, None),
        Err("credentials")
    );

    assert_eq!(counts_for_user(&conn, user_id)?, (0, 0));
    Ok(())
}

#[test]
fn test_credentials_flow_commits_email_and_secret() -> Result<()> {
    let catalog = test_catalog();
    let (conn, _temp_file) = setup_store()?;

    let mut draft = Draft::with_product("Spotify");
    draft.select_duration("Spotify", "2M", 49);
    draft.select_account_type(AccountType::UserProvided).unwrap();
    let (email, password) = parse_credentials("a@b.com,secret").expect("valid credentials");
    draft.set_credentials(email, password).unwrap();

    let new_order = NewOrder::from_draft(&draft, catalog.capture("Spotify"), 7, None).unwrap();
    let order_id = create_order(&conn, &new_order)?;
    let order = get_order(&conn, order_id)?.unwrap();
    assert_eq!(order.email.as_deref(), Some("a@b.com"));
    assert_eq!(order.password.as_deref(), Some("secret"));
    assert_eq!(order.account_type, "USER_PROVIDED");

    Ok(())
}

#[test]
fn test_payment_evidence_then_approval() -> Result<()> {
    let catalog = test_catalog();
    let (conn, _temp_file) = setup_store()?;

    let mut draft = Draft::with_product("YT");
    draft.select_duration("YT", "1M", 25);
    let new_order = NewOrder::from_draft(&draft, catalog.capture("YT"), 9, None).unwrap();
    let order_id = create_order(&conn, &new_order)?;

    assert!(attach_payment_reference(&conn, order_id, "txn-777")?);
    let order = get_order(&conn, order_id)?.unwrap();
    assert_eq!(order.payment_reference.as_deref(), Some("txn-777"));
    assert_eq!(order.status, OrderStatus::Pending);

    assert!(update_order_status(&conn, order_id, OrderStatus::Approved)?);
    // Evidence can no longer be attached once the order is reviewed.
    assert!(!attach_payment_reference(&conn, order_id, "txn-888")?);
    assert_eq!(
        get_order(&conn, order_id)?.unwrap().payment_reference.as_deref(),
        Some("txn-777")
    );

    Ok(())
}

#[test]
fn test_admin_gate_authorization() {
    // Only the configured principal passes; no configuration fails closed.
    assert!(is_authorized(Some(42), 42));
    assert!(!is_authorized(Some(42), 43));
    assert!(!is_authorized(None, 42));
}

#[test]
fn test_order_listing_reflects_history() -> Result<()> {
    let catalog = test_catalog();
    let (conn, _temp_file) = setup_store()?;
    let user_id = 3003;

    let mut draft = Draft::with_product("YT");
    draft.select_duration("YT", "1M", 25);
    let new_order = NewOrder::from_draft(&draft, catalog.capture("YT"), user_id, None).unwrap();

    let first = create_order(&conn, &new_order)?;
    let second = create_order(&conn, &new_order)?;
    update_order_status(&conn, first, OrderStatus::Approved)?;

    let orders = list_orders_for_user(&conn, user_id)?;
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].id, second);
    assert_eq!(orders[0].status, OrderStatus::Pending);
    assert_eq!(orders[1].id, first);
    assert_eq!(orders[1].status, OrderStatus::Approved);

    assert_eq!(counts_for_user(&conn, user_id)?, (2, 1));
    Ok(())
}
