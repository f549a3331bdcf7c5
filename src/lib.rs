//! # Storefront Telegram Bot
//!
//! A conversational storefront: customers assemble subscription orders
//! through inline menus, attach payment evidence, and an operator approves
//! or rejects each order from a review message.

pub mod bot;
pub mod callback;
pub mod catalog;
pub mod config;
pub mod db;
pub mod health;
pub mod session;
