//! # Coffee Bot
//!
//! A Telegram bot for ordering coffee. Users browse a fixed catalog, keep a
//! per-user cart and check it out into immutable orders, all through inline
//! keyboard buttons.

pub mod bot;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod localization;
pub mod memory_store;
pub mod model;
pub mod navigation;
pub mod route;
pub mod store;
