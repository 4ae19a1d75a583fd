//! fragment-gifts - async scraper for Fragment gift listings
//!
//! Lists collectible gifts from fragment.com with filter and sort options,
//! and fetches per-gift attributes, prices and ownership history on demand.

pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod fragment;

pub use client::FragmentClient;
pub use config::Config;
pub use error::{FragmentError, Result};
pub use fragment::models::{Attribute, Gift, GiftInfo, Issued, OwnershipHistory};
pub use fragment::query::{GiftFilter, GiftSort, Query};
