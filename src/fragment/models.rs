//! Data models for gifts, their attributes, and ownership history.

use crate::client::ClientInner;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::sync::Weak;

/// A gift as shown on a listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gift {
    /// Number shown as `#N` on the card
    pub id: u64,
    /// Display name
    pub name: String,
    /// Collection slug (e.g. "plushpepe")
    pub slug: String,
    /// Listed price in TON
    pub price: Option<f64>,
    /// Absolute URL of the detail page
    pub url: String,
    /// Whether the card carries a price
    pub is_sale: bool,
    /// Non-owning handle used by `get_info`
    #[serde(skip)]
    pub(crate) client: Weak<ClientInner>,
}

impl Gift {
    /// Creates a gift that is not yet bound to a client.
    pub fn new(
        id: u64,
        name: impl Into<String>,
        slug: impl Into<String>,
        price: Option<f64>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            slug: slug.into(),
            price,
            url: url.into(),
            is_sale: price.is_some(),
            client: Weak::new(),
        }
    }

    /// Path of the detail page relative to the marketplace root.
    pub fn detail_path(&self) -> String {
        detail_path(&self.slug, self.id)
    }
}

impl PartialEq for Gift {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.slug == other.slug
            && self.price == other.price
            && self.url == other.url
            && self.is_sale == other.is_sale
    }
}

pub(crate) fn detail_path(slug: &str, id: u64) -> String {
    format!("gift/{}-{}", slug, id)
}

/// One page of listing results.
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    /// Gifts in page order
    pub gifts: Vec<Gift>,
    /// Whether the page advertises a continuation
    pub has_next: bool,
}

impl ListingPage {
    pub fn count(&self) -> usize {
        self.gifts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gifts.is_empty()
    }
}

/// A categorical attribute such as model, backdrop or symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    /// Share of the collection with this value, in percent
    pub rarity: Option<f64>,
}

/// Position of a gift in its collection's issue counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issued {
    pub number: u64,
    pub total: Option<u64>,
}

/// Full detail of a single gift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftInfo {
    pub id: u64,
    pub slug: String,
    /// Current owner, absent for unassigned items
    pub owner: Option<String>,
    pub model: Option<Attribute>,
    pub backdrop: Option<Attribute>,
    pub symbol: Option<Attribute>,
    pub issued: Option<Issued>,
    /// Asking price or current bid in TON
    pub ton_price: Option<f64>,
    /// Display conversion of `ton_price`; not authoritative
    pub usd_price: Option<f64>,
    pub is_sale: bool,
    /// Ownership history in the order the page lists it
    pub history: Vec<OwnershipHistory>,
}

impl GiftInfo {
    /// Most recent history entry, assuming the page lists newest first.
    pub fn latest_transfer(&self) -> Option<&OwnershipHistory> {
        self.history.first()
    }
}

/// One row of the ownership history table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnershipHistory {
    /// Price in TON, None for free transfers or unreadable cells
    pub price: Option<f64>,
    /// Date text as shown on the page
    pub date: String,
    /// Machine-readable timestamp when the page provides one
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub buyer: String,
}
