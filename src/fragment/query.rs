//! Listing query: collection slug, filter and sort, validated before any request.

use crate::error::{FragmentError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which listings to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GiftFilter {
    #[default]
    All,
    Auction,
    Sold,
    Sale,
}

impl GiftFilter {
    pub const ALLOWED: &'static [&'static str] = &["all", "auction", "sold", "sale"];

    pub fn as_str(&self) -> &'static str {
        match self {
            GiftFilter::All => "all",
            GiftFilter::Auction => "auction",
            GiftFilter::Sold => "sold",
            GiftFilter::Sale => "sale",
        }
    }
}

impl FromStr for GiftFilter {
    type Err = FragmentError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(GiftFilter::All),
            "auction" => Ok(GiftFilter::Auction),
            "sold" => Ok(GiftFilter::Sold),
            "sale" => Ok(GiftFilter::Sale),
            _ => Err(FragmentError::InvalidParameter {
                field: "filter",
                value: s.to_string(),
                allowed: Self::ALLOWED,
            }),
        }
    }
}

impl fmt::Display for GiftFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Listing order. The site picks its own order when none is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GiftSort {
    PriceAsc,
    PriceDesc,
    Listed,
    Ending,
}

impl GiftSort {
    pub const ALLOWED: &'static [&'static str] = &["price_asc", "price_desc", "listed", "ending"];

    pub fn as_str(&self) -> &'static str {
        match self {
            GiftSort::PriceAsc => "price_asc",
            GiftSort::PriceDesc => "price_desc",
            GiftSort::Listed => "listed",
            GiftSort::Ending => "ending",
        }
    }
}

impl FromStr for GiftSort {
    type Err = FragmentError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "price_asc" => Ok(GiftSort::PriceAsc),
            "price_desc" => Ok(GiftSort::PriceDesc),
            "listed" => Ok(GiftSort::Listed),
            "ending" => Ok(GiftSort::Ending),
            _ => Err(FragmentError::InvalidParameter {
                field: "sort",
                value: s.to_string(),
                allowed: Self::ALLOWED,
            }),
        }
    }
}

impl fmt::Display for GiftSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated listing query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Collection slug, passed to the site as-is. Empty means every collection.
    pub type_gift: String,
    pub filter: GiftFilter,
    pub sort: Option<GiftSort>,
}

impl Query {
    pub fn new(type_gift: impl Into<String>) -> Self {
        Self { type_gift: type_gift.into(), filter: GiftFilter::All, sort: None }
    }

    /// Validates string options into a query.
    pub fn parse(type_gift: &str, filter: &str, sort: Option<&str>) -> Result<Self> {
        Ok(Self {
            type_gift: type_gift.to_string(),
            filter: filter.parse()?,
            sort: sort.map(str::parse).transpose()?,
        })
    }

    pub fn with_filter(mut self, filter: GiftFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_sort(mut self, sort: GiftSort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Request for the given 1-based page.
    pub fn request(&self, page: u32) -> RequestSpec {
        let path = if self.type_gift.is_empty() {
            "gifts".to_string()
        } else {
            format!("gifts/{}", self.type_gift)
        };

        let mut params = vec![("filter".to_string(), self.filter.to_string())];
        if let Some(sort) = self.sort {
            params.push(("sort".to_string(), sort.to_string()));
        }
        if page > 1 {
            params.push(("page".to_string(), page.to_string()));
        }

        RequestSpec { path, params }
    }
}

/// Validates options and builds the request for one listing page.
pub fn build(type_gift: &str, filter: &str, sort: Option<&str>, page: u32) -> Result<RequestSpec> {
    Ok(Query::parse(type_gift, filter, sort)?.request(page))
}

/// A GET target relative to the marketplace root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl RequestSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), params: Vec::new() }
    }

    /// Looks up a query parameter value.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    /// Full URL against `base_url`, with percent-encoded parameters.
    pub fn url(&self, base_url: &str) -> String {
        let mut url = format!("{}/{}", base_url.trim_end_matches('/'), self.path.trim_start_matches('/'));
        if !self.params.is_empty() {
            let query: Vec<String> = self
                .params
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect();
            url.push('?');
            url.push_str(&query.join("&"));
        }
        url
    }
}

impl fmt::Display for RequestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url(""))
    }
}
