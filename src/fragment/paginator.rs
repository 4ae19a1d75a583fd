//! Walks listing pages in order until the result set is complete.

use crate::error::{FragmentError, Result};
use crate::fragment::models::Gift;
use crate::fragment::parser::Parser;
use crate::fragment::query::Query;
use crate::fragment::session::GiftSource;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Drives a [`GiftSource`] and the listing parser page by page.
pub struct Paginator {
    parser: Parser,
    max_pages: u32,
}

impl Paginator {
    pub fn new(parser: Parser, max_pages: u32) -> Self {
        Self { parser, max_pages: max_pages.max(1) }
    }

    /// Collects gifts for `query`, at most `limit` of them.
    ///
    /// Stops when a page reports no continuation, yields no cards, the limit
    /// is reached, or `max_pages` pages were read. Gifts repeated across pages
    /// are kept once, at their first position.
    ///
    /// If a page fails after some gifts were collected, the error is
    /// [`FragmentError::Partial`] and carries those gifts.
    pub async fn collect(
        &self,
        source: &dyn GiftSource,
        query: &Query,
        limit: Option<usize>,
    ) -> Result<Vec<Gift>> {
        let mut gifts: Vec<Gift> = Vec::new();
        let mut seen: HashSet<u64> = HashSet::new();

        if limit == Some(0) {
            return Ok(gifts);
        }

        for page in 1..=self.max_pages {
            let request = query.request(page);
            let origin = request.url(source.base_url());
            debug!("Fetching page {}", page);

            let listing = match source.fetch(&request).await {
                Ok(html) => self.parser.parse_listing(&html, &origin),
                Err(e) => Err(e),
            };

            let listing = match listing {
                Ok(listing) => listing,
                Err(e) if gifts.is_empty() => return Err(e),
                Err(e) => {
                    return Err(FragmentError::Partial { page, partial: gifts, source: Box::new(e) })
                }
            };

            if listing.is_empty() {
                debug!("No gifts on page {}, stopping", page);
                break;
            }

            let before = gifts.len();
            for gift in listing.gifts {
                if seen.insert(gift.id) {
                    gifts.push(gift);
                }
            }
            debug!("Page {} added {} new gifts", page, gifts.len() - before);

            if let Some(limit) = limit {
                if gifts.len() >= limit {
                    gifts.truncate(limit);
                    debug!("Reached limit of {} gifts", limit);
                    break;
                }
            }

            if !listing.has_next {
                debug!("No more pages available");
                break;
            }

            if page == self.max_pages {
                warn!("Stopped after {} pages; the site still reports more", self.max_pages);
            }
        }

        Ok(gifts)
    }
}
