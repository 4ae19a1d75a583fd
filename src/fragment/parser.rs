//! HTML parser for Fragment listing and gift detail pages.

use crate::error::{FragmentError, Result};
use crate::fragment::models::{
    detail_path, Attribute, Gift, GiftInfo, Issued, ListingPage, OwnershipHistory,
};
use crate::fragment::selectors::{detail, listing};
use chrono::DateTime;
use scraper::{ElementRef, Html};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Parser for Fragment HTML pages.
#[derive(Debug, Clone)]
pub struct Parser {
    base_url: String,
}

impl Parser {
    /// Creates a parser that resolves relative links against `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into().trim_end_matches('/').to_string() }
    }

    /// Parses a listing page. `origin` names the page in errors (usually its URL).
    ///
    /// A page without the grid container is an error; a grid with no cards is
    /// a valid empty result.
    pub fn parse_listing(&self, html: &str, origin: &str) -> Result<ListingPage> {
        let document = Html::parse_document(html);

        let container = document
            .select(&listing::CONTAINER)
            .next()
            .ok_or_else(|| FragmentError::parse(origin, "listing container not found"))?;

        let mut page = ListingPage::default();
        for element in container.select(&listing::ITEM) {
            match self.parse_card(element) {
                Some(gift) => {
                    trace!("Parsed gift: {} #{} ({:?} TON)", gift.slug, gift.id, gift.price);
                    page.gifts.push(gift);
                }
                None => warn!("Skipping gift card without a detail link in {}", origin),
            }
        }

        // Without cards there is nothing to continue from
        page.has_next =
            !page.gifts.is_empty() && document.select(&listing::NEXT_PAGE).next().is_some();

        debug!("Parsed {} gifts from {} (has_next: {})", page.count(), origin, page.has_next);

        Ok(page)
    }

    /// Parses a gift detail page.
    pub fn parse_detail(&self, html: &str, slug: &str, gift_id: u64) -> Result<GiftInfo> {
        let document = Html::parse_document(html);
        let context = detail_path(slug, gift_id);

        let table = document
            .select(&detail::INFO_TABLE)
            .next()
            .ok_or_else(|| FragmentError::parse(&context, "attribute table not found"))?;

        let mut rows: HashMap<String, ElementRef> = HashMap::new();
        for row in table.select(&detail::ROW) {
            let cells: Vec<_> = row.select(&detail::CELL).collect();
            if cells.len() >= 2 {
                rows.insert(text_of(cells[0]).to_lowercase(), cells[1]);
            }
        }

        let owner = rows.get("owner").map(|cell| text_of(*cell)).filter(|s| !s.is_empty());
        let issued = rows.get("issued").and_then(|cell| parse_issued(&text_of(*cell)));

        let (ton_price, usd_price) = self.parse_bid_info(&document);
        let history = self.parse_history(&document);

        debug!(
            "Parsed {}: owner {:?}, {:?} TON, {} history rows",
            context,
            owner,
            ton_price,
            history.len()
        );

        Ok(GiftInfo {
            id: gift_id,
            slug: slug.to_string(),
            owner,
            model: rows.get("model").and_then(|cell| parse_attribute(*cell)),
            backdrop: rows.get("backdrop").and_then(|cell| parse_attribute(*cell)),
            symbol: rows.get("symbol").and_then(|cell| parse_attribute(*cell)),
            issued,
            ton_price,
            usd_price,
            is_sale: ton_price.is_some(),
            history,
        })
    }

    /// Parses a single card. Returns None unless the card links to a
    /// `slug-id` detail page, since only those gifts can be fetched later.
    fn parse_card(&self, element: ElementRef) -> Option<Gift> {
        let href = element.value().attr("href").unwrap_or_default();
        let (href_slug, href_id) = split_gift_path(href);

        let id = element
            .select(&listing::ITEM_NUM)
            .next()
            .and_then(|e| parse_count(text_of(e).trim_start_matches('#')))
            .or(href_id)?;

        let name = element
            .select(&listing::ITEM_NAME)
            .next()
            .map(text_of)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        let price = element.select(&listing::PRICE).next().and_then(|e| parse_amount(&text_of(e)));

        let slug = href_slug?.to_string();
        let url = if href.starts_with("http") {
            href.to_string()
        } else {
            format!("{}/{}", self.base_url, href.trim_start_matches('/'))
        };

        Some(Gift::new(id, name, slug, price, url))
    }

    /// Extracts TON and USD prices from the bid section, if any.
    fn parse_bid_info(&self, document: &Html) -> (Option<f64>, Option<f64>) {
        let Some(section) = document.select(&detail::BID_INFO).next() else {
            return (None, None);
        };

        let ton_price = section.select(&detail::TON_VALUE).next().and_then(|e| {
            // The value cell may nest the USD amount, so prefer its own text
            let own: String = e.children().filter_map(|n| n.value().as_text()).map(|t| &**t).collect();
            parse_amount(&own).or_else(|| parse_amount(&text_of(e)))
        });

        let usd_price =
            section.select(&detail::USD_VALUE).next().and_then(|e| parse_amount(&text_of(e)));

        (ton_price, usd_price)
    }

    /// Parses history rows in document order.
    fn parse_history(&self, document: &Html) -> Vec<OwnershipHistory> {
        document
            .select(&detail::HISTORY_ROW)
            .filter_map(|row| {
                let cells: Vec<_> = row.select(&detail::CELL).collect();
                if cells.len() < 3 {
                    return None;
                }

                let timestamp = cells[1]
                    .select(&detail::TIME)
                    .next()
                    .and_then(|t| t.value().attr("datetime"))
                    .and_then(|dt| DateTime::parse_from_rfc3339(dt).ok());

                Some(OwnershipHistory {
                    price: parse_amount(&text_of(cells[0])),
                    date: text_of(cells[1]),
                    timestamp,
                    buyer: text_of(cells[2]),
                })
            })
            .collect()
    }
}

/// Element text with whitespace collapsed.
fn text_of(element: ElementRef) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

/// Splits `/gift/plushpepe-1234` into `("plushpepe", 1234)`.
fn split_gift_path(href: &str) -> (Option<&str>, Option<u64>) {
    let last = href.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
    match last.rsplit_once('-') {
        Some((slug, id)) if !slug.is_empty() => (Some(slug), id.parse().ok()),
        _ => (None, None),
    }
}

/// Parses a TON or USD amount like "1,250", "~ $3,412.50" or "12.5 TON".
/// Negative, non-finite and non-numeric text yields None.
fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String =
        text.chars().filter(|c| !matches!(c, ',' | '~' | '$') && !c.is_whitespace()).collect();
    let cleaned = cleaned.trim_end_matches("TON");
    if cleaned.is_empty() {
        return None;
    }

    let value: f64 = cleaned.parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Parses an integer with optional thousands separators.
fn parse_count(text: &str) -> Option<u64> {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();
    cleaned.parse().ok()
}

/// Parses "1,234 of 5,000 issued" or "1234/5000".
fn parse_issued(text: &str) -> Option<Issued> {
    let normalized = text.replace('/', " ");
    let mut numbers = normalized.split_whitespace().filter_map(parse_count);
    let number = numbers.next()?;
    Some(Issued { number, total: numbers.next() })
}

/// Parses an attribute cell into a name and optional rarity percentage.
fn parse_attribute(cell: ElementRef) -> Option<Attribute> {
    let full = text_of(cell);

    let (name, rarity) = match cell.select(&detail::RARITY).next() {
        Some(mark) => {
            let badge = text_of(mark);
            (full.replace(&badge, "").trim().to_string(), parse_percent(&badge))
        }
        None => match full.rsplit_once(' ') {
            Some((name, last)) if last.ends_with('%') => (name.to_string(), parse_percent(last)),
            _ => (full, None),
        },
    };

    if name.is_empty() {
        return None;
    }
    Some(Attribute { name, rarity })
}

fn parse_percent(text: &str) -> Option<f64> {
    text.trim().trim_end_matches('%').trim().replace(',', ".").parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> Parser {
        Parser::new("https://fragment.com")
    }

    fn card(id: u64, name: &str, price: Option<&str>) -> String {
        let price = price
            .map(|p| format!(r#"<div class="tm-grid-item-value tm-value icon-before icon-ton">{p}</div>"#))
            .unwrap_or_default();
        format!(
            r#"<a class="tm-grid-item" href="/gift/plushpepe-{id}">
                <div class="item-name">{name}</div>
                <div class="item-num">#{id}</div>
                {price}
            </a>"#
        )
    }

    fn listing_html(cards: &[String], has_next: bool) -> String {
        let more = if has_next { r#"<div class="js-load-more">Load more</div>"# } else { "" };
        format!(
            r#"<html><body><section><div class="tm-grid">{}</div>{}</section></body></html>"#,
            cards.join(""),
            more
        )
    }

    // Amount parsing

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,250"), Some(1250.0));
        assert_eq!(parse_amount("12.5"), Some(12.5));
        assert_eq!(parse_amount(" 99 TON "), Some(99.0));
        assert_eq!(parse_amount("~ $3,412.50"), Some(3412.5));
        assert_eq!(parse_amount("0"), Some(0.0));
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("Sold"), None);
        assert_eq!(parse_amount("2 days"), None);
        assert_eq!(parse_amount("-5"), None);
        assert_eq!(parse_amount("inf"), None);
        assert_eq!(parse_amount("NaN"), None);
    }

    #[test]
    fn test_parse_issued() {
        assert_eq!(parse_issued("1,234 of 5,000 issued"), Some(Issued { number: 1234, total: Some(5000) }));
        assert_eq!(parse_issued("17/200"), Some(Issued { number: 17, total: Some(200) }));
        assert_eq!(parse_issued("17"), Some(Issued { number: 17, total: None }));
        assert_eq!(parse_issued("unknown"), None);
    }

    #[test]
    fn test_split_gift_path() {
        assert_eq!(split_gift_path("/gift/plushpepe-1234"), (Some("plushpepe"), Some(1234)));
        assert_eq!(split_gift_path("https://fragment.com/gift/durovscap-7/"), (Some("durovscap"), Some(7)));
        assert_eq!(split_gift_path("/gift/plushpepe-abc"), (Some("plushpepe"), None));
        assert_eq!(split_gift_path(""), (None, None));
    }

    // Listing pages

    #[test]
    fn test_parse_listing_in_document_order() {
        let cards = vec![
            card(30, "Plush Pepe", Some("900")),
            card(10, "Plush Pepe", Some("1,250")),
            card(20, "Plush Pepe", Some("1,100.5")),
        ];
        let page = parser().parse_listing(&listing_html(&cards, true), "test").unwrap();

        let ids: Vec<u64> = page.gifts.iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![30, 10, 20]);
        assert_eq!(page.gifts[1].price, Some(1250.0));
        assert_eq!(page.gifts[2].price, Some(1100.5));
        assert!(page.has_next);

        let gift = &page.gifts[0];
        assert_eq!(gift.slug, "plushpepe");
        assert_eq!(gift.name, "Plush Pepe");
        assert_eq!(gift.url, "https://fragment.com/gift/plushpepe-30");
        assert!(gift.is_sale);
    }

    #[test]
    fn test_parse_listing_missing_price_is_none() {
        let cards = vec![card(5, "Plush Pepe", None)];
        let page = parser().parse_listing(&listing_html(&cards, false), "test").unwrap();
        assert_eq!(page.count(), 1);
        assert_eq!(page.gifts[0].price, None);
        assert!(!page.gifts[0].is_sale);
    }

    #[test]
    fn test_parse_listing_id_from_href_when_num_missing() {
        let html = r#"<div class="tm-grid">
            <a class="tm-grid-item" href="/gift/lolpop-88"><div class="item-name">Lol Pop</div></a>
        </div>"#;
        let page = parser().parse_listing(html, "test").unwrap();
        assert_eq!(page.gifts[0].id, 88);
        assert_eq!(page.gifts[0].slug, "lolpop");
    }

    #[test]
    fn test_parse_listing_skips_card_without_id() {
        let html = r#"<div class="tm-grid">
            <a class="tm-grid-item" href="/about"><div class="item-name">Banner</div></a>
            <a class="tm-grid-item" href="/gift/lolpop-2"><div class="item-num">#2</div></a>
        </div>"#;
        let page = parser().parse_listing(html, "test").unwrap();
        assert_eq!(page.count(), 1);
        assert_eq!(page.gifts[0].name, "Unknown");
    }

    #[test]
    fn test_parse_listing_skips_card_without_slug() {
        let html = r#"<div class="tm-grid">
            <a class="tm-grid-item" href="/about"><div class="item-num">#9</div></a>
            <div class="tm-grid-item"><div class="item-num">#10</div></div>
            <a class="tm-grid-item" href="/gift/lolpop-2"><div class="item-num">#2</div></a>
        </div>"#;
        let page = parser().parse_listing(html, "test").unwrap();
        assert_eq!(page.count(), 1);
        assert_eq!(page.gifts[0].detail_path(), "gift/lolpop-2");
    }

    #[test]
    fn test_parse_listing_empty_container() {
        let page = parser().parse_listing(&listing_html(&[], false), "test").unwrap();
        assert!(page.is_empty());
        assert!(!page.has_next);
    }

    #[test]
    fn test_parse_listing_missing_container_is_error() {
        let html = "<html><body><h1>Maintenance</h1></body></html>";
        let err = parser().parse_listing(html, "https://fragment.com/gifts/x").unwrap_err();
        match err {
            FragmentError::Parse { context, .. } => {
                assert_eq!(context, "https://fragment.com/gifts/x")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    // Detail pages

    const DETAIL: &str = r#"
        <html><body>
        <section class="tm-section-bid-info">
            <div class="tm-value icon-before icon-ton">2,500<span class="tm-usd-value">~ $8,125.40</span></div>
        </section>
        <table class="table tm-table tm-table-fixed">
            <tr><td>Owner</td><td><a href="/addr">EQBx...Owner</a></td></tr>
            <tr><td>Model</td><td>Cozy Frog <mark>1.5%</mark></td></tr>
            <tr><td>Backdrop</td><td>Midnight Blue 2%</td></tr>
            <tr><td>Symbol</td><td>Crown</td></tr>
            <tr><td>Issued</td><td>1,234 of 5,000 issued</td></tr>
        </table>
        <div class="tm-table-wrap"><table><tbody>
            <tr><td>2,000</td><td><time datetime="2025-03-02T10:00:00+00:00">2 Mar 2025</time></td><td>buyer-b</td></tr>
            <tr><td>Transfer</td><td>1 Feb 2025</td><td>buyer-a</td></tr>
        </tbody></table></div>
        </body></html>
    "#;

    #[test]
    fn test_parse_detail_full() {
        let info = parser().parse_detail(DETAIL, "plushpepe", 1234).unwrap();
        assert_eq!(info.id, 1234);
        assert_eq!(info.slug, "plushpepe");
        assert_eq!(info.owner.as_deref(), Some("EQBx...Owner"));
        assert_eq!(info.model, Some(Attribute { name: "Cozy Frog".to_string(), rarity: Some(1.5) }));
        assert_eq!(
            info.backdrop,
            Some(Attribute { name: "Midnight Blue".to_string(), rarity: Some(2.0) })
        );
        assert_eq!(info.symbol, Some(Attribute { name: "Crown".to_string(), rarity: None }));
        assert_eq!(info.issued, Some(Issued { number: 1234, total: Some(5000) }));
        assert_eq!(info.ton_price, Some(2500.0));
        assert_eq!(info.usd_price, Some(8125.4));
        assert!(info.is_sale);
    }

    #[test]
    fn test_parse_detail_history_as_listed() {
        let info = parser().parse_detail(DETAIL, "plushpepe", 1234).unwrap();
        assert_eq!(info.history.len(), 2);

        let newest = &info.history[0];
        assert_eq!(newest.price, Some(2000.0));
        assert_eq!(newest.date, "2 Mar 2025");
        assert_eq!(newest.buyer, "buyer-b");
        assert_eq!(
            newest.timestamp.map(|t| t.to_rfc3339()),
            Some("2025-03-02T10:00:00+00:00".to_string())
        );

        // Unparsable price renders as a free transfer
        let oldest = &info.history[1];
        assert_eq!(oldest.price, None);
        assert_eq!(oldest.timestamp, None);
        assert_eq!(oldest.buyer, "buyer-a");
    }

    #[test]
    fn test_parse_detail_not_for_sale() {
        let html = r#"<table class="tm-table-fixed"><tr><td>Model</td><td>Cozy Frog</td></tr></table>"#;
        let info = parser().parse_detail(html, "plushpepe", 9).unwrap();
        assert_eq!(info.ton_price, None);
        assert_eq!(info.usd_price, None);
        assert!(!info.is_sale);
        assert_eq!(info.owner, None);
        assert_eq!(info.backdrop, None);
        assert!(info.history.is_empty());
    }

    #[test]
    fn test_parse_detail_missing_table_is_error() {
        let err = parser().parse_detail("<html><body></body></html>", "plushpepe", 9).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("gift/plushpepe-9"));
        assert!(msg.contains("attribute table"));
    }
}
