//! CSS selectors for Fragment HTML parsing.
//!
//! All selectors for listing and detail pages live here. When the site
//! changes its markup, capture an HTML sample, update the selectors and add
//! a fixture under `tests/fixtures/`.

use scraper::Selector;
use std::sync::LazyLock;

/// Selectors for gift listing pages (`/gifts/<slug>`).
pub mod listing {
    use super::*;

    /// Grid holding all cards. Present even when the result set is empty.
    pub static CONTAINER: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".tm-grid").unwrap());

    /// A single gift card (an anchor pointing at the detail page).
    pub static ITEM: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".tm-grid-item").unwrap());

    /// Gift number, rendered as `#1234`.
    pub static ITEM_NUM: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".item-num").unwrap());

    /// Gift display name.
    pub static ITEM_NAME: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".item-name").unwrap());

    /// Price value, tagged with the TON icon.
    pub static PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".icon-ton").unwrap());

    /// Continuation marker: "load more" button or classic pager link.
    pub static NEXT_PAGE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            ".js-load-more, \
             .tm-load-more, \
             a.tm-pagination-next",
        )
        .unwrap()
    });
}

/// Selectors for a single gift page (`/gift/<slug>-<id>`).
pub mod detail {
    use super::*;

    /// Attribute table (model, backdrop, symbol, owner, issued).
    pub static INFO_TABLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".tm-table-fixed").unwrap());

    pub static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());

    pub static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

    /// Rarity badge inside an attribute cell.
    pub static RARITY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("mark").unwrap());

    /// Price block for items on sale or auction.
    pub static BID_INFO: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".tm-section-bid-info").unwrap());

    pub static TON_VALUE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".tm-value").unwrap());

    pub static USD_VALUE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".tm-usd-value").unwrap());

    /// Ownership history rows.
    pub static HISTORY_ROW: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".tm-table-wrap tbody tr").unwrap());

    /// Machine-readable date inside a history cell.
    pub static TIME: LazyLock<Selector> = LazyLock::new(|| Selector::parse("time").unwrap());
}
