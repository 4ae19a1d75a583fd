//! Output formatting for gifts and gift details (table, JSON, markdown).

use crate::config::OutputFormat;
use crate::fragment::models::{Attribute, Gift, GiftInfo};

/// Formats gifts for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a listing.
    pub fn format_gifts(&self, gifts: &[Gift]) -> String {
        if gifts.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                _ => "No gifts found.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(gifts).unwrap_or_else(|_| "[]".to_string())
            }
            OutputFormat::Table => self.table_gifts(gifts),
            OutputFormat::Markdown => self.markdown_gifts(gifts),
        }
    }

    /// Formats one gift's details.
    pub fn format_info(&self, info: &GiftInfo) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(info).unwrap_or_else(|_| "{}".to_string())
            }
            OutputFormat::Table => self.table_info(info),
            OutputFormat::Markdown => self.markdown_info(info),
        }
    }

    /// Formats several gifts' details.
    pub fn format_infos(&self, infos: &[GiftInfo]) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(infos).unwrap_or_else(|_| "[]".to_string())
            }
            _ if infos.is_empty() => "No gifts found.".to_string(),
            _ => infos.iter().map(|i| self.format_info(i)).collect::<Vec<_>>().join("\n\n"),
        }
    }

    // Table formatting

    fn table_gifts(&self, gifts: &[Gift]) -> String {
        let id_width = 8;
        let price_width = 12;
        let name_width = 30;

        let mut lines = Vec::new();

        lines.push(format!("{:<id_width$}  {:<price_width$}  {}", "ID", "Price (TON)", "Name"));
        lines.push(format!("{:-<id_width$}  {:-<price_width$}  {:-<name_width$}", "", "", ""));

        for gift in gifts {
            lines.push(format!(
                "{:<id_width$}  {:>price_width$}  {}",
                format!("#{}", gift.id),
                price_str(gift.price),
                truncate(&gift.name, name_width)
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} gifts", gifts.len()));

        lines.join("\n")
    }

    fn table_info(&self, info: &GiftInfo) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Gift:     {}-{}", info.slug, info.id));
        lines.push(format!("Owner:    {}", info.owner.as_deref().unwrap_or("N/A")));
        lines.push(format!("Model:    {}", attribute_str(&info.model)));
        lines.push(format!("Backdrop: {}", attribute_str(&info.backdrop)));
        lines.push(format!("Symbol:   {}", attribute_str(&info.symbol)));

        if let Some(issued) = info.issued {
            match issued.total {
                Some(total) => lines.push(format!("Issued:   {} of {}", issued.number, total)),
                None => lines.push(format!("Issued:   {}", issued.number)),
            }
        }

        match (info.ton_price, info.usd_price) {
            (Some(ton), Some(usd)) => lines.push(format!("Price:    {} TON (~${:.2})", ton, usd)),
            (Some(ton), None) => lines.push(format!("Price:    {} TON", ton)),
            _ => lines.push("Price:    Not for sale".to_string()),
        }

        if !info.history.is_empty() {
            lines.push(String::new());
            lines.push(format!("{:<12}  {:<20}  {}", "Price (TON)", "Date", "Buyer"));
            lines.push(format!("{:-<12}  {:-<20}  {:-<20}", "", "", ""));
            for entry in &info.history {
                lines.push(format!(
                    "{:>12}  {:<20}  {}",
                    price_str(entry.price),
                    truncate(&entry.date, 20),
                    entry.buyer
                ));
            }
        }

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_gifts(&self, gifts: &[Gift]) -> String {
        let mut lines = Vec::new();

        lines.push("| ID | Price (TON) | Name |".to_string());
        lines.push("|----|------------:|------|".to_string());

        for gift in gifts {
            lines.push(format!(
                "| [#{}]({}) | {} | {} |",
                gift.id,
                gift.url,
                price_str(gift.price),
                gift.name.replace('|', "\\|")
            ));
        }

        lines.join("\n")
    }

    fn markdown_info(&self, info: &GiftInfo) -> String {
        let mut lines = Vec::new();

        lines.push(format!("## {} #{}", info.slug, info.id));
        lines.push(String::new());
        lines.push(format!("- **Owner:** {}", info.owner.as_deref().unwrap_or("N/A")));
        lines.push(format!("- **Model:** {}", attribute_str(&info.model)));
        lines.push(format!("- **Backdrop:** {}", attribute_str(&info.backdrop)));
        lines.push(format!("- **Symbol:** {}", attribute_str(&info.symbol)));
        if let Some(ton) = info.ton_price {
            lines.push(format!("- **Price:** {} TON", ton));
        }

        if !info.history.is_empty() {
            lines.push(String::new());
            lines.push("| Price (TON) | Date | Buyer |".to_string());
            lines.push("|------------:|------|-------|".to_string());
            for entry in &info.history {
                lines.push(format!(
                    "| {} | {} | {} |",
                    price_str(entry.price),
                    entry.date,
                    entry.buyer
                ));
            }
        }

        lines.join("\n")
    }
}

fn price_str(price: Option<f64>) -> String {
    price.map_or_else(|| "N/A".to_string(), |p| p.to_string())
}

fn attribute_str(attribute: &Option<Attribute>) -> String {
    match attribute {
        Some(Attribute { name, rarity: Some(r) }) => format!("{} ({}%)", name, r),
        Some(Attribute { name, rarity: None }) => name.clone(),
        None => "N/A".to_string(),
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let cut: String = text.chars().take(width - 3).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::models::{Issued, OwnershipHistory};

    fn make_gift(id: u64, price: Option<f64>) -> Gift {
        Gift::new(id, "Plush Pepe", "plushpepe", price, format!("https://fragment.com/gift/plushpepe-{id}"))
    }

    fn make_info() -> GiftInfo {
        GiftInfo {
            id: 42,
            slug: "plushpepe".to_string(),
            owner: Some("owner-1".to_string()),
            model: Some(Attribute { name: "Cozy Frog".to_string(), rarity: Some(1.5) }),
            backdrop: None,
            symbol: Some(Attribute { name: "Crown".to_string(), rarity: None }),
            issued: Some(Issued { number: 42, total: Some(5000) }),
            ton_price: Some(2500.0),
            usd_price: Some(8125.4),
            is_sale: true,
            history: vec![OwnershipHistory {
                price: None,
                date: "1 Feb 2025".to_string(),
                timestamp: None,
                buyer: "buyer-a".to_string(),
            }],
        }
    }

    #[test]
    fn test_table_gifts() {
        let formatter = Formatter::new(OutputFormat::Table);
        let output = formatter.format_gifts(&[make_gift(1, Some(1250.0)), make_gift(2, None)]);

        assert!(output.contains("#1"));
        assert!(output.contains("1250"));
        assert!(output.contains("N/A"));
        assert!(output.contains("Total: 2 gifts"));
    }

    #[test]
    fn test_empty_gifts() {
        assert_eq!(Formatter::new(OutputFormat::Json).format_gifts(&[]), "[]");
        assert_eq!(Formatter::new(OutputFormat::Table).format_gifts(&[]), "No gifts found.");
    }

    #[test]
    fn test_json_gifts() {
        let output = Formatter::new(OutputFormat::Json).format_gifts(&[make_gift(7, Some(9.5))]);
        assert!(output.starts_with('['));
        assert!(output.contains("\"id\": 7"));
        assert!(output.contains("\"price\": 9.5"));
    }

    #[test]
    fn test_markdown_gifts_links_detail_page() {
        let output = Formatter::new(OutputFormat::Markdown).format_gifts(&[make_gift(7, None)]);
        assert!(output.contains("[#7](https://fragment.com/gift/plushpepe-7)"));
    }

    #[test]
    fn test_table_info() {
        let output = Formatter::new(OutputFormat::Table).format_info(&make_info());

        assert!(output.contains("plushpepe-42"));
        assert!(output.contains("Cozy Frog (1.5%)"));
        assert!(output.contains("Backdrop: N/A"));
        assert!(output.contains("Issued:   42 of 5000"));
        assert!(output.contains("2500 TON (~$8125.40)"));
        assert!(output.contains("buyer-a"));
    }

    #[test]
    fn test_table_info_not_for_sale() {
        let mut info = make_info();
        info.ton_price = None;
        info.usd_price = None;
        let output = Formatter::new(OutputFormat::Table).format_info(&info);
        assert!(output.contains("Not for sale"));
    }

    #[test]
    fn test_markdown_info() {
        let output = Formatter::new(OutputFormat::Markdown).format_info(&make_info());
        assert!(output.starts_with("## plushpepe #42"));
        assert!(output.contains("| N/A | 1 Feb 2025 | buyer-a |"));
    }

    #[test]
    fn test_json_infos() {
        let output = Formatter::new(OutputFormat::Json).format_infos(&[make_info()]);
        let parsed: Vec<GiftInfo> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, vec![make_info()]);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long gift name", 10), "a very ...");
    }
}
