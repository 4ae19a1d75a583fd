//! Gift listing command implementation.

use crate::client::FragmentClient;
use crate::config::Config;
use crate::fragment::models::GiftInfo;
use crate::fragment::query::Query;
use crate::format::Formatter;
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Lists gifts of a collection, optionally with full details.
pub struct GiftsCommand {
    config: Config,
}

impl GiftsCommand {
    /// Creates a new gifts command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Opens a session, runs the listing and returns formatted output.
    pub async fn execute(&self, query: &Query, max: Option<usize>, details: bool) -> Result<String> {
        let client = FragmentClient::new(self.config.clone());
        client.open().context("Failed to create HTTP client")?;

        let output = self.execute_with_client(&client, query, max, details).await;
        client.close();
        output
    }

    /// Runs the listing with a provided, already open client (for testing).
    pub async fn execute_with_client(
        &self,
        client: &FragmentClient,
        query: &Query,
        max: Option<usize>,
        details: bool,
    ) -> Result<String> {
        let gifts = client.collect_gifts(query, max).await?;
        let formatter = Formatter::new(self.config.format);

        if !details {
            return Ok(formatter.format_gifts(&gifts));
        }

        info!("Fetching details for {} gifts", gifts.len());
        let mut infos: Vec<GiftInfo> = Vec::with_capacity(gifts.len());
        for (gift, result) in gifts.iter().zip(client.get_infos(&gifts).await) {
            match result {
                Ok(info) => infos.push(info),
                Err(e) => warn!("Skipping {}-{}: {}", gift.slug, gift.id, e),
            }
        }

        Ok(formatter.format_infos(&infos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::error::FragmentError;
    use crate::fragment::query::{GiftFilter, RequestSpec};
    use crate::fragment::session::GiftSource;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct MockSource {
        listing: String,
    }

    #[async_trait]
    impl GiftSource for MockSource {
        async fn fetch(&self, request: &RequestSpec) -> crate::error::Result<String> {
            if request.path == "gift/plushpepe-2" {
                return Err(FragmentError::NotFound { url: request.to_string() });
            }
            if request.path.starts_with("gift/") {
                return Ok(r#"<table class="tm-table-fixed">
                    <tr><td>Owner</td><td>owner-1</td></tr>
                    <tr><td>Model</td><td>Cozy Frog</td></tr>
                </table>"#
                    .to_string());
            }
            Ok(self.listing.clone())
        }

        fn base_url(&self) -> &str {
            "https://fragment.com"
        }
    }

    fn make_client(format: OutputFormat) -> (GiftsCommand, FragmentClient) {
        let listing = r#"<div class="tm-grid">
            <a class="tm-grid-item" href="/gift/plushpepe-1"><div class="item-num">#1</div><div class="item-name">Plush Pepe</div><div class="icon-ton">1,000</div></a>
            <a class="tm-grid-item" href="/gift/plushpepe-2"><div class="item-num">#2</div><div class="item-name">Plush Pepe</div><div class="icon-ton">1,200</div></a>
        </div>"#;
        let config = Config { format, ..Config::default() };
        let client = FragmentClient::with_source(
            config.clone(),
            Arc::new(MockSource { listing: listing.to_string() }),
        );
        client.open().unwrap();
        (GiftsCommand::new(config), client)
    }

    #[tokio::test]
    async fn test_gifts_command_table() {
        let (cmd, client) = make_client(OutputFormat::Table);
        let query = Query::new("plushpepe").with_filter(GiftFilter::Sale);

        let output = cmd.execute_with_client(&client, &query, None, false).await.unwrap();
        assert!(output.contains("#1"));
        assert!(output.contains("1200"));
        assert!(output.contains("Total: 2 gifts"));
    }

    #[tokio::test]
    async fn test_gifts_command_max() {
        let (cmd, client) = make_client(OutputFormat::Table);
        let output =
            cmd.execute_with_client(&client, &Query::new("plushpepe"), Some(1), false).await.unwrap();
        assert!(output.contains("Total: 1 gifts"));
    }

    #[tokio::test]
    async fn test_gifts_command_details_skip_failures() {
        let (cmd, client) = make_client(OutputFormat::Json);
        let output =
            cmd.execute_with_client(&client, &Query::new("plushpepe"), None, true).await.unwrap();

        let infos: Vec<GiftInfo> = serde_json::from_str(&output).unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].id, 1);
        assert_eq!(infos[0].owner.as_deref(), Some("owner-1"));
    }

    #[tokio::test]
    async fn test_gifts_command_closed_client() {
        let (cmd, client) = make_client(OutputFormat::Table);
        client.close();
        let err = cmd
            .execute_with_client(&client, &Query::new("plushpepe"), None, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("session is closed"));
    }
}
