//! Gift detail command implementation.

use crate::client::FragmentClient;
use crate::config::Config;
use crate::format::Formatter;
use anyhow::{Context, Result};

/// Fetches one gift's details by collection slug and number.
pub struct InfoCommand {
    config: Config,
}

impl InfoCommand {
    /// Creates a new info command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Opens a session, fetches the gift and returns formatted output.
    pub async fn execute(&self, slug: &str, id: u64) -> Result<String> {
        let client = FragmentClient::new(self.config.clone());
        client.open().context("Failed to create HTTP client")?;

        let output = self.execute_with_client(&client, slug, id).await;
        client.close();
        output
    }

    /// Fetches with a provided, already open client (for testing).
    pub async fn execute_with_client(
        &self,
        client: &FragmentClient,
        slug: &str,
        id: u64,
    ) -> Result<String> {
        let slug = slug.trim().to_lowercase();
        if slug.is_empty() {
            anyhow::bail!("Collection slug must not be empty");
        }

        let info = client
            .gift_info(&slug, id)
            .await
            .with_context(|| format!("Failed to fetch gift {}-{}", slug, id))?;

        Ok(Formatter::new(self.config.format).format_info(&info))
    }
}
