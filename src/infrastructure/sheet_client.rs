// Spreadsheet service client - reqwest implementation of SheetRepository
use crate::application::sheet_repository::{Ack, SheetRepository, SheetSource, WriteRequest};
use crate::domain::error::DashboardError;
use crate::domain::view::SourceKind;
use anyhow::{Context, Result};
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct SheetClient {
    client: reqwest::Client,
    endpoint: String,
    table_query_endpoint: Option<String>,
}

impl SheetClient {
    pub fn new(endpoint: String, table_query_endpoint: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            table_query_endpoint: table_query_endpoint.map(|e| e.trim_end_matches('/').to_string()),
        }
    }

    fn build_read_url(&self, source: &SheetSource) -> Result<String> {
        let sheet = urlencoding::encode(&source.sheet);
        match source.kind {
            SourceKind::JsonArray => Ok(format!("{}?sheet={}", self.endpoint, sheet)),
            SourceKind::WrappedTable => {
                let base = self
                    .table_query_endpoint
                    .as_ref()
                    .context("No table query endpoint configured")?;
                let mut url = format!("{}?tqx=out:json&sheet={}", base, sheet);
                if let Some(query) = &source.query {
                    url.push_str("&tq=");
                    url.push_str(&urlencoding::encode(query));
                }
                Ok(url)
            }
        }
    }

    async fn get_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request to the sheet service")?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("Sheet service read failed with status {}", status);
        }

        response
            .text()
            .await
            .context("Failed to read sheet service response")
    }

    async fn post_form(&self, request: &WriteRequest) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .form(&request.form_pairs())
            .send()
            .await
            .context("Failed to send write to the sheet service")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Sheet service write failed with status {}: {}", status, body);
        }

        response
            .text()
            .await
            .context("Failed to read sheet service acknowledgement")
    }
}

#[async_trait]
impl SheetRepository for SheetClient {
    async fn fetch(&self, source: &SheetSource) -> Result<String, DashboardError> {
        let url = self
            .build_read_url(source)
            .map_err(|e| DashboardError::Transport(format!("{:#}", e)))?;

        tracing::debug!("Fetching sheet {} from {}", source.sheet, url);
        self.get_text(&url)
            .await
            .map_err(|e| DashboardError::Transport(format!("{:#}", e)))
    }

    async fn write(&self, request: &WriteRequest) -> Result<Ack, DashboardError> {
        let body = self
            .post_form(request)
            .await
            .map_err(|e| DashboardError::Transport(format!("{:#}", e)))?;
        Ok(Ack::from_body(&body))
    }
}
