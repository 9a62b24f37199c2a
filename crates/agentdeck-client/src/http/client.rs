// reqwest implementation of every collaborator trait against one runtime API

use agentdeck_types::{AgentDefinition, AgentSummary, ConversationPage, ConversationPayload, ConversationSnapshot};
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, Url};
use std::time::Duration;

use crate::config::ClientConfig;
use crate::listing::{AgentListResponse, ConversationListResponse};
use crate::traits::{
    AgentDirectory, AgentRuntime, ByteStream, ConversationStore, KnowledgeBase, PageRequest,
    RunRequest, UploadFile,
};

/// HTTP client for the agent runtime API (reqwest, no SDK)
#[derive(Clone)]
pub struct HttpClient {
    http_client: reqwest::Client,
    base_url: Url,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid base URL: {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Base URL cannot carry a path: {}", config.base_url);
        }

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.auth_token {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token))
                    .context("Invalid auth token format")?,
            );
        }

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url,
        })
    }

    /// Base URL with path segments appended (each segment is percent-encoded)
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Base URL cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn ensure_success(response: Response, operation: &str) -> Result<Response> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("{} failed ({}): {}", operation, status, error_text);
        }
        Ok(response)
    }
}

#[async_trait]
impl AgentRuntime for HttpClient {
    async fn run_stream(&self, request: RunRequest) -> Result<ByteStream> {
        let url = self.endpoint(&["agents", "run", "stream"])?;
        tracing::debug!(agent = %request.agent_name, conversation_id = %request.conversation_id, "Opening run stream");

        let response = self
            .http_client
            .post(url)
            .header(ACCEPT, "text/event-stream")
            .json(&request)
            .send()
            .await
            .context("Failed to send run request")?;

        let response = Self::ensure_success(response, "Agent run").await?;

        let bytes = response.bytes_stream().map(|chunk| {
            chunk
                .map(|b| b.to_vec())
                .map_err(|e| anyhow::anyhow!("Stream error: {}", e))
        });

        Ok(Box::pin(bytes))
    }
}

#[async_trait]
impl AgentDirectory for HttpClient {
    async fn list_agents(&self) -> Result<Vec<AgentSummary>> {
        let response = self
            .http_client
            .get(self.endpoint(&["agents"])?)
            .send()
            .await
            .context("Failed to send request")?;

        let raw: AgentListResponse = Self::ensure_success(response, "List agents")
            .await?
            .json()
            .await
            .context("Failed to parse agent list")?;

        Ok(raw.into_agents())
    }

    async fn get_agent(&self, name: &str) -> Result<AgentDefinition> {
        let response = self
            .http_client
            .get(self.endpoint(&["agents", name])?)
            .send()
            .await
            .context("Failed to send request")?;

        Self::ensure_success(response, "Get agent")
            .await?
            .json()
            .await
            .context("Failed to parse agent definition")
    }
}

#[async_trait]
impl ConversationStore for HttpClient {
    async fn save_conversation(&self, payload: &ConversationPayload) -> Result<()> {
        let response = self
            .http_client
            .post(self.endpoint(&["conversations"])?)
            .json(payload)
            .send()
            .await
            .context("Failed to send request")?;

        Self::ensure_success(response, "Save conversation").await?;
        Ok(())
    }

    async fn list_conversations(&self, paging: PageRequest) -> Result<ConversationPage> {
        let response = self
            .http_client
            .get(self.endpoint(&["conversations"])?)
            .query(&[("page", paging.page), ("page_size", paging.page_size)])
            .send()
            .await
            .context("Failed to send request")?;

        let raw: ConversationListResponse = Self::ensure_success(response, "List conversations")
            .await?
            .json()
            .await
            .context("Failed to parse conversation list")?;

        Ok(raw.into_page(paging))
    }

    async fn get_conversation(&self, id: &str) -> Result<ConversationSnapshot> {
        let response = self
            .http_client
            .get(self.endpoint(&["conversations", id])?)
            .send()
            .await
            .context("Failed to send request")?;

        Self::ensure_success(response, "Get conversation")
            .await?
            .json()
            .await
            .context("Failed to parse conversation")
    }

    async fn delete_conversation(&self, id: &str) -> Result<()> {
        let response = self
            .http_client
            .delete(self.endpoint(&["conversations", id])?)
            .send()
            .await
            .context("Failed to send request")?;

        Self::ensure_success(response, "Delete conversation").await?;
        Ok(())
    }
}

#[async_trait]
impl KnowledgeBase for HttpClient {
    async fn upload_knowledge(&self, collection: &str, files: Vec<UploadFile>) -> Result<()> {
        let form = files.into_iter().fold(Form::new(), |form, file| {
            form.part("files", Part::bytes(file.bytes).file_name(file.name))
        });

        let response = self
            .http_client
            .post(self.endpoint(&["knowledge", collection, "upload"])?)
            .multipart(form)
            .send()
            .await
            .context("Failed to send upload")?;

        Self::ensure_success(response, "Knowledge upload").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = HttpClient::new(&ClientConfig::new("http://localhost:8000/api/")).unwrap();
        let url = client.endpoint(&["agents", "run", "stream"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/api/agents/run/stream");
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let client = HttpClient::new(&ClientConfig::new("http://localhost:8000")).unwrap();
        let url = client.endpoint(&["agents", "my agent/v2"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/agents/my%20agent%2Fv2");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(HttpClient::new(&ClientConfig::new("not a url")).is_err());
        assert!(HttpClient::new(&ClientConfig::new("mailto:someone@example.com")).is_err());
    }

    #[test]
    fn test_invalid_token() {
        let config = ClientConfig::new("http://localhost").with_auth_token("bad\ntoken");
        assert!(HttpClient::new(&config).is_err());
    }
}
