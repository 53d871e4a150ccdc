//! Remote chat service
//!
//! [`ChatService`] is the seam between the session and the network.
//! [`HttpChatService`] speaks the JSON-over-HTTP contract:
//!
//! | call            | request                     | success body          |
//! |-----------------|-----------------------------|-----------------------|
//! | `load_history`  | `GET /history`              | `{history: [...]}`    |
//! | `send_message`  | `POST /chat {message}`      | `{history: [...]}`    |
//! | `upload_file`   | `POST /upload` (multipart)  | `{content}` or `{}`   |
//! | `reset`         | `POST /reset`               | anything              |
//! | `list_files`    | `GET /files`                | `{files: [...]}`      |
//! | `delete_file`   | `DELETE /files/{id}`        | anything              |
//!
//! Every non-2xx answer carries `{error: string}`.

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use shared_types::{
    ChatRequest, FilesResponse, HistoryResponse, Message, UploadResponse, UploadedFile,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::intake::StagedFile;

#[async_trait]
pub trait ChatService: Send + Sync {
    async fn load_history(&self) -> Result<Vec<Message>>;

    /// Returns the full updated history, including the assistant's reply
    async fn send_message(&self, text: &str) -> Result<Vec<Message>>;

    async fn upload_file(&self, file: StagedFile) -> Result<UploadResponse>;

    async fn reset(&self) -> Result<()>;

    async fn list_files(&self) -> Result<Vec<UploadedFile>>;

    async fn delete_file(&self, id: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct HttpChatService {
    client: Client,
    base: Url,
}

impl HttpChatService {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Self::with_client(Client::new(), &config.base_url)
    }

    /// Use a preconfigured client (cookies, proxies, transport timeouts)
    pub fn with_client(client: Client, base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| ClientError::InvalidConfig(format!("base URL {base_url:?}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidConfig(format!(
                "base URL {base_url:?} cannot carry a path"
            )));
        }
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Turn a non-2xx response into a service error with the reported message
async fn describe_http_error(response: Response) -> ClientError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    let message = if body.trim().is_empty() {
        format!("HTTP error: {status}")
    } else if let Ok(json) = serde_json::from_str::<serde_json::Value>(&body) {
        json.get("error")
            .and_then(|v| v.as_str())
            .or_else(|| json.get("message").and_then(|v| v.as_str()))
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP error: {status} ({body})"))
    } else {
        format!("HTTP error: {status} ({body})")
    };

    ClientError::Service {
        status: status.as_u16(),
        message,
    }
}

async fn checked(response: Response) -> Result<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(describe_http_error(response).await)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = checked(response).await?;
    let body = response.bytes().await?;
    serde_json::from_slice(&body).map_err(|e| ClientError::Protocol(e.to_string()))
}

/// Drain a body whose content does not matter
async fn acknowledge(response: Response) -> Result<()> {
    let response = checked(response).await?;
    response.bytes().await?;
    Ok(())
}

#[async_trait]
impl ChatService for HttpChatService {
    async fn load_history(&self) -> Result<Vec<Message>> {
        let response = self.client.get(self.endpoint(&["history"])).send().await?;
        let data: HistoryResponse = decode(response).await?;
        Ok(data.history)
    }

    async fn send_message(&self, text: &str) -> Result<Vec<Message>> {
        let request = ChatRequest {
            message: text.to_string(),
        };
        let response = self
            .client
            .post(self.endpoint(&["chat"]))
            .json(&request)
            .send()
            .await?;
        let data: HistoryResponse = decode(response).await?;
        Ok(data.history)
    }

    async fn upload_file(&self, file: StagedFile) -> Result<UploadResponse> {
        let form = file
            .into_form()
            .map_err(|e| ClientError::Network(format!("Failed to build upload: {e}")))?;
        let response = self
            .client
            .post(self.endpoint(&["upload"]))
            .multipart(form)
            .send()
            .await?;
        decode(response).await
    }

    async fn reset(&self) -> Result<()> {
        let response = self.client.post(self.endpoint(&["reset"])).send().await?;
        acknowledge(response).await
    }

    async fn list_files(&self) -> Result<Vec<UploadedFile>> {
        let response = self.client.get(self.endpoint(&["files"])).send().await?;
        let data: FilesResponse = decode(response).await?;
        Ok(data.files)
    }

    async fn delete_file(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.endpoint(&["files", id]))
            .send()
            .await?;
        acknowledge(response).await
    }
}
