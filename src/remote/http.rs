//! reqwest-backed `RemoteApi`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::RemoteError;
use crate::types::{Area, SyncBatch, WorkLookup};

use super::RemoteApi;

const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// HTTP client for the survey server.
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl HttpRemote {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            bearer_token: None,
        }
    }

    /// Attach a bearer token to authenticated endpoints (the work lookup).
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Turn a non-success response into `Rejected`, extracting the server's
    /// `message` field when one is present.
    async fn check_status(res: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let message = match res.json::<Value>().await {
            Ok(body) => body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("server returned error")
                .to_string(),
            Err(_) => "server returned error".to_string(),
        };
        Err(RemoteError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

fn transport(e: reqwest::Error) -> RemoteError {
    RemoteError::Transport(e.to_string())
}

#[derive(Deserialize)]
struct SheetResponse {
    #[serde(default)]
    data: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct AreasResponse {
    #[serde(default)]
    data: Vec<Area>,
}

#[derive(Deserialize)]
struct AreaResponse {
    #[serde(default)]
    data: Option<Area>,
}

#[async_trait]
impl RemoteApi for HttpRemote {
    async fn is_reachable(&self) -> bool {
        // Any HTTP response counts; only a transport failure means offline.
        self.client
            .get(&self.base_url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .is_ok()
    }

    async fn fetch_work(&self, user_id: &str) -> Result<WorkLookup, RemoteError> {
        let mut req = self.client.get(self.url(&format!("work/{user_id}")));
        if let Some(token) = &self.bearer_token {
            req = req.bearer_auth(token);
        }
        let res = req.send().await.map_err(transport)?;
        let res = Self::check_status(res).await?;
        res.json::<WorkLookup>()
            .await
            .map_err(|e| RemoteError::Malformed(e.to_string()))
    }

    async fn fetch_last_serial(&self) -> Result<Option<u64>, RemoteError> {
        let res = self
            .client
            .get(self.url("sheet"))
            .send()
            .await
            .map_err(transport)?;
        let res = Self::check_status(res).await?;
        let sheet: SheetResponse = res
            .json()
            .await
            .map_err(|e| RemoteError::Malformed(e.to_string()))?;

        let Some(last_row) = sheet.data.last() else {
            return Ok(None);
        };
        let first = last_row
            .first()
            .ok_or_else(|| RemoteError::Malformed("sheet row is empty".to_string()))?;
        let serial = match first {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        serial.map(Some).ok_or_else(|| {
            RemoteError::Malformed(format!("sheet serial column is not a number: {first}"))
        })
    }

    async fn push_surveys(&self, batch: &SyncBatch) -> Result<(), RemoteError> {
        let res = self
            .client
            .post(self.url("sheet/sync"))
            .json(batch)
            .send()
            .await
            .map_err(transport)?;
        Self::check_status(res).await.map(|_| ())
    }

    async fn push_area(&self, name: &str) -> Result<Option<Area>, RemoteError> {
        let res = self
            .client
            .post(self.url("sheet/areas"))
            .json(&serde_json::json!({ "areaName": name }))
            .send()
            .await
            .map_err(transport)?;
        let res = Self::check_status(res).await?;
        let body: AreaResponse = res
            .json()
            .await
            .map_err(|e| RemoteError::Malformed(e.to_string()))?;
        Ok(body.data)
    }

    async fn fetch_areas(&self) -> Result<Vec<Area>, RemoteError> {
        let res = self
            .client
            .get(self.url("sheet/areas"))
            .send()
            .await
            .map_err(transport)?;
        let res = Self::check_status(res).await?;
        let body: AreasResponse = res
            .json()
            .await
            .map_err(|e| RemoteError::Malformed(e.to_string()))?;
        Ok(body.data)
    }
}
