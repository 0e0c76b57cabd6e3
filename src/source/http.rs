use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{DataSource, ImportOptions, ImportPayload, ImportReport, SourceError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// REST-backed data source for one view collection.
///
/// Routes: `GET {base}/{view}`, `POST {base}/{view}`,
/// `POST {base}/{view}/import`.
pub struct HttpDataSource<R> {
    base_url: String,
    view_key: String,
    client: reqwest::Client,
    _row: PhantomData<fn() -> R>,
}

impl<R> HttpDataSource<R> {
    pub fn new(base_url: impl Into<String>, view_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client construction cannot fail with static config");
        Self {
            base_url: base_url.into(),
            view_key: view_key.into(),
            client,
            _row: PhantomData,
        }
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), self.view_key)
    }
}

/// Map a failed response to a transport error, preferring the server-provided
/// `message` field over the generic fallback.
async fn transport_error(response: reqwest::Response) -> SourceError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
    SourceError::Transport { message }
}

fn request_error(e: reqwest::Error) -> SourceError {
    SourceError::Transport {
        message: e.to_string(),
    }
}

#[async_trait]
impl<R> DataSource<R> for HttpDataSource<R>
where
    R: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn fetch(&self) -> Result<Vec<R>, SourceError> {
        let response = self
            .client
            .get(self.collection_url())
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(transport_error(response).await);
        }

        response.json().await.map_err(request_error)
    }

    async fn create(&self, row: R) -> Result<R, SourceError> {
        let response = self
            .client
            .post(self.collection_url())
            .json(&row)
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(transport_error(response).await);
        }

        response.json().await.map_err(request_error)
    }

    async fn import(
        &self,
        payload: ImportPayload,
        options: ImportOptions,
    ) -> Result<ImportReport, SourceError> {
        let body = serde_json::json!({
            "file_name": payload.file_name,
            "data": payload.data,
            "options": options,
        });

        let response = self
            .client
            .post(format!("{}/import", self.collection_url()))
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(transport_error(response).await);
        }

        response.json().await.map_err(request_error)
    }
}
