use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{SpyCat, SpyCatCreate, SpyCatId, SpyCatUpdate},
    error::{ServiceError, ServiceErrorKind},
    protocol::{spy_cat_route, spy_cats_route},
};
use tracing::{debug, warn};

use crate::config::{normalize_api_url, Settings};

/// One operation per verb over the remote roster. Every call resolves to a
/// concrete value or a [`ServiceError`].
#[async_trait]
pub trait SpyCatApi: Send + Sync {
    async fn list_all(&self) -> Result<Vec<SpyCat>, ServiceError>;
    async fn get_one(&self, id: SpyCatId) -> Result<SpyCat, ServiceError>;
    async fn create(&self, draft: &SpyCatCreate) -> Result<SpyCat, ServiceError>;
    async fn update_salary(
        &self,
        id: SpyCatId,
        update: SpyCatUpdate,
    ) -> Result<SpyCat, ServiceError>;
    async fn delete(&self, id: SpyCatId) -> Result<(), ServiceError>;
}

pub struct HttpSpyCatApi {
    http: Client,
    server_url: String,
}

impl HttpSpyCatApi {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let server_url = normalize_api_url(&settings.api_url)?;
        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self { http, server_url })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn collection_url(&self) -> String {
        format!("{}{}", self.server_url, spy_cats_route())
    }

    fn item_url(&self, id: SpyCatId) -> String {
        format!("{}{}", self.server_url, spy_cat_route(id))
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, ServiceError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "api response");
        if status.is_success() {
            return Ok(response);
        }

        // A status already arrived; an unreadable body only loses the detail.
        let body = match response.bytes().await {
            Ok(body) => body.to_vec(),
            Err(read_err) => {
                debug!(status = status.as_u16(), error = %read_err, "failed to read error body");
                Vec::new()
            }
        };
        let err = ServiceError::from_response(status.as_u16(), status.canonical_reason(), &body);
        warn!(status = status.as_u16(), message = %err.message, "api request failed");
        Err(err)
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ServiceError> {
        self.execute(request)
            .await?
            .json::<T>()
            .await
            .map_err(transport_error)
    }
}

/// Maps failures where no usable response arrived. Timeouts land in the
/// same kind as connection failures; an unreadable success body is a
/// server fault.
fn transport_error(err: reqwest::Error) -> ServiceError {
    if err.is_decode() {
        return ServiceError::new(
            ServiceErrorKind::Server,
            format!("Unexpected response from server: {err}"),
        );
    }

    let message = if err.is_timeout() {
        "Request timed out; the server did not respond in time".to_string()
    } else if err.is_connect() {
        "Network error: unable to reach the server".to_string()
    } else {
        format!("Network error: {err}")
    };
    warn!(error = %err, "api transport failure");
    ServiceError::transport(message)
}

#[async_trait]
impl SpyCatApi for HttpSpyCatApi {
    async fn list_all(&self) -> Result<Vec<SpyCat>, ServiceError> {
        self.execute_json(self.http.get(self.collection_url())).await
    }

    async fn get_one(&self, id: SpyCatId) -> Result<SpyCat, ServiceError> {
        self.execute_json(self.http.get(self.item_url(id))).await
    }

    async fn create(&self, draft: &SpyCatCreate) -> Result<SpyCat, ServiceError> {
        self.execute_json(self.http.post(self.collection_url()).json(draft))
            .await
    }

    async fn update_salary(
        &self,
        id: SpyCatId,
        update: SpyCatUpdate,
    ) -> Result<SpyCat, ServiceError> {
        self.execute_json(self.http.put(self.item_url(id)).json(&update))
            .await
    }

    async fn delete(&self, id: SpyCatId) -> Result<(), ServiceError> {
        self.execute(self.http.delete(self.item_url(id))).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
