//! HTTP stock client
//!
//! Endpoint shapes come entirely from [`TargetConfig`]: path templates with
//! `{name}` / `{kind}` placeholders and a JSON pointer to the quantity.

use async_trait::async_trait;
use erpqa_common::{Quantity, StockKey};
use reqwest::{RequestBuilder, Response, Url};
use serde_json::json;
use tracing::debug;

use crate::config::TargetConfig;
use crate::error::{E2eError, E2eResult};
use crate::stock::{QuantityReader, Receiver};

/// Client for the ERP stock endpoints
#[derive(Debug, Clone)]
pub struct StockClient {
    http: reqwest::Client,
    base_url: String,
    stock_path: String,
    quantity_pointer: String,
    receiving_path: String,
    api_token: Option<String>,
}

impl StockClient {
    pub fn new(config: &TargetConfig) -> E2eResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            stock_path: config.stock_path.clone(),
            quantity_pointer: config.quantity_pointer.clone(),
            receiving_path: config.receiving_path.clone(),
            api_token: config.api_token.clone(),
        })
    }

    /// Expand a path template for `key` into an absolute URL
    pub fn url_for(&self, template: &str, key: &StockKey) -> E2eResult<Url> {
        let path = template
            .replace("{name}", &urlencoding::encode(&key.name))
            .replace("{kind}", key.kind.as_str());
        let url = format!("{}{}", self.base_url, path);

        Url::parse(&url)
            .map_err(|e| E2eError::Config(format!("invalid stock url '{}': {}", url, e)))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Turn a non-2xx response into [`E2eError::Rejected`]
async fn check_status(url: &Url, response: Response) -> E2eResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(E2eError::Rejected {
        url: url.to_string(),
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl QuantityReader for StockClient {
    async fn read_quantity(&self, key: &StockKey) -> E2eResult<Quantity> {
        let url = self.url_for(&self.stock_path, key)?;
        let response = self.authorized(self.http.get(url.clone())).send().await?;
        let body: serde_json::Value = check_status(&url, response).await?.json().await?;

        let value = body.pointer(&self.quantity_pointer).ok_or_else(|| {
            E2eError::UnexpectedResponse(format!(
                "no quantity at '{}' in response for {}",
                self.quantity_pointer, key
            ))
        })?;

        let quantity = Quantity::from_json(value)?;
        debug!("read {} = {}", key, quantity);
        Ok(quantity)
    }
}

#[async_trait]
impl Receiver for StockClient {
    async fn receive(&self, key: &StockKey, delta: &Quantity) -> E2eResult<()> {
        let url = self.url_for(&self.receiving_path, key)?;
        let body = json!({
            "name": key.name,
            "kind": key.kind,
            "quantity": delta,
        });

        let response = self
            .authorized(self.http.post(url.clone()))
            .json(&body)
            .send()
            .await?;
        check_status(&url, response).await?;

        debug!("received {} into {}", delta, key);
        Ok(())
    }
}
