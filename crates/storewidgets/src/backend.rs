//! Catalog lookup and cart mutation capabilities.
//!
//! The widgets only see the [`Catalog`] and [`Cart`] traits. [`GraphqlBackend`]
//! implements both against a storefront GraphQL endpoint.

use crate::error::BackendError;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use storewidgets_core::config::BackendConfig;
use storewidgets_core::contract::{CartMutation, LookupResponse};
use tracing::debug;

const PRODUCT_BY_SKU: &str = "query getProductBySku($sku: String!) { \
     product(identifier: { field: sku, value: $sku }) { productId } }";

const ADD_TO_CART: &str = "mutation addToCart($items: [ItemInput], $salesChannel: String) { \
     addToCart(items: $items, salesChannel: $salesChannel) { id } }";

pub trait Catalog {
    /// Resolve a product code. A missing product is `Ok` with no product.
    fn product_by_sku(&self, sku: &str) -> impl Future<Output = Result<LookupResponse, BackendError>> + Send;
}

pub trait Cart {
    fn add_to_cart(&self, mutation: &CartMutation) -> impl Future<Output = Result<(), BackendError>> + Send;
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlErrorItem>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorItem {
    message: String,
}

pub struct GraphqlBackend {
    client: Client,
    endpoint: Url,
}

impl GraphqlBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Self::with_base_url(&config.endpoint, config.timeout_secs)
    }

    /// Build a client for an arbitrary endpoint (tests point this at wiremock).
    pub fn with_base_url(endpoint: &str, timeout_secs: u64) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("storewidgets/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let endpoint = Url::parse(endpoint)
            .map_err(|e| BackendError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
        Ok(Self { client, endpoint })
    }

    /// POST one GraphQL operation and return its `data` member.
    async fn execute(&self, operation: &str, query: &str, variables: Value) -> Result<Value, BackendError> {
        debug!(operation, "sending GraphQL request");
        let body = json!({
            "operationName": operation,
            "query": query,
            "variables": variables,
        });
        let bytes = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let response: GraphqlResponse =
            serde_json::from_slice(&bytes).map_err(|source| BackendError::Deserialize {
                context: operation.to_string(),
                source,
            })?;

        if !response.errors.is_empty() {
            let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(BackendError::GraphQl(messages.join("; ")));
        }
        Ok(response.data.unwrap_or(Value::Null))
    }
}

impl Catalog for GraphqlBackend {
    async fn product_by_sku(&self, sku: &str) -> Result<LookupResponse, BackendError> {
        let data = self
            .execute("getProductBySku", PRODUCT_BY_SKU, json!({ "sku": sku }))
            .await?;
        if data.is_null() {
            return Ok(LookupResponse::default());
        }
        serde_json::from_value(data).map_err(|source| BackendError::Deserialize {
            context: "getProductBySku".into(),
            source,
        })
    }
}

impl Cart for GraphqlBackend {
    async fn add_to_cart(&self, mutation: &CartMutation) -> Result<(), BackendError> {
        let variables = serde_json::to_value(mutation).map_err(|source| BackendError::Deserialize {
            context: "addToCart".into(),
            source,
        })?;
        self.execute("addToCart", ADD_TO_CART, variables).await?;
        Ok(())
    }
}
