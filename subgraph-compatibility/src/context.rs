//! The capability compatibility checks use to talk to a subgraph.
use async_trait::async_trait;
use http::HeaderMap;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use tracing::trace;
use url::Url;

use crate::error::TransportError;

/// A GraphQL-over-HTTP request body.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphQLRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub variables: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub operation_name: Option<String>,
}

impl GraphQLRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = Some(variables);
        self
    }

    pub fn with_operation_name(mut self, operation_name: impl Into<String>) -> Self {
        self.operation_name = Some(operation_name.into());
        self
    }
}

/// Sends GraphQL requests to the subgraph under test.
#[async_trait]
pub trait TestContext: Send + Sync {
    /// Send `request`, with `headers` added to the context's own, and return the JSON response.
    async fn send(
        &self,
        request: GraphQLRequest,
        headers: Option<HeaderMap>,
    ) -> Result<Value, TransportError>;
}

/// A [`TestContext`] posting JSON requests to a subgraph URL.
#[derive(Clone, Debug)]
pub struct HttpTestContext {
    http_client: reqwest::Client,
    url: Url,
    default_headers: HeaderMap,
}

impl HttpTestContext {
    pub fn new(url: Url) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            url,
            default_headers: HeaderMap::new(),
        }
    }

    /// Headers sent with every request. Per-request headers with the same name replace them.
    pub fn with_default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = headers;
        self
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl TestContext for HttpTestContext {
    async fn send(
        &self,
        request: GraphQLRequest,
        headers: Option<HeaderMap>,
    ) -> Result<Value, TransportError> {
        let mut request_headers = self.default_headers.clone();
        if let Some(headers) = headers {
            request_headers.extend(headers);
        }

        trace!(url = %self.url, ?request, "sending request to subgraph");
        let response = self
            .http_client
            .post(self.url.clone())
            .headers(request_headers)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        trace!(%status, body = %String::from_utf8_lossy(&body), "response from subgraph");
        if !status.is_success() {
            return Err(TransportError::Status {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }
}
