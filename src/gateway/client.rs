use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::types::{
    Feedback, RefineRequest, RefineResponse, Refinement, SearchRequest, SearchResponse,
    SearchResult,
};
use super::SearchGateway;
use crate::config::{GatewayConfig, RequestConfig};
use crate::error::{GatewayError, GatewayResult};

/// HTTP client for the search/refine backend
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    request_config: RequestConfig,
}

impl HttpGateway {
    /// Create a new gateway client
    pub fn new(config: &GatewayConfig, request_config: RequestConfig) -> GatewayResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(GatewayError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_config,
        })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body and decode a JSON response, retrying with backoff
    async fn post_json<B, T>(&self, path: &str, body: &B, operation: &str) -> GatewayResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);

        let mut last_error = None;
        let mut retries = 0;

        while retries <= self.request_config.max_retries {
            if retries > 0 {
                let delay = Duration::from_millis(
                    self.request_config.retry_delay_ms * (2_u64.pow(retries - 1)),
                );
                warn!(
                    operation,
                    retry = retries,
                    delay_ms = delay.as_millis(),
                    "Retrying backend request"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();

            match self.execute_request(&url, body).await {
                Ok(response) => {
                    let latency = start.elapsed();
                    info!(
                        operation,
                        latency_ms = latency.as_millis(),
                        "Backend call succeeded"
                    );
                    return Ok(response);
                }
                Err(e) => {
                    let latency = start.elapsed();
                    error!(
                        operation,
                        error = %e,
                        latency_ms = latency.as_millis(),
                        retry = retries,
                        "Backend call failed"
                    );
                    last_error = Some(e);
                    retries += 1;
                }
            }
        }

        Err(GatewayError::Unavailable {
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string()),
            retries,
        })
    }

    /// Execute a single request (internal)
    async fn execute_request<B, T>(&self, url: &str, body: &B) -> GatewayResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout {
                        timeout_ms: self.request_config.timeout_ms,
                    }
                } else {
                    GatewayError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::InvalidResponse {
                message: format!("Failed to parse response: {}", e),
            })
    }
}

#[async_trait]
impl SearchGateway for HttpGateway {
    async fn search(&self, query: String) -> GatewayResult<Vec<SearchResult>> {
        debug!(query = %query, "Calling search");

        let request = SearchRequest { query };
        let response: SearchResponse = self.post_json("/api/search", &request, "search").await?;

        if response.results.len() > 3 {
            return Err(GatewayError::UnexpectedResultCount {
                operation: "search".to_string(),
                expected: "at most 3".to_string(),
                got: response.results.len(),
            });
        }

        Ok(response.results)
    }

    async fn refine(
        &self,
        feedback: Feedback,
        clicked_result: SearchResult,
        all_results: [SearchResult; 3],
        result_index: usize,
    ) -> GatewayResult<Refinement> {
        debug!(
            feedback = %feedback,
            clicked = %clicked_result.title,
            result_index,
            "Calling refine"
        );

        let request = RefineRequest {
            feedback,
            clicked_result,
            all_results,
            result_index,
        };
        let response: RefineResponse = self.post_json("/api/refine", &request, "refine").await?;

        Refinement::from_results(feedback, response.results)
    }
}
