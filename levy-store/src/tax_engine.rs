use async_trait::async_trait;
use levy_core::{parse_total_tax, Credentials, EngineEndpoint, EngineError, TaxEngineClient, TaxRequest, TaxResult};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;
use tracing::{debug, warn};

/// Longest error body kept on an `EngineError::Http`
const MAX_ERROR_BODY: usize = 512;

/// Tax engine over HTTPS: one POST of the transaction body per order
#[derive(Clone)]
pub struct HttpTaxEngineClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTaxEngineClient {
    pub fn new(timeout: Duration) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Configuration(format!("could not build HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl TaxEngineClient for HttpTaxEngineClient {
    async fn compute_tax(
        &self,
        request: &TaxRequest,
        credentials: &Credentials,
        endpoint: &EngineEndpoint,
    ) -> Result<TaxResult, EngineError> {
        // Checked before anything goes on the wire
        let authorization = credentials.basic_auth_value()?;
        let timeout_ms = self.timeout.as_millis() as u64;

        debug!(url = %endpoint.url, environment = %endpoint.environment, lines = request.lines().len(), "Posting transaction");

        let response = self
            .client
            .post(&endpoint.url)
            .header(AUTHORIZATION, authorization)
            .header(CONTENT_TYPE, "application/json")
            .json(&request.to_body())
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    EngineError::Network(format!("no response within {}ms", timeout_ms))
                } else {
                    EngineError::Network(error.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            if error.is_timeout() {
                EngineError::Network(format!("response body not received within {}ms", timeout_ms))
            } else {
                EngineError::Network(format!("could not read response body: {}", error))
            }
        })?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Tax engine rejected transaction");
            return Err(EngineError::Http {
                status: status.as_u16(),
                body: truncate(&body, MAX_ERROR_BODY),
            });
        }

        parse_total_tax(&body, request.currency())
    }
}

fn truncate(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
