use crate::adapters::sse::decode_stream;
use crate::config::ClientConfig;
use crate::domain::model::{
    DeliveryEta, DeliveryLocation, MenuItem, OrderDetails, OrderReceipt, OrderSubmission,
    PaymentReceipt,
};
use crate::domain::ports::{EventFrameStream, EventTransport, OrderApi};
use crate::utils::error::{OrderError, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

const FALLBACK_ERROR: &str = "unknown error";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// reqwest-backed client for the ordering service.
#[derive(Debug, Clone)]
pub struct HttpOrderApi {
    base_url: Url,
    client: Client,
    // The event stream stays open indefinitely, so it gets a client without
    // a whole-request timeout.
    stream_client: Client,
}

impl HttpOrderApi {
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            client: Client::new(),
            stream_client: Client::new(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_seconds);
        let client = Client::builder().timeout(timeout).build()?;
        let stream_client = Client::builder().connect_timeout(timeout).build()?;

        Ok(Self {
            base_url: Url::parse(&config.base_url)?,
            client,
            stream_client,
        })
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| OrderError::ConfigError {
                message: format!("base URL cannot take a path: {}", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Reads the server's `{error}` message, or a fallback when the body has none.
    async fn error_message(response: Response) -> String {
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(ErrorBody { error: Some(message) }) if !message.trim().is_empty() => message,
            _ => {
                tracing::debug!("No error message in {} response", status);
                FALLBACK_ERROR.to_string()
            }
        }
    }
}

#[async_trait]
impl OrderApi for HttpOrderApi {
    async fn fetch_menu(&self, category: Option<&str>) -> Result<Vec<MenuItem>> {
        let url = self.endpoint(&["menu"])?;
        tracing::debug!("Making API request to: {}", url);

        let mut request = self.client.get(url);
        if let Some(category) = category {
            request = request.query(&[("category", category)]);
        }
        let response = request.send().await?;
        tracing::debug!("API response status: {}", response.status());

        if !response.status().is_success() {
            return Err(OrderError::RequestError {
                message: Self::error_message(response).await,
            });
        }
        Ok(response.json().await?)
    }

    async fn submit_order(&self, submission: &OrderSubmission) -> Result<OrderReceipt> {
        let url = self.endpoint(&["orders"])?;
        tracing::debug!("Making API request to: {}", url);

        let response = self
            .client
            .post(url)
            .json(submission)
            .send()
            .await
            .map_err(|e| OrderError::SubmissionError {
                message: format!("could not reach the server: {}", e),
            })?;
        tracing::debug!("API response status: {}", response.status());

        if !response.status().is_success() {
            return Err(OrderError::SubmissionError {
                message: Self::error_message(response).await,
            });
        }
        Ok(response.json().await?)
    }

    async fn fetch_order(&self, order_id: &str) -> Result<OrderDetails> {
        let url = self.endpoint(&["orders", order_id])?;
        tracing::debug!("Making API request to: {}", url);

        let response = self.client.get(url).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(OrderError::NotFound {
                id: order_id.to_string(),
            }),
            status if status.is_success() => Ok(response.json().await?),
            _ => Err(OrderError::RequestError {
                message: Self::error_message(response).await,
            }),
        }
    }

    async fn pay_order(&self, order_id: &str, payment_token: &str) -> Result<PaymentReceipt> {
        let url = self.endpoint(&["orders", order_id, "pay"])?;
        tracing::debug!("Making API request to: {}", url);

        let body = serde_json::json!({ "paymentToken": payment_token });
        let response = self.client.post(url).json(&body).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(OrderError::NotFound {
                id: order_id.to_string(),
            }),
            status if status.is_success() => Ok(response.json().await?),
            _ => Err(OrderError::SubmissionError {
                message: Self::error_message(response).await,
            }),
        }
    }

    async fn set_delivery_location(
        &self,
        order_id: &str,
        location: DeliveryLocation,
    ) -> Result<DeliveryEta> {
        let url = self.endpoint(&["orders", order_id, "track"])?;
        tracing::debug!("Making API request to: {}", url);

        let response = self.client.post(url).json(&location).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(OrderError::NotFound {
                id: order_id.to_string(),
            }),
            status if status.is_success() => Ok(response.json().await?),
            _ => Err(OrderError::SubmissionError {
                message: Self::error_message(response).await,
            }),
        }
    }
}

#[async_trait]
impl EventTransport for HttpOrderApi {
    async fn open_event_stream(&self, order_id: &str) -> Result<EventFrameStream> {
        let url = self.endpoint(&["orders", order_id, "events"])?;
        tracing::debug!("Opening event stream: {}", url);

        let response = self
            .stream_client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| OrderError::TransportError {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(OrderError::TransportError {
                message: format!("event stream refused with status {}", response.status()),
            });
        }

        Ok(decode_stream(response.bytes_stream()))
    }
}
