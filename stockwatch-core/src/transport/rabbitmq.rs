//! RabbitMQ transport over the management HTTP API.
//!
//! Publishing goes through `POST /api/exchanges/{vhost}/{exchange}/publish`
//! and peeking through `POST /api/queues/{vhost}/{queue}/get`. Both use
//! basic auth with the configured broker credentials.

use super::{DeadLetterMessage, QueueInspector, QueueTransport, TransportError};
use crate::config::BrokerConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// Name the management API uses for the nameless default exchange.
const DEFAULT_EXCHANGE: &str = "amq.default";

/// Persistent delivery mode.
const DELIVERY_MODE_PERSISTENT: u8 = 2;

#[derive(Debug, Serialize)]
struct PublishRequest<'a> {
    properties: MessageProperties,
    routing_key: &'a str,
    payload: &'a str,
    payload_encoding: &'static str,
}

#[derive(Debug, Serialize)]
struct MessageProperties {
    content_type: &'static str,
    delivery_mode: u8,
    message_id: String,
}

#[derive(Debug, Deserialize)]
struct PublishResponse {
    routed: bool,
}

#[derive(Debug, Serialize)]
struct GetRequest {
    count: u32,
    ackmode: &'static str,
    encoding: &'static str,
}

#[derive(Debug, Deserialize)]
struct GetResponseItem {
    routing_key: String,
    redelivered: bool,
    payload: String,
    payload_encoding: String,
}

/// `QueueTransport` backed by the RabbitMQ management HTTP API.
#[derive(Clone)]
pub struct RabbitMqHttpTransport {
    http_client: reqwest::Client,
    management_url: Url,
    vhost: String,
    exchange: String,
    username: String,
    password: String,
}

impl RabbitMqHttpTransport {
    /// Create a transport from broker settings.
    ///
    /// Every request is bounded by `publish_timeout`.
    pub fn new(config: &BrokerConfig) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.publish_timeout)
            .build()?;
        Ok(Self {
            http_client,
            management_url: config.management_url.clone(),
            vhost: config.vhost.clone(),
            exchange: config.exchange.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn exchange_name(&self) -> &str {
        if self.exchange.is_empty() {
            DEFAULT_EXCHANGE
        } else {
            &self.exchange
        }
    }

    /// Build `{management_url}/api/{segments...}` with every segment
    /// percent-encoded (the default vhost `/` becomes `%2F`).
    fn endpoint(&self, segments: &[&str]) -> Result<Url, TransportError> {
        let mut url = self.management_url.as_str().trim_end_matches('/').to_string();
        url.push_str("/api");
        for segment in segments {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        Ok(Url::parse(&url)?)
    }

    fn publish_url(&self) -> Result<Url, TransportError> {
        self.endpoint(&["exchanges", &self.vhost, self.exchange_name(), "publish"])
    }

    fn get_url(&self, queue: &str) -> Result<Url, TransportError> {
        self.endpoint(&["queues", &self.vhost, queue, "get"])
    }

    async fn post<B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<reqwest::Response, TransportError> {
        let response = self
            .http_client
            .post(url)
            .basic_auth(&self.username, Some(&self.password))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(TransportError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl QueueTransport for RabbitMqHttpTransport {
    async fn publish(&self, destination: &str, payload: &str) -> Result<(), TransportError> {
        let message_id = Uuid::now_v7().to_string();
        let request = PublishRequest {
            properties: MessageProperties {
                content_type: "application/json",
                delivery_mode: DELIVERY_MODE_PERSISTENT,
                message_id: message_id.clone(),
            },
            routing_key: destination,
            payload,
            payload_encoding: "string",
        };

        let response = self.post(self.publish_url()?, &request).await?;
        let response: PublishResponse = response.json().await?;
        if !response.routed {
            return Err(TransportError::Unroutable {
                destination: destination.to_string(),
            });
        }

        debug!(%message_id, destination, "Message routed by broker");
        Ok(())
    }
}

#[async_trait]
impl QueueInspector for RabbitMqHttpTransport {
    async fn peek(
        &self,
        queue: &str,
        count: u32,
    ) -> Result<Vec<DeadLetterMessage>, TransportError> {
        let request = GetRequest {
            count,
            // Requeue so inspecting never drains the queue.
            ackmode: "ack_requeue_true",
            encoding: "auto",
        };

        let response = self.post(self.get_url(queue)?, &request).await?;
        let items: Vec<GetResponseItem> = response.json().await?;
        Ok(items
            .into_iter()
            .map(|item| DeadLetterMessage {
                routing_key: item.routing_key,
                redelivered: item.redelivered,
                payload: item.payload,
                payload_encoding: item.payload_encoding,
            })
            .collect())
    }
}
