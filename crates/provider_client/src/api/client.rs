use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use base64::Engine;
use chat_core::{Config, Message, ProxyAuth};
use log::{debug, error, info};
use reqwest::header::HeaderMap;
use reqwest::{multipart, Client, Proxy, Response};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;

use crate::api::models::ChatRequest;
use crate::error::UpstreamError;
use crate::router::{route, Route};
use crate::stream::{aggregate, check_response, StreamAggregator, StreamEvent};

fn apply_proxy_auth(proxy: Proxy, auth: Option<&ProxyAuth>) -> Proxy {
    let Some(auth) = auth else {
        return proxy;
    };
    if auth.username.is_empty() {
        return proxy;
    }
    proxy.basic_auth(&auth.username, &auth.password)
}

/// HTTP client shared by all provider routes.
#[derive(Debug, Clone)]
pub struct ProviderClient {
    client: Arc<ClientWithMiddleware>,
    config: Config,
}

impl ProviderClient {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let client = Self::build_http_client(&config)?;
        let retry_client = Self::build_retry_client(client);
        Ok(Self {
            client: Arc::new(retry_client),
            config,
        })
    }

    fn build_http_client(config: &Config) -> anyhow::Result<Client> {
        let mut builder = Client::builder().default_headers(Self::get_default_headers());
        if !config.http_proxy.is_empty() {
            let mut proxy = Proxy::http(&config.http_proxy)?;
            proxy = apply_proxy_auth(proxy, config.http_proxy_auth.as_ref());
            builder = builder.proxy(proxy);
        }
        if !config.https_proxy.is_empty() {
            let mut proxy = Proxy::https(&config.https_proxy)?;
            proxy = apply_proxy_auth(proxy, config.https_proxy_auth.as_ref());
            builder = builder.proxy(proxy);
        }
        builder
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {e}"))
    }

    fn build_retry_client(client: Client) -> ClientWithMiddleware {
        // Transient transport failures only; whole turns are never retried
        // automatically.
        let retry_policy = ExponentialBackoff::builder()
            .retry_bounds(Duration::from_millis(100), Duration::from_secs(5))
            .build_with_max_retries(3);

        ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build()
    }

    fn get_default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("accept", "application/json".parse().expect("static header"));
        headers.insert(
            "content-type",
            "application/json".parse().expect("static header"),
        );
        headers
    }

    /// Send one chat turn to the provider the model routes to. The response
    /// body is the provider's newline-delimited JSON stream.
    pub async fn send_chat_request(
        &self,
        route: Route,
        request: &ChatRequest,
    ) -> Result<Response, UpstreamError> {
        let url = route.endpoint_url(&self.config);
        info!(
            "sending chat request: model={} provider={:?} messages={}",
            request.model,
            route.provider,
            request.messages.len()
        );

        let mut builder = self.client.post(&url);
        let api_key = route.api_key(&self.config);
        if !api_key.is_empty() {
            builder = builder.header("Authorization", format!("Bearer {api_key}"));
        }

        let has_binary_attachments = request.attachments.iter().any(|a| a.data.is_some());
        let builder = if route.multipart && has_binary_attachments {
            debug!(
                "encoding {} attachments as multipart",
                request.attachments.len()
            );
            builder.multipart(build_multipart_form(request)?)
        } else {
            builder.json(request)
        };

        builder.send().await.map_err(|e| {
            error!("Failed to send chat request: {e}");
            UpstreamError::Network(e.to_string())
        })
    }

    /// Full turn: route, send, validate the status, then aggregate the stream
    /// into the assistant message identified by `message_id`, forwarding
    /// incremental events to `tx`.
    pub async fn stream_chat(
        &self,
        message_id: &str,
        request: &ChatRequest,
        tx: &Sender<StreamEvent>,
        cancel: &CancellationToken,
    ) -> Result<Message, UpstreamError> {
        let route = route(&request.model);
        let response = self.send_chat_request(route, request).await?;
        let response = check_response(response).await?;

        let mut aggregator = StreamAggregator::new(message_id);
        aggregate(response, &mut aggregator, tx, cancel).await
    }
}

/// Multipart encoding for binary attachments: a `payload` part carrying the
/// JSON request (attachment bytes stripped) plus one part per attachment.
fn build_multipart_form(request: &ChatRequest) -> Result<multipart::Form, UpstreamError> {
    let mut payload = request.clone();
    for attachment in &mut payload.attachments {
        attachment.data = None;
    }
    let payload_json = serde_json::to_string(&payload)
        .map_err(|e| UpstreamError::Network(format!("failed to encode payload: {e}")))?;

    let mut form = multipart::Form::new().text("payload", payload_json);
    for attachment in &request.attachments {
        let Some(data) = &attachment.data else {
            continue;
        };
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data)
            .map_err(|e| {
                UpstreamError::Network(format!(
                    "invalid base64 in attachment {}: {e}",
                    attachment.id
                ))
            })?;
        let part = multipart::Part::bytes(bytes)
            .file_name(attachment.name.clone())
            .mime_str(&attachment.mime_type)
            .map_err(|e| UpstreamError::Network(format!("invalid attachment mime type: {e}")))?;
        form = form.part(format!("file:{}", attachment.id), part);
    }
    Ok(form)
}
