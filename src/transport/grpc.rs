//! gRPC implementation of [`DispatcherTransport`].
//!
//! Builds a single tonic `Channel` from [`ClientConfig`] (TLS material,
//! keepalives, connect timeout) and issues every dispatcher call over it.

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::path::Path;
use std::time::Duration;
use tonic::{
    metadata::MetadataValue,
    service::{interceptor::InterceptedService, Interceptor},
    transport::{Certificate, Channel, ClientTlsConfig, Endpoint, Identity},
    Request, Response, Status, Streaming,
};
use tracing::{debug, info};

use super::{conversions, ActionStream, DispatcherTransport, TransportError};
use crate::config::{ClientConfig, TlsStrategy};
use crate::error::{DispatcherError, DispatcherResult};
use crate::proto::{dispatcher as proto, DispatcherClient};
use crate::types::{
    ActionEvent, WorkerListenRequest, WorkerRegisterRequest, WorkerRegistration,
    WorkerUnsubscribeRequest,
};

const TCP_KEEPALIVE: Duration = Duration::from_secs(30);
const HTTP2_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(30);
const HTTP2_KEEPALIVE_TIMEOUT: Duration = Duration::from_secs(10);

/// gRPC interceptor adding the bearer token to every outgoing request.
#[derive(Debug, Clone)]
pub struct AuthInterceptor {
    token: Option<String>,
}

impl AuthInterceptor {
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }
}

impl Interceptor for AuthInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        if let Some(ref token) = self.token {
            let value = format!("Bearer {}", token)
                .parse::<MetadataValue<_>>()
                .map_err(|e| Status::internal(format!("Invalid bearer token: {}", e)))?;
            request.metadata_mut().insert("authorization", value);
        }

        Ok(request)
    }
}

type DispatcherGrpcClient = DispatcherClient<InterceptedService<Channel, AuthInterceptor>>;
type ListenResponse = Response<Streaming<proto::AssignedAction>>;

/// Dispatcher transport over a tonic channel
#[derive(Debug, Clone)]
pub struct GrpcDispatcherTransport {
    client: DispatcherGrpcClient,
    endpoint: String,
    request_timeout: Duration,
    listen_open_grace: Duration,
}

impl GrpcDispatcherTransport {
    /// Connect to the dispatcher described by `config`.
    pub async fn connect(config: &ClientConfig) -> DispatcherResult<Self> {
        let endpoint_uri = config.endpoint_uri();
        let mut endpoint = Endpoint::from_shared(endpoint_uri.clone()).map_err(|e| {
            DispatcherError::config_error(format!(
                "Invalid dispatcher endpoint '{}': {}",
                endpoint_uri, e
            ))
        })?;

        // No channel-wide request timeout: it would also cut the long-lived
        // listen stream. Unary calls set their own deadline instead.
        endpoint = endpoint
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .tcp_keepalive(Some(TCP_KEEPALIVE))
            .http2_keep_alive_interval(HTTP2_KEEPALIVE_INTERVAL)
            .keep_alive_timeout(HTTP2_KEEPALIVE_TIMEOUT)
            .keep_alive_while_idle(true);

        if let Some(tls) = build_tls_config(config).await? {
            endpoint = endpoint.tls_config(tls).map_err(|e| {
                DispatcherError::config_error(format!("Invalid TLS configuration: {}", e))
            })?;
        }

        debug!(endpoint = %endpoint_uri, tls = %config.tls.strategy, "Connecting to dispatcher");

        let channel = endpoint
            .connect()
            .await
            .map_err(|e| DispatcherError::Connect {
                endpoint: endpoint_uri.clone(),
                reason: e.to_string(),
            })?;

        info!(endpoint = %endpoint_uri, "Connected to dispatcher gRPC endpoint");

        Ok(Self {
            client: DispatcherClient::with_interceptor(
                channel,
                AuthInterceptor::new(config.token.clone()),
            ),
            endpoint: endpoint_uri,
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            listen_open_grace: config.listener.open_grace(),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn unary_request<T>(&self, message: T) -> Request<T> {
        let mut request = Request::new(message);
        request.set_timeout(self.request_timeout);
        request
    }
}

async fn build_tls_config(config: &ClientConfig) -> DispatcherResult<Option<ClientTlsConfig>> {
    let tls = &config.tls;
    if tls.strategy == TlsStrategy::None {
        return Ok(None);
    }

    let mut tls_config = ClientTlsConfig::new();

    tls_config = match tls.ca_file {
        Some(ref ca_file) => {
            tls_config.ca_certificate(Certificate::from_pem(read_pem(ca_file).await?))
        }
        None => tls_config.with_native_roots(),
    };

    if tls.strategy == TlsStrategy::Mtls {
        let (cert_file, key_file) = match (&tls.cert_file, &tls.key_file) {
            (Some(cert), Some(key)) => (cert, key),
            _ => {
                return Err(DispatcherError::config_error(
                    "mtls requires both tls.cert_file and tls.key_file",
                ))
            }
        };
        let identity = Identity::from_pem(read_pem(cert_file).await?, read_pem(key_file).await?);
        tls_config = tls_config.identity(identity);
    }

    if let Some(ref server_name) = tls.server_name {
        tls_config = tls_config.domain_name(server_name.clone());
    }

    Ok(Some(tls_config))
}

fn action_stream(stream: Streaming<proto::AssignedAction>) -> ActionStream {
    stream
        .map(|item| match item {
            Ok(action) => conversions::proto_assigned_action_to_domain(action)
                .map_err(|e| TransportError::other(e.to_string())),
            Err(status) => Err(TransportError::from(status)),
        })
        .boxed()
}

async fn read_pem(path: &Path) -> DispatcherResult<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|e| {
        DispatcherError::config_error(format!(
            "Failed to read TLS file '{}': {}",
            path.display(),
            e
        ))
    })
}

#[async_trait]
impl DispatcherTransport for GrpcDispatcherTransport {
    async fn register(
        &self,
        request: WorkerRegisterRequest,
    ) -> Result<WorkerRegistration, TransportError> {
        let response = self
            .client
            .clone()
            .register(self.unary_request(conversions::domain_register_request_to_proto(request)))
            .await?
            .into_inner();

        conversions::proto_register_response_to_domain(response)
            .map_err(|e| TransportError::other(e.to_string()))
    }

    async fn listen(&self, request: WorkerListenRequest) -> Result<ActionStream, TransportError> {
        let mut client = self.client.clone();
        let message = conversions::domain_listen_request_to_proto(request);
        let mut open: BoxFuture<'static, Result<ListenResponse, Status>> =
            async move { client.listen(message).await }.boxed();

        match tokio::time::timeout(self.listen_open_grace, &mut open).await {
            Ok(response) => Ok(action_stream(response?.into_inner())),
            Err(_) => {
                // Some servers hold the response headers until the first
                // action; the call is live, so hand the handle back now.
                debug!(
                    endpoint = %self.endpoint,
                    grace_ms = self.listen_open_grace.as_millis() as u64,
                    "Listen headers pending, returning handle"
                );
                Ok(stream::once(async move {
                    open.await
                        .map(|response| action_stream(response.into_inner()))
                        .map_err(TransportError::from)
                })
                .try_flatten()
                .boxed())
            }
        }
    }

    async fn unsubscribe(&self, request: WorkerUnsubscribeRequest) -> Result<(), TransportError> {
        self.client
            .clone()
            .unsubscribe(
                self.unary_request(conversions::domain_unsubscribe_request_to_proto(request)),
            )
            .await?;
        Ok(())
    }

    async fn send_step_action_event(&self, event: ActionEvent) -> Result<(), TransportError> {
        self.client
            .clone()
            .send_step_action_event(
                self.unary_request(conversions::domain_action_event_to_proto(event)),
            )
            .await?;
        Ok(())
    }
}
