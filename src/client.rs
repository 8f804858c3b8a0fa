//! # Dispatcher Client
//!
//! Top-level façade a worker runtime talks to: registers the worker, opens the
//! initial action subscription, hands both to an [`ActionListener`], and
//! passes step action events straight through to the dispatcher.
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use hatchet_dispatcher::{ActionEvent, ClientConfig, DispatcherClient, ListenerOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::load(None, Default::default())?;
//! let client = DispatcherClient::connect(config).await?;
//!
//! let mut listener = client
//!     .get_action_listener(
//!         ListenerOptions::new("email-worker").with_actions(["default:send-email"]),
//!     )
//!     .await?;
//!
//! let mut actions = listener.actions();
//! while let Some(action) = actions.next().await {
//!     let action = action?;
//!     client.send_action_event(ActionEvent::started(&action)).await?;
//! }
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::{DispatcherError, DispatcherResult};
use crate::listener::{subscribe, ActionListener};
use crate::transport::{DispatcherTransport, GrpcDispatcherTransport};
use crate::types::{ActionEvent, ListenerOptions, WorkerRegisterRequest};

/// Composes registration, subscription and event reporting over one transport
#[derive(Clone)]
pub struct DispatcherClient {
    config: Arc<ClientConfig>,
    transport: Arc<dyn DispatcherTransport>,
}

impl fmt::Debug for DispatcherClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherClient")
            .field("tenant_id", &self.config.tenant_id)
            .field("host_port", &self.config.host_port)
            .finish()
    }
}

impl DispatcherClient {
    pub fn new(config: Arc<ClientConfig>, transport: Arc<dyn DispatcherTransport>) -> Self {
        Self { config, transport }
    }

    /// Validate `config` and connect to the dispatcher over gRPC
    pub async fn connect(config: ClientConfig) -> DispatcherResult<Self> {
        config.validate()?;
        let transport = GrpcDispatcherTransport::connect(&config).await?;
        Ok(Self::new(Arc::new(config), Arc::new(transport)))
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Register the worker and open its action subscription.
    ///
    /// Registration and initial subscription failures are returned as-is;
    /// retrying setup is up to the caller.
    pub async fn get_action_listener(
        &self,
        options: ListenerOptions,
    ) -> DispatcherResult<ActionListener> {
        let request = WorkerRegisterRequest {
            tenant_id: self.config.tenant_id.clone(),
            worker_name: options.worker_name,
            services: options.services,
            actions: options.actions,
        };

        debug!(
            worker_name = %request.worker_name,
            services = ?request.services,
            actions = ?request.actions,
            "Registering worker with dispatcher"
        );

        let registration = self
            .transport
            .register(request)
            .await
            .map_err(DispatcherError::Registration)?;

        info!(
            worker_id = %registration.worker_id,
            worker_name = %registration.worker_name,
            "Worker registered"
        );

        let stream = subscribe(
            self.transport.as_ref(),
            &self.config.tenant_id,
            &registration.worker_id,
        )
        .await
        .map_err(DispatcherError::Subscribe)?;

        Ok(ActionListener::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.config),
            registration,
            stream,
        ))
    }

    /// Report a step action event. Failures are returned, never retried here.
    pub async fn send_action_event(&self, event: ActionEvent) -> DispatcherResult<()> {
        let action_id = event.action_id.clone();

        debug!(
            worker_id = %event.worker_id,
            action_id = %event.action_id,
            step_run_id = %event.step_run_id,
            event_type = %event.event_type,
            "Sending step action event"
        );

        self.transport
            .send_step_action_event(event)
            .await
            .map_err(|e| DispatcherError::ActionEvent {
                action_id,
                message: e.message,
            })
    }
}
