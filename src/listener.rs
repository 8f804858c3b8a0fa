//! # Action Listener
//!
//! Wraps one live action subscription for a registered worker and exposes the
//! assigned actions as a lazy stream that heals itself across transient
//! disconnects.
//!
//! ## State machine
//!
//! ```text
//! Streaming ──error──▶ Classifying ──cancelled / other / closed──▶ Terminated
//!     ▲                     │
//!     │                 unavailable
//!     │                     ▼
//!     └──success── Resubscribing ◀──delay── Retrying ──budget spent──▶ Terminated
//! ```
//!
//! The retry budget is scoped to a single resubscribe invocation: every time a
//! resubscribe succeeds the counter starts from zero again.
//!
//! A listener has exactly one consumer. [`ActionListener::actions`] borrows the
//! listener mutably, so the stream handle can only be swapped by the
//! consumption loop itself.

use futures::stream::{self, BoxStream};
use futures::StreamExt;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{DispatcherError, DispatcherResult};
use crate::logging::log_listener_transition;
use crate::transport::{
    ActionStream, DispatcherTransport, TransportError, TransportErrorKind,
};
use crate::types::{
    AssignedAction, WorkerListenRequest, WorkerRegistration, WorkerUnsubscribeRequest,
};

/// Named states of the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerState {
    /// Iterating the current stream handle
    Streaming,
    /// Deciding what a stream error means
    Classifying,
    /// Waiting out the fixed delay before the next attempt
    Retrying,
    /// Opening a fresh subscription
    Resubscribing,
    /// No further actions will be yielded
    Terminated,
}

impl fmt::Display for ListenerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ListenerState::Streaming => write!(f, "streaming"),
            ListenerState::Classifying => write!(f, "classifying"),
            ListenerState::Retrying => write!(f, "retrying"),
            ListenerState::Resubscribing => write!(f, "resubscribing"),
            ListenerState::Terminated => write!(f, "terminated"),
        }
    }
}

/// Runtime statistics for an action listener
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListenerStats {
    /// Actions yielded to the consumer
    pub actions_received: u64,
    /// Subscription attempts made while resubscribing (successful or not)
    pub resubscribe_attempts: u64,
    /// Resubscribes that produced a new stream handle
    pub resubscribes: u64,
}

/// Open a subscription for `worker_id`. Returns as soon as the call is open.
pub(crate) async fn subscribe(
    transport: &dyn DispatcherTransport,
    tenant_id: &str,
    worker_id: &str,
) -> Result<ActionStream, TransportError> {
    transport
        .listen(WorkerListenRequest {
            tenant_id: tenant_id.to_string(),
            worker_id: worker_id.to_string(),
        })
        .await
}

/// Cloneable handle that unregisters a worker from outside the consumption loop.
///
/// Unregistering makes the dispatcher cancel the listen call, which ends the
/// listener's action stream cleanly.
#[derive(Clone)]
pub struct UnregisterHandle {
    transport: Arc<dyn DispatcherTransport>,
    tenant_id: String,
    worker_id: String,
}

impl fmt::Debug for UnregisterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnregisterHandle")
            .field("tenant_id", &self.tenant_id)
            .field("worker_id", &self.worker_id)
            .finish()
    }
}

impl UnregisterHandle {
    pub async fn unregister(&self) -> DispatcherResult<()> {
        info!(worker_id = %self.worker_id, "Unregistering worker from dispatcher");

        self.transport
            .unsubscribe(WorkerUnsubscribeRequest {
                tenant_id: self.tenant_id.clone(),
                worker_id: self.worker_id.clone(),
            })
            .await
            .map_err(|e| DispatcherError::Unregister {
                worker_id: self.worker_id.clone(),
                message: e.message,
            })
    }
}

/// Session object wrapping exactly one live subscription at a time
pub struct ActionListener {
    /// Listener identifier, for log correlation only
    listener_id: Uuid,
    transport: Arc<dyn DispatcherTransport>,
    config: Arc<ClientConfig>,
    registration: WorkerRegistration,
    /// Current stream handle, replaced wholesale on resubscribe
    stream: ActionStream,
    state: ListenerState,
    stats: ListenerStats,
}

impl fmt::Debug for ActionListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionListener")
            .field("listener_id", &self.listener_id)
            .field("worker_id", &self.registration.worker_id)
            .field("state", &self.state)
            .field("stats", &self.stats)
            .finish()
    }
}

impl ActionListener {
    pub(crate) fn new(
        transport: Arc<dyn DispatcherTransport>,
        config: Arc<ClientConfig>,
        registration: WorkerRegistration,
        stream: ActionStream,
    ) -> Self {
        let listener_id = Uuid::new_v4();

        info!(
            listener_id = %listener_id,
            worker_id = %registration.worker_id,
            worker_name = %registration.worker_name,
            max_retries = config.listener.max_retries,
            retry_interval_ms = config.listener.retry_interval_ms,
            "Created ActionListener"
        );

        Self {
            listener_id,
            transport,
            config,
            registration,
            stream,
            state: ListenerState::Streaming,
            stats: ListenerStats::default(),
        }
    }

    #[must_use]
    pub fn listener_id(&self) -> Uuid {
        self.listener_id
    }

    #[must_use]
    pub fn worker_id(&self) -> &str {
        &self.registration.worker_id
    }

    #[must_use]
    pub fn registration(&self) -> &WorkerRegistration {
        &self.registration
    }

    #[must_use]
    pub fn state(&self) -> ListenerState {
        self.state
    }

    #[must_use]
    pub fn stats(&self) -> &ListenerStats {
        &self.stats
    }

    /// Lazy stream of assigned actions.
    ///
    /// Yields actions in server delivery order until the listener terminates:
    /// - cancellation or a server-side close ends the stream with no error
    /// - transient unavailability is healed by resubscribing; the consumer
    ///   never sees it unless the retry budget is spent, in which case one
    ///   `ResubscribeExhausted` error is yielded and the stream ends
    /// - any other stream error is yielded once as `StreamFailed` and ends
    ///   the stream without a resubscribe
    ///
    /// Once terminated, the listener cannot be restarted; calling `actions`
    /// again returns an empty stream.
    pub fn actions(&mut self) -> BoxStream<'_, DispatcherResult<AssignedAction>> {
        stream::unfold(self, |listener| async move {
            let item = listener.next_action().await?;
            Some((item, listener))
        })
        .boxed()
    }

    /// Unregister this worker from the dispatcher
    pub async fn unregister(&self) -> DispatcherResult<()> {
        self.unregister_handle().unregister().await
    }

    /// Handle for unregistering while `actions()` is being consumed
    #[must_use]
    pub fn unregister_handle(&self) -> UnregisterHandle {
        UnregisterHandle {
            transport: Arc::clone(&self.transport),
            tenant_id: self.config.tenant_id.clone(),
            worker_id: self.registration.worker_id.clone(),
        }
    }

    async fn next_action(&mut self) -> Option<DispatcherResult<AssignedAction>> {
        loop {
            if self.state == ListenerState::Terminated {
                return None;
            }

            match self.stream.next().await {
                Some(Ok(action)) => {
                    self.stats.actions_received += 1;
                    debug!(
                        listener_id = %self.listener_id,
                        worker_id = %self.registration.worker_id,
                        action_id = %action.action_id,
                        action_type = %action.action_type,
                        step_run_id = %action.step_run_id,
                        "Received assigned action"
                    );
                    return Some(Ok(action));
                }
                Some(Err(error)) => {
                    self.transition(ListenerState::Classifying, Some(&error.message));

                    match error.kind {
                        TransportErrorKind::Cancelled => {
                            self.terminate("subscription cancelled");
                            return None;
                        }
                        TransportErrorKind::Unavailable => {
                            warn!(
                                listener_id = %self.listener_id,
                                worker_id = %self.registration.worker_id,
                                error = %error,
                                "Action stream unavailable, resubscribing"
                            );

                            if let Err(e) = self.retry_subscribe().await {
                                error!(
                                    listener_id = %self.listener_id,
                                    worker_id = %self.registration.worker_id,
                                    error = %e,
                                    "Giving up on action stream"
                                );
                                self.terminate("resubscribe budget exhausted");
                                return Some(Err(e));
                            }
                        }
                        TransportErrorKind::Other => {
                            error!(
                                listener_id = %self.listener_id,
                                worker_id = %self.registration.worker_id,
                                error = %error,
                                "Unexpected action stream error"
                            );
                            self.terminate("unclassified stream error");
                            return Some(Err(DispatcherError::StreamFailed(error)));
                        }
                    }
                }
                None => {
                    self.terminate("stream closed by dispatcher");
                    return None;
                }
            }
        }
    }

    /// Open a fresh subscription, waiting the fixed retry interval before each
    /// attempt. The new handle replaces the old one before streaming resumes.
    async fn retry_subscribe(&mut self) -> DispatcherResult<()> {
        let max_retries = self.config.listener.max_retries;
        let retry_interval = self.config.listener.retry_interval();
        let mut retries: u32 = 0;

        while retries < max_retries {
            self.transition(ListenerState::Retrying, None);
            tokio::time::sleep(retry_interval).await;

            self.transition(ListenerState::Resubscribing, None);
            self.stats.resubscribe_attempts += 1;

            match subscribe(
                self.transport.as_ref(),
                &self.config.tenant_id,
                &self.registration.worker_id,
            )
            .await
            {
                Ok(stream) => {
                    self.stream = stream;
                    self.stats.resubscribes += 1;
                    info!(
                        listener_id = %self.listener_id,
                        worker_id = %self.registration.worker_id,
                        attempt = retries + 1,
                        "Resubscribed to action stream"
                    );
                    self.transition(ListenerState::Streaming, None);
                    return Ok(());
                }
                Err(e) => {
                    retries += 1;
                    warn!(
                        listener_id = %self.listener_id,
                        worker_id = %self.registration.worker_id,
                        attempt = retries,
                        max_retries = max_retries,
                        error = %e,
                        "Resubscribe attempt failed"
                    );
                }
            }
        }

        Err(DispatcherError::ResubscribeExhausted {
            worker_id: self.registration.worker_id.clone(),
            retries: max_retries,
        })
    }

    fn terminate(&mut self, reason: &str) {
        // Drop the dead handle so the underlying call is released
        self.stream = stream::empty().boxed();
        self.transition(ListenerState::Terminated, Some(reason));
    }

    fn transition(&mut self, to: ListenerState, reason: Option<&str>) {
        if self.state == to {
            return;
        }
        log_listener_transition(
            &self.listener_id,
            &self.registration.worker_id,
            &self.state.to_string(),
            &to.to_string(),
            reason,
        );
        self.state = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_action, MockDispatcherTransport, Subscription};
    use std::time::Duration;

    fn listener_with(transport: Arc<MockDispatcherTransport>, initial: ActionStream) -> ActionListener {
        let mut config = ClientConfig::for_tenant("tenant-1");
        config.listener.retry_interval_ms = 10;
        ActionListener::new(
            transport,
            Arc::new(config),
            WorkerRegistration {
                worker_id: "W1".to_string(),
                tenant_id: "tenant-1".to_string(),
                worker_name: "worker".to_string(),
            },
            initial,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_after_cancellation() {
        let transport = Arc::new(MockDispatcherTransport::new());
        let initial = Subscription::actions_then_error(
            vec![sample_action("W1", "a1")],
            TransportError::cancelled("bye"),
        )
        .into_stream();
        let mut listener = listener_with(transport, initial);

        let collected: Vec<_> = listener.actions().collect().await;
        assert_eq!(collected.len(), 1);
        assert_eq!(listener.state(), ListenerState::Terminated);
        assert_eq!(listener.stats().actions_received, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminated_listener_is_not_restartable() {
        let transport = Arc::new(MockDispatcherTransport::new());
        transport.push_subscription(Subscription::actions(vec![sample_action("W1", "a2")]));
        let initial = Subscription::error(TransportError::other("boom")).into_stream();
        let mut listener = listener_with(transport.clone(), initial);

        let first: Vec<_> = listener.actions().collect().await;
        assert_eq!(first.len(), 1);
        assert!(matches!(first[0], Err(DispatcherError::StreamFailed(_))));

        let second: Vec<_> = listener.actions().collect().await;
        assert!(second.is_empty());
        assert_eq!(transport.listen_requests().len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_counter_resets_after_successful_resubscribe() {
        let transport = Arc::new(MockDispatcherTransport::new());
        // Budget of 5: four failures, success, then four more failures, success.
        for _ in 0..4 {
            transport.push_subscription(Subscription::refused(TransportError::unavailable("down")));
        }
        transport.push_subscription(Subscription::error(TransportError::unavailable("flap")));
        for _ in 0..4 {
            transport.push_subscription(Subscription::refused(TransportError::unavailable("down")));
        }
        transport.push_subscription(Subscription::actions_then_error(
            vec![sample_action("W1", "a1")],
            TransportError::cancelled("done"),
        ));

        let initial = Subscription::error(TransportError::unavailable("lost")).into_stream();
        let mut listener = listener_with(transport.clone(), initial);

        let collected: Vec<_> = listener.actions().collect().await;
        assert_eq!(collected.len(), 1);
        assert!(collected[0].is_ok());
        assert_eq!(listener.stats().resubscribe_attempts, 10);
        assert_eq!(listener.stats().resubscribes, 2);
        assert_eq!(listener.state(), ListenerState::Terminated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_close_ends_stream_cleanly() {
        let transport = Arc::new(MockDispatcherTransport::new());
        let initial = Subscription::actions(vec![sample_action("W1", "a1")]).into_stream();
        let mut listener = listener_with(transport.clone(), initial);

        let started = tokio::time::Instant::now();
        let collected: Vec<_> = listener.actions().collect().await;
        assert_eq!(collected.len(), 1);
        assert!(started.elapsed() < Duration::from_millis(10));
        assert!(transport.listen_requests().is_empty());
    }

    #[tokio::test]
    async fn test_unregister_uses_worker_and_tenant() {
        let transport = Arc::new(MockDispatcherTransport::new());
        let listener = listener_with(transport.clone(), stream::empty().boxed());

        listener.unregister().await.unwrap();

        let requests = transport.unsubscribe_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].worker_id, "W1");
        assert_eq!(requests[0].tenant_id, "tenant-1");
    }
}
