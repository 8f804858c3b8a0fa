//! # Testing Utilities
//!
//! Scripted in-memory [`DispatcherTransport`] for exercising the dispatcher
//! client and the action listener without a dispatcher server.
//!
//! Every call is recorded so tests can assert on exactly what would have gone
//! over the wire. `listen` calls consume [`Subscription`] scripts in order;
//! when the queue is empty the call is refused as unavailable.

use async_trait::async_trait;
use futures::stream;
use futures::StreamExt;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Notify;

use crate::transport::{ActionStream, DispatcherTransport, TransportError};
use crate::types::{
    ActionEvent, ActionType, AssignedAction, WorkerListenRequest, WorkerRegisterRequest,
    WorkerRegistration, WorkerUnsubscribeRequest,
};

/// Build a start-step action assigned to `worker_id`
pub fn sample_action(worker_id: &str, action_id: &str) -> AssignedAction {
    AssignedAction {
        tenant_id: "tenant-1".to_string(),
        worker_id: worker_id.to_string(),
        job_id: format!("job-{action_id}"),
        job_name: "sample-job".to_string(),
        job_run_id: format!("job-run-{action_id}"),
        step_id: format!("step-{action_id}"),
        step_run_id: format!("step-run-{action_id}"),
        action_id: action_id.to_string(),
        action_type: ActionType::StartStepRun,
        action_payload: r#"{"input":true}"#.to_string(),
    }
}

/// Scripted outcome of one `listen` call
#[derive(Debug, Clone)]
pub struct Subscription {
    refused: Option<TransportError>,
    items: Vec<Result<AssignedAction, TransportError>>,
    hold_open: bool,
}

impl Subscription {
    /// Stream the actions, then close normally
    pub fn actions(actions: Vec<AssignedAction>) -> Self {
        Self {
            refused: None,
            items: actions.into_iter().map(Ok).collect(),
            hold_open: false,
        }
    }

    /// Stream the actions, then fail with `error`
    pub fn actions_then_error(actions: Vec<AssignedAction>, error: TransportError) -> Self {
        let mut subscription = Self::actions(actions);
        subscription.items.push(Err(error));
        subscription
    }

    /// Open successfully, then fail immediately with `error`
    pub fn error(error: TransportError) -> Self {
        Self::actions_then_error(Vec::new(), error)
    }

    /// Stream the actions, then stay open until the worker unsubscribes
    pub fn actions_then_hold(actions: Vec<AssignedAction>) -> Self {
        let mut subscription = Self::actions(actions);
        subscription.hold_open = true;
        subscription
    }

    /// Refuse to open the call at all
    pub fn refused(error: TransportError) -> Self {
        Self {
            refused: Some(error),
            items: Vec::new(),
            hold_open: false,
        }
    }

    /// Turn the script into a live stream. A held-open stream ends with a
    /// `Cancelled` error once `cancel` is notified.
    pub fn into_stream_with_cancel(self, cancel: Arc<Notify>) -> ActionStream {
        let items = stream::iter(self.items);
        if self.hold_open {
            items
                .chain(stream::once(async move {
                    cancel.notified().await;
                    Err(TransportError::cancelled("worker unsubscribed"))
                }))
                .boxed()
        } else {
            items.boxed()
        }
    }

    pub fn into_stream(self) -> ActionStream {
        self.into_stream_with_cancel(Arc::new(Notify::new()))
    }
}

/// In-memory dispatcher transport with recorded calls
#[derive(Debug)]
pub struct MockDispatcherTransport {
    worker_id: String,
    register_error: Mutex<Option<TransportError>>,
    unsubscribe_error: Mutex<Option<TransportError>>,
    event_error: Mutex<Option<TransportError>>,
    subscriptions: Mutex<VecDeque<Subscription>>,
    register_requests: Mutex<Vec<WorkerRegisterRequest>>,
    listen_requests: Mutex<Vec<WorkerListenRequest>>,
    unsubscribe_requests: Mutex<Vec<WorkerUnsubscribeRequest>>,
    events: Mutex<Vec<ActionEvent>>,
    cancel: Arc<Notify>,
}

impl Default for MockDispatcherTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDispatcherTransport {
    /// Transport that registers every worker as "W1"
    pub fn new() -> Self {
        Self::with_worker_id("W1")
    }

    pub fn with_worker_id(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            register_error: Mutex::new(None),
            unsubscribe_error: Mutex::new(None),
            event_error: Mutex::new(None),
            subscriptions: Mutex::new(VecDeque::new()),
            register_requests: Mutex::new(Vec::new()),
            listen_requests: Mutex::new(Vec::new()),
            unsubscribe_requests: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            cancel: Arc::new(Notify::new()),
        }
    }

    pub fn push_subscription(&self, subscription: Subscription) {
        self.subscriptions.lock().push_back(subscription);
    }

    pub fn fail_register(&self, error: TransportError) {
        *self.register_error.lock() = Some(error);
    }

    pub fn fail_unsubscribe(&self, error: TransportError) {
        *self.unsubscribe_error.lock() = Some(error);
    }

    pub fn fail_events(&self, error: TransportError) {
        *self.event_error.lock() = Some(error);
    }

    pub fn register_requests(&self) -> Vec<WorkerRegisterRequest> {
        self.register_requests.lock().clone()
    }

    pub fn listen_requests(&self) -> Vec<WorkerListenRequest> {
        self.listen_requests.lock().clone()
    }

    pub fn unsubscribe_requests(&self) -> Vec<WorkerUnsubscribeRequest> {
        self.unsubscribe_requests.lock().clone()
    }

    pub fn events(&self) -> Vec<ActionEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl DispatcherTransport for MockDispatcherTransport {
    async fn register(
        &self,
        request: WorkerRegisterRequest,
    ) -> Result<WorkerRegistration, TransportError> {
        self.register_requests.lock().push(request.clone());

        if let Some(error) = self.register_error.lock().clone() {
            return Err(error);
        }

        Ok(WorkerRegistration {
            worker_id: self.worker_id.clone(),
            tenant_id: request.tenant_id,
            worker_name: request.worker_name,
        })
    }

    async fn listen(&self, request: WorkerListenRequest) -> Result<ActionStream, TransportError> {
        self.listen_requests.lock().push(request);

        let subscription = self.subscriptions.lock().pop_front();
        match subscription {
            Some(Subscription {
                refused: Some(error),
                ..
            }) => Err(error),
            Some(subscription) => Ok(subscription.into_stream_with_cancel(Arc::clone(&self.cancel))),
            None => Err(TransportError::unavailable("no scripted subscription")),
        }
    }

    async fn unsubscribe(&self, request: WorkerUnsubscribeRequest) -> Result<(), TransportError> {
        self.unsubscribe_requests.lock().push(request);

        if let Some(error) = self.unsubscribe_error.lock().clone() {
            return Err(error);
        }

        self.cancel.notify_one();
        Ok(())
    }

    async fn send_step_action_event(&self, event: ActionEvent) -> Result<(), TransportError> {
        if let Some(error) = self.event_error.lock().clone() {
            return Err(error);
        }

        self.events.lock().push(event);
        Ok(())
    }
}
