//! # Dispatcher Domain Types
//!
//! Transport-independent types exchanged with the dispatcher: worker
//! registration, assigned actions, and the step events reported back while an
//! action executes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DispatcherResult;

/// Options supplied when asking for an action listener
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerOptions {
    /// Human-readable worker name
    pub worker_name: String,
    /// Services (groups) this worker belongs to
    pub services: Vec<String>,
    /// Action identifiers this worker can execute (e.g. "default:send-email")
    pub actions: Vec<String>,
}

impl ListenerOptions {
    pub fn new(worker_name: impl Into<String>) -> Self {
        Self {
            worker_name: worker_name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.services = services.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }
}

/// Registration request sent once per listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRegisterRequest {
    pub tenant_id: String,
    pub worker_name: String,
    pub services: Vec<String>,
    pub actions: Vec<String>,
}

/// Subscription request keyed by the server-assigned worker id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerListenRequest {
    pub tenant_id: String,
    pub worker_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerUnsubscribeRequest {
    pub tenant_id: String,
    pub worker_id: String,
}

/// Result of a successful registration call.
///
/// The worker id is the correlation key for the subscription and for every
/// event reported while the listener lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRegistration {
    pub worker_id: String,
    pub tenant_id: String,
    pub worker_name: String,
}

/// What the dispatcher is asking the worker to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    StartStepRun,
    CancelStepRun,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionType::StartStepRun => write!(f, "start_step_run"),
            ActionType::CancelStepRun => write!(f, "cancel_step_run"),
        }
    }
}

/// A unit of work pushed by the dispatcher over the action stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedAction {
    pub tenant_id: String,
    pub worker_id: String,
    pub job_id: String,
    pub job_name: String,
    pub job_run_id: String,
    pub step_id: String,
    pub step_run_id: String,
    pub action_id: String,
    pub action_type: ActionType,
    /// Serialized step input, passed through untouched
    pub action_payload: String,
}

impl AssignedAction {
    /// Parse the action payload as JSON
    pub fn payload_json(&self) -> DispatcherResult<serde_json::Value> {
        if self.action_payload.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&self.action_payload)?)
    }
}

/// Lifecycle event kind reported for a step run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionEventType {
    Started,
    Completed,
    Failed,
}

impl fmt::Display for ActionEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionEventType::Started => write!(f, "started"),
            ActionEventType::Completed => write!(f, "completed"),
            ActionEventType::Failed => write!(f, "failed"),
        }
    }
}

/// Outbound report on the execution of an assigned action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEvent {
    pub worker_id: String,
    pub tenant_id: String,
    pub action_id: String,
    pub job_id: String,
    pub job_run_id: String,
    pub step_id: String,
    pub step_run_id: String,
    pub event_type: ActionEventType,
    pub event_timestamp: DateTime<Utc>,
    /// Serialized output or error detail
    pub event_payload: String,
}

impl ActionEvent {
    /// Build an event correlated with `action`, stamped with the current time
    pub fn for_action(
        action: &AssignedAction,
        event_type: ActionEventType,
        event_payload: impl Into<String>,
    ) -> Self {
        Self {
            worker_id: action.worker_id.clone(),
            tenant_id: action.tenant_id.clone(),
            action_id: action.action_id.clone(),
            job_id: action.job_id.clone(),
            job_run_id: action.job_run_id.clone(),
            step_id: action.step_id.clone(),
            step_run_id: action.step_run_id.clone(),
            event_type,
            event_timestamp: Utc::now(),
            event_payload: event_payload.into(),
        }
    }

    pub fn started(action: &AssignedAction) -> Self {
        Self::for_action(action, ActionEventType::Started, "")
    }

    /// Completion event with the step output serialized as JSON
    pub fn completed<T: Serialize>(action: &AssignedAction, output: &T) -> DispatcherResult<Self> {
        let payload = serde_json::to_string(output)?;
        Ok(Self::for_action(action, ActionEventType::Completed, payload))
    }

    pub fn failed(action: &AssignedAction, error: impl fmt::Display) -> Self {
        Self::for_action(action, ActionEventType::Failed, error.to_string())
    }
}
