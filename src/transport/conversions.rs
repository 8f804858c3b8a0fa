//! Type conversions between Protocol Buffer types and domain types.
//!
//! The listener and the dispatcher client only see the types in
//! [`crate::types`]. We use helper functions rather than `From` impls so that
//! fallible conversions can report which field was malformed.

use chrono::{DateTime, Utc};

use crate::error::DispatcherError;
use crate::proto::dispatcher as proto;
use crate::types::{
    ActionEvent, ActionEventType, ActionType, AssignedAction, WorkerListenRequest,
    WorkerRegisterRequest, WorkerRegistration, WorkerUnsubscribeRequest,
};

// ============================================================================
// Timestamp Conversions
// ============================================================================

pub fn datetime_to_proto_timestamp(dt: DateTime<Utc>) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: dt.timestamp(),
        nanos: dt.timestamp_subsec_nanos() as i32,
    }
}

/// Convert an optional protobuf Timestamp to DateTime<Utc>.
pub fn proto_timestamp_to_datetime(ts: Option<prost_types::Timestamp>) -> DateTime<Utc> {
    ts.and_then(|t| DateTime::from_timestamp(t.seconds, t.nanos as u32))
        .unwrap_or_default()
}

// ============================================================================
// Enum Conversions
// ============================================================================

pub fn proto_action_type_to_domain(value: i32) -> Result<ActionType, DispatcherError> {
    match proto::ActionType::try_from(value) {
        Ok(proto::ActionType::StartStepRun) => Ok(ActionType::StartStepRun),
        Ok(proto::ActionType::CancelStepRun) => Ok(ActionType::CancelStepRun),
        Err(_) => Err(DispatcherError::invalid_message(
            "action_type",
            format!("unknown action type {value}"),
        )),
    }
}

pub fn domain_event_type_to_proto(event_type: ActionEventType) -> proto::StepActionEventType {
    match event_type {
        ActionEventType::Started => proto::StepActionEventType::StepEventTypeStarted,
        ActionEventType::Completed => proto::StepActionEventType::StepEventTypeCompleted,
        ActionEventType::Failed => proto::StepActionEventType::StepEventTypeFailed,
    }
}

/// `UNKNOWN` is rejected: it only exists as the proto3 zero value.
pub fn proto_event_type_to_domain(value: i32) -> Result<ActionEventType, DispatcherError> {
    match proto::StepActionEventType::try_from(value) {
        Ok(proto::StepActionEventType::StepEventTypeStarted) => Ok(ActionEventType::Started),
        Ok(proto::StepActionEventType::StepEventTypeCompleted) => Ok(ActionEventType::Completed),
        Ok(proto::StepActionEventType::StepEventTypeFailed) => Ok(ActionEventType::Failed),
        Ok(proto::StepActionEventType::StepEventTypeUnknown) | Err(_) => Err(
            DispatcherError::invalid_message("event_type", format!("unsupported event type {value}")),
        ),
    }
}

// ============================================================================
// Registration / Subscription
// ============================================================================

pub fn domain_register_request_to_proto(
    request: WorkerRegisterRequest,
) -> proto::WorkerRegisterRequest {
    proto::WorkerRegisterRequest {
        tenant_id: request.tenant_id,
        worker_name: request.worker_name,
        actions: request.actions,
        services: request.services,
    }
}

pub fn proto_register_response_to_domain(
    response: proto::WorkerRegisterResponse,
) -> Result<WorkerRegistration, DispatcherError> {
    if response.worker_id.is_empty() {
        return Err(DispatcherError::invalid_message(
            "worker_id",
            "registration response did not assign a worker id",
        ));
    }

    Ok(WorkerRegistration {
        worker_id: response.worker_id,
        tenant_id: response.tenant_id,
        worker_name: response.worker_name,
    })
}

pub fn domain_listen_request_to_proto(request: WorkerListenRequest) -> proto::WorkerListenRequest {
    proto::WorkerListenRequest {
        tenant_id: request.tenant_id,
        worker_id: request.worker_id,
    }
}

pub fn domain_unsubscribe_request_to_proto(
    request: WorkerUnsubscribeRequest,
) -> proto::WorkerUnsubscribeRequest {
    proto::WorkerUnsubscribeRequest {
        tenant_id: request.tenant_id,
        worker_id: request.worker_id,
    }
}

pub fn proto_assigned_action_to_domain(
    action: proto::AssignedAction,
) -> Result<AssignedAction, DispatcherError> {
    let action_type = proto_action_type_to_domain(action.action_type)?;

    if action.action_id.is_empty() {
        return Err(DispatcherError::invalid_message(
            "action_id",
            "assigned action is missing its action id",
        ));
    }

    Ok(AssignedAction {
        tenant_id: action.tenant_id,
        worker_id: action.worker_id,
        job_id: action.job_id,
        job_name: action.job_name,
        job_run_id: action.job_run_id,
        step_id: action.step_id,
        step_run_id: action.step_run_id,
        action_id: action.action_id,
        action_type,
        action_payload: action.action_payload,
    })
}

// ============================================================================
// Step Action Events
// ============================================================================

pub fn domain_action_event_to_proto(event: ActionEvent) -> proto::StepActionEvent {
    proto::StepActionEvent {
        tenant_id: event.tenant_id,
        worker_id: event.worker_id,
        job_id: event.job_id,
        job_run_id: event.job_run_id,
        step_id: event.step_id,
        step_run_id: event.step_run_id,
        action_id: event.action_id,
        event_timestamp: Some(datetime_to_proto_timestamp(event.event_timestamp)),
        event_type: domain_event_type_to_proto(event.event_type) as i32,
        event_payload: event.event_payload,
    }
}

pub fn proto_action_event_to_domain(
    event: proto::StepActionEvent,
) -> Result<ActionEvent, DispatcherError> {
    Ok(ActionEvent {
        worker_id: event.worker_id,
        tenant_id: event.tenant_id,
        action_id: event.action_id,
        job_id: event.job_id,
        job_run_id: event.job_run_id,
        step_id: event.step_id,
        step_run_id: event.step_run_id,
        event_type: proto_event_type_to_domain(event.event_type)?,
        event_timestamp: proto_timestamp_to_datetime(event.event_timestamp),
        event_payload: event.event_payload,
    })
}
