use chrono::{DateTime, Utc};
use proptest::prelude::*;

use hatchet_dispatcher::{ActionEvent, ActionEventType};

/// Strategy for generating opaque identifiers (uuids, slugs, empty strings)
pub fn id_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}",
        "[a-z][a-z0-9_-]{0,31}(:[a-z][a-z0-9_-]{0,31})?",
    ]
}

pub fn event_type_strategy() -> impl Strategy<Value = ActionEventType> {
    prop_oneof![
        Just(ActionEventType::Started),
        Just(ActionEventType::Completed),
        Just(ActionEventType::Failed),
    ]
}

/// Strategy for timestamps between 2000 and 2100 with nanosecond precision
pub fn timestamp_strategy() -> impl Strategy<Value = DateTime<Utc>> {
    (946_684_800i64..4_102_444_800i64, 0u32..1_000_000_000u32)
        .prop_map(|(secs, nanos)| DateTime::from_timestamp(secs, nanos).unwrap_or_default())
}

/// Strategy for serialized outputs and error details
pub fn payload_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just(r#"{"sent":true}"#.to_string()),
        "\\PC{0,128}",
    ]
}

pub fn action_event_strategy() -> impl Strategy<Value = ActionEvent> {
    (
        (id_strategy(), id_strategy(), id_strategy()),
        (id_strategy(), id_strategy(), id_strategy(), id_strategy()),
        event_type_strategy(),
        timestamp_strategy(),
        payload_strategy(),
    )
        .prop_map(
            |(
                (worker_id, tenant_id, action_id),
                (job_id, job_run_id, step_id, step_run_id),
                event_type,
                event_timestamp,
                event_payload,
            )| ActionEvent {
                worker_id,
                tenant_id,
                action_id,
                job_id,
                job_run_id,
                step_id,
                step_run_id,
                event_type,
                event_timestamp,
                event_payload,
            },
        )
}
