//! Action listener behaviour across cancellation, transient loss and fatal
//! stream errors, driven through the mock transport with paused time.

mod common;

use common::*;
use futures::StreamExt;
use std::time::Duration;
use tokio::time::Instant;

use hatchet_dispatcher::testing::{sample_action, Subscription};
use hatchet_dispatcher::{DispatcherError, ListenerState, TransportError};

const RETRY_DELAY: Duration = Duration::from_secs(5);

#[tokio::test(start_paused = true)]
async fn test_cancellation_ends_stream_without_error() {
    let (client, transport) = mock_client();
    transport.push_subscription(Subscription::actions_then_error(
        vec![sample_action("W1", "a1"), sample_action("W1", "a2")],
        TransportError::cancelled("call cancelled"),
    ));

    let mut listener = client
        .get_action_listener(email_worker_options())
        .await
        .unwrap();
    let collected: Vec<_> = listener.actions().collect().await;

    let ids: Vec<_> = collected
        .into_iter()
        .map(|item| item.unwrap().action_id)
        .collect();
    assert_eq!(ids, vec!["a1", "a2"]);
    assert_eq!(transport.listen_requests().len(), 1);
    assert_eq!(listener.state(), ListenerState::Terminated);
}

#[tokio::test(start_paused = true)]
async fn test_unavailable_is_healed_transparently() {
    let (client, transport) = mock_client();
    transport.push_subscription(Subscription::actions_then_error(
        vec![sample_action("W1", "a1")],
        TransportError::unavailable("connection reset"),
    ));
    transport.push_subscription(Subscription::actions_then_error(
        vec![sample_action("W1", "a2"), sample_action("W1", "a3")],
        TransportError::cancelled("shutdown"),
    ));

    let mut listener = client
        .get_action_listener(email_worker_options())
        .await
        .unwrap();
    let collected: Vec<_> = listener.actions().collect().await;

    assert_eq!(collected.len(), 3);
    assert!(collected.iter().all(Result::is_ok));
    assert_eq!(listener.stats().resubscribes, 1);

    let listens = transport.listen_requests();
    assert_eq!(listens.len(), 2);
    assert!(listens.iter().all(|r| r.worker_id == "W1" && r.tenant_id == TENANT_ID));
}

#[tokio::test(start_paused = true)]
async fn test_resubscribe_waits_one_retry_delay() {
    let (client, transport) = mock_client();
    // Initial subscription raises unavailable straight away; the next one succeeds.
    transport.push_subscription(Subscription::error(TransportError::unavailable("lost")));
    transport.push_subscription(Subscription::actions_then_error(
        vec![sample_action("W1", "a1")],
        TransportError::cancelled("shutdown"),
    ));

    let mut listener = client
        .get_action_listener(email_worker_options())
        .await
        .unwrap();
    assert_eq!(listener.worker_id(), "W1");

    let started = Instant::now();
    let mut actions = listener.actions();
    let first = actions.next().await.unwrap().unwrap();
    let elapsed = started.elapsed();
    assert!(actions.next().await.is_none());
    drop(actions);

    assert_eq!(first.action_id, "a1");
    assert!(elapsed >= RETRY_DELAY, "resumed after {elapsed:?}");
    assert_eq!(listener.stats().resubscribe_attempts, 1);
}

#[tokio::test(start_paused = true)]
async fn test_retry_exhaustion_after_exactly_five_attempts() {
    let (client, transport) = mock_client();
    transport.push_subscription(Subscription::error(TransportError::unavailable("lost")));
    for _ in 0..5 {
        transport.push_subscription(Subscription::refused(TransportError::unavailable(
            "connection refused",
        )));
    }
    // Would succeed on a sixth attempt; it must never be made.
    transport.push_subscription(Subscription::actions(vec![sample_action("W1", "late")]));

    let mut listener = client
        .get_action_listener(email_worker_options())
        .await
        .unwrap();

    let started = Instant::now();
    let collected: Vec<_> = listener.actions().collect().await;

    assert_eq!(collected.len(), 1);
    match &collected[0] {
        Err(error @ DispatcherError::ResubscribeExhausted { retries, .. }) => {
            assert_eq!(*retries, 5);
            assert!(error.to_string().contains("5 retries"));
        }
        other => panic!("expected exhausted error, got {other:?}"),
    }

    // One initial subscription plus exactly five resubscribe attempts
    assert_eq!(transport.listen_requests().len(), 6);
    assert_eq!(listener.stats().resubscribe_attempts, 5);
    assert!(started.elapsed() >= RETRY_DELAY * 5);
    assert_eq!(listener.state(), ListenerState::Terminated);
}

#[tokio::test(start_paused = true)]
async fn test_other_errors_are_fatal_without_resubscribe() {
    let (client, transport) = mock_client();
    transport.push_subscription(Subscription::actions_then_error(
        vec![sample_action("W1", "a1")],
        TransportError::other("protocol violation"),
    ));
    transport.push_subscription(Subscription::actions(vec![sample_action("W1", "a2")]));

    let mut listener = client
        .get_action_listener(email_worker_options())
        .await
        .unwrap();
    let collected: Vec<_> = listener.actions().collect().await;

    assert_eq!(collected.len(), 2);
    assert!(collected[0].is_ok());
    assert!(matches!(
        &collected[1],
        Err(DispatcherError::StreamFailed(e)) if e.message == "protocol violation"
    ));
    assert_eq!(transport.listen_requests().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unregister_while_consuming_ends_stream() {
    let (client, transport) = mock_client();
    transport.push_subscription(Subscription::actions_then_hold(vec![sample_action(
        "W1", "a1",
    )]));

    let mut listener = client
        .get_action_listener(email_worker_options())
        .await
        .unwrap();
    let unregister = listener.unregister_handle();

    let consumer = tokio::spawn(async move {
        let collected: Vec<_> = listener.actions().collect().await;
        (collected, listener.state())
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    unregister.unregister().await.unwrap();

    let (collected, state) = consumer.await.unwrap();
    assert_eq!(collected.len(), 1);
    assert!(collected[0].is_ok());
    assert_eq!(state, ListenerState::Terminated);
    assert_eq!(transport.unsubscribe_requests().len(), 1);
    assert_eq!(transport.listen_requests().len(), 1);
}

#[tokio::test]
async fn test_unregister_error_is_wrapped() {
    let (client, transport) = mock_client();
    transport.push_subscription(Subscription::actions_then_hold(Vec::new()));
    transport.fail_unsubscribe(TransportError::unavailable("connection reset by peer"));

    let listener = client
        .get_action_listener(email_worker_options())
        .await
        .unwrap();
    let error = listener.unregister().await.unwrap_err();

    match &error {
        DispatcherError::Unregister { worker_id, message } => {
            assert_eq!(worker_id, "W1");
            assert_eq!(message, "connection reset by peer");
        }
        other => panic!("expected unregister error, got {other:?}"),
    }
    assert!(error.to_string().contains("connection reset by peer"));
}
