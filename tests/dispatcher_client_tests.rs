//! DispatcherClient façade: registration, initial subscription and step
//! action event reporting.

mod common;

use common::strategies::action_event_strategy;
use common::*;
use proptest::prelude::*;
use tokio_test::{assert_err, assert_ok};

use hatchet_dispatcher::testing::{sample_action, Subscription};
use hatchet_dispatcher::{ActionEvent, ActionEventType, DispatcherError, TransportError};

#[tokio::test]
async fn test_registration_carries_tenant_and_options() {
    let (client, transport) = mock_client();
    transport.push_subscription(Subscription::actions_then_hold(Vec::new()));

    let options = email_worker_options();
    let listener = assert_ok!(client.get_action_listener(options.clone()).await);

    let registrations = transport.register_requests();
    assert_eq!(registrations.len(), 1);
    assert_eq!(registrations[0].tenant_id, TENANT_ID);
    assert_eq!(registrations[0].worker_name, options.worker_name);
    assert_eq!(registrations[0].services, options.services);
    assert_eq!(registrations[0].actions, options.actions);

    let listens = transport.listen_requests();
    assert_eq!(listens.len(), 1);
    assert_eq!(listens[0].worker_id, "W1");
    assert_eq!(listens[0].tenant_id, TENANT_ID);

    assert_eq!(listener.worker_id(), "W1");
    assert_eq!(listener.registration().worker_name, "email-worker");
}

#[tokio::test]
async fn test_registration_failure_is_fatal() {
    let (client, transport) = mock_client();
    transport.fail_register(TransportError::unavailable("dispatcher down"));
    transport.push_subscription(Subscription::actions(Vec::new()));

    let error = assert_err!(client.get_action_listener(email_worker_options()).await);

    assert!(matches!(error, DispatcherError::Registration(ref e) if e.message == "dispatcher down"));
    assert!(transport.listen_requests().is_empty());
}

#[tokio::test]
async fn test_initial_subscription_failure_is_not_retried() {
    let (client, transport) = mock_client();
    transport.push_subscription(Subscription::refused(TransportError::unavailable(
        "connection refused",
    )));
    transport.push_subscription(Subscription::actions(Vec::new()));

    let error = assert_err!(client.get_action_listener(email_worker_options()).await);

    assert!(matches!(error, DispatcherError::Subscribe(_)));
    assert_eq!(transport.register_requests().len(), 1);
    assert_eq!(transport.listen_requests().len(), 1);
}

#[tokio::test]
async fn test_action_event_reaches_transport_unchanged() {
    let (client, transport) = mock_client();
    let action = sample_action("W1", "default:send-email");
    let event = ActionEvent::failed(&action, "smtp timeout");

    assert_ok!(client.send_action_event(event.clone()).await);

    let sent = transport.events();
    assert_eq!(sent, vec![event]);
    assert_eq!(sent[0].event_type, ActionEventType::Failed);
    assert_eq!(sent[0].step_run_id, action.step_run_id);
}

#[tokio::test]
async fn test_action_event_error_is_wrapped() {
    let (client, transport) = mock_client();
    transport.fail_events(TransportError::other("deadline exceeded"));

    let action = sample_action("W1", "default:send-email");
    let error = assert_err!(client.send_action_event(ActionEvent::started(&action)).await);

    match error {
        DispatcherError::ActionEvent { action_id, message } => {
            assert_eq!(action_id, "default:send-email");
            assert_eq!(message, "deadline exceeded");
        }
        other => panic!("expected action event error, got {other:?}"),
    }
    assert!(transport.events().is_empty());
}

proptest! {
    /// Property: every field of a reported event reaches the transport unchanged
    #[test]
    fn action_events_are_forwarded_field_for_field(event in action_event_strategy()) {
        let (client, transport) = mock_client();

        let result = tokio_test::block_on(client.send_action_event(event.clone()));
        prop_assert!(result.is_ok());

        let sent = transport.events();
        prop_assert_eq!(sent.len(), 1);
        prop_assert_eq!(&sent[0], &event);
    }
}
