use std::sync::Arc;

use hatchet_dispatcher::testing::MockDispatcherTransport;
use hatchet_dispatcher::{ClientConfig, DispatcherClient, ListenerOptions};

pub const TENANT_ID: &str = "707d0855-80ab-4e1f-a156-f1c4546cbf52";

/// Client config for tests; retry settings left at their defaults (5 x 5s)
pub fn test_config() -> ClientConfig {
    ClientConfig::for_tenant(TENANT_ID)
}

/// Dispatcher client over a fresh mock transport that registers workers as "W1"
pub fn mock_client() -> (DispatcherClient, Arc<MockDispatcherTransport>) {
    mock_client_with_config(test_config())
}

pub fn mock_client_with_config(
    config: ClientConfig,
) -> (DispatcherClient, Arc<MockDispatcherTransport>) {
    let transport = Arc::new(MockDispatcherTransport::new());
    let client = DispatcherClient::new(Arc::new(config), transport.clone());
    (client, transport)
}

pub fn email_worker_options() -> ListenerOptions {
    ListenerOptions::new("email-worker")
        .with_services(["default"])
        .with_actions(["default:send-email", "default:send-sms"])
}
