use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use httpmock::prelude::*;
use identity_sync::client::{IdentitySyncClient, SyncState};
use identity_sync::config::SyncSettings;
use kit_common::attributes::{InMemoryAttributeStore, MARKETING_CLOUD_ID_KEY};
use kit_common::identity::IdentityType;
use kit_common::listener::{ApplicationStateListener, AttributeListener, PushListener};
use media_kit::kit::{MediaKit, LAUNCH_APP_ID_KEY};
use media_kit::vendor::{
    MediaInfo, MediaSdk, MediaTracker, Metadata, QoeInfo, TrackedInfo, VendorEvent,
};

struct NoopSdk;

struct NoopTracker;

impl MediaSdk for NoopSdk {
    fn configure(&self, _app_id: &str) {}

    fn create_tracker(&self) -> Box<dyn MediaTracker> {
        Box::new(NoopTracker)
    }
}

impl MediaTracker for NoopTracker {
    fn track_session_start(&mut self, _info: MediaInfo, _metadata: Metadata) {}
    fn track_session_end(&mut self) {}
    fn track_play(&mut self) {}
    fn track_pause(&mut self) {}
    fn track_event(
        &mut self,
        _event: VendorEvent,
        _info: Option<TrackedInfo>,
        _metadata: Metadata,
    ) {
    }
    fn update_current_playhead(&mut self, _seconds: f64) {}
    fn update_qoe(&mut self, _qoe: QoeInfo) {}
    fn track_error(&mut self, _message: &str) {}
}

fn unreachable_settings() -> SyncSettings {
    SyncSettings {
        host: "127.0.0.1:1".to_owned(),
        use_tls: false,
        connect_timeout: Duration::from_millis(200),
        request_timeout: Duration::from_millis(500),
        ..Default::default()
    }
}

fn mock_settings(server: &MockServer) -> SyncSettings {
    SyncSettings {
        host: server.address().to_string(),
        use_tls: false,
        ..Default::default()
    }
}

async fn wait_until_idle(client: &IdentitySyncClient) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while client.state() != SyncState::Idle {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("identity sync did not settle");
}

fn setup_kit(client: &IdentitySyncClient) -> MediaKit {
    let settings = HashMap::from([(LAUNCH_APP_ID_KEY.to_owned(), "app".to_owned())]);

    MediaKit::new(&settings, Arc::new(NoopSdk))
        .expect("failed to create kit")
        .with_identity_sync(client.clone())
}

#[tokio::test]
async fn kit_creation_starts_a_sync() {
    let store = Arc::new(InMemoryAttributeStore::with_attributes([(
        MARKETING_CLOUD_ID_KEY,
        "M1",
    )]));
    let client = IdentitySyncClient::new(unreachable_settings(), store).unwrap();

    let kit = setup_kit(&client);

    assert_eq!(client.state(), SyncState::InFlight);
    assert_eq!(kit.marketing_cloud_id(), Some("M1".to_owned()));
}

#[tokio::test]
async fn lifecycle_notifications_coalesce_into_one_follow_up() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/id");
            then.status(200)
                .delay(Duration::from_millis(300))
                .body(r#"{"d_mid": "ABC"}"#);
        })
        .await;

    let store = Arc::new(InMemoryAttributeStore::new());
    let client = IdentitySyncClient::new(mock_settings(&server), store).unwrap();
    let kit = setup_kit(&client);

    kit.on_application_background();
    kit.on_application_foreground();
    kit.set_user_attribute("plan", "pro");
    kit.remove_user_attribute("plan");

    assert_eq!(client.state(), SyncState::InFlightWithPending);

    wait_until_idle(&client).await;

    mock.assert_hits_async(2).await;
    assert_eq!(kit.marketing_cloud_id(), Some("ABC".to_owned()));
}

#[tokio::test]
async fn identity_changes_reach_the_snapshot() {
    let store = Arc::new(InMemoryAttributeStore::new());
    let client = IdentitySyncClient::new(unreachable_settings(), store).unwrap();
    let kit = setup_kit(&client);

    kit.set_user_identity(IdentityType::CustomerId, "C1");
    kit.set_user_identity(IdentityType::Email, "a@b.c");
    kit.remove_user_identity(IdentityType::Email);
    assert!(!kit.on_push_registration("P1", "sender"));

    let snapshot = client.snapshot().unwrap();
    assert_eq!(
        snapshot.user_identities.get(&IdentityType::CustomerId),
        Some(&"C1".to_owned())
    );
    assert!(!snapshot.user_identities.contains_key(&IdentityType::Email));
    assert_eq!(snapshot.push_token, Some("P1".to_owned()));
    assert!(!kit.supports_attribute_lists());
}
