use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time;

use kit_common::attributes::{
    AttributeStore, AUDIENCE_MANAGER_BLOB, AUDIENCE_MANAGER_LOCATION_HINT, MARKETING_CLOUD_ID_KEY,
};
use kit_common::identity::IdentityType;
use kit_common::listener::{ApplicationStateListener, AttributeListener, PushListener};
use reqwest::Url;
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, error, info, instrument, warn};

use crate::config::SyncSettings;
use crate::error::SyncError;
use crate::query::{build_query_string, IdentitySnapshot, ADVERTISING_ID_KEY, PUSH_TOKEN_KEY};
use crate::query::{DCS_REGION_KEY, D_BLOB_KEY, D_MID_KEY};

/// Where a sync client stands with respect to the identity endpoint.
///
/// At most one request is in flight per client. Any number of requests made while one is in
/// flight collapse into a single pending follow-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    InFlight,
    InFlightWithPending,
}

impl SyncState {
    /// Returns the next state, and whether the caller must start a request.
    fn on_request(self) -> (SyncState, bool) {
        match self {
            SyncState::Idle => (SyncState::InFlight, true),
            SyncState::InFlight | SyncState::InFlightWithPending => {
                (SyncState::InFlightWithPending, false)
            }
        }
    }

    /// Returns the next state once a request resolves, and whether a follow-up must run.
    fn on_complete(self) -> (SyncState, bool) {
        match self {
            SyncState::InFlightWithPending => (SyncState::InFlight, true),
            SyncState::InFlight | SyncState::Idle => (SyncState::Idle, false),
        }
    }
}

/// A store consulted for a cloud id when none has been cached yet, e.g. one left behind by a
/// previous vendor SDK installation.
pub struct LegacyCloudIdSource {
    store: Arc<dyn AttributeStore>,
    key: String,
}

#[derive(Debug, Default)]
struct LocalIdentities {
    push_token: Option<String>,
    advertising_id: Option<String>,
    user_identities: BTreeMap<IdentityType, String>,
}

struct Inner {
    endpoint: Url,
    org_id: Option<String>,
    http_client: reqwest::Client,
    runtime: Handle,
    store: Arc<dyn AttributeStore>,
    legacy_sources: Vec<LegacyCloudIdSource>,
    state: Mutex<SyncState>,
    identities: RwLock<LocalIdentities>,
}

/// Keeps the vendor identity endpoint informed of the identities we know about, caching the
/// cloud id, region hint and blob it hands back.
///
/// Cloning is cheap and clones share state, including the in-flight request.
#[derive(Clone)]
pub struct IdentitySyncClient {
    inner: Arc<Inner>,
}

pub struct IdentitySyncClientBuilder {
    settings: SyncSettings,
    store: Arc<dyn AttributeStore>,
    legacy_sources: Vec<LegacyCloudIdSource>,
}

impl IdentitySyncClientBuilder {
    /// Consult `key` in `store` for a cloud id when the primary store has none.
    /// Sources are tried in the order they are added.
    pub fn legacy_cloud_id_source(mut self, store: Arc<dyn AttributeStore>, key: &str) -> Self {
        self.legacy_sources.push(LegacyCloudIdSource {
            store,
            key: key.to_owned(),
        });
        self
    }

    /// Build the client. Must be called from within a tokio runtime, which will run every
    /// request this client makes.
    pub fn build(self) -> Result<IdentitySyncClient, SyncError> {
        let runtime = Handle::try_current().map_err(|_| SyncError::NoRuntime)?;
        let endpoint = Url::parse(&self.settings.endpoint())?;

        let http_client = reqwest::Client::builder()
            .user_agent("Identity Sync Kit")
            .connect_timeout(self.settings.connect_timeout)
            .timeout(self.settings.request_timeout)
            .build()
            .map_err(SyncError::ClientBuildError)?;

        Ok(IdentitySyncClient {
            inner: Arc::new(Inner {
                endpoint,
                org_id: self.settings.org_id,
                http_client,
                runtime,
                store: self.store,
                legacy_sources: self.legacy_sources,
                state: Mutex::new(SyncState::Idle),
                identities: RwLock::new(LocalIdentities::default()),
            }),
        })
    }
}

impl IdentitySyncClient {
    pub fn builder(
        settings: SyncSettings,
        store: Arc<dyn AttributeStore>,
    ) -> IdentitySyncClientBuilder {
        IdentitySyncClientBuilder {
            settings,
            store,
            legacy_sources: Vec::new(),
        }
    }

    pub fn new(
        settings: SyncSettings,
        store: Arc<dyn AttributeStore>,
    ) -> Result<Self, SyncError> {
        Self::builder(settings, store).build()
    }

    /// Ask for a sync with the identity endpoint.
    ///
    /// Never blocks on the network. If a request is already in flight, exactly one more request
    /// is made after it resolves, built from the state current at that time.
    pub fn request_sync(&self) {
        let start = {
            let mut state = self.inner.lock_state();
            let (next, start) = state.on_request();
            *state = next;
            start
        };

        if !start {
            debug!("identity sync in flight, deferring");
            metrics::counter!("identity_sync_requests_coalesced").increment(1);
            return;
        }

        let slot = InFlightSlot {
            inner: self.inner.clone(),
            released: false,
        };
        // A runtime that has shut down drops the task right away, which releases the slot.
        self.inner.runtime.spawn(run_sync_loop(slot));
    }

    pub fn state(&self) -> SyncState {
        *self.inner.lock_state()
    }

    /// The cloud id requests would be sent with right now, if any.
    pub fn marketing_cloud_id(&self) -> Option<String> {
        match self.inner.cloud_id() {
            Ok(cloud_id) => cloud_id,
            Err(e) => {
                warn!("failed to read cloud id: {}", e);
                None
            }
        }
    }

    pub fn snapshot(&self) -> Result<IdentitySnapshot, SyncError> {
        self.inner.snapshot()
    }

    pub fn set_push_token(&self, push_token: &str) {
        self.inner.write_identities().push_token = Some(push_token.to_owned());
    }

    pub fn set_advertising_id(&self, advertising_id: Option<&str>) {
        self.inner.write_identities().advertising_id = advertising_id.map(str::to_owned);
    }

    pub fn set_user_identity(&self, identity_type: IdentityType, value: &str) {
        self.inner
            .write_identities()
            .user_identities
            .insert(identity_type, value.to_owned());
    }

    pub fn remove_user_identity(&self, identity_type: IdentityType) {
        self.inner
            .write_identities()
            .user_identities
            .remove(&identity_type);
    }
}

impl Inner {
    // The state is a plain Copy enum, so a poisoned lock still holds a valid value.
    fn lock_state(&self) -> std::sync::MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_identities(&self) -> std::sync::RwLockWriteGuard<'_, LocalIdentities> {
        self.identities
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn cloud_id(&self) -> Result<Option<String>, SyncError> {
        if let Some(cloud_id) = self.store.get_non_empty(MARKETING_CLOUD_ID_KEY)? {
            return Ok(Some(cloud_id));
        }

        for source in &self.legacy_sources {
            match source.store.get_non_empty(&source.key) {
                Ok(Some(cloud_id)) => return Ok(Some(cloud_id)),
                Ok(None) => {}
                Err(e) => warn!("failed to read legacy cloud id {}: {}", source.key, e),
            }
        }

        Ok(None)
    }

    fn snapshot(&self) -> Result<IdentitySnapshot, SyncError> {
        let identities = self
            .identities
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        Ok(IdentitySnapshot {
            cloud_id: self.cloud_id()?,
            org_id: self.org_id.clone(),
            blob: self.store.get_non_empty(AUDIENCE_MANAGER_BLOB)?,
            region_hint: self.store.get_non_empty(AUDIENCE_MANAGER_LOCATION_HINT)?,
            push_token: identities.push_token.clone(),
            advertising_id: identities.advertising_id.clone(),
            user_identities: identities.user_identities.clone(),
        })
    }

    #[instrument(skip_all)]
    async fn sync_once(&self) -> Result<(), SyncError> {
        let snapshot = self.snapshot()?;
        let query = build_query_string(&snapshot, PUSH_TOKEN_KEY, ADVERTISING_ID_KEY);

        let mut url = self.endpoint.clone();
        url.set_query(Some(query.as_str()));

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(SyncError::RequestError)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::UnexpectedStatus(status));
        }

        let body = response.bytes().await.map_err(SyncError::RequestError)?;

        self.apply_response(&body)
    }

    /// Cache what the endpoint handed back. Nothing is written unless the response carries a
    /// cloud id. An already cached cloud id is never replaced.
    fn apply_response(&self, body: &[u8]) -> Result<(), SyncError> {
        let response: Value = serde_json::from_slice(body)?;

        let cloud_id = response
            .get(D_MID_KEY)
            .and_then(value_as_string)
            .ok_or(SyncError::MissingCloudId)?;
        let region_hint = response.get(DCS_REGION_KEY).and_then(value_as_string);
        let blob = response.get(D_BLOB_KEY).and_then(value_as_string);

        if self.store.get_non_empty(MARKETING_CLOUD_ID_KEY)?.is_none() {
            info!("caching cloud id from identity response");
            self.store.set(MARKETING_CLOUD_ID_KEY, &cloud_id)?;
        }
        if let Some(region_hint) = region_hint {
            self.store
                .set(AUDIENCE_MANAGER_LOCATION_HINT, &region_hint)?;
        }
        if let Some(blob) = blob {
            self.store.set(AUDIENCE_MANAGER_BLOB, &blob)?;
        }

        Ok(())
    }
}

/// Region hints come back as numbers, everything else as strings.
fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Ownership of the single in-flight request.
///
/// Released on the way back to `Idle`. If the sync task is dropped or panics before that, the
/// slot resets the state to `Idle` so later requests are not deferred forever.
struct InFlightSlot {
    inner: Arc<Inner>,
    released: bool,
}

impl InFlightSlot {
    /// Advance the state once a request resolves. Returns whether a follow-up must run.
    fn complete(&mut self) -> bool {
        let mut state = self.inner.lock_state();
        let (next, follow_up) = state.on_complete();
        *state = next;
        self.released = next == SyncState::Idle;
        follow_up
    }
}

impl Drop for InFlightSlot {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        warn!("identity sync task ended before completing, resetting state");
        *self.inner.lock_state() = SyncState::Idle;
    }
}

async fn run_sync_loop(mut slot: InFlightSlot) {
    loop {
        let now = time::Instant::now();

        metrics::counter!("identity_sync_requests_total").increment(1);
        match slot.inner.sync_once().await {
            Ok(()) => {
                metrics::counter!("identity_sync_requests_completed").increment(1);
            }
            Err(e) => {
                error!("identity sync failed: {}", e);
                metrics::counter!("identity_sync_requests_failed").increment(1);
            }
        }
        metrics::histogram!("identity_sync_duration_seconds")
            .record(now.elapsed().as_secs_f64());

        if !slot.complete() {
            break;
        }
        debug!("running deferred identity sync");
    }
}

impl ApplicationStateListener for IdentitySyncClient {
    fn on_application_foreground(&self) {
        self.request_sync();
    }

    fn on_application_background(&self) {
        self.request_sync();
    }
}

impl AttributeListener for IdentitySyncClient {
    fn set_user_attribute(&self, _key: &str, _value: &str) {
        self.request_sync();
    }

    fn set_user_attribute_list(&self, _key: &str, _values: &[String]) {
        self.request_sync();
    }

    fn supports_attribute_lists(&self) -> bool {
        false
    }

    fn set_all_user_attributes(
        &self,
        _attributes: &HashMap<String, String>,
        _attribute_lists: &HashMap<String, Vec<String>>,
    ) {
        self.request_sync();
    }

    fn remove_user_attribute(&self, _key: &str) {
        self.request_sync();
    }

    fn set_user_identity(&self, identity_type: IdentityType, value: &str) {
        IdentitySyncClient::set_user_identity(self, identity_type, value);
        self.request_sync();
    }

    fn remove_user_identity(&self, identity_type: IdentityType) {
        IdentitySyncClient::remove_user_identity(self, identity_type);
        self.request_sync();
    }
}

impl PushListener for IdentitySyncClient {
    fn on_push_registration(&self, instance_id: &str, _sender_id: &str) -> bool {
        self.set_push_token(instance_id);
        self.request_sync();
        false
    }
}
