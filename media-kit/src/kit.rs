use std::collections::HashMap;
use std::sync::Arc;

use identity_sync::client::IdentitySyncClient;
use kit_common::identity::IdentityType;
use kit_common::listener::{ApplicationStateListener, AttributeListener, PushListener};
use tracing::{debug, info};

use crate::attributes::to_vendor_metadata;
use crate::error::KitError;
use crate::event::{ContentType, MediaAd, MediaAdBreak, MediaContent, MediaEvent, MediaEventName};
use crate::event::{MediaQos, MediaSegment};
use crate::vendor::{
    AdBreakInfo, AdInfo, ChapterInfo, MediaInfo, MediaSdk, MediaTracker, MediaType, QoeInfo,
    TrackedInfo, VendorEvent,
};

pub const KIT_NAME: &str = "Adobe Media";
pub const LAUNCH_APP_ID_KEY: &str = "launchAppId";

/// Convert host milliseconds into vendor seconds.
pub fn to_seconds(ms: u64) -> f64 {
    ms as f64 / 1000.0
}

/// Forwards host media events to vendor trackers, one tracker per playback session.
pub struct MediaKit {
    sdk: Arc<dyn MediaSdk>,
    /// Receives errors that are not tied to a session.
    default_tracker: Box<dyn MediaTracker>,
    trackers: HashMap<String, Box<dyn MediaTracker>>,
    current_playhead_ms: u64,
    identity_sync: Option<IdentitySyncClient>,
}

impl MediaKit {
    pub fn new(
        settings: &HashMap<String, String>,
        sdk: Arc<dyn MediaSdk>,
    ) -> Result<Self, KitError> {
        let app_id = settings
            .get(LAUNCH_APP_ID_KEY)
            .filter(|app_id| !app_id.is_empty())
            .ok_or(KitError::MissingSetting(LAUNCH_APP_ID_KEY))?;

        sdk.configure(app_id);
        let default_tracker = sdk.create_tracker();

        info!("{} kit configured", KIT_NAME);

        Ok(Self {
            sdk,
            default_tracker,
            trackers: HashMap::new(),
            current_playhead_ms: 0,
            identity_sync: None,
        })
    }

    /// Forward identity changes through `client`, starting with an immediate sync.
    pub fn with_identity_sync(mut self, client: IdentitySyncClient) -> Self {
        client.request_sync();
        self.identity_sync = Some(client);
        self
    }

    pub fn name(&self) -> &'static str {
        KIT_NAME
    }

    pub fn marketing_cloud_id(&self) -> Option<String> {
        self.identity_sync
            .as_ref()
            .and_then(|client| client.marketing_cloud_id())
    }

    pub fn current_playhead_ms(&self) -> u64 {
        self.current_playhead_ms
    }

    pub fn active_sessions(&self) -> usize {
        self.trackers.len()
    }

    pub fn log_error(&mut self, message: &str) {
        self.default_tracker.track_error(message);
    }

    pub fn log_media_event(&mut self, event: &MediaEvent) {
        metrics::counter!("media_events_total", "event" => event.name.as_str()).increment(1);

        if let Some(playhead_ms) = event.playhead_position_ms {
            self.current_playhead_ms = playhead_ms;
            if let Some(tracker) = self.tracker(event) {
                tracker.update_current_playhead(to_seconds(playhead_ms));
            }
        }

        match event.name {
            MediaEventName::SessionStart => self.session_start(event),
            MediaEventName::SessionEnd => self.session_end(event),
            MediaEventName::Play => {
                if let Some(tracker) = self.tracker(event) {
                    tracker.track_play();
                }
            }
            MediaEventName::Pause => {
                if let Some(tracker) = self.tracker(event) {
                    tracker.track_pause();
                }
            }
            MediaEventName::AdBreakStart => {
                let info = event.ad_break.as_ref().map(|b| self.ad_break_info(b));
                self.track(event, VendorEvent::AdBreakStart, info);
            }
            MediaEventName::AdBreakEnd => {
                let info = event.ad_break.as_ref().map(|b| self.ad_break_info(b));
                self.track(event, VendorEvent::AdBreakComplete, info);
            }
            MediaEventName::AdStart => {
                let info = event.ad.as_ref().map(ad_info);
                self.track(event, VendorEvent::AdStart, info);
            }
            MediaEventName::AdSkip | MediaEventName::AdEnd => {
                let info = event.ad.as_ref().map(ad_info);
                self.track(event, VendorEvent::AdComplete, info);
            }
            MediaEventName::UpdateQos => {
                if let Some(qos) = &event.qos {
                    let qoe = qoe_info(qos);
                    if let Some(tracker) = self.tracker(event) {
                        tracker.update_qoe(qoe);
                    }
                }
            }
            MediaEventName::BufferStart => {
                let info = Some(TrackedInfo::Media(media_info(&event.content)));
                self.track(event, VendorEvent::BufferStart, info);
            }
            MediaEventName::BufferEnd => {
                let info = Some(TrackedInfo::Media(media_info(&event.content)));
                self.track(event, VendorEvent::BufferComplete, info);
            }
            MediaEventName::SeekStart => {
                let info = Some(TrackedInfo::Media(media_info(&event.content)));
                self.track(event, VendorEvent::SeekStart, info);
            }
            MediaEventName::SeekEnd => {
                let info = Some(TrackedInfo::Media(media_info(&event.content)));
                self.track(event, VendorEvent::SeekComplete, info);
            }
            MediaEventName::SegmentStart => {
                let info = event.segment.as_ref().map(|s| self.chapter_info(s));
                self.track(event, VendorEvent::ChapterStart, info);
            }
            MediaEventName::SegmentSkip => {
                let info = event.segment.as_ref().map(|s| self.chapter_info(s));
                self.track(event, VendorEvent::ChapterSkip, info);
            }
            MediaEventName::SegmentEnd => {
                let info = event.segment.as_ref().map(|s| self.chapter_info(s));
                self.track(event, VendorEvent::ChapterComplete, info);
            }
            // The playhead was recorded above, and ad clicks have no vendor counterpart.
            MediaEventName::UpdatePlayheadPosition | MediaEventName::AdClick => {}
        }
    }

    fn tracker(&mut self, event: &MediaEvent) -> Option<&mut Box<dyn MediaTracker>> {
        let session_id = event.session_id.as_deref()?;
        let tracker = self.trackers.get_mut(session_id);
        if tracker.is_none() {
            debug!("no tracker for media session {}", session_id);
        }
        tracker
    }

    fn track(&mut self, event: &MediaEvent, vendor_event: VendorEvent, info: Option<TrackedInfo>) {
        if let Some(tracker) = self.tracker(event) {
            tracker.track_event(
                vendor_event,
                info,
                to_vendor_metadata(&event.custom_attributes),
            );
        }
    }

    fn session_start(&mut self, event: &MediaEvent) {
        let Some(session_id) = event.session_id.as_deref() else {
            debug!("ignoring media session start without a session id");
            return;
        };

        let mut tracker = self.sdk.create_tracker();
        tracker.track_session_start(
            media_info(&event.content),
            to_vendor_metadata(&event.custom_attributes),
        );

        if self.trackers.insert(session_id.to_owned(), tracker).is_some() {
            debug!("replaced tracker for restarted media session {}", session_id);
        }
    }

    fn session_end(&mut self, event: &MediaEvent) {
        let Some(session_id) = event.session_id.as_deref() else {
            return;
        };

        if let Some(mut tracker) = self.trackers.remove(session_id) {
            tracker.track_session_end();
        }
    }

    fn ad_break_info(&self, ad_break: &MediaAdBreak) -> TrackedInfo {
        TrackedInfo::AdBreak(AdBreakInfo {
            name: ad_break.title.clone().unwrap_or_default(),
            position: 1,
            start_time: to_seconds(self.current_playhead_ms),
        })
    }

    fn chapter_info(&self, segment: &MediaSegment) -> TrackedInfo {
        TrackedInfo::Chapter(ChapterInfo {
            name: segment.title.clone().unwrap_or_default(),
            position: segment.index.unwrap_or(0),
            length: segment.duration_ms.map(to_seconds).unwrap_or(0.0),
            start_time: to_seconds(self.current_playhead_ms),
        })
    }
}

pub fn media_type(content_type: Option<ContentType>) -> Option<MediaType> {
    match content_type {
        Some(ContentType::Audio) => Some(MediaType::Audio),
        Some(ContentType::Video) => Some(MediaType::Video),
        None => None,
    }
}

fn media_info(content: &MediaContent) -> MediaInfo {
    MediaInfo {
        name: content.name.clone().unwrap_or_default(),
        id: content.content_id.clone().unwrap_or_default(),
        length: content.duration_ms.map(to_seconds).unwrap_or(0.0),
        stream_type: content.stream_type.clone().unwrap_or_default(),
        media_type: media_type(content.content_type),
    }
}

fn ad_info(ad: &MediaAd) -> TrackedInfo {
    TrackedInfo::Ad(AdInfo {
        name: ad.title.clone().unwrap_or_default(),
        id: ad.id.clone().unwrap_or_default(),
        position: ad.position.unwrap_or(0),
        length: ad.duration_ms.map(to_seconds).unwrap_or(0.0),
    })
}

fn qoe_info(qos: &MediaQos) -> QoeInfo {
    QoeInfo {
        bitrate: qos.bit_rate.unwrap_or(0),
        startup_time: qos.startup_time_ms.map(to_seconds).unwrap_or(0.0),
        fps: qos.fps.unwrap_or(0.0),
        dropped_frames: qos.dropped_frames.unwrap_or(0),
    }
}

impl ApplicationStateListener for MediaKit {
    fn on_application_foreground(&self) {
        if let Some(client) = &self.identity_sync {
            client.on_application_foreground();
        }
    }

    fn on_application_background(&self) {
        if let Some(client) = &self.identity_sync {
            client.on_application_background();
        }
    }
}

impl AttributeListener for MediaKit {
    fn set_user_attribute(&self, key: &str, value: &str) {
        if let Some(client) = &self.identity_sync {
            client.set_user_attribute(key, value);
        }
    }

    fn set_user_attribute_list(&self, key: &str, values: &[String]) {
        if let Some(client) = &self.identity_sync {
            client.set_user_attribute_list(key, values);
        }
    }

    fn set_all_user_attributes(
        &self,
        attributes: &HashMap<String, String>,
        attribute_lists: &HashMap<String, Vec<String>>,
    ) {
        if let Some(client) = &self.identity_sync {
            client.set_all_user_attributes(attributes, attribute_lists);
        }
    }

    fn remove_user_attribute(&self, key: &str) {
        if let Some(client) = &self.identity_sync {
            client.remove_user_attribute(key);
        }
    }

    fn set_user_identity(&self, identity_type: IdentityType, value: &str) {
        if let Some(client) = &self.identity_sync {
            AttributeListener::set_user_identity(client, identity_type, value);
        }
    }

    fn remove_user_identity(&self, identity_type: IdentityType) {
        if let Some(client) = &self.identity_sync {
            AttributeListener::remove_user_identity(client, identity_type);
        }
    }
}

impl PushListener for MediaKit {
    fn on_push_registration(&self, instance_id: &str, sender_id: &str) -> bool {
        match &self.identity_sync {
            Some(client) => client.on_push_registration(instance_id, sender_id),
            None => false,
        }
    }
}
