use std::sync::{Arc, Mutex};

use crate::vendor::{MediaInfo, MediaSdk, MediaTracker, Metadata, QoeInfo, TrackedInfo, VendorEvent};

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerCall {
    SessionStart(MediaInfo, Metadata),
    SessionEnd,
    Play,
    Pause,
    Event(VendorEvent, Option<TrackedInfo>, Metadata),
    Playhead(f64),
    Qoe(QoeInfo),
    Error(String),
}

type CallLog = Arc<Mutex<Vec<Vec<TrackerCall>>>>;

/// A vendor SDK that records every call made on the trackers it creates.
/// Trackers are numbered in creation order, so the kit's default tracker is 0.
#[derive(Default)]
pub struct RecordingSdk {
    app_id: Mutex<Option<String>>,
    calls: CallLog,
}

impl RecordingSdk {
    pub fn configured_app_id(&self) -> Option<String> {
        self.app_id.lock().unwrap().clone()
    }

    pub fn trackers_created(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self, tracker: usize) -> Vec<TrackerCall> {
        self.calls.lock().unwrap()[tracker].clone()
    }
}

impl MediaSdk for RecordingSdk {
    fn configure(&self, app_id: &str) {
        *self.app_id.lock().unwrap() = Some(app_id.to_owned());
    }

    fn create_tracker(&self) -> Box<dyn MediaTracker> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(Vec::new());

        Box::new(RecordingTracker {
            index: calls.len() - 1,
            calls: self.calls.clone(),
        })
    }
}

struct RecordingTracker {
    index: usize,
    calls: CallLog,
}

impl RecordingTracker {
    fn record(&self, call: TrackerCall) {
        self.calls.lock().unwrap()[self.index].push(call);
    }
}

impl MediaTracker for RecordingTracker {
    fn track_session_start(&mut self, info: MediaInfo, metadata: Metadata) {
        self.record(TrackerCall::SessionStart(info, metadata));
    }

    fn track_session_end(&mut self) {
        self.record(TrackerCall::SessionEnd);
    }

    fn track_play(&mut self) {
        self.record(TrackerCall::Play);
    }

    fn track_pause(&mut self) {
        self.record(TrackerCall::Pause);
    }

    fn track_event(&mut self, event: VendorEvent, info: Option<TrackedInfo>, metadata: Metadata) {
        self.record(TrackerCall::Event(event, info, metadata));
    }

    fn update_current_playhead(&mut self, seconds: f64) {
        self.record(TrackerCall::Playhead(seconds));
    }

    fn update_qoe(&mut self, qoe: QoeInfo) {
        self.record(TrackerCall::Qoe(qoe));
    }

    fn track_error(&mut self, message: &str) {
        self.record(TrackerCall::Error(message.to_owned()));
    }
}
