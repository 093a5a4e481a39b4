//! The surface of the vendor media SDK we drive.
use std::collections::HashMap;

/// Vendor metadata attached to session starts and tracked events.
pub type Metadata = HashMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Audio,
    Video,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub name: String,
    pub id: String,
    /// Seconds.
    pub length: f64,
    pub stream_type: String,
    pub media_type: Option<MediaType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdBreakInfo {
    pub name: String,
    pub position: i64,
    /// Playhead seconds at which the break started.
    pub start_time: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdInfo {
    pub name: String,
    pub id: String,
    pub position: i64,
    pub length: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChapterInfo {
    pub name: String,
    pub position: i64,
    pub length: f64,
    pub start_time: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QoeInfo {
    pub bitrate: i64,
    pub startup_time: f64,
    pub fps: f64,
    pub dropped_frames: i64,
}

/// Info object passed along with a tracked event.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackedInfo {
    Media(MediaInfo),
    AdBreak(AdBreakInfo),
    Ad(AdInfo),
    Chapter(ChapterInfo),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorEvent {
    AdBreakStart,
    AdBreakComplete,
    AdStart,
    AdComplete,
    SeekStart,
    SeekComplete,
    BufferStart,
    BufferComplete,
    ChapterStart,
    ChapterSkip,
    ChapterComplete,
}

/// One playback session's analytics stream.
pub trait MediaTracker: Send {
    fn track_session_start(&mut self, info: MediaInfo, metadata: Metadata);

    fn track_session_end(&mut self);

    fn track_play(&mut self);

    fn track_pause(&mut self);

    fn track_event(&mut self, event: VendorEvent, info: Option<TrackedInfo>, metadata: Metadata);

    fn update_current_playhead(&mut self, seconds: f64);

    fn update_qoe(&mut self, qoe: QoeInfo);

    fn track_error(&mut self, message: &str);
}

pub trait MediaSdk: Send + Sync {
    fn configure(&self, app_id: &str);

    fn create_tracker(&self) -> Box<dyn MediaTracker>;
}
