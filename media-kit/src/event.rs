//! Media events as the host SDK reports them.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaEventName {
    SessionStart,
    SessionEnd,
    Play,
    Pause,
    AdBreakStart,
    AdBreakEnd,
    AdStart,
    AdSkip,
    AdEnd,
    AdClick,
    UpdateQos,
    BufferStart,
    BufferEnd,
    SeekStart,
    SeekEnd,
    SegmentStart,
    SegmentSkip,
    SegmentEnd,
    UpdatePlayheadPosition,
}

impl MediaEventName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaEventName::SessionStart => "session_start",
            MediaEventName::SessionEnd => "session_end",
            MediaEventName::Play => "play",
            MediaEventName::Pause => "pause",
            MediaEventName::AdBreakStart => "ad_break_start",
            MediaEventName::AdBreakEnd => "ad_break_end",
            MediaEventName::AdStart => "ad_start",
            MediaEventName::AdSkip => "ad_skip",
            MediaEventName::AdEnd => "ad_end",
            MediaEventName::AdClick => "ad_click",
            MediaEventName::UpdateQos => "update_qos",
            MediaEventName::BufferStart => "buffer_start",
            MediaEventName::BufferEnd => "buffer_end",
            MediaEventName::SeekStart => "seek_start",
            MediaEventName::SeekEnd => "seek_end",
            MediaEventName::SegmentStart => "segment_start",
            MediaEventName::SegmentSkip => "segment_skip",
            MediaEventName::SegmentEnd => "segment_end",
            MediaEventName::UpdatePlayheadPosition => "update_playhead_position",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Audio,
    Video,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MediaContent {
    pub name: Option<String>,
    pub content_id: Option<String>,
    pub duration_ms: Option<u64>,
    pub stream_type: Option<String>,
    pub content_type: Option<ContentType>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MediaAdBreak {
    pub id: Option<String>,
    pub title: Option<String>,
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MediaAd {
    pub id: Option<String>,
    pub title: Option<String>,
    pub advertiser: Option<String>,
    pub campaign: Option<String>,
    pub creative: Option<String>,
    pub placement: Option<String>,
    pub site_id: Option<String>,
    /// Position of the ad inside its break, starting at 1.
    pub position: Option<i64>,
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MediaSegment {
    pub title: Option<String>,
    pub index: Option<i64>,
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct MediaQos {
    pub bit_rate: Option<i64>,
    pub startup_time_ms: Option<u64>,
    pub fps: Option<f64>,
    pub dropped_frames: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MediaEvent {
    pub name: MediaEventName,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub playhead_position_ms: Option<u64>,
    #[serde(default)]
    pub content: MediaContent,
    #[serde(default)]
    pub ad_break: Option<MediaAdBreak>,
    #[serde(default)]
    pub ad: Option<MediaAd>,
    #[serde(default)]
    pub segment: Option<MediaSegment>,
    #[serde(default)]
    pub qos: Option<MediaQos>,
    #[serde(default)]
    pub custom_attributes: HashMap<String, Value>,
}

impl MediaEvent {
    pub fn new(name: MediaEventName, session_id: &str) -> Self {
        Self {
            name,
            session_id: Some(session_id.to_owned()),
            playhead_position_ms: None,
            content: MediaContent::default(),
            ad_break: None,
            ad: None,
            segment: None,
            qos: None,
            custom_attributes: HashMap::new(),
        }
    }
}
