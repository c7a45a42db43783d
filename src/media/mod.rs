//! Media layer
//!
//! Host-provided camera services behind traits: [`MediaDevices`] hands out
//! [`MediaStream`]s, each made of [`MediaTrack`]s that can be stopped to
//! release the device. Video tracks also expose their buffering state and
//! current frame so a [`crate::capture::CaptureSource`] can play them.

pub mod image_sequence;

pub use image_sequence::{ImageSequenceDevices, ImageSequenceTrack};

use crate::error::MediaError;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Camera direction preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front camera
    User,
    /// Rear camera
    Environment,
}

/// Video part of a stream request
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VideoConstraints {
    /// Preferred camera direction (a preference, not a requirement)
    pub facing_mode: Option<FacingMode>,
    /// Preferred frame width
    pub width: Option<u32>,
    /// Preferred frame height
    pub height: Option<u32>,
}

/// Stream request, mirroring `getUserMedia` constraints
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MediaConstraints {
    /// Requested video, `None` for no video
    pub video: Option<VideoConstraints>,
    /// Whether audio is requested
    pub audio: bool,
}

impl MediaConstraints {
    /// Video-only request preferring the given camera direction
    pub fn camera(facing_mode: FacingMode) -> Self {
        Self {
            video: Some(VideoConstraints {
                facing_mode: Some(facing_mode),
                ..Default::default()
            }),
            audio: false,
        }
    }

    /// Video-only request preferring the rear camera
    pub fn rear_camera() -> Self {
        Self::camera(FacingMode::Environment)
    }

    /// Requested facing mode, if any
    pub fn facing_mode(&self) -> Option<FacingMode> {
        self.video.as_ref().and_then(|v| v.facing_mode)
    }
}

/// Track media type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    /// Audio track
    Audio,
    /// Video track
    Video,
}

/// Track lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    /// Producing media
    Live,
    /// Stopped or exhausted; never live again
    Ended,
}

/// How much data a video source has buffered, in increasing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ReadyState {
    /// Nothing available
    HaveNothing,
    /// Dimensions known, no frame yet
    HaveMetadata,
    /// The current frame is available
    HaveCurrentData,
    /// Current and at least the next frame available
    HaveFutureData,
    /// Enough buffered to play through
    HaveEnoughData,
}

/// One track of a media stream
pub trait MediaTrack {
    /// Track identifier
    fn id(&self) -> &str;

    /// Audio or video
    fn kind(&self) -> TrackKind;

    /// Live or ended
    fn state(&self) -> TrackState;

    /// Stop the track and release its device. Stopping twice is harmless.
    fn stop(&self);

    /// Buffering state for video playback
    fn ready_state(&self) -> ReadyState {
        ReadyState::HaveNothing
    }

    /// Frame currently presented by the track
    fn grab_frame(&self) -> Option<RgbaImage> {
        None
    }
}

/// A set of tracks handed out by [`MediaDevices::get_user_media`]
#[derive(Clone)]
pub struct MediaStream {
    id: String,
    tracks: Vec<Arc<dyn MediaTrack>>,
}

impl MediaStream {
    /// Create a stream from its tracks
    pub fn new(id: impl Into<String>, tracks: Vec<Arc<dyn MediaTrack>>) -> Self {
        Self {
            id: id.into(),
            tracks,
        }
    }

    /// Stream identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// All tracks
    pub fn get_tracks(&self) -> &[Arc<dyn MediaTrack>] {
        &self.tracks
    }

    /// Video tracks only
    pub fn get_video_tracks(&self) -> impl Iterator<Item = &Arc<dyn MediaTrack>> {
        self.tracks.iter().filter(|t| t.kind() == TrackKind::Video)
    }

    /// True while any track is live
    pub fn active(&self) -> bool {
        self.tracks.iter().any(|t| t.state() == TrackState::Live)
    }

    /// Stop every track; returns how many tracks were stopped
    pub fn stop_all(&self) -> usize {
        for track in &self.tracks {
            track.stop();
        }
        self.tracks.len()
    }
}

impl fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field("tracks", &self.tracks.iter().map(|t| t.id()).collect::<Vec<_>>())
            .finish()
    }
}

/// Camera access, the `navigator.mediaDevices` equivalent
pub trait MediaDevices {
    /// Request a stream satisfying `constraints`
    fn get_user_media(&mut self, constraints: &MediaConstraints) -> Result<MediaStream, MediaError>;
}
