//! Capture source: the hidden video element the camera stream plays into.

use crate::media::{MediaStream, MediaTrack, ReadyState, TrackState};
use image::RgbaImage;
use std::sync::Arc;

/// Plays the attached stream's first live video track
#[derive(Debug, Default)]
pub struct CaptureSource {
    src_object: Option<MediaStream>,
    playing: bool,
    plays_inline: bool,
}

impl CaptureSource {
    /// Source with nothing attached
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach or detach a stream. Attaching resets playback.
    pub fn set_src_object(&mut self, stream: Option<MediaStream>) {
        self.src_object = stream;
        self.playing = false;
    }

    /// Detach and return the current stream
    pub fn take_src_object(&mut self) -> Option<MediaStream> {
        self.playing = false;
        self.src_object.take()
    }

    /// Currently attached stream
    pub fn src_object(&self) -> Option<&MediaStream> {
        self.src_object.as_ref()
    }

    /// Keep playback inline instead of going fullscreen
    pub fn set_plays_inline(&mut self, plays_inline: bool) {
        self.plays_inline = plays_inline;
    }

    /// Whether inline playback was requested
    pub fn plays_inline(&self) -> bool {
        self.plays_inline
    }

    /// Begin playback; returns false when there is nothing to play
    pub fn play(&mut self) -> bool {
        self.playing = self.src_object.is_some();
        self.playing
    }

    /// Whether playback is running
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    fn video_track(&self) -> Option<&Arc<dyn MediaTrack>> {
        self.src_object
            .as_ref()?
            .get_video_tracks()
            .find(|t| t.state() == TrackState::Live)
    }

    /// Buffering state; `HaveNothing` unless playing a live video track
    pub fn ready_state(&self) -> ReadyState {
        if !self.playing {
            return ReadyState::HaveNothing;
        }
        self.video_track()
            .map(|t| t.ready_state())
            .unwrap_or(ReadyState::HaveNothing)
    }

    /// True once the attached stream has no live tracks left
    pub fn has_ended(&self) -> bool {
        self.src_object.as_ref().is_some_and(|s| !s.active())
    }

    /// Frame to draw for this tick
    pub fn current_frame(&self) -> Option<RgbaImage> {
        if !self.playing {
            return None;
        }
        self.video_track()?.grab_frame()
    }
}
