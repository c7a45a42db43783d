//! Headless camera that plays still images as video frames.
//!
//! Used by the `qrscan` binary and anywhere a real camera is unavailable.
//! Each stream gets its own track starting at the first frame; a track
//! presents one frame per grab and ends after the last one unless looping.

use super::{MediaConstraints, MediaDevices, MediaStream, MediaTrack, ReadyState, TrackKind, TrackState};
use crate::error::{MediaError, Result};
use image::{GenericImageView, RgbaImage};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Media devices backed by an in-memory frame list
#[derive(Debug, Clone, Default)]
pub struct ImageSequenceDevices {
    frames: Arc<Vec<RgbaImage>>,
    looping: bool,
    streams_opened: usize,
}

impl ImageSequenceDevices {
    /// Devices that play `frames` in order
    pub fn new(frames: Vec<RgbaImage>) -> Self {
        Self {
            frames: Arc::new(frames),
            looping: false,
            streams_opened: 0,
        }
    }

    /// Load frames from image files, in the given order
    pub fn from_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut frames = Vec::with_capacity(paths.len());
        for path in paths {
            let img = image::open(path.as_ref())?;
            let (width, height) = img.dimensions();
            tracing::debug!(path = %path.as_ref().display(), width, height, "loaded frame");
            frames.push(img.to_rgba8());
        }
        Ok(Self::new(frames))
    }

    /// Restart from the first frame instead of ending
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    /// Number of frames per pass
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// How many streams have been handed out
    pub fn streams_opened(&self) -> usize {
        self.streams_opened
    }
}

impl MediaDevices for ImageSequenceDevices {
    fn get_user_media(&mut self, constraints: &MediaConstraints) -> Result<MediaStream, MediaError> {
        if constraints.video.is_none() {
            return Err(MediaError::Other("only video streams are supported".into()));
        }
        if self.frames.is_empty() {
            return Err(MediaError::NotFound);
        }
        self.streams_opened += 1;
        let id = format!("image-sequence-{}", self.streams_opened);
        let track = ImageSequenceTrack {
            id: format!("{id}-video"),
            frames: Arc::clone(&self.frames),
            looping: self.looping,
            cursor: AtomicUsize::new(0),
            stopped: AtomicBool::new(false),
        };
        Ok(MediaStream::new(id, vec![Arc::new(track)]))
    }
}

/// Video track over a frame list
#[derive(Debug)]
pub struct ImageSequenceTrack {
    id: String,
    frames: Arc<Vec<RgbaImage>>,
    looping: bool,
    cursor: AtomicUsize,
    stopped: AtomicBool,
}

impl ImageSequenceTrack {
    fn exhausted(&self) -> bool {
        !self.looping && self.cursor.load(Ordering::SeqCst) >= self.frames.len()
    }
}

impl MediaTrack for ImageSequenceTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        TrackKind::Video
    }

    fn state(&self) -> TrackState {
        if self.stopped.load(Ordering::SeqCst) || self.exhausted() {
            TrackState::Ended
        } else {
            TrackState::Live
        }
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn ready_state(&self) -> ReadyState {
        match self.state() {
            TrackState::Live => ReadyState::HaveEnoughData,
            TrackState::Ended => ReadyState::HaveNothing,
        }
    }

    fn grab_frame(&self) -> Option<RgbaImage> {
        if self.state() == TrackState::Ended {
            return None;
        }
        let idx = self.cursor.fetch_add(1, Ordering::SeqCst);
        self.frames.get(idx % self.frames.len()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frames(n: usize) -> Vec<RgbaImage> {
        (0..n)
            .map(|i| RgbaImage::from_pixel(2, 2, image::Rgba([i as u8, 0, 0, 255])))
            .collect()
    }

    #[test]
    fn test_plays_then_ends() {
        let mut devices = ImageSequenceDevices::new(frames(2));
        let stream = devices.get_user_media(&MediaConstraints::rear_camera()).unwrap();
        let track = &stream.get_tracks()[0];
        assert_eq!(track.ready_state(), ReadyState::HaveEnoughData);
        assert_eq!(track.grab_frame().unwrap().get_pixel(0, 0)[0], 0);
        assert_eq!(track.grab_frame().unwrap().get_pixel(0, 0)[0], 1);
        assert_eq!(track.state(), TrackState::Ended);
        assert!(track.grab_frame().is_none());
    }

    #[test]
    fn test_looping() {
        let mut devices = ImageSequenceDevices::new(frames(2)).looping(true);
        let stream = devices.get_user_media(&MediaConstraints::rear_camera()).unwrap();
        let track = &stream.get_tracks()[0];
        for _ in 0..5 {
            assert!(track.grab_frame().is_some());
        }
        assert_eq!(track.state(), TrackState::Live);
        track.stop();
        assert_eq!(track.state(), TrackState::Ended);
    }

    #[test]
    fn test_no_frames_is_not_found() {
        let mut devices = ImageSequenceDevices::new(Vec::new());
        let err = devices.get_user_media(&MediaConstraints::rear_camera()).unwrap_err();
        assert_eq!(err, MediaError::NotFound);
        assert_eq!(devices.streams_opened(), 0);
    }

    #[test]
    fn test_each_stream_starts_over() {
        let mut devices = ImageSequenceDevices::new(frames(3));
        let first = devices.get_user_media(&MediaConstraints::rear_camera()).unwrap();
        first.get_tracks()[0].grab_frame();
        let second = devices.get_user_media(&MediaConstraints::rear_camera()).unwrap();
        assert_eq!(
            second.get_tracks()[0].grab_frame().unwrap().get_pixel(0, 0)[0],
            0
        );
        assert_ne!(first.id(), second.id());
        assert_eq!(devices.streams_opened(), 2);
    }
}
