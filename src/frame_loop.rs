//! Animation-frame scheduler
//!
//! Calls [`QrScanner::tick`] once per display frame on the current thread,
//! sleeping out the rest of each frame budget. The loop ends when a tick is
//! cancelled (its session was stopped), or when `max_frames` is reached.

use crate::config::LoopSettings;
use crate::scanner::{QrScanner, TickOutcome};
use crate::session::SessionToken;
use std::time::{Duration, Instant};

/// Counters for one loop run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoopSummary {
    /// Ticks executed, including the final cancelled one
    pub ticks: u64,
    /// Ticks skipped for lack of a ready frame
    pub waiting: u64,
    /// Frames scanned without a code
    pub no_code: u64,
    /// Frames that produced an emission
    pub decoded: u64,
    /// Whether the loop ended because its session ended
    pub cancelled: bool,
}

impl LoopSummary {
    fn record(&mut self, outcome: &TickOutcome) {
        self.ticks += 1;
        match outcome {
            TickOutcome::Cancelled => self.cancelled = true,
            TickOutcome::Waiting => self.waiting += 1,
            TickOutcome::NoCode => self.no_code += 1,
            TickOutcome::Decoded(_) => self.decoded += 1,
        }
    }
}

/// Fixed-rate frame driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationFrameLoop {
    frame_interval: Option<Duration>,
    max_frames: Option<u64>,
}

impl AnimationFrameLoop {
    /// Loop at the frame rate of `settings`
    pub fn from_settings(settings: &LoopSettings) -> Self {
        Self {
            frame_interval: settings.frame_interval(),
            max_frames: None,
        }
    }

    /// Loop without sleeping between frames
    pub fn unthrottled() -> Self {
        Self {
            frame_interval: None,
            max_frames: None,
        }
    }

    /// Stop after at most `frames` ticks
    pub fn max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    /// Run until the session ends
    pub fn run(&self, scanner: &mut QrScanner, token: SessionToken) -> LoopSummary {
        self.run_with(scanner, token, |_, _| {})
    }

    /// Run, handing every tick outcome to `on_frame`. The callback may stop
    /// the scanner; the next tick then cancels the loop.
    pub fn run_with<F>(
        &self,
        scanner: &mut QrScanner,
        token: SessionToken,
        mut on_frame: F,
    ) -> LoopSummary
    where
        F: FnMut(&mut QrScanner, &TickOutcome),
    {
        let mut summary = LoopSummary::default();
        loop {
            let frame_start = Instant::now();
            let outcome = scanner.tick(token);
            summary.record(&outcome);
            if !outcome.reschedules() {
                break;
            }
            on_frame(scanner, &outcome);
            if self.max_frames.is_some_and(|max| summary.ticks >= max) {
                break;
            }
            if let Some(interval) = self.frame_interval {
                let elapsed = frame_start.elapsed();
                if elapsed < interval {
                    std::thread::sleep(interval - elapsed);
                }
            }
        }
        tracing::debug!(?summary, "scan loop finished");
        summary
    }
}

impl Default for AnimationFrameLoop {
    fn default() -> Self {
        Self::from_settings(&LoopSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::decoder::DecodeOptions;
    use crate::media::ImageSequenceDevices;
    use crate::models::{DecodeResult, Location};
    use image::RgbaImage;

    fn scanner(frames: usize) -> QrScanner {
        let devices = ImageSequenceDevices::new(vec![RgbaImage::new(2, 2); frames]);
        QrScanner::new(ScanConfig::default(), devices).with_decoder(
            |_: &[u8], _: u32, _: u32, _: &DecodeOptions| -> Option<DecodeResult> {
                Some(DecodeResult::new("x", Location::default()))
            },
        )
    }

    #[test]
    fn test_stop_from_callback_cancels_loop() {
        let mut scanner = scanner(10);
        let token = scanner.start().unwrap();
        let summary = AnimationFrameLoop::unthrottled().run_with(&mut scanner, token, |s, outcome| {
            if matches!(outcome, TickOutcome::Decoded(_)) {
                s.stop();
            }
        });
        assert_eq!(summary.decoded, 1);
        assert!(summary.cancelled);
        assert_eq!(summary.ticks, 2);
    }

    #[test]
    fn test_interval_follows_settings() {
        let settings = LoopSettings {
            fps: 50,
            ..LoopSettings::default()
        };
        let frame_loop = AnimationFrameLoop::from_settings(&settings);
        assert_eq!(frame_loop.frame_interval, Some(Duration::from_millis(20)));

        let unthrottled = LoopSettings {
            fps: 0,
            ..LoopSettings::default()
        };
        assert_eq!(
            AnimationFrameLoop::from_settings(&unthrottled),
            AnimationFrameLoop::unthrottled()
        );
        assert_eq!(
            AnimationFrameLoop::default().frame_interval,
            LoopSettings::default().frame_interval()
        );
    }

    #[test]
    fn test_max_frames() {
        let mut scanner = scanner(1);
        let token = scanner.start().unwrap();
        let summary = AnimationFrameLoop::unthrottled()
            .max_frames(5)
            .run(&mut scanner, token);
        assert_eq!(summary.ticks, 5);
        assert_eq!(summary.decoded, 1);
        assert_eq!(summary.waiting, 4);
        assert!(!summary.cancelled);
        assert!(scanner.is_start());
    }
}
