//! The scanner component
//!
//! [`QrScanner`] ties the pieces together:
//! - a [`RenderingContext`] surface sized to the configured dimensions
//! - a [`CaptureSource`] fed by a [`MediaDevices`] camera stream
//! - a per-frame [`QrScanner::tick`] that draws the frame, decodes it,
//!   outlines any code found and emits its text
//!
//! Ticks are driven by the host (see [`crate::frame_loop`]). Each tick
//! carries the [`SessionToken`] returned by `start`, so a loop scheduled for
//! a session that has since been stopped ends on its next tick.

use crate::capture::CaptureSource;
use crate::config::{ScanConfig, ScannerSettings};
use crate::decoder::{DecodeOptions, InversionAttempts, QrDecoder, RqrrDecoder};
use crate::error::{Result, ScanError};
use crate::events::{EventEmitter, SubscriptionId};
use crate::media::{FacingMode, MediaConstraints, MediaDevices, ReadyState};
use crate::models::Color;
use crate::overlay::draw_location;
use crate::session::{Session, SessionState, SessionToken};
use crate::surface::{ImageData, RenderingContext, Surface};
use tracing::{debug, info, trace, warn};

/// Background the surface is cleared to on init
pub const BACKGROUND: Color = Color::BLACK;

/// Default consecutive not-ready ticks before warning (about 5s at 60 fps)
pub const DEFAULT_STARVATION_WARN_FRAMES: u32 = 300;

/// What one tick did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Token belongs to an ended session; the loop must not reschedule
    Cancelled,
    /// Capture source had no frame ready; decode skipped
    Waiting,
    /// Frame scanned, no code found
    NoCode,
    /// Frame scanned and a code decoded; carries the emitted text
    Decoded(String),
}

impl TickOutcome {
    /// Whether the loop should schedule another tick
    pub fn reschedules(&self) -> bool {
        !matches!(self, TickOutcome::Cancelled)
    }
}

/// Result of [`QrScanner::stop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// An attached stream was released
    Released {
        /// Number of tracks stopped
        tracks: usize,
    },
    /// No stream was attached; nothing to release
    NotActive,
}

/// Live camera QR scanner
pub struct QrScanner {
    config: ScanConfig,
    stroke: Color,
    options: DecodeOptions,
    constraints: MediaConstraints,
    starvation_warn_frames: u32,
    context: Box<dyn RenderingContext>,
    video: CaptureSource,
    devices: Box<dyn MediaDevices>,
    decoder: Box<dyn QrDecoder>,
    session: Session,
    data: EventEmitter<String>,
}

fn resolve_stroke(color: &str) -> Color {
    match Color::parse(color) {
        Ok(c) => c,
        Err(err) => {
            warn!(%err, fallback = %Color::OVERLAY_GREEN, "unusable overlay color");
            Color::OVERLAY_GREEN
        }
    }
}

impl QrScanner {
    /// Scanner over `devices` with a raster surface and the `rqrr` decoder
    pub fn new<M: MediaDevices + 'static>(config: ScanConfig, devices: M) -> Self {
        Self {
            stroke: resolve_stroke(&config.color),
            context: Box::new(Surface::new(config.width, config.height)),
            config,
            options: DecodeOptions::new(InversionAttempts::DontInvert),
            constraints: MediaConstraints::rear_camera(),
            starvation_warn_frames: DEFAULT_STARVATION_WARN_FRAMES,
            video: CaptureSource::new(),
            devices: Box::new(devices),
            decoder: Box::new(RqrrDecoder::new()),
            session: Session::default(),
            data: EventEmitter::new(),
        }
    }

    /// Scanner configured from loaded settings
    pub fn from_settings<M: MediaDevices + 'static>(settings: &ScannerSettings, devices: M) -> Self {
        Self::new(settings.scan.clone(), devices)
            .with_facing_mode(settings.camera.facing_mode)
            .with_inversion(settings.frame_loop.inversion_attempts)
            .with_starvation_warning(settings.frame_loop.starvation_warn_frames)
    }

    /// Replace the decoder
    pub fn with_decoder<D: QrDecoder + 'static>(mut self, decoder: D) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Replace the drawing surface; it is resized to the configured dimensions
    pub fn with_context<C: RenderingContext + 'static>(mut self, context: C) -> Self {
        self.context = Box::new(context);
        self.context.resize(self.config.width, self.config.height);
        self
    }

    /// Inversion strategy for decode calls
    pub fn with_inversion(mut self, inversion_attempts: InversionAttempts) -> Self {
        self.options = DecodeOptions::new(inversion_attempts);
        self
    }

    /// Preferred camera direction
    pub fn with_facing_mode(mut self, facing_mode: FacingMode) -> Self {
        self.constraints = MediaConstraints::camera(facing_mode);
        self
    }

    /// Not-ready ticks before a starvation warning; 0 disables
    pub fn with_starvation_warning(mut self, frames: u32) -> Self {
        self.starvation_warn_frames = frames;
        self
    }

    /// Current inputs
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Change inputs between scans. A size change resizes and re-clears the surface.
    pub fn set_config(&mut self, config: ScanConfig) {
        let resized = (config.width, config.height) != (self.config.width, self.config.height);
        if config.color != self.config.color {
            self.stroke = resolve_stroke(&config.color);
        }
        self.config = config;
        if resized {
            self.context.resize(self.config.width, self.config.height);
            self.init();
        }
    }

    /// Clear the surface to the opaque background
    pub fn init(&mut self) {
        self.context
            .fill_rect(0, 0, self.config.width, self.config.height, BACKGROUND);
    }

    /// Session lifecycle state
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// True while a stream is attached and the loop is scheduled
    pub fn is_start(&self) -> bool {
        self.session.state() == SessionState::Active
    }

    /// True from a camera request until the first ready frame is scanned
    pub fn is_loading(&self) -> bool {
        self.session.is_loading()
    }

    /// Video element equivalent
    pub fn capture_source(&self) -> &CaptureSource {
        &self.video
    }

    /// Drawing surface
    pub fn context(&self) -> &dyn RenderingContext {
        self.context.as_ref()
    }

    /// Full surface pixels
    pub fn snapshot(&self) -> ImageData {
        self.context
            .get_image_data(0, 0, self.context.width(), self.context.height())
    }

    /// Subscribe to decoded payloads
    pub fn on_data<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&String) + 'static,
    {
        self.data.subscribe(callback)
    }

    /// Open the camera and begin a session.
    ///
    /// Returns the token for the first tick, or `None` when already started
    /// or when camera access failed (the failure is logged and the session
    /// stays idle).
    pub fn start(&mut self) -> Option<SessionToken> {
        match self.try_start() {
            Ok(token) => Some(token),
            Err(ScanError::AlreadyStarted) => None,
            Err(err) => {
                warn!(%err, "camera access failed");
                None
            }
        }
    }

    /// Like [`start`](Self::start), but hands the failure back to the caller.
    /// The stop path has already run when a [`ScanError::Media`] is returned.
    pub fn try_start(&mut self) -> Result<SessionToken> {
        if matches!(
            self.session.state(),
            SessionState::Active | SessionState::Requesting
        ) {
            return Err(ScanError::AlreadyStarted);
        }

        self.session.begin_request();
        match self.devices.get_user_media(&self.constraints) {
            Ok(stream) => {
                let token = self.session.activate();
                info!(stream = stream.id(), tracks = stream.get_tracks().len(), "camera started");
                self.video.set_src_object(Some(stream));
                self.video.set_plays_inline(true);
                self.video.play();
                Ok(token)
            }
            Err(err) => {
                self.stop();
                Err(err.into())
            }
        }
    }

    /// End the session and release the camera. Safe without an attached stream.
    pub fn stop(&mut self) -> StopOutcome {
        self.session.begin_stop();
        let outcome = match self.video.take_src_object() {
            Some(stream) => {
                let tracks = stream.stop_all();
                info!(stream = stream.id(), tracks, "camera stopped");
                StopOutcome::Released { tracks }
            }
            None => {
                debug!("stop with no attached stream");
                StopOutcome::NotActive
            }
        };
        self.session.finish_stop();
        outcome
    }

    /// Start when stopped, stop when started
    pub fn toggle_camera(&mut self) -> Option<SessionToken> {
        self.session.set_loading(!self.is_start());
        if self.is_start() {
            self.stop();
            None
        } else {
            self.start()
        }
    }

    /// One animation frame of the scan loop
    pub fn tick(&mut self, token: SessionToken) -> TickOutcome {
        if !self.session.is_current(token) {
            trace!(?token, "tick for ended session");
            return TickOutcome::Cancelled;
        }

        let frame = if self.video.ready_state() == ReadyState::HaveEnoughData {
            self.video.current_frame()
        } else {
            None
        };
        let Some(frame) = frame else {
            if self.session.note_starved(self.starvation_warn_frames) {
                warn!(
                    ticks = self.session.starved_ticks(),
                    "capture source has not produced a frame"
                );
            }
            return TickOutcome::Waiting;
        };
        self.session.note_ready();

        let (width, height) = (self.config.width, self.config.height);
        self.context.draw_frame(&frame, 0, 0, width, height);
        let image = self.context.get_image_data(0, 0, width, height);

        let outcome = match self
            .decoder
            .decode(&image.data, image.width, image.height, &self.options)
        {
            Some(code) => {
                draw_location(
                    self.context.as_mut(),
                    &code.location,
                    self.config.line,
                    self.stroke,
                );
                debug!(bytes = code.binary_data.len(), version = ?code.version, "code decoded");
                self.data.emit(&code.data);
                TickOutcome::Decoded(code.data)
            }
            None => TickOutcome::NoCode,
        };
        self.session.set_loading(false);
        outcome
    }
}

impl std::fmt::Debug for QrScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QrScanner")
            .field("config", &self.config)
            .field("state", &self.session.state())
            .field("loading", &self.session.is_loading())
            .field("video", &self.video)
            .finish_non_exhaustive()
    }
}
