#![allow(dead_code)]

use image::{Rgba, RgbaImage};
use qr_scanner::media::{
    MediaConstraints, MediaDevices, MediaStream, MediaTrack, ReadyState, TrackKind, TrackState,
};
use qr_scanner::{Color, ImageData, MediaError, Point, RenderingContext};
use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};

/// Camera track that is always ready and never runs out of frames
pub struct FakeTrack {
    id: String,
    kind: TrackKind,
    stopped: AtomicBool,
    ready: ReadyState,
}

impl FakeTrack {
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl MediaTrack for FakeTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn state(&self) -> TrackState {
        if self.is_stopped() {
            TrackState::Ended
        } else {
            TrackState::Live
        }
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn ready_state(&self) -> ReadyState {
        self.ready
    }

    fn grab_frame(&self) -> Option<RgbaImage> {
        (self.kind == TrackKind::Video)
            .then(|| RgbaImage::from_pixel(8, 6, image::Rgba([200, 200, 200, 255])))
    }
}

/// Media devices handing out video+audio streams, recording every track
#[derive(Clone)]
pub struct FakeDevices {
    pub requests: Rc<RefCell<Vec<MediaConstraints>>>,
    pub tracks: Rc<RefCell<Vec<Arc<FakeTrack>>>>,
    pub fail_with: Option<MediaError>,
    pub ready: ReadyState,
}

impl FakeDevices {
    pub fn new() -> Self {
        Self {
            requests: Rc::default(),
            tracks: Rc::default(),
            fail_with: None,
            ready: ReadyState::HaveEnoughData,
        }
    }

    pub fn failing(err: MediaError) -> Self {
        Self {
            fail_with: Some(err),
            ..Self::new()
        }
    }

    pub fn never_ready() -> Self {
        Self {
            ready: ReadyState::HaveMetadata,
            ..Self::new()
        }
    }

    pub fn live_tracks(&self) -> usize {
        self.tracks.borrow().iter().filter(|t| !t.is_stopped()).count()
    }
}

impl MediaDevices for FakeDevices {
    fn get_user_media(&mut self, constraints: &MediaConstraints) -> Result<MediaStream, MediaError> {
        self.requests.borrow_mut().push(constraints.clone());
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        let n = self.requests.borrow().len();
        let mut tracks: Vec<Arc<dyn MediaTrack>> = Vec::new();
        for kind in [TrackKind::Video, TrackKind::Audio] {
            let track = Arc::new(FakeTrack {
                id: format!("{n}-{kind:?}"),
                kind,
                stopped: AtomicBool::new(false),
                ready: self.ready,
            });
            self.tracks.borrow_mut().push(Arc::clone(&track));
            tracks.push(track);
        }
        Ok(MediaStream::new(format!("stream-{n}"), tracks))
    }
}

/// Drawing operation captured by [`RecordingContext`]
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Resize(u32, u32),
    FillRect { width: u32, height: u32, color: Color },
    DrawFrame { width: u32, height: u32 },
    Stroke { from: Point, to: Point, width: f32, color: Color },
}

/// Rendering context that records calls instead of rasterising
#[derive(Clone, Default)]
pub struct RecordingContext {
    pub ops: Rc<RefCell<Vec<DrawOp>>>,
    size: (u32, u32),
}

impl RecordingContext {
    pub fn strokes(&self) -> Vec<(Point, Point)> {
        self.ops
            .borrow()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Stroke { from, to, .. } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }
}

impl RenderingContext for RecordingContext {
    fn width(&self) -> u32 {
        self.size.0
    }

    fn height(&self) -> u32 {
        self.size.1
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.size = (width, height);
        self.ops.borrow_mut().push(DrawOp::Resize(width, height));
    }

    fn fill_rect(&mut self, _x: i32, _y: i32, width: u32, height: u32, color: Color) {
        self.ops.borrow_mut().push(DrawOp::FillRect { width, height, color });
    }

    fn draw_frame(&mut self, _frame: &RgbaImage, _x: i32, _y: i32, width: u32, height: u32) {
        self.ops.borrow_mut().push(DrawOp::DrawFrame { width, height });
    }

    fn get_image_data(&self, _x: i32, _y: i32, width: u32, height: u32) -> ImageData {
        ImageData {
            data: vec![0; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    fn stroke_line(&mut self, from: Point, to: Point, width: f32, color: Color) {
        self.ops.borrow_mut().push(DrawOp::Stroke { from, to, width, color });
    }
}

/// Subscribe a collector to the scanner's output event
pub fn collect_payloads(scanner: &mut qr_scanner::QrScanner) -> Rc<RefCell<Vec<String>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    scanner.on_data(move |text| sink.borrow_mut().push(text.clone()));
    seen
}

/// Pixels per QR module in generated frames
pub const MODULE_PX: u32 = 6;
const QUIET_MODULES: u32 = 4;

/// Render `payload` as a QR frame with a quiet zone. `inverted` draws light
/// modules on a dark background.
pub fn qr_frame(payload: &str, inverted: bool) -> RgbaImage {
    let code = qrencode::QrCode::new(payload.as_bytes()).unwrap();
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + 2 * QUIET_MODULES) * MODULE_PX;
    RgbaImage::from_fn(side, side, |x, y| {
        let (mx, my) = (x / MODULE_PX, y / MODULE_PX);
        let inside = (QUIET_MODULES..QUIET_MODULES + modules).contains(&mx)
            && (QUIET_MODULES..QUIET_MODULES + modules).contains(&my);
        let dark = inside
            && colors[((my - QUIET_MODULES) * modules + (mx - QUIET_MODULES)) as usize]
                == qrencode::Color::Dark;
        if dark != inverted {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([255, 255, 255, 255])
        }
    })
}

/// Formatted `tracing` output collected in memory
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LogCapture {
    /// Run `f` with a subscriber writing `level` and above into this capture
    pub fn capture<R>(&self, level: tracing::Level, f: impl FnOnce() -> R) -> R {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }

    /// Number of captured lines containing `needle`
    pub fn count(&self, needle: &str) -> usize {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .filter(|line| line.contains(needle))
            .count()
    }
}
