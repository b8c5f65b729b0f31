//! The per-frame loop: acquire, dispatch, display, react to one input symbol.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use image::RgbImage;
use tracing::{debug, info, warn};

use crate::dispatcher::ModeDispatcher;
use crate::error::Result;
use crate::mode::Mode;

/// Yields successive colour frames. `None` or an empty frame ends the stream.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<RgbImage>;
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn next_frame(&mut self) -> Option<RgbImage> {
        (**self).next_frame()
    }
}

/// Shows a frame and returns at most one pending input symbol.
pub trait DisplaySink {
    fn show(&mut self, frame: &RgbImage, mode: Mode) -> Option<char>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Stop,
    Save,
    Select(char),
}

impl InputEvent {
    pub fn from_key(key: char) -> InputEvent {
        match key {
            'q' | 'Q' => InputEvent::Stop,
            's' | 'S' => InputEvent::Save,
            other => InputEvent::Select(other),
        }
    }
}

/// Writes displayed frames as `screenshot_<unix seconds>_<counter>.png`.
pub struct ScreenshotWriter {
    dir: PathBuf,
    counter: u64,
}

impl ScreenshotWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            counter: 0,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn next_path(&mut self) -> PathBuf {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let path = self
            .dir
            .join(format!("screenshot_{}_{}.png", seconds, self.counter));
        self.counter += 1;
        path
    }

    pub fn save(&mut self, frame: &RgbImage) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.next_path();
        frame.save(&path)?;
        info!(path = %path.display(), "saved screenshot");
        Ok(path)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u64,
    pub screenshots: Vec<PathBuf>,
    pub final_mode: Mode,
}

pub struct Pipeline<S, D> {
    source: S,
    sink: D,
    dispatcher: ModeDispatcher,
    screenshots: ScreenshotWriter,
}

impl<S: FrameSource, D: DisplaySink> Pipeline<S, D> {
    pub fn new(
        source: S,
        sink: D,
        dispatcher: ModeDispatcher,
        screenshots: ScreenshotWriter,
    ) -> Self {
        Self {
            source,
            sink,
            dispatcher,
            screenshots,
        }
    }

    pub fn dispatcher(&self) -> &ModeDispatcher {
        &self.dispatcher
    }

    /// Run until a stop event or the end of the frame stream.
    pub fn run(&mut self) -> RunSummary {
        let mut summary = RunSummary::default();
        info!(mode = %self.dispatcher.mode(), "pipeline started");

        while let Some(frame) = self.source.next_frame() {
            if frame.width() == 0 || frame.height() == 0 {
                info!("empty frame, stopping");
                break;
            }

            let start = Instant::now();
            let output = self.dispatcher.process(&frame);
            debug!(mode = ?self.dispatcher.mode(), elapsed = ?start.elapsed(), "frame processed");
            summary.frames += 1;

            let Some(key) = self.sink.show(&output, self.dispatcher.mode()) else {
                continue;
            };

            match InputEvent::from_key(key) {
                InputEvent::Stop => {
                    info!("stop requested");
                    break;
                }
                InputEvent::Save => match self.screenshots.save(&output) {
                    Ok(path) => summary.screenshots.push(path),
                    Err(err) => warn!(%err, "could not save screenshot"),
                },
                InputEvent::Select(symbol) => {
                    if self.dispatcher.select(symbol).is_none() {
                        debug!(?symbol, "ignored key");
                    }
                }
            }
        }

        summary.final_mode = self.dispatcher.mode();
        info!(frames = summary.frames, "pipeline finished");
        summary
    }
}
