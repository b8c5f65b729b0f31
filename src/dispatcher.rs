use image::RgbImage;
use imageproc::rect::Rect;
use rusttype::Font;
use tracing::{info, warn};

use crate::depth::{DepthService, DepthStatus};
use crate::effects;
use crate::face_detection::FaceDetectionModel;
use crate::filters;
use crate::mode::{EffectInput, EffectParams, Mode};

/// Holds the current mode and the auxiliary services, and turns every frame
/// into the output of the selected effect.
pub struct ModeDispatcher {
    mode: Mode,
    params: EffectParams,
    face_detector: Option<Box<dyn FaceDetectionModel>>,
    face_warned: bool,
    depth: DepthService,
    font: Option<Font<'static>>,
}

impl ModeDispatcher {
    pub fn new(
        params: EffectParams,
        face_detector: Option<Box<dyn FaceDetectionModel>>,
        depth: DepthService,
    ) -> Self {
        Self {
            mode: Mode::default(),
            params,
            face_detector,
            face_warned: false,
            depth,
            font: None,
        }
    }

    /// Font used to label the degraded-mode banner.
    pub fn with_font(mut self, font: Option<Font<'static>>) -> Self {
        self.font = font;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn depth_status(&self) -> DepthStatus {
        self.depth.status()
    }

    /// Handle a mode-select symbol. Unknown symbols leave the mode unchanged
    /// and return `None`.
    pub fn select(&mut self, key: char) -> Option<Mode> {
        let mode = Mode::from_key(key)?;
        if mode != self.mode {
            info!(%mode, "mode changed");
        }
        self.mode = mode;
        Some(mode)
    }

    /// Run the current mode on one frame.
    pub fn process(&mut self, frame: &RgbImage) -> RgbImage {
        let needs = self.mode.needs();

        let faces = if needs.faces {
            self.detect_faces(frame)
        } else {
            Vec::new()
        };

        let depth = if needs.depth {
            match self.depth.estimate(frame) {
                Some(depth) => Some(depth),
                None => return effects::warning_overlay(frame, self.font.as_ref()),
            }
        } else {
            None
        };

        let input = EffectInput {
            frame,
            faces: &faces,
            depth: depth.as_ref(),
            params: &self.params,
        };
        self.mode.render(&input)
    }

    fn detect_faces(&mut self, frame: &RgbImage) -> Vec<Rect> {
        let Some(detector) = self.face_detector.as_mut() else {
            if !self.face_warned {
                warn!("no face detector loaded, face effects will find no faces");
                self.face_warned = true;
            }
            return Vec::new();
        };

        let grey = filters::luma(frame);
        match detector.detect(&grey) {
            Ok(faces) => faces,
            Err(err) => {
                warn!(%err, "face detection failed");
                Vec::new()
            }
        }
    }
}
