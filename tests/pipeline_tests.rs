use std::cell::Cell;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::rect::Rect;

use vidfx::depth::{DepthEstimationModel, DepthService, DepthStatus};
use vidfx::effects::overlay::{FACE_BOX_COLOR, WARNING_BANNER_COLOR};
use vidfx::effects::depth_view;
use vidfx::error::{DepthError, FaceDetectionError};
use vidfx::face_detection::FaceDetectionModel;
use vidfx::filters;
use vidfx::mode::EffectParams;
use vidfx::pipeline::{DisplaySink, FrameSource, Pipeline, ScreenshotWriter};
use vidfx::{Mode, ModeDispatcher};

struct Frames(VecDeque<RgbImage>);

impl Frames {
    fn repeat(frame: &RgbImage, count: usize) -> Self {
        Frames((0..count).map(|_| frame.clone()).collect())
    }
}

impl FrameSource for Frames {
    fn next_frame(&mut self) -> Option<RgbImage> {
        self.0.pop_front()
    }
}

/// Returns one scripted key per shown frame and records what it was shown.
#[derive(Default)]
struct ScriptedSink {
    keys: VecDeque<Option<char>>,
    shown: Vec<(RgbImage, Mode)>,
}

impl ScriptedSink {
    fn new(keys: &[Option<char>]) -> Self {
        Self {
            keys: keys.iter().copied().collect(),
            shown: Vec::new(),
        }
    }
}

impl DisplaySink for &mut ScriptedSink {
    fn show(&mut self, frame: &RgbImage, mode: Mode) -> Option<char> {
        self.shown.push((frame.clone(), mode));
        self.keys.pop_front().flatten()
    }
}

struct OneFace(Rect);

impl FaceDetectionModel for OneFace {
    fn detect(&mut self, _grey: &GrayImage) -> Result<Vec<Rect>, FaceDetectionError> {
        Ok(vec![self.0])
    }
}

struct Ramp {
    calls: Rc<Cell<usize>>,
}

impl DepthEstimationModel for Ramp {
    fn estimate(&mut self, frame: &RgbImage) -> Result<GrayImage, DepthError> {
        self.calls.set(self.calls.get() + 1);
        Ok(ramp(frame.width(), frame.height()))
    }
}

fn ramp(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, _| Luma([(x * 255 / (width - 1)) as u8]))
}

fn frame() -> RgbImage {
    RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 3) as u8, (y * 5) as u8, 60]))
}

fn dispatcher() -> ModeDispatcher {
    ModeDispatcher::new(EffectParams::default(), None, DepthService::unavailable())
}

fn unused_screenshots() -> ScreenshotWriter {
    ScreenshotWriter::new("unused")
}

fn scratch_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    std::env::temp_dir().join(format!("vidfx-{}-{}-{}", name, std::process::id(), nanos))
}

#[test]
fn keys_switch_modes_and_stop() {
    let src = frame();
    let mut sink = ScriptedSink::new(&[Some('p'), Some('z'), Some('q')]);
    let source = Frames::repeat(&src, 5);
    let summary = Pipeline::new(source, &mut sink, dispatcher(), unused_screenshots()).run();

    assert_eq!(summary.frames, 3);
    assert_eq!(summary.final_mode, Mode::Sepia);
    assert!(summary.screenshots.is_empty());

    let modes: Vec<Mode> = sink.shown.iter().map(|(_, mode)| *mode).collect();
    assert_eq!(modes, vec![Mode::PassThrough, Mode::Sepia, Mode::Sepia]);
    assert_eq!(sink.shown[0].0, src);
    assert_eq!(sink.shown[1].0, filters::sepia(&src));
    assert_eq!(sink.shown[2].0, filters::sepia(&src));
}

#[test]
fn every_mode_key_is_selectable_from_the_loop() {
    let keys: Vec<Option<char>> = Mode::all().map(|mode| Some(mode.key())).collect();
    let src = frame();
    let mut sink = ScriptedSink::new(&keys);
    let source = Frames::repeat(&src, keys.len() + 1);
    let summary = Pipeline::new(source, &mut sink, dispatcher(), unused_screenshots()).run();

    assert_eq!(summary.frames as usize, keys.len() + 1);
    let modes: Vec<Mode> = sink.shown.iter().skip(1).map(|(_, mode)| *mode).collect();
    assert_eq!(modes, Mode::all().collect::<Vec<_>>());
    for (image, _) in &sink.shown {
        assert_eq!(image.dimensions(), src.dimensions());
    }
}

#[test]
fn empty_frame_ends_the_stream() {
    let src = frame();
    let source = Frames(VecDeque::from(vec![src.clone(), RgbImage::new(0, 0), src]));
    let mut sink = ScriptedSink::default();
    let summary = Pipeline::new(source, &mut sink, dispatcher(), unused_screenshots()).run();

    assert_eq!(summary.frames, 1);
    assert_eq!(sink.shown.len(), 1);
}

#[test]
fn save_writes_the_displayed_frame() {
    let dir = scratch_dir("screenshots");
    let src = frame();
    let mut sink = ScriptedSink::new(&[Some('x'), Some('s'), None, Some('S')]);
    let writer = ScreenshotWriter::new(&dir);
    let summary = Pipeline::new(Frames::repeat(&src, 4), &mut sink, dispatcher(), writer).run();

    assert_eq!(summary.frames, 4);
    assert_eq!(summary.screenshots.len(), 2);
    assert_ne!(summary.screenshots[0], summary.screenshots[1]);

    let saved = image::open(&summary.screenshots[0]).unwrap().to_rgb8();
    assert_eq!(saved, sink.shown[1].0);
    assert_eq!(saved, filters::abs_saturate(&filters::sobel_x(&src)));
    assert!(summary.screenshots[1].exists());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn depth_modes_fall_back_to_warning_when_model_missing() {
    let src = frame();
    let depth = DepthService::lazy(|| Err(DepthError::NoModel));
    let dispatcher =
        ModeDispatcher::new(EffectParams::default(), None, depth).with_mode(Mode::Fog);
    let mut sink = ScriptedSink::new(&[None, Some('d')]);
    let source = Frames::repeat(&src, 3);
    let mut pipeline = Pipeline::new(source, &mut sink, dispatcher, unused_screenshots());
    let summary = pipeline.run();

    assert_eq!(summary.frames, 3);
    assert_eq!(summary.final_mode, Mode::Depth);
    assert_eq!(pipeline.dispatcher().depth_status(), DepthStatus::Unavailable);
    drop(pipeline);

    for (image, _) in &sink.shown {
        assert_eq!(*image.get_pixel(5, 5), WARNING_BANNER_COLOR);
        assert_eq!(image.get_pixel(5, 45), src.get_pixel(5, 45));
    }
}

#[test]
fn depth_model_is_used_only_by_depth_modes() {
    let src = frame();
    let calls = Rc::new(Cell::new(0));
    let model = Ramp {
        calls: calls.clone(),
    };
    let dispatcher =
        ModeDispatcher::new(EffectParams::default(), None, DepthService::ready(Box::new(model)));
    let mut sink = ScriptedSink::new(&[Some('b'), Some('d'), Some('q')]);
    let source = Frames::repeat(&src, 5);
    Pipeline::new(source, &mut sink, dispatcher, unused_screenshots()).run();

    assert_eq!(calls.get(), 1);
    assert_eq!(sink.shown[2].1, Mode::Depth);
    assert_eq!(sink.shown[2].0, depth_view(&ramp(src.width(), src.height())));
}

#[test]
fn face_boxes_outline_detected_faces() {
    let src = RgbImage::from_pixel(64, 48, Rgb([40, 40, 40]));
    let face = Rect::at(10, 8).of_size(20, 20);
    let detector: Box<dyn FaceDetectionModel> = Box::new(OneFace(face));
    let dispatcher =
        ModeDispatcher::new(EffectParams::default(), Some(detector), DepthService::unavailable())
            .with_mode(Mode::FaceBoxes);
    let mut sink = ScriptedSink::default();
    let source = Frames::repeat(&src, 1);
    Pipeline::new(source, &mut sink, dispatcher, unused_screenshots()).run();

    let out = &sink.shown[0].0;
    assert_eq!(*out.get_pixel(10, 8), FACE_BOX_COLOR);
    assert_eq!(*out.get_pixel(29, 27), FACE_BOX_COLOR);
    assert_eq!(*out.get_pixel(20, 18), Rgb([40, 40, 40]));
}
