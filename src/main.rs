use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};

use vidfx::app::{EguiDisplay, VidfxApp};
use vidfx::config::{Command, Config};
use vidfx::depth::DepthService;
use vidfx::effects::load_font;
use vidfx::face_detection::model_blazeface::BlazefaceModel;
use vidfx::face_detection::FaceDetectionModel;
use vidfx::filters::{compare_blur_strategies, BlurStrategy};
use vidfx::pipeline::{FrameSource, Pipeline, ScreenshotWriter};
use vidfx::utils::{lock, SharedState, State};
use vidfx::webcam::{CameraRequest, ImageSequenceSource, WebcamSource};
use vidfx::ModeDispatcher;

const FILE_FRAME_INTERVAL: Duration = Duration::from_millis(33);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("vidfx=info")),
        )
        .with_target(true)
        .init();

    let config = Config::parse();

    let input = match config.resolved_command() {
        Command::Live(args) => Input::Camera(args.camera_request()),
        Command::Files { paths } => Input::Files(paths),
        Command::BenchBlur { image, iterations } => return bench_blur(&image, iterations),
    };

    let shared_state: SharedState = Arc::new(Mutex::new(State {
        mode: config.mode,
        ..State::default()
    }));

    let worker_state = Arc::clone(&shared_state);
    thread::spawn(move || {
        worker_thread(config, input, worker_state.clone());
        lock(&worker_state).finished = true;
    });

    let gui_state = Arc::clone(&shared_state);
    eframe::run_native(
        "vidfx",
        eframe::NativeOptions::default(),
        Box::new(move |cc| Box::new(VidfxApp::new(cc, gui_state))),
    )?;
    Ok(())
}

enum Input {
    Camera(CameraRequest),
    Files(Vec<PathBuf>),
}

fn bench_blur(image: &Path, iterations: u32) -> Result<(), Box<dyn std::error::Error>> {
    let frame = image::open(image)?.to_rgb8();
    let result = compare_blur_strategies(&frame, iterations);
    for (strategy, mean) in BlurStrategy::ALL.into_iter().zip([result.naive, result.separable]) {
        info!(
            strategy = strategy.name(),
            iterations = result.iterations,
            mean_ms = mean.as_secs_f64() * 1e3,
            "blur timing"
        );
    }
    info!(
        speedup = result.speedup(),
        max_difference = result.max_difference,
        "blur comparison"
    );
    Ok(())
}

fn open_source(input: Input) -> vidfx::Result<Box<dyn FrameSource>> {
    let source: Box<dyn FrameSource> = match input {
        Input::Files(paths) => Box::new(
            ImageSequenceSource::from_paths(&paths, true)?.with_interval(FILE_FRAME_INTERVAL),
        ),
        Input::Camera(request) => Box::new(WebcamSource::open(request)?),
    };
    Ok(source)
}

fn worker_thread(config: Config, input: Input, shared_state: SharedState) {
    let source = match open_source(input) {
        Ok(source) => source,
        Err(err) => {
            error!("{}", err);
            return;
        }
    };

    let face_detector: Option<Box<dyn FaceDetectionModel>> =
        match BlazefaceModel::new(&config.face_model, &config.face_anchors) {
            Ok(model) => Some(Box::new(model)),
            Err(err) => {
                warn!("face detection disabled: {}", err);
                None
            }
        };

    let depth = DepthService::from_candidates(config.depth_models.clone());
    let font = config.font.as_deref().and_then(load_font);

    let dispatcher = ModeDispatcher::new(config.effect_params(), face_detector, depth)
        .with_font(font)
        .with_mode(config.mode);

    let mut pipeline = Pipeline::new(
        source,
        EguiDisplay::new(shared_state),
        dispatcher,
        ScreenshotWriter::new(&config.screenshot_dir),
    );
    let summary = pipeline.run();
    info!(
        frames = summary.frames,
        screenshots = summary.screenshots.len(),
        mode = %summary.final_mode,
        "processing stopped"
    );
}
